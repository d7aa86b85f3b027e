//! Simulation observer trait for progress reporting and data collection.

use cg_core::Tick;

use crate::sim::TickSummary;
use crate::world::GridWorld;

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl SimObserver for ProgressPrinter {
///     fn on_tick_end(&mut self, summary: &TickSummary) {
///         if summary.tick.0 % self.interval == 0 {
///             println!("tick {}: {} moved", summary.tick, summary.commit.moved);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before `pre_tick`.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called after the tick's moves are committed, before the clock
    /// advances.
    fn on_tick_end(&mut self, _summary: &TickSummary) {}

    /// Called every `config.output_interval_ticks` ticks with the committed
    /// world.
    fn on_snapshot(&mut self, _tick: Tick, _world: &GridWorld) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
