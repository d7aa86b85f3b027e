//! Run configuration for the reference host.

use cg_core::Tick;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Host clock at the first simulated tick.
    pub start_tick: u64,

    /// Total ticks to simulate.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Call [`SimObserver::on_snapshot`](crate::SimObserver::on_snapshot)
    /// every N ticks.  0 disables snapshots.
    pub output_interval_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_tick:            1,
            total_ticks:           100,
            seed:                  42,
            output_interval_ticks: 0,
        }
    }
}

impl SimConfig {
    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.start_tick + self.total_ticks)
    }
}
