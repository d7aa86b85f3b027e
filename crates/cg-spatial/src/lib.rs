//! `cg-spatial` — the host world as the movement core sees it.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`world`]       | `WorldView` trait, terrain, structures, portals            |
//! | [`walkable`]    | `is_walkable`, `adjacent_walkable`                         |
//! | [`pathfinder`]  | `PathFinder` trait (host search), `CostMatrix`, `SearchOpts` |
//! | [`cost_matrix`] | `apply_cost_matrix_options`, `CostMatrixOpts`              |
//! | [`route`]       | `find_route`, `RegionRoute`, `RouteOpts`                   |
//! | [`portals`]     | `PortalSet`, `PortalIndex` (R-tree backed)                 |
//! | [`intel`]       | `update_intel`: keeper nodes and portal scans              |
//! | [`error`]       | `SpatialError`, `SpatialResult<T>`                         |

pub mod cost_matrix;
pub mod error;
pub mod intel;
pub mod pathfinder;
pub mod portals;
pub mod route;
pub mod walkable;
pub mod world;

#[cfg(test)]
mod tests;

pub use cost_matrix::{apply_cost_matrix_options, CostMatrixOpts, SOURCE_KEEPER_RADIUS};
pub use error::{SpatialError, SpatialResult};
pub use intel::{source_keeper_nodes, update_intel, IntelReport};
pub use pathfinder::{CostMatrix, PathFinder, PathResult, SearchOpts, IMPASSABLE, SOFT_BLOCK};
pub use portals::{describe_exits_with_portals, PortalIndex, PortalSet};
pub use route::{find_route, PortalHop, RegionRoute, RouteCallback, RouteEdge, RouteOpts, RouteStep};
pub use walkable::{adjacent_walkable, is_walkable};
pub use world::{
    ConstructionSiteInfo, PortalDestination, PortalInfo, StructureInfo, StructureKind, Terrain,
    WorldView,
};
