//! Shared data types for the claimboard territory planner.
//!
//! Everything here is plain data: tile geometry, labels, alliances, claim
//! maps, plan steps, and the wire helpers that move them in and out of JSON
//! documents and share strings. The rules live in `claimboard-core`.

#![forbid(unsafe_code)]

mod alliance;
mod board;
mod claim;
pub mod geometry;
mod ids;
mod plan;
mod tile;
pub mod wire;

pub use crate::alliance::*;
pub use crate::board::*;
pub use crate::claim::*;
pub use crate::geometry::{BoundingBox, MapGeometry, Point, TileGeometry};
pub use crate::ids::*;
pub use crate::plan::*;
pub use crate::tile::*;
pub use crate::wire::WireError;
