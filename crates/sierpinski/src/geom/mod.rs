//! Polygon geometry for the chaos game.
//!
//! Purpose
//! - Hold the fixed vertex set (`Polygon<D>`) the walk is pulled toward, in 2D or 3D.
//! - Provide the projections the engine needs: barycentric clamp for triangles,
//!   nearest-edge projection for everything else, and the twin-point rule used by
//!   convergence runs.
//!
//! All routines guard their divisions explicitly and return `GeomError::Degenerate`
//! instead of producing NaN.
//!
//! Code cross-refs: `engine::ChaosGame`, `validate::Region`.

mod cfg;
pub mod project;
mod types;

pub use project::{
    barycentric, clamp_to_triangle, midpoint, nearest_anchor, nearest_edge_point,
    project_into, project_to_segment, twin_point,
};
pub use types::{GeomError, Point, Point2, Point3, Polygon};
