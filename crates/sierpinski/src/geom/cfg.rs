//! Tolerance defaults for the geometry helpers (internal).
//!
//! Policy
//! - Fixed constants; callers do not tune these. User-facing knobs live in
//!   `engine::EngineCfg`.

/// Smallest squared edge length accepted by segment projection.
pub(crate) const EDGE_EPS: f64 = 1e-12;
/// Smallest |Gram determinant| accepted by barycentric coordinates.
pub(crate) const DENOM_EPS: f64 = 1e-12;
