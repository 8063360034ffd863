//! Chaos-game engine for Sierpinski attractors.
//!
//! Repeatedly move halfway from the current point toward a randomly chosen vertex
//! of a fixed polygon. Over a triangle the visited points fill the Sierpinski
//! gasket; over a tetrahedron, the Sierpinski pyramid.
//!
//! Layout
//! - `geom`: polygons, presets, projections and the twin-point rule.
//! - `engine`: the walk itself (`ChaosGame`), its config and snapshot views.
//! - `history`, `stats`, `coverage`: bounded point history, distance statistics,
//!   visit-count grid.
//! - `pace`: points-per-frame accounting for hosts that render live.
//!
//! The crate does no I/O, rendering or timing. Hosts drive it with `advance` and
//! read back through `snapshot`.

pub mod coverage;
pub mod engine;
pub mod geom;
pub mod history;
pub mod pace;
pub mod sample;
pub mod stats;
pub mod validate;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use engine::{ChaosGame, EngineCfg, EngineError, Mode};
pub use geom::{Point2, Point3, Polygon};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::coverage::{CoverageGrid, TargetProbe, Viewport};
    pub use crate::engine::{
        AdvanceReport, ChaosGame, CoverageView, EngineCfg, EngineError, Mode, Snapshot, Stats,
        TwinView,
    };
    pub use crate::geom::{GeomError, Point, Point2, Point3, Polygon};
    pub use crate::history::{PointHistory, TrimPolicy};
    pub use crate::pace::{Pace, PaceCfg};
    pub use crate::stats::{rolling_average, theoretical_decay, theory_curve};
}
