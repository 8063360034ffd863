//! Engine configuration, errors, reports and snapshot views.

use std::collections::VecDeque;
use std::fmt;

use nalgebra::Vector2;

use crate::coverage::{CoverageGrid, TargetProbe, Viewport};
use crate::geom::{GeomError, Point};
use crate::history::{PointHistory, TrimPolicy};
use crate::pace::PaceCfg;

/// What the engine tracks besides the plain walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// History and counters only.
    #[default]
    Plain,
    /// A second point driven by the same vertex choices, plus the distance series.
    Twin,
    /// Coverage grid and target probe over the xy-plane.
    Coverage,
}

/// Engine tunables. Fixed for the lifetime of an engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineCfg {
    pub mode: Mode,
    /// History bound; also bounds the twin path, distance series and probe series.
    pub max_history: usize,
    pub trim: TrimPolicy,
    /// Record the start point (and twin) as the first history entry.
    pub record_start: bool,
    /// Check each candidate against the polygon's bounding box grown by
    /// `validation_margin`.
    pub validate_points: bool,
    pub validation_margin: f64,
    /// Samples per step before falling back to projection.
    pub retry_budget: usize,
    pub rolling_window: usize,
    pub decay_rate: f64,
    pub grid_size: usize,
    pub viewport: Viewport,
    pub target: Vector2<f64>,
    pub epsilon: f64,
    pub pace: PaceCfg,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            mode: Mode::Plain,
            max_history: 500_000,
            trim: TrimPolicy::Evict,
            record_start: false,
            validate_points: true,
            validation_margin: 0.1,
            retry_budget: 5,
            rolling_window: 50,
            decay_rate: 15.0,
            grid_size: 100,
            viewport: Viewport::default(),
            target: Vector2::new(0.333, 0.289),
            epsilon: 0.01,
            pace: PaceCfg::default(),
        }
    }
}

impl EngineCfg {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_history == 0 {
            return Err(EngineError::invalid("max_history must be > 0"));
        }
        if !(self.validation_margin.is_finite() && self.validation_margin >= 0.0) {
            return Err(EngineError::invalid(
                "validation_margin must be finite and >= 0",
            ));
        }
        if self.retry_budget == 0 {
            return Err(EngineError::invalid("retry_budget must be >= 1"));
        }
        if self.rolling_window == 0 {
            return Err(EngineError::invalid("rolling_window must be >= 1"));
        }
        if !(self.decay_rate.is_finite() && self.decay_rate > 0.0) {
            return Err(EngineError::invalid("decay_rate must be finite and > 0"));
        }
        if self.grid_size < 2 {
            return Err(EngineError::invalid("grid_size must be >= 2"));
        }
        if !(self.viewport.extent.is_finite() && self.viewport.extent > 0.0)
            || self.viewport.min.iter().any(|x| !x.is_finite())
        {
            return Err(EngineError::invalid(
                "viewport must be finite with extent > 0",
            ));
        }
        if self.target.iter().any(|x| !x.is_finite()) {
            return Err(EngineError::invalid("target must be finite"));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(EngineError::invalid("epsilon must be finite and > 0"));
        }
        self.pace.check().map_err(EngineError::invalid)?;
        Ok(())
    }
}

/// Errors surfaced by the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineError {
    /// Bad polygon or tunable; raised at construction (or by `reset` for a bad start).
    InvalidConfig { reason: String },
    /// Degenerate geometry hit during a projection; the attempted step is discarded.
    Geometry { reason: String },
}

impl EngineError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub(crate) fn geometry(reason: impl Into<String>) -> Self {
        Self::Geometry {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid engine config: {reason}"),
            Self::Geometry { reason } => write!(f, "geometry error: {reason}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<GeomError> for EngineError {
    fn from(err: GeomError) -> Self {
        match err {
            GeomError::InvalidPolygon { reason } => Self::InvalidConfig { reason },
            GeomError::Degenerate { reason } => Self::Geometry { reason },
        }
    }
}

/// Result of one `advance` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Points appended to history by this call (`<= n`).
    pub points_added: usize,
    /// The `HardStop` cap is reached; further calls add nothing.
    pub limit_reached: bool,
}

/// Counters and latest derived values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Stats {
    /// Every point ever generated since construction or `reset`; never trimmed.
    pub total_generated: u64,
    /// Steps that fell back to projection.
    pub projections: u64,
    /// Twin mode: distance after the latest step.
    pub last_distance: Option<f64>,
    /// Twin mode: mean of the last `rolling_window` distances, once available.
    pub rolling_distance: Option<f64>,
    /// Twin mode: first recorded distance (seeds the theoretical curve).
    pub initial_distance: Option<f64>,
    /// Coverage mode: points that landed within `epsilon` of the target.
    pub found: u64,
}

/// Twin-mode view.
#[derive(Clone, Copy, Debug)]
pub struct TwinView<'a, const D: usize> {
    pub point: Point<D>,
    pub path: &'a PointHistory<D>,
    pub distances: &'a VecDeque<f64>,
}

/// Coverage-mode view.
#[derive(Clone, Copy, Debug)]
pub struct CoverageView<'a> {
    pub grid: &'a CoverageGrid,
    pub probe: &'a TargetProbe,
}

/// Read-only state for a renderer, valid until the next mutating call.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a, const D: usize> {
    pub current: Point<D>,
    pub history: &'a PointHistory<D>,
    pub stats: Stats,
    pub twin: Option<TwinView<'a, D>>,
    pub coverage: Option<CoverageView<'a>>,
}
