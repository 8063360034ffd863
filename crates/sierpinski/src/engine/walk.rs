use std::collections::VecDeque;

use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::{
    AdvanceReport, CoverageView, EngineCfg, EngineError, Mode, Snapshot, Stats, TwinView,
};
use crate::coverage::{CoverageGrid, TargetProbe};
use crate::geom::{midpoint, project_into, twin_point, Point, Polygon};
use crate::history::PointHistory;
use crate::sample::sample_interior;
use crate::stats::{rolling_average, theory_curve, RollingMean};
use crate::validate::{Region, Validation};

/// Chaos-game engine over a fixed polygon in R^D.
///
/// Invariants:
/// - `history.len() <= cfg.max_history`; insertion order is generation order.
/// - `stats.total_generated` counts every committed step and is never trimmed.
/// - No non-finite point is ever committed.
/// - Twin/coverage state exists iff `cfg.mode` asks for it.
pub struct ChaosGame<const D: usize> {
    polygon: Polygon<D>,
    cfg: EngineCfg,
    region: Region<D>,
    rng: StdRng,
    current: Point<D>,
    history: PointHistory<D>,
    stats: Stats,
    extra: ModeState<D>,
}

enum ModeState<const D: usize> {
    Plain,
    Twin(TwinState<D>),
    Coverage(CoverageState),
}

struct TwinState<const D: usize> {
    point: Point<D>,
    path: PointHistory<D>,
    distances: VecDeque<f64>,
    rolling: RollingMean,
}

struct CoverageState {
    grid: CoverageGrid,
    probe: TargetProbe,
}

/// A fully computed step, not yet committed.
struct Step<const D: usize> {
    vertex: usize,
    point: Point<D>,
    projected: bool,
}

impl<const D: usize> ChaosGame<D> {
    /// Engine starting from a random point inside the polygon.
    ///
    /// `seed: None` draws the RNG seed from the OS.
    pub fn new(
        polygon: Polygon<D>,
        cfg: EngineCfg,
        seed: Option<u64>,
    ) -> Result<Self, EngineError> {
        cfg.validate()?;
        let mut rng = seeded_rng(seed);
        let start = sample_interior(&polygon, &mut rng);
        Self::build(polygon, cfg, rng, start)
    }

    /// Engine starting from a caller-supplied point (may lie outside the polygon).
    pub fn with_start(
        polygon: Polygon<D>,
        cfg: EngineCfg,
        start: Point<D>,
        seed: Option<u64>,
    ) -> Result<Self, EngineError> {
        cfg.validate()?;
        Self::build(polygon, cfg, seeded_rng(seed), start)
    }

    fn build(
        polygon: Polygon<D>,
        cfg: EngineCfg,
        rng: StdRng,
        start: Point<D>,
    ) -> Result<Self, EngineError> {
        check_finite(&start)?;
        let extra = ModeState::fresh(&polygon, &cfg, &start)?;
        let mut engine = Self {
            region: Region::around(&polygon, cfg.validation_margin),
            history: PointHistory::new(cfg.max_history, cfg.trim),
            polygon,
            cfg,
            rng,
            current: start,
            stats: Stats::default(),
            extra,
        };
        engine.record_start();
        tracing::debug!(
            vertices = engine.polygon.len(),
            dim = D,
            mode = ?engine.cfg.mode,
            max_history = engine.cfg.max_history,
            "chaos game ready"
        );
        Ok(engine)
    }

    #[inline]
    pub fn polygon(&self) -> &Polygon<D> {
        &self.polygon
    }

    #[inline]
    pub fn cfg(&self) -> &EngineCfg {
        &self.cfg
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.cfg.mode
    }

    #[inline]
    pub fn current(&self) -> Point<D> {
        self.current
    }

    #[inline]
    pub fn history(&self) -> &PointHistory<D> {
        &self.history
    }

    #[inline]
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// True once a `HardStop` history is full.
    #[inline]
    pub fn is_capped(&self) -> bool {
        !self.history.has_room()
    }

    /// Run `n` iterations.
    ///
    /// Stops early (with `limit_reached`) when a `HardStop` history fills up. On a
    /// `Geometry` error the failing step is discarded; steps committed earlier in
    /// the same call stay.
    pub fn advance(&mut self, n: usize) -> Result<AdvanceReport, EngineError> {
        let mut added = 0;
        let outcome = self.run(n, &mut added);
        if added > 0 {
            if let ModeState::Coverage(cov) = &mut self.extra {
                cov.probe.mark_tick();
            }
        }
        outcome?;
        let limit_reached = self.is_capped();
        if limit_reached && added < n {
            tracing::debug!(
                added,
                requested = n,
                max_history = self.cfg.max_history,
                "history cap reached"
            );
        }
        Ok(AdvanceReport {
            points_added: added,
            limit_reached,
        })
    }

    fn run(&mut self, n: usize, added: &mut usize) -> Result<(), EngineError> {
        for _ in 0..n {
            if !self.history.has_room() {
                break;
            }
            let step = self.next_step()?;
            self.commit(step);
            *added += 1;
        }
        Ok(())
    }

    /// Sample, validate, retry, and project if needed. Only the RNG advances.
    ///
    /// When every attempt is rejected, the last rejected candidate is projected onto
    /// the polygon, not the pre-step `current`. The projected point therefore still
    /// carries the pull toward the final attempt's vertex.
    fn next_step(&mut self) -> Result<Step<D>, EngineError> {
        let attempts = if self.cfg.validate_points {
            self.cfg.retry_budget
        } else {
            1
        };
        let mut rejected = None;
        for _ in 0..attempts {
            let vertex = self.rng.gen_range(0..self.polygon.len());
            let candidate = midpoint(&self.current, &self.polygon.vertex(vertex));
            if !self.cfg.validate_points {
                if candidate.iter().any(|x| !x.is_finite()) {
                    return Err(EngineError::geometry("step overflowed to a non-finite point"));
                }
                return Ok(Step {
                    vertex,
                    point: candidate,
                    projected: false,
                });
            }
            match self.region.validate(candidate) {
                Validation::Accepted(point) => {
                    return Ok(Step {
                        vertex,
                        point,
                        projected: false,
                    })
                }
                Validation::NeedsProjection => rejected = Some((vertex, candidate)),
            }
        }
        let (vertex, candidate) = rejected
            .ok_or_else(|| EngineError::invalid("retry_budget must be >= 1"))?;
        let point = project_into(&candidate, &self.polygon)?;
        tracing::debug!(
            vertex,
            attempts,
            candidate = ?candidate.as_slice(),
            projected = ?point.as_slice(),
            "candidate rejected, projected onto polygon"
        );
        Ok(Step {
            vertex,
            point,
            projected: true,
        })
    }

    fn commit(&mut self, step: Step<D>) {
        let vertex = self.polygon.vertex(step.vertex);
        // `run` checked `has_room`, so the push cannot be refused here.
        let _ = self.history.push(step.point);
        self.current = step.point;
        self.stats.total_generated += 1;
        if step.projected {
            self.stats.projections += 1;
        }
        let cap = self.cfg.max_history;
        match &mut self.extra {
            ModeState::Plain => {}
            ModeState::Twin(twin) => {
                twin.point = midpoint(&twin.point, &vertex);
                let _ = twin.path.push(twin.point);
                let d = (step.point - twin.point).norm();
                twin.distances.push_back(d);
                if twin.distances.len() > cap {
                    twin.distances.pop_front();
                }
                self.stats.last_distance = Some(d);
                self.stats.initial_distance.get_or_insert(d);
                self.stats.rolling_distance = twin.rolling.push(d);
            }
            ModeState::Coverage(cov) => {
                cov.grid.record(step.point[0], step.point[1]);
                if cov.probe.observe(Vector2::new(step.point[0], step.point[1])) {
                    self.stats.found += 1;
                }
            }
        }
    }

    fn record_start(&mut self) {
        if !self.cfg.record_start {
            return;
        }
        let _ = self.history.push(self.current);
        if let ModeState::Twin(twin) = &mut self.extra {
            let _ = twin.path.push(twin.point);
        }
    }

    /// Clear history, counters and mode state, and restart the walk.
    ///
    /// `None` samples a new start inside the polygon. The RNG stream continues.
    /// On error (non-finite start, degenerate twin) nothing is changed.
    pub fn reset(&mut self, new_start: Option<Point<D>>) -> Result<(), EngineError> {
        let start = match new_start {
            Some(p) => {
                check_finite(&p)?;
                p
            }
            None => sample_interior(&self.polygon, &mut self.rng),
        };
        let extra = ModeState::fresh(&self.polygon, &self.cfg, &start)?;
        self.extra = extra;
        self.current = start;
        self.history.clear();
        self.stats = Stats::default();
        self.record_start();
        tracing::debug!(start = ?start.as_slice(), "chaos game reset");
        Ok(())
    }

    /// Read-only view for renderers.
    pub fn snapshot(&self) -> Snapshot<'_, D> {
        let (twin, coverage) = match &self.extra {
            ModeState::Plain => (None, None),
            ModeState::Twin(t) => (
                Some(TwinView {
                    point: t.point,
                    path: &t.path,
                    distances: &t.distances,
                }),
                None,
            ),
            ModeState::Coverage(c) => (
                None,
                Some(CoverageView {
                    grid: &c.grid,
                    probe: &c.probe,
                }),
            ),
        };
        Snapshot {
            current: self.current,
            history: &self.history,
            stats: self.stats,
            twin,
            coverage,
        }
    }

    /// Twin mode: moving average over the retained distance series.
    ///
    /// `None` outside twin mode; empty while fewer than `rolling_window` samples exist.
    pub fn rolling_distance(&self) -> Option<Vec<f64>> {
        match &self.extra {
            ModeState::Twin(t) => Some(rolling_average(
                t.distances.iter().copied(),
                self.cfg.rolling_window,
            )),
            _ => None,
        }
    }

    /// Twin mode: `d0 * 0.5^(k / decay_rate)` for each retained distance index.
    ///
    /// `None` outside twin mode or before the first distance is recorded.
    pub fn theoretical_distance(&self) -> Option<Vec<f64>> {
        match &self.extra {
            ModeState::Twin(t) => {
                let d0 = self.stats.initial_distance?;
                Some(theory_curve(d0, self.cfg.decay_rate, t.distances.len()))
            }
            _ => None,
        }
    }

    /// Display subset of the history; see `PointHistory::downsample`.
    ///
    /// The subset is drawn from the caller's `rng`; the walk's own stream is untouched.
    pub fn display_points<R: Rng + ?Sized>(
        &self,
        limit: usize,
        fraction: f64,
        rng: &mut R,
    ) -> Vec<Point<D>> {
        self.history.downsample(limit, fraction, rng)
    }
}

impl<const D: usize> ModeState<D> {
    fn fresh(
        polygon: &Polygon<D>,
        cfg: &EngineCfg,
        start: &Point<D>,
    ) -> Result<Self, EngineError> {
        Ok(match cfg.mode {
            Mode::Plain => Self::Plain,
            Mode::Twin => Self::Twin(TwinState {
                point: twin_point(start, polygon)?,
                path: PointHistory::new(cfg.max_history, cfg.trim),
                distances: VecDeque::new(),
                rolling: RollingMean::new(cfg.rolling_window),
            }),
            Mode::Coverage => Self::Coverage(CoverageState {
                grid: CoverageGrid::new(cfg.grid_size, cfg.viewport),
                probe: TargetProbe::new(cfg.target, cfg.epsilon, cfg.max_history),
            }),
        })
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn check_finite<const D: usize>(p: &Point<D>) -> Result<(), EngineError> {
    if p.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(EngineError::invalid("point must be finite"))
    }
}

impl<const D: usize> std::fmt::Debug for ChaosGame<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChaosGame")
            .field("vertices", &self.polygon.len())
            .field("mode", &self.cfg.mode)
            .field("current", &self.current.as_slice())
            .field("history_len", &self.history.len())
            .field("stats", &self.stats)
            .finish()
    }
}
