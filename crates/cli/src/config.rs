//! JSON run configuration mapped onto `EngineCfg`.
//!
//! Every field is optional; missing fields keep the engine defaults and
//! command-line flags are applied on top by the caller.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use nalgebra::Vector2;
use serde::Deserialize;
use sierpinski::coverage::Viewport;
use sierpinski::history::TrimPolicy;
use sierpinski::{EngineCfg, Mode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeArg {
    Plain,
    Twin,
    Coverage,
}

impl From<ModeArg> for Mode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Plain => Mode::Plain,
            ModeArg::Twin => Mode::Twin,
            ModeArg::Coverage => Mode::Coverage,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimArg {
    /// Drop the oldest point once full
    Evict,
    /// Stop generating once full
    Stop,
}

impl From<TrimArg> for TrimPolicy {
    fn from(t: TrimArg) -> Self {
        match t {
            TrimArg::Evict => TrimPolicy::Evict,
            TrimArg::Stop => TrimPolicy::HardStop,
        }
    }
}

/// On-disk form of the engine tunables.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileCfg {
    pub mode: Option<ModeArg>,
    pub max_history: Option<usize>,
    pub trim: Option<TrimArg>,
    pub record_start: Option<bool>,
    pub validate_points: Option<bool>,
    pub validation_margin: Option<f64>,
    pub retry_budget: Option<usize>,
    pub rolling_window: Option<usize>,
    pub decay_rate: Option<f64>,
    pub grid_size: Option<usize>,
    pub viewport_min: Option<[f64; 2]>,
    pub viewport_extent: Option<f64>,
    pub target: Option<[f64; 2]>,
    pub epsilon: Option<f64>,
    pub initial_speed: Option<f64>,
    pub min_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub speed_step: Option<f64>,
}

impl FileCfg {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing config {}", path.display()))
    }

    /// Overlay the fields that are present onto `base`.
    pub fn apply(&self, base: EngineCfg) -> EngineCfg {
        let mut cfg = base;
        if let Some(m) = self.mode {
            cfg.mode = m.into();
        }
        if let Some(t) = self.trim {
            cfg.trim = t.into();
        }
        set(&mut cfg.max_history, self.max_history);
        set(&mut cfg.record_start, self.record_start);
        set(&mut cfg.validate_points, self.validate_points);
        set(&mut cfg.validation_margin, self.validation_margin);
        set(&mut cfg.retry_budget, self.retry_budget);
        set(&mut cfg.rolling_window, self.rolling_window);
        set(&mut cfg.decay_rate, self.decay_rate);
        set(&mut cfg.grid_size, self.grid_size);
        set(&mut cfg.epsilon, self.epsilon);
        if let Some([x, y]) = self.viewport_min {
            cfg.viewport.min = Vector2::new(x, y);
        }
        set(&mut cfg.viewport.extent, self.viewport_extent);
        if let Some([x, y]) = self.target {
            cfg.target = Vector2::new(x, y);
        }
        set(&mut cfg.pace.initial_speed, self.initial_speed);
        set(&mut cfg.pace.min_speed, self.min_speed);
        set(&mut cfg.pace.max_speed, self.max_speed);
        set(&mut cfg.pace.speed_step, self.speed_step);
        cfg
    }
}

#[inline]
fn set<T: Copy>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Flat JSON echo of the effective config for provenance sidecars.
pub fn to_json(cfg: &EngineCfg) -> serde_json::Value {
    let Viewport { min, extent } = cfg.viewport;
    serde_json::json!({
        "mode": format!("{:?}", cfg.mode).to_lowercase(),
        "max_history": cfg.max_history,
        "trim": format!("{:?}", cfg.trim),
        "record_start": cfg.record_start,
        "validate_points": cfg.validate_points,
        "validation_margin": cfg.validation_margin,
        "retry_budget": cfg.retry_budget,
        "rolling_window": cfg.rolling_window,
        "decay_rate": cfg.decay_rate,
        "grid_size": cfg.grid_size,
        "viewport_min": [min.x, min.y],
        "viewport_extent": extent,
        "target": [cfg.target.x, cfg.target.y],
        "epsilon": cfg.epsilon,
        "pace": {
            "initial_speed": cfg.pace.initial_speed,
            "min_speed": cfg.pace.min_speed,
            "max_speed": cfg.pace.max_speed,
            "speed_step": cfg.pace.speed_step,
        },
    })
}
