//! Chaos-game engine: the random walk, its bounded history and derived statistics.
//!
//! Purpose
//! - One engine for every variant (triangle, pyramid, convergence, coverage):
//!   generic over dimension `D`, with an optional `Mode` adding twin-point tracking
//!   or coverage binning.
//! - A host calls `advance(n)` once per animation tick and renders `snapshot()`.
//!
//! Step
//! 1. Pick a vertex uniformly at random.
//! 2. Move halfway toward it.
//! 3. If validation is on and the candidate leaves the polygon's bounding box
//!    (grown by `validation_margin`), resample up to `retry_budget` times, then
//!    project the last candidate onto the polygon.
//! 4. Append to the bounded history (`TrimPolicy::Evict` or `HardStop`).
//! 5. Update counters and mode state.
//!
//! Concurrency
//! - Single-threaded and synchronous; no I/O. The engine is `Send` but has no
//!   internal locking: hosts sharing it across threads wrap it in a mutex.
//!
//! Code cross-refs: `geom::{project_into, twin_point}`, `validate::Region`,
//! `history::PointHistory`, `coverage::{CoverageGrid, TargetProbe}`, `stats`.

mod types;
mod walk;

pub use types::{
    AdvanceReport, CoverageView, EngineCfg, EngineError, Mode, Snapshot, Stats, TwinView,
};
pub use walk::ChaosGame;

#[cfg(test)]
mod tests;
