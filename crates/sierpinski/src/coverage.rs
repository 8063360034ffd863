//! Coverage analysis: a visit-count grid over the xy-plane and an epsilon probe.
//!
//! Model
//! - `Viewport` fixes the quantization: `index = floor((coord - min) * scale)` with
//!   `scale = (grid_size - 1) / extent`. The default viewport spans [-0.1, 1.1].
//! - Counts are stored row-major as `[row][col]` = `[y][x]`.
//! - Points whose index falls outside `[0, grid_size)` are dropped from the grid
//!   (counted in `dropped`), never wrapped or clamped.
//! - Only the first two coordinates are binned; for a pyramid that is the
//!   top-down view.
//!
//! `TargetProbe` records generated points within `epsilon` of a target and keeps a
//! per-tick progress series of the cumulative hit count.

use std::collections::VecDeque;

use nalgebra::Vector2;

/// Square window mapped onto the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Lower-left corner.
    pub min: Vector2<f64>,
    /// Side length.
    pub extent: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            min: Vector2::new(-0.1, -0.1),
            extent: 1.2,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CoverageGrid {
    size: usize,
    origin: Vector2<f64>,
    extent: f64,
    scale: f64,
    counts: Vec<u64>,
    dropped: u64,
}

impl CoverageGrid {
    /// `size >= 2` and a positive finite extent are checked by `EngineCfg::validate`.
    /// A single-cell grid keeps only points inside the viewport.
    pub fn new(size: usize, viewport: Viewport) -> Self {
        Self {
            size,
            origin: viewport.min,
            extent: viewport.extent,
            scale: (size.saturating_sub(1)) as f64 / viewport.extent,
            counts: vec![0; size * size],
            dropped: 0,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    fn axis_index(&self, coord: f64, min: f64) -> Option<usize> {
        if self.size < 2 {
            // scale is 0 here; bound by the viewport instead.
            return (self.size == 1 && coord >= min && coord <= min + self.extent).then_some(0);
        }
        let f = ((coord - min) * self.scale).floor();
        if f.is_finite() && f >= 0.0 && f < self.size as f64 {
            Some(f as usize)
        } else {
            None
        }
    }

    /// Cell `(row, col)` for a point, or `None` when outside the grid.
    pub fn cell_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let col = self.axis_index(x, self.origin.x)?;
        let row = self.axis_index(y, self.origin.y)?;
        Some((row, col))
    }

    /// Count one visit; returns false (and bumps `dropped`) when out of range.
    pub fn record(&mut self, x: f64, y: f64) -> bool {
        match self.cell_of(x, y) {
            Some((row, col)) => {
                self.counts[row * self.size + col] += 1;
                true
            }
            None => {
                self.dropped += 1;
                false
            }
        }
    }

    #[inline]
    pub fn count(&self, row: usize, col: usize) -> u64 {
        self.counts[row * self.size + col]
    }

    /// Row-major counts.
    #[inline]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// `(row, col, count)` for every visited cell, row-major.
    pub fn nonzero_cells(&self) -> impl Iterator<Item = (usize, usize, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(move |(i, &c)| (i / self.size, i % self.size, c))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Fraction of cells with at least one visit.
    pub fn fill_ratio(&self) -> f64 {
        let hit = self.counts.iter().filter(|&&c| c > 0).count();
        hit as f64 / self.counts.len() as f64
    }

    pub fn clear(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
        self.dropped = 0;
    }
}

/// Hits within `epsilon` of a target point.
#[derive(Clone, Debug)]
pub struct TargetProbe {
    target: Vector2<f64>,
    epsilon: f64,
    limit: usize,
    found: u64,
    found_points: VecDeque<Vector2<f64>>,
    progress: VecDeque<u64>,
}

impl TargetProbe {
    /// `limit` bounds both the stored hits and the progress series (oldest dropped).
    pub fn new(target: Vector2<f64>, epsilon: f64, limit: usize) -> Self {
        Self {
            target,
            epsilon,
            limit: limit.max(1),
            found: 0,
            found_points: VecDeque::new(),
            progress: VecDeque::new(),
        }
    }

    #[inline]
    pub fn target(&self) -> Vector2<f64> {
        self.target
    }

    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Strict `distance < epsilon`.
    pub fn observe(&mut self, p: Vector2<f64>) -> bool {
        if (p - self.target).norm() < self.epsilon {
            self.found += 1;
            self.found_points.push_back(p);
            if self.found_points.len() > self.limit {
                self.found_points.pop_front();
            }
            true
        } else {
            false
        }
    }

    /// Append the current cumulative hit count to the progress series.
    pub fn mark_tick(&mut self) {
        self.progress.push_back(self.found);
        if self.progress.len() > self.limit {
            self.progress.pop_front();
        }
    }

    #[inline]
    pub fn found(&self) -> u64 {
        self.found
    }

    pub fn found_points(&self) -> &VecDeque<Vector2<f64>> {
        &self.found_points
    }

    pub fn progress(&self) -> &VecDeque<u64> {
        &self.progress
    }

    pub fn clear(&mut self) {
        self.found = 0;
        self.found_points.clear();
        self.progress.clear();
    }
}
