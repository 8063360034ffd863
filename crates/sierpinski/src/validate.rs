//! Candidate validation for the walk.
//!
//! A candidate is accepted when it lies inside the polygon's bounding box grown by
//! a margin. Rejection is a value (`NeedsProjection`), not an error: the engine
//! resamples a bounded number of times and then projects.

use crate::geom::{Point, Polygon};

/// Outcome of checking one candidate point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Validation<const D: usize> {
    Accepted(Point<D>),
    NeedsProjection,
}

/// Closed axis-aligned acceptance box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region<const D: usize> {
    pub lo: Point<D>,
    pub hi: Point<D>,
}

impl<const D: usize> Region<D> {
    /// Bounding box of `polygon` grown by `margin` on every side.
    pub fn around(polygon: &Polygon<D>, margin: f64) -> Self {
        let (lo, hi) = polygon.bounding_box();
        Self {
            lo: lo.add_scalar(-margin),
            hi: hi.add_scalar(margin),
        }
    }

    /// NaN coordinates fail every comparison and are rejected.
    #[inline]
    pub fn contains(&self, p: &Point<D>) -> bool {
        (0..D).all(|k| self.lo[k] <= p[k] && p[k] <= self.hi[k])
    }

    #[inline]
    pub fn validate(&self, candidate: Point<D>) -> Validation<D> {
        if self.contains(&candidate) {
            Validation::Accepted(candidate)
        } else {
            Validation::NeedsProjection
        }
    }
}
