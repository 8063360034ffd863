//! Bounded point history.
//!
//! Purpose
//! - Keep an unbounded point stream usable by a fixed-size display: the history
//!   never holds more than `capacity` points.
//! - At capacity, `TrimPolicy::Evict` drops the oldest point (FIFO ring) while
//!   `TrimPolicy::HardStop` refuses new points; the engine turns the latter into
//!   `AdvanceReport::limit_reached`.
//!
//! `downsample` gives renderers a random subset once the history outgrows what
//! they want to draw in one frame.

use std::collections::VecDeque;

use rand::seq::index;
use rand::Rng;

use crate::geom::Point;

/// What happens when the history is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrimPolicy {
    /// Ring buffer: evict the oldest point.
    #[default]
    Evict,
    /// Stop retaining (and generating) points.
    HardStop,
}

#[derive(Clone, Debug)]
pub struct PointHistory<const D: usize> {
    points: VecDeque<Point<D>>,
    capacity: usize,
    policy: TrimPolicy,
}

impl<const D: usize> PointHistory<D> {
    /// `capacity` is validated by the caller (`EngineCfg::validate`) to be > 0.
    pub fn new(capacity: usize, policy: TrimPolicy) -> Self {
        Self {
            // Large capacities grow on demand.
            points: VecDeque::with_capacity(capacity.min(1 << 16)),
            capacity,
            policy,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn policy(&self) -> TrimPolicy {
        self.policy
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.points.len() >= self.capacity
    }

    /// False only for a full `HardStop` history.
    #[inline]
    pub fn has_room(&self) -> bool {
        match self.policy {
            TrimPolicy::Evict => true,
            TrimPolicy::HardStop => !self.is_full(),
        }
    }

    /// Append `p`. Returns the evicted point under `Evict`, and hands `p` back as
    /// `Err` when a `HardStop` history is full.
    pub fn push(&mut self, p: Point<D>) -> Result<Option<Point<D>>, Point<D>> {
        if !self.has_room() {
            return Err(p);
        }
        self.points.push_back(p);
        if self.points.len() > self.capacity {
            Ok(self.points.pop_front())
        } else {
            Ok(None)
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Oldest first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Point<D>> + '_ {
        self.points.iter()
    }

    #[inline]
    pub fn first(&self) -> Option<&Point<D>> {
        self.points.front()
    }

    #[inline]
    pub fn last(&self) -> Option<&Point<D>> {
        self.points.back()
    }

    pub fn to_vec(&self) -> Vec<Point<D>> {
        self.points.iter().copied().collect()
    }

    /// Display subset: every point while `len <= limit`, otherwise
    /// `floor(limit * fraction)` points drawn without replacement, kept in
    /// generation order.
    pub fn downsample<R: Rng + ?Sized>(
        &self,
        limit: usize,
        fraction: f64,
        rng: &mut R,
    ) -> Vec<Point<D>> {
        if self.points.len() <= limit {
            return self.to_vec();
        }
        let want = ((limit as f64) * fraction.clamp(0.0, 1.0)).floor() as usize;
        let mut picked = index::sample(rng, self.points.len(), want).into_vec();
        picked.sort_unstable();
        picked.into_iter().map(|i| self.points[i]).collect()
    }
}
