//! Convergence statistics for twin-point runs.
//!
//! - `rolling_average`: "valid" moving average, one value per full window.
//! - `RollingMean`: the same average maintained incrementally for the latest window.
//! - `theoretical_decay`: `d0 * 0.5^(k / decay_rate)`, the reference curve drawn
//!   next to the measured average.

use std::collections::VecDeque;

/// Simple moving average over every full window of `data`.
///
/// Empty when `window == 0` or fewer than `window` samples exist; callers check
/// the length before use.
pub fn rolling_average<I>(data: I, window: usize) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let data: Vec<f64> = data.into_iter().collect();
    if window == 0 || data.len() < window {
        return Vec::new();
    }
    // Each window is summed from scratch.
    data.windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Mean of the last `window` pushed samples.
#[derive(Clone, Debug)]
pub struct RollingMean {
    window: usize,
    buf: VecDeque<f64>,
}

impl RollingMean {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            buf: VecDeque::with_capacity(window.max(1)),
        }
    }

    #[inline]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Push a sample; returns the mean once the window is full.
    pub fn push(&mut self, x: f64) -> Option<f64> {
        self.buf.push_back(x);
        if self.buf.len() > self.window {
            self.buf.pop_front();
        }
        self.mean()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.buf.len() < self.window {
            return None;
        }
        Some(self.buf.iter().sum::<f64>() / self.window as f64)
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// Reference decay `d0 * 0.5^(k / decay_rate)`.
#[inline]
pub fn theoretical_decay(d0: f64, decay_rate: f64, k: f64) -> f64 {
    d0 * 0.5_f64.powf(k / decay_rate)
}

/// `theoretical_decay` sampled at `k = 0..len`.
pub fn theory_curve(d0: f64, decay_rate: f64, len: usize) -> Vec<f64> {
    (0..len)
        .map(|k| theoretical_decay(d0, decay_rate, k as f64))
        .collect()
}
