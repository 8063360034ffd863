//! Host-side pacing: turn a points-per-second speed into per-tick point counts.
//!
//! The engine never sleeps or measures time. A host loop asks `Pace::tick` how many
//! points to `advance` this frame; fractional points carry over to later frames.
//! `faster`/`slower` step the speed by `speed_step * max(1, floor(speed / 10))`, so
//! the step grows with the speed, and clamp to `[min_speed, max_speed]`.

/// Speed bounds (points per second).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaceCfg {
    pub initial_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub speed_step: f64,
}

impl Default for PaceCfg {
    fn default() -> Self {
        Self {
            initial_speed: 1.0,
            min_speed: 1.0,
            max_speed: 100_000.0,
            speed_step: 1.0,
        }
    }
}

impl PaceCfg {
    /// `0 < min <= initial <= max`, `step > 0`, all finite.
    pub fn check(&self) -> Result<(), String> {
        let all_finite = [
            self.initial_speed,
            self.min_speed,
            self.max_speed,
            self.speed_step,
        ]
        .iter()
        .all(|x| x.is_finite());
        if !all_finite {
            return Err("speed bounds must be finite".into());
        }
        if self.min_speed <= 0.0 {
            return Err("min_speed must be > 0".into());
        }
        if !(self.min_speed <= self.initial_speed && self.initial_speed <= self.max_speed) {
            return Err("min_speed <= initial_speed <= max_speed required".into());
        }
        if self.speed_step <= 0.0 {
            return Err("speed_step must be > 0".into());
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Pace {
    cfg: PaceCfg,
    speed: f64,
    accumulator: f64,
}

impl Pace {
    pub fn new(cfg: PaceCfg) -> Self {
        Self {
            cfg,
            speed: cfg.initial_speed,
            accumulator: 0.0,
        }
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Current speed relative to the initial one.
    #[inline]
    pub fn multiplier(&self) -> f64 {
        self.speed / self.cfg.initial_speed
    }

    #[inline]
    fn step_size(&self) -> f64 {
        self.cfg.speed_step * (self.speed / 10.0).floor().max(1.0)
    }

    pub fn faster(&mut self) -> f64 {
        self.speed = (self.speed + self.step_size()).min(self.cfg.max_speed);
        self.speed
    }

    pub fn slower(&mut self) -> f64 {
        self.speed = (self.speed - self.step_size()).max(self.cfg.min_speed);
        self.speed
    }

    /// Set the speed directly (clamped to the bounds).
    pub fn set_speed(&mut self, speed: f64) -> f64 {
        self.speed = speed.clamp(self.cfg.min_speed, self.cfg.max_speed);
        self.speed
    }

    /// Points to generate this frame at `frame_rate` frames per second.
    ///
    /// A non-positive or non-finite frame rate yields 0 and leaves the carry alone.
    pub fn tick(&mut self, frame_rate: f64) -> usize {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return 0;
        }
        self.accumulator += self.speed / frame_rate;
        let whole = self.accumulator.floor();
        self.accumulator -= whole;
        whole as usize
    }

    pub fn reset(&mut self) {
        self.speed = self.cfg.initial_speed;
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds_are_valid() {
        assert!(PaceCfg::default().check().is_ok());
        let bad = PaceCfg {
            min_speed: 10.0,
            ..PaceCfg::default()
        };
        assert!(bad.check().is_err());
    }

    #[test]
    fn step_grows_with_speed() {
        let mut pace = Pace::new(PaceCfg::default());
        assert_eq!(pace.faster(), 2.0);
        pace.set_speed(10.0);
        assert_eq!(pace.faster(), 11.0);
        pace.set_speed(250.0);
        assert_eq!(pace.faster(), 275.0);
        assert_eq!(pace.slower(), 248.0);
        assert!((pace.multiplier() - 248.0).abs() < 1e-12);
    }

    #[test]
    fn speed_is_clamped() {
        let mut pace = Pace::new(PaceCfg::default());
        assert_eq!(pace.slower(), 1.0);
        pace.set_speed(99_999.0);
        assert_eq!(pace.faster(), 100_000.0);
    }

    #[test]
    fn tick_accumulates_fractions() {
        let mut pace = Pace::new(PaceCfg::default());
        pace.set_speed(30.0);
        let counts: Vec<usize> = (0..120).map(|_| pace.tick(120.0)).collect();
        // 0.25 points per frame: one point every fourth frame.
        assert_eq!(counts.iter().sum::<usize>(), 30);
        assert_eq!(&counts[..4], &[0, 0, 0, 1]);
        assert_eq!(pace.tick(0.0), 0);
    }
}
