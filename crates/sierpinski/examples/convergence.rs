//! Print the twin-distance decay next to the reference curve.
//!
//! Usage:
//!   cargo run -p sierpinski --example convergence -- [steps] [seed]
//!
//! Both points share every vertex choice, so the measured gap halves per step
//! while the reference curve `d0 * 0.5^(k / 15)` decays much more slowly.

use sierpinski::prelude::*;

fn main() {
    let mut args = std::env::args().skip(1);
    let steps: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(200);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(2025);

    let cfg = EngineCfg {
        mode: Mode::Twin,
        max_history: steps.max(1),
        ..EngineCfg::default()
    };
    let start = Point2::new(0.4, 0.4);
    let mut game = match ChaosGame::with_start(Polygon::unit_triangle(), cfg, start, Some(seed)) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("convergence: {e}");
            return;
        }
    };
    if let Err(e) = game.advance(steps) {
        eprintln!("convergence: {e}");
        return;
    }
    let snap = game.snapshot();
    let Some(twin) = snap.twin else { return };
    let theory = game.theoretical_distance().unwrap_or_default();
    for (k, (d, t)) in twin.distances.iter().zip(&theory).enumerate().step_by(10) {
        println!("k={k:>5}  distance={d:.3e}  theory={t:.3e}");
    }
}
