//! Engine behavior: history bounds, counters, recovery, twin and coverage modes.

use super::*;
use crate::geom::{barycentric, project_to_segment, GeomError, Point, Point2, Point3, Polygon};
use crate::history::TrimPolicy;
use nalgebra::{vector, Matrix3};
use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

fn cfg(max_history: usize, trim: TrimPolicy) -> EngineCfg {
    EngineCfg {
        max_history,
        trim,
        ..EngineCfg::default()
    }
}

fn in_triangle(p: &Point2, poly: &Polygon<2>, tol: f64) -> bool {
    let (a, b, c) = poly.triangle().unwrap();
    let w = barycentric(p, &a, &b, &c).unwrap();
    w.iter().all(|x| *x >= -tol && *x <= 1.0 + tol)
}

fn in_tetrahedron(p: &Point3, poly: &Polygon<3>, tol: f64) -> bool {
    let v = poly.vertices();
    let m = Matrix3::from_columns(&[v[1] - v[0], v[2] - v[0], v[3] - v[0]]);
    let lam = m.try_inverse().unwrap() * (p - v[0]);
    let l0 = 1.0 - lam.sum();
    l0 >= -tol && lam.iter().all(|x| *x >= -tol)
}

/// All level-`depth` sub-triangles of the Sierpinski construction.
fn sub_triangles(a: Point2, b: Point2, c: Point2, depth: u32, out: &mut Vec<[Point2; 3]>) {
    if depth == 0 {
        out.push([a, b, c]);
        return;
    }
    let ab = (a + b) / 2.0;
    let bc = (b + c) / 2.0;
    let ca = (c + a) / 2.0;
    sub_triangles(a, ab, ca, depth - 1, out);
    sub_triangles(ab, b, bc, depth - 1, out);
    sub_triangles(ca, bc, c, depth - 1, out);
}

#[test]
fn eviction_scenario_unit_triangle() {
    let poly = Polygon::unit_triangle();
    let mut game = ChaosGame::new(poly, cfg(1000, TrimPolicy::Evict), Some(42)).unwrap();
    let report = game.advance(5000).unwrap();
    assert_eq!(report.points_added, 5000);
    assert!(!report.limit_reached);
    let snap = game.snapshot();
    assert_eq!(snap.history.len(), 1000);
    assert_eq!(snap.stats.total_generated, 5000);
    for p in snap.history.iter() {
        assert!((-0.01..=1.01).contains(&p.x), "x out of box: {p:?}");
        assert!((-0.01..=0.87).contains(&p.y), "y out of box: {p:?}");
    }
    assert_eq!(snap.history.last(), Some(&snap.current));
    assert!(snap.twin.is_none() && snap.coverage.is_none());
}

#[test]
fn hard_stop_reports_limit() {
    let poly = Polygon::sierpinski_triangle();
    let mut game = ChaosGame::new(poly, cfg(100, TrimPolicy::HardStop), Some(1)).unwrap();
    let r1 = game.advance(60).unwrap();
    assert_eq!(r1.points_added, 60);
    assert!(!r1.limit_reached);
    let r2 = game.advance(60).unwrap();
    assert_eq!(r2.points_added, 40);
    assert!(r2.limit_reached);
    let frozen = game.current();
    let r3 = game.advance(10).unwrap();
    assert_eq!(r3.points_added, 0);
    assert!(r3.limit_reached);
    assert_eq!(game.current(), frozen);
    assert_eq!(game.stats().total_generated, 100);
    assert_eq!(game.history().len(), 100);
}

#[test]
fn recorded_start_counts_toward_history_only() {
    let poly = Polygon::unit_triangle();
    let c = EngineCfg {
        record_start: true,
        ..cfg(10, TrimPolicy::HardStop)
    };
    let mut game = ChaosGame::new(poly, c, Some(5)).unwrap();
    assert_eq!(game.history().len(), 1);
    let r = game.advance(20).unwrap();
    assert_eq!(r.points_added, 9);
    assert!(r.limit_reached);
    assert_eq!(game.stats().total_generated, 9);
}

#[test]
fn total_generated_tracks_points_added() {
    let poly = Polygon::unit_triangle();
    let mut game = ChaosGame::new(poly, cfg(50, TrimPolicy::Evict), Some(9)).unwrap();
    let mut sum = 0u64;
    let mut last_total = 0u64;
    for n in [0usize, 1, 7, 49, 50, 51, 200] {
        let r = game.advance(n).unwrap();
        sum += r.points_added as u64;
        let total = game.stats().total_generated;
        assert_eq!(total, sum);
        assert!(total >= last_total);
        last_total = total;
        assert!(game.history().len() <= 50);
    }
    assert_eq!(game.history().len(), 50);
}

#[test]
fn seeded_runs_repeat() {
    let run = || {
        let mut g = ChaosGame::new(Polygon::unit_triangle(), cfg(500, TrimPolicy::Evict), Some(77))
            .unwrap();
        g.advance(300).unwrap();
        g.history().to_vec()
    };
    assert_eq!(run(), run());
}

#[test]
fn reset_clears_state_and_restarts_inside() {
    let poly = Polygon::unit_triangle();
    let mut game = ChaosGame::new(poly.clone(), cfg(100, TrimPolicy::Evict), Some(3)).unwrap();
    game.advance(250).unwrap();
    game.reset(None).unwrap();
    assert_eq!(game.history().len(), 0);
    assert_eq!(game.stats(), Stats::default());
    assert!(in_triangle(&game.current(), &poly, 1e-12));

    let start = vector![0.2, 0.1];
    game.reset(Some(start)).unwrap();
    assert_eq!(game.current(), start);

    let rec = EngineCfg {
        record_start: true,
        ..cfg(100, TrimPolicy::Evict)
    };
    let mut game = ChaosGame::new(poly, rec, Some(3)).unwrap();
    game.advance(10).unwrap();
    game.reset(None).unwrap();
    assert_eq!(game.history().len(), 1);
    assert_eq!(game.stats().total_generated, 0);
}

#[test]
fn reset_rejects_non_finite_start_without_changes() {
    let mut game =
        ChaosGame::new(Polygon::unit_triangle(), cfg(100, TrimPolicy::Evict), Some(3)).unwrap();
    game.advance(5).unwrap();
    let before = game.current();
    let err = game.reset(Some(vector![f64::INFINITY, 0.0])).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfig { .. }));
    assert_eq!(game.current(), before);
    assert_eq!(game.history().len(), 5);
}

#[test]
fn invalid_config_is_rejected() {
    let poly = Polygon::unit_triangle();
    let zero = ChaosGame::new(poly.clone(), cfg(0, TrimPolicy::Evict), None);
    assert!(matches!(zero, Err(EngineError::InvalidConfig { .. })));
    let bad_decay = EngineCfg {
        decay_rate: 0.0,
        ..EngineCfg::default()
    };
    assert!(ChaosGame::new(poly.clone(), bad_decay, None).is_err());
    let bad_start = ChaosGame::with_start(poly, EngineCfg::default(), vector![f64::NAN, 0.0], None);
    assert!(matches!(bad_start, Err(EngineError::InvalidConfig { .. })));
    let short = Polygon::new(vec![vector![0.0, 0.0], vector![1.0, 0.0]]).map_err(EngineError::from);
    assert!(matches!(short, Err(EngineError::InvalidConfig { .. })));
}

#[test]
fn far_start_is_projected_once_then_stays_inside() {
    let poly = Polygon::unit_triangle();
    let mut game =
        ChaosGame::with_start(poly.clone(), cfg(1000, TrimPolicy::Evict), vector![100.0, 100.0], Some(8))
            .unwrap();
    game.advance(500).unwrap();
    assert_eq!(game.stats().projections, 1);
    for p in game.history().iter() {
        assert!(in_triangle(p, &poly, 1e-9));
    }
}

#[test]
fn far_pyramid_start_falls_back_to_edge_projection() {
    let poly = Polygon::sierpinski_pyramid();
    let start = vector![50.0, -40.0, 60.0];
    let mut game =
        ChaosGame::with_start(poly.clone(), cfg(2000, TrimPolicy::Evict), start, Some(13)).unwrap();
    game.advance(2000).unwrap();
    assert!(game.stats().projections >= 1);
    // The first committed point is the recovery projection and lies on an edge.
    let first = *game.history().first().unwrap();
    let on_edge = poly.edges().iter().any(|&(i, j)| {
        let q = project_to_segment(&first, &poly.vertex(i), &poly.vertex(j)).unwrap();
        (first - q).norm() < 1e-12
    });
    assert!(on_edge, "first point {first:?} is not on an edge");
    assert!(game.history().iter().all(|p| in_tetrahedron(p, &poly, 1e-9)));
}

#[test]
fn degenerate_triangle_surfaces_geometry_error_without_corruption() {
    let poly = Polygon::new(vec![
        vector![0.0, 0.0],
        vector![0.0, 0.0],
        vector![1.0, 0.0],
    ])
    .unwrap();
    let start = vector![100.0, 100.0];
    let mut game =
        ChaosGame::with_start(poly.clone(), cfg(10, TrimPolicy::Evict), start, Some(2)).unwrap();
    let err = game.advance(3).unwrap_err();
    assert!(matches!(err, EngineError::Geometry { .. }));
    assert_eq!(game.current(), start);
    assert!(game.history().is_empty());
    assert_eq!(game.stats().total_generated, 0);

    let twin_cfg = EngineCfg {
        mode: Mode::Twin,
        ..EngineCfg::default()
    };
    let twin = ChaosGame::with_start(poly, twin_cfg, vector![0.3, 0.3], Some(2));
    assert!(matches!(twin, Err(EngineError::Geometry { .. })));
}

#[test]
fn validation_off_still_walks_inside() {
    let poly = Polygon::sierpinski_triangle();
    let c = EngineCfg {
        validate_points: false,
        ..cfg(2000, TrimPolicy::Evict)
    };
    let mut game = ChaosGame::new(poly.clone(), c, Some(4)).unwrap();
    game.advance(2000).unwrap();
    assert!(game.history().iter().all(|p| in_triangle(p, &poly, 1e-9)));
    assert_eq!(game.stats().projections, 0);
}

#[test]
fn pyramid_points_stay_in_tetrahedron() {
    let poly = Polygon::sierpinski_pyramid();
    let mut game = ChaosGame::new(poly.clone(), cfg(5000, TrimPolicy::Evict), Some(21)).unwrap();
    game.advance(5000).unwrap();
    assert_eq!(game.history().len(), 5000);
    assert!(game.history().iter().all(|p| in_tetrahedron(p, &poly, 1e-9)));
}

#[test]
fn twin_distance_converges() {
    let poly = Polygon::unit_triangle();
    let c = EngineCfg {
        mode: Mode::Twin,
        record_start: true,
        ..cfg(5000, TrimPolicy::Evict)
    };
    let mut game = ChaosGame::with_start(poly, c, vector![0.4, 0.4], Some(2024)).unwrap();
    {
        let snap = game.snapshot();
        let twin = snap.twin.expect("twin view");
        assert!((twin.point - vector![0.25, 0.433]).norm() < 1e-12);
        assert_eq!(twin.path.len(), 1);
    }
    game.advance(3000).unwrap();
    let snap = game.snapshot();
    let twin = snap.twin.expect("twin view");
    let d: Vec<f64> = twin.distances.iter().copied().collect();
    assert_eq!(d.len(), 3000);
    assert_eq!(twin.path.len(), 3001);
    // Same vertex for both points: the gap halves until rounding takes over.
    for k in 0..30 {
        assert!(d[k + 1] < d[k], "step {k}: {} !< {}", d[k + 1], d[k]);
    }
    let rolling = game.rolling_distance().unwrap();
    assert_eq!(rolling.len(), 3000 - 50 + 1);
    for k in 0..rolling.len() - 500 {
        assert!(rolling[k + 500] <= rolling[k] + 1e-12);
    }
    assert!(rolling[0] > 1e-4);
    assert!(*rolling.last().unwrap() < 1e-12);
    assert_eq!(snap.stats.initial_distance, Some(d[0]));
    assert_eq!(snap.stats.last_distance, Some(d[2999]));

    let theory = game.theoretical_distance().unwrap();
    assert_eq!(theory.len(), 3000);
    assert_eq!(theory[0], d[0]);
}

#[test]
fn twin_series_is_bounded_by_history() {
    let c = EngineCfg {
        mode: Mode::Twin,
        ..cfg(100, TrimPolicy::Evict)
    };
    let mut game = ChaosGame::new(Polygon::unit_triangle(), c, Some(6)).unwrap();
    game.advance(1000).unwrap();
    let snap = game.snapshot();
    let twin = snap.twin.unwrap();
    assert_eq!(twin.distances.len(), 100);
    assert_eq!(twin.path.len(), 100);
    assert_eq!(snap.history.len(), 100);
    assert!(game.rolling_distance().is_some());
    assert!(ChaosGame::new(Polygon::unit_triangle(), EngineCfg::default(), Some(1))
        .unwrap()
        .rolling_distance()
        .is_none());
}

#[test]
fn coverage_reaches_every_cell_of_the_attractor() {
    let poly = Polygon::unit_triangle();
    let c = EngineCfg {
        mode: Mode::Coverage,
        grid_size: 50,
        ..cfg(1000, TrimPolicy::Evict)
    };
    let mut game = ChaosGame::new(poly.clone(), c, Some(99)).unwrap();
    for _ in 0..100 {
        game.advance(1000).unwrap();
    }
    let snap = game.snapshot();
    let cov = snap.coverage.expect("coverage view");
    let grid = cov.grid;
    assert_eq!(grid.size(), 50);
    assert_eq!(grid.total(), 100_000);
    assert_eq!(grid.dropped(), 0);
    assert_eq!(cov.probe.progress().len(), 100);
    assert_eq!(snap.stats.found, cov.probe.found());

    // A level-7 sub-triangle carries 3^-7 of the mass (~46 of 100k visits). Every
    // one that fits inside a single cell must have marked that cell.
    let (a, b, cc) = poly.triangle().unwrap();
    let mut tris = Vec::new();
    sub_triangles(a, b, cc, 7, &mut tris);
    let mut checked = 0;
    for t in &tris {
        let cells: Vec<_> = t.iter().map(|p| grid.cell_of(p.x, p.y)).collect();
        if let Some((row, col)) = cells[0] {
            if cells.iter().all(|c| *c == cells[0]) {
                assert!(grid.count(row, col) > 0, "empty cell ({row}, {col})");
                checked += 1;
            }
        }
    }
    assert!(checked > 500, "only {checked} sub-triangles checked");
}

#[test]
fn coverage_probe_finds_points_near_target() {
    let c = EngineCfg {
        mode: Mode::Coverage,
        ..cfg(10_000, TrimPolicy::Evict)
    };
    let mut game = ChaosGame::new(Polygon::unit_triangle(), c, Some(12)).unwrap();
    game.advance(50_000).unwrap();
    let snap = game.snapshot();
    let probe = snap.coverage.unwrap().probe;
    assert_eq!(probe.progress().len(), 1);
    for p in probe.found_points() {
        assert!((p - probe.target()).norm() < probe.epsilon());
    }
    assert_eq!(probe.found_points().len() as u64, probe.found().min(10_000));
}

#[test]
fn display_points_downsample_history() {
    let mut game =
        ChaosGame::new(Polygon::unit_triangle(), cfg(1000, TrimPolicy::Evict), Some(5)).unwrap();
    game.advance(1000).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(game.display_points(100, 0.5, &mut rng).len(), 50);
    assert_eq!(game.display_points(5000, 0.5, &mut rng).len(), 1000);
}

#[test]
fn drawing_the_display_leaves_the_seeded_walk_alone() {
    let run = |draw: bool| {
        let mut g = ChaosGame::new(Polygon::unit_triangle(), cfg(1000, TrimPolicy::Evict), Some(77))
            .unwrap();
        g.advance(300).unwrap();
        if draw {
            let mut rng = StdRng::seed_from_u64(3);
            assert_eq!(g.display_points(100, 0.5, &mut rng).len(), 50);
        }
        g.advance(300).unwrap();
        g.history().to_vec()
    };
    assert_eq!(run(true), run(false));
}

#[test]
fn single_cell_grid_is_rejected() {
    let c = EngineCfg {
        mode: Mode::Coverage,
        grid_size: 1,
        ..EngineCfg::default()
    };
    let err = ChaosGame::new(Polygon::unit_triangle(), c, Some(1)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfig { .. }));
    assert!(err.to_string().contains("grid_size"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn points_stay_in_triangle_hull(
        seed in any::<u64>(),
        u in 0.0f64..1.0,
        v in 0.0f64..1.0,
        n in 1usize..400,
    ) {
        let poly = Polygon::sierpinski_triangle();
        let (a, b, c) = poly.triangle().unwrap();
        let (u, v) = if u + v > 1.0 { (1.0 - u, 1.0 - v) } else { (u, v) };
        let start: Point<2> = a * (1.0 - u - v) + b * u + c * v;
        let mut game = ChaosGame::with_start(poly.clone(), cfg(256, TrimPolicy::Evict), start, Some(seed))
            .unwrap();
        let r = game.advance(n).unwrap();
        prop_assert_eq!(r.points_added, n);
        prop_assert_eq!(game.history().len(), n.min(256));
        for p in game.history().iter() {
            prop_assert!(in_triangle(p, &poly, 1e-9));
        }
    }

    #[test]
    fn history_length_matches_policy(
        cap in 1usize..300,
        calls in proptest::collection::vec(0usize..120, 1..6),
        stop in any::<bool>(),
    ) {
        let trim = if stop { TrimPolicy::HardStop } else { TrimPolicy::Evict };
        let mut game = ChaosGame::new(Polygon::unit_triangle(), cfg(cap, trim), Some(1)).unwrap();
        let mut requested = 0usize;
        for n in calls {
            game.advance(n).unwrap();
            requested += n;
            prop_assert_eq!(game.history().len(), requested.min(cap));
        }
    }
}

#[test]
fn geom_errors_map_onto_engine_errors() {
    let e: EngineError = GeomError::degenerate("x").into();
    assert!(matches!(e, EngineError::Geometry { .. }));
    assert!(e.to_string().contains("geometry"));
}
