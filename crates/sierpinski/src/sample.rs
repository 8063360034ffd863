//! Random starting points inside the polygon.
//!
//! - Triangle: the folded unit-square trick (`u + v > 1` → `(1 - u, 1 - v)`), which
//!   is uniform over the triangle's area.
//! - Any other polygon: Dirichlet(1, …, 1) weights from normalized exponentials.
//!   Uniform for a simplex (e.g. the tetrahedron), a random convex combination
//!   otherwise.

use rand::Rng;

use crate::geom::{Point, Polygon};

/// Draw a point in the convex hull of `polygon`.
pub fn sample_interior<const D: usize, R: Rng + ?Sized>(
    polygon: &Polygon<D>,
    rng: &mut R,
) -> Point<D> {
    if let Some((a, b, c)) = polygon.triangle() {
        let mut u: f64 = rng.gen();
        let mut v: f64 = rng.gen();
        if u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }
        return a * (1.0 - u - v) + b * u + c * v;
    }
    // 1 - gen() lies in (0, 1], so every weight is finite and >= 0.
    let weights: Vec<f64> = (0..polygon.len())
        .map(|_| -(1.0 - rng.gen::<f64>()).ln())
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return polygon.centroid();
    }
    polygon
        .vertices()
        .iter()
        .zip(&weights)
        .fold(Point::<D>::zeros(), |acc, (v, w)| acc + v * (w / total))
}
