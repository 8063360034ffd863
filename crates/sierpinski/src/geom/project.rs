//! Projections onto the polygon and the twin-point rule.
//!
//! - `barycentric`: weights `(u, v, w)` with `p = u A + v B + w C` (projected onto
//!   the triangle's plane when `D > 2`).
//! - `clamp_to_triangle`: clamp weights to [0,1], renormalize, recombine.
//! - `project_to_segment` / `nearest_edge_point`: closest point on an edge set.
//! - `nearest_anchor` / `twin_point`: coarse "nearest point on the attractor" used
//!   to seed convergence runs. Inside the triangle it only considers the corners
//!   and edge midpoints, not the exact nearest point; downstream statistics depend
//!   on that choice.

use nalgebra::Vector3;

use super::cfg::{DENOM_EPS, EDGE_EPS};
use super::types::{GeomError, Point, Polygon};

/// One chaos-game step: halfway from `p` toward `q`.
#[inline]
pub fn midpoint<const D: usize>(p: &Point<D>, q: &Point<D>) -> Point<D> {
    (p + q) / 2.0
}

/// Barycentric coordinates of `p` relative to triangle `(a, b, c)`.
///
/// Fails with `Degenerate` when the triangle has (near) zero area.
pub fn barycentric<const D: usize>(
    p: &Point<D>,
    a: &Point<D>,
    b: &Point<D>,
    c: &Point<D>,
) -> Result<Vector3<f64>, GeomError> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);
    let denom = d00 * d11 - d01 * d01;
    if !denom.is_finite() || denom.abs() <= DENOM_EPS {
        return Err(GeomError::degenerate(format!(
            "triangle has zero area (gram determinant {denom:e})"
        )));
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Ok(Vector3::new(1.0 - v - w, v, w))
}

/// Closest point to `p` on the closed triangle, via barycentric clamp.
///
/// Each weight is clamped to [0,1] independently and the triple renormalized. This
/// lands on the triangle but is not always the Euclidean nearest point.
pub fn clamp_to_triangle<const D: usize>(
    p: &Point<D>,
    a: &Point<D>,
    b: &Point<D>,
    c: &Point<D>,
) -> Result<Point<D>, GeomError> {
    let bc = barycentric(p, a, b, c)?;
    let clamped = bc.map(|x| x.clamp(0.0, 1.0));
    // u = 1 - v - w keeps at least one clamped weight positive.
    let total = clamped.sum();
    if total <= 0.0 {
        return Err(GeomError::degenerate("barycentric weights vanished"));
    }
    let k = clamped / total;
    Ok(a * k.x + b * k.y + c * k.z)
}

/// Projection of `p` onto the segment `[e0, e1]` (parameter clamped to [0,1]).
pub fn project_to_segment<const D: usize>(
    p: &Point<D>,
    e0: &Point<D>,
    e1: &Point<D>,
) -> Result<Point<D>, GeomError> {
    let dir = e1 - e0;
    let len2 = dir.dot(&dir);
    if !len2.is_finite() || len2 <= EDGE_EPS {
        return Err(GeomError::degenerate("zero-length edge"));
    }
    let t = ((p - e0).dot(&dir) / len2).clamp(0.0, 1.0);
    Ok(e0 + dir * t)
}

/// Closest edge projection over `polygon.edges()`; first edge wins on ties.
pub fn nearest_edge_point<const D: usize>(
    p: &Point<D>,
    polygon: &Polygon<D>,
) -> Result<Point<D>, GeomError> {
    let mut best: Option<(f64, Point<D>)> = None;
    for &(i, j) in polygon.edges() {
        let q = project_to_segment(p, &polygon.vertex(i), &polygon.vertex(j))?;
        let d = (q - p).norm();
        if best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, q));
        }
    }
    best.map(|(_, q)| q)
        .ok_or_else(|| GeomError::degenerate("polygon has no edges"))
}

/// Nearest of {A, B, C, mid(AB), mid(BC), mid(CA)} to `p`; first wins on ties.
pub fn nearest_anchor<const D: usize>(
    p: &Point<D>,
    a: &Point<D>,
    b: &Point<D>,
    c: &Point<D>,
) -> Point<D> {
    let anchors = [
        *a,
        *b,
        *c,
        midpoint(a, b),
        midpoint(b, c),
        midpoint(c, a),
    ];
    let mut best = anchors[0];
    let mut best_d = (best - p).norm();
    for q in &anchors[1..] {
        let d = (q - p).norm();
        if d < best_d {
            best = *q;
            best_d = d;
        }
    }
    best
}

/// Twin point for convergence runs: a point on the attractor near `p`.
///
/// Triangle: inside → `nearest_anchor`; outside → nearest edge projection.
/// Other polygons: nearest edge projection (edges lie on the attractor).
pub fn twin_point<const D: usize>(
    p: &Point<D>,
    polygon: &Polygon<D>,
) -> Result<Point<D>, GeomError> {
    match polygon.triangle() {
        Some((a, b, c)) => {
            let bc = barycentric(p, &a, &b, &c)?;
            if bc.iter().all(|x| (0.0..=1.0).contains(x)) {
                Ok(nearest_anchor(p, &a, &b, &c))
            } else {
                nearest_edge_point(p, polygon)
            }
        }
        None => nearest_edge_point(p, polygon),
    }
}

/// Recovery projection used when resampling gave up: barycentric clamp for a
/// triangle, nearest edge projection otherwise.
pub fn project_into<const D: usize>(
    p: &Point<D>,
    polygon: &Polygon<D>,
) -> Result<Point<D>, GeomError> {
    let q = match polygon.triangle() {
        Some((a, b, c)) => clamp_to_triangle(p, &a, &b, &c)?,
        None => nearest_edge_point(p, polygon)?,
    };
    if q.iter().any(|x| !x.is_finite()) {
        return Err(GeomError::degenerate("projection produced a non-finite point"));
    }
    Ok(q)
}
