//! Core types: points, the fixed polygon, and geometry errors.

use std::fmt;

use nalgebra::SVector;

/// A point in R^D (column vector).
pub type Point<const D: usize> = SVector<f64, D>;
pub type Point2 = Point<2>;
pub type Point3 = Point<3>;

/// Errors surfaced by polygon construction and projections.
#[derive(Clone, Debug, PartialEq)]
pub enum GeomError {
    /// Vertex list unusable as a chaos-game polygon (too few, non-finite, D < 2).
    InvalidPolygon { reason: String },
    /// A division would blow up: zero-length edge or collinear triangle.
    Degenerate { reason: String },
}

impl GeomError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidPolygon {
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::Degenerate {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for GeomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPolygon { reason } => write!(f, "invalid polygon: {reason}"),
            Self::Degenerate { reason } => write!(f, "degenerate geometry: {reason}"),
        }
    }
}

impl std::error::Error for GeomError {}

/// Fixed vertex set the walk is pulled toward.
///
/// Invariants:
/// - At least 3 vertices, all coordinates finite, `D >= 2`.
/// - Immutable after construction; `edges` is derived once.
/// - A simplex (`len <= D + 1`) uses every vertex pair as an edge; a larger vertex
///   list is read as a closed ring in the given order.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon<const D: usize> {
    vertices: Vec<Point<D>>,
    edges: Vec<(usize, usize)>,
}

impl<const D: usize> Polygon<D> {
    pub fn new(vertices: Vec<Point<D>>) -> Result<Self, GeomError> {
        if D < 2 {
            return Err(GeomError::invalid(format!(
                "dimension {D} not supported (need 2 or more)"
            )));
        }
        if vertices.len() < 3 {
            return Err(GeomError::invalid(format!(
                "need at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if let Some(i) = vertices
            .iter()
            .position(|v| v.iter().any(|c| !c.is_finite()))
        {
            return Err(GeomError::invalid(format!("vertex {i} is not finite")));
        }
        Ok(Self::from_trusted(vertices))
    }

    #[inline]
    pub fn vertices(&self) -> &[Point<D>] {
        &self.vertices
    }

    #[inline]
    pub fn vertex(&self, i: usize) -> Point<D> {
        self.vertices[i]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false for a constructed polygon.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex index pairs, see the struct invariants for how they are chosen.
    #[inline]
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    #[inline]
    pub fn is_triangle(&self) -> bool {
        self.vertices.len() == 3
    }

    /// Triangle corners `(A, B, C)` if this polygon has exactly three vertices.
    pub fn triangle(&self) -> Option<(Point<D>, Point<D>, Point<D>)> {
        match self.vertices.as_slice() {
            [a, b, c] => Some((*a, *b, *c)),
            _ => None,
        }
    }

    /// Vertex average.
    pub fn centroid(&self) -> Point<D> {
        let sum = self
            .vertices
            .iter()
            .fold(Point::<D>::zeros(), |acc, v| acc + v);
        sum / self.vertices.len() as f64
    }

    /// Axis-aligned bounding box `(lo, hi)`.
    pub fn bounding_box(&self) -> (Point<D>, Point<D>) {
        let first = self.vertices[0];
        self.vertices
            .iter()
            .skip(1)
            .fold((first, first), |(lo, hi), v| (lo.inf(v), hi.sup(v)))
    }
}

impl Polygon<2> {
    /// Triangle (0,0), (1,0), (0.5, 0.866) used by the convergence and coverage runs.
    pub fn unit_triangle() -> Self {
        Self::from_trusted(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 0.866),
        ])
    }

    /// Equilateral triangle with apex first: (0.5, √0.75), (0,0), (1,0).
    pub fn sierpinski_triangle() -> Self {
        Self::from_trusted(vec![
            Point2::new(0.5, 0.75_f64.sqrt()),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
        ])
    }
}

impl Polygon<3> {
    /// Regular tetrahedron with unit edges standing on the xy-plane.
    pub fn sierpinski_pyramid() -> Self {
        Self::from_trusted(vec![
            Point3::new(0.5, 0.75_f64.sqrt(), 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 3.0_f64.sqrt() / 6.0, (2.0_f64 / 3.0).sqrt()),
        ])
    }
}

impl<const D: usize> Polygon<D> {
    /// Presets are valid by construction and skip the checks in `new`.
    fn from_trusted(vertices: Vec<Point<D>>) -> Self {
        let n = vertices.len();
        let edges = if n <= D + 1 {
            (0..n)
                .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
                .collect()
        } else {
            (0..n).map(|i| (i, (i + 1) % n)).collect()
        };
        Self { vertices, edges }
    }
}
