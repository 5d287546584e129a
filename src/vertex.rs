//! Struct and functions for working with `Vertex`s from which `Polygon`s are composed.

use crate::float_types::Real;
use nalgebra::{Matrix4, Point3};

/// A vertex of a polygon: an immutable position in model space.
///
/// Identity for deduplication purposes is not carried on the vertex itself;
/// it is assigned per-operation by the fuzzy factories as a canonical index
/// (see [`crate::fuzzy`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Point3<Real>,
}

impl Vertex {
    #[inline]
    pub const fn new(pos: Point3<Real>) -> Self {
        Vertex { pos }
    }

    #[inline]
    pub fn from_coords(x: Real, y: Real, z: Real) -> Self {
        Vertex::new(Point3::new(x, y, z))
    }

    /// Linearly interpolate between `self` and `other` at parameter `t`.
    pub fn interpolate(&self, other: &Vertex, t: Real) -> Vertex {
        Vertex::new(self.pos + (other.pos - self.pos) * t)
    }

    pub fn distance_squared_to(&self, other: &Vertex) -> Real {
        (self.pos - other.pos).norm_squared()
    }

    /// Apply an affine transform given as a homogeneous 4x4 matrix.
    pub fn transformed(&self, matrix: &Matrix4<Real>) -> Vertex {
        Vertex::new(matrix.transform_point(&self.pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Translation3;

    #[test]
    fn interpolation_endpoints_and_midpoint() {
        let a = Vertex::from_coords(0.0, 0.0, 0.0);
        let b = Vertex::from_coords(2.0, -4.0, 6.0);
        assert_eq!(a.interpolate(&b, 0.0), a);
        assert_eq!(a.interpolate(&b, 1.0), b);
        assert_eq!(a.interpolate(&b, 0.5), Vertex::from_coords(1.0, -2.0, 3.0));
    }

    #[test]
    fn transform_translates_position() {
        let v = Vertex::from_coords(1.0, 2.0, 3.0);
        let m = Translation3::new(10.0, 0.0, -1.0).to_homogeneous();
        assert_eq!(v.transformed(&m), Vertex::from_coords(11.0, 2.0, 2.0));
    }
}
