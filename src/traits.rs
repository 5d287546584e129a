//! Shared trait for constructive solid geometry operations.

use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::float_types::{PI, Real};
use crate::plane::Plane;
use nalgebra::{Matrix3, Matrix4, Rotation3, Translation3, Vector3};

/// Boolean and rigid operations common to CSG shapes.
///
/// Implementors provide the boolean core and transform plumbing; the
/// positioning conveniences (translate, rotate, scale, mirror, center) are
/// derived from [`Csg::transform`].
pub trait Csg: Sized + Clone {
    /// The empty shape.
    fn new() -> Self;

    /// Return a new shape representing union of the two shapes.
    ///
    /// ```text
    ///    +-------+            +-------+
    ///    |       |            |       |
    ///    |   A   |            |       |
    ///    |    +--+----+   =   |       +----+
    ///    +----+--+    |       +----+       |
    ///         |   B   |            |       |
    ///         |       |            |       |
    ///         +-------+            +-------+
    /// ```
    fn union(&self, other: &Self) -> Self;

    /// Return a new shape representing the difference of the two shapes.
    ///
    /// ```text
    ///    +-------+            +-------+
    ///    |       |            |       |
    ///    |   A   |            |       |
    ///    |    +--+----+   =   |    +--+
    ///    +----+--+    |       +----+
    ///         |   B   |
    ///         |       |
    ///         +-------+
    /// ```
    fn difference(&self, other: &Self) -> Self;

    /// Return a new shape representing the intersection of the two shapes.
    ///
    /// ```text
    ///    +-------+
    ///    |       |
    ///    |   A   |
    ///    |    +--+----+   =   +--+
    ///    +----+--+    |       +--+
    ///         |   B   |
    ///         |       |
    ///         +-------+
    /// ```
    fn intersection(&self, other: &Self) -> Self;

    /// Return a new shape representing space in either this shape or `other`
    /// but not both.
    fn xor(&self, other: &Self) -> Self {
        self.difference(other).union(&other.difference(self))
    }

    /// Apply an arbitrary affine transform given as a homogeneous 4x4 matrix.
    fn transform(&self, matrix: &Matrix4<Real>) -> Self;

    /// The shape turned inside-out.
    fn inverse(&self) -> Self;

    /// Axis-aligned bounding box of the shape.
    fn bounding_box(&self) -> Aabb;

    /// Drop any cached bounding box after external mutation.
    fn invalidate_bounding_box(&mut self);

    fn translate(&self, x: Real, y: Real, z: Real) -> Self {
        self.translate_vector(Vector3::new(x, y, z))
    }

    fn translate_vector(&self, vector: Vector3<Real>) -> Self {
        self.transform(&Translation3::from(vector).to_homogeneous())
    }

    /// Translate so the bounding-box center lands on the origin.
    fn center(&self) -> Self {
        let aabb = self.bounding_box();
        let center = aabb.center();
        self.translate(-center.x, -center.y, -center.z)
    }

    /// Translate so the bottom of the bounding box sits at z = 0.
    fn float(&self) -> Self {
        let aabb = self.bounding_box();
        self.translate(0.0, 0.0, -aabb.mins.z)
    }

    /// Rotate about the x, y and z axes by the given angles in degrees.
    fn rotate(&self, x_deg: Real, y_deg: Real, z_deg: Real) -> Self {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), x_deg * PI / 180.0);
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), y_deg * PI / 180.0);
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), z_deg * PI / 180.0);
        self.transform(&(rz * ry * rx).to_homogeneous())
    }

    fn scale(&self, sx: Real, sy: Real, sz: Real) -> Self {
        self.transform(&Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz)))
    }

    /// Mirror across an arbitrary plane.
    fn mirror(&self, plane: Plane) -> Self {
        let n = plane.normal;
        let reflection = (Matrix3::identity() - 2.0 * n * n.transpose()).to_homogeneous();
        let offset = Translation3::from(2.0 * plane.w * n).to_homogeneous();
        self.transform(&(offset * reflection))
    }
}
