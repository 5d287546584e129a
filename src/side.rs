//! Directed 2D line segments, the boundary elements of an [`crate::area::Area`].

use crate::errors::ValidationError;
use crate::float_types::Real;
use crate::polygon::Polygon;
use crate::vertex::Vertex;
use nalgebra::{Matrix4, Point2, Point3, Vector2};

/// One directed edge of a 2D region boundary. The region's interior lies to
/// the left of the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Side {
    pub start: Point2<Real>,
    pub end: Point2<Real>,
}

impl Side {
    pub const fn new(start: Point2<Real>, end: Point2<Real>) -> Self {
        Side { start, end }
    }

    pub fn flipped(&self) -> Side {
        Side::new(self.end, self.start)
    }

    pub fn direction(&self) -> Vector2<Real> {
        self.end - self.start
    }

    pub fn length_squared(&self) -> Real {
        (self.end - self.start).norm_squared()
    }

    pub fn length(&self) -> Real {
        (self.end - self.start).norm()
    }

    /// Apply a transform to both endpoints, interpreting them as 3D points
    /// at z = 0.
    pub fn transformed(&self, matrix: &Matrix4<Real>) -> Side {
        let lift = |p: &Point2<Real>| Point3::new(p.x, p.y, 0.0);
        let drop = |p: Point3<Real>| Point2::new(p.x, p.y);
        Side::new(
            drop(matrix.transform_point(&lift(&self.start))),
            drop(matrix.transform_point(&lift(&self.end))),
        )
    }

    /// Extrude the side into a rectangular wall polygon spanning the z range
    /// `[z0, z1]`. With `z0 < z1` and the interior to the left of the side,
    /// the wall's normal points out of the extruded region.
    pub fn to_wall_polygon(&self, z0: Real, z1: Real) -> Polygon<()> {
        Polygon::new(
            vec![
                Vertex::from_coords(self.start.x, self.start.y, z0),
                Vertex::from_coords(self.end.x, self.end.y, z0),
                Vertex::from_coords(self.end.x, self.end.y, z1),
                Vertex::from_coords(self.start.x, self.start.y, z1),
            ],
            None,
        )
    }

    /// Recover a side from a wall polygon that came back out of a 3D boolean
    /// pass over `to_wall_polygon(-1, 1)` walls.
    ///
    /// Booleans can leave residual polygons with fewer than four vertices;
    /// those yield `Ok(None)`. A wall that does not have exactly two
    /// vertices on the positive layer, or whose positive vertices sit at an
    /// unexpected winding offset, indicates broken wall construction and is
    /// an error.
    pub fn from_fake_polygon(polygon: &Polygon<()>) -> Result<Option<Side>, ValidationError> {
        if polygon.vertices.len() < 4 {
            return Ok(None);
        }
        let mut top_indices = Vec::with_capacity(2);
        let mut top_points = Vec::with_capacity(2);
        for (i, vertex) in polygon.vertices.iter().enumerate() {
            if vertex.pos.z > 0.0 {
                top_indices.push(i);
                top_points.push(Point2::new(vertex.pos.x, vertex.pos.y));
            }
        }
        if top_points.len() != 2 {
            return Err(ValidationError::WallVertexCount(top_points.len()));
        }
        let separation = top_indices[1] - top_indices[0];
        match separation {
            1 => top_points.reverse(),
            3 => {},
            _ => return Err(ValidationError::WallIndexOrder(separation)),
        }
        Ok(Some(Side::new(top_points[0], top_points[1])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_round_trip() {
        let side = Side::new(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0));
        let wall = side.to_wall_polygon(-1.0, 1.0);
        let back = Side::from_fake_polygon(&wall)
            .expect("valid wall")
            .expect("not a residual");
        assert_eq!(back, side);
    }

    #[test]
    fn residual_triangle_is_skipped() {
        let triangle: Polygon<()> = Polygon::new(
            vec![
                Vertex::from_coords(0.0, 0.0, -1.0),
                Vertex::from_coords(1.0, 0.0, -1.0),
                Vertex::from_coords(1.0, 0.0, 1.0),
            ],
            None,
        );
        assert_eq!(Side::from_fake_polygon(&triangle), Ok(None));
    }

    #[test]
    fn wall_with_wrong_layer_count_is_an_error() {
        let bad: Polygon<()> = Polygon::new(
            vec![
                Vertex::from_coords(0.0, 0.0, -1.0),
                Vertex::from_coords(1.0, 0.0, -1.0),
                Vertex::from_coords(2.0, 0.0, -1.0),
                Vertex::from_coords(0.0, 1.0, 1.0),
            ],
            None,
        );
        assert_eq!(
            Side::from_fake_polygon(&bad),
            Err(ValidationError::WallVertexCount(1))
        );
    }
}
