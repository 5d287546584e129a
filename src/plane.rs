//! Planes in 3D space, polygon classification/splitting, and the projection
//! basis used by the re-tessellator.

use crate::float_types::{EPSILON, Real};
use crate::polygon::Polygon;
use crate::vertex::Vertex;
use nalgebra::{Matrix4, Point2, Point3, Vector3};

/// A plane in normal form: `normal · p == w` for every point `p` on the plane.
///
/// Equality is exact. Tolerance-based plane identification is the business of
/// [`crate::fuzzy::FuzzyFactory`], never of the plane itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// Unit normal vector of the plane
    pub normal: Vector3<Real>,
    /// Distance from origin along `normal`
    pub w: Real,
}

/// How a whole polygon relates to a splitting plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitType {
    /// Lies on the plane, normal agreeing with the plane normal
    CoplanarFront,
    /// Lies on the plane, normal opposing the plane normal
    CoplanarBack,
    /// Entirely in the front half-space (within epsilon)
    Front,
    /// Entirely in the back half-space (within epsilon)
    Back,
    /// Crosses the plane
    Spanning,
}

/// Result of splitting one polygon by a plane.
///
/// For the spanning case, either fragment may be absent when it degenerated
/// below three vertices and was discarded.
#[derive(Debug, Clone)]
pub struct PolygonSplit<S: Clone> {
    pub kind: SplitType,
    pub front: Option<Polygon<S>>,
    pub back: Option<Polygon<S>>,
}

impl Plane {
    pub const fn new(normal: Vector3<Real>, w: Real) -> Self {
        Plane { normal, w }
    }

    /// Plane through three points, normal following the right-hand rule
    /// `(b-a) × (c-a)`. Degenerate triples fall back to the z=0 plane.
    pub fn from_points(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Self {
        let n = (b - a).cross(&(c - a));
        if n.norm_squared() < Real::EPSILON {
            return Plane::new(Vector3::z(), 0.0);
        }
        let normal = n.normalize();
        Plane::new(normal, normal.dot(&a.coords))
    }

    pub fn from_normal_and_point(normal: &Vector3<Real>, point: &Point3<Real>) -> Self {
        let normal = normal.normalize();
        Plane::new(normal, normal.dot(&point.coords))
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    pub fn flipped(&self) -> Self {
        Plane::new(-self.normal, -self.w)
    }

    /// Signed distance of `point` to the plane (positive in front).
    pub fn signed_distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    /// Robust intersection of the segment `p1 -> p2` with the plane.
    ///
    /// The interpolation parameter is clamped to `[0, 1]` and a parallel
    /// segment (NaN parameter) resolves to `p1`, so the result is always a
    /// usable point on the segment.
    pub fn split_line_between_points(
        &self,
        p1: &Point3<Real>,
        p2: &Point3<Real>,
    ) -> Point3<Real> {
        let direction = p2 - p1;
        let mut lambda = (self.w - self.normal.dot(&p1.coords)) / self.normal.dot(&direction);
        if lambda.is_nan() {
            lambda = 0.0;
        }
        p1 + direction * lambda.clamp(0.0, 1.0)
    }

    /// Transform the plane by a homogeneous 4x4 matrix.
    ///
    /// Works by transforming three points spanning the plane and rebuilding,
    /// which stays correct under non-uniform scaling where transforming the
    /// normal directly would not. Mirroring transforms flip the result so the
    /// front half-space is preserved.
    pub fn transformed(&self, matrix: &Matrix4<Real>) -> Self {
        let r = random_non_parallel_vector(&self.normal);
        let u = self.normal.cross(&r);
        let v = self.normal.cross(&u);
        let point1 = Point3::from(self.normal * self.w);
        let point2 = point1 + u;
        let point3 = point1 + v;
        let new_plane = Plane::from_points(
            &matrix.transform_point(&point1),
            &matrix.transform_point(&point2),
            &matrix.transform_point(&point3),
        );
        if is_mirroring(matrix) {
            new_plane.flipped()
        } else {
            new_plane
        }
    }

    /// Classify `polygon` against this plane and split it when spanning.
    ///
    /// Implements the five-way classification with the shared absolute
    /// epsilon: a vertex within `EPSILON` of the plane counts for neither
    /// side. Spanning polygons are cut edge-by-edge; the exact intersection
    /// vertex is emitted to both fragments, adjacent near-duplicate vertices
    /// (within epsilon squared) are collapsed afterwards, and fragments
    /// reduced below three vertices are discarded.
    pub fn split_polygon<S: Clone + Send + Sync + std::fmt::Debug>(
        &self,
        polygon: &Polygon<S>,
    ) -> PolygonSplit<S> {
        // A polygon carrying this exact plane is trivially coplanar-front.
        if polygon.plane == *self {
            return PolygonSplit {
                kind: SplitType::CoplanarFront,
                front: None,
                back: None,
            };
        }

        let vertices = &polygon.vertices;
        let mut has_front = false;
        let mut has_back = false;
        let mut vertex_is_back = Vec::with_capacity(vertices.len());
        for vertex in vertices {
            let t = self.signed_distance(&vertex.pos);
            vertex_is_back.push(t < 0.0);
            if t > EPSILON {
                has_front = true;
            }
            if t < -EPSILON {
                has_back = true;
            }
        }

        let kind = match (has_front, has_back) {
            (false, false) => {
                // all vertices on the plane; orientation decides the side
                if self.normal.dot(&polygon.plane.normal) >= 0.0 {
                    SplitType::CoplanarFront
                } else {
                    SplitType::CoplanarBack
                }
            },
            (true, false) => SplitType::Front,
            (false, true) => SplitType::Back,
            (true, true) => SplitType::Spanning,
        };

        if kind != SplitType::Spanning {
            return PolygonSplit { kind, front: None, back: None };
        }

        let mut front_vertices: Vec<Vertex> = Vec::with_capacity(vertices.len() + 1);
        let mut back_vertices: Vec<Vertex> = Vec::with_capacity(vertices.len() + 1);
        for i in 0..vertices.len() {
            let j = (i + 1) % vertices.len();
            let vertex = vertices[i];
            if vertex_is_back[i] == vertex_is_back[j] {
                // edge stays on one side, contributes its start vertex only
                if vertex_is_back[i] {
                    back_vertices.push(vertex);
                } else {
                    front_vertices.push(vertex);
                }
            } else {
                let intersection = Vertex::new(
                    self.split_line_between_points(&vertex.pos, &vertices[j].pos),
                );
                if vertex_is_back[i] {
                    back_vertices.push(vertex);
                    back_vertices.push(intersection);
                    front_vertices.push(intersection);
                } else {
                    front_vertices.push(vertex);
                    front_vertices.push(intersection);
                    back_vertices.push(intersection);
                }
            }
        }

        let front_vertices = collapse_adjacent(front_vertices);
        let back_vertices = collapse_adjacent(back_vertices);

        let make = |verts: Vec<Vertex>| {
            (verts.len() >= 3).then(|| {
                Polygon::with_plane(verts, polygon.shared.clone(), polygon.plane.clone())
            })
        };
        PolygonSplit {
            kind: SplitType::Spanning,
            front: make(front_vertices),
            back: make(back_vertices),
        }
    }
}

/// Remove consecutive vertices (cyclically) closer than epsilon.
fn collapse_adjacent(mut vertices: Vec<Vertex>) -> Vec<Vertex> {
    if vertices.len() < 3 {
        return vertices;
    }
    let eps_squared = EPSILON * EPSILON;
    let mut prev = vertices[vertices.len() - 1];
    let mut i = 0;
    while i < vertices.len() {
        let vertex = vertices[i];
        if vertex.distance_squared_to(&prev) < eps_squared {
            vertices.remove(i);
        } else {
            i += 1;
        }
        prev = vertex;
    }
    vertices
}

/// Any unit vector not parallel to `v`: the coordinate axis along `v`'s
/// smallest component.
pub(crate) fn random_non_parallel_vector(v: &Vector3<Real>) -> Vector3<Real> {
    let abs = v.abs();
    if abs.x <= abs.y && abs.x <= abs.z {
        Vector3::x()
    } else if abs.y <= abs.x && abs.y <= abs.z {
        Vector3::y()
    } else {
        Vector3::z()
    }
}

/// Does this homogeneous transform change handedness?
pub(crate) fn is_mirroring(matrix: &Matrix4<Real>) -> bool {
    matrix.fixed_view::<3, 3>(0, 0).determinant() < 0.0
}

/// An orthonormal basis spanning a plane, used to project coplanar polygons
/// to 2D and lift merged results back to 3D.
#[derive(Debug, Clone)]
pub struct OrthoNormalBasis {
    u: Vector3<Real>,
    v: Vector3<Real>,
    plane: Plane,
}

impl OrthoNormalBasis {
    pub fn new(plane: &Plane) -> Self {
        let right = random_non_parallel_vector(&plane.normal);
        let v = plane.normal.cross(&right).normalize();
        let u = v.cross(&plane.normal);
        OrthoNormalBasis { u, v, plane: plane.clone() }
    }

    /// Project a 3D point into plane coordinates.
    pub fn project(&self, point: &Point3<Real>) -> Point2<Real> {
        Point2::new(point.coords.dot(&self.u), point.coords.dot(&self.v))
    }

    /// Lift plane coordinates back to the 3D plane.
    pub fn lift(&self, point: &Point2<Real>) -> Point3<Real> {
        Point3::from(self.plane.normal * self.plane.w + self.u * point.x + self.v * point.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::Polygon;

    fn unit_square_at_z0() -> Polygon<()> {
        Polygon::new(
            vec![
                Vertex::from_coords(0.0, 0.0, 0.0),
                Vertex::from_coords(1.0, 0.0, 0.0),
                Vertex::from_coords(1.0, 1.0, 0.0),
                Vertex::from_coords(0.0, 1.0, 0.0),
            ],
            None,
        )
    }

    #[test]
    fn classify_coplanar_and_sides() {
        let square = unit_square_at_z0();
        let plane = square.plane.clone();
        assert_eq!(plane.split_polygon(&square).kind, SplitType::CoplanarFront);
        assert_eq!(
            plane.flipped().split_polygon(&square).kind,
            SplitType::CoplanarBack
        );

        let above = Plane::from_normal_and_point(&Vector3::z(), &Point3::new(0.0, 0.0, -1.0));
        assert_eq!(above.split_polygon(&square).kind, SplitType::Front);
        let below = Plane::from_normal_and_point(&Vector3::z(), &Point3::new(0.0, 0.0, 1.0));
        assert_eq!(below.split_polygon(&square).kind, SplitType::Back);
    }

    #[test]
    fn diagonal_split_yields_two_triangles_conserving_area() {
        let square = unit_square_at_z0();
        // plane through the diagonal (0,0) -> (1,1), normal in the xy plane
        let plane = Plane::from_normal_and_point(
            &Vector3::new(1.0, -1.0, 0.0),
            &Point3::origin(),
        );
        let split = plane.split_polygon(&square);
        assert_eq!(split.kind, SplitType::Spanning);
        let front = split.front.expect("front triangle");
        let back = split.back.expect("back triangle");
        assert_eq!(front.vertices.len(), 3);
        assert_eq!(back.vertices.len(), 3);
        assert!((front.area() + back.area() - square.area()).abs() < EPSILON);

        // the shared edge is the exact diagonal
        for tri in [&front, &back] {
            let on_diagonal = tri
                .vertices
                .iter()
                .filter(|v| (v.pos.x - v.pos.y).abs() < 1e-12)
                .count();
            assert_eq!(on_diagonal, 2);
        }
    }

    #[test]
    fn parallel_segment_split_is_clamped() {
        let plane = Plane::new(Vector3::z(), 0.0);
        let p1 = Point3::new(0.0, 0.0, 1.0);
        let p2 = Point3::new(1.0, 0.0, 1.0);
        // segment parallel to the plane resolves to its start point
        assert_eq!(plane.split_line_between_points(&p1, &p2), p1);
    }

    #[test]
    fn transform_keeps_front_halfspace_under_mirroring() {
        let plane = Plane::new(Vector3::z(), 1.0);
        let mirror_z = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 1.0, -1.0));
        let t = plane.transformed(&mirror_z);
        // plane z=1 mirrored through z=0 becomes z=-1 with the normal still
        // pointing away from the mirrored front side
        assert!((t.normal - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-9);
        assert!((t.w - 1.0).abs() < 1e-9);
    }
}
