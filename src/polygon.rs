//! Struct and functions for working with `Polygon`s, the flat convex faces
//! from which solids are composed.

use crate::errors::ValidationError;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::float_types::{EPSILON, Real};
use crate::plane::{Plane, is_mirroring};
use crate::solid::Solid;
use crate::vertex::Vertex;
use nalgebra::{Matrix4, Point3, Vector3};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::OnceLock;

/// A planar convex polygon in 3D, optionally carrying shared application
/// metadata `S` (color, source tag, ...).
///
/// Vertices wind counter-clockwise when viewed from the front side of the
/// polygon's plane. The metadata travels unchanged through splits: both
/// fragments of a cut polygon clone the parent's `shared` value.
#[derive(Debug, Clone)]
pub struct Polygon<S: Clone> {
    /// Vertices in counter-clockwise winding, at least three
    pub vertices: Vec<Vertex>,
    /// The supporting plane, derived from the first three vertices unless
    /// supplied explicitly
    pub plane: Plane,
    /// Application metadata shared by all fragments of this polygon
    pub shared: Option<S>,
    /// Lazily computed bounding box and sphere, reset by nothing: polygons
    /// are treated as immutable once constructed
    bounding: OnceLock<(Aabb, Point3<Real>, Real)>,
}

impl<S: Clone + PartialEq> PartialEq for Polygon<S> {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
            && self.plane == other.plane
            && self.shared == other.shared
    }
}

impl<S: Clone + Send + Sync + Debug> Polygon<S> {
    /// Create a polygon from vertices; the plane is derived from the first
    /// three.
    ///
    /// # Panics
    /// If fewer than three vertices are provided.
    pub fn new(vertices: Vec<Vertex>, shared: Option<S>) -> Self {
        assert!(
            vertices.len() >= 3,
            "degenerate polygon: fewer than 3 vertices"
        );
        let plane = Plane::from_points(
            &vertices[0].pos,
            &vertices[1].pos,
            &vertices[2].pos,
        );
        Polygon {
            vertices,
            plane,
            shared,
            bounding: OnceLock::new(),
        }
    }

    /// Create a polygon with an explicitly supplied plane. Used for split
    /// fragments, which keep the parent's exact plane rather than rederiving
    /// a slightly different one from their own vertices.
    pub fn with_plane(vertices: Vec<Vertex>, shared: Option<S>, plane: Plane) -> Self {
        assert!(
            vertices.len() >= 3,
            "degenerate polygon: fewer than 3 vertices"
        );
        Polygon {
            vertices,
            plane,
            shared,
            bounding: OnceLock::new(),
        }
    }

    /// Reverse winding and flip the plane, turning the polygon inside-out.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
        self.bounding = OnceLock::new();
    }

    pub fn flipped(&self) -> Self {
        let mut poly = self.clone();
        poly.flip();
        poly
    }

    fn bounding(&self) -> &(Aabb, Point3<Real>, Real) {
        self.bounding.get_or_init(|| {
            let mut mins = self.vertices[0].pos;
            let mut maxs = self.vertices[0].pos;
            for vertex in &self.vertices[1..] {
                mins = mins.inf(&vertex.pos);
                maxs = maxs.sup(&vertex.pos);
            }
            let aabb = Aabb::new(mins, maxs);
            let center = nalgebra::center(&mins, &maxs);
            let radius = (maxs - center).norm();
            (aabb, center, radius)
        })
    }

    /// Axis-aligned bounding box over the vertices, cached after the first
    /// call.
    pub fn bounding_box(&self) -> Aabb {
        self.bounding().0
    }

    /// Center and radius of a sphere containing all vertices, cached after
    /// the first call. Used as a cheap precheck before plane splitting.
    pub fn bounding_sphere(&self) -> (Point3<Real>, Real) {
        let (_, center, radius) = *self.bounding();
        (center, radius)
    }

    /// Apply an affine transform. Mirroring transforms reverse the vertex
    /// order so the winding keeps matching the transformed plane.
    pub fn transformed(&self, matrix: &Matrix4<Real>) -> Self {
        let mut vertices: Vec<Vertex> =
            self.vertices.iter().map(|v| v.transformed(matrix)).collect();
        if is_mirroring(matrix) {
            vertices.reverse();
        }
        Polygon::with_plane(vertices, self.shared.clone(), self.plane.transformed(matrix))
    }

    /// Unsigned area of the polygon.
    pub fn area(&self) -> Real {
        let normal = &self.plane.normal;
        let mut doubled = 0.0;
        let anchor = self.vertices[0].pos;
        for window in self.vertices[1..].windows(2) {
            doubled += (window[0].pos - anchor)
                .cross(&(window[1].pos - anchor))
                .dot(normal);
        }
        (doubled / 2.0).abs()
    }

    /// Signed volume of the tetrahedra fanning this polygon from the origin.
    /// Summed over a closed surface with outward windings this yields the
    /// enclosed volume.
    pub fn signed_volume(&self) -> Real {
        let anchor = self.vertices[0].pos.coords;
        let mut total = 0.0;
        for window in self.vertices[1..].windows(2) {
            total += anchor.dot(&window[0].pos.coords.cross(&window[1].pos.coords));
        }
        total / 6.0
    }

    /// Fan-triangulate into vertex triples. Correct for the convex polygons
    /// the boolean pipeline produces.
    pub fn triangulate(&self) -> Vec<[Vertex; 3]> {
        self.vertices[1..]
            .windows(2)
            .map(|w| [self.vertices[0], w[0], w[1]])
            .collect()
    }

    /// Verify convexity: every consecutive edge pair must turn the same way
    /// as the plane normal, within epsilon. Vertices that fail to span a
    /// plane at all are reported as degenerate.
    pub fn check_convex(&self) -> Result<(), ValidationError> {
        let spanning = (self.vertices[1].pos - self.vertices[0].pos)
            .cross(&(self.vertices[2].pos - self.vertices[0].pos));
        if spanning.norm_squared() < EPSILON * EPSILON {
            return Err(ValidationError::DegeneratePolygon(self.vertices[0].pos));
        }
        let n = self.vertices.len();
        for i in 0..n {
            let prev = self.vertices[(i + n - 1) % n].pos;
            let here = self.vertices[i].pos;
            let next = self.vertices[(i + 1) % n].pos;
            let turn = (here - prev).cross(&(next - here)).dot(&self.plane.normal);
            if turn < -EPSILON {
                return Err(ValidationError::NotConvex(here));
            }
        }
        Ok(())
    }
}

impl<S: Clone + Send + Sync + Debug + Hash + Eq> Polygon<S> {
    /// Extrude the polygon along `offset` into a closed prism. The face on
    /// the side the offset points away from becomes the bottom; walls connect
    /// it to the translated top copy.
    pub fn extrude(&self, offset: &Vector3<Real>) -> Solid<S> {
        let mut bottom = self.clone();
        if self.plane.normal.dot(offset) > 0.0 {
            bottom = bottom.flipped();
        }
        let top = bottom.transformed(&Matrix4::new_translation(offset));

        let n = bottom.vertices.len();
        let mut polygons = Vec::with_capacity(n + 2);
        polygons.push(bottom.clone());
        for i in 0..n {
            let next = (i + 1) % n;
            polygons.push(Polygon::new(
                vec![
                    bottom.vertices[i],
                    top.vertices[i],
                    top.vertices[next],
                    bottom.vertices[next],
                ],
                self.shared.clone(),
            ));
        }
        polygons.push(top.flipped());
        Solid::from_polygons(polygons)
    }
}
