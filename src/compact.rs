//! Compact index-based representation of solids and areas.
//!
//! Geometry is stored as parallel arrays over deduplicated vertex and plane
//! tables, the natural interchange form for persistence or transfer between
//! processes. Conversion to the compact form canonicalizes first, so equal
//! positions collapse to one table entry and the round trip back is exact.

use crate::errors::ValidationError;
use crate::float_types::Real;
use crate::fuzzy::{FuzzyFactory, SolidDedup};
use crate::plane::Plane;
use crate::polygon::Polygon;
use crate::side::Side;
use crate::solid::Solid;
use crate::vertex::Vertex;
use nalgebra::{Point2, Vector3};
use std::fmt::Debug;
use std::hash::Hash;

/// A solid flattened into parallel index arrays.
///
/// `vertices_per_polygon[i]` gives polygon `i`'s vertex count; its vertex
/// indices are the next such run of `polygon_vertices`. `vertex_data` holds
/// three coordinates per vertex table entry, `plane_data` four values
/// (normal + offset) per plane table entry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct CompactSolid<S: Clone> {
    pub vertices_per_polygon: Vec<usize>,
    pub polygon_vertices: Vec<usize>,
    pub polygon_planes: Vec<usize>,
    pub polygon_shared: Vec<usize>,
    pub vertex_data: Vec<Real>,
    pub plane_data: Vec<Real>,
    pub shared: Vec<Option<S>>,
}

impl<S: Clone + Send + Sync + Debug + Hash + Eq> CompactSolid<S> {
    /// Flatten a solid, canonicalizing it on the way so that coincident
    /// vertices and planes share table entries.
    pub fn from_solid(solid: &Solid<S>) -> Self {
        let mut dedup: SolidDedup<S> = SolidDedup::new();
        let mut vertices_per_polygon = Vec::new();
        let mut polygon_vertices = Vec::new();
        let mut polygon_planes = Vec::new();
        let mut polygon_shared = Vec::new();
        for polygon in solid.polygons() {
            let Some((canonical, plane_idx, shared_idx)) = dedup.get_polygon(polygon) else {
                continue;
            };
            vertices_per_polygon.push(canonical.vertices.len());
            polygon_vertices.extend(dedup.vertex_indices(&canonical));
            polygon_planes.push(plane_idx);
            polygon_shared.push(shared_idx);
        }

        let mut vertex_data = Vec::with_capacity(dedup.vertex_count() * 3);
        for i in 0..dedup.vertex_count() {
            vertex_data.extend_from_slice(dedup.vertex_entry(i));
        }
        let mut plane_data = Vec::with_capacity(dedup.plane_count() * 4);
        for i in 0..dedup.plane_count() {
            plane_data.extend_from_slice(dedup.plane_entry(i));
        }

        CompactSolid {
            vertices_per_polygon,
            polygon_vertices,
            polygon_planes,
            polygon_shared,
            vertex_data,
            plane_data,
            shared: dedup.shared_values().to_vec(),
        }
    }

    /// Rebuild the solid by index lookup. Coordinates come back exactly as
    /// stored. The result is marked canonical (the tables are deduplicated
    /// by construction) but not re-tessellated.
    pub fn to_solid(&self) -> Result<Solid<S>, ValidationError> {
        if self.vertex_data.len() % 3 != 0 {
            return Err(ValidationError::MalformedCompact(
                "vertex data length is not a multiple of 3",
            ));
        }
        if self.plane_data.len() % 4 != 0 {
            return Err(ValidationError::MalformedCompact(
                "plane data length is not a multiple of 4",
            ));
        }
        let total: usize = self.vertices_per_polygon.iter().sum();
        if total != self.polygon_vertices.len() {
            return Err(ValidationError::MalformedCompact(
                "vertex counts disagree with the flattened index list",
            ));
        }
        if self.polygon_planes.len() != self.vertices_per_polygon.len()
            || self.polygon_shared.len() != self.vertices_per_polygon.len()
        {
            return Err(ValidationError::MalformedCompact(
                "per-polygon arrays have different lengths",
            ));
        }

        let vertex_count = self.vertex_data.len() / 3;
        let plane_count = self.plane_data.len() / 4;
        let lookup_vertex = |idx: usize| -> Result<Vertex, ValidationError> {
            if idx >= vertex_count {
                return Err(ValidationError::IndexOutOfRange {
                    index: idx,
                    len: vertex_count,
                });
            }
            let d = &self.vertex_data[idx * 3..idx * 3 + 3];
            Ok(Vertex::from_coords(d[0], d[1], d[2]))
        };
        let lookup_plane = |idx: usize| -> Result<Plane, ValidationError> {
            if idx >= plane_count {
                return Err(ValidationError::IndexOutOfRange {
                    index: idx,
                    len: plane_count,
                });
            }
            let d = &self.plane_data[idx * 4..idx * 4 + 4];
            Ok(Plane::new(Vector3::new(d[0], d[1], d[2]), d[3]))
        };
        let lookup_shared = |idx: usize| -> Result<Option<S>, ValidationError> {
            self.shared
                .get(idx)
                .cloned()
                .ok_or(ValidationError::IndexOutOfRange {
                    index: idx,
                    len: self.shared.len(),
                })
        };

        let mut polygons = Vec::with_capacity(self.vertices_per_polygon.len());
        let mut offset = 0;
        for (i, &count) in self.vertices_per_polygon.iter().enumerate() {
            if count < 3 {
                return Err(ValidationError::MalformedCompact(
                    "polygon with fewer than 3 vertices",
                ));
            }
            let mut vertices = Vec::with_capacity(count);
            for &vertex_idx in &self.polygon_vertices[offset..offset + count] {
                vertices.push(lookup_vertex(vertex_idx)?);
            }
            offset += count;
            polygons.push(Polygon::with_plane(
                vertices,
                lookup_shared(self.polygon_shared[i])?,
                lookup_plane(self.polygon_planes[i])?,
            ));
        }
        Ok(Solid::from_polygons(polygons).canonical_by_construction())
    }
}

/// An area flattened into a vertex table plus per-side index pairs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct CompactArea {
    /// Two vertex indices per side (start, end)
    pub side_vertices: Vec<usize>,
    /// Two coordinates per vertex table entry
    pub vertex_data: Vec<Real>,
}

impl CompactArea {
    pub fn from_area(area: &crate::area::Area) -> Self {
        let mut factory: FuzzyFactory<2> = FuzzyFactory::new(crate::float_types::EPSILON);
        let mut side_vertices = Vec::with_capacity(area.sides().len() * 2);
        for side in area.sides() {
            side_vertices.push(factory.lookup_or_insert([side.start.x, side.start.y]));
            side_vertices.push(factory.lookup_or_insert([side.end.x, side.end.y]));
        }
        let mut vertex_data = Vec::with_capacity(factory.len() * 2);
        for i in 0..factory.len() {
            vertex_data.extend_from_slice(factory.entry(i));
        }
        CompactArea {
            side_vertices,
            vertex_data,
        }
    }

    pub fn to_area(&self) -> Result<crate::area::Area, ValidationError> {
        if self.vertex_data.len() % 2 != 0 {
            return Err(ValidationError::MalformedCompact(
                "vertex data length is not a multiple of 2",
            ));
        }
        if self.side_vertices.len() % 2 != 0 {
            return Err(ValidationError::MalformedCompact(
                "side index list length is not a multiple of 2",
            ));
        }
        let vertex_count = self.vertex_data.len() / 2;
        let lookup = |idx: usize| -> Result<Point2<Real>, ValidationError> {
            if idx >= vertex_count {
                return Err(ValidationError::IndexOutOfRange {
                    index: idx,
                    len: vertex_count,
                });
            }
            Ok(Point2::new(
                self.vertex_data[idx * 2],
                self.vertex_data[idx * 2 + 1],
            ))
        };
        let mut sides = Vec::with_capacity(self.side_vertices.len() / 2);
        for pair in self.side_vertices.chunks_exact(2) {
            sides.push(Side::new(lookup(pair[0])?, lookup(pair[1])?));
        }
        Ok(crate::area::Area::from_sides(sides))
    }
}
