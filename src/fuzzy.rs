//! Fuzzy canonicalization: mapping nearly-equal coordinates to shared
//! canonical entries.
//!
//! Boolean operations produce vertices that should coincide but differ in
//! the last few bits. The [`FuzzyFactory`] snaps such values to the first
//! representative seen, so that downstream passes (re-tessellation, compact
//! serialization) can compare by index instead of by distance.

use crate::float_types::{EPSILON, Real};
use crate::plane::Plane;
use crate::polygon::Polygon;
use crate::vertex::Vertex;
use hashbrown::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Deduplicates N-dimensional points under a componentwise absolute
/// tolerance, assigning a stable canonical index to each distinct point.
///
/// Points are hashed into a grid of tolerance-sized cells. A lookup probes
/// the point's own cell and all adjacent cells, so two points within
/// tolerance always land in probed cells even when they straddle a cell
/// boundary. The first point seen wins: later near-equal points get the
/// earlier point's index and coordinates.
#[derive(Debug, Clone)]
pub struct FuzzyFactory<const N: usize> {
    tolerance: Real,
    cells: HashMap<[i64; N], Vec<usize>>,
    entries: Vec<[Real; N]>,
}

impl<const N: usize> FuzzyFactory<N> {
    pub fn new(tolerance: Real) -> Self {
        FuzzyFactory {
            tolerance,
            cells: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn cell_of(&self, coords: &[Real; N]) -> [i64; N] {
        let mut cell = [0i64; N];
        for (c, &value) in cell.iter_mut().zip(coords.iter()) {
            *c = (value / self.tolerance).floor() as i64;
        }
        cell
    }

    fn matches(&self, idx: usize, coords: &[Real; N]) -> bool {
        self.entries[idx]
            .iter()
            .zip(coords.iter())
            .all(|(a, b)| (a - b).abs() <= self.tolerance)
    }

    /// Canonical index for `coords`, inserting it if no entry within
    /// tolerance exists yet.
    pub fn lookup_or_insert(&mut self, coords: [Real; N]) -> usize {
        let cell = self.cell_of(&coords);
        // probe the 3^N cells around (and including) the point's own cell
        let mut probe = cell;
        for combination in 0..3usize.pow(N as u32) {
            let mut c = combination;
            for dim in 0..N {
                probe[dim] = cell[dim] + (c % 3) as i64 - 1;
                c /= 3;
            }
            if let Some(indices) = self.cells.get(&probe)
                && let Some(&found) = indices.iter().find(|&&i| self.matches(i, &coords))
            {
                return found;
            }
        }
        let idx = self.entries.len();
        self.entries.push(coords);
        self.cells.entry(cell).or_default().push(idx);
        idx
    }

    /// Canonical coordinates stored at `idx`.
    pub fn entry(&self, idx: usize) -> &[Real; N] {
        &self.entries[idx]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonicalization state for one solid: fuzzy tables for vertices and
/// planes plus an exact table for shared metadata.
///
/// The indices it hands out identify geometry for the whole lifetime of the
/// factory, which is what the re-tessellator and the compact serializer key
/// on.
#[derive(Debug, Clone)]
pub struct SolidDedup<S: Clone> {
    vertices: FuzzyFactory<3>,
    planes: FuzzyFactory<4>,
    shared: Vec<Option<S>>,
    shared_index: HashMap<Option<S>, usize>,
}

impl<S: Clone + Send + Sync + Debug + Hash + Eq> SolidDedup<S> {
    pub fn new() -> Self {
        SolidDedup {
            vertices: FuzzyFactory::new(EPSILON),
            planes: FuzzyFactory::new(EPSILON),
            shared: Vec::new(),
            shared_index: HashMap::new(),
        }
    }

    /// Canonical index and snapped position for a vertex.
    pub fn get_vertex(&mut self, vertex: &Vertex) -> (usize, Vertex) {
        let idx = self
            .vertices
            .lookup_or_insert([vertex.pos.x, vertex.pos.y, vertex.pos.z]);
        let [x, y, z] = *self.vertices.entry(idx);
        (idx, Vertex::from_coords(x, y, z))
    }

    /// Canonical index and snapped normal form for a plane.
    pub fn get_plane(&mut self, plane: &Plane) -> (usize, Plane) {
        let idx = self.planes.lookup_or_insert([
            plane.normal.x,
            plane.normal.y,
            plane.normal.z,
            plane.w,
        ]);
        let [nx, ny, nz, w] = *self.planes.entry(idx);
        (idx, Plane::new(nalgebra::Vector3::new(nx, ny, nz), w))
    }

    /// Index of a shared-metadata value; exact equality, no tolerance.
    pub fn get_shared(&mut self, shared: &Option<S>) -> usize {
        if let Some(&idx) = self.shared_index.get(shared) {
            return idx;
        }
        let idx = self.shared.len();
        self.shared.push(shared.clone());
        self.shared_index.insert(shared.clone(), idx);
        idx
    }

    /// Canonicalize one polygon. Returns the rebuilt polygon together with
    /// its plane and shared indices, or `None` when vertex snapping collapsed
    /// it below three distinct vertices.
    pub fn get_polygon(&mut self, polygon: &Polygon<S>) -> Option<(Polygon<S>, usize, usize)> {
        let (plane_idx, plane) = self.get_plane(&polygon.plane);
        let shared_idx = self.get_shared(&polygon.shared);

        let mut indices: Vec<usize> = Vec::with_capacity(polygon.vertices.len());
        let mut vertices: Vec<Vertex> = Vec::with_capacity(polygon.vertices.len());
        for vertex in &polygon.vertices {
            let (idx, snapped) = self.get_vertex(vertex);
            // drop consecutive duplicates as they appear, including the wrap
            // from last back to first
            if indices.last() == Some(&idx) {
                continue;
            }
            indices.push(idx);
            vertices.push(snapped);
        }
        while vertices.len() >= 2 && indices.first() == indices.last() {
            indices.pop();
            vertices.pop();
        }
        if vertices.len() < 3 {
            return None;
        }
        Some((
            Polygon::with_plane(vertices, polygon.shared.clone(), plane),
            plane_idx,
            shared_idx,
        ))
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    pub fn shared_values(&self) -> &[Option<S>] {
        &self.shared
    }

    /// Canonical vertex indices of a polygon that has already been through
    /// [`SolidDedup::get_polygon`].
    pub fn vertex_indices(&mut self, polygon: &Polygon<S>) -> Vec<usize> {
        polygon
            .vertices
            .iter()
            .map(|v| self.vertices.lookup_or_insert([v.pos.x, v.pos.y, v.pos.z]))
            .collect()
    }

    pub fn vertex_entry(&self, idx: usize) -> &[Real; 3] {
        self.vertices.entry(idx)
    }

    pub fn plane_entry(&self, idx: usize) -> &[Real; 4] {
        self.planes.entry(idx)
    }
}

impl<S: Clone + Send + Sync + Debug + Hash + Eq> Default for SolidDedup<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonicalize a polygon soup: snap vertices and planes, drop polygons that
/// degenerate. Output order follows input order.
pub fn canonicalize_polygons<S>(polygons: &[Polygon<S>]) -> Vec<Polygon<S>>
where
    S: Clone + Send + Sync + Debug + Hash + Eq,
{
    let mut dedup = SolidDedup::new();
    polygons
        .iter()
        .filter_map(|p| dedup.get_polygon(p).map(|(poly, _, _)| poly))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_tolerance_points_share_an_index() {
        let mut factory: FuzzyFactory<3> = FuzzyFactory::new(1e-5);
        let a = factory.lookup_or_insert([1.0, 2.0, 3.0]);
        let b = factory.lookup_or_insert([1.0 + 4e-6, 2.0 - 4e-6, 3.0]);
        assert_eq!(a, b);
        // the first-seen coordinates are the canonical ones
        assert_eq!(factory.entry(a), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn far_points_get_distinct_indices() {
        let mut factory: FuzzyFactory<2> = FuzzyFactory::new(1e-5);
        let a = factory.lookup_or_insert([0.0, 0.0]);
        let b = factory.lookup_or_insert([1.0, 0.0]);
        assert_ne!(a, b);
        assert_eq!(factory.len(), 2);
    }

    #[test]
    fn cell_boundary_straddlers_still_match() {
        let tol = 1e-5;
        let mut factory: FuzzyFactory<1> = FuzzyFactory::new(tol);
        // two points within tolerance but in adjacent quantization cells
        let a = factory.lookup_or_insert([tol * 0.99]);
        let b = factory.lookup_or_insert([tol * 1.01]);
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_polygon_is_dropped() {
        let mut dedup: SolidDedup<()> = SolidDedup::new();
        let sliver = Polygon::new(
            vec![
                Vertex::from_coords(0.0, 0.0, 0.0),
                Vertex::from_coords(1.0, 0.0, 0.0),
                Vertex::from_coords(1e-7, 1e-7, 0.0),
            ],
            None,
        );
        assert!(dedup.get_polygon(&sliver).is_none());
    }

    #[test]
    fn shared_metadata_dedups_exactly() {
        let mut dedup: SolidDedup<&'static str> = SolidDedup::new();
        let a = dedup.get_shared(&Some("red"));
        let b = dedup.get_shared(&Some("blue"));
        let c = dedup.get_shared(&Some("red"));
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(dedup.shared_values().len(), 2);
    }
}
