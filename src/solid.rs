//! The 3D boundary-representation solid and its boolean operations.

use crate::bsp::Tree;
use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::fuzzy::canonicalize_polygons;
use crate::polygon::Polygon;
use crate::retessellate::retessellate_polygons;
use crate::traits::Csg;
use crate::vertex::Vertex;
use nalgebra::{Matrix4, Point3};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::OnceLock;

/// A solid bounded by convex planar polygons, with shared metadata `S` on
/// each polygon.
///
/// Values are immutable: operations return new solids. The two cleanup
/// flags record whether re-tessellation and canonicalization have already
/// run, so chained operations can skip redundant passes. They are hints for
/// skipping work, never a correctness precondition.
#[derive(Debug, Clone)]
pub struct Solid<S: Clone> {
    polygons: Vec<Polygon<S>>,
    is_canonicalized: bool,
    is_retesselated: bool,
    bounding_box: OnceLock<Aabb>,
}

impl<S: Clone + Send + Sync + Debug + Hash + Eq> Solid<S> {
    /// Wrap a polygon list without any cleanup applied.
    pub fn from_polygons(polygons: Vec<Polygon<S>>) -> Self {
        Solid {
            polygons,
            is_canonicalized: false,
            is_retesselated: false,
            bounding_box: OnceLock::new(),
        }
    }

    fn with_flags(polygons: Vec<Polygon<S>>, canonicalized: bool, retesselated: bool) -> Self {
        Solid {
            polygons,
            is_canonicalized: canonicalized,
            is_retesselated: retesselated,
            bounding_box: OnceLock::new(),
        }
    }

    /// Mark a solid whose polygons are known to be deduplicated already.
    pub(crate) fn canonical_by_construction(mut self) -> Self {
        self.is_canonicalized = true;
        self
    }

    pub fn polygons(&self) -> &[Polygon<S>] {
        &self.polygons
    }

    pub fn into_polygons(self) -> Vec<Polygon<S>> {
        self.polygons
    }

    pub fn is_canonicalized(&self) -> bool {
        self.is_canonicalized
    }

    pub fn is_retesselated(&self) -> bool {
        self.is_retesselated
    }

    /// Union with several solids at once, folded in balanced pairs so the
    /// intermediate results stay shallow. Cleanup runs once at the end.
    pub fn union_many(&self, others: &[Solid<S>]) -> Solid<S> {
        let mut solids: Vec<Solid<S>> = Vec::with_capacity(others.len() + 1);
        solids.extend(others.iter().cloned());
        solids.push(self.clone());
        let mut i = 1;
        while i < solids.len() {
            let merged = solids[i - 1].union_sub(&solids[i], false, false);
            solids.push(merged);
            i += 2;
        }
        let result = match solids.pop() {
            Some(result) => result,
            None => Self::new(),
        };
        result.retessellated().canonicalized()
    }

    /// One union step. `retessellate`/`canonicalize` control whether cleanup
    /// runs on this step's result; intermediate fold steps pass `false`.
    pub fn union_sub(&self, other: &Solid<S>, retessellate: bool, canonicalize: bool) -> Solid<S> {
        if !self.may_overlap(other) {
            return self.union_for_non_intersecting(other);
        }
        let mut a = Tree::new(&self.polygons);
        let mut b = Tree::new(&other.polygons);
        a.clip_to(&b, false);
        // The second operand needs the inversion round trip: one plain clip
        // keeps its coplanar faces, and clipping the inverse then removes
        // the parts buried inside the first operand.
        b.clip_to(&a, false);
        b.invert();
        b.clip_to(&a, false);
        b.invert();
        let mut polygons = a.all_polygons();
        polygons.extend(b.all_polygons());
        let mut result = Solid::from_polygons(polygons);
        if retessellate {
            result = result.retessellated();
        }
        if canonicalize {
            result = result.canonicalized();
        }
        result
    }

    /// Union of solids whose bounding boxes are disjoint: plain
    /// concatenation. The polygons stay as tessellated as they were, but the
    /// two operands may still hold fuzzy-equal vertices of each other, so
    /// the result is never marked canonical.
    fn union_for_non_intersecting(&self, other: &Solid<S>) -> Solid<S> {
        let mut polygons = self.polygons.clone();
        polygons.extend(other.polygons.iter().cloned());
        Solid::with_flags(
            polygons,
            false,
            self.is_retesselated && other.is_retesselated,
        )
    }

    /// Subtract several solids in sequence; cleanup runs on the last step.
    pub fn difference_many(&self, others: &[Solid<S>]) -> Solid<S> {
        let mut result = self.clone();
        for (i, other) in others.iter().enumerate() {
            let is_last = i == others.len() - 1;
            result = result.difference_sub(other, is_last, is_last);
        }
        result
    }

    /// One subtraction step (`self` minus `other`).
    pub fn difference_sub(
        &self,
        other: &Solid<S>,
        retessellate: bool,
        canonicalize: bool,
    ) -> Solid<S> {
        let mut a = Tree::new(&self.polygons);
        let mut b = Tree::new(&other.polygons);
        a.invert();
        a.clip_to(&b, false);
        b.clip_to(&a, true);
        a.add_polygons(&b.all_polygons());
        a.invert();
        let mut result = Solid::from_polygons(a.all_polygons());
        if retessellate {
            result = result.retessellated();
        }
        if canonicalize {
            result = result.canonicalized();
        }
        result
    }

    /// Intersect with several solids in sequence; cleanup runs on the last
    /// step.
    pub fn intersection_many(&self, others: &[Solid<S>]) -> Solid<S> {
        let mut result = self.clone();
        for (i, other) in others.iter().enumerate() {
            let is_last = i == others.len() - 1;
            result = result.intersection_sub(other, is_last, is_last);
        }
        result
    }

    /// One intersection step.
    pub fn intersection_sub(
        &self,
        other: &Solid<S>,
        retessellate: bool,
        canonicalize: bool,
    ) -> Solid<S> {
        let mut a = Tree::new(&self.polygons);
        let mut b = Tree::new(&other.polygons);
        a.invert();
        b.clip_to(&a, false);
        b.invert();
        a.clip_to(&b, false);
        b.clip_to(&a, false);
        a.add_polygons(&b.all_polygons());
        a.invert();
        let mut result = Solid::from_polygons(a.all_polygons());
        if retessellate {
            result = result.retessellated();
        }
        if canonicalize {
            result = result.canonicalized();
        }
        result
    }

    /// Can the two solids intersect at all? False when either is empty or
    /// the bounding boxes are disjoint.
    pub fn may_overlap(&self, other: &Solid<S>) -> bool {
        if self.polygons.is_empty() || other.polygons.is_empty() {
            return false;
        }
        let a = self.bounding_box();
        let b = other.bounding_box();
        a.mins.x <= b.maxs.x
            && a.maxs.x >= b.mins.x
            && a.mins.y <= b.maxs.y
            && a.maxs.y >= b.mins.y
            && a.mins.z <= b.maxs.z
            && a.maxs.z >= b.mins.z
    }

    /// Snap fuzzy-equal vertices and planes to canonical values, dropping
    /// polygons that degenerate. No-op if already canonical.
    pub fn canonicalized(&self) -> Solid<S> {
        if self.is_canonicalized {
            return self.clone();
        }
        Solid::with_flags(
            canonicalize_polygons(&self.polygons),
            true,
            self.is_retesselated,
        )
    }

    /// Merge coplanar polygon fragments into larger convex faces. No-op if
    /// already re-tessellated. The merged vertices are freshly computed, so
    /// the result is not canonical.
    pub fn retessellated(&self) -> Solid<S> {
        if self.is_retesselated {
            return self.clone();
        }
        Solid::with_flags(retessellate_polygons(&self.polygons), false, true)
    }

    /// Volume enclosed by the boundary, negative for inside-out solids.
    pub fn signed_volume(&self) -> Real {
        self.polygons.iter().map(Polygon::signed_volume).sum()
    }

    pub fn surface_area(&self) -> Real {
        self.polygons.iter().map(Polygon::area).sum()
    }

    /// Fan-triangulate all faces.
    pub fn to_triangles(&self) -> Vec<[Vertex; 3]> {
        self.polygons
            .iter()
            .flat_map(Polygon::triangulate)
            .collect()
    }
}

impl<S: Clone + Send + Sync + Debug + Hash + Eq> Csg for Solid<S> {
    fn new() -> Self {
        // nothing to clean up in an empty solid
        Solid::with_flags(Vec::new(), true, true)
    }

    fn union(&self, other: &Self) -> Self {
        self.union_many(std::slice::from_ref(other))
    }

    fn difference(&self, other: &Self) -> Self {
        self.difference_many(std::slice::from_ref(other))
    }

    fn intersection(&self, other: &Self) -> Self {
        self.intersection_many(std::slice::from_ref(other))
    }

    fn transform(&self, matrix: &Matrix4<Real>) -> Self {
        let polygons = self.polygons.iter().map(|p| p.transformed(matrix)).collect();
        Solid::with_flags(polygons, self.is_canonicalized, self.is_retesselated)
    }

    fn inverse(&self) -> Self {
        let polygons = self.polygons.iter().map(Polygon::flipped).collect();
        Solid::from_polygons(polygons)
    }

    fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            let mut polygons = self.polygons.iter();
            let Some(first) = polygons.next() else {
                return Aabb::new(Point3::origin(), Point3::origin());
            };
            let mut aabb = first.bounding_box();
            for polygon in polygons {
                let other = polygon.bounding_box();
                aabb.mins = aabb.mins.inf(&other.mins);
                aabb.maxs = aabb.maxs.sup(&other.maxs);
            }
            aabb
        })
    }

    fn invalidate_bounding_box(&mut self) {
        self.bounding_box = OnceLock::new();
    }
}

impl<S: Clone + Send + Sync + Debug + Hash + Eq> Default for Solid<S> {
    fn default() -> Self {
        Self::new()
    }
}
