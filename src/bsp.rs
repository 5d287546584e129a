//! Provenance-tracked BSP trees.
//!
//! A [`Tree`] pairs two arenas:
//!
//! * a *polygon forest* recording how input polygons were progressively split
//!   (children are fragments of their parent), and
//! * a *plane tree* of splitting planes whose nodes reference forest entries.
//!
//! The forest lets a polygon survive clipping whole: a parent keeps its
//! original polygon through any number of splits, and only when one of its
//! fragments is actually removed do the ancestors forget theirs, leaving the
//! surviving fragments to stand in. This keeps output meshes coarse instead
//! of shattering every face that merely touched a splitting plane.
//!
//! All traversals use explicit worklists. Tree depth is data-dependent and
//! easily reaches thousands of levels on real models, which would overflow
//! the call stack with naive recursion.

use crate::float_types::{EPSILON, Real};
use crate::plane::{Plane, SplitType};
use crate::polygon::Polygon;
use std::fmt::Debug;

/// Where a (fragment of a) polygon ended up relative to a splitting plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    CoplanarFront,
    CoplanarBack,
    Front,
    Back,
}

#[derive(Debug, Clone)]
struct ForestNode<S: Clone> {
    parent: Option<usize>,
    children: Vec<usize>,
    /// The live polygon, if this node still represents one whole.
    /// `None` on the root, and on any inner node one of whose descendant
    /// fragments has been removed.
    polygon: Option<Polygon<S>>,
    removed: bool,
}

/// Arena of polygon provenance nodes. Index 0 is the root, which never
/// carries a polygon.
#[derive(Debug, Clone)]
struct PolygonForest<S: Clone> {
    nodes: Vec<ForestNode<S>>,
}

impl<S: Clone + Send + Sync + Debug> PolygonForest<S> {
    fn new() -> Self {
        PolygonForest {
            nodes: vec![ForestNode {
                parent: None,
                children: Vec::new(),
                polygon: None,
                removed: false,
            }],
        }
    }

    fn add_child(&mut self, parent: usize, polygon: Polygon<S>) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(ForestNode {
            parent: Some(parent),
            children: Vec::new(),
            polygon: Some(polygon),
            removed: false,
        });
        self.nodes[parent].children.push(idx);
        idx
    }

    fn is_removed(&self, idx: usize) -> bool {
        self.nodes[idx].removed
    }

    fn polygon(&self, idx: usize) -> Option<&Polygon<S>> {
        self.nodes[idx].polygon.as_ref()
    }

    /// Remove a fragment: detach it from its parent and invalidate the
    /// polygons cached on every ancestor, walking up until an ancestor is
    /// already invalidated.
    fn remove(&mut self, idx: usize) {
        if self.nodes[idx].removed {
            return;
        }
        self.nodes[idx].removed = true;
        if let Some(parent) = self.nodes[idx].parent {
            let children = &mut self.nodes[parent].children;
            if let Some(pos) = children.iter().position(|&c| c == idx) {
                children.remove(pos);
            }
            let mut node = parent;
            while self.nodes[node].polygon.is_some() {
                self.nodes[node].polygon = None;
                match self.nodes[node].parent {
                    Some(p) => node = p,
                    None => break,
                }
            }
        }
    }

    /// Flip every live polygon in place.
    fn invert(&mut self) {
        for node in &mut self.nodes {
            if !node.removed
                && let Some(polygon) = node.polygon.as_mut()
            {
                polygon.flip();
            }
        }
    }

    /// Collect the live polygons under `root`: a node with a polygon yields
    /// it whole and its subtree is not descended further.
    fn collect_polygons(&self, root: usize, out: &mut Vec<Polygon<S>>) {
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if let Some(polygon) = &node.polygon {
                out.push(polygon.clone());
            } else {
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// Classify the leaves under `idx` against `plane`, splitting spanning
    /// polygons into child fragments. Every affected leaf (or new fragment)
    /// is appended to `out` with its routing, in traversal order.
    fn split_by_plane(&mut self, idx: usize, plane: &Plane, out: &mut Vec<(usize, Route)>) {
        if self.nodes[idx].children.is_empty() {
            self.split_leaf(idx, plane, out);
        } else {
            let mut stack: Vec<usize> = self.nodes[idx].children.clone();
            while let Some(i) = stack.pop() {
                if self.nodes[i].children.is_empty() {
                    self.split_leaf(i, plane, out);
                } else {
                    stack.extend(self.nodes[i].children.iter().copied());
                }
            }
        }
    }

    fn split_leaf(&mut self, idx: usize, plane: &Plane, out: &mut Vec<(usize, Route)>) {
        let Some(polygon) = self.nodes[idx].polygon.as_ref() else {
            return;
        };

        // bounding-sphere precheck avoids the exact split for the common
        // case of a polygon far from the plane
        let (center, radius) = polygon.bounding_sphere();
        let bound: Real = radius + EPSILON;
        let d = plane.normal.dot(&center.coords) - plane.w;
        if d > bound {
            out.push((idx, Route::Front));
            return;
        }
        if d < -bound {
            out.push((idx, Route::Back));
            return;
        }

        let split = plane.split_polygon(polygon);
        match split.kind {
            SplitType::CoplanarFront => out.push((idx, Route::CoplanarFront)),
            SplitType::CoplanarBack => out.push((idx, Route::CoplanarBack)),
            SplitType::Front => out.push((idx, Route::Front)),
            SplitType::Back => out.push((idx, Route::Back)),
            SplitType::Spanning => {
                if let Some(front) = split.front {
                    let child = self.add_child(idx, front);
                    out.push((child, Route::Front));
                }
                if let Some(back) = split.back {
                    let child = self.add_child(idx, back);
                    out.push((child, Route::Back));
                }
            },
        }
    }
}

#[derive(Debug, Clone)]
struct BspNode {
    plane: Option<Plane>,
    front: Option<usize>,
    back: Option<usize>,
    /// Forest entries retained at this node (coplanar with its plane, facing
    /// front).
    members: Vec<usize>,
}

impl BspNode {
    fn empty() -> Self {
        BspNode {
            plane: None,
            front: None,
            back: None,
            members: Vec::new(),
        }
    }
}

/// A solid held as a BSP plane tree over a polygon provenance forest.
///
/// Boolean operations build one tree per operand and mutually clip them;
/// see [`crate::solid::Solid`] for the public operation sequences.
#[derive(Debug, Clone)]
pub struct Tree<S: Clone> {
    forest: PolygonForest<S>,
    bsp: Vec<BspNode>,
}

impl<S: Clone + Send + Sync + Debug> Tree<S> {
    pub fn new(polygons: &[Polygon<S>]) -> Self {
        let mut tree = Tree {
            forest: PolygonForest::new(),
            bsp: vec![BspNode::empty()],
        };
        tree.add_polygons(polygons);
        tree
    }

    /// Insert polygons, splitting them along the existing planes and
    /// extending the plane tree where they reach empty space.
    pub fn add_polygons(&mut self, polygons: &[Polygon<S>]) {
        let members: Vec<usize> = polygons
            .iter()
            .map(|p| self.forest.add_child(0, p.clone()))
            .collect();
        self.add_members(0, members);
    }

    /// All live polygons of the solid. Polygons that were split but kept all
    /// their fragments come back whole.
    pub fn all_polygons(&self) -> Vec<Polygon<S>> {
        let mut out = Vec::new();
        self.forest.collect_polygons(0, &mut out);
        out
    }

    /// Turn the solid inside-out: flip every polygon and every splitting
    /// plane, swapping front and back subtrees.
    pub fn invert(&mut self) {
        self.forest.invert();
        for node in &mut self.bsp {
            if let Some(plane) = node.plane.as_mut() {
                plane.flip();
            }
            std::mem::swap(&mut node.front, &mut node.back);
        }
    }

    /// Remove (parts of) this solid's polygons that lie inside `other`.
    ///
    /// With `remove_coplanar_front` set, polygons lying exactly on `other`'s
    /// boundary and facing the same way are removed as well; the boolean
    /// sequences use this to avoid duplicated coincident faces.
    pub fn clip_to(&mut self, other: &Tree<S>, remove_coplanar_front: bool) {
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let members = self.bsp[idx].members.clone();
            if !members.is_empty() {
                other.clip_members(&mut self.forest, members, remove_coplanar_front);
            }
            if let Some(front) = self.bsp[idx].front {
                stack.push(front);
            }
            if let Some(back) = self.bsp[idx].back {
                stack.push(back);
            }
        }
    }

    /// Clip the given forest entries (owned by another tree) against this
    /// tree's planes, removing whatever ends up behind a boundary with no
    /// space beyond it.
    fn clip_members(
        &self,
        forest: &mut PolygonForest<S>,
        members: Vec<usize>,
        remove_coplanar_front: bool,
    ) {
        let mut stack = vec![(0usize, members)];
        let mut routed = Vec::new();
        while let Some((idx, members)) = stack.pop() {
            let node = &self.bsp[idx];
            let Some(plane) = &node.plane else {
                continue;
            };

            routed.clear();
            for member in members {
                if !forest.is_removed(member) {
                    forest.split_by_plane(member, plane, &mut routed);
                }
            }
            let mut front_members = Vec::new();
            let mut back_members = Vec::new();
            for &(member, route) in &routed {
                match route {
                    Route::Front => front_members.push(member),
                    Route::Back | Route::CoplanarBack => back_members.push(member),
                    Route::CoplanarFront => {
                        if remove_coplanar_front {
                            back_members.push(member);
                        } else {
                            front_members.push(member);
                        }
                    },
                }
            }

            if let Some(front) = node.front
                && !front_members.is_empty()
            {
                stack.push((front, front_members));
            }
            match node.back {
                Some(back) if !back_members.is_empty() => stack.push((back, back_members)),
                // no space behind this plane: everything routed back is
                // inside the solid and gets removed
                _ => {
                    for member in back_members {
                        forest.remove(member);
                    }
                },
            }
        }
    }

    /// Distribute forest entries down the plane tree starting at `node_idx`,
    /// creating child nodes as needed. The first polygon reaching a planeless
    /// node donates its plane.
    fn add_members(&mut self, node_idx: usize, members: Vec<usize>) {
        let mut stack = vec![(node_idx, members)];
        let mut routed = Vec::new();
        while let Some((idx, members)) = stack.pop() {
            if members.is_empty() {
                continue;
            }
            let plane = match &self.bsp[idx].plane {
                Some(plane) => plane.clone(),
                None => {
                    let Some(plane) = members
                        .iter()
                        .find_map(|&m| self.forest.polygon(m))
                        .map(|p| p.plane.clone())
                    else {
                        continue;
                    };
                    self.bsp[idx].plane = Some(plane.clone());
                    plane
                },
            };

            routed.clear();
            for member in members {
                self.forest.split_by_plane(member, &plane, &mut routed);
            }
            let mut front_members = Vec::new();
            let mut back_members = Vec::new();
            for &(member, route) in &routed {
                match route {
                    // coplanar same-facing polygons live at this node
                    Route::CoplanarFront => self.bsp[idx].members.push(member),
                    Route::Front => front_members.push(member),
                    Route::Back | Route::CoplanarBack => back_members.push(member),
                }
            }

            if !front_members.is_empty() {
                let front = match self.bsp[idx].front {
                    Some(front) => front,
                    None => {
                        let front = self.bsp.len();
                        self.bsp.push(BspNode::empty());
                        self.bsp[idx].front = Some(front);
                        front
                    },
                };
                stack.push((front, front_members));
            }
            if !back_members.is_empty() {
                let back = match self.bsp[idx].back {
                    Some(back) => back,
                    None => {
                        let back = self.bsp.len();
                        self.bsp.push(BspNode::empty());
                        self.bsp[idx].back = Some(back);
                        back
                    },
                };
                stack.push((back, back_members));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::Vertex;

    fn square_at(z: Real) -> Polygon<()> {
        Polygon::new(
            vec![
                Vertex::from_coords(0.0, 0.0, z),
                Vertex::from_coords(1.0, 0.0, z),
                Vertex::from_coords(1.0, 1.0, z),
                Vertex::from_coords(0.0, 1.0, z),
            ],
            None,
        )
    }

    #[test]
    fn round_trips_polygons() {
        let polys = vec![square_at(0.0), square_at(1.0)];
        let tree = Tree::new(&polys);
        let out = tree.all_polygons();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn invert_flips_all_polygons() {
        let mut tree = Tree::new(&[square_at(0.0)]);
        tree.invert();
        let out = tree.all_polygons();
        assert_eq!(out.len(), 1);
        assert!(out[0].plane.normal.z < 0.0);
    }

    #[test]
    fn split_polygon_survives_whole_when_no_fragment_removed() {
        // a big square inserted after a perpendicular one gets split in the
        // plane tree, but both fragments stay live so the polygon comes
        // back whole
        let perpendicular: Polygon<()> = Polygon::new(
            vec![
                Vertex::from_coords(0.5, 0.0, -1.0),
                Vertex::from_coords(0.5, 1.0, -1.0),
                Vertex::from_coords(0.5, 1.0, 1.0),
                Vertex::from_coords(0.5, 0.0, 1.0),
            ],
            None,
        );
        let mut tree = Tree::new(&[perpendicular]);
        tree.add_polygons(&[square_at(0.0)]);
        let out = tree.all_polygons();
        assert_eq!(out.len(), 2);
        assert!(out.iter().any(|p| p.vertices.len() == 4 && p.area() > 0.99));
    }

    #[test]
    fn self_clip_with_coplanar_removal_empties_the_solid() {
        // every face is coplanar with its own plane and inside all others,
        // so removing coplanar-front polygons leaves nothing
        let cube_polys = test_cube();
        let mut a = Tree::new(&cube_polys);
        let b = Tree::new(&cube_polys);
        a.clip_to(&b, true);
        assert!(a.all_polygons().is_empty());
    }

    #[test]
    fn self_clip_keeps_coplanar_front_faces() {
        let cube_polys = test_cube();
        let mut a = Tree::new(&cube_polys);
        let b = Tree::new(&cube_polys);
        a.clip_to(&b, false);
        assert_eq!(a.all_polygons().len(), 6);
    }

    fn test_cube() -> Vec<Polygon<()>> {
        let faces: [[usize; 4]; 6] = [
            [0, 4, 6, 2],
            [1, 3, 7, 5],
            [0, 1, 5, 4],
            [2, 6, 7, 3],
            [0, 2, 3, 1],
            [4, 5, 7, 6],
        ];
        faces
            .iter()
            .map(|face| {
                Polygon::new(
                    face.iter()
                        .map(|&i| {
                            Vertex::from_coords(
                                if i & 1 != 0 { 1.0 } else { -1.0 },
                                if i & 2 != 0 { 1.0 } else { -1.0 },
                                if i & 4 != 0 { 1.0 } else { -1.0 },
                            )
                        })
                        .collect(),
                    None,
                )
            })
            .collect()
    }
}
