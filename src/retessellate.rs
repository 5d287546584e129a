//! Merging coplanar polygons back into larger convex faces.
//!
//! Boolean operations fragment faces along every splitting plane they meet.
//! This pass projects each group of coplanar same-metadata polygons to 2D,
//! sweeps a horizontal scanline over the distinct y coordinates, and re-emits
//! maximal convex polygons covering the same area, greatly reducing the
//! polygon count of boolean results.

use crate::float_types::{EPSILON, Real};
use crate::fuzzy::SolidDedup;
use crate::plane::OrthoNormalBasis;
use crate::polygon::Polygon;
use crate::vertex::Vertex;
use hashbrown::{HashMap, HashSet};
use nalgebra::Point2;
use std::fmt::Debug;
use std::hash::Hash;

/// Group polygons by (canonical plane, shared metadata) and merge each
/// coplanar group. Groups of a single polygon pass through untouched.
pub fn retessellate_polygons<S>(polygons: &[Polygon<S>]) -> Vec<Polygon<S>>
where
    S: Clone + Send + Sync + Debug + Hash + Eq,
{
    let mut dedup: SolidDedup<S> = SolidDedup::new();
    let mut group_index: HashMap<(usize, usize), usize> = HashMap::new();
    let mut groups: Vec<Vec<&Polygon<S>>> = Vec::new();
    for polygon in polygons {
        let (plane_idx, _) = dedup.get_plane(&polygon.plane);
        let shared_idx = dedup.get_shared(&polygon.shared);
        let group = *group_index
            .entry((plane_idx, shared_idx))
            .or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
        groups[group].push(polygon);
    }

    let mut dest = Vec::with_capacity(polygons.len());
    for group in groups {
        if group.len() < 2 {
            dest.extend(group.into_iter().cloned());
        } else {
            merge_coplanar_polygons(&group, &mut dest);
        }
    }
    dest
}

/// Interpolate the x coordinate of the segment `p1 -> p2` at height `y`,
/// clamped to the segment.
fn interpolate_x_for_y(p1: &Point2<Real>, p2: &Point2<Real>, y: Real) -> Real {
    let mut f1 = y - p1.y;
    let mut f2 = p2.y - p1.y;
    if f2 < 0.0 {
        f1 = -f1;
        f2 = -f2;
    }
    let t = if f1 <= 0.0 {
        0.0
    } else if f1 >= f2 {
        1.0
    } else if f2 < 1e-10 {
        0.5
    } else {
        f1 / f2
    };
    p1.x + t * (p2.x - p1.x)
}

/// X component of the unit direction from `p1` down to `p2`. The sweep only
/// ever compares slopes of downward side lines, for which the full 2D line
/// is overkill.
fn direction_x(p1: &Point2<Real>, p2: &Point2<Real>) -> Real {
    let d = p2 - p1;
    d.x / d.norm()
}

fn distance(a: &Point2<Real>, b: &Point2<Real>) -> Real {
    (a - b).norm()
}

/// A source polygon currently intersected by the scanline, tracked by the
/// vertex indices delimiting its left and right boundary edges.
struct ActivePolygon {
    polygon_index: usize,
    left_vertex_index: usize,
    right_vertex_index: usize,
    top_left: Point2<Real>,
    bottom_left: Point2<Real>,
    top_right: Point2<Real>,
    bottom_right: Point2<Real>,
}

/// A trapezoid of the current scanline row, possibly continuing an output
/// polygon strip from the previous row.
struct OutPolygon {
    top_left: Point2<Real>,
    top_right: Point2<Real>,
    bottom_left: Point2<Real>,
    bottom_right: Point2<Real>,
    left_dir_x: Real,
    right_dir_x: Real,
    strip: Option<usize>,
    left_continues: bool,
    right_continues: bool,
}

/// Accumulated boundary of one output polygon, grown row by row.
#[derive(Default)]
struct Strip {
    left_points: Vec<Point2<Real>>,
    right_points: Vec<Point2<Real>>,
}

/// Merge a group of coplanar polygons sharing one plane and one metadata
/// value, appending the merged polygons to `dest`.
fn merge_coplanar_polygons<S>(source: &[&Polygon<S>], dest: &mut Vec<Polygon<S>>)
where
    S: Clone + Send + Sync + Debug,
{
    if source.is_empty() {
        return;
    }
    let plane = source[0].plane.clone();
    let shared = source[0].shared.clone();
    let basis = OrthoNormalBasis::new(&plane);

    // Bin y coordinates so vertices that nearly share a height get exactly
    // the same one; the sweep can then compare y values with ==.
    let binning_factor = 10.0 / EPSILON;
    let mut y_bins: HashMap<i64, Real> = HashMap::new();

    // per source polygon: projected vertices (empty when degenerate) and the
    // index of its topmost vertex
    let mut vertices_2d: Vec<Vec<Point2<Real>>> = vec![Vec::new(); source.len()];
    let mut top_vertex_index: Vec<usize> = vec![0; source.len()];
    let mut polygons_starting_at_y: HashMap<u64, Vec<usize>> = HashMap::new();
    let mut polygons_with_corner_at_y: HashMap<u64, HashSet<usize>> = HashMap::new();

    for (polygon_index, polygon) in source.iter().enumerate() {
        let num_vertices = polygon.vertices.len();
        let mut projected = Vec::with_capacity(num_vertices);
        let mut min_index = 0usize;
        let mut min_y = 0.0;
        let mut max_y = 0.0;
        for (i, vertex) in polygon.vertices.iter().enumerate() {
            let raw = basis.project(&vertex.pos);
            let bin = (raw.y * binning_factor).floor() as i64;
            let y = if let Some(&y) = y_bins.get(&bin) {
                y
            } else if let Some(&y) = y_bins.get(&(bin + 1)) {
                y
            } else if let Some(&y) = y_bins.get(&(bin - 1)) {
                y
            } else {
                y_bins.insert(bin, raw.y);
                raw.y
            };
            projected.push(Point2::new(raw.x, y));
            if i == 0 || y < min_y {
                min_y = y;
                min_index = i;
            }
            if i == 0 || y > max_y {
                max_y = y;
            }
            polygons_with_corner_at_y
                .entry(y.to_bits())
                .or_default()
                .insert(polygon_index);
        }
        if min_y >= max_y {
            // flat polygon, invisible to the sweep
            continue;
        }
        polygons_starting_at_y
            .entry(min_y.to_bits())
            .or_default()
            .push(polygon_index);

        // the sweep walks left boundaries forwards and right boundaries
        // backwards, which wants clockwise order in projected space
        projected.reverse();
        vertices_2d[polygon_index] = projected;
        top_vertex_index[polygon_index] = num_vertices - min_index - 1;
    }

    let mut y_coordinates: Vec<Real> = polygons_with_corner_at_y
        .keys()
        .map(|&bits| Real::from_bits(bits))
        .collect();
    y_coordinates.sort_by(|a, b| a.total_cmp(b));

    let mut active_polygons: Vec<ActivePolygon> = Vec::new();
    let mut prev_row: Vec<OutPolygon> = Vec::new();
    let mut strips: Vec<Strip> = Vec::new();

    for y_index in 0..y_coordinates.len() {
        let y = y_coordinates[y_index];
        let corner_set = &polygons_with_corner_at_y[&y.to_bits()];

        // advance active polygons that have a corner at this height, and
        // retire the ones that end here
        let mut i = 0;
        while i < active_polygons.len() {
            let active = &mut active_polygons[i];
            if !corner_set.contains(&active.polygon_index) {
                i += 1;
                continue;
            }
            let verts = &vertices_2d[active.polygon_index];
            let n = verts.len();
            let mut new_left = active.left_vertex_index;
            loop {
                let next = (new_left + 1) % n;
                if verts[next].y != y {
                    break;
                }
                new_left = next;
            }
            let mut new_right = active.right_vertex_index;
            let next = (new_right + n - 1) % n;
            if verts[next].y == y {
                new_right = next;
            }
            if new_left != active.left_vertex_index && new_left == new_right {
                // left and right met: bottom point of the polygon
                active_polygons.remove(i);
            } else {
                active.left_vertex_index = new_left;
                active.right_vertex_index = new_right;
                active.top_left = verts[new_left];
                active.top_right = verts[new_right];
                active.bottom_left = verts[(new_left + 1) % n];
                active.bottom_right = verts[(new_right + n - 1) % n];
                i += 1;
            }
        }

        let mut next_y = y;
        if y_index == y_coordinates.len() - 1 {
            // last row, every polygon must finish here
            active_polygons.clear();
        } else {
            next_y = y_coordinates[y_index + 1];
            let middle_y = 0.5 * (y + next_y);
            // activate polygons whose top is at this height
            if let Some(starting) = polygons_starting_at_y.get(&y.to_bits()) {
                for &polygon_index in starting {
                    let verts = &vertices_2d[polygon_index];
                    let n = verts.len();
                    let top = top_vertex_index[polygon_index];
                    // the top may be a horizontal edge; find its left and
                    // right ends
                    let mut top_left = top;
                    loop {
                        let i = (top_left + 1) % n;
                        if verts[i].y != y || i == top {
                            break;
                        }
                        top_left = i;
                    }
                    let mut top_right = top;
                    loop {
                        let i = (top_right + n - 1) % n;
                        if verts[i].y != y || i == top_left {
                            break;
                        }
                        top_right = i;
                    }
                    let entry = ActivePolygon {
                        polygon_index,
                        left_vertex_index: top_left,
                        right_vertex_index: top_right,
                        top_left: verts[top_left],
                        top_right: verts[top_right],
                        bottom_left: verts[(top_left + 1) % n],
                        bottom_right: verts[(top_right + n - 1) % n],
                    };
                    // insert keeping the list ordered left to right at the
                    // middle of the coming row
                    let x = interpolate_x_for_y(&entry.top_left, &entry.bottom_left, middle_y);
                    let pos = active_polygons.partition_point(|other| {
                        interpolate_x_for_y(&other.top_left, &other.bottom_left, middle_y) < x
                    });
                    active_polygons.insert(pos, entry);
                }
            }
        }

        // build the trapezoid row between y and next_y, merging horizontally
        // adjacent pieces
        let mut new_row: Vec<OutPolygon> = Vec::new();
        for active in &active_polygons {
            let top_left = Point2::new(
                interpolate_x_for_y(&active.top_left, &active.bottom_left, y),
                y,
            );
            let top_right = Point2::new(
                interpolate_x_for_y(&active.top_right, &active.bottom_right, y),
                y,
            );
            let bottom_left = Point2::new(
                interpolate_x_for_y(&active.top_left, &active.bottom_left, next_y),
                next_y,
            );
            let bottom_right = Point2::new(
                interpolate_x_for_y(&active.top_right, &active.bottom_right, next_y),
                next_y,
            );
            let mut out = OutPolygon {
                top_left,
                top_right,
                bottom_left,
                bottom_right,
                left_dir_x: direction_x(&top_left, &bottom_left),
                right_dir_x: direction_x(&bottom_right, &top_right),
                strip: None,
                left_continues: false,
                right_continues: false,
            };
            if let Some(prev) = new_row.last() {
                let d1 = distance(&out.top_left, &prev.top_right);
                let d2 = distance(&out.bottom_left, &prev.bottom_right);
                if d1 < EPSILON && d2 < EPSILON {
                    // touching neighbors, join into one trapezoid
                    out.top_left = prev.top_left;
                    out.bottom_left = prev.bottom_left;
                    out.left_dir_x = prev.left_dir_x;
                    new_row.pop();
                }
            }
            new_row.push(out);
        }

        if y_index > 0 {
            // match this row against the previous one, continuing strips
            // across rows where the join stays convex
            let mut prev_continued = vec![false; prev_row.len()];
            let mut matched = vec![false; prev_row.len()];
            for this in &mut new_row {
                for (ii, prev) in prev_row.iter().enumerate() {
                    if matched[ii] {
                        continue;
                    }
                    if distance(&prev.bottom_left, &this.top_left) < EPSILON {
                        if distance(&prev.bottom_right, &this.top_right) < EPSILON {
                            matched[ii] = true;
                            let d1 = this.left_dir_x - prev.left_dir_x;
                            let d2 = this.right_dir_x - prev.right_dir_x;
                            let left_continues = d1.abs() < EPSILON;
                            let right_continues = d2.abs() < EPSILON;
                            let left_convex = left_continues || d1 >= 0.0;
                            let right_convex = right_continues || d2 >= 0.0;
                            if left_convex && right_convex {
                                this.strip = prev.strip;
                                this.left_continues = left_continues;
                                this.right_continues = right_continues;
                                prev_continued[ii] = true;
                            }
                        }
                        break;
                    }
                }
            }
            for (ii, prev) in prev_row.iter().enumerate() {
                if prev_continued[ii] {
                    continue;
                }
                // strip ends at this row; close it and emit the polygon
                let Some(strip_idx) = prev.strip else { continue };
                let strip = std::mem::take(&mut strips[strip_idx]);
                let Strip {
                    mut left_points,
                    mut right_points,
                } = strip;
                right_points.push(prev.bottom_right);
                if distance(&prev.bottom_right, &prev.bottom_left) > EPSILON {
                    // ends with a horizontal edge
                    left_points.push(prev.bottom_left);
                }
                // walk down the right side, then back up the left, for a
                // counterclockwise boundary
                left_points.reverse();
                right_points.extend(left_points);
                if right_points.len() >= 3 {
                    let vertices: Vec<Vertex> = right_points
                        .iter()
                        .map(|p| Vertex::new(basis.lift(p)))
                        .collect();
                    dest.push(Polygon::with_plane(vertices, shared.clone(), plane.clone()));
                }
            }
        }

        for this in &mut new_row {
            match this.strip {
                None => {
                    // a new strip starts at this row
                    let mut strip = Strip::default();
                    strip.left_points.push(this.top_left);
                    if distance(&this.top_left, &this.top_right) > EPSILON {
                        // horizontal edge at the top
                        strip.right_points.push(this.top_right);
                    }
                    strips.push(strip);
                    this.strip = Some(strips.len() - 1);
                },
                Some(strip_idx) => {
                    if !this.left_continues {
                        strips[strip_idx].left_points.push(this.top_left);
                    }
                    if !this.right_continues {
                        strips[strip_idx].right_points.push(this.top_right);
                    }
                },
            }
        }
        prev_row = new_row;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square<S: Clone + Send + Sync + Debug>(
        x0: Real,
        x1: Real,
        y0: Real,
        y1: Real,
        shared: Option<S>,
    ) -> Polygon<S> {
        Polygon::new(
            vec![
                Vertex::from_coords(x0, y0, 0.0),
                Vertex::from_coords(x1, y0, 0.0),
                Vertex::from_coords(x1, y1, 0.0),
                Vertex::from_coords(x0, y1, 0.0),
            ],
            shared,
        )
    }

    fn total_area<S: Clone + Send + Sync + Debug>(polygons: &[Polygon<S>]) -> Real {
        polygons.iter().map(|p| p.area()).sum()
    }

    #[test]
    fn two_abutting_squares_merge_into_one() {
        let polys: Vec<Polygon<()>> = vec![
            square(0.0, 1.0, 0.0, 1.0, None),
            square(1.0, 2.0, 0.0, 1.0, None),
        ];
        let merged = retessellate_polygons(&polys);
        assert_eq!(merged.len(), 1);
        assert!((total_area(&merged) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn grid_of_four_squares_merges() {
        let polys: Vec<Polygon<()>> = vec![
            square(0.0, 1.0, 0.0, 1.0, None),
            square(1.0, 2.0, 0.0, 1.0, None),
            square(0.0, 1.0, 1.0, 2.0, None),
            square(1.0, 2.0, 1.0, 2.0, None),
        ];
        let merged = retessellate_polygons(&polys);
        assert_eq!(merged.len(), 1);
        assert!((total_area(&merged) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn different_metadata_does_not_merge() {
        let polys: Vec<Polygon<&'static str>> = vec![
            square(0.0, 1.0, 0.0, 1.0, Some("a")),
            square(1.0, 2.0, 0.0, 1.0, Some("b")),
        ];
        let merged = retessellate_polygons(&polys);
        assert_eq!(merged.len(), 2);
        assert!((total_area(&merged) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_squares_stay_separate_but_conserve_area() {
        let polys: Vec<Polygon<()>> = vec![
            square(0.0, 1.0, 0.0, 1.0, None),
            square(5.0, 6.0, 0.0, 1.0, None),
        ];
        let merged = retessellate_polygons(&polys);
        assert_eq!(merged.len(), 2);
        assert!((total_area(&merged) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn l_shape_conserves_area() {
        let polys: Vec<Polygon<()>> = vec![
            square(0.0, 2.0, 0.0, 1.0, None),
            square(0.0, 1.0, 1.0, 2.0, None),
        ];
        let merged = retessellate_polygons(&polys);
        assert!((total_area(&merged) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn single_polygon_passes_through() {
        let polys: Vec<Polygon<()>> = vec![square(0.0, 1.0, 0.0, 1.0, None)];
        let merged = retessellate_polygons(&polys);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].vertices.len(), 4);
    }
}
