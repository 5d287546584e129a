//! Test support library
//! Shape builders and measurement helpers shared by the integration tests.

use csgkit::float_types::{PI, Real, TAU};
use csgkit::polygon::Polygon;
use csgkit::solid::Solid;
use csgkit::vertex::Vertex;
use nalgebra::{Point2, Point3};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Axis-aligned box spanning `min` to `max`, faces wound outward.
pub fn cuboid(min: Point3<Real>, max: Point3<Real>) -> Solid<()> {
    let corner = |i: usize| {
        Point3::new(
            if i & 1 != 0 { max.x } else { min.x },
            if i & 2 != 0 { max.y } else { min.y },
            if i & 4 != 0 { max.z } else { min.z },
        )
    };
    let faces: [[usize; 4]; 6] = [
        [0, 4, 6, 2],
        [1, 3, 7, 5],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 2, 3, 1],
        [4, 5, 7, 6],
    ];
    let polygons = faces
        .iter()
        .map(|face| {
            Polygon::new(
                face.iter().map(|&i| Vertex::new(corner(i))).collect(),
                None,
            )
        })
        .collect();
    Solid::from_polygons(polygons)
}

/// Cube of the given half-extent centered on `center`.
pub fn cube(center: Point3<Real>, radius: Real) -> Solid<()> {
    let r = Point3::new(radius, radius, radius);
    cuboid(center - r.coords, center + r.coords)
}

/// Unit cube with its minimum corner at `corner`.
pub fn unit_cube_at(corner: Point3<Real>) -> Solid<()> {
    cuboid(corner, corner + nalgebra::Vector3::new(1.0, 1.0, 1.0))
}

/// Latitude/longitude sphere approximation, faces wound outward.
pub fn sphere(center: Point3<Real>, radius: Real, slices: usize, stacks: usize) -> Solid<()> {
    let point = |i: usize, j: usize| {
        let theta = TAU * (i % slices) as Real / slices as Real;
        let phi = PI * j as Real / stacks as Real;
        Point3::new(
            center.x + radius * phi.sin() * theta.cos(),
            center.y + radius * phi.sin() * theta.sin(),
            center.z + radius * phi.cos(),
        )
    };
    let mut polygons = Vec::new();
    for i in 0..slices {
        for j in 0..stacks {
            let mut ring = vec![
                point(i, j),
                point(i, j + 1),
                point(i + 1, j + 1),
                point(i + 1, j),
            ];
            // collapse the duplicated pole vertex on the cap rows
            ring.dedup_by(|a, b| (*a - *b).norm() < 1e-12);
            if ring.len() > 1 && (ring[0] - ring[ring.len() - 1]).norm() < 1e-12 {
                ring.pop();
            }
            if ring.len() >= 3 {
                polygons.push(Polygon::new(
                    ring.into_iter().map(Vertex::new).collect(),
                    None,
                ));
            }
        }
    }
    Solid::from_polygons(polygons)
}

/// Counterclockwise regular polygon approximating a circle.
pub fn circle_points(center: Point2<Real>, radius: Real, segments: usize) -> Vec<Point2<Real>> {
    (0..segments)
        .map(|i| {
            let angle = TAU * i as Real / segments as Real;
            Point2::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}

/// Counterclockwise square of the given side length centered on `center`.
pub fn square_points(center: Point2<Real>, side: Real) -> Vec<Point2<Real>> {
    let h = side / 2.0;
    vec![
        Point2::new(center.x - h, center.y - h),
        Point2::new(center.x + h, center.y - h),
        Point2::new(center.x + h, center.y + h),
        Point2::new(center.x - h, center.y + h),
    ]
}

/// Bounding box `[min_x, min_y, min_z, max_x, max_y, max_z]` of a polygon set.
pub fn bounding_box(polygons: &[Polygon<()>]) -> [Real; 6] {
    let mut bounds = [
        Real::MAX,
        Real::MAX,
        Real::MAX,
        Real::MIN,
        Real::MIN,
        Real::MIN,
    ];
    for poly in polygons {
        for v in &poly.vertices {
            bounds[0] = bounds[0].min(v.pos.x);
            bounds[1] = bounds[1].min(v.pos.y);
            bounds[2] = bounds[2].min(v.pos.z);
            bounds[3] = bounds[3].max(v.pos.x);
            bounds[4] = bounds[4].max(v.pos.y);
            bounds[5] = bounds[5].max(v.pos.z);
        }
    }
    bounds
}
