mod support;

use csgkit::float_types::Real;
use csgkit::polygon::Polygon;
use csgkit::solid::Solid;
use csgkit::traits::Csg;
use csgkit::vertex::Vertex;
use nalgebra::Point3;

use crate::support::{approx_eq, cube, unit_cube_at};

/// The corner-of-a-cube polygons below share corner positions only up to a
/// jitter well under the tolerance.
fn jittered_quad(jitter: Real) -> Polygon<()> {
    Polygon::new(
        vec![
            Vertex::from_coords(0.0 + jitter, 0.0, 0.0),
            Vertex::from_coords(1.0, 0.0 - jitter, 0.0),
            Vertex::from_coords(1.0, 1.0, 0.0 + jitter),
            Vertex::from_coords(0.0 - jitter, 1.0, 0.0),
        ],
        None,
    )
}

#[test]
fn jittered_copies_collapse_to_shared_vertices() {
    let a = jittered_quad(0.0);
    let b = jittered_quad(4e-6);
    let solid = Solid::from_polygons(vec![a.clone(), b]);
    let canonical = solid.canonicalized();
    assert_eq!(canonical.polygons().len(), 2);
    // the second polygon snapped onto the first's coordinates
    for (va, vb) in canonical.polygons()[0]
        .vertices
        .iter()
        .zip(&canonical.polygons()[1].vertices)
    {
        assert_eq!(va.pos, vb.pos);
    }
    assert_eq!(canonical.polygons()[0].vertices, a.vertices);
}

#[test]
fn canonicalization_is_idempotent() {
    let solid = Solid::from_polygons(vec![jittered_quad(0.0), jittered_quad(3e-6)]);
    let once = solid.canonicalized();
    let twice = once.canonicalized();
    assert_eq!(once.polygons().len(), twice.polygons().len());
    for (a, b) in once.polygons().iter().zip(twice.polygons()) {
        assert_eq!(a.vertices, b.vertices);
        assert_eq!(a.plane, b.plane);
    }
}

#[test]
fn slivers_are_dropped_during_canonicalization() {
    let sliver: Polygon<()> = Polygon::new(
        vec![
            Vertex::from_coords(0.0, 0.0, 0.0),
            Vertex::from_coords(1.0, 0.0, 0.0),
            Vertex::from_coords(1.0, 3e-6, 0.0),
            Vertex::from_coords(0.0, 2e-6, 0.0),
        ],
        None,
    );
    let solid = Solid::from_polygons(vec![jittered_quad(0.0), sliver]);
    let canonical = solid.canonicalized();
    assert_eq!(canonical.polygons().len(), 1);
}

#[test]
fn retessellation_conserves_volume_and_area() {
    let a = unit_cube_at(Point3::origin());
    let b = unit_cube_at(Point3::new(1.0, 0.0, 0.0));
    // the raw union step leaves fragmented coplanar faces behind
    let raw = a.union_sub(&b, false, false);
    let merged = raw.retessellated();
    assert!(approx_eq(merged.signed_volume(), raw.signed_volume(), 1e-9));
    assert!(approx_eq(merged.surface_area(), raw.surface_area(), 1e-6));
    assert!(merged.polygons().len() <= raw.polygons().len());
}

#[test]
fn boolean_results_come_back_canonical_and_retessellated() {
    let a = cube(Point3::origin(), 1.0);
    let b = cube(Point3::new(0.5, 0.5, 0.5), 1.0);
    let merged = a.union(&b);
    assert!(merged.is_canonicalized());
    // canonicalization ran after the re-tessellation pass
    let merged_again = merged.canonicalized();
    assert_eq!(merged_again.polygons().len(), merged.polygons().len());
}

#[test]
fn metadata_survives_boolean_operations() {
    let tag = |solid: Solid<()>, name: &'static str| -> Solid<&'static str> {
        Solid::from_polygons(
            solid
                .into_polygons()
                .into_iter()
                .map(|p| Polygon::new(p.vertices, Some(name)))
                .collect(),
        )
    };
    let a = tag(cube(Point3::origin(), 1.0), "a");
    let b = tag(cube(Point3::new(1.0, 0.0, 0.0), 1.0), "b");
    let merged = a.union(&b);
    let mut seen_a = false;
    let mut seen_b = false;
    for polygon in merged.polygons() {
        match polygon.shared {
            Some("a") => seen_a = true,
            Some("b") => seen_b = true,
            _ => panic!("polygon lost its metadata"),
        }
    }
    assert!(seen_a && seen_b);
}
