mod support;

use csgkit::area::Area;
use csgkit::float_types::PI;
use nalgebra::Point2;

use crate::support::{approx_eq, circle_points, square_points};

#[test]
fn square_intersect_circle_approaches_circle_area() {
    let square = Area::from_points(&square_points(Point2::origin(), 10.0)).unwrap();
    let circle = Area::from_points(&circle_points(Point2::origin(), 3.0, 64)).unwrap();
    let clipped = square.intersection(&circle).unwrap();
    let area = clipped.signed_area();
    // the circle fits inside the square, so the intersection is the circle
    // polygon itself: close to pi * 9 from below, smaller than both inputs
    assert!(approx_eq(area, PI * 9.0, 0.1), "got {area}");
    assert!(area < PI * 9.0);
    assert!(area < square.signed_area());
    assert!(area < circle.signed_area() + 1e-9);
}

#[test]
fn union_of_offset_squares_covers_one_and_a_half() {
    let a = Area::from_points(&square_points(Point2::new(0.5, 0.5), 1.0)).unwrap();
    let b = Area::from_points(&square_points(Point2::new(1.0, 0.5), 1.0)).unwrap();
    let merged = a.union(&b).unwrap();
    assert!(approx_eq(merged.signed_area(), 1.5, 1e-6));
}

#[test]
fn difference_leaves_a_frame() {
    let outer = Area::from_points(&square_points(Point2::origin(), 4.0)).unwrap();
    let inner = Area::from_points(&square_points(Point2::origin(), 2.0)).unwrap();
    let frame = outer.difference(&inner).unwrap();
    assert!(approx_eq(frame.signed_area(), 16.0 - 4.0, 1e-6));
    // outer boundary counterclockwise plus inner hole clockwise
    assert_eq!(frame.sides().len(), 8);
}

#[test]
fn intersection_of_disjoint_squares_is_empty() {
    let a = Area::from_points(&square_points(Point2::origin(), 2.0)).unwrap();
    let b = Area::from_points(&square_points(Point2::new(10.0, 0.0), 2.0)).unwrap();
    let nothing = a.intersection(&b).unwrap();
    assert!(nothing.sides().is_empty());
}

#[test]
fn union_many_merges_a_strip() {
    let squares: Vec<Area> = (0..3)
        .map(|i| {
            Area::from_points(&square_points(Point2::new(i as f64, 0.0), 1.0)).unwrap()
        })
        .collect();
    let strip = squares[0].union_many(&squares[1..]).unwrap();
    assert!(approx_eq(strip.signed_area(), 3.0, 1e-6));
    // a clean 3x1 rectangle
    assert_eq!(strip.canonicalized().sides().len(), 4);
}

#[test]
fn boolean_results_are_canonical() {
    let a = Area::from_points(&square_points(Point2::origin(), 2.0)).unwrap();
    let b = Area::from_points(&square_points(Point2::new(1.0, 1.0), 2.0)).unwrap();
    let merged = a.union(&b).unwrap();
    assert!(merged.is_canonicalized());
    let again = merged.canonicalized();
    assert_eq!(again.sides().len(), merged.sides().len());
}
