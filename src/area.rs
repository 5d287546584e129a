//! 2D solid areas, modeled as closed loops of [`Side`]s.
//!
//! Boolean operations on areas reuse the 3D pipeline: each side is extruded
//! into a fake wall polygon spanning z in [-1, 1], the walls go through the
//! 3D boolean machinery, and the surviving walls are projected back to
//! sides. This keeps a single battle-tested boolean core for both
//! dimensions.

use crate::errors::ValidationError;
use crate::float_types::{ANGLE_EPSILON, EPSILON, Real};
use crate::fuzzy::FuzzyFactory;
use crate::plane::is_mirroring;
use crate::side::Side;
use crate::solid::Solid;
use nalgebra::{Matrix4, Point2};

/// Smallest enclosed area an outline may have before it is rejected as
/// degenerate.
pub fn area_epsilon() -> Real {
    0.5 * EPSILON * EPSILON * ANGLE_EPSILON.sin()
}

/// A region of the plane bounded by directed sides, counterclockwise around
/// the interior. Holes are additional clockwise loops.
#[derive(Debug, Clone, Default)]
pub struct Area {
    sides: Vec<Side>,
    is_canonicalized: bool,
}

impl Area {
    /// The empty area.
    pub fn new() -> Self {
        Area {
            sides: Vec::new(),
            is_canonicalized: true,
        }
    }

    /// Wrap a side list without validation or cleanup.
    pub fn from_sides(sides: Vec<Side>) -> Self {
        Area {
            sides,
            is_canonicalized: false,
        }
    }

    /// Build an area from a closed loop of points. Winding direction does
    /// not matter; a clockwise loop is flipped to the canonical
    /// counterclockwise orientation.
    pub fn from_points(points: &[Point2<Real>]) -> Result<Area, ValidationError> {
        if points.len() < 3 {
            return Err(ValidationError::TooFewVertices {
                required: 3,
                actual: points.len(),
            });
        }
        let mut sides = Vec::with_capacity(points.len());
        let mut prev = points[points.len() - 1];
        for &point in points {
            sides.push(Side::new(prev, point));
            prev = point;
        }
        let area = Area::from_sides(sides);
        let signed = area.signed_area();
        if signed.abs() < area_epsilon() {
            return Err(ValidationError::DegenerateArea(signed));
        }
        let area = if signed < 0.0 { area.flipped() } else { area };
        Ok(area.canonicalized())
    }

    pub fn sides(&self) -> &[Side] {
        &self.sides
    }

    pub fn into_sides(self) -> Vec<Side> {
        self.sides
    }

    pub fn is_canonicalized(&self) -> bool {
        self.is_canonicalized
    }

    /// Signed enclosed area: positive for counterclockwise boundaries.
    pub fn signed_area(&self) -> Real {
        0.5 * self
            .sides
            .iter()
            .map(|s| s.start.coords.perp(&s.end.coords))
            .sum::<Real>()
    }

    /// Min and max corner of the bounding rectangle.
    pub fn bounds(&self) -> (Point2<Real>, Point2<Real>) {
        let Some(first) = self.sides.first() else {
            return (Point2::origin(), Point2::origin());
        };
        let mut min = first.start;
        let mut max = first.start;
        for side in &self.sides {
            for p in [side.start, side.end] {
                min = min.inf(&p);
                max = max.sup(&p);
            }
        }
        (min, max)
    }

    /// Reverse the orientation of the region.
    pub fn flipped(&self) -> Area {
        let mut sides: Vec<Side> = self.sides.iter().map(Side::flipped).collect();
        sides.reverse();
        Area::from_sides(sides)
    }

    /// Apply an affine transform. A mirroring transform flips the result to
    /// restore counterclockwise orientation.
    pub fn transformed(&self, matrix: &Matrix4<Real>) -> Area {
        let sides = self.sides.iter().map(|s| s.transformed(matrix)).collect();
        let result = Area::from_sides(sides);
        if is_mirroring(matrix) {
            result.flipped()
        } else {
            result
        }
    }

    /// Snap fuzzy-equal endpoints to canonical values and drop sides whose
    /// length collapses below epsilon. No-op if already canonical.
    pub fn canonicalized(&self) -> Area {
        if self.is_canonicalized {
            return self.clone();
        }
        let mut factory: FuzzyFactory<2> = FuzzyFactory::new(EPSILON);
        let mut snap = |p: &Point2<Real>| {
            let idx = factory.lookup_or_insert([p.x, p.y]);
            let [x, y] = *factory.entry(idx);
            Point2::new(x, y)
        };
        let sides: Vec<Side> = self
            .sides
            .iter()
            .map(|s| Side::new(snap(&s.start), snap(&s.end)))
            .filter(|s| s.length() > EPSILON)
            .collect();
        Area {
            sides,
            is_canonicalized: true,
        }
    }

    /// Extrude every side into a wall polygon spanning `[z0, z1]`.
    pub fn to_wall_solid(&self, z0: Real, z1: Real) -> Solid<()> {
        Solid::from_polygons(
            self.sides
                .iter()
                .map(|s| s.to_wall_polygon(z0, z1))
                .collect(),
        )
    }

    /// Project the walls of a boolean result back into sides.
    pub fn from_fake_solid(solid: &Solid<()>) -> Result<Area, ValidationError> {
        let mut sides = Vec::with_capacity(solid.polygons().len());
        for polygon in solid.polygons() {
            if let Some(side) = Side::from_fake_polygon(polygon)? {
                sides.push(side);
            }
        }
        Ok(Area::from_sides(sides))
    }

    pub fn union(&self, other: &Area) -> Result<Area, ValidationError> {
        self.union_many(std::slice::from_ref(other))
    }

    pub fn union_many(&self, others: &[Area]) -> Result<Area, ValidationError> {
        let walls: Vec<Solid<()>> = others
            .iter()
            .map(|a| a.to_wall_solid(-1.0, 1.0).retessellated())
            .collect();
        let merged = self.to_wall_solid(-1.0, 1.0).union_many(&walls);
        Ok(Area::from_fake_solid(&merged)?.canonicalized())
    }

    pub fn difference(&self, other: &Area) -> Result<Area, ValidationError> {
        self.difference_many(std::slice::from_ref(other))
    }

    pub fn difference_many(&self, others: &[Area]) -> Result<Area, ValidationError> {
        let mut result = self.to_wall_solid(-1.0, 1.0);
        for other in others {
            result = result.difference_sub(&other.to_wall_solid(-1.0, 1.0), false, false);
        }
        let result = result.retessellated().canonicalized();
        Ok(Area::from_fake_solid(&result)?.canonicalized())
    }

    pub fn intersection(&self, other: &Area) -> Result<Area, ValidationError> {
        self.intersection_many(std::slice::from_ref(other))
    }

    pub fn intersection_many(&self, others: &[Area]) -> Result<Area, ValidationError> {
        let mut result = self.to_wall_solid(-1.0, 1.0);
        for other in others {
            result = result.intersection_sub(&other.to_wall_solid(-1.0, 1.0), false, false);
        }
        let result = result.retessellated().canonicalized();
        Ok(Area::from_fake_solid(&result)?.canonicalized())
    }
}
