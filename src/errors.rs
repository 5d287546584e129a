//! Validation errors

use crate::float_types::Real;
use nalgebra::Point3;

/// Contract violations and geometric invariant failures surfaced to callers.
///
/// Float-tolerance-level degeneracies (slivers, near-zero edges) are *not*
/// errors; those fragments are silently discarded wherever they arise.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A polygon or point loop was given fewer than the minimal #points
    #[error("shape needs at least {required} vertices, got {actual}")]
    TooFewVertices { required: usize, actual: usize },

    /// A polygon is not convex at the given vertex
    #[error("polygon is not convex at {0}")]
    NotConvex(Point3<Real>),

    /// The vertices do not span a plane
    #[error("degenerate polygon: vertices do not define a plane near {0}")]
    DegeneratePolygon(Point3<Real>),

    /// A 2D outline encloses (near) zero area
    #[error("degenerate outline: enclosed area {0} is below the area epsilon")]
    DegenerateArea(Real),

    /// A wall polygon lifted back to 2D did not have exactly two vertices on
    /// the positive extruded layer
    #[error("wall polygon must have exactly two vertices on the top layer, found {0}")]
    WallVertexCount(usize),

    /// The two top-layer vertices of a wall polygon were not adjacent in the
    /// expected winding
    #[error("wall polygon top vertices have unexpected index separation {0}")]
    WallIndexOrder(usize),

    /// A compact record referenced a vertex/plane/shared entry out of range
    #[error("compact record index {index} out of range ({len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    /// A compact record's parallel arrays disagree on element counts
    #[error("compact record is inconsistent: {0}")]
    MalformedCompact(&'static str),
}
