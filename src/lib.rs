//! Constructive solid geometry on polygon boundary representations.
//!
//! Solids are closed surfaces of convex planar polygons; boolean operations
//! (union, difference, intersection) run on provenance-tracked BSP trees,
//! results are re-tessellated to merge coplanar fragments and canonicalized
//! to snap fuzzy-equal vertices. A 2D analog ([`area::Area`]) reuses the 3D
//! pipeline by extruding its outline into fake walls.
//!
//! ```
//! use csgkit::prelude::*;
//! use csgkit::polygon::Polygon;
//! use csgkit::vertex::Vertex;
//!
//! // a tetrahedron from four triangles
//! let points = [
//!     [0.0, 0.0, 0.0],
//!     [1.0, 0.0, 0.0],
//!     [0.0, 1.0, 0.0],
//!     [0.0, 0.0, 1.0],
//! ];
//! let faces: [[usize; 3]; 4] = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];
//! let polygons: Vec<Polygon<()>> = faces
//!     .iter()
//!     .map(|f| {
//!         Polygon::new(
//!             f.iter()
//!                 .map(|&i| Vertex::from_coords(points[i][0], points[i][1], points[i][2]))
//!                 .collect(),
//!             None,
//!         )
//!     })
//!     .collect();
//! let solid = Solid::from_polygons(polygons);
//! let shifted = solid.translate(0.25, 0.25, 0.0);
//! let merged = solid.union(&shifted);
//! assert!(merged.signed_volume() > solid.signed_volume());
//! ```

#![forbid(unsafe_code)]

#[cfg(all(feature = "f64", feature = "f32"))]
compile_error!("Features f64 and f32 are mutually exclusive and cannot be enabled together");

#[cfg(not(any(feature = "f64", feature = "f32")))]
compile_error!("Either feature f64 or f32 must be enabled");

pub mod area;
pub mod bsp;
pub mod compact;
pub mod errors;
pub mod float_types;
pub mod fuzzy;
pub mod plane;
pub mod polygon;
pub mod retessellate;
pub mod side;
pub mod solid;
pub mod traits;
pub mod vertex;

pub mod prelude {
    //! The most commonly used types and the operations trait.
    pub use crate::area::Area;
    pub use crate::compact::{CompactArea, CompactSolid};
    pub use crate::errors::ValidationError;
    pub use crate::float_types::{EPSILON, Real};
    pub use crate::plane::Plane;
    pub use crate::polygon::Polygon;
    pub use crate::side::Side;
    pub use crate::solid::Solid;
    pub use crate::traits::Csg;
    pub use crate::vertex::Vertex;
}
