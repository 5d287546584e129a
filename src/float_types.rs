//! Scalar type selection and the crate-wide tolerance model.

// Re-export parry for the appropriate float size
#[cfg(feature = "f64")]
pub use parry3d_f64 as parry3d;

#[cfg(feature = "f32")]
pub use parry3d;

// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

/// Absolute epsilon used for all on-plane / near-zero-distance decisions.
///
/// Every plane-side test, duplicate-vertex collapse and degenerate-fragment
/// check in the crate shares this one constant, so repeated boolean
/// operations stay consistent with each other.
#[cfg(feature = "f32")]
pub const EPSILON: Real = 1e-3;
/// Absolute epsilon used for all on-plane / near-zero-distance decisions.
///
/// Every plane-side test, duplicate-vertex collapse and degenerate-fragment
/// check in the crate shares this one constant, so repeated boolean
/// operations stay consistent with each other.
#[cfg(feature = "f64")]
pub const EPSILON: Real = 1e-5;

/// Angular tolerance in radians; with [`EPSILON`] it bounds the smallest
/// enclosed area a 2D outline may have before counting as degenerate.
pub const ANGLE_EPSILON: Real = 0.1;

/// Archimedes' constant (π)
#[cfg(feature = "f32")]
pub const PI: Real = core::f32::consts::PI;
/// Archimedes' constant (π)
#[cfg(feature = "f64")]
pub const PI: Real = core::f64::consts::PI;

/// The full circle constant (τ)
#[cfg(feature = "f32")]
pub const TAU: Real = core::f32::consts::TAU;
/// The full circle constant (τ)
#[cfg(feature = "f64")]
pub const TAU: Real = core::f64::consts::TAU;
