//! # Primitives
//!
//! Surface generators for boxes, icospheres and icocapsules.

pub mod cube;
pub mod sphere;

pub use cube::{box_surface, unit_cube};
pub use sphere::{icocapsule_surface, icosphere_surface};
