//! # Geometry Helpers
//!
//! Planes and bounding boxes shared by the slicing kernel and the scheduler.

mod bounds;
mod plane;

pub use bounds::Aabb;
pub use plane::Plane;
