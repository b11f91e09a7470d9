//! # Cutting Plane
//!
//! Plane representation with signed distances and grid quantization.

use config::constants::{quantize, EPSILON};
use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

// =============================================================================
// PLANE
// =============================================================================

/// A plane in 3D space defined by normal and distance from origin.
///
/// Points with positive signed distance lie on the outside of the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Normal vector.
    normal: Vec3,
    /// Distance from origin along normal.
    distance: f32,
}

impl Plane {
    /// Create plane from normal and distance.
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Create plane through `point` with the given normal (normalized).
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    /// Create plane from three points.
    ///
    /// Points should be in counter-clockwise order when viewed from outside.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Option<Self> {
        let normal = (b - a).cross(c - a);
        if normal.length() < EPSILON {
            return None;
        }
        Some(Self::from_normal_and_point(normal, a))
    }

    /// Get the plane normal.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Get the plane distance.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Plane coefficients as `(normal, distance)`.
    pub fn to_vec4(&self) -> Vec4 {
        self.normal.extend(self.distance)
    }

    /// Flip the plane (reverse normal).
    pub fn flip(&self) -> Plane {
        Plane {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Signed distance from point to plane.
    ///
    /// Positive = outside, negative = inside, zero = on plane.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }

    /// Snaps every coefficient to the `1 / precision` grid.
    pub fn quantized(&self, precision: u32) -> Plane {
        Plane {
            normal: Vec3::new(
                quantize(self.normal.x, precision),
                quantize(self.normal.y, precision),
                quantize(self.normal.z, precision),
            ),
            distance: quantize(self.distance, precision),
        }
    }

    /// Maps the plane through an affine transform.
    ///
    /// Returns `None` when the transform collapses the plane.
    pub fn transformed(&self, matrix: &Mat4) -> Option<Plane> {
        let len_sq = self.normal.length_squared();
        if len_sq < EPSILON * EPSILON {
            return None;
        }
        let origin = matrix.transform_point3(self.normal * (self.distance / len_sq));
        let normal = matrix
            .inverse()
            .transpose()
            .transform_vector3(self.normal)
            .normalize_or_zero();
        let plane = Plane {
            normal,
            distance: normal.dot(origin),
        };
        plane.is_valid().then_some(plane)
    }

    /// True when all coefficients are finite and the normal is non-zero.
    pub fn is_valid(&self) -> bool {
        self.normal.is_finite()
            && self.distance.is_finite()
            && self.normal.length_squared() > EPSILON * EPSILON
    }
}

// =============================================================================
// TESTS
// =============================================================================
