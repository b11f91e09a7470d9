//! # Mesh Slicer
//!
//! Plane slicing of triangle meshes with interleaved vertex attributes.
//!
//! ## Architecture
//!
//! ```text
//! MeshSurface → slice_surface (one side + FillRing) → cap_surface → MeshSurface
//! ```
//!
//! ## Algorithms
//!
//! - **Plane Slice**: grid-quantized clipping, attributes lerped on the cut
//! - **Cap**: ring projected onto the plane, Delaunay triangulated (spade)
//! - **Primitives**: box, icosphere and icocapsule generators
//!
//! ## Usage
//!
//! ```rust
//! use glam::Vec3;
//! use mesh_slicer::{slice_and_cap, Plane, Side, SliceRequest};
//! use mesh_slicer::primitives::unit_cube;
//! use mesh_slicer::surface::{MeshSurface, VertexLayout};
//!
//! let cube = unit_cube(VertexLayout::position_normal());
//! let request = SliceRequest::new(Plane::new(Vec3::X, 0.5), Side::Outside);
//! let mut outside = MeshSurface::new(cube.layout());
//! slice_and_cap(&cube, &request, &mut outside).unwrap();
//!
//! assert!((outside.volume() - 0.5).abs() < 1e-4);
//! ```

pub mod cap;
pub mod error;
pub mod geometry;
pub mod primitives;
pub mod settings;
pub mod slice;
pub mod surface;

pub use cap::cap_surface;
pub use error::{MeshError, MeshResult};
pub use geometry::{Aabb, Plane};
pub use settings::{Division, DivisionType, Fill, Side, SliceRequest};
pub use slice::{slice_surface, FillRing};
pub use surface::MeshSurface;

/// Clips, caps and recomputes bounds in one call.
///
/// Returns the number of cap triangles appended.
pub fn slice_and_cap(
    source: &MeshSurface,
    request: &SliceRequest,
    destination: &mut MeshSurface,
) -> MeshResult<usize> {
    let ring = slice_surface(source, request, destination)?;
    let capped = cap_surface(destination, &ring, request)?;
    destination.recalculate_bounds();
    Ok(capped)
}
