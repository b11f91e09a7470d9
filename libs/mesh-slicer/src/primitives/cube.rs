//! # Box Surface
//!
//! Generates the 8-vertex, 12-triangle box surface.

use glam::Vec3;

use crate::error::{MeshError, MeshResult};
use crate::surface::{MeshSurface, Vertex, VertexLayout};

/// Creates an axis-aligned box surface.
///
/// # Arguments
///
/// * `center` - Center of the box
/// * `size` - Dimensions [x, y, z]
/// * `layout` - Vertex layout; normals point away from the center when present
///
/// # Returns
///
/// A surface with 8 vertices, 12 outward-wound triangles and one submesh.
///
/// # Example
///
/// ```rust
/// use glam::Vec3;
/// use mesh_slicer::primitives::box_surface;
/// use mesh_slicer::surface::VertexLayout;
///
/// let surface = box_surface(Vec3::ZERO, Vec3::splat(2.0), VertexLayout::position_only()).unwrap();
/// assert_eq!(surface.vertex_count(), 8);
/// assert_eq!(surface.triangle_count(), 12);
/// ```
pub fn box_surface(center: Vec3, size: Vec3, layout: VertexLayout) -> MeshResult<MeshSurface> {
    if size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
        return Err(MeshError::degenerate(format!(
            "Box size must be positive: {size:?}"
        )));
    }

    let mut surface = MeshSurface::with_capacity(layout, 8, 12);
    let half = size * 0.5;
    let (min, max) = (center - half, center + half);

    let corners = [
        Vec3::new(min.x, min.y, min.z), // 0: left-front-bottom
        Vec3::new(max.x, min.y, min.z), // 1: right-front-bottom
        Vec3::new(max.x, max.y, min.z), // 2: right-back-bottom
        Vec3::new(min.x, max.y, min.z), // 3: left-back-bottom
        Vec3::new(min.x, min.y, max.z), // 4: left-front-top
        Vec3::new(max.x, min.y, max.z), // 5: right-front-top
        Vec3::new(max.x, max.y, max.z), // 6: right-back-top
        Vec3::new(min.x, max.y, max.z), // 7: left-back-top
    ];
    for corner in corners {
        let normal = (corner - center).normalize_or_zero();
        surface.vertices_mut().push_vertex(&Vertex::new(corner).with_normal(normal));
    }

    // Counter-clockwise viewed from outside
    const FACES: [[u32; 3]; 12] = [
        [0, 2, 1], [0, 3, 2], // bottom
        [4, 5, 6], [4, 6, 7], // top
        [0, 1, 5], [0, 5, 4], // front
        [2, 3, 7], [2, 7, 6], // back
        [3, 0, 4], [3, 4, 7], // left
        [1, 2, 6], [1, 6, 5], // right
    ];
    for face in FACES {
        surface.add_triangle(face);
    }
    surface.recalculate_bounds();
    Ok(surface)
}

/// Unit cube spanning `[0, 1]` on every axis.
pub fn unit_cube(layout: VertexLayout) -> MeshSurface {
    // Size is a positive constant, so this never falls back.
    box_surface(Vec3::splat(0.5), Vec3::ONE, layout).unwrap_or_else(|_| MeshSurface::new(layout))
}
