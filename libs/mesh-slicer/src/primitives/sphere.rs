//! # Icosphere Surfaces
//!
//! Icosahedron refined by midpoint subdivision, and the capsule variant with
//! its hemispheres pulled apart along `Y`.

use std::collections::HashMap;

use config::constants::MAX_SPHERE_SUBDIVISIONS;
use glam::Vec3;

use crate::error::{MeshError, MeshResult};
use crate::surface::{MeshSurface, Vertex, VertexLayout};

/// Unit icosphere as positions and outward-wound faces.
fn unit_icosphere(subdivisions: u32) -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let mut positions: Vec<Vec3> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(|(x, y, z)| Vec3::new(x, y, z).normalize())
    .collect();

    let mut faces: Vec<[u32; 3]> = vec![
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let p = (positions[a as usize] + positions[b as usize]).normalize();
                positions.push(p);
                (positions.len() - 1) as u32
            })
        };

        let mut refined = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = midpoint(a, b, &mut positions);
            let bc = midpoint(b, c, &mut positions);
            let ca = midpoint(c, a, &mut positions);
            refined.extend([[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
        }
        faces = refined;
    }
    (positions, faces)
}

fn check(radius: f32, subdivisions: u32) -> MeshResult<()> {
    if radius <= 0.0 {
        return Err(MeshError::degenerate(format!(
            "Sphere radius must be positive: {radius}"
        )));
    }
    if subdivisions > MAX_SPHERE_SUBDIVISIONS {
        return Err(MeshError::degenerate(format!(
            "Too many subdivisions: {subdivisions} (max: {MAX_SPHERE_SUBDIVISIONS})"
        )));
    }
    Ok(())
}

fn assemble(
    layout: VertexLayout,
    positions: Vec<(Vec3, Vec3)>,
    faces: Vec<[u32; 3]>,
) -> MeshSurface {
    let mut surface = MeshSurface::with_capacity(layout, positions.len(), faces.len());
    for (position, normal) in positions {
        surface
            .vertices_mut()
            .push_vertex(&Vertex::new(position).with_normal(normal));
    }
    for face in faces {
        surface.add_triangle(face);
    }
    surface.recalculate_bounds();
    surface
}

/// Creates an icosphere surface.
///
/// # Example
///
/// ```rust
/// use glam::Vec3;
/// use mesh_slicer::primitives::icosphere_surface;
/// use mesh_slicer::surface::VertexLayout;
///
/// let sphere = icosphere_surface(Vec3::ZERO, 1.0, 1, VertexLayout::position_only()).unwrap();
/// assert_eq!(sphere.triangle_count(), 80);
/// ```
pub fn icosphere_surface(
    center: Vec3,
    radius: f32,
    subdivisions: u32,
    layout: VertexLayout,
) -> MeshResult<MeshSurface> {
    check(radius, subdivisions)?;
    let (positions, faces) = unit_icosphere(subdivisions);
    let positions = positions
        .into_iter()
        .map(|n| (center + n * radius, n))
        .collect();
    Ok(assemble(layout, positions, faces))
}

/// Creates a capsule along `Y`: an icosphere whose upper and lower halves
/// are offset by `height / 2`.
pub fn icocapsule_surface(
    center: Vec3,
    height: f32,
    radius: f32,
    subdivisions: u32,
    layout: VertexLayout,
) -> MeshResult<MeshSurface> {
    check(radius, subdivisions)?;
    if height < 0.0 {
        return Err(MeshError::degenerate(format!(
            "Capsule height must not be negative: {height}"
        )));
    }
    let (positions, faces) = unit_icosphere(subdivisions);
    let half = height * 0.5;
    let positions = positions
        .into_iter()
        .map(|n| {
            let offset = if n.y > 0.0 {
                half
            } else if n.y < 0.0 {
                -half
            } else {
                0.0
            };
            (center + n * radius + Vec3::Y * offset, n)
        })
        .collect();
    Ok(assemble(layout, positions, faces))
}
