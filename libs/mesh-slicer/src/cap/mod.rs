//! # Cap Triangulation
//!
//! Closes the cross-section exposed by a cut. The fill ring is snapped to the
//! division grid, rotated so the cap normal points along `-Z`, deduplicated
//! and handed to a Delaunay triangulation.
//!
//! Only convex cross-sections produce a correct cap. A non-convex ring is
//! covered by its convex hull.

use std::collections::HashMap;

use glam::{DQuat, DVec2, DVec3};
use spade::{DelaunayTriangulation, Point2, Triangulation};

use crate::error::{MeshError, MeshResult};
use crate::settings::{Side, SliceRequest};
use crate::slice::FillRing;
use crate::surface::{MeshSurface, Topology, VertexAttribute};

/// Sub-grid resolution of projected cap coordinates.
///
/// Absorbs rotation round-off so points collinear on the grid stay collinear.
const PROJECTION_SNAP: f64 = 1024.0;

/// Normal of the cap closing `side`.
pub fn cap_normal(ring: &FillRing, side: Side) -> DVec3 {
    let n = ring.plane.normal().as_dvec3().normalize_or_zero();
    match side {
        Side::Outside => -n,
        Side::Inside => n,
    }
}

/// Appends a cap over `ring` to `destination`.
///
/// Returns the number of cap triangles. Nothing happens unless fill is
/// enabled and division is linear. A target submesh at or past the current
/// submesh count opens a new fill submesh; otherwise the last submesh is
/// extended.
///
/// # Errors
///
/// Returns [`MeshError::IndexOutOfRange`] when the ring refers past the
/// vertex buffer.
pub fn cap_surface(
    destination: &mut MeshSurface,
    ring: &FillRing,
    request: &SliceRequest,
) -> MeshResult<usize> {
    if !request.wants_cap() || ring.is_empty() {
        return Ok(0);
    }
    if !request.fill.convex_only {
        log::warn!("non-convex fill requested; cap covers the convex hull of the cut");
    }

    let normal = cap_normal(ring, request.side);
    if normal == DVec3::ZERO {
        return Ok(0);
    }
    let rotation = DQuat::from_rotation_arc(normal, DVec3::NEG_Z);
    let precision = f64::from(request.division.precision);

    // Deduplicate on the projected grid; first occurrence wins.
    let mut seen: HashMap<(u64, u64), usize> = HashMap::new();
    let mut points: Vec<DVec2> = Vec::new();
    let mut sources: Vec<(u32, DVec3)> = Vec::new();
    for &index in &ring.indices {
        let position = destination
            .vertices()
            .position(index as usize)
            .ok_or(MeshError::IndexOutOfRange {
                index,
                count: destination.vertex_count(),
            })?;
        let grid = (position.as_dvec3() * precision).round();
        let projected = rotation * grid;
        let point = DVec2::new(snap(projected.x), snap(projected.y));
        let key = (point.x.to_bits(), point.y.to_bits());
        if !seen.contains_key(&key) {
            seen.insert(key, points.len());
            points.push(point);
            sources.push((index, grid / precision));
        }
    }
    if points.len() < 3 {
        return Ok(0);
    }

    let faces = triangulate(&points)?;
    if faces.is_empty() {
        return Ok(0);
    }

    let layout = destination.layout();
    let base = destination.vertex_count() as u32;
    let cap_normal = normal.as_vec3();
    let vertices = destination.vertices_mut();
    for &(index, position) in &sources {
        let v = vertices.duplicate(index as usize)? as usize;
        vertices.set_position(v, position.as_vec3())?;
        if layout.contains(VertexAttribute::Normal) {
            vertices.set_normal(v, cap_normal)?;
        }
        if layout.contains(VertexAttribute::Tangent) {
            vertices.set_tangent(v, glam::Vec4::ZERO)?;
        }
    }

    if request.fill.target_submesh >= destination.submeshes().len() {
        destination.begin_submesh(Topology::Triangles);
    }
    for [a, b, c] in &faces {
        destination.add_triangle([base + *a as u32, base + *b as u32, base + *c as u32]);
    }

    log::trace!(
        "capped {:?}: {} ring vertices, {} unique, {} triangles",
        request.side,
        ring.indices.len(),
        points.len(),
        faces.len()
    );
    Ok(faces.len())
}

fn snap(value: f64) -> f64 {
    // `+ 0.0` folds negative zero so it keys like positive zero.
    (value * PROJECTION_SNAP).round() / PROJECTION_SNAP + 0.0
}

/// Delaunay triangles over `points`, wound clockwise in the projected plane.
///
/// With the cap normal rotated onto `-Z`, clockwise in XY faces the cap
/// normal.
fn triangulate(points: &[DVec2]) -> MeshResult<Vec<[usize; 3]>> {
    let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
    let mut handle_to_point = HashMap::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        let handle = triangulation
            .insert(Point2::new(p.x, p.y))
            .map_err(|e| MeshError::degenerate(format!("cap point {i}: {e:?}")))?;
        handle_to_point.insert(handle.index(), i);
    }

    let mut faces = Vec::with_capacity(triangulation.num_inner_faces());
    for face in triangulation.inner_faces() {
        let [v0, v1, v2] = face.vertices();
        let (Some(&a), Some(&b), Some(&c)) = (
            handle_to_point.get(&v0.fix().index()),
            handle_to_point.get(&v1.fix().index()),
            handle_to_point.get(&v2.fix().index()),
        ) else {
            continue;
        };
        let (pa, pb, pc) = (points[a], points[b], points[c]);
        let area = (pb - pa).perp_dot(pc - pa);
        if area > 0.0 {
            faces.push([a, c, b]);
        } else if area < 0.0 {
            faces.push([a, b, c]);
        }
    }
    Ok(faces)
}

#[cfg(test)]
mod tests;
