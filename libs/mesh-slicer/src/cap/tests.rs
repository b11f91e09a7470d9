//! Tests for cap triangulation.

use super::*;
use crate::geometry::Plane;
use crate::primitives::unit_cube;
use crate::settings::{Division, DivisionType, Fill};
use crate::slice::slice_surface;
use crate::surface::{Vertex, VertexAttributes, VertexLayout};
use glam::{Vec3, Vec4};

fn tangent_layout() -> VertexLayout {
    VertexLayout::new(VertexAttributes::POSITION | VertexAttributes::NORMAL | VertexAttributes::TANGENT)
        .unwrap()
}

/// A surface holding a regular polygon of `k` vertices on `z = 0`, with a
/// ring that repeats every vertex twice.
fn polygon_ring(k: usize) -> (MeshSurface, FillRing) {
    let mut surface = MeshSurface::new(tangent_layout());
    surface.begin_submesh(Topology::Triangles);
    let mut indices = Vec::new();
    for i in 0..k {
        let angle = i as f32 / k as f32 * std::f32::consts::TAU;
        let p = Vec3::new(angle.cos(), angle.sin(), 0.0);
        let v = surface.vertices_mut().push_vertex(
            &Vertex::new(p)
                .with_normal(Vec3::X)
                .with_tangent(Vec4::new(0.0, 1.0, 0.0, 1.0)),
        );
        indices.push(v);
    }
    let doubled = indices.iter().chain(indices.iter().rev()).copied().collect();
    let ring = FillRing {
        indices: doubled,
        plane: Plane::new(Vec3::Z, 0.0),
    };
    (surface, ring)
}

fn face_normal(surface: &MeshSurface, t: [u32; 3]) -> Vec3 {
    let [a, b, c] = t.map(|i| surface.vertices().position(i as usize).unwrap());
    (b - a).cross(c - a)
}

#[test]
fn test_convex_ring_gives_k_minus_two_triangles() {
    for k in [3, 4, 6, 9] {
        let (mut surface, ring) = polygon_ring(k);
        let request = SliceRequest::new(ring.plane, Side::Inside);
        let count = cap_surface(&mut surface, &ring, &request).unwrap();
        assert_eq!(count, k - 2, "ring of {k}");
        assert_eq!(surface.vertex_count(), 2 * k);
    }
}

#[test]
fn test_cap_faces_cap_normal() {
    for side in Side::BOTH {
        let (mut surface, ring) = polygon_ring(6);
        let request = SliceRequest::new(ring.plane, side);
        cap_surface(&mut surface, &ring, &request).unwrap();

        let expected = cap_normal(&ring, side).as_vec3();
        for t in surface.triangles() {
            assert!(face_normal(&surface, *t).dot(expected) > 0.0, "{side:?}");
        }
    }
}

#[test]
fn test_fill_vertices_carry_cap_normal_and_zero_tangent() {
    let (mut surface, ring) = polygon_ring(5);
    let request = SliceRequest::new(ring.plane, Side::Outside);
    cap_surface(&mut surface, &ring, &request).unwrap();

    for v in 5..10 {
        assert_eq!(surface.vertices().normal(v), Some(-Vec3::Z));
        assert_eq!(surface.vertices().tangent(v), Some(Vec4::ZERO));
    }
    // Ring vertices themselves are untouched.
    assert_eq!(surface.vertices().normal(0), Some(Vec3::X));
}

#[test]
fn test_fill_positions_are_snapped_to_grid() {
    let (mut surface, ring) = polygon_ring(7);
    let request = SliceRequest::new(ring.plane, Side::Outside);
    cap_surface(&mut surface, &ring, &request).unwrap();

    let p = request.division.precision as f32;
    for v in 7..14 {
        let pos = surface.vertices().position(v).unwrap();
        let snapped = (pos * p).round() / p;
        assert!((pos - snapped).abs().max_element() < 1e-6);
    }
}

#[test]
fn test_cube_cross_section() {
    // The cut square carries its four corners plus the four points where
    // face diagonals cross the plane.
    let cube = unit_cube(VertexLayout::position_normal());
    let request = SliceRequest::new(Plane::new(Vec3::X, 0.5), Side::Outside);
    let mut outside = MeshSurface::new(cube.layout());
    let ring = slice_surface(&cube, &request, &mut outside).unwrap();

    let count = cap_surface(&mut outside, &ring, &request).unwrap();
    assert_eq!(count, 8 - 2);
}

#[test]
fn test_disabled_or_discrete_fill_is_skipped() {
    let (mut surface, ring) = polygon_ring(4);
    let request = SliceRequest::new(ring.plane, Side::Outside).with_fill(Fill::disabled());
    assert_eq!(cap_surface(&mut surface, &ring, &request).unwrap(), 0);

    let discrete = Division {
        kind: DivisionType::Discrete,
        ..Division::default()
    };
    let request = SliceRequest::new(ring.plane, Side::Outside).with_division(discrete);
    assert_eq!(cap_surface(&mut surface, &ring, &request).unwrap(), 0);
    assert_eq!(surface.vertex_count(), 4);
}

#[test]
fn test_degenerate_rings_produce_nothing() {
    let mut surface = MeshSurface::new(VertexLayout::position_only());
    let a = surface.vertices_mut().push_vertex(&Vertex::new(Vec3::ZERO));
    let b = surface.vertices_mut().push_vertex(&Vertex::new(Vec3::X));
    let c = surface.vertices_mut().push_vertex(&Vertex::new(Vec3::X * 2.0));
    let plane = Plane::new(Vec3::Z, 0.0);
    let request = SliceRequest::new(plane, Side::Outside);

    let two = FillRing {
        indices: vec![a, b, b, a],
        plane,
    };
    assert_eq!(cap_surface(&mut surface, &two, &request).unwrap(), 0);

    let collinear = FillRing {
        indices: vec![a, b, c],
        plane,
    };
    assert_eq!(cap_surface(&mut surface, &collinear, &request).unwrap(), 0);
    assert_eq!(surface.vertex_count(), 3);
}

#[test]
fn test_ring_index_out_of_range() {
    let mut surface = MeshSurface::new(VertexLayout::position_only());
    let ring = FillRing {
        indices: vec![0, 1, 2],
        plane: Plane::new(Vec3::Z, 0.0),
    };
    let request = SliceRequest::new(ring.plane, Side::Outside);
    assert!(matches!(
        cap_surface(&mut surface, &ring, &request),
        Err(MeshError::IndexOutOfRange { .. })
    ));
}

#[test]
fn test_target_submesh_extends_or_appends() {
    let (mut surface, ring) = polygon_ring(4);
    let fill = Fill {
        target_submesh: 0,
        ..Fill::default()
    };
    let request = SliceRequest::new(ring.plane, Side::Outside).with_fill(fill);
    cap_surface(&mut surface, &ring, &request).unwrap();
    assert_eq!(surface.submeshes().len(), 1);
    assert_eq!(surface.submeshes()[0].count, 2);

    let (mut surface, ring) = polygon_ring(4);
    let request = SliceRequest::new(ring.plane, Side::Outside);
    cap_surface(&mut surface, &ring, &request).unwrap();
    assert_eq!(surface.submeshes().len(), 2);
    assert_eq!(surface.submeshes()[1].count, 2);
}

#[test]
fn test_non_convex_request_still_caps() {
    let (mut surface, ring) = polygon_ring(6);
    let fill = Fill {
        convex_only: false,
        ..Fill::default()
    };
    let request = SliceRequest::new(ring.plane, Side::Outside).with_fill(fill);
    assert_eq!(cap_surface(&mut surface, &ring, &request).unwrap(), 4);
}
