//! Tests for plane slicing.

use super::*;
use crate::primitives::{icosphere_surface, unit_cube};
use crate::settings::{Division, Fill};
use crate::slice_and_cap;
use crate::surface::{
    Color32, SubMesh, Vertex, VertexAttributes, VertexData, VertexLayout,
};
use approx::assert_relative_eq;
use glam::{Vec2, Vec3};

const WELD: u32 = 10_000;

fn cut(surface: &MeshSurface, request: &SliceRequest) -> MeshSurface {
    let mut out = MeshSurface::new(surface.layout());
    slice_and_cap(surface, request, &mut out).unwrap();
    out
}

fn half_x() -> Plane {
    Plane::new(Vec3::X, 0.5)
}

// =============================================================================
// CUBE SCENARIO
// =============================================================================

#[test]
fn test_cube_outside_half() {
    let cube = unit_cube(VertexLayout::position_normal());
    let outside = cut(&cube, &SliceRequest::new(half_x(), Side::Outside));

    let bounds = outside.bounds();
    assert_relative_eq!(bounds.min.x, 0.5);
    assert_relative_eq!(bounds.max.x, 1.0);
    assert_eq!(bounds.min.y, 0.0);
    assert_eq!(bounds.max.z, 1.0);
    assert_relative_eq!(outside.volume(), 0.5, epsilon = 1e-5);
    assert!(outside.is_watertight(WELD));
}

#[test]
fn test_cube_inside_half() {
    let cube = unit_cube(VertexLayout::position_normal());
    let inside = cut(&cube, &SliceRequest::new(half_x(), Side::Inside));

    let bounds = inside.bounds();
    assert_eq!(bounds.min.x, 0.0);
    assert_relative_eq!(bounds.max.x, 0.5);
    assert_relative_eq!(inside.volume(), 0.5, epsilon = 1e-5);
    assert!(inside.is_watertight(WELD));
}

#[test]
fn test_cube_cap_goes_to_fill_submesh() {
    let cube = unit_cube(VertexLayout::position_normal());
    let outside = cut(&cube, &SliceRequest::new(half_x(), Side::Outside));

    assert_eq!(outside.submeshes().len(), 2);
    let cap = outside.submeshes()[1];
    assert!(cap.count > 0);
    assert_relative_eq!(cap.bounds.min.x, 0.5);
    assert_relative_eq!(cap.bounds.max.x, 0.5);
}

#[test]
fn test_open_cut_without_fill() {
    let cube = unit_cube(VertexLayout::position_only());
    let request = SliceRequest::new(half_x(), Side::Outside).with_fill(Fill::disabled());
    let mut outside = MeshSurface::new(cube.layout());
    let ring = slice_surface(&cube, &request, &mut outside).unwrap();

    assert!(ring.is_empty());
    assert_eq!(outside.submeshes().len(), 1);
    // The four cut faces leave an open square.
    assert!(!outside.is_watertight(WELD));
}

// =============================================================================
// INVARIANTS
// =============================================================================

#[test]
fn test_volume_is_conserved_for_oblique_cut() {
    let sphere = icosphere_surface(Vec3::ZERO, 1.0, 2, VertexLayout::position_normal()).unwrap();
    let plane = Plane::from_normal_and_point(Vec3::new(0.3, 0.8, -0.2), Vec3::new(0.1, 0.0, 0.05));

    let outside = cut(&sphere, &SliceRequest::new(plane, Side::Outside));
    let inside = cut(&sphere, &SliceRequest::new(plane, Side::Inside));

    assert!(outside.volume() > 0.0);
    assert!(inside.volume() > 0.0);
    assert_relative_eq!(
        outside.volume() + inside.volume(),
        sphere.volume(),
        max_relative = 1e-3
    );
}

#[test]
fn test_plane_missing_bounds_keeps_one_side_whole() {
    let cube = unit_cube(VertexLayout::position_normal());
    let plane = Plane::new(Vec3::X, 2.0);
    assert!(!cube.bounds().intersects_plane(&plane));

    let outside = cut(&cube, &SliceRequest::new(plane, Side::Outside));
    let inside = cut(&cube, &SliceRequest::new(plane, Side::Inside));

    assert_eq!(outside.triangle_count(), 0);
    assert_eq!(inside.triangle_count(), cube.triangle_count());
    assert_eq!(inside.vertex_count(), cube.vertex_count());
    assert_eq!(inside.submeshes().len(), cube.submeshes().len());
}

#[test]
fn test_seam_is_identical_across_sides() {
    let cube = unit_cube(VertexLayout::position_normal());
    let request = SliceRequest::new(half_x(), Side::Outside);

    let mut outside = MeshSurface::new(cube.layout());
    let mut inside = MeshSurface::new(cube.layout());
    let ring_out = slice_surface(&cube, &request, &mut outside).unwrap();
    let ring_in = slice_surface(&cube, &request.opposite(), &mut inside).unwrap();

    let seam = |surface: &MeshSurface, ring: &FillRing| -> Vec<Vec3> {
        ring.indices
            .iter()
            .map(|&i| surface.vertices().position(i as usize).unwrap())
            .collect()
    };
    let seam_out = seam(&outside, &ring_out);
    let seam_in = seam(&inside, &ring_in);

    assert!(!seam_out.is_empty());
    assert_eq!(seam_out, seam_in);
    assert!(seam_out.iter().all(|p| p.x == 0.5));
}

#[test]
fn test_quantized_plane_absorbs_jitter() {
    let cube = unit_cube(VertexLayout::position_only());
    let jittered = Plane::new(Vec3::new(1.0, 0.000_01, 0.0), 0.500_02);

    let mut a = MeshSurface::new(cube.layout());
    let mut b = MeshSurface::new(cube.layout());
    slice_surface(&cube, &SliceRequest::new(half_x(), Side::Outside), &mut a).unwrap();
    slice_surface(&cube, &SliceRequest::new(jittered, Side::Outside), &mut b).unwrap();

    assert_eq!(a, b);
}

// =============================================================================
// TRIANGLE CASES
// =============================================================================

fn single_triangle(points: [Vec3; 3]) -> MeshSurface {
    let mut data = VertexData::new(VertexLayout::position_only());
    for p in points {
        data.push_vertex(&Vertex::new(p));
    }
    let submesh = SubMesh {
        start: 0,
        count: 1,
        ..Default::default()
    };
    MeshSurface::from_parts(data, vec![[0, 1, 2]], vec![submesh]).unwrap()
}

#[test]
fn test_coplanar_triangle_is_dropped() {
    let tri = single_triangle([Vec3::ZERO, Vec3::X, Vec3::Y]);
    let plane = Plane::new(Vec3::Z, 0.0);

    for side in Side::BOTH {
        let mut out = MeshSurface::new(tri.layout());
        let ring = slice_surface(&tri, &SliceRequest::new(plane, side), &mut out).unwrap();
        assert!(out.is_empty());
        assert!(ring.is_empty());
    }
}

#[test]
fn test_edge_on_plane_feeds_ring_without_split() {
    let tri = single_triangle([Vec3::ZERO, Vec3::X, Vec3::new(0.0, 1.0, 1.0)]);
    let plane = Plane::new(Vec3::Z, 0.0);

    let mut outside = MeshSurface::new(tri.layout());
    let ring = slice_surface(&tri, &SliceRequest::new(plane, Side::Outside), &mut outside).unwrap();
    assert_eq!(outside.triangle_count(), 1);
    assert_eq!(outside.vertex_count(), 3);
    assert_eq!(ring.indices.len(), 2);

    let mut inside = MeshSurface::new(tri.layout());
    let ring = slice_surface(&tri, &SliceRequest::new(plane, Side::Inside), &mut inside).unwrap();
    assert!(inside.is_empty());
    assert!(ring.is_empty());
}

#[test]
fn test_split_counts_depend_on_isolated_vertex() {
    // One vertex above z = 0.5, two below.
    let tri = single_triangle([Vec3::ZERO, Vec3::X, Vec3::new(0.0, 0.0, 1.0)]);
    let plane = Plane::new(Vec3::Z, 0.5);
    let request = SliceRequest::new(plane, Side::Outside).with_fill(Fill::disabled());

    let mut outside = MeshSurface::new(tri.layout());
    slice_surface(&tri, &request, &mut outside).unwrap();
    assert_eq!(outside.triangle_count(), 1);

    let mut inside = MeshSurface::new(tri.layout());
    slice_surface(&tri, &request.opposite(), &mut inside).unwrap();
    assert_eq!(inside.triangle_count(), 2);
}

#[test]
fn test_split_preserves_winding() {
    let tri = single_triangle([Vec3::ZERO, Vec3::X, Vec3::Y]);
    let plane = Plane::new(Vec3::X, 0.5);
    let original = Vec3::Z;

    for side in Side::BOTH {
        let mut out = MeshSurface::new(tri.layout());
        slice_surface(&tri, &SliceRequest::new(plane, side), &mut out).unwrap();
        for t in out.triangles() {
            let [a, b, c] = t.map(|i| out.vertices().position(i as usize).unwrap());
            let normal = (b - a).cross(c - a);
            if normal.length() > 1e-9 {
                assert!(normal.dot(original) > 0.0);
            }
        }
    }
}

#[test]
fn test_split_interpolates_attributes() {
    let layout = VertexLayout::new(
        VertexAttributes::POSITION | VertexAttributes::COLOR | VertexAttributes::TEXCOORD0,
    )
    .unwrap();
    let mut data = VertexData::new(layout);
    data.push_vertex(
        &Vertex::new(Vec3::ZERO)
            .with_color(Color32::new(0, 0, 0, 255))
            .with_texcoord0(Vec2::ZERO),
    );
    data.push_vertex(
        &Vertex::new(Vec3::new(1.0, 0.0, 0.0))
            .with_color(Color32::new(200, 100, 0, 255))
            .with_texcoord0(Vec2::new(1.0, 0.0)),
    );
    data.push_vertex(
        &Vertex::new(Vec3::new(0.0, 1.0, 0.0))
            .with_color(Color32::new(0, 0, 0, 255))
            .with_texcoord0(Vec2::new(0.0, 1.0)),
    );
    let submesh = SubMesh {
        start: 0,
        count: 1,
        ..Default::default()
    };
    let tri = MeshSurface::from_parts(data, vec![[0, 1, 2]], vec![submesh]).unwrap();

    let mut outside = MeshSurface::new(layout);
    let request = SliceRequest::new(Plane::new(Vec3::X, 0.5), Side::Outside);
    let ring = slice_surface(&tri, &request, &mut outside).unwrap();

    // The cut edge between vertex 0 and vertex 1 sits at its midpoint.
    let on_bottom_edge = ring
        .indices
        .iter()
        .map(|&i| i as usize)
        .find(|&i| outside.vertices().position(i).unwrap().y == 0.0)
        .unwrap();
    let v = outside.vertices().vertex(on_bottom_edge).unwrap();
    assert_eq!(v.color, Some(Color32::new(100, 50, 0, 255)));
    assert_relative_eq!(v.texcoord0.unwrap().x, 0.5);
}

#[test]
fn test_kept_vertices_are_copied_once() {
    let cube = unit_cube(VertexLayout::position_only());
    let plane = Plane::new(Vec3::X, -1.0);
    let mut outside = MeshSurface::new(cube.layout());
    slice_surface(&cube, &SliceRequest::new(plane, Side::Outside), &mut outside).unwrap();

    assert_eq!(outside.vertex_count(), 8);
    assert_eq!(outside.triangle_count(), cube.triangle_count());
    assert_relative_eq!(outside.volume(), cube.volume());
}

// =============================================================================
// MODES & ERRORS
// =============================================================================

#[test]
fn test_discrete_drops_crossing_triangles() {
    let cube = unit_cube(VertexLayout::position_only());
    let division = Division {
        kind: DivisionType::Discrete,
        ..Division::default()
    };
    let request = SliceRequest::new(half_x(), Side::Outside).with_division(division);

    let outside = cut(&cube, &request);
    let inside = cut(&cube, &request.opposite());

    // Only the faces at x = 1 and x = 0 survive; nothing is capped.
    assert_eq!(outside.triangle_count(), 2);
    assert_eq!(inside.triangle_count(), 2);
    assert_eq!(outside.submeshes().len(), 1);
}

#[test]
fn test_submeshes_are_preserved_in_order() {
    let cube = unit_cube(VertexLayout::position_only());
    let submeshes = vec![
        SubMesh {
            start: 0,
            count: 6,
            ..Default::default()
        },
        SubMesh {
            start: 6,
            count: 6,
            ..Default::default()
        },
    ];
    let split =
        MeshSurface::from_parts(cube.vertices().clone(), cube.triangles().to_vec(), submeshes)
            .unwrap();

    // Target 1 is an existing submesh, so the cap extends the last one.
    let extended = cut(&split, &SliceRequest::new(half_x(), Side::Outside));
    assert_eq!(extended.submeshes().len(), 2);
    assert!(extended.validate().is_ok());
    assert_relative_eq!(extended.volume(), 0.5, epsilon = 1e-5);

    let fill = Fill {
        target_submesh: 2,
        ..Fill::default()
    };
    let appended = cut(&split, &SliceRequest::new(half_x(), Side::Outside).with_fill(fill));
    assert_eq!(appended.submeshes().len(), 3);
    assert_eq!(
        extended.triangle_count(),
        appended.triangle_count()
    );
}

#[test]
fn test_empty_source_yields_empty_side() {
    let empty = MeshSurface::new(VertexLayout::position_only());
    let out = cut(&empty, &SliceRequest::new(half_x(), Side::Outside));
    assert!(out.is_empty());
}

#[test]
fn test_layout_mismatch_is_rejected() {
    let cube = unit_cube(VertexLayout::position_normal());
    let mut out = MeshSurface::new(VertexLayout::position_only());
    let err = slice_surface(&cube, &SliceRequest::new(half_x(), Side::Outside), &mut out)
        .unwrap_err();
    assert!(matches!(err, MeshError::LayoutMismatch { .. }));
}

#[test]
fn test_non_triangle_topology_is_rejected() {
    let mut lines = MeshSurface::new(VertexLayout::position_only());
    lines.vertices_mut().push_vertex(&Vertex::new(Vec3::ZERO));
    lines.vertices_mut().push_vertex(&Vertex::new(Vec3::X));
    lines.vertices_mut().push_vertex(&Vertex::new(Vec3::Y));
    lines.begin_submesh(Topology::Lines);
    lines.add_triangle([0, 1, 2]);

    let mut out = MeshSurface::new(lines.layout());
    let err = slice_surface(&lines, &SliceRequest::new(half_x(), Side::Outside), &mut out)
        .unwrap_err();
    assert!(matches!(err, MeshError::InvalidTopology { .. }));
}

#[test]
fn test_invalid_precision_is_rejected() {
    let cube = unit_cube(VertexLayout::position_only());
    let division = Division {
        kind: DivisionType::Linear,
        precision: 1,
    };
    let mut out = MeshSurface::new(cube.layout());
    let request = SliceRequest::new(half_x(), Side::Outside).with_division(division);
    assert!(slice_surface(&cube, &request, &mut out).is_err());
}
