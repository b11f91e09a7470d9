//! # Mesh Surface
//!
//! A vertex buffer of interleaved records, a triangle index buffer and a list
//! of submesh ranges with bounds.
//!
//! ## Invariants
//!
//! - Every index is smaller than the vertex count.
//! - Submesh ranges partition the triangle buffer contiguously from 0.
//! - A fill submesh, if present, is appended after the geometric submeshes.

pub mod layout;
pub mod vertex;

use std::collections::HashMap;

use glam::{I64Vec3, Vec3};

use crate::error::{MeshError, MeshResult};
use crate::geometry::Aabb;

pub use layout::{AttributeDescriptor, VertexAttribute, VertexAttributes, VertexFormat, VertexLayout};
pub use vertex::{Color32, Vertex, VertexData};

// =============================================================================
// SUBMESH
// =============================================================================

/// Primitive topology of a submesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    /// Indexed triangles.
    #[default]
    Triangles,
    /// Indexed line segments.
    Lines,
    /// Indexed points.
    Points,
}

/// A contiguous range of triangles with its own bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubMesh {
    /// First triangle of the range.
    pub start: usize,
    /// Number of triangles in the range.
    pub count: usize,
    /// Primitive topology.
    pub topology: Topology,
    /// Bounds of the referenced vertices.
    pub bounds: Aabb,
}

impl SubMesh {
    /// One past the last triangle of the range.
    pub fn end(&self) -> usize {
        self.start + self.count
    }
}

// =============================================================================
// MESH SURFACE
// =============================================================================

/// Triangle mesh with interleaved vertices and submesh ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSurface {
    vertices: VertexData,
    triangles: Vec<[u32; 3]>,
    submeshes: Vec<SubMesh>,
}

impl MeshSurface {
    /// Empty surface for `layout`.
    pub fn new(layout: VertexLayout) -> Self {
        Self {
            vertices: VertexData::new(layout),
            triangles: Vec::new(),
            submeshes: Vec::new(),
        }
    }

    /// Empty surface with preallocated buffers.
    pub fn with_capacity(layout: VertexLayout, vertices: usize, triangles: usize) -> Self {
        Self {
            vertices: VertexData::with_capacity(layout, vertices),
            triangles: Vec::with_capacity(triangles),
            submeshes: Vec::new(),
        }
    }

    /// Assembles a surface from parts and validates it.
    pub fn from_parts(
        vertices: VertexData,
        triangles: Vec<[u32; 3]>,
        submeshes: Vec<SubMesh>,
    ) -> MeshResult<Self> {
        let mut surface = Self {
            vertices,
            triangles,
            submeshes,
        };
        surface.validate()?;
        surface.recalculate_bounds();
        Ok(surface)
    }

    /// Vertex record layout.
    pub fn layout(&self) -> VertexLayout {
        self.vertices.layout()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// True when the surface has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Vertex buffer.
    pub fn vertices(&self) -> &VertexData {
        &self.vertices
    }

    /// Mutable vertex buffer.
    pub fn vertices_mut(&mut self) -> &mut VertexData {
        &mut self.vertices
    }

    /// Triangle index buffer.
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Submesh descriptors.
    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    /// Triangles of submesh `index`.
    pub fn submesh_triangles(&self, index: usize) -> &[[u32; 3]] {
        self.submeshes
            .get(index)
            .and_then(|s| self.triangles.get(s.start..s.end()))
            .unwrap_or(&[])
    }

    /// Opens a new, empty submesh after the existing ones.
    ///
    /// Returns the index of the new submesh.
    pub fn begin_submesh(&mut self, topology: Topology) -> usize {
        self.submeshes.push(SubMesh {
            start: self.triangles.len(),
            count: 0,
            topology,
            bounds: Aabb::default(),
        });
        self.submeshes.len() - 1
    }

    /// Appends a triangle to the last submesh, opening one if needed.
    pub fn add_triangle(&mut self, triangle: [u32; 3]) {
        if self.submeshes.is_empty() {
            self.begin_submesh(Topology::Triangles);
        }
        self.triangles.push(triangle);
        if let Some(last) = self.submeshes.last_mut() {
            last.count += 1;
        }
    }

    /// Recomputes the bounds of every submesh from its referenced vertices.
    pub fn recalculate_bounds(&mut self) {
        for submesh in &mut self.submeshes {
            let Some(triangles) = self.triangles.get(submesh.start..submesh.end()) else {
                continue;
            };
            submesh.bounds = Aabb::from_points(
                triangles
                    .iter()
                    .flatten()
                    .filter_map(|&i| self.vertices.position(i as usize)),
            )
            .unwrap_or_default();
        }
    }

    /// Union of submesh bounds.
    pub fn bounds(&self) -> Aabb {
        let mut iter = self.submeshes.iter().filter(|s| s.count > 0);
        match iter.next() {
            Some(first) => iter.fold(first.bounds, |acc, s| acc.union(&s.bounds)),
            None => Aabb::default(),
        }
    }

    /// Checks index ranges, submesh partition and topology.
    ///
    /// # Errors
    ///
    /// - [`MeshError::IndexOutOfRange`] for an index past the vertex buffer
    /// - [`MeshError::InvalidSubMesh`] when ranges do not partition the buffer
    /// - [`MeshError::InvalidTopology`] for non-triangle submeshes
    pub fn validate(&self) -> MeshResult<()> {
        let count = self.vertices.len();
        if let Some(&index) = self.triangles.iter().flatten().find(|&&i| i as usize >= count) {
            return Err(MeshError::IndexOutOfRange { index, count });
        }

        let mut cursor = 0;
        for (i, submesh) in self.submeshes.iter().enumerate() {
            if submesh.start != cursor {
                return Err(MeshError::invalid_submesh(format!(
                    "submesh {i} starts at {} but previous ends at {cursor}",
                    submesh.start
                )));
            }
            if submesh.topology != Topology::Triangles {
                return Err(MeshError::invalid_topology(format!(
                    "submesh {i} uses {:?}",
                    submesh.topology
                )));
            }
            cursor = submesh.end();
        }
        if cursor != self.triangles.len() {
            return Err(MeshError::invalid_submesh(format!(
                "submeshes cover {cursor} of {} triangles",
                self.triangles.len()
            )));
        }
        Ok(())
    }

    /// Signed enclosed volume (positive for outward winding).
    pub fn volume(&self) -> f32 {
        let volume: f64 = self
            .triangles
            .iter()
            .filter_map(|t| {
                let a = self.vertices.position(t[0] as usize)?.as_dvec3();
                let b = self.vertices.position(t[1] as usize)?.as_dvec3();
                let c = self.vertices.position(t[2] as usize)?.as_dvec3();
                Some(a.dot(b.cross(c)))
            })
            .sum();
        (volume / 6.0) as f32
    }

    /// Number of edges used by exactly one triangle.
    ///
    /// Vertices are welded on the `1 / weld_precision` grid first so seams
    /// made of duplicated vertices count as shared.
    pub fn boundary_edge_count(&self, weld_precision: u32) -> usize {
        let p = weld_precision as f32;
        let key = |i: u32| -> Option<I64Vec3> {
            let v: Vec3 = self.vertices.position(i as usize)?;
            Some((v * p).round().as_i64vec3())
        };

        let mut edges: HashMap<([i64; 3], [i64; 3]), usize> = HashMap::new();
        for t in &self.triangles {
            let (Some(a), Some(b), Some(c)) = (key(t[0]), key(t[1]), key(t[2])) else {
                continue;
            };
            for (u, v) in [(a, b), (b, c), (c, a)] {
                if u == v {
                    continue;
                }
                let (u, v) = (u.to_array(), v.to_array());
                let edge = if u < v { (u, v) } else { (v, u) };
                *edges.entry(edge).or_insert(0) += 1;
            }
        }
        edges.values().filter(|&&n| n == 1).count()
    }

    /// True when the surface is non-empty and has no boundary edge.
    pub fn is_watertight(&self, weld_precision: u32) -> bool {
        !self.is_empty() && self.boundary_edge_count(weld_precision) == 0
    }

    /// Removes every vertex, triangle and submesh.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.triangles.clear();
        self.submeshes.clear();
    }
}
