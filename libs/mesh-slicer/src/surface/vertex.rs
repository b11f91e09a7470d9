//! # Vertex Data
//!
//! Interleaved vertex records with checked typed accessors.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::layout::{VertexAttribute, VertexLayout};
use crate::error::{MeshError, MeshResult};

// =============================================================================
// COLOR
// =============================================================================

/// RGBA color with 8 bits per channel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color32 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color32 {
    /// Opaque white.
    pub const WHITE: Color32 = Color32::new(255, 255, 255, 255);

    /// Creates a color from channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Per-channel interpolation with `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Color32, t: f32) -> Color32 {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
        Color32 {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

impl Default for Color32 {
    fn default() -> Self {
        Self::WHITE
    }
}

// =============================================================================
// VERTEX
// =============================================================================

/// An owned vertex record with optional attributes.
///
/// Attributes absent from a layout are ignored on write; attributes present
/// in the layout but unset here are written as zero (white for color).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    /// Position.
    pub position: Vec3,
    /// Normal.
    pub normal: Option<Vec3>,
    /// Tangent.
    pub tangent: Option<Vec4>,
    /// Color.
    pub color: Option<Color32>,
    /// First UV channel.
    pub texcoord0: Option<Vec2>,
    /// Second UV channel.
    pub texcoord1: Option<Vec2>,
}

impl Vertex {
    /// Vertex with only a position.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Sets the normal.
    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = Some(normal);
        self
    }

    /// Sets the tangent.
    pub fn with_tangent(mut self, tangent: Vec4) -> Self {
        self.tangent = Some(tangent);
        self
    }

    /// Sets the color.
    pub fn with_color(mut self, color: Color32) -> Self {
        self.color = Some(color);
        self
    }

    /// Sets the first UV channel.
    pub fn with_texcoord0(mut self, uv: Vec2) -> Self {
        self.texcoord0 = Some(uv);
        self
    }

    /// Sets the second UV channel.
    pub fn with_texcoord1(mut self, uv: Vec2) -> Self {
        self.texcoord1 = Some(uv);
        self
    }
}

// =============================================================================
// VERTEX DATA
// =============================================================================

/// Interleaved vertex buffer described by a [`VertexLayout`].
#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    layout: VertexLayout,
    bytes: Vec<u8>,
}

impl VertexData {
    /// Empty buffer for `layout`.
    pub fn new(layout: VertexLayout) -> Self {
        Self {
            layout,
            bytes: Vec::new(),
        }
    }

    /// Empty buffer with room for `vertices` records.
    pub fn with_capacity(layout: VertexLayout, vertices: usize) -> Self {
        Self {
            layout,
            bytes: Vec::with_capacity(vertices * layout.stride()),
        }
    }

    /// Wraps raw interleaved bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidLayout`] when the length is not a multiple
    /// of the layout stride.
    pub fn from_bytes(layout: VertexLayout, bytes: Vec<u8>) -> MeshResult<Self> {
        if bytes.len() % layout.stride() != 0 {
            return Err(MeshError::invalid_layout(format!(
                "{} bytes is not a multiple of stride {}",
                bytes.len(),
                layout.stride()
            )));
        }
        Ok(Self { layout, bytes })
    }

    /// Record layout.
    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.layout.stride()
    }

    /// True when there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw interleaved bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Removes every vertex.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Reserves room for `additional` records.
    pub fn reserve(&mut self, additional: usize) {
        self.bytes.reserve(additional * self.layout.stride());
    }

    /// Raw bytes of one record.
    pub fn record(&self, index: usize) -> Option<&[u8]> {
        let stride = self.layout.stride();
        self.bytes.get(index * stride..(index + 1) * stride)
    }

    fn read<T: Pod>(&self, index: usize, attribute: VertexAttribute) -> Option<T> {
        let offset = self.layout.offset(attribute)?;
        let start = index * self.layout.stride() + offset;
        let bytes = self.bytes.get(start..start + std::mem::size_of::<T>())?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    fn write<T: Pod>(&mut self, index: usize, attribute: VertexAttribute, value: T) -> MeshResult<()> {
        let count = self.len();
        let offset = self.layout.offset(attribute).ok_or_else(|| {
            MeshError::invalid_layout(format!("{attribute:?} is not part of the layout"))
        })?;
        let start = index * self.layout.stride() + offset;
        let slot = self
            .bytes
            .get_mut(start..start + std::mem::size_of::<T>())
            .ok_or(MeshError::IndexOutOfRange {
                index: index as u32,
                count,
            })?;
        slot.copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }

    /// Position of vertex `index`.
    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.read(index, VertexAttribute::Position)
    }

    /// Normal of vertex `index`.
    pub fn normal(&self, index: usize) -> Option<Vec3> {
        self.read(index, VertexAttribute::Normal)
    }

    /// Tangent of vertex `index`.
    pub fn tangent(&self, index: usize) -> Option<Vec4> {
        self.read(index, VertexAttribute::Tangent)
    }

    /// Color of vertex `index`.
    pub fn color(&self, index: usize) -> Option<Color32> {
        self.read(index, VertexAttribute::Color)
    }

    /// First UV of vertex `index`.
    pub fn texcoord0(&self, index: usize) -> Option<Vec2> {
        self.read(index, VertexAttribute::TexCoord0)
    }

    /// Second UV of vertex `index`.
    pub fn texcoord1(&self, index: usize) -> Option<Vec2> {
        self.read(index, VertexAttribute::TexCoord1)
    }

    /// Sets the position of vertex `index`.
    pub fn set_position(&mut self, index: usize, value: Vec3) -> MeshResult<()> {
        self.write(index, VertexAttribute::Position, value)
    }

    /// Sets the normal of vertex `index`.
    pub fn set_normal(&mut self, index: usize, value: Vec3) -> MeshResult<()> {
        self.write(index, VertexAttribute::Normal, value)
    }

    /// Sets the tangent of vertex `index`.
    pub fn set_tangent(&mut self, index: usize, value: Vec4) -> MeshResult<()> {
        self.write(index, VertexAttribute::Tangent, value)
    }

    /// Sets the color of vertex `index`.
    pub fn set_color(&mut self, index: usize, value: Color32) -> MeshResult<()> {
        self.write(index, VertexAttribute::Color, value)
    }

    /// Sets the first UV of vertex `index`.
    pub fn set_texcoord0(&mut self, index: usize, value: Vec2) -> MeshResult<()> {
        self.write(index, VertexAttribute::TexCoord0, value)
    }

    /// Sets the second UV of vertex `index`.
    pub fn set_texcoord1(&mut self, index: usize, value: Vec2) -> MeshResult<()> {
        self.write(index, VertexAttribute::TexCoord1, value)
    }

    /// Iterates every position in order.
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        // Position is mandatory and always at offset 0.
        self.bytes
            .chunks_exact(self.layout.stride())
            .map(|record| bytemuck::pod_read_unaligned(&record[..12]))
    }

    /// Typed copy of vertex `index`.
    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        Some(Vertex {
            position: self.position(index)?,
            normal: self.normal(index),
            tangent: self.tangent(index),
            color: self.color(index),
            texcoord0: self.texcoord0(index),
            texcoord1: self.texcoord1(index),
        })
    }

    /// Appends a typed vertex and returns its index.
    pub fn push_vertex(&mut self, vertex: &Vertex) -> u32 {
        let index = self.len();
        self.bytes.resize(self.bytes.len() + self.layout.stride(), 0);
        // Offsets come from our own layout, so only absent attributes can fail.
        let _ = self.write(index, VertexAttribute::Position, vertex.position);
        let _ = self.write(index, VertexAttribute::Normal, vertex.normal.unwrap_or(Vec3::ZERO));
        let _ = self.write(index, VertexAttribute::Tangent, vertex.tangent.unwrap_or(Vec4::ZERO));
        let _ = self.write(index, VertexAttribute::Color, vertex.color.unwrap_or_default());
        let _ = self.write(index, VertexAttribute::TexCoord0, vertex.texcoord0.unwrap_or(Vec2::ZERO));
        let _ = self.write(index, VertexAttribute::TexCoord1, vertex.texcoord1.unwrap_or(Vec2::ZERO));
        index as u32
    }

    /// Appends a raw copy of record `index` of `source`.
    ///
    /// Both buffers must share the same layout.
    pub fn push_copy(&mut self, source: &VertexData, index: usize) -> MeshResult<u32> {
        self.check_layout(source)?;
        let record = source.record(index).ok_or(MeshError::IndexOutOfRange {
            index: index as u32,
            count: source.len(),
        })?;
        let new_index = self.len() as u32;
        self.bytes.extend_from_slice(record);
        Ok(new_index)
    }

    /// Appends a copy of one of this buffer's own records.
    pub fn duplicate(&mut self, index: usize) -> MeshResult<u32> {
        let stride = self.layout.stride();
        let count = self.len();
        if index >= count {
            return Err(MeshError::IndexOutOfRange {
                index: index as u32,
                count,
            });
        }
        self.bytes
            .extend_from_within(index * stride..(index + 1) * stride);
        Ok(count as u32)
    }

    /// Appends the interpolation of records `a` and `b` of `source` at `t`.
    ///
    /// Every active attribute is lerped independently. Tangents are lerped as
    /// raw 4-vectors without renormalization.
    pub fn push_interpolated(
        &mut self,
        source: &VertexData,
        a: usize,
        b: usize,
        t: f32,
    ) -> MeshResult<u32> {
        self.check_layout(source)?;
        let (va, vb) = match (source.vertex(a), source.vertex(b)) {
            (Some(va), Some(vb)) => (va, vb),
            _ => {
                return Err(MeshError::IndexOutOfRange {
                    index: a.max(b) as u32,
                    count: source.len(),
                })
            }
        };
        let mixed = Vertex {
            position: va.position.lerp(vb.position, t),
            normal: va.normal.zip(vb.normal).map(|(x, y)| x.lerp(y, t)),
            tangent: va.tangent.zip(vb.tangent).map(|(x, y)| x.lerp(y, t)),
            color: va.color.zip(vb.color).map(|(x, y)| x.lerp(y, t)),
            texcoord0: va.texcoord0.zip(vb.texcoord0).map(|(x, y)| x.lerp(y, t)),
            texcoord1: va.texcoord1.zip(vb.texcoord1).map(|(x, y)| x.lerp(y, t)),
        };
        Ok(self.push_vertex(&mixed))
    }

    fn check_layout(&self, source: &VertexData) -> MeshResult<()> {
        if self.layout != source.layout {
            return Err(MeshError::layout_mismatch(format!(
                "{:?} vs {:?}",
                self.layout.attributes(),
                source.layout.attributes()
            )));
        }
        Ok(())
    }
}
