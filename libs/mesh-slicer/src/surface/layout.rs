//! # Vertex Layout
//!
//! Interleaved record layout computed once from an active attribute set.
//! Attributes are always stored in the fixed order position, normal,
//! tangent, color, texcoord0, texcoord1.

use bitflags::bitflags;

use crate::error::{MeshError, MeshResult};

bitflags! {
    /// Set of per-vertex attributes carried by a surface.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VertexAttributes: u8 {
        /// 3D position (mandatory).
        const POSITION = 1 << 0;
        /// Unit normal.
        const NORMAL = 1 << 1;
        /// Tangent with handedness in `w`.
        const TANGENT = 1 << 2;
        /// RGBA8 color.
        const COLOR = 1 << 3;
        /// First UV channel.
        const TEXCOORD0 = 1 << 4;
        /// Second UV channel.
        const TEXCOORD1 = 1 << 5;
    }
}

/// A single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttribute {
    /// 3D position.
    Position,
    /// Normal.
    Normal,
    /// Tangent.
    Tangent,
    /// Color.
    Color,
    /// First UV channel.
    TexCoord0,
    /// Second UV channel.
    TexCoord1,
}

impl VertexAttribute {
    /// Every attribute in interleaving order.
    pub const ALL: [VertexAttribute; 6] = [
        VertexAttribute::Position,
        VertexAttribute::Normal,
        VertexAttribute::Tangent,
        VertexAttribute::Color,
        VertexAttribute::TexCoord0,
        VertexAttribute::TexCoord1,
    ];

    /// Flag bit for this attribute.
    pub fn flag(self) -> VertexAttributes {
        match self {
            VertexAttribute::Position => VertexAttributes::POSITION,
            VertexAttribute::Normal => VertexAttributes::NORMAL,
            VertexAttribute::Tangent => VertexAttributes::TANGENT,
            VertexAttribute::Color => VertexAttributes::COLOR,
            VertexAttribute::TexCoord0 => VertexAttributes::TEXCOORD0,
            VertexAttribute::TexCoord1 => VertexAttributes::TEXCOORD1,
        }
    }

    /// Size of the attribute in bytes.
    pub fn size(self) -> usize {
        match self {
            VertexAttribute::Position | VertexAttribute::Normal => 12,
            VertexAttribute::Tangent => 16,
            VertexAttribute::Color => 4,
            VertexAttribute::TexCoord0 | VertexAttribute::TexCoord1 => 8,
        }
    }

    /// Format and dimension this attribute must be declared with.
    pub fn expected_format(self) -> (VertexFormat, u8) {
        match self {
            VertexAttribute::Position | VertexAttribute::Normal => (VertexFormat::Float32, 3),
            VertexAttribute::Tangent => (VertexFormat::Float32, 4),
            VertexAttribute::Color => (VertexFormat::UNorm8, 4),
            VertexAttribute::TexCoord0 | VertexAttribute::TexCoord1 => (VertexFormat::Float32, 2),
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Component format of an externally declared attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// 32-bit float.
    Float32,
    /// 16-bit float.
    Float16,
    /// Normalized unsigned byte.
    UNorm8,
    /// Normalized signed byte.
    SNorm8,
    /// 32-bit unsigned integer.
    UInt32,
}

/// External description of one attribute of a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDescriptor {
    /// Attribute being described.
    pub attribute: VertexAttribute,
    /// Component format.
    pub format: VertexFormat,
    /// Component count.
    pub dimension: u8,
}

impl AttributeDescriptor {
    /// Descriptor with the format the slicer expects for `attribute`.
    pub fn standard(attribute: VertexAttribute) -> Self {
        let (format, dimension) = attribute.expected_format();
        Self {
            attribute,
            format,
            dimension,
        }
    }
}

/// Byte layout of one interleaved vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    attributes: VertexAttributes,
    stride: usize,
    offsets: [usize; 6],
}

impl VertexLayout {
    /// Computes the layout for an attribute set.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidLayout`] when `POSITION` is missing.
    pub fn new(attributes: VertexAttributes) -> MeshResult<Self> {
        if !attributes.contains(VertexAttributes::POSITION) {
            return Err(MeshError::invalid_layout("position attribute is required"));
        }
        let mut offsets = [0; 6];
        let mut stride = 0;
        for attribute in VertexAttribute::ALL {
            if attributes.contains(attribute.flag()) {
                offsets[attribute.slot()] = stride;
                stride += attribute.size();
            }
        }
        Ok(Self {
            attributes,
            stride,
            offsets,
        })
    }

    /// Builds a layout from external attribute descriptors.
    ///
    /// Position and normal must be `Float32 x3`, tangent `Float32 x4`,
    /// color `UNorm8 x4` and texcoords `Float32 x2`.
    pub fn from_descriptors(descriptors: &[AttributeDescriptor]) -> MeshResult<Self> {
        let mut attributes = VertexAttributes::empty();
        for d in descriptors {
            let (format, dimension) = d.attribute.expected_format();
            if d.format != format || d.dimension != dimension {
                return Err(MeshError::invalid_layout(format!(
                    "{:?} must be {:?} x{}, found {:?} x{}",
                    d.attribute, format, dimension, d.format, d.dimension
                )));
            }
            if attributes.contains(d.attribute.flag()) {
                return Err(MeshError::invalid_layout(format!(
                    "{:?} declared twice",
                    d.attribute
                )));
            }
            attributes |= d.attribute.flag();
        }
        Self::new(attributes)
    }

    /// Layout with only positions.
    pub fn position_only() -> Self {
        Self {
            attributes: VertexAttributes::POSITION,
            stride: 12,
            offsets: [0; 6],
        }
    }

    /// Layout with positions and normals.
    pub fn position_normal() -> Self {
        Self {
            attributes: VertexAttributes::POSITION | VertexAttributes::NORMAL,
            stride: 24,
            offsets: [0, 12, 0, 0, 0, 0],
        }
    }

    /// Active attributes.
    pub fn attributes(&self) -> VertexAttributes {
        self.attributes
    }

    /// Bytes per vertex record.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// True when `attribute` is part of the layout.
    pub fn contains(&self, attribute: VertexAttribute) -> bool {
        self.attributes.contains(attribute.flag())
    }

    /// Byte offset of `attribute` inside a record.
    pub fn offset(&self, attribute: VertexAttribute) -> Option<usize> {
        self.contains(attribute).then(|| self.offsets[attribute.slot()])
    }

    /// Descriptors describing this layout.
    pub fn descriptors(&self) -> Vec<AttributeDescriptor> {
        VertexAttribute::ALL
            .into_iter()
            .filter(|a| self.contains(*a))
            .map(AttributeDescriptor::standard)
            .collect()
    }
}
