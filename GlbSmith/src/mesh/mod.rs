//! Source meshes and their conversion to glTF accessors.
//!
//! A [`MeshData`] is the host's view of a mesh: one or more interleaved
//! vertex streams described by [`VertexAttributeDescriptor`]s, plus one index
//! list per submesh. Baking reads every attribute through bounds-checked,
//! stride-based slices, converts it to the glTF coordinate system and packs it
//! into its own buffer view.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

mod bake;
mod convert;

pub use bake::{BakedMesh, BakedPrimitive, ConvertedMesh, convert_mesh, write_converted_mesh};
pub use convert::{flip_winding, reflect_matrix_x};

use glam::Vec3;

/// Semantic of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttribute {
    Position,
    Normal,
    Tangent,
    Color,
    /// UV set index. glTF exports sets 0..=7.
    TexCoord(u8),
    BlendWeight,
    BlendIndices,
}

impl VertexAttribute {
    /// glTF attribute name, or `None` if glTF has no slot for it.
    #[must_use]
    pub fn gltf_name(self) -> Option<String> {
        use crate::schema::attribute;
        Some(match self {
            Self::Position => attribute::POSITION.to_string(),
            Self::Normal => attribute::NORMAL.to_string(),
            Self::Tangent => attribute::TANGENT.to_string(),
            Self::Color => attribute::COLOR_0.to_string(),
            Self::TexCoord(set) if set < 8 => attribute::texcoord(usize::from(set)),
            Self::TexCoord(_) => return None,
            Self::BlendWeight => attribute::WEIGHTS_0.to_string(),
            Self::BlendIndices => attribute::JOINTS_0.to_string(),
        })
    }
}

/// Storage format of each component of a source attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32,
    Float16,
    UNorm8,
    SNorm8,
    UNorm16,
    SNorm16,
    UInt8,
    SInt8,
    UInt16,
    SInt16,
    UInt32,
    SInt32,
}

impl VertexFormat {
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::UNorm8 | Self::SNorm8 | Self::UInt8 | Self::SInt8 => 1,
            Self::Float16 | Self::UNorm16 | Self::SNorm16 | Self::UInt16 | Self::SInt16 => 2,
            Self::Float32 | Self::UInt32 | Self::SInt32 => 4,
        }
    }
}

/// Where one attribute lives inside a vertex stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttributeDescriptor {
    pub attribute: VertexAttribute,
    pub format: VertexFormat,
    /// Number of components (1..=4).
    pub dimension: usize,
    /// Index into [`MeshData::streams`].
    pub stream: usize,
    /// Byte offset of the attribute within one vertex of the stream.
    pub offset: usize,
}

/// One interleaved vertex buffer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VertexStream {
    pub data: Vec<u8>,
    /// Bytes per vertex.
    pub stride: usize,
}

/// Primitive topology of a submesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Triangles,
    Quads,
    Lines,
    LineStrip,
    Points,
    /// Host topology with no glTF equivalent, identified by its raw code.
    Other(u32),
}

/// One index list, drawn with one material slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubMesh {
    pub topology: Topology,
    pub indices: Vec<u32>,
}

/// Preferred width of exported indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexFormat {
    /// Unsigned short when every index fits, unsigned int otherwise.
    #[default]
    UInt16,
    UInt32,
}

/// Axis-aligned bounds in source space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Bounds of a point set, `None` when empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// The same box after negating X: `min.x = -max.x`, `max.x = -min.x`.
    #[must_use]
    pub fn flip_x(self) -> Self {
        Self {
            min: Vec3::new(-self.max.x, self.min.y, self.min.z),
            max: Vec3::new(-self.min.x, self.max.y, self.max.z),
        }
    }
}

/// Host-side mesh handed to the document builder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub name: Option<String>,
    pub vertex_count: usize,
    pub streams: Vec<VertexStream>,
    pub attributes: Vec<VertexAttributeDescriptor>,
    pub submeshes: Vec<SubMesh>,
    pub index_format: IndexFormat,
    /// Source-space bounds. Computed from the positions when absent.
    pub bounds: Option<Bounds>,
}

impl MeshData {
    /// Mesh with a single tightly packed float stream per attribute list.
    ///
    /// Convenience for hosts that keep attributes in separate arrays.
    #[must_use]
    pub fn from_arrays(name: Option<String>, arrays: &MeshArrays, submeshes: Vec<SubMesh>) -> Self {
        let mut mesh = Self {
            name,
            vertex_count: arrays.positions.len(),
            submeshes,
            ..Self::default()
        };
        mesh.push_float_stream(VertexAttribute::Position, arrays.positions.iter().flat_map(|p| p.to_array()), 3);
        if let Some(normals) = &arrays.normals {
            mesh.push_float_stream(VertexAttribute::Normal, normals.iter().flat_map(|n| n.to_array()), 3);
        }
        if let Some(tangents) = &arrays.tangents {
            mesh.push_float_stream(VertexAttribute::Tangent, tangents.iter().flat_map(|t| t.to_array()), 4);
        }
        if let Some(colors) = &arrays.colors {
            mesh.push_float_stream(VertexAttribute::Color, colors.iter().flat_map(|c| c.to_array()), 4);
        }
        for (set, uvs) in arrays.uvs.iter().enumerate() {
            mesh.push_float_stream(
                VertexAttribute::TexCoord(set as u8),
                uvs.iter().flat_map(|uv| uv.to_array()),
                2,
            );
        }
        if let Some(weights) = &arrays.weights {
            mesh.push_float_stream(VertexAttribute::BlendWeight, weights.iter().flatten().copied(), 4);
        }
        if let Some(joints) = &arrays.joints {
            let data = joints
                .iter()
                .flatten()
                .flat_map(|j| j.to_le_bytes())
                .collect();
            mesh.attributes.push(VertexAttributeDescriptor {
                attribute: VertexAttribute::BlendIndices,
                format: VertexFormat::UInt16,
                dimension: 4,
                stream: mesh.streams.len(),
                offset: 0,
            });
            mesh.streams.push(VertexStream { data, stride: 8 });
        }
        mesh
    }

    fn push_float_stream(&mut self, attribute: VertexAttribute, values: impl Iterator<Item = f32>, dimension: usize) {
        let data = values.flat_map(f32::to_le_bytes).collect();
        self.attributes.push(VertexAttributeDescriptor {
            attribute,
            format: VertexFormat::Float32,
            dimension,
            stream: self.streams.len(),
            offset: 0,
        });
        self.streams.push(VertexStream {
            data,
            stride: dimension * 4,
        });
    }

    /// Descriptor for `attribute`, if the mesh carries it.
    #[must_use]
    pub fn attribute(&self, attribute: VertexAttribute) -> Option<&VertexAttributeDescriptor> {
        self.attributes.iter().find(|a| a.attribute == attribute)
    }
}

/// Separate per-attribute arrays, see [`MeshData::from_arrays`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshArrays {
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub tangents: Option<Vec<glam::Vec4>>,
    pub colors: Option<Vec<glam::Vec4>>,
    pub uvs: Vec<Vec<glam::Vec2>>,
    pub weights: Option<Vec<[f32; 4]>>,
    pub joints: Option<Vec<[u16; 4]>>,
}
