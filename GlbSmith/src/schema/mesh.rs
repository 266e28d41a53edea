//! Meshes and mesh primitives.

use std::io::{self, Write};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::json::{GltfSerialize, JsonWriter};

/// Vertex attribute semantic names.
pub mod attribute {
    pub const POSITION: &str = "POSITION";
    pub const NORMAL: &str = "NORMAL";
    pub const TANGENT: &str = "TANGENT";
    pub const COLOR_0: &str = "COLOR_0";
    pub const JOINTS_0: &str = "JOINTS_0";
    pub const WEIGHTS_0: &str = "WEIGHTS_0";

    /// `TEXCOORD_n`
    #[must_use]
    pub fn texcoord(set: usize) -> String {
        format!("TEXCOORD_{set}")
    }
}

/// Primitive topology (`primitive.mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "u32")]
pub enum DrawMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl DrawMode {
    #[must_use]
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Points => 0,
            Self::Lines => 1,
            Self::LineLoop => 2,
            Self::LineStrip => 3,
            Self::Triangles => 4,
            Self::TriangleStrip => 5,
            Self::TriangleFan => 6,
        }
    }
}

impl TryFrom<u32> for DrawMode {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, String> {
        Ok(match value {
            0 => Self::Points,
            1 => Self::Lines,
            2 => Self::LineLoop,
            3 => Self::LineStrip,
            4 => Self::Triangles,
            5 => Self::TriangleStrip,
            6 => Self::TriangleFan,
            other => return Err(format!("unknown primitive mode: {other}")),
        })
    }
}

/// Mesh primitive (geometry + material)
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GltfPrimitive {
    pub attributes: IndexMap<String, usize>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
    #[serde(default)]
    pub mode: DrawMode,
    pub extensions: Option<PrimitiveExtensions>,
}

impl GltfPrimitive {
    /// Index of the `POSITION` accessor, if present.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.attributes.get(attribute::POSITION).copied()
    }
}

impl GltfSerialize for GltfPrimitive {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.open_object_property("attributes")?;
        for (name, &accessor) in &self.attributes {
            w.property_usize(name, accessor)?;
        }
        w.close_object()?;
        w.optional_usize("indices", self.indices)?;
        w.optional_usize("material", self.material)?;
        if self.mode != DrawMode::Triangles {
            w.property_u32("mode", self.mode.gl_enum())?;
        }
        w.optional_object("extensions", self.extensions.as_ref())?;
        w.close_object()
    }
}

/// Per-primitive extension slots.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PrimitiveExtensions {
    #[serde(rename = "KHR_draco_mesh_compression")]
    pub draco: Option<DracoMeshCompression>,
    #[serde(rename = "KHR_materials_variants")]
    pub variants: Option<PrimitiveVariants>,
}

impl GltfSerialize for PrimitiveExtensions {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        if let Some(draco) = &self.draco {
            w.open_object_property("KHR_draco_mesh_compression")?;
            w.property_usize("bufferView", draco.buffer_view)?;
            w.open_object_property("attributes")?;
            for (name, &id) in &draco.attributes {
                w.property_usize(name, id)?;
            }
            w.close_object()?;
            w.close_object()?;
        }
        if let Some(variants) = &self.variants {
            w.open_object_property("KHR_materials_variants")?;
            w.open_array_property("mappings")?;
            for mapping in &variants.mappings {
                w.open_object()?;
                w.property_usize("material", mapping.material)?;
                w.property_usize_array("variants", &mapping.variants)?;
                w.optional_str("name", mapping.name.as_deref())?;
                w.close_object()?;
            }
            w.close_array()?;
            w.close_object()?;
        }
        w.close_object()
    }
}

/// Data slot for Draco-compressed primitives; the payload is not decoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DracoMeshCompression {
    pub buffer_view: usize,
    pub attributes: IndexMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PrimitiveVariants {
    pub mappings: Vec<VariantMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct VariantMapping {
    pub material: usize,
    pub variants: Vec<usize>,
    pub name: Option<String>,
}

/// Mesh definition
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GltfMesh {
    pub name: Option<String>,
    #[serde(default)]
    pub primitives: Vec<GltfPrimitive>,
    pub weights: Option<Vec<f32>>,
}

impl GltfSerialize for GltfMesh {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.optional_str("name", self.name.as_deref())?;
        w.property_records("primitives", &self.primitives)?;
        if let Some(weights) = &self.weights {
            w.property_f32_array("weights", weights)?;
        }
        w.close_object()
    }
}
