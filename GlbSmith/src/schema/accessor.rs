//! Accessors, buffer views and buffers.

use std::io::{self, Write};

use serde::Deserialize;

use crate::json::{GltfSerialize, JsonWriter};
use crate::layout::{AccessorType, BufferViewTarget, ComponentType, element_size};

/// Typed view into a buffer view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfAccessor {
    pub buffer_view: Option<usize>,
    #[serde(default)]
    pub byte_offset: usize,
    pub component_type: ComponentType,
    #[serde(default)]
    pub normalized: bool,
    pub count: usize,
    #[serde(rename = "type")]
    pub accessor_type: AccessorType,
    pub min: Option<Vec<f32>>,
    pub max: Option<Vec<f32>>,
    pub sparse: Option<GltfSparse>,
    pub name: Option<String>,
}

impl GltfAccessor {
    /// Tightly packed accessor with no bounds.
    #[must_use]
    pub fn new(buffer_view: usize, component_type: ComponentType, accessor_type: AccessorType, count: usize) -> Self {
        Self {
            buffer_view: Some(buffer_view),
            byte_offset: 0,
            component_type,
            normalized: false,
            count,
            accessor_type,
            min: None,
            max: None,
            sparse: None,
            name: None,
        }
    }

    /// Byte size of a single element.
    #[must_use]
    pub fn element_size(&self) -> usize {
        element_size(self.component_type, self.accessor_type)
    }
}

impl GltfSerialize for GltfAccessor {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.optional_usize("bufferView", self.buffer_view)?;
        w.property_usize_unless("byteOffset", self.byte_offset, 0)?;
        w.property_u32("componentType", self.component_type.gl_enum())?;
        w.property_bool_unless("normalized", self.normalized, false)?;
        w.property_usize("count", self.count)?;
        w.property_str("type", self.accessor_type.as_str())?;
        if let Some(max) = &self.max {
            w.property_f32_array("max", max)?;
        }
        if let Some(min) = &self.min {
            w.property_f32_array("min", min)?;
        }
        w.optional_object("sparse", self.sparse.as_ref())?;
        w.optional_str("name", self.name.as_deref())?;
        w.close_object()
    }
}

/// Sparse substitution of accessor elements.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GltfSparse {
    pub count: usize,
    pub indices: GltfSparseIndices,
    pub values: GltfSparseValues,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfSparseIndices {
    pub buffer_view: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub component_type: ComponentType,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfSparseValues {
    pub buffer_view: usize,
    #[serde(default)]
    pub byte_offset: usize,
}

impl GltfSerialize for GltfSparse {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.property_usize("count", self.count)?;
        w.open_object_property("indices")?;
        w.property_usize("bufferView", self.indices.buffer_view)?;
        w.property_usize_unless("byteOffset", self.indices.byte_offset, 0)?;
        w.property_u32("componentType", self.indices.component_type.gl_enum())?;
        w.close_object()?;
        w.open_object_property("values")?;
        w.property_usize("bufferView", self.values.buffer_view)?;
        w.property_usize_unless("byteOffset", self.values.byte_offset, 0)?;
        w.close_object()?;
        w.close_object()
    }
}

/// Byte range within a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfBufferView {
    pub buffer: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
    pub target: Option<BufferViewTarget>,
    pub name: Option<String>,
}

impl GltfSerialize for GltfBufferView {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.property_usize("buffer", self.buffer)?;
        w.property_usize_unless("byteOffset", self.byte_offset, 0)?;
        w.property_usize("byteLength", self.byte_length)?;
        w.optional_usize("byteStride", self.byte_stride)?;
        if let Some(target) = self.target {
            w.property_u32("target", target.gl_enum())?;
        }
        w.optional_str("name", self.name.as_deref())?;
        w.close_object()
    }
}

/// Binary blob, external (`uri`) or the GLB BIN chunk (no `uri`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfBuffer {
    pub byte_length: usize,
    pub uri: Option<String>,
    pub name: Option<String>,
}

impl GltfSerialize for GltfBuffer {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.optional_str("uri", self.uri.as_deref())?;
        w.property_usize("byteLength", self.byte_length)?;
        w.optional_str("name", self.name.as_deref())?;
        w.close_object()
    }
}
