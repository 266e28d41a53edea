//! The root glTF document.

use std::io::{self, Write};

use serde::Deserialize;

use super::accessor::{GltfAccessor, GltfBuffer, GltfBufferView};
use super::camera::GltfCamera;
use super::light::LightsPunctual;
use super::material::GltfMaterial;
use super::mesh::GltfMesh;
use super::node::GltfNode;
use super::skin::GltfSkin;
use super::texture::{GltfImage, GltfSampler, GltfTexture};
use crate::json::{GltfSerialize, JsonWriter};

/// Asset metadata
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfAsset {
    pub version: String,
    pub generator: Option<String>,
    pub copyright: Option<String>,
    pub min_version: Option<String>,
}

impl Default for GltfAsset {
    fn default() -> Self {
        Self {
            version: "2.0".to_string(),
            generator: None,
            copyright: None,
            min_version: None,
        }
    }
}

impl GltfSerialize for GltfAsset {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.optional_str("generator", self.generator.as_deref())?;
        w.optional_str("copyright", self.copyright.as_deref())?;
        w.property_str("version", &self.version)?;
        w.optional_str("minVersion", self.min_version.as_deref())?;
        w.close_object()
    }
}

/// Scene containing root nodes
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct GltfScene {
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<usize>,
}

impl GltfSerialize for GltfScene {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.optional_str("name", self.name.as_deref())?;
        w.property_usize_array("nodes", &self.nodes)?;
        w.close_object()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct MaterialVariant {
    pub name: String,
}

/// Root-level `KHR_materials_variants` block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct MaterialsVariants {
    #[serde(default)]
    pub variants: Vec<MaterialVariant>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RootExtensions {
    #[serde(rename = "KHR_lights_punctual")]
    pub lights_punctual: Option<LightsPunctual>,
    #[serde(rename = "KHR_materials_variants")]
    pub materials_variants: Option<MaterialsVariants>,
}

impl RootExtensions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lights_punctual.is_none() && self.materials_variants.is_none()
    }
}

impl GltfSerialize for RootExtensions {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.optional_object("KHR_lights_punctual", self.lights_punctual.as_ref())?;
        if let Some(variants) = &self.materials_variants {
            w.open_object_property("KHR_materials_variants")?;
            w.open_array_property("variants")?;
            for variant in &variants.variants {
                w.open_object()?;
                w.property_str("name", &variant.name)?;
                w.close_object()?;
            }
            w.close_array()?;
            w.close_object()?;
        }
        w.close_object()
    }
}

/// Root glTF document
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfDocument {
    pub asset: GltfAsset,
    pub scene: Option<usize>,
    #[serde(default)]
    pub scenes: Vec<GltfScene>,
    #[serde(default)]
    pub nodes: Vec<GltfNode>,
    #[serde(default)]
    pub meshes: Vec<GltfMesh>,
    #[serde(default)]
    pub materials: Vec<GltfMaterial>,
    #[serde(default)]
    pub textures: Vec<GltfTexture>,
    #[serde(default)]
    pub images: Vec<GltfImage>,
    #[serde(default)]
    pub samplers: Vec<GltfSampler>,
    #[serde(default)]
    pub accessors: Vec<GltfAccessor>,
    #[serde(default)]
    pub buffer_views: Vec<GltfBufferView>,
    #[serde(default)]
    pub buffers: Vec<GltfBuffer>,
    #[serde(default)]
    pub skins: Vec<GltfSkin>,
    #[serde(default)]
    pub cameras: Vec<GltfCamera>,
    #[serde(default)]
    pub extensions_used: Vec<String>,
    #[serde(default)]
    pub extensions_required: Vec<String>,
    pub extensions: Option<RootExtensions>,
}

impl GltfDocument {
    /// Serialize the document as compact JSON into `out`.
    pub fn write_json<W: Write>(&self, out: W) -> io::Result<W> {
        let mut writer = JsonWriter::new(out);
        self.gltf_serialize(&mut writer)?;
        writer.flush()?;
        Ok(writer.into_inner())
    }

    /// Serialize the document into a fresh byte vector.
    pub fn to_json_bytes(&self) -> io::Result<Vec<u8>> {
        self.write_json(Vec::new())
    }

    /// Parse a document from glTF JSON.
    pub fn from_json_slice(json: &[u8]) -> crate::error::Result<Self> {
        Ok(serde_json::from_slice(json)?)
    }

    /// Lights declared through `KHR_lights_punctual`, if any.
    #[must_use]
    pub fn lights(&self) -> &[super::GltfLight] {
        self.extensions
            .as_ref()
            .and_then(|e| e.lights_punctual.as_ref())
            .map_or(&[], |l| l.lights.as_slice())
    }

    /// Variant names declared through `KHR_materials_variants`, if any.
    #[must_use]
    pub fn material_variants(&self) -> &[MaterialVariant] {
        self.extensions
            .as_ref()
            .and_then(|e| e.materials_variants.as_ref())
            .map_or(&[], |v| v.variants.as_slice())
    }
}

impl GltfSerialize for GltfDocument {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.property_object("asset", &self.asset)?;
        if !self.extensions_used.is_empty() {
            w.property_str_array("extensionsUsed", &self.extensions_used)?;
        }
        if !self.extensions_required.is_empty() {
            w.property_str_array("extensionsRequired", &self.extensions_required)?;
        }
        w.optional_usize("scene", self.scene)?;
        w.optional_records("scenes", &self.scenes)?;
        w.optional_records("nodes", &self.nodes)?;
        w.optional_records("meshes", &self.meshes)?;
        w.optional_records("materials", &self.materials)?;
        w.optional_records("textures", &self.textures)?;
        w.optional_records("images", &self.images)?;
        w.optional_records("samplers", &self.samplers)?;
        w.optional_records("accessors", &self.accessors)?;
        w.optional_records("bufferViews", &self.buffer_views)?;
        w.optional_records("buffers", &self.buffers)?;
        w.optional_records("skins", &self.skins)?;
        w.optional_records("cameras", &self.cameras)?;
        if let Some(ext) = self.extensions.as_ref().filter(|e| !e.is_empty()) {
            w.property_object("extensions", ext)?;
        }
        w.close_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{AccessorType, ComponentType};
    use crate::schema::{AlphaMode, GltfPrimitive, GltfSampler, WrapMode};
    use pretty_assertions::assert_eq;

    fn json_value(doc: &GltfDocument) -> serde_json::Value {
        let bytes = doc.to_json_bytes().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_empty_document_omits_arrays() {
        let doc = GltfDocument::default();
        let value = json_value(&doc);
        assert_eq!(value, serde_json::json!({ "asset": { "version": "2.0" } }));
    }

    #[test]
    fn test_node_defaults_omitted() {
        let doc = GltfDocument {
            nodes: vec![GltfNode {
                translation: Some([0.0; 3]),
                rotation: Some([0.0, 0.0, 0.0, 1.0]),
                scale: Some([1.0, 2.0, 1.0]),
                ..Default::default()
            }],
            ..Default::default()
        };
        let value = json_value(&doc);
        assert_eq!(value["nodes"][0], serde_json::json!({ "scale": [1.0, 2.0, 1.0] }));
    }

    #[test]
    fn test_material_alpha_cutoff_only_under_mask() {
        let blend = GltfMaterial {
            alpha_mode: AlphaMode::Blend,
            alpha_cutoff: 0.25,
            ..Default::default()
        };
        let mask = GltfMaterial {
            alpha_mode: AlphaMode::Mask,
            alpha_cutoff: 0.25,
            ..Default::default()
        };
        let doc = GltfDocument {
            materials: vec![blend, mask],
            ..Default::default()
        };
        let value = json_value(&doc);
        assert_eq!(value["materials"][0], serde_json::json!({ "alphaMode": "BLEND" }));
        assert_eq!(
            value["materials"][1],
            serde_json::json!({ "alphaMode": "MASK", "alphaCutoff": 0.25 })
        );
    }

    #[test]
    fn test_sampler_wrap_default_omitted() {
        let doc = GltfDocument {
            samplers: vec![GltfSampler {
                wrap_s: WrapMode::ClampToEdge,
                ..Default::default()
            }],
            ..Default::default()
        };
        let value = json_value(&doc);
        assert_eq!(value["samplers"][0], serde_json::json!({ "wrapS": 33071 }));
    }

    #[test]
    fn test_json_round_trip() {
        let mut primitive = GltfPrimitive::default();
        primitive.attributes.insert("POSITION".to_string(), 0);
        let mut accessor = GltfAccessor::new(0, ComponentType::Float, AccessorType::Vec3, 3);
        accessor.min = Some(vec![-1.0, 0.0, 0.0]);
        accessor.max = Some(vec![0.0, 1.0, 0.0]);

        let doc = GltfDocument {
            asset: GltfAsset {
                generator: Some("glbsmith".to_string()),
                ..Default::default()
            },
            scene: Some(0),
            scenes: vec![GltfScene { name: None, nodes: vec![0] }],
            nodes: vec![GltfNode {
                mesh: Some(0),
                translation: Some([-1.0, 2.0, 3.0]),
                ..Default::default()
            }],
            meshes: vec![GltfMesh {
                name: Some("tri".to_string()),
                primitives: vec![primitive],
                weights: None,
            }],
            accessors: vec![accessor],
            buffer_views: vec![GltfBufferView {
                buffer: 0,
                byte_offset: 0,
                byte_length: 36,
                byte_stride: Some(12),
                target: None,
                name: None,
            }],
            buffers: vec![GltfBuffer {
                byte_length: 36,
                uri: None,
                name: None,
            }],
            ..Default::default()
        };

        let bytes = doc.to_json_bytes().unwrap();
        let parsed = GltfDocument::from_json_slice(&bytes).unwrap();
        assert_eq!(parsed, doc);
    }
}
