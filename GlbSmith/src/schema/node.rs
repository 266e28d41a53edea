//! Scene graph nodes.

use std::io::{self, Write};

use serde::Deserialize;

use super::light::NodeLight;
use crate::json::{GltfSerialize, JsonWriter};

const IDENTITY_ROTATION: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Node in the scene graph
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GltfNode {
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<usize>,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
    pub camera: Option<usize>,
    pub translation: Option<[f32; 3]>,
    pub rotation: Option<[f32; 4]>,
    pub scale: Option<[f32; 3]>,
    pub matrix: Option<[f32; 16]>,
    pub extensions: Option<NodeExtensions>,
}

impl GltfNode {
    /// Translation with the identity default applied.
    #[must_use]
    pub fn translation_or_default(&self) -> [f32; 3] {
        self.translation.unwrap_or([0.0; 3])
    }

    #[must_use]
    pub fn rotation_or_default(&self) -> [f32; 4] {
        self.rotation.unwrap_or(IDENTITY_ROTATION)
    }

    #[must_use]
    pub fn scale_or_default(&self) -> [f32; 3] {
        self.scale.unwrap_or([1.0; 3])
    }
}

impl GltfSerialize for GltfNode {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.optional_str("name", self.name.as_deref())?;
        if !self.children.is_empty() {
            w.property_usize_array("children", &self.children)?;
        }
        w.optional_usize("mesh", self.mesh)?;
        w.optional_usize("skin", self.skin)?;
        w.optional_usize("camera", self.camera)?;
        // identity components are dropped when the node is built, not here
        if let Some(t) = &self.translation {
            w.property_f32_array("translation", t)?;
        }
        if let Some(r) = &self.rotation {
            w.property_f32_array("rotation", r)?;
        }
        if let Some(s) = &self.scale {
            w.property_f32_array("scale", s)?;
        }
        if let Some(m) = &self.matrix {
            w.property_f32_array("matrix", m)?;
        }
        w.optional_object("extensions", self.extensions.as_ref())?;
        w.close_object()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct NodeExtensions {
    #[serde(rename = "KHR_lights_punctual")]
    pub lights_punctual: Option<NodeLight>,
}

impl GltfSerialize for NodeExtensions {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        if let Some(light) = &self.lights_punctual {
            w.open_object_property("KHR_lights_punctual")?;
            w.property_usize("light", light.light)?;
            w.close_object()?;
        }
        w.close_object()
    }
}
