//! Skins.

use std::io::{self, Write};

use serde::Deserialize;

use crate::json::{GltfSerialize, JsonWriter};

/// Skin for skeletal animation
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfSkin {
    pub name: Option<String>,
    pub inverse_bind_matrices: Option<usize>,
    pub skeleton: Option<usize>,
    pub joints: Vec<usize>,
}

impl GltfSerialize for GltfSkin {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.optional_str("name", self.name.as_deref())?;
        w.optional_usize("inverseBindMatrices", self.inverse_bind_matrices)?;
        w.optional_usize("skeleton", self.skeleton)?;
        w.property_usize_array("joints", &self.joints)?;
        w.close_object()
    }
}
