//! glTF 2.0 material and texture reference types, including the KHR material
//! extension blocks.

use std::io::{self, Write};

use serde::Deserialize;

use super::{one, ones3, ones4};
use crate::json::{GltfSerialize, JsonWriter};

/// Alpha blending mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

impl AlphaMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opaque => "OPAQUE",
            Self::Mask => "MASK",
            Self::Blend => "BLEND",
        }
    }
}

/// `KHR_texture_transform` block
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureTransform {
    #[serde(default)]
    pub offset: [f32; 2],
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "ones2")]
    pub scale: [f32; 2],
    pub tex_coord: Option<usize>,
}

const fn ones2() -> [f32; 2] {
    [1.0; 2]
}

impl Default for TextureTransform {
    fn default() -> Self {
        Self {
            offset: [0.0; 2],
            rotation: 0.0,
            scale: [1.0; 2],
            tex_coord: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TextureInfoExtensions {
    #[serde(rename = "KHR_texture_transform")]
    pub texture_transform: Option<TextureTransform>,
}

impl GltfSerialize for TextureInfoExtensions {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        if let Some(t) = &self.texture_transform {
            w.open_object_property("KHR_texture_transform")?;
            w.property_f32_array_unless("offset", &t.offset, &[0.0, 0.0])?;
            w.property_f32_unless("rotation", t.rotation, 0.0)?;
            w.property_f32_array_unless("scale", &t.scale, &[1.0, 1.0])?;
            w.optional_usize("texCoord", t.tex_coord)?;
            w.close_object()?;
        }
        w.close_object()
    }
}

/// Texture info used in materials
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfTextureInfo {
    pub index: usize,
    #[serde(default)]
    pub tex_coord: usize,
    pub extensions: Option<TextureInfoExtensions>,
}

impl GltfTextureInfo {
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            tex_coord: 0,
            extensions: None,
        }
    }
}

impl GltfSerialize for GltfTextureInfo {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.property_usize("index", self.index)?;
        w.property_usize_unless("texCoord", self.tex_coord, 0)?;
        w.optional_object("extensions", self.extensions.as_ref())?;
        w.close_object()
    }
}

/// Normal texture info with scale
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfNormalTextureInfo {
    pub index: usize,
    #[serde(default)]
    pub tex_coord: usize,
    #[serde(default = "one")]
    pub scale: f32,
    pub extensions: Option<TextureInfoExtensions>,
}

impl GltfSerialize for GltfNormalTextureInfo {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.property_usize("index", self.index)?;
        w.property_usize_unless("texCoord", self.tex_coord, 0)?;
        w.property_f32_unless("scale", self.scale, 1.0)?;
        w.optional_object("extensions", self.extensions.as_ref())?;
        w.close_object()
    }
}

/// Occlusion texture info with strength
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfOcclusionTextureInfo {
    pub index: usize,
    #[serde(default)]
    pub tex_coord: usize,
    #[serde(default = "one")]
    pub strength: f32,
    pub extensions: Option<TextureInfoExtensions>,
}

impl GltfSerialize for GltfOcclusionTextureInfo {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.property_usize("index", self.index)?;
        w.property_usize_unless("texCoord", self.tex_coord, 0)?;
        w.property_f32_unless("strength", self.strength, 1.0)?;
        w.optional_object("extensions", self.extensions.as_ref())?;
        w.close_object()
    }
}

/// PBR Metallic-Roughness material model
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfPbrMetallicRoughness {
    #[serde(default = "ones4")]
    pub base_color_factor: [f32; 4],
    pub base_color_texture: Option<GltfTextureInfo>,
    #[serde(default = "one")]
    pub metallic_factor: f32,
    #[serde(default = "one")]
    pub roughness_factor: f32,
    pub metallic_roughness_texture: Option<GltfTextureInfo>,
}

impl Default for GltfPbrMetallicRoughness {
    fn default() -> Self {
        Self {
            base_color_factor: [1.0; 4],
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
        }
    }
}

impl GltfSerialize for GltfPbrMetallicRoughness {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.property_f32_array_unless("baseColorFactor", &self.base_color_factor, &[1.0; 4])?;
        w.optional_object("baseColorTexture", self.base_color_texture.as_ref())?;
        w.property_f32_unless("metallicFactor", self.metallic_factor, 1.0)?;
        w.property_f32_unless("roughnessFactor", self.roughness_factor, 1.0)?;
        w.optional_object("metallicRoughnessTexture", self.metallic_roughness_texture.as_ref())?;
        w.close_object()
    }
}

// ============================================================================
// Material extensions
// ============================================================================

/// `KHR_materials_unlit` (an empty marker object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct MaterialsUnlit {}

/// `KHR_materials_pbrSpecularGlossiness`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrSpecularGlossiness {
    #[serde(default = "ones4")]
    pub diffuse_factor: [f32; 4],
    pub diffuse_texture: Option<GltfTextureInfo>,
    #[serde(default = "ones3")]
    pub specular_factor: [f32; 3],
    #[serde(default = "one")]
    pub glossiness_factor: f32,
    pub specular_glossiness_texture: Option<GltfTextureInfo>,
}

impl Default for PbrSpecularGlossiness {
    fn default() -> Self {
        Self {
            diffuse_factor: [1.0; 4],
            diffuse_texture: None,
            specular_factor: [1.0; 3],
            glossiness_factor: 1.0,
            specular_glossiness_texture: None,
        }
    }
}

/// `KHR_materials_clearcoat`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialsClearcoat {
    #[serde(default)]
    pub clearcoat_factor: f32,
    pub clearcoat_texture: Option<GltfTextureInfo>,
    #[serde(default)]
    pub clearcoat_roughness_factor: f32,
    pub clearcoat_roughness_texture: Option<GltfTextureInfo>,
    pub clearcoat_normal_texture: Option<GltfNormalTextureInfo>,
}

/// `KHR_materials_sheen`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialsSheen {
    #[serde(default)]
    pub sheen_color_factor: [f32; 3],
    pub sheen_color_texture: Option<GltfTextureInfo>,
    #[serde(default)]
    pub sheen_roughness_factor: f32,
    pub sheen_roughness_texture: Option<GltfTextureInfo>,
}

/// `KHR_materials_transmission`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialsTransmission {
    #[serde(default)]
    pub transmission_factor: f32,
    pub transmission_texture: Option<GltfTextureInfo>,
}

/// `KHR_materials_ior`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MaterialsIor {
    #[serde(default = "default_ior")]
    pub ior: f32,
}

const fn default_ior() -> f32 {
    1.5
}

impl Default for MaterialsIor {
    fn default() -> Self {
        Self { ior: default_ior() }
    }
}

/// `KHR_materials_specular`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialsSpecular {
    #[serde(default = "one")]
    pub specular_factor: f32,
    pub specular_texture: Option<GltfTextureInfo>,
    #[serde(default = "ones3")]
    pub specular_color_factor: [f32; 3],
    pub specular_color_texture: Option<GltfTextureInfo>,
}

impl Default for MaterialsSpecular {
    fn default() -> Self {
        Self {
            specular_factor: 1.0,
            specular_texture: None,
            specular_color_factor: [1.0; 3],
            specular_color_texture: None,
        }
    }
}

/// Material extension union; every block is orthogonal and optional.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MaterialExtensions {
    #[serde(rename = "KHR_materials_unlit")]
    pub unlit: Option<MaterialsUnlit>,
    #[serde(rename = "KHR_materials_pbrSpecularGlossiness")]
    pub pbr_specular_glossiness: Option<PbrSpecularGlossiness>,
    #[serde(rename = "KHR_materials_clearcoat")]
    pub clearcoat: Option<MaterialsClearcoat>,
    #[serde(rename = "KHR_materials_sheen")]
    pub sheen: Option<MaterialsSheen>,
    #[serde(rename = "KHR_materials_transmission")]
    pub transmission: Option<MaterialsTransmission>,
    #[serde(rename = "KHR_materials_ior")]
    pub ior: Option<MaterialsIor>,
    #[serde(rename = "KHR_materials_specular")]
    pub specular: Option<MaterialsSpecular>,
}

impl MaterialExtensions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl GltfSerialize for MaterialExtensions {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        if self.unlit.is_some() {
            w.open_object_property("KHR_materials_unlit")?;
            w.close_object()?;
        }
        if let Some(sg) = &self.pbr_specular_glossiness {
            w.open_object_property("KHR_materials_pbrSpecularGlossiness")?;
            w.property_f32_array_unless("diffuseFactor", &sg.diffuse_factor, &[1.0; 4])?;
            w.optional_object("diffuseTexture", sg.diffuse_texture.as_ref())?;
            w.property_f32_array_unless("specularFactor", &sg.specular_factor, &[1.0; 3])?;
            w.property_f32_unless("glossinessFactor", sg.glossiness_factor, 1.0)?;
            w.optional_object("specularGlossinessTexture", sg.specular_glossiness_texture.as_ref())?;
            w.close_object()?;
        }
        if let Some(cc) = &self.clearcoat {
            w.open_object_property("KHR_materials_clearcoat")?;
            w.property_f32_unless("clearcoatFactor", cc.clearcoat_factor, 0.0)?;
            w.optional_object("clearcoatTexture", cc.clearcoat_texture.as_ref())?;
            w.property_f32_unless("clearcoatRoughnessFactor", cc.clearcoat_roughness_factor, 0.0)?;
            w.optional_object("clearcoatRoughnessTexture", cc.clearcoat_roughness_texture.as_ref())?;
            w.optional_object("clearcoatNormalTexture", cc.clearcoat_normal_texture.as_ref())?;
            w.close_object()?;
        }
        if let Some(sheen) = &self.sheen {
            w.open_object_property("KHR_materials_sheen")?;
            w.property_f32_array_unless("sheenColorFactor", &sheen.sheen_color_factor, &[0.0; 3])?;
            w.optional_object("sheenColorTexture", sheen.sheen_color_texture.as_ref())?;
            w.property_f32_unless("sheenRoughnessFactor", sheen.sheen_roughness_factor, 0.0)?;
            w.optional_object("sheenRoughnessTexture", sheen.sheen_roughness_texture.as_ref())?;
            w.close_object()?;
        }
        if let Some(tr) = &self.transmission {
            w.open_object_property("KHR_materials_transmission")?;
            w.property_f32_unless("transmissionFactor", tr.transmission_factor, 0.0)?;
            w.optional_object("transmissionTexture", tr.transmission_texture.as_ref())?;
            w.close_object()?;
        }
        if let Some(ior) = &self.ior {
            w.open_object_property("KHR_materials_ior")?;
            w.property_f32_unless("ior", ior.ior, default_ior())?;
            w.close_object()?;
        }
        if let Some(spec) = &self.specular {
            w.open_object_property("KHR_materials_specular")?;
            w.property_f32_unless("specularFactor", spec.specular_factor, 1.0)?;
            w.optional_object("specularTexture", spec.specular_texture.as_ref())?;
            w.property_f32_array_unless("specularColorFactor", &spec.specular_color_factor, &[1.0; 3])?;
            w.optional_object("specularColorTexture", spec.specular_color_texture.as_ref())?;
            w.close_object()?;
        }
        w.close_object()
    }
}

/// Material definition
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfMaterial {
    pub name: Option<String>,
    pub pbr_metallic_roughness: Option<GltfPbrMetallicRoughness>,
    pub normal_texture: Option<GltfNormalTextureInfo>,
    pub occlusion_texture: Option<GltfOcclusionTextureInfo>,
    pub emissive_texture: Option<GltfTextureInfo>,
    #[serde(default)]
    pub emissive_factor: [f32; 3],
    #[serde(default)]
    pub alpha_mode: AlphaMode,
    #[serde(default = "default_alpha_cutoff")]
    pub alpha_cutoff: f32,
    #[serde(default)]
    pub double_sided: bool,
    pub extensions: Option<MaterialExtensions>,
}

const fn default_alpha_cutoff() -> f32 {
    0.5
}

impl Default for GltfMaterial {
    fn default() -> Self {
        Self {
            name: None,
            pbr_metallic_roughness: None,
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
            emissive_factor: [0.0; 3],
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: default_alpha_cutoff(),
            double_sided: false,
            extensions: None,
        }
    }
}

impl GltfMaterial {
    /// Every texture index the material refers to, extension blocks included.
    #[must_use]
    pub fn texture_indices(&self) -> Vec<usize> {
        let info = |t: &Option<GltfTextureInfo>| t.as_ref().map(|t| t.index);
        let mut out = Vec::new();
        if let Some(pbr) = &self.pbr_metallic_roughness {
            out.extend(info(&pbr.base_color_texture));
            out.extend(info(&pbr.metallic_roughness_texture));
        }
        out.extend(self.normal_texture.as_ref().map(|t| t.index));
        out.extend(self.occlusion_texture.as_ref().map(|t| t.index));
        out.extend(info(&self.emissive_texture));

        let Some(ext) = &self.extensions else {
            return out;
        };
        if let Some(sg) = &ext.pbr_specular_glossiness {
            out.extend(info(&sg.diffuse_texture));
            out.extend(info(&sg.specular_glossiness_texture));
        }
        if let Some(cc) = &ext.clearcoat {
            out.extend(info(&cc.clearcoat_texture));
            out.extend(info(&cc.clearcoat_roughness_texture));
            out.extend(cc.clearcoat_normal_texture.as_ref().map(|t| t.index));
        }
        if let Some(sheen) = &ext.sheen {
            out.extend(info(&sheen.sheen_color_texture));
            out.extend(info(&sheen.sheen_roughness_texture));
        }
        if let Some(tr) = &ext.transmission {
            out.extend(info(&tr.transmission_texture));
        }
        if let Some(spec) = &ext.specular {
            out.extend(info(&spec.specular_texture));
            out.extend(info(&spec.specular_color_texture));
        }
        out
    }

    /// Reset `alpha_cutoff` to its default unless the mode is `MASK`, which
    /// is the only mode that serializes it.
    pub fn normalize_alpha_cutoff(&mut self) {
        if self.alpha_mode != AlphaMode::Mask {
            self.alpha_cutoff = default_alpha_cutoff();
        }
    }
}

impl GltfSerialize for GltfMaterial {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.optional_str("name", self.name.as_deref())?;
        w.optional_object("pbrMetallicRoughness", self.pbr_metallic_roughness.as_ref())?;
        w.optional_object("normalTexture", self.normal_texture.as_ref())?;
        w.optional_object("occlusionTexture", self.occlusion_texture.as_ref())?;
        w.optional_object("emissiveTexture", self.emissive_texture.as_ref())?;
        w.property_f32_array_unless("emissiveFactor", &self.emissive_factor, &[0.0; 3])?;
        if self.alpha_mode != AlphaMode::Opaque {
            w.property_str("alphaMode", self.alpha_mode.as_str())?;
        }
        // alphaCutoff only carries meaning under MASK
        if self.alpha_mode == AlphaMode::Mask {
            w.property_f32_unless("alphaCutoff", self.alpha_cutoff, default_alpha_cutoff())?;
        }
        w.property_bool_unless("doubleSided", self.double_sided, false)?;
        if let Some(ext) = self.extensions.as_ref().filter(|e| !e.is_empty()) {
            w.property_object("extensions", ext)?;
        }
        w.close_object()
    }
}
