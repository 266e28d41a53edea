//! Host-side materials and the strategies that convert them to glTF.
//!
//! A [`SourceMaterial`] is a flat description of a host material. Its
//! [`MaterialFlavor`] selects a [`MaterialExporter`] from an explicit
//! [`MaterialExporterRegistry`] that the caller owns and hands to the builder.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

mod exporters;

use std::sync::Arc;

pub use exporters::{
    MaterialContext, MaterialExport, MaterialExporter, MaterialExporterRegistry,
    MetallicRoughnessExporter, SpecularGlossinessExporter, UnlitExporter,
};

use crate::images::{ImageFormat, SourceImage};
use crate::schema::{AlphaMode, TextureTransform, WrapMode};

/// Shading model of a source material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialFlavor {
    #[default]
    MetallicRoughness,
    SpecularGlossiness,
    Unlit,
}

/// Texture filtering as exposed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Point,
    #[default]
    Bilinear,
    Trilinear,
}

/// Sampler parameters attached to a texture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerSettings {
    pub filter: FilterMode,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
}

/// A texture reference inside a material.
#[derive(Debug, Clone)]
pub struct TextureSlot {
    pub image: Arc<SourceImage>,
    pub format: ImageFormat,
    pub sampler: SamplerSettings,
    pub tex_coord: usize,
    pub transform: Option<TextureTransform>,
}

impl TextureSlot {
    #[must_use]
    pub fn new(image: Arc<SourceImage>) -> Self {
        Self {
            image,
            format: ImageFormat::Unknown,
            sampler: SamplerSettings::default(),
            tex_coord: 0,
            transform: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClearcoatParams {
    pub factor: f32,
    pub texture: Option<TextureSlot>,
    pub roughness: f32,
    pub roughness_texture: Option<TextureSlot>,
    pub normal_texture: Option<TextureSlot>,
}

#[derive(Debug, Clone, Default)]
pub struct SheenParams {
    pub color: [f32; 3],
    pub color_texture: Option<TextureSlot>,
    pub roughness: f32,
    pub roughness_texture: Option<TextureSlot>,
}

#[derive(Debug, Clone, Default)]
pub struct TransmissionParams {
    pub factor: f32,
    pub texture: Option<TextureSlot>,
}

#[derive(Debug, Clone)]
pub struct SpecularParams {
    pub factor: f32,
    pub texture: Option<TextureSlot>,
    pub color: [f32; 3],
    pub color_texture: Option<TextureSlot>,
}

impl Default for SpecularParams {
    fn default() -> Self {
        Self {
            factor: 1.0,
            texture: None,
            color: [1.0; 3],
            color_texture: None,
        }
    }
}

/// Host material as seen by the exporters.
///
/// Fields that the selected flavor does not use are ignored, or reported when
/// they carry data the flavor cannot express.
#[derive(Debug, Clone)]
pub struct SourceMaterial {
    pub name: Option<String>,
    pub flavor: MaterialFlavor,

    pub base_color: [f32; 4],
    pub base_color_texture: Option<TextureSlot>,

    // metallic-roughness
    pub metallic: f32,
    pub roughness: f32,
    pub metallic_roughness_texture: Option<TextureSlot>,

    // specular-glossiness
    pub specular_color: [f32; 3],
    pub glossiness: f32,
    pub specular_glossiness_texture: Option<TextureSlot>,

    pub normal_texture: Option<TextureSlot>,
    pub normal_scale: f32,
    pub occlusion_texture: Option<TextureSlot>,
    pub occlusion_strength: f32,
    pub emissive_color: [f32; 3],
    pub emissive_texture: Option<TextureSlot>,

    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f32,
    pub double_sided: bool,

    pub clearcoat: Option<ClearcoatParams>,
    pub sheen: Option<SheenParams>,
    pub transmission: Option<TransmissionParams>,
    pub ior: Option<f32>,
    pub specular: Option<SpecularParams>,
}

impl Default for SourceMaterial {
    fn default() -> Self {
        Self {
            name: None,
            flavor: MaterialFlavor::MetallicRoughness,
            base_color: [1.0; 4],
            base_color_texture: None,
            metallic: 1.0,
            roughness: 1.0,
            metallic_roughness_texture: None,
            specular_color: [1.0; 3],
            glossiness: 1.0,
            specular_glossiness_texture: None,
            normal_texture: None,
            normal_scale: 1.0,
            occlusion_texture: None,
            occlusion_strength: 1.0,
            emissive_color: [0.0; 3],
            emissive_texture: None,
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
            clearcoat: None,
            sheen: None,
            transmission: None,
            ior: None,
            specular: None,
        }
    }
}

impl SourceMaterial {
    #[must_use]
    pub fn named(name: impl Into<String>, flavor: MaterialFlavor) -> Self {
        Self {
            name: Some(name.into()),
            flavor,
            ..Self::default()
        }
    }
}
