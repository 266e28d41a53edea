//! Textures, images and samplers.

use std::io::{self, Write};

use serde::Deserialize;

use crate::json::{GltfSerialize, JsonWriter};

/// Texture: an image plus an optional sampler
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct GltfTexture {
    pub sampler: Option<usize>,
    pub source: Option<usize>,
    pub name: Option<String>,
}

impl GltfSerialize for GltfTexture {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.optional_usize("sampler", self.sampler)?;
        w.optional_usize("source", self.source)?;
        w.optional_str("name", self.name.as_deref())?;
        w.close_object()
    }
}

/// Image: either a URI or a bufferView with a MIME type
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfImage {
    pub name: Option<String>,
    pub uri: Option<String>,
    pub mime_type: Option<String>,
    pub buffer_view: Option<usize>,
}

impl GltfSerialize for GltfImage {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.optional_str("name", self.name.as_deref())?;
        w.optional_str("uri", self.uri.as_deref())?;
        w.optional_str("mimeType", self.mime_type.as_deref())?;
        w.optional_usize("bufferView", self.buffer_view)?;
        w.close_object()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u32")]
pub enum MagFilter {
    Nearest,
    Linear,
}

impl MagFilter {
    #[must_use]
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Nearest => 9728,
            Self::Linear => 9729,
        }
    }
}

impl TryFrom<u32> for MagFilter {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, String> {
        match value {
            9728 => Ok(Self::Nearest),
            9729 => Ok(Self::Linear),
            other => Err(format!("unknown magFilter: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u32")]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl MinFilter {
    #[must_use]
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Nearest => 9728,
            Self::Linear => 9729,
            Self::NearestMipmapNearest => 9984,
            Self::LinearMipmapNearest => 9985,
            Self::NearestMipmapLinear => 9986,
            Self::LinearMipmapLinear => 9987,
        }
    }
}

impl TryFrom<u32> for MinFilter {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, String> {
        Ok(match value {
            9728 => Self::Nearest,
            9729 => Self::Linear,
            9984 => Self::NearestMipmapNearest,
            9985 => Self::LinearMipmapNearest,
            9986 => Self::NearestMipmapLinear,
            9987 => Self::LinearMipmapLinear,
            other => return Err(format!("unknown minFilter: {other}")),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "u32")]
pub enum WrapMode {
    ClampToEdge,
    MirroredRepeat,
    #[default]
    Repeat,
}

impl WrapMode {
    #[must_use]
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::ClampToEdge => 33071,
            Self::MirroredRepeat => 33648,
            Self::Repeat => 10497,
        }
    }
}

impl TryFrom<u32> for WrapMode {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, String> {
        match value {
            33071 => Ok(Self::ClampToEdge),
            33648 => Ok(Self::MirroredRepeat),
            10497 => Ok(Self::Repeat),
            other => Err(format!("unknown wrap mode: {other}")),
        }
    }
}

/// Texture sampler
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfSampler {
    pub mag_filter: Option<MagFilter>,
    pub min_filter: Option<MinFilter>,
    #[serde(default)]
    pub wrap_s: WrapMode,
    #[serde(default)]
    pub wrap_t: WrapMode,
    pub name: Option<String>,
}

impl GltfSerialize for GltfSampler {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        if let Some(mag) = self.mag_filter {
            w.property_u32("magFilter", mag.gl_enum())?;
        }
        if let Some(min) = self.min_filter {
            w.property_u32("minFilter", min.gl_enum())?;
        }
        if self.wrap_s != WrapMode::Repeat {
            w.property_u32("wrapS", self.wrap_s.gl_enum())?;
        }
        if self.wrap_t != WrapMode::Repeat {
            w.property_u32("wrapT", self.wrap_t.gl_enum())?;
        }
        w.optional_str("name", self.name.as_deref())?;
        w.close_object()
    }
}
