//! Cameras.

use std::io::{self, Write};

use serde::Deserialize;

use crate::json::{GltfSerialize, JsonWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraType {
    Perspective,
    Orthographic,
}

impl CameraType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Perspective => "perspective",
            Self::Orthographic => "orthographic",
        }
    }
}

/// Perspective projection. An absent `zfar` means an infinite projection.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfPerspective {
    pub aspect_ratio: Option<f32>,
    pub yfov: f32,
    pub zfar: Option<f32>,
    pub znear: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GltfOrthographic {
    pub xmag: f32,
    pub ymag: f32,
    pub zfar: f32,
    pub znear: f32,
}

/// Camera: exactly one of `perspective` / `orthographic` matches `camera_type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GltfCamera {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub camera_type: CameraType,
    pub perspective: Option<GltfPerspective>,
    pub orthographic: Option<GltfOrthographic>,
}

impl GltfCamera {
    #[must_use]
    pub fn perspective(perspective: GltfPerspective) -> Self {
        Self {
            name: None,
            camera_type: CameraType::Perspective,
            perspective: Some(perspective),
            orthographic: None,
        }
    }

    #[must_use]
    pub fn orthographic(orthographic: GltfOrthographic) -> Self {
        Self {
            name: None,
            camera_type: CameraType::Orthographic,
            perspective: None,
            orthographic: Some(orthographic),
        }
    }
}

impl GltfSerialize for GltfCamera {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.optional_str("name", self.name.as_deref())?;
        w.property_str("type", self.camera_type.as_str())?;
        if let Some(p) = &self.perspective {
            w.open_object_property("perspective")?;
            if let Some(aspect) = p.aspect_ratio {
                w.property_f32("aspectRatio", aspect)?;
            }
            w.property_f32("yfov", p.yfov)?;
            if let Some(zfar) = p.zfar {
                w.property_f32("zfar", zfar)?;
            }
            w.property_f32("znear", p.znear)?;
            w.close_object()?;
        }
        if let Some(o) = &self.orthographic {
            w.open_object_property("orthographic")?;
            w.property_f32("xmag", o.xmag)?;
            w.property_f32("ymag", o.ymag)?;
            w.property_f32("zfar", o.zfar)?;
            w.property_f32("znear", o.znear)?;
            w.close_object()?;
        }
        w.close_object()
    }
}
