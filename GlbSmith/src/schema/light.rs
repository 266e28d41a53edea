//! `KHR_lights_punctual` records.

use std::f32::consts::FRAC_PI_4;
use std::io::{self, Write};

use serde::Deserialize;

use super::{one, ones3};
use crate::json::{GltfSerialize, JsonWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightType {
    Directional,
    Point,
    Spot,
}

impl LightType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directional => "directional",
            Self::Point => "point",
            Self::Spot => "spot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfSpot {
    #[serde(default)]
    pub inner_cone_angle: f32,
    #[serde(default = "default_outer_cone")]
    pub outer_cone_angle: f32,
}

const fn default_outer_cone() -> f32 {
    FRAC_PI_4
}

impl Default for GltfSpot {
    fn default() -> Self {
        Self {
            inner_cone_angle: 0.0,
            outer_cone_angle: FRAC_PI_4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GltfLight {
    pub name: Option<String>,
    #[serde(default = "ones3")]
    pub color: [f32; 3],
    #[serde(default = "one")]
    pub intensity: f32,
    #[serde(rename = "type")]
    pub light_type: LightType,
    pub range: Option<f32>,
    pub spot: Option<GltfSpot>,
}

impl GltfLight {
    #[must_use]
    pub fn new(light_type: LightType) -> Self {
        Self {
            name: None,
            color: [1.0; 3],
            intensity: 1.0,
            light_type,
            range: None,
            spot: (light_type == LightType::Spot).then(GltfSpot::default),
        }
    }
}

impl GltfSerialize for GltfLight {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.optional_str("name", self.name.as_deref())?;
        w.property_f32_array_unless("color", &self.color, &[1.0; 3])?;
        w.property_f32_unless("intensity", self.intensity, 1.0)?;
        w.property_str("type", self.light_type.as_str())?;
        if let Some(range) = self.range {
            w.property_f32("range", range)?;
        }
        if let Some(spot) = &self.spot {
            w.open_object_property("spot")?;
            w.property_f32_unless("innerConeAngle", spot.inner_cone_angle, 0.0)?;
            w.property_f32_unless("outerConeAngle", spot.outer_cone_angle, FRAC_PI_4)?;
            w.close_object()?;
        }
        w.close_object()
    }
}

/// Root-level `KHR_lights_punctual` block.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LightsPunctual {
    #[serde(default)]
    pub lights: Vec<GltfLight>,
}

impl GltfSerialize for LightsPunctual {
    fn gltf_serialize<W: Write>(&self, w: &mut JsonWriter<W>) -> io::Result<()> {
        w.open_object()?;
        w.property_records("lights", &self.lights)?;
        w.close_object()
    }
}

/// Node-level `KHR_lights_punctual` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NodeLight {
    pub light: usize,
}
