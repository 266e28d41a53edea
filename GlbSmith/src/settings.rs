//! Export settings, loadable from TOML.
//!
//! ```toml
//! format = "binary"
//! file_conflict_resolution = "rename"
//! deterministic = true
//! image_format = "png"
//! ```
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// Container written by a file save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// `.gltf` JSON with sibling `.bin` and image files.
    Json,
    /// Single self-contained `.glb`.
    #[default]
    Binary,
}

/// What to do when a destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileConflictResolution {
    /// Fail the whole save.
    Abort,
    #[default]
    Overwrite,
    /// Append `_1`, `_2`, ... to the file stem until the name is free.
    Rename,
}

/// Encoding requested for exported images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG when the image has any transparency, JPEG otherwise.
    #[default]
    Unknown,
    Png,
    Jpg,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: ExportFormat,
    pub file_conflict_resolution: FileConflictResolution,
    /// Run conversion jobs sequentially so output is byte-for-byte reproducible.
    pub deterministic: bool,
    pub image_format: ImageFormat,
    pub jpeg_quality: u8,
    /// Store buffers and images as base64 `data:` URIs in JSON output.
    pub embed_buffers: bool,
    /// Override for `asset.generator`.
    pub generator: Option<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Binary,
            file_conflict_resolution: FileConflictResolution::Overwrite,
            deterministic: false,
            image_format: ImageFormat::Unknown,
            jpeg_quality: 90,
            embed_buffers: false,
            generator: None,
        }
    }
}

impl ExportSettings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Generator string stamped into `asset.generator`.
    #[must_use]
    pub fn generator(&self) -> String {
        self.generator
            .clone()
            .unwrap_or_else(|| format!("GlbSmith {}", crate::VERSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = ExportSettings::from_toml_str("format = \"json\"\ndeterministic = true\n").unwrap();
        assert_eq!(settings.format, ExportFormat::Json);
        assert!(settings.deterministic);
        assert_eq!(settings.jpeg_quality, 90);
        assert_eq!(settings.file_conflict_resolution, FileConflictResolution::Overwrite);
    }

    #[test]
    fn test_full_toml() {
        let text = r#"
            format = "binary"
            file_conflict_resolution = "rename"
            image_format = "jpg"
            jpeg_quality = 75
            embed_buffers = true
            generator = "test"
        "#;
        let settings = ExportSettings::from_toml_str(text).unwrap();
        assert_eq!(settings.file_conflict_resolution, FileConflictResolution::Rename);
        assert_eq!(settings.image_format, ImageFormat::Jpg);
        assert_eq!(settings.jpeg_quality, 75);
        assert!(settings.embed_buffers);
        assert_eq!(settings.generator(), "test");
    }

    #[test]
    fn test_bad_toml() {
        assert!(ExportSettings::from_toml_str("format = \"fbx\"").is_err());
    }
}
