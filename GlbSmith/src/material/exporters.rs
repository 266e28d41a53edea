//! Material export strategies, one per [`MaterialFlavor`].

use std::collections::HashMap;
use std::sync::Arc;

use super::{MaterialFlavor, SourceMaterial, TextureSlot};
use crate::error::Result;
use crate::logger::{Diagnostic, LogCode, Severity};
use crate::schema::{
    Extension, GltfMaterial, GltfNormalTextureInfo, GltfOcclusionTextureInfo,
    GltfPbrMetallicRoughness, GltfTextureInfo, MaterialExtensions, MaterialsClearcoat, MaterialsIor,
    MaterialsSheen, MaterialsSpecular, MaterialsTransmission, MaterialsUnlit, PbrSpecularGlossiness,
    TextureInfoExtensions,
};

/// What an exporter may ask of the document while converting a material.
pub trait MaterialContext {
    /// Add (or reuse) the image, sampler and texture for `slot`; returns the texture index.
    fn texture(&mut self, slot: &TextureSlot) -> Result<usize>;

    /// Record that the document uses `extension`.
    fn use_extension(&mut self, extension: Extension, required: bool);

    /// Report a per-material problem.
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Result of converting one material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialExport {
    pub material: GltfMaterial,
    /// `false` when something had to be dropped or degraded.
    pub flawless: bool,
}

/// Converts one flavor of [`SourceMaterial`] into a glTF material.
pub trait MaterialExporter: Send + Sync {
    fn flavor(&self) -> MaterialFlavor;

    fn export(&self, source: &SourceMaterial, ctx: &mut dyn MaterialContext) -> MaterialExport;
}

/// Explicit flavor -> exporter table, owned by the caller.
#[derive(Clone)]
pub struct MaterialExporterRegistry {
    exporters: HashMap<MaterialFlavor, Arc<dyn MaterialExporter>>,
}

impl MaterialExporterRegistry {
    /// A registry with no exporters.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            exporters: HashMap::new(),
        }
    }

    /// Register `exporter` for its flavor, replacing any previous one.
    pub fn register(&mut self, exporter: Arc<dyn MaterialExporter>) {
        self.exporters.insert(exporter.flavor(), exporter);
    }

    #[must_use]
    pub fn get(&self, flavor: MaterialFlavor) -> Option<&Arc<dyn MaterialExporter>> {
        self.exporters.get(&flavor)
    }
}

impl Default for MaterialExporterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(MetallicRoughnessExporter));
        registry.register(Arc::new(SpecularGlossinessExporter));
        registry.register(Arc::new(UnlitExporter));
        registry
    }
}

impl std::fmt::Debug for MaterialExporterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.exporters.keys()).finish()
    }
}

/// Shared bookkeeping while one material is converted.
struct Conversion<'a> {
    ctx: &'a mut dyn MaterialContext,
    name: String,
    flawless: bool,
}

impl<'a> Conversion<'a> {
    fn new(source: &SourceMaterial, ctx: &'a mut dyn MaterialContext) -> Self {
        Self {
            ctx,
            name: source.name.clone().unwrap_or_default(),
            flawless: true,
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity >= Severity::Warning {
            self.flawless = false;
        }
        self.ctx.report(diagnostic);
    }

    fn unsupported(&mut self, feature: &str) {
        let diagnostic = Diagnostic::warning(
            LogCode::MaterialFeatureUnsupported,
            vec![self.name.clone(), feature.to_string()],
        );
        self.report(diagnostic);
    }

    fn texture_index(&mut self, slot: &TextureSlot, role: &str) -> Option<usize> {
        match self.ctx.texture(slot) {
            Ok(index) => Some(index),
            Err(e) => {
                let diagnostic = Diagnostic::error(
                    LogCode::TextureDropped,
                    vec![self.name.clone(), role.to_string(), e.to_string()],
                );
                self.report(diagnostic);
                None
            }
        }
    }

    fn transform(&mut self, slot: &TextureSlot) -> Option<TextureInfoExtensions> {
        let transform = slot.transform?;
        self.ctx.use_extension(Extension::TextureTransform, false);
        Some(TextureInfoExtensions {
            texture_transform: Some(transform),
        })
    }

    fn info(&mut self, slot: Option<&TextureSlot>, role: &str) -> Option<GltfTextureInfo> {
        let slot = slot?;
        let index = self.texture_index(slot, role)?;
        Some(GltfTextureInfo {
            index,
            tex_coord: slot.tex_coord,
            extensions: self.transform(slot),
        })
    }

    fn normal(&mut self, source: &SourceMaterial) -> Option<GltfNormalTextureInfo> {
        let slot = source.normal_texture.as_ref()?;
        let index = self.texture_index(slot, "normal")?;
        Some(GltfNormalTextureInfo {
            index,
            tex_coord: slot.tex_coord,
            scale: source.normal_scale,
            extensions: self.transform(slot),
        })
    }

    fn occlusion(&mut self, source: &SourceMaterial) -> Option<GltfOcclusionTextureInfo> {
        let slot = source.occlusion_texture.as_ref()?;
        let index = self.texture_index(slot, "occlusion")?;
        Some(GltfOcclusionTextureInfo {
            index,
            tex_coord: slot.tex_coord,
            strength: source.occlusion_strength,
            extensions: self.transform(slot),
        })
    }

    /// Fields every lit flavor shares.
    fn lit_base(&mut self, source: &SourceMaterial) -> GltfMaterial {
        GltfMaterial {
            name: source.name.clone(),
            pbr_metallic_roughness: None,
            normal_texture: self.normal(source),
            occlusion_texture: self.occlusion(source),
            emissive_texture: self.info(source.emissive_texture.as_ref(), "emissive"),
            emissive_factor: source.emissive_color,
            alpha_mode: source.alpha_mode,
            alpha_cutoff: source.alpha_cutoff,
            double_sided: source.double_sided,
            extensions: None,
        }
    }

    /// The orthogonal KHR blocks shared by every lit flavor.
    fn orthogonal_extensions(&mut self, source: &SourceMaterial, extensions: &mut MaterialExtensions) {
        if let Some(cc) = &source.clearcoat {
            self.ctx.use_extension(Extension::MaterialsClearcoat, false);
            let normal = cc.normal_texture.as_ref().and_then(|slot| {
                let index = self.texture_index(slot, "clearcoat normal")?;
                Some(GltfNormalTextureInfo {
                    index,
                    tex_coord: slot.tex_coord,
                    scale: 1.0,
                    extensions: self.transform(slot),
                })
            });
            extensions.clearcoat = Some(MaterialsClearcoat {
                clearcoat_factor: cc.factor,
                clearcoat_texture: self.info(cc.texture.as_ref(), "clearcoat"),
                clearcoat_roughness_factor: cc.roughness,
                clearcoat_roughness_texture: self.info(cc.roughness_texture.as_ref(), "clearcoat roughness"),
                clearcoat_normal_texture: normal,
            });
        }
        if let Some(sheen) = &source.sheen {
            self.ctx.use_extension(Extension::MaterialsSheen, false);
            extensions.sheen = Some(MaterialsSheen {
                sheen_color_factor: sheen.color,
                sheen_color_texture: self.info(sheen.color_texture.as_ref(), "sheen color"),
                sheen_roughness_factor: sheen.roughness,
                sheen_roughness_texture: self.info(sheen.roughness_texture.as_ref(), "sheen roughness"),
            });
        }
        if let Some(tr) = &source.transmission {
            self.ctx.use_extension(Extension::MaterialsTransmission, false);
            extensions.transmission = Some(MaterialsTransmission {
                transmission_factor: tr.factor,
                transmission_texture: self.info(tr.texture.as_ref(), "transmission"),
            });
        }
        if let Some(ior) = source.ior {
            self.ctx.use_extension(Extension::MaterialsIor, false);
            extensions.ior = Some(MaterialsIor { ior });
        }
        if let Some(spec) = &source.specular {
            self.ctx.use_extension(Extension::MaterialsSpecular, false);
            extensions.specular = Some(MaterialsSpecular {
                specular_factor: spec.factor,
                specular_texture: self.info(spec.texture.as_ref(), "specular"),
                specular_color_factor: spec.color,
                specular_color_texture: self.info(spec.color_texture.as_ref(), "specular color"),
            });
        }
    }

    fn finish(self, mut material: GltfMaterial, extensions: MaterialExtensions) -> MaterialExport {
        material.normalize_alpha_cutoff();
        if !extensions.is_empty() {
            material.extensions = Some(extensions);
        }
        MaterialExport {
            material,
            flawless: self.flawless,
        }
    }
}

/// Core glTF metallic-roughness with the orthogonal KHR extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetallicRoughnessExporter;

impl MaterialExporter for MetallicRoughnessExporter {
    fn flavor(&self) -> MaterialFlavor {
        MaterialFlavor::MetallicRoughness
    }

    fn export(&self, source: &SourceMaterial, ctx: &mut dyn MaterialContext) -> MaterialExport {
        let mut conv = Conversion::new(source, ctx);
        if source.specular_glossiness_texture.is_some() {
            conv.unsupported("specular-glossiness texture");
        }

        let mut material = conv.lit_base(source);
        material.pbr_metallic_roughness = Some(GltfPbrMetallicRoughness {
            base_color_factor: source.base_color,
            base_color_texture: conv.info(source.base_color_texture.as_ref(), "base color"),
            metallic_factor: source.metallic,
            roughness_factor: source.roughness,
            metallic_roughness_texture: conv.info(source.metallic_roughness_texture.as_ref(), "metallic roughness"),
        });

        let mut extensions = MaterialExtensions::default();
        conv.orthogonal_extensions(source, &mut extensions);
        conv.finish(material, extensions)
    }
}

/// `KHR_materials_pbrSpecularGlossiness` with a metallic-roughness fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecularGlossinessExporter;

impl MaterialExporter for SpecularGlossinessExporter {
    fn flavor(&self) -> MaterialFlavor {
        MaterialFlavor::SpecularGlossiness
    }

    fn export(&self, source: &SourceMaterial, ctx: &mut dyn MaterialContext) -> MaterialExport {
        let mut conv = Conversion::new(source, ctx);
        if source.metallic_roughness_texture.is_some() {
            conv.unsupported("metallic-roughness texture");
        }
        conv.ctx.use_extension(Extension::MaterialsPbrSpecularGlossiness, false);

        let mut material = conv.lit_base(source);
        let diffuse_texture = conv.info(source.base_color_texture.as_ref(), "diffuse");
        // fallback for viewers without the extension
        material.pbr_metallic_roughness = Some(GltfPbrMetallicRoughness {
            base_color_factor: source.base_color,
            base_color_texture: diffuse_texture.clone(),
            metallic_factor: 0.0,
            roughness_factor: 1.0 - source.glossiness,
            metallic_roughness_texture: None,
        });

        let mut extensions = MaterialExtensions {
            pbr_specular_glossiness: Some(PbrSpecularGlossiness {
                diffuse_factor: source.base_color,
                diffuse_texture,
                specular_factor: source.specular_color,
                glossiness_factor: source.glossiness,
                specular_glossiness_texture: conv
                    .info(source.specular_glossiness_texture.as_ref(), "specular glossiness"),
            }),
            ..MaterialExtensions::default()
        };
        conv.orthogonal_extensions(source, &mut extensions);
        conv.finish(material, extensions)
    }
}

/// `KHR_materials_unlit`: base color only.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlitExporter;

impl MaterialExporter for UnlitExporter {
    fn flavor(&self) -> MaterialFlavor {
        MaterialFlavor::Unlit
    }

    fn export(&self, source: &SourceMaterial, ctx: &mut dyn MaterialContext) -> MaterialExport {
        let mut conv = Conversion::new(source, ctx);
        let ignored = [
            (source.normal_texture.is_some(), "normal texture"),
            (source.occlusion_texture.is_some(), "occlusion texture"),
            (source.emissive_texture.is_some(), "emissive texture"),
            (source.clearcoat.is_some(), "clearcoat"),
            (source.sheen.is_some(), "sheen"),
            (source.transmission.is_some(), "transmission"),
            (source.specular.is_some(), "specular"),
        ];
        for (present, feature) in ignored {
            if present {
                conv.unsupported(feature);
            }
        }
        conv.ctx.use_extension(Extension::MaterialsUnlit, false);

        let material = GltfMaterial {
            name: source.name.clone(),
            pbr_metallic_roughness: Some(GltfPbrMetallicRoughness {
                base_color_factor: source.base_color,
                base_color_texture: conv.info(source.base_color_texture.as_ref(), "base color"),
                metallic_factor: 0.0,
                roughness_factor: 0.9,
                metallic_roughness_texture: None,
            }),
            alpha_mode: source.alpha_mode,
            alpha_cutoff: source.alpha_cutoff,
            double_sided: source.double_sided,
            ..GltfMaterial::default()
        };
        let extensions = MaterialExtensions {
            unlit: Some(MaterialsUnlit {}),
            ..MaterialExtensions::default()
        };
        conv.finish(material, extensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::images::SourceImage;
    use crate::material::ClearcoatParams;
    use crate::schema::{AlphaMode, TextureTransform};

    #[derive(Default)]
    struct RecordingContext {
        textures: usize,
        fail_textures: bool,
        extensions: Vec<(Extension, bool)>,
        diagnostics: Vec<Diagnostic>,
    }

    impl MaterialContext for RecordingContext {
        fn texture(&mut self, _slot: &TextureSlot) -> Result<usize> {
            if self.fail_textures {
                return Err(Error::BuilderClosed);
            }
            self.textures += 1;
            Ok(self.textures - 1)
        }

        fn use_extension(&mut self, extension: Extension, required: bool) {
            self.extensions.push((extension, required));
        }

        fn report(&mut self, diagnostic: Diagnostic) {
            self.diagnostics.push(diagnostic);
        }
    }

    fn slot() -> TextureSlot {
        let image = SourceImage::rgba8(None, 1, 1, vec![255; 4]).unwrap();
        TextureSlot::new(Arc::new(image))
    }

    #[test]
    fn test_metallic_roughness_fields() {
        let mut source = SourceMaterial::named("metal", MaterialFlavor::MetallicRoughness);
        source.base_color = [0.5, 0.5, 0.5, 1.0];
        source.metallic = 0.2;
        source.base_color_texture = Some(slot());
        source.clearcoat = Some(ClearcoatParams {
            factor: 1.0,
            ..Default::default()
        });
        let mut ctx = RecordingContext::default();
        let out = MetallicRoughnessExporter.export(&source, &mut ctx);
        assert!(out.flawless);
        let pbr = out.material.pbr_metallic_roughness.unwrap();
        assert_eq!(pbr.metallic_factor, 0.2);
        assert_eq!(pbr.base_color_texture.unwrap().index, 0);
        assert!(out.material.extensions.unwrap().clearcoat.is_some());
        assert_eq!(ctx.extensions, vec![(Extension::MaterialsClearcoat, false)]);
    }

    #[test]
    fn test_texture_transform_registers_extension() {
        let mut source = SourceMaterial::default();
        let mut with_transform = slot();
        with_transform.transform = Some(TextureTransform {
            scale: [2.0, 2.0],
            ..Default::default()
        });
        source.emissive_texture = Some(with_transform);
        let mut ctx = RecordingContext::default();
        let out = MetallicRoughnessExporter.export(&source, &mut ctx);
        let emissive = out.material.emissive_texture.unwrap();
        assert!(emissive.extensions.unwrap().texture_transform.is_some());
        assert!(ctx.extensions.contains(&(Extension::TextureTransform, false)));
    }

    #[test]
    fn test_alpha_cutoff_kept_only_under_mask() {
        let mut source = SourceMaterial::default();
        source.alpha_cutoff = 0.3;
        let mut ctx = RecordingContext::default();
        let opaque = MetallicRoughnessExporter.export(&source, &mut ctx);
        assert_eq!(opaque.material.alpha_cutoff, 0.5);
        let unlit = UnlitExporter.export(&source, &mut ctx);
        assert_eq!(unlit.material.alpha_cutoff, 0.5);

        source.alpha_mode = AlphaMode::Mask;
        let masked = MetallicRoughnessExporter.export(&source, &mut ctx);
        assert_eq!(masked.material.alpha_cutoff, 0.3);
    }

    #[test]
    fn test_failed_texture_is_dropped_not_fatal() {
        let mut source = SourceMaterial::default();
        source.base_color_texture = Some(slot());
        let mut ctx = RecordingContext {
            fail_textures: true,
            ..Default::default()
        };
        let out = MetallicRoughnessExporter.export(&source, &mut ctx);
        assert!(!out.flawless);
        assert!(out.material.pbr_metallic_roughness.unwrap().base_color_texture.is_none());
        assert_eq!(ctx.diagnostics[0].code, LogCode::TextureDropped);
    }

    #[test]
    fn test_unlit_drops_lighting_inputs() {
        let mut source = SourceMaterial::named("flat", MaterialFlavor::Unlit);
        source.normal_texture = Some(slot());
        let mut ctx = RecordingContext::default();
        let out = UnlitExporter.export(&source, &mut ctx);
        assert!(!out.flawless);
        assert!(out.material.normal_texture.is_none());
        assert!(out.material.extensions.unwrap().unlit.is_some());
        assert_eq!(ctx.textures, 0);
    }

    #[test]
    fn test_specular_glossiness_fallback() {
        let mut source = SourceMaterial::named("gloss", MaterialFlavor::SpecularGlossiness);
        source.glossiness = 0.25;
        let mut ctx = RecordingContext::default();
        let out = SpecularGlossinessExporter.export(&source, &mut ctx);
        let pbr = out.material.pbr_metallic_roughness.unwrap();
        assert_eq!(pbr.roughness_factor, 0.75);
        let sg = out.material.extensions.unwrap().pbr_specular_glossiness.unwrap();
        assert_eq!(sg.glossiness_factor, 0.25);
    }

    #[test]
    fn test_default_registry_covers_every_flavor() {
        let registry = MaterialExporterRegistry::default();
        for flavor in [
            MaterialFlavor::MetallicRoughness,
            MaterialFlavor::SpecularGlossiness,
            MaterialFlavor::Unlit,
        ] {
            assert_eq!(registry.get(flavor).unwrap().flavor(), flavor);
        }
        assert!(MaterialExporterRegistry::empty().get(MaterialFlavor::Unlit).is_none());
    }
}
