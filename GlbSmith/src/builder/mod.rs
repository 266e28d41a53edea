//! Document builder: collects scene content, bakes it into a glTF document
//! and saves it as `.glb`, or as `.gltf` with sibling files.
//!
//! ```no_run
//! use std::sync::Arc;
//! use glbsmith::prelude::*;
//!
//! let mut builder = DocumentBuilder::new(ExportSettings::default());
//! let mesh = Arc::new(MeshData::default());
//! let node = builder.add_node(NodeDescriptor::named("root"))?;
//! builder.add_mesh_to_node(node, &mesh, MaterialAssignment::default())?;
//! builder.save_to_file("scene.glb")?;
//! # Ok::<(), glbsmith::Error>(())
//! ```
//!
//! The builder moves through `Building -> Baked -> Closed` and never back.
//! Content can only be added while building; a save closes the builder
//! whether it succeeds or not.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

mod bake;
mod pending;
mod save;

use std::sync::Arc;

pub use pending::{AddOutcome, MaterialAssignment, NodeDescriptor, SkinData};
pub use save::buffer_data_uri;

use crate::buffer::BufferData;
use crate::deferral::{CancellationToken, DeferAgent, UninterruptedDeferAgent};
use crate::error::{Error, Result};
use crate::images::{ImageEncoder, ImageExport, RasterImageEncoder};
use crate::logger::{CodeLogger, Diagnostic, LogCode};
use crate::material::{
    MaterialExporter, MaterialExporterRegistry, MetallicRoughnessExporter, SamplerSettings, SourceMaterial,
};
use crate::mesh::MeshData;
use crate::schema::{Extension, GltfCamera, GltfDocument, GltfLight, GltfScene, MaterialVariant};
use crate::settings::ExportSettings;
use pending::{NodeMesh, Pending, PendingContext, convert_node};

/// Output of a bake, kept until the builder is saved.
pub(crate) struct BakedDocument {
    pub document: GltfDocument,
    pub buffer: BufferData,
}

enum BuilderState {
    Building(Box<Pending>),
    Baked(Box<BakedDocument>),
    Closed,
}

/// Collects scene content and writes it out as glTF.
pub struct DocumentBuilder {
    settings: ExportSettings,
    logger: Option<Arc<dyn CodeLogger>>,
    registry: MaterialExporterRegistry,
    encoder: Arc<dyn ImageEncoder>,
    defer_agent: Box<dyn DeferAgent>,
    cancellation: CancellationToken,
    flawless: bool,
    state: BuilderState,
}

fn building(state: &mut BuilderState) -> Result<&mut Pending> {
    match state {
        BuilderState::Building(pending) => Ok(pending),
        BuilderState::Baked(_) => Err(Error::BuilderBaked),
        BuilderState::Closed => Err(Error::BuilderClosed),
    }
}

impl DocumentBuilder {
    #[must_use]
    pub fn new(settings: ExportSettings) -> Self {
        let encoder = RasterImageEncoder::new(settings.jpeg_quality);
        Self {
            settings,
            logger: None,
            registry: MaterialExporterRegistry::default(),
            encoder: Arc::new(encoder),
            defer_agent: Box::new(UninterruptedDeferAgent),
            cancellation: CancellationToken::new(),
            flawless: true,
            state: BuilderState::Building(Box::default()),
        }
    }

    /// Send coded diagnostics to `logger`. Without one they are discarded.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn CodeLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: MaterialExporterRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_encoder(mut self, encoder: Arc<dyn ImageEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    #[must_use]
    pub fn with_defer_agent(mut self, agent: Box<dyn DeferAgent>) -> Self {
        self.defer_agent = agent;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Token that aborts the bake or save at its next breakpoint.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// `false` once any warning or error was reported for this export.
    #[must_use]
    pub fn is_flawless(&self) -> bool {
        self.flawless
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self.state, BuilderState::Closed)
    }

    /// The baked document, once [`Self::bake`] has run.
    #[must_use]
    pub fn document(&self) -> Option<&GltfDocument> {
        match &self.state {
            BuilderState::Baked(baked) => Some(&baked.document),
            _ => None,
        }
    }

    fn report(&mut self, diagnostic: &Diagnostic) {
        if diagnostic.severity >= crate::logger::Severity::Warning {
            self.flawless = false;
        }
        diagnostic.emit(self.logger.as_deref());
    }

    pub fn add_node(&mut self, descriptor: NodeDescriptor) -> Result<usize> {
        let pending = building(&mut self.state)?;
        if let Some(light) = descriptor.light {
            Pending::check_index("lights", light, pending.lights.len())?;
        }
        if let Some(camera) = descriptor.camera {
            Pending::check_index("cameras", camera, pending.cameras.len())?;
        }
        pending.nodes.push(convert_node(&descriptor));
        Ok(pending.nodes.len() - 1)
    }

    /// Add `mesh`, or return its index if this exact mesh was added before.
    pub fn add_mesh(&mut self, mesh: &Arc<MeshData>) -> Result<usize> {
        Ok(building(&mut self.state)?.add_mesh(mesh))
    }

    /// Render `mesh` at `node` with the given material slots.
    ///
    /// Nodes sharing a mesh with different assignments get their own mesh
    /// records at bake time; the geometry itself is written once.
    pub fn add_mesh_to_node(&mut self, node: usize, mesh: &Arc<MeshData>, assignment: MaterialAssignment) -> Result<usize> {
        let pending = building(&mut self.state)?;
        Pending::check_index("nodes", node, pending.nodes.len())?;
        for material in assignment.materials.iter().flatten() {
            Pending::check_index("materials", *material, pending.materials.len())?;
        }
        for mapping in assignment.variants.iter().flatten() {
            Pending::check_index("materials", mapping.material, pending.materials.len())?;
            for &variant in &mapping.variants {
                Pending::check_index("variants", variant, pending.variants.len())?;
            }
        }
        if !assignment.variants.is_empty() {
            pending.register_extension(Extension::MaterialsVariants, false);
        }

        let submeshes = mesh.submeshes.len();
        let extra = (assignment.materials.len() > submeshes).then(|| {
            Diagnostic::warning(
                LogCode::ExtraMaterialSlots,
                vec![
                    mesh.name.clone().unwrap_or_default(),
                    assignment.materials.len().to_string(),
                    submeshes.to_string(),
                ],
            )
        });

        let mesh = pending.add_mesh(mesh);
        pending.node_meshes.push(NodeMesh { node, mesh, assignment });
        if let Some(diagnostic) = extra {
            self.report(&diagnostic);
        }
        Ok(mesh)
    }

    /// Convert `material` with the exporter registered for its flavor.
    ///
    /// Adding the same material twice returns the first outcome. A missing
    /// exporter falls back to metallic-roughness and marks the outcome flawed.
    pub fn add_material(&mut self, material: &Arc<SourceMaterial>) -> Result<AddOutcome> {
        if let Some(outcome) = building(&mut self.state)?.material_outcome(material) {
            return Ok(outcome);
        }
        match self.registry.get(material.flavor).cloned() {
            Some(exporter) => self.add_material_with(material, exporter.as_ref()),
            None => {
                self.report(&Diagnostic::error(
                    LogCode::MissingMaterialExporter,
                    vec![material.name.clone().unwrap_or_default(), format!("{:?}", material.flavor)],
                ));
                self.export_material(material, &MetallicRoughnessExporter, false)
            }
        }
    }

    /// Convert `material` with an explicit exporter.
    pub fn add_material_with(&mut self, material: &Arc<SourceMaterial>, exporter: &dyn MaterialExporter) -> Result<AddOutcome> {
        self.export_material(material, exporter, true)
    }

    fn export_material(
        &mut self,
        material: &Arc<SourceMaterial>,
        exporter: &dyn MaterialExporter,
        mut flawless: bool,
    ) -> Result<AddOutcome> {
        let default_format = self.settings.image_format;
        let pending = building(&mut self.state)?;
        if let Some(outcome) = pending.material_outcome(material) {
            return Ok(outcome);
        }
        let mut ctx = PendingContext {
            pending,
            logger: self.logger.as_deref(),
            default_format,
        };
        let export = exporter.export(material, &mut ctx);
        flawless &= export.flawless;
        let outcome = ctx.pending.push_material(material, export.material, flawless);
        self.flawless &= flawless;
        Ok(outcome)
    }

    /// Add an image, deduplicated by source image and format. Encoding happens at bake.
    pub fn add_image(&mut self, image: ImageExport) -> Result<usize> {
        Ok(building(&mut self.state)?.add_image(image))
    }

    /// Returns `None` when the settings match the implicit default sampler.
    pub fn add_sampler(&mut self, settings: SamplerSettings) -> Result<Option<usize>> {
        Ok(building(&mut self.state)?.add_sampler(settings))
    }

    pub fn add_texture(&mut self, image: usize, sampler: Option<usize>) -> Result<usize> {
        building(&mut self.state)?.add_texture(image, sampler)
    }

    pub fn add_camera(&mut self, camera: GltfCamera) -> Result<usize> {
        let pending = building(&mut self.state)?;
        pending.cameras.push(camera);
        Ok(pending.cameras.len() - 1)
    }

    /// Add a `KHR_lights_punctual` light; attach it through [`NodeDescriptor::light`].
    pub fn add_light(&mut self, light: GltfLight) -> Result<usize> {
        let pending = building(&mut self.state)?;
        pending.register_extension(Extension::LightsPunctual, false);
        pending.lights.push(light);
        Ok(pending.lights.len() - 1)
    }

    pub fn add_skin(&mut self, skin: SkinData) -> Result<usize> {
        let pending = building(&mut self.state)?;
        pending.skins.push(skin);
        Ok(pending.skins.len() - 1)
    }

    /// Without any explicit scene, bake adds one holding every root node.
    pub fn add_scene(&mut self, name: Option<String>, nodes: Vec<usize>) -> Result<usize> {
        let pending = building(&mut self.state)?;
        for &node in &nodes {
            Pending::check_index("nodes", node, pending.nodes.len())?;
        }
        pending.scenes.push(GltfScene { name, nodes });
        Ok(pending.scenes.len() - 1)
    }

    pub fn add_material_variant(&mut self, name: impl Into<String>) -> Result<usize> {
        let pending = building(&mut self.state)?;
        pending.register_extension(Extension::MaterialsVariants, false);
        pending.variants.push(MaterialVariant { name: name.into() });
        Ok(pending.variants.len() - 1)
    }

    /// Record extension usage. A required extension is never downgraded.
    pub fn register_extension_usage(&mut self, extension: Extension, required: bool) -> Result<()> {
        building(&mut self.state)?.register_extension(extension, required);
        Ok(())
    }

    /// Bake all content into an in-memory document.
    ///
    /// Baking twice is a no-op.
    pub fn bake(&mut self) -> Result<&GltfDocument> {
        if let BuilderState::Building(_) = self.state {
            // a failed bake leaves the builder closed
            let baked = self.bake_with(bake::BakeTarget::Memory)?;
            self.state = BuilderState::Baked(Box::new(baked));
        }
        match &self.state {
            BuilderState::Baked(baked) => Ok(&baked.document),
            _ => Err(Error::BuilderClosed),
        }
    }

    /// Close the builder, releasing everything it holds.
    pub fn close(&mut self) {
        self.state = BuilderState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::CollectingLogger;
    use crate::material::MaterialFlavor;

    #[test]
    fn test_add_after_bake_and_close() {
        let mut builder = DocumentBuilder::new(ExportSettings::default());
        builder.add_node(NodeDescriptor::named("a")).unwrap();
        builder.bake().unwrap();
        assert!(matches!(builder.add_node(NodeDescriptor::default()), Err(Error::BuilderBaked)));
        builder.close();
        let camera = GltfCamera::perspective(crate::schema::GltfPerspective {
            aspect_ratio: None,
            yfov: 1.0,
            zfar: None,
            znear: 0.1,
        });
        assert!(matches!(builder.add_camera(camera), Err(Error::BuilderClosed)));
        assert!(builder.bake().is_err());
    }

    #[test]
    fn test_material_dedup_by_identity() {
        let mut builder = DocumentBuilder::new(ExportSettings::default());
        let a = Arc::new(SourceMaterial::named("a", MaterialFlavor::MetallicRoughness));
        let b = Arc::new(SourceMaterial::named("a", MaterialFlavor::MetallicRoughness));
        let first = builder.add_material(&a).unwrap();
        assert_eq!(builder.add_material(&a).unwrap(), first);
        assert_ne!(builder.add_material(&b).unwrap().index, first.index);
    }

    #[test]
    fn test_missing_exporter_falls_back() {
        let logger = Arc::new(CollectingLogger::new());
        let mut builder = DocumentBuilder::new(ExportSettings::default())
            .with_registry(MaterialExporterRegistry::empty())
            .with_logger(logger.clone());
        let material = Arc::new(SourceMaterial::named("m", MaterialFlavor::Unlit));
        let outcome = builder.add_material(&material).unwrap();
        assert!(!outcome.flawless);
        assert!(!builder.is_flawless());
        assert!(logger.contains(LogCode::MissingMaterialExporter));
    }

    #[test]
    fn test_mesh_to_unknown_node_rejected() {
        let mut builder = DocumentBuilder::new(ExportSettings::default());
        let mesh = Arc::new(MeshData::default());
        assert!(matches!(
            builder.add_mesh_to_node(3, &mesh, MaterialAssignment::default()),
            Err(Error::InvalidIndex { kind: "nodes", .. })
        ));
    }

    #[test]
    fn test_extra_material_slots_reported() {
        let logger = Arc::new(CollectingLogger::new());
        let mut builder = DocumentBuilder::new(ExportSettings::default()).with_logger(logger.clone());
        let material = builder
            .add_material(&Arc::new(SourceMaterial::default()))
            .unwrap()
            .index;
        let node = builder.add_node(NodeDescriptor::default()).unwrap();
        let mesh = Arc::new(MeshData::default());
        builder
            .add_mesh_to_node(node, &mesh, MaterialAssignment::new(vec![Some(material)]))
            .unwrap();
        assert!(logger.contains(LogCode::ExtraMaterialSlots));
    }
}
