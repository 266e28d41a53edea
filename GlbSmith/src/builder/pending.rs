//! Builder-side collections gathered before the bake.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::error::{Error, Result};
use crate::images::{ImageExport, ImageFormat};
use crate::logger::{CodeLogger, Diagnostic};
use crate::material::{FilterMode, MaterialContext, SamplerSettings, SourceMaterial, TextureSlot};
use crate::mesh::MeshData;
use crate::schema::{
    Extension, GltfCamera, GltfLight, GltfMaterial, GltfNode, GltfSampler, GltfScene, GltfTexture,
    MagFilter, MaterialVariant, MinFilter, NodeExtensions, NodeLight, VariantMapping,
};

/// Which materials a node renders its mesh with, one slot per submesh.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MaterialAssignment {
    pub materials: Vec<Option<usize>>,
    /// `KHR_materials_variants` mappings, indexed by submesh.
    pub variants: Vec<Vec<VariantMapping>>,
}

impl MaterialAssignment {
    #[must_use]
    pub fn new(materials: Vec<Option<usize>>) -> Self {
        Self {
            materials,
            variants: Vec::new(),
        }
    }

    /// Add a variant mapping to the primitive built from `submesh`.
    #[must_use]
    pub fn with_variant(mut self, submesh: usize, mapping: VariantMapping) -> Self {
        if self.variants.len() <= submesh {
            self.variants.resize(submesh + 1, Vec::new());
        }
        self.variants[submesh].push(mapping);
        self
    }
}

/// Host-side node description; transforms are in the host's left-handed space.
#[derive(Debug, Clone, Default)]
pub struct NodeDescriptor {
    pub name: Option<String>,
    pub translation: Option<Vec3>,
    pub rotation: Option<Quat>,
    pub scale: Option<Vec3>,
    pub children: Vec<usize>,
    pub camera: Option<usize>,
    pub light: Option<usize>,
    pub skin: Option<usize>,
}

impl NodeDescriptor {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Skin bind pose; inverse bind matrices are in host space.
#[derive(Debug, Clone, Default)]
pub struct SkinData {
    pub name: Option<String>,
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Vec<Mat4>,
    pub skeleton: Option<usize>,
}

/// Index of an added object, plus whether it converted without problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    pub index: usize,
    pub flawless: bool,
}

#[derive(Debug, Clone)]
pub(super) struct NodeMesh {
    pub node: usize,
    pub mesh: usize,
    pub assignment: MaterialAssignment,
}

/// Mirror a host transform into glTF space, dropping identity components.
pub(super) fn convert_node(descriptor: &NodeDescriptor) -> GltfNode {
    let translation = descriptor
        .translation
        .filter(|t| *t != Vec3::ZERO)
        .map(|t| [-t.x, t.y, t.z]);
    let rotation = descriptor
        .rotation
        .filter(|r| *r != Quat::IDENTITY)
        .map(|r| [r.x, -r.y, -r.z, r.w]);
    let scale = descriptor.scale.filter(|s| *s != Vec3::ONE).map(|s| s.to_array());

    GltfNode {
        name: descriptor.name.clone(),
        children: descriptor.children.clone(),
        skin: descriptor.skin,
        camera: descriptor.camera,
        translation,
        rotation,
        scale,
        extensions: descriptor.light.map(|light| NodeExtensions {
            lights_punctual: Some(NodeLight { light }),
        }),
        ..GltfNode::default()
    }
}

/// `None` for the default `Bilinear + Repeat/Repeat`, which needs no sampler.
pub(super) fn convert_sampler(settings: SamplerSettings) -> Option<GltfSampler> {
    if settings == SamplerSettings::default() {
        return None;
    }
    let (mag_filter, min_filter) = match settings.filter {
        FilterMode::Point => (MagFilter::Nearest, MinFilter::Nearest),
        FilterMode::Bilinear => (MagFilter::Linear, MinFilter::LinearMipmapNearest),
        FilterMode::Trilinear => (MagFilter::Linear, MinFilter::LinearMipmapLinear),
    };
    Some(GltfSampler {
        mag_filter: Some(mag_filter),
        min_filter: Some(min_filter),
        wrap_s: settings.wrap_u,
        wrap_t: settings.wrap_v,
        name: None,
    })
}

fn arc_key<T>(value: &Arc<T>) -> usize {
    Arc::as_ptr(value) as usize
}

#[derive(Default)]
pub(super) struct Pending {
    pub nodes: Vec<GltfNode>,
    pub node_meshes: Vec<NodeMesh>,

    // the Arcs pin the addresses used as identity keys
    pub meshes: Vec<Arc<MeshData>>,
    mesh_ids: HashMap<usize, usize>,
    material_ids: HashMap<usize, (Arc<SourceMaterial>, AddOutcome)>,
    pub materials: Vec<GltfMaterial>,

    pub images: Vec<ImageExport>,
    image_ids: HashMap<ImageExport, usize>,
    pub samplers: Vec<GltfSampler>,
    sampler_ids: HashMap<GltfSampler, usize>,
    pub textures: Vec<GltfTexture>,
    texture_ids: HashMap<(usize, Option<usize>), usize>,

    pub cameras: Vec<GltfCamera>,
    pub lights: Vec<GltfLight>,
    pub skins: Vec<SkinData>,
    pub scenes: Vec<GltfScene>,
    pub variants: Vec<MaterialVariant>,

    pub extensions_used: BTreeSet<Extension>,
    pub extensions_required: BTreeSet<Extension>,
}

impl Pending {
    pub fn check_index(kind: &'static str, index: usize, len: usize) -> Result<()> {
        if index < len {
            Ok(())
        } else {
            Err(Error::InvalidIndex { kind, index, len })
        }
    }

    pub fn register_extension(&mut self, extension: Extension, required: bool) {
        self.extensions_used.insert(extension);
        if required {
            self.extensions_required.insert(extension);
        }
    }

    pub fn add_mesh(&mut self, mesh: &Arc<MeshData>) -> usize {
        let next = self.meshes.len();
        let index = *self.mesh_ids.entry(arc_key(mesh)).or_insert(next);
        if index == next {
            self.meshes.push(Arc::clone(mesh));
        }
        index
    }

    pub fn material_outcome(&self, material: &Arc<SourceMaterial>) -> Option<AddOutcome> {
        self.material_ids.get(&arc_key(material)).map(|(_, outcome)| *outcome)
    }

    pub fn push_material(&mut self, source: &Arc<SourceMaterial>, material: GltfMaterial, flawless: bool) -> AddOutcome {
        let outcome = AddOutcome {
            index: self.materials.len(),
            flawless,
        };
        self.materials.push(material);
        self.material_ids.insert(arc_key(source), (Arc::clone(source), outcome));
        outcome
    }

    pub fn add_image(&mut self, image: ImageExport) -> usize {
        if let Some(&index) = self.image_ids.get(&image) {
            return index;
        }
        let index = self.images.len();
        self.image_ids.insert(image.clone(), index);
        self.images.push(image);
        index
    }

    pub fn add_sampler(&mut self, settings: SamplerSettings) -> Option<usize> {
        let sampler = convert_sampler(settings)?;
        let next = self.samplers.len();
        let index = *self.sampler_ids.entry(sampler.clone()).or_insert(next);
        if index == next {
            self.samplers.push(sampler);
        }
        Some(index)
    }

    pub fn add_texture(&mut self, image: usize, sampler: Option<usize>) -> Result<usize> {
        Self::check_index("images", image, self.images.len())?;
        if let Some(sampler) = sampler {
            Self::check_index("samplers", sampler, self.samplers.len())?;
        }
        let next = self.textures.len();
        let index = *self.texture_ids.entry((image, sampler)).or_insert(next);
        if index == next {
            self.textures.push(GltfTexture {
                sampler,
                source: Some(image),
                name: None,
            });
        }
        Ok(index)
    }
}

/// [`MaterialContext`] that feeds textures straight into the pending collections.
pub(super) struct PendingContext<'a> {
    pub pending: &'a mut Pending,
    pub logger: Option<&'a dyn CodeLogger>,
    pub default_format: ImageFormat,
}

impl MaterialContext for PendingContext<'_> {
    fn texture(&mut self, slot: &TextureSlot) -> Result<usize> {
        let format = match slot.format {
            ImageFormat::Unknown => self.default_format,
            explicit => explicit,
        };
        let image = self.pending.add_image(ImageExport::new(Arc::clone(&slot.image), format));
        let sampler = self.pending.add_sampler(slot.sampler);
        self.pending.add_texture(image, sampler)
    }

    fn use_extension(&mut self, extension: Extension, required: bool) {
        self.pending.register_extension(extension, required);
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit(self.logger);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::WrapMode;

    #[test]
    fn test_node_identity_components_omitted() {
        let node = convert_node(&NodeDescriptor {
            translation: Some(Vec3::new(1.0, 2.0, 3.0)),
            rotation: Some(Quat::IDENTITY),
            scale: Some(Vec3::ONE),
            ..NodeDescriptor::default()
        });
        assert_eq!(node.translation, Some([-1.0, 2.0, 3.0]));
        assert_eq!(node.rotation, None);
        assert_eq!(node.scale, None);
    }

    #[test]
    fn test_node_rotation_mirrored() {
        let q = Quat::from_xyzw(0.1, 0.2, 0.3, 0.927_362);
        let node = convert_node(&NodeDescriptor {
            rotation: Some(q),
            ..NodeDescriptor::default()
        });
        assert_eq!(node.rotation, Some([0.1, -0.2, -0.3, 0.927_362]));
    }

    #[test]
    fn test_sampler_mapping() {
        assert_eq!(convert_sampler(SamplerSettings::default()), None);
        let point = convert_sampler(SamplerSettings {
            filter: FilterMode::Point,
            ..SamplerSettings::default()
        })
        .unwrap();
        assert_eq!(point.mag_filter, Some(MagFilter::Nearest));
        assert_eq!(point.min_filter, Some(MinFilter::Nearest));

        let clamped = convert_sampler(SamplerSettings {
            wrap_u: WrapMode::ClampToEdge,
            ..SamplerSettings::default()
        })
        .unwrap();
        assert_eq!(clamped.min_filter, Some(MinFilter::LinearMipmapNearest));
        assert_eq!(clamped.wrap_s, WrapMode::ClampToEdge);
        assert_eq!(clamped.wrap_t, WrapMode::Repeat);
    }

    #[test]
    fn test_sampler_and_texture_dedup() {
        let mut pending = Pending::default();
        let trilinear = SamplerSettings {
            filter: FilterMode::Trilinear,
            ..SamplerSettings::default()
        };
        assert_eq!(pending.add_sampler(trilinear), Some(0));
        assert_eq!(pending.add_sampler(trilinear), Some(0));
        assert_eq!(pending.add_sampler(SamplerSettings::default()), None);
        assert_eq!(pending.samplers.len(), 1);

        assert!(pending.add_texture(0, None).is_err());
        let image = Arc::new(crate::images::SourceImage::rgba8(None, 1, 1, vec![0; 4]).unwrap());
        let index = pending.add_image(ImageExport::new(Arc::clone(&image), ImageFormat::Png));
        assert_eq!(pending.add_image(ImageExport::new(Arc::clone(&image), ImageFormat::Png)), index);
        assert_ne!(pending.add_image(ImageExport::new(image, ImageFormat::Jpg)), index);
        assert_eq!(pending.add_texture(0, Some(0)).unwrap(), 0);
        assert_eq!(pending.add_texture(0, Some(0)).unwrap(), 0);
        assert_eq!(pending.add_texture(0, None).unwrap(), 1);
    }

    #[test]
    fn test_required_extension_implies_used() {
        let mut pending = Pending::default();
        pending.register_extension(Extension::TextureTransform, true);
        pending.register_extension(Extension::TextureTransform, false);
        assert!(pending.extensions_required.contains(&Extension::TextureTransform));
        assert!(pending.extensions_used.contains(&Extension::TextureTransform));
    }
}
