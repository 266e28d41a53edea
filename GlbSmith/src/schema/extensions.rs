//! Known glTF extension identifiers.

use std::fmt;

/// Extensions the codec can register in `extensionsUsed` / `extensionsRequired`.
///
/// Draco and meshopt only have data slots here; the codec never encodes or
/// decodes their payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Extension {
    MaterialsUnlit,
    MaterialsPbrSpecularGlossiness,
    MaterialsClearcoat,
    MaterialsSheen,
    MaterialsTransmission,
    MaterialsIor,
    MaterialsSpecular,
    MaterialsVariants,
    TextureTransform,
    LightsPunctual,
    DracoMeshCompression,
    MeshoptCompression,
}

impl Extension {
    pub const ALL: [Self; 12] = [
        Self::MaterialsUnlit,
        Self::MaterialsPbrSpecularGlossiness,
        Self::MaterialsClearcoat,
        Self::MaterialsSheen,
        Self::MaterialsTransmission,
        Self::MaterialsIor,
        Self::MaterialsSpecular,
        Self::MaterialsVariants,
        Self::TextureTransform,
        Self::LightsPunctual,
        Self::DracoMeshCompression,
        Self::MeshoptCompression,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MaterialsUnlit => "KHR_materials_unlit",
            Self::MaterialsPbrSpecularGlossiness => "KHR_materials_pbrSpecularGlossiness",
            Self::MaterialsClearcoat => "KHR_materials_clearcoat",
            Self::MaterialsSheen => "KHR_materials_sheen",
            Self::MaterialsTransmission => "KHR_materials_transmission",
            Self::MaterialsIor => "KHR_materials_ior",
            Self::MaterialsSpecular => "KHR_materials_specular",
            Self::MaterialsVariants => "KHR_materials_variants",
            Self::TextureTransform => "KHR_texture_transform",
            Self::LightsPunctual => "KHR_lights_punctual",
            Self::DracoMeshCompression => "KHR_draco_mesh_compression",
            Self::MeshoptCompression => "EXT_meshopt_compression",
        }
    }

    /// Look up an extension by its JSON name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ext| ext.name() == name)
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
