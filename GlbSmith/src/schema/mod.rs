//! glTF 2.0 document model.
//!
//! Plain records mirroring the glTF JSON schema. Every record derives
//! [`serde::Deserialize`] for the read path and implements
//! [`GltfSerialize`](crate::json::GltfSerialize) for the streaming write path,
//! which omits absent optionals and schema defaults.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

mod accessor;
mod camera;
mod extensions;
mod light;
mod material;
mod mesh;
mod node;
mod root;
mod skin;
mod texture;
mod validate;

pub use accessor::{GltfAccessor, GltfBuffer, GltfBufferView, GltfSparse, GltfSparseIndices, GltfSparseValues};
pub use camera::{CameraType, GltfCamera, GltfOrthographic, GltfPerspective};
pub use extensions::Extension;
pub use light::{GltfLight, GltfSpot, LightType, LightsPunctual, NodeLight};
pub use material::{
    AlphaMode, GltfMaterial, GltfNormalTextureInfo, GltfOcclusionTextureInfo,
    GltfPbrMetallicRoughness, GltfTextureInfo, MaterialExtensions, MaterialsClearcoat,
    MaterialsIor, MaterialsSheen, MaterialsSpecular, MaterialsTransmission, MaterialsUnlit,
    PbrSpecularGlossiness, TextureInfoExtensions, TextureTransform,
};
pub use mesh::{
    DracoMeshCompression, DrawMode, GltfMesh, GltfPrimitive, PrimitiveExtensions,
    PrimitiveVariants, VariantMapping, attribute,
};
pub use node::{GltfNode, NodeExtensions};
pub use root::{GltfAsset, GltfDocument, GltfScene, MaterialVariant, MaterialsVariants, RootExtensions};
pub use skin::GltfSkin;
pub use texture::{GltfImage, GltfSampler, GltfTexture, MagFilter, MinFilter, WrapMode};

// serde default helpers shared by the schema records
const fn one() -> f32 {
    1.0
}

const fn ones3() -> [f32; 3] {
    [1.0; 3]
}

const fn ones4() -> [f32; 4] {
    [1.0; 4]
}
