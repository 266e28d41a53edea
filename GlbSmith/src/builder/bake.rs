//! Bake pass: pending collections to an immutable document.

use std::collections::HashMap;

use byteorder::{LittleEndian, WriteBytesExt};
use rayon::prelude::*;

use super::pending::{MaterialAssignment, Pending, SkinData};
use super::save::OutputFiles;
use super::{BakedDocument, BuilderState, DocumentBuilder};
use crate::buffer::{BufferData, BufferWriter};
use crate::error::{Error, Result};
use crate::images::EncodedImage;
use crate::layout::{AccessorType, ComponentType};
use crate::logger::{Diagnostic, LogCode};
use crate::mesh::{BakedMesh, ConvertedMesh, convert_mesh, reflect_matrix_x, write_converted_mesh};
use crate::schema::{
    GltfAccessor, GltfAsset, GltfBuffer, GltfDocument, GltfImage, GltfMesh, GltfNode, GltfScene, GltfSkin,
    LightsPunctual, MaterialsVariants, PrimitiveExtensions, PrimitiveVariants, RootExtensions,
};

/// Where buffer and image bytes go during a bake.
pub(super) enum BakeTarget<'a> {
    /// Single in-memory buffer; images become buffer views.
    Memory,
    /// A `.bin` file and image files next to the document.
    Files { files: &'a mut OutputFiles, stem: &'a str },
}

/// Primitive records for `mesh` rendered with `assignment`.
fn assign_materials(mesh: &BakedMesh, assignment: &MaterialAssignment) -> GltfMesh {
    let mut gltf = mesh.to_gltf(&assignment.materials);
    for (primitive, baked) in gltf.primitives.iter_mut().zip(&mesh.primitives) {
        if let Some(mappings) = assignment.variants.get(baked.submesh).filter(|m| !m.is_empty()) {
            primitive.extensions = Some(PrimitiveExtensions {
                variants: Some(PrimitiveVariants {
                    mappings: mappings.clone(),
                }),
                ..PrimitiveExtensions::default()
            });
        }
    }
    gltf
}

/// Nodes that are nobody's child, in index order.
fn root_nodes(nodes: &[GltfNode]) -> Vec<usize> {
    let mut is_child = vec![false; nodes.len()];
    for child in nodes.iter().flat_map(|n| &n.children) {
        if let Some(flag) = is_child.get_mut(*child) {
            *flag = true;
        }
    }
    (0..nodes.len()).filter(|&i| !is_child[i]).collect()
}

fn file_stem_for(name: Option<&str>, index: usize) -> String {
    let cleaned: String = name
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        format!("image_{index}")
    } else {
        cleaned
    }
}

fn write_skin(skin: &SkinData, buffer: &mut BufferWriter, accessors: &mut Vec<GltfAccessor>) -> Result<GltfSkin> {
    let inverse_bind_matrices = if skin.inverse_bind_matrices.is_empty() {
        None
    } else {
        let mut bytes = Vec::with_capacity(skin.inverse_bind_matrices.len() * 64);
        for matrix in &skin.inverse_bind_matrices {
            for value in reflect_matrix_x(*matrix).to_cols_array() {
                bytes.write_f32::<LittleEndian>(value)?;
            }
        }
        let view = buffer.write_buffer_view(&bytes, None, 4)?;
        accessors.push(GltfAccessor::new(
            view,
            ComponentType::Float,
            AccessorType::Mat4,
            skin.inverse_bind_matrices.len(),
        ));
        Some(accessors.len() - 1)
    };
    Ok(GltfSkin {
        name: skin.name.clone(),
        inverse_bind_matrices,
        skeleton: skin.skeleton,
        joints: skin.joints.clone(),
    })
}

impl DocumentBuilder {
    /// Run both bake passes. The builder is left closed; the caller stores the
    /// result as the new state.
    pub(super) fn bake_with(&mut self, mut target: BakeTarget<'_>) -> Result<BakedDocument> {
        let BuilderState::Building(pending) = std::mem::replace(&mut self.state, BuilderState::Closed) else {
            return Err(Error::BuilderClosed);
        };
        let Pending {
            mut nodes,
            node_meshes,
            meshes,
            materials,
            images,
            samplers,
            mut textures,
            cameras,
            lights,
            skins,
            mut scenes,
            variants,
            extensions_used,
            extensions_required,
            ..
        } = *pending;
        self.cancellation.check()?;

        let mut buffer = match &mut target {
            BakeTarget::Memory => BufferWriter::in_memory(),
            BakeTarget::Files { files, stem } => {
                let name = files.claim(&format!("{stem}.bin"))?;
                BufferWriter::file_backed(files.directory().join(name))
            }
        };
        let mut accessors = Vec::new();

        // pass 1: geometry, skins, images
        tracing::debug!("Converting {} meshes", meshes.len());
        let converted: Vec<ConvertedMesh> = if self.settings.deterministic {
            meshes.iter().map(|mesh| convert_mesh(mesh)).collect()
        } else {
            meshes.par_iter().map(|mesh| convert_mesh(mesh)).collect()
        };
        let mut baked_meshes = Vec::with_capacity(converted.len());
        for mesh in &converted {
            self.cancellation.check()?;
            self.defer_agent.checkpoint();
            for diagnostic in &mesh.diagnostics {
                self.report(diagnostic);
            }
            baked_meshes.push(write_converted_mesh(mesh, &mut buffer, &mut accessors)?);
        }

        let gltf_skins = skins
            .iter()
            .map(|skin| write_skin(skin, &mut buffer, &mut accessors))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Encoding {} images", images.len());
        let encoder = &self.encoder;
        let encoded: Vec<Result<EncodedImage>> = if self.settings.deterministic {
            images.iter().map(|i| encoder.encode(&i.image, i.format)).collect()
        } else {
            images.par_iter().map(|i| encoder.encode(&i.image, i.format)).collect()
        };
        let mut gltf_images = Vec::with_capacity(images.len());
        let mut image_map = Vec::with_capacity(images.len());
        for (index, (export, result)) in images.iter().zip(encoded).enumerate() {
            self.cancellation.check()?;
            self.defer_agent.checkpoint();
            let name = export.image.name.clone();
            let encoded = match result {
                Ok(encoded) => encoded,
                Err(e) => {
                    self.report(&Diagnostic::error(
                        LogCode::ImageEncodeFailed,
                        vec![name.unwrap_or_else(|| index.to_string()), e.to_string()],
                    ));
                    image_map.push(None);
                    continue;
                }
            };
            let image = match &mut target {
                BakeTarget::Memory => {
                    let view = buffer.write_buffer_view(&encoded.bytes, None, 4)?;
                    GltfImage {
                        name,
                        uri: None,
                        mime_type: Some(encoded.mime_type),
                        buffer_view: Some(view),
                    }
                }
                BakeTarget::Files { files, .. } => {
                    let stem = file_stem_for(name.as_deref(), index);
                    let file_name = files.claim(&format!("{stem}.{}", encoded.extension()))?;
                    std::fs::write(files.directory().join(&file_name), &encoded.bytes)?;
                    GltfImage {
                        name,
                        uri: Some(file_name),
                        mime_type: None,
                        buffer_view: None,
                    }
                }
            };
            image_map.push(Some(gltf_images.len()));
            gltf_images.push(image);
        }
        for texture in &mut textures {
            texture.source = texture.source.and_then(|source| image_map.get(source).copied().flatten());
        }

        // pass 2: recombine meshes with their material assignments
        let mut gltf_meshes: Vec<GltfMesh> = baked_meshes.iter().map(|m| m.to_gltf(&[])).collect();
        let mut own_slot_used = vec![false; gltf_meshes.len()];
        let mut combinations: HashMap<(usize, MaterialAssignment), usize> = HashMap::new();
        for node_mesh in node_meshes {
            let key = (node_mesh.mesh, node_mesh.assignment);
            let index = match combinations.get(&key) {
                Some(&index) => index,
                None => {
                    let mesh = assign_materials(&baked_meshes[key.0], &key.1);
                    let index = if own_slot_used[key.0] {
                        gltf_meshes.push(mesh);
                        gltf_meshes.len() - 1
                    } else {
                        own_slot_used[key.0] = true;
                        gltf_meshes[key.0] = mesh;
                        key.0
                    };
                    combinations.insert(key, index);
                    index
                }
            };
            nodes[node_mesh.node].mesh = Some(index);
        }

        if scenes.is_empty() && !nodes.is_empty() {
            scenes.push(GltfScene {
                name: None,
                nodes: root_nodes(&nodes),
            });
        }

        let finished = buffer.finish()?;
        let buffers = if finished.byte_length > 0 {
            let uri = match &finished.data {
                BufferData::File(path) => path.file_name().map(|n| n.to_string_lossy().into_owned()),
                BufferData::Empty | BufferData::Memory(_) => None,
            };
            vec![GltfBuffer {
                byte_length: finished.byte_length,
                uri,
                name: None,
            }]
        } else {
            Vec::new()
        };

        let root_extensions = RootExtensions {
            lights_punctual: (!lights.is_empty()).then(|| LightsPunctual { lights }),
            materials_variants: (!variants.is_empty()).then(|| MaterialsVariants { variants }),
        };

        let document = GltfDocument {
            asset: GltfAsset {
                generator: Some(self.settings.generator()),
                ..GltfAsset::default()
            },
            scene: (!scenes.is_empty()).then_some(0),
            scenes,
            nodes,
            meshes: gltf_meshes,
            materials,
            textures,
            images: gltf_images,
            samplers,
            accessors,
            buffer_views: finished.views,
            buffers,
            skins: gltf_skins,
            cameras,
            extensions_used: extensions_used
                .union(&extensions_required)
                .map(|e| e.name().to_string())
                .collect(),
            extensions_required: extensions_required.iter().map(|e| e.name().to_string()).collect(),
            extensions: (!root_extensions.is_empty()).then_some(root_extensions),
        };
        document.validate()?;

        tracing::info!(
            "Baked document: {} nodes, {} meshes, {} materials, {} images, {} buffer bytes",
            document.nodes.len(),
            document.meshes.len(),
            document.materials.len(),
            document.images.len(),
            finished.byte_length
        );
        Ok(BakedDocument {
            document,
            buffer: finished.data,
        })
    }
}
