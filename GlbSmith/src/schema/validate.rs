//! Structural validation of a [`GltfDocument`].

use super::root::GltfDocument;
use crate::error::{Error, Result};
use crate::layout::{check_byte_stride, span_end};

fn check_index(kind: &'static str, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::InvalidIndex { kind, index, len })
    }
}

fn check_optional(kind: &'static str, index: Option<usize>, len: usize) -> Result<()> {
    index.map_or(Ok(()), |i| check_index(kind, i, len))
}

impl GltfDocument {
    /// Check every cross-reference, accessor bounds, stride rules and that the
    /// attributes of each primitive agree on vertex count.
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.validate_references()?;
        self.validate_accessors()?;
        self.validate_primitives()
    }

    fn validate_references(&self) -> Result<()> {
        check_optional("scenes", self.scene, self.scenes.len())?;
        for scene in &self.scenes {
            for &node in &scene.nodes {
                check_index("nodes", node, self.nodes.len())?;
            }
        }

        let light_count = self.lights().len();
        for node in &self.nodes {
            for &child in &node.children {
                check_index("nodes", child, self.nodes.len())?;
            }
            check_optional("meshes", node.mesh, self.meshes.len())?;
            check_optional("skins", node.skin, self.skins.len())?;
            check_optional("cameras", node.camera, self.cameras.len())?;
            let light = node
                .extensions
                .as_ref()
                .and_then(|e| e.lights_punctual)
                .map(|l| l.light);
            check_optional("lights", light, light_count)?;
        }

        let variant_count = self.material_variants().len();
        for mesh in &self.meshes {
            for primitive in &mesh.primitives {
                for &accessor in primitive.attributes.values() {
                    check_index("accessors", accessor, self.accessors.len())?;
                }
                check_optional("accessors", primitive.indices, self.accessors.len())?;
                check_optional("materials", primitive.material, self.materials.len())?;
                if let Some(ext) = &primitive.extensions {
                    if let Some(draco) = &ext.draco {
                        check_index("bufferViews", draco.buffer_view, self.buffer_views.len())?;
                    }
                    if let Some(variants) = &ext.variants {
                        for mapping in &variants.mappings {
                            check_index("materials", mapping.material, self.materials.len())?;
                            for &v in &mapping.variants {
                                check_index("variants", v, variant_count)?;
                            }
                        }
                    }
                }
            }
        }

        for texture in &self.textures {
            check_optional("samplers", texture.sampler, self.samplers.len())?;
            check_optional("images", texture.source, self.images.len())?;
        }
        for image in &self.images {
            check_optional("bufferViews", image.buffer_view, self.buffer_views.len())?;
        }
        for material in &self.materials {
            for index in material.texture_indices() {
                check_index("textures", index, self.textures.len())?;
            }
        }

        for skin in &self.skins {
            check_optional("accessors", skin.inverse_bind_matrices, self.accessors.len())?;
            check_optional("nodes", skin.skeleton, self.nodes.len())?;
            for &joint in &skin.joints {
                check_index("nodes", joint, self.nodes.len())?;
            }
        }

        for view in &self.buffer_views {
            check_index("buffers", view.buffer, self.buffers.len())?;
        }
        Ok(())
    }

    fn validate_accessors(&self) -> Result<()> {
        for (index, view) in self.buffer_views.iter().enumerate() {
            let buffer = &self.buffers[view.buffer];
            let end = view.byte_offset.checked_add(view.byte_length).unwrap_or(usize::MAX);
            if end > buffer.byte_length {
                return Err(Error::BufferViewOutOfBounds {
                    buffer_view: index,
                    end,
                    buffer_length: buffer.byte_length,
                });
            }
        }

        for (index, accessor) in self.accessors.iter().enumerate() {
            let Some(view_index) = accessor.buffer_view else {
                continue;
            };
            check_index("bufferViews", view_index, self.buffer_views.len())?;
            let view = &self.buffer_views[view_index];
            let element = accessor.element_size();

            let alignment = accessor.component_type.size();
            let offset = view.byte_offset.wrapping_add(accessor.byte_offset);
            if offset % alignment != 0 {
                return Err(Error::MisalignedAccessor {
                    accessor: index,
                    offset,
                    alignment,
                });
            }

            if let Some(stride) = view.byte_stride {
                check_byte_stride(stride, element).map_err(|reason| Error::InvalidByteStride {
                    buffer_view: view_index,
                    stride,
                    reason,
                })?;
            }

            let stride = view.byte_stride.unwrap_or(element);
            let required = match accessor.count {
                0 => 0,
                n => span_end(accessor.byte_offset, stride, n - 1, element).unwrap_or(usize::MAX),
            };
            if required > view.byte_length {
                return Err(Error::AccessorOutOfBounds {
                    accessor: index,
                    required,
                    available: view.byte_length.saturating_sub(accessor.byte_offset),
                });
            }

            if let Some(sparse) = &accessor.sparse {
                check_index("bufferViews", sparse.indices.buffer_view, self.buffer_views.len())?;
                check_index("bufferViews", sparse.values.buffer_view, self.buffer_views.len())?;
            }
        }
        Ok(())
    }

    fn validate_primitives(&self) -> Result<()> {
        for (mesh_index, mesh) in self.meshes.iter().enumerate() {
            for (primitive_index, primitive) in mesh.primitives.iter().enumerate() {
                let mut expected = None;
                for (name, &accessor) in &primitive.attributes {
                    let count = self.accessors[accessor].count;
                    match expected {
                        None => expected = Some(count),
                        Some(expected) if expected != count => {
                            return Err(Error::AttributeCountMismatch {
                                mesh: mesh_index,
                                primitive: primitive_index,
                                attribute: name.clone(),
                                count,
                                expected,
                            });
                        }
                        Some(_) => {}
                    }
                }
            }
        }
        Ok(())
    }
}
