//! Mesh baking: convert source streams, then pack them into buffer views.
//!
//! [`convert_mesh`] is pure and owns all of its output, so meshes can be
//! converted on a worker pool. [`write_converted_mesh`] then appends the
//! results to the shared buffer in insertion order.

use indexmap::IndexMap;

use super::convert::{
    convert_position, convert_tangent, convert_uv, flip_winding, read_floats, read_integers,
};
use super::{Bounds, IndexFormat, MeshData, VertexAttribute, VertexAttributeDescriptor, VertexFormat};
use crate::buffer::BufferWriter;
use crate::error::Result;
use crate::layout::{AccessorType, BufferViewTarget, ComponentType};
use crate::logger::{Diagnostic, LogCode};
use crate::schema::{DrawMode, GltfAccessor, GltfMesh, GltfPrimitive};

/// One attribute stream, already converted and tightly packed.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedAttribute {
    pub name: String,
    pub component_type: ComponentType,
    pub accessor_type: AccessorType,
    pub normalized: bool,
    pub count: usize,
    pub bytes: Vec<u8>,
    pub min: Option<Vec<f32>>,
    pub max: Option<Vec<f32>>,
}

/// Converted index list of one submesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedPrimitive {
    pub submesh: usize,
    pub mode: DrawMode,
    pub component_type: ComponentType,
    pub count: usize,
    pub bytes: Vec<u8>,
}

/// Output of [`convert_mesh`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedMesh {
    pub name: Option<String>,
    pub attributes: Vec<ConvertedAttribute>,
    pub primitives: Vec<ConvertedPrimitive>,
    /// Problems found during conversion, in discovery order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Primitive whose geometry lives in the buffer; material is assigned later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BakedPrimitive {
    /// Submesh (material slot) this primitive was built from.
    pub submesh: usize,
    pub indices: usize,
    pub mode: DrawMode,
}

/// A mesh whose accessors have been allocated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BakedMesh {
    pub name: Option<String>,
    pub attributes: IndexMap<String, usize>,
    pub primitives: Vec<BakedPrimitive>,
}

impl BakedMesh {
    /// glTF mesh with `materials[submesh]` assigned to each primitive.
    ///
    /// Every call shares the same accessors; only the primitive records differ.
    #[must_use]
    pub fn to_gltf(&self, materials: &[Option<usize>]) -> GltfMesh {
        GltfMesh {
            name: self.name.clone(),
            primitives: self
                .primitives
                .iter()
                .map(|p| GltfPrimitive {
                    attributes: self.attributes.clone(),
                    indices: Some(p.indices),
                    material: materials.get(p.submesh).copied().flatten(),
                    mode: p.mode,
                    extensions: None,
                })
                .collect(),
            weights: None,
        }
    }
}

fn pack_f32<const N: usize>(values: impl Iterator<Item = [f32; N]>) -> Vec<u8> {
    values.flatten().flat_map(f32::to_le_bytes).collect()
}

fn float_attribute<const N: usize>(name: String, values: &[[f32; N]]) -> ConvertedAttribute {
    ConvertedAttribute {
        name,
        component_type: ComponentType::Float,
        accessor_type: AccessorType::from_dimension(N).unwrap_or(AccessorType::Vec4),
        normalized: false,
        count: values.len(),
        bytes: pack_f32(values.iter().copied()),
        min: None,
        max: None,
    }
}

fn expect_dimension(
    descriptor: &VertexAttributeDescriptor,
    expected: &[usize],
    mesh_name: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if !expected.contains(&descriptor.dimension) {
        diagnostics.push(Diagnostic::warning(
            LogCode::VertexAttributeDimension,
            vec![
                mesh_name.to_string(),
                format!("{:?}", descriptor.attribute),
                descriptor.dimension.to_string(),
            ],
        ));
    }
}

fn convert_color(
    name: String,
    descriptor: &VertexAttributeDescriptor,
    values: &[[f32; 4]],
) -> ConvertedAttribute {
    match descriptor.format {
        VertexFormat::UNorm8 => ConvertedAttribute {
            name,
            component_type: ComponentType::UnsignedByte,
            accessor_type: AccessorType::Vec4,
            normalized: true,
            count: values.len(),
            bytes: values
                .iter()
                .flat_map(|c| color_with_alpha(*c, descriptor.dimension))
                .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
                .collect(),
            min: None,
            max: None,
        },
        VertexFormat::UNorm16 => ConvertedAttribute {
            name,
            component_type: ComponentType::UnsignedShort,
            accessor_type: AccessorType::Vec4,
            normalized: true,
            count: values.len(),
            bytes: values
                .iter()
                .flat_map(|c| color_with_alpha(*c, descriptor.dimension))
                .flat_map(|v| ((v.clamp(0.0, 1.0) * 65535.0).round() as u16).to_le_bytes())
                .collect(),
            min: None,
            max: None,
        },
        _ if descriptor.dimension == 3 => {
            let rgb: Vec<[f32; 3]> = values.iter().map(|c| [c[0], c[1], c[2]]).collect();
            float_attribute(name, &rgb)
        }
        _ => {
            let rgba: Vec<[f32; 4]> = values
                .iter()
                .map(|c| color_with_alpha(*c, descriptor.dimension))
                .collect();
            float_attribute(name, &rgba)
        }
    }
}

fn color_with_alpha(mut color: [f32; 4], dimension: usize) -> [f32; 4] {
    if dimension < 4 {
        color[3] = 1.0;
    }
    color
}

/// Convert every attribute and submesh of `mesh` into glTF layout.
///
/// Positions and normals get X negated, tangents Z, and UVs are flipped
/// vertically. Index winding is reversed to match.
#[must_use]
pub fn convert_mesh(mesh: &MeshData) -> ConvertedMesh {
    let mesh_name = mesh.name.clone().unwrap_or_default();
    let mut diagnostics = Vec::new();
    let mut attributes: Vec<ConvertedAttribute> = Vec::new();
    let mut primitives = Vec::new();

    if mesh.vertex_count == 0 || mesh.submeshes.is_empty() {
        diagnostics.push(Diagnostic::info(LogCode::EmptyMesh, vec![mesh_name]));
        return ConvertedMesh {
            name: mesh.name.clone(),
            attributes,
            primitives,
            diagnostics,
        };
    }

    let count = mesh.vertex_count;
    let mut seen = Vec::new();
    let mut joint_slot = None;
    let mut weight_slot = None;

    for descriptor in &mesh.attributes {
        let Some(name) = descriptor.attribute.gltf_name() else {
            diagnostics.push(Diagnostic::warning(
                LogCode::UnsupportedVertexAttribute,
                vec![mesh_name.clone(), format!("{:?}", descriptor.attribute)],
            ));
            continue;
        };
        if seen.contains(&descriptor.attribute) {
            diagnostics.push(Diagnostic::warning(
                LogCode::UnsupportedVertexAttribute,
                vec![mesh_name.clone(), format!("duplicate {name}")],
            ));
            continue;
        }
        let Some(stream) = mesh.streams.get(descriptor.stream) else {
            diagnostics.push(Diagnostic::error(
                LogCode::VertexStreamOutOfRange,
                vec![mesh_name.clone(), name, descriptor.stream.to_string()],
            ));
            continue;
        };

        if descriptor.attribute == VertexAttribute::BlendIndices {
            let Some(joints) = read_integers(stream, descriptor, count) else {
                diagnostics.push(Diagnostic::error(LogCode::VertexStreamOutOfRange, vec![mesh_name.clone(), name]));
                continue;
            };
            let mut overflow = false;
            let joints: Vec<[u16; 4]> = joints
                .iter()
                .map(|j| {
                    j.map(|index| {
                        u16::try_from(index).unwrap_or_else(|_| {
                            overflow = true;
                            0
                        })
                    })
                })
                .collect();
            if overflow {
                diagnostics.push(Diagnostic::warning(LogCode::JointIndexOverflow, vec![mesh_name.clone()]));
            }
            expect_dimension(descriptor, &[4], &mesh_name, &mut diagnostics);
            seen.push(descriptor.attribute);
            joint_slot = Some((attributes.len(), joints));
            // placeholder, filled once weights are known
            attributes.push(ConvertedAttribute {
                name,
                component_type: ComponentType::UnsignedShort,
                accessor_type: AccessorType::Vec4,
                normalized: false,
                count,
                bytes: Vec::new(),
                min: None,
                max: None,
            });
            continue;
        }

        let Some(values) = read_floats(stream, descriptor, count) else {
            diagnostics.push(Diagnostic::error(LogCode::VertexStreamOutOfRange, vec![mesh_name.clone(), name]));
            continue;
        };
        seen.push(descriptor.attribute);

        let converted = match descriptor.attribute {
            VertexAttribute::Position => {
                expect_dimension(descriptor, &[3], &mesh_name, &mut diagnostics);
                let positions: Vec<[f32; 3]> = values.iter().map(|v| convert_position(*v)).collect();
                let bounds = mesh
                    .bounds
                    .map(Bounds::flip_x)
                    .or_else(|| Bounds::from_points(positions.iter().map(|p| glam::Vec3::from_array(*p))));
                let mut attribute = float_attribute(name, &positions);
                if let Some(bounds) = bounds {
                    attribute.min = Some(bounds.min.to_array().to_vec());
                    attribute.max = Some(bounds.max.to_array().to_vec());
                }
                attribute
            }
            VertexAttribute::Normal => {
                expect_dimension(descriptor, &[3], &mesh_name, &mut diagnostics);
                let normals: Vec<[f32; 3]> = values.iter().map(|v| convert_position(*v)).collect();
                float_attribute(name, &normals)
            }
            VertexAttribute::Tangent => {
                expect_dimension(descriptor, &[4], &mesh_name, &mut diagnostics);
                let tangents: Vec<[f32; 4]> = values
                    .iter()
                    .map(|v| {
                        let mut t = convert_tangent(*v);
                        if descriptor.dimension < 4 {
                            t[3] = 1.0;
                        }
                        t
                    })
                    .collect();
                float_attribute(name, &tangents)
            }
            VertexAttribute::Color => {
                expect_dimension(descriptor, &[3, 4], &mesh_name, &mut diagnostics);
                convert_color(name, descriptor, &values)
            }
            VertexAttribute::TexCoord(_) => {
                expect_dimension(descriptor, &[2], &mesh_name, &mut diagnostics);
                let uvs: Vec<[f32; 2]> = values.iter().map(|v| convert_uv(*v)).collect();
                float_attribute(name, &uvs)
            }
            VertexAttribute::BlendWeight => {
                expect_dimension(descriptor, &[4], &mesh_name, &mut diagnostics);
                weight_slot = Some(values.clone());
                float_attribute(name, &values)
            }
            VertexAttribute::BlendIndices => continue,
        };
        attributes.push(converted);
    }

    if let Some((slot, mut joints)) = joint_slot {
        // a joint with zero weight must reference joint 0
        if let Some(weights) = &weight_slot {
            for (j, w) in joints.iter_mut().zip(weights) {
                for (joint, weight) in j.iter_mut().zip(w) {
                    if *weight <= 0.0 {
                        *joint = 0;
                    }
                }
            }
        }
        attributes[slot].bytes = joints.iter().flatten().flat_map(|j| j.to_le_bytes()).collect();
    }

    for (submesh_index, submesh) in mesh.submeshes.iter().enumerate() {
        let (indices, mode, mut submesh_diagnostics) = flip_winding(&submesh.indices, submesh.topology);
        diagnostics.append(&mut submesh_diagnostics);
        if indices.is_empty() {
            continue;
        }

        let max = indices.iter().copied().max().unwrap_or(0);
        if max as usize >= count {
            diagnostics.push(Diagnostic::warning(
                LogCode::IndexOutOfRange,
                vec![mesh_name.clone(), submesh_index.to_string(), max.to_string()],
            ));
        }

        let (component_type, bytes) = match mesh.index_format {
            IndexFormat::UInt16 if u16::try_from(max).is_ok() => (
                ComponentType::UnsignedShort,
                indices.iter().flat_map(|&i| (i as u16).to_le_bytes()).collect(),
            ),
            _ => (
                ComponentType::UnsignedInt,
                indices.iter().flat_map(|i| i.to_le_bytes()).collect(),
            ),
        };
        primitives.push(ConvertedPrimitive {
            submesh: submesh_index,
            mode,
            component_type,
            count: indices.len(),
            bytes,
        });
    }

    ConvertedMesh {
        name: mesh.name.clone(),
        attributes,
        primitives,
        diagnostics,
    }
}

/// Append a converted mesh to `buffer`, pushing one accessor per stream.
///
/// Vertex streams are 4-byte aligned with a stride equal to their element size;
/// index lists are 4-byte aligned without a stride.
pub fn write_converted_mesh(
    converted: &ConvertedMesh,
    buffer: &mut BufferWriter,
    accessors: &mut Vec<GltfAccessor>,
) -> Result<BakedMesh> {
    let mut baked = BakedMesh {
        name: converted.name.clone(),
        ..BakedMesh::default()
    };

    for attribute in &converted.attributes {
        let stride = crate::layout::element_size(attribute.component_type, attribute.accessor_type);
        let view = buffer.write_target_view(&attribute.bytes, Some(stride), 4, BufferViewTarget::ArrayBuffer)?;
        let mut accessor = GltfAccessor::new(view, attribute.component_type, attribute.accessor_type, attribute.count);
        accessor.normalized = attribute.normalized;
        accessor.min.clone_from(&attribute.min);
        accessor.max.clone_from(&attribute.max);
        baked.attributes.insert(attribute.name.clone(), accessors.len());
        accessors.push(accessor);
    }

    for primitive in &converted.primitives {
        let view = buffer.write_target_view(&primitive.bytes, None, 4, BufferViewTarget::ElementArrayBuffer)?;
        baked.primitives.push(BakedPrimitive {
            submesh: primitive.submesh,
            indices: accessors.len(),
            mode: primitive.mode,
        });
        accessors.push(GltfAccessor::new(view, primitive.component_type, AccessorType::Scalar, primitive.count));
    }

    tracing::debug!(
        "Baked mesh {:?}: {} attributes, {} primitives",
        converted.name,
        baked.attributes.len(),
        baked.primitives.len()
    );
    Ok(baked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshArrays, SubMesh, Topology, VertexStream};
    use glam::{Vec2, Vec3};

    fn triangle() -> MeshData {
        let arrays = MeshArrays {
            positions: vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 0.0), Vec3::new(3.0, 0.0, 1.0)],
            normals: Some(vec![Vec3::X; 3]),
            uvs: vec![vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.25), Vec2::new(0.5, 1.0)]],
            ..Default::default()
        };
        MeshData::from_arrays(
            Some("tri".into()),
            &arrays,
            vec![SubMesh {
                topology: Topology::Triangles,
                indices: vec![0, 1, 2],
            }],
        )
    }

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn test_position_flip_and_bounds() {
        let converted = convert_mesh(&triangle());
        let position = &converted.attributes[0];
        assert_eq!(position.name, "POSITION");
        assert_eq!(floats(&position.bytes)[..3], [-1.0, 0.0, 0.0]);
        assert_eq!(position.min.as_deref(), Some(&[-3.0, 0.0, 0.0][..]));
        assert_eq!(position.max.as_deref(), Some(&[-1.0, 1.0, 1.0][..]));
    }

    #[test]
    fn test_source_bounds_are_flipped() {
        let mut mesh = triangle();
        mesh.bounds = Some(Bounds {
            min: Vec3::new(-5.0, -5.0, -5.0),
            max: Vec3::new(4.0, 5.0, 5.0),
        });
        let converted = convert_mesh(&mesh);
        assert_eq!(converted.attributes[0].min.as_deref(), Some(&[-4.0, -5.0, -5.0][..]));
        assert_eq!(converted.attributes[0].max.as_deref(), Some(&[5.0, 5.0, 5.0][..]));
    }

    #[test]
    fn test_uv_and_normal_conversion() {
        let converted = convert_mesh(&triangle());
        let normal = converted.attributes.iter().find(|a| a.name == "NORMAL").unwrap();
        assert_eq!(floats(&normal.bytes)[..3], [-1.0, 0.0, 0.0]);
        let uv = converted.attributes.iter().find(|a| a.name == "TEXCOORD_0").unwrap();
        assert_eq!(floats(&uv.bytes), vec![0.0, 1.0, 1.0, 0.75, 0.5, 0.0]);
    }

    #[test]
    fn test_indices_reversed_as_shorts() {
        let converted = convert_mesh(&triangle());
        let primitive = &converted.primitives[0];
        assert_eq!(primitive.component_type, ComponentType::UnsignedShort);
        assert_eq!(primitive.bytes, vec![0, 0, 2, 0, 1, 0]);
    }

    #[test]
    fn test_wide_indices_use_u32() {
        let mut mesh = triangle();
        mesh.submeshes[0].indices = vec![0, 1, 70_000];
        let converted = convert_mesh(&mesh);
        assert_eq!(converted.primitives[0].component_type, ComponentType::UnsignedInt);
        assert!(converted.diagnostics.iter().any(|d| d.code == LogCode::IndexOutOfRange));
    }

    #[test]
    fn test_empty_mesh() {
        let converted = convert_mesh(&MeshData::default());
        assert!(converted.attributes.is_empty());
        assert!(converted.primitives.is_empty());
        assert_eq!(converted.diagnostics[0].code, LogCode::EmptyMesh);
    }

    #[test]
    fn test_joints_are_unsigned_short_and_cleaned() {
        let mut mesh = triangle();
        mesh.attributes.push(VertexAttributeDescriptor {
            attribute: VertexAttribute::BlendIndices,
            format: VertexFormat::UInt8,
            dimension: 4,
            stream: mesh.streams.len(),
            offset: 0,
        });
        mesh.streams.push(VertexStream {
            data: vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
            stride: 4,
        });
        let weights: Vec<u8> = [[1.0f32, 0.0, 0.0, 0.0]; 3]
            .iter()
            .flatten()
            .flat_map(|w| w.to_le_bytes())
            .collect();
        mesh.attributes.push(VertexAttributeDescriptor {
            attribute: VertexAttribute::BlendWeight,
            format: VertexFormat::Float32,
            dimension: 4,
            stream: mesh.streams.len(),
            offset: 0,
        });
        mesh.streams.push(VertexStream { data: weights, stride: 16 });

        let converted = convert_mesh(&mesh);
        let joints = converted.attributes.iter().find(|a| a.name == "JOINTS_0").unwrap();
        assert_eq!(joints.component_type, ComponentType::UnsignedShort);
        assert_eq!(&joints.bytes[..8], &[1, 0, 0, 0, 0, 0, 0, 0]);
        let weights = converted.attributes.iter().find(|a| a.name == "WEIGHTS_0").unwrap();
        assert_eq!(weights.component_type, ComponentType::Float);
        assert_eq!(weights.accessor_type, AccessorType::Vec4);
    }

    #[test]
    fn test_write_shares_layout_rules() {
        let converted = convert_mesh(&triangle());
        let mut buffer = BufferWriter::in_memory();
        let mut accessors = Vec::new();
        let baked = write_converted_mesh(&converted, &mut buffer, &mut accessors).unwrap();
        assert_eq!(baked.attributes.len(), 3);
        assert_eq!(baked.primitives.len(), 1);
        for view in buffer.views() {
            assert_eq!(view.byte_offset % 4, 0);
        }
        assert_eq!(buffer.views()[0].byte_stride, Some(12));
        assert_eq!(buffer.views()[2].byte_stride, Some(8));
        assert_eq!(buffer.views()[3].byte_stride, None);

        let a = baked.to_gltf(&[Some(0)]);
        let b = baked.to_gltf(&[Some(1)]);
        assert_eq!(a.primitives[0].attributes, b.primitives[0].attributes);
        assert_eq!(a.primitives[0].material, Some(0));
        assert_eq!(b.primitives[0].material, Some(1));
    }
}
