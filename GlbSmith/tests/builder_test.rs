use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};
use glbsmith::prelude::*;
use glbsmith::schema::{AlphaMode, GltfLight, GltfNode, LightType, MagFilter};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn triangle() -> Arc<MeshData> {
    let arrays = MeshArrays {
        positions: vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0)],
        normals: Some(vec![Vec3::Z; 3]),
        uvs: vec![vec![Vec2::ZERO, Vec2::X, Vec2::Y]],
        ..MeshArrays::default()
    };
    Arc::new(MeshData::from_arrays(
        Some("triangle".to_string()),
        &arrays,
        vec![SubMesh {
            topology: Topology::Triangles,
            indices: vec![0, 1, 2],
        }],
    ))
}

fn checker(format: ImageFormat) -> TextureSlot {
    let pixels = [255u8, 0, 0, 255].repeat(4);
    let image = SourceImage::rgba8(Some("checker".to_string()), 2, 2, pixels).unwrap();
    let mut slot = TextureSlot::new(Arc::new(image));
    slot.format = format;
    slot
}

fn deterministic() -> ExportSettings {
    ExportSettings {
        deterministic: true,
        ..ExportSettings::default()
    }
}

fn glb_bytes(mut builder: DocumentBuilder) -> Vec<u8> {
    builder.save_to_stream(Vec::new()).unwrap()
}

#[test]
fn test_triangle_round_trip() {
    let mut builder = DocumentBuilder::new(deterministic());
    let node = builder.add_node(NodeDescriptor::named("tri")).unwrap();
    builder
        .add_mesh_to_node(node, &triangle(), MaterialAssignment::default())
        .unwrap();
    let bytes = glb_bytes(builder);

    let file = GltfFile::from_slice(&bytes, None).unwrap();
    let primitive = &file.document.meshes[0].primitives[0];
    let positions = file.read_accessor_f32(primitive.attributes["POSITION"]).unwrap();
    assert_eq!(positions, vec![-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    let uvs = file.read_accessor_f32(primitive.attributes["TEXCOORD_0"]).unwrap();
    assert_eq!(uvs, vec![0.0, 1.0, 1.0, 1.0, 0.0, 0.0]);

    let indices = file.read_indices(primitive.indices.unwrap()).unwrap();
    assert_eq!(indices, vec![0, 2, 1]);
    assert_eq!(file.document.scene, Some(0));
    assert_eq!(file.document.scenes[0].nodes, vec![0]);
}

#[test]
fn test_reference_parser_accepts_output() {
    let mut builder = DocumentBuilder::new(deterministic());
    let mut material = SourceMaterial::named("red", MaterialFlavor::MetallicRoughness);
    material.base_color_texture = Some(checker(ImageFormat::Png));
    let material = builder.add_material(&Arc::new(material)).unwrap();
    let node = builder.add_node(NodeDescriptor::named("tri")).unwrap();
    builder
        .add_mesh_to_node(node, &triangle(), MaterialAssignment::new(vec![Some(material.index)]))
        .unwrap();
    let bytes = glb_bytes(builder);

    let gltf = gltf::Gltf::from_slice(&bytes).unwrap();
    assert_eq!(gltf.meshes().count(), 1);
    assert_eq!(gltf.images().count(), 1);
    let image = gltf.images().next().unwrap();
    assert!(matches!(
        image.source(),
        gltf::image::Source::View { mime_type: "image/png", .. }
    ));
}

#[test]
fn test_deterministic_output_is_reproducible() {
    let build = || {
        let mut builder = DocumentBuilder::new(deterministic());
        let node = builder.add_node(NodeDescriptor::named("tri")).unwrap();
        builder
            .add_mesh_to_node(node, &triangle(), MaterialAssignment::default())
            .unwrap();
        glb_bytes(builder)
    };
    assert_eq!(build(), build());
}

#[test]
fn test_dedup_is_idempotent() {
    let mut builder = DocumentBuilder::new(ExportSettings::default());
    let mesh = triangle();
    assert_eq!(builder.add_mesh(&mesh).unwrap(), builder.add_mesh(&mesh).unwrap());

    let image = checker(ImageFormat::Png).image;
    let a = builder.add_image(ImageExport::new(image.clone(), ImageFormat::Png)).unwrap();
    let b = builder.add_image(ImageExport::new(image.clone(), ImageFormat::Png)).unwrap();
    let c = builder.add_image(ImageExport::new(image, ImageFormat::Jpg)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);

    let point = SamplerSettings {
        filter: FilterMode::Point,
        ..SamplerSettings::default()
    };
    assert_eq!(builder.add_sampler(SamplerSettings::default()).unwrap(), None);
    let sampler = builder.add_sampler(point).unwrap();
    assert_eq!(sampler, Some(0));
    assert_eq!(builder.add_sampler(point).unwrap(), sampler);

    let texture = builder.add_texture(a, sampler).unwrap();
    assert_eq!(builder.add_texture(a, sampler).unwrap(), texture);
    assert_ne!(builder.add_texture(a, None).unwrap(), texture);

    let document = builder.bake().unwrap();
    assert_eq!(document.meshes.len(), 1);
    assert_eq!(document.images.len(), 2);
    assert_eq!(document.samplers.len(), 1);
    assert_eq!(document.samplers[0].mag_filter, Some(MagFilter::Nearest));
}

#[test]
fn test_material_recombination() {
    let mut builder = DocumentBuilder::new(deterministic());
    let red = builder
        .add_material(&Arc::new(SourceMaterial::named("red", MaterialFlavor::MetallicRoughness)))
        .unwrap()
        .index;
    let blue = builder
        .add_material(&Arc::new(SourceMaterial::named("blue", MaterialFlavor::MetallicRoughness)))
        .unwrap()
        .index;
    let mesh = triangle();
    for (name, material) in [("a", red), ("b", blue), ("c", red)] {
        let node = builder.add_node(NodeDescriptor::named(name)).unwrap();
        builder
            .add_mesh_to_node(node, &mesh, MaterialAssignment::new(vec![Some(material)]))
            .unwrap();
    }
    let document = builder.bake().unwrap();

    assert_eq!(document.meshes.len(), 2);
    let node_meshes: Vec<_> = document.nodes.iter().map(|n| n.mesh).collect();
    assert_eq!(node_meshes, vec![Some(0), Some(1), Some(0)]);
    let first = &document.meshes[0].primitives[0];
    let second = &document.meshes[1].primitives[0];
    assert_eq!(first.material, Some(red));
    assert_eq!(second.material, Some(blue));
    assert_eq!(first.attributes, second.attributes);
    assert_eq!(first.indices, second.indices);
}

#[test]
fn test_node_transform_conversion() {
    let mut builder = DocumentBuilder::new(ExportSettings::default());
    builder
        .add_node(NodeDescriptor {
            translation: Some(Vec3::new(1.0, 2.0, 3.0)),
            rotation: Some(Quat::IDENTITY),
            scale: Some(Vec3::ONE),
            ..NodeDescriptor::named("moved")
        })
        .unwrap();
    let rotated = Quat::from_xyzw(0.1, 0.2, 0.3, 0.9).normalize();
    builder
        .add_node(NodeDescriptor {
            rotation: Some(rotated),
            ..NodeDescriptor::default()
        })
        .unwrap();
    let document = builder.bake().unwrap();

    assert_eq!(
        document.nodes[0],
        GltfNode {
            name: Some("moved".to_string()),
            translation: Some([-1.0, 2.0, 3.0]),
            ..GltfNode::default()
        }
    );
    assert_eq!(document.nodes[1].rotation, Some([rotated.x, -rotated.y, -rotated.z, rotated.w]));
}

#[test]
fn test_empty_mesh_bakes() {
    let mut builder = DocumentBuilder::new(ExportSettings::default());
    let node = builder.add_node(NodeDescriptor::named("empty")).unwrap();
    builder
        .add_mesh_to_node(node, &Arc::new(MeshData::default()), MaterialAssignment::default())
        .unwrap();
    let document = builder.bake().unwrap();
    assert_eq!(document.meshes.len(), 1);
    assert!(document.meshes[0].primitives.is_empty());
    assert!(document.buffers.is_empty());
}

#[test]
fn test_save_json_writes_sidecar_files() {
    let dir = tempdir().unwrap();
    let settings = ExportSettings {
        format: ExportFormat::Json,
        ..deterministic()
    };
    let mut builder = DocumentBuilder::new(settings);
    let mut material = SourceMaterial::named("red", MaterialFlavor::MetallicRoughness);
    material.base_color_texture = Some(checker(ImageFormat::Png));
    let material = builder.add_material(&Arc::new(material)).unwrap();
    let node = builder.add_node(NodeDescriptor::named("tri")).unwrap();
    builder
        .add_mesh_to_node(node, &triangle(), MaterialAssignment::new(vec![Some(material.index)]))
        .unwrap();

    let path = dir.path().join("scene.gltf");
    builder.save_to_file(&path).unwrap();
    assert!(builder.is_closed());
    assert!(dir.path().join("scene.bin").exists());
    assert!(dir.path().join("checker.png").exists());

    let file = GltfFile::open(&path).unwrap();
    assert_eq!(file.document.buffers[0].uri.as_deref(), Some("scene.bin"));
    assert_eq!(file.document.images[0].uri.as_deref(), Some("checker.png"));
    assert_eq!(file.buffers[0].len(), file.document.buffers[0].byte_length);
}

#[test]
fn test_embedded_json_is_self_contained() {
    let settings = ExportSettings {
        format: ExportFormat::Json,
        embed_buffers: true,
        ..deterministic()
    };
    let mut builder = DocumentBuilder::new(settings);
    let node = builder.add_node(NodeDescriptor::named("tri")).unwrap();
    builder
        .add_mesh_to_node(node, &triangle(), MaterialAssignment::default())
        .unwrap();
    let json = builder.save_to_stream(Vec::new()).unwrap();

    let file = GltfFile::from_slice(&json, None).unwrap();
    assert!(file.document.buffers[0].uri.as_deref().unwrap().starts_with("data:"));
    assert_eq!(file.buffers[0].len(), file.document.buffers[0].byte_length);
}

#[test]
fn test_json_stream_without_embedding_fails() {
    let settings = ExportSettings {
        format: ExportFormat::Json,
        ..ExportSettings::default()
    };
    let mut builder = DocumentBuilder::new(settings);
    let node = builder.add_node(NodeDescriptor::named("tri")).unwrap();
    builder
        .add_mesh_to_node(node, &triangle(), MaterialAssignment::default())
        .unwrap();
    let result = builder.save_to_stream(Vec::new());
    assert!(matches!(result, Err(Error::NotSelfContained { .. })));
    assert!(builder.is_closed());
}

#[test]
fn test_cancellation_aborts_bake() {
    let mut builder = DocumentBuilder::new(ExportSettings::default());
    let node = builder.add_node(NodeDescriptor::named("tri")).unwrap();
    builder
        .add_mesh_to_node(node, &triangle(), MaterialAssignment::default())
        .unwrap();
    builder.cancellation_token().cancel();
    assert!(matches!(builder.bake(), Err(Error::Cancelled)));
    assert!(builder.is_closed());
}

#[test]
fn test_conflict_policies() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene.glb");
    std::fs::write(&path, b"old").unwrap();

    let abort = ExportSettings {
        file_conflict_resolution: FileConflictResolution::Abort,
        ..ExportSettings::default()
    };
    let mut builder = DocumentBuilder::new(abort);
    builder.add_node(NodeDescriptor::named("a")).unwrap();
    assert!(matches!(builder.save_to_file(&path), Err(Error::FileConflict { .. })));
    assert_eq!(std::fs::read(&path).unwrap(), b"old");

    let rename = ExportSettings {
        file_conflict_resolution: FileConflictResolution::Rename,
        ..ExportSettings::default()
    };
    let mut builder = DocumentBuilder::new(rename);
    builder.add_node(NodeDescriptor::named("a")).unwrap();
    builder.save_to_file(&path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"old");
    assert!(dir.path().join("scene_1.glb").exists());

    let mut builder = DocumentBuilder::new(ExportSettings::default());
    builder.add_node(NodeDescriptor::named("a")).unwrap();
    builder.save_to_file(&path).unwrap();
    assert!(glbsmith::glb::is_glb(&std::fs::read(&path).unwrap()));
}

#[test]
fn test_baked_document_survives_glb_round_trip() {
    let mut builder = DocumentBuilder::new(deterministic());
    let mut source = SourceMaterial::named("opaque", MaterialFlavor::MetallicRoughness);
    source.alpha_mode = AlphaMode::Opaque;
    source.alpha_cutoff = 0.3;
    source.base_color_texture = Some(checker(ImageFormat::Png));
    let material = builder.add_material(&Arc::new(source)).unwrap();

    let light = builder.add_light(GltfLight::new(LightType::Point)).unwrap();
    let lamp = builder
        .add_node(NodeDescriptor {
            light: Some(light),
            translation: Some(Vec3::new(0.0, 2.0, 0.0)),
            ..NodeDescriptor::named("lamp")
        })
        .unwrap();
    let node = builder
        .add_node(NodeDescriptor {
            rotation: Some(Quat::from_rotation_y(0.5)),
            scale: Some(Vec3::ONE),
            children: vec![lamp],
            ..NodeDescriptor::named("tri")
        })
        .unwrap();
    builder
        .add_mesh_to_node(node, &triangle(), MaterialAssignment::new(vec![Some(material.index)]))
        .unwrap();

    let baked = builder.bake().unwrap().clone();
    assert_eq!(baked.materials[0].alpha_cutoff, 0.5);
    let bytes = glb_bytes(builder);
    let file = GltfFile::from_slice(&bytes, None).unwrap();
    assert_eq!(file.document, baked);
}
