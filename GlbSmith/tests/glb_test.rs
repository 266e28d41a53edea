use std::sync::Arc;

use glam::Vec3;
use glbsmith::glb::{CHUNK_BIN, CHUNK_JSON, GLB_MAGIC, Glb};
use glbsmith::prelude::*;
use tempfile::tempdir;

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

fn quad_scene() -> Vec<u8> {
    let arrays = MeshArrays {
        positions: vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
        ..MeshArrays::default()
    };
    let mesh = Arc::new(MeshData::from_arrays(
        Some("quad".to_string()),
        &arrays,
        vec![SubMesh {
            topology: Topology::Quads,
            indices: vec![0, 1, 2, 3],
        }],
    ));
    let mut builder = DocumentBuilder::new(ExportSettings::default());
    let node = builder.add_node(NodeDescriptor::named("quad")).unwrap();
    builder
        .add_mesh_to_node(node, &mesh, MaterialAssignment::default())
        .unwrap();
    builder.save_to_stream(Vec::new()).unwrap()
}

#[test]
fn test_glb_container_layout() {
    let bytes = quad_scene();
    assert_eq!(read_u32(&bytes, 0), GLB_MAGIC);
    assert_eq!(read_u32(&bytes, 4), 2);
    assert_eq!(read_u32(&bytes, 8) as usize, bytes.len());
    assert_eq!(bytes.len() % 4, 0);

    let json_len = read_u32(&bytes, 12) as usize;
    assert_eq!(json_len % 4, 0);
    assert_eq!(read_u32(&bytes, 16), CHUNK_JSON);
    let bin_header = 20 + json_len;
    assert_eq!(read_u32(&bytes, bin_header + 4), CHUNK_BIN);
    assert_eq!(bin_header + 8 + read_u32(&bytes, bin_header) as usize, bytes.len());

    let glb = Glb::from_slice(&bytes).unwrap();
    assert!(glb.bin.is_some());
    assert!(serde_json::from_slice::<serde_json::Value>(glb.json).is_ok());
}

#[test]
fn test_quad_fans_out_to_two_triangles() {
    let file = GltfFile::from_slice(&quad_scene(), None).unwrap();
    let primitive = &file.document.meshes[0].primitives[0];
    let indices = file.read_indices(primitive.indices.unwrap()).unwrap();
    assert_eq!(indices, vec![0, 2, 1, 2, 0, 3]);

    let position = &file.document.accessors[primitive.attributes["POSITION"]];
    assert_eq!(position.min.as_deref(), Some(&[-1.0, 0.0, 0.0][..]));
    assert_eq!(position.max.as_deref(), Some(&[0.0, 1.0, 0.0][..]));
}

#[test]
fn test_reader_rejects_corrupt_length() {
    let mut bytes = quad_scene();
    bytes[8] = bytes[8].wrapping_add(4);
    assert!(matches!(
        GltfFile::from_slice(&bytes, None),
        Err(Error::GlbLengthMismatch { .. })
    ));
}

#[test]
fn test_pack_and_unpack_commands() {
    let dir = tempdir().unwrap();
    let glb = dir.path().join("quad.glb");
    std::fs::write(&glb, quad_scene()).unwrap();

    let gltf = dir.path().join("quad.gltf");
    glbsmith::cli::commands::unpack::execute(&glb, &gltf, false).unwrap();
    assert!(dir.path().join("quad.bin").exists());
    let unpacked = GltfFile::open(&gltf).unwrap();
    assert_eq!(unpacked.document.buffers[0].uri.as_deref(), Some("quad.bin"));

    let repacked = dir.path().join("repacked.glb");
    glbsmith::cli::commands::pack::execute(&gltf, &repacked).unwrap();
    let original = GltfFile::open(&glb).unwrap();
    let packed = GltfFile::open(&repacked).unwrap();
    assert_eq!(packed.buffers, original.buffers);
    assert_eq!(packed.document.meshes, original.document.meshes);

    let embedded = dir.path().join("embedded.gltf");
    glbsmith::cli::commands::unpack::execute(&glb, &embedded, true).unwrap();
    let file = GltfFile::from_slice(&std::fs::read(&embedded).unwrap(), None).unwrap();
    assert_eq!(file.buffers, original.buffers);
}

#[test]
fn test_cube_command_output_parses() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cube.glb");
    glbsmith::cli::commands::cube::execute(&path, None).unwrap();

    let gltf = gltf::Gltf::open(&path).unwrap();
    let mesh = gltf.meshes().next().unwrap();
    let primitive = mesh.primitives().next().unwrap();
    assert_eq!(primitive.indices().unwrap().count(), 36);
    assert_eq!(gltf.textures().count(), 1);
}
