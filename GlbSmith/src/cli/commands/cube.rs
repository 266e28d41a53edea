//! CLI command exporting a demo cube

use std::path::Path;
use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::builder::{DocumentBuilder, MaterialAssignment, NodeDescriptor};
use crate::images::SourceImage;
use crate::logger::TracingLogger;
use crate::material::{MaterialFlavor, SourceMaterial, TextureSlot};
use crate::mesh::{MeshArrays, MeshData, SubMesh, Topology};
use crate::settings::{ExportFormat, ExportSettings};

const CHECKER_SIZE: u32 = 8;

/// Unit cube with one quad per face and per-face normals.
pub fn cube_mesh() -> MeshData {
    let faces = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
    let mut arrays = MeshArrays {
        normals: Some(Vec::with_capacity(24)),
        uvs: vec![Vec::with_capacity(24)],
        ..MeshArrays::default()
    };
    let mut indices = Vec::with_capacity(24);
    for normal in faces {
        // two axes spanning the face, counter-clockwise seen from outside
        let u = if normal.x.abs() > 0.5 { Vec3::NEG_Z * normal.x.signum() } else { Vec3::X };
        let v = normal.cross(u);
        let base = arrays.positions.len() as u32;
        for (du, dv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            arrays.positions.push((normal + u * du + v * dv) * 0.5);
            arrays.uvs[0].push(Vec2::new((du + 1.0) * 0.5, (dv + 1.0) * 0.5));
            if let Some(normals) = arrays.normals.as_mut() {
                normals.push(normal);
            }
        }
        indices.extend([base, base + 1, base + 2, base + 3]);
    }
    MeshData::from_arrays(
        Some("Cube".to_string()),
        &arrays,
        vec![SubMesh {
            topology: Topology::Quads,
            indices,
        }],
    )
}

fn checker_image() -> crate::Result<SourceImage> {
    let mut pixels = Vec::with_capacity((CHECKER_SIZE * CHECKER_SIZE * 4) as usize);
    for y in 0..CHECKER_SIZE {
        for x in 0..CHECKER_SIZE {
            let value = if (x + y) % 2 == 0 { 230 } else { 40 };
            pixels.extend([value, value, value, 255]);
        }
    }
    SourceImage::rgba8(Some("checker".to_string()), CHECKER_SIZE, CHECKER_SIZE, pixels)
}

pub fn execute(destination: &Path, settings: Option<&Path>) -> anyhow::Result<()> {
    let mut settings = match settings {
        Some(path) => ExportSettings::load(path)?,
        None => ExportSettings::default(),
    };
    match destination.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("gltf") => settings.format = ExportFormat::Json,
        Some(ext) if ext.eq_ignore_ascii_case("glb") => settings.format = ExportFormat::Binary,
        _ => {}
    }

    let mut material = SourceMaterial::named("Checker", MaterialFlavor::MetallicRoughness);
    material.base_color_texture = Some(TextureSlot::new(Arc::new(checker_image()?)));
    material.roughness = 0.8;

    let mut builder = DocumentBuilder::new(settings).with_logger(Arc::new(TracingLogger));
    let material = builder.add_material(&Arc::new(material))?;
    let node = builder.add_node(NodeDescriptor::named("Cube"))?;
    builder.add_mesh_to_node(
        node,
        &Arc::new(cube_mesh()),
        MaterialAssignment::new(vec![Some(material.index)]),
    )?;
    builder.save_to_file(destination)?;

    if !builder.is_flawless() {
        println!("Exported with warnings, see log output");
    }
    println!("Wrote {}", destination.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_layout() {
        let mesh = cube_mesh();
        assert_eq!(mesh.vertex_count, 24);
        assert_eq!(mesh.submeshes[0].indices.len(), 24);
    }

    #[test]
    fn test_checker_image() {
        let image = checker_image().unwrap();
        assert!(!image.has_transparency());
    }
}
