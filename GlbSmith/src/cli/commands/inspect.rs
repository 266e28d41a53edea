//! CLI command for inspecting glTF containers

use std::path::Path;

use crate::glb::{Glb, glb_length, is_glb};
use crate::schema::GltfDocument;

/// Format byte size for human-readable output
fn format_size(bytes: usize) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1}M", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1}K", bytes as f64 / 1024.0)
    } else {
        format!("{bytes}")
    }
}

pub fn execute(path: &Path) -> anyhow::Result<()> {
    let data = std::fs::read(path)?;
    println!("{} ({})", path.display(), format_size(data.len()));

    let json = if is_glb(&data) {
        let glb = Glb::from_slice(&data)?;
        let bin_len = glb.bin.map(<[u8]>::len);
        println!("  GLB v2, {} bytes", glb_length(glb.json.len(), bin_len));
        println!("  JSON chunk: {}", format_size(glb.json.len()));
        match bin_len {
            Some(len) => println!("  BIN chunk:  {}", format_size(len)),
            None => println!("  BIN chunk:  none"),
        }
        glb.json
    } else {
        println!("  glTF JSON");
        &data
    };

    let document = GltfDocument::from_json_slice(json)?;
    if let Some(generator) = &document.asset.generator {
        println!("  Generator: {generator}");
    }
    println!("  Scenes:       {}", document.scenes.len());
    println!("  Nodes:        {}", document.nodes.len());
    println!("  Meshes:       {}", document.meshes.len());
    println!("  Materials:    {}", document.materials.len());
    println!("  Textures:     {}", document.textures.len());
    println!("  Images:       {}", document.images.len());
    println!("  Accessors:    {}", document.accessors.len());
    println!("  Buffer views: {}", document.buffer_views.len());
    for (i, buffer) in document.buffers.iter().enumerate() {
        let location = match buffer.uri.as_deref() {
            None => "binary chunk",
            Some(uri) if uri.starts_with("data:") => "data URI",
            Some(uri) => uri,
        };
        println!("  Buffer {i}: {} ({location})", format_size(buffer.byte_length));
    }
    if !document.extensions_used.is_empty() {
        println!("  Extensions used: {}", document.extensions_used.join(", "));
    }
    if !document.extensions_required.is_empty() {
        println!("  Extensions required: {}", document.extensions_required.join(", "));
    }

    Ok(())
}
