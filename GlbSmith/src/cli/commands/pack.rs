//! CLI command for packing a .gltf into a .glb

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::glb::write_glb_seekable;
use crate::layout::pad_byte_count;
use crate::reader::{GltfFile, decode_data_uri};
use crate::schema::{GltfBuffer, GltfBufferView, GltfDocument};

/// MIME type for an image file, from its extension.
fn image_mime_type(uri: &str) -> Option<&'static str> {
    let ext = Path::new(uri).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

fn append_aligned(bin: &mut Vec<u8>, bytes: &[u8]) -> usize {
    bin.resize(bin.len() + pad_byte_count(bin.len(), 4), 0);
    let offset = bin.len();
    bin.extend_from_slice(bytes);
    offset
}

/// Merge every buffer into one, moving external images into buffer views.
pub fn merge_buffers(file: GltfFile, base_dir: Option<&Path>) -> anyhow::Result<(GltfDocument, Vec<u8>)> {
    let GltfFile {
        mut document,
        buffers,
    } = file;

    let mut bin = Vec::new();
    let mut offsets = Vec::with_capacity(buffers.len());
    for buffer in &buffers {
        offsets.push(append_aligned(&mut bin, buffer));
    }
    for view in &mut document.buffer_views {
        let base = offsets
            .get(view.buffer)
            .ok_or_else(|| anyhow::anyhow!("buffer view references missing buffer {}", view.buffer))?;
        view.buffer = 0;
        view.byte_offset += base;
    }

    for image in &mut document.images {
        let Some(uri) = image.uri.take() else {
            continue;
        };
        let (bytes, mime_type) = if uri.starts_with("data:") {
            let mime = uri
                .strip_prefix("data:")
                .and_then(|rest| rest.split(';').next())
                .map(str::to_string);
            (decode_data_uri(&uri)?, mime)
        } else {
            let dir = base_dir.ok_or_else(|| anyhow::anyhow!("cannot resolve image '{uri}'"))?;
            (std::fs::read(dir.join(&uri))?, image_mime_type(&uri).map(str::to_string))
        };
        let offset = append_aligned(&mut bin, &bytes);
        document.buffer_views.push(GltfBufferView {
            buffer: 0,
            byte_offset: offset,
            byte_length: bytes.len(),
            byte_stride: None,
            target: None,
            name: None,
        });
        image.buffer_view = Some(document.buffer_views.len() - 1);
        image.mime_type = image.mime_type.take().or(mime_type);
    }

    document.buffers = if bin.is_empty() {
        Vec::new()
    } else {
        vec![GltfBuffer {
            byte_length: bin.len(),
            uri: None,
            name: None,
        }]
    };
    document.validate()?;
    Ok((document, bin))
}

pub fn execute(source: &Path, destination: &Path) -> anyhow::Result<()> {
    let file = GltfFile::open(source)?;
    let (document, bin) = merge_buffers(file, source.parent())?;

    let out = BufWriter::new(File::create(destination)?);
    let bin = (!bin.is_empty()).then_some(bin.as_slice());
    write_glb_seekable(&document, bin, out)?.flush()?;

    println!("Packed {} -> {}", source.display(), destination.display());
    Ok(())
}
