//! CLI command for unpacking a .glb into .gltf + .bin

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::pack::merge_buffers;
use crate::builder::buffer_data_uri;
use crate::reader::GltfFile;

pub fn execute(source: &Path, destination: &Path, embed: bool) -> anyhow::Result<()> {
    let file = GltfFile::open(source)?;
    let (mut document, bin) = merge_buffers(file, source.parent())?;

    if let Some(buffer) = document.buffers.first_mut() {
        if embed {
            buffer.uri = Some(buffer_data_uri(&bin));
        } else {
            let bin_path = destination.with_extension("bin");
            let bin_name = bin_path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow::anyhow!("invalid destination {}", destination.display()))?;
            buffer.uri = Some(bin_name.to_string());
            std::fs::write(&bin_path, &bin)?;
            println!("Wrote {}", bin_path.display());
        }
    }

    let out = BufWriter::new(File::create(destination)?);
    document.write_json(out)?.flush()?;

    println!("Unpacked {} -> {}", source.display(), destination.display());
    Ok(())
}
