//! Save paths and destination file handling.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use super::bake::BakeTarget;
use super::{BakedDocument, BuilderState, DocumentBuilder};
use crate::buffer::BufferData;
use crate::error::{Error, Result};
use crate::glb::{write_glb, write_glb_seekable};
use crate::logger::{CodeLogger, Diagnostic, LogCode};
use crate::schema::GltfDocument;
use crate::settings::{ExportFormat, FileConflictResolution};

/// `data:` URI for an embedded buffer.
#[must_use]
pub fn buffer_data_uri(bytes: &[u8]) -> String {
    format!("data:application/octet-stream;base64,{}", BASE64.encode(bytes))
}

fn numbered(file_name: &str, n: usize) -> String {
    let path = Path::new(file_name);
    let stem = path.file_stem().map_or_else(|| file_name.into(), |s| s.to_string_lossy());
    match path.extension() {
        Some(ext) => format!("{stem}_{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{n}"),
    }
}

/// Allocates file names in one output directory, applying the conflict policy.
pub(super) struct OutputFiles {
    directory: PathBuf,
    policy: FileConflictResolution,
    claimed: HashSet<String>,
    logger: Option<Arc<dyn CodeLogger>>,
}

impl OutputFiles {
    pub fn new(directory: PathBuf, policy: FileConflictResolution, logger: Option<Arc<dyn CodeLogger>>) -> Self {
        Self {
            directory,
            policy,
            claimed: HashSet::new(),
            logger,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Reserve `file_name`, returning the name actually used.
    ///
    /// Names already handed out by this export are always suffixed. Existing
    /// files are handled by the policy: `Abort` fails, `Overwrite` reuses the
    /// name, `Rename` appends `_1`, `_2`, ... until the name is free.
    pub fn claim(&mut self, file_name: &str) -> Result<String> {
        let mut candidate = file_name.to_string();
        let mut n = 0;
        loop {
            if !self.claimed.contains(&candidate) {
                let path = self.directory.join(&candidate);
                if !path.exists() {
                    break;
                }
                match self.policy {
                    FileConflictResolution::Abort => return Err(Error::FileConflict { path }),
                    FileConflictResolution::Overwrite => {
                        Diagnostic::info(LogCode::FileOverwritten, vec![path.display().to_string()])
                            .emit(self.logger.as_deref());
                        break;
                    }
                    FileConflictResolution::Rename => {}
                }
            }
            n += 1;
            candidate = numbered(file_name, n);
        }
        if n > 0 {
            Diagnostic::info(LogCode::FileRenamed, vec![file_name.to_string(), candidate.clone()])
                .emit(self.logger.as_deref());
        }
        self.claimed.insert(candidate.clone());
        Ok(candidate)
    }
}

/// Point buffer 0 at `uri` when the bake left its bytes in memory.
fn set_buffer_uri(document: &mut GltfDocument, uri: String) {
    if let Some(buffer) = document.buffers.first_mut() {
        buffer.uri = Some(uri);
    }
}

fn memory_bytes(baked: &BakedDocument) -> Option<&[u8]> {
    match &baked.buffer {
        BufferData::Memory(bytes) if !baked.document.buffers.is_empty() => Some(bytes),
        _ => None,
    }
}

impl DocumentBuilder {
    fn take_baked(&mut self, target: BakeTarget<'_>) -> Result<BakedDocument> {
        match std::mem::replace(&mut self.state, BuilderState::Closed) {
            BuilderState::Baked(baked) => Ok(*baked),
            BuilderState::Building(pending) => {
                self.state = BuilderState::Building(pending);
                self.bake_with(target)
            }
            BuilderState::Closed => Err(Error::BuilderClosed),
        }
    }

    /// Save to `path` in the configured [`ExportFormat`].
    ///
    /// JSON output writes a sibling `.bin` and image files, unless buffers are
    /// embedded. The builder is closed afterwards, on success or failure.
    pub fn save_to_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let result = self.save_file_inner(path);
        self.state = BuilderState::Closed;
        if let Err(e) = &result {
            tracing::warn!("Saving {} failed: {e}", path.display());
        }
        result
    }

    fn save_file_inner(&mut self, path: &Path) -> Result<()> {
        if self.is_closed() {
            return Err(Error::BuilderClosed);
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidPath(path.display().to_string()))?;
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let mut files = OutputFiles::new(directory, self.settings.file_conflict_resolution, self.logger.clone());
        let file_name = files.claim(file_name)?;
        let stem = Path::new(&file_name)
            .file_stem()
            .map_or_else(|| "scene".to_string(), |s| s.to_string_lossy().into_owned());

        let json = self.settings.format == ExportFormat::Json;
        let target = if json && !self.settings.embed_buffers {
            BakeTarget::Files {
                files: &mut files,
                stem: &stem,
            }
        } else {
            BakeTarget::Memory
        };
        let mut baked = self.take_baked(target)?;
        self.cancellation.check()?;

        let out_path = files.directory().join(&file_name);
        if json {
            if let Some(bytes) = memory_bytes(&baked) {
                let uri = if self.settings.embed_buffers {
                    buffer_data_uri(bytes)
                } else {
                    let bin_name = files.claim(&format!("{stem}.bin"))?;
                    std::fs::write(files.directory().join(&bin_name), bytes)?;
                    bin_name
                };
                set_buffer_uri(&mut baked.document, uri);
            }
            let out = BufWriter::new(File::create(&out_path)?);
            baked.document.write_json(out)?.flush()?;
        } else {
            let out = BufWriter::new(File::create(&out_path)?);
            write_glb_seekable(&baked.document, memory_bytes(&baked), out)?.flush()?;
        }
        tracing::info!("Saved {}", out_path.display());
        Ok(())
    }

    /// Save to a stream: GLB for [`ExportFormat::Binary`], otherwise JSON.
    ///
    /// JSON written to a stream cannot reference external files, so a
    /// non-empty buffer must be embedded (`embed_buffers`) or the save fails
    /// with [`Error::NotSelfContained`]. The builder is closed afterwards.
    pub fn save_to_stream<W: Write>(&mut self, out: W) -> Result<W> {
        let result = self.save_stream_inner(out);
        self.state = BuilderState::Closed;
        if let Err(e) = &result {
            tracing::warn!("Saving to stream failed: {e}");
        }
        result
    }

    fn save_stream_inner<W: Write>(&mut self, out: W) -> Result<W> {
        let mut baked = self.take_baked(BakeTarget::Memory)?;
        self.cancellation.check()?;
        match self.settings.format {
            ExportFormat::Binary => write_glb(&baked.document, memory_bytes(&baked), out),
            ExportFormat::Json => {
                if let Some(bytes) = memory_bytes(&baked) {
                    if !self.settings.embed_buffers {
                        return Err(Error::NotSelfContained {
                            reason: format!("{} byte buffer needs a .bin file", bytes.len()),
                        });
                    }
                    let uri = buffer_data_uri(bytes);
                    set_buffer_uri(&mut baked.document, uri);
                }
                Ok(baked.document.write_json(out)?)
            }
        }
    }
}
