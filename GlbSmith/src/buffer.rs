//! Append-only binary buffer and buffer view allocator.
//!
//! Every exported accessor and embedded image lands in a single buffer
//! (index 0). The backing storage is created lazily on the first write: an
//! in-memory `Vec<u8>` for GLB and stream exports, or a file for JSON exports
//! with a sibling `.bin`.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::layout::{BufferViewTarget, check_alignment, check_byte_stride, pad_byte_count};
use crate::schema::GltfBufferView;

const ZEROES: [u8; 4] = [0; 4];

enum BufferSink {
    Memory(Vec<u8>),
    File(BufWriter<File>),
}

impl BufferSink {
    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self {
            Self::Memory(data) => {
                data.extend_from_slice(bytes);
                Ok(())
            }
            Self::File(writer) => writer.write_all(bytes),
        }
    }
}

/// Where the buffer's bytes ended up once the allocator is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferData {
    /// Nothing was ever written.
    Empty,
    /// Bytes held in memory, destined for a GLB BIN chunk or a data URI.
    Memory(Vec<u8>),
    /// Bytes already flushed to an external file.
    File(PathBuf),
}

/// Result of [`BufferWriter::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedBuffer {
    pub views: Vec<GltfBufferView>,
    pub byte_length: usize,
    pub data: BufferData,
}

/// Append-only allocator returning buffer view indices.
pub struct BufferWriter {
    destination: Option<PathBuf>,
    sink: Option<BufferSink>,
    length: usize,
    views: Vec<GltfBufferView>,
}

impl BufferWriter {
    /// Allocator backed by a growable in-memory buffer.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            destination: None,
            sink: None,
            length: 0,
            views: Vec::new(),
        }
    }

    /// Allocator that streams into `path` (created on first write).
    #[must_use]
    pub fn file_backed(path: impl Into<PathBuf>) -> Self {
        Self {
            destination: Some(path.into()),
            ..Self::in_memory()
        }
    }

    /// Destination file, if this allocator is file backed.
    #[must_use]
    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// Bytes written so far, padding included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[must_use]
    pub fn views(&self) -> &[GltfBufferView] {
        &self.views
    }

    fn sink(&mut self) -> Result<&mut BufferSink> {
        let sink = match self.sink.take() {
            Some(sink) => sink,
            None => match &self.destination {
                Some(path) => {
                    tracing::debug!("Creating buffer file {}", path.display());
                    BufferSink::File(BufWriter::new(File::create(path)?))
                }
                None => BufferSink::Memory(Vec::new()),
            },
        };
        Ok(self.sink.insert(sink))
    }

    /// Append `data` as a new buffer view and return its index.
    ///
    /// When `alignment` is non-zero, zero bytes are inserted first so the view
    /// starts on a multiple of it. Only 0, 1, 2 and 4 are accepted.
    pub fn write_buffer_view(&mut self, data: &[u8], byte_stride: Option<usize>, alignment: usize) -> Result<usize> {
        check_alignment(alignment)?;
        let index = self.views.len();
        if let Some(stride) = byte_stride {
            check_byte_stride(stride, 0).map_err(|reason| Error::InvalidByteStride {
                buffer_view: index,
                stride,
                reason,
            })?;
        }

        let padding = pad_byte_count(self.length, alignment);
        let sink = self.sink()?;
        sink.write_all(&ZEROES[..padding])?;
        sink.write_all(data)?;

        let byte_offset = self.length + padding;
        self.length = byte_offset + data.len();
        self.views.push(GltfBufferView {
            buffer: 0,
            byte_offset,
            byte_length: data.len(),
            byte_stride,
            target: None,
            name: None,
        });
        Ok(index)
    }

    /// Like [`Self::write_buffer_view`], tagging the view with a GPU binding target.
    pub fn write_target_view(
        &mut self,
        data: &[u8],
        byte_stride: Option<usize>,
        alignment: usize,
        target: BufferViewTarget,
    ) -> Result<usize> {
        let index = self.write_buffer_view(data, byte_stride, alignment)?;
        self.views[index].target = Some(target);
        Ok(index)
    }

    /// Flush and close the backing storage.
    pub fn finish(self) -> Result<FinishedBuffer> {
        let data = match self.sink {
            None => BufferData::Empty,
            Some(BufferSink::Memory(bytes)) => BufferData::Memory(bytes),
            Some(BufferSink::File(mut writer)) => {
                writer.flush()?;
                match self.destination {
                    Some(path) => BufferData::File(path),
                    None => BufferData::Empty,
                }
            }
        };
        Ok(FinishedBuffer {
            views: self.views,
            byte_length: self.length,
            data,
        })
    }
}

impl Default for BufferWriter {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_invariant() {
        for alignment in [1, 2, 4] {
            for prior in 0..8 {
                let mut writer = BufferWriter::in_memory();
                if prior > 0 {
                    writer.write_buffer_view(&vec![0xAA; prior], None, 0).unwrap();
                }
                let index = writer.write_buffer_view(&[1, 2, 3, 4], None, alignment).unwrap();
                let view = &writer.views()[index];
                assert_eq!(view.byte_offset % alignment, 0);
                assert_eq!(view.byte_offset - prior, (alignment - prior % alignment) % alignment);
            }
        }
    }

    #[test]
    fn test_padding_is_zero() {
        let mut writer = BufferWriter::in_memory();
        writer.write_buffer_view(&[0xFF], None, 0).unwrap();
        writer.write_buffer_view(&[0xEE; 4], Some(4), 4).unwrap();
        let finished = writer.finish().unwrap();
        assert_eq!(finished.byte_length, 8);
        assert_eq!(finished.views[1].byte_offset, 4);
        assert_eq!(finished.views[1].byte_stride, Some(4));
        assert_eq!(
            finished.data,
            BufferData::Memory(vec![0xFF, 0, 0, 0, 0xEE, 0xEE, 0xEE, 0xEE])
        );
    }

    #[test]
    fn test_rejects_large_alignment() {
        let mut writer = BufferWriter::in_memory();
        assert!(matches!(
            writer.write_buffer_view(&[0], None, 8),
            Err(Error::InvalidAlignment(8))
        ));
        assert!(writer.views().is_empty());
    }

    #[test]
    fn test_untouched_buffer_is_empty() {
        let finished = BufferWriter::in_memory().finish().unwrap();
        assert_eq!(finished.data, BufferData::Empty);
        assert_eq!(finished.byte_length, 0);
    }

    #[test]
    fn test_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.bin");
        let mut writer = BufferWriter::file_backed(&path);
        assert!(!path.exists());
        writer
            .write_target_view(&[1, 2, 3], None, 4, BufferViewTarget::ArrayBuffer)
            .unwrap();
        writer.write_buffer_view(&[9; 4], None, 4).unwrap();
        let finished = writer.finish().unwrap();
        assert_eq!(finished.data, BufferData::File(path.clone()));
        assert_eq!(finished.views[0].target, Some(BufferViewTarget::ArrayBuffer));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3, 0, 9, 9, 9, 9]);
    }
}
