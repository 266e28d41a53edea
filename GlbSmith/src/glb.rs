//! GLB container framing.
//!
//! ```text
//! header : magic "glTF" | version 2 | total length
//! chunk 0: length | "JSON" | UTF-8 JSON padded with 0x20
//! chunk 1: length | "BIN\0" | binary buffer padded with 0x00   (optional)
//! ```
//!
//! All integers are little-endian and both chunk lengths are multiples of 4.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use std::io::{Seek, SeekFrom, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::json::CountingWriter;
use crate::layout::pad_byte_count;
use crate::schema::GltfDocument;

pub const GLB_MAGIC: u32 = 0x4654_6C67;
pub const GLB_VERSION: u32 = 2;
pub const CHUNK_JSON: u32 = 0x4E4F_534A;
pub const CHUNK_BIN: u32 = 0x004E_4942;

pub const HEADER_LEN: usize = 12;
pub const CHUNK_HEADER_LEN: usize = 8;

const SPACES: [u8; 4] = [b' '; 4];
const ZEROES: [u8; 4] = [0; 4];

/// Total file length for a JSON chunk of `json_len` bytes and an optional BIN
/// chunk of `bin_len` bytes, both before padding.
#[must_use]
pub fn glb_length(json_len: usize, bin_len: Option<usize>) -> usize {
    let json = json_len + pad_byte_count(json_len, 4);
    let bin = bin_len.map_or(0, |len| CHUNK_HEADER_LEN + len + pad_byte_count(len, 4));
    HEADER_LEN + CHUNK_HEADER_LEN + json + bin
}

/// `true` when `data` starts with the GLB magic.
#[must_use]
pub fn is_glb(data: &[u8]) -> bool {
    data.len() >= 4 && LittleEndian::read_u32(data) == GLB_MAGIC
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::InvalidGlbChunk {
        message: format!("{value} bytes exceed the 4 GiB GLB limit"),
    })
}

fn write_header<W: Write>(out: &mut W, total: usize, json_chunk_len: usize) -> Result<()> {
    out.write_u32::<LittleEndian>(GLB_MAGIC)?;
    out.write_u32::<LittleEndian>(GLB_VERSION)?;
    out.write_u32::<LittleEndian>(to_u32(total)?)?;
    out.write_u32::<LittleEndian>(to_u32(json_chunk_len)?)?;
    out.write_u32::<LittleEndian>(CHUNK_JSON)?;
    Ok(())
}

fn write_bin_chunk<W: Write>(out: &mut W, bin: &[u8]) -> Result<()> {
    let padding = pad_byte_count(bin.len(), 4);
    out.write_u32::<LittleEndian>(to_u32(bin.len() + padding)?)?;
    out.write_u32::<LittleEndian>(CHUNK_BIN)?;
    out.write_all(bin)?;
    out.write_all(&ZEROES[..padding])?;
    Ok(())
}

/// Write a GLB to a forward-only stream.
///
/// The JSON is serialized once into a byte counter to size the header, then
/// streamed a second time straight into `out`.
pub fn write_glb<W: Write>(document: &GltfDocument, bin: Option<&[u8]>, mut out: W) -> Result<W> {
    let json_len = document.write_json(CountingWriter::new())?.count();
    let json_padding = pad_byte_count(json_len, 4);
    let total = glb_length(json_len, bin.map(<[u8]>::len));

    write_header(&mut out, total, json_len + json_padding)?;
    let mut out = document.write_json(out)?;
    out.write_all(&SPACES[..json_padding])?;
    if let Some(bin) = bin {
        write_bin_chunk(&mut out, bin)?;
    }
    out.flush()?;
    tracing::debug!("Wrote GLB: {total} bytes (JSON {json_len})");
    Ok(out)
}

/// Write a GLB to a seekable destination.
///
/// Lengths are written as placeholders, the JSON is streamed once, and the
/// header is patched afterwards.
pub fn write_glb_seekable<W: Write + Seek>(document: &GltfDocument, bin: Option<&[u8]>, mut out: W) -> Result<W> {
    let start = out.stream_position()?;
    out.write_all(&[0; HEADER_LEN + CHUNK_HEADER_LEN])?;

    let mut out = document.write_json(out)?;
    let json_len = usize::try_from(out.stream_position()? - start)
        .map_err(|_| Error::InvalidGlbChunk {
            message: "JSON chunk too large".to_string(),
        })?
        - HEADER_LEN
        - CHUNK_HEADER_LEN;
    let json_padding = pad_byte_count(json_len, 4);
    out.write_all(&SPACES[..json_padding])?;
    if let Some(bin) = bin {
        write_bin_chunk(&mut out, bin)?;
    }
    let end = out.stream_position()?;

    let total = glb_length(json_len, bin.map(<[u8]>::len));
    out.seek(SeekFrom::Start(start))?;
    write_header(&mut out, total, json_len + json_padding)?;
    out.seek(SeekFrom::Start(end))?;
    out.flush()?;
    tracing::debug!("Wrote GLB: {total} bytes (JSON {json_len})");
    Ok(out)
}

/// Serialize a GLB into memory.
pub fn to_glb_bytes(document: &GltfDocument, bin: Option<&[u8]>) -> Result<Vec<u8>> {
    write_glb(document, bin, Vec::new())
}

/// Borrowed view of the chunks of a GLB file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glb<'a> {
    /// JSON chunk, trailing padding included.
    pub json: &'a [u8],
    pub bin: Option<&'a [u8]>,
}

impl<'a> Glb<'a> {
    /// Split `data` into its chunks.
    ///
    /// Magic and version are checked before any length is trusted. Chunks
    /// after the BIN chunk with unknown types are skipped.
    pub fn from_slice(data: &'a [u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::GlbLengthMismatch {
                declared: HEADER_LEN,
                actual: data.len(),
            });
        }
        let magic = LittleEndian::read_u32(&data[0..4]);
        if magic != GLB_MAGIC {
            return Err(Error::InvalidGlbMagic(magic));
        }
        let version = LittleEndian::read_u32(&data[4..8]);
        if version != GLB_VERSION {
            return Err(Error::UnsupportedGlbVersion { version });
        }
        let declared = LittleEndian::read_u32(&data[8..12]) as usize;
        if declared != data.len() {
            return Err(Error::GlbLengthMismatch {
                declared,
                actual: data.len(),
            });
        }

        let mut chunks = ChunkIter {
            data,
            offset: HEADER_LEN,
        };
        let json = match chunks.next().transpose()? {
            Some((CHUNK_JSON, json)) => json,
            _ => return Err(Error::MissingJsonChunk),
        };
        let mut bin = None;
        for chunk in chunks {
            let (kind, bytes) = chunk?;
            match kind {
                CHUNK_BIN if bin.is_none() => bin = Some(bytes),
                CHUNK_BIN | CHUNK_JSON => {
                    return Err(Error::InvalidGlbChunk {
                        message: format!("duplicate chunk {kind:#010x}"),
                    });
                }
                _ => tracing::debug!("Skipping unknown GLB chunk {kind:#010x}"),
            }
        }
        Ok(Self { json, bin })
    }
}

struct ChunkIter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Result<(u32, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }
        let rest = &self.data[self.offset..];
        if rest.len() < CHUNK_HEADER_LEN {
            self.offset = self.data.len();
            return Some(Err(Error::InvalidGlbChunk {
                message: format!("truncated chunk header at byte {}", self.offset),
            }));
        }
        let length = LittleEndian::read_u32(&rest[0..4]) as usize;
        let kind = LittleEndian::read_u32(&rest[4..8]);
        let body = &rest[CHUNK_HEADER_LEN..];
        if length > body.len() || length % 4 != 0 {
            self.offset = self.data.len();
            return Some(Err(Error::InvalidGlbChunk {
                message: format!("chunk {kind:#010x} declares {length} bytes, {} available", body.len()),
            }));
        }
        self.offset += CHUNK_HEADER_LEN + length;
        Some(Ok((kind, &body[..length])))
    }
}
