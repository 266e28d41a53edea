//! Loading `.glb` and `.gltf` files back into a document plus buffer bytes.
//!
//! ```no_run
//! use glbsmith::reader::GltfFile;
//!
//! let file = GltfFile::open("scene.glb")?;
//! let positions = file.read_accessor_f32(0)?;
//! println!("{} floats", positions.len());
//! # Ok::<(), glbsmith::Error>(())
//! ```
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::glb::{Glb, is_glb};
use crate::layout::{ComponentType, span_end};
use crate::schema::{GltfAccessor, GltfDocument};

/// Decode a base64 `data:` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::InvalidDataUri("missing data: prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::InvalidDataUri("missing ',' separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(Error::InvalidDataUri(format!("unsupported encoding '{header}'")));
    }
    BASE64
        .decode(payload)
        .map_err(|e| Error::InvalidDataUri(e.to_string()))
}

/// A parsed document with every buffer resolved to bytes.
#[derive(Debug, Clone)]
pub struct GltfFile {
    pub document: GltfDocument,
    pub buffers: Vec<Vec<u8>>,
}

impl GltfFile {
    /// Read a `.glb` or `.gltf` file; relative URIs resolve against its directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        tracing::debug!("Reading {} ({} bytes)", path.display(), data.len());
        Self::from_slice(&data, path.parent())
    }

    /// Parse GLB or JSON bytes. Without `base_dir`, only embedded buffers resolve.
    pub fn from_slice(data: &[u8], base_dir: Option<&Path>) -> Result<Self> {
        let (json, bin) = if is_glb(data) {
            let glb = Glb::from_slice(data)?;
            (glb.json, glb.bin)
        } else {
            (data, None)
        };
        let document = GltfDocument::from_json_slice(json)?;
        let buffers = document
            .buffers
            .iter()
            .enumerate()
            .map(|(index, buffer)| {
                let mut bytes = match buffer.uri.as_deref() {
                    None => match (index, bin) {
                        (0, Some(bin)) => bin.to_vec(),
                        _ => {
                            return Err(Error::UnresolvedBuffer {
                                index,
                                message: "no uri and no GLB binary chunk".to_string(),
                            });
                        }
                    },
                    Some(uri) if uri.starts_with("data:") => decode_data_uri(uri)?,
                    Some(uri) => {
                        let dir = base_dir.ok_or_else(|| Error::UnresolvedBuffer {
                            index,
                            message: format!("external uri '{uri}' without a base directory"),
                        })?;
                        std::fs::read(dir.join(uri.replace("%20", " ")))?
                    }
                };
                if bytes.len() < buffer.byte_length {
                    return Err(Error::UnresolvedBuffer {
                        index,
                        message: format!("{} bytes available, {} declared", bytes.len(), buffer.byte_length),
                    });
                }
                // GLB chunks carry up to three padding bytes
                bytes.truncate(buffer.byte_length);
                Ok(bytes)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { document, buffers })
    }

    /// Bytes covered by a buffer view.
    pub fn buffer_view_bytes(&self, view: usize) -> Result<&[u8]> {
        let views = &self.document.buffer_views;
        let bv = views.get(view).ok_or(Error::InvalidIndex {
            kind: "bufferViews",
            index: view,
            len: views.len(),
        })?;
        let buffer = self.buffers.get(bv.buffer).ok_or(Error::InvalidIndex {
            kind: "buffers",
            index: bv.buffer,
            len: self.buffers.len(),
        })?;
        let end = bv.byte_offset.checked_add(bv.byte_length).unwrap_or(usize::MAX);
        buffer.get(bv.byte_offset..end).ok_or(Error::BufferViewOutOfBounds {
            buffer_view: view,
            end,
            buffer_length: buffer.len(),
        })
    }

    fn accessor(&self, index: usize) -> Result<&GltfAccessor> {
        let accessors = &self.document.accessors;
        accessors.get(index).ok_or(Error::InvalidIndex {
            kind: "accessors",
            index,
            len: accessors.len(),
        })
    }

    /// Every component of an accessor as `f32`, element after element.
    ///
    /// Honors byte offset, byte stride, normalization and sparse substitution.
    /// An accessor without a buffer view reads as zeros before substitution.
    pub fn read_accessor_f32(&self, index: usize) -> Result<Vec<f32>> {
        let accessor = self.accessor(index)?;
        let components = accessor.accessor_type.cardinality();
        let size = accessor.component_type.size();
        let decode = |bytes: &[u8]| decode_float(bytes, accessor.component_type, accessor.normalized);

        let elements = accessor
            .buffer_view
            .map(|view| self.elements(index, accessor, view))
            .transpose()?;
        let len = accessor.count.checked_mul(components).ok_or(Error::AccessorOutOfBounds {
            accessor: index,
            required: usize::MAX,
            available: 0,
        })?;
        let mut out = vec![0.0; len];
        if let Some(elements) = elements {
            for (element, bytes) in out.chunks_exact_mut(components).zip(elements) {
                for (c, value) in element.iter_mut().enumerate() {
                    *value = decode(&bytes[c * size..]);
                }
            }
        }

        if let Some(sparse) = &accessor.sparse {
            let indices = self.buffer_view_bytes(sparse.indices.buffer_view)?;
            let values = self.buffer_view_bytes(sparse.values.buffer_view)?;
            let index_size = sparse.indices.component_type.size();
            let element = components * size;
            for i in 0..sparse.count {
                let start = span_end(sparse.indices.byte_offset, index_size, i, 0).unwrap_or(usize::MAX);
                let end = start.saturating_add(index_size);
                let target = indices
                    .get(start..end)
                    .map(|b| decode_index(b, sparse.indices.component_type))
                    .ok_or(Error::AccessorOutOfBounds {
                        accessor: index,
                        required: end,
                        available: indices.len(),
                    })? as usize;
                let value_end = span_end(sparse.values.byte_offset, element, i + 1, 0).unwrap_or(usize::MAX);
                let bytes = values
                    .get(value_end.saturating_sub(element)..value_end)
                    .ok_or(Error::AccessorOutOfBounds {
                        accessor: index,
                        required: value_end,
                        available: values.len(),
                    })?;
                let slot = out.get_mut(target * components..(target + 1) * components).ok_or(Error::InvalidIndex {
                    kind: "sparse target",
                    index: target,
                    len: accessor.count,
                })?;
                for (c, value) in slot.iter_mut().enumerate() {
                    *value = decode(&bytes[c * size..]);
                }
            }
        }
        Ok(out)
    }

    /// Scalar unsigned index accessor as `u32`.
    pub fn read_indices(&self, index: usize) -> Result<Vec<u32>> {
        let accessor = self.accessor(index)?;
        let Some(view) = accessor.buffer_view else {
            return Ok(vec![0; accessor.count]);
        };
        Ok(self
            .elements(index, accessor, view)?
            .map(|bytes| decode_index(bytes, accessor.component_type))
            .collect())
    }

    /// One byte slice per element, bounds checked up front.
    fn elements<'a>(
        &'a self,
        index: usize,
        accessor: &GltfAccessor,
        view: usize,
    ) -> Result<impl Iterator<Item = &'a [u8]> + 'a> {
        let bytes = self.buffer_view_bytes(view)?;
        let element = accessor.element_size();
        let stride = self.document.buffer_views[view].byte_stride.unwrap_or(element);
        let offset = accessor.byte_offset;
        if accessor.count > 0 {
            let required = span_end(offset, stride, accessor.count - 1, element).unwrap_or(usize::MAX);
            if required > bytes.len() {
                return Err(Error::AccessorOutOfBounds {
                    accessor: index,
                    required,
                    available: bytes.len(),
                });
            }
        }
        Ok((0..accessor.count).map(move |i| {
            let start = offset + i * stride;
            &bytes[start..start + element]
        }))
    }
}

fn decode_float(bytes: &[u8], component_type: ComponentType, normalized: bool) -> f32 {
    match (component_type, normalized) {
        (ComponentType::Float, _) => LittleEndian::read_f32(bytes),
        (ComponentType::UnsignedByte, true) => f32::from(bytes[0]) / 255.0,
        (ComponentType::Byte, true) => (f32::from(bytes[0] as i8) / 127.0).max(-1.0),
        (ComponentType::UnsignedShort, true) => f32::from(LittleEndian::read_u16(bytes)) / 65535.0,
        (ComponentType::Short, true) => (f32::from(LittleEndian::read_i16(bytes)) / 32767.0).max(-1.0),
        (ComponentType::UnsignedInt, true) => LittleEndian::read_u32(bytes) as f32 / u32::MAX as f32,
        (ComponentType::UnsignedByte, false) => f32::from(bytes[0]),
        (ComponentType::Byte, false) => f32::from(bytes[0] as i8),
        (ComponentType::UnsignedShort, false) => f32::from(LittleEndian::read_u16(bytes)),
        (ComponentType::Short, false) => f32::from(LittleEndian::read_i16(bytes)),
        (ComponentType::UnsignedInt, false) => LittleEndian::read_u32(bytes) as f32,
    }
}

fn decode_index(bytes: &[u8], component_type: ComponentType) -> u32 {
    match component_type {
        ComponentType::UnsignedByte | ComponentType::Byte => u32::from(bytes[0]),
        ComponentType::UnsignedShort | ComponentType::Short => u32::from(LittleEndian::read_u16(bytes)),
        ComponentType::UnsignedInt | ComponentType::Float => LittleEndian::read_u32(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::AccessorType;
    use crate::schema::{GltfBuffer, GltfBufferView, GltfSparse, GltfSparseIndices, GltfSparseValues};

    fn file(bytes: Vec<u8>, views: Vec<GltfBufferView>, accessors: Vec<GltfAccessor>) -> GltfFile {
        GltfFile {
            document: GltfDocument {
                buffers: vec![GltfBuffer {
                    byte_length: bytes.len(),
                    uri: None,
                    name: None,
                }],
                buffer_views: views,
                accessors,
                ..GltfDocument::default()
            },
            buffers: vec![bytes],
        }
    }

    fn view(byte_offset: usize, byte_length: usize, byte_stride: Option<usize>) -> GltfBufferView {
        GltfBufferView {
            buffer: 0,
            byte_offset,
            byte_length,
            byte_stride,
            target: None,
            name: None,
        }
    }

    #[test]
    fn test_strided_normalized_read() {
        // two VEC2 u8 elements interleaved with two padding bytes each
        let bytes = vec![255, 0, 9, 9, 0, 255, 9, 9];
        let mut accessor = GltfAccessor::new(0, ComponentType::UnsignedByte, AccessorType::Vec2, 2);
        accessor.normalized = true;
        let f = file(bytes, vec![view(0, 8, Some(4))], vec![accessor]);
        assert_eq!(f.read_accessor_f32(0).unwrap(), vec![1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_sparse_substitution() {
        let mut bytes = Vec::new();
        for v in [1.0f32, 2.0, 3.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(&7.0f32.to_le_bytes());
        let mut accessor = GltfAccessor::new(0, ComponentType::Float, AccessorType::Scalar, 3);
        accessor.sparse = Some(GltfSparse {
            count: 1,
            indices: GltfSparseIndices {
                buffer_view: 1,
                byte_offset: 0,
                component_type: ComponentType::UnsignedShort,
            },
            values: GltfSparseValues {
                buffer_view: 2,
                byte_offset: 0,
            },
        });
        let f = file(
            bytes,
            vec![view(0, 12, None), view(12, 2, None), view(16, 4, None)],
            vec![accessor],
        );
        assert_eq!(f.read_accessor_f32(0).unwrap(), vec![1.0, 2.0, 7.0]);
    }

    #[test]
    fn test_read_indices_out_of_bounds() {
        let f = file(
            vec![0; 4],
            vec![view(0, 4, None)],
            vec![GltfAccessor::new(0, ComponentType::UnsignedShort, AccessorType::Scalar, 3)],
        );
        assert!(matches!(f.read_indices(0), Err(Error::AccessorOutOfBounds { .. })));
    }

    #[test]
    fn test_oversized_count_is_rejected() {
        let json = br#"{"asset":{"version":"2.0"},
            "buffers":[{"byteLength":4,"uri":"data:application/octet-stream;base64,AAAAAA=="}],
            "bufferViews":[{"buffer":0,"byteLength":4}],
            "accessors":[{"bufferView":0,"componentType":5126,"count":4611686018427387904,"type":"VEC4"}]}"#;
        let f = GltfFile::from_slice(json, None).unwrap();
        assert!(matches!(f.read_accessor_f32(0), Err(Error::AccessorOutOfBounds { .. })));
        assert!(matches!(f.read_indices(0), Err(Error::AccessorOutOfBounds { .. })));

        let huge = file(
            vec![0; 4],
            vec![view(usize::MAX, 4, None)],
            vec![GltfAccessor::new(0, ComponentType::Float, AccessorType::Scalar, 1)],
        );
        assert!(matches!(huge.read_accessor_f32(0), Err(Error::BufferViewOutOfBounds { .. })));
    }

    #[test]
    fn test_data_uri_buffer() {
        let json = br#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":3,"uri":"data:application/octet-stream;base64,AQID"}]}"#;
        let f = GltfFile::from_slice(json, None).unwrap();
        assert_eq!(f.buffers[0], vec![1, 2, 3]);
        assert!(decode_data_uri("data:text/plain,abc").is_err());
    }

    #[test]
    fn test_external_buffer_needs_base_dir() {
        let json = br#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":3,"uri":"a.bin"}]}"#;
        assert!(matches!(
            GltfFile::from_slice(json, None),
            Err(Error::UnresolvedBuffer { index: 0, .. })
        ));
    }
}
