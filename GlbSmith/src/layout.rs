//! Binary layout primitives.
//!
//! Component sizes, accessor cardinality, alignment padding and byte stride
//! rules shared by the writer, the reader and document validation.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use serde::Deserialize;

use crate::error::{Error, Result};

/// glTF accessor component type (`accessor.componentType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u32")]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    UnsignedInt,
    Float,
}

impl ComponentType {
    /// Size of one component in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::UnsignedInt | Self::Float => 4,
        }
    }

    /// The GL enum value written to JSON.
    #[must_use]
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Byte => 5120,
            Self::UnsignedByte => 5121,
            Self::Short => 5122,
            Self::UnsignedShort => 5123,
            Self::UnsignedInt => 5125,
            Self::Float => 5126,
        }
    }

    pub fn from_gl_enum(value: u32) -> Result<Self> {
        match value {
            5120 => Ok(Self::Byte),
            5121 => Ok(Self::UnsignedByte),
            5122 => Ok(Self::Short),
            5123 => Ok(Self::UnsignedShort),
            5125 => Ok(Self::UnsignedInt),
            5126 => Ok(Self::Float),
            other => Err(Error::UnknownComponentType(other)),
        }
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Self::from_gl_enum(value)
    }
}

/// glTF accessor element type (`accessor.type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum AccessorType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AccessorType {
    /// Number of components per element.
    #[must_use]
    pub const fn cardinality(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Vec2 => "VEC2",
            Self::Vec3 => "VEC3",
            Self::Vec4 => "VEC4",
            Self::Mat2 => "MAT2",
            Self::Mat3 => "MAT3",
            Self::Mat4 => "MAT4",
        }
    }

    /// Vector type with `dimension` components (1..=4).
    pub fn from_dimension(dimension: usize) -> Result<Self> {
        match dimension {
            1 => Ok(Self::Scalar),
            2 => Ok(Self::Vec2),
            3 => Ok(Self::Vec3),
            4 => Ok(Self::Vec4),
            other => Err(Error::UnknownAccessorType(format!("VEC{other}"))),
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "SCALAR" => Ok(Self::Scalar),
            "VEC2" => Ok(Self::Vec2),
            "VEC3" => Ok(Self::Vec3),
            "VEC4" => Ok(Self::Vec4),
            "MAT2" => Ok(Self::Mat2),
            "MAT3" => Ok(Self::Mat3),
            "MAT4" => Ok(Self::Mat4),
            other => Err(Error::UnknownAccessorType(other.to_string())),
        }
    }

    /// Number of matrix columns, `None` for scalars and vectors.
    const fn columns(self) -> Option<usize> {
        match self {
            Self::Mat2 => Some(2),
            Self::Mat3 => Some(3),
            Self::Mat4 => Some(4),
            _ => None,
        }
    }
}

impl TryFrom<String> for AccessorType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

/// Buffer view binding target (`bufferView.target`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u32")]
pub enum BufferViewTarget {
    ArrayBuffer,
    ElementArrayBuffer,
}

impl BufferViewTarget {
    #[must_use]
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::ArrayBuffer => 34962,
            Self::ElementArrayBuffer => 34963,
        }
    }
}

impl TryFrom<u32> for BufferViewTarget {
    type Error = String;

    fn try_from(value: u32) -> std::result::Result<Self, String> {
        match value {
            34962 => Ok(Self::ArrayBuffer),
            34963 => Ok(Self::ElementArrayBuffer),
            other => Err(format!("unknown buffer view target: {other}")),
        }
    }
}

/// Number of zero bytes needed to bring `length` up to a multiple of `alignment`.
///
/// `(align - (len % align)) % align`; alignment 0 means "no alignment".
#[must_use]
pub const fn pad_byte_count(length: usize, alignment: usize) -> usize {
    if alignment == 0 {
        return 0;
    }
    (alignment - (length % alignment)) % alignment
}

/// End of `n` strides plus a trailing element: `offset + stride * n + tail`.
/// `None` when the sum overflows.
pub const fn span_end(offset: usize, stride: usize, n: usize, tail: usize) -> Option<usize> {
    match stride.checked_mul(n) {
        Some(v) => match v.checked_add(offset) {
            Some(v) => v.checked_add(tail),
            None => None,
        },
        None => None,
    }
}

/// Only 0 (none), 1, 2 and 4 byte alignment are meaningful for buffer views.
pub fn check_alignment(alignment: usize) -> Result<()> {
    match alignment {
        0 | 1 | 2 | 4 => Ok(()),
        other => Err(Error::InvalidAlignment(other)),
    }
}

/// Byte size of one accessor element, including the column padding glTF
/// requires for 1- and 2-byte matrices.
#[must_use]
pub const fn element_size(component_type: ComponentType, accessor_type: AccessorType) -> usize {
    let component = component_type.size();
    match accessor_type.columns() {
        Some(columns) if component < 4 => {
            let rows = columns;
            let column_bytes = rows * component;
            (column_bytes + pad_byte_count(column_bytes, 4)) * columns
        }
        _ => component * accessor_type.cardinality(),
    }
}

/// Validate a `byteStride` against the element it carries.
pub fn check_byte_stride(stride: usize, element_size: usize) -> std::result::Result<(), &'static str> {
    if stride % 4 != 0 {
        return Err("must be a multiple of 4");
    }
    if !(4..=252).contains(&stride) {
        return Err("must be within 4..=252");
    }
    if stride < element_size {
        return Err("smaller than the element it carries");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_end_overflow() {
        assert_eq!(span_end(4, 16, 2, 12), Some(48));
        assert_eq!(span_end(0, usize::MAX, 2, 0), None);
        assert_eq!(span_end(usize::MAX, 1, 0, 1), None);
    }

    #[test]
    fn test_component_sizes() {
        assert_eq!(ComponentType::Byte.size(), 1);
        assert_eq!(ComponentType::UnsignedShort.size(), 2);
        assert_eq!(ComponentType::Float.size(), 4);
        assert_eq!(ComponentType::from_gl_enum(5123).unwrap(), ComponentType::UnsignedShort);
        assert!(matches!(
            ComponentType::from_gl_enum(5124),
            Err(Error::UnknownComponentType(5124))
        ));
    }

    #[test]
    fn test_cardinality() {
        let expected = [1, 2, 3, 4, 4, 9, 16];
        let types = [
            AccessorType::Scalar,
            AccessorType::Vec2,
            AccessorType::Vec3,
            AccessorType::Vec4,
            AccessorType::Mat2,
            AccessorType::Mat3,
            AccessorType::Mat4,
        ];
        for (ty, n) in types.iter().zip(expected) {
            assert_eq!(ty.cardinality(), n);
            assert_eq!(AccessorType::parse(ty.as_str()).unwrap(), *ty);
        }
    }

    #[test]
    fn test_pad_byte_count() {
        assert_eq!(pad_byte_count(0, 4), 0);
        assert_eq!(pad_byte_count(1, 4), 3);
        assert_eq!(pad_byte_count(5, 4), 3);
        assert_eq!(pad_byte_count(6, 4), 2);
        assert_eq!(pad_byte_count(7, 2), 1);
        assert_eq!(pad_byte_count(7, 1), 0);
        assert_eq!(pad_byte_count(7, 0), 0);
        for len in 0..64 {
            assert_eq!(pad_byte_count(len, 4), (4 - (len & 3)) & 3);
        }
    }

    #[test]
    fn test_alignment_rejected_above_four() {
        assert!(check_alignment(4).is_ok());
        assert!(matches!(check_alignment(8), Err(Error::InvalidAlignment(8))));
        assert!(check_alignment(3).is_err());
    }

    #[test]
    fn test_matrix_element_padding() {
        assert_eq!(element_size(ComponentType::Float, AccessorType::Mat4), 64);
        assert_eq!(element_size(ComponentType::UnsignedByte, AccessorType::Mat2), 8);
        assert_eq!(element_size(ComponentType::UnsignedByte, AccessorType::Mat3), 12);
        assert_eq!(element_size(ComponentType::Short, AccessorType::Mat3), 24);
        assert_eq!(element_size(ComponentType::UnsignedShort, AccessorType::Vec3), 6);
    }

    #[test]
    fn test_byte_stride_rules() {
        assert!(check_byte_stride(12, 12).is_ok());
        assert!(check_byte_stride(6, 6).is_err());
        assert!(check_byte_stride(8, 12).is_err());
        assert!(check_byte_stride(256, 12).is_err());
    }
}
