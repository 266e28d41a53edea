//! Per-element conversions between the host's left-handed space and glTF.

use byteorder::{ByteOrder, LittleEndian};
use glam::Mat4;
use half::f16;

use super::{Topology, VertexAttributeDescriptor, VertexFormat, VertexStream};
use crate::logger::{Diagnostic, LogCode};
use crate::schema::DrawMode;

/// Decode one component as a float, applying normalization for the `*Norm*` formats.
pub(super) fn decode_component(bytes: &[u8], format: VertexFormat) -> f32 {
    match format {
        VertexFormat::Float32 => LittleEndian::read_f32(bytes),
        VertexFormat::Float16 => f16::from_bits(LittleEndian::read_u16(bytes)).to_f32(),
        VertexFormat::UNorm8 => f32::from(bytes[0]) / 255.0,
        VertexFormat::SNorm8 => (f32::from(bytes[0] as i8) / 127.0).max(-1.0),
        VertexFormat::UNorm16 => f32::from(LittleEndian::read_u16(bytes)) / 65535.0,
        VertexFormat::SNorm16 => (f32::from(LittleEndian::read_i16(bytes)) / 32767.0).max(-1.0),
        VertexFormat::UInt8 => f32::from(bytes[0]),
        VertexFormat::SInt8 => f32::from(bytes[0] as i8),
        VertexFormat::UInt16 => f32::from(LittleEndian::read_u16(bytes)),
        VertexFormat::SInt16 => f32::from(LittleEndian::read_i16(bytes)),
        VertexFormat::UInt32 => LittleEndian::read_u32(bytes) as f32,
        VertexFormat::SInt32 => LittleEndian::read_i32(bytes) as f32,
    }
}

/// Decode one component as an unsigned integer (bone indices).
pub(super) fn decode_integer(bytes: &[u8], format: VertexFormat) -> u32 {
    match format {
        VertexFormat::UInt8 | VertexFormat::UNorm8 => u32::from(bytes[0]),
        VertexFormat::SInt8 | VertexFormat::SNorm8 => (bytes[0] as i8).max(0) as u32,
        VertexFormat::UInt16 | VertexFormat::UNorm16 => u32::from(LittleEndian::read_u16(bytes)),
        VertexFormat::SInt16 | VertexFormat::SNorm16 => LittleEndian::read_i16(bytes).max(0) as u32,
        VertexFormat::UInt32 => LittleEndian::read_u32(bytes),
        VertexFormat::SInt32 => LittleEndian::read_i32(bytes).max(0) as u32,
        VertexFormat::Float32 | VertexFormat::Float16 => decode_component(bytes, format).max(0.0) as u32,
    }
}

/// Slice of every vertex's bytes for one attribute, `None` when the
/// descriptor reaches past the end of its stream.
pub(super) fn attribute_slices<'a>(
    stream: &'a VertexStream,
    descriptor: &VertexAttributeDescriptor,
    vertex_count: usize,
) -> Option<impl Iterator<Item = &'a [u8]> + 'a> {
    let width = descriptor.format.size() * descriptor.dimension;
    if vertex_count > 0 {
        let last = descriptor.offset + stream.stride * (vertex_count - 1) + width;
        if last > stream.data.len() || (vertex_count > 1 && stream.stride == 0) {
            return None;
        }
    }
    let offset = descriptor.offset;
    let stride = stream.stride;
    Some((0..vertex_count).map(move |i| {
        let start = offset + i * stride;
        &stream.data[start..start + width]
    }))
}

/// Read up to four float components per vertex; missing components are zero.
pub(super) fn read_floats(
    stream: &VertexStream,
    descriptor: &VertexAttributeDescriptor,
    vertex_count: usize,
) -> Option<Vec<[f32; 4]>> {
    let size = descriptor.format.size();
    let used = descriptor.dimension.min(4);
    let slices = attribute_slices(stream, descriptor, vertex_count)?;
    Some(
        slices
            .map(|bytes| {
                let mut out = [0.0; 4];
                for (c, value) in out.iter_mut().enumerate().take(used) {
                    *value = decode_component(&bytes[c * size..], descriptor.format);
                }
                out
            })
            .collect(),
    )
}

/// Read up to four integer components per vertex; missing components are zero.
pub(super) fn read_integers(
    stream: &VertexStream,
    descriptor: &VertexAttributeDescriptor,
    vertex_count: usize,
) -> Option<Vec<[u32; 4]>> {
    let size = descriptor.format.size();
    let used = descriptor.dimension.min(4);
    let slices = attribute_slices(stream, descriptor, vertex_count)?;
    Some(
        slices
            .map(|bytes| {
                let mut out = [0; 4];
                for (c, value) in out.iter_mut().enumerate().take(used) {
                    *value = decode_integer(&bytes[c * size..], descriptor.format);
                }
                out
            })
            .collect(),
    )
}

#[inline]
pub(super) fn convert_position(v: [f32; 4]) -> [f32; 3] {
    [-v[0], v[1], v[2]]
}

#[inline]
pub(super) fn convert_tangent(v: [f32; 4]) -> [f32; 4] {
    [v[0], v[1], -v[2], v[3]]
}

#[inline]
pub(super) fn convert_uv(v: [f32; 4]) -> [f32; 2] {
    [v[0], 1.0 - v[1]]
}

fn check_remainder(len: usize, size: usize, topology: Topology, diagnostics: &mut Vec<Diagnostic>) {
    if len % size != 0 {
        diagnostics.push(Diagnostic::warning(
            LogCode::IncompletePrimitive,
            vec![format!("{topology:?}"), len.to_string()],
        ));
    }
}

/// Reverse winding for the mirrored space and map the topology to a draw mode.
///
/// Triangles `(a,b,c)` become `(a,c,b)`. Quads `(a,b,c,d)` fan out into
/// `(a,c,b),(c,a,d)`. Trailing indices that do not form a whole primitive are
/// dropped. Topologies glTF cannot draw fall back to points.
pub fn flip_winding(indices: &[u32], topology: Topology) -> (Vec<u32>, DrawMode, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    match topology {
        Topology::Triangles => {
            check_remainder(indices.len(), 3, topology, &mut diagnostics);
            let out = indices
                .chunks_exact(3)
                .flat_map(|t| [t[0], t[2], t[1]])
                .collect();
            (out, DrawMode::Triangles, diagnostics)
        }
        Topology::Quads => {
            check_remainder(indices.len(), 4, topology, &mut diagnostics);
            let out = indices
                .chunks_exact(4)
                .flat_map(|q| [q[0], q[2], q[1], q[2], q[0], q[3]])
                .collect();
            (out, DrawMode::Triangles, diagnostics)
        }
        Topology::Lines => {
            check_remainder(indices.len(), 2, topology, &mut diagnostics);
            let whole = indices.len() - indices.len() % 2;
            (indices[..whole].to_vec(), DrawMode::Lines, diagnostics)
        }
        Topology::LineStrip => (indices.to_vec(), DrawMode::LineStrip, diagnostics),
        Topology::Points => (indices.to_vec(), DrawMode::Points, diagnostics),
        Topology::Other(code) => {
            diagnostics.push(Diagnostic::warning(LogCode::UnsupportedTopology, vec![code.to_string()]));
            (indices.to_vec(), DrawMode::Points, diagnostics)
        }
    }
}

/// Mirror a column-major matrix across the X axis (`S * M * S`, `S = diag(-1, 1, 1, 1)`).
#[must_use]
pub fn reflect_matrix_x(matrix: Mat4) -> Mat4 {
    let mut m = matrix.to_cols_array();
    for i in [1, 2, 3, 4, 8, 12] {
        m[i] = -m[i];
    }
    Mat4::from_cols_array(&m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn test_triangle_winding() {
        let (out, mode, diags) = flip_winding(&[0, 1, 2, 3, 4, 5], Topology::Triangles);
        assert_eq!(out, vec![0, 2, 1, 3, 5, 4]);
        assert_eq!(mode, DrawMode::Triangles);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_quad_fan_out() {
        let (out, mode, _) = flip_winding(&[0, 1, 2, 3], Topology::Quads);
        assert_eq!(out, vec![0, 2, 1, 2, 0, 3]);
        assert_eq!(mode, DrawMode::Triangles);
    }

    #[test]
    fn test_incomplete_triangle_dropped() {
        let (out, _, diags) = flip_winding(&[0, 1, 2, 3], Topology::Triangles);
        assert_eq!(out, vec![0, 2, 1]);
        assert_eq!(diags[0].code, LogCode::IncompletePrimitive);
    }

    #[test]
    fn test_unsupported_topology_falls_back_to_points() {
        let (out, mode, diags) = flip_winding(&[4, 5], Topology::Other(99));
        assert_eq!(out, vec![4, 5]);
        assert_eq!(mode, DrawMode::Points);
        assert_eq!(diags[0].code, LogCode::UnsupportedTopology);
    }

    #[test]
    fn test_reflect_matrix_matches_conjugation() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.7),
            Vec3::new(4.0, 5.0, 6.0),
        );
        let s = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        let expected = s * m * s;
        assert!(reflect_matrix_x(m).abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_decode_formats() {
        assert!((decode_component(&[255], VertexFormat::UNorm8) - 1.0).abs() < f32::EPSILON);
        assert!((decode_component(&[0x81], VertexFormat::SNorm8) + 1.0).abs() < f32::EPSILON);
        let half_one = f16::from_f32(1.0).to_bits().to_le_bytes();
        assert!((decode_component(&half_one, VertexFormat::Float16) - 1.0).abs() < f32::EPSILON);
        assert_eq!(decode_integer(&[7, 1], VertexFormat::UInt16), 263);
    }

    #[test]
    fn test_out_of_range_stream() {
        let stream = VertexStream {
            data: vec![0; 20],
            stride: 12,
        };
        let descriptor = VertexAttributeDescriptor {
            attribute: crate::mesh::VertexAttribute::Position,
            format: VertexFormat::Float32,
            dimension: 3,
            stream: 0,
            offset: 0,
        };
        assert!(read_floats(&stream, &descriptor, 2).is_none());
        assert_eq!(read_floats(&stream, &descriptor, 1).unwrap().len(), 1);
    }
}
