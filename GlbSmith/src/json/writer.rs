//! Forward-only JSON emitter.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use std::io::{self, Write};

/// Streams JSON tokens straight into a [`Write`] sink.
///
/// The writer keeps one flag per open container (whether a member was already
/// written) and nothing else, so documents are never held in memory. Callers
/// must pair every `open_*` with the matching `close_*`; the call sequence is
/// not checked at runtime.
pub struct JsonWriter<W: Write> {
    out: W,
    scopes: Vec<bool>,
    after_name: bool,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            scopes: Vec::new(),
            after_name: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Number of containers that are currently open.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn separator(&mut self) -> io::Result<()> {
        if self.after_name {
            self.after_name = false;
            return Ok(());
        }
        if let Some(has_members) = self.scopes.last_mut() {
            if *has_members {
                self.out.write_all(b",")?;
            }
            *has_members = true;
        }
        Ok(())
    }

    fn scalar<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        Ok(())
    }

    // ========================================================================
    // Containers
    // ========================================================================

    pub fn open_object(&mut self) -> io::Result<()> {
        self.separator()?;
        self.out.write_all(b"{")?;
        self.scopes.push(false);
        Ok(())
    }

    pub fn close_object(&mut self) -> io::Result<()> {
        self.scopes.pop();
        self.out.write_all(b"}")
    }

    pub fn open_array(&mut self) -> io::Result<()> {
        self.separator()?;
        self.out.write_all(b"[")?;
        self.scopes.push(false);
        Ok(())
    }

    pub fn close_array(&mut self) -> io::Result<()> {
        self.scopes.pop();
        self.out.write_all(b"]")
    }

    /// Write `"name":` inside the current object; the next value belongs to it.
    pub fn property(&mut self, name: &str) -> io::Result<()> {
        self.separator()?;
        self.scalar(name)?;
        self.out.write_all(b":")?;
        self.after_name = true;
        Ok(())
    }

    pub fn open_object_property(&mut self, name: &str) -> io::Result<()> {
        self.property(name)?;
        self.open_object()
    }

    pub fn open_array_property(&mut self, name: &str) -> io::Result<()> {
        self.property(name)?;
        self.open_array()
    }

    // ========================================================================
    // Values (array elements or the value after `property`)
    // ========================================================================

    pub fn value_str(&mut self, value: &str) -> io::Result<()> {
        self.separator()?;
        self.scalar(value)
    }

    /// Fails with `InvalidData` on NaN or infinity, which JSON cannot encode.
    pub fn value_f32(&mut self, value: f32) -> io::Result<()> {
        if !value.is_finite() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("non-finite float {value} cannot be written as JSON"),
            ));
        }
        self.separator()?;
        self.scalar(&value)
    }

    pub fn value_usize(&mut self, value: usize) -> io::Result<()> {
        self.separator()?;
        self.scalar(&value)
    }

    pub fn value_u32(&mut self, value: u32) -> io::Result<()> {
        self.separator()?;
        self.scalar(&value)
    }

    pub fn value_bool(&mut self, value: bool) -> io::Result<()> {
        self.separator()?;
        self.out.write_all(if value { b"true" } else { b"false" })
    }

    // ========================================================================
    // Typed properties
    // ========================================================================

    pub fn property_str(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.property(name)?;
        self.value_str(value)
    }

    pub fn property_f32(&mut self, name: &str, value: f32) -> io::Result<()> {
        self.property(name)?;
        self.value_f32(value)
    }

    pub fn property_usize(&mut self, name: &str, value: usize) -> io::Result<()> {
        self.property(name)?;
        self.value_usize(value)
    }

    pub fn property_u32(&mut self, name: &str, value: u32) -> io::Result<()> {
        self.property(name)?;
        self.value_u32(value)
    }

    pub fn property_bool(&mut self, name: &str, value: bool) -> io::Result<()> {
        self.property(name)?;
        self.value_bool(value)
    }

    pub fn property_f32_array(&mut self, name: &str, values: &[f32]) -> io::Result<()> {
        self.open_array_property(name)?;
        for &v in values {
            self.value_f32(v)?;
        }
        self.close_array()
    }

    pub fn property_usize_array(&mut self, name: &str, values: &[usize]) -> io::Result<()> {
        self.open_array_property(name)?;
        for &v in values {
            self.value_usize(v)?;
        }
        self.close_array()
    }

    pub fn property_str_array<S: AsRef<str>>(&mut self, name: &str, values: &[S]) -> io::Result<()> {
        self.open_array_property(name)?;
        for v in values {
            self.value_str(v.as_ref())?;
        }
        self.close_array()
    }

    // ========================================================================
    // Default-value omission
    // ========================================================================

    pub fn optional_str(&mut self, name: &str, value: Option<&str>) -> io::Result<()> {
        match value {
            Some(v) => self.property_str(name, v),
            None => Ok(()),
        }
    }

    pub fn optional_usize(&mut self, name: &str, value: Option<usize>) -> io::Result<()> {
        match value {
            Some(v) => self.property_usize(name, v),
            None => Ok(()),
        }
    }

    /// Written only when `value` differs from the schema default.
    pub fn property_f32_unless(&mut self, name: &str, value: f32, default: f32) -> io::Result<()> {
        if value.to_bits() != default.to_bits() {
            self.property_f32(name, value)
        } else {
            Ok(())
        }
    }

    pub fn property_usize_unless(&mut self, name: &str, value: usize, default: usize) -> io::Result<()> {
        if value == default {
            Ok(())
        } else {
            self.property_usize(name, value)
        }
    }

    pub fn property_bool_unless(&mut self, name: &str, value: bool, default: bool) -> io::Result<()> {
        if value == default {
            Ok(())
        } else {
            self.property_bool(name, value)
        }
    }

    pub fn property_f32_array_unless(&mut self, name: &str, values: &[f32], default: &[f32]) -> io::Result<()> {
        if values == default {
            Ok(())
        } else {
            self.property_f32_array(name, values)
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// A [`Write`] sink that only counts bytes, used to size a JSON chunk before
/// any byte is emitted downstream.
#[derive(Debug, Default)]
pub struct CountingWriter {
    count: usize,
}

impl CountingWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Write for CountingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.count += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(f: impl FnOnce(&mut JsonWriter<&mut Vec<u8>>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        let mut writer = JsonWriter::new(&mut out);
        f(&mut writer).unwrap();
        assert_eq!(writer.depth(), 0);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_nested_objects_and_arrays() {
        let json = emit(|w| {
            w.open_object()?;
            w.property_str("name", "cube")?;
            w.property_usize_array("nodes", &[0, 1, 2])?;
            w.open_object_property("asset")?;
            w.property_str("version", "2.0")?;
            w.close_object()?;
            w.open_array_property("empty")?;
            w.close_array()?;
            w.close_object()
        });
        assert_eq!(
            json,
            r#"{"name":"cube","nodes":[0,1,2],"asset":{"version":"2.0"},"empty":[]}"#
        );
    }

    #[test]
    fn test_string_escaping() {
        let json = emit(|w| {
            w.open_object()?;
            w.property_str("name", "a \"quoted\"\\path\n")?;
            w.close_object()
        });
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["name"], "a \"quoted\"\\path\n");
    }

    #[test]
    fn test_floats_round_trip() {
        let values = [0.1f32, -1.5, 1.0e-7, 123_456.79, f32::MAX];
        let json = emit(|w| {
            w.open_object()?;
            w.property_f32_array("v", &values)?;
            w.close_object()
        });
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(parsed["v"][i].as_f64().unwrap() as f32, v);
        }
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let mut out = Vec::new();
        let mut w = JsonWriter::new(&mut out);
        w.open_object().unwrap();
        let err = w.property_f32_array("min", &[0.0, f32::NAN]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(w.property_f32("intensity", f32::INFINITY).is_err());
    }

    #[test]
    fn test_default_values_omitted() {
        let json = emit(|w| {
            w.open_object()?;
            w.property_f32_unless("alphaCutoff", 0.5, 0.5)?;
            w.property_f32_unless("metallicFactor", 0.25, 1.0)?;
            w.property_bool_unless("doubleSided", false, false)?;
            w.property_usize_unless("texCoord", 0, 0)?;
            w.optional_str("name", None)?;
            w.close_object()
        });
        assert_eq!(json, r#"{"metallicFactor":0.25}"#);
    }

    #[test]
    fn test_counting_writer_matches_output() {
        let mut counter = JsonWriter::new(CountingWriter::new());
        counter.open_object().unwrap();
        counter.property_str("generator", "GlbSmith").unwrap();
        counter.close_object().unwrap();
        assert_eq!(counter.into_inner().count(), r#"{"generator":"GlbSmith"}"#.len());
    }
}
