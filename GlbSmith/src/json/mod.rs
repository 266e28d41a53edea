//! Streaming JSON output for the glTF JSON chunk.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

mod writer;

use std::io::{self, Write};

pub use writer::{CountingWriter, JsonWriter};

/// A schema record that knows how to emit itself through a [`JsonWriter`].
pub trait GltfSerialize {
    fn gltf_serialize<W: Write>(&self, writer: &mut JsonWriter<W>) -> io::Result<()>;
}

impl<W: Write> JsonWriter<W> {
    /// `"name": { ... }` for a nested record.
    pub fn property_object<T: GltfSerialize>(&mut self, name: &str, value: &T) -> io::Result<()> {
        self.property(name)?;
        value.gltf_serialize(self)
    }

    pub fn optional_object<T: GltfSerialize>(&mut self, name: &str, value: Option<&T>) -> io::Result<()> {
        match value {
            Some(v) => self.property_object(name, v),
            None => Ok(()),
        }
    }

    /// `"name": [ ... ]`, written even when empty.
    pub fn property_records<T: GltfSerialize>(&mut self, name: &str, values: &[T]) -> io::Result<()> {
        self.open_array_property(name)?;
        for value in values {
            value.gltf_serialize(self)?;
        }
        self.close_array()
    }

    /// Like [`Self::property_records`] but omitted when `values` is empty.
    pub fn optional_records<T: GltfSerialize>(&mut self, name: &str, values: &[T]) -> io::Result<()> {
        if values.is_empty() {
            Ok(())
        } else {
            self.property_records(name, values)
        }
    }
}
