//! # GlbSmith
//!
//! A pure-Rust glTF 2.0 codec.
//!
//! ## Features
//!
//! - **Document model** - glTF JSON records with a streaming writer and serde reader
//! - **Document builder** - incremental scene export with mesh baking, material
//!   conversion, image encoding and deduplication
//! - **GLB framing** - bit-exact container read/write
//! - **Reader** - resolve buffers and read typed accessor data back
//!
//! ## Quick Start
//!
//! ### Exporting a mesh
//!
//! ```no_run
//! use std::sync::Arc;
//! use glam::Vec3;
//! use glbsmith::prelude::*;
//!
//! let arrays = MeshArrays {
//!     positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
//!     ..Default::default()
//! };
//! let mesh = Arc::new(MeshData::from_arrays(
//!     Some("triangle".into()),
//!     &arrays,
//!     vec![SubMesh { topology: Topology::Triangles, indices: vec![0, 1, 2] }],
//! ));
//!
//! let mut builder = DocumentBuilder::new(ExportSettings::default());
//! let node = builder.add_node(NodeDescriptor::named("triangle"))?;
//! builder.add_mesh_to_node(node, &mesh, MaterialAssignment::default())?;
//! builder.save_to_file("triangle.glb")?;
//! # Ok::<(), glbsmith::Error>(())
//! ```
//!
//! ### Reading a file back
//!
//! ```no_run
//! use glbsmith::reader::GltfFile;
//!
//! let file = GltfFile::open("triangle.glb")?;
//! println!("{} meshes", file.document.meshes.len());
//! # Ok::<(), glbsmith::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `glbsmith` command-line binary

pub mod buffer;
pub mod builder;
pub mod deferral;
pub mod error;
pub mod glb;
pub mod images;
pub mod json;
pub mod layout;
pub mod logger;
pub mod material;
pub mod mesh;
pub mod reader;
pub mod schema;
pub mod settings;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};

    pub use crate::builder::{AddOutcome, DocumentBuilder, MaterialAssignment, NodeDescriptor, SkinData};
    pub use crate::deferral::{CancellationToken, DeferAgent, TimeBudgetDeferAgent, UninterruptedDeferAgent};
    pub use crate::glb::{Glb, to_glb_bytes, write_glb};
    pub use crate::images::{ImageEncoder, ImageExport, ImageFormat, RasterImageEncoder, SourceImage};
    pub use crate::logger::{CodeLogger, CollectingLogger, LogCode, Severity, TracingLogger};
    pub use crate::material::{
        FilterMode, MaterialExporter, MaterialExporterRegistry, MaterialFlavor, SamplerSettings, SourceMaterial,
        TextureSlot,
    };
    pub use crate::mesh::{
        IndexFormat, MeshArrays, MeshData, SubMesh, Topology, VertexAttribute, VertexAttributeDescriptor,
        VertexFormat, VertexStream,
    };
    pub use crate::reader::GltfFile;
    pub use crate::schema::{Extension, GltfDocument, WrapMode};
    pub use crate::settings::{ExportFormat, ExportSettings, FileConflictResolution};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
