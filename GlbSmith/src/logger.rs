//! Coded diagnostics for per-object conversion problems.
//!
//! Recoverable issues (an unsupported topology, a texture that failed to
//! encode) never abort an export. They are reported through a [`CodeLogger`]
//! and the affected object is emitted in degraded form. Without a logger the
//! diagnostics are simply dropped.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What went wrong, independent of the message arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCode {
    /// Submesh topology has no glTF equivalent; exported as points.
    UnsupportedTopology,
    /// Vertex attribute semantic that glTF cannot carry (e.g. a ninth UV set).
    UnsupportedVertexAttribute,
    /// Attribute dimension differs from what glTF expects; padded or truncated.
    VertexAttributeDimension,
    /// Attribute descriptor reads past the end of its vertex stream.
    VertexStreamOutOfRange,
    /// Index count is not a multiple of the topology's primitive size.
    IncompletePrimitive,
    /// Index references a vertex beyond the vertex count.
    IndexOutOfRange,
    /// Bone index does not fit into an unsigned short.
    JointIndexOverflow,
    /// Mesh has no vertices or no submeshes.
    EmptyMesh,
    /// More material slots were assigned than the mesh has submeshes.
    ExtraMaterialSlots,
    /// No exporter is registered for a material's flavor.
    MissingMaterialExporter,
    /// Material feature that the chosen exporter cannot express.
    MaterialFeatureUnsupported,
    /// Texture slot dropped from a material.
    TextureDropped,
    /// Image could not be encoded.
    ImageEncodeFailed,
    /// Destination file existed and was renamed with a numeric suffix.
    FileRenamed,
    /// Destination file existed and was overwritten.
    FileOverwritten,
}

impl LogCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedTopology => "unsupported-topology",
            Self::UnsupportedVertexAttribute => "unsupported-vertex-attribute",
            Self::VertexAttributeDimension => "vertex-attribute-dimension",
            Self::VertexStreamOutOfRange => "vertex-stream-out-of-range",
            Self::IncompletePrimitive => "incomplete-primitive",
            Self::IndexOutOfRange => "index-out-of-range",
            Self::JointIndexOverflow => "joint-index-overflow",
            Self::EmptyMesh => "empty-mesh",
            Self::ExtraMaterialSlots => "extra-material-slots",
            Self::MissingMaterialExporter => "missing-material-exporter",
            Self::MaterialFeatureUnsupported => "material-feature-unsupported",
            Self::TextureDropped => "texture-dropped",
            Self::ImageEncodeFailed => "image-encode-failed",
            Self::FileRenamed => "file-renamed",
            Self::FileOverwritten => "file-overwritten",
        }
    }
}

impl fmt::Display for LogCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink for coded diagnostics.
pub trait CodeLogger: Send + Sync {
    fn log(&self, severity: Severity, code: LogCode, args: &[String]);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl CodeLogger for TracingLogger {
    fn log(&self, severity: Severity, code: LogCode, args: &[String]) {
        let args = args.join(", ");
        match severity {
            Severity::Error => tracing::error!(code = code.as_str(), "{args}"),
            Severity::Warning => tracing::warn!(code = code.as_str(), "{args}"),
            Severity::Info => tracing::info!(code = code.as_str(), "{args}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub severity: Severity,
    pub code: LogCode,
    pub args: Vec<String>,
}

/// Keeps every entry in memory.
#[derive(Debug, Default)]
pub struct CollectingLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl CollectingLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn contains(&self, code: LogCode) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|e| e.code == code)
    }

    /// Highest severity seen, if anything was logged.
    pub fn worst(&self) -> Option<Severity> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.severity)
            .max()
    }
}

impl CodeLogger for CollectingLogger {
    fn log(&self, severity: Severity, code: LogCode, args: &[String]) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry {
                severity,
                code,
                args: args.to_vec(),
            });
    }
}

/// A diagnostic produced off the calling thread, replayed later in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: LogCode,
    pub args: Vec<String>,
}

impl Diagnostic {
    pub fn warning(code: LogCode, args: Vec<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            args,
        }
    }

    pub fn error(code: LogCode, args: Vec<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            args,
        }
    }

    pub fn info(code: LogCode, args: Vec<String>) -> Self {
        Self {
            severity: Severity::Info,
            code,
            args,
        }
    }

    pub fn emit(&self, logger: Option<&dyn CodeLogger>) {
        if let Some(logger) = logger {
            logger.log(self.severity, self.code, &self.args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_logger() {
        let logger = CollectingLogger::new();
        assert_eq!(logger.worst(), None);
        logger.log(Severity::Info, LogCode::FileRenamed, &["a.png".into()]);
        logger.log(Severity::Warning, LogCode::UnsupportedTopology, &["mesh".into(), "0".into()]);
        assert!(logger.contains(LogCode::UnsupportedTopology));
        assert!(!logger.contains(LogCode::EmptyMesh));
        assert_eq!(logger.worst(), Some(Severity::Warning));
        assert_eq!(logger.entries()[1].args, vec!["mesh".to_string(), "0".to_string()]);
    }

    #[test]
    fn test_diagnostic_without_logger() {
        Diagnostic::error(LogCode::ImageEncodeFailed, vec![]).emit(None);
    }
}
