//! Error types for `GlbSmith`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `GlbSmith` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file or stream operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== GLB Container Errors ====================
    /// The data does not start with the `glTF` magic.
    #[error("invalid GLB magic: expected glTF, found {0:#010x}")]
    InvalidGlbMagic(u32),

    /// The GLB container version is not 2.
    #[error("unsupported GLB version: {version} (supported: 2)")]
    UnsupportedGlbVersion {
        /// The version number found in the header.
        version: u32,
    },

    /// The header length disagrees with the data that was supplied.
    #[error("GLB length mismatch: header says {declared} bytes, found {actual}")]
    GlbLengthMismatch {
        /// Total length declared in the header.
        declared: usize,
        /// Number of bytes actually available.
        actual: usize,
    },

    /// A chunk header is malformed or of an unexpected type.
    #[error("invalid GLB chunk: {message}")]
    InvalidGlbChunk {
        /// Description of what is invalid.
        message: String,
    },

    /// The first GLB chunk is not a JSON chunk.
    #[error("GLB is missing its JSON chunk")]
    MissingJsonChunk,

    // ==================== Binary Layout Errors ====================
    /// Buffer view alignment outside of 0, 1, 2 or 4.
    #[error("invalid byte alignment: {0} (supported: 1, 2, 4)")]
    InvalidAlignment(usize),

    /// Unknown glTF component type enum value.
    #[error("unknown component type: {0}")]
    UnknownComponentType(u32),

    /// Unknown glTF accessor type string.
    #[error("unknown accessor type: {0}")]
    UnknownAccessorType(String),

    // ==================== Document Validation Errors ====================
    /// An index points outside of the array it references.
    #[error("invalid {kind} index {index} (array has {len} entries)")]
    InvalidIndex {
        /// Name of the referenced array (e.g. `accessors`).
        kind: &'static str,
        /// The offending index.
        index: usize,
        /// Length of the referenced array.
        len: usize,
    },

    /// An accessor reads past the end of its buffer view.
    #[error("accessor {accessor} needs {required} bytes, buffer view has {available}")]
    AccessorOutOfBounds {
        /// Accessor index.
        accessor: usize,
        /// Bytes required by `count` and element size.
        required: usize,
        /// Bytes available after the accessor's byte offset.
        available: usize,
    },

    /// A buffer view reaches past the end of its buffer.
    #[error("buffer view {buffer_view} ends at byte {end}, buffer has {buffer_length}")]
    BufferViewOutOfBounds {
        /// Buffer view index.
        buffer_view: usize,
        /// One past the last byte of the view.
        end: usize,
        /// Byte length of the referenced buffer.
        buffer_length: usize,
    },

    /// An accessor does not start on a multiple of its component size.
    #[error("accessor {accessor} starts at byte {offset}, not aligned to {alignment}")]
    MisalignedAccessor {
        /// Accessor index.
        accessor: usize,
        /// Absolute byte offset within the buffer.
        offset: usize,
        /// Required alignment (component size).
        alignment: usize,
    },

    /// A buffer view byte stride breaks the glTF stride rules.
    #[error("invalid byte stride {stride} on buffer view {buffer_view}: {reason}")]
    InvalidByteStride {
        /// Buffer view index.
        buffer_view: usize,
        /// The declared stride.
        stride: usize,
        /// Which rule is violated.
        reason: &'static str,
    },

    /// Primitive attributes disagree on vertex count.
    #[error("mesh {mesh} primitive {primitive}: attribute {attribute} has {count} elements, expected {expected}")]
    AttributeCountMismatch {
        /// Mesh index.
        mesh: usize,
        /// Primitive index within the mesh.
        primitive: usize,
        /// Attribute semantic name.
        attribute: String,
        /// Element count of that attribute.
        count: usize,
        /// Element count of the first attribute.
        expected: usize,
    },

    // ==================== Builder Errors ====================
    /// Content was added after the builder was baked.
    #[error("document builder was already baked; no more content can be added")]
    BuilderBaked,

    /// The builder was used after it was saved or disposed.
    #[error("document builder is closed")]
    BuilderClosed,

    /// A destination file already exists and the conflict policy is `Abort`.
    #[error("destination file already exists: {path}")]
    FileConflict {
        /// The conflicting path.
        path: PathBuf,
    },

    /// Buffer or image data cannot be stored in a stream-saved JSON document.
    #[error("JSON glTF written to a stream must be self-contained ({reason})")]
    NotSelfContained {
        /// What would have required an external file.
        reason: String,
    },

    /// The export was cancelled through its cancellation token.
    #[error("export cancelled")]
    Cancelled,

    // ==================== Image Errors ====================
    /// Failed to encode an image to PNG/JPEG.
    #[error("failed to encode image '{name}': {message}")]
    ImageEncodeFailed {
        /// Image name.
        name: String,
        /// The encoder's error message.
        message: String,
    },

    /// Raw pixel data does not match the declared dimensions.
    #[error("invalid image data for '{name}': expected {expected} bytes, found {actual}")]
    InvalidImageData {
        /// Image name.
        name: String,
        /// Byte count implied by width * height * 4.
        expected: usize,
        /// Byte count supplied.
        actual: usize,
    },

    // ==================== Reader Errors ====================
    /// A buffer has no URI and there is no GLB binary chunk to back it.
    #[error("buffer {index} could not be resolved: {message}")]
    UnresolvedBuffer {
        /// Buffer index.
        index: usize,
        /// Why resolution failed.
        message: String,
    },

    /// A `data:` URI is malformed.
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    // ==================== Parsing Errors ====================
    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Settings file parsing error.
    #[error("settings parse error: {0}")]
    SettingsError(#[from] toml::de::Error),

    /// UTF-8 conversion error.
    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    // ==================== File System Errors ====================
    /// Invalid file path.
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// A specialized Result type for `GlbSmith` operations.
pub type Result<T> = std::result::Result<T, Error>;
