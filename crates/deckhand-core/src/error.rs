//! Error types for deckhand.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for deckhand operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Source file could not be read or understood
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Whole-document conversion failed
    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),

    /// Page render failed
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Slide text extraction failed
    #[error("text extraction error: {0}")]
    Text(#[from] TextError),

    /// Description request failed
    #[error("description error: {0}")]
    Describe(#[from] DescribeError),

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Source document errors. Fatal for the whole operation.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("corrupt document: {0}")]
    Corrupt(String),
}

/// Document conversion errors. The converter operates on the whole
/// document, so any of these is fatal for the rasterization call.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to spawn converter: {0}")]
    Spawn(std::io::Error),

    #[error("converter exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("conversion timed out after {0:?}")]
    Timeout(Duration),

    #[error("converter produced no output at {0}")]
    MissingOutput(PathBuf),
}

/// Single-page render errors. Isolated to one slide index.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to spawn renderer: {0}")]
    Spawn(std::io::Error),

    #[error("page {page} render failed: {reason}")]
    Failed { page: u32, reason: String },

    #[error("cannot decode rendered page {page}: {reason}")]
    Decode { page: u32, reason: String },

    #[error("cannot write image {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Slide text extraction errors. Isolated to one slide index.
#[derive(Error, Debug)]
pub enum TextError {
    #[error("slide {index} unreadable: {reason}")]
    Unreadable { index: u32, reason: String },
}

/// Description request errors. Isolated to one request.
#[derive(Error, Debug)]
pub enum DescribeError {
    #[error("cannot read image {path}: {source}")]
    Image {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("image processing failed: {0}")]
    Process(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("model request failed: {0}")]
    Request(String),

    #[error("empty model response")]
    EmptyResponse,
}

/// Configuration errors. Surfaced before any work begins.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing API credential: set {0}")]
    MissingCredential(&'static str),

    #[error("slide index {index} out of range 1..={count}")]
    SlideOutOfRange { index: u32, count: u32 },

    #[error("empty slide selection")]
    EmptySelection,

    #[error("invalid size {0:?}: expected WIDTHxHEIGHT")]
    InvalidSize(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for deckhand operations.
pub type Result<T> = std::result::Result<T, Error>;
