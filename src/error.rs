//! Error types for unidoc library.

use crate::model::{BlockKind, ValidationError};
use std::io;
use thiserror::Error;

/// Result type alias for unidoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during extraction and conversion.
///
/// Recoverable per-page or per-block losses during extraction are not errors;
/// they are recorded as [`crate::model::ExtractionWarning`]s on the document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No extractor or converter is registered for the format tag.
    #[error("Unsupported format: {tag}")]
    UnsupportedFormat {
        /// The requested format tag
        tag: String,
    },

    /// The payload does not parse as the claimed format.
    #[error("Corrupt {format} input: {message}")]
    CorruptInput {
        /// Format tag the payload was claimed to be
        format: String,
        /// Diagnostic from the underlying parser
        message: String,
    },

    /// The target format cannot represent a block present in the document.
    ///
    /// Only raised when strict fidelity is requested.
    #[error("{format} cannot represent {kind} block (page {page}, block {index})")]
    IrreducibleStructure {
        /// Target format tag
        format: String,
        /// Kind of the offending block
        kind: BlockKind,
        /// Page number (1-indexed)
        page: u32,
        /// Block index within the page
        index: usize,
    },

    /// A document violates a structural invariant.
    #[error("Schema validation failed: {0}")]
    SchemaValidation(#[from] ValidationError),

    /// The OCR capability failed on a page.
    #[error("Recognition error: {0}")]
    Recognition(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error during rendering.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an `UnsupportedFormat` error.
    pub fn unsupported(tag: impl Into<String>) -> Self {
        Error::UnsupportedFormat { tag: tag.into() }
    }

    /// Build a `CorruptInput` error from any displayable parser error.
    pub fn corrupt(format: &str, err: impl std::fmt::Display) -> Self {
        Error::CorruptInput {
            format: format.to_string(),
            message: err.to_string(),
        }
    }
}
