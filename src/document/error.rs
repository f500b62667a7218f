//! Document error types
//!
//! Errors raised by document engines while loading, rendering or
//! extracting text from a paginated document.

use thiserror::Error;

/// Unified document error type
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Document source not found
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Page outside `1..=total_pages`
    #[error("Page not found: {0}")]
    PageNotFound(u32),

    /// Failed to parse document
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to render content
    #[error("Render error: {0}")]
    RenderError(String),

    /// Text extraction error
    #[error("Text extraction error: {0}")]
    TextExtractionError(String),

    /// Remote source could not be fetched
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    ImageError(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// IO error (std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout error
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

#[cfg(feature = "mupdf")]
impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::ParseError(err.to_string())
    }
}

impl From<reqwest::Error> for DocumentError {
    fn from(err: reqwest::Error) -> Self {
        DocumentError::Fetch(err.to_string())
    }
}
