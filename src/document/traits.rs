//! Document traits
//!
//! Engine-agnostic interfaces for loading, parsing and rendering a
//! paginated document. Pages are addressed 1-based.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::Result;
use super::types::{PageSize, RenderedImage};

/// Opens a document from a source URL or path
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load and parse the document behind `source`
    async fn load(&self, source: &str) -> Result<Arc<dyn Document>>;
}

/// Page structure and text access
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Number of pages
    fn page_count(&self) -> u32;

    /// Natural size of a page
    async fn page_size(&self, page: u32) -> Result<PageSize>;

    /// Extract plain text from a page
    async fn extract_text(&self, page: u32) -> Result<String>;
}

/// Bitmap rendering
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Render a page at a fixed pixel width, preserving its aspect ratio
    async fn render_thumbnail(&self, page: u32, width: u32) -> Result<RenderedImage>;
}

/// Combined parser and renderer for a loaded document
pub trait Document: DocumentParser + DocumentRenderer {}

impl<T: DocumentParser + DocumentRenderer> Document for T {}
