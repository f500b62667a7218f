//! Handle to a successfully loaded document

use std::fmt;
use std::sync::Arc;

use super::traits::{Document, DocumentParser};
use super::types::DocumentId;

/// Reference to the document currently shown by a viewer.
///
/// Replaced, never mutated, when another document is loaded.
#[derive(Clone)]
pub struct DocumentHandle {
    id: DocumentId,
    source: String,
    total_pages: u32,
    document: Arc<dyn Document>,
}

impl DocumentHandle {
    /// Wrap a loaded document. Returns `None` for documents without pages.
    pub fn new(id: DocumentId, source: impl Into<String>, document: Arc<dyn Document>) -> Option<Self> {
        let total_pages = document.page_count();
        if total_pages == 0 {
            return None;
        }

        Some(Self {
            id,
            source: source.into(),
            total_pages,
            document,
        })
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn document(&self) -> Arc<dyn Document> {
        Arc::clone(&self.document)
    }

    /// Clamp any requested page number into `1..=total_pages`
    pub fn clamp_page(&self, page: i64) -> u32 {
        page.clamp(1, self.total_pages as i64) as u32
    }
}

impl fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("total_pages", &self.total_pages)
            .finish()
    }
}
