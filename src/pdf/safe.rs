//! Thread-safe document wrapper for MuPDF
//!
//! MuPDF documents are not thread-safe. This wrapper keeps the raw bytes,
//! opens a fresh `mupdf::Document` for each operation and serializes all
//! access through a `parking_lot::Mutex`.

use std::sync::Arc;

use mupdf::Document;
use parking_lot::Mutex;

use crate::document::{DocumentError, Result};

const PDF_MIME: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF";

/// Whether `data` starts like a PDF file
pub fn is_pdf(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

/// Thread-safe PDF wrapper
pub struct SafeDocument {
    data: Arc<Vec<u8>>,
    page_count: u32,
    lock: Mutex<()>,
}

// SAFETY: the only fields are immutable shared bytes, a page count and a
// mutex. No MuPDF object outlives `with_doc`, and `with_doc` holds `lock`
// for the whole time a document is open.
unsafe impl Send for SafeDocument {}
unsafe impl Sync for SafeDocument {}

impl SafeDocument {
    /// Validate `data` as a PDF and count its pages
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if !is_pdf(&data) {
            return Err(DocumentError::UnsupportedFormat(
                "source is not a PDF document".to_string(),
            ));
        }

        let doc = Document::from_bytes(&data, PDF_MIME)?;
        let page_count = doc.page_count()?.max(0) as u32;

        Ok(Self {
            data: Arc::new(data),
            page_count,
            lock: Mutex::new(()),
        })
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Run `f` against a freshly opened document, serialized with every
    /// other access
    pub fn with_doc<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Document) -> Result<R>,
    {
        let _guard = self.lock.lock();
        let doc = Document::from_bytes(&self.data, PDF_MIME)?;
        f(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_magic() {
        assert!(is_pdf(b"%PDF-1.7\n..."));
        assert!(!is_pdf(b"PK\x03\x04"));
        assert!(!is_pdf(b""));
    }

    #[test]
    fn test_rejects_non_pdf_bytes() {
        let err = SafeDocument::from_bytes(b"<html>not a pdf</html>".to_vec()).err().unwrap();
        assert!(matches!(err, DocumentError::UnsupportedFormat(_)));
    }
}
