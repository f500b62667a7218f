//! Document session controller
//!
//! Owns the loaded document handle together with the current page and
//! scale. Load status follows `Idle → Loading → Ready | Error`; a new load
//! from any state goes back to `Loading`.

use std::sync::Arc;

use serde::Serialize;

use crate::document::{Document, DocumentError, DocumentHandle, DocumentId};

use super::scale::{FitToWidth, ScaleFactor};

/// Load status of the session
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading { id: DocumentId, source: String },
    Ready(DocumentHandle),
    Error { id: DocumentId, source: String, message: String },
}

/// Serializable name of a [`LoadState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

impl LoadState {
    pub fn status(&self) -> LoadStatus {
        match self {
            LoadState::Idle => LoadStatus::Idle,
            LoadState::Loading { .. } => LoadStatus::Loading,
            LoadState::Ready(_) => LoadStatus::Ready,
            LoadState::Error { .. } => LoadStatus::Error,
        }
    }
}

/// Message shown when a document cannot be opened
pub fn load_error_message(cause: &str) -> String {
    format!(
        "Failed to load PDF: {}. Please ensure the file is accessible and not corrupted.",
        cause
    )
}

/// Document session controller
#[derive(Debug)]
pub struct DocumentSession {
    state: LoadState,
    last_id: u64,
    current_page: u32,
    scale: ScaleFactor,
    fit: FitToWidth,
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSession {
    pub fn new() -> Self {
        Self {
            state: LoadState::Idle,
            last_id: 0,
            current_page: 1,
            scale: ScaleFactor::default(),
            fit: FitToWidth::new(),
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn status(&self) -> LoadStatus {
        self.state.status()
    }

    /// The ready document, if any
    pub fn handle(&self) -> Option<&DocumentHandle> {
        match &self.state {
            LoadState::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    /// Identity of the ready document, if any
    pub fn current_document(&self) -> Option<DocumentId> {
        self.handle().map(DocumentHandle::id)
    }

    /// Source of the current or last attempted load
    pub fn source(&self) -> Option<&str> {
        match &self.state {
            LoadState::Idle => None,
            LoadState::Loading { source, .. } | LoadState::Error { source, .. } => Some(source),
            LoadState::Ready(handle) => Some(handle.source()),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            LoadState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.handle().map(DocumentHandle::total_pages).unwrap_or(0)
    }

    pub fn scale(&self) -> ScaleFactor {
        self.scale
    }

    /// Start loading `source`, dropping the previous document
    pub fn begin_load(&mut self, source: &str) -> DocumentId {
        self.last_id += 1;
        let id = DocumentId::new(self.last_id);

        self.state = LoadState::Loading {
            id,
            source: source.to_string(),
        };
        self.current_page = 1;
        self.fit.forget_page();

        tracing::info!(document = %id, source = %source, "Loading document");
        id
    }

    /// Commit the outcome of load `id`.
    ///
    /// Returns the new handle on success. Outcomes of loads that are no
    /// longer in flight are discarded.
    pub fn finish_load(
        &mut self,
        id: DocumentId,
        result: Result<Arc<dyn Document>, DocumentError>,
    ) -> Option<DocumentHandle> {
        let source = match &self.state {
            LoadState::Loading { id: loading, source } if *loading == id => source.clone(),
            _ => {
                tracing::debug!(document = %id, "Discarding stale load result");
                return None;
            }
        };

        let outcome = result.and_then(|document| {
            DocumentHandle::new(id, source.clone(), document)
                .ok_or_else(|| DocumentError::ParseError("document has no pages".to_string()))
        });

        match outcome {
            Ok(handle) => {
                tracing::info!(
                    document = %id,
                    pages = handle.total_pages(),
                    "Document ready"
                );
                self.current_page = 1;
                self.state = LoadState::Ready(handle.clone());
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(document = %id, source = %source, "Failed to load document: {}", e);
                self.state = LoadState::Error {
                    id,
                    source,
                    message: load_error_message(&e.to_string()),
                };
                None
            }
        }
    }

    /// Go to page `page`, clamped into `1..=total_pages`.
    /// No-op unless a document is ready.
    pub fn set_current_page(&mut self, page: i64) -> Option<u32> {
        let clamped = self.handle()?.clamp_page(page);
        self.current_page = clamped;
        Some(clamped)
    }

    pub fn next_page(&mut self) -> Option<u32> {
        self.set_current_page(self.current_page as i64 + 1)
    }

    pub fn previous_page(&mut self) -> Option<u32> {
        self.set_current_page(self.current_page as i64 - 1)
    }

    pub fn can_go_previous(&self) -> bool {
        self.handle().is_some() && self.current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.handle().is_some() && self.current_page < self.total_pages()
    }

    pub fn zoom_in(&mut self) -> ScaleFactor {
        self.scale = self.scale.zoomed_in();
        self.scale
    }

    pub fn zoom_out(&mut self) -> ScaleFactor {
        self.scale = self.scale.zoomed_out();
        self.scale
    }

    /// Explicit "fit" request against the given container width
    pub fn fit_to_width(&mut self, container_width: f64) -> ScaleFactor {
        if let Some(scale) = self.fit.container_resized(container_width) {
            self.scale = scale;
        }
        self.scale
    }

    /// Container resize notification
    pub fn container_resized(&mut self, width: f64) -> ScaleFactor {
        self.fit_to_width(width)
    }

    /// The displayed page finished rendering with natural width `width`
    pub fn page_rendered(&mut self, width: f64) -> ScaleFactor {
        if let Some(scale) = self.fit.page_rendered(width) {
            self.scale = scale;
        }
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::testing::StaticDocument;

    fn pages(n: usize) -> Arc<dyn Document> {
        Arc::new(StaticDocument::new(vec!["text"; n]))
    }

    fn ready_session(n: usize) -> DocumentSession {
        let mut session = DocumentSession::new();
        let id = session.begin_load("paper.pdf");
        session.finish_load(id, Ok(pages(n))).unwrap();
        session
    }

    #[test]
    fn test_initial_state() {
        for session in [DocumentSession::new(), DocumentSession::default()] {
            assert_eq!(session.status(), LoadStatus::Idle);
            assert_eq!(session.current_page(), 1);
            assert_eq!(session.scale().percent(), 100.0);
            assert!(session.source().is_none());
        }
    }

    #[test]
    fn test_load_lifecycle() {
        let mut session = DocumentSession::new();
        let id = session.begin_load("paper.pdf");
        assert_eq!(session.status(), LoadStatus::Loading);
        assert_eq!(session.source(), Some("paper.pdf"));

        let handle = session.finish_load(id, Ok(pages(12))).unwrap();
        assert_eq!(handle.id(), id);
        assert_eq!(session.status(), LoadStatus::Ready);
        assert_eq!(session.total_pages(), 12);
        assert_eq!(session.current_page(), 1);
    }

    #[test]
    fn test_load_failure_is_terminal() {
        let mut session = DocumentSession::new();
        let id = session.begin_load("broken.pdf");
        let result = session.finish_load(id, Err(DocumentError::ParseError("bad xref".into())));

        assert!(result.is_none());
        assert_eq!(session.status(), LoadStatus::Error);
        let message = session.error_message().unwrap();
        assert!(message.starts_with("Failed to load PDF: Parse error: bad xref."));
        assert_eq!(session.set_current_page(3), None);
        assert_eq!(session.source(), Some("broken.pdf"));
    }

    #[test]
    fn test_empty_document_is_load_error() {
        let mut session = DocumentSession::new();
        let id = session.begin_load("empty.pdf");
        assert!(session.finish_load(id, Ok(pages(0))).is_none());
        assert_eq!(session.status(), LoadStatus::Error);
    }

    #[test]
    fn test_stale_load_discarded() {
        let mut session = DocumentSession::new();
        let first = session.begin_load("a.pdf");
        let second = session.begin_load("b.pdf");
        assert_ne!(first, second);

        assert!(session.finish_load(first, Ok(pages(3))).is_none());
        assert_eq!(session.status(), LoadStatus::Loading);

        session.finish_load(second, Ok(pages(5))).unwrap();
        assert_eq!(session.total_pages(), 5);
        assert_eq!(session.source(), Some("b.pdf"));
    }

    #[test]
    fn test_set_current_page_clamps() {
        let mut session = ready_session(10);
        for requested in -20i64..=30 {
            let page = session.set_current_page(requested).unwrap();
            assert_eq!(page as i64, requested.clamp(1, 10));
            assert_eq!(session.current_page(), page);
        }
    }

    #[test]
    fn test_set_page_noop_while_loading() {
        let mut session = ready_session(10);
        session.set_current_page(7);
        session.begin_load("next.pdf");

        assert_eq!(session.set_current_page(4), None);
        assert_eq!(session.current_page(), 1);
    }

    #[test]
    fn test_next_and_previous() {
        let mut session = ready_session(2);
        assert!(!session.can_go_previous());
        assert!(session.can_go_next());

        assert_eq!(session.next_page(), Some(2));
        assert_eq!(session.next_page(), Some(2));
        assert!(!session.can_go_next());
        assert_eq!(session.previous_page(), Some(1));
        assert_eq!(session.previous_page(), Some(1));
    }

    #[test]
    fn test_new_load_resets_page() {
        let mut session = ready_session(10);
        session.set_current_page(8);

        let id = session.begin_load("other.pdf");
        session.finish_load(id, Ok(pages(4))).unwrap();
        assert_eq!(session.current_page(), 1);
    }

    #[test]
    fn test_zoom_and_fit() {
        let mut session = DocumentSession::new();
        assert_eq!(session.zoom_in().percent(), 125.0);
        assert_eq!(session.zoom_out().percent(), 100.0);

        // No page width known yet: fit keeps the scale
        assert_eq!(session.fit_to_width(800.0).percent(), 100.0);

        let scale = session.page_rendered(600.0);
        assert!((scale.percent() - 130.666_666).abs() < 0.001);

        // Zoom then resize: resize refits
        session.zoom_in();
        let scale = session.container_resized(1200.0);
        assert!((scale.percent() - 196.0).abs() < 0.001);
    }
}
