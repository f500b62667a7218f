//! Search session
//!
//! Drives one question-answering request: extract the document text once,
//! narrow it to relevant context, then hand a prompt to the host bridge.
//!
//! ```text
//! Idle ──start──▶ ExtractingText ──▶ FindingContext ──▶ AwaitingResponse ──▶ Done
//!          │            │                                      │
//!          └────────────┴───────────(cached text)──────────────┴──────────▶ Error
//! ```
//!
//! The session never performs IO itself. `start` and `text_extracted`
//! return a [`SearchStep`] describing the work the caller has to run, and
//! the outcome comes back tagged with the [`SearchTicket`] it was issued
//! under. Outcomes for any other ticket are dropped.

use serde::Serialize;
use thiserror::Error;

use crate::document::{DocumentError, DocumentId};

use super::bridge::{BridgeError, BridgeResponse};
use super::context::{extract_context, ContextSource, DEFAULT_CONTEXT_BUDGET};
use super::prompt::build_prompt;

/// Shown when the bridge fails without saying why
pub const GENERIC_BRIDGE_ERROR: &str = "An error occurred while communicating with the host OS.";

/// Search errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Smart search is unavailable: no host bridge configured")]
    Unavailable,

    #[error("Search query is empty")]
    EmptyQuery,

    #[error("No document is loaded")]
    NoDocument,

    #[error("A search is already in progress")]
    InFlight,

    #[error("Failed to extract document text: {0}")]
    TextExtraction(String),

    #[error("Received an empty response from the host OS.")]
    EmptyResponse,

    #[error("{0}")]
    Bridge(String),
}

impl SearchError {
    /// Bridge failure, keeping the host's message when it has one
    pub fn bridge(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.is_empty() {
            SearchError::Bridge(GENERIC_BRIDGE_ERROR.to_string())
        } else {
            SearchError::Bridge(message)
        }
    }
}

impl From<BridgeError> for SearchError {
    fn from(err: BridgeError) -> Self {
        SearchError::bridge(err.to_string())
    }
}

/// Search progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchPhase {
    Idle,
    ExtractingText,
    FindingContext,
    AwaitingResponse,
    Done,
    Error,
}

impl SearchPhase {
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            SearchPhase::ExtractingText | SearchPhase::FindingContext | SearchPhase::AwaitingResponse
        )
    }

    /// Progress message for the phase
    pub fn status(self) -> Option<&'static str> {
        match self {
            SearchPhase::ExtractingText => Some("Analyzing document..."),
            SearchPhase::FindingContext => Some("Finding relevant sections..."),
            SearchPhase::AwaitingResponse => Some("Asking the host..."),
            _ => None,
        }
    }
}

/// Identity of one search: the document it ran against and its sequence
/// number within the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchTicket {
    pub document: DocumentId,
    pub search: u64,
}

/// Work the caller must perform for a search to progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStep {
    /// Extract the text of every page and report it via `text_extracted`
    ExtractText { ticket: SearchTicket },
    /// Send `prompt` to the host bridge and report via `response_received`
    AskBridge { ticket: SearchTicket, prompt: String },
}

/// Search session state
#[derive(Debug)]
pub struct SearchSession {
    budget: usize,
    available: bool,
    document: Option<DocumentId>,
    full_text: Option<String>,
    phase: SearchPhase,
    query: String,
    result: Option<String>,
    error: Option<SearchError>,
    last_search: u64,
    in_flight: Option<SearchTicket>,
    context_source: Option<ContextSource>,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_BUDGET, false)
    }
}

impl SearchSession {
    /// `available` is whether a host bridge is configured
    pub fn new(budget: usize, available: bool) -> Self {
        Self {
            budget,
            available,
            document: None,
            full_text: None,
            phase: SearchPhase::Idle,
            query: String::new(),
            result: None,
            error: None,
            last_search: 0,
            in_flight: None,
            context_source: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn status(&self) -> Option<&'static str> {
        self.phase.status()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn error(&self) -> Option<&SearchError> {
        self.error.as_ref()
    }

    pub fn has_full_text(&self) -> bool {
        self.full_text.is_some()
    }

    /// How the context of the latest prompt was produced
    pub fn context_source(&self) -> Option<ContextSource> {
        self.context_source
    }

    /// Drop everything tied to the previous document
    pub fn reset(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            tracing::debug!(search = ticket.search, "Abandoning in-flight search");
        }
        self.document = None;
        self.full_text = None;
        self.phase = SearchPhase::Idle;
        self.query.clear();
        self.result = None;
        self.error = None;
        self.context_source = None;
    }

    /// A new document became ready
    pub fn set_document(&mut self, document: DocumentId) {
        self.reset();
        self.document = Some(document);
    }

    /// Start a search for `query` against `document`.
    ///
    /// Rejected requests leave the session untouched.
    pub fn start(
        &mut self,
        document: Option<DocumentId>,
        query: &str,
    ) -> Result<SearchStep, SearchError> {
        if !self.available {
            return Err(SearchError::Unavailable);
        }
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let document = document.ok_or(SearchError::NoDocument)?;
        if self.phase.is_in_flight() {
            return Err(SearchError::InFlight);
        }

        if self.document != Some(document) {
            self.document = Some(document);
            self.full_text = None;
        }

        self.last_search += 1;
        let ticket = SearchTicket {
            document,
            search: self.last_search,
        };
        self.in_flight = Some(ticket);
        self.query = query.to_string();
        self.result = None;
        self.error = None;

        tracing::info!(document = %document, search = ticket.search, query = %query, "Starting search");

        if self.full_text.is_none() {
            self.phase = SearchPhase::ExtractingText;
            return Ok(SearchStep::ExtractText { ticket });
        }

        Ok(self.ask(ticket))
    }

    /// Full text extraction for `ticket` finished
    pub fn text_extracted(
        &mut self,
        ticket: SearchTicket,
        result: Result<String, DocumentError>,
    ) -> Option<SearchStep> {
        if self.in_flight != Some(ticket) || self.phase != SearchPhase::ExtractingText {
            tracing::debug!(search = ticket.search, "Discarding stale text extraction");
            return None;
        }

        match result {
            Ok(text) => {
                tracing::debug!(search = ticket.search, chars = text.len(), "Document text cached");
                self.full_text = Some(text);
                Some(self.ask(ticket))
            }
            Err(e) => {
                tracing::warn!(search = ticket.search, "Text extraction failed: {}", e);
                self.fail(SearchError::TextExtraction(e.to_string()));
                None
            }
        }
    }

    /// The host answered (or failed to) for `ticket`.
    /// Returns `false` when the answer was stale and dropped.
    pub fn response_received(
        &mut self,
        ticket: SearchTicket,
        result: Result<BridgeResponse, BridgeError>,
    ) -> bool {
        if self.in_flight != Some(ticket) || self.phase != SearchPhase::AwaitingResponse {
            tracing::debug!(search = ticket.search, "Discarding stale host response");
            return false;
        }

        match result {
            Ok(response) => match response.answer() {
                Some(answer) => {
                    self.in_flight = None;
                    self.result = Some(answer.to_string());
                    self.phase = SearchPhase::Done;
                }
                None => self.fail(SearchError::EmptyResponse),
            },
            Err(e) => {
                tracing::warn!(search = ticket.search, "Host bridge request failed: {}", e);
                self.fail(SearchError::from(e));
            }
        }
        true
    }

    fn ask(&mut self, ticket: SearchTicket) -> SearchStep {
        self.phase = SearchPhase::FindingContext;
        let full_text = self.full_text.as_deref().unwrap_or_default();
        let context = extract_context(full_text, &self.query, self.budget);
        self.context_source = Some(context.source);

        self.phase = SearchPhase::AwaitingResponse;
        SearchStep::AskBridge {
            ticket,
            prompt: build_prompt(&context.text, &self.query),
        }
    }

    fn fail(&mut self, error: SearchError) {
        self.in_flight = None;
        self.error = Some(error);
        self.phase = SearchPhase::Error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Apples are red.\n\nBananas are yellow.\n\nApples and bananas are fruit.";

    fn doc(n: u64) -> DocumentId {
        DocumentId::new(n)
    }

    fn session() -> SearchSession {
        let mut session = SearchSession::new(1000, true);
        session.set_document(doc(1));
        session
    }

    fn extract_ticket(step: SearchStep) -> SearchTicket {
        match step {
            SearchStep::ExtractText { ticket } => ticket,
            other => panic!("expected text extraction, got {:?}", other),
        }
    }

    fn ask_ticket(step: Option<SearchStep>) -> (SearchTicket, String) {
        match step {
            Some(SearchStep::AskBridge { ticket, prompt }) => (ticket, prompt),
            other => panic!("expected bridge request, got {:?}", other),
        }
    }

    #[test]
    fn test_rejections_leave_state() {
        let mut unavailable = SearchSession::new(1000, false);
        assert_eq!(
            unavailable.start(Some(doc(1)), "apples"),
            Err(SearchError::Unavailable)
        );

        let mut session = session();
        assert_eq!(session.start(Some(doc(1)), "   "), Err(SearchError::EmptyQuery));
        assert_eq!(session.start(None, "apples"), Err(SearchError::NoDocument));
        assert_eq!(session.phase(), SearchPhase::Idle);
        assert_eq!(session.query(), "");
    }

    #[test]
    fn test_full_search_flow() {
        let mut session = session();
        let ticket = extract_ticket(session.start(Some(doc(1)), "apples bananas").unwrap());
        assert_eq!(session.phase(), SearchPhase::ExtractingText);
        assert_eq!(session.status(), Some("Analyzing document..."));

        let (ticket, prompt) = ask_ticket(session.text_extracted(ticket, Ok(TEXT.to_string())));
        assert_eq!(session.phase(), SearchPhase::AwaitingResponse);
        assert_eq!(session.status(), Some("Asking the host..."));
        assert!(prompt.contains(
            "Apples and bananas are fruit.\n\nApples are red.\n\nBananas are yellow."
        ));
        assert!(prompt.ends_with("Question: apples bananas"));
        assert_eq!(session.context_source(), Some(ContextSource::Ranked { paragraphs: 3 }));

        assert!(session.response_received(ticket, Ok(BridgeResponse::text("They are fruit."))));
        assert_eq!(session.phase(), SearchPhase::Done);
        assert_eq!(session.result(), Some("They are fruit."));
        assert_eq!(session.status(), None);
    }

    #[test]
    fn test_text_is_memoized() {
        let mut session = session();
        let ticket = extract_ticket(session.start(Some(doc(1)), "apples").unwrap());
        let (ticket, _) = ask_ticket(session.text_extracted(ticket, Ok(TEXT.to_string())));
        session.response_received(ticket, Ok(BridgeResponse::text("first")));

        // Second search goes straight to the bridge
        let step = session.start(Some(doc(1)), "bananas").unwrap();
        let (second, _) = ask_ticket(Some(step));
        assert_ne!(second, ticket);
        assert_eq!(session.result(), None);
        assert_eq!(session.query(), "bananas");
    }

    #[test]
    fn test_in_flight_rejected() {
        let mut session = session();
        session.start(Some(doc(1)), "apples").unwrap();
        assert_eq!(session.start(Some(doc(1)), "bananas"), Err(SearchError::InFlight));
        assert_eq!(session.query(), "apples");
    }

    #[test]
    fn test_empty_response_error() {
        let mut session = session();
        let ticket = extract_ticket(session.start(Some(doc(1)), "apples").unwrap());
        let (ticket, _) = ask_ticket(session.text_extracted(ticket, Ok(TEXT.to_string())));

        session.response_received(ticket, Ok(BridgeResponse::default()));
        assert_eq!(session.phase(), SearchPhase::Error);
        assert_eq!(
            session.error().map(ToString::to_string).as_deref(),
            Some("Received an empty response from the host OS.")
        );
    }

    #[test]
    fn test_bridge_error_messages() {
        let mut session = session();
        let ticket = extract_ticket(session.start(Some(doc(1)), "apples").unwrap());
        let (ticket, _) = ask_ticket(session.text_extracted(ticket, Ok(TEXT.to_string())));
        session.response_received(ticket, Err(BridgeError::Request("model offline".into())));
        assert_eq!(session.error(), Some(&SearchError::Bridge("model offline".into())));

        // Retry after an error is allowed
        let (ticket, _) = ask_ticket(Some(session.start(Some(doc(1)), "apples").unwrap()));
        assert_eq!(session.error(), None);
        session.response_received(ticket, Err(BridgeError::Request(String::new())));
        assert_eq!(
            session.error().map(ToString::to_string).as_deref(),
            Some(GENERIC_BRIDGE_ERROR)
        );
    }

    #[test]
    fn test_text_extraction_failure() {
        let mut session = session();
        let ticket = extract_ticket(session.start(Some(doc(1)), "apples").unwrap());
        let step = session.text_extracted(ticket, Err(DocumentError::TextExtractionError("boom".into())));

        assert!(step.is_none());
        assert_eq!(session.phase(), SearchPhase::Error);
        assert!(matches!(session.error(), Some(SearchError::TextExtraction(_))));
        assert!(!session.has_full_text());
    }

    #[test]
    fn test_stale_results_ignored() {
        let mut session = session();
        let ticket = extract_ticket(session.start(Some(doc(1)), "apples").unwrap());

        // Document switch while extracting
        session.set_document(doc(2));
        assert!(session.text_extracted(ticket, Ok(TEXT.to_string())).is_none());
        assert!(!session.has_full_text());
        assert_eq!(session.phase(), SearchPhase::Idle);

        let fresh = extract_ticket(session.start(Some(doc(2)), "bananas").unwrap());
        let (fresh, _) = ask_ticket(session.text_extracted(fresh, Ok(TEXT.to_string())));
        assert!(!session.response_received(ticket, Ok(BridgeResponse::text("old"))));
        assert!(session.response_received(fresh, Ok(BridgeResponse::text("new"))));
        assert_eq!(session.result(), Some("new"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = session();
        let ticket = extract_ticket(session.start(Some(doc(1)), "apples").unwrap());
        let (ticket, _) = ask_ticket(session.text_extracted(ticket, Ok(TEXT.to_string())));
        session.response_received(ticket, Ok(BridgeResponse::text("answer")));

        session.reset();
        assert_eq!(session.phase(), SearchPhase::Idle);
        assert_eq!(session.result(), None);
        assert_eq!(session.query(), "");
        assert!(!session.has_full_text());
    }

    #[test]
    fn test_query_without_usable_words_uses_prefix() {
        let mut session = SearchSession::new(10, true);
        session.set_document(doc(1));
        let ticket = extract_ticket(session.start(Some(doc(1)), "is it").unwrap());
        let (_, prompt) = ask_ticket(session.text_extracted(ticket, Ok(TEXT.to_string())));

        assert_eq!(session.context_source(), Some(ContextSource::Prefix));
        assert!(prompt.contains("--- DOCUMENT TEXT ---\n\nApples are\n\n--- END DOCUMENT TEXT ---"));
    }
}
