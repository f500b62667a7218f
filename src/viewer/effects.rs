//! Work requested by the viewer core and the results fed back to it

use std::sync::Arc;

use crate::document::{Document, DocumentError, DocumentId, RenderedImage};
use crate::search::{BridgeError, BridgeResponse, SearchTicket};

use super::thumbnails::ThumbnailRequest;

/// Asynchronous job the viewer needs someone to run
#[derive(Clone)]
pub enum Effect {
    /// Open `source` as document `id`
    Load { id: DocumentId, source: String },
    /// Render one thumbnail of `document`
    RenderThumbnail {
        request: ThumbnailRequest,
        document: Arc<dyn Document>,
    },
    /// Extract every page's text, joined in page order
    ExtractText {
        ticket: SearchTicket,
        document: Arc<dyn Document>,
    },
    /// Send a `generate_response` request to the host bridge
    AskBridge { ticket: SearchTicket, prompt: String },
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Load { id, source } => f
                .debug_struct("Load")
                .field("id", id)
                .field("source", source)
                .finish(),
            Effect::RenderThumbnail { request, .. } => f
                .debug_struct("RenderThumbnail")
                .field("request", request)
                .finish_non_exhaustive(),
            Effect::ExtractText { ticket, .. } => f
                .debug_struct("ExtractText")
                .field("ticket", ticket)
                .finish_non_exhaustive(),
            Effect::AskBridge { ticket, prompt } => f
                .debug_struct("AskBridge")
                .field("ticket", ticket)
                .field("prompt_chars", &prompt.chars().count())
                .finish(),
        }
    }
}

/// Outcome of an [`Effect`], tagged with the identity it was issued under
pub enum Completion {
    Loaded {
        id: DocumentId,
        result: Result<Arc<dyn Document>, DocumentError>,
        /// Natural width of the first page, when it could be measured
        page_width: Option<f64>,
    },
    ThumbnailRendered {
        request: ThumbnailRequest,
        result: Result<RenderedImage, DocumentError>,
    },
    TextExtracted {
        ticket: SearchTicket,
        result: Result<String, DocumentError>,
    },
    Responded {
        ticket: SearchTicket,
        result: Result<BridgeResponse, BridgeError>,
    },
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Completion::Loaded { id, result, .. } => f
                .debug_struct("Loaded")
                .field("id", id)
                .field("ok", &result.is_ok())
                .finish(),
            Completion::ThumbnailRendered { request, result } => f
                .debug_struct("ThumbnailRendered")
                .field("request", request)
                .field("ok", &result.is_ok())
                .finish(),
            Completion::TextExtracted { ticket, result } => f
                .debug_struct("TextExtracted")
                .field("ticket", ticket)
                .field("ok", &result.is_ok())
                .finish(),
            Completion::Responded { ticket, result } => f
                .debug_struct("Responded")
                .field("ticket", ticket)
                .field("result", result)
                .finish(),
        }
    }
}
