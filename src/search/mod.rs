//! Smart search
//!
//! Answers natural-language questions about the loaded document through an
//! injected host bridge, grounding each question in a bounded excerpt of
//! the document text.

pub mod bridge;
pub mod context;
pub mod prompt;
pub mod session;

pub use bridge::{BridgeError, BridgeResponse, HostBridge, HttpBridge, OllamaBridge};
pub use context::{
    extract_context, find_relevant_context, ContextSource, ExtractedContext, DEFAULT_CONTEXT_BUDGET,
};
pub use prompt::{build_prompt, generate_response_payload, GENERATE_RESPONSE_EVENT};
pub use session::{SearchError, SearchPhase, SearchSession, SearchStep, SearchTicket};
