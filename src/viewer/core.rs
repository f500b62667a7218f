//! Viewer core
//!
//! Composes the document session, thumbnail cache and search session into
//! one owner. Every input mutates state synchronously and returns the
//! [`Effect`]s that must run for it to make progress; their outcomes come
//! back through [`Viewer::handle`]. The core performs no IO.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::DocumentId;
use crate::search::{SearchError, SearchPhase, SearchSession, SearchStep};

use super::effects::{Completion, Effect};
use super::scale::ScaleFactor;
use super::session::{DocumentSession, LoadStatus};
use super::thumbnails::{
    ThumbnailCache, ThumbnailConfig, ThumbnailKind, ThumbnailRequest, ThumbnailState, ThumbnailViewport,
};

/// Side panels of the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Thumbnails,
    Search,
}

impl FromStr for Panel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thumbnails" => Ok(Panel::Thumbnails),
            "search" => Ok(Panel::Search),
            other => Err(format!("Unknown panel: {}", other)),
        }
    }
}

/// Search part of a [`ViewerSnapshot`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnapshot {
    pub phase: SearchPhase,
    pub status: Option<String>,
    pub query: String,
    pub result: Option<String>,
    pub error: Option<String>,
}

/// One thumbnail placeholder in a [`ViewerSnapshot`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThumbnailEntry {
    pub page: u32,
    pub state: ThumbnailKind,
}

/// Read model of the whole viewer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerSnapshot {
    pub status: LoadStatus,
    pub source: Option<String>,
    pub document_id: Option<DocumentId>,
    pub current_page: u32,
    pub total_pages: u32,
    pub scale: f64,
    pub scale_percent: u32,
    pub error: Option<String>,
    pub show_thumbnails: bool,
    pub show_search_panel: bool,
    pub search_available: bool,
    pub search: SearchSnapshot,
    pub thumbnails: Vec<ThumbnailEntry>,
    pub can_go_previous: bool,
    pub can_go_next: bool,
}

/// Viewer state owner
#[derive(Debug)]
pub struct Viewer {
    session: DocumentSession,
    thumbnails: ThumbnailCache,
    search: SearchSession,
    show_thumbnails: bool,
    show_search_panel: bool,
}

impl Viewer {
    /// `search_available` is whether a host bridge is configured
    pub fn new(thumbnails: ThumbnailConfig, context_budget: usize, search_available: bool) -> Self {
        Self {
            session: DocumentSession::new(),
            thumbnails: ThumbnailCache::new(thumbnails),
            search: SearchSession::new(context_budget, search_available),
            show_thumbnails: true,
            show_search_panel: false,
        }
    }

    pub fn session(&self) -> &DocumentSession {
        &self.session
    }

    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    /// Replace the current document with `source`
    pub fn load(&mut self, source: &str) -> Vec<Effect> {
        let id = self.session.begin_load(source);
        self.thumbnails.clear();
        self.search.reset();

        vec![Effect::Load {
            id,
            source: source.to_string(),
        }]
    }

    /// Feed back the outcome of an effect
    pub fn handle(&mut self, completion: Completion) -> Vec<Effect> {
        match completion {
            Completion::Loaded { id, result, page_width } => {
                if let Some(handle) = self.session.finish_load(id, result) {
                    self.thumbnails.reset(handle.id(), handle.total_pages());
                    self.search.set_document(handle.id());
                    if let Some(width) = page_width {
                        self.session.page_rendered(width);
                    }
                }
                Vec::new()
            }
            Completion::ThumbnailRendered { request, result } => {
                self.thumbnails.complete(request, result);
                Vec::new()
            }
            Completion::TextExtracted { ticket, result } => self
                .search
                .text_extracted(ticket, result)
                .map(|step| self.search_effects(step))
                .unwrap_or_default(),
            Completion::Responded { ticket, result } => {
                self.search.response_received(ticket, result);
                Vec::new()
            }
        }
    }

    pub fn set_current_page(&mut self, page: i64) -> Option<u32> {
        self.session.set_current_page(page)
    }

    pub fn next_page(&mut self) -> Option<u32> {
        self.session.next_page()
    }

    pub fn previous_page(&mut self) -> Option<u32> {
        self.session.previous_page()
    }

    pub fn zoom_in(&mut self) -> ScaleFactor {
        self.session.zoom_in()
    }

    pub fn zoom_out(&mut self) -> ScaleFactor {
        self.session.zoom_out()
    }

    pub fn fit_to_width(&mut self, container_width: f64) -> ScaleFactor {
        self.session.fit_to_width(container_width)
    }

    pub fn container_resized(&mut self, width: f64) -> ScaleFactor {
        self.session.container_resized(width)
    }

    pub fn page_rendered(&mut self, width: f64) -> ScaleFactor {
        self.session.page_rendered(width)
    }

    /// Thumbnail strip scrolled or resized
    pub fn thumbnails_scrolled(&mut self, viewport: ThumbnailViewport) -> Vec<Effect> {
        if !self.show_thumbnails {
            tracing::debug!("Thumbnail panel hidden, ignoring viewport report");
            return Vec::new();
        }
        let requests = self.thumbnails.viewport_changed(viewport);
        self.render_effects(requests)
    }

    /// Host-detected visibility of a single placeholder
    pub fn thumbnail_visible(&mut self, page: u32) -> Vec<Effect> {
        if !self.show_thumbnails {
            tracing::debug!(page, "Thumbnail panel hidden, ignoring visibility");
            return Vec::new();
        }
        let requests = self.thumbnails.mark_visible(page).into_iter().collect();
        self.render_effects(requests)
    }

    /// Flip a panel's visibility, returning the new value
    pub fn toggle_panel(&mut self, panel: Panel) -> bool {
        let shown = match panel {
            Panel::Thumbnails => &mut self.show_thumbnails,
            Panel::Search => &mut self.show_search_panel,
        };
        *shown = !*shown;
        *shown
    }

    pub fn is_panel_shown(&self, panel: Panel) -> bool {
        match panel {
            Panel::Thumbnails => self.show_thumbnails,
            Panel::Search => self.show_search_panel,
        }
    }

    /// Ask a question about the current document
    pub fn run_search(&mut self, query: &str) -> Result<Vec<Effect>, SearchError> {
        let step = self.search.start(self.session.current_document(), query)?;
        Ok(self.search_effects(step))
    }

    pub fn thumbnail(&self, page: u32) -> Option<&ThumbnailState> {
        self.thumbnails.get(page)
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        let session = &self.session;
        let search = &self.search;

        ViewerSnapshot {
            status: session.status(),
            source: session.source().map(str::to_string),
            document_id: session.current_document(),
            current_page: session.current_page(),
            total_pages: session.total_pages(),
            scale: session.scale().percent(),
            scale_percent: session.scale().display_percent(),
            error: session.error_message().map(str::to_string),
            show_thumbnails: self.show_thumbnails,
            show_search_panel: self.show_search_panel,
            search_available: search.is_available(),
            search: SearchSnapshot {
                phase: search.phase(),
                status: search.status().map(str::to_string),
                query: search.query().to_string(),
                result: search.result().map(str::to_string),
                error: search.error().map(ToString::to_string),
            },
            thumbnails: self
                .thumbnails
                .entries()
                .map(|(page, state)| ThumbnailEntry {
                    page,
                    state: state.kind(),
                })
                .collect(),
            can_go_previous: session.can_go_previous(),
            can_go_next: session.can_go_next(),
        }
    }

    fn render_effects(&self, requests: Vec<ThumbnailRequest>) -> Vec<Effect> {
        let Some(handle) = self.session.handle() else {
            return Vec::new();
        };

        requests
            .into_iter()
            .filter(|request| request.document == handle.id())
            .map(|request| Effect::RenderThumbnail {
                request,
                document: handle.document(),
            })
            .collect()
    }

    fn search_effects(&self, step: SearchStep) -> Vec<Effect> {
        match step {
            SearchStep::ExtractText { ticket } => match self.session.handle() {
                Some(handle) if handle.id() == ticket.document => vec![Effect::ExtractText {
                    ticket,
                    document: handle.document(),
                }],
                _ => {
                    tracing::debug!(search = ticket.search, "Document gone before text extraction");
                    Vec::new()
                }
            },
            SearchStep::AskBridge { ticket, prompt } => vec![Effect::AskBridge { ticket, prompt }],
        }
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(ThumbnailConfig::default(), crate::search::DEFAULT_CONTEXT_BUDGET, false)
    }
}
