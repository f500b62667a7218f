//! Viewer runtime
//!
//! A single task owns the [`Viewer`]. Commands arrive over an mpsc channel
//! from any number of [`ViewerHandle`]s; effects run as independent tasks
//! that post their completions back into the same loop. After every step
//! the current [`ViewerSnapshot`] is published on a watch channel.
//!
//! Nothing is cancelled: when the document changes, tasks still running
//! for the old one finish and the viewer drops their results.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;

use crate::catalog::PaperCatalog;
use crate::document::{Document, DocumentError, DocumentLoader, DocumentParser, DocumentRenderer};
use crate::search::{
    generate_response_payload, BridgeError, HostBridge, SearchError, GENERATE_RESPONSE_EVENT,
};

use super::core::{Panel, Viewer, ViewerSnapshot};
use super::effects::{Completion, Effect};
use super::thumbnails::{ThumbnailState, ThumbnailViewport};

const COMMAND_BUFFER: usize = 64;

/// Upper bounds for effect tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeTimeouts {
    pub load: Duration,
    pub thumbnail: Duration,
    pub page_text: Duration,
    pub bridge: Duration,
}

impl Default for RuntimeTimeouts {
    fn default() -> Self {
        Self {
            load: Duration::from_secs(30),
            thumbnail: Duration::from_secs(30),
            page_text: Duration::from_secs(15),
            bridge: Duration::from_secs(120),
        }
    }
}

/// Runtime errors surfaced to handle callers
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Viewer runtime has stopped")]
    Closed,
}

/// Input accepted by the runtime
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    Load { source: String },
    /// Unknown identifiers are ignored
    LoadPaper { id: String },
    SetPage { page: i64 },
    NextPage,
    PreviousPage,
    ZoomIn,
    ZoomOut,
    FitToWidth { container_width: f64 },
    Viewport {
        container_width: Option<f64>,
        page_width: Option<f64>,
    },
    TogglePanel { panel: Panel },
    ThumbnailsScrolled { viewport: ThumbnailViewport },
    ThumbnailVisible { page: u32 },
    Search { query: String },
}

enum Message {
    Command {
        command: ViewerCommand,
        respond_to: oneshot::Sender<Result<ViewerSnapshot, SearchError>>,
    },
    Thumbnail {
        page: u32,
        respond_to: oneshot::Sender<Option<ThumbnailState>>,
    },
}

/// Task owning the viewer
pub struct ViewerRuntime {
    viewer: Viewer,
    loader: Arc<dyn DocumentLoader>,
    bridge: Option<Arc<dyn HostBridge>>,
    catalog: PaperCatalog,
    timeouts: RuntimeTimeouts,
    commands: mpsc::Receiver<Message>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    snapshots: watch::Sender<ViewerSnapshot>,
}

impl ViewerRuntime {
    /// Start the runtime task with default timeouts
    pub fn spawn(
        viewer: Viewer,
        loader: Arc<dyn DocumentLoader>,
        bridge: Option<Arc<dyn HostBridge>>,
        catalog: PaperCatalog,
    ) -> ViewerHandle {
        Self::spawn_with_timeouts(viewer, loader, bridge, catalog, RuntimeTimeouts::default())
    }

    pub fn spawn_with_timeouts(
        viewer: Viewer,
        loader: Arc<dyn DocumentLoader>,
        bridge: Option<Arc<dyn HostBridge>>,
        catalog: PaperCatalog,
        timeouts: RuntimeTimeouts,
    ) -> ViewerHandle {
        let (commands_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (snapshots, snapshots_rx) = watch::channel(viewer.snapshot());

        let runtime = Self {
            viewer,
            loader,
            bridge,
            catalog,
            timeouts,
            commands,
            completions_tx,
            completions,
            snapshots,
        };
        tokio::spawn(runtime.run());

        ViewerHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
        }
    }

    async fn run(mut self) {
        tracing::debug!(bridge = self.bridge.as_ref().map(|b| b.name()), "Viewer runtime started");

        loop {
            tokio::select! {
                message = self.commands.recv() => match message {
                    Some(message) => self.on_message(message),
                    None => break,
                },
                Some(completion) = self.completions.recv() => {
                    let effects = self.viewer.handle(completion);
                    self.execute(effects);
                    self.publish();
                }
            }
        }

        tracing::debug!("Viewer runtime stopped");
    }

    fn on_message(&mut self, message: Message) {
        match message {
            Message::Command { command, respond_to } => {
                let outcome = self.apply(command).map(|effects| {
                    self.execute(effects);
                    self.publish();
                    self.viewer.snapshot()
                });
                let _ = respond_to.send(outcome);
            }
            Message::Thumbnail { page, respond_to } => {
                let _ = respond_to.send(self.viewer.thumbnail(page).cloned());
            }
        }
    }

    fn apply(&mut self, command: ViewerCommand) -> Result<Vec<Effect>, SearchError> {
        let viewer = &mut self.viewer;

        let effects = match command {
            ViewerCommand::Load { source } => viewer.load(&source),
            ViewerCommand::LoadPaper { id } => match self.catalog.resolve(&id) {
                Some(source) => viewer.load(source),
                None => {
                    tracing::debug!(paper = %id, "Ignoring unknown paper");
                    Vec::new()
                }
            },
            ViewerCommand::SetPage { page } => {
                viewer.set_current_page(page);
                Vec::new()
            }
            ViewerCommand::NextPage => {
                viewer.next_page();
                Vec::new()
            }
            ViewerCommand::PreviousPage => {
                viewer.previous_page();
                Vec::new()
            }
            ViewerCommand::ZoomIn => {
                viewer.zoom_in();
                Vec::new()
            }
            ViewerCommand::ZoomOut => {
                viewer.zoom_out();
                Vec::new()
            }
            ViewerCommand::FitToWidth { container_width } => {
                viewer.fit_to_width(container_width);
                Vec::new()
            }
            ViewerCommand::Viewport {
                container_width,
                page_width,
            } => {
                if let Some(width) = container_width {
                    viewer.container_resized(width);
                }
                if let Some(width) = page_width {
                    viewer.page_rendered(width);
                }
                Vec::new()
            }
            ViewerCommand::TogglePanel { panel } => {
                viewer.toggle_panel(panel);
                Vec::new()
            }
            ViewerCommand::ThumbnailsScrolled { viewport } => viewer.thumbnails_scrolled(viewport),
            ViewerCommand::ThumbnailVisible { page } => viewer.thumbnail_visible(page),
            ViewerCommand::Search { query } => viewer.run_search(&query)?,
        };

        Ok(effects)
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.viewer.snapshot());
    }

    fn execute(&self, effects: Vec<Effect>) {
        for effect in effects {
            tracing::debug!(effect = ?effect, "Spawning effect");
            let completions = self.completions_tx.clone();

            match effect {
                Effect::Load { id, source } => {
                    let loader = Arc::clone(&self.loader);
                    let limit = self.timeouts.load;
                    tokio::spawn(async move {
                        let result = timeout(limit, loader.load(&source))
                            .await
                            .unwrap_or_else(|_| Err(DocumentError::Timeout(limit.as_secs())));
                        let page_width = match &result {
                            Ok(document) => first_page_width(document, limit).await,
                            Err(_) => None,
                        };
                        let _ = completions.send(Completion::Loaded { id, result, page_width });
                    });
                }
                Effect::RenderThumbnail { request, document } => {
                    let limit = self.timeouts.thumbnail;
                    tokio::spawn(async move {
                        let result = timeout(limit, document.render_thumbnail(request.page, request.width))
                            .await
                            .unwrap_or_else(|_| Err(DocumentError::Timeout(limit.as_secs())));
                        let _ = completions.send(Completion::ThumbnailRendered { request, result });
                    });
                }
                Effect::ExtractText { ticket, document } => {
                    let limit = self.timeouts.page_text;
                    tokio::spawn(async move {
                        let result = extract_full_text(document, limit).await;
                        let _ = completions.send(Completion::TextExtracted { ticket, result });
                    });
                }
                Effect::AskBridge { ticket, prompt } => {
                    let bridge = self.bridge.clone();
                    let limit = self.timeouts.bridge;
                    tokio::spawn(async move {
                        let result = ask_bridge(bridge, &prompt, limit).await;
                        let _ = completions.send(Completion::Responded { ticket, result });
                    });
                }
            }
        }
    }
}

/// Natural width of page 1, used to seed fit-to-width
async fn first_page_width(document: &Arc<dyn Document>, limit: Duration) -> Option<f64> {
    if document.page_count() == 0 {
        return None;
    }
    match timeout(limit, document.page_size(1)).await {
        Ok(Ok(size)) => Some(size.width as f64),
        Ok(Err(e)) => {
            tracing::debug!("Could not measure first page: {}", e);
            None
        }
        Err(_) => None,
    }
}

/// Text of every page, requested concurrently and joined in page order
async fn extract_full_text(document: Arc<dyn Document>, limit: Duration) -> Result<String, DocumentError> {
    let pages = document.page_count();
    let texts = join_all((1..=pages).map(|page| {
        let document = Arc::clone(&document);
        async move {
            timeout(limit, document.extract_text(page))
                .await
                .unwrap_or_else(|_| Err(DocumentError::Timeout(limit.as_secs())))
        }
    }))
    .await;

    let texts = texts.into_iter().collect::<Result<Vec<_>, _>>()?;
    Ok(texts.join("\n"))
}

async fn ask_bridge(
    bridge: Option<Arc<dyn HostBridge>>,
    prompt: &str,
    limit: Duration,
) -> Result<crate::search::BridgeResponse, BridgeError> {
    let bridge = bridge.ok_or_else(|| BridgeError::Unavailable("no host bridge configured".to_string()))?;

    match timeout(limit, bridge.request(GENERATE_RESPONSE_EVENT, generate_response_payload(prompt))).await {
        Ok(result) => result,
        Err(_) => Err(BridgeError::Request(format!(
            "Host did not answer within {} seconds",
            limit.as_secs()
        ))),
    }
}

/// Cloneable access to a running viewer
#[derive(Clone)]
pub struct ViewerHandle {
    commands: mpsc::Sender<Message>,
    snapshots: watch::Receiver<ViewerSnapshot>,
}

impl ViewerHandle {
    /// Run `command` and return the snapshot right after it was applied
    pub async fn execute(&self, command: ViewerCommand) -> Result<ViewerSnapshot, ViewerError> {
        let (respond_to, response) = oneshot::channel();
        self.commands
            .send(Message::Command { command, respond_to })
            .await
            .map_err(|_| ViewerError::Closed)?;

        Ok(response.await.map_err(|_| ViewerError::Closed)??)
    }

    pub async fn load(&self, source: &str) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::Load {
            source: source.to_string(),
        })
        .await
    }

    /// Load a catalog paper; unknown ids leave the viewer unchanged
    pub async fn load_paper(&self, id: &str) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::LoadPaper { id: id.to_string() }).await
    }

    pub async fn set_page(&self, page: i64) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::SetPage { page }).await
    }

    pub async fn next_page(&self) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::NextPage).await
    }

    pub async fn previous_page(&self) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::PreviousPage).await
    }

    pub async fn zoom_in(&self) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::ZoomIn).await
    }

    pub async fn zoom_out(&self) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::ZoomOut).await
    }

    pub async fn fit_to_width(&self, container_width: f64) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::FitToWidth { container_width }).await
    }

    pub async fn container_resized(&self, width: f64) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::Viewport {
            container_width: Some(width),
            page_width: None,
        })
        .await
    }

    pub async fn page_rendered(&self, width: f64) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::Viewport {
            container_width: None,
            page_width: Some(width),
        })
        .await
    }

    pub async fn toggle_panel(&self, panel: Panel) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::TogglePanel { panel }).await
    }

    pub async fn thumbnails_scrolled(&self, viewport: ThumbnailViewport) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::ThumbnailsScrolled { viewport }).await
    }

    pub async fn thumbnail_visible(&self, page: u32) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::ThumbnailVisible { page }).await
    }

    pub async fn search(&self, query: &str) -> Result<ViewerSnapshot, ViewerError> {
        self.execute(ViewerCommand::Search {
            query: query.to_string(),
        })
        .await
    }

    /// Thumbnail state of `page`; `None` when the page does not exist
    pub async fn thumbnail(&self, page: u32) -> Result<Option<ThumbnailState>, ViewerError> {
        let (respond_to, response) = oneshot::channel();
        self.commands
            .send(Message::Thumbnail { page, respond_to })
            .await
            .map_err(|_| ViewerError::Closed)?;

        response.await.map_err(|_| ViewerError::Closed)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> ViewerSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewerSnapshot> {
        self.snapshots.clone()
    }
}
