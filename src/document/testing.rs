//! In-memory documents for tests

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::error::{DocumentError, Result};
use super::traits::{Document, DocumentLoader, DocumentParser, DocumentRenderer};
use super::types::{ImageFormat, PageSize, RenderedImage};

/// Document whose pages are plain strings.
///
/// Thumbnails encode `"<tag>:<page>"` so tests can tell documents apart.
pub struct StaticDocument {
    tag: String,
    pages: Vec<String>,
    size: PageSize,
    failing_renders: HashSet<u32>,
    failing_text: HashSet<u32>,
    text_delays: HashMap<u32, Duration>,
    render_gate: Option<Arc<Semaphore>>,
}

impl StaticDocument {
    pub fn new<S: Into<String>>(pages: Vec<S>) -> Self {
        Self {
            tag: "doc".to_string(),
            pages: pages.into_iter().map(Into::into).collect(),
            size: PageSize::new(600.0, 800.0),
            failing_renders: HashSet::new(),
            failing_text: HashSet::new(),
            text_delays: HashMap::new(),
            render_gate: None,
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    pub fn failing_render(mut self, page: u32) -> Self {
        self.failing_renders.insert(page);
        self
    }

    pub fn failing_text(mut self, page: u32) -> Self {
        self.failing_text.insert(page);
        self
    }

    pub fn text_delay(mut self, page: u32, delay: Duration) -> Self {
        self.text_delays.insert(page, delay);
        self
    }

    /// Renders wait for a permit on `gate` before completing
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.render_gate = Some(gate);
        self
    }

    fn check_page(&self, page: u32) -> Result<()> {
        if page == 0 || page as usize > self.pages.len() {
            return Err(DocumentError::PageNotFound(page));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentParser for StaticDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    async fn page_size(&self, page: u32) -> Result<PageSize> {
        self.check_page(page)?;
        Ok(self.size)
    }

    async fn extract_text(&self, page: u32) -> Result<String> {
        self.check_page(page)?;
        if let Some(delay) = self.text_delays.get(&page) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_text.contains(&page) {
            return Err(DocumentError::TextExtractionError(format!("page {} unreadable", page)));
        }
        Ok(self.pages[page as usize - 1].clone())
    }
}

#[async_trait]
impl DocumentRenderer for StaticDocument {
    async fn render_thumbnail(&self, page: u32, width: u32) -> Result<RenderedImage> {
        self.check_page(page)?;
        if let Some(gate) = &self.render_gate {
            gate.acquire()
                .await
                .map_err(|e| DocumentError::RenderError(e.to_string()))?
                .forget();
        }
        if self.failing_renders.contains(&page) {
            return Err(DocumentError::RenderError(format!("page {} is corrupt", page)));
        }
        Ok(RenderedImage {
            data: format!("{}:{}", self.tag, page).into_bytes(),
            format: ImageFormat::Jpeg,
            width,
            height: (width as f32 * self.size.height / self.size.width).round() as u32,
        })
    }
}

/// Loader serving a fixed set of documents by source
#[derive(Default)]
pub struct StaticLoader {
    documents: HashMap<String, Arc<dyn Document>>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: &str, document: impl Document + 'static) -> Self {
        self.documents.insert(source.to_string(), Arc::new(document));
        self
    }
}

#[async_trait]
impl DocumentLoader for StaticLoader {
    async fn load(&self, source: &str) -> Result<Arc<dyn Document>> {
        self.documents
            .get(source)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(source.to_string()))
    }
}
