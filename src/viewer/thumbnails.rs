//! Lazy thumbnail cache
//!
//! Each page of the current document gets a placeholder that starts
//! `Absent` and carries a one-shot visibility observer. The first time a
//! placeholder comes into view (within a lookahead margin), its observer is
//! torn down, the entry becomes `Pending` and a single render request is
//! issued. Failed renders stay `Pending`: nothing is ever retried for the
//! same document.
//!
//! Switching documents drops every entry and observer. Completions carry
//! the document identity they were issued for and are ignored once that
//! document is no longer current.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::{DocumentError, DocumentId, RenderedImage};

/// Default thumbnail width in pixels
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 150;
/// Default lookahead margin around the visible strip, in pixels
pub const DEFAULT_LOOKAHEAD_MARGIN: f64 = 100.0;
/// Width/height ratio assumed for placeholders before a page is rendered
pub const PLACEHOLDER_ASPECT_RATIO: f64 = 0.707;

/// Thumbnail strip layout
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Rendered thumbnail width in pixels
    pub width: u32,
    /// Extra distance above and below the viewport that counts as visible
    pub lookahead_margin: f64,
    /// Vertical gap between placeholders
    pub spacing: f64,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_THUMBNAIL_WIDTH,
            lookahead_margin: DEFAULT_LOOKAHEAD_MARGIN,
            spacing: 8.0,
        }
    }
}

impl ThumbnailConfig {
    /// Height of one placeholder slot including spacing
    pub fn slot_height(&self) -> f64 {
        self.width as f64 / PLACEHOLDER_ASPECT_RATIO + self.spacing
    }
}

/// Scroll position of the thumbnail strip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailViewport {
    pub scroll_offset: f64,
    pub height: f64,
}

/// State of one placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailState {
    Absent,
    Pending,
    Ready(Arc<RenderedImage>),
}

impl ThumbnailState {
    pub fn kind(&self) -> ThumbnailKind {
        match self {
            ThumbnailState::Absent => ThumbnailKind::Absent,
            ThumbnailState::Pending => ThumbnailKind::Pending,
            ThumbnailState::Ready(_) => ThumbnailKind::Ready,
        }
    }
}

/// Serializable name of a [`ThumbnailState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailKind {
    Absent,
    Pending,
    Ready,
}

/// Registration of a placeholder's visibility observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverHandle {
    pub document: DocumentId,
    pub page: u32,
}

/// Render job for one page of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailRequest {
    pub document: DocumentId,
    pub page: u32,
    pub width: u32,
}

/// Per-document thumbnail cache
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    config: ThumbnailConfig,
    document: Option<DocumentId>,
    entries: Vec<ThumbnailState>,
    observers: BTreeMap<u32, ObserverHandle>,
}

impl ThumbnailCache {
    pub fn new(config: ThumbnailConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    pub fn document(&self) -> Option<DocumentId> {
        self.document
    }

    /// Drop every entry and observer
    pub fn clear(&mut self) {
        self.document = None;
        self.entries.clear();
        self.observers.clear();
    }

    /// Start over for a new document: all pages `Absent`, all observed
    pub fn reset(&mut self, document: DocumentId, total_pages: u32) {
        self.clear();
        self.document = Some(document);
        self.entries = vec![ThumbnailState::Absent; total_pages as usize];
        self.observers = (1..=total_pages)
            .map(|page| (page, ObserverHandle { document, page }))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// State of `page` for the current document
    pub fn get(&self, page: u32) -> Option<&ThumbnailState> {
        let index = (page as usize).checked_sub(1)?;
        self.entries.get(index)
    }

    /// All entries in page order
    pub fn entries(&self) -> impl Iterator<Item = (u32, &ThumbnailState)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, state)| (index as u32 + 1, state))
    }

    /// Number of placeholders still waiting for their first visibility
    pub fn observed_count(&self) -> usize {
        self.observers.len()
    }

    pub fn is_observed(&self, page: u32) -> bool {
        self.observers.contains_key(&page)
    }

    /// Pages whose slots intersect the viewport extended by the lookahead margin
    pub fn visible_pages(&self, viewport: ThumbnailViewport) -> Option<RangeInclusive<u32>> {
        let total = self.entries.len() as u32;
        if total == 0
            || !viewport.scroll_offset.is_finite()
            || !viewport.height.is_finite()
            || viewport.height < 0.0
        {
            return None;
        }

        let slot = self.config.slot_height();
        if slot.is_nan() || slot <= 0.0 {
            return None;
        }

        let top = (viewport.scroll_offset - self.config.lookahead_margin).max(0.0);
        let bottom = viewport.scroll_offset + viewport.height + self.config.lookahead_margin;
        if bottom < 0.0 {
            return None;
        }

        // Slot indices stay in f64 until clamped below `total`
        let first_index = (top / slot).floor();
        if first_index >= total as f64 {
            return None;
        }
        let last_index = (bottom / slot).floor().min(total as f64 - 1.0);

        Some(first_index as u32 + 1..=last_index as u32 + 1)
    }

    /// Strip scrolled: every observed placeholder now in range fires
    pub fn viewport_changed(&mut self, viewport: ThumbnailViewport) -> Vec<ThumbnailRequest> {
        let Some(range) = self.visible_pages(viewport) else {
            return Vec::new();
        };

        let pages: Vec<u32> = self.observers.range(range).map(|(page, _)| *page).collect();
        pages
            .into_iter()
            .filter_map(|page| self.mark_visible(page))
            .collect()
    }

    /// Placeholder for `page` became visible.
    ///
    /// Only the first call per page and document yields a request.
    pub fn mark_visible(&mut self, page: u32) -> Option<ThumbnailRequest> {
        let observer = self.observers.remove(&page)?;
        if Some(observer.document) != self.document {
            return None;
        }

        let entry = self.entries.get_mut(page as usize - 1)?;
        *entry = ThumbnailState::Pending;

        Some(ThumbnailRequest {
            document: observer.document,
            page,
            width: self.config.width,
        })
    }

    /// Commit a finished render. Returns `false` when the result was dropped.
    pub fn complete(
        &mut self,
        request: ThumbnailRequest,
        result: Result<RenderedImage, DocumentError>,
    ) -> bool {
        if Some(request.document) != self.document {
            tracing::debug!(
                document = %request.document,
                page = request.page,
                "Discarding thumbnail for a replaced document"
            );
            return false;
        }

        let Some(entry) = (request.page as usize)
            .checked_sub(1)
            .and_then(|index| self.entries.get_mut(index))
        else {
            return false;
        };

        match result {
            Ok(image) => {
                *entry = ThumbnailState::Ready(Arc::new(image));
                true
            }
            Err(e) => {
                tracing::warn!(
                    document = %request.document,
                    page = request.page,
                    "Failed to render thumbnail: {}",
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ImageFormat;

    fn image(tag: &str) -> RenderedImage {
        RenderedImage {
            data: tag.as_bytes().to_vec(),
            format: ImageFormat::Jpeg,
            width: 150,
            height: 212,
        }
    }

    fn cache_with(pages: u32) -> (ThumbnailCache, DocumentId) {
        let mut cache = ThumbnailCache::new(ThumbnailConfig::default());
        let doc = DocumentId::new(1);
        cache.reset(doc, pages);
        (cache, doc)
    }

    #[test]
    fn test_reset_creates_absent_observed_entries() {
        let (cache, doc) = cache_with(4);
        assert_eq!(cache.document(), Some(doc));
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.observed_count(), 4);
        assert!(cache.entries().all(|(_, s)| *s == ThumbnailState::Absent));
        assert_eq!(cache.get(0), None);
        assert_eq!(cache.get(5), None);
    }

    #[test]
    fn test_first_visibility_is_one_shot() {
        let (mut cache, doc) = cache_with(3);

        let request = cache.mark_visible(2).unwrap();
        assert_eq!(request, ThumbnailRequest { document: doc, page: 2, width: 150 });
        assert_eq!(cache.get(2), Some(&ThumbnailState::Pending));
        assert!(!cache.is_observed(2));

        assert_eq!(cache.mark_visible(2), None);
        assert_eq!(cache.mark_visible(9), None);
    }

    #[test]
    fn test_completion_fills_entry() {
        let (mut cache, _) = cache_with(3);
        let request = cache.mark_visible(1).unwrap();

        assert!(cache.complete(request, Ok(image("p1"))));
        match cache.get(1) {
            Some(ThumbnailState::Ready(img)) => assert_eq!(img.data, b"p1"),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_failed_render_stays_pending() {
        let (mut cache, _) = cache_with(3);
        let request = cache.mark_visible(3).unwrap();

        assert!(!cache.complete(request, Err(DocumentError::RenderError("boom".into()))));
        assert_eq!(cache.get(3), Some(&ThumbnailState::Pending));

        // Scrolling past it again does not re-issue a render
        let requests = cache.viewport_changed(ThumbnailViewport { scroll_offset: 0.0, height: 2000.0 });
        assert!(requests.iter().all(|r| r.page != 3));
        assert_eq!(cache.get(3), Some(&ThumbnailState::Pending));
    }

    #[test]
    fn test_stale_completion_discarded() {
        let (mut cache, _) = cache_with(3);
        let request_a = cache.mark_visible(2).unwrap();

        let doc_b = DocumentId::new(2);
        cache.reset(doc_b, 3);

        assert!(!cache.complete(request_a, Ok(image("a2"))));
        assert_eq!(cache.get(2), Some(&ThumbnailState::Absent));

        let request_b = cache.mark_visible(2).unwrap();
        assert_eq!(request_b.document, doc_b);
        assert!(cache.complete(request_b, Ok(image("b2"))));
        match cache.get(2) {
            Some(ThumbnailState::Ready(img)) => assert_eq!(img.data, b"b2"),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_clear_drops_everything() {
        let (mut cache, _) = cache_with(5);
        let request = cache.mark_visible(1).unwrap();
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.observed_count(), 0);
        assert_eq!(cache.mark_visible(2), None);
        assert!(!cache.complete(request, Ok(image("late"))));
    }

    #[test]
    fn test_visible_pages_with_lookahead() {
        let (cache, _) = cache_with(100);
        let slot = cache.config().slot_height();

        // Viewport ends 50px short of the third slot; the margin pulls it in
        let range = cache
            .visible_pages(ThumbnailViewport { scroll_offset: 0.0, height: slot * 2.0 - 50.0 })
            .unwrap();
        assert_eq!(range, 1..=3);

        // Scrolled far down, clamped to the last page
        let range = cache
            .visible_pages(ThumbnailViewport { scroll_offset: slot * 99.0, height: slot * 5.0 })
            .unwrap();
        assert_eq!(*range.end(), 100);
        assert!(*range.start() < 100);
    }

    #[test]
    fn test_visible_pages_extreme_geometry() {
        let (mut cache, _) = cache_with(10);

        let far = ThumbnailViewport { scroll_offset: 1.0e12, height: 500.0 };
        assert!(cache.visible_pages(far).is_none());
        assert!(cache.viewport_changed(far).is_empty());

        let tall = ThumbnailViewport { scroll_offset: 0.0, height: 1.0e12 };
        assert_eq!(cache.visible_pages(tall), Some(1..=10));

        let above = ThumbnailViewport { scroll_offset: -1.0e12, height: 500.0 };
        assert!(cache.visible_pages(above).is_none());

        // Slightly above the strip still reaches the first page
        let range = cache
            .visible_pages(ThumbnailViewport { scroll_offset: -50.0, height: 100.0 })
            .unwrap();
        assert_eq!(*range.start(), 1);

        for viewport in [
            ThumbnailViewport { scroll_offset: f64::NAN, height: 500.0 },
            ThumbnailViewport { scroll_offset: 0.0, height: f64::NAN },
            ThumbnailViewport { scroll_offset: f64::INFINITY, height: 500.0 },
            ThumbnailViewport { scroll_offset: 0.0, height: f64::INFINITY },
            ThumbnailViewport { scroll_offset: 0.0, height: -1.0 },
        ] {
            assert!(cache.visible_pages(viewport).is_none(), "{:?}", viewport);
        }

        // Nothing was consumed by the rejected viewports
        assert_eq!(cache.observed_count(), 10);
    }

    #[test]
    fn test_viewport_changed_issues_each_page_once() {
        let (mut cache, _) = cache_with(50);
        let viewport = ThumbnailViewport { scroll_offset: 0.0, height: 600.0 };

        let first = cache.viewport_changed(viewport);
        assert!(!first.is_empty());
        let pages: Vec<u32> = first.iter().map(|r| r.page).collect();
        let expected: Vec<u32> = cache.visible_pages(viewport).unwrap().collect();
        assert_eq!(pages, expected);

        assert!(cache.viewport_changed(viewport).is_empty());
    }

    #[test]
    fn test_empty_cache_has_no_visible_pages() {
        let cache = ThumbnailCache::new(ThumbnailConfig::default());
        assert!(cache
            .visible_pages(ThumbnailViewport { scroll_offset: 0.0, height: 500.0 })
            .is_none());
    }
}
