//! Zoom scale and fit-to-width calculation

use serde::Serialize;

/// Smallest allowed scale, in percent
pub const MIN_SCALE: f64 = 25.0;
/// Largest allowed scale, in percent
pub const MAX_SCALE: f64 = 300.0;
/// Zoom button step, in percent
pub const ZOOM_STEP: f64 = 25.0;
/// Fraction of the container a fitted page may occupy (2% margin)
pub const FIT_MARGIN: f64 = 0.98;

/// Page scale as a percentage, always within `[MIN_SCALE, MAX_SCALE]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ScaleFactor(f64);

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(100.0)
    }
}

impl ScaleFactor {
    /// Create a scale, clamping into the allowed range.
    /// Non-finite input yields the default scale.
    pub fn new(percent: f64) -> Self {
        if !percent.is_finite() {
            return Self::default();
        }
        Self(percent.clamp(MIN_SCALE, MAX_SCALE))
    }

    pub fn percent(self) -> f64 {
        self.0
    }

    /// Percent rounded for display
    pub fn display_percent(self) -> u32 {
        self.0.round() as u32
    }

    pub fn zoomed_in(self) -> Self {
        Self::new(self.0 + ZOOM_STEP)
    }

    pub fn zoomed_out(self) -> Self {
        Self::new(self.0 - ZOOM_STEP)
    }
}

/// Scale that makes a page of `page_width` fill `container_width`.
///
/// Returns `None` when either width is not positive and finite, in which
/// case the caller keeps its previous scale.
pub fn fit_to_width(container_width: f64, page_width: f64) -> Option<f64> {
    if !container_width.is_finite() || !page_width.is_finite() {
        return None;
    }
    if container_width <= 0.0 || page_width <= 0.0 {
        return None;
    }

    Some((container_width / page_width) * 100.0 * FIT_MARGIN)
}

/// Remembers the last container and natural page widths so the fit can be
/// recomputed whenever either changes.
#[derive(Debug, Clone, Default)]
pub struct FitToWidth {
    container_width: Option<f64>,
    page_width: Option<f64>,
}

impl FitToWidth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container_width(&self) -> Option<f64> {
        self.container_width
    }

    pub fn page_width(&self) -> Option<f64> {
        self.page_width
    }

    /// Container was resized
    pub fn container_resized(&mut self, width: f64) -> Option<ScaleFactor> {
        self.container_width = Some(width);
        self.recompute()
    }

    /// A rendered page reported its natural width. Only a different width
    /// triggers a new fit.
    pub fn page_rendered(&mut self, width: f64) -> Option<ScaleFactor> {
        if self.page_width == Some(width) {
            return None;
        }
        self.page_width = Some(width);
        self.recompute()
    }

    /// Fit using the remembered widths
    pub fn recompute(&self) -> Option<ScaleFactor> {
        let container = self.container_width?;
        let page = self.page_width?;
        fit_to_width(container, page).map(ScaleFactor::new)
    }

    /// Forget the natural page width (the document changed)
    pub fn forget_page(&mut self) {
        self.page_width = None;
    }
}
