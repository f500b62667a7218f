//! MuPDF-backed document engine
//!
//! MuPDF work is CPU-bound and blocking, so every call runs on
//! `tokio::task::spawn_blocking`.

use std::sync::Arc;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use mupdf::{Colorspace, Matrix};

use crate::document::{
    Document, DocumentError, DocumentLoader, DocumentParser, DocumentRenderer, ImageFormat, PageSize,
    RenderedImage, Result, SourceLocation,
};

use super::safe::SafeDocument;

/// JPEG quality of rendered thumbnails
pub const THUMBNAIL_JPEG_QUALITY: u8 = 80;

/// Opens PDFs from URLs or filesystem paths
#[derive(Debug, Default, Clone)]
pub struct MupdfLoader;

impl MupdfLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentLoader for MupdfLoader {
    async fn load(&self, source: &str) -> Result<Arc<dyn Document>> {
        let location = SourceLocation::parse(source)?;
        let data = location.fetch_bytes().await?;
        tracing::debug!(source = %source, bytes = data.len(), "Fetched document");

        let document = tokio::task::spawn_blocking(move || SafeDocument::from_bytes(data))
            .await
            .map_err(|e| DocumentError::ParseError(format!("Task join error: {}", e)))??;

        Ok(Arc::new(MupdfDocument::new(document)))
    }
}

/// A parsed PDF
pub struct MupdfDocument {
    doc: Arc<SafeDocument>,
}

impl MupdfDocument {
    pub fn new(doc: SafeDocument) -> Self {
        Self { doc: Arc::new(doc) }
    }

    fn check_page(&self, page: u32) -> Result<()> {
        if page == 0 || page > self.doc.page_count() {
            return Err(DocumentError::PageNotFound(page));
        }
        Ok(())
    }

    /// Run a blocking closure against the document
    async fn blocking<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&SafeDocument) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let doc = Arc::clone(&self.doc);
        tokio::task::spawn_blocking(move || f(&doc))
            .await
            .map_err(|e| DocumentError::RenderError(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl DocumentParser for MupdfDocument {
    fn page_count(&self) -> u32 {
        self.doc.page_count()
    }

    async fn page_size(&self, page: u32) -> Result<PageSize> {
        self.check_page(page)?;
        self.blocking(move |doc| {
            doc.with_doc(|mupdf_doc| {
                let bounds = mupdf_doc.load_page(page as i32 - 1)?.bounds()?;
                Ok(PageSize::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
            })
        })
        .await
    }

    async fn extract_text(&self, page: u32) -> Result<String> {
        self.check_page(page)?;
        self.blocking(move |doc| {
            doc.with_doc(|mupdf_doc| {
                let page = mupdf_doc.load_page(page as i32 - 1)?;
                page.to_text()
                    .map_err(|e| DocumentError::TextExtractionError(e.to_string()))
            })
        })
        .await
    }
}

#[async_trait]
impl DocumentRenderer for MupdfDocument {
    async fn render_thumbnail(&self, page: u32, width: u32) -> Result<RenderedImage> {
        self.check_page(page)?;
        if width == 0 {
            return Err(DocumentError::RenderError("thumbnail width must be positive".to_string()));
        }

        self.blocking(move |doc| {
            doc.with_doc(|mupdf_doc| {
                let page = mupdf_doc.load_page(page as i32 - 1)?;
                let bounds = page.bounds()?;
                let page_width = bounds.x1 - bounds.x0;
                if page_width <= 0.0 {
                    return Err(DocumentError::RenderError("page has no width".to_string()));
                }

                let scale = width as f32 / page_width;
                let matrix = Matrix::new_scale(scale, scale);
                let colorspace = Colorspace::device_rgb();
                let pixmap = page.to_pixmap(&matrix, &colorspace, false, false)?;

                encode_jpeg(&pixmap)
            })
        })
        .await
    }
}

/// Encode a pixmap as JPEG, dropping any alpha channel
fn encode_jpeg(pixmap: &mupdf::Pixmap) -> Result<RenderedImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    let mut rgb_buffer = Vec::with_capacity((width * height * 3) as usize);
    for pixel in 0..(width as usize * height as usize) {
        let offset = pixel * n;
        let r = samples.get(offset).copied().unwrap_or(0);
        let g = samples.get(offset + 1).copied().unwrap_or(r);
        let b = samples.get(offset + 2).copied().unwrap_or(r);
        rgb_buffer.extend_from_slice(&[r, g, b]);
    }

    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, THUMBNAIL_JPEG_QUALITY)
        .write_image(&rgb_buffer, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| DocumentError::ImageError(e.to_string()))?;

    Ok(RenderedImage {
        data,
        format: ImageFormat::Jpeg,
        width,
        height,
    })
}
