//! PDF engine (MuPDF)
//!
//! Concrete [`DocumentLoader`](crate::document::DocumentLoader) used by the
//! server binary. Enabled with the `mupdf` cargo feature.

mod engine;
mod safe;

pub use engine::{MupdfDocument, MupdfLoader, THUMBNAIL_JPEG_QUALITY};
pub use safe::{is_pdf, SafeDocument};
