//! Document abstraction
//!
//! Engine-agnostic interfaces to the external rendering engine that parses
//! pages and paints bitmaps. The viewer only ever talks to these traits.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   load(source)   ┌──────────────────────────┐
//! │  DocumentLoader  │ ───────────────▶ │  Arc<dyn Document>       │
//! └──────────────────┘                  │  (parser + renderer)     │
//!                                       └──────────────────────────┘
//!                                                   │
//!                                                   ▼
//!                                       ┌──────────────────────────┐
//!                                       │  DocumentHandle          │
//!                                       │  (identity, page count)  │
//!                                       └──────────────────────────┘
//! ```

mod error;
mod handle;
mod source;
mod traits;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{DocumentError, Result};
pub use handle::DocumentHandle;
pub use source::{download_file_name, SourceLocation};
pub use traits::{Document, DocumentLoader, DocumentParser, DocumentRenderer};
pub use types::{DocumentId, ImageFormat, PageSize, RenderedImage};
