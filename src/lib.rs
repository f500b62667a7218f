//! Lectern
//!
//! Paginated document viewer engine: page navigation, zoom and
//! fit-to-width, lazily rendered thumbnails and smart search over the
//! document text through a pluggable host bridge.

pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod routes;
pub mod search;
pub mod viewer;

#[cfg(feature = "mupdf")]
pub mod pdf;
