//! Document types

use std::fmt;

use serde::Serialize;

/// Identity of one successful (or attempted) document load.
///
/// Issued from a monotonically increasing counter each time a load starts,
/// so two loads of the same source still get distinct identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

/// Natural page size in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Image output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Encoded bitmap produced by a renderer
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_display() {
        assert_eq!(DocumentId::new(7).to_string(), "doc-7");
        assert!(DocumentId::new(1) < DocumentId::new(2));
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
    }
}
