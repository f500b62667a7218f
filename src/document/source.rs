//! Document source resolution
//!
//! A document source is either a remote URL fetched over HTTP(S) or a
//! filesystem path. No other format negotiation happens here; the bytes
//! are handed to the rendering engine as-is.

use std::path::PathBuf;

use super::error::{DocumentError, Result};

/// Where a document's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Remote(String),
    Local(PathBuf),
}

impl SourceLocation {
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(DocumentError::NotFound("empty document source".to_string()));
        }

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Ok(Self::Remote(trimmed.to_string()))
        } else {
            let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
            Ok(Self::Local(PathBuf::from(path)))
        }
    }

    /// Read the whole byte stream
    pub async fn fetch_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::Remote(url) => {
                let response = reqwest::get(url).await?;
                if !response.status().is_success() {
                    return Err(DocumentError::Fetch(format!(
                        "{} returned {}",
                        url,
                        response.status()
                    )));
                }
                Ok(response.bytes().await?.to_vec())
            }
            Self::Local(path) => tokio::fs::read(path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DocumentError::NotFound(path.display().to_string())
                } else {
                    DocumentError::Io(e)
                }
            }),
        }
    }
}

/// File name offered when the document is downloaded
pub fn download_file_name(source: &str) -> String {
    source
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("document.pdf")
        .to_string()
}
