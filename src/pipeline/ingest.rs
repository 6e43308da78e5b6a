//! Source ingestion: normalise text, a URL, or an uploaded document into a
//! single bounded [`ProductInfo`] string.
//!
//! Every mode ends in the same two steps: truncate to the character budget
//! (on a `char` boundary, never splitting a code point) and reject results
//! shorter than the minimum length. That length gate is the only semantic
//! check here; content is never classified.

use crate::error::DeckError;
use crate::pipeline::document::DocumentReader;
use crate::pipeline::fetch::{html_to_text, PageFetcher};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// The three ways a caller can describe a product.
#[derive(Debug, Clone)]
pub enum SourceInput {
    /// Free text pasted by the user.
    Text(String),
    /// A product page to fetch.
    Url(String),
    /// An uploaded document (PDF).
    Document { filename: String, bytes: Vec<u8> },
}

impl SourceInput {
    /// Build an input from a form-style `(kind, value)` pair.
    ///
    /// `kind` is one of `text`, `url`, or `pdf`; for `pdf` the value is a
    /// local file path.
    pub async fn from_kind(kind: &str, value: &str) -> Result<Self, DeckError> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(SourceInput::Text(value.to_string())),
            "url" => Ok(SourceInput::Url(value.to_string())),
            "pdf" | "document" => Self::document_file(value).await,
            other => Err(DeckError::InvalidInput {
                input: other.to_string(),
            }),
        }
    }

    /// Read a local file into a [`SourceInput::Document`].
    pub async fn document_file(path: impl AsRef<Path>) -> Result<Self, DeckError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if filename.is_empty() {
            return Err(DeckError::EmptyInput {
                what: "no document selected".to_string(),
            });
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DeckError::EmptyInput {
                    what: format!("document '{}' not found", path.display()),
                }
            } else {
                DeckError::Internal(format!("Failed to read '{}': {}", path.display(), e))
            }
        })?;

        Ok(SourceInput::Document { filename, bytes })
    }

    pub fn mode(&self) -> &'static str {
        match self {
            SourceInput::Text(_) => "text",
            SourceInput::Url(_) => "url",
            SourceInput::Document { .. } => "pdf",
        }
    }
}

/// Character bounds applied to every ingested text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestLimits {
    /// Maximum characters kept. Default: 8000.
    pub max_chars: usize,
    /// Minimum characters (after trim) required. Default: 10.
    pub min_chars: usize,
    /// Page-fetch timeout. Default: 15.
    pub fetch_timeout_secs: u64,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_chars: 8000,
            min_chars: 10,
            fetch_timeout_secs: 15,
        }
    }
}

/// Ingested product description: trimmed, at most `max_chars` characters,
/// at least `min_chars`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductInfo(String);

impl ProductInfo {
    /// Apply the truncation and length gate to already-extracted text.
    pub fn new(text: &str, limits: &IngestLimits) -> Result<Self, DeckError> {
        let truncated = truncate_chars(text.trim(), limits.max_chars).trim();
        let chars = truncated.chars().count();
        if chars < limits.min_chars {
            return Err(DeckError::TooShort {
                chars,
                min: limits.min_chars,
            });
        }
        Ok(ProductInfo(truncated.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for ProductInfo {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cut `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Ingest any [`SourceInput`] into a [`ProductInfo`].
pub async fn ingest(
    input: &SourceInput,
    fetcher: &dyn PageFetcher,
    reader: &dyn DocumentReader,
    limits: &IngestLimits,
) -> Result<ProductInfo, DeckError> {
    info!("Ingesting {} input", input.mode());

    let raw = match input {
        SourceInput::Text(text) => {
            if text.trim().is_empty() {
                return Err(DeckError::EmptyInput {
                    what: "product description is empty".to_string(),
                });
            }
            text.clone()
        }
        SourceInput::Url(url) => {
            let url = url.trim();
            if url.is_empty() {
                return Err(DeckError::EmptyInput {
                    what: "URL is empty".to_string(),
                });
            }
            let page = fetcher.fetch(url, limits.fetch_timeout_secs).await?;
            html_to_text(&page.body)
        }
        SourceInput::Document { filename, bytes } => {
            if filename.trim().is_empty() || bytes.is_empty() {
                return Err(DeckError::EmptyInput {
                    what: "no document selected".to_string(),
                });
            }
            let pages = reader.read_pages(filename, bytes).await?;
            pages
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        }
    };

    let info = ProductInfo::new(&raw, limits)?;
    debug!(
        "Ingested {} chars (raw {} chars)",
        info.char_count(),
        raw.chars().count()
    );
    Ok(info)
}
