//! Document text extraction: uploaded PDF bytes → per-page text.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which keeps
//! thread-local state and must not run on a Tokio worker thread. Reading is
//! moved to the blocking pool so a large upload never stalls the executor.
//!
//! [`DocumentReader`] is the seam: ingestion only needs "bytes in, page
//! texts out", so tests and alternative backends plug in here.

use crate::error::DeckError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Extract text from an uploaded document, one entry per page.
#[async_trait]
pub trait DocumentReader: Send + Sync {
    async fn read_pages(&self, filename: &str, bytes: &[u8]) -> Result<Vec<String>, DeckError>;
}

/// Default [`DocumentReader`] backed by pdfium.
#[derive(Debug, Default, Clone)]
pub struct PdfiumReader {
    /// User password for encrypted PDFs.
    pub password: Option<String>,
}

#[async_trait]
impl DocumentReader for PdfiumReader {
    async fn read_pages(&self, filename: &str, bytes: &[u8]) -> Result<Vec<String>, DeckError> {
        if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
            return Err(DeckError::DocumentError {
                filename: filename.to_string(),
                detail: "not a PDF (missing %PDF header)".to_string(),
            });
        }

        let name = filename.to_string();
        let data = bytes.to_vec();
        let password = self.password.clone();

        tokio::task::spawn_blocking(move || read_pages_blocking(&name, &data, password.as_deref()))
            .await
            .map_err(|e| DeckError::Internal(format!("Document task panicked: {}", e)))?
    }
}

/// Blocking implementation of page-text extraction.
fn read_pages_blocking(
    filename: &str,
    bytes: &[u8],
    password: Option<&str>,
) -> Result<Vec<String>, DeckError> {
    let fail = |detail: String| DeckError::DocumentError {
        filename: filename.to_string(),
        detail,
    };

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| fail(format!("pdfium library unavailable: {:?}", e)))?;
    let pdfium = Pdfium::new(bindings);
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| fail(format!("{:?}", e)))?;

    let pages = document.pages();
    info!("PDF '{}' loaded: {} pages", filename, pages.len());

    let mut texts = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| fail(format!("page {}: {:?}", idx + 1, e)))?
            .all();
        debug!("Page {}: {} chars of text", idx + 1, text.chars().count());
        texts.push(text);
    }

    Ok(texts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_pdf_bytes() {
        let err = PdfiumReader::default()
            .read_pages("notes.txt", b"hello world")
            .await
            .unwrap_err();
        match err {
            DeckError::DocumentError { filename, detail } => {
                assert_eq!(filename, "notes.txt");
                assert!(detail.contains("%PDF"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn rejects_truncated_bytes() {
        let err = PdfiumReader::default().read_pages("a.pdf", b"%P").await.unwrap_err();
        assert!(matches!(err, DeckError::DocumentError { .. }));
    }
}
