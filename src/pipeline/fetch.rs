//! Page fetch: download a product page and flatten it to plain text.
//!
//! The fetch itself sits behind [`PageFetcher`] so callers (and tests) can
//! swap the transport without touching ingestion. [`HttpFetcher`] is the
//! default: a single GET with a desktop browser User-Agent and a hard
//! timeout. There is no retry; a failed fetch is reported immediately.
//!
//! [`html_to_text`] drops the page chrome (`script`, `style`, `nav`,
//! `header`, `footer`) and emits the remaining text nodes one per line.

use crate::error::DeckError;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Node};
use std::time::Duration;
use tracing::{debug, info};

/// User-Agent sent with every page fetch. Many product sites serve an
/// empty shell or a 403 to obvious bots.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// A successfully retrieved page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

/// Retrieve a page body by URL.
///
/// Implementations must fail with [`DeckError::FetchError`] on transport
/// errors, timeouts, and non-2xx statuses.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout_secs: u64) -> Result<FetchedPage, DeckError>;
}

/// Default [`PageFetcher`] backed by reqwest.
#[derive(Debug, Default, Clone)]
pub struct HttpFetcher;

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout_secs: u64) -> Result<FetchedPage, DeckError> {
        info!("Fetching product page: {}", url);
        let fail = |reason: String| DeckError::FetchError {
            url: url.to_string(),
            reason,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|e| fail(e.to_string()))?;

        let response = client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                fail(format!("timed out after {timeout_secs}s"))
            } else {
                fail(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {status}")));
        }

        let body = response.text().await.map_err(|e| fail(e.to_string()))?;
        debug!("Fetched {} bytes from {}", body.len(), url);

        Ok(FetchedPage {
            status: status.as_u16(),
            body,
        })
    }
}

/// Tags whose whole subtree is page chrome, not product content.
const SKIPPED_TAGS: [&str; 6] = ["script", "style", "noscript", "nav", "footer", "header"];

/// Flatten an HTML document to newline-separated text.
///
/// Each non-blank text node becomes one trimmed line; subtrees rooted at
/// [`SKIPPED_TAGS`] are dropped entirely.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();
    collect_text(document.root_element(), &mut lines);
    lines.join("\n")
}

fn collect_text(element: ElementRef<'_>, lines: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let line = clean_line(text);
                if !line.is_empty() {
                    lines.push(line);
                }
            }
            Node::Element(el) if SKIPPED_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, lines);
                }
            }
            _ => {}
        }
    }
}

/// Trim, collapse inner whitespace runs, and drop invisible characters.
fn clean_line(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}'], "")
}
