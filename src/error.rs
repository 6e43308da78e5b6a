//! Error types for the slidegen library.
//!
//! Two distinct types reflect two distinct failure modes:
//!
//! * [`DeckError`] — **Fatal** for the current request: no usable input, the
//!   page fetch failed, the model rejected our credentials, or its reply could
//!   not be decoded. Returned as `Err(DeckError)` from every entry point in
//!   [`crate::deck`].
//!
//! * [`DeckWarning`] — **Non-fatal**: the model answered with parseable JSON
//!   but the shape deviates from what the prompt asked for (too few slides,
//!   summary not last, a missing analysis key). Warnings travel alongside the
//!   result so the caller sees exactly what the model produced.
//!
//! Every `DeckError` maps onto a stable [`ErrorKind`]. The kind drives the
//! response code at the caller's boundary; the `Display` text is the
//! free-form diagnostic meant for logs and users.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// All fatal errors returned by the slidegen library.
#[derive(Debug, Error)]
pub enum DeckError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No usable text could be derived from the chosen input mode.
    #[error("No input provided: {what}")]
    EmptyInput { what: String },

    /// Derived text exists but is below the minimum meaningful length.
    #[error("Product information is too short ({chars} characters, need at least {min}).\nPlease provide a more detailed description.")]
    TooShort { chars: usize, min: usize },

    /// Unknown input mode or otherwise malformed input selector.
    #[error("Invalid input '{input}': expected one of text, url, pdf")]
    InvalidInput { input: String },

    /// The page fetch failed (DNS, timeout, non-2xx, body read).
    #[error("Failed to fetch '{url}': {reason}")]
    FetchError { url: String, reason: String },

    /// The uploaded document could not be read.
    #[error("Failed to read document '{filename}': {detail}")]
    DocumentError { filename: String, detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// The extracted window still failed JSON parsing.
    #[error("Could not interpret the model's response. Please try again.\nDetail: {detail}")]
    DecodeError { detail: String },

    /// The LLM provider rejected our credentials.
    #[error("Authentication error from provider '{provider}': {detail}\nCheck the configured API key.")]
    UpstreamAuthError { provider: String, detail: String },

    /// Any other LLM provider failure (rate limit, 5xx, transport).
    #[error("LLM provider '{provider}' failed: {detail}")]
    UpstreamError { provider: String, detail: String },

    /// The LLM call did not complete within the configured wall-clock budget.
    #[error("LLM call timed out after {secs}s")]
    UpstreamTimeout { secs: u64 },

    /// No provider could be constructed (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Shape errors ──────────────────────────────────────────────────────
    /// Strict mode is on and the parsed output carried warnings.
    #[error("Model output failed validation: {}", summarize(.warnings))]
    Validation { warnings: Vec<DeckWarning> },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn summarize(warnings: &[DeckWarning]) -> String {
    warnings
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Stable error category, independent of the diagnostic text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyInput,
    TooShort,
    FetchError,
    DecodeError,
    UpstreamAuthError,
    UpstreamError,
    Invalid,
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for a request-scoped failure response.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::EmptyInput
            | ErrorKind::TooShort
            | ErrorKind::FetchError
            | ErrorKind::Invalid => 400,
            ErrorKind::UpstreamAuthError => 401,
            ErrorKind::DecodeError | ErrorKind::Internal => 500,
            ErrorKind::UpstreamError => 502,
        }
    }
}

impl DeckError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeckError::EmptyInput { .. } => ErrorKind::EmptyInput,
            DeckError::TooShort { .. } => ErrorKind::TooShort,
            DeckError::FetchError { .. } => ErrorKind::FetchError,
            DeckError::DocumentError { .. } | DeckError::InvalidInput { .. } => {
                ErrorKind::Invalid
            }
            DeckError::DecodeError { .. } => ErrorKind::DecodeError,
            DeckError::UpstreamAuthError { .. } => ErrorKind::UpstreamAuthError,
            DeckError::UpstreamError { .. }
            | DeckError::UpstreamTimeout { .. }
            | DeckError::ProviderNotConfigured { .. } => ErrorKind::UpstreamError,
            DeckError::Validation { .. } | DeckError::InvalidConfig(_) => ErrorKind::Invalid,
            DeckError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Classify a provider failure message as auth or generic upstream.
    ///
    /// Providers surface credential problems with inconsistent wording, so
    /// this matches on the lowercase text.
    pub fn from_provider_message(provider: &str, message: impl Into<String>) -> Self {
        let detail = message.into();
        let lower = detail.to_lowercase();
        let is_auth = ["authentication", "api key", "api_key", "unauthorized", "401"]
            .iter()
            .any(|needle| lower.contains(needle));
        if is_auth {
            DeckError::UpstreamAuthError {
                provider: provider.to_string(),
                detail,
            }
        } else {
            DeckError::UpstreamError {
                provider: provider.to_string(),
                detail,
            }
        }
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(e: serde_json::Error) -> Self {
        DeckError::DecodeError {
            detail: e.to_string(),
        }
    }
}

/// A non-fatal shape deviation in parsed model output.
///
/// Slide indices are 1-based to match how the deck is presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum DeckWarning {
    MissingAnalysisKey { key: String },
    TooFewSlides { count: usize, min: usize },
    MissingSlideType { slide: usize },
    UnknownSlideType { slide: usize, value: String },
    CoverNotFirst { found: Option<String> },
    SummaryNotLast { found: Option<String> },
    OutOfOrder { slide: usize, value: String, after: String },
    EmptyTitle { slide: usize },
    EmptyContent { slide: usize },
    TooManyEmbeddedBlocks { slide: usize, count: usize },
    InvalidChartSpec { slide: usize, detail: String },
    /// A field had the wrong JSON type and was coerced. `slide` is `None`
    /// for analysis fields.
    UnexpectedFieldType {
        slide: Option<usize>,
        field: String,
        expected: String,
        found: String,
    },
}

impl fmt::Display for DeckWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckWarning::MissingAnalysisKey { key } => write!(f, "analysis is missing '{key}'"),
            DeckWarning::TooFewSlides { count, min } => {
                write!(f, "deck has {count} slides, expected at least {min}")
            }
            DeckWarning::MissingSlideType { slide } => write!(f, "slide {slide} has no type"),
            DeckWarning::UnknownSlideType { slide, value } => {
                write!(f, "slide {slide} has unknown type '{value}'")
            }
            DeckWarning::CoverNotFirst { found } => write!(
                f,
                "first slide should be 'cover', found {}",
                found.as_deref().unwrap_or("<none>")
            ),
            DeckWarning::SummaryNotLast { found } => write!(
                f,
                "last slide should be 'summary', found {}",
                found.as_deref().unwrap_or("<none>")
            ),
            DeckWarning::OutOfOrder { slide, value, after } => {
                write!(f, "slide {slide} ('{value}') appears after '{after}'")
            }
            DeckWarning::EmptyTitle { slide } => write!(f, "slide {slide} has an empty title"),
            DeckWarning::EmptyContent { slide } => write!(f, "slide {slide} has empty content"),
            DeckWarning::TooManyEmbeddedBlocks { slide, count } => {
                write!(f, "slide {slide} embeds {count} diagram/chart blocks (max 1)")
            }
            DeckWarning::InvalidChartSpec { slide, detail } => {
                write!(f, "slide {slide} has an invalid chart block: {detail}")
            }
            DeckWarning::UnexpectedFieldType {
                slide,
                field,
                expected,
                found,
            } => {
                if let Some(n) = slide {
                    write!(f, "slide {n}: ")?;
                }
                write!(f, "'{field}' should be {expected}, found {found}")
            }
        }
    }
}
