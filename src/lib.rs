//! # slidegen
//!
//! Turn product information into a structured B2B sales-proposal slide deck
//! with one LLM call per step.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text | URL | PDF
//!  │
//!  ├─ 1. Ingest    flatten to plain text, truncate to 8000 chars
//!  ├─ 2. Prompt    persona + fixed output rules + product text
//!  ├─ 3. Model     one call (gpt-4o by default)
//!  ├─ 4. Extract   outermost JSON object/array out of chatty replies
//!  └─ 5. Validate  parse, then report structural warnings
//! ```
//!
//! Two operations run this pipeline: [`analyze`] produces an
//! [`AnalysisResult`], [`generate`] produces a [`Deck`] of [`SlideRecord`]s.
//! A typical flow is analyze, let a human confirm, then generate with the
//! analysis threaded through as context.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slidegen::{analyze, generate, DeckConfig, GenerateRequest, SourceInput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = DeckConfig::default();
//!     let input = SourceInput::Text("Widget Pro: a B2B inventory scanner for warehouses".into());
//!
//!     let analysis = analyze(&input, &config).await?;
//!     let request = GenerateRequest::new(analysis.product_info.clone()).with_analysis(&analysis)?;
//!     let deck = generate(&request, &config).await?;
//!     for slide in &deck.slides {
//!         println!("{}", slide.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `slidegen` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! slidegen = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod deck;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DeckConfig, DeckConfigBuilder, DEFAULT_MODEL};
pub use deck::{analyze, analyze_sync, analyze_text, generate, generate_sync, ingest, GenerateRequest};
pub use error::{DeckError, DeckWarning, ErrorKind};
pub use output::{AnalysisOutput, AnalysisResult, Deck, EmbeddedBlock, SlideRecord, SlideType};
pub use pipeline::extract::{extract_json, JsonKind};
pub use pipeline::ingest::{ProductInfo, SourceInput};
pub use pipeline::llm::{CompletionSettings, ModelClient, ProviderClient};
pub use pipeline::prompt::PromptPayload;
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback, Stage};
