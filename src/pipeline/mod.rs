//! Pipeline stages for product-to-deck generation.
//!
//! Each submodule implements exactly one step, so each can be tested without
//! the others and the two I/O edges (source fetching, the model call) sit
//! behind traits.
//!
//! ## Data Flow
//!
//! ```text
//! ingest ──▶ prompt ──▶ llm ──▶ extract ──▶ validate
//! (text/URL/PDF) (persona+rules) (one call) (outer span) (parse+check)
//! ```
//!
//! 1. [`ingest`]   — text, URL ([`fetch`]) or PDF ([`document`]) to bounded
//!    product text
//! 2. [`prompt`]   — pure assembly of instruction + user message
//! 3. [`llm`]      — a single model call behind [`llm::ModelClient`]; the only
//!    stage talking to a provider
//! 4. [`extract`]  — recover the outermost JSON object/array from the reply
//! 5. [`validate`] — parse the window and report structural warnings

pub mod document;
pub mod extract;
pub mod fetch;
pub mod ingest;
pub mod llm;
pub mod prompt;
pub mod validate;
