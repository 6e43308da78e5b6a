//! Configuration types for deck generation.
//!
//! Every knob lives in [`DeckConfig`], built via [`DeckConfigBuilder`]. The
//! config is an explicit value passed into each call rather than process
//! state: two requests with different credentials or personas can run side
//! by side by holding two configs.
//!
//! # Design choice: builder over constructor
//! Most callers only set a model or a persona and rely on the documented
//! defaults for the rest.

use crate::error::DeckError;
use crate::pipeline::document::{DocumentReader, PdfiumReader};
use crate::pipeline::fetch::{HttpFetcher, PageFetcher};
use crate::pipeline::ingest::IngestLimits;
use crate::pipeline::llm::{CompletionSettings, ModelClient};
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for the analyze and generate stages.
///
/// Built via [`DeckConfig::builder()`] or using [`DeckConfig::default()`].
///
/// # Example
/// ```rust
/// use slidegen::DeckConfig;
///
/// let config = DeckConfig::builder()
///     .model("gpt-4o-mini")
///     .min_slides(8)
///     .strict(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct DeckConfig {
    /// LLM model identifier, e.g. "gpt-4o". If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider` and `client`, auto-detected from the
    /// environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    ///
    /// Use this to pass per-call credentials: build the provider with the
    /// caller's key and hand it to this request's config only.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed model client. Takes precedence over everything else.
    pub client: Option<Arc<dyn ModelClient>>,

    /// Page fetcher for URL inputs. Default: [`HttpFetcher`].
    pub fetcher: Arc<dyn PageFetcher>,

    /// Document reader for uploaded files. Default: [`PdfiumReader`].
    pub reader: Arc<dyn DocumentReader>,

    /// Persona override for the generate stage. If None, uses
    /// [`crate::prompts::DEFAULT_ROLE_PROMPT`]. A per-request override in
    /// [`crate::deck::GenerateRequest`] wins over this one.
    pub role_prompt: Option<String>,

    /// Sampling for the analyze call. Default: temperature 0.5, 2000 tokens.
    pub analysis_settings: CompletionSettings,

    /// Sampling for the generate call. Default: temperature 0.7, 8192 tokens.
    pub generation_settings: CompletionSettings,

    /// Ingestion bounds: 8000 chars max, 10 chars min, 15s fetch timeout.
    pub limits: IngestLimits,

    /// Slide count below which validation warns. Default: 6.
    ///
    /// The prompt asks for 8; 6 is the smallest deck that can hold one slide
    /// of every type.
    pub min_slides: usize,

    /// Turn validation warnings into [`DeckError::Validation`]. Default: false.
    pub strict: bool,

    /// Optional stage-progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            client: None,
            fetcher: Arc::new(HttpFetcher),
            reader: Arc::new(PdfiumReader::default()),
            role_prompt: None,
            analysis_settings: CompletionSettings::analysis(),
            generation_settings: CompletionSettings::generation(),
            limits: IngestLimits::default(),
            min_slides: 6,
            strict: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for DeckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("client", &self.client.as_ref().map(|_| "<dyn ModelClient>"))
            .field("role_prompt", &self.role_prompt.as_ref().map(|p| p.len()))
            .field("analysis_settings", &self.analysis_settings)
            .field("generation_settings", &self.generation_settings)
            .field("limits", &self.limits)
            .field("min_slides", &self.min_slides)
            .field("strict", &self.strict)
            .finish()
    }
}

impl DeckConfig {
    /// Create a new builder for `DeckConfig`.
    pub fn builder() -> DeckConfigBuilder {
        DeckConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model name used when a provider has to be constructed.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`DeckConfig`].
pub struct DeckConfigBuilder {
    config: DeckConfig,
}

impl fmt::Debug for DeckConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl DeckConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.config.fetcher = fetcher;
        self
    }

    pub fn reader(mut self, reader: Arc<dyn DocumentReader>) -> Self {
        self.config.reader = reader;
        self
    }

    pub fn role_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.role_prompt = Some(prompt.into());
        self
    }

    pub fn analysis_temperature(mut self, t: f32) -> Self {
        self.config.analysis_settings.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn generation_temperature(mut self, t: f32) -> Self {
        self.config.generation_settings.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn analysis_max_tokens(mut self, n: usize) -> Self {
        self.config.analysis_settings.max_tokens = n;
        self
    }

    pub fn generation_max_tokens(mut self, n: usize) -> Self {
        self.config.generation_settings.max_tokens = n;
        self
    }

    /// Wall-clock budget for each model call.
    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.analysis_settings.timeout_secs = secs;
        self.config.generation_settings.timeout_secs = secs;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.limits.fetch_timeout_secs = secs;
        self
    }

    pub fn max_chars(mut self, n: usize) -> Self {
        self.config.limits.max_chars = n;
        self
    }

    pub fn min_chars(mut self, n: usize) -> Self {
        self.config.limits.min_chars = n;
        self
    }

    pub fn min_slides(mut self, n: usize) -> Self {
        self.config.min_slides = n;
        self
    }

    pub fn strict(mut self, v: bool) -> Self {
        self.config.strict = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DeckConfig, DeckError> {
        let c = &self.config;
        if c.limits.min_chars == 0 {
            return Err(DeckError::InvalidConfig("min_chars must be ≥ 1".into()));
        }
        if c.limits.max_chars < c.limits.min_chars {
            return Err(DeckError::InvalidConfig(format!(
                "max_chars ({}) must be ≥ min_chars ({})",
                c.limits.max_chars, c.limits.min_chars
            )));
        }
        if c.limits.fetch_timeout_secs == 0
            || c.analysis_settings.timeout_secs == 0
            || c.generation_settings.timeout_secs == 0
        {
            return Err(DeckError::InvalidConfig("timeouts must be ≥ 1s".into()));
        }
        Ok(self.config)
    }
}
