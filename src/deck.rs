//! Request-level entry points: analyze a product, generate a deck.
//!
//! Each call runs one pass of the pipeline (ingest, prompt, one model call,
//! extract, validate) and returns. Nothing is kept between calls; the
//! [`DeckConfig`] carries everything a request needs, including credentials.

use crate::config::DeckConfig;
use crate::error::{DeckError, DeckWarning};
use crate::output::{AnalysisOutput, Deck};
use crate::pipeline::ingest::{self as ingest_stage, ProductInfo, SourceInput};
use crate::pipeline::llm::{CompletionSettings, ModelClient, ProviderClient};
use crate::pipeline::prompt::{self, PromptPayload};
use crate::pipeline::validate;
use crate::progress::Stage;
use edgequake_llm::{LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Inputs for one generate call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Product text, usually the `product_info` echoed by [`analyze`].
    pub product_info: String,
    /// Prior analysis to ground the deck in. Blank counts as absent.
    #[serde(default)]
    pub analysis_context: Option<String>,
    /// Persona override for this request only. Blank counts as absent.
    #[serde(default)]
    pub role_prompt: Option<String>,
}

impl GenerateRequest {
    pub fn new(product_info: impl Into<String>) -> Self {
        Self {
            product_info: product_info.into(),
            ..Default::default()
        }
    }

    pub fn with_analysis_context(mut self, context: impl Into<String>) -> Self {
        self.analysis_context = Some(context.into());
        self
    }

    /// Thread a previous [`AnalysisOutput`] through as context.
    pub fn with_analysis(mut self, output: &AnalysisOutput) -> Result<Self, DeckError> {
        self.analysis_context = Some(output.analysis.to_context()?);
        Ok(self)
    }

    pub fn with_role_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.role_prompt = Some(prompt.into());
        self
    }
}

/// Turn any source into bounded product text.
pub async fn ingest(input: &SourceInput, config: &DeckConfig) -> Result<ProductInfo, DeckError> {
    run_stage(config, Stage::Ingest, async {
        ingest_stage::ingest(
            input,
            config.fetcher.as_ref(),
            config.reader.as_ref(),
            &config.limits,
        )
        .await
    })
    .await
}

/// Ingest a source and analyse the product it describes.
///
/// # Errors
/// Ingestion errors (`EmptyInput`, `TooShort`, `FetchError`), upstream
/// errors from the model call, and `DecodeError` when no JSON object can be
/// recovered from the reply. Missing analysis keys are warnings unless
/// [`DeckConfig::strict`] is set.
pub async fn analyze(input: &SourceInput, config: &DeckConfig) -> Result<AnalysisOutput, DeckError> {
    let product_info = ingest(input, config).await?;
    analyze_text(&product_info, config).await
}

/// Analyse already-ingested product text.
pub async fn analyze_text(
    product_info: &ProductInfo,
    config: &DeckConfig,
) -> Result<AnalysisOutput, DeckError> {
    let start = Instant::now();
    info!("Analysing product ({} chars)", product_info.char_count());

    let client = resolve_client(config).await?;
    let payload = run_stage(config, Stage::Prompt, async {
        Ok(prompt::analysis_prompt(product_info))
    })
    .await?;
    let raw = call_model(client.as_ref(), &payload, &config.analysis_settings, config).await?;
    let (analysis, warnings) =
        run_stage(config, Stage::Extract, async { validate::parse_analysis(&raw) }).await?;
    let warnings = run_stage(config, Stage::Validate, async {
        finish_validation(warnings, config)
    })
    .await?;

    info!(
        "Analysis complete: {} warnings, {:?}",
        warnings.len(),
        start.elapsed()
    );
    Ok(AnalysisOutput {
        analysis,
        product_info: product_info.as_str().to_string(),
        warnings,
    })
}

/// Generate a slide deck.
///
/// The persona comes from `request.role_prompt`, else
/// [`DeckConfig::role_prompt`], else the built-in default. The output rules
/// are always appended. Slides are returned in the order the model emitted
/// them.
pub async fn generate(request: &GenerateRequest, config: &DeckConfig) -> Result<Deck, DeckError> {
    let start = Instant::now();
    let product_info = ingest(&SourceInput::Text(request.product_info.clone()), config).await?;
    info!("Generating deck ({} chars)", product_info.char_count());

    let client = resolve_client(config).await?;
    let role_prompt = first_non_blank(&[
        request.role_prompt.as_deref(),
        config.role_prompt.as_deref(),
    ]);
    let payload = run_stage(config, Stage::Prompt, async {
        Ok(prompt::generation_prompt(
            role_prompt,
            &product_info,
            request.analysis_context.as_deref(),
        ))
    })
    .await?;
    debug!(
        "Prompt: {} chars instruction, {} chars user message",
        payload.instruction.len(),
        payload.user_message.len()
    );

    let raw = call_model(client.as_ref(), &payload, &config.generation_settings, config).await?;
    let (slides, mut warnings) =
        run_stage(config, Stage::Extract, async { validate::parse_slides(&raw) }).await?;
    let warnings = run_stage(config, Stage::Validate, async {
        warnings.extend(validate::validate_deck(&slides, config.min_slides));
        finish_validation(warnings, config)
    })
    .await?;

    info!(
        "Deck complete: {} slides, {} warnings, {:?}",
        slides.len(),
        warnings.len(),
        start.elapsed()
    );
    Ok(Deck { slides, warnings })
}

/// Blocking wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(input: &SourceInput, config: &DeckConfig) -> Result<AnalysisOutput, DeckError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DeckError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(input, config))
}

/// Blocking wrapper around [`generate`].
pub fn generate_sync(request: &GenerateRequest, config: &DeckConfig) -> Result<Deck, DeckError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DeckError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(request, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn call_model(
    client: &dyn ModelClient,
    payload: &PromptPayload,
    settings: &CompletionSettings,
    config: &DeckConfig,
) -> Result<String, DeckError> {
    run_stage(config, Stage::Model, async {
        let raw = client.complete(payload, settings).await?;
        debug!("Model replied with {} chars", raw.len());
        Ok(raw)
    })
    .await
}

/// Run one stage, reporting start/complete/error to the progress callback.
async fn run_stage<T, F>(config: &DeckConfig, stage: Stage, fut: F) -> Result<T, DeckError>
where
    F: std::future::Future<Output = Result<T, DeckError>>,
{
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
    let result = fut.await;
    if let Some(ref cb) = config.progress_callback {
        match &result {
            Ok(_) => cb.on_stage_complete(stage),
            Err(e) => cb.on_stage_error(stage, &e.to_string()),
        }
    }
    result
}

/// Log and report warnings; in strict mode any warning fails the request.
fn finish_validation(
    warnings: Vec<DeckWarning>,
    config: &DeckConfig,
) -> Result<Vec<DeckWarning>, DeckError> {
    for w in &warnings {
        warn!("{}", w);
        if let Some(ref cb) = config.progress_callback {
            cb.on_warning(w);
        }
    }
    if config.strict && !warnings.is_empty() {
        return Err(DeckError::Validation { warnings });
    }
    Ok(warnings)
}

fn first_non_blank<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|s| !s.trim().is_empty())
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, DeckError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DeckError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the model client, from most-specific to least-specific.
///
/// 1. **Pre-built client** (`config.client`), used as-is.
/// 2. **Pre-built provider** (`config.provider`), wrapped in a
///    [`ProviderClient`]. This is how per-request credentials arrive.
/// 3. **Named provider + model** (`config.provider_name`), built with
///    [`ProviderFactory::create_llm_provider`].
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 5. **OpenAI** when `OPENAI_API_KEY` is set.
/// 6. **Full auto-detection** via [`ProviderFactory::from_env`].
pub async fn resolve_client(config: &DeckConfig) -> Result<Arc<dyn ModelClient>, DeckError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    let (provider, label) = resolve_provider(config)?;
    debug!("Using LLM provider '{}'", label);
    Ok(Arc::new(ProviderClient::new(provider, label)))
}

fn resolve_provider(config: &DeckConfig) -> Result<(Arc<dyn LLMProvider>, String), DeckError> {
    if let Some(ref provider) = config.provider {
        let label = config.provider_name.as_deref().unwrap_or("custom");
        return Ok((Arc::clone(provider), label.to_string()));
    }

    let model = config.model_or_default();

    if let Some(ref name) = config.provider_name {
        return Ok((create_provider(name, model)?, name.clone()));
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return Ok((create_provider(&prov, &env_model)?, prov));
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return Ok((create_provider("openai", model)?, "openai".to_string()));
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DeckError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok((llm_provider, "auto".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_non_blank_skips_empty() {
        assert_eq!(first_non_blank(&[Some("  "), None, Some("B")]), Some("B"));
        assert_eq!(first_non_blank(&[Some("A"), Some("B")]), Some("A"));
        assert_eq!(first_non_blank(&[None, Some("\n")]), None);
    }

    #[test]
    fn strict_turns_warnings_into_error() {
        let config = DeckConfig::builder().strict(true).build().unwrap();
        let warnings = vec![DeckWarning::EmptyTitle { slide: 1 }];
        let err = finish_validation(warnings, &config).unwrap_err();
        assert!(matches!(err, DeckError::Validation { ref warnings } if warnings.len() == 1));
    }

    #[test]
    fn lenient_keeps_warnings() {
        let config = DeckConfig::default();
        let warnings = vec![DeckWarning::EmptyTitle { slide: 1 }];
        assert_eq!(finish_validation(warnings, &config).unwrap().len(), 1);
    }

    #[test]
    fn strict_without_warnings_passes() {
        let config = DeckConfig::builder().strict(true).build().unwrap();
        assert!(finish_validation(Vec::new(), &config).unwrap().is_empty());
    }

    #[test]
    fn with_analysis_threads_serialised_context() {
        let output = AnalysisOutput {
            analysis: crate::output::AnalysisResult {
                product_name: Some("Widget Pro".into()),
                ..Default::default()
            },
            product_info: "Widget Pro scanner".into(),
            warnings: Vec::new(),
        };
        let r = GenerateRequest::new("Widget Pro scanner")
            .with_analysis(&output)
            .unwrap();
        let context = r.analysis_context.unwrap();
        assert!(context.contains("\"product_name\": \"Widget Pro\""), "got: {context}");
    }

    #[test]
    fn generate_request_builders() {
        let r = GenerateRequest::new("Widget Pro")
            .with_analysis_context("{}")
            .with_role_prompt("Be brief.");
        assert_eq!(r.analysis_context.as_deref(), Some("{}"));
        assert_eq!(r.role_prompt.as_deref(), Some("Be brief."));
    }

    #[test]
    fn generate_request_deserializes_without_optionals() {
        let r: GenerateRequest = serde_json::from_str(r#"{"product_info":"Widget"}"#).unwrap();
        assert_eq!(r.product_info, "Widget");
        assert!(r.analysis_context.is_none());
    }
}
