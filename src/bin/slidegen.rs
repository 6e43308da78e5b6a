//! CLI binary for slidegen.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `DeckConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use slidegen::pipeline::prompt::default_role_prompt;
use slidegen::{
    analyze, generate, AnalysisOutput, Deck, DeckConfig, DeckWarning, GenerateRequest,
    PipelineProgressCallback, ProgressCallback, SourceInput, Stage,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that shows the current stage and logs warnings above it.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let msg = match error.char_indices().nth(100) {
            Some((idx, _)) => format!("{}\u{2026}", &error[..idx]),
            None => error.to_string(),
        };
        self.bar
            .println(format!("  {} {}: {}", red("✗"), stage, red(&msg)));
    }

    fn on_warning(&self, warning: &DeckWarning) {
        self.bar
            .println(format!("  {} {}", yellow("⚠"), warning));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a product description
  slidegen analyze --text "Widget Pro: a B2B inventory scanner for warehouses"

  # Analyse a product page, keep the JSON
  slidegen --json analyze --url https://example.com/product > analysis.json

  # Generate a deck from a brochure, grounded in a confirmed analysis
  slidegen generate --pdf brochure.pdf --analysis analysis.json

  # Custom persona, fail on any structural warning
  slidegen generate --text "..." --role-prompt persona.txt --strict

  # Print the built-in persona as a starting point for customisation
  slidegen default-prompt > persona.txt

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Generate B2B sales-proposal slide decks from product information.
#[derive(Parser, Debug)]
#[command(
    name = "slidegen",
    version,
    about = "Generate B2B sales-proposal slide decks from product information with an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// LLM model ID (default: gpt-4o).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM call timeout in seconds.
    #[arg(long, global = true, env = "SLIDEGEN_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// URL fetch timeout in seconds.
    #[arg(long, global = true, env = "SLIDEGEN_FETCH_TIMEOUT", default_value_t = 15)]
    fetch_timeout: u64,

    /// Output JSON instead of a human-readable summary.
    #[arg(long, global = true, env = "SLIDEGEN_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "SLIDEGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "SLIDEGEN_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a product: summary, strengths, market, competitors, pricing.
    Analyze {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Generate a slide deck.
    Generate {
        #[command(flatten)]
        source: SourceArgs,

        /// JSON file with a prior analysis (the output of `analyze --json`).
        #[arg(long)]
        analysis: Option<PathBuf>,

        /// Text file with a persona that replaces the built-in one.
        #[arg(long, env = "SLIDEGEN_ROLE_PROMPT")]
        role_prompt: Option<PathBuf>,

        /// Fail when the deck has any structural warning.
        #[arg(long)]
        strict: bool,

        /// Warn when the deck has fewer slides than this.
        #[arg(long, default_value_t = 6)]
        min_slides: usize,
    },
    /// Print the built-in persona prompt.
    DefaultPrompt,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Product description text.
    #[arg(long)]
    text: Option<String>,

    /// Product page URL.
    #[arg(long)]
    url: Option<String>,

    /// Product brochure PDF.
    #[arg(long)]
    pdf: Option<PathBuf>,
}

impl SourceArgs {
    async fn resolve(&self) -> Result<SourceInput> {
        if let Some(ref text) = self.text {
            return Ok(SourceInput::Text(text.clone()));
        }
        if let Some(ref url) = self.url {
            return Ok(SourceInput::Url(url.clone()));
        }
        if let Some(ref path) = self.pdf {
            return SourceInput::document_file(path)
                .await
                .with_context(|| format!("Failed to read {:?}", path));
        }
        anyhow::bail!("one of --text, --url or --pdf is required")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::DefaultPrompt = cli.command {
        println!("{}", default_role_prompt());
        return Ok(());
    }

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO-level logs unless --verbose asks for them.
    let show_progress = !cli.quiet && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let spinner = show_progress.then(CliProgressCallback::new);
    let progress = spinner
        .as_ref()
        .map(|cb| Arc::clone(cb) as ProgressCallback);

    let result = run(&cli, progress).await;
    if let Some(cb) = spinner {
        cb.finish();
    }
    result
}

async fn run(cli: &Cli, progress: Option<ProgressCallback>) -> Result<()> {
    match &cli.command {
        Command::Analyze { source } => {
            let config = build_config(cli, progress, None, false, 6).await?;
            let input = source.resolve().await?;
            let output = analyze(&input, &config).await.context("Analysis failed")?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output).context("Failed to serialise output")?
                );
            } else {
                print_analysis(&output);
            }
        }
        Command::Generate {
            source,
            analysis,
            role_prompt,
            strict,
            min_slides,
        } => {
            let config =
                build_config(cli, progress, role_prompt.as_deref(), *strict, *min_slides).await?;
            let input = source.resolve().await?;
            let product_info = slidegen::ingest(&input, &config)
                .await
                .context("Failed to read product information")?;

            let mut request = GenerateRequest::new(product_info.into_inner());
            if let Some(path) = analysis {
                request.analysis_context = Some(read_analysis_context(path).await?);
            }

            let deck = generate(&request, &config)
                .await
                .context("Deck generation failed")?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&deck).context("Failed to serialise output")?
                );
            } else {
                print_deck(&deck, cli.quiet);
            }
        }
        Command::DefaultPrompt => println!("{}", default_role_prompt()),
    }
    Ok(())
}

/// Map CLI args to `DeckConfig`.
async fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
    role_prompt: Option<&Path>,
    strict: bool,
    min_slides: usize,
) -> Result<DeckConfig> {
    let mut builder = DeckConfig::builder()
        .api_timeout_secs(cli.api_timeout)
        .fetch_timeout_secs(cli.fetch_timeout)
        .strict(strict)
        .min_slides(min_slides);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(path) = role_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read role prompt from {:?}", path))?;
        builder = builder.role_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Accept either a bare analysis object or the full `analyze --json` output.
async fn read_analysis_context(path: &Path) -> Result<String> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read analysis from {:?}", path))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{:?} is not valid JSON", path))?;
    let analysis = value.get("analysis").cloned().unwrap_or(value);
    serde_json::to_string_pretty(&analysis).context("Failed to serialise analysis")
}

fn print_analysis(output: &AnalysisOutput) {
    let a = &output.analysis;
    let field = |label: &str, v: &Option<String>| {
        if let Some(v) = v {
            println!("{:<18} {}", bold(label), v);
        }
    };
    let list = |label: &str, v: &Option<Vec<String>>| {
        if let Some(items) = v {
            println!("{}", bold(label));
            for item in items {
                println!("  • {item}");
            }
        }
    };

    field("Product", &a.product_name);
    field("Summary", &a.product_summary);
    list("Strengths", &a.strengths);
    field("Target market", &a.target_market);
    field("Market size", &a.market_size);
    list("Competitors", &a.competitors);
    list("Challenges", &a.market_challenges);
    field("Price range", &a.price_range);
    field("Blue ocean", &a.blue_ocean_hint);

    if !output.warnings.is_empty() {
        eprintln!(
            "{} {} warnings",
            yellow("⚠"),
            output.warnings.len()
        );
    }
}

fn print_deck(deck: &Deck, quiet: bool) {
    for (i, slide) in deck.slides.iter().enumerate() {
        let kind = slide.slide_type.as_deref().unwrap_or("?");
        println!(
            "{} {} {}",
            bold(&format!("{:>2}.", i + 1)),
            bold(&slide.title),
            dim(&format!("[{kind}]"))
        );
        for line in slide.content.lines() {
            println!("    {line}");
        }
        println!();
    }

    if !quiet {
        let mark = if deck.warnings.is_empty() {
            green("✔")
        } else {
            yellow("⚠")
        };
        eprintln!(
            "{} {} slides, {} warnings",
            mark,
            deck.len(),
            deck.warnings.len()
        );
    }
}
