//! CLI binary for med-illustrator.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig` / `GenerationRequest` and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use med_illustrator::{
    generate, generate_to_dir, request::is_url, Audience, GenerationConfig,
    GenerationConfigBuilder, GenerationProgressCallback, GenerationRequest, IllustrationStyle,
    ProgressCallback, SourceKind, Stage,
};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Loading indicator: one spinner whose prefix follows the current stage.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Resolving API key…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
        })
    }

    fn stage_elapsed(&self) -> f64 {
        self.stage_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, source_kind: SourceKind) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating from {source_kind} source…"))
        ));
    }

    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut started) = self.stage_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message(match stage {
            Stage::Analysis => "waiting for the reasoning model",
            Stage::Illustration => "waiting for the image model",
        });
    }

    fn on_stage_complete(&self, stage: Stage) {
        let secs = self.stage_elapsed();
        self.bar.println(format!(
            "  {} {:<22}  {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_generation_complete(&self) {
        self.bar.finish_and_clear();
    }

    // The error itself is reported by `main`.
    fn on_error(&self, _error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), bold("Generation aborted"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Explain a local document for adults (stdout)
  med-illustrator notes.md

  # Read a web page, explain it to kids in Spanish as a comic
  med-illustrator https://example.org/insulin --language Spanish \
      --audience kids --style comic-book -o out/

  # Pipe text in
  cat leaflet.txt | med-illustrator - -o out/

  # Inline text
  med-illustrator --text "Insulin helps regulate blood sugar." --json

OUTPUT (-o DIR):
  illustration.png   the generated image (extension follows the image type)
  explanation.md     the audience-adapted explanation
  result.json        explanation, image prompt and data URI

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY            Gemini API key (GOOGLE_API_KEY / API_KEY also read)
  GEMINI_API_BASE           Override the REST base URL
  ILLUSTRATOR_TEXT_MODEL    Override the reasoning model
  ILLUSTRATOR_IMAGE_MODEL   Override the image model

NOTES:
  Only the first 30,000 characters of a document are analysed.
"#;

/// File extensions accepted for document input.
const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "csv", "json"];

/// Explain medical documents and draw an infographic with Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "med-illustrator",
    version,
    about = "Explain medical documents and web pages with an AI-drawn illustration",
    long_about = "Read a document (.txt, .md, .csv, .json) or a web page, explain its key \
insights for the chosen audience and language, and draw one illustration summarising them. \
Uses a Gemini reasoning model for the explanation and a Gemini image model for the picture.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document path, HTTP/HTTPS URL, or `-` for stdin.
    #[arg(required_unless_present = "text", conflicts_with = "text")]
    input: Option<String>,

    /// Use this text as the document instead of reading `input`.
    #[arg(long)]
    text: Option<String>,

    /// Output language for the explanation and any text in the image.
    #[arg(short, long, env = "ILLUSTRATOR_LANGUAGE", default_value = "English")]
    language: String,

    /// Target audience.
    #[arg(short, long, env = "ILLUSTRATOR_AUDIENCE", value_enum, default_value = "adults")]
    audience: AudienceArg,

    /// Illustration style.
    #[arg(short, long, env = "ILLUSTRATOR_STYLE", value_enum, default_value = "modern")]
    style: StyleArg,

    /// Reasoning model ID.
    #[arg(long, env = "ILLUSTRATOR_TEXT_MODEL")]
    text_model: Option<String>,

    /// Image model ID.
    #[arg(long, env = "ILLUSTRATOR_IMAGE_MODEL")]
    image_model: Option<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Write illustration, explanation and result.json into this directory.
    #[arg(short, long, env = "ILLUSTRATOR_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Print the full result as JSON instead of the explanation.
    #[arg(long)]
    json: bool,

    /// Disable the loading spinner.
    #[arg(long, env = "ILLUSTRATOR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,

    /// Per-call provider timeout in seconds.
    #[arg(long, env = "ILLUSTRATOR_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum AudienceArg {
    Kids,
    Teens,
    PreAdults,
    Adults,
}

impl From<AudienceArg> for Audience {
    fn from(v: AudienceArg) -> Self {
        match v {
            AudienceArg::Kids => Audience::Kids,
            AudienceArg::Teens => Audience::Teens,
            AudienceArg::PreAdults => Audience::PreAdults,
            AudienceArg::Adults => Audience::Adults,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StyleArg {
    OldFashion,
    WhiteBoard,
    Modern,
    ComicBook,
    OilPainting,
    PixelArt,
}

impl From<StyleArg> for IllustrationStyle {
    fn from(v: StyleArg) -> Self {
        match v {
            StyleArg::OldFashion => IllustrationStyle::OldFashion,
            StyleArg::WhiteBoard => IllustrationStyle::WhiteBoard,
            StyleArg::Modern => IllustrationStyle::Modern,
            StyleArg::ComicBook => IllustrationStyle::ComicBook,
            StyleArg::OilPainting => IllustrationStyle::OilPainting,
            StyleArg::PixelArt => IllustrationStyle::PixelArt,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers INFO-level feedback, so library logs drop to
    // errors while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build request + config ───────────────────────────────────────────
    let request = build_request(&cli).await?;
    request.validate().context("Invalid input")?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run generation ───────────────────────────────────────────────────
    let start = Instant::now();
    let outcome = match cli.output_dir {
        Some(ref dir) => generate_to_dir(&request, dir, &config)
            .await
            .map(|(result, written)| (result, Some(written))),
        None => generate(&request, &config).await.map(|r| (r, None)),
    };

    let (result, written) = match outcome {
        Ok(v) => v,
        Err(e) if e.is_auth() => {
            eprintln!(
                "{} set {} or pass {} with a key from a project that has Gemini access",
                cyan("hint:"),
                bold("GEMINI_API_KEY"),
                bold("--api-key")
            );
            return Err(e).context("Authentication failed");
        }
        Err(e) => return Err(e).context("Generation failed"),
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialise result")?;
        println!("{json}");
    } else if !cli.quiet {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(result.explanation.as_bytes())
            .context("Failed to write to stdout")?;
        if !result.explanation.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet {
        eprintln!(
            "{}  generated in {}ms",
            green("✔"),
            start.elapsed().as_millis()
        );
        eprintln!("   {} {}", dim("image prompt:"), dim(&result.generated_prompt));
        match written {
            Some(w) => eprintln!("   →  {}", bold(&w.image_path.display().to_string())),
            None if !cli.json => eprintln!(
                "   {}",
                dim("image not saved; pass -o DIR to write it to disk")
            ),
            None => {}
        }
    }

    Ok(())
}

/// Map the positional input / `--text` to a `GenerationRequest`.
async fn build_request(cli: &Cli) -> Result<GenerationRequest> {
    let request = match (&cli.text, cli.input.as_deref()) {
        (Some(text), _) => GenerationRequest::from_text(text.clone()),
        (None, Some("-")) => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            GenerationRequest::from_text(buf)
        }
        (None, Some(input)) if is_url(input) => GenerationRequest::from_url(input),
        (None, Some(input)) => GenerationRequest::from_text(read_document(Path::new(input)).await?),
        (None, None) => bail!("Provide a document path, a URL, `-` or --text"),
    };

    Ok(request
        .language(cli.language.clone())
        .audience(cli.audience.into())
        .style(cli.style.into()))
}

/// Read a supported document fully into memory.
async fn read_document(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        bail!(
            "Unsupported file type '{}' (expected one of: {})",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        );
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfigBuilder::from_config(GenerationConfig::from_env())
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.text_model {
        builder = builder.text_model(model);
    }
    if let Some(ref model) = cli.image_model {
        builder = builder.image_model(model);
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
