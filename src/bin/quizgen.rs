//! CLI binary for edgequake-quizgen.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig`, writes the artifact and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_quizgen::{
    generate, preview_segments, ArtifactFormat, GenerationConfig, GenerationProgressCallback,
    ProgressCallback, PromptTemplate, PromptVariant, RunOutput, SegmentationStrategy,
    DEFAULT_MODEL, MAX_SEGMENTS, SUPPORTED_MODELS,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one line per segment.
/// Omissions are printed as notices and the bar keeps going.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the segment in flight.
    started: Mutex<Option<Instant>>,
    omitted: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_run_start` tells us how many segments there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER_TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
            omitted: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} segments  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(SPINNER_TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Generating");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_segments: usize) {
        self.activate_bar(total_segments);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating questions for {total_segments} segments…"))
        ));
    }

    fn on_segment_start(&self, segment_num: usize, _total: usize) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(format!("segment {segment_num}"));
    }

    fn on_segment_complete(&self, segment_num: usize, total: usize, content_len: usize) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} Segment {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            segment_num,
            total,
            dim(&format!("{content_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_segment_omitted(&self, segment_num: usize, total: usize, reason: &str) {
        let secs = self.elapsed_secs();
        self.omitted.fetch_add(1, Ordering::SeqCst);

        // Keep long provider messages on one line.
        let msg: String = if reason.chars().count() > 80 {
            format!("{}\u{2026}", reason.chars().take(79).collect::<String>())
        } else {
            reason.to_string()
        };

        self.bar.println(format!(
            "  {} Segment {:>3}/{:<3}  {}  {}",
            yellow("⚠"),
            segment_num,
            total,
            yellow(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_segments: usize, generated: usize) {
        self.bar.finish_and_clear();
        let omitted = self.omitted.load(Ordering::SeqCst);
        if omitted == 0 {
            eprintln!(
                "{} {} questions generated",
                green("✔"),
                bold(&generated.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} questions generated  ({} omitted)",
                yellow("⚠"),
                bold(&generated.to_string()),
                total_segments,
                yellow(&omitted.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r##"EXAMPLES:
  # Units separated by +++++ in the source (default)
  quizgen unita_didattica.docx

  # Ten equal pieces, structured prompt, Markdown output
  quizgen --segments 10 --prompt structured --format md dispensa.pdf

  # Custom delimiter and output directory
  quizgen --delimiter "@@@" --output-dir out/ appunti.txt

  # Check how the document will be split (no API key needed)
  quizgen --segments-only --segments 5 dispensa.pdf

  # Use another edgequake-llm provider
  quizgen --provider anthropic --model claude-sonnet-4-20250514 lezione.pdf

PROMPTS:
  reflective  open guidance, detailed explanations for every option (default)
  structured  Domanda / Risposte a)–d) / Analisi layout
  guided      checklist: difficulty, key concept, distractor types
  Use --prompt-file to supply your own; it must contain {text} exactly once.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY            API key for the default back-end
  QUIZGEN_MODEL             Model ID
  QUIZGEN_PROVIDER          edgequake-llm provider name
  PDFIUM_DYNAMIC_LIB_PATH   Path to libpdfium (PDF input only)
"##;

/// Generate multiple-choice questions from PDF, DOCX and text documents.
#[derive(Parser, Debug)]
#[command(
    name = "quizgen",
    version,
    about = "Generate multiple-choice questions from PDF, DOCX and text documents",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local .pdf/.docx/.txt path or HTTP/HTTPS URL.
    input: String,

    /// API key for the default OpenAI back-end.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model ID (gpt-4o, gpt-4o-mini).
    #[arg(long, env = "QUIZGEN_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature (0.0–1.0).
    #[arg(long, env = "QUIZGEN_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Split on this delimiter (default: +++++).
    #[arg(long, env = "QUIZGEN_DELIMITER", conflicts_with = "segments")]
    delimiter: Option<String>,

    /// Split into this many equal pieces instead (1–50).
    #[arg(long, env = "QUIZGEN_SEGMENTS",
          value_parser = clap::value_parser!(u16).range(1..=MAX_SEGMENTS as i64))]
    segments: Option<u16>,

    /// Built-in prompt wording.
    #[arg(long, env = "QUIZGEN_PROMPT", value_enum, default_value = "reflective",
          conflicts_with = "prompt_file")]
    prompt: PromptArg,

    /// Text file with a custom prompt containing {text} once.
    #[arg(long, env = "QUIZGEN_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Output document format.
    #[arg(long, env = "QUIZGEN_FORMAT", value_enum, default_value = "docx")]
    format: FormatArg,

    /// Directory the artifact is written to.
    #[arg(short, long, env = "QUIZGEN_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// edgequake-llm provider: openai, anthropic, gemini, ollama, …
    #[arg(long, env = "QUIZGEN_PROVIDER")]
    provider: Option<String>,

    /// Root URL of an OpenAI-compatible API.
    #[arg(long, env = "QUIZGEN_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Max completion tokens per question.
    #[arg(long, env = "QUIZGEN_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Print RunOutput as JSON after writing the artifact.
    #[arg(long, env = "QUIZGEN_JSON")]
    json: bool,

    /// Print the segments and exit without generating.
    #[arg(long)]
    segments_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "QUIZGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "QUIZGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "QUIZGEN_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "QUIZGEN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-request generation timeout in seconds.
    #[arg(long, env = "QUIZGEN_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PromptArg {
    Reflective,
    Structured,
    Guided,
}

impl From<PromptArg> for PromptVariant {
    fn from(v: PromptArg) -> Self {
        match v {
            PromptArg::Reflective => PromptVariant::Reflective,
            PromptArg::Structured => PromptVariant::Structured,
            PromptArg::Guided => PromptVariant::Guided,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Docx,
    Md,
    Txt,
}

impl From<FormatArg> for ArtifactFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Docx => ArtifactFormat::Docx,
            FormatArg::Md => ArtifactFormat::Markdown,
            FormatArg::Txt => ArtifactFormat::Text,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.segments_only;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    // ── Segments-only mode ───────────────────────────────────────────────
    if cli.segments_only {
        let segments = preview_segments(&cli.input, &config)
            .await
            .context("Failed to segment document")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&segments).context("Failed to serialise segments")?
            );
        } else {
            for seg in &segments {
                let preview: String = seg.text.chars().take(100).collect();
                println!(
                    "{} {}",
                    bold(&format!("[{:>2}]", seg.index + 1)),
                    dim(&format!("{} chars", seg.text.chars().count()))
                );
                println!("{}\n", preview);
            }
        }
        return Ok(());
    }

    if config.provider_name.is_none() && !GenerationConfig::is_supported_model(&config.model) {
        tracing::warn!(
            "Model '{}' is not one of {:?}; the API may reject it",
            config.model,
            SUPPORTED_MODELS
        );
    }

    // ── Run generation ───────────────────────────────────────────────────
    let output = generate(&cli.input, &config)
        .await
        .context("Generation failed")?;
    let path = output
        .artifact
        .write_to_dir(&config.output_dir)
        .context("Failed to write artifact")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        println!("{}", path.display());
    }

    if !cli.quiet && !cli.json {
        print_summary(&output, show_progress);
    }

    Ok(())
}

/// Omission notices (when the bar did not already show them) and totals.
fn print_summary(output: &RunOutput, progress_shown: bool) {
    if !progress_shown {
        for omission in output.omissions() {
            eprintln!("{} {}", yellow("⚠"), omission.error);
        }
    }
    let stats = &output.stats;
    eprintln!(
        "{}  {}/{} segments  {}ms  →  {}",
        if stats.omitted == 0 {
            green("✔")
        } else {
            yellow("⚠")
        },
        stats.generated,
        stats.total_segments,
        stats.total_duration_ms,
        bold(&output.artifact.file_name),
    );
}

/// Map CLI args to `GenerationConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let prompt = if let Some(ref path) = cli.prompt_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        PromptTemplate::new(text).context("Invalid prompt file")?
    } else {
        PromptVariant::from(cli.prompt).into()
    };

    let segmentation = match (cli.segments, &cli.delimiter) {
        (Some(n), _) => SegmentationStrategy::FixedCount(n as usize),
        (None, Some(d)) => SegmentationStrategy::Delimiter(d.clone()),
        (None, None) => SegmentationStrategy::default(),
    };

    let mut builder = GenerationConfig::builder()
        .model(cli.model.clone())
        .temperature(cli.temperature)
        .segmentation(segmentation)
        .prompt(prompt)
        .artifact_format(cli.format.into())
        .output_dir(cli.output_dir.clone())
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref name) = cli.provider {
        builder = builder.provider_name(name.clone());
    }
    if let Some(ref url) = cli.api_base_url {
        builder = builder.api_base_url(url.clone());
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn long_help_lists_examples_and_environment() {
        assert!(AFTER_HELP.starts_with("EXAMPLES:"));
        assert!(AFTER_HELP.contains("--delimiter \"@@@\""));
        assert!(AFTER_HELP.trim_end().ends_with("PDF input only)"));
    }

    #[test]
    fn help_example_delimiter_is_accepted() {
        let cli = Cli::try_parse_from(["quizgen", "--delimiter", "@@@", "appunti.txt"]).unwrap();
        let strategy = SegmentationStrategy::Delimiter(cli.delimiter.unwrap());
        assert!(strategy.validate().is_ok());
    }

    #[test]
    fn markdown_delimiter_is_rejected_by_config() {
        let cli = Cli::try_parse_from(["quizgen", "--delimiter", "###", "appunti.txt"]).unwrap();
        let strategy = SegmentationStrategy::Delimiter(cli.delimiter.unwrap());
        assert!(strategy.validate().is_err());
    }
}
