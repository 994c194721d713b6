//! # edgequake-quizgen
//!
//! Turn course material (PDF, DOCX or plain text) into a numbered set of
//! multiple-choice questions with an LLM.
//!
//! The document is cut into units, either where the author placed a
//! `+++++` marker or into a fixed number of equal pieces. Each unit is sent
//! to the model with a question-writing prompt, and the answers are
//! collected into one Word (or Markdown, or text) document named after the
//! day and hour it was made: `domande_multiple_del_07_ora_14.docx`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Input      read a local file or download from URL
//!  ├─ 2. Extract    PDF text layer (pdfium) / DOCX paragraphs / UTF-8 text
//!  ├─ 3. Normalise  strip **bold**, *italic*, # headings, - bullets
//!  ├─ 4. Segment    split on the delimiter, or into N equal pieces
//!  ├─ 5. Generate   one request per segment, strictly in order
//!  └─ 6. Assemble   numbered entries, omissions skipped
//! ```
//!
//! A segment whose reply carries no text is omitted and reported; the run
//! continues and the remaining entries are numbered without gaps.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_quizgen::{generate_to_dir, GenerationConfig, PromptVariant};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GenerationConfig::builder()
//!         .api_key(std::env::var("OPENAI_API_KEY")?)
//!         .model("gpt-4o-mini")
//!         .prompt(PromptVariant::Structured)
//!         .segment_count(5)
//!         .build()?;
//!     let (path, stats) = generate_to_dir("unita_didattica.pdf", &config).await?;
//!     eprintln!("{} questions, {} omitted → {}", stats.generated, stats.omitted, path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Back-ends
//!
//! By default requests go to an OpenAI-compatible chat-completions endpoint
//! using the configured API key. Set `provider_name` (or pass a provider)
//! to use any edgequake-llm provider instead, or plug in your own
//! [`GenerationCapability`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `quizgen` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    Credential, GenerationConfig, GenerationConfigBuilder, DEFAULT_MODEL, SUPPORTED_MODELS,
};
pub use error::{GenerationError, QuizGenError, SegmentError};
pub use generate::{
    generate, generate_from_bytes, generate_sync, generate_to_dir, preview_segments,
};
pub use output::{GeneratedItem, GenerationResult, Omission, RunOutput, RunStats};
pub use pipeline::assemble::{artifact_file_name, Artifact, ArtifactEntry, ArtifactFormat};
pub use pipeline::extract::DocumentFormat;
pub use pipeline::llm::{GenerationCapability, GenerationRequest, GenerationResponse};
pub use pipeline::normalize::strip_markdown;
pub use pipeline::segment::{SegmentationStrategy, TextSegment, MAX_SEGMENTS};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::{PromptTemplate, PromptVariant};
pub use provider::{OpenAiChat, ProviderGenerator};
pub use stream::{generate_stream, generate_stream_from_bytes, ResultStream};
