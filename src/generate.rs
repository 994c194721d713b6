//! Eager (whole-document) generation entry points.
//!
//! These wait for every segment, then return a [`RunOutput`] with the
//! assembled artifact. Use [`crate::stream::generate_stream`] to receive
//! results one segment at a time instead.
//!
//! ## Run order
//!
//! ```text
//! back-end ─▶ read ─▶ extract ─▶ normalise ─▶ segment ─▶ generate × n ─▶ assemble
//! ```
//!
//! The back-end is resolved first so that a missing credential fails the
//! run before the document is touched. Segments are generated one at a
//! time, in index order.

use crate::config::GenerationConfig;
use crate::error::QuizGenError;
use crate::output::{GenerationResult, RunOutput, RunStats};
use crate::pipeline::assemble::Artifact;
use crate::pipeline::extract::{self, SourceText};
use crate::pipeline::input::{self, SourceDocument};
use crate::pipeline::llm::{self, GenerationCapability};
use crate::pipeline::normalize::strip_markdown;
use crate::pipeline::segment::TextSegment;
use crate::provider;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Generate questions from a document file or URL.
///
/// # Arguments
/// * `input`: local path or HTTP/HTTPS URL of a `.pdf`, `.docx` or `.txt`
/// * `config`: run configuration
///
/// # Returns
/// `Ok(RunOutput)` whenever the run reaches assembly, even if some or all
/// segments were omitted (see `output.stats.omitted`).
///
/// # Errors
/// Only fatal conditions: missing credential, unreadable or unsupported
/// document, failed extraction, or an artifact that cannot be rendered.
pub async fn generate(
    input: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<RunOutput, QuizGenError> {
    let input = input.as_ref();
    info!("Starting generation: {}", input);

    let generator = provider::resolve_generator(config)?;
    let start = Instant::now();
    let doc = input::resolve_input(input, config.download_timeout_secs).await?;
    run_document(doc, generator, config, start).await
}

/// Generate questions from an uploaded document held in memory.
///
/// `file_name` only drives format detection.
///
/// # Example
/// ```rust,no_run
/// use edgequake_quizgen::{generate_from_bytes, GenerationConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("unita_1.docx")?;
/// let config = GenerationConfig::builder().api_key("sk-...").build()?;
/// let output = generate_from_bytes(&bytes, "unita_1.docx", &config).await?;
/// std::fs::write(&output.artifact.file_name, &output.artifact.bytes)?;
/// # Ok(())
/// # }
/// ```
pub async fn generate_from_bytes(
    bytes: &[u8],
    file_name: &str,
    config: &GenerationConfig,
) -> Result<RunOutput, QuizGenError> {
    info!("Starting generation: {} ({} bytes)", file_name, bytes.len());
    let generator = provider::resolve_generator(config)?;
    let start = Instant::now();
    let doc = SourceDocument::new(file_name, bytes.to_vec());
    run_document(doc, generator, config, start).await
}

/// Generate and write the artifact into `config.output_dir`.
///
/// Returns the written path alongside the run statistics.
pub async fn generate_to_dir(
    input: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<(PathBuf, RunStats), QuizGenError> {
    let output = generate(input, config).await?;
    let path = output.artifact.write_to_dir(&config.output_dir)?;
    Ok((path, output.stats))
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<RunOutput, QuizGenError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| QuizGenError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(input, config))
}

/// Read, extract, normalise and segment a document without generating.
///
/// Needs no credential.
pub async fn preview_segments(
    input: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<Vec<TextSegment>, QuizGenError> {
    let doc = input::resolve_input(input.as_ref(), config.download_timeout_secs).await?;
    let (_, segments) = prepare_segments(doc, config).await?;
    Ok(segments)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Extract, normalise and split one document.
pub(crate) async fn prepare_segments(
    doc: SourceDocument,
    config: &GenerationConfig,
) -> Result<(SourceText, Vec<TextSegment>), QuizGenError> {
    let source = extract::extract_text(doc).await?;
    let normalised = strip_markdown(source.as_str());
    let segments = config.segmentation.split(&normalised)?;
    Ok((SourceText::new(normalised, source.format()), segments))
}

/// Process one segment and report it to the progress callback.
pub(crate) async fn process_with_progress(
    generator: &dyn GenerationCapability,
    segment: &TextSegment,
    total: usize,
    config: &GenerationConfig,
) -> GenerationResult {
    let segment_num = segment.index + 1;
    if let Some(ref cb) = config.progress_callback {
        cb.on_segment_start(segment_num, total);
    }

    let result = llm::process_segment(generator, &config.prompt, segment).await;

    if let Some(ref cb) = config.progress_callback {
        match &result {
            GenerationResult::Generated(item) => {
                cb.on_segment_complete(segment_num, total, item.content.chars().count())
            }
            GenerationResult::Omitted(o) => {
                cb.on_segment_omitted(segment_num, total, &o.error.to_string())
            }
        }
    }
    result
}

async fn run_document(
    doc: SourceDocument,
    generator: std::sync::Arc<dyn GenerationCapability>,
    config: &GenerationConfig,
    start: Instant,
) -> Result<RunOutput, QuizGenError> {
    let (source, segments) = prepare_segments(doc, config).await?;
    let extract_duration_ms = start.elapsed().as_millis() as u64;
    let total = segments.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    // Strictly sequential: each request completes before the next is sent.
    let generation_start = Instant::now();
    let mut results = Vec::with_capacity(total);
    for segment in &segments {
        results.push(process_with_progress(generator.as_ref(), segment, total, config).await);
    }
    let generation_duration_ms = generation_start.elapsed().as_millis() as u64;

    let artifact = Artifact::assemble(
        &results,
        config.artifact_format,
        chrono::Local::now().naive_local(),
    )?;

    let omitted = results.iter().filter(|r| r.is_omitted()).count();
    let stats = RunStats {
        total_segments: total,
        generated: total - omitted,
        omitted,
        source_chars: source.char_len(),
        extract_duration_ms,
        generation_duration_ms,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Generation complete: {}/{} segments, {}ms total",
        stats.generated, total, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, stats.generated);
    }

    Ok(RunOutput {
        segments,
        results,
        artifact,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn preview_needs_no_credential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unita.txt");
        std::fs::write(&path, "**Uno**\n+++++\n## Due\nx").unwrap();

        let segments = preview_segments(path.to_str().unwrap(), &GenerationConfig::default())
            .await
            .unwrap();
        let texts: Vec<_> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Uno\n", "\nDue\nx"]);
    }

    #[tokio::test]
    async fn missing_credential_checked_before_reading() {
        // The path does not exist; the credential error must win.
        let err = generate("/no/such/file.txt", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QuizGenError::MissingCredential));
    }
}
