//! Streaming generation API: emit each segment's result as it is ready.
//!
//! The eager [`crate::generate::generate`] returns only after the artifact
//! is assembled. [`generate_stream`] instead yields one
//! [`GenerationResult`] per segment while the run is still going.
//!
//! Results always come out in segment order: the next request is not sent
//! until the previous one has been turned into a result. No artifact is
//! assembled; collect the stream and call
//! [`crate::pipeline::assemble::Artifact::assemble`] if one is needed.

use crate::config::GenerationConfig;
use crate::error::QuizGenError;
use crate::generate::{prepare_segments, process_with_progress};
use crate::output::GenerationResult;
use crate::pipeline::input::{self, SourceDocument};
use crate::provider;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-segment results.
pub type ResultStream = Pin<Box<dyn Stream<Item = GenerationResult> + Send>>;

/// Generate questions from a file or URL, streaming results in order.
///
/// # Returns
/// - `Ok(ResultStream)`: one item per segment, omissions included
/// - `Err(QuizGenError)`: fatal error before generation (missing
///   credential, unsupported format, unreadable document)
pub async fn generate_stream(
    input: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<ResultStream, QuizGenError> {
    let input = input.as_ref();
    info!("Starting streaming generation: {}", input);

    let generator = provider::resolve_generator(config)?;
    let doc = input::resolve_input(input, config.download_timeout_secs).await?;
    build_stream(doc, generator, config).await
}

/// Streaming counterpart of [`crate::generate::generate_from_bytes`].
pub async fn generate_stream_from_bytes(
    bytes: &[u8],
    file_name: &str,
    config: &GenerationConfig,
) -> Result<ResultStream, QuizGenError> {
    let generator = provider::resolve_generator(config)?;
    let doc = SourceDocument::new(file_name, bytes.to_vec());
    build_stream(doc, generator, config).await
}

async fn build_stream(
    doc: SourceDocument,
    generator: Arc<dyn crate::pipeline::llm::GenerationCapability>,
    config: &GenerationConfig,
) -> Result<ResultStream, QuizGenError> {
    let (_, segments) = prepare_segments(doc, config).await?;
    let total = segments.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let config = config.clone();
    // `then` polls one future at a time, which keeps requests sequential.
    let s = stream::iter(segments).then(move |segment| {
        let generator = Arc::clone(&generator);
        let cfg = config.clone();
        async move { process_with_progress(generator.as_ref(), &segment, total, &cfg).await }
    });

    Ok(Box::pin(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::pipeline::llm::{GenerationCapability, GenerationRequest, GenerationResponse};
    use async_trait::async_trait;

    /// Echoes the prompt back, except for prompts containing "skip".
    struct Echo;

    #[async_trait]
    impl GenerationCapability for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResponse, GenerationError> {
            if request.prompt.contains("skip") {
                Ok(GenerationResponse::Unrecognized("skipped".into()))
            } else {
                Ok(GenerationResponse::Content(request.prompt.clone()))
            }
        }
    }

    #[tokio::test]
    async fn stream_yields_results_in_segment_order() {
        let config = GenerationConfig::builder()
            .generator(Arc::new(Echo))
            .prompt(crate::prompts::PromptTemplate::new("{text}").unwrap())
            .build()
            .unwrap();

        let stream = generate_stream_from_bytes(b"uno+++++skip+++++tre", "u.txt", &config)
            .await
            .unwrap();
        let results: Vec<GenerationResult> = stream.collect().await;

        assert_eq!(results.len(), 3);
        assert_eq!(
            results.iter().map(|r| r.segment_index()).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(results[0].content(), Some("uno"));
        assert!(results[1].is_omitted());
        assert_eq!(results[2].content(), Some("tre"));
    }

    #[test]
    fn stream_rejects_unsupported_format() {
        let config = GenerationConfig::builder()
            .generator(Arc::new(Echo))
            .build()
            .unwrap();
        let outcome =
            tokio_test::block_on(generate_stream_from_bytes(b"x", "slides.pptx", &config));
        assert!(matches!(outcome, Err(QuizGenError::UnsupportedFormat { .. })));
    }
}
