//! Generation stage: one segment in, one [`GenerationResult`] out.
//!
//! The model service is reached through the [`GenerationCapability`] trait.
//! Implementations live in [`crate::provider`]; tests script their own.
//! Whatever the back-end, its raw reply is first classified into a
//! [`GenerationResponse`] so this module never has to probe response shapes.
//!
//! Failures never escape: an unrecognised response or a failed call becomes
//! an [`Omission`] for that segment and the run moves on.

use crate::error::{GenerationError, SegmentError};
use crate::output::{GeneratedItem, GenerationResult, Omission};
use crate::pipeline::normalize::strip_markdown;
use crate::pipeline::segment::TextSegment;
use crate::prompts::PromptTemplate;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, warn};

/// A filled prompt for one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// 0-based index of the segment this prompt was built from.
    pub segment_index: usize,
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(template: &PromptTemplate, segment: &TextSegment) -> Self {
        Self {
            segment_index: segment.index,
            prompt: template.render(&segment.text),
        }
    }
}

/// What came back from the model, classified.
///
/// Every back-end applies the same rule: a reply whose text is empty or
/// whitespace-only is `Unrecognized`, never `Content`. Use
/// [`GenerationResponse::from_text`] to classify raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResponse {
    /// The response carried non-blank textual content.
    Content(String),
    /// The response had no usable text; the payload describes what it had.
    Unrecognized(String),
}

impl GenerationResponse {
    /// Classify a reply's text: blank is `Unrecognized`, anything else `Content`.
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            GenerationResponse::Unrecognized("model returned an empty completion".into())
        } else {
            GenerationResponse::Content(text)
        }
    }
}

/// Prompt-in, text-out model service.
///
/// Model, temperature and credential are fixed when the capability is
/// built, so a request carries only the prompt. Implementations enforce
/// their own timeout, if any.
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError>;
}

/// Submit one segment and classify the outcome.
///
/// Empty segments are submitted like any other.
pub async fn process_segment(
    generator: &dyn GenerationCapability,
    template: &PromptTemplate,
    segment: &TextSegment,
) -> GenerationResult {
    let start = Instant::now();
    let segment_num = segment.index + 1;
    let request = GenerationRequest::new(template, segment);

    let outcome = generator.generate(&request).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(GenerationResponse::Content(text)) => {
            debug!(
                "Segment {}: {} chars from {} in {}ms",
                segment_num,
                text.chars().count(),
                generator.name(),
                duration_ms
            );
            GenerationResult::Generated(GeneratedItem {
                segment_index: segment.index,
                content: strip_markdown(&text),
                duration_ms,
            })
        }
        Ok(GenerationResponse::Unrecognized(detail)) => {
            warn!("Segment {}: unexpected response format: {}", segment_num, detail);
            omitted(
                segment.index,
                SegmentError::UnrecognizedResponse {
                    segment: segment_num,
                    detail,
                },
            )
        }
        Err(e) => {
            warn!("Segment {}: generation failed: {}", segment_num, e);
            omitted(
                segment.index,
                SegmentError::GenerationFailed {
                    segment: segment_num,
                    detail: e.to_string(),
                },
            )
        }
    }
}

fn omitted(segment_index: usize, error: SegmentError) -> GenerationResult {
    GenerationResult::Omitted(Omission {
        segment_index,
        error,
    })
}
