//! Result types returned by the generation entry points.
//!
//! A run produces one [`GenerationResult`] per segment, in segment order.
//! Omitted segments stay in [`RunOutput::results`] so callers can report
//! them, but only generated items reach the [`Artifact`].

use crate::error::SegmentError;
use crate::pipeline::assemble::Artifact;
use crate::pipeline::segment::TextSegment;
use serde::{Deserialize, Serialize};

/// Normalised text generated for one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedItem {
    /// 0-based index of the originating segment.
    pub segment_index: usize,
    /// Generated content with Markdown decoration stripped.
    pub content: String,
    /// Wall-clock time of the generation call.
    pub duration_ms: u64,
}

/// A segment that produced no item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Omission {
    /// 0-based index of the originating segment.
    pub segment_index: usize,
    pub error: SegmentError,
}

/// Outcome of one segment. Constructed once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationResult {
    Generated(GeneratedItem),
    Omitted(Omission),
}

impl GenerationResult {
    pub fn segment_index(&self) -> usize {
        match self {
            GenerationResult::Generated(item) => item.segment_index,
            GenerationResult::Omitted(o) => o.segment_index,
        }
    }

    /// Generated content, or `None` for an omission.
    pub fn content(&self) -> Option<&str> {
        match self {
            GenerationResult::Generated(item) => Some(&item.content),
            GenerationResult::Omitted(_) => None,
        }
    }

    pub fn is_omitted(&self) -> bool {
        matches!(self, GenerationResult::Omitted(_))
    }
}

/// Counters for a completed run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Segments produced by segmentation.
    pub total_segments: usize,
    /// Segments that produced an item.
    pub generated: usize,
    /// Segments that were omitted.
    pub omitted: usize,
    /// Characters in the normalised source text.
    pub source_chars: usize,
    /// Time spent reading and extracting the document.
    pub extract_duration_ms: u64,
    /// Time spent in generation calls.
    pub generation_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    /// Segments in index order, as submitted.
    pub segments: Vec<TextSegment>,
    /// One result per segment, in index order.
    pub results: Vec<GenerationResult>,
    /// The assembled output document.
    pub artifact: Artifact,
    pub stats: RunStats,
}

impl RunOutput {
    /// Omitted segments, in index order.
    pub fn omissions(&self) -> impl Iterator<Item = &Omission> {
        self.results.iter().filter_map(|r| match r {
            GenerationResult::Omitted(o) => Some(o),
            GenerationResult::Generated(_) => None,
        })
    }
}
