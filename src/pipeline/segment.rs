//! Segmentation: split normalised text into ordered [`TextSegment`]s.
//!
//! Two strategies, one per run:
//!
//! * **Delimiter**: the author marks unit boundaries in the source with a
//!   literal string (`+++++` by default). `k` occurrences give `k + 1`
//!   segments; nothing is trimmed or dropped, so empty pieces between two
//!   adjacent delimiters survive.
//! * **Fixed count**: the text is cut into `n` pieces of
//!   `len / n` characters; the last piece absorbs the remainder. Each piece is
//!   then trimmed of surrounding whitespace.
//!
//! Lengths are counted in Unicode scalar values, never bytes, so a cut can
//! not land inside a multi-byte character.

use crate::error::QuizGenError;
use crate::pipeline::normalize::strip_markdown;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, info};

/// Whether `delimiter` still matches after the source is normalised.
///
/// Normalisation runs before splitting, so a delimiter it would rewrite can
/// never be found and the whole document collapses into one segment.
fn survives_normalisation(delimiter: &str) -> bool {
    let line_start = delimiter.trim_start_matches([' ', '\t']);
    strip_markdown(delimiter) == delimiter
        && strip_markdown(&format!("{delimiter}\n")) == format!("{delimiter}\n")
        && !delimiter.contains('*')
        && !line_start.starts_with('#')
        && !line_start.starts_with("- ")
        && !line_start.starts_with("-\t")
}

/// Default unit separator for the delimiter strategy.
pub const DEFAULT_DELIMITER: &str = "+++++";

/// Upper bound on the fixed segment count.
pub const MAX_SEGMENTS: usize = 50;

/// Characters of each segment shown in debug logs.
const PREVIEW_CHARS: usize = 100;

/// One unit of input text submitted to generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    /// 0-based position; defines output order.
    pub index: usize,
    /// Content sent to the model (may be empty).
    pub text: String,
    /// Character range in the normalised source, before any trimming.
    pub char_span: Range<usize>,
}

/// How a run cuts its source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentationStrategy {
    /// Split on a literal delimiter string.
    Delimiter(String),
    /// Split into this many equal-length pieces (1–[`MAX_SEGMENTS`]).
    FixedCount(usize),
}

impl Default for SegmentationStrategy {
    fn default() -> Self {
        SegmentationStrategy::Delimiter(DEFAULT_DELIMITER.to_string())
    }
}

impl SegmentationStrategy {
    /// Check parameters without touching any text.
    pub fn validate(&self) -> Result<(), QuizGenError> {
        match self {
            SegmentationStrategy::Delimiter(d) if d.is_empty() => Err(
                QuizGenError::InvalidConfig("Segment delimiter must not be empty".into()),
            ),
            SegmentationStrategy::Delimiter(d) if !survives_normalisation(d) => {
                Err(QuizGenError::InvalidConfig(format!(
                    "Segment delimiter {d:?} contains Markdown markup that is stripped \
                     before splitting; avoid '*', a leading '#' and leading bullets"
                )))
            }
            SegmentationStrategy::FixedCount(n) if *n == 0 || *n > MAX_SEGMENTS => {
                Err(QuizGenError::InvalidConfig(format!(
                    "Segment count must be 1–{MAX_SEGMENTS}, got {n}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Split `text` with this strategy.
    ///
    /// Deterministic: the same text and parameters always give the same
    /// segments.
    pub fn split(&self, text: &str) -> Result<Vec<TextSegment>, QuizGenError> {
        self.validate()?;
        let segments = match self {
            SegmentationStrategy::Delimiter(d) => split_by_delimiter(text, d),
            SegmentationStrategy::FixedCount(n) => split_fixed_count(text, *n),
        };

        info!("Text split into {} segments", segments.len());
        for seg in &segments {
            let preview: String = seg.text.chars().take(PREVIEW_CHARS).collect();
            debug!("Segment {}: {}…", seg.index + 1, preview);
        }
        Ok(segments)
    }
}

/// Split on every occurrence of `delimiter`. No trimming, no filtering.
fn split_by_delimiter(text: &str, delimiter: &str) -> Vec<TextSegment> {
    let delimiter_chars = delimiter.chars().count();
    let mut cursor = 0usize;

    text.split(delimiter)
        .enumerate()
        .map(|(index, piece)| {
            let len = piece.chars().count();
            let char_span = cursor..cursor + len;
            cursor += len + delimiter_chars;
            TextSegment {
                index,
                text: piece.to_string(),
                char_span,
            }
        })
        .collect()
}

/// Cut into `n` character ranges of `len / n`; the last takes the remainder.
fn split_fixed_count(text: &str, n: usize) -> Vec<TextSegment> {
    // Byte offset of every char boundary, including the end of the string.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .collect();
    let total_chars = boundaries.len() - 1;
    let step = total_chars / n;

    (0..n)
        .map(|i| {
            let start = i * step;
            let end = if i == n - 1 { total_chars } else { start + step };
            let raw = &text[boundaries[start]..boundaries[end]];
            TextSegment {
                index: i,
                text: raw.trim().to_string(),
                char_span: start..end,
            }
        })
        .collect()
}
