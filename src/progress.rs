//! Progress-callback trait for per-segment generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to receive
//! events as the run works through its segments. This is also where
//! omission notices surface: a front end shows them as they happen, while
//! the run itself carries on.
//!
//! # Example
//!
//! ```rust
//! use edgequake_quizgen::{GenerationConfig, GenerationProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct OmissionCounter {
//!     omitted: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for OmissionCounter {
//!     fn on_segment_omitted(&self, segment_num: usize, _total: usize, reason: &str) {
//!         self.omitted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("segment {segment_num} skipped: {reason}");
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(OmissionCounter { omitted: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes each segment.
///
/// Segments are processed one at a time, so events for one run never
/// interleave. All methods default to no-ops.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once, after segmentation and before the first request.
    fn on_run_start(&self, total_segments: usize) {
        let _ = total_segments;
    }

    /// Called just before a segment's request is sent.
    ///
    /// `segment_num` is 1-indexed.
    fn on_segment_start(&self, segment_num: usize, total_segments: usize) {
        let _ = (segment_num, total_segments);
    }

    /// Called when a segment produced an item of `content_len` characters.
    fn on_segment_complete(&self, segment_num: usize, total_segments: usize, content_len: usize) {
        let _ = (segment_num, total_segments, content_len);
    }

    /// Called when a segment was omitted; `reason` is human-readable.
    fn on_segment_omitted(&self, segment_num: usize, total_segments: usize, reason: &str) {
        let _ = (segment_num, total_segments, reason);
    }

    /// Called once after every segment has been attempted.
    fn on_run_complete(&self, total_segments: usize, generated: usize) {
        let _ = (total_segments, generated);
    }
}

/// A callback that ignores every event.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
