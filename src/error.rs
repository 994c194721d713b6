//! Error types for the edgequake-quizgen library.
//!
//! Three error types map onto three distinct failure scopes:
//!
//! * [`QuizGenError`] is **fatal**: the run cannot start or cannot finish
//!   (no credential, unsupported document, artifact not writable). Returned
//!   as `Err(QuizGenError)` from the top-level `generate*` functions.
//!
//! * [`SegmentError`] is **non-fatal**: one segment produced no question
//!   (the response carried no text, or the call itself failed). Stored in
//!   [`crate::output::Omission`] so the run keeps every other item.
//!
//! * [`GenerationError`] is what a [`crate::pipeline::llm::GenerationCapability`]
//!   reports when a call fails outright. The orchestrator folds it into a
//!   [`SegmentError::GenerationFailed`] for the affected segment.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-quizgen library.
///
/// Segment-level failures use [`SegmentError`] and never surface here.
#[derive(Debug, Error)]
pub enum QuizGenError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No access credential was supplied for the default back-end.
    #[error(
        "No API key configured.\n\
Pass --api-key, set OPENAI_API_KEY, or choose a named provider with --provider."
    )]
    MissingCredential,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured named provider could not be initialised.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The document extension is not one of `pdf`, `docx`, `txt`.
    #[error("Unsupported document format '{extension}' for '{name}'\nSupported formats: pdf, docx, txt.")]
    UnsupportedFormat { name: String, extension: String },

    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a usable file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The document was read but its text could not be extracted.
    #[error("Could not extract text from '{name}': {detail}")]
    ExtractionFailed { name: String, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF text extraction needs the PDFium shared library. You can:\n\
  • Set PDFIUM_DYNAMIC_LIB_PATH=/path/to/libpdfium.\n\
  • Place libpdfium next to the quizgen executable.\n\
  • Install PDFium into a system library path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// The artifact could not be rendered to its document format.
    #[error("Failed to render {format} artifact: {detail}")]
    ArtifactRenderFailed { format: String, detail: String },

    /// Could not create or write the output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single segment.
///
/// Segment numbers are 1-indexed, matching what the user sees in notices.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum SegmentError {
    /// The response did not expose textual content.
    #[error("Segment {segment}: unexpected response format: {detail}")]
    UnrecognizedResponse { segment: usize, detail: String },

    /// The generation call failed before any response was received.
    #[error("Segment {segment}: generation failed: {detail}")]
    GenerationFailed { segment: usize, detail: String },
}

impl SegmentError {
    /// 1-indexed segment number this error belongs to.
    pub fn segment(&self) -> usize {
        match self {
            SegmentError::UnrecognizedResponse { segment, .. }
            | SegmentError::GenerationFailed { segment, .. } => *segment,
        }
    }
}

/// Failure reported by a generation capability for one call.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Request never completed (connection refused, DNS, TLS, …).
    #[error("transport error: {0}")]
    Transport(String),

    /// The call exceeded the capability's own timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The API answered with a non-success status.
    #[error("API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// Provider-specific failure surfaced by edgequake-llm.
    #[error("{0}")]
    Provider(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = QuizGenError::UnsupportedFormat {
            name: "slides.pptx".into(),
            extension: "pptx".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("pptx"), "got: {msg}");
        assert!(msg.contains("pdf, docx, txt"));
    }

    #[test]
    fn missing_credential_mentions_env_var() {
        assert!(QuizGenError::MissingCredential
            .to_string()
            .contains("OPENAI_API_KEY"));
    }

    #[test]
    fn segment_error_display_and_number() {
        let e = SegmentError::UnrecognizedResponse {
            segment: 2,
            detail: "content is null".into(),
        };
        assert!(e.to_string().contains("Segment 2"));
        assert_eq!(e.segment(), 2);

        let e = SegmentError::GenerationFailed {
            segment: 7,
            detail: "boom".into(),
        };
        assert_eq!(e.segment(), 7);
    }

    #[test]
    fn api_error_display() {
        let e = GenerationError::Api {
            status: 401,
            message: "invalid key".into(),
        };
        assert!(e.to_string().contains("401"));
        assert!(e.to_string().contains("invalid key"));
    }
}
