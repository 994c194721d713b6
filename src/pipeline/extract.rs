//! Text extraction: [`SourceDocument`] bytes → [`SourceText`].
//!
//! PDF and DOCX extraction is blocking (PDFium calls, ZIP inflation) and
//! runs on Tokio's blocking pool.
//!
//! ## Layout of the extracted text
//!
//! * PDF: every page's text layer followed by a blank line.
//! * DOCX: top-level paragraphs joined by a blank line (tables and headers
//!   are not part of the body paragraphs and are skipped).
//! * TXT: the file decoded as strict UTF-8.

use crate::error::QuizGenError;
use crate::pipeline::input::SourceDocument;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Recognised document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
}

impl DocumentFormat {
    /// Detect the format from a file name's extension (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, QuizGenError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "txt" => Ok(DocumentFormat::Text),
            _ => Err(QuizGenError::UnsupportedFormat {
                name: name.to_string(),
                extension,
            }),
        }
    }
}

/// Full decoded text of one document. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    text: String,
    format: DocumentFormat,
}

impl SourceText {
    pub fn new(text: String, format: DocumentFormat) -> Self {
        Self { text, format }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Extract the full text content of a document.
pub async fn extract_text(doc: SourceDocument) -> Result<SourceText, QuizGenError> {
    let format = DocumentFormat::from_name(&doc.name)?;
    let SourceDocument { name, bytes } = doc;
    info!("Extracting text from {} ({:?})", name, format);

    let text = match format {
        DocumentFormat::Text => decode_text(&name, bytes)?,
        DocumentFormat::Pdf => {
            tokio::task::spawn_blocking(move || extract_pdf_blocking(&name, bytes))
                .await
                .map_err(|e| QuizGenError::Internal(format!("PDF task panicked: {e}")))??
        }
        DocumentFormat::Docx => {
            tokio::task::spawn_blocking(move || extract_docx_blocking(&name, &bytes))
                .await
                .map_err(|e| QuizGenError::Internal(format!("DOCX task panicked: {e}")))??
        }
    };

    debug!("Extracted {} characters", text.chars().count());
    Ok(SourceText::new(text, format))
}

fn decode_text(name: &str, bytes: Vec<u8>) -> Result<String, QuizGenError> {
    String::from_utf8(bytes).map_err(|e| QuizGenError::ExtractionFailed {
        name: name.to_string(),
        detail: format!("not valid UTF-8: {e}"),
    })
}

fn extract_pdf_blocking(name: &str, bytes: Vec<u8>) -> Result<String, QuizGenError> {
    let pdfium = load_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_vec(bytes, None)
        .map_err(|e| QuizGenError::ExtractionFailed {
            name: name.to_string(),
            detail: e.to_string(),
        })?;

    let mut text = String::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let page_text = page.text().map_err(|e| QuizGenError::ExtractionFailed {
            name: name.to_string(),
            detail: format!("page {}: {e}", idx + 1),
        })?;
        text.push_str(&page_text.all());
        text.push_str("\n\n");
    }
    Ok(text)
}

/// Bind to PDFium: explicit env path, then next to the executable, then the
/// system search path.
fn load_pdfium() -> Result<Pdfium, QuizGenError> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let bindings = Pdfium::bind_to_library(&path)
            .map_err(|e| QuizGenError::PdfiumBindingFailed(format!("{path}: {e}")))?;
        return Ok(Pdfium::new(bindings));
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        let candidate = Pdfium::pdfium_platform_library_name_at_path(&exe_dir);
        if let Ok(bindings) = Pdfium::bind_to_library(&candidate) {
            debug!("Loaded PDFium from {}", candidate.display());
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| QuizGenError::PdfiumBindingFailed(e.to_string()))?;
    Ok(Pdfium::new(bindings))
}

fn extract_docx_blocking(name: &str, bytes: &[u8]) -> Result<String, QuizGenError> {
    use docx_rs::DocumentChild;

    let docx = docx_rs::read_docx(bytes).map_err(|e| QuizGenError::ExtractionFailed {
        name: name.to_string(),
        detail: e.to_string(),
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n\n"))
}

/// Concatenate the text runs of a paragraph; tabs and breaks become whitespace.
fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    use docx_rs::{ParagraphChild, RunChild};

    let mut out = String::new();
    for child in &para.children {
        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                match rc {
                    RunChild::Text(t) => out.push_str(&t.text),
                    RunChild::Tab(_) => out.push('\t'),
                    RunChild::Break(_) => out.push('\n'),
                    _ => {}
                }
            }
        }
    }
    out
}
