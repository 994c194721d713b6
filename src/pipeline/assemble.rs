//! Artifact assembly: ordered results → one numbered output document.
//!
//! Only generated items become entries; omissions are skipped and the
//! remaining entries are numbered `1..=k` without gaps. Each entry is a
//! separator line carrying its number, the item text verbatim, and a blank
//! line. No cleanup happens here; item text was normalised upstream.

use crate::error::QuizGenError;
use crate::output::GenerationResult;
use chrono::{Datelike, NaiveDateTime, Timelike};
use docx_rs::{BreakType, Docx, Paragraph, Run};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fixed part of every artifact file name.
pub const ARTIFACT_PREFIX: &str = "domande_multiple";

/// Dashes that follow the entry number on each separator line.
const SEPARATOR_RULE: &str = "-------------------------";

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArtifactFormat {
    /// Word document. (default)
    #[default]
    Docx,
    Markdown,
    Text,
}

impl ArtifactFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactFormat::Docx => "docx",
            ArtifactFormat::Markdown => "md",
            ArtifactFormat::Text => "txt",
        }
    }
}

impl std::fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// `domande_multiple_del_<DD>_ora_<HH>.<ext>` for the given moment.
pub fn artifact_file_name<T: Datelike + Timelike>(at: &T, format: ArtifactFormat) -> String {
    format!(
        "{}_del_{:02}_ora_{:02}.{}",
        ARTIFACT_PREFIX,
        at.day(),
        at.hour(),
        format.extension()
    )
}

/// One numbered entry of the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    /// 1-based display position.
    pub position: usize,
    /// 0-based index of the originating segment.
    pub segment_index: usize,
    pub text: String,
}

impl ArtifactEntry {
    fn separator(&self) -> String {
        format!("{}. {}", self.position, SEPARATOR_RULE)
    }
}

/// The rendered output document of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub file_name: String,
    pub format: ArtifactFormat,
    pub entries: Vec<ArtifactEntry>,
    /// Encoded document, ready to hand out as a download.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Number and render the generated results.
    ///
    /// `results` must already be in segment order; they are not re-sorted.
    pub fn assemble(
        results: &[GenerationResult],
        format: ArtifactFormat,
        created_at: NaiveDateTime,
    ) -> Result<Self, QuizGenError> {
        let entries: Vec<ArtifactEntry> = results
            .iter()
            .filter_map(|r| match r {
                GenerationResult::Generated(item) => Some(item),
                GenerationResult::Omitted(_) => None,
            })
            .enumerate()
            .map(|(i, item)| ArtifactEntry {
                position: i + 1,
                segment_index: item.segment_index,
                text: item.content.clone(),
            })
            .collect();

        let bytes = match format {
            ArtifactFormat::Docx => render_docx(&entries)?,
            ArtifactFormat::Markdown | ArtifactFormat::Text => render_text(&entries).into_bytes(),
        };

        let file_name = artifact_file_name(&created_at, format);
        info!(
            "Assembled {} with {} entries ({} bytes)",
            file_name,
            entries.len(),
            bytes.len()
        );

        Ok(Self {
            file_name,
            format,
            entries,
            bytes,
        })
    }

    /// Persist the artifact into `dir` under its own file name.
    ///
    /// Written to a temp file in the same directory, then renamed into place.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, QuizGenError> {
        let path = dir.join(&self.file_name);
        let write_err = |source: std::io::Error| QuizGenError::OutputWriteFailed {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(dir).map_err(write_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&self.bytes).map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        info!("Wrote {}", path.display());
        Ok(path)
    }
}

/// Plain-text rendering shared by the Markdown and Text formats.
pub fn render_text(entries: &[ArtifactEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.separator());
        out.push('\n');
        out.push_str(&entry.text);
        out.push_str("\n\n");
    }
    out
}

/// Three paragraphs per entry: separator, text, blank line.
fn render_docx(entries: &[ArtifactEntry]) -> Result<Vec<u8>, QuizGenError> {
    let mut docx = Docx::new();
    for entry in entries {
        docx = docx
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text(entry.separator())))
            .add_paragraph(Paragraph::new().add_run(text_run(&entry.text)))
            .add_paragraph(
                Paragraph::new().add_run(Run::new().add_break(BreakType::TextWrapping)),
            );
    }

    let mut buf = std::io::Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| QuizGenError::ArtifactRenderFailed {
            format: ArtifactFormat::Docx.to_string(),
            detail: e.to_string(),
        })?;
    Ok(buf.into_inner())
}

/// A run with one line break per newline in `text`.
fn text_run(text: &str) -> Run {
    let mut run = Run::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    run
}
