//! Document renderings of a lesson plan.
//!
//! Each exporter is a pure function of the plan (plus the generation
//! timestamp printed in footers) returning the finished file bytes.

pub mod pdf;
pub mod pptx;
pub mod text;

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::LessonPlan;

pub use pdf::to_pdf;
pub use pptx::to_slide_deck;
pub use text::to_plain_text;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unknown export format: {0}")]
    UnknownFormat(String),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownFormat(format) => format!("Formato de exportação desconhecido: {format}"),
            Self::Archive(_) | Self::Io(_) => "Erro ao gerar o arquivo exportado.".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Document kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    SlideDeck,
    PlainText,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [Self::Pdf, Self::SlideDeck, Self::PlainText];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::SlideDeck => "pptx",
            Self::PlainText => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::SlideDeck => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::PlainText => "text/plain; charset=utf-8",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DocumentKind {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "pptx" => Ok(Self::SlideDeck),
            "txt" | "text" => Ok(Self::PlainText),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Render `plan` as `kind`.
pub fn render(
    plan: &LessonPlan,
    kind: DocumentKind,
    generated_at: NaiveDateTime,
) -> Result<Vec<u8>, ExportError> {
    let bytes = match kind {
        DocumentKind::Pdf => to_pdf(plan, generated_at),
        DocumentKind::SlideDeck => to_slide_deck(plan, generated_at)?,
        DocumentKind::PlainText => to_plain_text(plan).into_bytes(),
    };
    tracing::debug!(kind = %kind, bytes = bytes.len(), "document rendered");
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// File names and dates
// ---------------------------------------------------------------------------

/// `plano_{subject}_{YYYY-MM-DD}.{ext}`, with whitespace runs in the subject
/// collapsed to `_` and `aula` for an empty subject.
pub fn export_file_name(plan: &LessonPlan, extension: &str, date: NaiveDate) -> String {
    let subject = plan.subject.trim();
    let stem = if subject.is_empty() {
        "aula".to_string()
    } else {
        subject
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .replace(['/', '\\'], "_")
    };
    format!("plano_{stem}_{}.{extension}", date.format("%Y-%m-%d"))
}

/// `dd/mm/yyyy`.
pub(crate) fn format_date_br(at: NaiveDateTime) -> String {
    at.format("%d/%m/%Y").to_string()
}
