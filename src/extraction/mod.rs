//! Document Text Extraction
//!
//! Turns the raw bytes of an uploaded document into one plain-text string.
//! The format is always declared by the caller (file-name suffix or stored
//! MIME type) and is never sniffed from the content.
//!
//! - `pdf`  - page texts concatenated in page order
//! - `docx` - `word/document.xml` with every `<...>` tag removed
//! - `txt`  - strict UTF-8 decoding
//!
//! Extraction is pure and synchronous. Callers on an async runtime should run
//! it on the blocking pool since PDF parsing is CPU bound.

pub mod docx;
pub mod pdf;
pub mod text;

#[cfg(test)]
pub(crate) mod fixtures;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

const PDF_MIME: &str = "application/pdf";
const TXT_MIME: &str = "text/plain";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Errors raised while extracting text from a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Document of type \"{0}\" is not supported")]
    UnsupportedFormat(String),

    #[error("Failed to decode {format} document: {reason}")]
    Decoding {
        format: DocumentFormat,
        reason: String,
    },

    #[error("{format} document is missing required part `{part}`")]
    Structural {
        format: DocumentFormat,
        part: String,
    },
}

impl ExtractionError {
    /// Short machine-readable name of the error kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::UnsupportedFormat(_) => "unsupported_format",
            ExtractionError::Decoding { .. } => "decoding",
            ExtractionError::Structural { .. } => "structural",
        }
    }

    pub(crate) fn decoding(format: DocumentFormat, reason: impl fmt::Display) -> Self {
        ExtractionError::Decoding {
            format,
            reason: reason.to_string(),
        }
    }
}

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 3] = [DocumentFormat::Pdf, DocumentFormat::Docx, DocumentFormat::Txt];

    /// The tag used in file names and on the wire
    pub fn tag(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Txt => "txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => PDF_MIME,
            DocumentFormat::Docx => DOCX_MIME,
            DocumentFormat::Txt => TXT_MIME,
        }
    }

    /// Resolve the format from a stored MIME type (exact match)
    pub fn from_mime_type(mime_type: &str) -> Result<Self, ExtractionError> {
        Self::ALL
            .into_iter()
            .find(|format| format.mime_type() == mime_type)
            .ok_or_else(|| ExtractionError::UnsupportedFormat(mime_type.to_string()))
    }

    /// Resolve the format from the suffix after the last `.` of a file name.
    /// A name without a dot is treated as its own suffix.
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractionError> {
        let suffix = file_name.rsplit('.').next().unwrap_or(file_name);
        suffix.parse()
    }

    /// Resolve the format from the file name of `path`; directories on the
    /// way are ignored.
    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        Self::from_file_name(&file_name)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DocumentFormat {
    type Err = ExtractionError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "txt" => Ok(DocumentFormat::Txt),
            other => Err(ExtractionError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Text extracted from a borrowed document.
///
/// Exists only for the duration of the call that built it; the source bytes
/// are never copied or mutated.
#[derive(Debug, Clone)]
pub struct ExtractedDocument<'a> {
    source: &'a [u8],
    format: DocumentFormat,
    text: String,
}

impl<'a> ExtractedDocument<'a> {
    pub fn extract(source: &'a [u8], format: DocumentFormat) -> Result<Self, ExtractionError> {
        let text = extract_text(source, format)?;
        Ok(Self { source, format, text })
    }

    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Extract text using a declared format tag (`pdf`, `docx` or `txt`).
///
/// Any other tag fails with [`ExtractionError::UnsupportedFormat`] without
/// looking at the bytes.
pub fn extract(source: &[u8], declared_format: &str) -> Result<String, ExtractionError> {
    let format: DocumentFormat = declared_format.parse()?;
    extract_text(source, format)
}

pub fn extract_text(source: &[u8], format: DocumentFormat) -> Result<String, ExtractionError> {
    match format {
        DocumentFormat::Pdf => pdf::extract(source),
        DocumentFormat::Docx => docx::extract(source),
        DocumentFormat::Txt => text::extract(source),
    }
}
