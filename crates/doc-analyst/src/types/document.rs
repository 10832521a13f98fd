//! Uploaded document and format detection

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// MIME type for PDF documents
pub const PDF_MIME: &str = "application/pdf";

/// MIME type for Word-processing-XML (.docx) documents
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Extraction strategy selected from a declared content type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// Paged document, text concatenated page by page
    Pdf,
    /// Word-processing-XML, text joined paragraph by paragraph
    WordXml,
    /// Anything else, decoded as UTF-8
    PlainText,
}

impl DocumentFormat {
    /// Map a declared MIME type to a format.
    ///
    /// Parameters such as `; charset=...` and letter case are ignored.
    /// Unrecognized types fall back to [`DocumentFormat::PlainText`].
    pub fn from_mime(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            PDF_MIME => Self::Pdf,
            DOCX_MIME => Self::WordXml,
            _ => Self::PlainText,
        }
    }

    /// Short display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::WordXml => "docx",
            Self::PlainText => "text",
        }
    }
}

/// A document handed over by the upload collaborator.
///
/// Consumed by value during extraction; nothing keeps it afterwards.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Original filename, used as the document's identity
    pub filename: String,
    /// Declared MIME type
    pub content_type: String,
    /// Raw file content
    pub data: Vec<u8>,
}

impl UploadedDocument {
    /// Create a new uploaded document
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(filename, guess_content_type(path), data))
    }

    /// Format selected by the declared content type
    pub fn format(&self) -> DocumentFormat {
        DocumentFormat::from_mime(&self.content_type)
    }

    /// Size of the raw content in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Guess a MIME type from a file extension
pub fn guess_content_type(path: impl AsRef<Path>) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
