//! Format-aware text extraction

use docx_rs::{DocumentChild, ParagraphChild, RunChild};

use crate::error::{Error, Result};
use crate::types::{DocumentFormat, UploadedDocument};

/// Converts uploaded documents into plain text
pub struct TextExtractor;

impl TextExtractor {
    /// Extract text using the format selected by the declared content type
    pub fn extract(document: UploadedDocument) -> Result<String> {
        let UploadedDocument {
            filename,
            content_type,
            data,
        } = document;
        let format = DocumentFormat::from_mime(&content_type);

        tracing::debug!(
            "Extracting {} ({} bytes) as {}",
            filename,
            data.len(),
            format.as_str()
        );

        match format {
            DocumentFormat::Pdf => Self::extract_pdf(&filename, &data),
            DocumentFormat::WordXml => Self::extract_docx(&filename, &data),
            DocumentFormat::PlainText => Self::extract_plain_text(&filename, data),
        }
    }

    /// Concatenate per-page text in page order, without separators.
    ///
    /// A page that fails to yield text contributes nothing.
    pub fn extract_pdf(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::extraction(filename, format!("Failed to load PDF: {}", e)))?;

        let mut text = String::new();
        // BTreeMap keyed by page number, so iteration follows page order
        for page_number in doc.get_pages().into_keys() {
            match doc.extract_text(&[page_number]) {
                Ok(page_text) => {
                    if page_text.is_empty() {
                        tracing::debug!("{}: page {} has no extractable text", filename, page_number);
                    }
                    text.push_str(&page_text);
                }
                Err(e) => {
                    tracing::warn!(
                        "{}: could not extract text from page {}: {}",
                        filename,
                        page_number,
                        e
                    );
                }
            }
        }

        Ok(text)
    }

    /// Append each top-level paragraph's text followed by a newline
    pub fn extract_docx(filename: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data)
            .map_err(|e| Error::extraction(filename, format!("Failed to read DOCX: {}", e)))?;

        let mut text = String::new();
        for child in &doc.document.children {
            // Tables, section properties and other body content are not paragraphs
            if let DocumentChild::Paragraph(paragraph) = child {
                push_paragraph_children(&mut text, &paragraph.children);
                text.push('\n');
            }
        }

        Ok(text)
    }

    /// Decode raw bytes as UTF-8, verbatim
    pub fn extract_plain_text(filename: &str, data: Vec<u8>) -> Result<String> {
        String::from_utf8(data)
            .map_err(|e| Error::extraction(filename, format!("Invalid UTF-8: {}", e)))
    }
}

fn push_paragraph_children(out: &mut String, children: &[ParagraphChild]) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_paragraph_children(out, &link.children),
            _ => {}
        }
    }
}
