//! Core types for documents, views, and pipeline events

pub mod analysis;
pub mod document;

pub use analysis::{
    AnalysisOutcome, AnalysisView, CrossDocumentSection, DocumentOutcome, DocumentReport,
    PipelineEvent, PipelineReport, ViewResult, ERROR_MARKER,
};
pub use document::{DocumentFormat, UploadedDocument, DOCX_MIME, PDF_MIME};
