//! doc-analyst: streamed, multi-view LLM analysis of uploaded documents
//!
//! Each uploaded PDF, DOCX or text document is converted to plain text and
//! analyzed three times (the user's query, key points, summary) by an
//! OpenAI-compatible streaming chat backend. Partial output is reported as it
//! arrives, and a failure in one document or view never stops the others.

pub mod analysis;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod server;
pub mod types;

pub use analysis::{AnalysisPipeline, Analyzer, ObservationSink, PipelineSink};
pub use config::AnalystConfig;
pub use error::{AnalysisError, Error, Result};
pub use types::{
    analysis::{AnalysisOutcome, AnalysisView, PipelineEvent, PipelineReport},
    document::{DocumentFormat, UploadedDocument},
};
