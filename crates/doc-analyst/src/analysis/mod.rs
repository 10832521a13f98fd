//! Streaming analysis and multi-document orchestration

mod analyzer;
mod pipeline;

pub use analyzer::{Analyzer, ObservationSink};
pub use pipeline::{AnalysisPipeline, CrossDocumentStep, PipelineSink};
