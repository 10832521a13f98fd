//! Fan-out of extraction and analysis across documents and views

use std::sync::Arc;

use crate::config::AnalystConfig;
use crate::ingestion::TextExtractor;
use crate::providers::CompletionBackend;
use crate::types::{
    AnalysisOutcome, AnalysisView, CrossDocumentSection, DocumentOutcome, DocumentReport,
    PipelineEvent, PipelineReport, UploadedDocument, ViewResult,
};

use super::analyzer::Analyzer;

/// Receives pipeline progress events, in order
pub trait PipelineSink: Send {
    fn emit(&mut self, event: PipelineEvent);
}

impl PipelineSink for Vec<PipelineEvent> {
    fn emit(&mut self, event: PipelineEvent) {
        self.push(event);
    }
}

/// Placeholder for comparing findings across documents.
///
/// Runs only when more than one document was uploaded and computes nothing.
#[derive(Debug, Default)]
pub struct CrossDocumentStep;

impl CrossDocumentStep {
    pub const HEADING: &'static str = "Cross-Document Analysis";
    pub const NOTE: &'static str = "Comparing findings across documents...";

    pub fn run(&self, reports: &[DocumentReport]) -> Option<CrossDocumentSection> {
        if reports.len() < 2 {
            return None;
        }

        tracing::info!(
            "Cross-document step for {} documents (no comparison performed)",
            reports.len()
        );

        Some(CrossDocumentSection {
            heading: Self::HEADING.to_string(),
            note: Self::NOTE.to_string(),
        })
    }
}

/// Sequential document analysis pipeline
pub struct AnalysisPipeline {
    analyzer: Analyzer,
    cross_document: CrossDocumentStep,
}

impl AnalysisPipeline {
    /// Create a pipeline around an analyzer
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            cross_document: CrossDocumentStep,
        }
    }

    /// Create a pipeline from configuration and a backend
    pub fn from_config(backend: Arc<dyn CompletionBackend>, config: &AnalystConfig) -> Self {
        let analyzer = Analyzer::new(backend, config.analysis.clone())
            .with_temperature(config.llm.temperature);
        Self::new(analyzer)
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Analyze every document against `query`, one at a time.
    ///
    /// A document whose extraction fails is reported and skipped; the
    /// remaining documents are still processed.
    pub async fn run(
        &self,
        documents: Vec<UploadedDocument>,
        query: &str,
        sink: &mut dyn PipelineSink,
    ) -> PipelineReport {
        let total = documents.len();
        tracing::info!("Analyzing {} documents", total);
        sink.emit(PipelineEvent::Started { documents: total });

        let mut report = PipelineReport::default();
        for document in documents {
            let document_report = self.process_document(document, query, sink).await;
            report.documents.push(document_report);
        }

        report.cross_document = self.cross_document.run(&report.documents);
        if let Some(section) = &report.cross_document {
            sink.emit(PipelineEvent::CrossDocument(section.clone()));
        }

        let failed = report.failed_documents();
        tracing::info!(
            "Analysis run finished: {} analyzed, {} skipped",
            total - failed,
            failed
        );
        sink.emit(PipelineEvent::Finished {
            analyzed: total - failed,
            failed,
        });

        report
    }

    /// Extract one document and run every view on its text
    pub async fn process_document(
        &self,
        document: UploadedDocument,
        query: &str,
        sink: &mut dyn PipelineSink,
    ) -> DocumentReport {
        let filename = document.filename.clone();
        let format = document.format();

        sink.emit(PipelineEvent::DocumentStarted {
            filename: filename.clone(),
        });

        let text = match TextExtractor::extract(document) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", filename, e);
                let error = e.to_string();
                sink.emit(PipelineEvent::DocumentFailed {
                    filename: filename.clone(),
                    error: error.clone(),
                });
                return DocumentReport {
                    filename,
                    format,
                    outcome: DocumentOutcome::Failed { error },
                };
            }
        };

        let extracted_chars = text.chars().count();
        tracing::info!("Extracted {} chars from {}", extracted_chars, filename);

        let mut views = Vec::with_capacity(AnalysisView::ALL.len());
        for view in AnalysisView::ALL {
            views.push(self.run_view(&filename, &text, view, query, sink).await);
        }

        sink.emit(PipelineEvent::DocumentFinished {
            filename: filename.clone(),
        });

        DocumentReport {
            filename,
            format,
            outcome: DocumentOutcome::Analyzed {
                extracted_chars,
                views,
            },
        }
    }

    async fn run_view(
        &self,
        filename: &str,
        text: &str,
        view: AnalysisView,
        user_query: &str,
        sink: &mut dyn PipelineSink,
    ) -> ViewResult {
        let query = view.query(user_query, self.analyzer.config()).to_string();
        tracing::info!("{}: running {}", filename, view.label());

        sink.emit(PipelineEvent::ViewStarted {
            filename: filename.to_string(),
            view,
            query: query.clone(),
        });

        let outcome: AnalysisOutcome = {
            let mut observer = |snapshot: &str| {
                sink.emit(PipelineEvent::Snapshot {
                    filename: filename.to_string(),
                    view,
                    text: snapshot.to_string(),
                })
            };
            self.analyzer.analyze(text, &query, &mut observer).await.into()
        };

        if let AnalysisOutcome::Failed { error } = &outcome {
            tracing::warn!("{}: {} failed: {}", filename, view.label(), error);
        }

        sink.emit(PipelineEvent::ViewFinished {
            filename: filename.to_string(),
            view,
            outcome: outcome.clone(),
        });

        ViewResult {
            view,
            query,
            outcome,
        }
    }
}
