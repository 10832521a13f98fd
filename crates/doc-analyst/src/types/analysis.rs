//! Analysis views, outcomes, and pipeline events

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

use super::document::DocumentFormat;

/// Prefix that marks a failed analysis rendered as text
pub const ERROR_MARKER: &str = "An error occurred: ";

/// One of the fixed analysis angles applied to every document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisView {
    /// The user's own query
    Main,
    /// Fixed key points query
    KeyPoints,
    /// Fixed summary query
    Summary,
}

impl AnalysisView {
    /// All views in the order they are run
    pub const ALL: [AnalysisView; 3] = [Self::Main, Self::KeyPoints, Self::Summary];

    /// Tab label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Main => "main analysis",
            Self::KeyPoints => "key points",
            Self::Summary => "summary",
        }
    }

    /// Query sent for this view
    pub fn query<'a>(&self, user_query: &'a str, config: &'a AnalysisConfig) -> &'a str {
        match self {
            Self::Main => user_query,
            Self::KeyPoints => &config.key_points_query,
            Self::Summary => &config.summary_query,
        }
    }
}

/// Final state of one analysis call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// Stream ran to completion
    Completed { text: String },
    /// Backend or stream failure
    Failed { error: String },
}

impl AnalysisOutcome {
    /// Text shown to the user; failures carry [`ERROR_MARKER`]
    pub fn render(&self) -> String {
        match self {
            Self::Completed { text } => text.clone(),
            Self::Failed { error } => format!("{}{}", ERROR_MARKER, error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl From<Result<String, AnalysisError>> for AnalysisOutcome {
    fn from(result: Result<String, AnalysisError>) -> Self {
        match result {
            Ok(text) => Self::Completed { text },
            Err(err) => Self::Failed {
                error: err.message().to_string(),
            },
        }
    }
}

/// Result of one view for one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResult {
    pub view: AnalysisView,
    pub query: String,
    pub outcome: AnalysisOutcome,
}

/// Per-document result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    /// Text was extracted and every view ran
    Analyzed {
        extracted_chars: usize,
        views: Vec<ViewResult>,
    },
    /// Extraction failed; the document was skipped
    Failed { error: String },
}

/// Report for one uploaded document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub filename: String,
    pub format: DocumentFormat,
    pub outcome: DocumentOutcome,
}

impl DocumentReport {
    /// Look up the result of a view, if the document was analyzed
    pub fn view(&self, view: AnalysisView) -> Option<&ViewResult> {
        match &self.outcome {
            DocumentOutcome::Analyzed { views, .. } => views.iter().find(|r| r.view == view),
            DocumentOutcome::Failed { .. } => None,
        }
    }
}

/// Placeholder section emitted when more than one document is analyzed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrossDocumentSection {
    pub heading: String,
    pub note: String,
}

/// Everything produced by one pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    pub documents: Vec<DocumentReport>,
    pub cross_document: Option<CrossDocumentSection>,
}

impl PipelineReport {
    /// Number of documents whose extraction failed
    pub fn failed_documents(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| matches!(d.outcome, DocumentOutcome::Failed { .. }))
            .count()
    }
}

/// Progress event delivered to a pipeline sink
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Run accepted
    Started { documents: usize },
    /// Extraction is about to begin
    DocumentStarted { filename: String },
    /// Extraction failed; the document is skipped
    DocumentFailed { filename: String, error: String },
    /// A view's stream is about to start
    ViewStarted {
        filename: String,
        view: AnalysisView,
        query: String,
    },
    /// Full accumulated text after a non-empty fragment
    Snapshot {
        filename: String,
        view: AnalysisView,
        text: String,
    },
    /// A view's stream ended
    ViewFinished {
        filename: String,
        view: AnalysisView,
        outcome: AnalysisOutcome,
    },
    /// All views of a document are done
    DocumentFinished { filename: String },
    /// Cross-document placeholder
    CrossDocument(CrossDocumentSection),
    /// Run complete
    Finished { analyzed: usize, failed: usize },
}

impl PipelineEvent {
    /// Stable event name, used as the SSE event field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::DocumentStarted { .. } => "document_started",
            Self::DocumentFailed { .. } => "document_failed",
            Self::ViewStarted { .. } => "view_started",
            Self::Snapshot { .. } => "snapshot",
            Self::ViewFinished { .. } => "view_finished",
            Self::DocumentFinished { .. } => "document_finished",
            Self::CrossDocument(_) => "cross_document",
            Self::Finished { .. } => "finished",
        }
    }
}
