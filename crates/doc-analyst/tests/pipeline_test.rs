//! End-to-end tests for the analysis pipeline with a scripted backend.

use std::sync::Arc;

use doc_analyst::config::{AnalystConfig, KEY_POINTS_QUERY, SUMMARY_QUERY};
use doc_analyst::providers::{ChatDelta, ScriptStep, ScriptedBackend};
use doc_analyst::types::analysis::{DocumentOutcome, ERROR_MARKER};
use doc_analyst::{AnalysisOutcome, AnalysisPipeline, AnalysisView, PipelineEvent, UploadedDocument};

const CLIMATE_TEXT: &str = "Climate change reduces crop yields in temperate regions. \
Drought frequency has increased, and irrigation demand is rising.";

const AGRICULTURE_QUERY: &str = "What is the impact on agriculture?";

fn pipeline(backend: Arc<ScriptedBackend>) -> AnalysisPipeline {
    AnalysisPipeline::from_config(backend, &AnalystConfig::default())
}

fn text_document(name: &str, content: &str) -> UploadedDocument {
    UploadedDocument::new(name, "text/plain", content.as_bytes().to_vec())
}

#[tokio::test]
async fn test_single_text_document_end_to_end() {
    let backend = Arc::new(ScriptedBackend::new().with_reply(&["Lower ", "yields."]));
    let mut events = Vec::new();

    let report = pipeline(backend.clone())
        .run(
            vec![text_document("climate.txt", CLIMATE_TEXT)],
            AGRICULTURE_QUERY,
            &mut events,
        )
        .await;

    // One backend call per view, in order
    let requests = backend.requests();
    assert_eq!(requests.len(), 3);

    let expected_queries = [AGRICULTURE_QUERY, KEY_POINTS_QUERY, SUMMARY_QUERY];
    for (request, query) in requests.iter().zip(expected_queries) {
        let prompt = request.user_prompt().unwrap();
        assert!(prompt.contains(&format!("Text: {}...", CLIMATE_TEXT)));
        assert!(prompt.contains(&format!("Query: {}", query)));
        assert!(request.stream);
    }

    assert_eq!(report.documents.len(), 1);
    assert!(report.cross_document.is_none());

    let document = &report.documents[0];
    for view in AnalysisView::ALL {
        let result = document.view(view).unwrap();
        assert_eq!(
            result.outcome,
            AnalysisOutcome::Completed {
                text: "Lower yields.".to_string()
            }
        );
    }

    assert!(matches!(events.first(), Some(PipelineEvent::Started { documents: 1 })));
    assert!(matches!(
        events.last(),
        Some(PipelineEvent::Finished {
            analyzed: 1,
            failed: 0
        })
    ));
}

#[tokio::test]
async fn test_long_document_is_truncated_before_prompting() {
    let long_text = "a".repeat(2500);
    let backend = Arc::new(ScriptedBackend::new().with_reply(&["ok"]));
    let mut events = Vec::new();

    pipeline(backend.clone())
        .run(
            vec![text_document("long.txt", &long_text)],
            "anything",
            &mut events,
        )
        .await;

    for request in backend.requests() {
        let prompt = request.user_prompt().unwrap();
        assert!(prompt.contains(&format!("Text: {}...\n", "a".repeat(2000))));
        assert!(!prompt.contains(&"a".repeat(2001)));
    }
}

#[tokio::test]
async fn test_unreadable_document_is_skipped() {
    let backend = Arc::new(ScriptedBackend::new().with_reply(&["fine"]));
    let mut events = Vec::new();

    let documents = vec![
        UploadedDocument::new("broken.pdf", "application/pdf", b"not a pdf".to_vec()),
        text_document("notes.txt", "Field notes from the harvest."),
    ];

    let report = pipeline(backend.clone())
        .run(documents, AGRICULTURE_QUERY, &mut events)
        .await;

    // Only the readable document reached the backend
    assert_eq!(backend.call_count(), 3);
    assert_eq!(report.failed_documents(), 1);
    assert!(matches!(
        report.documents[0].outcome,
        DocumentOutcome::Failed { .. }
    ));
    assert!(matches!(
        report.documents[1].outcome,
        DocumentOutcome::Analyzed { .. }
    ));

    assert!(events.iter().any(|e| matches!(
        e,
        PipelineEvent::DocumentFailed { filename, .. } if filename == "broken.pdf"
    )));

    // Two documents were uploaded, so the cross-document section appears
    assert!(report.cross_document.is_some());
    assert!(matches!(
        events.last(),
        Some(PipelineEvent::Finished {
            analyzed: 1,
            failed: 1
        })
    ));
}

#[tokio::test]
async fn test_failed_view_does_not_stop_later_views() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .with_steps(vec![
                ScriptStep::Delta(ChatDelta::text("Partial")),
                ScriptStep::Fail("connection reset".to_string()),
            ])
            .with_reply(&["Key points."])
            .with_reply(&["Summary."]),
    );
    let mut events = Vec::new();

    let report = pipeline(backend.clone())
        .run(
            vec![text_document("climate.txt", CLIMATE_TEXT)],
            AGRICULTURE_QUERY,
            &mut events,
        )
        .await;

    assert_eq!(backend.call_count(), 3);

    let document = &report.documents[0];
    let main = document.view(AnalysisView::Main).unwrap();
    assert!(main.outcome.is_failed());
    let rendered = main.outcome.render();
    assert!(rendered.starts_with(ERROR_MARKER));
    assert!(rendered.contains("connection reset"));
    assert!(!rendered.contains("Partial"));

    assert_eq!(
        document.view(AnalysisView::KeyPoints).unwrap().outcome.render(),
        "Key points."
    );
    assert_eq!(
        document.view(AnalysisView::Summary).unwrap().outcome.render(),
        "Summary."
    );

    // The partial text was still observed before the failure
    assert!(events.iter().any(|e| matches!(
        e,
        PipelineEvent::Snapshot { view: AnalysisView::Main, text, .. } if text == "Partial"
    )));
}

#[tokio::test]
async fn test_snapshots_grow_monotonically() {
    let backend = Arc::new(ScriptedBackend::new().with_reply(&["One", " two", "", " three"]));
    let mut events = Vec::new();

    pipeline(backend)
        .run(
            vec![text_document("a.txt", "Some text.")],
            "q",
            &mut events,
        )
        .await;

    let main_snapshots: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::Snapshot {
                view: AnalysisView::Main,
                text,
                ..
            } => Some(text.as_str()),
            _ => None,
        })
        .collect();

    assert_eq!(main_snapshots, vec!["One", "One two", "One two three"]);
}
