//! Tests for the streaming chat client against a local OpenAI-compatible stub.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::{stream, StreamExt};
use serde_json::Value;

use doc_analyst::config::{AnalystConfig, LlmConfig};
use doc_analyst::generation::ChatClient;
use doc_analyst::providers::{ChatMessage, ChatRequest, CompletionBackend};
use doc_analyst::types::ERROR_MARKER;
use doc_analyst::{AnalysisPipeline, AnalysisView, Error, UploadedDocument};

const CHUNKS: &[&str] = &[
    "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"Crop \"}}]}\n",
    "\ndata: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\n",
    ": keep-alive\n\ndata: {\"choices\":[{\"delta\":{\"con",
    "tent\":\"yields fall.\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
    "data: [DONE]\n\n",
    "data: {not json}\n\n",
];

fn event_stream(chunks: Vec<&'static str>) -> Response {
    let body = Body::from_stream(stream::iter(
        chunks.into_iter().map(Ok::<_, std::io::Error>),
    ));
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

/// Answers with the canned stream when the request looks like a streaming chat call
async fn chat_completions(Json(body): Json<Value>) -> Response {
    let well_formed = body["stream"] == Value::Bool(true)
        && body["model"].is_string()
        && body["messages"][0]["role"] == "system";
    if !well_formed {
        return (StatusCode::BAD_REQUEST, "unexpected request").into_response();
    }
    event_stream(CHUNKS.to_vec())
}

async fn broken_stream() -> Response {
    event_stream(vec![
        "data: {\"choices\":[{\"delta\":{\"content\":\"Half\"}}]}\n\n",
        "data: {\"error\":{\"message\":\"model crashed\"}}\n\n",
    ])
}

async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

fn client(base_url: String) -> ChatClient {
    ChatClient::new(&LlmConfig {
        base_url,
        ..LlmConfig::default()
    })
    .unwrap()
}

fn request() -> ChatRequest {
    ChatRequest {
        model: "deepseek-r1:7b".to_string(),
        messages: vec![
            ChatMessage::system("You are a research assistant"),
            ChatMessage::user("Analyze this text"),
        ],
        stream: true,
        temperature: None,
    }
}

#[tokio::test]
async fn test_stream_yields_content_until_done() {
    let base_url = spawn_backend(Router::new().route("/v1/chat/completions", post(chat_completions))).await;

    let deltas: Vec<_> = client(base_url)
        .stream_chat(request())
        .await
        .unwrap()
        .collect()
        .await;

    let contents: Vec<String> = deltas
        .into_iter()
        .map(|d| d.unwrap())
        .filter_map(|d| d.content_text().map(str::to_string))
        .collect();

    // Role, empty and terminal chunks carry no text; nothing after [DONE] is read
    assert_eq!(contents, vec!["Crop ", "yields fall."]);
}

#[tokio::test]
async fn test_http_error_status_is_reported() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
    );
    let base_url = spawn_backend(router).await;

    let result = client(base_url).stream_chat(request()).await;
    match result {
        Err(Error::Llm(message)) => {
            assert!(message.contains("500"));
            assert!(message.contains("model not loaded"));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected an error"),
    }
}

#[tokio::test]
async fn test_unreachable_backend() {
    // Reserve a port, then close it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(format!("http://{}/v1", addr));
    assert!(client.stream_chat(request()).await.is_err());
    assert!(!client.health_check().await.unwrap());
}

#[tokio::test]
async fn test_health_check_lists_models() {
    let router = Router::new().route(
        "/v1/models",
        get(|| async { Json(serde_json::json!({ "object": "list", "data": [] })) }),
    );
    let base_url = spawn_backend(router).await;

    assert!(client(base_url).health_check().await.unwrap());
}

#[tokio::test]
async fn test_error_chunk_fails_view_through_pipeline() {
    let router = Router::new().route("/v1/chat/completions", post(broken_stream));
    let base_url = spawn_backend(router).await;

    let backend: Arc<dyn CompletionBackend> = Arc::new(client(base_url));
    let pipeline = AnalysisPipeline::from_config(backend, &AnalystConfig::default());

    let mut events = Vec::new();
    let report = pipeline
        .run(
            vec![UploadedDocument::new("a.txt", "text/plain", b"Some findings.".to_vec())],
            "What happened?",
            &mut events,
        )
        .await;

    for view in AnalysisView::ALL {
        let rendered = report.documents[0].view(view).unwrap().outcome.render();
        assert!(rendered.starts_with(ERROR_MARKER));
        assert!(rendered.contains("model crashed"));
    }
}
