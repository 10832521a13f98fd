//! OpenAI-compatible chat completion client with streaming support

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::{ChatDelta, ChatRequest, CompletionBackend, DeltaStream};

use super::sse::{SseDecoder, SseFrame};

/// Chat completion client for Ollama's `/v1` API and other compatible servers
pub struct ChatClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ErrorPayload>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: DeltaPayload,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct DeltaPayload {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorPayload {
    message: String,
}

struct StreamState {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: SseDecoder,
    frames: VecDeque<SseFrame>,
    finished: bool,
}

impl ChatClient {
    /// Create a new client. Only connecting is timed out; streams may run indefinitely.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.config.api_key.is_empty() {
            request
        } else {
            request.bearer_auth(&self.config.api_key)
        }
    }
}

#[async_trait]
impl CompletionBackend for ChatClient {
    async fn stream_chat(&self, request: ChatRequest) -> Result<DeltaStream> {
        let url = self.endpoint("chat/completions");

        tracing::debug!(
            "Streaming chat completion from {} with model {}",
            url,
            request.model
        );

        let response = self
            .authorize(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Stream request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!(
                "Stream failed: HTTP {} - {}",
                status, body
            )));
        }

        let state = StreamState {
            body: response.bytes_stream().boxed(),
            decoder: SseDecoder::new(),
            frames: VecDeque::new(),
            finished: false,
        };

        let deltas = stream::unfold(state, |mut state| async move {
            loop {
                if let Some(frame) = state.frames.pop_front() {
                    return match frame {
                        SseFrame::Done => None,
                        SseFrame::Data(payload) => Some((parse_chunk(&payload), state)),
                    };
                }

                if state.finished {
                    return None;
                }

                match state.body.next().await {
                    Some(Ok(bytes)) => {
                        let frames = state.decoder.push(&bytes);
                        state.frames.extend(frames);
                    }
                    Some(Err(e)) => {
                        state.finished = true;
                        return Some((Err(Error::stream(format!("Stream error: {}", e))), state));
                    }
                    None => {
                        state.finished = true;
                        let frames = state.decoder.finish();
                        state.frames.extend(frames);
                    }
                }
            }
        });

        Ok(deltas.boxed())
    }

    async fn health_check(&self) -> Result<bool> {
        let url = self.endpoint("models");

        match self.authorize(self.client.get(&url)).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Decode one `data:` payload into a fragment
fn parse_chunk(payload: &str) -> Result<ChatDelta> {
    let chunk: ChunkPayload = serde_json::from_str(payload)
        .map_err(|e| Error::stream(format!("Malformed stream chunk: {}", e)))?;

    if let Some(error) = chunk.error {
        return Err(Error::llm(error.message));
    }

    // Chunks without choices (usage reports) carry no text
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(ChatDelta::default());
    };

    Ok(ChatDelta {
        role: choice.delta.role,
        content: choice.delta.content,
        finish_reason: choice.finish_reason,
    })
}
