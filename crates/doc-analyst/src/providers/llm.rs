//! Completion backend trait for streaming chat requests

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Chat message author
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Chat completion request, serialized as the OpenAI wire format
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Content of the first user message
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// One incremental fragment of a streamed completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatDelta {
    /// Role announcement, usually only on the first fragment
    pub role: Option<String>,
    /// Text delta
    pub content: Option<String>,
    /// Set on the terminal fragment
    pub finish_reason: Option<String>,
}

impl ChatDelta {
    /// Fragment carrying text
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Non-empty text carried by this fragment, if any
    pub fn content_text(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

/// Lazy, finite, non-restartable sequence of fragments
pub type DeltaStream = BoxStream<'static, Result<ChatDelta>>;

/// Trait for streaming chat-completion backends
///
/// Implementations:
/// - `ChatClient`: any OpenAI-compatible HTTP endpoint (Ollama, vLLM, OpenAI)
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Start a streaming completion
    async fn stream_chat(&self, request: ChatRequest) -> Result<DeltaStream>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
