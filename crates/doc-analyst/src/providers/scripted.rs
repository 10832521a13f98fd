//! In-memory backend that replays scripted fragments
//!
//! Used for tests and offline runs. Replies are consumed in order; the last
//! one keeps being replayed once the queue is down to it.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::error::{Error, Result};

use super::llm::{ChatDelta, ChatRequest, CompletionBackend, DeltaStream};

/// One step of a scripted stream
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Yield a fragment
    Delta(ChatDelta),
    /// Yield a stream error with this message
    Fail(String),
}

#[derive(Debug, Clone)]
enum Reply {
    Stream(Vec<ScriptStep>),
    Refuse(String),
}

/// Scripted completion backend
pub struct ScriptedBackend {
    model: String,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            model: "scripted-model".to_string(),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Queue a reply streaming `fragments` as text deltas
    pub fn with_reply(self, fragments: &[&str]) -> Self {
        let steps = fragments
            .iter()
            .map(|f| ScriptStep::Delta(ChatDelta::text(*f)))
            .collect();
        self.with_steps(steps)
    }

    /// Queue a reply made of arbitrary steps
    pub fn with_steps(self, steps: Vec<ScriptStep>) -> Self {
        self.replies.lock().push_back(Reply::Stream(steps));
        self
    }

    /// Queue a reply that fails before any fragment is produced
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies.lock().push_back(Reply::Refuse(message.into()));
        self
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock();
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        reply.unwrap_or(Reply::Stream(Vec::new()))
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn stream_chat(&self, request: ChatRequest) -> Result<DeltaStream> {
        self.requests.lock().push(request);

        match self.next_reply() {
            Reply::Refuse(message) => Err(Error::llm(message)),
            Reply::Stream(steps) => {
                let items = steps.into_iter().map(|step| match step {
                    ScriptStep::Delta(delta) => Ok(delta),
                    ScriptStep::Fail(message) => Err(Error::stream(message)),
                });
                Ok(stream::iter(items).boxed())
            }
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
