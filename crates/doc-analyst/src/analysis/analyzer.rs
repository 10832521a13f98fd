//! Streaming analysis of one (text, query) pair

use futures_util::StreamExt;
use std::sync::Arc;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::generation::PromptBuilder;
use crate::providers::{ChatMessage, ChatRequest, CompletionBackend};

/// Receives the full accumulated text after every non-empty fragment
pub trait ObservationSink: Send {
    fn observe(&mut self, snapshot: &str);
}

impl<F> ObservationSink for F
where
    F: FnMut(&str) + Send,
{
    fn observe(&mut self, snapshot: &str) {
        self(snapshot)
    }
}

/// Builds prompts, drives the backend stream, and accumulates its text
pub struct Analyzer {
    backend: Arc<dyn CompletionBackend>,
    config: AnalysisConfig,
    temperature: Option<f32>,
}

impl Analyzer {
    /// Create a new analyzer
    pub fn new(backend: Arc<dyn CompletionBackend>, config: AnalysisConfig) -> Self {
        Self {
            backend,
            config,
            temperature: None,
        }
    }

    /// Set the sampling temperature sent with each request
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Prompt and view configuration
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Build the streaming request for `text` and `query`
    pub fn build_request(&self, text: &str, query: &str) -> ChatRequest {
        let context = PromptBuilder::truncate_chars(text, self.config.max_context_chars);
        let prompt = PromptBuilder::build_analysis_prompt(context, query);

        ChatRequest {
            model: self.backend.model().to_string(),
            messages: vec![
                ChatMessage::system(self.config.system_prompt.clone()),
                ChatMessage::user(prompt),
            ],
            stream: true,
            temperature: self.temperature,
        }
    }

    /// Stream an analysis, returning the concatenated text.
    ///
    /// Fragments without text are skipped. After every appended fragment the
    /// whole buffer is passed to `sink`. Any failure, before or during the
    /// stream, ends the call with an [`AnalysisError`].
    pub async fn analyze(
        &self,
        text: &str,
        query: &str,
        sink: &mut dyn ObservationSink,
    ) -> Result<String, AnalysisError> {
        let request = self.build_request(text, query);

        tracing::debug!(
            "Starting analysis with {} ({}) for query: \"{}\"",
            self.backend.name(),
            request.model,
            query
        );

        let mut stream = self.backend.stream_chat(request).await?;

        let mut buffer = String::new();
        let mut fragments = 0usize;

        while let Some(delta) = stream.next().await {
            let delta = delta?;
            if let Some(content) = delta.content_text() {
                buffer.push_str(content);
                fragments += 1;
                sink.observe(&buffer);
            }
        }

        tracing::debug!(
            "Analysis stream finished: {} fragments, {} chars",
            fragments,
            buffer.chars().count()
        );

        Ok(buffer)
    }
}
