//! Application state for the analysis server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::analysis::AnalysisPipeline;
use crate::config::AnalystConfig;
use crate::error::Result;
use crate::generation::ChatClient;
use crate::providers::CompletionBackend;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AnalystConfig,
    /// Completion backend shared by every request
    backend: Arc<dyn CompletionBackend>,
    /// Pipeline shared by every request; it holds no per-run state
    pipeline: Arc<AnalysisPipeline>,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create state backed by the configured HTTP completion endpoint
    pub fn new(config: AnalystConfig) -> Result<Self> {
        let backend: Arc<dyn CompletionBackend> = Arc::new(ChatClient::new(&config.llm)?);
        tracing::info!(
            "Completion backend initialized ({} at {})",
            config.llm.model,
            config.llm.base_url
        );
        Ok(Self::with_backend(config, backend))
    }

    /// Create state around an existing backend
    pub fn with_backend(config: AnalystConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        let pipeline = Arc::new(AnalysisPipeline::from_config(backend.clone(), &config));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                pipeline,
                ready: RwLock::new(true),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AnalystConfig {
        &self.inner.config
    }

    /// Get the completion backend
    pub fn backend(&self) -> &Arc<dyn CompletionBackend> {
        &self.inner.backend
    }

    /// Get a handle to the pipeline
    pub fn pipeline(&self) -> Arc<AnalysisPipeline> {
        Arc::clone(&self.inner.pipeline)
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
