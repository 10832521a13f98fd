//! Configuration for the analysis pipeline

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Default system instruction sent with every analysis request
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a research assistant skilled in analyzing academic and technical documents and don't include chinese characters";

/// Fixed query for the "key points" view
pub const KEY_POINTS_QUERY: &str = "Extract key points and findings";

/// Fixed query for the "summary" view
pub const SUMMARY_QUERY: &str = "Summarize the document";

/// Number of characters of extracted text embedded in a prompt
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 2000;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalystConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Completion backend configuration
    pub llm: LlmConfig,
    /// Prompt and view configuration
    pub analysis: AnalysisConfig,
}

impl AnalystConfig {
    /// Parse a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&raw)?)
    }

    /// Load from an optional file, then apply `DOC_ANALYST_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("DOC_ANALYST_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(api_key) = lookup("DOC_ANALYST_API_KEY") {
            self.llm.api_key = api_key;
        }
        if let Some(model) = lookup("DOC_ANALYST_MODEL") {
            self.llm.model = model;
        }
        if let Some(host) = lookup("DOC_ANALYST_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("DOC_ANALYST_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid DOC_ANALYST_PORT value: {}", port),
            }
        }
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.llm.base_url.trim().is_empty() {
            return Err(Error::Config("llm.base_url must not be empty".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(Error::Config("llm.model must not be empty".to_string()));
        }
        if self.analysis.max_context_chars == 0 {
            return Err(Error::Config(
                "analysis.max_context_chars must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Completion backend configuration (any OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL, including the `/v1` prefix
    pub base_url: String,
    /// Bearer token; Ollama accepts any value
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature, backend default when unset
    pub temperature: Option<f32>,
    /// Connection timeout in seconds. The response stream itself is never timed out.
    pub connect_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: "ollama".to_string(),
            model: "deepseek-r1:7b".to_string(),
            temperature: None,
            connect_timeout_secs: 10,
        }
    }
}

/// Prompt and view configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Hard character cut applied to extracted text before prompting
    pub max_context_chars: usize,
    /// System instruction for the backend
    pub system_prompt: String,
    /// Query used for the key points view
    pub key_points_query: String,
    /// Query used for the summary view
    pub summary_query: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            key_points_query: KEY_POINTS_QUERY.to_string(),
            summary_query: SUMMARY_QUERY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalystConfig::default();
        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.llm.model, "deepseek-r1:7b");
        assert_eq!(config.analysis.max_context_chars, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AnalystConfig = toml::from_str(
            r#"
            [llm]
            model = "llama3.2:3b"

            [server]
            port = 9090
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "llama3.2:3b");
        assert_eq!(config.llm.api_key, "ollama");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.analysis.summary_query, SUMMARY_QUERY);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DOC_ANALYST_BASE_URL", "http://gpu-box:8000/v1"),
            ("DOC_ANALYST_MODEL", "qwen2.5:7b"),
            ("DOC_ANALYST_PORT", "not-a-port"),
        ]
        .into_iter()
        .collect();

        let mut config = AnalystConfig::default();
        config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.llm.base_url, "http://gpu-box:8000/v1");
        assert_eq!(config.llm.model, "qwen2.5:7b");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_validate_rejects_zero_context() {
        let mut config = AnalystConfig::default();
        config.analysis.max_context_chars = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[analysis]\nmax_context_chars = 500\nsummary_query = \"Give a one-line summary\""
        )
        .unwrap();

        let config = AnalystConfig::from_file(file.path()).unwrap();
        assert_eq!(config.analysis.max_context_chars, 500);
        assert_eq!(config.analysis.summary_query, "Give a one-line summary");
        assert_eq!(config.analysis.key_points_query, KEY_POINTS_QUERY);
    }

    #[test]
    fn test_from_file_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[llm\nmodel = ").unwrap();

        assert!(matches!(
            AnalystConfig::from_file(file.path()),
            Err(Error::Toml(_))
        ));
    }
}
