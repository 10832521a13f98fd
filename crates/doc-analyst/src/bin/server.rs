//! Analysis server binary
//!
//! Run with: cargo run -p doc-analyst --bin doc-analyst-server [config.toml]

use doc_analyst::{config::AnalystConfig, providers::CompletionBackend, server::AnalystServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_analyst=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                       Doc Analyst                         ║
║         Streamed Document Analysis with Local LLMs        ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AnalystConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {}", config.llm.base_url);
    tracing::info!("  - Model: {}", config.llm.model);
    tracing::info!("  - Context limit: {} chars", config.analysis.max_context_chars);

    let server = AnalystServer::new(config.clone())?;

    // Check backend
    tracing::info!("Checking completion backend at {}...", config.llm.base_url);
    match server.state().backend().health_check().await {
        Ok(true) => tracing::info!("Completion backend is running"),
        _ => {
            tracing::warn!("Completion backend not available at {}", config.llm.base_url);
            tracing::warn!("Please start Ollama:");
            tracing::warn!("  1. Install: https://ollama.com/download");
            tracing::warn!("  2. Start: ollama serve");
            tracing::warn!("  3. Pull model: ollama pull {}", config.llm.model);
        }
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/analyze - Upload documents with a query (SSE stream)");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
