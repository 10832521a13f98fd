//! Command-line interface
//!
//! Run with: cargo run -p doc-analyst --bin doc-analyst -- analyze -q "..." paper.pdf

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use doc_analyst::{
    generation::ChatClient,
    providers::CompletionBackend,
    server::AnalystServer,
    AnalysisOutcome, AnalysisPipeline, AnalystConfig, PipelineEvent, PipelineSink,
    UploadedDocument,
};

#[derive(Parser)]
#[command(name = "doc-analyst", version, about = "Streamed LLM analysis of PDF, DOCX and text documents")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze documents against a query
    Analyze {
        /// Question to answer from each document
        #[arg(short, long)]
        query: String,

        /// Documents to analyze (.pdf, .docx, anything else is read as UTF-8 text)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Start the HTTP server
    Serve,
    /// Check that the completion backend is reachable
    Check,
}

/// Renders pipeline events to the terminal as they arrive
struct TerminalSink {
    /// Bytes of the current view already printed
    printed: usize,
    spinner: Option<ProgressBar>,
}

impl TerminalSink {
    fn new() -> Self {
        Self {
            printed: 0,
            spinner: None,
        }
    }

    fn start_spinner(&mut self) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(template);
        }
        spinner.set_message("Analyzing...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl PipelineSink for TerminalSink {
    fn emit(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::Started { documents } => {
                println!("{}", style(format!("{} files uploaded", documents)).dim());
            }
            PipelineEvent::DocumentStarted { filename } => {
                println!("\n{}", style(format!("### analysis of {}", filename)).bold());
            }
            PipelineEvent::DocumentFailed { filename, error } => {
                eprintln!("{} {}: {}", style("✗").red(), filename, style(error).red());
            }
            PipelineEvent::ViewStarted { view, .. } => {
                println!("\n{}", style(view.label()).cyan().underlined());
                self.printed = 0;
                self.start_spinner();
            }
            PipelineEvent::Snapshot { text, .. } => {
                self.stop_spinner();
                // Snapshots only ever grow, so print the unseen suffix
                if let Some(new_text) = text.get(self.printed..) {
                    print!("{}", new_text);
                    let _ = std::io::stdout().flush();
                }
                self.printed = text.len();
            }
            PipelineEvent::ViewFinished { outcome, .. } => {
                self.stop_spinner();
                if let AnalysisOutcome::Failed { .. } = outcome {
                    println!("{}", style(outcome.render()).red());
                } else {
                    println!();
                }
            }
            PipelineEvent::DocumentFinished { .. } => {}
            PipelineEvent::CrossDocument(section) => {
                println!("\n{}", style(format!("### {}", section.heading)).bold());
                println!("{}", section.note);
            }
            PipelineEvent::Finished { analyzed, failed } => {
                println!(
                    "\n{} {} analyzed, {} skipped",
                    style("✓").green(),
                    analyzed,
                    failed
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_analyst=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AnalystConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Analyze { query, files } => {
            let documents = files
                .iter()
                .map(UploadedDocument::from_path)
                .collect::<doc_analyst::Result<Vec<_>>>()?;

            let backend: Arc<dyn CompletionBackend> = Arc::new(ChatClient::new(&config.llm)?);
            let pipeline = AnalysisPipeline::from_config(backend, &config);

            let mut sink = TerminalSink::new();
            let report = pipeline.run(documents, &query, &mut sink).await;

            if report.failed_documents() == report.documents.len() {
                anyhow::bail!("no document could be analyzed");
            }
        }
        Command::Serve => {
            let server = AnalystServer::new(config)?;
            println!("Listening on http://{}", server.address());
            server.start().await?;
        }
        Command::Check => {
            let client = ChatClient::new(&config.llm)?;
            if client.health_check().await? {
                println!(
                    "{} {} is reachable (model {})",
                    style("✓").green(),
                    config.llm.base_url,
                    client.model()
                );
            } else {
                anyhow::bail!("completion backend not reachable at {}", config.llm.base_url);
            }
        }
    }

    Ok(())
}
