//! Analysis endpoint streaming pipeline events as Server-Sent Events

use axum::{
    extract::{Multipart, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::{Stream, StreamExt};
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::analysis::PipelineSink;
use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{document::guess_content_type, PipelineEvent, UploadedDocument};

/// Forwards pipeline events to the response stream
struct ChannelSink {
    tx: mpsc::UnboundedSender<PipelineEvent>,
    disconnected: bool,
}

impl PipelineSink for ChannelSink {
    fn emit(&mut self, event: PipelineEvent) {
        // The run continues after the client goes away; its events are dropped
        if self.tx.send(event).is_err() && !self.disconnected {
            tracing::info!("Client disconnected, discarding remaining events");
            self.disconnected = true;
        }
    }
}

/// POST /api/analyze - Upload documents with a query and stream the analysis
///
/// Multipart fields: `query` (text) and one or more file fields.
pub async fn analyze_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let mut query: Option<String> = None;
    let mut documents = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_request(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "query" {
            let text = field
                .text()
                .await
                .map_err(|e| Error::invalid_request(format!("Failed to read query: {}", e)))?;
            query = Some(text);
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("file_{}.bin", Uuid::new_v4()));

        // Browsers send application/octet-stream for unknown types; prefer the extension then
        let content_type = match field.content_type() {
            Some(ct) if ct != "application/octet-stream" => ct.to_string(),
            _ => guess_content_type(&filename),
        };

        let data = field.bytes().await.map_err(|e| {
            Error::invalid_request(format!("Failed to read file '{}': {}", filename, e))
        })?;

        tracing::info!(
            "Received file: {} ({} bytes, {})",
            filename,
            data.len(),
            content_type
        );
        documents.push(UploadedDocument::new(filename, content_type, data.to_vec()));
    }

    let query = query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| Error::invalid_request("A non-empty 'query' field is required"))?;

    if documents.is_empty() {
        return Err(Error::invalid_request("At least one file is required"));
    }

    tracing::info!("Query: \"{}\" over {} files", query, documents.len());

    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = state.pipeline();

    tokio::spawn(async move {
        let mut sink = ChannelSink {
            tx,
            disconnected: false,
        };
        pipeline.run(documents, &query, &mut sink).await;
    });

    let events = UnboundedReceiverStream::new(rx).map(|event| Ok(to_sse_event(&event)));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: &PipelineEvent) -> Event {
    Event::default()
        .event(event.kind())
        .json_data(event)
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to serialize {} event: {}", event.kind(), e);
            Event::default().event("error").data(e.to_string())
        })
}
