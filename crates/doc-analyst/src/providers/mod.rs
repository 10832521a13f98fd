//! Provider abstractions for the completion backend
//!
//! The pipeline only depends on [`CompletionBackend`], so the HTTP client can
//! be swapped for another transport or an in-memory backend.

pub mod llm;
pub mod scripted;

pub use llm::{ChatDelta, ChatMessage, ChatRequest, CompletionBackend, DeltaStream, Role};
pub use scripted::{ScriptStep, ScriptedBackend};
