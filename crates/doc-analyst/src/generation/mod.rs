//! Prompt construction and the streaming completion client

pub mod client;
pub mod prompt;
pub mod sse;

pub use client::ChatClient;
pub use prompt::PromptBuilder;
pub use sse::{SseDecoder, SseFrame};
