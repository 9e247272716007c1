//! Chat model abstraction
//!
//! The assistant talks to any OpenAI-compatible chat-completions endpoint
//! (Groq by default). The trait keeps the chat engine independent of the
//! transport so it can be exercised without network access.

mod openai_compat;

pub use openai_compat::*;

use crate::chunk::count_tokens;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
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

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A remote or local chat model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the assistant reply for a full message list
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Model identifier
    fn model_name(&self) -> &str;

    /// Context window in tokens
    fn context_window(&self) -> usize;
}

/// Token estimate for a message: word tokens plus per-message overhead
pub fn estimate_tokens(message: &ChatMessage) -> usize {
    count_tokens(&message.content) + 4
}
