//! Context-mode chat engine
//!
//! Each turn embeds the user message, pulls the closest chunks from the
//! retrieval index into the system message and sends the trimmed
//! conversation memory plus the new message to the chat model.

mod prompt;

pub use prompt::*;

use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::index::VectorIndex;
use crate::llm::{estimate_tokens, ChatMessage, ChatModel};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Where a reply's context came from
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub chunk_index: usize,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub sources: Vec<SourceRef>,
}

pub struct ChatEngine {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn ChatModel>,
    system_prompt: String,
    top_k: usize,
    token_budget: usize,
    memory: Mutex<Vec<ChatMessage>>,
}

impl ChatEngine {
    /// `reserved_output_tokens` of the model's context window are kept free
    /// for the reply.
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn ChatModel>,
        system_prompt: impl Into<String>,
        top_k: usize,
        reserved_output_tokens: usize,
    ) -> Self {
        let token_budget = llm.context_window().saturating_sub(reserved_output_tokens);
        Self {
            index,
            embedder,
            llm,
            system_prompt: system_prompt.into(),
            top_k,
            token_budget,
            memory: Mutex::new(Vec::new()),
        }
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Messages remembered from successful turns
    pub async fn memory_len(&self) -> usize {
        self.memory.lock().await.len()
    }

    /// Run one turn. Memory is only updated when the model replies.
    pub async fn chat(&self, message: &str) -> Result<ChatResponse> {
        let query = self
            .embedder
            .embed(vec![message.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("No embedding returned".to_string()))?;

        let hits = self.index.search(&query, self.top_k);
        debug!("Retrieved {} chunk(s) for turn", hits.len());

        let system = ChatMessage::system(build_system_message(&self.system_prompt, &hits));
        let user = ChatMessage::user(message);

        let mut memory = self.memory.lock().await;
        let used = estimate_tokens(&system) + estimate_tokens(&user);
        let history = trim_to_budget(&memory, self.token_budget.saturating_sub(used));

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(system);
        messages.extend_from_slice(history);
        messages.push(user.clone());

        let reply = self.llm.complete(&messages).await?;

        memory.push(user);
        memory.push(ChatMessage::assistant(reply.clone()));

        Ok(ChatResponse {
            response: reply,
            sources: hits
                .into_iter()
                .map(|h| SourceRef {
                    path: h.chunk.doc_path,
                    title: h.chunk.title,
                    chunk_index: h.chunk.chunk_index,
                    score: h.score,
                })
                .collect(),
        })
    }
}

/// Longest suffix of `history` whose estimated size fits in `budget`
fn trim_to_budget(history: &[ChatMessage], budget: usize) -> &[ChatMessage] {
    let mut used = 0;
    let mut start = history.len();
    for (i, msg) in history.iter().enumerate().rev() {
        used += estimate_tokens(msg);
        if used > budget {
            break;
        }
        start = i;
    }
    &history[start..]
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::error::{Error, Result};
    use crate::llm::{ChatMessage, ChatModel};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Chat model that echoes the user message and fails on chosen calls
    #[derive(Default)]
    pub struct ScriptedModel {
        pub fail_on: HashSet<usize>,
        pub context_window: usize,
        pub requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        pub fn new() -> Self {
            Self {
                context_window: 8192,
                ..Self::default()
            }
        }

        pub fn failing_on(calls: &[usize]) -> Self {
            Self {
                fail_on: calls.iter().copied().collect(),
                ..Self::new()
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn last_request(&self) -> Vec<ChatMessage> {
            self.requests.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            let call = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(messages.to_vec());
                requests.len()
            };
            if self.fail_on.contains(&call) {
                return Err(Error::LlmApi {
                    status: 503,
                    message: "service unavailable".to_string(),
                });
            }
            let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
            Ok(format!("reply to: {}", last))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }

        fn context_window(&self) -> usize {
            self.context_window
        }
    }
}
