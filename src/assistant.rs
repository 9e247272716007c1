//! Session orchestration
//!
//! Ties the workspace, credentials, model setup, index cache and chat engine
//! together. Every render walks the same steps: clear transient uploads once
//! per session, resolve a key, configure models, get the cached index and
//! bind a chat engine to it. Any step that cannot proceed becomes a
//! [`Readiness`] state instead of an error.

use crate::chat::{ChatEngine, SourceRef, SYSTEM_PROMPT};
use crate::config::{Config, EmbeddingConfig, LlmConfig};
use crate::credentials::{resolve_stored_credential, ApiKey, StoredCredential};
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::index::IndexCache;
use crate::llm::{ChatCompletionsClient, ChatModel, Role};
use crate::session::{Session, SessionStore, TranscriptEntry};
use crate::workspace::{SavedUpload, Workspace};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const MISSING_KEY_NOTICE: &str = "Enter Groq API Key to start.";
pub const EMPTY_CORPUS_NOTICE: &str = "Database empty. Add files to 'data' folder or upload one.";

/// Builds the model clients. Swappable so sessions can run without network
/// access or model downloads.
pub trait ModelProvider: Send + Sync {
    fn embedder(&self, config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>>;

    fn chat_model(&self, config: &LlmConfig, api_key: &ApiKey) -> Result<Arc<dyn ChatModel>>;
}

/// Local FastEmbed embeddings and an OpenAI-compatible chat endpoint
pub struct DefaultModelProvider;

impl ModelProvider for DefaultModelProvider {
    #[cfg(feature = "local-embed")]
    fn embedder(&self, config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
        Ok(Arc::new(crate::embed::FastEmbedder::new(config)?))
    }

    #[cfg(not(feature = "local-embed"))]
    fn embedder(&self, _config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
        Err(Error::Config(
            "Local embeddings not available. Rebuild with --features local-embed".to_string(),
        ))
    }

    fn chat_model(&self, config: &LlmConfig, api_key: &ApiKey) -> Result<Arc<dyn ChatModel>> {
        Ok(Arc::new(ChatCompletionsClient::new(config, api_key.clone())?))
    }
}

/// Whether a session can chat, and if not, why
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Readiness {
    MissingCredential,
    ConfigurationFailed { message: String },
    EmptyCorpus,
    Ready { documents: usize, chunks: usize },
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready { .. })
    }

    /// Text shown in place of the chat when not ready
    pub fn notice(&self) -> Option<String> {
        match self {
            Readiness::MissingCredential => Some(MISSING_KEY_NOTICE.to_string()),
            Readiness::ConfigurationFailed { message } => Some(format!("System Error: {}", message)),
            Readiness::EmptyCorpus => Some(EMPTY_CORPUS_NOTICE.to_string()),
            Readiness::Ready { .. } => None,
        }
    }
}

/// Everything the page needs to draw a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub title: String,
    pub tagline: String,
    /// A key came from secrets.toml or the environment
    pub key_loaded: bool,
    pub session_key_set: bool,
    pub allowed_extensions: Vec<String>,
    pub readiness: Readiness,
    pub notice: Option<String>,
    pub last_upload: Option<String>,
    pub transcript: Vec<TranscriptEntry>,
}

/// Result of one chat turn
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    Replied {
        response: String,
        sources: Vec<SourceRef>,
    },
    /// The user message was recorded but no reply was produced
    Failed { error: String },
    /// Nothing was recorded
    NotReady { readiness: Readiness },
}

pub struct Assistant {
    config: Config,
    workspace: Workspace,
    stored_credential: Option<StoredCredential>,
    provider: Arc<dyn ModelProvider>,
    embedder: OnceCell<Arc<dyn Embedder>>,
    index_cache: IndexCache,
    sessions: SessionStore,
}

impl Assistant {
    /// Create both stores and look up a stored key
    pub fn new(config: Config, provider: Arc<dyn ModelProvider>) -> Result<Self> {
        let workspace = Workspace::new(&config.workspace);
        workspace.ensure_dirs()?;
        let stored_credential = resolve_stored_credential(&config);
        if let Some(cred) = &stored_credential {
            info!("API key loaded ({:?})", cred.source);
        }
        let session_ttl_secs = config.server.session_ttl_secs;

        Ok(Self {
            config,
            workspace,
            stored_credential,
            provider,
            embedder: OnceCell::new(),
            index_cache: IndexCache::new(),
            sessions: SessionStore::new(session_ttl_secs),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn index_cache(&self) -> &IndexCache {
        &self.index_cache
    }

    /// Start a fresh session and render it
    pub async fn open_session(&self) -> Result<SessionView> {
        let (id, _) = self.sessions.create().await;
        info!("Session {} opened ({} live)", id, self.sessions.len().await);
        self.render(id).await
    }

    /// Bring a session as far towards ready as possible and describe it
    pub async fn render(&self, id: Uuid) -> Result<SessionView> {
        let handle = self.sessions.get(id).await?;
        let mut session = handle.lock().await;
        self.cleanup_once(&mut session);
        let readiness = self.prepare(&mut session).await;
        Ok(self.view(&session, readiness))
    }

    /// Set or clear the key typed into the UI
    pub async fn set_api_key(&self, id: Uuid, raw: &str) -> Result<SessionView> {
        let handle = self.sessions.get(id).await?;
        let mut session = handle.lock().await;
        let before = self.resolve_key(&session);
        session.api_key = ApiKey::new(raw);
        // A stored key shadows the typed one; only drop the engine if the
        // effective key changed
        if self.resolve_key(&session) != before {
            session.engine = None;
        }
        self.cleanup_once(&mut session);
        let readiness = self.prepare(&mut session).await;
        Ok(self.view(&session, readiness))
    }

    /// Save an upload into the transient store
    pub async fn upload(&self, id: Uuid, file_name: &str, bytes: &[u8]) -> Result<SavedUpload> {
        let handle = self.sessions.get(id).await?;
        let mut session = handle.lock().await;
        self.cleanup_once(&mut session);
        let saved = self.workspace.save_upload(file_name, bytes)?;
        session.last_upload = Some(saved.file_name.clone());
        Ok(saved)
    }

    /// Drop the cached index and this session's engine, then rebuild
    pub async fn reprocess(&self, id: Uuid) -> Result<SessionView> {
        let handle = self.sessions.get(id).await?;
        let mut session = handle.lock().await;
        self.index_cache.invalidate().await;
        session.engine = None;
        info!("Session {} requested re-processing", id);
        self.cleanup_once(&mut session);
        let readiness = self.prepare(&mut session).await;
        Ok(self.view(&session, readiness))
    }

    /// Relay one user message
    pub async fn chat(&self, id: Uuid, message: &str) -> Result<TurnOutcome> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::InvalidRequest("Message is empty".to_string()));
        }

        let handle = self.sessions.get(id).await?;
        let mut session = handle.lock().await;
        self.cleanup_once(&mut session);

        let readiness = self.prepare(&mut session).await;
        let Some(engine) = session.engine.clone().filter(|_| readiness.is_ready()) else {
            return Ok(TurnOutcome::NotReady { readiness });
        };

        session.push(Role::User, message);
        match engine.chat(message).await {
            Ok(reply) => {
                session.push(Role::Assistant, reply.response.clone());
                Ok(TurnOutcome::Replied {
                    response: reply.response,
                    sources: reply.sources,
                })
            }
            Err(e) => {
                warn!("Chat turn failed in session {}: {}", id, e);
                Ok(TurnOutcome::Failed {
                    error: format!("Error: {}", e),
                })
            }
        }
    }

    fn cleanup_once(&self, session: &mut Session) {
        if session.cleanup_done {
            return;
        }
        let report = self.workspace.clear_transient();
        debug!(
            "Session {} cleanup: {} removed, {} failed",
            session.id,
            report.removed,
            report.failed.len()
        );
        session.cleanup_done = true;
    }

    fn resolve_key(&self, session: &Session) -> Option<ApiKey> {
        self.stored_credential
            .as_ref()
            .map(|c| c.key.clone())
            .or_else(|| session.api_key.clone())
    }

    /// Build whatever the session is missing to chat
    async fn prepare(&self, session: &mut Session) -> Readiness {
        let Some(api_key) = self.resolve_key(session) else {
            return Readiness::MissingCredential;
        };

        if let Some(engine) = &session.engine {
            return Readiness::Ready {
                documents: engine.index().document_count(),
                chunks: engine.index().len(),
            };
        }

        match self.build_engine(&api_key).await {
            Ok(Some(engine)) => {
                let readiness = Readiness::Ready {
                    documents: engine.index().document_count(),
                    chunks: engine.index().len(),
                };
                session.engine = Some(engine);
                readiness
            }
            Ok(None) => Readiness::EmptyCorpus,
            Err(e) => {
                warn!("Session {} setup failed: {}", session.id, e);
                Readiness::ConfigurationFailed {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn build_engine(&self, api_key: &ApiKey) -> Result<Option<Arc<ChatEngine>>> {
        self.config.validate()?;
        let llm = self.provider.chat_model(&self.config.llm, api_key)?;
        let embedder = self
            .embedder
            .get_or_try_init(|| async {
                let provider = self.provider.clone();
                let config = self.config.embedding.clone();
                tokio::task::spawn_blocking(move || provider.embedder(&config))
                    .await
                    .map_err(|e| Error::Other(format!("Embedding model task failed: {}", e)))?
            })
            .await?
            .clone();

        let Some(index) = self
            .index_cache
            .get_or_build(&self.workspace, embedder.as_ref(), &self.config)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(Arc::new(ChatEngine::new(
            index,
            embedder,
            llm,
            SYSTEM_PROMPT,
            self.config.retrieval.top_k,
            self.config.llm.reserved_output_tokens,
        ))))
    }

    fn view(&self, session: &Session, readiness: Readiness) -> SessionView {
        SessionView {
            id: session.id,
            title: self.config.server.title.clone(),
            tagline: self.config.server.tagline.clone(),
            key_loaded: self.stored_credential.is_some(),
            session_key_set: session.api_key.is_some(),
            allowed_extensions: self.workspace.allowed_extensions().to_vec(),
            notice: readiness.notice(),
            readiness,
            last_upload: session.last_upload.clone(),
            transcript: session.transcript.clone(),
        }
    }
}
