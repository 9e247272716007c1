//! Configuration management for setu
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the config file inside the base directory
pub const CONFIG_FILE_NAME: &str = "setu.toml";

/// Name of the secrets file inside the base directory
pub const SECRETS_FILE_NAME: &str = "secrets.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Web front-end configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Document stores
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Chat model configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_server_bind")]
    pub bind: String,

    /// Page title / header
    #[serde(default = "default_server_title")]
    pub title: String,

    /// Line shown under the header
    #[serde(default = "default_server_tagline")]
    pub tagline: String,

    /// Maximum accepted request body for uploads
    #[serde(default = "default_server_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Sessions idle for longer than this are dropped
    #[serde(default = "default_server_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Permanent store, scanned recursively on ingestion
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Transient store name, created inside `data_dir`
    #[serde(default = "default_uploads_dir_name")]
    pub uploads_dir_name: String,

    /// Extensions the uploader accepts (lowercase, no dot)
    #[serde(default = "default_allowed_upload_extensions")]
    pub allowed_upload_extensions: Vec<String>,
}

/// OpenAI-compatible chat model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Environment variable consulted for the API key
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,

    /// Context window of the model in tokens
    #[serde(default = "default_llm_context_window")]
    pub context_window: usize,

    /// Request timeout in seconds
    #[serde(default = "default_llm_request_timeout")]
    pub request_timeout_secs: u64,

    /// Tokens kept free for the completion when trimming history
    #[serde(default = "default_llm_reserved_output_tokens")]
    pub reserved_output_tokens: usize,

    /// Sampling temperature
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (must match model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Batch size for embedding
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
}

/// Lookup the expected embedding dimension for a known model
pub fn embedding_dimension_for_model(model: &str) -> Option<usize> {
    match model {
        "sentence-transformers/all-MiniLM-L6-v2" => Some(384),
        "sentence-transformers/all-MiniLM-L12-v2" => Some(384),
        "BAAI/bge-small-en-v1.5" => Some(384),
        "BAAI/bge-base-en-v1.5" => Some(768),
        _ => None,
    }
}

impl EmbeddingConfig {
    /// Resolve the effective embedding dimension based on the configured model
    pub fn resolved_dimension(&self) -> usize {
        match embedding_dimension_for_model(&self.model) {
            Some(expected) if expected != self.dimension => {
                warn!(
                    "Embedding dimension {} does not match model '{}' ({}); using {}",
                    self.dimension, self.model, expected, expected
                );
                expected
            }
            Some(expected) => expected,
            None => self.dimension,
        }
    }
}

/// Chunking configuration, measured in word tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum tokens per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Tokens repeated between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks injected as context per chat turn
    #[serde(default = "default_retrieval_top_k")]
    pub top_k: usize,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Directory holding the config and secrets files
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to secrets file
    pub secrets_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            workspace: WorkspaceConfig::default(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            chunk: ChunkConfig::default(),
            retrieval: RetrievalConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_server_bind(),
            title: default_server_title(),
            tagline: default_server_tagline(),
            max_upload_bytes: default_server_max_upload_bytes(),
            session_ttl_secs: default_server_session_ttl_secs(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            uploads_dir_name: default_uploads_dir_name(),
            allowed_upload_extensions: default_allowed_upload_extensions(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key_env: default_llm_api_key_env(),
            context_window: default_llm_context_window(),
            request_timeout_secs: default_llm_request_timeout(),
            reserved_output_tokens: default_llm_reserved_output_tokens(),
            temperature: default_llm_temperature(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            batch_size: default_embedding_batch_size(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_retrieval_top_k(),
        }
    }
}

impl WorkspaceConfig {
    /// Transient upload store
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join(&self.uploads_dir_name)
    }
}

impl Config {
    /// Default config file path (current working directory)
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(".").join(CONFIG_FILE_NAME)
    }

    fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(|| PathBuf::from("."));
        self.paths = PathsConfig {
            config_file: base.join(CONFIG_FILE_NAME),
            secrets_file: base.join(SECRETS_FILE_NAME),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            secrets_file: base.join(SECRETS_FILE_NAME),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk.chunk_size == 0 {
            return Err(Error::Config("chunk.chunk_size must be positive".to_string()));
        }

        if self.chunk.chunk_overlap >= self.chunk.chunk_size {
            return Err(Error::Config(
                "chunk.chunk_overlap must be < chunk.chunk_size".to_string(),
            ));
        }

        if self.server.session_ttl_secs == 0 {
            return Err(Error::Config(
                "server.session_ttl_secs must be positive".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".to_string()));
        }

        if self.llm.model.trim().is_empty() {
            return Err(Error::Config("llm.model must not be empty".to_string()));
        }

        if self.llm.request_timeout_secs == 0 {
            return Err(Error::Config(
                "llm.request_timeout_secs must be positive".to_string(),
            ));
        }

        if self.llm.context_window <= self.llm.reserved_output_tokens {
            return Err(Error::Config(
                "llm.context_window must exceed llm.reserved_output_tokens".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(Error::Config(
                "embedding.batch_size must be positive".to_string(),
            ));
        }

        if self.workspace.allowed_upload_extensions.is_empty() {
            return Err(Error::Config(
                "workspace.allowed_upload_extensions must not be empty".to_string(),
            ));
        }

        let uploads = Path::new(&self.workspace.uploads_dir_name);
        if uploads.components().count() != 1 || uploads.is_absolute() {
            return Err(Error::Config(
                "workspace.uploads_dir_name must be a single folder name".to_string(),
            ));
        }

        Ok(())
    }
}
