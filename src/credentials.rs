//! API key acquisition
//!
//! A stored secret wins over anything typed into the UI: first the
//! `GROQ_API_KEY` entry of `secrets.toml`, then the configured environment
//! variable. Keys are never logged.

use crate::config::Config;
use crate::error::Result;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Key name looked up in `secrets.toml`
pub const SECRET_KEY_NAME: &str = "GROQ_API_KEY";

/// Where a stored key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    SecretsFile,
    Environment,
}

/// An API key whose `Debug` output is redacted
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a user-supplied key; blank input yields `None`
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// A key resolved from secure storage at startup
#[derive(Debug, Clone)]
pub struct StoredCredential {
    pub key: ApiKey,
    pub source: KeySource,
}

fn read_secrets_file(path: &Path) -> Result<Option<ApiKey>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let secrets: toml::Table = toml::from_str(&content)?;
    Ok(secrets
        .get(SECRET_KEY_NAME)
        .and_then(|v| v.as_str())
        .and_then(ApiKey::new))
}

/// Resolve a stored credential, if any
pub fn resolve_stored_credential(config: &Config) -> Option<StoredCredential> {
    match read_secrets_file(&config.paths.secrets_file) {
        Ok(Some(key)) => {
            debug!("API key loaded from {:?}", config.paths.secrets_file);
            return Some(StoredCredential {
                key,
                source: KeySource::SecretsFile,
            });
        }
        Ok(None) => {}
        Err(e) => warn!(
            "Ignoring unreadable secrets file {:?}: {}",
            config.paths.secrets_file, e
        ),
    }

    let key = std::env::var(&config.llm.api_key_env)
        .ok()
        .and_then(|v| ApiKey::new(&v))?;
    debug!("API key loaded from ${}", config.llm.api_key_env);
    Some(StoredCredential {
        key,
        source: KeySource::Environment,
    })
}
