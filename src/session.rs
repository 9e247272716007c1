//! Per-browser-session state

use crate::chat::ChatEngine;
use crate::credentials::ApiKey;
use crate::error::{Error, Result};
use crate::llm::Role;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

/// One rendered chat message
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

pub struct Session {
    pub id: Uuid,
    /// Set once the transient store has been emptied for this session
    pub cleanup_done: bool,
    /// Key typed into the UI; never persisted
    pub api_key: Option<ApiKey>,
    pub engine: Option<Arc<ChatEngine>>,
    pub transcript: Vec<TranscriptEntry>,
    /// Name of the most recent upload, for the sidebar
    pub last_upload: Option<String>,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            cleanup_done: false,
            api_key: None,
            engine: None,
            transcript: Vec::new(),
            last_upload: None,
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.transcript.push(TranscriptEntry {
            role,
            content: content.into(),
            at: Utc::now(),
        });
    }

    pub fn count(&self, role: Role) -> usize {
        self.transcript.iter().filter(|e| e.role == role).count()
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Upper bound on the idle timeout, keeps the chrono arithmetic in range
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

struct Slot {
    handle: SessionHandle,
    last_seen: DateTime<Utc>,
}

/// All live sessions, keyed by id
///
/// A session that has not been looked up for `ttl` is expired: `get`
/// reports it as not found and `create` sweeps it out of the map.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Slot>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
        }
    }

    fn is_expired(&self, slot: &Slot, now: DateTime<Utc>) -> bool {
        now - slot.last_seen > self.ttl
    }

    pub async fn create(&self) -> (Uuid, SessionHandle) {
        let session = Session::new();
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| !self.is_expired(slot, now));
        let swept = before - sessions.len();
        if swept > 0 {
            debug!("Dropped {} expired session(s)", swept);
        }
        sessions.insert(
            id,
            Slot {
                handle: handle.clone(),
                last_seen: now,
            },
        );
        (id, handle)
    }

    pub async fn get(&self, id: Uuid) -> Result<SessionHandle> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        match sessions.get(&id).map(|slot| self.is_expired(slot, now)) {
            Some(false) => {
                if let Some(slot) = sessions.get_mut(&id) {
                    slot.last_seen = now;
                    return Ok(slot.handle.clone());
                }
            }
            Some(true) => {
                sessions.remove(&id);
                debug!("Session {} expired", id);
            }
            None => {}
        }
        Err(Error::SessionNotFound(id.to_string()))
    }

    /// Sessions currently held, expired or not
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn backdate(&self, id: Uuid, by: Duration) {
        if let Some(slot) = self.sessions.write().await.get_mut(&id) {
            slot.last_seen = slot.last_seen - by;
        }
    }
}
