//! Process-wide index cache keyed by document-set fingerprint

use super::VectorIndex;
use crate::config::Config;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::workspace::Workspace;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

struct CachedIndex {
    fingerprint: String,
    index: Option<Arc<VectorIndex>>,
}

/// Memoised index construction.
///
/// The mutex is held for the whole build so concurrent sessions wait for
/// one build instead of racing.
#[derive(Default)]
pub struct IndexCache {
    slot: Mutex<Option<CachedIndex>>,
    builds: AtomicUsize,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the index for the workspace's current document set, building it
    /// on a cache miss. `Ok(None)` means there is nothing to index; when the
    /// store holds no files no build is attempted at all.
    pub async fn get_or_build(
        &self,
        workspace: &Workspace,
        embedder: &dyn Embedder,
        config: &Config,
    ) -> Result<Option<Arc<VectorIndex>>> {
        let Some(fingerprint) = workspace.fingerprint() else {
            return Ok(None);
        };

        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.fingerprint == fingerprint.digest {
                return Ok(cached.index.clone());
            }
        }

        self.builds.fetch_add(1, Ordering::SeqCst);
        info!(
            "Reading knowledge base ({} file(s) under {:?})",
            fingerprint.file_count,
            workspace.permanent_dir()
        );

        let reader = workspace.clone();
        let documents = tokio::task::spawn_blocking(move || reader.load_documents())
            .await
            .map_err(|e| Error::Other(format!("Document loading task failed: {}", e)))?;

        let index = VectorIndex::build(
            &documents,
            embedder,
            &config.chunk,
            config.embedding.batch_size,
        )
        .await?
        .map(Arc::new);

        *slot = Some(CachedIndex {
            fingerprint: fingerprint.digest,
            index: index.clone(),
        });

        Ok(index)
    }

    /// Drop the cached index so the next lookup rebuilds it
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        if slot.take().is_some() {
            info!("Index cache cleared");
        }
    }

    /// Number of builds started since the process began
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}
