//! In-memory retrieval index
//!
//! Chunks of every document are embedded once and kept in memory next to
//! their vectors. Search is an exhaustive cosine-similarity scan, which is
//! plenty for a curated folder of reference documents.

mod cache;

pub use cache::*;

use crate::chunk::chunk_text;
use crate::config::ChunkConfig;
use crate::embed::{cosine_similarity, embed_in_batches, Embedder};
use crate::error::{Error, Result};
use crate::progress::{embedding_progress, finish_progress};
use crate::workspace::Document;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// A chunk stored in the index
#[derive(Debug, Clone, Serialize)]
pub struct IndexedChunk {
    /// Hash of the document bytes and chunk text; identical files share ids
    pub id: String,
    pub doc_path: String,
    pub title: Option<String>,
    pub chunk_index: usize,
    pub text: String,
}

/// A search hit
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub score: f32,
    pub chunk: IndexedChunk,
}

#[derive(Debug)]
struct Entry {
    chunk: IndexedChunk,
    vector: Vec<f32>,
}

#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<Entry>,
    document_count: usize,
}

impl VectorIndex {
    /// Chunk and embed `documents`. Returns `None` when they hold no text.
    ///
    /// A document stored twice (for example an upload that copies a file
    /// already in the permanent store) is only embedded once.
    pub async fn build(
        documents: &[Document],
        embedder: &dyn Embedder,
        chunk_config: &ChunkConfig,
        batch_size: usize,
    ) -> Result<Option<Self>> {
        let mut seen = HashSet::new();
        let chunks: Vec<IndexedChunk> = documents
            .iter()
            .flat_map(|doc| {
                chunk_text(&doc.text, &doc.hash, chunk_config)
                    .into_iter()
                    .map(|chunk| IndexedChunk {
                        id: chunk.hash,
                        doc_path: doc.relative_path.clone(),
                        title: doc.title.clone(),
                        chunk_index: chunk.index,
                        text: chunk.text,
                    })
            })
            .filter(|chunk| seen.insert(chunk.id.clone()))
            .collect();

        if chunks.is_empty() {
            debug!("No chunks produced from {} document(s)", documents.len());
            return Ok(None);
        }

        info!(
            "Embedding {} chunks from {} document(s) with {}",
            chunks.len(),
            documents.len(),
            embedder.model_name()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let bar = embedding_progress(texts.len() as u64);
        let vectors = embed_in_batches(embedder, texts, batch_size, |n| bar.inc(n as u64)).await;
        let vectors = match vectors {
            Ok(v) => {
                finish_progress(bar, &format!("Indexed {} chunks", v.len()));
                v
            }
            Err(e) => {
                bar.abandon();
                return Err(e);
            }
        };

        if vectors.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != embedder.dimension()) {
            return Err(Error::Embedding(format!(
                "Embedding dimension mismatch for model '{}': expected {}, got {}",
                embedder.model_name(),
                embedder.dimension(),
                bad.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| Entry { chunk, vector })
            .collect();

        Ok(Some(Self {
            entries,
            document_count: documents.len(),
        }))
    }

    /// The `top_k` chunks most similar to `query`, best first
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(f32, &Entry)> = self
            .entries
            .iter()
            .map(|e| (cosine_similarity(query, &e.vector), e))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(top_k)
            .map(|(score, e)| ScoredChunk {
                score,
                chunk: e.chunk.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }
}


#[cfg(test)]
mod tests {
    use super::testing::KeywordEmbedder;
    use super::*;

    fn doc(path: &str, text: &str) -> Document {
        Document {
            relative_path: path.to_string(),
            title: None,
            text: text.to_string(),
            hash: crate::chunk::compute_content_hash(text.as_bytes()),
        }
    }

    #[tokio::test]
    async fn test_build_and_search() {
        let embedder = KeywordEmbedder::new(vec!["grant", "investor", "valuation"]);
        let docs = vec![
            doc("schemes.txt", "The seed grant covers prototypes. A grant needs DPIIT recognition."),
            doc("investors.csv", "Blume Ventures, investor, SaaS\nKalaari, investor, fintech"),
        ];

        let index = VectorIndex::build(&docs, &embedder, &ChunkConfig::default(), 8)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.document_count(), 2);

        let query = embedder.embed(vec!["which investor?".into()]).await.unwrap();
        let hits = index.search(&query[0], 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.doc_path, "investors.csv");

        let all = index.search(&query[0], 10);
        assert_eq!(all.len(), 2);
        assert!(all[0].score >= all[1].score);
    }

    #[tokio::test]
    async fn test_duplicate_document_is_indexed_once() {
        let embedder = KeywordEmbedder::new(vec!["grant", "investor"]);
        let text = "The seed grant covers prototypes.";
        let docs = vec![
            doc("schemes.txt", text),
            doc("temp_uploads/schemes.txt", text),
            doc("investors.csv", "Blume Ventures, investor, SaaS"),
        ];

        let index = VectorIndex::build(&docs, &embedder, &ChunkConfig::default(), 8)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.document_count(), 3);

        let query = embedder.embed(vec!["grant".into()]).await.unwrap();
        let hits = index.search(&query[0], 10);
        assert_eq!(hits.iter().filter(|h| h.chunk.text == text).count(), 1);
        assert_eq!(hits[0].chunk.doc_path, "schemes.txt");
    }

    #[tokio::test]
    async fn test_build_without_text_is_none() {
        let embedder = KeywordEmbedder::new(vec!["grant"]);
        let docs = vec![doc("blank.txt", "  \n ")];

        let index = VectorIndex::build(&docs, &embedder, &ChunkConfig::default(), 8)
            .await
            .unwrap();

        assert!(index.is_none());
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_build_propagates_embedding_failure() {
        let mut embedder = KeywordEmbedder::new(vec!["grant"]);
        embedder.fail = true;
        let docs = vec![doc("a.txt", "grant")];

        let result =
            VectorIndex::build(&docs, &embedder, &ChunkConfig::default(), 8).await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }
}
