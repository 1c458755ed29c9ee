use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::VectorHit;

/// A stored vector entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorEntry {
    collection: String,
    text: String,
    sequence: usize,
    embedding: Vec<f32>,
}

/// In-memory vector store with disk persistence and cosine similarity search.
///
/// Entries from every collection share one `vectors.json` file.
pub struct VectorStore {
    entries: RwLock<Vec<VectorEntry>>,
    persist_path: PathBuf,
}

impl VectorStore {
    pub fn open_or_create(vector_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(vector_dir)?;
        let persist_path = vector_dir.join("vectors.json");

        let entries = if persist_path.exists() {
            let data = std::fs::read_to_string(&persist_path)
                .context("Failed to read vector store")?;
            serde_json::from_str(&data).context("Corrupt vector store file")?
        } else {
            Vec::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            persist_path,
        })
    }

    /// Add chunk texts with their embeddings. `embeddings` must be parallel with `chunks`;
    /// each chunk's sequence is its position in `chunks`.
    pub fn add_chunks(&self, collection: &str, chunks: &[String], embeddings: Vec<Vec<f32>>) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            anyhow::bail!(
                "Got {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            );
        }

        let mut entries = self.entries.write();
        for (sequence, (text, embedding)) in chunks.iter().zip(embeddings).enumerate() {
            entries.push(VectorEntry {
                collection: collection.to_string(),
                text: text.clone(),
                sequence,
                embedding,
            });
        }
        self.persist(&entries)?;

        tracing::debug!("Stored {} chunks in {collection}", chunks.len());
        Ok(chunks.len())
    }

    /// Delete every vector in a collection.
    pub fn clear_collection(&self, collection: &str) -> Result<()> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.collection != collection);
        if entries.len() != before {
            self.persist(&entries)?;
        }
        Ok(())
    }

    /// Search one collection by cosine similarity against a query embedding.
    pub fn search(&self, collection: &str, query_embedding: &[f32], limit: usize) -> Vec<VectorHit> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &VectorEntry)> = entries
            .iter()
            .filter(|e| e.collection == collection)
            .map(|e| (cosine_similarity(query_embedding, &e.embedding), e))
            .collect();

        // Sort descending by score
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(score, e)| VectorHit {
                text: e.text.clone(),
                sequence: e.sequence,
                score,
            })
            .collect()
    }

    /// The first `limit` chunks of a collection in sequence order.
    pub fn fetch(&self, collection: &str, limit: usize) -> Vec<VectorHit> {
        let entries = self.entries.read();
        let mut hits: Vec<VectorHit> = entries
            .iter()
            .filter(|e| e.collection == collection)
            .map(|e| VectorHit {
                text: e.text.clone(),
                sequence: e.sequence,
                score: 0.0,
            })
            .collect();
        hits.sort_by_key(|h| h.sequence);
        hits.truncate(limit);
        hits
    }

    pub fn count(&self, collection: &str) -> usize {
        self.entries
            .read()
            .iter()
            .filter(|e| e.collection == collection)
            .count()
    }

    fn persist(&self, entries: &[VectorEntry]) -> Result<()> {
        let data = serde_json::to_string(entries)?;
        let tmp_path = self.persist_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)?;
        std::fs::rename(&tmp_path, &self.persist_path)?;
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_is_scoped_to_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        store
            .add_chunks("Admin", &texts(&["rates", "tenure"]), vec![vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap();
        store
            .add_chunks("Books_data", &texts(&["book"]), vec![vec![1.0, 0.0]])
            .unwrap();

        let hits = store.search("Admin", &[0.9, 0.1], 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "rates");
        assert!(hits[0].score > hits[1].score);

        assert_eq!(store.search("Admin", &[1.0, 0.0], 1).len(), 1);
        assert!(store.search("User_missing", &[1.0, 0.0], 1).is_empty());
    }

    #[test]
    fn test_fetch_orders_by_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        let chunks = texts(&["c0", "c1", "c2", "c3"]);
        let embeddings = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0], vec![0.5, 0.5]];
        store.add_chunks("Books_data", &chunks, embeddings).unwrap();

        let fetched = store.fetch("Books_data", 3);
        let order: Vec<usize> = fetched.iter().map(|h| h.sequence).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(fetched[0].text, "c0");
    }

    #[test]
    fn test_clear_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = VectorStore::open_or_create(dir.path()).unwrap();
            store.add_chunks("User_a", &texts(&["profile a"]), vec![vec![1.0]]).unwrap();
            store.add_chunks("User_b", &texts(&["profile b"]), vec![vec![1.0]]).unwrap();
            store.clear_collection("User_a").unwrap();
        }
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        assert_eq!(store.count("User_a"), 0);
        assert_eq!(store.count("User_b"), 1);
    }

    #[test]
    fn test_mismatched_embeddings_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_or_create(dir.path()).unwrap();
        assert!(store.add_chunks("Admin", &texts(&["a", "b"]), vec![vec![1.0]]).is_err());
        assert_eq!(store.count("Admin"), 0);
    }
}
