//! Vector storage for profile text, admin guidance and reading material.
//!
//! Two interchangeable backends sit behind [`VectorBackend`]: a hosted
//! Weaviate instance when `WEAVIATE_URL` is configured, otherwise a local
//! JSON-persisted store searched by cosine similarity.

pub mod local;
pub mod weaviate;

use anyhow::Result;
use uuid::Uuid;

use crate::config::Config;
use local::VectorStore;
use weaviate::WeaviateClient;

/// Shared loan guidance consulted on every chat turn.
pub const ADMIN_COLLECTION: &str = "Admin";
/// Reading material that community articles are drafted from.
pub const BOOKS_COLLECTION: &str = "Books_data";

/// Collections the admin console may upload into.
pub const UPLOAD_COLLECTIONS: [&str; 2] = [ADMIN_COLLECTION, BOOKS_COLLECTION];

/// Per-user collection holding that user's profile text.
pub fn user_collection(user_id: Uuid) -> String {
    format!("User_{}", user_id.simple())
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub text: String,
    pub sequence: usize,
    pub score: f32,
}

pub enum VectorBackend {
    Local(VectorStore),
    Weaviate(WeaviateClient),
}

impl VectorBackend {
    pub fn from_config(config: &Config, http: reqwest::Client) -> Result<Self> {
        match &config.vector.weaviate_url {
            Some(url) => {
                tracing::info!("Vector backend: Weaviate at {url}");
                Ok(Self::Weaviate(WeaviateClient::new(
                    http,
                    url,
                    config.vector.weaviate_api_key.clone(),
                )))
            }
            None => {
                tracing::info!(
                    "Vector backend: local store in {}",
                    config.vector_dir().display()
                );
                Ok(Self::Local(VectorStore::open_or_create(&config.vector_dir())?))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Weaviate(_) => "weaviate",
        }
    }

    pub async fn ensure_collection(&self, name: &str) -> Result<()> {
        match self {
            Self::Local(_) => Ok(()),
            Self::Weaviate(client) => Ok(client.ensure_collection(name).await?),
        }
    }

    /// Remove every chunk in a collection, leaving it ready for new uploads.
    pub async fn clear_collection(&self, name: &str) -> Result<()> {
        match self {
            Self::Local(store) => store.clear_collection(name),
            Self::Weaviate(client) => {
                client.delete_collection(name).await?;
                Ok(client.ensure_collection(name).await?)
            }
        }
    }

    /// Store `chunks` with their embeddings; a chunk's sequence is its index.
    pub async fn add_chunks(&self, name: &str, chunks: &[String], embeddings: Vec<Vec<f32>>) -> Result<usize> {
        match self {
            Self::Local(store) => store.add_chunks(name, chunks, embeddings),
            Self::Weaviate(client) => {
                if chunks.len() != embeddings.len() {
                    anyhow::bail!(
                        "Got {} embeddings for {} chunks",
                        embeddings.len(),
                        chunks.len()
                    );
                }
                client.ensure_collection(name).await?;
                for (sequence, (text, embedding)) in chunks.iter().zip(&embeddings).enumerate() {
                    client.add_object(name, text, sequence, embedding).await?;
                    tracing::debug!(
                        "Uploaded chunk {}/{} with sequence {sequence} to {name}",
                        sequence + 1,
                        chunks.len()
                    );
                }
                Ok(chunks.len())
            }
        }
    }

    /// Nearest chunks to `embedding`. A collection that does not exist yields no hits.
    pub async fn search(&self, name: &str, embedding: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        match self {
            Self::Local(store) => Ok(store.search(name, embedding, k)),
            Self::Weaviate(client) => Ok(client.near_vector(name, embedding, k).await?),
        }
    }

    pub async fn count(&self, name: &str) -> Result<usize> {
        match self {
            Self::Local(store) => Ok(store.count(name)),
            Self::Weaviate(client) => Ok(client.count(name).await?),
        }
    }

    /// Up to `limit` chunks ordered by sequence.
    pub async fn fetch(&self, name: &str, limit: usize) -> Result<Vec<VectorHit>> {
        match self {
            Self::Local(store) => Ok(store.fetch(name, limit)),
            Self::Weaviate(client) => Ok(client.fetch_ordered(name, limit).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_collection_name() {
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(user_collection(id), "User_67e5504410b1426f9247bb680e5fe0c8");
    }

    #[tokio::test]
    async fn test_local_backend_without_weaviate_url() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let backend = VectorBackend::from_config(&config, reqwest::Client::new()).unwrap();
        assert_eq!(backend.name(), "local");

        backend.ensure_collection(ADMIN_COLLECTION).await.unwrap();
        let stored = backend
            .add_chunks(ADMIN_COLLECTION, &["guidance".to_string()], vec![vec![1.0, 0.0]])
            .await
            .unwrap();
        assert_eq!(stored, 1);
        assert_eq!(backend.count(ADMIN_COLLECTION).await.unwrap(), 1);

        backend.clear_collection(ADMIN_COLLECTION).await.unwrap();
        assert_eq!(backend.count(ADMIN_COLLECTION).await.unwrap(), 0);
        assert!(backend
            .search(ADMIN_COLLECTION, &[1.0, 0.0], 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_weaviate_backend_selected_by_url() {
        let mut config = Config::default();
        config.vector.weaviate_url = Some("http://localhost:8080".into());
        let backend = VectorBackend::from_config(&config, reqwest::Client::new()).unwrap();
        assert_eq!(backend.name(), "weaviate");
    }
}
