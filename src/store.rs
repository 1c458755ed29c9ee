//! JSON-file document collections.
//!
//! Each collection lives in memory behind a `RwLock` and is written back to a
//! single JSON file after every mutation (temp file + rename, so a crash never
//! leaves a half-written file behind).

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub struct JsonCollection<T> {
    docs: RwLock<Vec<T>>,
    path: PathBuf,
}

impl<T> JsonCollection<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let docs = if path.exists() {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read collection {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("Corrupt collection file {}", path.display()))?
        } else {
            Vec::new()
        };

        Ok(Self {
            docs: RwLock::new(docs),
            path: path.to_path_buf(),
        })
    }

    pub fn all(&self) -> Vec<T> {
        self.docs.read().clone()
    }

    pub fn count(&self) -> usize {
        self.docs.read().len()
    }

    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.docs.read().iter().find(|d| pred(d)).cloned()
    }

    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.docs.read().iter().filter(|d| pred(d)).cloned().collect()
    }

    pub fn insert(&self, doc: T) -> Result<()> {
        let mut docs = self.docs.write();
        docs.push(doc);
        self.persist(&docs)
    }

    /// Insert unless an existing document matches `conflict`. Returns `false` on conflict.
    pub fn insert_unique(&self, doc: T, conflict: impl Fn(&T) -> bool) -> Result<bool> {
        let mut docs = self.docs.write();
        if docs.iter().any(|d| conflict(d)) {
            return Ok(false);
        }
        docs.push(doc);
        self.persist(&docs)?;
        Ok(true)
    }

    /// Apply `f` to the first matching document and return the updated copy.
    pub fn update(&self, pred: impl Fn(&T) -> bool, f: impl FnOnce(&mut T)) -> Result<Option<T>> {
        let mut docs = self.docs.write();
        let Some(doc) = docs.iter_mut().find(|d| pred(d)) else {
            return Ok(None);
        };
        f(doc);
        let updated = doc.clone();
        self.persist(&docs)?;
        Ok(Some(updated))
    }

    pub fn remove(&self, pred: impl Fn(&T) -> bool) -> Result<Option<T>> {
        let mut docs = self.docs.write();
        let Some(idx) = docs.iter().position(|d| pred(d)) else {
            return Ok(None);
        };
        let removed = docs.remove(idx);
        self.persist(&docs)?;
        Ok(Some(removed))
    }

    fn persist(&self, docs: &[T]) -> Result<()> {
        let data = serde_json::to_string_pretty(docs)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
