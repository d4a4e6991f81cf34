//! In-process vector index with optional JSON persistence.

use crate::embeddings::cosine_similarity;
use crate::error::IndexError;
use crate::index::{sort_matches, IndexSpec, IndexedEntry, QueryMatch, VectorIndex};
use apirec_core::config::Metric;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

/// On-disk representation of a local index.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredIndex {
    dimension: usize,
    metric: Metric,
    entries: BTreeMap<String, IndexedEntry>,
}

/// Brute-force similarity index held in memory.
///
/// With a path, every mutation is persisted via atomic writes (write to
/// tmp, then rename) and the index survives restarts. A write that cannot be
/// persisted leaves the index unchanged. Each upsert rewrites the whole file,
/// so this backend suits catalogs of a few thousand entries. Like a managed index,
/// it has to be created with [`VectorIndex::ensure_exists`] before use.
pub struct LocalIndex {
    spec: IndexSpec,
    path: Option<PathBuf>,
    state: RwLock<Option<StoredIndex>>,
}

impl LocalIndex {
    /// Create an index that lives only in memory.
    pub fn in_memory(spec: IndexSpec) -> Self {
        Self {
            spec,
            path: None,
            state: RwLock::new(None),
        }
    }

    /// Open a file-backed index. A missing file means the index does not exist yet.
    pub fn open(spec: IndexSpec, path: PathBuf) -> Result<Self, IndexError> {
        let state = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            Some(serde_json::from_str(&data)?)
        } else {
            None
        };

        Ok(Self {
            spec,
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    async fn save(&self, state: &StoredIndex) -> Result<(), IndexError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = path.with_extension("tmp");
        let data = serde_json::to_string(state)?;
        tokio::fs::write(&tmp_path, data).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }

    fn not_found(&self) -> IndexError {
        IndexError::NotFound(self.spec.name.clone())
    }
}

fn score(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        Metric::Cosine => cosine_similarity(a, b),
        Metric::Dotproduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        Metric::Euclidean => {
            let distance: f32 = a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt();
            1.0 / (1.0 + distance)
        }
    }
}

#[async_trait]
impl VectorIndex for LocalIndex {
    fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    async fn ensure_exists(&self) -> Result<bool, IndexError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.as_ref() {
            if let Some(reason) = self
                .spec
                .incompatibility(existing.dimension, existing.metric)
            {
                return Err(IndexError::incompatible(&self.spec.name, reason));
            }
            return Ok(false);
        }

        let created = StoredIndex {
            dimension: self.spec.dimension,
            metric: self.spec.metric,
            entries: BTreeMap::new(),
        };
        self.save(&created).await?;
        *state = Some(created);
        debug!(index = %self.spec.name, "Created local index");
        Ok(true)
    }

    async fn delete(&self) -> Result<bool, IndexError> {
        let mut state = self.state.write().await;
        if let Some(path) = &self.path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(state.take().is_some())
    }

    async fn upsert(&self, entries: Vec<IndexedEntry>) -> Result<usize, IndexError> {
        for entry in &entries {
            self.spec.check_dimension(&entry.vector)?;
        }

        let mut guard = self.state.write().await;
        let mut staged = guard.as_ref().cloned().ok_or_else(|| self.not_found())?;

        let written = entries.len();
        for entry in entries {
            staged.entries.insert(entry.id.clone(), entry);
        }
        self.save(&staged)
            .await
            .map_err(|e| IndexError::Write(e.to_string()))?;
        *guard = Some(staged);
        Ok(written)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>, IndexError> {
        if top_k == 0 {
            return Err(IndexError::InvalidTopK);
        }
        self.spec.check_dimension(vector)?;

        let guard = self.state.read().await;
        let state = guard.as_ref().ok_or_else(|| self.not_found())?;

        let mut matches: Vec<QueryMatch> = state
            .entries
            .values()
            .map(|entry| QueryMatch {
                id: entry.id.clone(),
                score: score(state.metric, vector, &entry.vector),
                metadata: Some(entry.metadata.clone()),
            })
            .collect();

        sort_matches(&mut matches);
        matches.truncate(top_k);

        Ok(matches)
    }

    async fn count(&self) -> Result<usize, IndexError> {
        let guard = self.state.read().await;
        guard
            .as_ref()
            .map(|s| s.entries.len())
            .ok_or_else(|| self.not_found())
    }
}
