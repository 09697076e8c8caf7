//! Per-project semantic index over file summaries
//!
//! Each project root owns one [`ProjectIndex`]: an in-memory list of
//! `(relative path, unit vector)` records behind a tokio `RwLock`. Rebuilds and
//! upserts hold the write lock for their whole duration, so a query never
//! observes a half-built store.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::EmbeddingConfig;
use crate::embedding::{EmbeddingProvider, dot, normalize};
use crate::error::{EmbeddingError, Result};

/// One stored vector
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub path: String,
    pub vector: Vec<f32>,
}

/// Flat vector store; brute-force scan is enough for project-sized inputs
#[derive(Debug, Default)]
pub struct EmbeddingIndex {
    records: Vec<EmbeddingRecord>,
}

impl EmbeddingIndex {
    fn replace_all(&mut self, records: Vec<EmbeddingRecord>) {
        self.records = records;
    }

    fn upsert(&mut self, record: EmbeddingRecord) {
        match self.records.iter_mut().find(|r| r.path == record.path) {
            Some(existing) => existing.vector = record.vector,
            None => self.records.push(record),
        }
    }

    /// Paths scoring at least `floor`, best first, ties by path
    fn nearest(&self, query: &[f32], k: usize, floor: f32) -> Vec<(String, f32)> {
        let mut scored: Vec<(String, f32)> = self
            .records
            .iter()
            .map(|r| (r.path.clone(), dot(query, &r.vector)))
            .filter(|(_, similarity)| *similarity >= floor)
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);
        scored
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The index of one project root
pub struct ProjectIndex {
    root: PathBuf,
    provider: Arc<dyn EmbeddingProvider>,
    min_similarity: f32,
    batch_size: usize,
    store: RwLock<EmbeddingIndex>,
}

impl ProjectIndex {
    pub fn new(
        root: PathBuf,
        provider: Arc<dyn EmbeddingProvider>,
        config: &EmbeddingConfig,
    ) -> Self {
        Self {
            root,
            provider,
            min_similarity: config.min_similarity,
            batch_size: config.batch_size.max(1),
            store: RwLock::new(EmbeddingIndex::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full rebuild from `path -> summary`
    pub async fn index(&self, summaries: &BTreeMap<String, String>) -> Result<usize> {
        let mut store = self.store.write().await;

        let paths: Vec<String> = summaries.keys().cloned().collect();
        let texts: Vec<String> = summaries.values().cloned().collect();
        let vectors = self.encode(texts).await?;

        let records: Vec<EmbeddingRecord> = paths
            .into_iter()
            .zip(vectors)
            .map(|(path, vector)| EmbeddingRecord { path, vector })
            .collect();
        let count = records.len();
        store.replace_all(records);

        tracing::info!(
            "Indexed {} summaries for {} with {}",
            count,
            self.root.display(),
            self.provider.model_name()
        );
        Ok(count)
    }

    /// Replace or insert the vector of a single path
    pub async fn upsert(&self, path: &str, summary: &str) -> Result<()> {
        let mut store = self.store.write().await;
        let mut vectors = self.encode(vec![summary.to_string()]).await?;
        let vector = vectors.pop().ok_or_else(|| {
            EmbeddingError::GenerationFailed("encoder returned no vector".to_string())
        })?;

        store.upsert(EmbeddingRecord {
            path: path.to_string(),
            vector,
        });
        tracing::debug!("Upserted embedding for {} in {}", path, self.root.display());
        Ok(())
    }

    /// Up to `k` paths most similar to `query`, best first
    pub async fn top_k(&self, query: &str, k: usize) -> Result<Vec<String>> {
        Ok(self
            .top_k_scored(query, k)
            .await?
            .into_iter()
            .map(|(path, _)| path)
            .collect())
    }

    /// Like [`top_k`](Self::top_k) but keeps the similarity
    pub async fn top_k_scored(&self, query: &str, k: usize) -> Result<Vec<(String, f32)>> {
        if k == 0 || self.is_empty().await {
            return Ok(vec![]);
        }

        let mut vectors = self.encode(vec![query.to_string()]).await?;
        let query_vector = vectors.pop().ok_or_else(|| {
            EmbeddingError::GenerationFailed("encoder returned no vector".to_string())
        })?;

        let store = self.store.read().await;
        Ok(store.nearest(&query_vector, k, self.min_similarity))
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    /// Encode on the blocking pool, then check shape and normalize
    async fn encode(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = texts.len();
        if expected == 0 {
            return Ok(vec![]);
        }

        let provider = Arc::clone(&self.provider);
        let batch_size = self.batch_size;
        let vectors = tokio::task::spawn_blocking(move || {
            let mut out = Vec::with_capacity(texts.len());
            for batch in texts.chunks(batch_size) {
                out.extend(provider.embed_batch(batch.to_vec())?);
            }
            Ok::<_, EmbeddingError>(out)
        })
        .await
        .map_err(|e| EmbeddingError::GenerationFailed(format!("embedding task failed: {}", e)))??;

        if vectors.len() != expected {
            return Err(EmbeddingError::GenerationFailed(format!(
                "expected {} vectors, encoder returned {}",
                expected,
                vectors.len()
            ))
            .into());
        }

        let dimension = self.provider.dimension();
        vectors
            .into_iter()
            .map(|mut vector| -> Result<Vec<f32>> {
                if vector.len() != dimension {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: dimension,
                        actual: vector.len(),
                    }
                    .into());
                }
                normalize(&mut vector);
                Ok(vector)
            })
            .collect()
    }
}

/// Process-wide map from project root to its index; entries are never evicted
pub struct IndexRegistry {
    provider: Arc<dyn EmbeddingProvider>,
    config: EmbeddingConfig,
    indexes: RwLock<HashMap<PathBuf, Arc<ProjectIndex>>>,
}

impl IndexRegistry {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: EmbeddingConfig) -> Self {
        Self {
            provider,
            config,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// The index for `root`, created empty on first use
    pub async fn get_or_create(&self, root: &Path) -> Arc<ProjectIndex> {
        let key = registry_key(root);

        if let Some(index) = self.indexes.read().await.get(&key) {
            return Arc::clone(index);
        }

        let mut indexes = self.indexes.write().await;
        Arc::clone(indexes.entry(key.clone()).or_insert_with(|| {
            tracing::debug!("Creating embedding index for {}", key.display());
            Arc::new(ProjectIndex::new(
                key,
                Arc::clone(&self.provider),
                &self.config,
            ))
        }))
    }

    pub async fn index(&self, root: &Path, summaries: &BTreeMap<String, String>) -> Result<usize> {
        self.get_or_create(root).await.index(summaries).await
    }

    pub async fn upsert(&self, root: &Path, path: &str, summary: &str) -> Result<()> {
        self.get_or_create(root).await.upsert(path, summary).await
    }

    pub async fn top_k(&self, root: &Path, query: &str, k: usize) -> Result<Vec<String>> {
        self.get_or_create(root).await.top_k(query, k).await
    }

    /// Number of project roots seen so far
    pub async fn project_count(&self) -> usize {
        self.indexes.read().await.len()
    }
}

fn registry_key(root: &Path) -> PathBuf {
    std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}

#[cfg(test)]
mod tests;
