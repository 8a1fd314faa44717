use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use theory_explorer_common::{AppConfig, Result, TheoryExplorerError};
use theory_explorer_embedding::EmbeddingProvider;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::index::VectorIndex;
use crate::persistence::{load_items, save_items};
use crate::seed::theory_to_text;
use crate::similarity::cosine_similarity;
use crate::types::{Item, SearchResult, StoreStats, StoreStatus, TheoryRecord};

struct StoreState {
    index: VectorIndex,
    status: StoreStatus,
}

/// Embedding-backed theory index.
///
/// Mutations take the write lock; searches share the read lock for their scan.
/// Saves are serialized by `save_lock` so only one snapshot is written at a time.
/// Only `load` and `build_from_seed` move the store from `Empty` to `Ready`.
pub struct TheoryStore {
    provider: Arc<dyn EmbeddingProvider>,
    path: PathBuf,
    state: RwLock<StoreState>,
    save_lock: Mutex<()>,
}

impl TheoryStore {
    /// Create an empty store persisting to `path`
    pub fn new(provider: Arc<dyn EmbeddingProvider>, path: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            path: path.into(),
            state: RwLock::new(StoreState {
                index: VectorIndex::new(),
                status: StoreStatus::Empty,
            }),
            save_lock: Mutex::new(()),
        }
    }

    /// Create an empty store at the configured path
    pub fn from_config(config: &AppConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(provider, config.store_path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory items with the persisted snapshot.
    ///
    /// Returns `false` when there is no store file; the store is left as it was.
    pub async fn load(&self) -> Result<bool> {
        let Some(items) = load_items(&self.path).await? else {
            info!("No store file at {}, starting empty", self.path.display());
            return Ok(false);
        };

        let index = VectorIndex::from_items(items)
            .map_err(|e| TheoryExplorerError::persistence_read(&self.path, e))?;

        let mut state = self.state.write().await;
        info!(
            "Loaded {} items (dimension {:?}) from {}",
            index.len(),
            index.dimension(),
            self.path.display()
        );
        state.index = index;
        state.status = StoreStatus::Ready;
        Ok(true)
    }

    /// Write the current items to disk as one full snapshot
    pub async fn save(&self) -> Result<()> {
        // Taken before the state lock; build_from_seed saves under the write lock instead
        let _saving = self.save_lock.lock().await;
        let state = self.state.read().await;
        save_items(&self.path, state.index.items()).await
    }

    async fn embed_record(&self, record: &TheoryRecord) -> Result<Item> {
        let text = theory_to_text(record);
        let vector = self.provider.embed(&text).await?;
        Ok(Item {
            id: record.id.clone(),
            text,
            vector,
            meta: record.to_meta(),
        })
    }

    /// Embed a record and insert or replace it by id.
    ///
    /// Nothing is written to disk; call `save` to persist.
    pub async fn upsert_theory(&self, record: &TheoryRecord) -> Result<Item> {
        if record.id.trim().is_empty() {
            return Err(TheoryExplorerError::invalid_input("Record id cannot be empty"));
        }

        let item = self.embed_record(record).await?;

        let mut state = self.state.write().await;
        let position = state.index.upsert(item.clone())?;
        debug!("Upserted '{}' at position {}", item.id, position);
        Ok(item)
    }

    /// Embed every seed record, save once, then mark the store ready.
    ///
    /// Runs only while the store is `Empty`; returns `false` without embedding
    /// anything otherwise. The write lock is held throughout, so a concurrent
    /// second call waits and then sees `Ready`.
    pub async fn build_from_seed(&self, records: &[TheoryRecord]) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.status == StoreStatus::Ready {
            debug!("Store already ready, skipping seed build");
            return Ok(false);
        }

        info!("Building index from {} seed records", records.len());
        // Sequential on purpose: provider rate limits
        for (i, record) in records.iter().enumerate() {
            if record.id.trim().is_empty() {
                return Err(TheoryExplorerError::invalid_input(format!(
                    "Seed record {} has an empty id",
                    i
                )));
            }
            let item = self.embed_record(record).await?;
            state.index.upsert(item)?;
            debug!("Seeded {}/{}: {}", i + 1, records.len(), record.id);
        }

        save_items(&self.path, state.index.items()).await?;
        state.status = StoreStatus::Ready;

        info!("Seed build complete - {} items", state.index.len());
        Ok(true)
    }

    /// Rank every item against `query`, best first, at most `k` results.
    ///
    /// An `Empty` or itemless store returns no results without embedding.
    /// Equal scores keep insertion order.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if !self.is_searchable().await {
            debug!("Search on empty store - returning no results");
            return Ok(Vec::new());
        }

        debug!("Searching for: {} (top_k={})", query, k);
        let query_vector = self.provider.embed(query).await?;

        let state = self.state.read().await;
        if state.status == StoreStatus::Empty || state.index.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(expected) = state.index.dimension() {
            if expected != query_vector.len() {
                return Err(TheoryExplorerError::DimensionMismatch {
                    expected,
                    actual: query_vector.len(),
                });
            }
        }

        if query_vector.iter().any(|x| !x.is_finite()) {
            return Err(TheoryExplorerError::embedding(
                "Query embedding contains non-finite values",
            ));
        }

        let mut results: Vec<SearchResult> = state
            .index
            .items()
            .iter()
            .map(|item| {
                SearchResult::new(
                    item.id.clone(),
                    cosine_similarity(&query_vector, &item.vector),
                    item.meta.clone(),
                )
            })
            .collect();
        let total_candidates = results.len();

        // sort_by is stable, which gives the insertion-order tie-break
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(k);

        info!(
            "Search completed - {} results from {} candidates",
            results.len(),
            total_candidates
        );
        Ok(results)
    }

    async fn is_searchable(&self) -> bool {
        let state = self.state.read().await;
        state.status == StoreStatus::Ready && !state.index.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<Item> {
        self.state.read().await.index.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.index.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.index.is_empty()
    }

    pub async fn status(&self) -> StoreStatus {
        self.state.read().await.status
    }

    /// Get index statistics
    pub async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        StoreStats {
            items: state.index.len(),
            dimension: state.index.dimension(),
            status: state.status,
            model: self.provider.model_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use tempfile::TempDir;

    /// Maps the first word of the text to a fixed direction
    struct KeywordProvider {
        calls: AtomicUsize,
    }

    impl KeywordProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(AtomicOrdering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordProvider {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            let first = text.split_whitespace().next().unwrap_or_default();
            Ok(match first {
                "north" => vec![1.0, 0.0, 0.0],
                "east" => vec![0.0, 1.0, 0.0],
                "northeast" => vec![0.7, 0.7, 0.0],
                "mostly-north" => vec![0.9, 0.1, 0.0],
                "wide" => vec![1.0, 0.0, 0.0, 0.0],
                "zero" => vec![0.0, 0.0, 0.0],
                "broken" => vec![f32::NAN, 1.0, 0.0],
                _ => vec![0.0, 0.0, 1.0],
            })
        }

        fn model_name(&self) -> &str {
            "keyword"
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(TheoryExplorerError::embedding("Empty embedding vector"))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn record(id: &str, name: &str) -> TheoryRecord {
        TheoryRecord::new(id, name, "theory", "test", "summary")
    }

    fn store_in(dir: &TempDir, provider: Arc<dyn EmbeddingProvider>) -> TheoryStore {
        TheoryStore::new(provider, dir.path().join("embeddings.json"))
    }

    #[tokio::test]
    async fn test_search_on_empty_store_does_not_embed() {
        let temp_dir = TempDir::new().unwrap();
        let provider = KeywordProvider::new();
        let store = store_in(&temp_dir, provider.clone());

        assert!(store.search("north", 5).await.unwrap().is_empty());

        // Items present but store never loaded or seeded
        store.upsert_theory(&record("n", "north")).await.unwrap();
        assert_eq!(store.status().await, StoreStatus::Empty);
        assert!(store.search("north", 5).await.unwrap().is_empty());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_search_on_ready_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, KeywordProvider::new());

        assert!(store.build_from_seed(&[]).await.unwrap());
        assert_eq!(store.status().await, StoreStatus::Ready);
        assert!(store.search("north", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_same_id_keeps_latest() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, KeywordProvider::new());

        store.upsert_theory(&record("t", "north")).await.unwrap();
        store.upsert_theory(&record("other", "east")).await.unwrap();
        let latest = store.upsert_theory(&record("t", "east")).await.unwrap();

        assert_eq!(store.len().await, 2);
        let stored = store.get("t").await.unwrap();
        assert_eq!(stored, latest);
        assert_eq!(stored.vector, vec![0.0, 1.0, 0.0]);
        assert_eq!(stored.meta["name"], "east");
        assert!(stored.text.starts_with("east | theory"));
    }

    #[tokio::test]
    async fn test_upsert_does_not_persist() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, KeywordProvider::new());

        store.upsert_theory(&record("t", "north")).await.unwrap();
        assert!(!store.path().exists());

        store.save().await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_upsert() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, Arc::new(FailingProvider));

        let err = store.upsert_theory(&record("t", "north")).await.unwrap_err();
        assert!(err.is_embedding());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, KeywordProvider::new());

        store.upsert_theory(&record("n", "north")).await.unwrap();
        let err = store.upsert_theory(&record("w", "wide")).await.unwrap_err();
        assert!(matches!(err, TheoryExplorerError::DimensionMismatch { .. }));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_search_ranks_and_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, KeywordProvider::new());
        store
            .build_from_seed(&[record("e", "east"), record("n", "north"), record("ne", "northeast")])
            .await
            .unwrap();

        let results = store.search("mostly-north", 2).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["n", "ne"]);
        assert_eq!(results[0].meta["name"], "north");

        let all = store.search("mostly-north", 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].score >= w[1].score));

        assert!(store.search("north", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, KeywordProvider::new());
        store
            .build_from_seed(&[
                record("first", "north"),
                record("odd", "east"),
                record("second", "north"),
                record("third", "north"),
            ])
            .await
            .unwrap();

        for _ in 0..3 {
            let ids: Vec<String> = store
                .search("north", 4)
                .await
                .unwrap()
                .into_iter()
                .map(|r| r.id)
                .collect();
            assert_eq!(ids, vec!["first", "second", "third", "odd"]);
        }
    }

    #[tokio::test]
    async fn test_zero_query_vector_scores_zero() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, KeywordProvider::new());
        store.build_from_seed(&[record("n", "north")]).await.unwrap();

        let results = store.search("zero", 1).await.unwrap();
        assert_eq!(results[0].score, 0.0);
    }

    #[tokio::test]
    async fn test_build_from_seed_runs_once() {
        let temp_dir = TempDir::new().unwrap();
        let provider = KeywordProvider::new();
        let store = store_in(&temp_dir, provider.clone());
        let seed = vec![record("n", "north"), record("e", "east")];

        assert!(store.build_from_seed(&seed).await.unwrap());
        assert_eq!(provider.calls(), 2);
        assert!(store.path().exists());

        assert!(!store.build_from_seed(&seed).await.unwrap());
        assert_eq!(provider.calls(), 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_seed_embedding_failure_leaves_store_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, Arc::new(FailingProvider));

        let err = store.build_from_seed(&[record("n", "north")]).await.unwrap_err();
        assert!(err.is_embedding());
        assert_eq!(store.status().await, StoreStatus::Empty);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_load_missing_file_stays_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, KeywordProvider::new());

        assert!(!store.load().await.unwrap());
        assert_eq!(store.status().await, StoreStatus::Empty);
    }

    #[tokio::test]
    async fn test_load_after_save_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, KeywordProvider::new());
        store
            .build_from_seed(&[record("n", "north"), record("ne", "northeast")])
            .await
            .unwrap();

        let provider = KeywordProvider::new();
        let reloaded = store_in(&temp_dir, provider.clone());
        assert!(reloaded.load().await.unwrap());
        assert_eq!(reloaded.status().await, StoreStatus::Ready);

        for id in ["n", "ne"] {
            assert_eq!(reloaded.get(id).await, store.get(id).await);
        }
        assert_eq!(reloaded.stats().await.dimension, Some(3));

        // Loaded stores skip seeding
        assert!(!reloaded.build_from_seed(&[record("e", "east")]).await.unwrap());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_load_rejects_duplicate_ids() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("embeddings.json");
        std::fs::write(
            &path,
            r#"{"items": [
                {"id": "a", "text": "x", "vector": [1.0], "meta": {}},
                {"id": "a", "text": "y", "vector": [2.0], "meta": {}}
            ]}"#,
        )
        .unwrap();

        let store = TheoryStore::new(KeywordProvider::new(), path);
        let err = store.load().await.unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(store.status().await, StoreStatus::Empty);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, KeywordProvider::new());
        store.build_from_seed(&[record("n", "north")]).await.unwrap();

        let err = store.search("wide", 1).await.unwrap_err();
        assert!(matches!(err, TheoryExplorerError::DimensionMismatch { expected: 3, actual: 4 }));
    }

    #[tokio::test]
    async fn test_stats() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, KeywordProvider::new());
        store.build_from_seed(&[record("n", "north")]).await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.items, 1);
        assert_eq!(stats.status, StoreStatus::Ready);
        assert_eq!(stats.model, "keyword");
    }
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_all_succeed() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&temp_dir, KeywordProvider::new()));
        let seed: Vec<TheoryRecord> = (0..50)
            .map(|i| record(&format!("t{}", i), if i % 2 == 0 { "north" } else { "east" }))
            .collect();
        store.build_from_seed(&seed).await.unwrap();

        for _ in 0..10 {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = store.clone();
                    tokio::spawn(async move { store.save().await })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }
        }

        let reloaded = store_in(&temp_dir, KeywordProvider::new());
        assert!(reloaded.load().await.unwrap());
        assert_eq!(reloaded.len().await, 50);

        let files: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    fn blocked_store(dir: &TempDir, provider: Arc<dyn EmbeddingProvider>) -> TheoryStore {
        // The store's parent directory is a regular file, so every save fails
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        TheoryStore::new(provider, blocker.join("embeddings.json"))
    }

    #[tokio::test]
    async fn test_seed_save_failure_keeps_items_and_stays_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = blocked_store(&temp_dir, KeywordProvider::new());

        let err = store
            .build_from_seed(&[record("n", "north"), record("e", "east")])
            .await
            .unwrap_err();

        assert!(matches!(err, TheoryExplorerError::PersistenceWrite { .. }));
        assert_eq!(store.status().await, StoreStatus::Empty);
        assert_eq!(store.len().await, 2);
        assert!(store.get("e").await.is_some());
    }

    #[tokio::test]
    async fn test_save_failure_leaves_memory_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let store = blocked_store(&temp_dir, KeywordProvider::new());
        let item = store.upsert_theory(&record("n", "north")).await.unwrap();

        let err = store.save().await.unwrap_err();

        assert!(matches!(err, TheoryExplorerError::PersistenceWrite { .. }));
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("n").await, Some(item));
        assert_eq!(store.status().await, StoreStatus::Empty);
    }

    #[tokio::test]
    async fn test_non_finite_vectors_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, KeywordProvider::new());
        store.build_from_seed(&[record("n", "north")]).await.unwrap();

        let err = store.upsert_theory(&record("b", "broken")).await.unwrap_err();
        assert!(matches!(err, TheoryExplorerError::InvalidInput(_)));
        assert_eq!(store.len().await, 1);

        let err = store.search("broken", 1).await.unwrap_err();
        assert!(err.is_embedding());

        // What was saved still loads
        store.save().await.unwrap();
        let reloaded = store_in(&temp_dir, KeywordProvider::new());
        assert!(reloaded.load().await.unwrap());
    }
}
