//! Batch ingestion of a catalog into a vector index.

use crate::catalog::{Catalog, SkippedRecord};
use crate::error::IngestError;
use apirec_core::config::IngestConfig;
use apirec_core::ApiRecord;
use apirec_memory::{EmbeddingService, IndexedEntry, VectorIndex};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How records are grouped and paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Records per upsert.
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub delay: Duration,
    /// Concurrent embedding calls within one batch.
    pub concurrency: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 10,
            delay: Duration::from_secs(1),
            concurrency: 1,
        }
    }
}

impl BatchPolicy {
    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the inter-batch delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set in-batch embedding concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    fn validate(&self) -> Result<(), IngestError> {
        if self.batch_size == 0 {
            return Err(IngestError::InvalidPolicy(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(IngestError::InvalidPolicy(
                "concurrency must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&IngestConfig> for BatchPolicy {
    fn from(config: &IngestConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            delay: Duration::from_millis(config.batch_delay_ms),
            concurrency: config.concurrency,
        }
    }
}

/// Index provisioning before ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IngestMode {
    /// Create the index if absent and overwrite entries by id.
    #[default]
    Incremental,
    /// Delete and recreate the index first, leaving no orphaned entries.
    Reset,
}

/// A batch whose upsert failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedBatch {
    /// One-based batch number.
    pub batch: usize,
    /// Ids that were not written.
    pub ids: Vec<String>,
    /// Provider error.
    pub reason: String,
}

/// Summary of an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Catalog rows read.
    pub rows_read: usize,
    /// Entries written to the index.
    pub upserted: usize,
    /// Records skipped for blank cells or failed embeddings.
    pub skipped: Vec<SkippedRecord>,
    /// Batches whose upsert failed.
    pub failed_batches: Vec<FailedBatch>,
    /// Batches processed.
    pub batches: usize,
    /// Whether the index was created by this run.
    pub index_created: bool,
}

impl IngestReport {
    /// True when every row made it into the index.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed_batches.is_empty()
    }

    /// Number of records that did not make it into the index.
    pub fn not_ingested(&self) -> usize {
        self.skipped.len()
            + self
                .failed_batches
                .iter()
                .map(|b| b.ids.len())
                .sum::<usize>()
    }
}

/// Progress of one processed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// One-based batch number.
    pub batch: usize,
    /// Total batches in this run.
    pub total_batches: usize,
    /// Records in the batch.
    pub records: usize,
    /// Entries written from this batch.
    pub upserted: usize,
    /// Records whose embedding failed.
    pub skipped: usize,
    /// Whether the upsert failed.
    pub failed: bool,
}

type ProgressFn = Arc<dyn Fn(&BatchProgress) + Send + Sync>;

/// Embeds catalog records and upserts them in paced batches.
pub struct IngestionPipeline {
    embeddings: EmbeddingService,
    index: Arc<dyn VectorIndex>,
    policy: BatchPolicy,
    progress: Option<ProgressFn>,
}

impl IngestionPipeline {
    /// Create a pipeline with the default batch policy.
    pub fn new(embeddings: EmbeddingService, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embeddings,
            index,
            policy: BatchPolicy::default(),
            progress: None,
        }
    }

    /// Set the batch policy.
    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Receive a callback after every batch.
    pub fn with_progress(mut self, progress: impl Fn(&BatchProgress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Batch policy in use.
    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Load a catalog file and ingest it. Schema errors abort before the
    /// index is touched.
    pub async fn run_path(&self, path: &Path, mode: IngestMode) -> Result<IngestReport, IngestError> {
        let catalog = Catalog::load(path)?;
        self.run(&catalog, mode).await
    }

    /// Ingest a validated catalog.
    pub async fn run(&self, catalog: &Catalog, mode: IngestMode) -> Result<IngestReport, IngestError> {
        self.policy.validate()?;

        let index_created = self.provision(mode).await?;

        let records = catalog.records();
        let total_batches = records.len().div_ceil(self.policy.batch_size);
        let mut report = IngestReport {
            rows_read: catalog.rows(),
            skipped: catalog.skipped().to_vec(),
            index_created,
            ..Default::default()
        };

        info!(
            index = %self.index.spec().name,
            records = records.len(),
            batches = total_batches,
            batch_size = self.policy.batch_size,
            "Starting ingestion"
        );

        for (i, batch) in records.chunks(self.policy.batch_size).enumerate() {
            if i > 0 && !self.policy.delay.is_zero() {
                tokio::time::sleep(self.policy.delay).await;
            }

            let number = i + 1;
            let (entries, skipped) = self.embed_batch(batch).await;
            let skipped_count = skipped.len();
            report.skipped.extend(skipped);

            let mut upserted = 0;
            let mut failed = false;
            if !entries.is_empty() {
                let ids: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();
                match self.index.upsert(entries).await {
                    Ok(written) => upserted = written,
                    Err(e) => {
                        warn!(batch = number, error = %e, "Batch upsert failed");
                        failed = true;
                        report.failed_batches.push(FailedBatch {
                            batch: number,
                            ids,
                            reason: e.to_string(),
                        });
                    }
                }
            }

            report.upserted += upserted;
            report.batches += 1;

            if let Some(progress) = &self.progress {
                progress(&BatchProgress {
                    batch: number,
                    total_batches,
                    records: batch.len(),
                    upserted,
                    skipped: skipped_count,
                    failed,
                });
            }
        }

        info!(
            upserted = report.upserted,
            skipped = report.skipped.len(),
            failed_batches = report.failed_batches.len(),
            "Ingestion finished"
        );

        Ok(report)
    }

    async fn provision(&self, mode: IngestMode) -> Result<bool, IngestError> {
        if mode == IngestMode::Reset {
            let existed = self.index.delete().await.map_err(IngestError::Provision)?;
            if existed {
                info!(index = %self.index.spec().name, "Deleted existing index");
            }
        }
        self.index
            .ensure_exists()
            .await
            .map_err(IngestError::Provision)
    }

    /// Embed a batch in record order; failures are returned as skips.
    async fn embed_batch(&self, batch: &[ApiRecord]) -> (Vec<IndexedEntry>, Vec<SkippedRecord>) {
        let results: Vec<_> = stream::iter(batch)
            .map(|record| async move {
                let result = self.embeddings.embed(&record.embedding_text()).await;
                (record, result)
            })
            .buffered(self.policy.concurrency)
            .collect()
            .await;

        let mut entries = Vec::with_capacity(batch.len());
        let mut skipped = Vec::new();
        for (record, result) in results {
            match result {
                Ok(vector) => {
                    entries.push(IndexedEntry::new(&record.id, vector, record.metadata()));
                }
                Err(e) => {
                    warn!(id = %record.id, name = %record.name, error = %e, "Skipping record, embedding failed");
                    skipped.push(SkippedRecord {
                        id: record.id.clone(),
                        reason: format!("embedding failed: {}", e),
                    });
                }
            }
        }
        (entries, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEmbedder, RecordingIndex};
    use apirec_memory::RetryConfig;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    fn catalog(value: serde_json::Value) -> Catalog {
        Catalog::parse_json(&value.to_string()).unwrap()
    }

    fn pipeline(embedder: FakeEmbedder, index: Arc<RecordingIndex>) -> IngestionPipeline {
        let embeddings = EmbeddingService::new(Arc::new(embedder)).with_retry(RetryConfig::none());
        IngestionPipeline::new(embeddings, index)
            .with_policy(BatchPolicy::default().with_delay(Duration::ZERO))
    }

    #[tokio::test]
    async fn test_two_rows_one_upsert() {
        let b_text = "API名称: B\n描述: desc B\n接口: /b";
        let embedder = FakeEmbedder::new()
            .with_vector("API名称: A\n描述: desc A", vec![1.0, 0.0, 0.0])
            .with_vector(b_text, vec![0.0, 1.0, 0.0]);
        let index = Arc::new(RecordingIndex::new());

        let report = pipeline(embedder, index.clone())
            .run(
                &catalog(json!([
                    {"api_name": "A", "description": "desc A"},
                    {"api_name": "B", "description": "desc B", "endpoint": "/b"}
                ])),
                IngestMode::Incremental,
            )
            .await
            .unwrap();

        assert_eq!(report.upserted, 2);
        assert_eq!(report.batches, 1);
        assert!(report.is_complete());
        assert_eq!(index.upsert_calls(), vec![vec!["0".to_string(), "1".to_string()]]);

        let matches = index.query(&[0.0, 1.0, 0.0], 1).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(
            matches[0].metadata.as_ref().unwrap().endpoint.as_deref(),
            Some("/b")
        );
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let index = Arc::new(RecordingIndex::new());
        let rows = catalog(json!([
            {"api_name": "A", "description": "desc A"},
            {"api_name": "B", "description": "desc B", "endpoint": "/b"},
            {"api_name": "C", "description": "desc C"}
        ]));

        pipeline(FakeEmbedder::new(), index.clone())
            .run(&rows, IngestMode::Incremental)
            .await
            .unwrap();
        let first = index.query(&[1.0, 0.5, 0.5], 10).await.unwrap();

        let report = pipeline(FakeEmbedder::new(), index.clone())
            .run(&rows, IngestMode::Incremental)
            .await
            .unwrap();
        let second = index.query(&[1.0, 0.5, 0.5], 10).await.unwrap();

        assert!(!report.index_created);
        assert_eq!(index.count().await.unwrap(), 3);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_batches_preserve_order_and_size() {
        let index = Arc::new(RecordingIndex::new());
        let rows: Vec<serde_json::Value> = (0..5)
            .map(|i| json!({"api_name": format!("API {}", i), "description": format!("desc {}", i)}))
            .collect();

        let progress = Arc::new(Mutex::new(Vec::new()));
        let seen = progress.clone();
        let report = pipeline(FakeEmbedder::new(), index.clone())
            .with_policy(
                BatchPolicy::default()
                    .with_batch_size(2)
                    .with_delay(Duration::ZERO)
                    .with_concurrency(3),
            )
            .with_progress(move |p| seen.lock().unwrap().push((p.batch, p.total_batches, p.upserted)))
            .run(&catalog(json!(rows)), IngestMode::Incremental)
            .await
            .unwrap();

        assert_eq!(report.batches, 3);
        assert_eq!(
            index.upsert_calls(),
            vec![
                vec!["0".to_string(), "1".to_string()],
                vec!["2".to_string(), "3".to_string()],
                vec!["4".to_string()],
            ]
        );
        assert_eq!(*progress.lock().unwrap(), vec![(1, 3, 2), (2, 3, 2), (3, 3, 1)]);
    }

    #[tokio::test]
    async fn test_failed_embedding_is_skipped_and_reported() {
        let embedder = FakeEmbedder::new().failing_on("API名称: B\n描述: desc B");
        let index = Arc::new(RecordingIndex::new());

        let report = pipeline(embedder, index.clone())
            .run(
                &catalog(json!([
                    {"api_name": "A", "description": "desc A"},
                    {"api_name": "B", "description": "desc B"},
                    {"api_name": "C", "description": "desc C"}
                ])),
                IngestMode::Incremental,
            )
            .await
            .unwrap();

        assert_eq!(report.upserted, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].id, "1");
        assert!(report.skipped[0].reason.starts_with("embedding failed"));
        assert_eq!(index.upsert_calls(), vec![vec!["0".to_string(), "2".to_string()]]);
    }

    #[tokio::test]
    async fn test_failed_upsert_does_not_abort_run() {
        let index = Arc::new(RecordingIndex::new());
        index.fail_upserts.store(true, Ordering::SeqCst);

        let report = pipeline(FakeEmbedder::new(), index.clone())
            .with_policy(BatchPolicy::default().with_batch_size(1).with_delay(Duration::ZERO))
            .run(
                &catalog(json!([
                    {"api_name": "A", "description": "desc A"},
                    {"api_name": "B", "description": "desc B"}
                ])),
                IngestMode::Incremental,
            )
            .await
            .unwrap();

        assert_eq!(report.upserted, 0);
        assert_eq!(report.batches, 2);
        assert_eq!(report.failed_batches.len(), 2);
        assert_eq!(report.failed_batches[1].ids, vec!["1".to_string()]);
        assert_eq!(report.not_ingested(), 2);
    }

    #[tokio::test]
    async fn test_reset_removes_orphans() {
        let index = Arc::new(RecordingIndex::new());
        pipeline(FakeEmbedder::new(), index.clone())
            .run(
                &catalog(json!([
                    {"api_name": "A", "description": "desc A"},
                    {"api_name": "B", "description": "desc B"},
                    {"api_name": "C", "description": "desc C"}
                ])),
                IngestMode::Incremental,
            )
            .await
            .unwrap();

        let report = pipeline(FakeEmbedder::new(), index.clone())
            .run(
                &catalog(json!([{"api_name": "A", "description": "desc A"}])),
                IngestMode::Reset,
            )
            .await
            .unwrap();

        assert!(report.index_created);
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_blank_rows_reported_without_embedding() {
        let embedder = FakeEmbedder::new();
        let index = Arc::new(RecordingIndex::new());
        let embedder = Arc::new(embedder);
        let embeddings = EmbeddingService::new(embedder.clone());
        let pipeline = IngestionPipeline::new(embeddings, index.clone())
            .with_policy(BatchPolicy::default().with_delay(Duration::ZERO));

        let report = pipeline
            .run(
                &catalog(json!([
                    {"api_name": "A", "description": ""},
                    {"api_name": "B", "description": "desc B"}
                ])),
                IngestMode::Incremental,
            )
            .await
            .unwrap();

        assert_eq!(report.rows_read, 2);
        assert_eq!(report.upserted, 1);
        assert_eq!(report.skipped[0].id, "0");
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_id_collisions_are_reported_not_overwritten() {
        let index = Arc::new(RecordingIndex::new());

        let report = pipeline(FakeEmbedder::new(), index.clone())
            .run(
                &catalog(json!([
                    {"id": "1", "api_name": "A", "description": "desc A"},
                    {"api_name": "B", "description": "desc B"},
                    {"id": "1", "api_name": "C", "description": "desc C"}
                ])),
                IngestMode::Incremental,
            )
            .await
            .unwrap();

        assert_eq!(report.upserted, 1);
        assert_eq!(index.count().await.unwrap(), report.upserted);
        assert_eq!(index.upsert_calls(), vec![vec!["1".to_string()]]);
        assert!(!report.is_complete());
        assert_eq!(report.not_ingested(), 2);
    }

    #[tokio::test]
    async fn test_zero_batch_size_rejected() {
        let index = Arc::new(RecordingIndex::new());
        let err = pipeline(FakeEmbedder::new(), index)
            .with_policy(BatchPolicy::default().with_batch_size(0))
            .run(&Catalog::default(), IngestMode::Incremental)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidPolicy(_)));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = BatchPolicy::from(&IngestConfig::default());
        assert_eq!(policy, BatchPolicy::default());
    }
}
