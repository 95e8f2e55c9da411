use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::csv_source;
use crate::core::cancel::run_cancellable;
use crate::core::clock::Clock;
use crate::core::errors::{ApiError, ErrorCode, ResultExt};
use crate::knowledge::{KnowledgeEntry, KnowledgeStore, RawKnowledgeRecord};
use crate::llm::EmbeddingGateway;

pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub entries_saved: usize,
    pub batches: usize,
}

/// Loads the tabular source, embeds every instruction and upserts the result
/// batch by batch. Batches run strictly one after another; a failed batch
/// stops the run but leaves earlier batches committed.
pub struct IngestionPipeline {
    embedder: Arc<dyn EmbeddingGateway>,
    store: Arc<dyn KnowledgeStore>,
    clock: Arc<dyn Clock>,
    source_path: PathBuf,
    batch_size: usize,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingGateway>,
        store: Arc<dyn KnowledgeStore>,
        clock: Arc<dyn Clock>,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            embedder,
            store,
            clock,
            source_path: source_path.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, ApiError> {
        if batch_size == 0 {
            return Err(ApiError::invalid_parameter("batch size must be greater than 0"));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    /// Ingests the configured source file.
    pub async fn embed_origins(
        &self,
        cancel: &CancellationToken,
    ) -> Result<IngestionReport, ApiError> {
        info!(source = %self.source_path.display(), "Loading inquiry knowledge source");
        let records = csv_source::read_records(&self.source_path)
            .await
            .wrap_err("failed to load inquiry knowledge source")?;
        self.run(records, cancel).await
    }

    pub async fn run(
        &self,
        records: Vec<RawKnowledgeRecord>,
        cancel: &CancellationToken,
    ) -> Result<IngestionReport, ApiError> {
        let mut report = IngestionReport {
            rows_read: records.len(),
            ..Default::default()
        };

        let now = self.clock.now();
        let mut entries = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            match record.into_entry(now) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    report.rows_skipped += 1;
                    warn!(row = index + 1, error = %err, "Skipping invalid knowledge record");
                }
            }
        }

        for (index, chunk) in entries.chunks(self.batch_size).enumerate() {
            let batch_no = index + 1;
            let saved = self
                .process_batch(chunk.to_vec(), cancel)
                .await
                .wrap_err_as(
                    ErrorCode::InternalError,
                    &format!("failed to process batch {}", batch_no),
                )?;
            report.entries_saved += saved;
            report.batches += 1;
            debug!(batch = batch_no, entries = saved, "Persisted knowledge batch");
        }

        info!(
            rows = report.rows_read,
            skipped = report.rows_skipped,
            saved = report.entries_saved,
            batches = report.batches,
            "Inquiry knowledge ingestion finished"
        );
        Ok(report)
    }

    async fn process_batch(
        &self,
        mut batch: Vec<KnowledgeEntry>,
        cancel: &CancellationToken,
    ) -> Result<usize, ApiError> {
        let instructions: Vec<String> = batch.iter().map(|e| e.instruction.clone()).collect();
        let embeddings = run_cancellable(
            cancel,
            "embedding",
            self.embedder.embed_batch(&instructions),
        )
        .await?;

        if embeddings.len() != batch.len() {
            return Err(ApiError::new(
                ErrorCode::InternalError,
                format!(
                    "embedding count mismatch: expected {}, got {}",
                    batch.len(),
                    embeddings.len()
                ),
            ));
        }

        let stamped_at = self.clock.now();
        for (entry, embedding) in batch.iter_mut().zip(embeddings) {
            entry.instruction_embedding = Some(embedding);
            entry.created_at = stamped_at;
            entry.updated_at = stamped_at;
        }

        run_cancellable(cancel, "persisting", self.store.batch_upsert(&batch)).await?;
        Ok(batch.len())
    }
}
