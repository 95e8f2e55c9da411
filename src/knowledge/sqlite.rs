//! SQLite-backed knowledge store.
//!
//! Entries live in `inquiry_knowledges`; embeddings are little-endian f32
//! BLOBs and similarity search is an exact scan over every embedded row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::store::KnowledgeStore;
use super::types::{KnowledgeEntry, SimilarityResult};
use crate::core::errors::{ApiError, ErrorCode};
use crate::vector_math;

const UPSERT_SQL: &str = "INSERT INTO inquiry_knowledges
        (instruction, instruction_embedding, response, category, intent, flags,
         created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
     ON CONFLICT(instruction) DO UPDATE SET
        instruction_embedding = excluded.instruction_embedding,
        response = excluded.response,
        category = excluded.category,
        intent = excluded.intent,
        flags = excluded.flags,
        updated_at = excluded.updated_at";

const SELECT_COLUMNS: &str = "id, instruction, instruction_embedding, response, category, \
     intent, flags, created_at, updated_at";

pub struct SqliteKnowledgeStore {
    pool: SqlitePool,
    dimension: Option<usize>,
}

impl SqliteKnowledgeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            dimension: None,
        }
    }

    /// Rejects stored and query embeddings whose length is not `dimension`.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    fn check_dimension(&self, embedding: &[f32], what: &str) -> Result<(), ApiError> {
        match self.dimension {
            Some(expected) if embedding.len() != expected => {
                Err(ApiError::invalid_parameter(format!(
                    "{} has dimension {}, expected {}",
                    what,
                    embedding.len(),
                    expected
                )))
            }
            _ => Ok(()),
        }
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_entry(row: &SqliteRow) -> Result<KnowledgeEntry, ApiError> {
        let embedding: Option<Vec<u8>> = row.try_get("instruction_embedding").map_err(db_error)?;
        let created_at: String = row.try_get("created_at").map_err(db_error)?;
        let updated_at: String = row.try_get("updated_at").map_err(db_error)?;

        Ok(KnowledgeEntry {
            id: Some(row.try_get("id").map_err(db_error)?),
            instruction: row.try_get("instruction").map_err(db_error)?,
            instruction_embedding: embedding.map(|bytes| Self::deserialize_embedding(&bytes)),
            response: row.try_get("response").map_err(db_error)?,
            category: row.try_get("category").map_err(db_error)?,
            intent: row.try_get("intent").map_err(db_error)?,
            flags: row.try_get("flags").map_err(db_error)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

fn db_error(err: sqlx::Error) -> ApiError {
    ApiError::with_source(ErrorCode::InternalError, "knowledge store query failed", err)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            ApiError::with_source(
                ErrorCode::InternalError,
                format!("invalid timestamp '{}' in knowledge store", raw),
                e,
            )
        })
}

#[async_trait]
impl KnowledgeStore for SqliteKnowledgeStore {
    async fn batch_upsert(&self, entries: &[KnowledgeEntry]) -> Result<(), ApiError> {
        if entries.is_empty() {
            return Ok(());
        }

        for entry in entries {
            if let Some(embedding) = &entry.instruction_embedding {
                self.check_dimension(embedding, "instruction embedding")?;
            }
        }

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        for entry in entries {
            let blob = entry
                .instruction_embedding
                .as_deref()
                .map(Self::serialize_embedding);

            sqlx::query(UPSERT_SQL)
                .bind(&entry.instruction)
                .bind(blob)
                .bind(&entry.response)
                .bind(&entry.category)
                .bind(&entry.intent)
                .bind(&entry.flags)
                .bind(entry.created_at.to_rfc3339())
                .bind(entry.updated_at.to_rfc3339())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    ApiError::with_source(
                        ErrorCode::InternalError,
                        format!("failed to upsert inquiry knowledge '{}'", entry.instruction),
                        e,
                    )
                })?;
        }

        tx.commit().await.map_err(db_error)?;
        debug!(entries = entries.len(), "Upserted inquiry knowledge batch");
        Ok(())
    }

    async fn find_similar(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SimilarityResult>, ApiError> {
        if limit == 0 {
            return Err(ApiError::invalid_parameter("limit must be greater than 0"));
        }
        self.check_dimension(query_embedding, "query embedding")?;

        let sql = format!(
            "SELECT {} FROM inquiry_knowledges WHERE instruction_embedding IS NOT NULL",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        let entries = rows
            .iter()
            .map(Self::row_to_entry)
            .collect::<Result<Vec<_>, _>>()?;
        let candidates: Vec<&[f32]> = entries
            .iter()
            .map(|entry| entry.instruction_embedding.as_deref().unwrap_or(&[]))
            .collect();
        let ranked = vector_math::rank_descending(query_embedding, &candidates);

        let mut slots: Vec<Option<KnowledgeEntry>> = entries.into_iter().map(Some).collect();
        let results: Vec<SimilarityResult> = ranked
            .into_iter()
            .take(limit)
            .filter_map(|(idx, score)| {
                slots[idx]
                    .take()
                    .map(|entry| SimilarityResult { entry, score })
            })
            .collect();

        if results.is_empty() {
            return Err(ApiError::not_found("no similar inquiry knowledge found"));
        }
        Ok(results)
    }

    async fn find_by_instruction(
        &self,
        instruction: &str,
    ) -> Result<Option<KnowledgeEntry>, ApiError> {
        let sql = format!(
            "SELECT {} FROM inquiry_knowledges WHERE instruction = ?1",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(instruction.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref().map(Self::row_to_entry).transpose()
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inquiry_knowledges")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(count.max(0) as usize)
    }
}
