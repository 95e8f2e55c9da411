//! KnowledgeStore trait: the persistence seam for knowledge entries.
//!
//! The primary implementation is `SqliteKnowledgeStore` in the `sqlite`
//! module.

use async_trait::async_trait;

use super::types::{KnowledgeEntry, SimilarityResult};
use crate::core::errors::ApiError;

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Insert-or-update every entry keyed by `instruction`, in one transaction.
    ///
    /// A conflict on `instruction` updates the embedding, response, category,
    /// intent, flags and `updated_at` of the existing row; `created_at` and
    /// `id` are kept. Any other failure rolls the whole call back.
    async fn batch_upsert(&self, entries: &[KnowledgeEntry]) -> Result<(), ApiError>;

    /// Embedded entries most similar to `query_embedding`, best first.
    ///
    /// Fails with `InvalidParameter` for `limit == 0` and with `NotFound`
    /// when no embedded entry exists.
    async fn find_similar(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SimilarityResult>, ApiError>;

    async fn find_by_instruction(
        &self,
        instruction: &str,
    ) -> Result<Option<KnowledgeEntry>, ApiError>;

    /// Total number of stored entries, embedded or not.
    async fn count(&self) -> Result<usize, ApiError>;
}
