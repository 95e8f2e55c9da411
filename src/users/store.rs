use async_trait::async_trait;

use super::types::User;
use crate::core::errors::ApiError;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists `user` and returns it with its assigned id. A taken email is a
    /// `ConstraintError`.
    async fn save(&self, user: &User) -> Result<User, ApiError>;

    async fn find_by_id(&self, id: i64) -> Result<User, ApiError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    /// Users ordered by creation, oldest first.
    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<User>, ApiError>;

    async fn count(&self) -> Result<usize, ApiError>;
}
