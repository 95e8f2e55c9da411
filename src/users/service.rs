use std::sync::Arc;

use tracing::{info, warn};

use super::store::UserStore;
use super::types::{normalize_email, User, UserPage};
use crate::core::clock::Clock;
use crate::core::errors::{ApiError, ErrorCode, ResultExt};

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 200;

pub struct UserService {
    store: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create_user(&self, name: &str, email: &str) -> Result<User, ApiError> {
        let existing = self
            .store
            .find_by_email(&normalize_email(email))
            .await
            .wrap_err("failed to check existing email")?;
        if existing.is_some() {
            warn!("Rejected user with duplicate email");
            return Err(ApiError::constraint("duplicate email"));
        }

        let user = User::new(name, email, self.clock.now()).wrap_err("failed to create user")?;
        let saved = self.store.save(&user).await.wrap_err("failed to save user")?;
        info!(user_id = saved.id, "User created");
        Ok(saved)
    }

    pub async fn get_user(&self, id: i64) -> Result<User, ApiError> {
        if id <= 0 {
            return Err(ApiError::invalid_parameter("user id must be positive"));
        }
        self.store.find_by_id(id).await.wrap_err("failed to get user")
    }

    /// A `limit` of 0 or above [`MAX_PAGE_LIMIT`] falls back to
    /// [`DEFAULT_PAGE_LIMIT`].
    pub async fn list_users(&self, offset: usize, limit: usize) -> Result<UserPage, ApiError> {
        let limit = if limit == 0 || limit > MAX_PAGE_LIMIT {
            DEFAULT_PAGE_LIMIT
        } else {
            limit
        };

        let users = self
            .store
            .list(offset, limit)
            .await
            .wrap_err_as(ErrorCode::InternalError, "failed to list users")?;
        let total = self.store.count().await.wrap_err("failed to count users")?;

        Ok(UserPage {
            users,
            total,
            offset,
            limit,
        })
    }
}
