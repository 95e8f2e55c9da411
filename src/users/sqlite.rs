use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::store::UserStore;
use super::types::User;
use crate::core::errors::{ApiError, ErrorCode};

pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &SqliteRow) -> Result<User, ApiError> {
        let created_at: String = row.try_get("created_at").map_err(db_error)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| {
                ApiError::with_source(ErrorCode::InternalError, "invalid user timestamp", e)
            })?;

        Ok(User {
            id: row.try_get("id").map_err(db_error)?,
            name: row.try_get("name").map_err(db_error)?,
            email: row.try_get("email").map_err(db_error)?,
            created_at,
        })
    }
}

fn db_error(err: sqlx::Error) -> ApiError {
    ApiError::with_source(ErrorCode::InternalError, "user store query failed", err)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn save(&self, user: &User) -> Result<User, ApiError> {
        let result = sqlx::query("INSERT INTO users (name, email, created_at) VALUES (?1, ?2, ?3)")
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.created_at.to_rfc3339())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(User {
                id: done.last_insert_rowid(),
                ..user.clone()
            }),
            Err(err) if is_unique_violation(&err) => Err(ApiError::with_source(
                ErrorCode::ConstraintError,
                "duplicate email",
                err,
            )),
            Err(err) => Err(db_error(err)),
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<User, ApiError> {
        let row = sqlx::query("SELECT id, name, email, created_at FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match row {
            Some(row) => Self::row_to_user(&row),
            None => Err(ApiError::not_found(format!("user {} not found", id))),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let row = sqlx::query("SELECT id, name, email, created_at FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<User>, ApiError> {
        let rows = sqlx::query(
            "SELECT id, name, email, created_at FROM users
             ORDER BY created_at ASC, id ASC
             LIMIT ?1 OFFSET ?2",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(Self::row_to_user).collect()
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(count.max(0) as usize)
    }
}
