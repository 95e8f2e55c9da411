//! SQLite pool construction and schema bootstrap.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::core::errors::{ApiError, ErrorCode};

pub async fn connect(db_path: &Path, max_connections: u32) -> Result<SqlitePool, ApiError> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            ApiError::with_source(
                ErrorCode::InternalError,
                format!("failed to create database directory {}", parent.display()),
                e,
            )
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(|e| {
            ApiError::with_source(ErrorCode::InternalError, "failed to connect to database", e)
        })?;

    init_schema(&pool).await?;
    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), ApiError> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS inquiry_knowledges (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            instruction TEXT NOT NULL UNIQUE CHECK (length(instruction) > 0),
            instruction_embedding BLOB,
            response TEXT NOT NULL CHECK (length(response) > 0),
            category TEXT,
            intent TEXT,
            flags TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at)",
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| {
                ApiError::with_source(ErrorCode::InternalError, "failed to initialize schema", e)
            })?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let path = std::env::temp_dir().join(format!("inquiry-test-{}.db", uuid::Uuid::new_v4()));
    connect(&path, 4).await.unwrap()
}
