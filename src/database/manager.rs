use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::config;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Connection pool setup and schema bootstrap for the on-disk SQLite store.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open the pool described by the application config.
    pub async fn connect() -> Result<SqlitePool, DatabaseError> {
        let db = &config().database;
        Self::connect_at(&db.path, db.max_connections, db.connection_timeout).await
    }

    /// Open a pool at an explicit path, creating the file and parent
    /// directories on first run.
    pub async fn connect_at(
        path: &str,
        max_connections: u32,
        timeout_secs: u64,
    ) -> Result<SqlitePool, DatabaseError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(timeout_secs))
            .connect_with(options)
            .await?;

        info!("Opened database at {}", path);
        Ok(pool)
    }

    /// Create tables and indexes if they do not exist yet. Safe to run on
    /// every startup.
    pub async fn init_schema(pool: &SqlitePool) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS admins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'admin',
                is_active INTEGER NOT NULL DEFAULT 1,
                last_login TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                password TEXT NOT NULL,
                phone TEXT,
                address TEXT,
                role TEXT NOT NULL DEFAULT 'User',
                profile_image TEXT,
                doc1 TEXT,
                doc1_original_name TEXT,
                doc2 TEXT,
                doc2_original_name TEXT,
                doc3 TEXT,
                doc3_original_names TEXT,
                doc4 TEXT,
                doc4_original_names TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        // Emails must be unique among live records only; a soft-deleted user
        // frees their address for reuse.
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email_active
            ON users (email) WHERE is_active = 1
            "#,
        )
        .execute(pool)
        .await?;

        info!("Database schema is up to date");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &SqlitePool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
