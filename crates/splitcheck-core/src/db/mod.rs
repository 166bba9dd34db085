//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `attempts` - Per-user extraction attempt records
//! - `policy` - The global rate limit policy row

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::Result;

mod attempts;
mod policy;


pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (or create) a database file and run migrations
    pub fn open(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(4).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Create a throwaway database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because every pooled
    /// connection would otherwise see its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "splitcheck_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::open(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            -- Write-ahead logging: readers don't block the single writer
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            -- Extraction attempts, one row per user
            CREATE TABLE IF NOT EXISTS user_attempts (
                user_id TEXT PRIMARY KEY,
                last_attempt_ms INTEGER NOT NULL,
                attempts INTEGER NOT NULL CHECK (attempts >= 1),
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Global rate limit policy (single row)
            CREATE TABLE IF NOT EXISTS receipt_policy (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                cooldown_window_ms INTEGER NOT NULL,
                max_attempts_per_window INTEGER NOT NULL,
                extraction_prompt TEXT NOT NULL DEFAULT '',
                model_identifier TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;

        info!(path = %self.db_path, "Database migrations complete");
        Ok(())
    }
}
