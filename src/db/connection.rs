//! Database connection management
//!
//! SQLite connection pool shared by the tool layer.

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OpenFlags, TransactionBehavior};
use thiserror::Error;

/// Database error types
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl Database {
    /// Create a new database connection pool
    pub fn new<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI,
            )
            .with_init(|conn| {
                // Foreign keys carry the food -> day cascade
                conn.execute_batch(
                    "PRAGMA foreign_keys = ON;
                     PRAGMA journal_mode = WAL;
                     PRAGMA synchronous = NORMAL;
                     PRAGMA temp_store = MEMORY;",
                )?;
                Ok(())
            });

        let pool = Pool::builder().max_size(8).build(manager)?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Get a connection from the pool
    pub fn get_conn(&self) -> DbResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Execute a closure with a database connection
    pub fn with_conn<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> DbResult<T>,
    {
        let conn = self.get_conn()?;
        f(&conn)
    }

    /// Run a closure inside a transaction. Commits when it returns Ok; any
    /// error rolls every write back. The write lock is taken up front, so
    /// read-modify-write closures never interleave.
    pub fn transaction<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> DbResult<T>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("scratch.db")).unwrap();
        db.with_conn(|conn| {
            conn.execute_batch("CREATE TABLE kv (k TEXT PRIMARY KEY, v INTEGER NOT NULL)")?;
            Ok(())
        })
        .unwrap();
        (dir, db)
    }

    fn count(db: &Database) -> i64 {
        db.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM kv", [], |r| r.get(0))?))
            .unwrap()
    }

    #[test]
    fn test_transaction_commits() {
        let (_dir, db) = scratch_db();
        let inserted = db
            .transaction(|tx| Ok(tx.execute("INSERT INTO kv (k, v) VALUES ('a', 1)", [])?))
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let (_dir, db) = scratch_db();
        let result = db.transaction(|tx| {
            tx.execute("INSERT INTO kv (k, v) VALUES ('a', 1)", [])?;
            // duplicate key
            tx.execute("INSERT INTO kv (k, v) VALUES ('a', 2)", [])?;
            Ok(())
        });
        assert!(matches!(result, Err(DbError::Sqlite(_))));
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let (_dir, db) = scratch_db();
        let enabled: i64 = db
            .with_conn(|conn| Ok(conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
