//! Database module
//!
//! Handles SQLite connection pooling, migrations and the database location.

pub mod connection;
pub mod migrations;

use std::path::PathBuf;

pub use connection::{Database, DbError, DbResult};

/// Environment variable overriding the database location
pub const DATABASE_PATH_ENV: &str = "FITCO_DATABASE_PATH";

/// Get the database path from the environment or fall back to `data/fitco.db`
/// next to the project root.
pub fn database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            path.push("fitco.db");
            path
        })
}

/// Open the database at `path`, creating parent directories and running migrations.
pub fn open_and_migrate(path: &std::path::Path) -> Result<Database, Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::new(path)?;
    database.with_conn(|conn| {
        migrations::run_migrations(conn)?;
        let version = migrations::get_schema_version(conn)?;
        tracing::info!(version, path = %path.display(), "database ready");
        Ok(())
    })?;

    Ok(database)
}
