//! FitCo Tools module
//!
//! MCP tool implementations for profiles, settings, food logging and progress.

pub mod food_log;
pub mod profile;
pub mod progress;
pub mod reports;
pub mod settings;
pub mod status;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::db::Database;

    /// A migrated database in a fresh temp directory. Keep the directory
    /// alive for as long as the database is used.
    pub fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = crate::db::open_and_migrate(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }
}
