//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- USER PROFILES
        -- Biometric inputs for goal calculation, one row per user
        -- ============================================
        CREATE TABLE user_profiles (
            user_id TEXT PRIMARY KEY,
            age INTEGER NOT NULL CHECK(age BETWEEN 13 AND 120),
            height_cm REAL NOT NULL CHECK(height_cm BETWEEN 100 AND 250),
            weight_kg REAL NOT NULL CHECK(weight_kg BETWEEN 30 AND 300),
            sex TEXT NOT NULL CHECK(sex IN ('male', 'female')),
            activity_level TEXT NOT NULL,
            goal TEXT NOT NULL,
            target_weight_kg REAL,               -- only for lose/gain goals
            medical_conditions TEXT NOT NULL DEFAULT '',
            allergies TEXT NOT NULL DEFAULT '',

            -- Cached at save time (rounded)
            bmr REAL NOT NULL DEFAULT 0,
            tdee REAL NOT NULL DEFAULT 0,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- USER SETTINGS
        -- Cached nutrition targets and app preferences
        -- ============================================
        CREATE TABLE user_settings (
            user_id TEXT PRIMARY KEY,
            weight_kg REAL NOT NULL DEFAULT 70,
            calorie_goal INTEGER NOT NULL DEFAULT 2000,
            protein_goal_g INTEGER NOT NULL DEFAULT 150,
            carbs_goal_g INTEGER NOT NULL DEFAULT 250,
            fats_goal_g INTEGER NOT NULL DEFAULT 67,
            daily_reminders INTEGER NOT NULL DEFAULT 1,  -- boolean
            reminder_time TEXT NOT NULL DEFAULT '20:00',
            language TEXT NOT NULL DEFAULT 'en' CHECK(language IN ('en', 'ar')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- DAILY LOGS
        -- One row per user per calendar day, with cached totals
        -- ============================================
        CREATE TABLE daily_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,                  -- ISO date: "2025-01-09"

            cached_calories REAL NOT NULL DEFAULT 0,
            cached_protein REAL NOT NULL DEFAULT 0,
            cached_carbs REAL NOT NULL DEFAULT 0,
            cached_fats REAL NOT NULL DEFAULT 0,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(user_id, date)
        );

        CREATE INDEX idx_daily_logs_user_date ON daily_logs(user_id, date);

        -- ============================================
        -- LOGGED FOODS
        -- Food entries owned by a daily log (snapshot of the food item)
        -- ============================================
        CREATE TABLE logged_foods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            daily_log_id INTEGER NOT NULL REFERENCES daily_logs(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            brand TEXT,
            serving_size TEXT,

            -- Nutrition per 100 g/ml reference
            calories_per_100 REAL NOT NULL DEFAULT 0,
            protein_per_100 REAL NOT NULL DEFAULT 0,
            carbs_per_100 REAL NOT NULL DEFAULT 0,
            fats_per_100 REAL NOT NULL DEFAULT 0,

            quantity_multiplier REAL NOT NULL CHECK(quantity_multiplier >= 0),
            meal_type TEXT NOT NULL CHECK(meal_type IN ('breakfast', 'lunch', 'dinner', 'snacks')),
            logged_at TEXT NOT NULL              -- RFC 3339 timestamp
        );

        CREATE INDEX idx_logged_foods_log ON logged_foods(daily_log_id);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
