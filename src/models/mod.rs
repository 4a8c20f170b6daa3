//! Data models
//!
//! Rust structs representing database entities.

mod daily_log;
mod food;
mod nutrition;
mod profile;
mod settings;

pub use daily_log::{recalculate_log_totals, DailyLog, LogBook};
pub use food::{FoodItem, LoggedFoodCreate, LoggedFoodEntry, MealType};
pub use nutrition::Nutrition;
pub use profile::{
    ActivityLevel, Goal, ProfileError, ProfileUpdate, Sex, StoredProfile, UserProfile,
    AGE_RANGE, HEIGHT_CM_RANGE, WEIGHT_KG_RANGE,
};
pub use settings::{validate_reminder_time, Language, UserSettings};

/// Error for a stored text column that no longer parses
pub(crate) fn conversion_error(column: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        format!("invalid {}: {:?}", column, value).into(),
    )
}
