//! Settings MCP Tools
//!
//! Reminder and language preferences, plus the two goal edits that bypass
//! the profile: a directly typed calorie goal and the account goal sync.

use crate::db::Database;
use crate::models::{validate_reminder_time, Language, StoredProfile, UserSettings};
use crate::nutrition::{
    compute_bodyweight_split, compute_from_calorie_goal, compute_from_profile, NutritionTargets,
};

/// Get settings, creating defaults on first access
pub fn get_settings(db: &Database, user_id: &str) -> Result<UserSettings, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    UserSettings::get_or_default(&conn, user_id)
        .map_err(|e| format!("Failed to get settings: {}", e))
}

/// Update reminder and language preferences
pub fn update_settings(
    db: &Database,
    user_id: &str,
    daily_reminders: Option<bool>,
    reminder_time: Option<String>,
    language: Option<&str>,
) -> Result<UserSettings, String> {
    if let Some(time) = reminder_time.as_deref() {
        validate_reminder_time(time)?;
    }
    let language = language
        .map(|l| Language::from_str(l).ok_or_else(|| format!("Unknown language: {} (expected en or ar)", l)))
        .transpose()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let mut settings = UserSettings::get_or_default(&conn, user_id)
        .map_err(|e| format!("Failed to get settings: {}", e))?;

    if let Some(daily_reminders) = daily_reminders {
        settings.daily_reminders = daily_reminders;
    }
    if let Some(reminder_time) = reminder_time {
        settings.reminder_time = reminder_time;
    }
    if let Some(language) = language {
        settings.language = language;
    }

    settings
        .save(&conn, user_id)
        .map_err(|e| format!("Failed to save settings: {}", e))?;

    Ok(settings)
}

/// Set the calorie goal directly; macros are re-derived 30/40/30 from it
pub fn set_calorie_goal(db: &Database, user_id: &str, calorie_goal: u32) -> Result<UserSettings, String> {
    let targets = NutritionTargets::new(calorie_goal, compute_from_calorie_goal(calorie_goal));

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let settings = UserSettings::apply_targets(&conn, user_id, None, targets)
        .map_err(|e| format!("Failed to save settings: {}", e))?;

    tracing::info!(user_id, calorie_goal, "calorie goal set manually");
    Ok(settings)
}

/// Recompute goals the way the account screen does: the calorie goal from
/// the stored profile, but macros from bodyweight (2 g protein per kg, fats
/// 25%, carbs the remainder) instead of the profile split.
pub fn sync_account_goals(db: &Database, user_id: &str) -> Result<UserSettings, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let stored = StoredProfile::get(&conn, user_id)
        .map_err(|e| format!("Failed to get profile: {}", e))?
        .ok_or_else(|| format!("No profile saved for user: {}", user_id))?;
    let profile = &stored.profile;

    let calorie_goal = compute_from_profile(profile).calorie_goal;
    let targets = NutritionTargets::new(
        calorie_goal,
        compute_bodyweight_split(calorie_goal, profile.weight_kg),
    );

    let settings = UserSettings::apply_targets(&conn, user_id, Some(profile.weight_kg), targets)
        .map_err(|e| format!("Failed to save settings: {}", e))?;

    tracing::info!(user_id, weight_kg = profile.weight_kg, calorie_goal, "account goals synced");
    Ok(settings)
}
