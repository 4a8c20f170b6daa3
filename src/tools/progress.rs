//! Progress MCP Tools
//!
//! Streaks, the weekly window and derived insights for a user, measured
//! against the targets in their settings.

use serde::Serialize;

use crate::db::Database;
use crate::models::{DailyLog, Goal, Nutrition, StoredProfile, UserSettings};
use crate::nutrition::dates::{days_before, format_iso_date, parse_or_today};
use crate::nutrition::insights::percent_of_goal;
use crate::nutrition::progress::is_logged;
use crate::nutrition::{
    snapshot, GoalDirection, NutritionTargets, ProgressSnapshot, StreakMilestone, WeeklyInsights,
};

/// Today's intake against the targets
#[derive(Debug, Serialize)]
pub struct TodaySummary {
    pub date: String,
    pub totals: Nutrition,
    pub percent_of_calorie_goal: u32,
}

/// Response for get_progress
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub today: TodaySummary,
    pub targets: NutritionTargets,
    pub progress: ProgressSnapshot,
    pub milestone: StreakMilestone,
    pub insights: WeeklyInsights,
}

/// Progress for a user as of `today` (the current UTC date when absent)
pub fn get_progress(db: &Database, user_id: &str, today: Option<&str>) -> Result<ProgressResponse, String> {
    let today = parse_or_today(today)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let logs = DailyLog::load_all(&conn, user_id)
        .map_err(|e| format!("Failed to load logs: {}", e))?;
    let settings = UserSettings::get_or_default(&conn, user_id)
        .map_err(|e| format!("Failed to get settings: {}", e))?;
    let goal = StoredProfile::get(&conn, user_id)
        .map_err(|e| format!("Failed to get profile: {}", e))?
        .map(|p| p.profile.goal)
        .unwrap_or(Goal::MaintainWeight);

    let progress = snapshot(&logs, today);
    let insights = WeeklyInsights::new(&progress.weekly_data, settings.calorie_goal, GoalDirection::from(goal));
    let streak_end = if is_logged(&logs, today) {
        today
    } else {
        days_before(today, 1).unwrap_or(today)
    };
    let milestone = StreakMilestone::new(progress.current_streak, streak_end);

    let totals = logs.get(&today).map(|log| log.totals()).unwrap_or_default();

    Ok(ProgressResponse {
        today: TodaySummary {
            date: format_iso_date(today),
            totals,
            percent_of_calorie_goal: percent_of_goal(totals.calories, settings.calorie_goal as f64),
        },
        targets: settings.targets(),
        progress,
        milestone,
        insights,
    })
}
