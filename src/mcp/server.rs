//! FitCo MCP Server Implementation
//!
//! Implements the MCP server with all FitCo tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::tools::food_log::{self, FoodInput, Portion};
use crate::tools::profile::{self, ProfileInput};
use crate::tools::status::StatusTracker;
use crate::tools::{progress, reports, settings};

/// FitCo MCP Service
#[derive(Clone)]
pub struct FitcoService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<FitcoService>,
}

impl FitcoService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found_body(what: &str, user_id: &str) -> serde_json::Value {
    serde_json::json!({ "error": format!("{} not found", what), "user_id": user_id })
}

fn not_found(what: &str, user_id: &str) -> Result<CallToolResult, McpError> {
    to_json(&not_found_body(what, user_id))
}

// ============================================================================
// Profile Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UserParams {
    /// Opaque identifier of the user
    pub user_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProfileParams {
    pub user_id: String,
    /// Age in years (13-120)
    pub age: Option<u32>,
    /// Height in centimetres (100-250)
    pub height_cm: Option<f64>,
    /// Weight in kilograms (30-300)
    pub weight_kg: Option<f64>,
    /// male or female
    pub sex: Option<String>,
    /// sedentary, lightly_active, moderately_active, very_active, extremely_active
    pub activity_level: Option<String>,
    /// lose_weight, maintain_weight, gain_weight, build_muscle
    pub goal: Option<String>,
    /// Required when losing or gaining weight
    pub target_weight_kg: Option<f64>,
    pub medical_conditions: Option<String>,
    pub allergies: Option<String>,
}

impl ProfileParams {
    fn split(self) -> (String, ProfileInput) {
        let input = ProfileInput {
            age: self.age,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            sex: self.sex,
            activity_level: self.activity_level,
            goal: self.goal,
            target_weight_kg: self.target_weight_kg,
            medical_conditions: self.medical_conditions,
            allergies: self.allergies,
        };
        (self.user_id, input)
    }
}

// ============================================================================
// Settings Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateSettingsParams {
    pub user_id: String,
    pub daily_reminders: Option<bool>,
    /// Reminder time as HH:MM
    pub reminder_time: Option<String>,
    /// en or ar
    pub language: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetCalorieGoalParams {
    pub user_id: String,
    pub calorie_goal: u32,
}

// ============================================================================
// Food Log Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ParseServingParams {
    /// Free-text serving size, e.g. "1/2 cup" or "30g"
    pub serving_size: String,
    /// Food name, used to offer food-specific units
    pub food_name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogFoodParams {
    pub user_id: String,
    /// YYYY-MM-DD, defaults to today (UTC)
    pub date: Option<String>,
    /// breakfast, lunch, dinner, snacks
    pub meal_type: String,
    pub name: String,
    pub brand: Option<String>,
    pub serving_size: Option<String>,
    /// Nutrition per 100 g
    pub calories_per_100: f64,
    #[serde(default)]
    pub protein_per_100: f64,
    #[serde(default)]
    pub carbs_per_100: f64,
    #[serde(default)]
    pub fats_per_100: f64,
    /// Grams in one of the chosen unit; defaults to the parsed serving
    pub unit_grams: Option<f64>,
    /// Number of units eaten; defaults to 1
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveFoodParams {
    pub user_id: String,
    pub entry_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DayParams {
    pub user_id: String,
    /// YYYY-MM-DD, defaults to today (UTC)
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecalculateDayParams {
    pub user_id: String,
    /// YYYY-MM-DD
    pub date: String,
}

// ============================================================================
// Progress Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProgressParams {
    pub user_id: String,
    /// Evaluate as of this date (YYYY-MM-DD), defaults to today (UTC)
    pub today: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WeeklyReportParams {
    pub user_id: String,
    /// Last day of the 7-day window (YYYY-MM-DD), defaults to today (UTC)
    pub end_date: Option<String>,
    /// Where to write the PDF
    pub output_path: String,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl FitcoService {
    // --- Status ---

    #[tool(description = "Get the current status of the FitCo service including build info, database status, and process information")]
    async fn fitco_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        to_json(&status)
    }

    #[tool(description = "Get instructions for setting up profiles, logging food and reading progress. Call this when starting a session or when unsure how to use the FitCo tools.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::USAGE_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(USAGE_INSTRUCTIONS)]))
    }

    // --- Profile ---

    #[tool(description = "Create or replace a user's profile. Computes BMR, TDEE and daily calorie/macro targets and writes the targets into the user's settings.")]
    fn save_profile(&self, Parameters(p): Parameters<ProfileParams>) -> Result<CallToolResult, McpError> {
        let (user_id, input) = p.split();
        let result = profile::save_profile(&self.database, &user_id, input)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a user's stored profile with BMR and TDEE")]
    fn get_profile(&self, Parameters(p): Parameters<UserParams>) -> Result<CallToolResult, McpError> {
        let result = profile::get_profile(&self.database, &p.user_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(stored) => to_json(&stored),
            None => not_found("Profile", &p.user_id),
        }
    }

    #[tool(description = "Update some profile fields. Targets are recalculated only when age, height, weight, sex, activity level or goal changed.")]
    fn update_profile(&self, Parameters(p): Parameters<ProfileParams>) -> Result<CallToolResult, McpError> {
        let (user_id, input) = p.split();
        let result = profile::update_profile(&self.database, &user_id, input)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(resp) => to_json(&resp),
            None => not_found("Profile", &user_id),
        }
    }

    #[tool(description = "Delete a user's profile. Settings and food logs are kept.")]
    fn delete_profile(&self, Parameters(p): Parameters<UserParams>) -> Result<CallToolResult, McpError> {
        let deleted = profile::delete_profile(&self.database, &p.user_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&serde_json::json!({ "deleted": deleted, "user_id": p.user_id }))
    }

    // --- Settings ---

    #[tool(description = "Get a user's settings: weight, calorie and macro goals, reminders and language. Defaults are created on first access.")]
    fn get_settings(&self, Parameters(p): Parameters<UserParams>) -> Result<CallToolResult, McpError> {
        let result = settings::get_settings(&self.database, &p.user_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Update reminder and language preferences")]
    fn update_settings(&self, Parameters(p): Parameters<UpdateSettingsParams>) -> Result<CallToolResult, McpError> {
        let result = settings::update_settings(
            &self.database,
            &p.user_id,
            p.daily_reminders,
            p.reminder_time,
            p.language.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Set a calorie goal directly. Macros become 30% protein, 40% carbs, 30% fats.")]
    fn set_calorie_goal(&self, Parameters(p): Parameters<SetCalorieGoalParams>) -> Result<CallToolResult, McpError> {
        let result = settings::set_calorie_goal(&self.database, &p.user_id, p.calorie_goal)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Recompute goals from the saved profile with bodyweight-based macros (2 g protein per kg, 25% fats, remaining calories as carbs)")]
    fn sync_account_goals(&self, Parameters(p): Parameters<UserParams>) -> Result<CallToolResult, McpError> {
        let result = settings::sync_account_goals(&self.database, &p.user_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Food Log ---

    #[tool(description = "Parse a free-text serving size into grams and list the measurement units a food can be logged in")]
    fn parse_serving(&self, Parameters(p): Parameters<ParseServingParams>) -> Result<CallToolResult, McpError> {
        let result = food_log::parse_serving_tool(&p.serving_size, p.food_name.as_deref());
        to_json(&result)
    }

    #[tool(description = "Log a food to a meal. Nutrition is per 100 g; the amount eaten is unit_grams x amount (defaults to the parsed serving size). Returns the entry and the day's new totals.")]
    fn log_food(&self, Parameters(p): Parameters<LogFoodParams>) -> Result<CallToolResult, McpError> {
        let food = FoodInput {
            name: p.name,
            brand: p.brand,
            serving_size: p.serving_size,
            calories_per_100: p.calories_per_100,
            protein_per_100: p.protein_per_100,
            carbs_per_100: p.carbs_per_100,
            fats_per_100: p.fats_per_100,
        };
        let portion = Portion {
            unit_grams: p.unit_grams,
            amount: p.amount,
        };
        let result = food_log::log_food(
            &self.database,
            &p.user_id,
            p.date.as_deref(),
            &p.meal_type,
            food,
            portion,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Remove a logged food entry and recompute the day's totals")]
    fn remove_food(&self, Parameters(p): Parameters<RemoveFoodParams>) -> Result<CallToolResult, McpError> {
        let result = food_log::remove_food(&self.database, &p.user_id, p.entry_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a day's log with foods grouped by meal and nutrition totals")]
    fn get_day_log(&self, Parameters(p): Parameters<DayParams>) -> Result<CallToolResult, McpError> {
        let result = food_log::get_day_log(&self.database, &p.user_id, p.date.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Force recalculation of a day's stored nutrition totals from its foods")]
    fn recalculate_day_totals(&self, Parameters(p): Parameters<RecalculateDayParams>) -> Result<CallToolResult, McpError> {
        let result = food_log::recalculate_day_totals(&self.database, &p.user_id, &p.date)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Progress ---

    #[tool(description = "Get streaks, the last 7 days of intake, weekly averages, goals hit and per-day calorie bands")]
    fn get_progress(&self, Parameters(p): Parameters<ProgressParams>) -> Result<CallToolResult, McpError> {
        let result = progress::get_progress(&self.database, &p.user_id, p.today.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Generate a PDF report of the 7 days ending end_date with a daily table and a calorie chart")]
    fn generate_weekly_report(&self, Parameters(p): Parameters<WeeklyReportParams>) -> Result<CallToolResult, McpError> {
        let result = reports::generate_weekly_report(
            &self.database,
            &p.user_id,
            p.end_date.as_deref(),
            &p.output_path,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

#[tool_handler]
impl ServerHandler for FitcoService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "fitco".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("FitCo Nutrition Tracker".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "FitCo - Nutrition goals, food logging and progress streaks. \
                 IMPORTANT: Call usage_instructions before logging food for a new user. \
                 Profile: save/get/update/delete_profile (saving computes calorie and macro targets). \
                 Settings: get_settings, update_settings, set_calorie_goal, sync_account_goals. \
                 Food: parse_serving, log_food, remove_food, get_day_log, recalculate_day_totals. \
                 Progress: get_progress, generate_weekly_report. \
                 Dates are YYYY-MM-DD in UTC."
                    .into(),
            ),
        }
    }
}
