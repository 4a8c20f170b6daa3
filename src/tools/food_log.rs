//! Food Log MCP Tools
//!
//! Tools for logging foods to a day and reading day logs back.

use chrono::Utc;
use serde::Serialize;

use crate::db::Database;
use crate::models::{
    recalculate_log_totals, DailyLog, FoodItem, LoggedFoodCreate, LoggedFoodEntry, MealType,
    Nutrition,
};
use crate::nutrition::dates::{format_iso_date, parse_iso_date, parse_or_today};
use crate::nutrition::{measurement_units, parse_serving, quantity_multiplier, MeasurementUnit};

/// Response for parse_serving
#[derive(Debug, Serialize)]
pub struct ParseServingResponse {
    pub grams: f64,
    pub display: String,
    pub units: Vec<MeasurementUnit>,
}

/// Food fields as supplied by the caller, nutrition per 100 g/ml
#[derive(Debug, Clone)]
pub struct FoodInput {
    pub name: String,
    pub brand: Option<String>,
    pub serving_size: Option<String>,
    pub calories_per_100: f64,
    pub protein_per_100: f64,
    pub carbs_per_100: f64,
    pub fats_per_100: f64,
}

/// How much was eaten: `amount` of a unit weighing `unit_grams`. Without a
/// unit the food's own serving size is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct Portion {
    pub unit_grams: Option<f64>,
    pub amount: Option<f64>,
}

/// Response for log_food
#[derive(Debug, Serialize)]
pub struct LogFoodResponse {
    pub entry: LoggedFoodEntry,
    pub date: String,
    pub grams: f64,
    /// Entry nutrition rounded for display
    pub nutrition: Nutrition,
    pub day_totals: Nutrition,
}

/// Response for remove_food
#[derive(Debug, Serialize)]
pub struct RemoveFoodResponse {
    pub removed: bool,
    pub date: Option<String>,
    pub day_totals: Option<Nutrition>,
}

/// Foods of one meal
#[derive(Debug, Serialize)]
pub struct MealGroup {
    pub meal_type: MealType,
    pub foods: Vec<LoggedFoodEntry>,
    pub totals: Nutrition,
}

/// Response for get_day_log
#[derive(Debug, Serialize)]
pub struct DayLogResponse {
    pub date: String,
    pub logged: bool,
    pub meals: Vec<MealGroup>,
    pub totals: Nutrition,
}

/// Response for recalculate_day_totals
#[derive(Debug, Serialize)]
pub struct RecalculateDayTotalsResponse {
    pub date: String,
    pub previous: Nutrition,
    pub totals: Nutrition,
}

fn check_non_negative(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{} must be a non-negative number (got {})", field, value))
    }
}

/// Parse a serving size and list the units it can be logged in
pub fn parse_serving_tool(serving_size: &str, food_name: Option<&str>) -> ParseServingResponse {
    let serving = parse_serving(serving_size);
    let units = measurement_units(food_name.unwrap_or(""), &serving);
    ParseServingResponse {
        grams: serving.grams,
        display: serving.display,
        units,
    }
}

/// Log a food to a user's day (today when no date is given)
pub fn log_food(
    db: &Database,
    user_id: &str,
    date: Option<&str>,
    meal_type: &str,
    food: FoodInput,
    portion: Portion,
) -> Result<LogFoodResponse, String> {
    let date = parse_or_today(date)?;

    if food.name.trim().is_empty() {
        return Err("Food name must not be empty".to_string());
    }
    check_non_negative("calories_per_100", food.calories_per_100)?;
    check_non_negative("protein_per_100", food.protein_per_100)?;
    check_non_negative("carbs_per_100", food.carbs_per_100)?;
    check_non_negative("fats_per_100", food.fats_per_100)?;

    let amount = portion.amount.unwrap_or(1.0);
    check_non_negative("amount", amount)?;
    let unit_grams = match portion.unit_grams {
        Some(grams) => {
            check_non_negative("unit_grams", grams)?;
            grams
        }
        None => parse_serving(food.serving_size.as_deref().unwrap_or("")).grams,
    };
    let multiplier = quantity_multiplier(unit_grams, amount);

    let data = LoggedFoodCreate {
        food_item: FoodItem {
            name: food.name.trim().to_string(),
            brand: food.brand,
            serving_size: food.serving_size,
            nutrition_per_100: Nutrition::new(
                food.calories_per_100,
                food.protein_per_100,
                food.carbs_per_100,
                food.fats_per_100,
            ),
        },
        quantity_multiplier: multiplier,
        meal_type: MealType::from_str(meal_type),
        timestamp: Utc::now(),
    };

    let (entry, day_totals) = db
        .transaction(|tx| {
            let log_id = DailyLog::get_or_create_id(tx, user_id, date)?;
            let entry = LoggedFoodEntry::create(tx, log_id, &data)?;
            let day_totals = DailyLog::cached_totals(tx, log_id)?;
            Ok((entry, day_totals))
        })
        .map_err(|e| format!("Failed to log food: {}", e))?;

    tracing::info!(
        user_id,
        date = %date,
        food = %entry.food_item.name,
        calories = entry.nutrition().calories,
        "food logged"
    );

    Ok(LogFoodResponse {
        nutrition: entry.nutrition().rounded_for_display(),
        entry,
        date: format_iso_date(date),
        grams: unit_grams * amount,
        day_totals,
    })
}

/// Remove a logged food by id
pub fn remove_food(db: &Database, user_id: &str, entry_id: i64) -> Result<RemoveFoodResponse, String> {
    let removed = db
        .transaction(|tx| LoggedFoodEntry::delete(tx, user_id, entry_id))
        .map_err(|e| format!("Failed to remove food: {}", e))?;

    match removed {
        Some((date, day_totals)) => {
            tracing::info!(user_id, entry_id, date = %date, "food removed");
            Ok(RemoveFoodResponse {
                removed: true,
                date: Some(date),
                day_totals: Some(day_totals),
            })
        }
        None => Ok(RemoveFoodResponse {
            removed: false,
            date: None,
            day_totals: None,
        }),
    }
}

/// Get a user's day with foods grouped by meal. Days with no log come back
/// empty rather than as an error.
pub fn get_day_log(db: &Database, user_id: &str, date: Option<&str>) -> Result<DayLogResponse, String> {
    let date = parse_or_today(date)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let log = DailyLog::load(&conn, user_id, date)
        .map_err(|e| format!("Failed to get day log: {}", e))?
        .unwrap_or_else(|| DailyLog::new(date));

    let meals = MealType::ALL
        .iter()
        .map(|&meal_type| {
            let foods: Vec<LoggedFoodEntry> = log
                .foods()
                .iter()
                .filter(|f| f.meal_type == meal_type)
                .cloned()
                .collect();
            let totals = foods.iter().map(LoggedFoodEntry::nutrition).sum();
            MealGroup {
                meal_type,
                foods,
                totals,
            }
        })
        .collect();

    Ok(DayLogResponse {
        date: format_iso_date(date),
        logged: log.is_logged(),
        meals,
        totals: log.totals(),
    })
}

/// Force recalculation of a day's stored totals from its foods
pub fn recalculate_day_totals(
    db: &Database,
    user_id: &str,
    date: &str,
) -> Result<RecalculateDayTotalsResponse, String> {
    let date = parse_iso_date(date)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let log_id = DailyLog::log_id(&conn, user_id, date)
        .map_err(|e| format!("Failed to get day log: {}", e))?
        .ok_or_else(|| format!("No log for {}", format_iso_date(date)))?;

    let previous = DailyLog::cached_totals(&conn, log_id)
        .map_err(|e| format!("Failed to read day totals: {}", e))?;
    let totals = recalculate_log_totals(&conn, log_id)
        .map_err(|e| format!("Failed to recalculate totals: {}", e))?;

    Ok(RecalculateDayTotalsResponse {
        date: format_iso_date(date),
        previous,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::test_db;

    fn oats() -> FoodInput {
        FoodInput {
            name: "Rolled oats".to_string(),
            brand: None,
            serving_size: Some("1/2 cup".to_string()),
            calories_per_100: 380.0,
            protein_per_100: 13.0,
            carbs_per_100: 67.0,
            fats_per_100: 7.0,
        }
    }

    #[test]
    fn test_parse_serving_tool() {
        let resp = parse_serving_tool("2 tbsp", Some("Peanut butter"));
        assert_eq!(resp.grams, 30.0);
        assert_eq!(resp.display, "2 tbsp");
        assert_eq!(resp.units[0].grams, 30.0);
        assert!(resp.units[0].is_default);
    }

    #[test]
    fn test_log_food_uses_serving_by_default() {
        let (_dir, db) = test_db();
        let resp = log_food(&db, "u1", Some("2025-06-10"), "breakfast", oats(), Portion::default()).unwrap();

        // 1/2 cup = 120 g
        assert_eq!(resp.grams, 120.0);
        assert!((resp.entry.quantity_multiplier - 1.2).abs() < 1e-9);
        assert_eq!(resp.nutrition.calories, 456.0);
        assert_eq!(resp.nutrition.protein, 15.6);
        assert!((resp.day_totals.calories - 456.0).abs() < 1e-9);
        assert_eq!(resp.entry.meal_type, MealType::Breakfast);
    }

    #[test]
    fn test_log_food_with_unit_and_amount() {
        let (_dir, db) = test_db();
        let portion = Portion {
            unit_grams: Some(30.0),
            amount: Some(2.0),
        };
        let resp = log_food(&db, "u1", Some("2025-06-10"), "midnight feast", oats(), portion).unwrap();
        assert_eq!(resp.grams, 60.0);
        assert!((resp.day_totals.calories - 228.0).abs() < 1e-9);
        // unknown meal names land in breakfast
        assert_eq!(resp.entry.meal_type, MealType::Breakfast);
    }

    #[test]
    fn test_log_food_rejects_bad_input() {
        let (_dir, db) = test_db();
        let negative = Portion {
            unit_grams: None,
            amount: Some(-1.0),
        };
        assert!(log_food(&db, "u1", None, "lunch", oats(), negative).is_err());
        assert!(log_food(&db, "u1", Some("10/06/2025"), "lunch", oats(), Portion::default()).is_err());

        let mut food = oats();
        food.calories_per_100 = f64::NAN;
        assert!(log_food(&db, "u1", None, "lunch", food, Portion::default()).is_err());
    }

    #[test]
    fn test_remove_food_recomputes_totals() {
        let (_dir, db) = test_db();
        let date = Some("2025-06-10");
        let first = log_food(&db, "u1", date, "breakfast", oats(), Portion::default()).unwrap();
        let mut apple = oats();
        apple.name = "Apple".to_string();
        apple.calories_per_100 = 52.0;
        apple.serving_size = Some("182g".to_string());
        log_food(&db, "u1", date, "snacks", apple, Portion::default()).unwrap();

        // Other users cannot remove it
        let resp = remove_food(&db, "u2", first.entry.id).unwrap();
        assert!(!resp.removed);

        let resp = remove_food(&db, "u1", first.entry.id).unwrap();
        assert!(resp.removed);
        assert_eq!(resp.date.as_deref(), Some("2025-06-10"));
        let totals = resp.day_totals.unwrap();
        assert!((totals.calories - 94.64).abs() < 1e-9);

        let day = get_day_log(&db, "u1", date).unwrap();
        assert!(day.logged);
        assert_eq!(day.totals, totals);
        assert_eq!(day.meals.len(), 4);
        assert!(day.meals[0].foods.is_empty());
        assert_eq!(day.meals[3].foods.len(), 1);
    }

    #[test]
    fn test_get_day_log_empty_day() {
        let (_dir, db) = test_db();
        let day = get_day_log(&db, "u1", Some("2025-01-01")).unwrap();
        assert!(!day.logged);
        assert_eq!(day.totals, Nutrition::zero());
        assert!(recalculate_day_totals(&db, "u1", "2025-01-01").is_err());
    }

    #[test]
    fn test_recalculate_repairs_drift() {
        let (_dir, db) = test_db();
        log_food(&db, "u1", Some("2025-06-10"), "lunch", oats(), Portion::default()).unwrap();

        {
            let conn = db.get_conn().unwrap();
            conn.execute("UPDATE daily_logs SET cached_calories = 1", []).unwrap();
        }

        let resp = recalculate_day_totals(&db, "u1", "2025-06-10").unwrap();
        assert_eq!(resp.previous.calories, 1.0);
        assert!((resp.totals.calories - 456.0).abs() < 1e-9);
    }
}
