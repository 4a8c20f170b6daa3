//! Logged food model
//!
//! A food item snapshot logged to one meal on one day.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::{conversion_error, recalculate_log_totals, Nutrition};

/// Meal slot for a logged food
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    #[default]
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snacks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snacks => "snacks",
        }
    }

    /// Unknown meal names log to breakfast.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "lunch" => MealType::Lunch,
            "dinner" => MealType::Dinner,
            "snack" | "snacks" => MealType::Snacks,
            _ => MealType::Breakfast,
        }
    }
}

/// A food with nutrition per 100 g/ml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub brand: Option<String>,
    /// Free-text serving size as supplied by the food database ("1 cup", "150g")
    pub serving_size: Option<String>,
    pub nutrition_per_100: Nutrition,
}

/// One food logged to one meal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedFoodEntry {
    pub id: i64,
    pub food_item: FoodItem,
    /// Grams consumed / 100
    pub quantity_multiplier: f64,
    pub meal_type: MealType,
    pub timestamp: DateTime<Utc>,
}

impl LoggedFoodEntry {
    /// Nutrition contributed by this entry
    pub fn nutrition(&self) -> Nutrition {
        self.food_item.nutrition_per_100.scale(self.quantity_multiplier)
    }
}

/// Data for logging a food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedFoodCreate {
    pub food_item: FoodItem,
    pub quantity_multiplier: f64,
    pub meal_type: MealType,
    pub timestamp: DateTime<Utc>,
}

impl LoggedFoodEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let meal_type: String = row.get("meal_type")?;
        let logged_at: String = row.get("logged_at")?;
        let timestamp = DateTime::parse_from_rfc3339(&logged_at)
            .map_err(|_| conversion_error("logged_at", &logged_at))?
            .with_timezone(&Utc);

        Ok(Self {
            id: row.get("id")?,
            food_item: FoodItem {
                name: row.get("name")?,
                brand: row.get("brand")?,
                serving_size: row.get("serving_size")?,
                nutrition_per_100: Nutrition {
                    calories: row.get("calories_per_100")?,
                    protein: row.get("protein_per_100")?,
                    carbs: row.get("carbs_per_100")?,
                    fats: row.get("fats_per_100")?,
                },
            },
            quantity_multiplier: row.get("quantity_multiplier")?,
            meal_type: MealType::from_str(&meal_type),
            timestamp,
        })
    }

    /// Log a food to a daily log and refresh the log's cached totals
    pub fn create(conn: &Connection, daily_log_id: i64, data: &LoggedFoodCreate) -> DbResult<Self> {
        let food = &data.food_item;
        conn.execute(
            r#"
            INSERT INTO logged_foods (
                daily_log_id, name, brand, serving_size,
                calories_per_100, protein_per_100, carbs_per_100, fats_per_100,
                quantity_multiplier, meal_type, logged_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                daily_log_id,
                food.name,
                food.brand,
                food.serving_size,
                food.nutrition_per_100.calories,
                food.nutrition_per_100.protein,
                food.nutrition_per_100.carbs,
                food.nutrition_per_100.fats,
                data.quantity_multiplier,
                data.meal_type.as_str(),
                data.timestamp.to_rfc3339(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        let entry = Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })?;

        recalculate_log_totals(conn, daily_log_id)?;

        Ok(entry)
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM logged_foods WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All foods of a daily log in insertion order
    pub fn list_for_log(conn: &Connection, daily_log_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM logged_foods WHERE daily_log_id = ?1 ORDER BY id",
        )?;

        let entries = stmt
            .query_map([daily_log_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Remove a user's logged food and refresh its log's cached totals.
    /// Returns the date it was logged on with the day's new totals, or None
    /// if the user has no such entry.
    pub fn delete(conn: &Connection, user_id: &str, id: i64) -> DbResult<Option<(String, Nutrition)>> {
        let owner: Option<(i64, String)> = match conn.query_row(
            r#"
            SELECT l.id, l.date FROM logged_foods f
            JOIN daily_logs l ON l.id = f.daily_log_id
            WHERE f.id = ?1 AND l.user_id = ?2
            "#,
            params![id, user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        ) {
            Ok(found) => Some(found),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        let Some((daily_log_id, date)) = owner else {
            return Ok(None);
        };

        conn.execute("DELETE FROM logged_foods WHERE id = ?1", [id])?;
        let totals = recalculate_log_totals(conn, daily_log_id)?;

        Ok(Some((date, totals)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_type_parsing() {
        assert_eq!(MealType::from_str("Dinner"), MealType::Dinner);
        assert_eq!(MealType::from_str("snack"), MealType::Snacks);
        assert_eq!(MealType::from_str("brunch"), MealType::Breakfast);
        assert_eq!(serde_json::to_value(MealType::Snacks).unwrap(), "snacks");
    }

    #[test]
    fn test_entry_nutrition_scales_per_100() {
        let entry = LoggedFoodEntry {
            id: 1,
            food_item: FoodItem {
                name: "Rice".to_string(),
                brand: None,
                serving_size: Some("1 cup".to_string()),
                nutrition_per_100: Nutrition::new(130.0, 2.7, 28.0, 0.3),
            },
            quantity_multiplier: 2.4,
            meal_type: MealType::Lunch,
            timestamp: Utc::now(),
        };
        let n = entry.nutrition();
        assert!((n.calories - 312.0).abs() < 1e-9);
        assert!((n.carbs - 67.2).abs() < 1e-9);
    }
}
