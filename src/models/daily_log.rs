//! Daily log model
//!
//! One log per user per calendar day. Totals are always the sum over the
//! day's foods; they are recomputed from scratch on every change, never
//! patched.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::dates::{format_iso_date, parse_iso_date};
use super::{LoggedFoodEntry, Nutrition};

/// Date-keyed log map, ascending by date
pub type LogBook = BTreeMap<NaiveDate, DailyLog>;

/// Foods and derived totals for one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DailyLogRecord")]
pub struct DailyLog {
    date: NaiveDate,
    foods: Vec<LoggedFoodEntry>,
    totals: Nutrition,
}

/// Wire shape accepted on deserialization; any totals in the input are
/// ignored and recomputed.
#[derive(Deserialize)]
struct DailyLogRecord {
    date: NaiveDate,
    #[serde(default)]
    foods: Vec<LoggedFoodEntry>,
}

impl From<DailyLogRecord> for DailyLog {
    fn from(record: DailyLogRecord) -> Self {
        DailyLog::with_foods(record.date, record.foods)
    }
}

impl DailyLog {
    /// An empty log for `date`
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            foods: Vec::new(),
            totals: Nutrition::zero(),
        }
    }

    pub fn with_foods(date: NaiveDate, foods: Vec<LoggedFoodEntry>) -> Self {
        let mut log = Self {
            date,
            foods,
            totals: Nutrition::zero(),
        };
        log.recompute_totals();
        log
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn foods(&self) -> &[LoggedFoodEntry] {
        &self.foods
    }

    pub fn totals(&self) -> Nutrition {
        self.totals
    }

    /// A day counts as logged once it has at least one food.
    pub fn is_logged(&self) -> bool {
        !self.foods.is_empty()
    }

    pub fn add_food(&mut self, entry: LoggedFoodEntry) {
        self.foods.push(entry);
        self.recompute_totals();
    }

    /// Remove the entry with `id`. Returns false if it was not in this log.
    pub fn remove_food(&mut self, id: i64) -> bool {
        let before = self.foods.len();
        self.foods.retain(|f| f.id != id);
        let removed = self.foods.len() != before;
        if removed {
            self.recompute_totals();
        }
        removed
    }

    fn recompute_totals(&mut self) {
        self.totals = sum_foods(&self.foods);
    }
}

fn sum_foods(foods: &[LoggedFoodEntry]) -> Nutrition {
    foods.iter().map(LoggedFoodEntry::nutrition).sum()
}

// ============================================================================
// Persistence
// ============================================================================

impl DailyLog {
    /// Row id of a user's log for `date`, if one exists
    pub fn log_id(conn: &Connection, user_id: &str, date: NaiveDate) -> DbResult<Option<i64>> {
        let result = conn.query_row(
            "SELECT id FROM daily_logs WHERE user_id = ?1 AND date = ?2",
            params![user_id, format_iso_date(date)],
            |row| row.get(0),
        );
        match result {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Row id of a user's log for `date`, creating an empty log if needed
    pub fn get_or_create_id(conn: &Connection, user_id: &str, date: NaiveDate) -> DbResult<i64> {
        if let Some(id) = Self::log_id(conn, user_id, date)? {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO daily_logs (user_id, date) VALUES (?1, ?2)",
            params![user_id, format_iso_date(date)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Load one day with its foods
    pub fn load(conn: &Connection, user_id: &str, date: NaiveDate) -> DbResult<Option<Self>> {
        match Self::log_id(conn, user_id, date)? {
            Some(id) => {
                let foods = LoggedFoodEntry::list_for_log(conn, id)?;
                Ok(Some(Self::with_foods(date, foods)))
            }
            None => Ok(None),
        }
    }

    /// Load every day a user has a log for
    pub fn load_all(conn: &Connection, user_id: &str) -> DbResult<LogBook> {
        let mut stmt = conn.prepare(
            "SELECT id, date FROM daily_logs WHERE user_id = ?1 ORDER BY date",
        )?;

        let rows = stmt
            .query_map([user_id], |row| {
                let id: i64 = row.get(0)?;
                let date: String = row.get(1)?;
                Ok((id, date))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut book = LogBook::new();
        for (id, date) in rows {
            let date = parse_iso_date(&date)
                .map_err(|_| super::conversion_error("date", &date))?;
            let foods = LoggedFoodEntry::list_for_log(conn, id)?;
            book.insert(date, Self::with_foods(date, foods));
        }

        Ok(book)
    }

    /// Dates of all of a user's logs, ascending
    pub fn list_dates(conn: &Connection, user_id: &str) -> DbResult<Vec<NaiveDate>> {
        let mut stmt = conn.prepare(
            "SELECT date FROM daily_logs WHERE user_id = ?1 ORDER BY date",
        )?;

        let dates = stmt
            .query_map([user_id], |row| {
                let date: String = row.get(0)?;
                parse_iso_date(&date).map_err(|_| super::conversion_error("date", &date))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(dates)
    }

    /// Cached totals as stored on the log row
    pub fn cached_totals(conn: &Connection, log_id: i64) -> DbResult<Nutrition> {
        let totals = conn.query_row(
            r#"
            SELECT cached_calories, cached_protein, cached_carbs, cached_fats
            FROM daily_logs WHERE id = ?1
            "#,
            [log_id],
            |row| {
                Ok(Nutrition {
                    calories: row.get(0)?,
                    protein: row.get(1)?,
                    carbs: row.get(2)?,
                    fats: row.get(3)?,
                })
            },
        )?;
        Ok(totals)
    }
}

/// Recompute a log's cached totals from its stored foods
pub fn recalculate_log_totals(conn: &Connection, daily_log_id: i64) -> DbResult<Nutrition> {
    let foods = LoggedFoodEntry::list_for_log(conn, daily_log_id)?;
    let total = sum_foods(&foods);

    conn.execute(
        r#"
        UPDATE daily_logs SET
            cached_calories = ?1,
            cached_protein = ?2,
            cached_carbs = ?3,
            cached_fats = ?4,
            updated_at = datetime('now')
        WHERE id = ?5
        "#,
        params![total.calories, total.protein, total.carbs, total.fats, daily_log_id],
    )?;

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{FoodItem, LoggedFoodCreate, MealType};
    use chrono::Utc;

    fn d(s: &str) -> NaiveDate {
        parse_iso_date(s).unwrap()
    }

    fn food(name: &str, calories: f64) -> FoodItem {
        FoodItem {
            name: name.to_string(),
            brand: None,
            serving_size: None,
            nutrition_per_100: Nutrition::new(calories, 10.0, 20.0, 5.0),
        }
    }

    fn entry(id: i64, calories: f64, multiplier: f64) -> LoggedFoodEntry {
        LoggedFoodEntry {
            id,
            food_item: food("Food", calories),
            quantity_multiplier: multiplier,
            meal_type: MealType::Lunch,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_totals_follow_add_and_remove() {
        let mut log = DailyLog::new(d("2025-05-01"));
        assert!(!log.is_logged());

        log.add_food(entry(1, 200.0, 1.5));
        log.add_food(entry(2, 100.0, 2.0));
        assert!(log.is_logged());
        assert_eq!(log.totals(), Nutrition::new(500.0, 35.0, 70.0, 17.5));

        assert!(log.remove_food(1));
        assert_eq!(log.totals(), Nutrition::new(200.0, 20.0, 40.0, 10.0));
        assert!(!log.remove_food(99));

        assert!(log.remove_food(2));
        assert_eq!(log.totals(), Nutrition::zero());
        assert!(!log.is_logged());
    }

    #[test]
    fn test_foods_keep_insertion_order() {
        let log = DailyLog::with_foods(d("2025-05-01"), vec![entry(3, 1.0, 1.0), entry(1, 1.0, 1.0)]);
        let ids: Vec<i64> = log.foods().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_deserialize_recomputes_stale_totals() {
        let log = DailyLog::with_foods(d("2025-05-01"), vec![entry(1, 200.0, 1.0)]);
        let mut json = serde_json::to_value(&log).unwrap();
        json["totals"]["calories"] = serde_json::json!(9999.0);

        let back: DailyLog = serde_json::from_value(json).unwrap();
        assert_eq!(back.totals().calories, 200.0);
        assert_eq!(back, log);
    }

    #[test]
    fn test_deserialize_without_foods() {
        let log: DailyLog = serde_json::from_str(r#"{"date": "2025-05-01"}"#).unwrap();
        assert_eq!(log, DailyLog::new(d("2025-05-01")));
    }

    #[test]
    fn test_persisted_totals_match_foods() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let date = d("2025-05-01");
        let log_id = DailyLog::get_or_create_id(&conn, "u1", date).unwrap();
        assert_eq!(DailyLog::get_or_create_id(&conn, "u1", date).unwrap(), log_id);

        let create = |calories: f64, multiplier: f64| LoggedFoodCreate {
            food_item: food("Oats", calories),
            quantity_multiplier: multiplier,
            meal_type: MealType::Breakfast,
            timestamp: Utc::now(),
        };
        let first = LoggedFoodEntry::create(&conn, log_id, &create(380.0, 0.5)).unwrap();
        LoggedFoodEntry::create(&conn, log_id, &create(60.0, 2.0)).unwrap();

        let cached = DailyLog::cached_totals(&conn, log_id).unwrap();
        assert!((cached.calories - 310.0).abs() < 1e-9);

        // Another user cannot remove this entry
        assert_eq!(LoggedFoodEntry::delete(&conn, "u2", first.id).unwrap(), None);
        let (removed_on, totals) = LoggedFoodEntry::delete(&conn, "u1", first.id).unwrap().unwrap();
        assert_eq!(removed_on, "2025-05-01");

        let cached = DailyLog::cached_totals(&conn, log_id).unwrap();
        assert_eq!(cached, totals);
        let loaded = DailyLog::load(&conn, "u1", date).unwrap().unwrap();
        assert_eq!(cached, loaded.totals());
        assert!((cached.calories - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_all_is_scoped_and_ordered() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        for date in ["2025-05-03", "2025-05-01"] {
            DailyLog::get_or_create_id(&conn, "u1", d(date)).unwrap();
        }
        DailyLog::get_or_create_id(&conn, "u2", d("2025-05-02")).unwrap();

        let book = DailyLog::load_all(&conn, "u1").unwrap();
        let dates: Vec<NaiveDate> = book.keys().copied().collect();
        assert_eq!(dates, vec![d("2025-05-01"), d("2025-05-03")]);
        assert_eq!(DailyLog::list_dates(&conn, "u1").unwrap(), dates);
        assert!(DailyLog::load(&conn, "u1", d("2025-05-02")).unwrap().is_none());
    }
}
