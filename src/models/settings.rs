//! User settings model
//!
//! Holds the cached nutrition targets plus reminder and language preferences.
//! A row is created with defaults the first time a user's settings are read.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::goals::NutritionTargets;

/// Interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" => Some(Language::En),
            "ar" => Some(Language::Ar),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub weight_kg: f64,
    pub calorie_goal: u32,
    pub protein_goal_g: u32,
    pub carbs_goal_g: u32,
    pub fats_goal_g: u32,
    pub daily_reminders: bool,
    /// `HH:MM`, 24 hour
    pub reminder_time: String,
    pub language: Language,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            weight_kg: 70.0,
            calorie_goal: 2000,
            protein_goal_g: 150,
            carbs_goal_g: 250,
            fats_goal_g: 67,
            daily_reminders: true,
            reminder_time: "20:00".to_string(),
            language: Language::En,
        }
    }
}

/// Check a reminder time is a valid 24 hour `HH:MM`
pub fn validate_reminder_time(s: &str) -> Result<(), String> {
    chrono::NaiveTime::parse_from_str(s, "%H:%M")
        .map(|_| ())
        .map_err(|_| format!("Invalid reminder time '{}' (expected HH:MM)", s))
}

impl UserSettings {
    pub fn targets(&self) -> NutritionTargets {
        NutritionTargets {
            calorie_goal: self.calorie_goal,
            protein_goal_g: self.protein_goal_g,
            carbs_goal_g: self.carbs_goal_g,
            fats_goal_g: self.fats_goal_g,
        }
    }

    pub fn set_targets(&mut self, targets: NutritionTargets) {
        self.calorie_goal = targets.calorie_goal;
        self.protein_goal_g = targets.protein_goal_g;
        self.carbs_goal_g = targets.carbs_goal_g;
        self.fats_goal_g = targets.fats_goal_g;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let language: String = row.get("language")?;
        Ok(Self {
            weight_kg: row.get("weight_kg")?,
            calorie_goal: row.get("calorie_goal")?,
            protein_goal_g: row.get("protein_goal_g")?,
            carbs_goal_g: row.get("carbs_goal_g")?,
            fats_goal_g: row.get("fats_goal_g")?,
            daily_reminders: row.get("daily_reminders")?,
            reminder_time: row.get("reminder_time")?,
            language: Language::from_str(&language)
                .ok_or_else(|| super::conversion_error("language", &language))?,
        })
    }

    /// Stored settings, if any
    pub fn get(conn: &Connection, user_id: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM user_settings WHERE user_id = ?1")?;

        let result = stmt.query_row([user_id], Self::from_row);
        match result {
            Ok(settings) => Ok(Some(settings)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Stored settings, inserting the defaults on first access
    pub fn get_or_default(conn: &Connection, user_id: &str) -> DbResult<Self> {
        if let Some(settings) = Self::get(conn, user_id)? {
            return Ok(settings);
        }

        let settings = Self::default();
        settings.save(conn, user_id)?;
        Ok(settings)
    }

    /// Insert or overwrite a user's settings
    pub fn save(&self, conn: &Connection, user_id: &str) -> DbResult<()> {
        conn.execute(
            r#"
            INSERT INTO user_settings (
                user_id, weight_kg, calorie_goal, protein_goal_g, carbs_goal_g,
                fats_goal_g, daily_reminders, reminder_time, language
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(user_id) DO UPDATE SET
                weight_kg = excluded.weight_kg,
                calorie_goal = excluded.calorie_goal,
                protein_goal_g = excluded.protein_goal_g,
                carbs_goal_g = excluded.carbs_goal_g,
                fats_goal_g = excluded.fats_goal_g,
                daily_reminders = excluded.daily_reminders,
                reminder_time = excluded.reminder_time,
                language = excluded.language,
                updated_at = datetime('now')
            "#,
            params![
                user_id,
                self.weight_kg,
                self.calorie_goal,
                self.protein_goal_g,
                self.carbs_goal_g,
                self.fats_goal_g,
                self.daily_reminders,
                self.reminder_time,
                self.language.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Overwrite the cached targets (and weight) leaving preferences alone
    pub fn apply_targets(
        conn: &Connection,
        user_id: &str,
        weight_kg: Option<f64>,
        targets: NutritionTargets,
    ) -> DbResult<Self> {
        let mut settings = Self::get_or_default(conn, user_id)?;
        if let Some(weight_kg) = weight_kg {
            settings.weight_kg = weight_kg;
        }
        settings.set_targets(targets);
        settings.save(conn, user_id)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    #[test]
    fn test_defaults() {
        let s = UserSettings::default();
        assert_eq!(s.calorie_goal, 2000);
        assert_eq!(s.fats_goal_g, 67);
        assert!(s.daily_reminders);
        assert_eq!(s.reminder_time, "20:00");
        assert_eq!(s.language, Language::En);
    }

    #[test]
    fn test_reminder_time_validation() {
        assert!(validate_reminder_time("07:30").is_ok());
        assert!(validate_reminder_time("23:59").is_ok());
        assert!(validate_reminder_time("24:00").is_err());
        assert!(validate_reminder_time("7pm").is_err());
    }

    #[test]
    fn test_first_access_creates_defaults() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        assert!(UserSettings::get(&conn, "u1").unwrap().is_none());
        let s = UserSettings::get_or_default(&conn, "u1").unwrap();
        assert_eq!(s, UserSettings::default());
        assert_eq!(UserSettings::get(&conn, "u1").unwrap(), Some(s));
    }

    #[test]
    fn test_apply_targets_keeps_preferences() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let mut s = UserSettings::get_or_default(&conn, "u1").unwrap();
        s.language = Language::Ar;
        s.daily_reminders = false;
        s.save(&conn, "u1").unwrap();

        let targets = NutritionTargets {
            calorie_goal: 2546,
            protein_goal_g: 191,
            carbs_goal_g: 286,
            fats_goal_g: 71,
        };
        let updated = UserSettings::apply_targets(&conn, "u1", Some(72.5), targets).unwrap();
        assert_eq!(updated.targets(), targets);
        assert_eq!(updated.weight_kg, 72.5);
        assert_eq!(updated.language, Language::Ar);
        assert!(!updated.daily_reminders);

        let reloaded = UserSettings::get(&conn, "u1").unwrap().unwrap();
        assert_eq!(reloaded, updated);
    }
}
