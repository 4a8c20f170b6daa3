//! User profile model
//!
//! Biometric inputs for goal calculation, validated before anything is computed.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DbResult;
use crate::nutrition::goals::EnergyEstimate;
use super::conversion_error;

pub const AGE_RANGE: (u32, u32) = (13, 120);
pub const HEIGHT_CM_RANGE: (f64, f64) = (100.0, 250.0);
pub const WEIGHT_KG_RANGE: (f64, f64) = (30.0, 300.0);

/// Profile validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("target_weight_kg is required when the goal is {0}")]
    MissingTargetWeight(&'static str),

    #[error("unknown sex: {0} (expected male or female)")]
    UnknownSex(String),

    #[error("unknown goal: {0} (expected lose_weight, maintain_weight, gain_weight or build_muscle)")]
    UnknownGoal(String),
}

/// Biological sex for the BMR equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Some(Sex::Male),
            "female" | "f" => Some(Sex::Female),
            _ => None,
        }
    }
}

/// Activity level for TDEE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    #[default]
    ModeratelyActive,
    VeryActive,
    ExtremelyActive,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::LightlyActive => "lightly_active",
            ActivityLevel::ModeratelyActive => "moderately_active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::ExtremelyActive => "extremely_active",
        }
    }

    /// Unrecognized levels fall back to moderately active.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => ActivityLevel::Sedentary,
            "lightly_active" => ActivityLevel::LightlyActive,
            "moderately_active" => ActivityLevel::ModeratelyActive,
            "very_active" => ActivityLevel::VeryActive,
            "extremely_active" => ActivityLevel::ExtremelyActive,
            other => {
                tracing::debug!(level = other, "unrecognized activity level, using moderately_active");
                ActivityLevel::default()
            }
        }
    }
}

/// Weight goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    LoseWeight,
    MaintainWeight,
    GainWeight,
    BuildMuscle,
}

impl Goal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::LoseWeight => "lose_weight",
            Goal::MaintainWeight => "maintain_weight",
            Goal::GainWeight => "gain_weight",
            Goal::BuildMuscle => "build_muscle",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "lose_weight" => Some(Goal::LoseWeight),
            "maintain_weight" => Some(Goal::MaintainWeight),
            "gain_weight" => Some(Goal::GainWeight),
            "build_muscle" => Some(Goal::BuildMuscle),
            _ => None,
        }
    }

    /// Only weight-change goals carry a target weight.
    pub fn requires_target_weight(&self) -> bool {
        matches!(self, Goal::LoseWeight | Goal::GainWeight)
    }
}

/// Biometric + goal inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub sex: Sex,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    pub goal: Goal,
    pub target_weight_kg: Option<f64>,
    #[serde(default)]
    pub medical_conditions: String,
    #[serde(default)]
    pub allergies: String,
}

fn check_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), ProfileError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ProfileError::OutOfRange { field, value, min, max })
    }
}

impl UserProfile {
    /// Reject out-of-range inputs. Goal calculation assumes this has passed.
    pub fn validate(&self) -> Result<(), ProfileError> {
        check_range(
            "age",
            self.age as f64,
            (AGE_RANGE.0 as f64, AGE_RANGE.1 as f64),
        )?;
        check_range("height_cm", self.height_cm, HEIGHT_CM_RANGE)?;
        check_range("weight_kg", self.weight_kg, WEIGHT_KG_RANGE)?;

        if self.goal.requires_target_weight() {
            let target = self
                .target_weight_kg
                .ok_or(ProfileError::MissingTargetWeight(self.goal.as_str()))?;
            check_range("target_weight_kg", target, WEIGHT_KG_RANGE)?;
        }

        Ok(())
    }

    /// True when any input to the goal calculation differs from `other`.
    pub fn biometrics_differ(&self, other: &UserProfile) -> bool {
        self.age != other.age
            || self.height_cm != other.height_cm
            || self.weight_kg != other.weight_kg
            || self.sex != other.sex
            || self.activity_level != other.activity_level
            || self.goal != other.goal
    }
}

/// Partial profile edit; None leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub age: Option<u32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub sex: Option<Sex>,
    pub activity_level: Option<ActivityLevel>,
    pub goal: Option<Goal>,
    pub target_weight_kg: Option<f64>,
    pub medical_conditions: Option<String>,
    pub allergies: Option<String>,
}

impl ProfileUpdate {
    /// Merge onto `base`. The target weight is dropped when the merged goal
    /// does not use one.
    pub fn apply_to(&self, base: &UserProfile) -> UserProfile {
        let goal = self.goal.unwrap_or(base.goal);
        let target_weight_kg = if goal.requires_target_weight() {
            self.target_weight_kg.or(base.target_weight_kg)
        } else {
            None
        };

        UserProfile {
            age: self.age.unwrap_or(base.age),
            height_cm: self.height_cm.unwrap_or(base.height_cm),
            weight_kg: self.weight_kg.unwrap_or(base.weight_kg),
            sex: self.sex.unwrap_or(base.sex),
            activity_level: self.activity_level.unwrap_or(base.activity_level),
            goal,
            target_weight_kg,
            medical_conditions: self
                .medical_conditions
                .clone()
                .unwrap_or_else(|| base.medical_conditions.clone()),
            allergies: self.allergies.clone().unwrap_or_else(|| base.allergies.clone()),
        }
    }
}

/// A persisted profile with cached energy estimates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub user_id: String,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub bmr: f64,
    pub tdee: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl StoredProfile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let sex: String = row.get("sex")?;
        let activity_level: String = row.get("activity_level")?;
        let goal: String = row.get("goal")?;

        Ok(Self {
            user_id: row.get("user_id")?,
            profile: UserProfile {
                age: row.get("age")?,
                height_cm: row.get("height_cm")?,
                weight_kg: row.get("weight_kg")?,
                sex: Sex::from_str(&sex).ok_or_else(|| conversion_error("sex", &sex))?,
                activity_level: ActivityLevel::from_str(&activity_level),
                goal: Goal::from_str(&goal).ok_or_else(|| conversion_error("goal", &goal))?,
                target_weight_kg: row.get("target_weight_kg")?,
                medical_conditions: row.get("medical_conditions")?,
                allergies: row.get("allergies")?,
            },
            bmr: row.get("bmr")?,
            tdee: row.get("tdee")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Get a user's profile
    pub fn get(conn: &Connection, user_id: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM user_profiles WHERE user_id = ?1")?;

        let result = stmt.query_row([user_id], Self::from_row);
        match result {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert or replace a user's profile, keeping the original created_at
    pub fn save(
        conn: &Connection,
        user_id: &str,
        profile: &UserProfile,
        estimate: &EnergyEstimate,
    ) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO user_profiles (
                user_id, age, height_cm, weight_kg, sex, activity_level, goal,
                target_weight_kg, medical_conditions, allergies, bmr, tdee
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(user_id) DO UPDATE SET
                age = excluded.age,
                height_cm = excluded.height_cm,
                weight_kg = excluded.weight_kg,
                sex = excluded.sex,
                activity_level = excluded.activity_level,
                goal = excluded.goal,
                target_weight_kg = excluded.target_weight_kg,
                medical_conditions = excluded.medical_conditions,
                allergies = excluded.allergies,
                bmr = excluded.bmr,
                tdee = excluded.tdee,
                updated_at = datetime('now')
            "#,
            params![
                user_id,
                profile.age,
                profile.height_cm,
                profile.weight_kg,
                profile.sex.as_str(),
                profile.activity_level.as_str(),
                profile.goal.as_str(),
                profile.target_weight_kg,
                profile.medical_conditions,
                profile.allergies,
                estimate.bmr.round(),
                estimate.tdee.round(),
            ],
        )?;

        Self::get(conn, user_id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Delete a user's profile
    pub fn delete(conn: &Connection, user_id: &str) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM user_profiles WHERE user_id = ?1", [user_id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::nutrition::goals;

    fn sample_profile() -> UserProfile {
        UserProfile {
            age: 25,
            height_cm: 170.0,
            weight_kg: 70.0,
            sex: Sex::Male,
            activity_level: ActivityLevel::ModeratelyActive,
            goal: Goal::MaintainWeight,
            target_weight_kg: None,
            medical_conditions: String::new(),
            allergies: String::new(),
        }
    }

    #[test]
    fn test_valid_profile_passes() {
        assert_eq!(sample_profile().validate(), Ok(()));
    }

    #[test]
    fn test_range_boundaries_are_inclusive() {
        let mut p = sample_profile();
        p.age = 13;
        p.height_cm = 250.0;
        p.weight_kg = 30.0;
        assert!(p.validate().is_ok());

        p.age = 12;
        assert!(matches!(
            p.validate(),
            Err(ProfileError::OutOfRange { field: "age", .. })
        ));
    }

    #[test]
    fn test_out_of_range_height_and_weight() {
        let mut p = sample_profile();
        p.height_cm = 99.5;
        assert!(matches!(
            p.validate(),
            Err(ProfileError::OutOfRange { field: "height_cm", .. })
        ));

        let mut p = sample_profile();
        p.weight_kg = f64::NAN;
        assert!(matches!(
            p.validate(),
            Err(ProfileError::OutOfRange { field: "weight_kg", .. })
        ));
    }

    #[test]
    fn test_target_weight_required_for_weight_change_goals() {
        let mut p = sample_profile();
        p.goal = Goal::LoseWeight;
        assert_eq!(
            p.validate(),
            Err(ProfileError::MissingTargetWeight("lose_weight"))
        );

        p.target_weight_kg = Some(310.0);
        assert!(matches!(
            p.validate(),
            Err(ProfileError::OutOfRange { field: "target_weight_kg", .. })
        ));

        p.target_weight_kg = Some(65.0);
        assert!(p.validate().is_ok());

        // build_muscle does not need a target
        p.goal = Goal::BuildMuscle;
        p.target_weight_kg = None;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!(Sex::from_str("Female"), Some(Sex::Female));
        assert_eq!(Sex::from_str("other"), None);
        assert_eq!(ActivityLevel::from_str("very_active"), ActivityLevel::VeryActive);
        assert_eq!(ActivityLevel::from_str("couch"), ActivityLevel::ModeratelyActive);
        assert_eq!(Goal::from_str("build_muscle"), Some(Goal::BuildMuscle));
        assert_eq!(Goal::from_str("bulk"), None);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_value(sample_profile()).unwrap();
        assert_eq!(json["activity_level"], "moderately_active");
        assert_eq!(json["goal"], "maintain_weight");
        assert_eq!(json["sex"], "male");
    }

    #[test]
    fn test_biometrics_differ_ignores_free_text() {
        let a = sample_profile();
        let mut b = a.clone();
        b.allergies = "peanuts".to_string();
        assert!(!a.biometrics_differ(&b));
        b.weight_kg = 71.0;
        assert!(a.biometrics_differ(&b));
    }

    #[test]
    fn test_update_merges_fields() {
        let base = sample_profile();
        let update = ProfileUpdate {
            weight_kg: Some(68.0),
            goal: Some(Goal::LoseWeight),
            target_weight_kg: Some(62.0),
            ..Default::default()
        };
        let merged = update.apply_to(&base);
        assert_eq!(merged.weight_kg, 68.0);
        assert_eq!(merged.goal, Goal::LoseWeight);
        assert_eq!(merged.age, base.age);
        assert_eq!(merged.sex, base.sex);
        assert!(merged.validate().is_ok());

        assert_eq!(ProfileUpdate::default().apply_to(&base), base);
    }

    #[test]
    fn test_update_clears_target_weight_with_goal() {
        let mut losing = sample_profile();
        losing.goal = Goal::LoseWeight;
        losing.target_weight_kg = Some(62.0);

        let maintain = ProfileUpdate {
            goal: Some(Goal::MaintainWeight),
            ..Default::default()
        };
        assert_eq!(maintain.apply_to(&losing).target_weight_kg, None);

        // switching between weight-change goals keeps the target
        let gain = ProfileUpdate {
            goal: Some(Goal::GainWeight),
            ..Default::default()
        };
        assert_eq!(gain.apply_to(&losing).target_weight_kg, Some(62.0));

        // a target sent alongside a goal that ignores it is dropped too
        let stray = ProfileUpdate {
            goal: Some(Goal::BuildMuscle),
            target_weight_kg: Some(80.0),
            ..Default::default()
        };
        assert_eq!(stray.apply_to(&losing).target_weight_kg, None);
    }

    #[test]
    fn test_save_get_delete() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let profile = sample_profile();
        let estimate = goals::energy_estimate(&profile);
        let stored = StoredProfile::save(&conn, "user-1", &profile, &estimate).unwrap();
        assert_eq!(stored.profile, profile);
        assert_eq!(stored.bmr, 1643.0);
        assert_eq!(stored.tdee, 2546.0);

        let mut updated = profile.clone();
        updated.weight_kg = 72.0;
        let stored = StoredProfile::save(&conn, "user-1", &updated, &goals::energy_estimate(&updated)).unwrap();
        assert_eq!(stored.profile.weight_kg, 72.0);

        assert!(StoredProfile::get(&conn, "user-2").unwrap().is_none());
        assert!(StoredProfile::delete(&conn, "user-1").unwrap());
        assert!(StoredProfile::get(&conn, "user-1").unwrap().is_none());
    }
}
