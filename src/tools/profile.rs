//! Profile MCP Tools
//!
//! Saving a profile derives nutrition targets from it and writes them into the
//! user's settings.

use serde::Serialize;

use crate::db::{Database, DbResult};
use crate::models::{
    ActivityLevel, Goal, ProfileError, ProfileUpdate, Sex, StoredProfile, UserProfile,
    UserSettings,
};
use crate::nutrition::{compute_from_profile, energy_estimate, EnergyEstimate, NutritionTargets};

/// Raw profile fields as they arrive from a tool call
#[derive(Debug, Clone, Default)]
pub struct ProfileInput {
    pub age: Option<u32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub sex: Option<String>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
    pub target_weight_kg: Option<f64>,
    pub medical_conditions: Option<String>,
    pub allergies: Option<String>,
}

impl ProfileInput {
    /// Parse enum fields, leaving absent fields unset
    pub fn into_update(self) -> Result<ProfileUpdate, ProfileError> {
        let sex = self
            .sex
            .map(|s| Sex::from_str(&s).ok_or(ProfileError::UnknownSex(s)))
            .transpose()?;
        let goal = self
            .goal
            .map(|g| Goal::from_str(&g).ok_or(ProfileError::UnknownGoal(g)))
            .transpose()?;

        Ok(ProfileUpdate {
            age: self.age,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            sex,
            activity_level: self.activity_level.as_deref().map(ActivityLevel::from_str),
            goal,
            target_weight_kg: self.target_weight_kg,
            medical_conditions: self.medical_conditions,
            allergies: self.allergies,
        })
    }

    /// A complete profile; every biometric field is required
    pub fn into_profile(self) -> Result<UserProfile, String> {
        let missing = [
            ("age", self.age.is_none()),
            ("height_cm", self.height_cm.is_none()),
            ("weight_kg", self.weight_kg.is_none()),
            ("sex", self.sex.is_none()),
            ("goal", self.goal.is_none()),
        ];
        if let Some((field, _)) = missing.iter().find(|(_, absent)| *absent) {
            return Err(format!("Missing required profile field: {}", field));
        }

        let update = self.into_update().map_err(|e| e.to_string())?;
        match (update.age, update.height_cm, update.weight_kg, update.sex, update.goal) {
            (Some(age), Some(height_cm), Some(weight_kg), Some(sex), Some(goal)) => Ok(UserProfile {
                age,
                height_cm,
                weight_kg,
                sex,
                activity_level: update.activity_level.unwrap_or_default(),
                goal,
                target_weight_kg: update.target_weight_kg,
                medical_conditions: update.medical_conditions.unwrap_or_default(),
                allergies: update.allergies.unwrap_or_default(),
            }),
            _ => Err("Incomplete profile".to_string()),
        }
    }
}

/// Response for save_profile and update_profile
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: StoredProfile,
    pub targets: NutritionTargets,
    /// False when an update touched no biometric field
    pub recalculated: bool,
}

/// Validate and store a profile, then overwrite the user's targets
pub fn save_profile(db: &Database, user_id: &str, input: ProfileInput) -> Result<ProfileResponse, String> {
    let profile = input.into_profile()?;
    profile.validate().map_err(|e| e.to_string())?;

    let (stored, targets) = db
        .transaction(|tx| store_with_targets(tx, user_id, &profile))
        .map_err(|e| format!("Failed to save profile: {}", e))?;

    tracing::info!(user_id, calorie_goal = targets.calorie_goal, "profile saved");

    Ok(ProfileResponse {
        profile: stored,
        targets,
        recalculated: true,
    })
}

fn store_with_targets(
    conn: &rusqlite::Connection,
    user_id: &str,
    profile: &UserProfile,
) -> DbResult<(StoredProfile, NutritionTargets)> {
    let targets = compute_from_profile(profile);
    let stored = StoredProfile::save(conn, user_id, profile, &energy_estimate(profile))?;
    UserSettings::apply_targets(conn, user_id, Some(profile.weight_kg), targets)?;
    Ok((stored, targets))
}

/// Get a user's profile
pub fn get_profile(db: &Database, user_id: &str) -> Result<Option<StoredProfile>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    StoredProfile::get(&conn, user_id)
        .map_err(|e| format!("Failed to get profile: {}", e))
}

enum ProfileEdit {
    Missing,
    Invalid(ProfileError),
    Saved(ProfileResponse),
}

/// Edit some profile fields. Targets are only recomputed when a biometric
/// field changed.
pub fn update_profile(
    db: &Database,
    user_id: &str,
    input: ProfileInput,
) -> Result<Option<ProfileResponse>, String> {
    let update = input.into_update().map_err(|e| e.to_string())?;

    let edit = db
        .transaction(|tx| {
            let Some(existing) = StoredProfile::get(tx, user_id)? else {
                return Ok(ProfileEdit::Missing);
            };

            let profile = update.apply_to(&existing.profile);
            if let Err(e) = profile.validate() {
                return Ok(ProfileEdit::Invalid(e));
            }

            if profile.biometrics_differ(&existing.profile) {
                let (stored, targets) = store_with_targets(tx, user_id, &profile)?;
                return Ok(ProfileEdit::Saved(ProfileResponse {
                    profile: stored,
                    targets,
                    recalculated: true,
                }));
            }

            // Only free-text fields changed; the cached estimate still holds
            let estimate = EnergyEstimate {
                bmr: existing.bmr,
                tdee: existing.tdee,
            };
            let stored = StoredProfile::save(tx, user_id, &profile, &estimate)?;
            let settings = UserSettings::get_or_default(tx, user_id)?;
            Ok(ProfileEdit::Saved(ProfileResponse {
                profile: stored,
                targets: settings.targets(),
                recalculated: false,
            }))
        })
        .map_err(|e| format!("Failed to update profile: {}", e))?;

    match edit {
        ProfileEdit::Missing => Ok(None),
        ProfileEdit::Invalid(e) => Err(e.to_string()),
        ProfileEdit::Saved(resp) => {
            if resp.recalculated {
                tracing::info!(user_id, calorie_goal = resp.targets.calorie_goal, "profile updated, targets recalculated");
            } else {
                tracing::info!(user_id, "profile updated");
            }
            Ok(Some(resp))
        }
    }
}

/// Delete a user's profile. Settings and logs are kept.
pub fn delete_profile(db: &Database, user_id: &str) -> Result<bool, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = StoredProfile::delete(&conn, user_id)
        .map_err(|e| format!("Failed to delete profile: {}", e))?;
    if deleted {
        tracing::info!(user_id, "profile deleted");
    }
    Ok(deleted)
}
