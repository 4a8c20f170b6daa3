//! Goal calculator
//!
//! Derives daily calorie and macro targets from a biometric profile using the
//! Mifflin-St Jeor equation, or re-derives macros from a calorie goal the user
//! typed in directly.
//!
//! Three macro splits exist, one per entry point, and they deliberately do not
//! agree:
//!
//! | entry point                | protein            | carbs               | fats       |
//! |----------------------------|--------------------|---------------------|------------|
//! | profile save / edit        | 30% / 4            | 45% / 4             | 25% / 9    |
//! | manual calorie goal edit   | 30% / 4            | 40% / 4             | 30% / 9    |
//! | account settings save      | 2 g per kg weight  | remainder / 4       | 25% / 9    |
//!
//! Which one is canonical is an open product question. Each caller uses the
//! split for its own path; do not unify them here.

use serde::{Deserialize, Serialize};

use crate::models::{ActivityLevel, Goal, Sex, UserProfile};

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Calorie shift applied to TDEE for the weight-change goals
pub const GOAL_ADJUSTMENT_KCAL: f64 = 400.0;

/// Protein grams per kg bodyweight on the account settings path
pub const PROTEIN_G_PER_KG: f64 = 2.0;

/// Daily calorie and macro targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionTargets {
    pub calorie_goal: u32,
    pub protein_goal_g: u32,
    pub carbs_goal_g: u32,
    pub fats_goal_g: u32,
}

/// Macro goals in grams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MacroGoals {
    pub protein_g: u32,
    pub carbs_g: u32,
    pub fats_g: u32,
}

impl NutritionTargets {
    pub fn new(calorie_goal: u32, macros: MacroGoals) -> Self {
        Self {
            calorie_goal,
            protein_goal_g: macros.protein_g,
            carbs_goal_g: macros.carbs_g,
            fats_goal_g: macros.fats_g,
        }
    }

    pub fn macros(&self) -> MacroGoals {
        MacroGoals {
            protein_g: self.protein_goal_g,
            carbs_g: self.carbs_goal_g,
            fats_g: self.fats_goal_g,
        }
    }
}

/// Macro split policy, one per call site
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MacroSplit {
    /// 30/45/25, used when targets come from the profile
    Profile,
    /// 30/40/30, used when the user edits the calorie goal directly
    ManualCalorieEdit,
    /// Protein from bodyweight, fats 25%, carbs take the remainder
    BodyweightProtein { weight_kg: f64 },
}

/// Raw energy figures behind a calorie goal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyEstimate {
    pub bmr: f64,
    pub tdee: f64,
}

/// Basal metabolic rate (Mifflin-St Jeor)
pub fn bmr(profile: &UserProfile) -> f64 {
    let base = 10.0 * profile.weight_kg + 6.25 * profile.height_cm - 5.0 * profile.age as f64;
    match profile.sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    }
}

pub fn activity_multiplier(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::LightlyActive => 1.375,
        ActivityLevel::ModeratelyActive => 1.55,
        ActivityLevel::VeryActive => 1.725,
        ActivityLevel::ExtremelyActive => 1.9,
    }
}

pub fn goal_adjustment(goal: Goal) -> f64 {
    match goal {
        Goal::LoseWeight => -GOAL_ADJUSTMENT_KCAL,
        Goal::MaintainWeight => 0.0,
        Goal::GainWeight | Goal::BuildMuscle => GOAL_ADJUSTMENT_KCAL,
    }
}

/// BMR and TDEE for a profile
pub fn energy_estimate(profile: &UserProfile) -> EnergyEstimate {
    let bmr = bmr(profile);
    EnergyEstimate {
        bmr,
        tdee: bmr * activity_multiplier(profile.activity_level),
    }
}

/// Rounded kcal, floored at zero.
fn clamp_kcal(kcal: f64) -> u32 {
    if kcal.is_finite() && kcal > 0.0 {
        kcal.round() as u32
    } else {
        0
    }
}

fn grams(kcal: f64, kcal_per_g: f64) -> u32 {
    clamp_kcal(kcal / kcal_per_g)
}

/// Full targets from a validated profile, macros split 30/45/25.
pub fn compute_from_profile(profile: &UserProfile) -> NutritionTargets {
    let estimate = energy_estimate(profile);
    let calorie_goal = clamp_kcal(estimate.tdee + goal_adjustment(profile.goal));
    NutritionTargets::new(calorie_goal, split_macros(calorie_goal, MacroSplit::Profile))
}

/// Macros for a calorie goal the user entered directly, split 30/40/30.
pub fn compute_from_calorie_goal(calorie_goal: u32) -> MacroGoals {
    split_macros(calorie_goal, MacroSplit::ManualCalorieEdit)
}

/// Macros for the account settings path: 2 g protein per kg, fats 25%,
/// carbs from whatever calories remain.
pub fn compute_bodyweight_split(calorie_goal: u32, weight_kg: f64) -> MacroGoals {
    split_macros(calorie_goal, MacroSplit::BodyweightProtein { weight_kg })
}

pub fn split_macros(calorie_goal: u32, split: MacroSplit) -> MacroGoals {
    let kcal = calorie_goal as f64;
    match split {
        MacroSplit::Profile => MacroGoals {
            protein_g: grams(kcal * 0.30, KCAL_PER_G_PROTEIN),
            carbs_g: grams(kcal * 0.45, KCAL_PER_G_CARBS),
            fats_g: grams(kcal * 0.25, KCAL_PER_G_FAT),
        },
        MacroSplit::ManualCalorieEdit => MacroGoals {
            protein_g: grams(kcal * 0.30, KCAL_PER_G_PROTEIN),
            carbs_g: grams(kcal * 0.40, KCAL_PER_G_CARBS),
            fats_g: grams(kcal * 0.30, KCAL_PER_G_FAT),
        },
        MacroSplit::BodyweightProtein { weight_kg } => {
            let protein_g = clamp_kcal(weight_kg * PROTEIN_G_PER_KG);
            let fats_g = grams(kcal * 0.25, KCAL_PER_G_FAT);
            let remaining = kcal
                - (protein_g as f64 * KCAL_PER_G_PROTEIN + fats_g as f64 * KCAL_PER_G_FAT);
            MacroGoals {
                protein_g,
                carbs_g: grams(remaining, KCAL_PER_G_CARBS),
                fats_g,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(sex: Sex, activity_level: ActivityLevel, goal: Goal) -> UserProfile {
        UserProfile {
            age: 25,
            height_cm: 170.0,
            weight_kg: 70.0,
            sex,
            activity_level,
            goal,
            target_weight_kg: Some(65.0),
            medical_conditions: String::new(),
            allergies: String::new(),
        }
    }

    #[test]
    fn test_reference_male_maintain() {
        let p = profile(Sex::Male, ActivityLevel::ModeratelyActive, Goal::MaintainWeight);
        assert!((bmr(&p) - 1642.5).abs() < 1e-9);
        assert!((energy_estimate(&p).tdee - 2545.875).abs() < 1e-9);

        let targets = compute_from_profile(&p);
        assert_eq!(
            targets,
            NutritionTargets {
                calorie_goal: 2546,
                protein_goal_g: 191,
                carbs_goal_g: 286,
                fats_goal_g: 71,
            }
        );
    }

    #[test]
    fn test_female_bmr_offset() {
        let male = profile(Sex::Male, ActivityLevel::Sedentary, Goal::MaintainWeight);
        let female = profile(Sex::Female, ActivityLevel::Sedentary, Goal::MaintainWeight);
        assert!((bmr(&male) - bmr(&female) - 166.0).abs() < 1e-9);
    }

    #[test]
    fn test_goal_adjustments() {
        let base = compute_from_profile(&profile(Sex::Male, ActivityLevel::ModeratelyActive, Goal::MaintainWeight));
        let lose = compute_from_profile(&profile(Sex::Male, ActivityLevel::ModeratelyActive, Goal::LoseWeight));
        let gain = compute_from_profile(&profile(Sex::Male, ActivityLevel::ModeratelyActive, Goal::GainWeight));
        let muscle = compute_from_profile(&profile(Sex::Male, ActivityLevel::ModeratelyActive, Goal::BuildMuscle));

        assert_eq!(lose.calorie_goal, base.calorie_goal - 400);
        assert_eq!(gain.calorie_goal, base.calorie_goal + 400);
        assert_eq!(muscle.calorie_goal, gain.calorie_goal);
    }

    #[test]
    fn test_activity_multipliers() {
        assert_eq!(activity_multiplier(ActivityLevel::Sedentary), 1.2);
        assert_eq!(activity_multiplier(ActivityLevel::LightlyActive), 1.375);
        assert_eq!(activity_multiplier(ActivityLevel::ModeratelyActive), 1.55);
        assert_eq!(activity_multiplier(ActivityLevel::VeryActive), 1.725);
        assert_eq!(activity_multiplier(ActivityLevel::ExtremelyActive), 1.9);
        assert_eq!(activity_multiplier(ActivityLevel::from_str("unknown")), 1.55);
    }

    #[test]
    fn test_targets_never_negative_across_valid_profiles() {
        let levels = [
            ActivityLevel::Sedentary,
            ActivityLevel::LightlyActive,
            ActivityLevel::ModeratelyActive,
            ActivityLevel::VeryActive,
            ActivityLevel::ExtremelyActive,
        ];
        let goals = [Goal::LoseWeight, Goal::MaintainWeight, Goal::GainWeight, Goal::BuildMuscle];

        for sex in [Sex::Male, Sex::Female] {
            for level in levels {
                for goal in goals {
                    for (age, height_cm, weight_kg) in [(13, 100.0, 30.0), (120, 100.0, 30.0), (40, 250.0, 300.0)] {
                        let mut p = profile(sex, level, goal);
                        p.age = age;
                        p.height_cm = height_cm;
                        p.weight_kg = weight_kg;
                        let t = compute_from_profile(&p);
                        // u32 cannot go negative; check the clamp produced sane macros
                        if t.calorie_goal == 0 {
                            assert_eq!(t.macros(), MacroGoals::default());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_tiny_bmr_clamps_to_zero() {
        // 120 year old, 100 cm, 30 kg, female, losing weight: TDEE - 400 < 0
        let mut p = profile(Sex::Female, ActivityLevel::Sedentary, Goal::LoseWeight);
        p.age = 120;
        p.height_cm = 100.0;
        p.weight_kg = 30.0;
        let t = compute_from_profile(&p);
        assert_eq!(t.calorie_goal, 0);
        assert_eq!(t.macros(), MacroGoals::default());
    }

    #[test]
    fn test_manual_calorie_edit_split() {
        assert_eq!(
            compute_from_calorie_goal(2000),
            MacroGoals { protein_g: 150, carbs_g: 200, fats_g: 67 }
        );
        assert_eq!(compute_from_calorie_goal(0), MacroGoals::default());
    }

    #[test]
    fn test_bodyweight_split() {
        // protein 140, fats round(500/9)=56, carbs (2000 - 560 - 504)/4 = 234
        assert_eq!(
            compute_bodyweight_split(2000, 70.0),
            MacroGoals { protein_g: 140, carbs_g: 234, fats_g: 56 }
        );
    }

    #[test]
    fn test_bodyweight_split_floors_carbs() {
        let macros = compute_bodyweight_split(800, 300.0);
        assert_eq!(macros.protein_g, 600);
        assert_eq!(macros.carbs_g, 0);
    }
}
