//! Nutrition engine
//!
//! Pure computations over profiles and daily logs: calorie and macro goals,
//! streaks and weekly windows, derived insights, and serving-size parsing.

pub mod dates;
pub mod goals;
pub mod insights;
pub mod progress;
pub mod serving;

pub use goals::{
    compute_bodyweight_split, compute_from_calorie_goal, compute_from_profile, energy_estimate,
    EnergyEstimate, MacroGoals, NutritionTargets,
};
pub use insights::{CalorieBand, GoalDirection, StreakMilestone, WeeklyInsights};
pub use progress::{
    current_streak, longest_streak, snapshot, total_days_logged, weekly_window,
    ProgressSnapshot, WeeklyDay,
};
pub use serving::{measurement_units, parse_serving, quantity_multiplier, MeasurementUnit, ServingSize};
