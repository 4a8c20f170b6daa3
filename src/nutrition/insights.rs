//! Derived progress insights
//!
//! Presentation policies layered over the weekly window: averages, goals hit,
//! calorie banding and streak milestones.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Goal, Nutrition};
use super::dates::days_before;
use super::progress::{WeeklyDay, WEEK_DAYS};

/// Milestones fall on every multiple of this many days
pub const MILESTONE_DAYS: u32 = 7;

/// Calories within this fraction of the goal count as a hit
pub const GOAL_HIT_TOLERANCE: f64 = 0.10;

pub const MIN_BAR_PERCENT: f64 = 5.0;
pub const MAX_BAR_PERCENT: f64 = 100.0;

/// Direction of the user's weight goal, as the calorie bands see it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalDirection {
    Gain,
    Maintain,
    Lose,
}

impl From<Goal> for GoalDirection {
    fn from(goal: Goal) -> Self {
        match goal {
            Goal::LoseWeight => GoalDirection::Lose,
            Goal::MaintainWeight => GoalDirection::Maintain,
            Goal::GainWeight | Goal::BuildMuscle => GoalDirection::Gain,
        }
    }
}

/// Where a day's calories sit relative to the goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalorieBand {
    Over,
    OnTarget,
    Approaching,
    Under,
}

impl CalorieBand {
    /// Classify by ratio of calories to goal.
    ///
    /// | direction | over   | on target  | approaching |
    /// |-----------|--------|------------|-------------|
    /// | gain      | >= 1.1 | >= 0.9     | >= 0.7      |
    /// | maintain  | >= 1.2 | 0.9 to 1.1 | >= 0.7      |
    /// | lose      | >= 1.2 | 0.8 to 1.0 | >= 0.6      |
    ///
    /// Anything else is under. A ratio that falls between on-target and over
    /// counts as approaching. With a zero goal, any calories are over.
    pub fn classify(calories: f64, goal: f64, direction: GoalDirection) -> Self {
        if goal <= 0.0 {
            return if calories > 0.0 { CalorieBand::Over } else { CalorieBand::Under };
        }

        let ratio = calories / goal;
        let (over, on_low, on_high, approaching) = match direction {
            GoalDirection::Gain => (1.1, 0.9, f64::INFINITY, 0.7),
            GoalDirection::Maintain => (1.2, 0.9, 1.1, 0.7),
            GoalDirection::Lose => (1.2, 0.8, 1.0, 0.6),
        };

        if ratio >= over {
            CalorieBand::Over
        } else if ratio >= on_low && ratio <= on_high {
            CalorieBand::OnTarget
        } else if ratio >= approaching {
            CalorieBand::Approaching
        } else {
            CalorieBand::Under
        }
    }

    /// Bar colour as RGB
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            CalorieBand::Over => (0xE7, 0x4C, 0x3C),
            CalorieBand::OnTarget => (0x4C, 0xAF, 0x50),
            CalorieBand::Approaching => (0xFF, 0xA5, 0x00),
            CalorieBand::Under => (0x66, 0x66, 0x66),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CalorieBand::Over => "Over",
            CalorieBand::OnTarget => "On target",
            CalorieBand::Approaching => "Approaching",
            CalorieBand::Under => "Under",
        }
    }
}

/// Weekly average per field, each `round(sum / 7)`
pub fn weekly_average(week: &[WeeklyDay]) -> Nutrition {
    let total: Nutrition = week.iter().map(WeeklyDay::totals).sum();
    let days = WEEK_DAYS as f64;
    Nutrition::new(
        (total.calories / days).round(),
        (total.protein / days).round(),
        (total.carbs / days).round(),
        (total.fats / days).round(),
    )
}

/// Days whose calories are within 10% of the goal. 0 when there is no goal.
pub fn goals_hit(week: &[WeeklyDay], calorie_goal: u32) -> u32 {
    if calorie_goal == 0 {
        return 0;
    }
    let goal = calorie_goal as f64;
    let low = goal * (1.0 - GOAL_HIT_TOLERANCE);
    let high = goal * (1.0 + GOAL_HIT_TOLERANCE);
    week.iter()
        .filter(|day| day.calories >= low && day.calories <= high)
        .count() as u32
}

/// Rounded percent of goal, 0 when there is no goal
pub fn percent_of_goal(value: f64, goal: f64) -> u32 {
    if goal > 0.0 && value > 0.0 {
        (value / goal * 100.0).round() as u32
    } else {
        0
    }
}

/// Bar height as a percent of `max`, clamped to 5..=100
pub fn bar_height_percent(value: f64, max: f64) -> f64 {
    if max <= 0.0 || !value.is_finite() {
        return MIN_BAR_PERCENT;
    }
    (value / max * 100.0).clamp(MIN_BAR_PERCENT, MAX_BAR_PERCENT)
}

/// Progress toward the next streak milestone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreakMilestone {
    pub next_milestone: u32,
    pub days_to_milestone: u32,
    pub progress_percent: f64,
    /// First day of the current streak, None with no streak
    pub streak_start: Option<NaiveDate>,
}

impl StreakMilestone {
    /// `streak_end` is the last logged day of the streak: today, or
    /// yesterday while today is still unlogged.
    pub fn new(current_streak: u32, streak_end: NaiveDate) -> Self {
        let next_milestone = (current_streak + 1).div_ceil(MILESTONE_DAYS) * MILESTONE_DAYS;
        let progress_percent =
            (current_streak % MILESTONE_DAYS) as f64 / MILESTONE_DAYS as f64 * 100.0;
        let streak_start = match current_streak {
            0 => None,
            n => days_before(streak_end, u64::from(n - 1)),
        };

        Self {
            next_milestone,
            days_to_milestone: next_milestone - current_streak,
            progress_percent,
            streak_start,
        }
    }
}

/// One day of the weekly window with its band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandedDay {
    pub date: NaiveDate,
    pub calories: f64,
    pub band: CalorieBand,
    pub bar_height_percent: f64,
}

/// Everything the insights view shows for a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyInsights {
    pub average: Nutrition,
    pub goals_hit: u32,
    pub direction: GoalDirection,
    pub days: Vec<BandedDay>,
}

impl WeeklyInsights {
    pub fn new(week: &[WeeklyDay], calorie_goal: u32, direction: GoalDirection) -> Self {
        let goal = calorie_goal as f64;
        let days = week
            .iter()
            .map(|day| BandedDay {
                date: day.date,
                calories: day.calories,
                band: CalorieBand::classify(day.calories, goal, direction),
                bar_height_percent: bar_height_percent(day.calories, goal),
            })
            .collect();

        Self {
            average: weekly_average(week),
            goals_hit: goals_hit(week, calorie_goal),
            direction,
            days,
        }
    }
}
