//! Progress aggregation
//!
//! Streaks and the 7-day window over a user's [`LogBook`]. Every function here
//! is a read-only projection of the map it is given.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{LogBook, Nutrition};
use super::dates::{calendar_range, days_before};

/// Days in the weekly window
pub const WEEK_DAYS: u64 = 7;

/// One day of the weekly window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyDay {
    pub date: NaiveDate,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl WeeklyDay {
    fn new(date: NaiveDate, totals: Nutrition) -> Self {
        Self {
            date,
            calories: totals.calories,
            protein: totals.protein,
            carbs: totals.carbs,
            fats: totals.fats,
        }
    }

    pub fn totals(&self) -> Nutrition {
        Nutrition::new(self.calories, self.protein, self.carbs, self.fats)
    }
}

/// Streak counts plus the weekly window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days_logged: u32,
    pub weekly_data: Vec<WeeklyDay>,
}

/// A date is logged iff its log has at least one food.
pub fn is_logged(logs: &LogBook, date: NaiveDate) -> bool {
    logs.get(&date).map_or(false, |log| log.is_logged())
}

/// Consecutive logged days ending today, or ending yesterday when today has
/// nothing logged yet.
pub fn current_streak(logs: &LogBook, today: NaiveDate) -> u32 {
    let start = if is_logged(logs, today) {
        Some(today)
    } else {
        days_before(today, 1)
    };

    let mut streak = 0;
    let mut day = start;
    while let Some(date) = day {
        if !is_logged(logs, date) {
            break;
        }
        streak += 1;
        day = days_before(date, 1);
    }
    streak
}

/// Longest run of logged days. Walks every calendar date between the first
/// and last key, so dates missing from the map break a run.
pub fn longest_streak(logs: &LogBook) -> u32 {
    let (Some(first), Some(last)) = (logs.keys().next(), logs.keys().next_back()) else {
        return 0;
    };

    let mut longest = 0;
    let mut run = 0;
    for date in calendar_range(*first, *last) {
        if is_logged(logs, date) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

pub fn total_days_logged(logs: &LogBook) -> u32 {
    logs.values().filter(|log| log.is_logged()).count() as u32
}

/// `today - 6` through `today`, oldest first, zero-filled for absent dates
pub fn weekly_window(logs: &LogBook, today: NaiveDate) -> Vec<WeeklyDay> {
    (0..WEEK_DAYS)
        .rev()
        .filter_map(|offset| days_before(today, offset))
        .map(|date| {
            let totals = logs.get(&date).map(|log| log.totals()).unwrap_or_default();
            WeeklyDay::new(date, totals)
        })
        .collect()
}

pub fn snapshot(logs: &LogBook, today: NaiveDate) -> ProgressSnapshot {
    ProgressSnapshot {
        current_streak: current_streak(logs, today),
        longest_streak: longest_streak(logs),
        total_days_logged: total_days_logged(logs),
        weekly_data: weekly_window(logs, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyLog, FoodItem, LoggedFoodEntry, MealType};
    use crate::nutrition::dates::parse_iso_date;
    use chrono::Utc;

    fn d(s: &str) -> NaiveDate {
        parse_iso_date(s).unwrap()
    }

    fn entry(calories: f64) -> LoggedFoodEntry {
        LoggedFoodEntry {
            id: 1,
            food_item: FoodItem {
                name: "Apple".to_string(),
                brand: None,
                serving_size: None,
                nutrition_per_100: Nutrition::new(calories, 1.0, 2.0, 3.0),
            },
            quantity_multiplier: 1.0,
            meal_type: MealType::Snacks,
            timestamp: Utc::now(),
        }
    }

    fn book(logged: &[&str]) -> LogBook {
        logged
            .iter()
            .map(|s| (d(s), DailyLog::with_foods(d(s), vec![entry(100.0)])))
            .collect()
    }

    #[test]
    fn test_current_streak_counts_today() {
        let logs = book(&["2025-06-08", "2025-06-09", "2025-06-10"]);
        assert_eq!(current_streak(&logs, d("2025-06-10")), 3);
    }

    #[test]
    fn test_current_streak_grace_period() {
        let logs = book(&["2025-06-07", "2025-06-08", "2025-06-09"]);
        assert_eq!(current_streak(&logs, d("2025-06-10")), 3);
    }

    #[test]
    fn test_current_streak_broken() {
        let logs = book(&["2025-06-01", "2025-06-02", "2025-06-03", "2025-06-08"]);
        assert_eq!(current_streak(&logs, d("2025-06-10")), 0);
        assert_eq!(current_streak(&LogBook::new(), d("2025-06-10")), 0);
    }

    #[test]
    fn test_empty_log_does_not_count() {
        let mut logs = book(&["2025-06-09"]);
        logs.insert(d("2025-06-10"), DailyLog::new(d("2025-06-10")));
        logs.insert(d("2025-06-08"), DailyLog::new(d("2025-06-08")));

        assert_eq!(current_streak(&logs, d("2025-06-10")), 1);
        assert_eq!(total_days_logged(&logs), 1);
        assert_eq!(longest_streak(&logs), 1);
    }

    #[test]
    fn test_longest_streak_calendar_gap_breaks_run() {
        let logs = book(&["2025-06-01", "2025-06-02", "2025-06-03", "2025-06-05"]);
        assert_eq!(longest_streak(&logs), 3);

        let logs = book(&["2025-01-01", "2025-01-11", "2025-01-12"]);
        assert_eq!(longest_streak(&logs), 2);
        assert_eq!(longest_streak(&LogBook::new()), 0);
    }

    #[test]
    fn test_longest_streak_across_month_boundary() {
        let logs = book(&["2024-02-28", "2024-02-29", "2024-03-01"]);
        assert_eq!(longest_streak(&logs), 3);
    }

    #[test]
    fn test_weekly_window_shape() {
        let logs = book(&["2025-06-04", "2025-06-10", "2025-05-30"]);
        let week = weekly_window(&logs, d("2025-06-10"));

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, d("2025-06-04"));
        assert_eq!(week[6].date, d("2025-06-10"));
        assert!(week.windows(2).all(|w| w[0].date < w[1].date));

        assert_eq!(week[0].calories, 100.0);
        assert_eq!(week[6].fats, 3.0);
        for day in &week[1..6] {
            assert_eq!(day.totals(), Nutrition::zero());
        }
    }

    #[test]
    fn test_aggregates_are_idempotent() {
        let logs = book(&["2025-06-05", "2025-06-06", "2025-06-09"]);
        let before = logs.clone();
        let today = d("2025-06-10");

        let first = snapshot(&logs, today);
        let second = snapshot(&logs, today);
        assert_eq!(first, second);
        assert_eq!(logs, before);

        assert_eq!(first.current_streak, 1);
        assert_eq!(first.longest_streak, 2);
        assert_eq!(first.total_days_logged, 3);
    }
}
