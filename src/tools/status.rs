//! FitCo Status Tool
//!
//! Runtime status of the service, plus the usage guide served to assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Usage instructions for AI assistants
pub const USAGE_INSTRUCTIONS: &str = r#"
# FitCo Usage Instructions

FitCo computes daily calorie and macro targets from a user's profile, logs
foods against those targets, and reports streaks and weekly progress.

Every tool takes a `user_id`. It is an opaque string chosen by the caller;
FitCo never resolves identities itself.

---

## 1. Set Up a Profile

**Tool:** `save_profile`

| Field | Range / values |
|-------|----------------|
| age | 13 - 120 |
| height_cm | 100 - 250 |
| weight_kg | 30 - 300 |
| sex | male, female |
| activity_level | sedentary, lightly_active, moderately_active (default), very_active, extremely_active |
| goal | lose_weight, maintain_weight, gain_weight, build_muscle |
| target_weight_kg | 30 - 300, required for lose_weight and gain_weight |

Saving computes targets and writes them into the user's settings:

- BMR (Mifflin-St Jeor): 10 x kg + 6.25 x cm - 5 x age, then +5 (male) or -161 (female)
- TDEE = BMR x activity multiplier (1.2 / 1.375 / 1.55 / 1.725 / 1.9)
- Calorie goal = TDEE - 400 (lose), + 0 (maintain), + 400 (gain, build muscle)
- Macros: protein 30% / 4, carbs 45% / 4, fats 25% / 9

`update_profile` takes any subset of fields. Targets are only recomputed when
age, height, weight, sex, activity level or goal changed.

---

## 2. Adjust Goals Directly

- `set_calorie_goal`: the user types a calorie goal. Macros become
  protein 30% / 4, carbs 40% / 4, fats 30% / 9.
- `sync_account_goals`: calorie goal from the profile, macros from bodyweight:
  protein 2 g per kg, fats 25% / 9, carbs take the remaining calories.

These three splits differ on purpose. Use the tool that matches what the user
did.

`update_settings` changes reminders (`daily_reminders`, `reminder_time` as
HH:MM) and `language` (en, ar).

---

## 3. Log Food

**Tool:** `log_food`

Nutrition is always given **per 100 g (or ml)**. The amount eaten is
`unit_grams x amount`; without `unit_grams` the food's `serving_size` text is
parsed:

| Serving text | Grams |
|--------------|-------|
| 150g, 30 grams | as written |
| 250 ml | 250 |
| 1.5 l | 1500 |
| 1/2 cup | 120 (240 per cup) |
| 2 tbsp | 30 |
| 3 tsp | 15 |
| 2 cups | 480 |
| anything else with a number | that number |
| empty, NA, no number | 100 |

Call `parse_serving` first to see the parsed grams and the unit choices
(1 serving, 1 gram, 100g, 1 slice, 1 cup, ...) to offer the user.

`meal_type`: breakfast, lunch, dinner, snacks. Unknown values log to breakfast.

`date` is YYYY-MM-DD and defaults to today (UTC).

Remove an entry with `remove_food` using the `entry.id` returned by
`log_food` or `get_day_log`. Day totals are recomputed from the remaining
foods on every change.

---

## 4. Progress

**Tool:** `get_progress`

- `current_streak`: consecutive logged days ending today. If today has nothing
  logged yet, the streak counts back from yesterday.
- `longest_streak`: longest run of logged days. A calendar day with no log
  breaks a run.
- `weekly_data`: the last 7 days, oldest first, zeros for days with no log.
- insights: weekly averages (sum / 7), goals hit (days within 10% of the
  calorie goal), and a band per day (over, on target, approaching, under)
  that depends on the goal direction.

**Tool:** `generate_weekly_report` writes a PDF with a summary, a daily table
coloured by band, and a calorie bar chart.

---

## Quick Reference

| Task | Tool |
|------|------|
| Create or replace profile | `save_profile` |
| Edit a few profile fields | `update_profile` |
| View targets and preferences | `get_settings` |
| Type in a calorie goal | `set_calorie_goal` |
| Bodyweight-based macros | `sync_account_goals` |
| Work out a serving | `parse_serving` |
| Log / remove food | `log_food` / `remove_food` |
| View a day | `get_day_log` |
| Repair a day's totals | `recalculate_day_totals` |
| Streaks and weekly insights | `get_progress` |
| Weekly PDF | `generate_weekly_report` |
"#;

/// Runtime status of the FitCo service
#[derive(Debug, Clone, Serialize)]
pub struct FitcoStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    pub fn get_status(&self) -> FitcoStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        FitcoStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_database_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fitco.db");

        let tracker = StatusTracker::new(path.clone());
        assert_eq!(tracker.get_status().database_size_bytes, None);

        std::fs::write(&path, b"0123456789").unwrap();
        let status = tracker.get_status();
        assert_eq!(status.database_size_bytes, Some(10));
        assert_eq!(status.process_id, std::process::id());
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_instructions_name_every_tool() {
        for tool in [
            "save_profile",
            "update_profile",
            "get_settings",
            "update_settings",
            "set_calorie_goal",
            "sync_account_goals",
            "parse_serving",
            "log_food",
            "remove_food",
            "get_day_log",
            "recalculate_day_totals",
            "get_progress",
            "generate_weekly_report",
        ] {
            assert!(USAGE_INSTRUCTIONS.contains(tool), "{} missing", tool);
        }
    }
}
