//! Recalculate the stored nutrition totals of every daily log for a user
//! Usage: cargo run --bin recalculate_logs -- <user_id>

use fitco::models::{recalculate_log_totals, DailyLog};
use fitco::nutrition::dates::format_iso_date;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let user_id = match args.get(1) {
        Some(id) => id.as_str(),
        None => {
            eprintln!("Usage: recalculate_logs <user_id>");
            std::process::exit(2);
        }
    };

    let db_path = fitco::db::database_path();
    println!("Database: {}", db_path.display());

    let database = fitco::db::open_and_migrate(&db_path)?;

    database.with_conn(|conn| {
        let dates = DailyLog::list_dates(conn, user_id)?;
        println!("Found {} logged days for {}", dates.len(), user_id);

        let mut changed = 0;
        for date in dates {
            let Some(log_id) = DailyLog::log_id(conn, user_id, date)? else {
                continue;
            };

            let old = DailyLog::cached_totals(conn, log_id)?;
            let new = recalculate_log_totals(conn, log_id)?;

            if old != new {
                changed += 1;
                println!("\n{}", format_iso_date(date));
                println!("  Old: {:.1} kcal, P {:.1} g, C {:.1} g, F {:.1} g",
                    old.calories, old.protein, old.carbs, old.fats);
                println!("  New: {:.1} kcal, P {:.1} g, C {:.1} g, F {:.1} g",
                    new.calories, new.protein, new.carbs, new.fats);
            }
        }

        println!("\n{} day(s) corrected", changed);
        Ok(())
    })?;

    Ok(())
}
