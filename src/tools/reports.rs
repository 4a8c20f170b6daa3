//! Report generation tools
//!
//! Generate a weekly nutrition PDF: summary and daily table on page one, a
//! calorie bar chart against the goal on page two.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::NaiveDate;
use printpdf::*;
use printpdf::image_crate::{DynamicImage, ImageFormat, RgbImage};
use serde::Serialize;

use crate::db::Database;
use crate::models::{DailyLog, Goal, StoredProfile, UserSettings};
use crate::nutrition::dates::{days_before, format_iso_date, parse_or_today, weekday_abbrev};
use crate::nutrition::insights::{percent_of_goal, BandedDay, CalorieBand};
use crate::nutrition::{snapshot, GoalDirection, ProgressSnapshot, WeeklyInsights};

// ============================================================================
// Color Constants (RGB 0-255)
// ============================================================================

const COLOR_TITLE: (u8, u8, u8) = (46, 125, 50);
const COLOR_BLACK: (u8, u8, u8) = (0, 0, 0);
const COLOR_GRAY: (u8, u8, u8) = (128, 128, 128);

const CHART_WIDTH: u32 = 1000;
const CHART_HEIGHT: u32 = 400;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GenerateReportResponse {
    pub success: bool,
    pub file_path: String,
    pub days_logged: u32,
    pub goals_hit: u32,
    pub date_range: String,
    pub message: String,
}

// ============================================================================
// Chart Generation (plotters)
// ============================================================================

/// Daily calorie bars coloured by band, with the goal as a line.
/// Returns PNG bytes.
pub fn generate_calorie_chart(
    days: &[BandedDay],
    calorie_goal: u32,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    use plotters::prelude::*;

    if days.is_empty() {
        return Err("No data to chart".to_string());
    }

    let goal = calorie_goal as f64;
    let peak = days.iter().map(|d| d.calories).fold(0.0, f64::max);
    let y_max = (peak.max(goal) * 1.15).max(100.0);

    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let n = days.len() as i32;
        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0..n, 0.0..y_max)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(days.len())
            .x_label_formatter(&|x| {
                days.get(*x as usize)
                    .map(|d| format!("{} {}", weekday_abbrev(d.date), d.date.format("%m/%d")))
                    .unwrap_or_default()
            })
            .y_desc("kcal")
            .draw()
            .map_err(|e| e.to_string())?;

        chart
            .draw_series(days.iter().enumerate().map(|(i, day)| {
                let (r, g, b) = day.band.rgb();
                let x = i as i32;
                let mut bar = Rectangle::new([(x, 0.0), (x + 1, day.calories)], RGBColor(r, g, b).filled());
                bar.set_margin(0, 0, 12, 12);
                bar
            }))
            .map_err(|e| e.to_string())?;

        if calorie_goal > 0 {
            chart
                .draw_series(LineSeries::new(
                    vec![(0, goal), (n, goal)],
                    ShapeStyle::from(&BLACK).stroke_width(2),
                ))
                .map_err(|e| e.to_string())?
                .label(format!("Goal {} kcal", calorie_goal))
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(|e| e.to_string())?;
        }

        root.present().map_err(|e| e.to_string())?;
    }

    // Convert RGB buffer to PNG
    let img = RgbImage::from_raw(width, height, buffer).ok_or("Failed to create image from buffer")?;

    let mut png_bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    Ok(png_bytes)
}

// ============================================================================
// PDF Generation Helper Functions
// ============================================================================

fn rgb_to_printpdf(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn add_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    x: Mm,
    y: Mm,
    size: f32,
    color: (u8, u8, u8),
) {
    layer.set_fill_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.use_text(text, size, x, y, font);
}

fn add_line(layer: &PdfLayerReference, x1: Mm, y1: Mm, x2: Mm, y2: Mm, color: (u8, u8, u8), width: f32) {
    layer.set_outline_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.set_outline_thickness(width);

    let line = Line {
        points: vec![(Point::new(x1, y1), false), (Point::new(x2, y2), false)],
        is_closed: false,
    };
    layer.add_line(line);
}

// ============================================================================
// Weekly Report Generation
// ============================================================================

/// Generate the weekly nutrition PDF for the 7 days ending `end_date`
/// (today when absent).
pub fn generate_weekly_report(
    db: &Database,
    user_id: &str,
    end_date: Option<&str>,
    output_path: &str,
) -> Result<GenerateReportResponse, String> {
    let end = parse_or_today(end_date)?;
    let start = days_before(end, 6).ok_or("End date is too early")?;

    let conn = db.get_conn().map_err(|e| e.to_string())?;

    let logs = DailyLog::load_all(&conn, user_id).map_err(|e| e.to_string())?;
    let settings = UserSettings::get_or_default(&conn, user_id).map_err(|e| e.to_string())?;
    let goal = StoredProfile::get(&conn, user_id)
        .map_err(|e| e.to_string())?
        .map(|p| p.profile.goal)
        .unwrap_or(Goal::MaintainWeight);
    drop(conn);

    let progress = snapshot(&logs, end);
    let days_logged = progress
        .weekly_data
        .iter()
        .filter(|d| logs.get(&d.date).map_or(false, DailyLog::is_logged))
        .count() as u32;

    if days_logged == 0 {
        return Err(format!(
            "No food logged between {} and {}",
            format_iso_date(start),
            format_iso_date(end)
        ));
    }

    let insights = WeeklyInsights::new(&progress.weekly_data, settings.calorie_goal, GoalDirection::from(goal));

    let report = WeeklyReport {
        start,
        end,
        settings: &settings,
        progress: &progress,
        insights: &insights,
        days_logged,
    };
    let doc = report.render()?;

    // Save PDF
    let path = Path::new(output_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }

    let file = File::create(path).map_err(|e| e.to_string())?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer).map_err(|e| e.to_string())?;

    tracing::info!(user_id, path = output_path, days_logged, "weekly report generated");

    let date_range = format!("{} to {}", format_iso_date(start), format_iso_date(end));
    Ok(GenerateReportResponse {
        success: true,
        file_path: output_path.to_string(),
        days_logged,
        goals_hit: insights.goals_hit,
        message: format!(
            "Weekly report generated for {} with {} of 7 days logged",
            date_range, days_logged
        ),
        date_range,
    })
}

struct WeeklyReport<'a> {
    start: NaiveDate,
    end: NaiveDate,
    settings: &'a UserSettings,
    progress: &'a ProgressSnapshot,
    insights: &'a WeeklyInsights,
    days_logged: u32,
}

impl WeeklyReport<'_> {
    fn render(&self) -> Result<PdfDocumentReference, String> {
        // Page 1 Portrait
        let (doc, page1, layer1) = PdfDocument::new(
            "Weekly Nutrition Report",
            Mm(215.9), // Letter width
            Mm(279.4), // Letter height
            "Layer 1",
        );

        let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| e.to_string())?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| e.to_string())?;

        let layer = doc.get_page(page1).get_layer(layer1);
        self.render_summary_page(&layer, &font, &font_bold);

        // Page 2 Landscape for the chart
        let (page2, layer2) = doc.add_page(Mm(279.4), Mm(215.9), "Chart Page");
        let layer2 = doc.get_page(page2).get_layer(layer2);
        self.render_chart_page(&layer2, &font, &font_bold)?;

        Ok(doc)
    }

    fn render_summary_page(&self, layer: &PdfLayerReference, font: &IndirectFontRef, font_bold: &IndirectFontRef) {
        let settings = self.settings;
        let insights = self.insights;
        let margin_left = 15.0;
        let mut y = 279.4 - 20.0;

        add_text(layer, font_bold, "Weekly Nutrition Report", Mm(margin_left), Mm(y), 18.0, COLOR_TITLE);
        y -= 10.0;

        add_text(
            layer,
            font,
            &format!("Report Period: {} to {}", format_iso_date(self.start), format_iso_date(self.end)),
            Mm(margin_left),
            Mm(y),
            11.0,
            COLOR_BLACK,
        );
        let now = chrono::Utc::now().format("%Y-%m-%d").to_string();
        add_text(layer, font, &format!("Generated: {}", now), Mm(120.0), Mm(y), 11.0, COLOR_BLACK);
        y -= 10.0;

        add_line(layer, Mm(margin_left), Mm(y), Mm(200.0), Mm(y), COLOR_GRAY, 0.5);
        y -= 8.0;

        // Summary section
        add_text(layer, font_bold, "Summary", Mm(margin_left), Mm(y), 12.0, COLOR_BLACK);
        y -= 7.0;

        let summary_rows = [
            (
                format!("Days Logged: {} of 7", self.days_logged),
                format!("Goals Hit: {} of 7", insights.goals_hit),
            ),
            (
                format!("Current Streak: {} days", self.progress.current_streak),
                format!("Longest Streak: {} days", self.progress.longest_streak),
            ),
            (
                format!("Avg Calories: {:.0} / {} kcal", insights.average.calories, settings.calorie_goal),
                format!("Avg Protein: {:.0} / {} g", insights.average.protein, settings.protein_goal_g),
            ),
            (
                format!("Avg Carbs: {:.0} / {} g", insights.average.carbs, settings.carbs_goal_g),
                format!("Avg Fats: {:.0} / {} g", insights.average.fats, settings.fats_goal_g),
            ),
        ];
        for (left, right) in &summary_rows {
            add_text(layer, font, left, Mm(margin_left), Mm(y), 10.0, COLOR_BLACK);
            add_text(layer, font, right, Mm(100.0), Mm(y), 10.0, COLOR_BLACK);
            y -= 6.0;
        }
        y -= 6.0;

        // Daily table
        add_text(layer, font_bold, "Daily Intake", Mm(margin_left), Mm(y), 12.0, COLOR_BLACK);
        y -= 7.0;

        let col_widths = [24.0, 14.0, 22.0, 22.0, 22.0, 22.0, 18.0, 30.0];
        let headers = ["Date", "Day", "Calories", "Protein", "Carbs", "Fats", "% Goal", "Status"];

        let mut col_x = margin_left;
        for (i, header) in headers.iter().enumerate() {
            add_text(layer, font_bold, header, Mm(col_x), Mm(y), 9.0, COLOR_BLACK);
            col_x += col_widths[i];
        }
        y -= 5.5;

        for (day, banded) in self.progress.weekly_data.iter().zip(&insights.days) {
            let row_color = banded.band.rgb();
            let values = [
                format_iso_date(day.date),
                weekday_abbrev(day.date).to_string(),
                format!("{:.0}", day.calories),
                format!("{:.1} g", day.protein),
                format!("{:.1} g", day.carbs),
                format!("{:.1} g", day.fats),
                format!("{}%", percent_of_goal(day.calories, settings.calorie_goal as f64)),
                banded.band.label().to_string(),
            ];

            col_x = margin_left;
            for (i, value) in values.iter().enumerate() {
                let color = if i == 2 || i >= 6 { row_color } else { COLOR_BLACK };
                add_text(layer, font, value, Mm(col_x), Mm(y), 8.5, color);
                col_x += col_widths[i];
            }
            y -= 5.0;
        }
    }

    fn render_chart_page(
        &self,
        layer: &PdfLayerReference,
        font: &IndirectFontRef,
        font_bold: &IndirectFontRef,
    ) -> Result<(), String> {
        let margin_left = 15.0;
        let mut y = 215.9 - 20.0;

        add_text(layer, font_bold, "Daily Calories", Mm(margin_left), Mm(y), 16.0, COLOR_TITLE);
        add_text(
            layer,
            font,
            &format!("{} - {}", format_iso_date(self.start), format_iso_date(self.end)),
            Mm(120.0),
            Mm(y),
            11.0,
            COLOR_BLACK,
        );
        y -= 10.0;

        match generate_calorie_chart(&self.insights.days, self.settings.calorie_goal, CHART_WIDTH, CHART_HEIGHT) {
            Ok(png_bytes) => {
                let dynamic_image =
                    printpdf::image_crate::load_from_memory(&png_bytes).map_err(|e| e.to_string())?;
                let pdf_image = Image::from_dynamic_image(&dynamic_image);

                // 1000x400 pixels at 120 DPI is about 212mm x 85mm
                let transform = ImageTransform {
                    translate_x: Some(Mm(margin_left)),
                    translate_y: Some(Mm(y - 90.0)),
                    dpi: Some(120.0),
                    ..Default::default()
                };

                pdf_image.add_to_layer(layer.clone(), transform);
                y -= 95.0;
            }
            Err(e) => {
                tracing::warn!(error = %e, "calorie chart failed");
                add_text(
                    layer,
                    font,
                    &format!("Chart generation error: {}", e),
                    Mm(margin_left),
                    Mm(y - 10.0),
                    9.0,
                    CalorieBand::Over.rgb(),
                );
                y -= 15.0;
            }
        }

        // Legend
        y -= 5.0;
        add_text(layer, font_bold, "Legend:", Mm(margin_left), Mm(y), 10.0, COLOR_BLACK);
        let bands = [
            CalorieBand::OnTarget,
            CalorieBand::Approaching,
            CalorieBand::Over,
            CalorieBand::Under,
        ];
        let mut x = 45.0;
        for band in bands {
            add_text(layer, font, band.label(), Mm(x), Mm(y), 10.0, band.rgb());
            x += 40.0;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::food_log::{log_food, FoodInput, Portion};
    use crate::tools::test_support::test_db;

    fn log_kcal(db: &Database, date: &str, kcal: f64) {
        let food = FoodInput {
            name: "Lentil soup".to_string(),
            brand: None,
            serving_size: Some("100g".to_string()),
            calories_per_100: kcal,
            protein_per_100: 9.0,
            carbs_per_100: 20.0,
            fats_per_100: 0.4,
        };
        log_food(db, "u1", Some(date), "lunch", food, Portion::default()).unwrap();
    }

    #[test]
    fn test_report_requires_logged_days() {
        let (dir, db) = test_db();
        let out = dir.path().join("empty.pdf");
        let err = generate_weekly_report(&db, "u1", Some("2025-06-10"), out.to_str().unwrap()).unwrap_err();
        assert!(err.contains("No food logged"));
        assert!(!out.exists());
    }

    #[test]
    fn test_report_writes_pdf() {
        let (dir, db) = test_db();
        log_kcal(&db, "2025-06-08", 1900.0);
        log_kcal(&db, "2025-06-10", 2600.0);
        // outside the window
        log_kcal(&db, "2025-06-01", 2000.0);

        let out = dir.path().join("reports").join("week.pdf");
        let resp = generate_weekly_report(&db, "u1", Some("2025-06-10"), out.to_str().unwrap()).unwrap();

        assert!(resp.success);
        assert_eq!(resp.days_logged, 2);
        assert_eq!(resp.goals_hit, 1);
        assert_eq!(resp.date_range, "2025-06-04 to 2025-06-10");

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
