//! Serving-size parsing
//!
//! Turns the free-text serving sizes found in food databases ("150g",
//! "1/2 cup 130 g", "2 tbsp") into grams, and builds the unit choices offered
//! when logging a food.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVING_GRAMS: f64 = 100.0;
pub const DEFAULT_SERVING_DISPLAY: &str = "100g";

pub const GRAMS_PER_CUP: f64 = 240.0;
pub const GRAMS_PER_TBSP: f64 = 15.0;
pub const GRAMS_PER_TSP: f64 = 5.0;
pub const GRAMS_PER_LITER: f64 = 1000.0;

macro_rules! serving_regex {
    ($name:ident, $pattern:expr) => {
        #[allow(clippy::expect_used)] // literal pattern
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("static regex should compile"));
    };
}

serving_regex!(GRAMS_RE, r"([0-9]+(?:\.[0-9]+)?)\s*(g|gram|grams)\b");
serving_regex!(ML_RE, r"([0-9]+(?:\.[0-9]+)?)\s*ml\b");
serving_regex!(LITER_RE, r"([0-9]+(?:\.[0-9]+)?)\s*l\b");
serving_regex!(FRACTION_RE, r"([0-9]+)\s*/\s*([0-9]+)");
serving_regex!(TBSP_RE, r"([0-9]+(?:\.[0-9]+)?)\s*(tablespoon|tbsp)\b");
serving_regex!(TSP_RE, r"([0-9]+(?:\.[0-9]+)?)\s*(teaspoon|tsp)\b");
serving_regex!(CUP_RE, r"([0-9]+(?:\.[0-9]+)?)\s*(cup|cups)\b");
serving_regex!(NUMBER_RE, r"([0-9]+(?:\.[0-9]+)?)");
serving_regex!(NA_RE, r"(?i)^na$");

/// A serving in grams plus the text to show for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServingSize {
    pub grams: f64,
    pub display: String,
}

impl ServingSize {
    fn new(grams: f64, display: impl Into<String>) -> Self {
        Self {
            grams,
            display: display.into(),
        }
    }

    pub fn default_serving() -> Self {
        Self::new(DEFAULT_SERVING_GRAMS, DEFAULT_SERVING_DISPLAY)
    }
}

impl Default for ServingSize {
    fn default() -> Self {
        Self::default_serving()
    }
}

/// First capture of `re` in `s` as a number
fn capture_number(re: &Regex, s: &str) -> Option<f64> {
    re.captures(s)?.get(1)?.as_str().parse().ok()
}

/// Parse a serving-size string. Never fails; anything unrecognised is 100 g.
///
/// Patterns are tried in order, first match wins: grams, ml, litres,
/// fractional cups, tablespoons, teaspoons, cups, then the first bare number
/// taken as grams.
pub fn parse_serving(raw: &str) -> ServingSize {
    let raw = raw.trim();
    if raw.is_empty() || NA_RE.is_match(raw) {
        return ServingSize::default_serving();
    }

    let s = raw.to_lowercase();

    if let Some(grams) = capture_number(&GRAMS_RE, &s) {
        return ServingSize::new(grams, raw);
    }
    if let Some(ml) = capture_number(&ML_RE, &s) {
        return ServingSize::new(ml, raw);
    }
    if let Some(liters) = capture_number(&LITER_RE, &s) {
        return ServingSize::new(liters * GRAMS_PER_LITER, raw);
    }
    if s.contains("cup") {
        if let Some(fraction) = parse_fraction(&s) {
            return ServingSize::new((fraction * GRAMS_PER_CUP).round(), raw);
        }
    }
    if let Some(tbsp) = capture_number(&TBSP_RE, &s) {
        return ServingSize::new(tbsp * GRAMS_PER_TBSP, raw);
    }
    if let Some(tsp) = capture_number(&TSP_RE, &s) {
        return ServingSize::new(tsp * GRAMS_PER_TSP, raw);
    }
    if let Some(cups) = capture_number(&CUP_RE, &s) {
        return ServingSize::new(cups * GRAMS_PER_CUP, raw);
    }
    if let Some(m) = NUMBER_RE.captures(&s).and_then(|c| c.get(1)) {
        if let Ok(grams) = m.as_str().parse() {
            return ServingSize::new(grams, format!("{}g", m.as_str()));
        }
    }

    ServingSize::default_serving()
}

/// `a/b` as a number. A zero denominator is not a fraction.
fn parse_fraction(s: &str) -> Option<f64> {
    let caps = FRACTION_RE.captures(s)?;
    let numerator: f64 = caps.get(1)?.as_str().parse().ok()?;
    let denominator: f64 = caps.get(2)?.as_str().parse().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

/// A portion unit the user can log a food in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementUnit {
    pub name: String,
    pub grams: f64,
    #[serde(default)]
    pub is_default: bool,
}

impl MeasurementUnit {
    fn new(name: impl Into<String>, grams: f64) -> Self {
        Self {
            name: name.into(),
            grams,
            is_default: false,
        }
    }
}

/// Units offered for a food: its default serving first, then gram units,
/// then household units guessed from the food name.
pub fn measurement_units(food_name: &str, serving: &ServingSize) -> Vec<MeasurementUnit> {
    let mut units = vec![
        MeasurementUnit {
            name: format!("1 serving ({})", serving.display),
            grams: serving.grams,
            is_default: true,
        },
        MeasurementUnit::new("1 gram", 1.0),
    ];

    if serving.grams != 100.0 {
        units.push(MeasurementUnit::new("100g", 100.0));
    }
    if serving.grams != 1.0 {
        units.push(MeasurementUnit::new("1g", 1.0));
    }

    let name = food_name.to_lowercase();
    let has = |word: &str| name.contains(word);
    if has("bread") || has("slice") {
        units.push(MeasurementUnit::new("1 slice", 30.0));
    } else if has("cup") || has("rice") || has("pasta") {
        units.push(MeasurementUnit::new("1 cup", 200.0));
        units.push(MeasurementUnit::new("1/2 cup", 100.0));
    } else if has("milk") || has("juice") {
        units.push(MeasurementUnit::new("1 cup (240ml)", 240.0));
    } else if has("egg") {
        units.push(MeasurementUnit::new("1 large egg", 50.0));
    }

    units
}

/// Multiplier against per-100 values for `amount` of a unit
pub fn quantity_multiplier(unit_grams: f64, amount: f64) -> f64 {
    unit_grams / 100.0 * amount
}
