//! Extracts electrical-parameter keywords ("10k", "0.25w", "5%") from a free-text
//! search and turns them into structured vendor filters.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::service::taxonomy::{self, ParameterId};
use crate::types::MountingType;

/// Prefix DigiKey uses for unit-valued parametric ids.
const VALUE_MARKER: char = 'u';

/// Largest denominator tried when turning a decimal wattage into a fraction.
const MAX_DENOMINATOR: u32 = 100;
const FRACTION_TOLERANCE: f64 = 0.01;

static PERCENT: LazyLock<Regex> = LazyLock::new(|| unit_regex(r"%"));
static POWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+(?:\.\d+)?|\d+/\d+)(w)$").expect("valid regex"));
static RESISTANCE: LazyLock<Regex> = LazyLock::new(|| unit_regex(r"k|m|ohms?|Ω"));
static CAPACITANCE: LazyLock<Regex> = LazyLock::new(|| unit_regex(r"uf|µf|nf|pf"));
static VOLTAGE: LazyLock<Regex> = LazyLock::new(|| unit_regex(r"kv|mv|v"));
static CURRENT: LazyLock<Regex> = LazyLock::new(|| unit_regex(r"ma|ua|µa|a"));
static INDUCTANCE: LazyLock<Regex> = LazyLock::new(|| unit_regex(r"mh|uh|µh|nh|h"));

fn unit_regex(units: &str) -> Regex {
    Regex::new(&format!(r"(?i)^(\d+(?:\.\d+)?)({units})$")).expect("valid regex")
}

/// A structured filter sent alongside (or instead of) free-text keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParametricFilter {
    pub parameter_id: ParameterId,
    pub value_id: String,
    /// Human-readable value, used by vendors that filter on text.
    pub label: String,
}

impl ParametricFilter {
    fn new(parameter_id: ParameterId, value_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            parameter_id,
            value_id: value_id.into(),
            label: label.into(),
        }
    }
}

/// Result of mapping a keyword list.
#[derive(Debug, Clone, PartialEq)]
pub struct ParametricMapping {
    pub original_keywords: Vec<String>,
    /// Keywords no matcher consumed; sent as plain free text.
    pub keywords: Vec<String>,
    pub filters: Vec<ParametricFilter>,
    pub taxonomies: Vec<u32>,
}

impl ParametricMapping {
    pub fn removed_keywords(&self) -> bool {
        self.keywords.len() < self.original_keywords.len()
    }

    /// The broadened query: every original keyword, same taxonomies, no filters.
    pub fn broadened(&self) -> ParametricMapping {
        ParametricMapping {
            original_keywords: self.original_keywords.clone(),
            keywords: self.original_keywords.clone(),
            filters: Vec::new(),
            taxonomies: self.taxonomies.clone(),
        }
    }

    pub fn keyword_text(&self) -> String {
        self.keywords.join(" ")
    }
}

type Matcher = fn(&regex::Captures<'_>) -> Option<ParametricFilter>;

/// Scan `keywords` with each parameter matcher in turn. Each matcher consumes
/// at most one keyword.
pub fn map_keywords(
    keywords: &[String],
    mounting_type: MountingType,
    taxonomies: &[u32],
) -> ParametricMapping {
    let mut remaining: Vec<String> = keywords.to_vec();
    let mut filters = Vec::new();

    let matchers: [(&Regex, Matcher); 7] = [
        (&*PERCENT, tolerance_filter),
        (&*POWER, power_filter),
        (&*RESISTANCE, resistance_filter),
        (&*CAPACITANCE, capacitance_filter),
        (&*VOLTAGE, voltage_filter),
        (&*CURRENT, current_filter),
        (&*INDUCTANCE, inductance_filter),
    ];

    for (index, (regex, build)) in matchers.iter().enumerate() {
        let hit = remaining.iter().enumerate().find_map(|(pos, keyword)| {
            regex
                .captures(keyword)
                .and_then(|caps| build(&caps))
                .map(|filter| (pos, filter))
        });
        if let Some((pos, filter)) = hit {
            debug!(keyword = %remaining[pos], value = %filter.value_id, "parametric keyword matched");
            remaining.remove(pos);
            filters.push(filter);
        } else if index == 0
            && let Some(pos) = remaining
                .iter()
                .position(|k| k.eq_ignore_ascii_case("precision"))
            && let Some(value) = taxonomy::tolerance_value("1%")
        {
            remaining.remove(pos);
            filters.push(ParametricFilter::new(ParameterId::Tolerance, value, "1%"));
        }
    }

    let resistor = taxonomies.iter().any(|t| taxonomy::is_resistor_family(*t));
    if !resistor && let Some(value) = taxonomy::mounting_value(mounting_type) {
        let label = match mounting_type {
            MountingType::ThroughHole => "Through Hole",
            _ => "Surface Mount",
        };
        filters.push(ParametricFilter::new(ParameterId::MountingType, value, label));
    }

    ParametricMapping {
        original_keywords: keywords.to_vec(),
        keywords: remaining,
        filters,
        taxonomies: taxonomies.to_vec(),
    }
}

fn tolerance_filter(caps: &regex::Captures<'_>) -> Option<ParametricFilter> {
    let description = format!("{}%", &caps[1]);
    let value = taxonomy::tolerance_value(&description)?;
    Some(ParametricFilter::new(ParameterId::Tolerance, value, description))
}

fn power_filter(caps: &regex::Captures<'_>) -> Option<ParametricFilter> {
    let literal = &caps[1];
    let description = if literal.contains('.') {
        let value: f64 = literal.parse().ok()?;
        let (numerator, denominator) = nearest_fraction(value)?;
        if denominator == 1 {
            numerator.to_string()
        } else {
            format!("{numerator}/{denominator}")
        }
    } else {
        literal.to_string()
    };
    let value = taxonomy::power_value(&description)?;
    Some(ParametricFilter::new(ParameterId::Power, value, format!("{description}W")))
}

fn resistance_filter(caps: &regex::Captures<'_>) -> Option<ParametricFilter> {
    let units = match caps[2].to_lowercase().as_str() {
        "k" => "kOhms",
        "m" => "mOhms",
        _ => "ohms",
    };
    let value = format!("{} {units}", &caps[1]);
    Some(ParametricFilter::new(ParameterId::Resistance, value.clone(), value))
}

fn capacitance_filter(caps: &regex::Captures<'_>) -> Option<ParametricFilter> {
    let number = &caps[1];
    let (number, units) = match caps[2].to_lowercase().as_str() {
        // no native nF unit; 1nF = 0.001µF
        "nf" => (shift_decimal_left(number, 3), "µF"),
        "pf" => (number.to_string(), "pF"),
        _ => (number.to_string(), "µF"),
    };
    let value = format!("{number}{units}");
    Some(ParametricFilter::new(ParameterId::Capacitance, value.clone(), value))
}

fn voltage_filter(caps: &regex::Captures<'_>) -> Option<ParametricFilter> {
    let units = match caps[2].to_lowercase().as_str() {
        "kv" => "kV",
        "mv" => "mV",
        _ => "V",
    };
    Some(marked_filter(ParameterId::VoltageRating, &caps[1], units))
}

fn current_filter(caps: &regex::Captures<'_>) -> Option<ParametricFilter> {
    let units = match caps[2].to_lowercase().as_str() {
        "ma" => "mA",
        "ua" | "µa" => "µA",
        _ => "A",
    };
    Some(marked_filter(ParameterId::CurrentRating, &caps[1], units))
}

fn inductance_filter(caps: &regex::Captures<'_>) -> Option<ParametricFilter> {
    let units = match caps[2].to_lowercase().as_str() {
        "mh" => "mH",
        "uh" | "µh" => "µH",
        "nh" => "nH",
        _ => "H",
    };
    Some(marked_filter(ParameterId::Inductance, &caps[1], units))
}

fn marked_filter(parameter_id: ParameterId, number: &str, units: &str) -> ParametricFilter {
    let label = format!("{number}{units}");
    ParametricFilter::new(parameter_id, format!("{VALUE_MARKER}{label}"), label)
}

/// Fraction closest to `value` over denominators up to `MAX_DENOMINATOR`,
/// if it lies within `FRACTION_TOLERANCE`. Ties keep the smaller denominator.
fn nearest_fraction(value: f64) -> Option<(u32, u32)> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    let mut best: Option<(u32, u32, f64)> = None;
    for denominator in 1..=MAX_DENOMINATOR {
        let numerator = (value * f64::from(denominator)).round();
        if numerator < 1.0 {
            continue;
        }
        let error = (value - numerator / f64::from(denominator)).abs();
        if best.is_none_or(|(_, _, best_error)| error < best_error) {
            best = Some((numerator as u32, denominator, error));
        }
    }
    best.filter(|(_, _, error)| *error < FRACTION_TOLERANCE)
        .map(|(numerator, denominator, _)| (numerator, denominator))
}

/// Exact base-10 division by `10^places`, done on the digit string.
fn shift_decimal_left(number: &str, places: usize) -> String {
    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    let mut digits = format!("{int_part}{frac_part}");
    let mut point = int_part.len() as isize - places as isize;
    if point <= 0 {
        digits.insert_str(0, &"0".repeat((1 - point) as usize));
        point = 1;
    }
    let (int_digits, frac_digits) = digits.split_at(point as usize);
    let int_digits = int_digits.trim_start_matches('0');
    let int_digits = if int_digits.is_empty() { "0" } else { int_digits };
    let frac_digits = frac_digits.trim_end_matches('0');
    if frac_digits.is_empty() {
        int_digits.to_string()
    } else {
        format!("{int_digits}.{frac_digits}")
    }
}
