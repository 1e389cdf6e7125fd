//! Tolerant value parsers shared by the heuristic and LLM extractors.
//!
//! Every function here is total: unparseable input yields `None` (or
//! `MaskType::Unknown`), never an error.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::models::MaskType;

/// Exact numeric formats, tried in order. chrono accepts one- or two-digit
/// month/day fields, so `%m/%d/%Y` also covers `M/d/yyyy`. `%Y` also takes
/// short years, so these only run on input with a four-digit year.
const EXACT_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%m-%d-%Y", "%Y-%m-%d", "%Y/%m/%d"];

/// Spelled-out month forms (English), tried after the exact formats.
const TEXTUAL_DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M"];

static FOUR_DIGIT_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,2}[/-]\d{1,2}[/-]\d{4}|\d{4}[/-]\d{1,2}[/-]\d{1,2})$")
        .expect("valid regex")
});
static TWO_DIGIT_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{2})$").expect("valid regex")
});
static TRAILING_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)\d{4}$").expect("valid regex"));

/// Two-digit years up to this value land in the 2000s, the rest in the 1900s.
const TWO_DIGIT_YEAR_PIVOT: u32 = 49;

static FLOW_PER_MIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*L\s*(?:/|per)\s*min").expect("valid regex")
});
static FLOW_LITERS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*L\b").expect("valid regex"));
static FLOW_LPM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*LPM\b").expect("valid regex"));

static FIRST_INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));
static FIRST_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));
static AHI_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bAHI\s*[:>]\s*(\d+)").expect("valid regex"));

/// Parse a calendar date from free text. Returns `None` for blank or
/// unrecognized input.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if FOUR_DIGIT_YEAR_RE.is_match(trimmed) {
        for fmt in EXACT_DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
                return Some(d);
            }
        }
    }

    parse_general_date(trimmed)
}

/// `M/d/yy` or `M-d-yy`, windowed by [`TWO_DIGIT_YEAR_PIVOT`].
fn parse_two_digit_year_date(text: &str) -> Option<NaiveDate> {
    let caps = TWO_DIGIT_YEAR_RE.captures(text)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let yy: u32 = caps[3].parse().ok()?;
    let century = if yy <= TWO_DIGIT_YEAR_PIVOT { 2000 } else { 1900 };
    NaiveDate::from_ymd_opt(century + yy as i32, month, day)
}

/// Fallback for two-digit years, month names ("March 5, 1950", "5 Mar 1950")
/// and date-times.
fn parse_general_date(trimmed: &str) -> Option<NaiveDate> {
    // "March 5th, 1950" → "March 5, 1950"
    let cleaned = strip_ordinal_suffixes(trimmed);
    let cleaned = cleaned.trim_end_matches('.');

    if let Some(d) = parse_two_digit_year_date(cleaned) {
        return Some(d);
    }

    // Every textual format ends in `%Y`.
    if TRAILING_YEAR_RE.is_match(cleaned) {
        for fmt in TEXTUAL_DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(cleaned, fmt) {
                return Some(d);
            }
        }
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cleaned, fmt).ok())
        .map(|dt| dt.date())
        .filter(|d| d.year() >= 1000)
}

fn strip_ordinal_suffixes(text: &str) -> String {
    static ORDINAL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("valid regex"));
    ORDINAL_RE.replace_all(text, "$1").into_owned()
}

/// Extract an oxygen flow rate in liters per minute.
///
/// Tried in order: `2 L/min` / `2 L per min`, bare `2 L`, then `2 LPM`.
pub fn parse_flow_rate(text: &str) -> Option<f64> {
    [&*FLOW_PER_MIN_RE, &*FLOW_LITERS_RE, &*FLOW_LPM_RE]
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// AHI from an explicit field value (first integer in it) or, failing that,
/// from `AHI: n` / `AHI > n` anywhere in the raw text.
pub fn parse_ahi(field_value: Option<&str>, raw_text: &str) -> Option<u32> {
    if let Some(value) = field_value.and_then(first_integer) {
        return Some(value);
    }

    AHI_TEXT_RE
        .captures(raw_text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Mask type from the hint. "nasal pillow" must win over bare "nasal".
pub fn parse_mask_type(hint: &str) -> MaskType {
    let lower = hint.to_lowercase().replace(['-', '_'], " ");
    if lower.contains("full face") {
        MaskType::FullFace
    } else if lower.contains("nasal pillow") {
        MaskType::NasalPillow
    } else if lower.contains("nasal") {
        MaskType::Nasal
    } else {
        MaskType::Unknown
    }
}

/// First run of digits in `text`, if it fits in a `u32`.
pub fn first_integer(text: &str) -> Option<u32> {
    FIRST_INT_RE
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// First decimal number in `text` ("2.5 L" → 2.5).
pub fn first_number(text: &str) -> Option<f64> {
    FIRST_NUMBER_RE
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}
