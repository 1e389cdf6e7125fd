//! Maps the model's JSON answer onto a [`NormalizedNote`].
//!
//! The mapper is lenient about value shapes (numbers may arrive as strings,
//! flags may be spelled "sleep & exertion") and also understands the legacy
//! order payload vocabulary, so a formatted payload can be fed back through it.

use serde_json::{Map, Value};

use super::bounded_snippet;
use crate::models::{
    BipapPrescription, CpapPrescription, NormalizedNote, OxygenPrescription, Prescription,
    UsageContext, WheelchairPrescription,
};
use crate::pipeline::extraction::{
    first_integer, first_number, parse_date, parse_flow_rate, parse_mask_type, ExtractionError,
};

/// Characters of the offending payload kept in a parse error.
pub const MAX_SNIPPET_CHARS: usize = 200;

/// Parse a model response into a normalized note.
///
/// Code fences are stripped first. Invalid JSON, or JSON that is not an
/// object, is an error carrying a bounded prefix of the response.
pub fn parse_note_response(response: &str) -> Result<NormalizedNote, ExtractionError> {
    let cleaned = strip_code_fences(response);

    let value: Value =
        serde_json::from_str(cleaned).map_err(|e| ExtractionError::MalformedLlmResponse {
            reason: e.to_string(),
            snippet: bounded_snippet(response.trim(), MAX_SNIPPET_CHARS),
        })?;

    match value {
        Value::Object(obj) => Ok(map_note(&obj)),
        other => Err(ExtractionError::MalformedLlmResponse {
            reason: format!("expected a JSON object, got {}", json_kind(&other)),
            snippet: bounded_snippet(response.trim(), MAX_SNIPPET_CHARS),
        }),
    }
}

/// Remove a leading ```` ``` ```` fence (with optional language tag) and a
/// trailing one, if present. The JSON may start on the fence line.
pub fn strip_code_fences(response: &str) -> &str {
    let mut text = response.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Language tag is the leading run of letters; JSON never starts with one.
        text = rest
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .trim_start();
    }

    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ═══════════════════════════════════════════════════════════
// Mapping
// ═══════════════════════════════════════════════════════════

/// Map a JSON object onto a note. Unknown or missing device → no prescription.
pub fn map_note(obj: &Map<String, Value>) -> NormalizedNote {
    // Legacy payloads are flat: device keys sit next to the header keys.
    let rx = match obj.get("prescription") {
        Some(Value::Object(inner)) => Some(inner),
        _ if obj.contains_key("device") => Some(obj),
        _ => None,
    };

    NormalizedNote {
        patient_name: text_field(obj, &["patient_name"]),
        dob: text_field(obj, &["dob", "date_of_birth"]).and_then(|s| parse_date(&s)),
        diagnosis: text_field(obj, &["diagnosis"]),
        ordering_physician: text_field(obj, &["ordering_physician", "ordering_provider"]),
        prescription: rx.and_then(map_prescription),
    }
}

fn map_prescription(rx: &Map<String, Value>) -> Option<Prescription> {
    let device = text_field(rx, &["device"])?.to_lowercase();

    match device.as_str() {
        "cpap" => Some(Prescription::Cpap(CpapPrescription {
            mask_type: mask_field(rx),
            heated_humidifier: humidifier_field(rx),
            ahi: u32_field(rx, "ahi"),
        })),
        "bipap" | "bi-pap" => Some(Prescription::Bipap(BipapPrescription {
            ipap_cm_h2o: u32_field(rx, "ipap_cm_h2o"),
            epap_cm_h2o: u32_field(rx, "epap_cm_h2o"),
            backup_rate: u32_field(rx, "backup_rate"),
            mask_type: mask_field(rx),
            heated_humidifier: humidifier_field(rx),
            ahi: u32_field(rx, "ahi"),
        })),
        "oxygen tank" | "oxygen" => Some(Prescription::Oxygen(OxygenPrescription {
            liters_per_minute: liters_field(rx),
            usage: text_field(rx, &["usage"])
                .map(|s| parse_usage(&s))
                .unwrap_or_default(),
        })),
        "wheelchair" => Some(Prescription::Wheelchair(WheelchairPrescription {
            chair_type: text_field(rx, &["chair_type"]).map(|s| s.to_lowercase()),
            seat_width_in: u32_field(rx, "seat_width_in"),
            seat_depth_in: u32_field(rx, "seat_depth_in"),
            leg_rests: text_field(rx, &["leg_rests"]),
            cushion: text_field(rx, &["cushion"]),
            justification: text_field(rx, &["justification"]),
        })),
        other => {
            tracing::debug!(device = other, "Unrecognized device in LLM response");
            None
        }
    }
}

/// Usage flags from free text. Connectors ("and", "&", "/", ",") are
/// normalized away before the tokens are matched.
pub fn parse_usage(text: &str) -> UsageContext {
    let normalized = text.to_lowercase().replace(['&', '/', ',', '+', ';'], " ");

    normalized
        .split_whitespace()
        .filter(|token| !matches!(*token, "and" | "during" | "with" | "on" | "at"))
        .fold(UsageContext::NONE, |usage, token| {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric());
            if token == "both" {
                usage | UsageContext::BOTH
            } else if token.starts_with("sleep") || token == "nocturnal" || token == "night" {
                usage | UsageContext::SLEEP
            } else if token.starts_with("exertion") || token == "activity" || token == "ambulation" {
                usage | UsageContext::EXERTION
            } else {
                usage
            }
        })
}

// ═══════════════════════════════════════════════════════════
// Field coercion
// ═══════════════════════════════════════════════════════════

/// First non-blank string (or number rendered as text) among `keys`.
fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn u32_field(obj: &Map<String, Value>, key: &str) -> Option<u32> {
    match obj.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .or_else(|| n.as_f64().and_then(f64_to_u32)),
        Value::String(s) => {
            let trimmed = s.trim();
            match trimmed.parse::<f64>() {
                Ok(v) => f64_to_u32(v),
                Err(_) => first_integer(trimmed),
            }
        }
        _ => None,
    }
}

/// Whole, non-negative numbers only. A fractional AHI or pressure is absent
/// rather than rounded, since rounding can move it across a severity band.
fn f64_to_u32(v: f64) -> Option<u32> {
    (v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64).then(|| v as u32)
}

fn liters_field(obj: &Map<String, Value>) -> Option<f64> {
    let liters = match obj.get("liters")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<f64>()
                .ok()
                .or_else(|| parse_flow_rate(trimmed))
                .or_else(|| first_number(trimmed))
        }
        _ => None,
    };
    liters.filter(|v| v.is_finite() && *v >= 0.0)
}

fn mask_field(obj: &Map<String, Value>) -> crate::models::MaskType {
    text_field(obj, &["mask_type"])
        .map(|s| parse_mask_type(&s))
        .unwrap_or_default()
}

/// `heated_humidifier` as bool / "yes" / 1, or a legacy `add_ons` list that
/// mentions a humidifier.
fn humidifier_field(obj: &Map<String, Value>) -> bool {
    if let Some(flag) = obj.get("heated_humidifier").and_then(coerce_bool) {
        return flag;
    }

    match obj.get("add_ons") {
        Some(Value::Array(items)) => items.iter().any(|item| {
            item.as_str()
                .is_some_and(|s| s.to_lowercase().contains("humidifier"))
        }),
        Some(Value::String(s)) => s.to_lowercase().contains("humidifier"),
        _ => false,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
