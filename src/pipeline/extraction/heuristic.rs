use serde_json::Value;

use super::fields::FieldTable;
use super::prescriptions::dispatch_prescription;
use super::values::parse_date;
use super::{ExtractionError, NoteExtractor};
use crate::models::NormalizedNote;

const NAME_FIELDS: &[&str] = &["Patient Name", "Patient", "Name"];
const DOB_FIELDS: &[&str] = &["DOB", "Date of Birth", "Birth Date", "Birthdate"];
const DIAGNOSIS_FIELDS: &[&str] = &["Diagnosis", "Primary Diagnosis", "Dx"];
const PHYSICIAN_FIELDS: &[&str] = &[
    "Ordering Physician",
    "Ordering Provider",
    "Physician",
    "Provider",
    "Ordered By",
    "Referring Physician",
];
/// Fields most likely to name the device; prepended to the hint.
const HINT_FIELDS: &[&str] = &[
    "Recommendation",
    "Prescription",
    "Device",
    "Order",
    "Requested Device",
];

/// Deterministic regex/label extractor. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract a normalized note. Blank input yields an all-empty note.
    pub fn extract_note(&self, raw_text: &str) -> NormalizedNote {
        if raw_text.trim().is_empty() {
            return NormalizedNote::default();
        }

        let text = unwrap_envelope(raw_text);
        let fields = FieldTable::parse(&text);

        let hint = build_hint(&fields, &text);
        let prescription = dispatch_prescription(&fields, &text, &hint);
        if prescription.is_none() {
            tracing::debug!(field_count = fields.len(), "No prescription parser matched");
        }

        NormalizedNote {
            patient_name: fields.get_owned(NAME_FIELDS),
            dob: fields.get(DOB_FIELDS).and_then(parse_date),
            diagnosis: fields.get_owned(DIAGNOSIS_FIELDS),
            ordering_physician: fields.get_owned(PHYSICIAN_FIELDS),
            prescription,
        }
    }
}

impl NoteExtractor for HeuristicExtractor {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn extract(&self, raw_text: &str) -> Result<NormalizedNote, ExtractionError> {
        Ok(self.extract_note(raw_text))
    }
}

/// `{"data": "<note>"}` → `<note>`. Anything else (including broken JSON or
/// a non-string `data`) is returned unchanged.
pub fn unwrap_envelope(raw_text: &str) -> String {
    let trimmed = raw_text.trim();
    if !trimmed.starts_with('{') {
        return raw_text.to_string();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => match map.get("data") {
            Some(Value::String(inner)) => inner.clone(),
            _ => {
                tracing::debug!("JSON envelope has no string `data` property, using raw text");
                raw_text.to_string()
            }
        },
        Ok(_) => raw_text.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "Input looks like JSON but does not parse, using raw text");
            raw_text.to_string()
        }
    }
}

/// Device field (if any) followed by the full text, lowercased.
fn build_hint(fields: &FieldTable, text: &str) -> String {
    let mut hint = String::with_capacity(text.len() + 64);
    if let Some(device_field) = fields.get(HINT_FIELDS) {
        hint.push_str(device_field);
        hint.push(' ');
    }
    hint.push_str(text);
    hint.to_lowercase()
}
