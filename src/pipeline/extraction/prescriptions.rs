//! Per-device prescription parsers.
//!
//! Each parser is a `(matches, parse)` pair over the lowercase hint string.
//! [`PRESCRIPTION_PARSERS`] fixes the dispatch order: BiPAP must come before
//! CPAP because BiPAP notes routinely mention CPAP as well.

use std::sync::LazyLock;

use regex::Regex;

use super::fields::FieldTable;
use super::values::{parse_ahi, parse_flow_rate, parse_mask_type};
use crate::models::{
    BipapPrescription, CpapPrescription, DeviceKind, OxygenPrescription, Prescription,
    UsageContext, WheelchairPrescription,
};

// ═══════════════════════════════════════════════════════════
// Dispatch table
// ═══════════════════════════════════════════════════════════

/// One entry of the dispatch table.
pub struct PrescriptionParser {
    pub device: DeviceKind,
    pub matches: fn(hint: &str) -> bool,
    pub parse: fn(fields: &FieldTable, full_text: &str, hint: &str) -> Option<Prescription>,
}

/// Dispatch order: BiPAP, Oxygen, CPAP, Wheelchair.
pub const PRESCRIPTION_PARSERS: &[PrescriptionParser] = &[
    PrescriptionParser {
        device: DeviceKind::Bipap,
        matches: matches_bipap,
        parse: parse_bipap,
    },
    PrescriptionParser {
        device: DeviceKind::Oxygen,
        matches: matches_oxygen,
        parse: parse_oxygen,
    },
    PrescriptionParser {
        device: DeviceKind::Cpap,
        matches: matches_cpap,
        parse: parse_cpap,
    },
    PrescriptionParser {
        device: DeviceKind::Wheelchair,
        matches: matches_wheelchair,
        parse: parse_wheelchair,
    },
];

/// Run the table: the first parser that matches the hint and yields a
/// prescription wins.
pub fn dispatch_prescription(
    fields: &FieldTable,
    full_text: &str,
    hint: &str,
) -> Option<Prescription> {
    PRESCRIPTION_PARSERS
        .iter()
        .filter(|parser| (parser.matches)(hint))
        .find_map(|parser| {
            let parsed = (parser.parse)(fields, full_text, hint);
            if parsed.is_some() {
                tracing::debug!(device = parser.device.as_str(), "Prescription parser matched");
            }
            parsed
        })
}

// ═══════════════════════════════════════════════════════════
// Shared label candidates
// ═══════════════════════════════════════════════════════════

const AHI_FIELDS: &[&str] = &["AHI"];
const CHAIR_TYPE_FIELDS: &[&str] = &["WheelchairType", "Chair Type", "Type"];
const LEG_REST_FIELDS: &[&str] = &["Leg Rests", "Leg Rest", "Leg Rest Style", "Legrests"];
const CUSHION_FIELDS: &[&str] = &["Cushion", "Cushion Type", "Seat Cushion"];
const JUSTIFICATION_FIELDS: &[&str] = &[
    "Justification",
    "Medical Justification",
    "Medical Necessity",
    "Reason",
];

// ═══════════════════════════════════════════════════════════
// Oxygen
// ═══════════════════════════════════════════════════════════

fn matches_oxygen(hint: &str) -> bool {
    hint.contains("oxygen")
}

fn parse_oxygen(_fields: &FieldTable, full_text: &str, hint: &str) -> Option<Prescription> {
    let mut usage = UsageContext::NONE;
    if hint.contains("sleep") {
        usage |= UsageContext::SLEEP;
    }
    if hint.contains("exertion") {
        usage |= UsageContext::EXERTION;
    }

    Some(Prescription::Oxygen(OxygenPrescription {
        liters_per_minute: parse_flow_rate(full_text),
        usage,
    }))
}

// ═══════════════════════════════════════════════════════════
// CPAP
// ═══════════════════════════════════════════════════════════

fn matches_cpap(hint: &str) -> bool {
    hint.contains("cpap")
}

fn parse_cpap(fields: &FieldTable, full_text: &str, hint: &str) -> Option<Prescription> {
    Some(Prescription::Cpap(CpapPrescription {
        mask_type: parse_mask_type(hint),
        heated_humidifier: has_heated_humidifier(hint),
        ahi: parse_ahi(fields.get(AHI_FIELDS), full_text),
    }))
}

fn has_heated_humidifier(hint: &str) -> bool {
    hint.contains("heated humidifier")
}

// ═══════════════════════════════════════════════════════════
// BiPAP
// ═══════════════════════════════════════════════════════════

static IPAP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bIPAP\s*[:=]?\s*(\d{1,2})\s*cm\s*H2O").expect("valid regex")
});
static EPAP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bEPAP\s*[:=]?\s*(\d{1,2})\s*cm\s*H2O").expect("valid regex")
});
static BACKUP_RATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bbackup\s+rate\s*[:=]?\s*(\d{1,2})\b").expect("valid regex")
});

fn matches_bipap(hint: &str) -> bool {
    hint.contains("bipap") || hint.contains("bi-pap") || hint.contains("bilevel")
}

fn parse_bipap(fields: &FieldTable, full_text: &str, hint: &str) -> Option<Prescription> {
    Some(Prescription::Bipap(BipapPrescription {
        ipap_cm_h2o: capture_u32(&IPAP_RE, full_text),
        epap_cm_h2o: capture_u32(&EPAP_RE, full_text),
        backup_rate: capture_u32(&BACKUP_RATE_RE, full_text),
        mask_type: parse_mask_type(hint),
        heated_humidifier: has_heated_humidifier(hint),
        ahi: parse_ahi(fields.get(AHI_FIELDS), full_text),
    }))
}

// ═══════════════════════════════════════════════════════════
// Wheelchair
// ═══════════════════════════════════════════════════════════

static CHAIR_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(manual|power|transport)\s+(?:wheel\s*chair|chair)\b").expect("valid regex")
});
static SEAT_WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bseat\s+width\s*[:=]?\s*(\d{1,2})\s*(?:"|in\b|inches\b)?"#)
        .expect("valid regex")
});
static SEAT_DEPTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bseat\s+depth\s*[:=]?\s*(\d{1,2})\s*(?:"|in\b|inches\b)?"#)
        .expect("valid regex")
});
// Anchored to the noun so "elevating leg rests and gel cushion" never lets
// one phrase swallow the other.
static LEG_REST_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(elevating|swing[\s-]?away|fixed|detachable)\s+leg\s*-?\s*rests?\b")
        .expect("valid regex")
});
static CUSHION_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(memory\s+foam|gel|foam|air|roho|pressure[\s-]relief|skin\s+protection)\s+cushion\b")
        .expect("valid regex")
});

fn matches_wheelchair(hint: &str) -> bool {
    hint.contains("wheelchair")
}

fn parse_wheelchair(fields: &FieldTable, full_text: &str, _hint: &str) -> Option<Prescription> {
    let chair_type = fields
        .get(CHAIR_TYPE_FIELDS)
        .map(|v| v.to_lowercase())
        .or_else(|| capture_lowercase(&CHAIR_TYPE_RE, full_text));

    let leg_rests = capture_lowercase(&LEG_REST_PHRASE_RE, full_text)
        .or_else(|| fields.get_owned(LEG_REST_FIELDS));

    let cushion = capture_lowercase(&CUSHION_PHRASE_RE, full_text)
        .or_else(|| fields.get_owned(CUSHION_FIELDS));

    Some(Prescription::Wheelchair(WheelchairPrescription {
        chair_type,
        seat_width_in: capture_u32(&SEAT_WIDTH_RE, full_text),
        seat_depth_in: capture_u32(&SEAT_DEPTH_RE, full_text),
        leg_rests,
        cushion,
        justification: fields.get_owned(JUSTIFICATION_FIELDS),
    }))
}

// ═══════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════

fn capture_u32(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// First capture group, whitespace-collapsed and lowercased.
fn capture_lowercase(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).and_then(|caps| caps.get(1)).map(|m| {
        m.as_str()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    })
}
