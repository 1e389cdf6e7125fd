use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::qualifier::ahi_qualifier_as_of;
use super::OrderError;
use crate::models::{MaskType, NormalizedNote, Prescription};

/// Device name used when a note carries no prescription.
pub const UNKNOWN_DEVICE: &str = "Unknown";

const HEATED_HUMIDIFIER: &str = "heated humidifier";

/// Flat order payload understood by the ordering service.
/// Field order is the wire order; absent fields are omitted, never `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    /// MM/dd/yyyy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    pub device: String,

    // CPAP / BiPAP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_ons: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,

    // Oxygen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    // Wheelchair
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chair_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_width_in: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_depth_in: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leg_rests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cushion: Option<String>,
}

/// Build the legacy request, computing the AHI qualifier as of today.
pub fn build_order_request(note: &NormalizedNote) -> LegacyOrderRequest {
    build_order_request_as_of(note, Local::now().date_naive())
}

/// Build the legacy request with an explicit "today" for the AHI qualifier.
pub fn build_order_request_as_of(note: &NormalizedNote, today: NaiveDate) -> LegacyOrderRequest {
    let mut request = LegacyOrderRequest {
        diagnosis: note.diagnosis.clone(),
        ordering_provider: note.ordering_physician.clone(),
        patient_name: note.patient_name.clone(),
        dob: note.dob.map(|d| d.format("%m/%d/%Y").to_string()),
        device: note
            .prescription
            .as_ref()
            .map_or(UNKNOWN_DEVICE, |rx| rx.device().as_str())
            .to_string(),
        ..Default::default()
    };

    match &note.prescription {
        Some(Prescription::Oxygen(o2)) => {
            request.liters = o2.liters_per_minute.map(format_liters);
            request.usage = o2.usage.legacy_label().map(str::to_string);
        }
        Some(Prescription::Cpap(cpap)) => {
            apply_airway(&mut request, cpap.mask_type, cpap.heated_humidifier);
            request.qualifier = ahi_qualifier_as_of(cpap.ahi, note.dob, today);
        }
        Some(Prescription::Bipap(bipap)) => {
            apply_airway(&mut request, bipap.mask_type, bipap.heated_humidifier);
            request.qualifier = ahi_qualifier_as_of(bipap.ahi, note.dob, today);
        }
        Some(Prescription::Wheelchair(chair)) => {
            // No slot for justification in the legacy format.
            request.chair_type = chair.chair_type.clone();
            request.seat_width_in = chair.seat_width_in;
            request.seat_depth_in = chair.seat_depth_in;
            request.leg_rests = chair.leg_rests.clone();
            request.cushion = chair.cushion.clone();
        }
        None => {}
    }

    request
}

fn apply_airway(request: &mut LegacyOrderRequest, mask_type: MaskType, heated_humidifier: bool) {
    request.mask_type = mask_type.legacy_label().map(str::to_string);
    if heated_humidifier {
        request.add_ons = Some(vec![HEATED_HUMIDIFIER.to_string()]);
    }
}

/// "2 L", "2.5 L". Integral rates print without a decimal point.
pub fn format_liters(liters: f64) -> String {
    format!("{liters} L")
}

/// Serialize a note into the legacy JSON payload.
pub fn format_order_request(note: &NormalizedNote) -> Result<String, OrderError> {
    serde_json::to_string(&build_order_request(note)).map_err(OrderError::Serialization)
}

/// [`format_order_request`] with an explicit "today" for the AHI qualifier.
pub fn format_order_request_as_of(
    note: &NormalizedNote,
    today: NaiveDate,
) -> Result<String, OrderError> {
    serde_json::to_string(&build_order_request_as_of(note, today))
        .map_err(OrderError::Serialization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BipapPrescription, CpapPrescription, OxygenPrescription, UsageContext,
        WheelchairPrescription,
    };
    use serde_json::{json, Value};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn payload(note: &NormalizedNote) -> Value {
        let text = format_order_request_as_of(note, today()).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn liters_rendering() {
        assert_eq!(format_liters(2.0), "2 L");
        assert_eq!(format_liters(2.5), "2.5 L");
        assert_eq!(format_liters(0.25), "0.25 L");
    }

    #[test]
    fn oxygen_payload() {
        let note = NormalizedNote {
            patient_name: Some("Harold Finch".into()),
            diagnosis: Some("COPD".into()),
            ordering_physician: Some("Dr. Cuddy".into()),
            prescription: Some(Prescription::Oxygen(OxygenPrescription {
                liters_per_minute: Some(2.0),
                usage: UsageContext::BOTH,
            })),
            ..Default::default()
        };
        assert_eq!(
            payload(&note),
            json!({
                "diagnosis": "COPD",
                "ordering_provider": "Dr. Cuddy",
                "patient_name": "Harold Finch",
                "device": "Oxygen Tank",
                "liters": "2 L",
                "usage": "sleep and exertion"
            })
        );
    }

    #[test]
    fn key_order_is_stable() {
        let note = NormalizedNote {
            patient_name: Some("P".into()),
            dob: NaiveDate::from_ymd_opt(1950, 3, 5),
            diagnosis: Some("D".into()),
            ordering_physician: Some("O".into()),
            prescription: None,
        };
        let text = format_order_request_as_of(&note, today()).unwrap();
        assert_eq!(
            text,
            r#"{"diagnosis":"D","ordering_provider":"O","patient_name":"P","dob":"03/05/1950","device":"Unknown"}"#
        );
    }

    #[test]
    fn empty_note_is_unknown_device_only() {
        assert_eq!(
            payload(&NormalizedNote::default()),
            json!({ "device": "Unknown" })
        );
    }

    #[test]
    fn oxygen_without_usage_omits_it() {
        let note = NormalizedNote {
            prescription: Some(Prescription::Oxygen(OxygenPrescription::default())),
            ..Default::default()
        };
        assert_eq!(payload(&note), json!({ "device": "Oxygen Tank" }));
    }

    #[test]
    fn cpap_payload_with_qualifier() {
        let note = NormalizedNote {
            ordering_physician: Some("Dr. Cameron".into()),
            prescription: Some(Prescription::Cpap(CpapPrescription {
                mask_type: MaskType::FullFace,
                heated_humidifier: true,
                ahi: Some(28),
            })),
            ..Default::default()
        };
        assert_eq!(
            payload(&note),
            json!({
                "ordering_provider": "Dr. Cameron",
                "device": "CPAP",
                "mask_type": "full face",
                "add_ons": ["heated humidifier"],
                "qualifier": "AHI > 15 (moderate, adult)"
            })
        );
    }

    #[test]
    fn cpap_without_options_omits_them() {
        let note = NormalizedNote {
            prescription: Some(Prescription::Cpap(CpapPrescription::default())),
            ..Default::default()
        };
        assert_eq!(payload(&note), json!({ "device": "CPAP" }));
    }

    #[test]
    fn bipap_uses_pediatric_bands_for_children() {
        let note = NormalizedNote {
            dob: NaiveDate::from_ymd_opt(2016, 1, 1),
            prescription: Some(Prescription::Bipap(BipapPrescription {
                ipap_cm_h2o: Some(14),
                mask_type: MaskType::Nasal,
                ahi: Some(6),
                ..Default::default()
            })),
            ..Default::default()
        };
        assert_eq!(
            payload(&note),
            json!({
                "dob": "01/01/2016",
                "device": "BiPAP",
                "mask_type": "nasal",
                "qualifier": "AHI > 5 (moderate, pediatric)"
            })
        );
    }

    #[test]
    fn wheelchair_never_emits_justification() {
        let note = NormalizedNote {
            prescription: Some(Prescription::Wheelchair(WheelchairPrescription {
                chair_type: Some("manual".into()),
                seat_width_in: Some(18),
                seat_depth_in: Some(16),
                leg_rests: Some("elevating".into()),
                cushion: Some("gel".into()),
                justification: Some("Cannot ambulate".into()),
            })),
            ..Default::default()
        };
        let value = payload(&note);
        assert_eq!(
            value,
            json!({
                "device": "Wheelchair",
                "chair_type": "manual",
                "seat_width_in": 18,
                "seat_depth_in": 16,
                "leg_rests": "elevating",
                "cushion": "gel"
            })
        );
        assert!(value.get("justification").is_none());
    }
}
