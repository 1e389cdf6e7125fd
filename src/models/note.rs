use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{DeviceKind, MaskType, UsageContext};

/// A physician note reduced to the fields an equipment order needs.
/// Any field may be absent; an all-`None` note is a valid result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedNote {
    pub patient_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub diagnosis: Option<String>,
    pub ordering_physician: Option<String>,
    pub prescription: Option<Prescription>,
}

impl NormalizedNote {
    pub fn is_empty(&self) -> bool {
        self.patient_name.is_none()
            && self.dob.is_none()
            && self.diagnosis.is_none()
            && self.ordering_physician.is_none()
            && self.prescription.is_none()
    }
}

/// Device-specific order details. Exactly one variant per note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "device", rename_all = "snake_case")]
pub enum Prescription {
    Oxygen(OxygenPrescription),
    Cpap(CpapPrescription),
    Bipap(BipapPrescription),
    Wheelchair(WheelchairPrescription),
}

impl Prescription {
    pub fn device(&self) -> DeviceKind {
        match self {
            Self::Oxygen(_) => DeviceKind::Oxygen,
            Self::Cpap(_) => DeviceKind::Cpap,
            Self::Bipap(_) => DeviceKind::Bipap,
            Self::Wheelchair(_) => DeviceKind::Wheelchair,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OxygenPrescription {
    /// Liters per minute, never negative.
    pub liters_per_minute: Option<f64>,
    pub usage: UsageContext,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpapPrescription {
    pub mask_type: MaskType,
    pub heated_humidifier: bool,
    pub ahi: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BipapPrescription {
    pub ipap_cm_h2o: Option<u32>,
    pub epap_cm_h2o: Option<u32>,
    pub backup_rate: Option<u32>,
    pub mask_type: MaskType,
    pub heated_humidifier: bool,
    pub ahi: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelchairPrescription {
    /// manual / power / transport
    pub chair_type: Option<String>,
    pub seat_width_in: Option<u32>,
    pub seat_depth_in: Option<u32>,
    pub leg_rests: Option<String>,
    pub cushion: Option<String>,
    pub justification: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_note_is_empty() {
        assert!(NormalizedNote::default().is_empty());
    }

    #[test]
    fn prescription_reports_device() {
        let rx = Prescription::Bipap(BipapPrescription::default());
        assert_eq!(rx.device(), DeviceKind::Bipap);
        let rx = Prescription::Oxygen(OxygenPrescription::default());
        assert_eq!(rx.device(), DeviceKind::Oxygen);
    }

    #[test]
    fn prescription_serializes_with_device_tag() {
        let rx = Prescription::Cpap(CpapPrescription {
            mask_type: MaskType::Nasal,
            heated_humidifier: true,
            ahi: Some(12),
        });
        let json = serde_json::to_value(&rx).unwrap();
        assert_eq!(json["device"], "cpap");
        assert_eq!(json["heated_humidifier"], true);
        assert_eq!(json["ahi"], 12);
    }
}
