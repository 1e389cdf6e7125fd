//! Line-oriented "Label: value" parsing.
//!
//! Labels are compared after dropping everything but letters and digits and
//! lowercasing, so `"A.H.I."`, `"AHI"` and `"ahi"` address the same entry.

use std::collections::HashMap;

/// Normalized label → trimmed value, built from one note.
#[derive(Debug, Clone, Default)]
pub struct FieldTable {
    entries: HashMap<String, String>,
}

impl FieldTable {
    /// Build the table from note text. `\r\n`, `\r` and `\n` all end a line.
    /// Lines without a colon or with an empty label are ignored; the first
    /// occurrence of a label wins.
    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();

        for line in text.split(['\r', '\n']) {
            if line.trim().is_empty() {
                continue;
            }
            let Some((label, value)) = line.split_once(':') else {
                continue;
            };
            let key = normalize_label(label);
            if key.is_empty() {
                continue;
            }
            entries
                .entry(key)
                .or_insert_with(|| value.trim().to_string());
        }

        Self { entries }
    }

    /// First non-blank value among the candidate labels, in order.
    pub fn get(&self, candidates: &[&str]) -> Option<&str> {
        candidates.iter().find_map(|label| {
            self.entries
                .get(&normalize_label(label))
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        })
    }

    /// Owned variant of [`FieldTable::get`].
    pub fn get_owned(&self, candidates: &[&str]) -> Option<String> {
        self.get(candidates).map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keep letters and digits only, lowercased.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_fields() {
        let table = FieldTable::parse("Patient Name: Harold Finch\nDiagnosis: COPD");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&["Patient Name"]), Some("Harold Finch"));
        assert_eq!(table.get(&["diagnosis"]), Some("COPD"));
    }

    #[test]
    fn label_punctuation_and_case_collide() {
        let table = FieldTable::parse("A.H.I.: 28");
        assert_eq!(table.get(&["AHI"]), Some("28"));
        assert_eq!(table.get(&["ahi"]), Some("28"));
    }

    #[test]
    fn handles_mixed_line_endings() {
        let table = FieldTable::parse("Name: A\r\nDOB: 01/02/1950\rDevice: CPAP\n\nDx: OSA");
        assert_eq!(table.get(&["Name"]), Some("A"));
        assert_eq!(table.get(&["DOB"]), Some("01/02/1950"));
        assert_eq!(table.get(&["Device"]), Some("CPAP"));
        assert_eq!(table.get(&["Dx"]), Some("OSA"));
    }

    #[test]
    fn splits_on_first_colon_only() {
        let table = FieldTable::parse("Note: follow up at 10:30");
        assert_eq!(table.get(&["Note"]), Some("follow up at 10:30"));
    }

    #[test]
    fn ignores_lines_without_label() {
        let table = FieldTable::parse("no colon here\n: orphan value\n...: dots only");
        assert!(table.is_empty());
    }

    #[test]
    fn first_duplicate_wins() {
        let table = FieldTable::parse("Device: CPAP\nDEVICE: BiPAP");
        assert_eq!(table.get(&["device"]), Some("CPAP"));
    }

    #[test]
    fn lookup_skips_blank_candidates() {
        let table = FieldTable::parse("Ordering Physician:\nProvider: Dr. Cuddy");
        assert_eq!(
            table.get(&["Ordering Physician", "Provider"]),
            Some("Dr. Cuddy")
        );
        assert_eq!(table.get(&["Missing"]), None);
    }
}
