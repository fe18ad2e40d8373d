//! Prescription OCR text → medications with dosages.
//!
//! Recognises two forms (case-insensitive):
//! - `<n>. <name> <dosage>` at the start of a line, where the name may be two
//!   words ("2. Vitamin D 1000 mg")
//! - `<name> <dosage>` anywhere in the text ("Aspirin 81mg daily"), including
//!   a dosage on the line after the name ("Aspirin\n81 mg")
//!
//! Matches are reported in order of appearance.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{dedup_medications, Medication, Modality};

use super::MedicationExtractor;

static ORDINAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*\d+[.)]\s*([a-z][a-z-]*(?:\s+[a-z][a-z-]*)?)\s+(\d+(?:\.\d+)?\s*(?:mcg|mg|ml|g))\b",
    )
    .expect("valid regex")
});

static NAME_DOSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z][a-z-]*)\s+(\d+(?:\.\d+)?\s*(?:mcg|mg|ml|g))\b")
        .expect("valid regex")
});

/// Words that precede a dosage on prescriptions but are not drug names.
const NON_DRUG_WORDS: &[&str] = &[
    "take", "takes", "tab", "tabs", "tablet", "tablets", "cap", "caps", "capsule",
    "capsules", "dose", "daily", "of", "and", "then", "total", "max", "maximum",
    "mcg", "mg", "ml", "g",
];

/// Medications from OCR'd prescription text.
pub struct PrescriptionExtractor;

impl MedicationExtractor for PrescriptionExtractor {
    fn modality(&self) -> Modality {
        Modality::Image
    }

    fn extract(&self, raw_input: &str) -> Vec<Medication> {
        let mut found: Vec<(usize, Medication)> = Vec::new();
        // Byte ranges already claimed by ordinal matches.
        let mut claimed: Vec<(usize, usize)> = Vec::new();

        let mut line_start = 0;
        for line in raw_input.split_inclusive('\n') {
            if let Some(caps) = ORDINAL_LINE.captures(line) {
                let end = caps.get(0).map_or(0, |m| m.end());
                let name_start = caps.get(1).map_or(0, |m| m.start());
                push_match(&mut found, line_start + name_start, &caps[1], &caps[2]);
                claimed.push((line_start, line_start + end));
            }
            line_start += line.len();
        }

        for caps in NAME_DOSAGE.captures_iter(raw_input) {
            let Some(whole) = caps.get(0) else { continue };
            let overlaps = claimed
                .iter()
                .any(|&(start, end)| whole.start() < end && whole.end() > start);
            if !overlaps {
                push_match(&mut found, whole.start(), &caps[1], &caps[2]);
            }
        }

        found.sort_by_key(|(position, _)| *position);
        dedup_medications(found.into_iter().map(|(_, med)| med).collect())
    }
}

fn push_match(found: &mut Vec<(usize, Medication)>, position: usize, name: &str, dosage: &str) {
    if NON_DRUG_WORDS.contains(&name.to_lowercase().as_str()) {
        return;
    }
    if let Some(med) = Medication::new(name) {
        found.push((position, med.with_dosage(dosage)));
    }
}
