use crate::models::{dedup_medications, Medication, Modality};

use super::MedicationExtractor;

/// Comma-separated list typed by the user: "Aspirin, warfarin".
pub struct TextListExtractor;

impl MedicationExtractor for TextListExtractor {
    fn modality(&self) -> Modality {
        Modality::Text
    }

    fn extract(&self, raw_input: &str) -> Vec<Medication> {
        let medications = raw_input.split(',').filter_map(Medication::new).collect();
        dedup_medications(medications)
    }
}
