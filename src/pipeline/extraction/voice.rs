use crate::models::{Medication, Modality};

use super::MedicationExtractor;

/// Medication names recognised in speech transcripts, in detection order.
pub const VOICE_VOCABULARY: &[&str] = &[
    "aspirin",
    "warfarin",
    "lisinopril",
    "metformin",
    "ibuprofen",
    "amoxicillin",
];

/// Substring match of a transcript against [`VOICE_VOCABULARY`].
///
/// Results follow vocabulary order, not the order spoken.
pub struct VoiceExtractor;

impl MedicationExtractor for VoiceExtractor {
    fn modality(&self) -> Modality {
        Modality::Voice
    }

    fn extract(&self, raw_input: &str) -> Vec<Medication> {
        let transcript = raw_input.to_lowercase();
        VOICE_VOCABULARY
            .iter()
            .filter(|name| transcript.contains(*name))
            .filter_map(|name| Medication::new(name))
            .collect()
    }
}
