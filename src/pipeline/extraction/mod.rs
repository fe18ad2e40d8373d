//! Medication Extractor: one adapter per input modality.
//!
//! Every adapter turns a raw string into a deduplicated, normalized
//! medication list. Extraction never fails: malformed or unrecognised input
//! yields an empty list, which the orchestrator reports as
//! "no medications detected".

pub mod prescription;
pub mod text;
pub mod voice;

pub use prescription::PrescriptionExtractor;
pub use text::TextListExtractor;
pub use voice::VoiceExtractor;

use crate::models::{Medication, Modality};

/// Converts modality-specific raw text into medications.
pub trait MedicationExtractor: Send + Sync {
    /// Which modality this extractor handles.
    fn modality(&self) -> Modality;

    /// Extract medications. Output has no blank or duplicate names.
    fn extract(&self, raw_input: &str) -> Vec<Medication>;
}

/// Extract with the default adapter for `modality`.
pub fn extract_medications(raw_input: &str, modality: Modality) -> Vec<Medication> {
    extractor_for(modality).extract(raw_input)
}

/// Default adapter for a modality.
pub fn extractor_for(modality: Modality) -> &'static dyn MedicationExtractor {
    match modality {
        Modality::Text => &TextListExtractor,
        Modality::Image => &PrescriptionExtractor,
        Modality::Voice => &VoiceExtractor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_matches_modality() {
        for modality in [Modality::Text, Modality::Image, Modality::Voice] {
            assert_eq!(extractor_for(modality).modality(), modality);
        }
    }

    #[test]
    fn same_text_differs_by_modality() {
        let raw = "Aspirin 81 mg, warfarin";
        let text: Vec<_> = extract_medications(raw, Modality::Text)
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(text, vec!["aspirin 81 mg", "warfarin"]);

        let image = extract_medications(raw, Modality::Image);
        assert_eq!(image.len(), 1);
        assert_eq!(image[0].name, "aspirin");

        let voice: Vec<_> = extract_medications(raw, Modality::Voice)
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(voice, vec!["aspirin", "warfarin"]);
    }

    #[test]
    fn garbage_never_panics() {
        for modality in [Modality::Text, Modality::Image, Modality::Voice] {
            assert!(extract_medications("", modality).is_empty());
            assert!(extract_medications(",,, \n\t", modality).is_empty());
        }
        for modality in [Modality::Image, Modality::Voice] {
            assert!(extract_medications("OCR service unavailable", modality).is_empty());
        }
    }
}
