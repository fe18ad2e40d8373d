use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Modality, NarrativeSource};
use super::finding::InteractionFinding;
use super::medication::Medication;

/// Narrative recommendation and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub text: String,
    pub source: NarrativeSource,
    /// Generator model name, set only for generative narratives.
    pub model: Option<String>,
}

/// Outcome of one analysis call. Immutable once built; the persistence
/// collaborator assigns its durable id (see [`StoredAnalysis`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    modality: Modality,
    input_text: String,
    medications: Vec<Medication>,
    findings: Vec<InteractionFinding>,
    safety_score: f64,
    narrative: Narrative,
}

impl AnalysisResult {
    pub fn new(
        modality: Modality,
        input_text: &str,
        medications: Vec<Medication>,
        findings: Vec<InteractionFinding>,
        safety_score: f64,
        narrative: Narrative,
    ) -> Self {
        Self {
            modality,
            input_text: input_text.to_string(),
            medications,
            findings,
            safety_score,
            narrative,
        }
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// Raw text the medications were extracted from (typed text, OCR output
    /// or transcript).
    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    pub fn medication_names(&self) -> Vec<&str> {
        self.medications.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn findings(&self) -> &[InteractionFinding] {
        &self.findings
    }

    pub fn safety_score(&self) -> f64 {
        self.safety_score
    }

    pub fn recommendation(&self) -> &str {
        &self.narrative.text
    }

    pub fn narrative(&self) -> &Narrative {
        &self.narrative
    }
}

/// An analysis as held by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub id: Uuid,
    pub created_at: NaiveDateTime,
    pub is_favorite: bool,
    pub notes: String,
    pub result: AnalysisResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn sample() -> AnalysisResult {
        let meds = vec![
            Medication::new("Aspirin").unwrap(),
            Medication::new("Warfarin").unwrap(),
        ];
        let findings =
            vec![InteractionFinding::new("aspirin", "warfarin", "HIGH RISK: bleeding").unwrap()];
        AnalysisResult::new(
            Modality::Text,
            "Aspirin, Warfarin",
            meds,
            findings,
            70.0,
            Narrative {
                text: "Aspirin + Warfarin: HIGH RISK: bleeding".into(),
                source: NarrativeSource::KnowledgeBase,
                model: None,
            },
        )
    }

    #[test]
    fn accessors_expose_parts() {
        let result = sample();
        assert_eq!(result.modality(), Modality::Text);
        assert_eq!(result.input_text(), "Aspirin, Warfarin");
        assert_eq!(result.medication_names(), vec!["aspirin", "warfarin"]);
        assert_eq!(result.findings()[0].severity, Severity::High);
        assert_eq!(result.safety_score(), 70.0);
        assert!(result.recommendation().contains("Warfarin"));
        assert_eq!(result.narrative().source, NarrativeSource::KnowledgeBase);
    }

    #[test]
    fn serde_preserves_result() {
        let result = sample();
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"modality\":\"text\""));
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
