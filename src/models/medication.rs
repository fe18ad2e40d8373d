use serde::{Deserialize, Serialize};

/// A medication as submitted by the user, normalized for lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    /// Lower-cased, trimmed comparison key.
    pub name: String,
    /// Name as the user wrote it (trimmed).
    pub display: String,
    /// Dosage string when the source carried one ("500 mg").
    pub dosage: Option<String>,
}

impl Medication {
    /// Build from a raw name. Returns `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let display = collapse_whitespace(raw);
        if display.is_empty() {
            return None;
        }
        Some(Self {
            name: display.to_lowercase(),
            display,
            dosage: None,
        })
    }

    pub fn with_dosage(mut self, dosage: &str) -> Self {
        let dosage = collapse_whitespace(dosage);
        self.dosage = (!dosage.is_empty()).then_some(dosage);
        self
    }

    /// "Warfarin 5 mg" when a dosage is known, otherwise the display name.
    pub fn label(&self) -> String {
        match &self.dosage {
            Some(dosage) => format!("{} {}", self.display, dosage),
            None => self.display.clone(),
        }
    }
}

/// Drop duplicate names (case-insensitive), first occurrence wins.
pub fn dedup_medications(medications: Vec<Medication>) -> Vec<Medication> {
    let mut seen = std::collections::HashSet::new();
    medications
        .into_iter()
        .filter(|m| seen.insert(m.name.clone()))
        .collect()
}

/// "aspirin" → "Aspirin", "vitamin_k" → "Vitamin_k".
pub fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
