use serde::{Deserialize, Serialize};

/// Optional read-only patient attributes that enrich the generative prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientContext {
    pub age: Option<u32>,
    pub allergies: Option<String>,
    pub chronic_conditions: Option<String>,
    pub current_medications: Option<String>,
}

impl PatientContext {
    /// True when no attribute carries any information.
    pub fn is_empty(&self) -> bool {
        self.age.is_none()
            && blank(&self.allergies)
            && blank(&self.chronic_conditions)
            && blank(&self.current_medications)
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}
