use serde::{Deserialize, Serialize};

use super::enums::Severity;

/// One recorded interaction assessment between two distinct medications.
///
/// The pair is unordered: `med1`/`med2` keep the order in which the
/// medications were submitted, but equality of pairs ignores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionFinding {
    pub med1: String,
    pub med2: String,
    pub severity: Severity,
    pub description: String,
}

impl InteractionFinding {
    /// Returns `None` for self-pairs.
    pub fn new(med1: &str, med2: &str, description: &str) -> Option<Self> {
        if med1.eq_ignore_ascii_case(med2) {
            return None;
        }
        Some(Self {
            med1: med1.to_string(),
            med2: med2.to_string(),
            severity: Severity::classify(description),
            description: description.to_string(),
        })
    }

    /// Whether this finding is about the unordered pair {a, b}.
    pub fn concerns(&self, a: &str, b: &str) -> bool {
        (self.med1.eq_ignore_ascii_case(a) && self.med2.eq_ignore_ascii_case(b))
            || (self.med1.eq_ignore_ascii_case(b) && self.med2.eq_ignore_ascii_case(a))
    }
}
