use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Modality {
    Text => "text",
    Image => "image",
    Voice => "voice",
});

str_enum!(Severity {
    High => "high",
    Moderate => "moderate",
    Low => "low",
    None => "none",
});

str_enum!(NarrativeSource {
    Generative => "generative",
    KnowledgeBase => "knowledge_base",
    InsufficientInput => "insufficient_input",
});

impl Severity {
    /// Points removed from the safety score for one finding of this tier.
    pub fn deduction(&self) -> f64 {
        match self {
            Self::High => 30.0,
            Self::Moderate => 15.0,
            Self::Low => 5.0,
            Self::None => 0.0,
        }
    }

    /// Classify a knowledge-base description by its leading tier word.
    ///
    /// "HIGH RISK: ..." → High, "MODERATE: ..." → Moderate, "LOW: ..." → Low,
    /// "NONE" / "NO INTERACTION" → None. Anything else is treated as Moderate.
    /// Only whole words count: "Highly ..." or "Lowers ..." carry no tier.
    pub fn classify(description: &str) -> Self {
        let upper = description.to_uppercase();
        let mut words = upper
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty());

        match (words.next(), words.next()) {
            (Some("HIGH" | "SEVERE" | "MAJOR"), _) => Self::High,
            (Some("MODERATE"), _) => Self::Moderate,
            (Some("LOW" | "MINOR"), _) => Self::Low,
            (Some("NONE"), _) | (Some("NO"), Some("INTERACTION" | "KNOWN")) => Self::None,
            _ => Self::Moderate,
        }
    }
}
