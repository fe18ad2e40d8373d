//! Interaction Knowledge Base: drug → drug → risk description.
//!
//! Loaded once from a JSON file shaped like
//! `{"aspirin": {"warfarin": "HIGH RISK: ..."}}`, falling back to a bundled
//! table when no file is available. Read-only after load and shared across
//! concurrent analyses behind an `Arc`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Failed to read interaction file {0}: {1}")]
    Read(String, String),

    #[error("Failed to parse interaction file {0}: {1}")]
    Parse(String, String),
}

/// Where a knowledge base came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeSource {
    File(String),
    Builtin,
}

/// Raw file layout before normalization.
pub type InteractionTable = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    interactions: InteractionTable,
    source: KnowledgeSource,
}

impl KnowledgeBase {
    /// Build from an in-memory table. Keys are trimmed and lower-cased.
    pub fn from_table(table: InteractionTable) -> Self {
        Self::with_source(table, KnowledgeSource::Builtin)
    }

    /// Keys that collide after normalization ("Aspirin" / "aspirin") keep
    /// the entry spelled in normalized form, then the first in key order.
    fn with_source(table: InteractionTable, source: KnowledgeSource) -> Self {
        let mut rows: Vec<(String, String, String)> = table
            .into_iter()
            .flat_map(|(drug, counterparts)| {
                counterparts
                    .into_iter()
                    .map(move |(other, description)| (drug.clone(), other, description))
            })
            .collect();
        rows.sort_by_cached_key(|(drug, other, _)| {
            (
                normalize_key(drug) != *drug,
                drug.clone(),
                normalize_key(other) != *other,
                other.clone(),
            )
        });

        let mut interactions: InteractionTable = HashMap::new();
        for (drug, other, description) in rows {
            let (drug_key, other_key) = (normalize_key(&drug), normalize_key(&other));
            if drug_key.is_empty() || other_key.is_empty() {
                continue;
            }
            match interactions.entry(drug_key).or_default().entry(other_key) {
                Entry::Vacant(slot) => {
                    slot.insert(description);
                }
                Entry::Occupied(kept) => {
                    if *kept.get() != description {
                        tracing::warn!(
                            drug = %drug,
                            other = %other,
                            "Duplicate interaction entry after normalization, keeping the first"
                        );
                    }
                }
            }
        }

        Self {
            interactions,
            source,
        }
    }

    /// Load from a JSON file. Errors on unreadable or malformed files.
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| KnowledgeError::Read(path.display().to_string(), e.to_string()))?;
        let table: InteractionTable = serde_json::from_str(&json)
            .map_err(|e| KnowledgeError::Parse(path.display().to_string(), e.to_string()))?;
        let kb = Self::with_source(table, KnowledgeSource::File(path.display().to_string()));
        tracing::info!(
            path = %path.display(),
            drugs = kb.drug_count(),
            entries = kb.entry_count(),
            "Loaded interaction knowledge base"
        );
        Ok(kb)
    }

    /// Load from `path`, or fall back to the bundled table if the file is
    /// missing or invalid.
    pub fn load_or_builtin(path: &Path) -> Self {
        match Self::load(path) {
            Ok(kb) => kb,
            Err(e) => {
                tracing::warn!(error = %e, "Using built-in interaction table");
                Self::builtin()
            }
        }
    }

    /// Bundled safe-default table.
    pub fn builtin() -> Self {
        let rows: &[(&str, &[(&str, &str)])] = &[
            (
                "aspirin",
                &[
                    ("warfarin", "HIGH RISK: Increased bleeding risk. Monitor INR closely."),
                    ("ibuprofen", "MODERATE: Increased GI bleeding risk."),
                    ("metformin", "LOW RISK: Generally safe combination."),
                ],
            ),
            (
                "warfarin",
                &[
                    ("aspirin", "HIGH RISK: Increased bleeding risk. Monitor INR closely."),
                    ("amoxicillin", "MODERATE: May increase warfarin effect."),
                    ("vitamin_k", "MODERATE: May decrease warfarin effect."),
                ],
            ),
            (
                "lisinopril",
                &[
                    ("potassium", "MODERATE: Risk of hyperkalemia."),
                    ("aspirin", "LOW: May reduce antihypertensive effect."),
                    ("metformin", "LOW RISK: Generally safe combination."),
                ],
            ),
            (
                "metformin",
                &[
                    ("aspirin", "LOW RISK: Generally safe combination."),
                    ("lisinopril", "LOW RISK: Generally safe combination."),
                    ("alcohol", "MODERATE: Risk of lactic acidosis."),
                ],
            ),
        ];

        let table: InteractionTable = rows
            .iter()
            .map(|(drug, counterparts)| {
                let inner: HashMap<String, String> = counterparts
                    .iter()
                    .map(|(other, desc)| (other.to_string(), desc.to_string()))
                    .collect();
                (drug.to_string(), inner)
            })
            .collect();
        let kb = Self::with_source(table, KnowledgeSource::Builtin);
        tracing::info!(
            drugs = kb.drug_count(),
            entries = kb.entry_count(),
            "Loaded built-in interaction knowledge base"
        );
        kb
    }

    /// Description recorded for the pair, trying `a → b` then `b → a`.
    pub fn lookup(&self, a: &str, b: &str) -> Option<&str> {
        let a = normalize_key(a);
        let b = normalize_key(b);
        self.directed(&a, &b).or_else(|| self.directed(&b, &a))
    }

    fn directed(&self, from: &str, to: &str) -> Option<&str> {
        self.interactions
            .get(from)
            .and_then(|counterparts| counterparts.get(to))
            .map(String::as_str)
    }

    /// Number of drugs with at least one outgoing entry.
    pub fn drug_count(&self) -> usize {
        self.interactions.len()
    }

    /// Number of directed entries.
    pub fn entry_count(&self) -> usize {
        self.interactions.values().map(HashMap::len).sum()
    }

    pub fn source(&self) -> &KnowledgeSource {
        &self.source
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table(rows: &[(&str, &str, &str)]) -> InteractionTable {
        let mut t: InteractionTable = HashMap::new();
        for (a, b, d) in rows {
            t.entry(a.to_string())
                .or_default()
                .insert(b.to_string(), d.to_string());
        }
        t
    }

    #[test]
    fn lookup_is_direction_tolerant() {
        let kb = KnowledgeBase::from_table(table(&[("A", "B", "desc")]));
        assert_eq!(kb.lookup("a", "b"), Some("desc"));
        assert_eq!(kb.lookup("B", "A"), Some("desc"));
    }

    #[test]
    fn forward_direction_wins_when_asymmetric() {
        let kb = KnowledgeBase::from_table(table(&[
            ("x", "y", "MODERATE: forward"),
            ("y", "x", "LOW: reverse"),
        ]));
        assert_eq!(kb.lookup("x", "y"), Some("MODERATE: forward"));
        assert_eq!(kb.lookup("y", "x"), Some("LOW: reverse"));
    }

    #[test]
    fn unknown_pair_is_none() {
        let kb = KnowledgeBase::builtin();
        assert_eq!(kb.lookup("aspirin", "paracetamol"), None);
        assert_eq!(kb.lookup("", "aspirin"), None);
    }

    #[test]
    fn builtin_has_known_pairs() {
        let kb = KnowledgeBase::builtin();
        assert_eq!(kb.source(), &KnowledgeSource::Builtin);
        assert_eq!(kb.drug_count(), 4);
        assert_eq!(kb.entry_count(), 12);
        assert!(kb.lookup("Warfarin", " ASPIRIN ").unwrap().starts_with("HIGH RISK"));
        // Only recorded as lisinopril → potassium.
        assert!(kb.lookup("potassium", "lisinopril").is_some());
    }

    #[test]
    fn keys_are_normalized_on_build() {
        let kb = KnowledgeBase::from_table(table(&[("  Aspirin ", "WARFARIN", "HIGH")]));
        assert_eq!(kb.lookup("aspirin", "warfarin"), Some("HIGH"));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"clopidogrel": {{"omeprazole": "MODERATE: Reduced antiplatelet effect."}}}}"#
        )
        .unwrap();

        let kb = KnowledgeBase::load(file.path()).unwrap();
        assert!(matches!(kb.source(), KnowledgeSource::File(_)));
        assert_eq!(
            kb.lookup("omeprazole", "clopidogrel"),
            Some("MODERATE: Reduced antiplatelet effect.")
        );
        assert!(kb.lookup("aspirin", "warfarin").is_none());
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = KnowledgeBase::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, KnowledgeError::Read(_, _)));
    }

    #[test]
    fn load_malformed_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        let err = KnowledgeBase::load(file.path()).unwrap_err();
        assert!(matches!(err, KnowledgeError::Parse(_, _)));
    }

    #[test]
    fn load_or_builtin_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let kb = KnowledgeBase::load_or_builtin(&dir.path().join("absent.json"));
        assert_eq!(kb.source(), &KnowledgeSource::Builtin);
        assert!(kb.lookup("aspirin", "warfarin").is_some());
    }

    #[test]
    fn bundled_resource_matches_builtin() {
        let path = Path::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/resources/drug_interactions.json"
        ));
        let bundled = KnowledgeBase::load(path).unwrap();
        let builtin = KnowledgeBase::builtin();
        assert_eq!(bundled.drug_count(), builtin.drug_count());
        assert_eq!(bundled.entry_count(), builtin.entry_count());
        for (a, b) in [("aspirin", "warfarin"), ("metformin", "lisinopril"), ("warfarin", "vitamin_k")] {
            assert_eq!(bundled.lookup(a, b), builtin.lookup(a, b));
        }
    }

    #[test]
    fn colliding_keys_resolve_deterministically() {
        let json = r#"{"Aspirin": {"warfarin": "HIGH RISK"}, "aspirin": {"warfarin": "LOW"}}"#;
        for _ in 0..50 {
            let parsed: InteractionTable = serde_json::from_str(json).unwrap();
            let kb = KnowledgeBase::from_table(parsed);
            assert_eq!(kb.lookup("aspirin", "warfarin"), Some("LOW"));
            assert_eq!(kb.entry_count(), 1);
        }
    }

    #[test]
    fn colliding_counterparts_prefer_normalized_spelling() {
        let kb = KnowledgeBase::from_table(table(&[
            ("aspirin", " Warfarin", "MODERATE: spaced"),
            ("aspirin", "warfarin", "HIGH RISK: exact"),
        ]));
        assert_eq!(kb.lookup("aspirin", "warfarin"), Some("HIGH RISK: exact"));
    }
}
