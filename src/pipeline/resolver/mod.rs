//! Interaction Resolver.
//!
//! Two strategies, tried in order:
//! 1. Generative: a [`NarrativeGenerator`] writes the narrative, bounded by a
//!    timeout. Any failure, including the timeout, yields a [`StrategyError`]
//!    that is logged and routed to the fallback. No retry.
//! 2. Knowledge base: deterministic narrative built from the findings.
//!
//! The structured findings always come from the knowledge-base pass, so
//! scoring is deterministic whichever strategy wrote the narrative.

pub mod ollama;
pub mod prompt;
pub mod types;

pub use ollama::OllamaGenerator;
pub use prompt::*;
pub use types::*;

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::knowledge::KnowledgeBase;
use crate::models::{
    dedup_medications, InteractionFinding, Medication, Narrative, NarrativeSource, PatientContext,
};

/// Why the generative strategy did not produce a narrative.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Generative strategy unavailable: {0}")]
    Unavailable(String),

    #[error("Ollama is not running at {0}")]
    Connection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Generator returned an empty narrative")]
    EmptyResponse,

    #[error("Generative strategy timed out after {0:?}")]
    Timeout(Duration),
}

/// Findings plus the narrative recommendation for one medication list.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub findings: Vec<InteractionFinding>,
    pub narrative: Narrative,
}

pub struct InteractionResolver {
    knowledge: Arc<KnowledgeBase>,
    generator: Option<Arc<dyn NarrativeGenerator>>,
    timeout: Duration,
}

impl InteractionResolver {
    /// Knowledge-base-only resolver.
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self {
            knowledge,
            generator: None,
            timeout: Duration::from_secs(crate::config::DEFAULT_LLM_TIMEOUT_SECS),
        }
    }

    /// Attach a generative strategy, bounded by `timeout` per call.
    pub fn with_generator(mut self, generator: Arc<dyn NarrativeGenerator>, timeout: Duration) -> Self {
        self.generator = Some(generator);
        self.timeout = timeout;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Resolve interactions for a medication list. Never fails.
    pub fn resolve(
        &self,
        medications: &[Medication],
        context: Option<&PatientContext>,
    ) -> Resolution {
        let medications = dedup_medications(medications.to_vec());

        if medications.len() < 2 {
            return Resolution {
                findings: Vec::new(),
                narrative: Narrative {
                    text: INSUFFICIENT_MEDICATIONS.to_string(),
                    source: NarrativeSource::InsufficientInput,
                    model: None,
                },
            };
        }

        let findings = self.find_interactions(&medications);

        let narrative = match self.generative_narrative(&medications, context) {
            Some(Ok(narrative)) => narrative,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Generative strategy failed");
                tracing::info!("Falling back to knowledge-base narrative");
                self.knowledge_based(&medications, &findings)
            }
            None => self.knowledge_based(&medications, &findings),
        };

        Resolution {
            findings,
            narrative,
        }
    }

    /// Knowledge-base pass: every unordered pair `(i, j)`, `i < j`, looked up
    /// in both directions. Pairs without data produce no finding.
    pub fn find_interactions(&self, medications: &[Medication]) -> Vec<InteractionFinding> {
        let mut findings = Vec::new();
        for (i, first) in medications.iter().enumerate() {
            for second in &medications[i + 1..] {
                let Some(description) = self.knowledge.lookup(&first.name, &second.name) else {
                    continue;
                };
                if let Some(finding) = InteractionFinding::new(&first.name, &second.name, description) {
                    findings.push(finding);
                }
            }
        }
        findings
    }

    fn knowledge_based(&self, medications: &[Medication], findings: &[InteractionFinding]) -> Narrative {
        Narrative {
            text: knowledge_narrative(medications, findings),
            source: NarrativeSource::KnowledgeBase,
            model: None,
        }
    }

    /// `None` when no generator is configured.
    fn generative_narrative(
        &self,
        medications: &[Medication],
        context: Option<&PatientContext>,
    ) -> Option<Result<Narrative, StrategyError>> {
        let generator = self.generator.as_ref()?;
        let prompt = build_interaction_prompt(medications, context);

        let result = self
            .call_with_timeout(generator, prompt)
            .map(|raw| clean_generated(&raw))
            .and_then(|text| {
                if text.is_empty() {
                    Err(StrategyError::EmptyResponse)
                } else {
                    Ok(Narrative {
                        text,
                        source: NarrativeSource::Generative,
                        model: Some(generator.model().to_string()),
                    })
                }
            });
        Some(result)
    }

    /// Run the generator on a worker thread and wait at most `self.timeout`.
    /// A timed-out worker is left to finish on its own.
    fn call_with_timeout(
        &self,
        generator: &Arc<dyn NarrativeGenerator>,
        prompt: String,
    ) -> Result<String, StrategyError> {
        let (tx, rx) = mpsc::channel();
        let worker = Arc::clone(generator);

        std::thread::Builder::new()
            .name("medai-narrative".into())
            .spawn(move || {
                let _ = tx.send(worker.generate(INTERACTION_SYSTEM_PROMPT, &prompt));
            })
            .map_err(|e| StrategyError::Unavailable(e.to_string()))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(StrategyError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(StrategyError::Unavailable(
                "narrative worker exited without a result".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use std::collections::HashMap;

    fn meds(names: &[&str]) -> Vec<Medication> {
        names.iter().filter_map(|n| Medication::new(n)).collect()
    }

    fn kb(rows: &[(&str, &str, &str)]) -> Arc<KnowledgeBase> {
        let mut table: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (a, b, d) in rows {
            table
                .entry(a.to_string())
                .or_default()
                .insert(b.to_string(), d.to_string());
        }
        Arc::new(KnowledgeBase::from_table(table))
    }

    fn builtin_resolver() -> InteractionResolver {
        InteractionResolver::new(Arc::new(KnowledgeBase::builtin()))
    }

    /// Panics inside the worker thread.
    struct PanickingGenerator;

    impl NarrativeGenerator for PanickingGenerator {
        fn model(&self) -> &str {
            "panicking"
        }

        fn generate(&self, _system: &str, _prompt: &str) -> Result<String, StrategyError> {
            panic!("generator crashed")
        }
    }

    #[test]
    fn fewer_than_two_is_insufficient() {
        let resolver = builtin_resolver();
        for list in [meds(&[]), meds(&["aspirin"]), meds(&["aspirin", "ASPIRIN"])] {
            let resolution = resolver.resolve(&list, None);
            assert!(resolution.findings.is_empty());
            assert_eq!(resolution.narrative.text, INSUFFICIENT_MEDICATIONS);
            assert_eq!(resolution.narrative.source, NarrativeSource::InsufficientInput);
        }
    }

    #[test]
    fn insufficient_input_skips_generator() {
        let mock = Arc::new(MockGenerator::new("should not run"));
        let resolver = builtin_resolver().with_generator(mock.clone(), Duration::from_secs(1));
        resolver.resolve(&meds(&["aspirin"]), None);
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn aspirin_warfarin_high_finding() {
        let resolver = InteractionResolver::new(kb(&[("aspirin", "warfarin", "HIGH RISK: bleeding")]));
        let resolution = resolver.resolve(&meds(&["aspirin", "warfarin"]), None);
        assert_eq!(resolution.findings.len(), 1);
        let finding = &resolution.findings[0];
        assert_eq!(finding.severity, Severity::High);
        assert_eq!((finding.med1.as_str(), finding.med2.as_str()), ("aspirin", "warfarin"));
        let text = resolution.narrative.text.to_lowercase();
        assert!(text.contains("aspirin") && text.contains("warfarin"));
        assert_eq!(resolution.narrative.source, NarrativeSource::KnowledgeBase);
    }

    #[test]
    fn reverse_direction_yields_same_finding() {
        let resolver = InteractionResolver::new(kb(&[("A", "B", "desc")]));
        let forward = resolver.find_interactions(&meds(&["A", "B"]));
        let reverse = resolver.find_interactions(&meds(&["B", "A"]));
        assert_eq!(forward.len(), 1);
        assert_eq!(reverse.len(), 1);
        assert_eq!(forward[0].description, reverse[0].description);
        assert_eq!(forward[0].severity, reverse[0].severity);
        assert!(reverse[0].concerns("a", "b"));
    }

    #[test]
    fn symmetric_data_produces_one_finding_per_pair() {
        let resolver = builtin_resolver();
        let list = meds(&["aspirin", "warfarin", "lisinopril", "metformin", "ibuprofen"]);
        let findings = resolver.find_interactions(&list);
        let n = list.len();
        assert!(findings.len() <= n * (n - 1) / 2);
        for (i, a) in findings.iter().enumerate() {
            for b in &findings[i + 1..] {
                assert!(!a.concerns(&b.med1, &b.med2), "duplicate pair {a:?} / {b:?}");
            }
        }
        // aspirin-warfarin, aspirin-lisinopril, aspirin-metformin,
        // aspirin-ibuprofen, lisinopril-metformin
        assert_eq!(findings.len(), 5);
    }

    #[test]
    fn missing_data_is_silent() {
        let resolver = builtin_resolver();
        let resolution = resolver.resolve(&meds(&["paracetamol", "omeprazole"]), None);
        assert!(resolution.findings.is_empty());
        assert!(resolution.narrative.text.starts_with("No known interactions found"));
    }

    #[test]
    fn generator_writes_narrative_but_findings_come_from_knowledge() {
        let mock = Arc::new(MockGenerator::new("  Generated advice.  "));
        let resolver = builtin_resolver().with_generator(mock.clone(), Duration::from_secs(5));
        let resolution = resolver.resolve(&meds(&["aspirin", "warfarin"]), None);

        assert_eq!(mock.calls(), 1);
        assert_eq!(resolution.narrative.text, "Generated advice.");
        assert_eq!(resolution.narrative.source, NarrativeSource::Generative);
        assert_eq!(resolution.narrative.model.as_deref(), Some("mock"));
        assert_eq!(resolution.findings.len(), 1);
        assert_eq!(resolution.findings[0].severity, Severity::High);
    }

    #[test]
    fn failing_generator_falls_back() {
        let resolver =
            builtin_resolver().with_generator(Arc::new(FailingGenerator), Duration::from_secs(5));
        let resolution = resolver.resolve(&meds(&["aspirin", "warfarin"]), None);
        assert_eq!(resolution.narrative.source, NarrativeSource::KnowledgeBase);
        assert!(resolution.narrative.text.contains("Aspirin + Warfarin"));
        assert_eq!(resolution.findings.len(), 1);
    }

    #[test]
    fn empty_generation_falls_back() {
        let resolver = builtin_resolver()
            .with_generator(Arc::new(MockGenerator::new("<unused3>  ")), Duration::from_secs(5));
        let resolution = resolver.resolve(&meds(&["aspirin", "warfarin"]), None);
        assert_eq!(resolution.narrative.source, NarrativeSource::KnowledgeBase);
    }

    #[test]
    fn timeout_falls_back() {
        let slow = Arc::new(SlowGenerator::new(Duration::from_secs(2)));
        let resolver = builtin_resolver().with_generator(slow, Duration::from_millis(50));
        let started = std::time::Instant::now();
        let resolution = resolver.resolve(&meds(&["aspirin", "warfarin"]), None);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(resolution.narrative.source, NarrativeSource::KnowledgeBase);
        assert_eq!(resolution.findings.len(), 1);
    }

    #[test]
    fn panicking_generator_falls_back() {
        let resolver =
            builtin_resolver().with_generator(Arc::new(PanickingGenerator), Duration::from_secs(5));
        let resolution = resolver.resolve(&meds(&["aspirin", "warfarin"]), None);
        assert_eq!(resolution.narrative.source, NarrativeSource::KnowledgeBase);
    }

    #[test]
    fn duplicates_in_input_are_collapsed() {
        let resolver = builtin_resolver();
        let resolution = resolver.resolve(&meds(&["aspirin", "Warfarin", "ASPIRIN"]), None);
        assert_eq!(resolution.findings.len(), 1);
    }

    #[test]
    fn context_is_not_mutated() {
        let ctx = PatientContext {
            age: Some(80),
            allergies: Some("sulfa".into()),
            ..Default::default()
        };
        let before = ctx.clone();
        let resolver = builtin_resolver()
            .with_generator(Arc::new(MockGenerator::new("ok")), Duration::from_secs(5));
        resolver.resolve(&meds(&["aspirin", "warfarin"]), Some(&ctx));
        assert_eq!(ctx, before);
    }
}
