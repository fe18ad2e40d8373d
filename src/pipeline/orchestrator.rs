//! Analysis Orchestrator: extraction → interaction resolution → scoring.
//!
//! One engine is built per process and shared read-only between requests.
//! Each `analyze` call is independent; nothing is cached between calls.

use std::sync::{Arc, OnceLock};

use thiserror::Error;

use super::extraction::extract_medications;
use super::resolver::{InteractionResolver, OllamaGenerator};
use super::scoring::safety_score;
use crate::config::EngineConfig;
use crate::knowledge::KnowledgeBase;
use crate::models::{AnalysisResult, Modality, PatientContext};
use crate::store::{AnalysisId, AnalysisStore, StoreError};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No medications detected in {modality} input")]
    NoMedicationsDetected { modality: Modality },

    #[error("Failed to persist analysis: {0}")]
    Persistence(#[from] StoreError),
}

pub struct AnalysisEngine {
    resolver: InteractionResolver,
}

static SHARED_ENGINE: OnceLock<Arc<AnalysisEngine>> = OnceLock::new();

impl AnalysisEngine {
    pub fn new(resolver: InteractionResolver) -> Self {
        Self { resolver }
    }

    /// Build from configuration: load the knowledge base (built-in table if
    /// the file is unusable) and connect the generative strategy if enabled.
    /// An unreachable generator is not an error; analyses then use the
    /// knowledge-base narrative only.
    pub fn from_config(config: &EngineConfig) -> Self {
        let knowledge = Arc::new(KnowledgeBase::load_or_builtin(&config.interactions_path));
        let mut resolver = InteractionResolver::new(knowledge);

        if config.llm_enabled {
            match OllamaGenerator::connect(
                &config.ollama_url,
                config.ollama_model.as_deref(),
                config.llm_timeout,
            ) {
                Ok(generator) => {
                    resolver = resolver.with_generator(Arc::new(generator), config.llm_timeout);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Generative strategy unavailable, using knowledge base only");
                }
            }
        } else {
            tracing::info!("Generative strategy disabled by configuration");
        }

        Self::new(resolver)
    }

    /// Process-wide engine, built once from the environment on first use.
    pub fn shared() -> Arc<AnalysisEngine> {
        SHARED_ENGINE
            .get_or_init(|| Arc::new(Self::from_config(&EngineConfig::from_env())))
            .clone()
    }

    pub fn resolver(&self) -> &InteractionResolver {
        &self.resolver
    }

    /// Analyze one input. Fails only when no medication can be extracted.
    pub fn analyze(
        &self,
        raw_input: &str,
        modality: Modality,
        context: Option<&PatientContext>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let medications = extract_medications(raw_input, modality);
        if medications.is_empty() {
            tracing::info!(modality = %modality, "No medications detected");
            return Err(AnalysisError::NoMedicationsDetected { modality });
        }

        let resolution = self.resolver.resolve(&medications, context);
        let score = safety_score(&resolution.findings);

        tracing::info!(
            modality = %modality,
            medications = medications.len(),
            findings = resolution.findings.len(),
            safety_score = score,
            narrative_source = %resolution.narrative.source,
            "Analysis complete"
        );

        Ok(AnalysisResult::new(
            modality,
            raw_input,
            medications,
            resolution.findings,
            score,
            resolution.narrative,
        ))
    }

    /// Analyze, then hand the result to `store`. The store assigns the id.
    pub fn analyze_and_save(
        &self,
        store: &dyn AnalysisStore,
        raw_input: &str,
        modality: Modality,
        context: Option<&PatientContext>,
    ) -> Result<(AnalysisId, AnalysisResult), AnalysisError> {
        let result = self.analyze(raw_input, modality, context)?;
        let id = store.save_analysis(&result)?;
        Ok((id, result))
    }
}
