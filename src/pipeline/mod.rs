pub mod extraction;
pub mod orchestrator; // Extraction → resolution → scoring
pub mod resolver;
pub mod scoring;

pub use orchestrator::{AnalysisEngine, AnalysisError};
