pub mod config;
pub mod db;
pub mod knowledge;
pub mod models;
pub mod pipeline;
pub mod store;

pub use knowledge::KnowledgeBase;
pub use models::{AnalysisResult, Modality, PatientContext};
pub use pipeline::{AnalysisEngine, AnalysisError};
pub use store::{AnalysisStore, InMemoryAnalysisStore, SqliteAnalysisStore, StoreError};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::info!("{} engine v{}", config::APP_NAME, config::APP_VERSION);
}
