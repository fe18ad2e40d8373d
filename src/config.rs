use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "MedAi";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default local Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Upper bound for one generative narrative call.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

/// Get the application data directory.
/// ~/MedAi/ on all platforms, or ./MedAi when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// SQLite file holding analysis history and feedback.
pub fn database_path() -> PathBuf {
    app_data_dir().join("medai.db")
}

/// Default location of the interaction knowledge file.
pub fn interactions_path() -> PathBuf {
    app_data_dir().join("drug_interactions.json")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medai_lib=info,warn"
}

/// Runtime knobs for the analysis engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Interaction knowledge file. Missing file → built-in defaults.
    pub interactions_path: PathBuf,
    /// Whether the generative strategy is attempted at all.
    pub llm_enabled: bool,
    pub ollama_url: String,
    /// Pinned model name. `None` = pick the best installed one.
    pub ollama_model: Option<String>,
    pub llm_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interactions_path: interactions_path(),
            llm_enabled: true,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: None,
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `MEDAI_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (env, test maps).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = non_empty(lookup("MEDAI_INTERACTIONS_PATH")) {
            config.interactions_path = PathBuf::from(path);
        }
        if let Some(flag) = non_empty(lookup("MEDAI_LLM_ENABLED")) {
            config.llm_enabled = parse_flag(&flag);
        }
        if let Some(url) = non_empty(lookup("MEDAI_OLLAMA_URL")) {
            config.ollama_url = url;
        }
        config.ollama_model = non_empty(lookup("MEDAI_OLLAMA_MODEL"));
        if let Some(secs) = non_empty(lookup("MEDAI_LLM_TIMEOUT_SECS")) {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => config.llm_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %secs, "Ignoring invalid MEDAI_LLM_TIMEOUT_SECS"),
            }
        }

        config
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
