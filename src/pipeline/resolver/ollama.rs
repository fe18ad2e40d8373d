use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::NarrativeGenerator;
use super::StrategyError;

/// Preferred medical models in order of preference.
const PREFERRED_MODELS: &[&str] = &[
    "medgemma",
    "medgemma:27b",
    "medgemma:4b",
    "llama3",
    "mistral",
];

/// Narrative generator backed by a local Ollama instance.
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl OllamaGenerator {
    /// Create a generator for an explicit model.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, StrategyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StrategyError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout,
        })
    }

    /// Connect and pick a model: `model` if given and installed, otherwise
    /// the best installed one from the preference list.
    pub fn connect(
        base_url: &str,
        model: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, StrategyError> {
        let mut generator = Self::new(base_url, model.unwrap_or_default(), timeout)?;
        let available = generator.list_models()?;

        let chosen = match model {
            Some(pinned) => available
                .iter()
                .any(|m| m.starts_with(pinned))
                .then(|| pinned.to_string()),
            None => pick_model(&available),
        };

        match chosen {
            Some(name) => {
                tracing::info!(model = %name, "Ollama narrative generator: model confirmed");
                generator.model = name;
                Ok(generator)
            }
            None => Err(StrategyError::Unavailable(format!(
                "no suitable model installed at {}",
                generator.base_url
            ))),
        }
    }

    /// Installed model names from `/api/tags`.
    pub fn list_models(&self) -> Result<Vec<String>, StrategyError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StrategyError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaTagsResponse = response
            .json()
            .map_err(|e| StrategyError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    fn map_send_error(&self, e: reqwest::Error) -> StrategyError {
        if e.is_connect() {
            StrategyError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            StrategyError::Timeout(self.timeout)
        } else {
            StrategyError::Http(e.to_string())
        }
    }
}

/// First preferred model that is installed.
fn pick_model(available: &[String]) -> Option<String> {
    PREFERRED_MODELS.iter().find_map(|preferred| {
        available
            .iter()
            .find(|m| m.starts_with(preferred))
            .cloned()
    })
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl NarrativeGenerator for OllamaGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, system: &str, prompt: &str) -> Result<String, StrategyError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StrategyError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| StrategyError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let generator =
            OllamaGenerator::new("http://localhost:11434/", "medgemma", Duration::from_secs(5))
                .unwrap();
        assert_eq!(generator.base_url, "http://localhost:11434");
        assert_eq!(generator.model(), "medgemma");
    }

    #[test]
    fn pick_model_follows_preference() {
        let available = vec!["llama3:8b".to_string(), "medgemma:4b".to_string()];
        assert_eq!(pick_model(&available).as_deref(), Some("medgemma:4b"));
    }

    #[test]
    fn pick_model_none_when_nothing_suitable() {
        assert!(pick_model(&["phi3:mini".to_string()]).is_none());
        assert!(pick_model(&[]).is_none());
    }

    #[test]
    fn unreachable_server_is_a_strategy_error() {
        // Port 9 (discard) on localhost is not an Ollama server.
        let result = OllamaGenerator::connect("http://127.0.0.1:9", None, Duration::from_secs(1));
        assert!(result.is_err());
    }
}
