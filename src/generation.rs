//! Answer generation backends.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::GenerationSettings;
use crate::types::PipelineError;

/// One content-safety rule forwarded to the generation backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

/// The fixed safety configuration every generation call carries.
pub fn default_safety_settings() -> Vec<SafetySetting> {
    [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ]
    .into_iter()
    .map(|category| SafetySetting {
        category: category.to_string(),
        threshold: "BLOCK_MEDIUM_AND_ABOVE".to_string(),
    })
    .collect()
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Produces an answer for a fully assembled prompt.
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_output_tokens: u32,
    safety_settings: &'a [SafetySetting],
}

#[derive(Deserialize)]
struct GenerateResponse {
    text: String,
}

/// Talks to a text-generation backend over JSON.
///
/// Request: `POST {endpoint}` with model, prompt, sampling parameters, and
/// the safety settings fixed at construction. Response: `{"text": ...}`.
pub struct HttpGenerator {
    client: Client,
    endpoint: Url,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
    safety_settings: Vec<SafetySetting>,
}

impl HttpGenerator {
    pub fn new(settings: &GenerationSettings) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| PipelineError::GenerationBackend(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
            safety_settings: default_safety_settings(),
        })
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            safety_settings: &self.safety_settings,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|err| PipelineError::GenerationBackend(err.to_string()))?
            .error_for_status()
            .map_err(|err| PipelineError::GenerationBackend(err.to_string()))?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|err| PipelineError::GenerationBackend(err.to_string()))?;
        Ok(body.text)
    }
}

/// Fixed-answer generator for tests and offline runs.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    answer: String,
}

impl MockGenerator {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, PipelineError> {
        Ok(self.answer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safety_settings_cover_all_four_categories() {
        let settings = default_safety_settings();
        assert_eq!(settings.len(), 4);
        assert!(
            settings
                .iter()
                .all(|s| s.threshold == "BLOCK_MEDIUM_AND_ABOVE")
        );
    }

    #[tokio::test]
    async fn mock_generator_returns_its_answer() {
        let generator = MockGenerator::new("forty-two");
        assert_eq!(generator.generate("whatever").await.unwrap(), "forty-two");
    }
}
