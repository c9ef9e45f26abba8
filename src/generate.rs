//! Text generation backend used for document analysis

use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Trait for text generation providers
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete a single prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Text { text: String },
    Output { output: String },
    Choices { choices: Vec<GenerateChoice> },
}

#[derive(Debug, Deserialize)]
struct GenerateChoice {
    text: String,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        match self {
            GenerateResponse::Text { text } => Some(text),
            GenerateResponse::Output { output } => Some(output),
            GenerateResponse::Choices { choices } => choices.into_iter().next().map(|c| c.text),
        }
    }
}

/// Generator backed by an HTTP completion service
pub struct HttpGenerator {
    client: Client,
    base_url: Url,
    model_id: String,
}

impl HttpGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let base_url = Url::parse(&config.backend_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            model_id: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self
            .base_url
            .join("/v1/generate")
            .map_err(|e| Error::Config(format!("Invalid generation backend URL: {}", e)))?;

        debug!("Requesting generation ({} prompt chars)", prompt.chars().count());
        let response = self
            .client
            .post(url)
            .json(&GenerateRequest {
                model: &self.model_id,
                prompt,
            })
            .send()
            .await
            .map_err(|e| Error::Generation(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Generation(e.to_string()))?;

        let parsed: GenerateResponse = response.json().await?;
        parsed
            .into_text()
            .ok_or_else(|| Error::Generation("Generation backend returned no choices".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

/// Create a generator when generation is enabled
pub fn create_generator(config: &GenerationConfig) -> Result<Option<Box<dyn TextGenerator>>> {
    if !config.enabled {
        return Ok(None);
    }
    Ok(Some(Box::new(HttpGenerator::new(config)?)))
}
