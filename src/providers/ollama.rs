//! Ollama text generator for Bella
//!
//! Implements `TextGenerator` against a local or remote Ollama server using
//! the non-streaming `/api/generate` endpoint. `load` probes `/api/tags` to
//! confirm the server is reachable and the configured model is installed.

use crate::config::OllamaConfig;
use crate::error::{BellaError, Result};
use crate::providers::{GenerationParams, TextGenerator};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Ollama-backed local model
///
/// # Examples
///
/// ```
/// use bella::config::OllamaConfig;
/// use bella::providers::{OllamaGenerator, TextGenerator};
///
/// let generator = OllamaGenerator::new(OllamaConfig::default()).unwrap();
/// assert_eq!(generator.model_name(), "llama3.2:1b");
/// ```
pub struct OllamaGenerator {
    client: Client,
    config: Arc<RwLock<OllamaConfig>>,
}

/// Response from Ollama's /api/tags endpoint
#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaModelTag {
    name: String,
}

/// Request body for /api/generate
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: String,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
    top_k: u32,
    top_p: f32,
    repeat_penalty: f32,
}

impl From<&GenerationParams> for GenerateOptions {
    fn from(params: &GenerationParams) -> Self {
        Self {
            num_predict: params.max_new_tokens,
            // Greedy decoding is expressed as zero temperature.
            temperature: if params.do_sample {
                params.temperature
            } else {
                0.0
            },
            top_k: params.top_k,
            top_p: params.top_p,
            repeat_penalty: params.repetition_penalty,
        }
    }
}

/// Response body from /api/generate
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

impl OllamaGenerator {
    /// Create a new Ollama generator
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("bella/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BellaError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama generator: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self {
            client,
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// Get the configured Ollama host
    pub fn host(&self) -> String {
        self.config
            .read()
            .map(|config| config.host.trim_end_matches('/').to_string())
            .unwrap_or_default()
    }

    fn model(&self) -> String {
        self.config
            .read()
            .map(|config| config.model.clone())
            .unwrap_or_default()
    }
}

fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || installed.strip_suffix(":latest") == Some(wanted)
        || wanted.strip_suffix(":latest") == Some(installed)
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let url = format!("{}/api/generate", self.host());
        let request = GenerateRequest {
            model: self.model(),
            prompt,
            stream: false,
            options: params.into(),
        };

        tracing::debug!(model = %request.model, "Sending Ollama generate request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Ollama request failed: {}", e);
                BellaError::provider("local", format!("network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(BellaError::provider(
                "local",
                format!("model error {}: {}", status, error_text),
            )
            .into());
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            BellaError::provider("local", format!("invalid model response: {}", e))
        })?;

        if !body.done {
            tracing::debug!("Ollama reported an unfinished generation");
        }

        Ok(body.response)
    }

    async fn load(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.host());
        let wanted = self.model();

        let response = self.client.get(&url).send().await.map_err(|e| {
            BellaError::provider("local", format!("Failed to connect to Ollama server: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(BellaError::provider(
                "local",
                format!("Ollama returned error {}", response.status()),
            )
            .into());
        }

        let tags: OllamaTagsResponse = response.json().await.map_err(|e| {
            BellaError::provider("local", format!("Failed to parse Ollama response: {}", e))
        })?;

        if !tags.models.iter().any(|m| model_matches(&m.name, &wanted)) {
            return Err(BellaError::provider(
                "local",
                format!("model {} is not installed on the Ollama server", wanted),
            )
            .into());
        }

        tracing::info!(model = %wanted, "Local model available");
        Ok(())
    }

    fn model_name(&self) -> String {
        self.model()
    }
}
