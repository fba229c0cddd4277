//! Cloud provider client for Bella
//!
//! Encapsulates the remote text-generation backends (OpenAI, Qwen, ERNIE and
//! GLM). Each backend has its own request body and response shape; this
//! client builds the former, sends it, and extracts the generated text from
//! the latter. Credentials and the active provider can be changed at runtime.

use crate::config::ProviderConfig;
use crate::error::{BellaError, Result};
use crate::prompts::persona_prompt;
use crate::providers::{CloudProviderKind, Message};

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.8;
const TOP_P: f32 = 0.9;

/// One configured cloud backend
#[derive(Debug, Clone)]
pub struct CloudEndpoint {
    /// Which backend this is
    pub kind: CloudProviderKind,
    /// Endpoint URL
    pub url: String,
    /// Model identifier
    pub model: String,
    /// API key or access token
    pub credential: Option<String>,
}

impl CloudEndpoint {
    fn from_config(kind: CloudProviderKind, config: &ProviderConfig) -> Self {
        let settings = config.endpoint(kind);
        Self {
            kind,
            url: settings
                .endpoint
                .clone()
                .unwrap_or_else(|| kind.default_endpoint().to_string()),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| kind.default_model().to_string()),
            credential: settings.api_key.clone(),
        }
    }

    /// True when a real credential is present
    ///
    /// Empty strings and `YOUR_*_API_KEY` placeholders do not count.
    pub fn is_configured(&self) -> bool {
        self.credential
            .as_deref()
            .map(|key| !is_placeholder_credential(key))
            .unwrap_or(false)
    }
}

/// Returns true for empty or template credentials
///
/// # Examples
///
/// ```
/// use bella::providers::cloud::is_placeholder_credential;
///
/// assert!(is_placeholder_credential("YOUR_OPENAI_API_KEY"));
/// assert!(is_placeholder_credential("  "));
/// assert!(!is_placeholder_credential("sk-live-123"));
/// ```
pub fn is_placeholder_credential(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || (key.starts_with("YOUR_") && key.ends_with("_API_KEY"))
}

/// Name and model of the active cloud provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    /// Provider name
    pub name: String,
    /// Model identifier
    pub model: String,
}

#[derive(Debug)]
struct CloudState {
    current: CloudProviderKind,
    persona_language: String,
    endpoints: HashMap<CloudProviderKind, CloudEndpoint>,
}

/// Client for the remote text-generation backends
///
/// All four backends are configured side by side; one of them is the
/// current provider. The orchestrator may still call any configured backend
/// directly when building its fallback chain.
///
/// # Examples
///
/// ```
/// use bella::config::ProviderConfig;
/// use bella::providers::{CloudProviderClient, CloudProviderKind};
///
/// let client = CloudProviderClient::new(&ProviderConfig::default()).unwrap();
/// assert!(!client.is_configured());
/// assert!(client.set_api_key("glm", "secret"));
/// assert!(client.switch_provider("glm"));
/// assert_eq!(client.configured_providers(), vec![CloudProviderKind::Glm]);
/// ```
#[derive(Debug, Clone)]
pub struct CloudProviderClient {
    client: Client,
    state: Arc<RwLock<CloudState>>,
}

impl CloudProviderClient {
    /// Create a new cloud client from provider configuration
    ///
    /// An unknown `cloud_provider` name falls back to OpenAI with a warning;
    /// `Config::validate` rejects such names before this point in the binary.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("bella/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BellaError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let current = CloudProviderKind::parse_str(&config.cloud_provider).unwrap_or_else(|| {
            tracing::warn!(
                "Unknown cloud provider {}, defaulting to openai",
                config.cloud_provider
            );
            CloudProviderKind::OpenAi
        });

        let endpoints = CloudProviderKind::ALL
            .into_iter()
            .map(|kind| (kind, CloudEndpoint::from_config(kind, config)))
            .collect();

        tracing::info!(provider = %current, "Initialized cloud provider client");

        Ok(Self {
            client,
            state: Arc::new(RwLock::new(CloudState {
                current,
                persona_language: config.persona_language.clone(),
                endpoints,
            })),
        })
    }

    /// Set the credential for a provider
    ///
    /// Returns false for unknown provider names.
    pub fn set_api_key(&self, provider: &str, key: &str) -> bool {
        let Some(kind) = CloudProviderKind::parse_str(provider) else {
            return false;
        };
        match self.state.write() {
            Ok(mut state) => {
                if let Some(endpoint) = state.endpoints.get_mut(&kind) {
                    endpoint.credential = Some(key.trim().to_string());
                }
                tracing::info!(provider = %kind, "Credential updated");
                true
            }
            Err(_) => false,
        }
    }

    /// Make `provider` the current cloud provider
    ///
    /// Returns false for unknown provider names.
    pub fn switch_provider(&self, provider: &str) -> bool {
        let Some(kind) = CloudProviderKind::parse_str(provider) else {
            return false;
        };
        match self.state.write() {
            Ok(mut state) => {
                state.current = kind;
                tracing::info!(provider = %kind, "Switched cloud provider");
                true
            }
            Err(_) => false,
        }
    }

    /// The current cloud provider
    pub fn current_provider(&self) -> CloudProviderKind {
        self.state
            .read()
            .map(|state| state.current)
            .unwrap_or(CloudProviderKind::OpenAi)
    }

    /// Name and model of the current provider
    pub fn current_provider_info(&self) -> ProviderInfo {
        let kind = self.current_provider();
        let model = self
            .endpoint(kind)
            .map(|e| e.model)
            .unwrap_or_else(|| kind.default_model().to_string());
        ProviderInfo {
            name: kind.as_str().to_string(),
            model,
        }
    }

    /// Whether the current provider has a real credential
    pub fn is_configured(&self) -> bool {
        self.is_provider_configured(self.current_provider())
    }

    /// Whether `kind` has a real credential
    pub fn is_provider_configured(&self, kind: CloudProviderKind) -> bool {
        self.endpoint(kind)
            .map(|e| e.is_configured())
            .unwrap_or(false)
    }

    /// Every provider with a real credential, in fallback order
    pub fn configured_providers(&self) -> Vec<CloudProviderKind> {
        CloudProviderKind::ALL
            .into_iter()
            .filter(|kind| self.is_provider_configured(*kind))
            .collect()
    }

    /// Change the persona language used by `build_messages`
    pub fn set_persona_language(&self, language: &str) {
        if let Ok(mut state) = self.state.write() {
            state.persona_language = language.to_string();
        }
    }

    fn endpoint(&self, kind: CloudProviderKind) -> Option<CloudEndpoint> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.endpoints.get(&kind).cloned())
    }

    /// Message list for one cloud call: persona system prompt then the prompt
    pub fn build_messages(&self, prompt: &str) -> Vec<Message> {
        let language = self
            .state
            .read()
            .map(|state| state.persona_language.clone())
            .unwrap_or_else(|_| "en".to_string());
        vec![persona_prompt(&language), Message::user(prompt)]
    }

    /// Send `messages` to provider `kind` and return the generated text
    ///
    /// # Errors
    ///
    /// Returns `BellaError::NotConfigured` if the provider has no real
    /// credential, and `BellaError::Provider` for network failures, non-2xx
    /// statuses, and responses without usable text.
    pub async fn chat(&self, kind: CloudProviderKind, messages: &[Message]) -> Result<String> {
        let endpoint = self
            .endpoint(kind)
            .ok_or_else(|| BellaError::NotConfigured(kind.to_string()))?;
        let credential = match endpoint.credential.as_deref() {
            Some(key) if !is_placeholder_credential(key) => key.to_string(),
            _ => return Err(BellaError::NotConfigured(kind.to_string()).into()),
        };

        let body = request_body(kind, &endpoint.model, messages);
        tracing::debug!(provider = %kind, url = %endpoint.url, "Sending cloud request");

        let request = if kind.uses_query_token() {
            self.client
                .post(&endpoint.url)
                .query(&[("access_token", credential.as_str())])
        } else {
            self.client.post(&endpoint.url).bearer_auth(&credential)
        };

        let response = request.json(&body).send().await.map_err(|e| {
            tracing::warn!(provider = %kind, "Cloud request failed: {}", e);
            let message = if e.is_timeout() {
                format!("request timeout: {}", e)
            } else {
                format!("network error: {}", e)
            };
            BellaError::provider(kind.as_str(), message)
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(provider = %kind, "Cloud provider returned {}: {}", status, error_text);
            return Err(BellaError::provider(kind.as_str(), status_message(status, &error_text)).into());
        }

        let data: Value = response.json().await.map_err(|e| {
            BellaError::provider(kind.as_str(), format!("invalid response body: {}", e))
        })?;

        let text = extract_text(kind, &data)?;
        tracing::debug!(provider = %kind, chars = text.len(), "Cloud response received");
        Ok(text)
    }
}

fn status_message(status: StatusCode, body: &str) -> String {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("authentication failed ({}): {}", status.as_u16(), body)
        }
        StatusCode::TOO_MANY_REQUESTS => {
            format!("rate limit exceeded ({}): {}", status.as_u16(), body)
        }
        _ => format!("server error {}: {}", status, body),
    }
}

/// Provider-specific JSON request body
///
/// # Examples
///
/// ```
/// use bella::providers::{cloud::request_body, CloudProviderKind, Message};
///
/// let body = request_body(CloudProviderKind::Qwen, "qwen-turbo", &[Message::user("hi")]);
/// assert_eq!(body["input"]["messages"][0]["content"], "hi");
/// assert_eq!(body["parameters"]["max_tokens"], 150);
/// ```
pub fn request_body(kind: CloudProviderKind, model: &str, messages: &[Message]) -> Value {
    match kind {
        CloudProviderKind::OpenAi | CloudProviderKind::Glm => json!({
            "model": model,
            "messages": messages,
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "top_p": TOP_P,
        }),
        CloudProviderKind::Qwen => json!({
            "model": model,
            "input": { "messages": messages },
            "parameters": {
                "max_tokens": MAX_TOKENS,
                "temperature": TEMPERATURE,
                "top_p": TOP_P,
            },
        }),
        CloudProviderKind::Ernie => json!({
            "messages": messages,
            "temperature": TEMPERATURE,
            "top_p": TOP_P,
            "max_output_tokens": MAX_TOKENS,
        }),
    }
}

/// Pull the generated text out of a provider-specific response
///
/// # Errors
///
/// Returns `BellaError::Provider` if the expected field is missing, not a
/// string, or blank after trimming.
pub fn extract_text(kind: CloudProviderKind, data: &Value) -> Result<String> {
    let field = match kind {
        CloudProviderKind::OpenAi | CloudProviderKind::Glm => {
            data.pointer("/choices/0/message/content")
        }
        CloudProviderKind::Qwen => data.pointer("/output/text"),
        CloudProviderKind::Ernie => data.get("result"),
    };

    let text = field
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BellaError::provider(kind.as_str(), "returned invalid response"))?;

    Ok(text.to_string())
}
