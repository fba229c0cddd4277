//! Configuration management for Bella
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::chat_mode::ChatMode;
use crate::error::{Result, BellaError};
use crate::providers::CloudProviderKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Bella
///
/// Holds everything the thinking engine needs: provider selection and
/// credentials, orchestration budgets, conversation limits and
/// performance-monitor thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Provider configuration (cloud backends and local model)
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Orchestration budgets and retry behavior
    #[serde(default)]
    pub thinking: ThinkingConfig,
    /// Conversation context limits
    #[serde(default)]
    pub conversation: ConversationConfig,
    /// Performance monitor thresholds and retention
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Provider configuration
///
/// Specifies whether cloud generation is preferred, which cloud backend is
/// active, and the settings for each backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Prefer the cloud provider over the local model
    #[serde(default)]
    pub use_cloud: bool,

    /// Active cloud provider (openai, qwen, ernie, glm)
    #[serde(default = "default_cloud_provider")]
    pub cloud_provider: String,

    /// Language of the persona system prompt (en, zh-CN, ko)
    #[serde(default = "default_persona_language")]
    pub persona_language: String,

    /// OpenAI settings
    #[serde(default)]
    pub openai: CloudEndpointConfig,

    /// Qwen (DashScope) settings
    #[serde(default)]
    pub qwen: CloudEndpointConfig,

    /// ERNIE settings; `api_key` holds the access token
    #[serde(default)]
    pub ernie: CloudEndpointConfig,

    /// GLM settings
    #[serde(default)]
    pub glm: CloudEndpointConfig,

    /// Local model served by Ollama
    #[serde(default)]
    pub ollama: OllamaConfig,
}

fn default_cloud_provider() -> String {
    "openai".to_string()
}

fn default_persona_language() -> String {
    "en".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            use_cloud: false,
            cloud_provider: default_cloud_provider(),
            persona_language: default_persona_language(),
            openai: CloudEndpointConfig::default(),
            qwen: CloudEndpointConfig::default(),
            ernie: CloudEndpointConfig::default(),
            glm: CloudEndpointConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Settings block for a given cloud provider
    pub fn endpoint(&self, kind: CloudProviderKind) -> &CloudEndpointConfig {
        match kind {
            CloudProviderKind::OpenAi => &self.openai,
            CloudProviderKind::Qwen => &self.qwen,
            CloudProviderKind::Ernie => &self.ernie,
            CloudProviderKind::Glm => &self.glm,
        }
    }

    /// Mutable settings block for a given cloud provider
    pub fn endpoint_mut(&mut self, kind: CloudProviderKind) -> &mut CloudEndpointConfig {
        match kind {
            CloudProviderKind::OpenAi => &mut self.openai,
            CloudProviderKind::Qwen => &mut self.qwen,
            CloudProviderKind::Ernie => &mut self.ernie,
            CloudProviderKind::Glm => &mut self.glm,
        }
    }
}

/// Settings for one cloud backend
///
/// Every field is optional; missing endpoint and model fall back to the
/// provider's built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudEndpointConfig {
    /// Override for the provider endpoint (useful for tests and proxies)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Override for the model identifier
    #[serde(default)]
    pub model: Option<String>,

    /// API key (or access token for ERNIE)
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Load the local model at startup
    #[serde(default = "default_ollama_enabled")]
    pub enabled: bool,

    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_enabled() -> bool {
    true
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:1b".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            enabled: default_ollama_enabled(),
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

/// Orchestration budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinkingConfig {
    /// Wall-clock budget for the whole fallback chain (milliseconds)
    #[serde(default = "default_max_processing_time")]
    pub max_processing_time_ms: u64,

    /// Per-call timeout for cloud providers (milliseconds)
    #[serde(default = "default_cloud_timeout")]
    pub cloud_timeout_ms: u64,

    /// Per-call timeout for the local model (milliseconds)
    #[serde(default = "default_local_timeout")]
    pub local_timeout_ms: u64,

    /// Delay unit between fallback attempts (milliseconds)
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Upper bound for the delay between fallback attempts (milliseconds)
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_ms: u64,

    /// Serve repeated prompts from the monitor's response cache
    #[serde(default)]
    pub enable_response_cache: bool,
}

fn default_max_processing_time() -> u64 {
    5_000
}

fn default_cloud_timeout() -> u64 {
    10_000
}

fn default_local_timeout() -> u64 {
    8_000
}

fn default_retry_base_delay() -> u64 {
    1_000
}

fn default_retry_max_delay() -> u64 {
    3_000
}

impl Default for ThinkingConfig {
    fn default() -> Self {
        Self {
            max_processing_time_ms: default_max_processing_time(),
            cloud_timeout_ms: default_cloud_timeout(),
            local_timeout_ms: default_local_timeout(),
            retry_base_delay_ms: default_retry_base_delay(),
            retry_max_delay_ms: default_retry_max_delay(),
            enable_response_cache: false,
        }
    }
}

/// Conversation context configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Number of exchanges kept in history (turns stored = 2x this)
    #[serde(default = "default_max_history_length")]
    pub max_history_length: usize,

    /// Seconds of inactivity after which the context is considered stale
    #[serde(default = "default_max_context_age")]
    pub max_context_age_secs: u64,

    /// Mode a new session starts in
    #[serde(default)]
    pub default_mode: ChatMode,
}

fn default_max_history_length() -> usize {
    10
}

fn default_max_context_age() -> u64 {
    30 * 60
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_history_length: default_max_history_length(),
            max_context_age_secs: default_max_context_age(),
            default_mode: ChatMode::default(),
        }
    }
}

/// Performance monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Run the periodic system-metrics tick
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Interval between system-metric ticks (seconds)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Maximum number of thinking metrics retained
    #[serde(default = "default_max_metrics_history")]
    pub max_metrics_history: usize,

    /// Maximum number of system snapshots retained
    #[serde(default = "default_max_system_metrics")]
    pub max_system_metrics: usize,

    /// Maximum number of alerts retained
    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,

    /// Maximum entries in the response cache
    #[serde(default = "default_max_cache_size")]
    pub max_cache_size: usize,

    /// Average latency above which an alert fires (milliseconds)
    #[serde(default = "default_response_time_threshold")]
    pub response_time_threshold_ms: f64,

    /// Success rate below which an alert fires (percent)
    #[serde(default = "default_success_rate_threshold")]
    pub success_rate_threshold: f64,

    /// Resident memory above which an alert fires (bytes)
    #[serde(default = "default_memory_threshold")]
    pub memory_usage_threshold_bytes: u64,

    /// Error rate considered unhealthy (percent)
    #[serde(default = "default_error_rate_threshold")]
    pub error_rate_threshold: f64,

    /// Widen the response-time threshold when latency approaches it
    #[serde(default = "default_true")]
    pub adaptive_timeout: bool,

    /// Upper bound for the adaptive response-time threshold (milliseconds)
    #[serde(default = "default_max_adaptive_timeout")]
    pub max_adaptive_timeout_ms: f64,

    /// Recompute per-provider statistics on every metric
    #[serde(default = "default_true")]
    pub dynamic_provider_selection: bool,
}

fn default_true() -> bool {
    true
}

fn default_tick_interval() -> u64 {
    10
}

fn default_max_metrics_history() -> usize {
    1000
}

fn default_max_system_metrics() -> usize {
    100
}

fn default_max_alerts() -> usize {
    50
}

fn default_max_cache_size() -> usize {
    100
}

fn default_response_time_threshold() -> f64 {
    5_000.0
}

fn default_success_rate_threshold() -> f64 {
    90.0
}

fn default_memory_threshold() -> u64 {
    100 * 1024 * 1024 // 100 MiB
}

fn default_error_rate_threshold() -> f64 {
    10.0
}

fn default_max_adaptive_timeout() -> f64 {
    10_000.0
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_secs: default_tick_interval(),
            max_metrics_history: default_max_metrics_history(),
            max_system_metrics: default_max_system_metrics(),
            max_alerts: default_max_alerts(),
            max_cache_size: default_max_cache_size(),
            response_time_threshold_ms: default_response_time_threshold(),
            success_rate_threshold: default_success_rate_threshold(),
            memory_usage_threshold_bytes: default_memory_threshold(),
            error_rate_threshold: default_error_rate_threshold(),
            adaptive_timeout: true,
            max_adaptive_timeout_ms: default_max_adaptive_timeout(),
            dynamic_provider_selection: true,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found: {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BellaError::Config(format!("Failed to read {}: {}", path, e)))?;
        let config: Config = serde_yaml::from_str(&contents)?;
        tracing::debug!("Loaded configuration from {}", path);
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(use_cloud) = std::env::var("BELLA_USE_CLOUD") {
            match use_cloud.parse::<bool>() {
                Ok(v) => self.provider.use_cloud = v,
                Err(_) => tracing::warn!("Invalid BELLA_USE_CLOUD: {}", use_cloud),
            }
        }

        if let Ok(provider) = std::env::var("BELLA_PROVIDER") {
            self.provider.cloud_provider = provider;
        }

        if let Ok(language) = std::env::var("BELLA_LANGUAGE") {
            self.provider.persona_language = language;
        }

        if let Ok(mode) = std::env::var("BELLA_MODE") {
            match ChatMode::parse_str(&mode) {
                Ok(m) => self.conversation.default_mode = m,
                Err(e) => tracing::warn!("Invalid BELLA_MODE: {}", e),
            }
        }

        if let Ok(host) = std::env::var("BELLA_OLLAMA_HOST") {
            self.provider.ollama.host = host;
        }

        if let Ok(model) = std::env::var("BELLA_OLLAMA_MODEL") {
            self.provider.ollama.model = model;
        }

        if let Ok(budget) = std::env::var("BELLA_MAX_PROCESSING_MS") {
            if let Ok(value) = budget.parse() {
                self.thinking.max_processing_time_ms = value;
            } else {
                tracing::warn!("Invalid BELLA_MAX_PROCESSING_MS: {}", budget);
            }
        }

        for kind in CloudProviderKind::ALL {
            if let Ok(key) = std::env::var(kind.credential_env_var()) {
                self.provider.endpoint_mut(kind).api_key = Some(key);
                tracing::debug!(provider = %kind, "Env override: credential");
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(provider) = &cli.provider {
            if provider == "local" {
                self.provider.use_cloud = false;
            } else {
                self.provider.use_cloud = true;
                self.provider.cloud_provider = provider.clone();
            }
        }

        if let Some(mode) = &cli.mode {
            match ChatMode::parse_str(mode) {
                Ok(m) => self.conversation.default_mode = m,
                Err(e) => tracing::warn!("Ignoring --mode: {}", e),
            }
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if CloudProviderKind::parse_str(&self.provider.cloud_provider).is_none() {
            return Err(BellaError::Config(format!(
                "Invalid cloud provider: {}. Must be one of: {}",
                self.provider.cloud_provider,
                CloudProviderKind::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
            .into());
        }

        if !["en", "zh-CN", "ko"].contains(&self.provider.persona_language.as_str()) {
            return Err(BellaError::Config(format!(
                "Invalid persona_language: {}. Must be one of: en, zh-CN, ko",
                self.provider.persona_language
            ))
            .into());
        }

        if self.thinking.max_processing_time_ms == 0 {
            return Err(BellaError::Config(
                "thinking.max_processing_time_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.thinking.cloud_timeout_ms == 0 || self.thinking.local_timeout_ms == 0 {
            return Err(BellaError::Config(
                "provider timeouts must be greater than 0".to_string(),
            )
            .into());
        }

        if self.thinking.retry_base_delay_ms > self.thinking.retry_max_delay_ms {
            return Err(BellaError::Config(
                "thinking.retry_base_delay_ms must not exceed retry_max_delay_ms".to_string(),
            )
            .into());
        }

        if self.conversation.max_history_length == 0 {
            return Err(BellaError::Config(
                "conversation.max_history_length must be greater than 0".to_string(),
            )
            .into());
        }

        if self.monitor.max_metrics_history == 0 {
            return Err(BellaError::Config(
                "monitor.max_metrics_history must be greater than 0".to_string(),
            )
            .into());
        }

        if self.monitor.tick_interval_secs == 0 {
            return Err(BellaError::Config(
                "monitor.tick_interval_secs must be greater than 0".to_string(),
            )
            .into());
        }

        if self.monitor.success_rate_threshold <= 0.0 || self.monitor.success_rate_threshold > 100.0
        {
            return Err(BellaError::Config(
                "monitor.success_rate_threshold must be between 0 and 100".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
