//! Error types for Bella
//!
//! This module defines the error taxonomy used by the thinking engine,
//! using `thiserror` for ergonomic error handling. Every failure that can
//! occur while turning a user utterance into a reply maps onto one of these
//! variants, and the orchestrator classifies them into user-facing
//! categories before anything reaches the caller.

use thiserror::Error;

/// Main error type for Bella operations
#[derive(Error, Debug)]
pub enum BellaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The prompt was empty, non-text, or rejected as malformed
    #[error("Invalid prompt: {0}")]
    InvalidInput(String),

    /// An operation exceeded its time budget
    #[error("{operation} timeout after {after_ms}ms")]
    Timeout {
        /// Human readable name of the operation that timed out
        operation: String,
        /// The budget that was exceeded, in milliseconds
        after_ms: u64,
    },

    /// A generation backend failed (network, auth, rate limit, server, model)
    #[error("{provider} failed: {message}")]
    Provider {
        /// Label of the provider that failed
        provider: String,
        /// Underlying failure description
        message: String,
    },

    /// The backend answered, but the answer was unusable
    #[error("Response too short or unusable: {0}")]
    ResponseQuality(String),

    /// A provider was asked to run without credentials or a loaded model
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Every candidate in the fallback chain failed
    #[error("All providers failed (attempted: {}). Last error: {last_error}", attempted.join(", "))]
    SystemFailure {
        /// Labels of every candidate that was attempted, in order
        attempted: Vec<String>,
        /// Description of the final underlying failure
        last_error: String,
    },

    /// An imported conversation snapshot was rejected
    #[error("Invalid conversation data: {0}")]
    InvalidConversation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BellaError {
    /// Shorthand for building a provider failure
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for Bella operations
///
/// Uses `anyhow::Error` so context can be attached freely; typed
/// `BellaError` values are recovered with `downcast_ref` where the
/// orchestrator needs to classify them.
pub type Result<T> = anyhow::Result<T>;
