//! Provider module for Bella
//!
//! This module contains the generation backends: the cloud chat-completion
//! client for OpenAI, Qwen, ERNIE and GLM, and the local model reached
//! through the `TextGenerator` seam (Ollama in production).

pub mod base;
pub mod cloud;
pub mod local;
pub mod ollama;

pub use base::{CloudProviderKind, GenerationParams, Message, TextGenerator};
pub use cloud::{CloudProviderClient, ProviderInfo};
pub use local::LocalModelClient;
pub use ollama::OllamaGenerator;

use crate::config::OllamaConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create the local model client backed by Ollama
///
/// The returned client is not loaded; call `LocalModelClient::load`.
///
/// # Errors
///
/// Returns error if the HTTP client cannot be created
///
/// # Examples
///
/// ```
/// use bella::config::OllamaConfig;
/// use bella::providers::create_local_client;
///
/// let client = create_local_client(&OllamaConfig::default()).unwrap();
/// assert!(!client.is_loaded());
/// assert_eq!(client.model_name(), "llama3.2:1b");
/// ```
pub fn create_local_client(config: &OllamaConfig) -> Result<LocalModelClient> {
    let generator = OllamaGenerator::new(config.clone())?;
    Ok(LocalModelClient::new(Arc::new(generator)))
}
