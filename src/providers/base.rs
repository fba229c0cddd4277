//! Base provider types for Bella
//!
//! This module defines the message type exchanged with cloud backends, the
//! closed set of supported cloud provider kinds, the sampling parameters used
//! for local generation, and the `TextGenerator` trait that every local model
//! backend implements.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message structure for conversation
///
/// Represents a chat message sent to a cloud provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::providers::Message;
    ///
    /// let msg = Message::user("Hello, Bella!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::providers::Message;
    ///
    /// let msg = Message::assistant("Hello, friend!");
    /// assert_eq!(msg.role, "assistant");
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::providers::Message;
    ///
    /// let msg = Message::system("You are Bella");
    /// assert_eq!(msg.role, "system");
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Supported cloud text-generation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProviderKind {
    /// OpenAI chat completions
    #[serde(rename = "openai")]
    OpenAi,
    /// Alibaba DashScope (Qwen)
    Qwen,
    /// Baidu ERNIE
    Ernie,
    /// Zhipu GLM
    Glm,
}

impl CloudProviderKind {
    /// All cloud providers in fallback order
    pub const ALL: [CloudProviderKind; 4] = [
        CloudProviderKind::OpenAi,
        CloudProviderKind::Qwen,
        CloudProviderKind::Ernie,
        CloudProviderKind::Glm,
    ];

    /// Parse a provider name, returning `None` for unknown names
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::providers::CloudProviderKind;
    ///
    /// assert_eq!(CloudProviderKind::parse_str("glm"), Some(CloudProviderKind::Glm));
    /// assert_eq!(CloudProviderKind::parse_str("local"), None);
    /// ```
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "qwen" => Some(Self::Qwen),
            "ernie" => Some(Self::Ernie),
            "glm" => Some(Self::Glm),
            _ => None,
        }
    }

    /// Lowercase provider name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Qwen => "qwen",
            Self::Ernie => "ernie",
            Self::Glm => "glm",
        }
    }

    /// Public endpoint used when none is configured
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1/chat/completions",
            Self::Qwen => {
                "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation"
            }
            Self::Ernie => {
                "https://aip.baidubce.com/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/completions"
            }
            Self::Glm => "https://open.bigmodel.cn/api/paas/v4/chat/completions",
        }
    }

    /// Model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-3.5-turbo",
            Self::Qwen => "qwen-turbo",
            Self::Ernie => "ERNIE-Bot-turbo",
            Self::Glm => "glm-3-turbo",
        }
    }

    /// Environment variable that carries this provider's credential
    pub fn credential_env_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "BELLA_OPENAI_API_KEY",
            Self::Qwen => "BELLA_QWEN_API_KEY",
            Self::Ernie => "BELLA_ERNIE_ACCESS_TOKEN",
            Self::Glm => "BELLA_GLM_API_KEY",
        }
    }

    /// Whether the credential travels as a query parameter instead of a bearer header
    pub fn uses_query_token(&self) -> bool {
        matches!(self, Self::Ernie)
    }
}

impl fmt::Display for CloudProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling parameters for local generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum number of new tokens to generate
    pub max_new_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Top-k sampling cutoff
    pub top_k: u32,
    /// Nucleus sampling mass
    pub top_p: f32,
    /// Enable sampling (greedy decoding when false)
    pub do_sample: bool,
    /// Penalty applied to repeated tokens
    pub repetition_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 200,
            temperature: 0.75,
            top_k: 50,
            top_p: 0.92,
            do_sample: true,
            repetition_penalty: 1.25,
        }
    }
}

/// A locally hosted text-generation model
///
/// Implementations return the raw generated text; cleanup is done by the
/// caller so every backend is post-processed the same way.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable or answers with an error
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Prepare the model for use
    ///
    /// The default implementation assumes the model is always ready.
    async fn load(&self) -> Result<()> {
        Ok(())
    }

    /// Model identifier reported in configuration snapshots
    fn model_name(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::user("a").role, "user");
        assert_eq!(Message::assistant("b").role, "assistant");
        let system = Message::system("c");
        assert_eq!(system.role, "system");
        assert_eq!(system.content, "c");
    }

    #[test]
    fn test_message_serializes_role_and_content() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_provider_kind_round_trip_names() {
        for kind in CloudProviderKind::ALL {
            assert_eq!(CloudProviderKind::parse_str(kind.as_str()), Some(kind));
            assert_eq!(kind.to_string(), kind.as_str());
        }
        assert_eq!(CloudProviderKind::parse_str("OpenAI"), Some(CloudProviderKind::OpenAi));
        assert_eq!(CloudProviderKind::parse_str("claude"), None);
    }

    #[test]
    fn test_provider_kind_serde_names() {
        let json = serde_json::to_string(&CloudProviderKind::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
    }

    #[test]
    fn test_only_ernie_uses_query_token() {
        assert!(CloudProviderKind::Ernie.uses_query_token());
        assert!(!CloudProviderKind::OpenAi.uses_query_token());
        assert!(!CloudProviderKind::Qwen.uses_query_token());
        assert!(!CloudProviderKind::Glm.uses_query_token());
    }

    #[test]
    fn test_default_models() {
        assert_eq!(CloudProviderKind::OpenAi.default_model(), "gpt-3.5-turbo");
        assert_eq!(CloudProviderKind::Ernie.default_model(), "ERNIE-Bot-turbo");
    }

    #[test]
    fn test_generation_params_defaults() {
        let params = GenerationParams::default();
        assert_eq!(params.max_new_tokens, 200);
        assert_eq!(params.top_k, 50);
        assert!(params.do_sample);
        assert!((params.repetition_penalty - 1.25).abs() < f32::EPSILON);
    }
}
