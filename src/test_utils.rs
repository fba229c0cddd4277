//! Test utilities for Bella
//!
//! This module provides a scripted in-process `TextGenerator`, fast
//! configuration builders, temporary file helpers, and assertion helpers.

use crate::config::Config;
use crate::error::{BellaError, Result};
use crate::providers::{GenerationParams, TextGenerator};

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Local model stand-in that replays a fixed script
///
/// Call `n` answers with script entry `n`; the last entry repeats once the
/// script runs out. `Err` entries fail with a provider error carrying the
/// text.
#[derive(Debug)]
pub struct ScriptedGenerator {
    script: Vec<std::result::Result<String, String>>,
    delay: Option<Duration>,
    loadable: bool,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    fn from_script(script: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            script,
            delay: None,
            loadable: true,
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with `text`
    pub fn always(text: impl Into<String>) -> Self {
        Self::from_script(vec![Ok(text.into())])
    }

    /// Always fail with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self::from_script(vec![Err(message.into())])
    }

    /// Answer from a script of successes and failures
    pub fn sequence(script: Vec<std::result::Result<&str, &str>>) -> Self {
        Self::from_script(
            script
                .into_iter()
                .map(|entry| entry.map(str::to_string).map_err(str::to_string))
                .collect(),
        )
    }

    /// A model that cannot be loaded
    pub fn unavailable() -> Self {
        let mut generator = Self::failing("model unavailable");
        generator.loadable = false;
        generator
    }

    /// Sleep for `delay` before every answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared counter of `generate` calls
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Shared log of prompts received
    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let entry = self
            .script
            .get(index.min(self.script.len().saturating_sub(1)))
            .cloned()
            .unwrap_or_else(|| Err("empty script".to_string()));
        entry.map_err(|message| BellaError::provider("local", message).into())
    }

    async fn load(&self) -> Result<()> {
        if self.loadable {
            Ok(())
        } else {
            Err(BellaError::provider("local", "model unavailable").into())
        }
    }

    fn model_name(&self) -> String {
        "scripted".to_string()
    }
}

/// Configuration with short timeouts and retry delays
///
/// Prefers the local model, disables adaptive timeouts, and leaves every
/// cloud provider unconfigured.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.provider.use_cloud = false;
    config.thinking.cloud_timeout_ms = 500;
    config.thinking.local_timeout_ms = 500;
    config.thinking.retry_base_delay_ms = 1;
    config.thinking.retry_max_delay_ms = 3;
    config.monitor.adaptive_timeout = false;
    config
}

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// A complete configuration file in YAML
pub fn test_config_yaml() -> String {
    r#"
provider:
  use_cloud: true
  cloud_provider: qwen
  persona_language: ko
  qwen:
    api_key: sk-test
  ollama:
    host: http://localhost:11434
    model: llama3.2:1b

thinking:
  max_processing_time_ms: 4000
  cloud_timeout_ms: 3000
  local_timeout_ms: 2000

conversation:
  max_history_length: 5
  default_mode: assistant

monitor:
  tick_interval_secs: 30
  max_metrics_history: 200
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat_mode::ChatMode;

    #[tokio::test]
    async fn test_scripted_sequence_repeats_last() {
        let generator = ScriptedGenerator::sequence(vec![Err("boom"), Ok("fine")]);
        let params = GenerationParams::default();
        assert!(generator.generate("a", &params).await.is_err());
        assert_eq!(generator.generate("b", &params).await.unwrap(), "fine");
        assert_eq!(generator.generate("c", &params).await.unwrap(), "fine");
        assert_eq!(generator.calls().load(Ordering::SeqCst), 3);
        assert_eq!(generator.prompts().lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_fails_to_load() {
        assert!(ScriptedGenerator::unavailable().load().await.is_err());
        assert!(ScriptedGenerator::always("x").load().await.is_ok());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    #[should_panic(expected = "does not contain")]
    fn test_assert_error_contains_wrong_message() {
        let result: Result<()> = Err(BellaError::Config("different error".to_string()).into());
        assert_error_contains(result, "not present");
    }

    #[test]
    fn test_fast_config_is_valid() {
        assert!(fast_config().validate().is_ok());
    }

    #[test]
    fn test_config_yaml_parses() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.conversation.default_mode, ChatMode::Assistant);
        assert_eq!(config.provider.qwen.api_key.as_deref(), Some("sk-test"));
    }
}
