//! Integration tests for configuration loading and overrides

mod common;

use bella::chat_mode::ChatMode;
use bella::cli::Cli;
use bella::config::Config;
use common::temp_config_file;
use serial_test::serial;

const ENV_VARS: &[&str] = &[
    "BELLA_USE_CLOUD",
    "BELLA_PROVIDER",
    "BELLA_LANGUAGE",
    "BELLA_MODE",
    "BELLA_OLLAMA_HOST",
    "BELLA_OLLAMA_MODEL",
    "BELLA_MAX_PROCESSING_MS",
    "BELLA_OPENAI_API_KEY",
    "BELLA_QWEN_API_KEY",
    "BELLA_ERNIE_ACCESS_TOKEN",
    "BELLA_GLM_API_KEY",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

const FILE_CONFIG: &str = r#"
provider:
  use_cloud: true
  cloud_provider: ernie
  persona_language: zh-CN
  ernie:
    api_key: token-from-file
    model: ERNIE-Bot-4
  ollama:
    enabled: false
    model: qwen2:0.5b

thinking:
  max_processing_time_ms: 3000
  enable_response_cache: true

conversation:
  max_history_length: 4
  default_mode: creative

monitor:
  enabled: false
  response_time_threshold_ms: 2500
"#;

#[test]
#[serial]
fn test_load_from_file_with_partial_sections() {
    clear_env();
    let (_dir, path) = temp_config_file(FILE_CONFIG);

    let config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
    config.validate().unwrap();

    assert!(config.provider.use_cloud);
    assert_eq!(config.provider.cloud_provider, "ernie");
    assert_eq!(config.provider.persona_language, "zh-CN");
    assert_eq!(config.provider.ernie.api_key.as_deref(), Some("token-from-file"));
    assert_eq!(config.provider.ernie.model.as_deref(), Some("ERNIE-Bot-4"));
    assert!(!config.provider.ollama.enabled);
    assert_eq!(config.provider.ollama.model, "qwen2:0.5b");
    assert_eq!(config.thinking.max_processing_time_ms, 3000);
    assert_eq!(config.thinking.cloud_timeout_ms, 10_000);
    assert!(config.thinking.enable_response_cache);
    assert_eq!(config.conversation.max_history_length, 4);
    assert_eq!(config.conversation.default_mode, ChatMode::Creative);
    assert!(!config.monitor.enabled);
    assert_eq!(config.monitor.response_time_threshold_ms, 2500.0);
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    clear_env();
    let config = Config::load("/nonexistent/bella/config.yaml", &Cli::default()).unwrap();
    assert!(!config.provider.use_cloud);
    assert_eq!(config.provider.cloud_provider, "openai");
    assert_eq!(config.conversation.default_mode, ChatMode::Casual);
}

#[test]
#[serial]
fn test_invalid_yaml_is_an_error() {
    clear_env();
    let (_dir, path) = temp_config_file("provider: [unclosed");
    assert!(Config::load(path.to_str().unwrap(), &Cli::default()).is_err());
}

#[test]
#[serial]
fn test_env_vars_override_file() {
    clear_env();
    let (_dir, path) = temp_config_file(FILE_CONFIG);
    std::env::set_var("BELLA_PROVIDER", "glm");
    std::env::set_var("BELLA_GLM_API_KEY", "glm-from-env");
    std::env::set_var("BELLA_MODE", "assistant");
    std::env::set_var("BELLA_MAX_PROCESSING_MS", "1500");
    std::env::set_var("BELLA_USE_CLOUD", "not-a-bool");

    let config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
    clear_env();

    assert_eq!(config.provider.cloud_provider, "glm");
    assert_eq!(config.provider.glm.api_key.as_deref(), Some("glm-from-env"));
    assert_eq!(config.conversation.default_mode, ChatMode::Assistant);
    assert_eq!(config.thinking.max_processing_time_ms, 1500);
    // Unparseable value leaves the file setting alone
    assert!(config.provider.use_cloud);
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    std::env::set_var("BELLA_PROVIDER", "qwen");
    std::env::set_var("BELLA_MODE", "assistant");

    let cli = Cli {
        provider: Some("openai".to_string()),
        mode: Some("creative".to_string()),
        ..Cli::default()
    };
    let config = Config::load("/nonexistent/bella/config.yaml", &cli).unwrap();
    clear_env();

    assert!(config.provider.use_cloud);
    assert_eq!(config.provider.cloud_provider, "openai");
    assert_eq!(config.conversation.default_mode, ChatMode::Creative);
}

#[test]
#[serial]
fn test_cli_local_provider_disables_cloud() {
    clear_env();
    let (_dir, path) = temp_config_file(FILE_CONFIG);
    let cli = Cli {
        provider: Some("local".to_string()),
        ..Cli::default()
    };

    let config = Config::load(path.to_str().unwrap(), &cli).unwrap();
    assert!(!config.provider.use_cloud);
    assert_eq!(config.provider.cloud_provider, "ernie");
}

#[test]
#[serial]
fn test_validation_rejects_unknown_cli_provider() {
    clear_env();
    let cli = Cli {
        provider: Some("skynet".to_string()),
        ..Cli::default()
    };
    let config = Config::load("/nonexistent/bella/config.yaml", &cli).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Invalid cloud provider: skynet"));
}

#[test]
#[serial]
fn test_shipped_config_file_is_valid() {
    clear_env();
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/config.yaml");
    let config = Config::load(path, &Cli::default()).unwrap();
    config.validate().unwrap();

    // Placeholder credentials must not count as configured
    let cloud = bella::providers::CloudProviderClient::new(&config.provider).unwrap();
    assert!(cloud.configured_providers().is_empty());
}
