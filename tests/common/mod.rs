use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bella::config::{CloudEndpointConfig, Config};
use bella::providers::CloudProviderKind;

#[allow(dead_code)]
pub const OLLAMA_MODEL: &str = "llama3.2:1b";

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Path on the mock server that stands in for a provider's endpoint
#[allow(dead_code)]
pub fn endpoint_path(kind: CloudProviderKind) -> String {
    format!("/{}/chat", kind.as_str())
}

/// Configuration pointing every backend at `server`, with fast timings
///
/// Providers listed in `keys` get a real credential.
#[allow(dead_code)]
pub fn mock_config(server: &MockServer, keys: &[CloudProviderKind]) -> Config {
    let mut config = Config::default();
    for kind in CloudProviderKind::ALL {
        *config.provider.endpoint_mut(kind) = CloudEndpointConfig {
            endpoint: Some(format!("{}{}", server.uri(), endpoint_path(kind))),
            model: None,
            api_key: keys
                .contains(&kind)
                .then(|| format!("key-{}", kind.as_str())),
        };
    }
    config.provider.ollama.host = server.uri();
    config.provider.ollama.model = OLLAMA_MODEL.to_string();
    config.thinking.retry_base_delay_ms = 1;
    config.thinking.retry_max_delay_ms = 3;
    config.monitor.adaptive_timeout = false;
    config
}

/// Provider-shaped success body carrying `text`
#[allow(dead_code)]
pub fn cloud_reply(kind: CloudProviderKind, text: &str) -> serde_json::Value {
    match kind {
        CloudProviderKind::OpenAi | CloudProviderKind::Glm => json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }]
        }),
        CloudProviderKind::Qwen => json!({ "output": { "text": text } }),
        CloudProviderKind::Ernie => json!({ "result": text }),
    }
}

/// Mount an Ollama server that has the model installed
#[allow(dead_code)]
pub async fn mount_ollama(server: &MockServer, reply: &str, expected_generates: u64) {
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{ "name": OLLAMA_MODEL }]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": reply,
            "done": true
        })))
        .expect(expected_generates)
        .mount(server)
        .await;
}

/// Mount an Ollama server that is reachable but lacks the model
#[allow(dead_code)]
pub async fn mount_ollama_without_model(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(server)
        .await;
}
