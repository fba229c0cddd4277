//! Integration tests for the cloud provider client against mock endpoints

mod common;

use bella::agent::responses::ErrorCategory;
use bella::error::BellaError;
use bella::providers::{CloudProviderClient, CloudProviderKind, Message};
use common::{cloud_reply, endpoint_path, mock_config};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn messages() -> Vec<Message> {
    vec![Message::system("You are Bella."), Message::user("Hello")]
}

#[tokio::test]
async fn test_openai_sends_bearer_and_chat_body() {
    let server = MockServer::start().await;
    let kind = CloudProviderKind::OpenAi;

    Mock::given(method("POST"))
        .and(path(endpoint_path(kind)))
        .and(header("authorization", "Bearer key-openai"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "max_tokens": 150,
            "messages": [
                { "role": "system", "content": "You are Bella." },
                { "role": "user", "content": "Hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cloud_reply(kind, "  Hi from OpenAI  ")))
        .expect(1)
        .mount(&server)
        .await;

    let config = mock_config(&server, &[kind]);
    let client = CloudProviderClient::new(&config.provider).unwrap();

    let text = client.chat(kind, &messages()).await.unwrap();
    assert_eq!(text, "Hi from OpenAI");
}

#[tokio::test]
async fn test_qwen_nests_messages_under_input() {
    let server = MockServer::start().await;
    let kind = CloudProviderKind::Qwen;

    Mock::given(method("POST"))
        .and(path(endpoint_path(kind)))
        .and(header("authorization", "Bearer key-qwen"))
        .and(body_partial_json(json!({
            "model": "qwen-turbo",
            "input": { "messages": [
                { "role": "system", "content": "You are Bella." },
                { "role": "user", "content": "Hello" }
            ] },
            "parameters": { "max_tokens": 150 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cloud_reply(kind, "Hi from Qwen")))
        .expect(1)
        .mount(&server)
        .await;

    let config = mock_config(&server, &[kind]);
    let client = CloudProviderClient::new(&config.provider).unwrap();

    assert_eq!(client.chat(kind, &messages()).await.unwrap(), "Hi from Qwen");
}

#[tokio::test]
async fn test_ernie_passes_access_token_as_query() {
    let server = MockServer::start().await;
    let kind = CloudProviderKind::Ernie;

    Mock::given(method("POST"))
        .and(path(endpoint_path(kind)))
        .and(query_param("access_token", "key-ernie"))
        .and(body_partial_json(json!({ "max_output_tokens": 150 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cloud_reply(kind, "Hi from ERNIE")))
        .expect(1)
        .mount(&server)
        .await;

    let config = mock_config(&server, &[kind]);
    let client = CloudProviderClient::new(&config.provider).unwrap();

    assert_eq!(client.chat(kind, &messages()).await.unwrap(), "Hi from ERNIE");
}

#[tokio::test]
async fn test_glm_uses_openai_shape() {
    let server = MockServer::start().await;
    let kind = CloudProviderKind::Glm;

    Mock::given(method("POST"))
        .and(path(endpoint_path(kind)))
        .and(header("authorization", "Bearer key-glm"))
        .and(body_partial_json(json!({ "model": "glm-3-turbo" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cloud_reply(kind, "Hi from GLM")))
        .expect(1)
        .mount(&server)
        .await;

    let config = mock_config(&server, &[kind]);
    let client = CloudProviderClient::new(&config.provider).unwrap();

    assert_eq!(client.chat(kind, &messages()).await.unwrap(), "Hi from GLM");
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let server = MockServer::start().await;
    let kind = CloudProviderKind::OpenAi;

    Mock::given(method("POST"))
        .and(path(endpoint_path(kind)))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let config = mock_config(&server, &[kind]);
    let client = CloudProviderClient::new(&config.provider).unwrap();

    let err = client.chat(kind, &messages()).await.unwrap_err();
    assert!(format!("{}", err).contains("authentication failed (401)"));
    assert_eq!(ErrorCategory::classify(&err), ErrorCategory::Authentication);
}

#[tokio::test]
async fn test_too_many_requests_maps_to_rate_limit() {
    let server = MockServer::start().await;
    let kind = CloudProviderKind::Qwen;

    Mock::given(method("POST"))
        .and(path(endpoint_path(kind)))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let config = mock_config(&server, &[kind]);
    let client = CloudProviderClient::new(&config.provider).unwrap();

    let err = client.chat(kind, &messages()).await.unwrap_err();
    assert!(format!("{}", err).contains("rate limit exceeded (429)"));
    assert_eq!(ErrorCategory::classify(&err), ErrorCategory::RateLimit);
}

#[tokio::test]
async fn test_missing_text_is_invalid_response() {
    let server = MockServer::start().await;
    let kind = CloudProviderKind::Glm;

    Mock::given(method("POST"))
        .and(path(endpoint_path(kind)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let config = mock_config(&server, &[kind]);
    let client = CloudProviderClient::new(&config.provider).unwrap();

    let err = client.chat(kind, &messages()).await.unwrap_err();
    assert!(format!("{}", err).contains("returned invalid response"));
    assert_eq!(ErrorCategory::classify(&err), ErrorCategory::EmptyResponse);
}

#[tokio::test]
async fn test_placeholder_key_never_sends_request() {
    let server = MockServer::start().await;
    let kind = CloudProviderKind::OpenAi;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cloud_reply(kind, "unused")))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = mock_config(&server, &[]);
    config.provider.openai.api_key = Some("YOUR_OPENAI_API_KEY".to_string());
    let client = CloudProviderClient::new(&config.provider).unwrap();

    let err = client.chat(kind, &messages()).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BellaError>(),
        Some(BellaError::NotConfigured(_))
    ));
}

#[tokio::test]
async fn test_key_set_at_runtime_is_used() {
    let server = MockServer::start().await;
    let kind = CloudProviderKind::Glm;

    Mock::given(method("POST"))
        .and(path(endpoint_path(kind)))
        .and(header("authorization", "Bearer fresh-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cloud_reply(kind, "Now I can talk")))
        .expect(1)
        .mount(&server)
        .await;

    let config = mock_config(&server, &[]);
    let client = CloudProviderClient::new(&config.provider).unwrap();
    assert!(!client.is_provider_configured(kind));

    assert!(client.set_api_key("glm", "fresh-key"));
    assert_eq!(client.chat(kind, &messages()).await.unwrap(), "Now I can talk");
}
