//! Integration tests
//!
//! End-to-end tests over the full router. No provider secrets are
//! configured, so every dispatch lands on the static fallback answer.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use chatrelay::config::settings::{
    DispatchConfig, LoggingConfig, ProviderSecrets, RequestConfig, SecurityConfig, ServerConfig,
    Settings,
};
use chatrelay::handlers::create_router;
use chatrelay::providers::ProviderCatalog;
use chatrelay::services::dispatcher::FALLBACK_ANSWER;

/// Create test settings without touching the process environment
fn create_test_settings() -> Settings {
    Settings {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        dispatch: DispatchConfig {
            timeout: 2,
            fallback_confidence: 0.5,
            max_history: 10,
            system_prompt: "You are a test assistant.".to_string(),
        },
        request: RequestConfig {
            max_request_size: 1024 * 1024,
            timeout: 30,
        },
        security: SecurityConfig {
            allowed_origins: vec!["*".to_string()],
            cors_enabled: true,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "text".to_string(),
        },
        secrets: ProviderSecrets::default(),
    }
}

async fn create_test_app(settings: Settings) -> Router {
    let catalog = ProviderCatalog::from_settings(&settings, None);
    create_router(settings, catalog)
        .await
        .expect("Failed to create router")
}

fn chat_post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = create_test_app(create_test_settings()).await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let health_response = json_body(response).await;
    assert_eq!(health_response["status"], "healthy");
    assert_eq!(health_response["service"], "Chat Relay");
    assert!(health_response["version"].is_string());
    assert!(health_response["timestamp"].is_string());
    assert_eq!(health_response["details"]["providers_total"], 5);
    assert_eq!(health_response["details"]["providers_enabled"], 0);
    assert!(health_response["details"]["uptime_seconds"].is_number());
}

#[tokio::test]
async fn test_readiness_check_without_providers() {
    let app = create_test_app(create_test_settings()).await;

    let request = Request::builder()
        .uri("/health/ready")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    // No secrets configured, so the service reports not ready
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_readiness_check_with_provider() {
    let mut settings = create_test_settings();
    settings.secrets.grok = Some("xai-test-key".to_string());
    let app = create_test_app(settings).await;

    let request = Request::builder()
        .uri("/health/ready")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health_response = json_body(response).await;
    assert_eq!(health_response["status"], "ready");
    assert_eq!(health_response["details"]["providers_enabled"], 1);
}

#[tokio::test]
async fn test_liveness_check_endpoint() {
    let app = create_test_app(create_test_settings()).await;

    let request = Request::builder()
        .uri("/health/live")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let health_response = json_body(response).await;
    assert_eq!(health_response["status"], "alive");
    // Liveness stays cheap: no details block
    assert!(health_response.get("details").is_none());
}

#[tokio::test]
async fn test_chat_returns_fallback_without_providers() {
    let app = create_test_app(create_test_settings()).await;

    let response = app
        .oneshot(chat_post(r#"{"message": "What is 2+2?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let result = json_body(response).await;
    assert_eq!(result["answer"], FALLBACK_ANSWER);
    assert_eq!(result["source"], "fallback");
    assert_eq!(result["type"], "fallback");
    assert_eq!(result["category"], "offline");
    assert_eq!(result["confidence"], 0.5);
    assert_eq!(result["providersAttempted"], json!([]));
    assert!(result["processingTime"].is_number());
    assert!(result["runtime"].is_string());
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let app = create_test_app(create_test_settings()).await;

    let response = app
        .oneshot(chat_post(r#"{"message": "   "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error_response = json_body(response).await;
    assert_eq!(error_response["error"]["type"], "invalid_request_error");
    assert!(error_response["error"]["message"]
        .as_str()
        .unwrap()
        .contains("message cannot be empty"));
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = create_test_app(create_test_settings()).await;

    let response = app
        .oneshot(chat_post(r#"{"message": }"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_message_field_rejected() {
    let app = create_test_app(create_test_settings()).await;

    let response = app
        .oneshot(chat_post(r#"{"stream": true}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unsupported_method() {
    let app = create_test_app(create_test_settings()).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/chat")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_not_found_endpoint() {
    let app = create_test_app(create_test_settings()).await;

    let request = Request::builder()
        .uri("/nonexistent")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = create_test_app(create_test_settings()).await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/chat")
        .header("origin", "https://example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_success() || response.status() == StatusCode::NO_CONTENT);
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_request_size_limit() {
    let mut settings = create_test_settings();
    settings.request.max_request_size = 1024;
    let app = create_test_app(settings).await;

    let oversized = json!({"message": "x".repeat(2000)}).to_string();
    let response = app.oneshot(chat_post(&oversized)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_provider_list_endpoint() {
    let app = create_test_app(create_test_settings()).await;

    let request = Request::builder()
        .uri("/api/providers")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let listing = json_body(response).await;
    assert_eq!(listing["fallbackConfidence"], 0.5);

    let providers = listing["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 5);
    assert_eq!(providers[0]["name"], "openrouter");
    assert_eq!(providers[0]["priority"], 1);
    for provider in providers {
        assert_eq!(provider["enabled"], false);
        assert!(provider["model"].is_string());
        assert!(provider["confidence"].is_number());
    }
}

#[tokio::test]
async fn test_streaming_chat_emits_ndjson() {
    let app = create_test_app(create_test_settings()).await;

    let response = app
        .oneshot(chat_post(r#"{"message": "hello", "stream": true}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/x-ndjson"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<Value> = text
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert!(lines.len() >= 3, "Expected typing, chunks, and done");
    assert_eq!(lines[0]["type"], "typing");
    assert_eq!(lines[0]["status"], "start");

    let done = lines.last().unwrap();
    assert_eq!(done["type"], "done");
    assert_eq!(done["full_content"], FALLBACK_ANSWER);
    assert_eq!(done["metadata"]["source"], "fallback");

    // The chunks reassemble into exactly the final answer
    let mut reassembled = String::new();
    for line in &lines[1..lines.len() - 1] {
        assert_eq!(line["type"], "chunk");
        reassembled.push_str(line["content"].as_str().unwrap());
    }
    assert_eq!(reassembled, FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_concurrent_requests() {
    let app = create_test_app(create_test_settings()).await;

    let mut handles = vec![];
    for i in 0..10 {
        let app_clone = app.clone();
        let handle = tokio::spawn(async move {
            let request = Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap();
            let response = app_clone.oneshot(request).await.unwrap();
            (i, response.status())
        });
        handles.push(handle);
    }

    for handle in handles {
        let (i, status) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK, "Request {} failed", i);
    }
}
