//! Integration tests that run the full server on a random port.

use assistant_service::config::AssistantConfig;
use assistant_service::services::backends::mock::MockBackend;
use assistant_service::startup::Application;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn test_config(extra: &[(&str, &str)]) -> AssistantConfig {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("HOST".to_string(), "127.0.0.1".to_string()),
        ("PORT".to_string(), "0".to_string()), // Random port
        ("MODEL_NAME".to_string(), "smollm:1.7b".to_string()),
        ("WORKERS".to_string(), "2".to_string()),
    ]);
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    AssistantConfig::from_vars(vars).expect("Failed to load config")
}

/// Spawn the application in the background and return its port.
async fn spawn(app: Application) -> u16 {
    let port = app.port();

    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    port
}

/// Grab a port that nothing listens on.
async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn health_check_returns_healthy_with_mock_backend() {
    let backend = Arc::new(MockBackend::answering("unused").with_models(&["smollm:1.7b"]));
    let app = Application::with_backend(test_config(&[]), backend)
        .await
        .expect("Failed to build application");
    let port = spawn(app).await;

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["available_models"], 1);
}

#[tokio::test]
async fn ask_round_trip_over_tcp() {
    let backend = Arc::new(MockBackend::answering("A deadlock is..."));
    let app = Application::with_backend(test_config(&[]), backend)
        .await
        .expect("Failed to build application");
    let port = spawn(app).await;

    let response = Client::new()
        .post(format!("http://127.0.0.1:{}/ask", port))
        .header("x-request-id", "interview-1")
        .json(&serde_json::json!({"text": "What is a deadlock?"}))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "interview-1");

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, serde_json::json!({"answer": "A deadlock is..."}));
}

#[tokio::test]
async fn unreachable_ollama_does_not_block_startup() {
    let ollama_host = format!("http://127.0.0.1:{}", closed_port().await);
    let config = test_config(&[("BACKEND", "ollama"), ("OLLAMA_HOST", &ollama_host)]);

    let app = Application::build(config)
        .await
        .expect("Ollama probe failure must not abort startup");
    let port = spawn(app).await;
    let client = Client::new();

    let health = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(health.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = health.json().await.unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["backend_host"], ollama_host);

    let ask = client
        .post(format!("http://127.0.0.1:{}/ask", port))
        .json(&serde_json::json!({"text": "Still there?"}))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(ask.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = ask.json().await.unwrap();
    assert!(body["answer"]
        .as_str()
        .unwrap()
        .starts_with("Error generating answer:"));
}

#[cfg(not(feature = "local-model"))]
#[tokio::test]
async fn local_backend_failure_aborts_startup() {
    let config = test_config(&[("BACKEND", "local"), ("MODEL_PATH", "/nonexistent.gguf")]);

    assert!(Application::build(config).await.is_err());
}
