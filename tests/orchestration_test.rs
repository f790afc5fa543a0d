//! End-to-end coverage driving the Axum app in-process against a `wiremock`
//! stand-in for the Cerebras-compatible backend.

use cerebras_orchestrator::server::{router, AppState};
use serial_test::serial;
use std::sync::Arc;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_app(mock_server: &MockServer, api_keys: Vec<String>) -> String {
    unsafe { std::env::set_var("CEREBRAS_BASE_URL", mock_server.uri()); }

    let state = Arc::new(AppState {
        http: reqwest::Client::new(),
        api_keys,
    });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn sse_body(chunks: &[&str]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        body.push_str("data: ");
        body.push_str(chunk);
        body.push_str("\n\n");
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn chunk_json(content: &str, finish: Option<&str>) -> String {
    serde_json::json!({
        "choices": [{
            "delta": {"content": content},
            "finish_reason": finish,
        }]
    })
    .to_string()
}

#[tokio::test]
#[serial]
async fn test_standard_mode_single_model_streams_directly() {
    let mock_server = MockServer::start().await;
    let body = sse_body(&[&chunk_json("hello ", None), &chunk_json("world", Some("stop"))]);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let base = spawn_app(&mock_server, vec!["test-key".to_string()]).await;

    let payload = serde_json::json!({
        "messages": [{"role": "user", "content": "hi there"}],
        "data": {
            "agentMode": "standard",
            "modelSettings": [{
                "id": "m1", "modelName": "llama-3.3-70b", "temperature": 0.7,
                "enabled": true
            }],
            "appSettings": {},
            "totalContentLength": 8
        }
    });

    let response = reqwest::Client::new()
        .post(&base)
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let text = response.text().await.unwrap();

    assert!(text.contains("STATUS:STEP:execute_standard\n"));
    assert!(text.contains("DATA:hello "));
    assert!(text.contains("DATA:world"));
    assert!(text.contains("MODEL_RESPONSES:["));
    assert!(!text.contains("ERROR:"));

    unsafe { std::env::remove_var("CEREBRAS_BASE_URL"); }
}

#[tokio::test]
#[serial]
async fn test_bad_request_before_stream_opens() {
    let mock_server = MockServer::start().await;
    let base = spawn_app(&mock_server, vec!["test-key".to_string()]).await;

    let payload = serde_json::json!({
        "messages": [{"role": "assistant", "content": "not ending in user"}],
        "data": {}
    });

    let response = reqwest::Client::new()
        .post(&base)
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    unsafe { std::env::remove_var("CEREBRAS_BASE_URL"); }
}

#[tokio::test]
#[serial]
async fn test_missing_api_keys_is_pre_stream_config_error() {
    let mock_server = MockServer::start().await;
    let base = spawn_app(&mock_server, vec![]).await;

    let payload = serde_json::json!({
        "messages": [{"role": "user", "content": "hi"}],
        "data": {}
    });

    let response = reqwest::Client::new()
        .post(&base)
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    unsafe { std::env::remove_var("CEREBRAS_BASE_URL"); }
}

#[tokio::test]
#[serial]
async fn test_all_models_failing_emits_error_frame() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let base = spawn_app(&mock_server, vec!["test-key".to_string()]).await;

    let payload = serde_json::json!({
        "messages": [{"role": "user", "content": "hi"}],
        "data": {
            "agentMode": "standard",
            "modelSettings": [{
                "id": "m1", "modelName": "llama-3.3-70b", "temperature": 0.7,
                "enabled": true
            }],
            "appSettings": {},
            "totalContentLength": 2
        }
    });

    let response = reqwest::Client::new()
        .post(&base)
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let text = response.text().await.unwrap();
    assert!(text.contains("ERROR:"));
    assert!(!text.contains("MODEL_RESPONSES:"));

    unsafe { std::env::remove_var("CEREBRAS_BASE_URL"); }
}
