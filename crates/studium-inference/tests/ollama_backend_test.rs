//! HTTP-level tests for the Ollama backend against a mock server.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use studium_core::{EmbeddingBackend, GenerationBackend};
use studium_inference::OllamaBackend;

fn backend_for(server: &MockServer) -> OllamaBackend {
    OllamaBackend::with_config(
        server.uri(),
        "llama3.1:8b".to_string(),
        "nomic-embed-text".to_string(),
        4,
    )
    .expect("Failed to create backend")
}

#[tokio::test]
async fn generate_posts_prompt_and_returns_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llama3.1:8b",
            "prompt": "Summarize osmosis",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.1:8b",
            "response": "Water moves across membranes.",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let out = backend.generate("Summarize osmosis").await.unwrap();
    assert_eq!(out, "Water moves across membranes.");
}

#[tokio::test]
async fn generate_with_system_includes_system_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "system": "You are a study assistant.",
            "prompt": "Explain diffusion"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Particles spread out.",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let out = backend
        .generate_with_system("You are a study assistant.", "Explain diffusion")
        .await
        .unwrap();
    assert_eq!(out, "Particles spread out.");
}

#[tokio::test]
async fn generate_server_error_is_inference_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend.generate("anything").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("500"), "unexpected error: {msg}");
}

#[tokio::test]
async fn embed_texts_round_trips_vectors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({
            "model": "nomic-embed-text",
            "input": ["first chunk", "second chunk"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[0.1, 0.2, 0.3, 0.4], [0.5, 0.6, 0.7, 0.8]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let vectors = backend
        .embed_texts(&["first chunk".to_string(), "second chunk".to_string()])
        .await
        .unwrap();
    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0], vec![0.1, 0.2, 0.3, 0.4]);
}

#[tokio::test]
async fn embed_empty_input_skips_the_request() {
    let server = MockServer::start().await;
    // No mock mounted: a request would fail.

    let backend = backend_for(&server);
    let vectors = backend.embed_texts(&[]).await.unwrap();
    assert!(vectors.is_empty());
}

#[tokio::test]
async fn embed_count_mismatch_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[0.1, 0.2, 0.3, 0.4]]
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend
        .embed_texts(&["a".to_string(), "b".to_string()])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Expected 2 embeddings"));
}

#[tokio::test]
async fn health_check_reflects_server_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    assert!(backend.health_check().await.unwrap());
}
