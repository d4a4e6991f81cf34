//! Shared fixtures: a mock Zhipu server and a local-index config pointing at it.

use apirec_core::config::{Config, ConfigBuilder, IndexBackend};
use apirec_core::{ApiRecord, SecretString};
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Vector dimension used by the fixtures.
pub const DIM: usize = 3;

/// Config using the local backend under `dir` and the mock server for both models.
pub fn local_config(dir: &Path, server: &MockServer) -> Config {
    let mut config = ConfigBuilder::new()
        .index_backend(IndexBackend::Local)
        .index_name("apis-it")
        .dimension(DIM)
        .batch_delay_ms(0)
        .build();
    config.embedding.api_key = Some(SecretString::new("test-key"));
    config.embedding.base_url = server.uri();
    config.embedding.max_retries = 0;
    config.chat.base_url = server.uri();
    config.index.local_path = Some(dir.join("apis-it.json"));
    config
}

/// Answer embedding requests for `text` with `vector`.
pub async fn mount_embedding(server: &MockServer, text: &str, vector: [f32; DIM]) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_partial_json(json!({ "input": [text] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "embedding-2",
            "data": [{"index": 0, "object": "embedding", "embedding": vector}]
        })))
        .mount(server)
        .await;
}

/// Answer embedding requests for a catalog record.
pub async fn mount_record(server: &MockServer, record: &ApiRecord, vector: [f32; DIM]) {
    mount_embedding(server, &record.embedding_text(), vector).await;
}

/// Stream `deltas` from the chat endpoint.
pub async fn mount_chat(server: &MockServer, deltas: &[&str]) {
    let mut body = String::new();
    for delta in deltas {
        body.push_str(&format!(
            "data: {}\n\n",
            json!({"choices": [{"index": 0, "delta": {"content": delta}}]})
        ));
    }
    body.push_str(&format!(
        "data: {}\n\n",
        json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]})
    ));
    body.push_str("data: [DONE]\n\n");

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

/// Write a JSON catalog file.
pub fn write_catalog(dir: &Path, rows: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("apis.json");
    std::fs::write(&path, rows.to_string()).unwrap();
    path
}
