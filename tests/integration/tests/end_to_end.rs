//! Ingest a catalog through the configured stack, then query and explain.
//!
//! Embeddings and chat are served by a mock Zhipu server; the index is the
//! file-backed local backend.

use apirec_cli::bootstrap;
use apirec_core::ApiRecord;
use apirec_integration_tests::{local_config, mount_chat, mount_embedding, mount_record, write_catalog};
use apirec_memory::VectorIndex;
use apirec_recommender::IngestMode;
use serde_json::json;
use tempfile::TempDir;
use wiremock::MockServer;

fn catalog_records() -> (ApiRecord, ApiRecord) {
    (
        ApiRecord::new("0", "A", "desc A"),
        ApiRecord::new("1", "B", "desc B").with_endpoint("/b"),
    )
}

async fn ingest_two_rows(dir: &TempDir, server: &MockServer) -> apirec_core::Config {
    let (a, b) = catalog_records();
    mount_record(server, &a, [1.0, 0.0, 0.0]).await;
    mount_record(server, &b, [0.0, 1.0, 0.0]).await;

    let config = local_config(dir.path(), server);
    let catalog = write_catalog(
        dir.path(),
        json!([
            {"api_name": "A", "description": "desc A"},
            {"api_name": "B", "description": "desc B", "endpoint": "/b"}
        ]),
    );

    let report = bootstrap::ingestion_pipeline(&config)
        .unwrap()
        .run_path(&catalog, IngestMode::Incremental)
        .await
        .unwrap();
    assert_eq!(report.rows_read, 2);
    assert_eq!(report.upserted, 2);
    assert!(report.is_complete());
    assert!(report.index_created);

    config
}

#[tokio::test]
async fn test_ingest_then_recommend_with_explanation() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let config = ingest_two_rows(&dir, &server).await;

    mount_embedding(&server, "需要接口B", [0.0, 1.0, 0.0]).await;
    mount_chat(&server, &["B", "最合适"]).await;

    let engine = bootstrap::engine(&config).unwrap();
    let response = engine.answer("需要接口B", Some(1)).await;

    assert_eq!(response.recommendations.len(), 1);
    let top = &response.recommendations[0];
    assert_eq!(top.api_name, "B");
    assert_eq!(top.endpoint.as_deref(), Some("/b"));
    assert!((top.score - 1.0).abs() < 1e-6);
    assert_eq!(response.explanation, "B最合适");

    let requests = server.received_requests().await.unwrap();
    let chat = requests
        .iter()
        .find(|r| r.url.path() == "/chat/completions")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&chat.body).unwrap();
    assert_eq!(body["model"], "glm-4");
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert!(user.starts_with("用户需求: 需要接口B\n"));
    assert!(user.contains("1. B (相似度: 1.00)\n   描述: desc B\n   接口: /b\n"));
}

#[tokio::test]
async fn test_endpoint_omitted_end_to_end() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let config = ingest_two_rows(&dir, &server).await;

    mount_embedding(&server, "需要接口A", [1.0, 0.0, 0.0]).await;

    let service = bootstrap::recommendation_service(&config).unwrap();
    let records = service.recommend("需要接口A", 2).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].api_name, "A");
    assert_eq!(records[0].endpoint, None);
    let json = serde_json::to_value(&records[0]).unwrap();
    assert!(json.get("endpoint").is_none());
}

#[tokio::test]
async fn test_reingest_is_idempotent_and_persisted() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let config = ingest_two_rows(&dir, &server).await;

    let catalog = dir.path().join("apis.json");
    let report = bootstrap::ingestion_pipeline(&config)
        .unwrap()
        .run_path(&catalog, IngestMode::Incremental)
        .await
        .unwrap();
    assert!(!report.index_created);

    // A fresh handle reads the persisted file.
    let index = bootstrap::vector_index(&config).unwrap();
    assert_eq!(index.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_unknown_query_embedding_degrades_to_empty() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let config = ingest_two_rows(&dir, &server).await;
    mount_chat(&server, &["unused"]).await;

    // No embedding mock for this query: the provider answers 404.
    let response = bootstrap::engine(&config)
        .unwrap()
        .answer("quit", None)
        .await;

    assert!(response.recommendations.is_empty());
    assert_eq!(response.explanation, "");
}
