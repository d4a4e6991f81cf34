//! HTTP boundary over the configured stack.

use apirec_cli::bootstrap;
use apirec_core::ApiRecord;
use apirec_gateway::{router, AppState};
use apirec_integration_tests::{local_config, mount_chat, mount_embedding, mount_record};
use apirec_recommender::{Catalog, IngestMode};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

#[tokio::test]
async fn test_recommend_over_http() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let config = local_config(dir.path(), &server);

    let record = ApiRecord::new("weather", "Weather API", "Forecasts by city");
    mount_record(&server, &record, [1.0, 0.0, 0.0]).await;
    mount_embedding(&server, "天气预报", [1.0, 0.0, 0.0]).await;
    mount_chat(&server, &["适合", "天气查询"]).await;

    let catalog: Catalog = std::iter::once(record).collect();
    bootstrap::ingestion_pipeline(&config)
        .unwrap()
        .run(&catalog, IngestMode::Reset)
        .await
        .unwrap();

    let app = router(AppState::new(bootstrap::engine(&config).unwrap()), true);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/recommend")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"query": "天气预报"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["recommendations"][0]["api_name"], "Weather API");
    assert_eq!(json["explanation"], "适合天气查询");
}
