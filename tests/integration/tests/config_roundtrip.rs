//! Config save/load roundtrip integration tests.

use apirec_core::config::{Config, ConfigBuilder, IndexBackend, LogFormat};
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("apirec.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.gateway.port, config.gateway.port);
    assert_eq!(loaded.gateway.bind, config.gateway.bind);
    assert_eq!(loaded.index.name, config.index.name);
    assert_eq!(loaded.recommend.top_k, config.recommend.top_k);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("apirec.json5");

    let config = ConfigBuilder::new()
        .index_backend(IndexBackend::Local)
        .dimension(8)
        .port(9090)
        .log_format(LogFormat::Json)
        .build();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.gateway.port, 9090);
    assert_eq!(loaded.index.backend, IndexBackend::Local);
    assert_eq!(loaded.embedding.dimension, 8);
    assert_eq!(loaded.index.dimension, 8);
    assert_eq!(loaded.logging.format, LogFormat::Json);
}

#[test]
fn test_config_json5_comments() {
    let config = Config::parse(
        r#"{
            // local development
            index: { backend: "local", name: "dev-apis" },
            ingest: { batch_size: 4, },
        }"#,
    )
    .unwrap();
    assert_eq!(config.index.backend, IndexBackend::Local);
    assert_eq!(config.index.name, "dev-apis");
    assert_eq!(config.ingest.batch_size, 4);
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/apirec.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    assert!(Config::parse("not valid json").is_err());
}

#[test]
fn test_validation_collects_all_errors() {
    let mut config = Config::default();
    config.ingest.batch_size = 0;
    config.recommend.top_k = 0;

    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("batch_size"));
    assert!(err.contains("top_k"));
}
