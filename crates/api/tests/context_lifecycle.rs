//! Integration tests for AppContext lifecycle
//!
//! Tests verify that the context wires producers through to the
//! remote-write endpoint and that shutdown flushes what is still buffered.

use std::collections::BTreeMap;

use chrono::Utc;
use meterwire_domain::{Config, MeterwireError, MetricReading, RemoteWriteConfig};
use meterwire_lib::context::AppContext;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> Config {
    let mut config = Config {
        remote_write: RemoteWriteConfig {
            endpoint: format!("{}/api/v1/write", server.uri()),
            ..RemoteWriteConfig::default()
        },
        ..Config::default()
    };
    config.health.bind_address = "127.0.0.1:0".to_string();
    config.series.external_labels = BTreeMap::from([("job".to_string(), "meterwire".to_string())]);
    config
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_flushes_buffered_readings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/write"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut ctx = AppContext::new(test_config(&server)).expect("context should build");
    ctx.start().await.expect("context should start");
    assert!(ctx.is_running());

    let buffer = ctx.buffer();
    buffer.add(MetricReading::new("meter_power_watts", 950.0, Utc::now()).into());
    buffer.add(MetricReading::new("meter_power_watts", 975.0, Utc::now()).into());

    ctx.shutdown().await.expect("shutdown should succeed");

    assert!(!ctx.is_running());
    assert!(buffer.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_endpoint_is_served() {
    let server = MockServer::start().await;
    let mut ctx = AppContext::new(test_config(&server)).unwrap();
    ctx.start().await.unwrap();

    let addr = ctx.health_address().expect("health server should be bound");
    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["status"], "healthy");

    ctx.shutdown().await.unwrap();
    assert!(ctx.health_address().is_none());
}

#[tokio::test]
async fn test_health_can_be_disabled() {
    let server = MockServer::start().await;
    let mut config = test_config(&server);
    config.health.enabled = false;

    let mut ctx = AppContext::new(config).unwrap();
    ctx.start().await.unwrap();
    assert!(ctx.health_address().is_none());
    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_pusher_start_leaves_context_stoppable() {
    let server = MockServer::start().await;
    let mut config = test_config(&server);
    config.health.enabled = false;

    let mut ctx = AppContext::new(config).unwrap();
    ctx.start().await.unwrap();

    let err = ctx.start().await.expect_err("second start must fail");
    assert!(matches!(err, MeterwireError::Internal(_)), "got {err:?}");
    assert!(ctx.is_running());

    ctx.shutdown().await.unwrap();
    assert!(!ctx.is_running());
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = Config::default();
    let err = AppContext::new(config).err().expect("missing endpoint must fail");
    assert!(matches!(err, MeterwireError::Config(_)));
}
