//! Integration tests for API routes.
//!
//! Uses `tower::ServiceExt` to drive Axum routes without a real HTTP
//! server. The query provider is mocked in-process on an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower::ServiceExt;

use rugscope_api::routes::create_router;
use rugscope_api::state::AppState;
use rugscope_common::config::AppConfig;
use rugscope_engine::service::AnalyticsService;
use rugscope_provider::ProviderClient;

// ============================================================
// Helpers
// ============================================================

fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        provider_api_key: "test-key".to_string(),
        provider_base_url: base_url.to_string(),
        cache_ttl_seconds: 60,
        poll_interval_ms: 5,
        max_poll_attempts: 3,
        port: 0,
    }
}

fn build_state(base_url: &str) -> AppState {
    let config = test_config(base_url);
    let client = ProviderClient::from_config(&config);
    let analytics = AnalyticsService::new(client, Duration::from_secs(config.cache_ttl_seconds));
    AppState::new(analytics, config)
}

/// Mock provider that completes immediately and serves `results_body`.
/// Returns the listen address and a counter of submissions observed.
async fn mock_provider(results_body: Value) -> (SocketAddr, Arc<AtomicUsize>) {
    let submissions = Arc::new(AtomicUsize::new(0));
    let submissions_handler = submissions.clone();

    let router = Router::new()
        .route(
            "/query/{id}/execute",
            post(move || {
                let submissions = submissions_handler.clone();
                async move {
                    submissions.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "execution_id": "exec-1" }))
                }
            }),
        )
        .route(
            "/execution/{id}/status",
            get(|| async { Json(json!({ "state": "QUERY_STATE_COMPLETED" })) }),
        )
        .route(
            "/execution/{id}/results",
            get(move || {
                let body = results_body.clone();
                async move { Json(body) }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, submissions)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn ownership_rows() -> Value {
    let holders = [
        ("wallet1", "Whale 1", 25.3),
        ("wallet2", "Whale 2", 18.7),
        ("wallet3", "Whale 3", 12.4),
        ("wallet4", "Whale 4", 8.9),
        ("wallet5", "Whale 5", 6.2),
        ("wallet6", "Whale 6", 4.8),
        ("wallet7", "Whale 7", 3.5),
        ("wallet8", "Whale 8", 2.9),
        ("wallet9", "Whale 9", 2.1),
        ("wallet10", "Whale 10", 1.8),
        ("others", "Others", 13.4),
    ];
    let rows: Vec<Value> = holders
        .iter()
        .map(|(id, label, value)| json!({ "id": id, "label": label, "value": value }))
        .collect();
    json!({ "result": { "rows": rows } })
}

// ============================================================
// Route tests
// ============================================================

#[tokio::test]
async fn test_health_endpoint() {
    let state = build_state("http://127.0.0.1:1");
    let app = create_router(state);

    let (status, body) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "rugscope-api");
}

#[tokio::test]
async fn test_ownership_concentration_end_to_end() {
    let (addr, _) = mock_provider(ownership_rows()).await;
    let state = build_state(&format!("http://{addr}"));
    let app = create_router(state);

    let (status, body) = get_json(app, "/api/ownership-concentration?token_address=0xdead").await;

    assert_eq!(status, StatusCode::OK);
    let slices = body.as_array().unwrap();
    assert_eq!(slices.len(), 11);
    for slice in slices {
        assert!(slice["id"].is_string());
        assert!(slice["label"].is_string());
        assert!(slice["value"].is_number());
    }
    let total: f64 = slices.iter().map(|s| s["value"].as_f64().unwrap()).sum();
    assert!(total <= 100.0, "holder shares sum to {total}");
}

#[tokio::test]
async fn test_dashboard_summary_with_unreachable_provider() {
    // Port 1 refuses connections; the endpoint must answer with error JSON,
    // not a crash.
    let state = build_state("http://127.0.0.1:1");
    let app = create_router(state);

    let (status, body) = get_json(app, "/api/dashboard-summary").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "transport");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_absent_token_address_runs_unfiltered() {
    let (addr, _) = mock_provider(json!({
        "result": {
            "rows": [{
                "source": "wallet1", "source_label": "Wallet 1",
                "source_size": 20, "source_color": "#82e0aa",
                "target": "exchange1", "target_label": "Exchange 1",
                "target_size": 30, "target_color": "#aed6f1",
                "value": 10
            }]
        }
    }))
    .await;
    let state = build_state(&format!("http://{addr}"));
    let app = create_router(state);

    let (status, body) = get_json(app, "/api/transaction-flow").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(body["links"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_repeated_request_is_served_from_cache() {
    let (addr, submissions) = mock_provider(ownership_rows()).await;
    let state = build_state(&format!("http://{addr}"));

    for _ in 0..2 {
        let app = create_router(state.clone());
        let (status, _) = get_json(app, "/api/ownership-concentration?token_address=0xdead").await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(submissions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_anomaly_detection_flags_spikes() {
    let (addr, _) = mock_provider(json!({
        "result": {
            "rows": [
                { "date": "2023-04-03", "value": 130 },
                { "date": "2023-04-04", "value": 220 },
                { "date": "2023-04-05", "value": 190 }
            ]
        }
    }))
    .await;
    let state = build_state(&format!("http://{addr}"));
    let app = create_router(state);

    let (status, body) = get_json(app, "/api/anomaly-detection?token_address=0xdead&days=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dates"].as_array().unwrap().len(), 3);
    let anomalies = body["anomalies"].as_array().unwrap();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0]["date"], "2023-04-04");
    assert_eq!(anomalies[0]["type"], "spike");
    assert_eq!(anomalies[0]["percentage"], 69.2);
}
