//! Integration tests for the query-execution client.
//!
//! Each test stands up an in-process mock of the provider API on an
//! ephemeral port and drives the real client against it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use rugscope_common::error::QueryError;
use rugscope_common::types::{ExecutionState, QueryParams};
use rugscope_provider::ProviderClient;
use rugscope_provider::client::API_KEY_HEADER;

// ============================================================
// Mock provider
// ============================================================

#[derive(Clone)]
struct MockProvider {
    /// Status responses in poll order; the last one repeats.
    states: Arc<Vec<&'static str>>,
    /// Number of status polls observed.
    polls: Arc<AtomicUsize>,
    /// Body served by the results endpoint.
    results_body: Arc<Value>,
}

impl MockProvider {
    fn new(states: Vec<&'static str>, results_body: Value) -> Self {
        Self {
            states: Arc::new(states),
            polls: Arc::new(AtomicUsize::new(0)),
            results_body: Arc::new(results_body),
        }
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/query/{id}/execute", post(mock_execute))
            .route("/execution/{id}/status", get(mock_status))
            .route("/execution/{id}/results", get(mock_results))
            .with_state(self.clone())
    }
}

async fn mock_execute(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !headers.contains_key(API_KEY_HEADER) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({ "execution_id": "exec-1" })))
}

async fn mock_status(State(mock): State<MockProvider>) -> Json<Value> {
    let n = mock.polls.fetch_add(1, Ordering::SeqCst);
    let state = mock
        .states
        .get(n)
        .or_else(|| mock.states.last())
        .copied()
        .unwrap_or("QUERY_STATE_FAILED");
    Json(json!({ "state": state }))
}

async fn mock_results(State(mock): State<MockProvider>) -> Json<Value> {
    Json((*mock.results_body).clone())
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr, max_poll_attempts: u32) -> ProviderClient {
    ProviderClient::new(
        format!("http://{addr}"),
        "test-key",
        Duration::from_millis(5),
        max_poll_attempts,
    )
}

fn ownership_rows() -> Value {
    json!({
        "result": {
            "rows": [
                { "id": "wallet1", "label": "Whale 1", "value": 25.3 },
                { "id": "wallet2", "label": "Whale 2", "value": 18.7 }
            ]
        }
    })
}

// ============================================================
// Protocol tests
// ============================================================

#[tokio::test]
async fn execute_submits_polls_and_fetches_results() {
    let mock = MockProvider::new(
        vec![
            "QUERY_STATE_PENDING",
            "QUERY_STATE_EXECUTING",
            "QUERY_STATE_COMPLETED",
        ],
        ownership_rows(),
    );
    let addr = serve(mock.router()).await;

    let raw = client(addr, 10)
        .execute(3412901, &QueryParams::new())
        .await
        .unwrap();

    assert_eq!(raw.rows.len(), 2);
    assert_eq!(raw.rows[0]["id"], "wallet1");
    assert_eq!(mock.polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn polling_halts_at_the_attempt_cap() {
    // Provider never leaves the running state; the loop must still halt.
    let mock = MockProvider::new(vec!["QUERY_STATE_EXECUTING"], ownership_rows());
    let addr = serve(mock.router()).await;

    let err = client(addr, 3)
        .execute(3412901, &QueryParams::new())
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::PollTimeout { attempts: 3 }));
    assert_eq!(mock.polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn failed_execution_is_not_retried() {
    let mock = MockProvider::new(vec!["QUERY_STATE_FAILED"], ownership_rows());
    let addr = serve(mock.router()).await;

    let err = client(addr, 10)
        .execute(3412901, &QueryParams::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        QueryError::ExecutionFailed {
            state: ExecutionState::Failed
        }
    ));
    // One poll saw the terminal state; no further polls, no retry.
    assert_eq!(mock.polls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancelled_execution_maps_to_execution_failed() {
    let mock = MockProvider::new(vec!["QUERY_STATE_CANCELLED"], ownership_rows());
    let addr = serve(mock.router()).await;

    let err = client(addr, 10)
        .execute(3412901, &QueryParams::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        QueryError::ExecutionFailed {
            state: ExecutionState::Cancelled
        }
    ));
}

#[tokio::test]
async fn rejected_submission_fails_immediately() {
    async fn reject() -> (StatusCode, &'static str) {
        (StatusCode::BAD_REQUEST, "unknown query id")
    }
    let router = Router::new().route("/query/{id}/execute", post(reject));
    let addr = serve(router).await;

    let err = client(addr, 10)
        .execute(999, &QueryParams::new())
        .await
        .unwrap_err();

    match err {
        QueryError::SubmissionFailed { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "unknown query id");
        }
        other => panic!("expected SubmissionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn non_tabular_results_are_malformed() {
    let mock = MockProvider::new(
        vec!["QUERY_STATE_COMPLETED"],
        json!({ "result": { "rows": "not-a-table" } }),
    );
    let addr = serve(mock.router()).await;

    let err = client(addr, 10)
        .execute(3412901, &QueryParams::new())
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::MalformedResult(_)));
}

#[tokio::test]
async fn rejected_result_fetch_is_reported() {
    async fn broken_results() -> (StatusCode, &'static str) {
        (StatusCode::INTERNAL_SERVER_ERROR, "storage error")
    }
    let mock = MockProvider::new(vec!["QUERY_STATE_COMPLETED"], json!({}));
    let router = Router::new()
        .route("/query/{id}/execute", post(mock_execute))
        .route("/execution/{id}/status", get(mock_status))
        .route("/execution/{id}/results", get(broken_results))
        .with_state(mock);
    let addr = serve(router).await;

    let err = client(addr, 10)
        .execute(3412901, &QueryParams::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        QueryError::ResultFetchFailed { status: 500, .. }
    ));
}

#[tokio::test]
async fn unreachable_provider_is_a_transport_error() {
    // Port 1 refuses connections.
    let provider = ProviderClient::new(
        "http://127.0.0.1:1",
        "test-key",
        Duration::from_millis(5),
        2,
    );

    let err = provider
        .execute(3412901, &QueryParams::new())
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Transport(_)));
}
