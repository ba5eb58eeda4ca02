use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::types::ExecutionState;

/// Failures that can occur while resolving, executing, or normalizing an
/// analytical query.
///
/// `Clone` because cache waiters receive the outcome over a broadcast
/// channel; all payloads are owned strings for that reason.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("unknown query: {0}")]
    UnknownQuery(String),

    #[error("query submission rejected with status {status}: {body}")]
    SubmissionFailed { status: u16, body: String },

    #[error("execution still running after {attempts} status polls")]
    PollTimeout { attempts: u32 },

    #[error("provider reported execution state {state}")]
    ExecutionFailed { state: ExecutionState },

    #[error("result fetch rejected with status {status}: {body}")]
    ResultFetchFailed { status: u16, body: String },

    #[error("malformed result payload: {0}")]
    MalformedResult(String),

    #[error("provider request failed: {0}")]
    Transport(String),
}

impl QueryError {
    /// Stable machine-readable kind, used as the `error` field of JSON bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::UnknownQuery(_) => "unknown_query",
            QueryError::SubmissionFailed { .. } => "submission_failed",
            QueryError::PollTimeout { .. } => "poll_timeout",
            QueryError::ExecutionFailed { .. } => "execution_failed",
            QueryError::ResultFetchFailed { .. } => "result_fetch_failed",
            QueryError::MalformedResult(_) => "malformed_result",
            QueryError::Transport(_) => "transport",
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = match &self {
            QueryError::UnknownQuery(_) => StatusCode::NOT_FOUND,
            QueryError::PollTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            QueryError::SubmissionFailed { .. }
            | QueryError::ExecutionFailed { .. }
            | QueryError::ResultFetchFailed { .. }
            | QueryError::MalformedResult(_)
            | QueryError::Transport(_) => StatusCode::BAD_GATEWAY,
        };

        let body = json!({ "error": self.kind(), "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_stable_per_variant() {
        assert_eq!(QueryError::UnknownQuery("x".into()).kind(), "unknown_query");
        assert_eq!(QueryError::PollTimeout { attempts: 10 }.kind(), "poll_timeout");
        assert_eq!(
            QueryError::ExecutionFailed {
                state: ExecutionState::Cancelled
            }
            .kind(),
            "execution_failed"
        );
    }
}
