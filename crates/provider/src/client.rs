//! Asynchronous query-execution client.
//!
//! The provider runs saved analytical queries asynchronously: a submission
//! returns an execution id, the execution moves through states until it
//! reaches a terminal one, and results are fetched separately once the
//! execution completes. This client drives that submit → poll → fetch
//! protocol with a fixed poll interval and a hard attempt cap.
//!
//! Failed and cancelled executions are never retried here: those states mean
//! the query itself is broken for the given parameters, and retry policy
//! belongs to the operator, not this client.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use rugscope_common::config::AppConfig;
use rugscope_common::error::QueryError;
use rugscope_common::types::{ExecutionState, QueryParams};

/// Header carrying the provider API key.
pub const API_KEY_HEADER: &str = "x-dune-api-key";

/// Handle to one in-flight provider execution.
///
/// Owned by exactly one poll loop and dropped once a terminal state is
/// reached.
#[derive(Debug, Clone)]
pub struct ExecutionHandle {
    pub execution_id: String,
    pub submitted_at: DateTime<Utc>,
}

/// Row-oriented result payload as returned by the provider.
#[derive(Debug, Clone)]
pub struct RawResult {
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub metadata: Option<serde_json::Value>,
}

impl RawResult {
    /// Validate a results response body into a tabular payload.
    ///
    /// Anything that is not `{"result": {"rows": [ {…}, … ]}}` is rejected
    /// as `MalformedResult`; this is the single seam where non-tabular
    /// provider output is caught.
    pub fn from_value(body: serde_json::Value) -> Result<Self, QueryError> {
        let result = body
            .get("result")
            .ok_or_else(|| QueryError::MalformedResult("missing result object".to_string()))?;

        let rows = result
            .get("rows")
            .and_then(|r| r.as_array())
            .ok_or_else(|| QueryError::MalformedResult("result.rows is not an array".to_string()))?;

        let mut parsed = Vec::with_capacity(rows.len());
        for row in rows {
            match row {
                serde_json::Value::Object(map) => parsed.push(map.clone()),
                _ => {
                    return Err(QueryError::MalformedResult(
                        "result.rows contains a non-object row".to_string(),
                    ));
                }
            }
        }

        Ok(Self {
            rows: parsed,
            metadata: result.get("metadata").cloned(),
        })
    }
}

#[derive(Deserialize)]
struct ExecuteResponse {
    execution_id: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    state: String,
}

/// Client for the provider's asynchronous query-execution API.
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl ProviderClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        poll_interval: Duration,
        max_poll_attempts: u32,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            poll_interval,
            max_poll_attempts,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.provider_base_url.clone(),
            config.provider_api_key.clone(),
            Duration::from_millis(config.poll_interval_ms),
            config.max_poll_attempts,
        )
    }

    /// Run one query end to end: submit, poll until terminal, fetch results.
    pub async fn execute(
        &self,
        query_id: u32,
        params: &QueryParams,
    ) -> Result<RawResult, QueryError> {
        let handle = self.submit(query_id, params).await?;
        let state = self.poll_until_terminal(&handle).await?;

        match state {
            ExecutionState::Completed => self.fetch_results(&handle.execution_id).await,
            state => {
                tracing::warn!(
                    execution_id = %handle.execution_id,
                    query_id,
                    state = %state,
                    "Execution ended without results"
                );
                Err(QueryError::ExecutionFailed { state })
            }
        }
    }

    /// Submit a query for execution.
    ///
    /// A non-2xx response is a malformed-request class of error and is not
    /// retried.
    pub async fn submit(
        &self,
        query_id: u32,
        params: &QueryParams,
    ) -> Result<ExecutionHandle, QueryError> {
        let url = format!("{}/query/{}/execute", self.base_url, query_id);
        let mut request = self.http.post(&url).header(API_KEY_HEADER, &self.api_key);
        if !params.is_empty() {
            request = request.json(&json!({ "query_parameters": params }));
        }

        let response = request
            .send()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::SubmissionFailed {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ExecuteResponse = response
            .json()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        tracing::debug!(
            query_id,
            execution_id = %parsed.execution_id,
            "Query submitted"
        );

        Ok(ExecutionHandle {
            execution_id: parsed.execution_id,
            submitted_at: Utc::now(),
        })
    }

    /// Poll the execution status until a terminal state or the attempt cap.
    async fn poll_until_terminal(
        &self,
        handle: &ExecutionHandle,
    ) -> Result<ExecutionState, QueryError> {
        for attempt in 1..=self.max_poll_attempts {
            tokio::time::sleep(self.poll_interval).await;

            let state = self.execution_state(&handle.execution_id).await?;
            tracing::debug!(
                execution_id = %handle.execution_id,
                attempt,
                state = %state,
                "Polled execution status"
            );

            if state.is_terminal() {
                return Ok(state);
            }
        }

        Err(QueryError::PollTimeout {
            attempts: self.max_poll_attempts,
        })
    }

    /// Fetch the current state of an execution.
    pub async fn execution_state(&self, execution_id: &str) -> Result<ExecutionState, QueryError> {
        let url = format!("{}/execution/{}/status", self.base_url, execution_id);
        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Transport(format!(
                "status check returned {status}: {body}"
            )));
        }

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        Ok(state_from_wire(&parsed.state))
    }

    /// Fetch the results of a completed execution.
    pub async fn fetch_results(&self, execution_id: &str) -> Result<RawResult, QueryError> {
        let url = format!("{}/execution/{}/results", self.base_url, execution_id);
        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::ResultFetchFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|_| QueryError::MalformedResult("results body is not valid JSON".to_string()))?;

        RawResult::from_value(body)
    }
}

/// Map a wire-format state string to an `ExecutionState`.
///
/// Unknown strings are treated as non-terminal so the poll cap, not a parse
/// error, bounds the loop if the provider adds states.
fn state_from_wire(state: &str) -> ExecutionState {
    match state {
        "QUERY_STATE_PENDING" => ExecutionState::Pending,
        "QUERY_STATE_EXECUTING" => ExecutionState::Running,
        "QUERY_STATE_COMPLETED" => ExecutionState::Completed,
        "QUERY_STATE_FAILED" => ExecutionState::Failed,
        "QUERY_STATE_CANCELLED" => ExecutionState::Cancelled,
        "QUERY_STATE_EXPIRED" => ExecutionState::TimedOut,
        other => {
            tracing::debug!(state = other, "Unknown execution state, assuming still running");
            ExecutionState::Running
        }
    }
}
