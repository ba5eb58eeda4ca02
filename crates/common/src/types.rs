use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Parameters forwarded to a provider query.
///
/// A `BTreeMap` keeps the iteration order sorted, which makes the JSON
/// encoding canonical — the cache key depends on that.
pub type QueryParams = BTreeMap<String, serde_json::Value>;

/// Canonical string encoding of a parameter map, used in cache keys.
pub fn canonical_params(params: &QueryParams) -> String {
    serde_json::to_string(params).unwrap_or_default()
}

/// State of a provider-side query execution.
///
/// `Pending` and `Running` are non-terminal; everything else ends the poll
/// loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    TimedOut,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionState::Pending | ExecutionState::Running)
    }
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionState::Pending => write!(f, "pending"),
            ExecutionState::Running => write!(f, "running"),
            ExecutionState::Completed => write!(f, "completed"),
            ExecutionState::Failed => write!(f, "failed"),
            ExecutionState::Cancelled => write!(f, "cancelled"),
            ExecutionState::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// A node in a transaction-flow or clustering graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub size: f64,
    pub color: String,
}

/// A directed edge between two graph nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub value: f64,
}

/// Token transfer graph between wallets and exchanges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// A single detected anomaly within a transaction-volume series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub date: String,
    pub value: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub percentage: f64,
}

/// Daily transaction volume with flagged anomalies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalySeries {
    pub dates: Vec<String>,
    pub values: Vec<f64>,
    pub anomalies: Vec<Anomaly>,
}

/// One holder's share of total supply, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationSlice {
    pub id: String,
    pub label: String,
    pub value: f64,
}

/// Balance history for one wallet across the observed dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalances {
    pub id: String,
    pub label: String,
    pub balances: Vec<f64>,
}

/// Per-wallet balance trajectories used to visualize coordinated sell-offs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellOffPattern {
    pub dates: Vec<String>,
    pub wallets: Vec<WalletBalances>,
}

/// Trade count within one volume bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeBracket {
    pub bracket: String,
    pub count: u64,
}

/// Share of volume attributed to one transaction class (bot vs. organic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeShare {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
}

/// Price history around a rug event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSeries {
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rug_event: Option<String>,
}

/// Transaction-count history around a rug event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySeries {
    pub dates: Vec<String>,
    pub transactions: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rug_event: Option<String>,
}

/// Composite post-rug view: LP pull percentage plus price/activity collapse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRugIndicators {
    pub lp_pull: f64,
    pub price_data: PriceSeries,
    pub activity_data: ActivitySeries,
}

/// A node in the wallet-clustering graph; either a cluster or a member wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterNode {
    pub id: String,
    pub label: String,
    pub size: f64,
    pub color: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
}

/// One timestamped wallet action on the clustering timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub time: String,
    pub wallet: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub amount: f64,
}

/// Wallet clusters, their internal transfers, and the activity timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterGraph {
    pub nodes: Vec<ClusterNode>,
    pub links: Vec<GraphLink>,
    pub timeline: Vec<TimelineEntry>,
}

/// Top-line metrics for the dashboard header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_transactions: u64,
    pub transactions_change: f64,
    pub active_wallets: u64,
    pub wallets_change: f64,
    pub suspicious_activity: u64,
    pub suspicious_change: f64,
    pub bot_percentage: f64,
    pub whale_concentration: f64,
    pub anomaly_count: u64,
}

/// A fully normalized query result, one variant per endpoint contract.
///
/// Untagged on the wire: each endpoint serializes to exactly the shape its
/// contract promises, with no envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedResult {
    Flow(FlowGraph),
    Anomalies(AnomalySeries),
    Concentration(Vec<ConcentrationSlice>),
    SellOff(SellOffPattern),
    Brackets(Vec<VolumeBracket>),
    VolumeSplit(Vec<VolumeShare>),
    PostRug(PostRugIndicators),
    Clustering(ClusterGraph),
    Summary(DashboardSummary),
}
