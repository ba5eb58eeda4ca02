//! Response schema normalizers.
//!
//! One function per response shape, each total over any row-shaped input:
//! unknown columns are ignored, missing strings default to empty, missing
//! numerics to zero, and numeric strings are coerced. A dashboard widget is
//! better served by partial data than by a hard failure, so nothing in this
//! module returns an error — structurally invalid payloads are already
//! rejected at the provider boundary.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use rugscope_common::types::{
    ActivitySeries, Anomaly, AnomalySeries, ClusterGraph, ClusterNode, ConcentrationSlice,
    DashboardSummary, FlowGraph, GraphLink, GraphNode, NormalizedResult, PostRugIndicators,
    PriceSeries, QueryParams, SellOffPattern, TimelineEntry, VolumeBracket, VolumeShare,
    WalletBalances,
};
use rugscope_provider::RawResult;

use crate::catalog::ResponseShape;

type Row = serde_json::Map<String, Value>;

/// Deviation from the baseline (in percent) beyond which a sample is flagged.
const ANOMALY_THRESHOLD_PCT: f64 = 50.0;

/// Normalize a raw provider result into the shape the endpoint promises.
pub fn apply(shape: ResponseShape, raw: &RawResult, params: &QueryParams) -> NormalizedResult {
    match shape {
        ResponseShape::TransactionFlow => NormalizedResult::Flow(transaction_flow(&raw.rows)),
        ResponseShape::AnomalyDetection => {
            NormalizedResult::Anomalies(anomaly_series(&raw.rows, declared_baseline(params)))
        }
        ResponseShape::OwnershipConcentration => {
            NormalizedResult::Concentration(concentration(&raw.rows))
        }
        ResponseShape::SellOffPatterns => NormalizedResult::SellOff(sell_off(&raw.rows)),
        ResponseShape::VolumeBrackets => NormalizedResult::Brackets(volume_brackets(&raw.rows)),
        ResponseShape::BotVolume => NormalizedResult::VolumeSplit(volume_split(&raw.rows)),
        ResponseShape::PostRugIndicators => NormalizedResult::PostRug(post_rug(&raw.rows)),
        ResponseShape::WalletClustering => NormalizedResult::Clustering(clustering(&raw.rows)),
        ResponseShape::DashboardSummary => NormalizedResult::Summary(dashboard_summary(&raw.rows)),
    }
}

// ============================================================
// Field coercion helpers
// ============================================================

fn str_field(row: &Row, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn str_field_or(row: &Row, key: &str, default: &str) -> String {
    let value = str_field(row, key);
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn opt_str_field(row: &Row, key: &str) -> Option<String> {
    let value = str_field(row, key);
    if value.is_empty() { None } else { Some(value) }
}

fn f64_field(row: &Row, key: &str) -> f64 {
    match row.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn u64_field(row: &Row, key: &str) -> u64 {
    match row.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .unwrap_or_else(|| n.as_f64().unwrap_or(0.0).max(0.0) as u64),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn flag_field(row: &Row, key: &str) -> bool {
    match row.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) != 0.0,
        Some(Value::String(s)) => s == "true" || s == "1",
        _ => false,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn declared_baseline(params: &QueryParams) -> Option<f64> {
    params.get("baseline").and_then(Value::as_f64)
}

// ============================================================
// Per-shape normalizers
// ============================================================

/// Rows are transfer edges carrying the attributes of both endpoints; nodes
/// are deduplicated in first-seen order.
fn transaction_flow(rows: &[Row]) -> FlowGraph {
    let mut nodes = Vec::new();
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for row in rows {
        for endpoint in ["source", "target"] {
            let id = str_field(row, endpoint);
            if !id.is_empty() && seen.insert(id.clone()) {
                nodes.push(GraphNode {
                    label: str_field_or(row, &format!("{endpoint}_label"), &id),
                    size: f64_field(row, &format!("{endpoint}_size")),
                    color: str_field(row, &format!("{endpoint}_color")),
                    id,
                });
            }
        }

        let source = str_field(row, "source");
        let target = str_field(row, "target");
        if !source.is_empty() && !target.is_empty() {
            links.push(GraphLink {
                source,
                target,
                value: f64_field(row, "value"),
            });
        }
    }

    FlowGraph { nodes, links }
}

/// Flag samples whose deviation from the baseline exceeds the threshold.
///
/// The baseline is the previous sample, or a fixed value when the caller
/// declared one via the `baseline` parameter. The first sample can never be
/// anomalous without a declared baseline.
fn anomaly_series(rows: &[Row], declared_baseline: Option<f64>) -> AnomalySeries {
    let dates: Vec<String> = rows.iter().map(|r| str_field(r, "date")).collect();
    let values: Vec<f64> = rows.iter().map(|r| f64_field(r, "value")).collect();

    let mut anomalies = Vec::new();
    for (i, &value) in values.iter().enumerate() {
        let baseline = match declared_baseline {
            Some(b) => b,
            None if i > 0 => values[i - 1],
            None => continue,
        };
        if baseline <= 0.0 {
            continue;
        }

        let deviation_pct = (value - baseline) / baseline * 100.0;
        let kind = if deviation_pct >= ANOMALY_THRESHOLD_PCT {
            "spike"
        } else if deviation_pct <= -ANOMALY_THRESHOLD_PCT {
            "drop"
        } else {
            continue;
        };

        anomalies.push(Anomaly {
            date: dates[i].clone(),
            value,
            kind: kind.to_string(),
            percentage: round1(deviation_pct.abs()),
        });
    }

    AnomalySeries {
        dates,
        values,
        anomalies,
    }
}

fn concentration(rows: &[Row]) -> Vec<ConcentrationSlice> {
    rows.iter()
        .map(|row| {
            let id = str_field(row, "id");
            ConcentrationSlice {
                label: str_field_or(row, "label", &id),
                value: f64_field(row, "value"),
                id,
            }
        })
        .collect()
}

/// Rows are (date, wallet, balance) observations; balances are aligned to
/// the full date axis, with zero filled in where a wallet has no row.
fn sell_off(rows: &[Row]) -> SellOffPattern {
    let mut dates: Vec<String> = Vec::new();
    let mut seen_dates = HashSet::new();
    let mut wallet_order: Vec<(String, String)> = Vec::new();
    let mut seen_wallets = HashSet::new();
    let mut balances: HashMap<(String, String), f64> = HashMap::new();

    for row in rows {
        let date = str_field(row, "date");
        let wallet = str_field(row, "wallet_id");
        if date.is_empty() || wallet.is_empty() {
            continue;
        }
        if seen_dates.insert(date.clone()) {
            dates.push(date.clone());
        }
        if seen_wallets.insert(wallet.clone()) {
            wallet_order.push((wallet.clone(), str_field_or(row, "wallet_label", &wallet)));
        }
        balances.insert((wallet, date), f64_field(row, "balance"));
    }

    let wallets = wallet_order
        .into_iter()
        .map(|(id, label)| WalletBalances {
            balances: dates
                .iter()
                .map(|d| {
                    balances
                        .get(&(id.clone(), d.clone()))
                        .copied()
                        .unwrap_or(0.0)
                })
                .collect(),
            id,
            label,
        })
        .collect();

    SellOffPattern { dates, wallets }
}

fn volume_brackets(rows: &[Row]) -> Vec<VolumeBracket> {
    rows.iter()
        .map(|row| VolumeBracket {
            bracket: str_field(row, "bracket"),
            count: u64_field(row, "count"),
        })
        .collect()
}

fn volume_split(rows: &[Row]) -> Vec<VolumeShare> {
    rows.iter()
        .map(|row| VolumeShare {
            kind: str_field(row, "type"),
            value: f64_field(row, "value"),
        })
        .collect()
}

/// The rug event is the first row flagged as such; the LP pull is the
/// largest observed pull percentage.
fn post_rug(rows: &[Row]) -> PostRugIndicators {
    let mut dates = Vec::with_capacity(rows.len());
    let mut prices = Vec::with_capacity(rows.len());
    let mut transactions = Vec::with_capacity(rows.len());
    let mut rug_event: Option<String> = None;
    let mut lp_pull: f64 = 0.0;

    for row in rows {
        let date = str_field(row, "date");
        if rug_event.is_none() && flag_field(row, "is_rug_event") {
            rug_event = Some(date.clone());
        }
        lp_pull = lp_pull.max(f64_field(row, "lp_pulled_pct"));
        dates.push(date);
        prices.push(f64_field(row, "price"));
        transactions.push(u64_field(row, "transactions"));
    }

    PostRugIndicators {
        lp_pull,
        price_data: PriceSeries {
            dates: dates.clone(),
            prices,
            rug_event: rug_event.clone(),
        },
        activity_data: ActivitySeries {
            dates,
            transactions,
            rug_event,
        },
    }
}

/// Rows are heterogeneous, discriminated by `record_type`: graph nodes,
/// graph links, and timeline activity. Unknown record types are skipped.
fn clustering(rows: &[Row]) -> ClusterGraph {
    let mut nodes = Vec::new();
    let mut links = Vec::new();
    let mut timeline = Vec::new();

    for row in rows {
        match str_field(row, "record_type").as_str() {
            "node" => {
                let id = str_field(row, "id");
                nodes.push(ClusterNode {
                    label: str_field_or(row, "label", &id),
                    size: f64_field(row, "size"),
                    color: str_field(row, "color"),
                    kind: str_field_or(row, "node_type", "wallet"),
                    cluster: opt_str_field(row, "cluster"),
                    id,
                });
            }
            "link" => links.push(GraphLink {
                source: str_field(row, "source"),
                target: str_field(row, "target"),
                value: f64_field(row, "value"),
            }),
            "activity" => timeline.push(TimelineEntry {
                time: str_field(row, "time"),
                wallet: str_field(row, "wallet"),
                action: str_field(row, "action"),
                target: opt_str_field(row, "target"),
                amount: f64_field(row, "amount"),
            }),
            _ => {}
        }
    }

    ClusterGraph {
        nodes,
        links,
        timeline,
    }
}

/// Single-row summary; an empty result normalizes to all zeros.
fn dashboard_summary(rows: &[Row]) -> DashboardSummary {
    let empty = Row::new();
    let row = rows.first().unwrap_or(&empty);

    DashboardSummary {
        total_transactions: u64_field(row, "total_transactions"),
        transactions_change: f64_field(row, "transactions_change"),
        active_wallets: u64_field(row, "active_wallets"),
        wallets_change: f64_field(row, "wallets_change"),
        suspicious_activity: u64_field(row, "suspicious_activity"),
        suspicious_change: f64_field(row, "suspicious_change"),
        bot_percentage: f64_field(row, "bot_percentage"),
        whale_concentration: f64_field(row, "whale_concentration"),
        anomaly_count: u64_field(row, "anomaly_count"),
    }
}
