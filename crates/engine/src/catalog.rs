//! Query catalog — maps logical query names to provider query ids.
//!
//! The catalog is the only place that knows which saved provider query backs
//! which endpoint, and which normalizer applies to its rows. It is built once
//! at startup and never mutated.

use std::collections::HashMap;

use rugscope_common::error::QueryError;

/// Selects the normalizer applied to a query's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    TransactionFlow,
    AnomalyDetection,
    OwnershipConcentration,
    SellOffPatterns,
    VolumeBrackets,
    BotVolume,
    PostRugIndicators,
    WalletClustering,
    DashboardSummary,
}

/// Provider-side query id plus the shape its rows normalize into.
#[derive(Debug, Clone, Copy)]
pub struct QueryDef {
    pub query_id: u32,
    pub shape: ResponseShape,
}

/// Read-only registry of all supported analytical queries.
pub struct Catalog {
    entries: HashMap<&'static str, QueryDef>,
}

impl Catalog {
    pub fn new() -> Self {
        let mut entries = HashMap::new();

        let mut register = |name: &'static str, query_id: u32, shape: ResponseShape| {
            entries.insert(name, QueryDef { query_id, shape });
        };

        register("transaction_flow", 3412901, ResponseShape::TransactionFlow);
        register("anomaly_detection", 3412905, ResponseShape::AnomalyDetection);
        register(
            "ownership_concentration",
            3412912,
            ResponseShape::OwnershipConcentration,
        );
        register("sell_off_patterns", 3412918, ResponseShape::SellOffPatterns);
        register("volume_brackets", 3412923, ResponseShape::VolumeBrackets);
        register("bot_volume", 3412930, ResponseShape::BotVolume);
        register(
            "post_rug_indicators",
            3412934,
            ResponseShape::PostRugIndicators,
        );
        register("wallet_clustering", 3412941, ResponseShape::WalletClustering);
        register("dashboard_summary", 3412947, ResponseShape::DashboardSummary);

        Self { entries }
    }

    /// Look up a logical query name.
    pub fn resolve(&self, logical_name: &str) -> Result<QueryDef, QueryError> {
        self.entries
            .get(logical_name)
            .copied()
            .ok_or_else(|| QueryError::UnknownQuery(logical_name.to_string()))
    }

    /// All registered logical names.
    pub fn logical_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_supported_queries_resolve() {
        let catalog = Catalog::new();
        for name in [
            "transaction_flow",
            "anomaly_detection",
            "ownership_concentration",
            "sell_off_patterns",
            "volume_brackets",
            "bot_volume",
            "post_rug_indicators",
            "wallet_clustering",
            "dashboard_summary",
        ] {
            let def = catalog.resolve(name).unwrap();
            assert!(def.query_id > 0, "{name} has no provider query id");
        }
        assert_eq!(catalog.logical_names().count(), 9);
    }

    #[test]
    fn unregistered_name_is_unknown_query() {
        let catalog = Catalog::new();
        let err = catalog.resolve("liquidity_migration").unwrap_err();
        match err {
            QueryError::UnknownQuery(name) => assert_eq!(name, "liquidity_migration"),
            other => panic!("expected UnknownQuery, got {other:?}"),
        }
    }
}
