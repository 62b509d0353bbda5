//! Metrics store seam
//!
//! Durable append-only execution log per workload, abstracted behind a
//! narrow record/history/aggregate capability so storage backends can be
//! swapped without touching the reasoning core. The bundled
//! `InMemoryMetricsStore` keeps records in process memory; it is the
//! default backend and the test double.

use crate::error::AgentError;
use crate::models::{ExecutionRecord, ExecutionStats};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Capability interface for the execution log
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Append one execution record, stamped with the current time
    async fn record(
        &self,
        workload_id: &str,
        emissions_kg: f64,
        duration_seconds: f64,
        energy_kwh: f64,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<(), AgentError>;

    /// Chronologically ordered records within the trailing window
    async fn history(&self, workload_id: &str, days: u32) -> Result<Vec<ExecutionRecord>, AgentError>;

    /// Aggregate statistics over the trailing window; all zero when no
    /// history exists
    async fn aggregate(&self, workload_id: &str, days: u32) -> Result<ExecutionStats, AgentError>;
}

/// In-memory execution log
#[derive(Default)]
pub struct InMemoryMetricsStore {
    records: RwLock<HashMap<String, Vec<ExecutionRecord>>>,
}

impl InMemoryMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricsStore for InMemoryMetricsStore {
    async fn record(
        &self,
        workload_id: &str,
        emissions_kg: f64,
        duration_seconds: f64,
        energy_kwh: f64,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<(), AgentError> {
        let record = ExecutionRecord {
            timestamp: Utc::now(),
            emissions_kg,
            duration_seconds,
            energy_kwh,
            metadata,
        };

        let mut records = self.records.write().await;
        records
            .entry(workload_id.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn history(
        &self,
        workload_id: &str,
        days: u32,
    ) -> Result<Vec<ExecutionRecord>, AgentError> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let records = self.records.read().await;

        let mut history: Vec<ExecutionRecord> = records
            .get(workload_id)
            .map(|r| {
                r.iter()
                    .filter(|record| record.timestamp >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        history.sort_by_key(|record| record.timestamp);
        Ok(history)
    }

    async fn aggregate(&self, workload_id: &str, days: u32) -> Result<ExecutionStats, AgentError> {
        let history = self.history(workload_id, days).await?;

        if history.is_empty() {
            return Ok(ExecutionStats {
                period_days: days,
                ..ExecutionStats::default()
            });
        }

        let count = history.len() as f64;
        let total_emissions_kg: f64 = history.iter().map(|r| r.emissions_kg).sum();
        let total_energy_kwh: f64 = history.iter().map(|r| r.energy_kwh).sum();
        let total_duration: f64 = history.iter().map(|r| r.duration_seconds).sum();

        Ok(ExecutionStats {
            total_executions: history.len() as u64,
            total_emissions_kg,
            total_energy_kwh,
            avg_emissions_per_run_kg: total_emissions_kg / count,
            avg_duration_seconds: total_duration / count,
            period_days: days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_history_gives_zero_stats() {
        let store = InMemoryMetricsStore::new();

        let history = store.history("wl-none", 30).await.unwrap();
        assert!(history.is_empty());

        let stats = store.aggregate("wl-none", 30).await.unwrap();
        assert_eq!(stats.total_executions, 0);
        assert_eq!(stats.total_emissions_kg, 0.0);
        assert_eq!(stats.avg_emissions_per_run_kg, 0.0);
        assert_eq!(stats.period_days, 30);
    }

    #[tokio::test]
    async fn test_record_and_aggregate() {
        let store = InMemoryMetricsStore::new();
        store
            .record("wl-s", 0.1, 60.0, 0.2, HashMap::new())
            .await
            .unwrap();
        store
            .record("wl-s", 0.3, 120.0, 0.6, HashMap::new())
            .await
            .unwrap();

        let stats = store.aggregate("wl-s", 30).await.unwrap();
        assert_eq!(stats.total_executions, 2);
        assert!((stats.total_emissions_kg - 0.4).abs() < 1e-9);
        assert!((stats.total_energy_kwh - 0.8).abs() < 1e-9);
        assert!((stats.avg_emissions_per_run_kg - 0.2).abs() < 1e-9);
        assert!((stats.avg_duration_seconds - 90.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_history_is_chronological() {
        let store = InMemoryMetricsStore::new();
        for i in 0..5 {
            store
                .record("wl-s", 0.01 * f64::from(i), 10.0, 0.02, HashMap::new())
                .await
                .unwrap();
        }

        let history = store.history("wl-s", 30).await.unwrap();
        assert_eq!(history.len(), 5);
        for pair in history.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn test_histories_are_per_workload() {
        let store = InMemoryMetricsStore::new();
        store
            .record("wl-a", 0.1, 60.0, 0.2, HashMap::new())
            .await
            .unwrap();

        assert_eq!(store.history("wl-a", 30).await.unwrap().len(), 1);
        assert!(store.history("wl-b", 30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metadata_preserved_on_records() {
        let store = InMemoryMetricsStore::new();
        let mut metadata = HashMap::new();
        metadata.insert("model_name".to_string(), serde_json::json!("ranker"));
        store
            .record("wl-a", 0.1, 60.0, 0.2, metadata)
            .await
            .unwrap();

        let history = store.history("wl-a", 30).await.unwrap();
        assert_eq!(
            history[0].metadata.get("model_name").unwrap(),
            &serde_json::json!("ranker")
        );
    }
}
