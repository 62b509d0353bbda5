//! Observability infrastructure for the carbon agent
//!
//! Provides:
//! - Prometheus metrics (analysis latency, recommendation and tracking
//!   counters, emission/energy totals, registry gauges)
//! - Structured event logging with tracing

use prometheus::{
    register_counter, register_histogram, register_int_counter, register_int_gauge, Counter,
    Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for analysis latency (seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AgentMetricsInner> = OnceLock::new();

struct AgentMetricsInner {
    analysis_latency_seconds: Histogram,
    analyses_total: IntCounter,
    analysis_failures_total: IntCounter,
    recommendations_total: IntCounter,
    executions_tracked_total: IntCounter,
    tracking_failures_total: IntCounter,
    emissions_recorded_kg_total: Counter,
    energy_recorded_kwh_total: Counter,
    workloads_registered: IntGauge,
    active_measurements: IntGauge,
}

impl AgentMetricsInner {
    fn new() -> Self {
        Self {
            analysis_latency_seconds: register_histogram!(
                "carbon_agent_analysis_latency_seconds",
                "Time spent scoring a workload and generating recommendations",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register analysis_latency_seconds"),

            analyses_total: register_int_counter!(
                "carbon_agent_analyses_total",
                "Total number of workload analyses performed"
            )
            .expect("Failed to register analyses_total"),

            analysis_failures_total: register_int_counter!(
                "carbon_agent_analysis_failures_total",
                "Total number of workload analyses that failed"
            )
            .expect("Failed to register analysis_failures_total"),

            recommendations_total: register_int_counter!(
                "carbon_agent_recommendations_total",
                "Total number of recommendations generated"
            )
            .expect("Failed to register recommendations_total"),

            executions_tracked_total: register_int_counter!(
                "carbon_agent_executions_tracked_total",
                "Total number of workload executions tracked to completion"
            )
            .expect("Failed to register executions_tracked_total"),

            tracking_failures_total: register_int_counter!(
                "carbon_agent_tracking_failures_total",
                "Total number of tracked executions whose unit of work failed"
            )
            .expect("Failed to register tracking_failures_total"),

            emissions_recorded_kg_total: register_counter!(
                "carbon_agent_emissions_recorded_kg_total",
                "Cumulative CO2 emissions recorded across tracked executions, in kg"
            )
            .expect("Failed to register emissions_recorded_kg_total"),

            energy_recorded_kwh_total: register_counter!(
                "carbon_agent_energy_recorded_kwh_total",
                "Cumulative energy recorded across tracked executions, in kWh"
            )
            .expect("Failed to register energy_recorded_kwh_total"),

            workloads_registered: register_int_gauge!(
                "carbon_agent_workloads_registered",
                "Number of workload contexts currently registered"
            )
            .expect("Failed to register workloads_registered"),

            active_measurements: register_int_gauge!(
                "carbon_agent_active_measurements",
                "Number of currently open emissions measurement windows"
            )
            .expect("Failed to register active_measurements"),
        }
    }
}

/// Agent metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct AgentMetrics {
    _private: (),
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMetrics {
    /// Create a new metrics handle (initializes the global set if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AgentMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_analysis_latency(&self, duration_secs: f64) {
        self.inner().analysis_latency_seconds.observe(duration_secs);
    }

    pub fn inc_analyses(&self) {
        self.inner().analyses_total.inc();
    }

    pub fn inc_analysis_failures(&self) {
        self.inner().analysis_failures_total.inc();
    }

    pub fn add_recommendations(&self, count: u64) {
        self.inner().recommendations_total.inc_by(count);
    }

    pub fn inc_executions_tracked(&self) {
        self.inner().executions_tracked_total.inc();
    }

    pub fn inc_tracking_failures(&self) {
        self.inner().tracking_failures_total.inc();
    }

    pub fn add_recorded_emissions(&self, emissions_kg: f64, energy_kwh: f64) {
        self.inner().emissions_recorded_kg_total.inc_by(emissions_kg);
        self.inner().energy_recorded_kwh_total.inc_by(energy_kwh);
    }

    pub fn set_workloads_registered(&self, count: i64) {
        self.inner().workloads_registered.set(count);
    }

    pub fn inc_active_measurements(&self) {
        self.inner().active_measurements.inc();
    }

    pub fn dec_active_measurements(&self) {
        self.inner().active_measurements.dec();
    }
}

/// Structured logger for agent events
///
/// Emits consistently tagged records for registrations, analyses, and
/// tracked executions so downstream log pipelines can key on `event`.
#[derive(Clone)]
pub struct StructuredLogger {
    agent_name: String,
}

impl StructuredLogger {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
        }
    }

    pub fn log_registration(&self, workload_id: &str, model_name: &str, criticality: &str) {
        info!(
            event = "workload_registered",
            agent = %self.agent_name,
            workload_id = %workload_id,
            model_name = %model_name,
            criticality = %criticality,
            "Workload registered"
        );
    }

    pub fn log_analysis(
        &self,
        workload_id: &str,
        ces_score: f64,
        recommendation_count: usize,
        estimated_total_reduction_kg: f64,
    ) {
        info!(
            event = "workload_analyzed",
            agent = %self.agent_name,
            workload_id = %workload_id,
            ces_score = ces_score,
            recommendation_count = recommendation_count,
            estimated_total_reduction_kg = estimated_total_reduction_kg,
            "Workload analyzed"
        );
    }

    pub fn log_execution_tracked(
        &self,
        workload_id: &str,
        emissions_kg: f64,
        energy_kwh: f64,
        duration_seconds: f64,
    ) {
        info!(
            event = "execution_tracked",
            agent = %self.agent_name,
            workload_id = %workload_id,
            emissions_kg = emissions_kg,
            energy_kwh = energy_kwh,
            duration_seconds = duration_seconds,
            "Execution tracked"
        );
    }

    pub fn log_tracking_failure(&self, workload_id: &str, error: &str) {
        warn!(
            event = "execution_failed",
            agent = %self.agent_name,
            workload_id = %workload_id,
            error = %error,
            "Tracked execution failed; no record written"
        );
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "agent_started",
            agent = %self.agent_name,
            agent_version = %version,
            "Carbon agent started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            agent = %self.agent_name,
            reason = %reason,
            "Carbon agent shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handle_is_usable() {
        // Metrics share one process-global registry; exercise the full
        // handle surface once.
        let metrics = AgentMetrics::new();
        metrics.observe_analysis_latency(0.002);
        metrics.inc_analyses();
        metrics.inc_analysis_failures();
        metrics.add_recommendations(3);
        metrics.inc_executions_tracked();
        metrics.inc_tracking_failures();
        metrics.add_recorded_emissions(0.25, 0.5);
        metrics.set_workloads_registered(4);
        metrics.inc_active_measurements();
        metrics.dec_active_measurements();
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-agent");
        assert_eq!(logger.agent_name, "test-agent");
    }
}
