//! Shared data models for the carbon agent
//!
//! Execution records and stats produced by the metrics collaborator,
//! emission readings produced by the meter, and the analysis report
//! consumed by presentation layers.

use crate::context::WorkloadContext;
use crate::reasoning::Recommendation;
use crate::scoring::CesResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One recorded workload execution
///
/// Produced by the metrics collaborator; the core treats the sequence as an
/// opaque, read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub timestamp: DateTime<Utc>,
    pub emissions_kg: f64,
    pub duration_seconds: f64,
    pub energy_kwh: f64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Aggregate execution statistics over a trailing window
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionStats {
    pub total_executions: u64,
    pub total_emissions_kg: f64,
    pub total_energy_kwh: f64,
    pub avg_emissions_per_run_kg: f64,
    pub avg_duration_seconds: f64,
    pub period_days: u32,
}

/// Result of one emissions measurement window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionReading {
    pub workload_id: String,
    pub timestamp: DateTime<Utc>,
    pub emissions_kg: f64,
    pub energy_consumed_kwh: f64,
    pub duration_seconds: f64,
    pub cpu_power_watts: f64,
    pub gpu_power_watts: f64,
    pub ram_power_watts: f64,
}

/// Summary counts over a workload's recommendation list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_recommendations: usize,
    pub high_impact_count: usize,
    pub estimated_total_reduction_kg: f64,
    pub low_risk_count: usize,
}

/// Full analysis report for one workload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadAnalysis {
    pub workload_id: String,
    pub workload_name: String,
    pub analysis_timestamp: DateTime<Utc>,
    pub workload_context: WorkloadContext,
    pub execution_stats: ExecutionStats,
    pub carbon_efficiency_score: CesResult,
    /// Ordered descending by estimated emission reduction
    pub recommendations: Vec<Recommendation>,
    pub summary: AnalysisSummary,
}

/// Per-workload entry of a fleet-wide analysis
///
/// One workload's failure is embedded here instead of aborting the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Analyzed(Box<WorkloadAnalysis>),
    Failed { workload_id: String, error: String },
}

impl AnalysisOutcome {
    pub fn workload_id(&self) -> &str {
        match self {
            AnalysisOutcome::Analyzed(analysis) => &analysis.workload_id,
            AnalysisOutcome::Failed { workload_id, .. } => workload_id,
        }
    }

    /// Total estimated reduction, zero for failed entries
    pub fn estimated_total_reduction_kg(&self) -> f64 {
        match self {
            AnalysisOutcome::Analyzed(analysis) => analysis.summary.estimated_total_reduction_kg,
            AnalysisOutcome::Failed { .. } => 0.0,
        }
    }

    pub fn as_analysis(&self) -> Option<&WorkloadAnalysis> {
        match self {
            AnalysisOutcome::Analyzed(analysis) => Some(analysis),
            AnalysisOutcome::Failed { .. } => None,
        }
    }
}

/// One actionable recommendation surfaced across the fleet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationOpportunity {
    pub workload_id: String,
    pub workload_name: String,
    pub ces_score: f64,
    pub recommendation: Recommendation,
}
