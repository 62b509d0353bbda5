//! Recommendation rules

use super::recommendation::{
    BusinessRisk, ConfidenceLevel, ImpactLevel, Recommendation, RecommendationType,
};
use crate::context::{CriticalityLevel, UrgencyLevel, WorkloadContext};
use crate::models::ExecutionRecord;
use crate::scoring::round_to;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;

/// Thresholds and heuristic fractions used by the rules
///
/// Defaults are the calibrated values; overriding them changes which
/// recommendations surface and how they are tiered.
#[derive(Debug, Clone)]
pub struct RuleThresholds {
    /// Frequency recommendations below this reduction percentage are not
    /// worth surfacing
    pub min_reduction_percent: f64,
    /// SLA margin above which a frequency change is low risk
    pub low_risk_margin: f64,
    /// SLA margin above which a frequency change is medium risk; at or
    /// below it the change is high risk and suppressed
    pub medium_risk_margin: f64,
    /// Reduction percentage tiers for impact classification
    pub significant_impact_percent: f64,
    pub moderate_impact_percent: f64,
    /// Assumed emission reduction from shifting into a low-carbon window
    pub time_shift_fraction: f64,
    /// Assumed emission reduction from a resource-utilization review
    pub resource_review_fraction: f64,
    /// Minimum run duration before a GPU workload warrants a review
    pub resource_review_min_duration_secs: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            min_reduction_percent: 10.0,
            low_risk_margin: 0.3,
            medium_risk_margin: 0.1,
            significant_impact_percent: 30.0,
            moderate_impact_percent: 15.0,
            time_shift_fraction: 0.15,
            resource_review_fraction: 0.10,
            resource_review_min_duration_secs: 300.0,
        }
    }
}

/// Generates ranked, explainable recommendations for a workload
///
/// Stateless and reentrant; rules never mutate their inputs and every
/// emitted recommendation is immutable.
#[derive(Debug, Clone, Default)]
pub struct ReasoningEngine {
    thresholds: RuleThresholds,
}

impl ReasoningEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    /// Analyze a workload and return recommendations sorted descending by
    /// estimated emission reduction
    ///
    /// Rules are evaluated independently; all that fire are emitted. When
    /// none fire, a single no-action recommendation is returned, so the
    /// result is never empty. Ties keep rule-evaluation order (frequency,
    /// time shift, resource, no-action). The execution history is accepted
    /// for future history-aware rules; the current rule set derives
    /// everything from the context and the per-run average.
    pub fn analyze(
        &self,
        workload: &WorkloadContext,
        emissions_per_run_kg: f64,
        _history: Option<&[ExecutionRecord]>,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        if workload.is_over_serving() {
            if let Some(rec) = self.frequency_rule(workload, emissions_per_run_kg) {
                recommendations.push(rec);
            }
        }

        if matches!(
            workload.urgency,
            UrgencyLevel::Batch | UrgencyLevel::Deferrable
        ) && workload.criticality != CriticalityLevel::Critical
        {
            recommendations.push(self.time_shift_rule(workload, emissions_per_run_kg));
        }

        if workload.gpu_required
            && workload.estimated_duration_seconds > self.thresholds.resource_review_min_duration_secs
        {
            recommendations.push(self.resource_rule(workload, emissions_per_run_kg));
        }

        if recommendations.is_empty() {
            recommendations.push(self.no_action(workload));
        }

        // Stable sort keeps rule-evaluation order for equal reductions
        recommendations.sort_by(|a, b| {
            b.estimated_emission_reduction_kg
                .partial_cmp(&a.estimated_emission_reduction_kg)
                .unwrap_or(Ordering::Equal)
        });

        recommendations
    }

    /// Frequency rule: align the execution interval with the SLA-required
    /// minimum. Suppressed when the saving is marginal or the SLA margin
    /// leaves no room for error.
    fn frequency_rule(
        &self,
        workload: &WorkloadContext,
        emissions_per_run_kg: f64,
    ) -> Option<Recommendation> {
        let current_frequency = workload.current_frequency_hours;
        let optimal_frequency = workload.required_frequency_hours;
        if current_frequency <= 0.0 {
            // No finite per-day execution count to reason about
            return None;
        }

        let executions_per_day_current = 24.0 / current_frequency;
        let executions_per_day_optimal = 24.0 / optimal_frequency;
        let reduction_per_day = executions_per_day_current - executions_per_day_optimal;

        let emission_reduction_per_day = reduction_per_day * emissions_per_run_kg;
        let reduction_percent = reduction_per_day / executions_per_day_current * 100.0;

        // Risk from the slack the SLA window leaves beyond the required
        // interval
        let sla_margin = if workload.sla_window_hours > 0.0 {
            (workload.sla_window_hours - optimal_frequency) / workload.sla_window_hours
        } else {
            0.0
        };
        let business_risk = if sla_margin > self.thresholds.low_risk_margin {
            BusinessRisk::Low
        } else if sla_margin > self.thresholds.medium_risk_margin {
            BusinessRisk::Medium
        } else {
            BusinessRisk::High
        };

        // Not worth surfacing, or too risky to suggest automatically
        if reduction_percent < self.thresholds.min_reduction_percent
            || business_risk == BusinessRisk::High
        {
            return None;
        }

        let impact_level = if reduction_percent > self.thresholds.significant_impact_percent {
            ImpactLevel::Significant
        } else if reduction_percent > self.thresholds.moderate_impact_percent {
            ImpactLevel::Moderate
        } else {
            ImpactLevel::Minor
        };

        let confidence = if business_risk == BusinessRisk::Low {
            ConfidenceLevel::High
        } else {
            ConfidenceLevel::Medium
        };

        Some(Recommendation {
            workload_id: workload.workload_id.clone(),
            recommendation_type: RecommendationType::ReduceFrequency,
            title: format!("Optimize Execution Frequency for {}", workload.model_name),
            description: format!(
                "Current execution frequency exceeds business requirements. \
                 Adjusting from {current_frequency}h to {optimal_frequency}h interval \
                 would maintain SLA compliance while reducing emissions."
            ),
            rationale: format!(
                "The workload currently runs every {current_frequency} hours, but the \
                 business SLA only requires execution within {} hours. Aligning the \
                 frequency with the requirement reduces emissions without impacting \
                 service levels.",
                workload.sla_window_hours
            ),
            current_state: object(json!({
                "frequency_hours": current_frequency,
                "executions_per_day": round_to(executions_per_day_current, 1),
                "emissions_per_day_kg":
                    round_to(executions_per_day_current * emissions_per_run_kg, 4),
            })),
            recommended_action: object(json!({
                "frequency_hours": optimal_frequency,
                "executions_per_day": round_to(executions_per_day_optimal, 1),
                "new_schedule": format!("every_{optimal_frequency}_hours"),
            })),
            estimated_emission_reduction_kg: round_to(emission_reduction_per_day, 4),
            estimated_emission_reduction_percent: round_to(reduction_percent, 1),
            business_risk,
            confidence,
            impact_level,
            prerequisites: vec![
                "Validate SLA requirements are accurate".to_string(),
                "Confirm business stakeholders approve frequency change".to_string(),
            ],
            implementation_steps: vec![
                format!("Update scheduler configuration to {optimal_frequency}h interval"),
                "Monitor execution for 1 week in test environment".to_string(),
                "Validate SLA compliance metrics".to_string(),
                "Deploy to production after validation".to_string(),
            ],
        })
    }

    /// Time-shift rule: deferrable work can move into a low-carbon window.
    /// A fixed-fraction heuristic stands in for real grid-intensity data,
    /// so the estimate does not vary with workload specifics beyond
    /// eligibility.
    fn time_shift_rule(
        &self,
        workload: &WorkloadContext,
        emissions_per_run_kg: f64,
    ) -> Recommendation {
        let fraction = self.thresholds.time_shift_fraction;

        Recommendation {
            workload_id: workload.workload_id.clone(),
            recommendation_type: RecommendationType::TimeShift,
            title: format!("Consider Time-Shifting {}", workload.model_name),
            description: "This deferrable workload could be shifted to off-peak hours \
                          when grid carbon intensity is typically lower."
                .to_string(),
            rationale: "The workload has flexibility in execution timing. Shifting to \
                        off-peak hours (typically 2-6 AM) can reduce carbon intensity by \
                        10-20% depending on regional grid mix."
                .to_string(),
            current_state: object(json!({
                "current_schedule": workload.current_schedule,
                "flexibility": "high",
            })),
            recommended_action: object(json!({
                "suggested_time": "off_peak_hours",
                "estimated_carbon_intensity_reduction": "10-20%",
            })),
            estimated_emission_reduction_kg: round_to(emissions_per_run_kg * fraction, 4),
            estimated_emission_reduction_percent: round_to(fraction * 100.0, 1),
            business_risk: BusinessRisk::Low,
            confidence: ConfidenceLevel::Medium,
            impact_level: ImpactLevel::Moderate,
            prerequisites: vec![
                "Verify workload can be deferred without business impact".to_string(),
                "Check regional grid carbon intensity patterns".to_string(),
            ],
            implementation_steps: vec![
                "Identify optimal time window based on grid data".to_string(),
                "Update scheduler to preferred time slot".to_string(),
                "Monitor for any business impact".to_string(),
            ],
        }
    }

    /// Resource rule: long-running GPU workloads warrant a utilization
    /// review with a fixed-fraction estimated saving.
    fn resource_rule(
        &self,
        workload: &WorkloadContext,
        emissions_per_run_kg: f64,
    ) -> Recommendation {
        let fraction = self.thresholds.resource_review_fraction;

        Recommendation {
            workload_id: workload.workload_id.clone(),
            recommendation_type: RecommendationType::OptimizeResources,
            title: format!("Review Resource Allocation for {}", workload.model_name),
            description: "Long-running workload may benefit from a resource optimization \
                          review."
                .to_string(),
            rationale: format!(
                "The workload runs for {}s and uses GPU resources. A review of resource \
                 allocation could identify optimization opportunities.",
                workload.estimated_duration_seconds
            ),
            current_state: object(json!({
                "duration_seconds": workload.estimated_duration_seconds,
                "gpu_required": workload.gpu_required,
                "memory_gb": workload.memory_gb,
            })),
            recommended_action: object(json!({
                "action": "review_resource_allocation",
                "suggested_review_areas": ["GPU utilization", "Memory allocation", "Batch sizing"],
            })),
            estimated_emission_reduction_kg: round_to(emissions_per_run_kg * fraction, 4),
            estimated_emission_reduction_percent: round_to(fraction * 100.0, 1),
            business_risk: BusinessRisk::Low,
            confidence: ConfidenceLevel::Low,
            impact_level: ImpactLevel::Minor,
            prerequisites: vec![
                "Collect detailed resource utilization metrics".to_string(),
                "Profile workload performance characteristics".to_string(),
            ],
            implementation_steps: vec![
                "Run resource profiling analysis".to_string(),
                "Identify optimization opportunities".to_string(),
                "Test optimized configuration".to_string(),
                "Deploy if validated".to_string(),
            ],
        }
    }

    /// Fallback when no rule fires: the execution pattern already matches
    /// the business requirements.
    fn no_action(&self, workload: &WorkloadContext) -> Recommendation {
        Recommendation {
            workload_id: workload.workload_id.clone(),
            recommendation_type: RecommendationType::NoAction,
            title: format!("No Optimization Recommended for {}", workload.model_name),
            description: "Current execution pattern appears well-optimized for business \
                          requirements."
                .to_string(),
            rationale: "The workload execution frequency aligns with business requirements \
                        and the workload has appropriate criticality and urgency levels. No \
                        immediate optimization opportunities identified."
                .to_string(),
            current_state: object(json!({
                "frequency_alignment": "good",
                "criticality": workload.criticality,
                "urgency": workload.urgency,
            })),
            recommended_action: object(json!({
                "action": "maintain_current_configuration",
            })),
            estimated_emission_reduction_kg: 0.0,
            estimated_emission_reduction_percent: 0.0,
            business_risk: BusinessRisk::None,
            confidence: ConfidenceLevel::High,
            impact_level: ImpactLevel::Minor,
            prerequisites: Vec::new(),
            implementation_steps: vec![
                "Continue monitoring for future optimization opportunities".to_string(),
            ],
        }
    }
}

/// Extract the object map from a `json!({...})` literal
fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
