//! Recommendation model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of optimization being recommended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    ReduceFrequency,
    DeferExecution,
    OptimizeResources,
    TimeShift,
    NoAction,
}

/// Business risk of applying a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessRisk {
    None,
    Low,
    Medium,
    High,
}

/// Confidence in a recommendation's estimated impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

/// Magnitude tier of the estimated impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Significant,
    Moderate,
    Minor,
}

impl fmt::Display for BusinessRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BusinessRisk::None => "none",
            BusinessRisk::Low => "low",
            BusinessRisk::Medium => "medium",
            BusinessRisk::High => "high",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImpactLevel::Significant => "significant",
            ImpactLevel::Moderate => "moderate",
            ImpactLevel::Minor => "minor",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        };
        f.write_str(s)
    }
}

/// A carbon-aware execution recommendation
///
/// Fully self-explanatory: the rationale states the numeric comparison
/// that drove the rule, and current/recommended state are concrete
/// before/after snapshots. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub workload_id: String,
    pub recommendation_type: RecommendationType,
    pub title: String,
    pub description: String,
    pub rationale: String,

    /// Snapshot of the relevant state before the change
    pub current_state: Map<String, Value>,
    /// Snapshot of the proposed state after the change
    pub recommended_action: Map<String, Value>,

    pub estimated_emission_reduction_kg: f64,
    pub estimated_emission_reduction_percent: f64,
    pub business_risk: BusinessRisk,
    pub confidence: ConfidenceLevel,
    pub impact_level: ImpactLevel,

    pub prerequisites: Vec<String>,
    pub implementation_steps: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_forms() {
        assert_eq!(
            serde_json::to_string(&RecommendationType::ReduceFrequency).unwrap(),
            "\"reduce_frequency\""
        );
        assert_eq!(
            serde_json::to_string(&BusinessRisk::None).unwrap(),
            "\"none\""
        );
        assert_eq!(
            serde_json::to_string(&ImpactLevel::Significant).unwrap(),
            "\"significant\""
        );
        assert_eq!(
            serde_json::to_string(&ConfidenceLevel::Medium).unwrap(),
            "\"medium\""
        );
    }
}
