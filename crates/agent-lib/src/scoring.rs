//! Carbon Efficiency Score (CES)
//!
//! Maps a workload context, its measured emissions per run, and an
//! estimated optimization potential to a composite 0-100 score with a full
//! component breakdown, so every score is explainable from its parts.
//! Pure computation, no side effects.

use crate::context::{CriticalityLevel, UrgencyLevel, WorkloadContext};
use serde::{Deserialize, Serialize};

/// Weight applied when a business level is missing from the calibration
/// tables. The level enums are closed today, so this is unreachable in
/// normal operation; the lookup default guards future enumeration growth.
pub const DEFAULT_LEVEL_WEIGHT: f64 = 0.5;

/// Calibrated business-value weight per criticality level
const CRITICALITY_WEIGHTS: &[(CriticalityLevel, f64)] = &[
    (CriticalityLevel::Critical, 1.0),
    (CriticalityLevel::High, 0.8),
    (CriticalityLevel::Medium, 0.6),
    (CriticalityLevel::Low, 0.4),
    (CriticalityLevel::Deferrable, 0.2),
];

/// Calibrated business-value weight per urgency level
const URGENCY_WEIGHTS: &[(UrgencyLevel, f64)] = &[
    (UrgencyLevel::RealTime, 1.0),
    (UrgencyLevel::Urgent, 0.8),
    (UrgencyLevel::Normal, 0.6),
    (UrgencyLevel::Batch, 0.4),
    (UrgencyLevel::Deferrable, 0.2),
];

/// Configuration for the CES formula
///
/// Every constant in the formula is a named field here; the defaults are
/// the calibrated values and changing them changes score semantics.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Share of business value taken from criticality (rest from urgency)
    pub criticality_share: f64,
    pub urgency_share: f64,
    /// Emissions normalization ceiling in kg per run; runs at or above the
    /// ceiling score zero on the carbon-intensity component
    pub emissions_ceiling_kg: f64,
    /// Alignment penalty slope applied per unit of over-serving ratio
    pub over_serving_penalty: f64,
    /// Fraction of optimization potential converted into a score penalty
    pub optimization_penalty_factor: f64,
    /// Composite weights (business, carbon intensity, alignment, potential)
    pub business_value_weight: f64,
    pub carbon_intensity_weight: f64,
    pub alignment_weight: f64,
    pub optimization_weight: f64,
    /// Fallback weight for levels missing from the calibration tables
    pub unknown_level_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            criticality_share: 0.6,
            urgency_share: 0.4,
            emissions_ceiling_kg: 1.0,
            over_serving_penalty: 0.5,
            optimization_penalty_factor: 0.3,
            business_value_weight: 0.4,
            carbon_intensity_weight: 0.3,
            alignment_weight: 0.2,
            optimization_weight: 0.1,
            unknown_level_weight: DEFAULT_LEVEL_WEIGHT,
        }
    }
}

/// Raw inputs echoed back with the score so the composite is auditable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CesBreakdown {
    pub criticality_weight: f64,
    pub urgency_weight: f64,
    pub emissions_per_run_kg: f64,
    pub frequency_ratio: f64,
}

/// Carbon Efficiency Score with every intermediate component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CesResult {
    /// Composite score on a 0-100 scale, rounded to 2 decimals
    pub ces_score: f64,
    pub business_value: f64,
    pub carbon_intensity_score: f64,
    pub alignment_score: f64,
    pub optimization_potential: f64,
    pub breakdown: CesBreakdown,
}

/// Computes the Carbon Efficiency Score for a workload
///
/// Stateless and reentrant; safe to share across tasks without
/// coordination.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score a workload from its context and observed emissions
    ///
    /// # Arguments
    /// * `workload` - Registered workload context
    /// * `emissions_per_run_kg` - Average emissions per execution, >= 0
    /// * `optimization_potential` - Estimated potential in [0, 1]
    ///
    /// The result stays within 0-100 for inputs inside the documented
    /// ranges; out-of-range inputs are the caller's to clamp or reject.
    pub fn score(
        &self,
        workload: &WorkloadContext,
        emissions_per_run_kg: f64,
        optimization_potential: f64,
    ) -> CesResult {
        let criticality_weight = self.criticality_weight(workload.criticality);
        let urgency_weight = self.urgency_weight(workload.urgency);

        let business_value = criticality_weight * self.config.criticality_share
            + urgency_weight * self.config.urgency_share;

        // Emissions normalized against the per-run ceiling; higher
        // emissions score lower
        let normalized_emissions =
            (emissions_per_run_kg / self.config.emissions_ceiling_kg).min(1.0);
        let carbon_intensity_score = 1.0 - normalized_emissions;

        // Schedule alignment: over-serving decays linearly with the ratio,
        // under-serving (an SLA risk) is penalized proportionally
        let frequency_ratio = workload.frequency_ratio();
        let alignment_score = if frequency_ratio >= 1.0 {
            (1.0 - (frequency_ratio - 1.0) * self.config.over_serving_penalty).max(0.0)
        } else {
            frequency_ratio
        };

        let optimization_penalty = optimization_potential * self.config.optimization_penalty_factor;

        let composite = business_value * self.config.business_value_weight
            + carbon_intensity_score * self.config.carbon_intensity_weight
            + alignment_score * self.config.alignment_weight
            + (1.0 - optimization_penalty) * self.config.optimization_weight;

        CesResult {
            ces_score: round_to(composite * 100.0, 2),
            business_value: round_to(business_value, 3),
            carbon_intensity_score: round_to(carbon_intensity_score, 3),
            alignment_score: round_to(alignment_score, 3),
            optimization_potential: round_to(optimization_potential, 3),
            breakdown: CesBreakdown {
                criticality_weight,
                urgency_weight,
                emissions_per_run_kg,
                frequency_ratio: round_to(frequency_ratio, 2),
            },
        }
    }

    fn criticality_weight(&self, level: CriticalityLevel) -> f64 {
        CRITICALITY_WEIGHTS
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, w)| *w)
            .unwrap_or(self.config.unknown_level_weight)
    }

    fn urgency_weight(&self, level: UrgencyLevel) -> f64 {
        URGENCY_WEIGHTS
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, w)| *w)
            .unwrap_or(self.config.unknown_level_weight)
    }
}

/// Round to a fixed number of decimal places for report output
pub(crate) fn round_to(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
