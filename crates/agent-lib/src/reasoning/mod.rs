//! Rule-based reasoning over workload contexts and observed emissions
//!
//! Turns workload metadata plus measured emissions into a ranked list of
//! self-explanatory recommendations. Four rules are evaluated
//! independently (frequency reduction, time shift, resource review,
//! no-action fallback); all that fire are emitted, sorted by estimated
//! emission reduction.

mod engine;
mod recommendation;

pub use engine::{ReasoningEngine, RuleThresholds};
pub use recommendation::{
    BusinessRisk, ConfidenceLevel, ImpactLevel, Recommendation, RecommendationType,
};
