//! Core library for the carbon-aware workload agent
//!
//! This crate provides the reasoning core and its seams:
//! - Workload context model and in-memory registry
//! - Carbon Efficiency Score computation
//! - Rule-based recommendation generation
//! - Orchestration over an emissions meter and a metrics store
//! - Health checks and observability
//!
//! The scoring and reasoning engines are pure functions over their
//! inputs; the meter and store are narrow capability traits so alternate
//! measurement or storage backends can be substituted without touching
//! the reasoning code.

pub mod agent;
pub mod context;
pub mod error;
pub mod health;
pub mod meter;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod reasoning;
pub mod scoring;

pub use agent::{CarbonAgent, CarbonAgentConfig, TrackedExecution};
pub use context::{
    ContextStore, CriticalityLevel, UrgencyLevel, WorkloadContext, WorkloadContextBuilder,
};
pub use error::AgentError;
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse};
pub use meter::{EmissionsMeter, PowerModelConfig, PowerModelMeter};
pub use metrics::{InMemoryMetricsStore, MetricsStore};
pub use models::*;
pub use observability::{AgentMetrics, StructuredLogger};
pub use reasoning::{
    BusinessRisk, ConfidenceLevel, ImpactLevel, ReasoningEngine, Recommendation,
    RecommendationType, RuleThresholds,
};
pub use scoring::{CesResult, ScoringConfig, ScoringEngine};
