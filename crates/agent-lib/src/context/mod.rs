//! Workload context model and registry
//!
//! A `WorkloadContext` captures the business and resource metadata the
//! reasoning core needs to judge whether a workload's execution pattern is
//! justified: criticality, urgency, SLA terms, the observed schedule, and
//! the resource profile. The `ContextStore` is the in-memory registry of
//! contexts keyed by workload id.

mod store;
mod workload;

pub use store::ContextStore;
pub use workload::{CriticalityLevel, UrgencyLevel, WorkloadContext, WorkloadContextBuilder};
