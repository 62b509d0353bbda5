//! Workload context record and derived predicates

use crate::error::AgentError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Business criticality of a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalityLevel {
    Critical,
    High,
    Medium,
    Low,
    Deferrable,
}

/// Execution urgency of a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    RealTime,
    Urgent,
    Normal,
    Batch,
    Deferrable,
}

impl fmt::Display for CriticalityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CriticalityLevel::Critical => "critical",
            CriticalityLevel::High => "high",
            CriticalityLevel::Medium => "medium",
            CriticalityLevel::Low => "low",
            CriticalityLevel::Deferrable => "deferrable",
        };
        f.write_str(s)
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UrgencyLevel::RealTime => "real_time",
            UrgencyLevel::Urgent => "urgent",
            UrgencyLevel::Normal => "normal",
            UrgencyLevel::Batch => "batch",
            UrgencyLevel::Deferrable => "deferrable",
        };
        f.write_str(s)
    }
}

/// Context information for an AI workload
///
/// Created once at registration and treated as read-only afterwards;
/// re-registering the same id replaces the previous context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadContext {
    pub workload_id: String,
    pub model_name: String,
    pub description: String,

    // Business context
    pub criticality: CriticalityLevel,
    pub urgency: UrgencyLevel,

    // SLA terms
    /// Maximum tolerable delay before results go stale
    pub sla_window_hours: f64,
    /// Minimum acceptable execution interval implied by the SLA
    pub required_frequency_hours: f64,

    // Observed schedule
    pub current_frequency_hours: f64,
    /// Free-text schedule label, e.g. "every_1_hour", "daily_at_2am"
    pub current_schedule: String,

    // Resource profile
    pub estimated_duration_seconds: f64,
    #[serde(default = "default_cpu_cores")]
    pub cpu_cores: u32,
    #[serde(default)]
    pub gpu_required: bool,
    #[serde(default = "default_memory_gb")]
    pub memory_gb: f64,

    /// Open metadata attached at registration
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_cpu_cores() -> u32 {
    1
}

fn default_memory_gb() -> f64 {
    4.0
}

impl WorkloadContext {
    /// Start building a context with the defaults filled in
    pub fn builder(workload_id: impl Into<String>) -> WorkloadContextBuilder {
        WorkloadContextBuilder::new(workload_id)
    }

    /// True when the workload runs more often than the SLA requires,
    /// i.e. cycles (and emissions) are being spent beyond the requirement
    pub fn is_over_serving(&self) -> bool {
        self.current_frequency_hours < self.required_frequency_hours
    }

    /// Ratio of required to current execution interval
    ///
    /// Values above 1.0 indicate over-serving. Returns `f64::INFINITY`
    /// when the current interval is zero; callers must treat that as the
    /// maximal over-serving sentinel, never as a finite ratio.
    pub fn frequency_ratio(&self) -> f64 {
        if self.current_frequency_hours == 0.0 {
            return f64::INFINITY;
        }
        self.required_frequency_hours / self.current_frequency_hours
    }

    /// Check the documented invariants: hour/second/GB quantities must be
    /// non-negative and the required interval strictly positive (the
    /// frequency ratio divides by it).
    pub fn validate(&self) -> Result<(), AgentError> {
        let fail = |reason: &str| {
            Err(AgentError::InvalidWorkload {
                workload_id: self.workload_id.clone(),
                reason: reason.to_string(),
            })
        };

        if self.workload_id.is_empty() {
            return fail("workload_id must not be empty");
        }
        if self.required_frequency_hours <= 0.0 {
            return fail("required_frequency_hours must be positive");
        }
        if self.sla_window_hours < 0.0 {
            return fail("sla_window_hours must be non-negative");
        }
        if self.current_frequency_hours < 0.0 {
            return fail("current_frequency_hours must be non-negative");
        }
        if self.estimated_duration_seconds < 0.0 {
            return fail("estimated_duration_seconds must be non-negative");
        }
        if self.memory_gb < 0.0 {
            return fail("memory_gb must be non-negative");
        }
        Ok(())
    }
}

/// Builder for `WorkloadContext` with the resource-profile defaults
/// (1 CPU core, no GPU, 4 GB memory, empty metadata)
#[derive(Debug, Clone)]
pub struct WorkloadContextBuilder {
    context: WorkloadContext,
}

impl WorkloadContextBuilder {
    pub fn new(workload_id: impl Into<String>) -> Self {
        Self {
            context: WorkloadContext {
                workload_id: workload_id.into(),
                model_name: String::new(),
                description: String::new(),
                criticality: CriticalityLevel::Medium,
                urgency: UrgencyLevel::Normal,
                sla_window_hours: 0.0,
                required_frequency_hours: 1.0,
                current_frequency_hours: 1.0,
                current_schedule: String::new(),
                estimated_duration_seconds: 0.0,
                cpu_cores: default_cpu_cores(),
                gpu_required: false,
                memory_gb: default_memory_gb(),
                metadata: HashMap::new(),
            },
        }
    }

    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.context.model_name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.context.description = description.into();
        self
    }

    pub fn criticality(mut self, criticality: CriticalityLevel) -> Self {
        self.context.criticality = criticality;
        self
    }

    pub fn urgency(mut self, urgency: UrgencyLevel) -> Self {
        self.context.urgency = urgency;
        self
    }

    pub fn sla_window_hours(mut self, hours: f64) -> Self {
        self.context.sla_window_hours = hours;
        self
    }

    pub fn required_frequency_hours(mut self, hours: f64) -> Self {
        self.context.required_frequency_hours = hours;
        self
    }

    pub fn current_frequency_hours(mut self, hours: f64) -> Self {
        self.context.current_frequency_hours = hours;
        self
    }

    pub fn current_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.context.current_schedule = schedule.into();
        self
    }

    pub fn estimated_duration_seconds(mut self, seconds: f64) -> Self {
        self.context.estimated_duration_seconds = seconds;
        self
    }

    pub fn cpu_cores(mut self, cores: u32) -> Self {
        self.context.cpu_cores = cores;
        self
    }

    pub fn gpu_required(mut self, required: bool) -> Self {
        self.context.gpu_required = required;
        self
    }

    pub fn memory_gb(mut self, gb: f64) -> Self {
        self.context.memory_gb = gb;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.metadata.insert(key.into(), value);
        self
    }

    pub fn build(self) -> WorkloadContext {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context(current: f64, required: f64) -> WorkloadContext {
        WorkloadContext::builder("wl-1")
            .model_name("churn-predictor")
            .criticality(CriticalityLevel::Medium)
            .urgency(UrgencyLevel::Normal)
            .sla_window_hours(6.0)
            .required_frequency_hours(required)
            .current_frequency_hours(current)
            .current_schedule("every_1_hour")
            .estimated_duration_seconds(120.0)
            .build()
    }

    #[test]
    fn test_over_serving_iff_current_below_required() {
        assert!(sample_context(1.0, 4.0).is_over_serving());
        assert!(!sample_context(4.0, 4.0).is_over_serving());
        assert!(!sample_context(6.0, 4.0).is_over_serving());
    }

    #[test]
    fn test_frequency_ratio() {
        let ctx = sample_context(1.0, 4.0);
        assert!((ctx.frequency_ratio() - 4.0).abs() < f64::EPSILON);

        let matched = sample_context(4.0, 4.0);
        assert!((matched.frequency_ratio() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_frequency_ratio_zero_current_is_sentinel() {
        let ctx = sample_context(0.0, 4.0);
        assert!(ctx.frequency_ratio().is_infinite());
        // Running "never" counts as over-serving of the interval predicate
        assert!(ctx.is_over_serving());
    }

    #[test]
    fn test_validate_rejects_zero_required_frequency() {
        let ctx = sample_context(1.0, 0.0);
        assert!(matches!(
            ctx.validate(),
            Err(AgentError::InvalidWorkload { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_quantities() {
        let mut ctx = sample_context(1.0, 4.0);
        ctx.memory_gb = -1.0;
        assert!(ctx.validate().is_err());

        let mut ctx = sample_context(1.0, 4.0);
        ctx.estimated_duration_seconds = -5.0;
        assert!(ctx.validate().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let ctx = WorkloadContext::builder("wl-2").build();
        assert_eq!(ctx.cpu_cores, 1);
        assert!(!ctx.gpu_required);
        assert!((ctx.memory_gb - 4.0).abs() < f64::EPSILON);
        assert!(ctx.metadata.is_empty());
    }

    #[test]
    fn test_level_wire_form_is_snake_case() {
        let json = serde_json::to_string(&UrgencyLevel::RealTime).unwrap();
        assert_eq!(json, "\"real_time\"");
        let back: CriticalityLevel = serde_json::from_str("\"deferrable\"").unwrap();
        assert_eq!(back, CriticalityLevel::Deferrable);
    }
}
