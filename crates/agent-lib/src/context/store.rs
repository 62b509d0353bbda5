//! In-memory registry of workload contexts

use super::{CriticalityLevel, UrgencyLevel, WorkloadContext};
use std::collections::HashMap;

/// Registry of workload contexts keyed by workload id
///
/// Owns every registered context exclusively. Registration is structural
/// insert-or-replace; invariant checks happen at the orchestrator before a
/// context reaches the store.
#[derive(Debug, Default)]
pub struct ContextStore {
    workloads: HashMap<String, WorkloadContext>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the context for its workload id
    pub fn register(&mut self, context: WorkloadContext) {
        self.workloads.insert(context.workload_id.clone(), context);
    }

    /// Look up a context by workload id
    pub fn get(&self, workload_id: &str) -> Option<&WorkloadContext> {
        self.workloads.get(workload_id)
    }

    /// All registered workload ids
    pub fn list_ids(&self) -> Vec<String> {
        self.workloads.keys().cloned().collect()
    }

    /// Number of registered workloads
    pub fn len(&self) -> usize {
        self.workloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty()
    }

    /// Contexts matching the given criticality level
    pub fn by_criticality(&self, level: CriticalityLevel) -> Vec<&WorkloadContext> {
        self.workloads
            .values()
            .filter(|w| w.criticality == level)
            .collect()
    }

    /// Workloads that are safe to reconsider: over-serving their SLA while
    /// neither business-critical nor real-time
    pub fn optimization_candidates(&self) -> Vec<&WorkloadContext> {
        self.workloads
            .values()
            .filter(|w| {
                w.is_over_serving()
                    && w.criticality != CriticalityLevel::Critical
                    && w.urgency != UrgencyLevel::RealTime
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(
        id: &str,
        criticality: CriticalityLevel,
        urgency: UrgencyLevel,
        current: f64,
        required: f64,
    ) -> WorkloadContext {
        WorkloadContext::builder(id)
            .model_name(format!("{id}-model"))
            .criticality(criticality)
            .urgency(urgency)
            .sla_window_hours(8.0)
            .required_frequency_hours(required)
            .current_frequency_hours(current)
            .build()
    }

    #[test]
    fn test_register_and_get() {
        let mut store = ContextStore::new();
        store.register(context(
            "wl-a",
            CriticalityLevel::Medium,
            UrgencyLevel::Normal,
            1.0,
            4.0,
        ));

        assert!(store.get("wl-a").is_some());
        assert!(store.get("wl-missing").is_none());
        assert_eq!(store.list_ids(), vec!["wl-a".to_string()]);
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut store = ContextStore::new();
        store.register(context(
            "wl-a",
            CriticalityLevel::Medium,
            UrgencyLevel::Normal,
            1.0,
            4.0,
        ));
        store.register(context(
            "wl-a",
            CriticalityLevel::Critical,
            UrgencyLevel::Normal,
            1.0,
            4.0,
        ));

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get("wl-a").unwrap().criticality,
            CriticalityLevel::Critical
        );
    }

    #[test]
    fn test_by_criticality() {
        let mut store = ContextStore::new();
        store.register(context(
            "wl-a",
            CriticalityLevel::Critical,
            UrgencyLevel::RealTime,
            1.0,
            1.0,
        ));
        store.register(context(
            "wl-b",
            CriticalityLevel::Low,
            UrgencyLevel::Batch,
            1.0,
            4.0,
        ));

        let critical = store.by_criticality(CriticalityLevel::Critical);
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].workload_id, "wl-a");
    }

    #[test]
    fn test_optimization_candidates_excludes_critical_and_real_time() {
        let mut store = ContextStore::new();
        // Over-serving but critical
        store.register(context(
            "wl-critical",
            CriticalityLevel::Critical,
            UrgencyLevel::Normal,
            1.0,
            4.0,
        ));
        // Over-serving but real-time
        store.register(context(
            "wl-realtime",
            CriticalityLevel::Low,
            UrgencyLevel::RealTime,
            1.0,
            4.0,
        ));
        // Over-serving and safe to reconsider
        store.register(context(
            "wl-candidate",
            CriticalityLevel::Low,
            UrgencyLevel::Batch,
            1.0,
            4.0,
        ));
        // Perfectly aligned
        store.register(context(
            "wl-aligned",
            CriticalityLevel::Low,
            UrgencyLevel::Batch,
            4.0,
            4.0,
        ));

        let candidates = store.optimization_candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].workload_id, "wl-candidate");
    }
}
