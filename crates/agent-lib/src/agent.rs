//! Carbon-aware agent orchestrator
//!
//! Composes the context store, scoring engine, and reasoning engine with
//! the two external collaborators (emissions meter, metrics store) to
//! produce per-workload and fleet-wide analyses and to track executions.

use crate::context::{ContextStore, WorkloadContext};
use crate::error::AgentError;
use crate::meter::EmissionsMeter;
use crate::metrics::MetricsStore;
use crate::models::{
    AnalysisOutcome, AnalysisSummary, EmissionReading, OptimizationOpportunity, WorkloadAnalysis,
};
use crate::observability::{AgentMetrics, StructuredLogger};
use crate::reasoning::{BusinessRisk, ImpactLevel, ReasoningEngine};
use crate::scoring::ScoringEngine;
use chrono::Utc;
use std::cmp::Ordering;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct CarbonAgentConfig {
    /// Name stamped on structured log events
    pub agent_name: String,
    /// Trailing window used for history and aggregate stats
    pub history_window_days: u32,
}

impl Default for CarbonAgentConfig {
    fn default() -> Self {
        Self {
            agent_name: "carbon-agent".to_string(),
            history_window_days: 30,
        }
    }
}

/// Result of a tracked execution: the unit's own result plus what the
/// meter measured around it
#[derive(Debug)]
pub struct TrackedExecution<T> {
    pub workload_id: String,
    pub result: T,
    pub emissions: EmissionReading,
}

/// Carbon-aware execution intelligence agent
///
/// The scoring and reasoning engines are pure; the context store and the
/// collaborators are the only shared state, serialized behind their own
/// locks so per-workload writes cannot interleave.
pub struct CarbonAgent {
    config: CarbonAgentConfig,
    contexts: RwLock<ContextStore>,
    scoring: ScoringEngine,
    reasoning: ReasoningEngine,
    meter: Arc<dyn EmissionsMeter>,
    store: Arc<dyn MetricsStore>,
    metrics: AgentMetrics,
    logger: StructuredLogger,
}

impl CarbonAgent {
    pub fn new(meter: Arc<dyn EmissionsMeter>, store: Arc<dyn MetricsStore>) -> Self {
        Self::with_config(CarbonAgentConfig::default(), meter, store)
    }

    pub fn with_config(
        config: CarbonAgentConfig,
        meter: Arc<dyn EmissionsMeter>,
        store: Arc<dyn MetricsStore>,
    ) -> Self {
        let logger = StructuredLogger::new(config.agent_name.clone());
        Self {
            config,
            contexts: RwLock::new(ContextStore::new()),
            scoring: ScoringEngine::new(),
            reasoning: ReasoningEngine::new(),
            meter,
            store,
            metrics: AgentMetrics::new(),
            logger,
        }
    }

    /// Override the default scoring engine (custom weight configuration)
    pub fn with_scoring(mut self, scoring: ScoringEngine) -> Self {
        self.scoring = scoring;
        self
    }

    /// Override the default reasoning engine (custom rule thresholds)
    pub fn with_reasoning(mut self, reasoning: ReasoningEngine) -> Self {
        self.reasoning = reasoning;
        self
    }

    /// Register a workload context, replacing any previous registration
    /// under the same id
    pub async fn register_workload(&self, context: WorkloadContext) -> Result<(), AgentError> {
        context.validate()?;

        self.logger.log_registration(
            &context.workload_id,
            &context.model_name,
            &context.criticality.to_string(),
        );

        let mut contexts = self.contexts.write().await;
        contexts.register(context);
        self.metrics.set_workloads_registered(contexts.len() as i64);
        Ok(())
    }

    /// Look up a registered workload context
    pub async fn workload(&self, workload_id: &str) -> Result<WorkloadContext, AgentError> {
        self.contexts
            .read()
            .await
            .get(workload_id)
            .cloned()
            .ok_or_else(|| AgentError::WorkloadNotFound {
                workload_id: workload_id.to_string(),
            })
    }

    /// All registered workload ids
    pub async fn list_workloads(&self) -> Vec<String> {
        self.contexts.read().await.list_ids()
    }

    /// Workloads that are over-serving while neither critical nor real-time
    pub async fn optimization_candidates(&self) -> Vec<WorkloadContext> {
        self.contexts
            .read()
            .await
            .optimization_candidates()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Analyze one workload: pull its history, score it, and generate
    /// ranked recommendations
    ///
    /// An empty execution history yields zero-valued stats, not an error;
    /// an unregistered id or a store failure does fail.
    pub async fn analyze(&self, workload_id: &str) -> Result<WorkloadAnalysis, AgentError> {
        match self.analyze_inner(workload_id).await {
            Ok(analysis) => Ok(analysis),
            Err(err) => {
                self.metrics.inc_analysis_failures();
                Err(err)
            }
        }
    }

    async fn analyze_inner(&self, workload_id: &str) -> Result<WorkloadAnalysis, AgentError> {
        let started = Instant::now();
        let workload = self.workload(workload_id).await?;

        let window = self.config.history_window_days;
        let history = self.store.history(workload_id, window).await?;
        let stats = self.store.aggregate(workload_id, window).await?;

        // Average per run from the aggregates, recomputed from raw history
        // when a backend returns a zero average alongside records
        let mut emissions_per_run = stats.avg_emissions_per_run_kg;
        if emissions_per_run == 0.0 && !history.is_empty() {
            emissions_per_run =
                history.iter().map(|r| r.emissions_kg).sum::<f64>() / history.len() as f64;
        }

        let optimization_potential = if workload.is_over_serving() {
            ((workload.frequency_ratio() - 1.0) * 0.5).min(1.0)
        } else {
            0.0
        };

        let ces = self
            .scoring
            .score(&workload, emissions_per_run, optimization_potential);
        let recommendations =
            self.reasoning
                .analyze(&workload, emissions_per_run, Some(history.as_slice()));

        let summary = AnalysisSummary {
            total_recommendations: recommendations.len(),
            high_impact_count: recommendations
                .iter()
                .filter(|r| r.impact_level == ImpactLevel::Significant)
                .count(),
            estimated_total_reduction_kg: recommendations
                .iter()
                .map(|r| r.estimated_emission_reduction_kg)
                .sum(),
            low_risk_count: recommendations
                .iter()
                .filter(|r| r.business_risk == BusinessRisk::Low)
                .count(),
        };

        self.metrics
            .observe_analysis_latency(started.elapsed().as_secs_f64());
        self.metrics.inc_analyses();
        self.metrics
            .add_recommendations(recommendations.len() as u64);
        self.logger.log_analysis(
            workload_id,
            ces.ces_score,
            recommendations.len(),
            summary.estimated_total_reduction_kg,
        );

        Ok(WorkloadAnalysis {
            workload_id: workload.workload_id.clone(),
            workload_name: workload.model_name.clone(),
            analysis_timestamp: Utc::now(),
            workload_context: workload,
            execution_stats: stats,
            carbon_efficiency_score: ces,
            recommendations,
            summary,
        })
    }

    /// Run a unit of work inside an emissions measurement window and
    /// record the result
    ///
    /// The meter is stopped even when the unit fails; a failure to stop is
    /// logged and swallowed so it cannot mask the unit's own error, which
    /// is returned unchanged. Nothing is recorded for failed runs.
    pub async fn track_execution<T, F, Fut>(
        &self,
        workload_id: &str,
        unit: F,
    ) -> Result<TrackedExecution<T>, AgentError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let workload = self.workload(workload_id).await?;

        self.meter.start(workload_id, &workload.model_name).await?;
        self.metrics.inc_active_measurements();

        let outcome = unit().await;
        let result = match outcome {
            Ok(result) => result,
            Err(unit_err) => {
                // Best-effort cleanup; the unit's error wins
                if let Err(stop_err) = self.meter.stop(workload_id).await {
                    tracing::warn!(
                        workload_id = %workload_id,
                        error = %stop_err,
                        "Failed to stop meter after unit failure"
                    );
                }
                self.metrics.dec_active_measurements();
                self.metrics.inc_tracking_failures();
                self.logger
                    .log_tracking_failure(workload_id, &unit_err.to_string());
                return Err(AgentError::Other(unit_err));
            }
        };

        let reading = self.meter.stop(workload_id).await;
        self.metrics.dec_active_measurements();
        let reading = reading?;

        let mut metadata = std::collections::HashMap::new();
        metadata.insert(
            "model_name".to_string(),
            serde_json::json!(workload.model_name),
        );
        metadata.insert(
            "criticality".to_string(),
            serde_json::json!(workload.criticality),
        );

        self.store
            .record(
                workload_id,
                reading.emissions_kg,
                reading.duration_seconds,
                reading.energy_consumed_kwh,
                metadata,
            )
            .await?;

        self.metrics.inc_executions_tracked();
        self.metrics
            .add_recorded_emissions(reading.emissions_kg, reading.energy_consumed_kwh);
        self.logger.log_execution_tracked(
            workload_id,
            reading.emissions_kg,
            reading.energy_consumed_kwh,
            reading.duration_seconds,
        );

        Ok(TrackedExecution {
            workload_id: workload_id.to_string(),
            result,
            emissions: reading,
        })
    }

    /// Analyze every registered workload, embedding per-workload failures
    /// instead of aborting the batch; sorted descending by total estimated
    /// reduction
    pub async fn all_analyses(&self) -> Vec<AnalysisOutcome> {
        let ids = self.list_workloads().await;
        let mut outcomes = Vec::with_capacity(ids.len());

        for workload_id in ids {
            match self.analyze(&workload_id).await {
                Ok(analysis) => outcomes.push(AnalysisOutcome::Analyzed(Box::new(analysis))),
                Err(err) => {
                    tracing::warn!(
                        workload_id = %workload_id,
                        error = %err,
                        "Workload analysis failed; continuing with remaining workloads"
                    );
                    outcomes.push(AnalysisOutcome::Failed {
                        workload_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        outcomes.sort_by(|a, b| {
            b.estimated_total_reduction_kg()
                .partial_cmp(&a.estimated_total_reduction_kg())
                .unwrap_or(Ordering::Equal)
        });
        outcomes
    }

    /// Actionable recommendations across the fleet: impact at least
    /// moderate and risk at most medium, sorted descending by reduction
    pub async fn optimization_opportunities(&self) -> Vec<OptimizationOpportunity> {
        let mut opportunities = Vec::new();

        for outcome in self.all_analyses().await {
            let Some(analysis) = outcome.as_analysis() else {
                continue;
            };
            for rec in &analysis.recommendations {
                let actionable_impact = matches!(
                    rec.impact_level,
                    ImpactLevel::Significant | ImpactLevel::Moderate
                );
                let acceptable_risk =
                    matches!(rec.business_risk, BusinessRisk::Low | BusinessRisk::Medium);
                if actionable_impact && acceptable_risk {
                    opportunities.push(OptimizationOpportunity {
                        workload_id: analysis.workload_id.clone(),
                        workload_name: analysis.workload_name.clone(),
                        ces_score: analysis.carbon_efficiency_score.ces_score,
                        recommendation: rec.clone(),
                    });
                }
            }
        }

        opportunities.sort_by(|a, b| {
            b.recommendation
                .estimated_emission_reduction_kg
                .partial_cmp(&a.recommendation.estimated_emission_reduction_kg)
                .unwrap_or(Ordering::Equal)
        });
        opportunities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CriticalityLevel, UrgencyLevel, WorkloadContext};
    use crate::error::AgentError;
    use crate::meter::PowerModelMeter;
    use crate::metrics::{InMemoryMetricsStore, MetricsStore};
    use crate::models::{ExecutionRecord, ExecutionStats};
    use crate::reasoning::RecommendationType;
    use async_trait::async_trait;
    use std::collections::HashMap;

    fn over_serving_context(id: &str) -> WorkloadContext {
        WorkloadContext::builder(id)
            .model_name(format!("{id}-model"))
            .criticality(CriticalityLevel::Medium)
            .urgency(UrgencyLevel::Normal)
            .sla_window_hours(8.0)
            .required_frequency_hours(4.0)
            .current_frequency_hours(1.0)
            .current_schedule("every_1_hour")
            .estimated_duration_seconds(60.0)
            .build()
    }

    fn aligned_context(id: &str) -> WorkloadContext {
        WorkloadContext::builder(id)
            .model_name(format!("{id}-model"))
            .criticality(CriticalityLevel::Medium)
            .urgency(UrgencyLevel::Normal)
            .sla_window_hours(8.0)
            .required_frequency_hours(4.0)
            .current_frequency_hours(4.0)
            .build()
    }

    fn agent_with_defaults() -> (CarbonAgent, Arc<InMemoryMetricsStore>) {
        let store = Arc::new(InMemoryMetricsStore::new());
        let agent = CarbonAgent::new(Arc::new(PowerModelMeter::new()), store.clone());
        (agent, store)
    }

    /// Store whose reads fail for one workload id, to exercise the
    /// partial-failure path of fleet analysis
    struct FailingStore {
        inner: InMemoryMetricsStore,
        failing_id: String,
    }

    #[async_trait]
    impl MetricsStore for FailingStore {
        async fn record(
            &self,
            workload_id: &str,
            emissions_kg: f64,
            duration_seconds: f64,
            energy_kwh: f64,
            metadata: HashMap<String, serde_json::Value>,
        ) -> Result<(), AgentError> {
            self.inner
                .record(workload_id, emissions_kg, duration_seconds, energy_kwh, metadata)
                .await
        }

        async fn history(
            &self,
            workload_id: &str,
            days: u32,
        ) -> Result<Vec<ExecutionRecord>, AgentError> {
            if workload_id == self.failing_id {
                return Err(AgentError::Other(anyhow::anyhow!("backend offline")));
            }
            self.inner.history(workload_id, days).await
        }

        async fn aggregate(
            &self,
            workload_id: &str,
            days: u32,
        ) -> Result<ExecutionStats, AgentError> {
            if workload_id == self.failing_id {
                return Err(AgentError::Other(anyhow::anyhow!("backend offline")));
            }
            self.inner.aggregate(workload_id, days).await
        }
    }

    #[tokio::test]
    async fn test_analyze_unknown_workload_fails_not_found() {
        let (agent, _) = agent_with_defaults();
        let err = agent.analyze("wl-ghost").await.unwrap_err();
        assert!(matches!(err, AgentError::WorkloadNotFound { .. }));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_context() {
        let (agent, _) = agent_with_defaults();
        let mut ctx = aligned_context("wl-bad");
        ctx.required_frequency_hours = 0.0;
        let err = agent.register_workload(ctx).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidWorkload { .. }));
    }

    #[tokio::test]
    async fn test_analyze_with_empty_history_gives_zero_stats() {
        let (agent, _) = agent_with_defaults();
        agent
            .register_workload(aligned_context("wl-fresh"))
            .await
            .unwrap();

        let analysis = agent.analyze("wl-fresh").await.unwrap();
        assert_eq!(analysis.execution_stats.total_executions, 0);
        assert_eq!(analysis.execution_stats.avg_emissions_per_run_kg, 0.0);
        // A report is still produced, with the no-action fallback
        assert_eq!(analysis.recommendations.len(), 1);
        assert_eq!(
            analysis.recommendations[0].recommendation_type,
            RecommendationType::NoAction
        );
        assert!(analysis.carbon_efficiency_score.ces_score > 0.0);
    }

    #[tokio::test]
    async fn test_analyze_over_serving_sets_optimization_potential() {
        let (agent, _) = agent_with_defaults();
        agent
            .register_workload(over_serving_context("wl-over"))
            .await
            .unwrap();

        let analysis = agent.analyze("wl-over").await.unwrap();
        // ratio 4 -> potential min(1, 1.5) = 1.0
        assert!(
            (analysis.carbon_efficiency_score.optimization_potential - 1.0).abs() < 1e-9
        );

        let aligned = agent.register_workload(aligned_context("wl-even")).await;
        aligned.unwrap();
        let analysis = agent.analyze("wl-even").await.unwrap();
        assert_eq!(analysis.carbon_efficiency_score.optimization_potential, 0.0);
    }

    #[tokio::test]
    async fn test_analyze_uses_recorded_history() {
        let (agent, store) = agent_with_defaults();
        agent
            .register_workload(over_serving_context("wl-hist"))
            .await
            .unwrap();
        for _ in 0..4 {
            store
                .record("wl-hist", 0.02, 60.0, 0.04, HashMap::new())
                .await
                .unwrap();
        }

        let analysis = agent.analyze("wl-hist").await.unwrap();
        assert_eq!(analysis.execution_stats.total_executions, 4);

        let freq = analysis
            .recommendations
            .iter()
            .find(|r| r.recommendation_type == RecommendationType::ReduceFrequency)
            .expect("frequency rule should fire from recorded emissions");
        // 18 fewer runs/day at the recorded 0.02 kg average
        assert!((freq.estimated_emission_reduction_kg - 0.36).abs() < 1e-9);

        assert_eq!(analysis.summary.total_recommendations, analysis.recommendations.len());
        assert_eq!(analysis.summary.high_impact_count, 1);
        assert_eq!(analysis.summary.low_risk_count, 1);
    }

    #[tokio::test]
    async fn test_track_execution_records_successful_run() {
        let (agent, store) = agent_with_defaults();
        agent
            .register_workload(aligned_context("wl-run"))
            .await
            .unwrap();

        let tracked = agent
            .track_execution("wl-run", || async { Ok::<_, anyhow::Error>(42) })
            .await
            .unwrap();

        assert_eq!(tracked.result, 42);
        assert_eq!(tracked.workload_id, "wl-run");

        let history = store.history("wl-run", 30).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(
            history[0].metadata.get("model_name").unwrap(),
            &serde_json::json!("wl-run-model")
        );
        assert_eq!(
            history[0].metadata.get("criticality").unwrap(),
            &serde_json::json!("medium")
        );
    }

    #[tokio::test]
    async fn test_track_execution_unknown_workload() {
        let (agent, _) = agent_with_defaults();
        let err = agent
            .track_execution("wl-ghost", || async { Ok::<_, anyhow::Error>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::WorkloadNotFound { .. }));
    }

    #[tokio::test]
    async fn test_track_execution_failure_stops_meter_and_records_nothing() {
        let meter = Arc::new(PowerModelMeter::new());
        let store = Arc::new(InMemoryMetricsStore::new());
        let agent = CarbonAgent::new(meter.clone(), store.clone());
        agent
            .register_workload(aligned_context("wl-fail"))
            .await
            .unwrap();

        let err = agent
            .track_execution("wl-fail", || async {
                Err::<(), _>(anyhow::anyhow!("CUDA out of memory"))
            })
            .await
            .unwrap_err();

        // The unit's own error propagates unchanged
        assert_eq!(err.to_string(), "CUDA out of memory");

        // Nothing written for the failed run
        assert!(store.history("wl-fail", 30).await.unwrap().is_empty());

        // The meter session was cleaned up: a fresh start succeeds
        assert!(meter.start("wl-fail", "again").await.is_ok());
        meter.stop("wl-fail").await.unwrap();
    }

    #[tokio::test]
    async fn test_track_execution_double_start_surfaces_already_tracking() {
        let meter = Arc::new(PowerModelMeter::new());
        let store = Arc::new(InMemoryMetricsStore::new());
        let agent = CarbonAgent::new(meter.clone(), store);
        agent
            .register_workload(aligned_context("wl-busy"))
            .await
            .unwrap();

        // An external session is already open for this workload
        meter.start("wl-busy", "external").await.unwrap();

        let err = agent
            .track_execution("wl-busy", || async { Ok::<_, anyhow::Error>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::AlreadyTracking { .. }));
    }

    #[tokio::test]
    async fn test_all_analyses_embeds_failures_and_sorts() {
        let store = Arc::new(FailingStore {
            inner: InMemoryMetricsStore::new(),
            failing_id: "wl-broken".to_string(),
        });
        let agent = CarbonAgent::new(Arc::new(PowerModelMeter::new()), store.clone());

        agent
            .register_workload(over_serving_context("wl-big"))
            .await
            .unwrap();
        agent
            .register_workload(aligned_context("wl-quiet"))
            .await
            .unwrap();
        agent
            .register_workload(aligned_context("wl-broken"))
            .await
            .unwrap();
        store
            .record("wl-big", 0.05, 60.0, 0.1, HashMap::new())
            .await
            .unwrap();

        let outcomes = agent.all_analyses().await;
        assert_eq!(outcomes.len(), 3);

        // Failure embedded, not fatal
        let failed: Vec<_> = outcomes
            .iter()
            .filter(|o| matches!(o, AnalysisOutcome::Failed { .. }))
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].workload_id(), "wl-broken");

        // Descending by total estimated reduction; the over-serving
        // workload with real emissions leads
        assert_eq!(outcomes[0].workload_id(), "wl-big");
        for pair in outcomes.windows(2) {
            assert!(
                pair[0].estimated_total_reduction_kg() >= pair[1].estimated_total_reduction_kg()
            );
        }
    }

    #[tokio::test]
    async fn test_optimization_opportunities_filters_and_sorts() {
        let (agent, store) = agent_with_defaults();

        agent
            .register_workload(over_serving_context("wl-opt"))
            .await
            .unwrap();
        // Aligned, normal workload only produces no-action (minor impact),
        // which must not surface as an opportunity
        agent
            .register_workload(aligned_context("wl-fine"))
            .await
            .unwrap();
        store
            .record("wl-opt", 0.1, 60.0, 0.2, HashMap::new())
            .await
            .unwrap();

        let opportunities = agent.optimization_opportunities().await;
        assert!(!opportunities.is_empty());
        assert!(opportunities.iter().all(|o| o.workload_id == "wl-opt"));
        assert!(opportunities.iter().all(|o| {
            matches!(
                o.recommendation.impact_level,
                ImpactLevel::Significant | ImpactLevel::Moderate
            ) && matches!(
                o.recommendation.business_risk,
                BusinessRisk::Low | BusinessRisk::Medium
            )
        }));
        for pair in opportunities.windows(2) {
            assert!(
                pair[0].recommendation.estimated_emission_reduction_kg
                    >= pair[1].recommendation.estimated_emission_reduction_kg
            );
        }
    }

    #[tokio::test]
    async fn test_optimization_candidates_passthrough() {
        let (agent, _) = agent_with_defaults();
        agent
            .register_workload(over_serving_context("wl-cand"))
            .await
            .unwrap();
        agent
            .register_workload(aligned_context("wl-not"))
            .await
            .unwrap();

        let candidates = agent.optimization_candidates().await;
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].workload_id, "wl-cand");
    }
}
