//! Carbon Agent - carbon-aware execution intelligence daemon
//!
//! Scores registered AI workloads on carbon efficiency and serves
//! rule-based optimization recommendations over an HTTP API.

use anyhow::Result;
use carbon_agent_lib::{
    health::{components, HealthRegistry},
    meter::{PowerModelConfig, PowerModelMeter},
    observability::StructuredLogger,
    CarbonAgent, CarbonAgentConfig, InMemoryMetricsStore, MetricsStore,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting carbon-agent");

    // Load configuration
    let config = config::AgentConfig::load()?;
    info!(agent_name = %config.agent_name, api_port = config.api_port, "Agent configured");

    // Collaborators: power-model meter and in-memory execution log
    let meter = Arc::new(PowerModelMeter::with_config(PowerModelConfig {
        cpu_power_watts: config.cpu_power_watts,
        gpu_power_watts: config.gpu_power_watts,
        ram_power_watts: config.ram_power_watts,
        carbon_intensity_g_per_kwh: config.carbon_intensity_g_per_kwh,
    }));
    let store: Arc<dyn MetricsStore> = Arc::new(InMemoryMetricsStore::new());

    let agent = Arc::new(CarbonAgent::with_config(
        CarbonAgentConfig {
            agent_name: config.agent_name.clone(),
            history_window_days: config.history_window_days,
        },
        meter,
        store.clone(),
    ));

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::METER).await;
    health_registry.register(components::METRICS_STORE).await;
    health_registry.register(components::API).await;

    // Initialize structured logger
    let logger = StructuredLogger::new(&config.agent_name);
    logger.log_startup(AGENT_VERSION);

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(agent, store, health_registry.clone()));

    // Mark agent as ready after initialization
    health_registry.set_ready(true).await;

    // Start the API server
    let _api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
