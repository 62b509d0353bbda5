//! Agent configuration

use anyhow::Result;
use serde::Deserialize;

/// Agent configuration, loaded from `CARBON_AGENT_*` environment
/// variables with sensible defaults
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Agent name stamped on structured log events
    #[serde(default = "default_agent_name")]
    pub agent_name: String,

    /// API server port for workload/analysis endpoints and probes
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Trailing window for history and aggregate stats, in days
    #[serde(default = "default_history_window_days")]
    pub history_window_days: u32,

    /// Power-model meter: CPU package draw in watts
    #[serde(default = "default_cpu_power_watts")]
    pub cpu_power_watts: f64,

    /// Power-model meter: GPU draw in watts (0 when no GPU is attached)
    #[serde(default)]
    pub gpu_power_watts: f64,

    /// Power-model meter: RAM draw in watts
    #[serde(default = "default_ram_power_watts")]
    pub ram_power_watts: f64,

    /// Grid carbon intensity in g CO2 per kWh
    #[serde(default = "default_carbon_intensity")]
    pub carbon_intensity_g_per_kwh: f64,
}

fn default_agent_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "carbon-agent".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_history_window_days() -> u32 {
    30
}

fn default_cpu_power_watts() -> f64 {
    carbon_agent_lib::meter::DEFAULT_CPU_POWER_WATTS
}

fn default_ram_power_watts() -> f64 {
    carbon_agent_lib::meter::DEFAULT_RAM_POWER_WATTS
}

fn default_carbon_intensity() -> f64 {
    carbon_agent_lib::meter::DEFAULT_CARBON_INTENSITY_G_PER_KWH
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_name: default_agent_name(),
            api_port: default_api_port(),
            history_window_days: default_history_window_days(),
            cpu_power_watts: default_cpu_power_watts(),
            gpu_power_watts: 0.0,
            ram_power_watts: default_ram_power_watts(),
            carbon_intensity_g_per_kwh: default_carbon_intensity(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("CARBON_AGENT"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.history_window_days, 30);
        assert_eq!(config.gpu_power_watts, 0.0);
        assert!(config.carbon_intensity_g_per_kwh > 0.0);
    }
}
