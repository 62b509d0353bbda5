//! Emissions measurement seam
//!
//! The core never measures power itself; it talks to an `EmissionsMeter`
//! through a narrow start/stop capability so alternate measurement
//! backends can be substituted without touching the reasoning code. The
//! bundled `PowerModelMeter` estimates emissions from a configured power
//! draw, the measured wall-clock duration, and a grid carbon intensity.

use crate::error::AgentError;
use crate::models::EmissionReading;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::Mutex;

/// Default grid carbon intensity in g CO2 per kWh
pub const DEFAULT_CARBON_INTENSITY_G_PER_KWH: f64 = 500.0;

/// Default CPU package power draw in watts
pub const DEFAULT_CPU_POWER_WATTS: f64 = 45.0;

/// Default RAM power draw in watts
pub const DEFAULT_RAM_POWER_WATTS: f64 = 5.0;

/// Capability interface for emissions measurement
///
/// At most one measurement window may be active per workload id; starting
/// a second before stopping the first fails with `AlreadyTracking`, and
/// stopping without a window fails with `NotTracking`. Implementations own
/// all reliability concerns; the core never retries.
#[async_trait]
pub trait EmissionsMeter: Send + Sync {
    /// Open a measurement window for the workload
    async fn start(&self, workload_id: &str, label: &str) -> Result<(), AgentError>;

    /// Close the window and return what was measured
    async fn stop(&self, workload_id: &str) -> Result<EmissionReading, AgentError>;
}

/// Configuration for the power-model estimator
#[derive(Debug, Clone)]
pub struct PowerModelConfig {
    pub cpu_power_watts: f64,
    pub gpu_power_watts: f64,
    pub ram_power_watts: f64,
    /// Grid carbon intensity in g CO2 per kWh
    pub carbon_intensity_g_per_kwh: f64,
}

impl Default for PowerModelConfig {
    fn default() -> Self {
        Self {
            cpu_power_watts: DEFAULT_CPU_POWER_WATTS,
            gpu_power_watts: 0.0,
            ram_power_watts: DEFAULT_RAM_POWER_WATTS,
            carbon_intensity_g_per_kwh: DEFAULT_CARBON_INTENSITY_G_PER_KWH,
        }
    }
}

struct ActiveSession {
    label: String,
    started: Instant,
}

/// Emissions meter that estimates from a static power model
///
/// energy_kwh = total_watts * seconds / 3.6e6,
/// emissions_kg = energy_kwh * intensity_g_per_kwh / 1000.
/// Real hardware measurement is out of scope; this mirrors the estimator
/// used when no power telemetry is available.
pub struct PowerModelMeter {
    config: PowerModelConfig,
    sessions: Mutex<HashMap<String, ActiveSession>>,
}

impl PowerModelMeter {
    pub fn new() -> Self {
        Self::with_config(PowerModelConfig::default())
    }

    pub fn with_config(config: PowerModelConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn total_power_watts(&self) -> f64 {
        self.config.cpu_power_watts + self.config.gpu_power_watts + self.config.ram_power_watts
    }

    /// Estimate a reading for a known duration without an active session
    pub fn estimate(&self, workload_id: &str, duration_seconds: f64) -> EmissionReading {
        let energy_kwh = self.total_power_watts() * duration_seconds / 3_600_000.0;
        let emissions_kg = energy_kwh * self.config.carbon_intensity_g_per_kwh / 1000.0;

        EmissionReading {
            workload_id: workload_id.to_string(),
            timestamp: Utc::now(),
            emissions_kg,
            energy_consumed_kwh: energy_kwh,
            duration_seconds,
            cpu_power_watts: self.config.cpu_power_watts,
            gpu_power_watts: self.config.gpu_power_watts,
            ram_power_watts: self.config.ram_power_watts,
        }
    }
}

impl Default for PowerModelMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmissionsMeter for PowerModelMeter {
    async fn start(&self, workload_id: &str, label: &str) -> Result<(), AgentError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(workload_id) {
            return Err(AgentError::AlreadyTracking {
                workload_id: workload_id.to_string(),
            });
        }

        tracing::debug!(workload_id = %workload_id, label = %label, "Measurement window opened");
        sessions.insert(
            workload_id.to_string(),
            ActiveSession {
                label: label.to_string(),
                started: Instant::now(),
            },
        );
        Ok(())
    }

    async fn stop(&self, workload_id: &str) -> Result<EmissionReading, AgentError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .remove(workload_id)
            .ok_or_else(|| AgentError::NotTracking {
                workload_id: workload_id.to_string(),
            })?;

        let duration_seconds = session.started.elapsed().as_secs_f64();
        let reading = self.estimate(workload_id, duration_seconds);
        tracing::debug!(
            workload_id = %workload_id,
            label = %session.label,
            duration_seconds = duration_seconds,
            emissions_kg = reading.emissions_kg,
            "Measurement window closed"
        );
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_stop_produces_reading() {
        let meter = PowerModelMeter::new();
        meter.start("wl-m", "test-run").await.unwrap();
        let reading = meter.stop("wl-m").await.unwrap();

        assert_eq!(reading.workload_id, "wl-m");
        assert!(reading.duration_seconds >= 0.0);
        assert!(reading.emissions_kg >= 0.0);
    }

    #[tokio::test]
    async fn test_double_start_fails_with_already_tracking() {
        let meter = PowerModelMeter::new();
        meter.start("wl-m", "first").await.unwrap();

        let err = meter.start("wl-m", "second").await.unwrap_err();
        assert!(matches!(err, AgentError::AlreadyTracking { .. }));

        // The original window is still usable
        assert!(meter.stop("wl-m").await.is_ok());
    }

    #[tokio::test]
    async fn test_stop_without_start_fails_with_not_tracking() {
        let meter = PowerModelMeter::new();
        let err = meter.stop("wl-m").await.unwrap_err();
        assert!(matches!(err, AgentError::NotTracking { .. }));
    }

    #[tokio::test]
    async fn test_sessions_are_per_workload() {
        let meter = PowerModelMeter::new();
        meter.start("wl-a", "a").await.unwrap();
        meter.start("wl-b", "b").await.unwrap();

        assert!(meter.stop("wl-a").await.is_ok());
        assert!(meter.stop("wl-b").await.is_ok());
    }

    #[test]
    fn test_power_model_math() {
        let meter = PowerModelMeter::with_config(PowerModelConfig {
            cpu_power_watts: 100.0,
            gpu_power_watts: 250.0,
            ram_power_watts: 10.0,
            carbon_intensity_g_per_kwh: 500.0,
        });

        // 360 W for one hour = 0.36 kWh = 0.18 kg at 500 g/kWh
        let reading = meter.estimate("wl-m", 3600.0);
        assert!((reading.energy_consumed_kwh - 0.36).abs() < 1e-9);
        assert!((reading.emissions_kg - 0.18).abs() < 1e-9);
    }
}
