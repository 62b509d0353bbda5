//! API client for communicating with the carbon agent

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// HTTP client for the agent API
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadList {
    pub workloads: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub workload_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub workload_id: String,
    pub recommendation_type: String,
    pub title: String,
    pub description: String,
    pub rationale: String,
    pub current_state: serde_json::Value,
    pub recommended_action: serde_json::Value,
    pub estimated_emission_reduction_kg: f64,
    pub estimated_emission_reduction_percent: f64,
    pub business_risk: String,
    pub confidence: String,
    pub impact_level: String,
    pub prerequisites: Vec<String>,
    pub implementation_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CesResult {
    pub ces_score: f64,
    pub business_value: f64,
    pub carbon_intensity_score: f64,
    pub alignment_score: f64,
    pub optimization_potential: f64,
    pub breakdown: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStats {
    pub total_executions: u64,
    pub total_emissions_kg: f64,
    pub total_energy_kwh: f64,
    pub avg_emissions_per_run_kg: f64,
    pub avg_duration_seconds: f64,
    pub period_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_recommendations: usize,
    pub high_impact_count: usize,
    pub estimated_total_reduction_kg: f64,
    pub low_risk_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadAnalysis {
    pub workload_id: String,
    pub workload_name: String,
    pub analysis_timestamp: String,
    pub workload_context: serde_json::Value,
    pub execution_stats: ExecutionStats,
    pub carbon_efficiency_score: CesResult,
    pub recommendations: Vec<Recommendation>,
    pub summary: AnalysisSummary,
}

/// Fleet analysis entry: either a full analysis or an embedded failure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisEntry {
    Analyzed(Box<WorkloadAnalysis>),
    Failed { workload_id: String, error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub workload_id: String,
    pub workload_name: String,
    pub ces_score: f64,
    pub recommendation: Recommendation,
}
