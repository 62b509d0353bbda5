//! Analysis commands: single workload and fleet-wide

use anyhow::Result;
use tabled::Tabled;

use crate::client::{AnalysisEntry, ApiClient, WorkloadAnalysis};
use crate::output::{
    color_ces, color_confidence, color_impact, color_risk, format_kg, format_percent,
    print_warning, OutputFormat,
};

/// Row for the fleet analyses table
#[derive(Tabled)]
struct AnalysisRow {
    #[tabled(rename = "Workload")]
    workload_id: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "CES")]
    ces: String,
    #[tabled(rename = "Runs (30d)")]
    runs: String,
    #[tabled(rename = "Recs")]
    recommendations: String,
    #[tabled(rename = "Est. Reduction")]
    reduction: String,
}

/// Row for a workload's recommendations table
#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Impact")]
    impact: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Reduction")]
    reduction: String,
    #[tabled(rename = "Reduction %")]
    reduction_percent: String,
}

/// Analyze a single workload and render the full report
pub async fn analyze_workload(client: &ApiClient, id: &str, format: OutputFormat) -> Result<()> {
    let path = format!("api/v1/workloads/{}/analysis", id);
    let analysis: WorkloadAnalysis = client.get(&path).await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&analysis)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            println!(
                "Workload: {} ({})",
                analysis.workload_id, analysis.workload_name
            );
            println!(
                "Carbon Efficiency Score: {}",
                color_ces(analysis.carbon_efficiency_score.ces_score)
            );
            println!(
                "  business value {:.3} | carbon intensity {:.3} | alignment {:.3} | potential {:.3}",
                analysis.carbon_efficiency_score.business_value,
                analysis.carbon_efficiency_score.carbon_intensity_score,
                analysis.carbon_efficiency_score.alignment_score,
                analysis.carbon_efficiency_score.optimization_potential,
            );
            println!(
                "Executions: {} over {} days, avg {} per run",
                analysis.execution_stats.total_executions,
                analysis.execution_stats.period_days,
                format_kg(analysis.execution_stats.avg_emissions_per_run_kg),
            );

            let rows: Vec<RecommendationRow> = analysis
                .recommendations
                .iter()
                .map(|r| RecommendationRow {
                    kind: r.recommendation_type.clone(),
                    impact: color_impact(&r.impact_level),
                    risk: color_risk(&r.business_risk),
                    confidence: color_confidence(&r.confidence),
                    reduction: format_kg(r.estimated_emission_reduction_kg),
                    reduction_percent: format_percent(r.estimated_emission_reduction_percent),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("\n{}", table);

            for rec in &analysis.recommendations {
                println!("\n{}", rec.title);
                println!("  {}", rec.rationale);
            }
        }
    }

    Ok(())
}

/// Fleet-wide analyses sorted by total estimated reduction
pub async fn get_analyses(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let entries: Vec<AnalysisEntry> = client.get("api/v1/analyses").await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&entries)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            if entries.is_empty() {
                print_warning("No workloads registered");
                return Ok(());
            }

            let mut rows = Vec::new();
            let mut failures = Vec::new();
            for entry in &entries {
                match entry {
                    AnalysisEntry::Analyzed(analysis) => rows.push(AnalysisRow {
                        workload_id: analysis.workload_id.clone(),
                        model: analysis.workload_name.clone(),
                        ces: color_ces(analysis.carbon_efficiency_score.ces_score),
                        runs: analysis.execution_stats.total_executions.to_string(),
                        recommendations: analysis.summary.total_recommendations.to_string(),
                        reduction: format_kg(analysis.summary.estimated_total_reduction_kg),
                    }),
                    AnalysisEntry::Failed { workload_id, error } => {
                        failures.push((workload_id.clone(), error.clone()));
                    }
                }
            }

            if !rows.is_empty() {
                let table = tabled::Table::new(rows)
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                println!("{}", table);
            }

            for (workload_id, error) in failures {
                print_warning(&format!("{workload_id}: analysis failed: {error}"));
            }
        }
    }

    Ok(())
}
