//! Fleet-wide optimization opportunities command

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, Opportunity};
use crate::output::{
    color_ces, color_impact, color_risk, format_kg, format_percent, print_warning, OutputFormat,
};

/// Row for the opportunities table
#[derive(Tabled)]
struct OpportunityRow {
    #[tabled(rename = "Workload")]
    workload_id: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "CES")]
    ces: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Impact")]
    impact: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Reduction")]
    reduction: String,
    #[tabled(rename = "Reduction %")]
    reduction_percent: String,
}

/// List actionable opportunities across the fleet
pub async fn get_opportunities(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let opportunities: Vec<Opportunity> = client.get("api/v1/opportunities").await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&opportunities)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            if opportunities.is_empty() {
                print_warning("No optimization opportunities found");
                return Ok(());
            }

            let rows: Vec<OpportunityRow> = opportunities
                .iter()
                .map(|o| OpportunityRow {
                    workload_id: o.workload_id.clone(),
                    model: o.workload_name.clone(),
                    ces: color_ces(o.ces_score),
                    kind: o.recommendation.recommendation_type.clone(),
                    impact: color_impact(&o.recommendation.impact_level),
                    risk: color_risk(&o.recommendation.business_risk),
                    reduction: format_kg(o.recommendation.estimated_emission_reduction_kg),
                    reduction_percent: format_percent(
                        o.recommendation.estimated_emission_reduction_percent,
                    ),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} opportunities", opportunities.len());
        }
    }

    Ok(())
}
