//! Workload registration and listing commands

use anyhow::{Context, Result};
use tabled::Tabled;

use crate::client::{ApiClient, RegisterResponse, WorkloadList};
use crate::output::{print_success, print_warning, OutputFormat};

/// Row for the workload list table
#[derive(Tabled)]
struct WorkloadRow {
    #[tabled(rename = "Workload ID")]
    workload_id: String,
}

/// List registered workload ids
pub async fn list_workloads(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: WorkloadList = client.get("api/v1/workloads").await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            if result.workloads.is_empty() {
                print_warning("No workloads registered");
                return Ok(());
            }

            let rows: Vec<WorkloadRow> = result
                .workloads
                .iter()
                .map(|id| WorkloadRow {
                    workload_id: id.clone(),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} workloads", result.total);
        }
    }

    Ok(())
}

/// Register a workload from a JSON context file
pub async fn register_workload(client: &ApiClient, file: &str, format: OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read workload file {file}"))?;
    let context: serde_json::Value =
        serde_json::from_str(&content).context("Workload file is not valid JSON")?;

    let response: RegisterResponse = client.post("api/v1/workloads", &context).await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&response)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            print_success(&format!("Workload {} registered", response.workload_id));
        }
    }

    Ok(())
}
