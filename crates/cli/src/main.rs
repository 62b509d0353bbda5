//! Carbon-Aware Workload Agent CLI
//!
//! A command-line tool for registering workloads and querying carbon
//! efficiency analyses and optimization opportunities from the agent.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analysis, opportunities, workloads};

/// Carbon-Aware Workload Agent CLI
#[derive(Parser)]
#[command(name = "caw")]
#[command(author, version, about = "CLI for the Carbon-Aware Workload Agent", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via CAW_API_URL env var)
    #[arg(long, env = "CAW_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get workloads, analyses, or opportunities
    #[command(subcommand)]
    Get(GetCommands),

    /// Analyze a single workload
    Analyze {
        /// Workload id to analyze
        id: String,
    },

    /// Register a workload context
    Register {
        /// Path to a JSON workload context file
        #[arg(long, short)]
        file: String,
    },
}

#[derive(Subcommand)]
pub enum GetCommands {
    /// List registered workloads
    Workloads,

    /// Get fleet-wide analyses sorted by estimated reduction
    Analyses,

    /// Get actionable optimization opportunities
    Opportunities,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize client
    let client = client::ApiClient::new(&cli.api_url)?;

    // Execute command
    match cli.command {
        Commands::Get(get_cmd) => match get_cmd {
            GetCommands::Workloads => {
                workloads::list_workloads(&client, cli.format).await?;
            }
            GetCommands::Analyses => {
                analysis::get_analyses(&client, cli.format).await?;
            }
            GetCommands::Opportunities => {
                opportunities::get_opportunities(&client, cli.format).await?;
            }
        },
        Commands::Analyze { id } => {
            analysis::analyze_workload(&client, &id, cli.format).await?;
        }
        Commands::Register { file } => {
            workloads::register_workload(&client, &file, cli.format).await?;
        }
    }

    Ok(())
}
