//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
#[allow(dead_code)]
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(&items) {
                println!("{}", json);
            }
        }
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Format an emission quantity in kg CO2
pub fn format_kg(kg: f64) -> String {
    if kg >= 1.0 {
        format!("{:.2} kg", kg)
    } else {
        format!("{:.1} g", kg * 1000.0)
    }
}

/// Format a percentage
pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}

/// Color a CES score: the higher, the greener
pub fn color_ces(score: f64) -> String {
    let formatted = format!("{:.1}", score);
    if score >= 70.0 {
        formatted.green().to_string()
    } else if score >= 40.0 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color a business-risk label
pub fn color_risk(risk: &str) -> String {
    match risk {
        "none" | "low" => risk.green().to_string(),
        "medium" => risk.yellow().to_string(),
        "high" => risk.red().to_string(),
        _ => risk.to_string(),
    }
}

/// Color an impact-level label
pub fn color_impact(impact: &str) -> String {
    match impact {
        "significant" => impact.green().bold().to_string(),
        "moderate" => impact.yellow().to_string(),
        "minor" => impact.to_string(),
        _ => impact.to_string(),
    }
}

/// Color a confidence label
pub fn color_confidence(confidence: &str) -> String {
    match confidence {
        "high" => confidence.green().to_string(),
        "medium" => confidence.yellow().to_string(),
        "low" => confidence.red().to_string(),
        _ => confidence.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_kg_switches_units() {
        assert_eq!(format_kg(2.5), "2.50 kg");
        assert_eq!(format_kg(0.0421), "42.1 g");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(12.34), "12.3%");
    }
}
