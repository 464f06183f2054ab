//! Dealbook CLI - Trading desk exports and year-end dashboard
//!
//! Usage:
//!   dealbook export --kind payments     Export a sheet to JSON
//!   dealbook preview                    Show the first rows of a sheet
//!   dealbook push --url URL             POST a sheet to a webhook
//!   dealbook report clients -s FILE     Print one dashboard section
//!   dealbook dashboard -s FILE          Print the whole dashboard
//!   dealbook serve --port 3000          Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use clap::Parser;
use dealbook_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Export {
            kind,
            sheet,
            workbook,
            output,
            metadata,
        } => commands::cmd_export(
            &config,
            &kind,
            sheet.as_deref(),
            workbook.as_deref(),
            output.as_deref(),
            metadata,
        ),
        Commands::Preview {
            sheet,
            workbook,
            rows,
        } => commands::cmd_preview(&config, &sheet, workbook.as_deref(), rows),
        Commands::Push {
            url,
            sheet,
            workbook,
        } => commands::cmd_push(&config, &url, &sheet, workbook.as_deref()).await,
        Commands::Report {
            source,
            report_type,
        } => {
            let (snapshot, options) = commands::load_snapshot(&config, &source).await?;
            match report_type {
                ReportType::Hero => commands::cmd_report_hero(&snapshot, &options),
                ReportType::Monthly => commands::cmd_report_monthly(&snapshot, &options),
                ReportType::Clients { limit } => {
                    commands::cmd_report_clients(&snapshot, &options, limit)
                }
                ReportType::Products { limit } => {
                    commands::cmd_report_products(&snapshot, &options, limit)
                }
                ReportType::Prices => commands::cmd_report_prices(&snapshot, &options),
                ReportType::Basis => commands::cmd_report_basis(&snapshot, &options),
                ReportType::Geography => commands::cmd_report_geography(&snapshot, &options),
                ReportType::Records => commands::cmd_report_records(&snapshot, &options),
                ReportType::Timeline => commands::cmd_report_timeline(&snapshot, &options),
                ReportType::Final => commands::cmd_report_final(&snapshot, &options),
                ReportType::Payments { supplier } => {
                    commands::cmd_report_payments(&snapshot, &options, supplier)
                }
                ReportType::Purchases { limit } => {
                    commands::cmd_report_purchases(&snapshot, &options, limit)
                }
                ReportType::Debts => commands::cmd_report_debts(&snapshot, &options),
            }
        }
        Commands::Dashboard { source, json } => {
            let (snapshot, options) = commands::load_snapshot(&config, &source).await?;
            commands::cmd_dashboard(&snapshot, &options, json)
        }
        Commands::Serve {
            port,
            host,
            allowed_origins,
        } => commands::cmd_serve(config, &host, port, allowed_origins).await,
    }
}
