//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Dealbook - Trading desk exports and year-end dashboard
#[derive(Parser)]
#[command(name = "dealbook")]
#[command(about = "Spreadsheet export and year-end dashboard for a trading desk", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to $DEALBOOK_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the dashboard documents come from
#[derive(Args, Clone, Debug, Default)]
pub struct SourceArgs {
    /// Dashboard document (file path or http(s) URL); repeat to merge several
    #[arg(short, long = "source")]
    pub sources: Vec<String>,

    /// Target year (overrides config and DEALBOOK_YEAR)
    #[arg(short, long)]
    pub year: Option<i32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export a workbook sheet to a JSON file
    Export {
        /// What to export: deals, payments, payments-stats, paid-only
        #[arg(short, long, default_value = "deals")]
        kind: String,

        /// Sheet name (defaults to the kind's usual sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Workbook directory of <sheet>.csv files
        #[arg(short, long)]
        workbook: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Wrap the records with metadata (deals and payments use their with-stats file name)
        #[arg(long)]
        metadata: bool,
    },

    /// Show the first rows of a sheet
    Preview {
        /// Sheet name
        #[arg(long, default_value = "Получение средств")]
        sheet: String,

        /// Workbook directory of <sheet>.csv files
        #[arg(short, long)]
        workbook: Option<PathBuf>,

        /// Number of rows to show
        #[arg(short, long, default_value = "5")]
        rows: usize,
    },

    /// POST a sheet's records to a webhook
    Push {
        /// Webhook URL
        #[arg(long)]
        url: String,

        /// Sheet name
        #[arg(long, default_value = "Лист 1")]
        sheet: String,

        /// Workbook directory of <sheet>.csv files
        #[arg(short, long)]
        workbook: Option<PathBuf>,
    },

    /// Print one dashboard section
    Report {
        #[command(flatten)]
        source: SourceArgs,

        #[command(subcommand)]
        report_type: ReportType,
    },

    /// Print the whole dashboard
    Dashboard {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the report as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (repeatable)
        #[arg(long = "allow-origin")]
        allowed_origins: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Total deals, volume and revenue
    Hero,

    /// Volume and deals per calendar month
    Monthly,

    /// Top buyers by volume
    Clients {
        /// Number of buyers to show
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Top products by volume
    Products {
        /// Number of products to show
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Volume-weighted average sale price per product
    Prices,

    /// Volume share per delivery basis
    Basis,

    /// Volume share per purchase region
    Geography,

    /// Largest deals by volume and by revenue
    Records,

    /// Deals, volume and revenue per month
    Timeline,

    /// Year totals and distinct buyers
    Final,

    /// Paid/unpaid totals, payment types and turnaround
    Payments {
        /// Report supplier payments instead of buyer payments
        #[arg(long)]
        supplier: bool,
    },

    /// Purchase totals, suppliers and prices
    Purchases {
        /// Number of suppliers to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Claims by initiator and claim type
    Debts,
}
