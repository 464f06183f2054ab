//! Export command implementations

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Utc;
use dealbook_core::export::{DEALS_SHEET, PAYMENTS_SHEET};
use dealbook_core::{
    export_sheet, preview, send_to_webhook, Config, ExportOptions, LocalDirectory, Workbook,
};

use super::truncate;

/// What an export writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Deals sheet, bare array
    Deals,
    /// Payments sheet, bare array
    Payments,
    /// Payments sheet with metadata and statistics
    PaymentsStats,
    /// Paid payments only
    PaidOnly,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deals => "deals",
            Self::Payments => "payments",
            Self::PaymentsStats => "payments-stats",
            Self::PaidOnly => "paid-only",
        }
    }

    /// Sheet used when none is given
    pub fn default_sheet(&self) -> &'static str {
        match self {
            Self::Deals => DEALS_SHEET,
            Self::Payments | Self::PaymentsStats | Self::PaidOnly => PAYMENTS_SHEET,
        }
    }

    /// Export options; `metadata` switches deals and payments to their with-stats variant
    pub fn options(&self, year: i32, metadata: bool) -> ExportOptions {
        match self {
            Self::Deals if metadata => ExportOptions::deals_with_stats(year),
            Self::Deals => ExportOptions::deals(),
            Self::Payments if metadata => ExportOptions::payments_with_stats(),
            Self::Payments => ExportOptions::payments(),
            Self::PaymentsStats => ExportOptions::payments_with_stats(),
            Self::PaidOnly => ExportOptions {
                metadata,
                ..ExportOptions::paid_only()
            },
        }
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deals" => Ok(Self::Deals),
            "payments" => Ok(Self::Payments),
            "payments-stats" => Ok(Self::PaymentsStats),
            "paid-only" | "paid" => Ok(Self::PaidOnly),
            _ => Err(format!(
                "Unknown export kind: {}. Available: deals, payments, payments-stats, paid-only",
                s
            )),
        }
    }
}

fn resolve_workbook(config: &Config, workbook: Option<&Path>) -> Workbook {
    Workbook::new(
        workbook
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.export.workbook.clone()),
    )
}

pub fn cmd_export(
    config: &Config,
    kind: &str,
    sheet: Option<&str>,
    workbook: Option<&Path>,
    output: Option<&Path>,
    metadata: bool,
) -> Result<()> {
    let kind: ExportKind = kind.parse().map_err(anyhow::Error::msg)?;
    let sheet = sheet.unwrap_or_else(|| kind.default_sheet());
    let workbook = resolve_workbook(config, workbook);

    let mut options = kind.options(config.year, metadata);
    if config.export.column_limit.is_some() {
        options.column_limit = config.export.column_limit;
    }

    let output: PathBuf = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.export.output_dir.clone());
    let destination = LocalDirectory::new(output.clone())
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let outcome = export_sheet(
        &workbook,
        sheet,
        &options,
        &config.fields.payments,
        &destination,
        Utc::now(),
    )
    .with_context(|| format!("Failed to export sheet \"{}\"", sheet))?;

    println!();
    println!("📤 Export complete ({})", kind.as_str());
    println!("   Sheet:    {}", sheet);
    println!("   File:     {}", outcome.location);
    if outcome.exported == outcome.total {
        println!("   Records:  {}", outcome.exported);
    } else {
        println!("   Records:  {} of {}", outcome.exported, outcome.total);
    }

    if let Some(stats) = &outcome.stats {
        println!();
        println!("   Total amount:  {:.2}", stats.total_amount);
        println!("   Paid:          {}", stats.paid_count);
        println!("   Unpaid:        {}", stats.unpaid_count);
        if let Some(avg) = stats.average_amount {
            println!("   Average:       {:.2}", avg);
        }
    }

    Ok(())
}

pub fn cmd_preview(config: &Config, sheet: &str, workbook: Option<&Path>, rows: usize) -> Result<()> {
    let workbook = resolve_workbook(config, workbook);
    let data = workbook
        .sheet(sheet)?
        .read(config.export.column_limit)
        .with_context(|| format!("Failed to read sheet \"{}\"", sheet))?;

    let fields = &config.fields.payments;
    let shown = preview(&data.records, rows);

    println!();
    println!("👀 {} ({} records, {} columns)", sheet, data.records.len(), data.columns());
    println!("   ─────────────────────────────────────────────────────────────");

    if shown.is_empty() {
        println!("   Nothing to show.");
        return Ok(());
    }

    for (i, record) in shown.iter().enumerate() {
        let counterparty = record.text(&fields.counterparty).unwrap_or_default();
        let status = record.text(&fields.status).unwrap_or_default();
        println!("   {:>3}. {:35} - {}", i + 1, truncate(&counterparty, 35), status);
    }

    Ok(())
}

pub async fn cmd_push(
    config: &Config,
    url: &str,
    sheet: &str,
    workbook: Option<&Path>,
) -> Result<()> {
    let workbook = resolve_workbook(config, workbook);
    let data = workbook
        .sheet(sheet)?
        .read(config.export.column_limit)
        .with_context(|| format!("Failed to read sheet \"{}\"", sheet))?;

    println!("📡 Sending {} records from \"{}\" to {}", data.records.len(), sheet, url);

    let status = send_to_webhook(url, &data.records)
        .await
        .context("Failed to reach webhook")?;

    if !(200..300).contains(&status) {
        anyhow::bail!("Webhook responded with status {}", status);
    }

    println!("✓ Webhook accepted the data (status {})", status);
    Ok(())
}
