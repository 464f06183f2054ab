//! Sheet export
//!
//! Reads a workbook sheet into records and writes them out as JSON:
//! 1. `Workbook::sheet` + `Sheet::read` turn the CSV into records
//! 2. `build_document` optionally filters by status and wraps the records
//!    with metadata and payment statistics
//! 3. an `ExportDestination` stores the document under
//!    `<prefix>_<YYYY-MM-DD>.json`
//!
//! The same records can instead be pushed to a webhook or served as a
//! query response.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::info;

use crate::config::PaymentFields;
use crate::error::Result;
use crate::filters::{filter_by_status, partition_by_status, PaymentStatus};
use crate::record::Record;

mod local;
mod webhook;
mod workbook;

pub use local::LocalDirectory;
pub use webhook::{send_to_webhook, WebhookPayload};
pub use workbook::{Sheet, SheetData, Workbook};

/// Rows shown by a preview
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Sheet holding the sales deals
pub const DEALS_SHEET: &str = "Лист 1";

/// Sheet holding the buyer payments
pub const PAYMENTS_SHEET: &str = "Получение средств";

/// Key holding a sheet's records in envelopes and query responses
pub fn records_key_for(sheet: &str) -> &'static str {
    if sheet == PAYMENTS_SHEET {
        "payments"
    } else {
        "data"
    }
}

/// `2025-12-25T10:00:00.000Z`
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `<prefix>_<YYYY-MM-DD>.json`
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.json", prefix, date.format("%Y-%m-%d"))
}

/// How a sheet is exported
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// File name prefix
    pub prefix: String,
    /// Key holding the records when the document has metadata
    pub records_key: String,
    /// Wrap the records in `{ metadata, <records_key> }`
    pub metadata: bool,
    /// Add payment statistics to the metadata (implies `metadata`)
    pub stats: bool,
    /// Keep only records whose status equals this literal
    pub status_filter: Option<String>,
    pub column_limit: Option<usize>,
}

impl ExportOptions {
    /// Deals sheet as a bare array
    pub fn deals() -> Self {
        Self {
            prefix: "Итоги_года".to_string(),
            records_key: "data".to_string(),
            metadata: false,
            stats: false,
            status_filter: None,
            column_limit: Some(52),
        }
    }

    /// Deals sheet wrapped with metadata, named after the report year
    pub fn deals_with_stats(year: i32) -> Self {
        Self {
            prefix: format!("Итоги_года_{}", year),
            metadata: true,
            column_limit: Some(50),
            ..Self::deals()
        }
    }

    /// Payments sheet as a bare array
    pub fn payments() -> Self {
        Self {
            prefix: "payments".to_string(),
            records_key: "payments".to_string(),
            metadata: false,
            stats: false,
            status_filter: None,
            column_limit: None,
        }
    }

    /// Payments sheet with metadata and statistics
    pub fn payments_with_stats() -> Self {
        Self {
            prefix: "payments_with_stats".to_string(),
            metadata: true,
            stats: true,
            ..Self::payments()
        }
    }

    /// Paid payments only, as a bare array
    pub fn paid_only() -> Self {
        Self {
            prefix: "payments_paid_only".to_string(),
            status_filter: Some(PaymentStatus::Paid.as_str().to_string()),
            ..Self::payments()
        }
    }
}

/// Summary of a payments export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub total_amount: f64,
    pub paid_count: usize,
    pub unpaid_count: usize,
    /// `None` when there are no records
    pub average_amount: Option<f64>,
}

impl PaymentStats {
    pub fn compute(records: &[Record], fields: &PaymentFields) -> Self {
        let total_amount: f64 = records.iter().map(|r| r.number(&fields.amount)).sum();
        let partition = partition_by_status(records, &fields.status);
        Self {
            total_amount,
            paid_count: partition.paid.len(),
            unpaid_count: partition.unpaid.len(),
            average_amount: (!records.is_empty()).then(|| total_amount / records.len() as f64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub total_records: usize,
    pub export_date: String,
    /// Non-empty headers in the sheet
    pub columns: usize,
    #[serde(flatten)]
    pub payment: Option<PaymentStats>,
}

/// An export file's content
#[derive(Debug, Clone, PartialEq)]
pub enum ExportDocument {
    Bare(Vec<Record>),
    WithMetadata {
        metadata: ExportMetadata,
        records_key: String,
        records: Vec<Record>,
    },
}

impl ExportDocument {
    pub fn records(&self) -> &[Record] {
        match self {
            Self::Bare(records) => records,
            Self::WithMetadata { records, .. } => records,
        }
    }
}

impl Serialize for ExportDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Bare(records) => records.serialize(serializer),
            Self::WithMetadata {
                metadata,
                records_key,
                records,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("metadata", metadata)?;
                map.serialize_entry(records_key, records)?;
                map.end()
            }
        }
    }
}

/// Apply the status filter and wrap the records as configured
pub fn build_document(
    records: Vec<Record>,
    columns: usize,
    options: &ExportOptions,
    fields: &PaymentFields,
    now: DateTime<Utc>,
) -> ExportDocument {
    let records = match &options.status_filter {
        Some(status) => filter_by_status(&records, &fields.status, status),
        None => records,
    };

    if !(options.metadata || options.stats) {
        return ExportDocument::Bare(records);
    }

    let payment = options.stats.then(|| PaymentStats::compute(&records, fields));
    ExportDocument::WithMetadata {
        metadata: ExportMetadata {
            total_records: records.len(),
            export_date: iso_timestamp(now),
            columns,
            payment,
        },
        records_key: options.records_key.clone(),
        records,
    }
}

/// Where export files go
pub trait ExportDestination: Send + Sync {
    /// Human-readable name for this destination
    fn name(&self) -> &str;

    /// Store a document under `file_name`, returning its location
    fn write(&self, file_name: &str, document: &ExportDocument) -> Result<String>;
}

/// Result of exporting one sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub location: String,
    /// Rows read from the sheet
    pub total: usize,
    /// Rows written after filtering
    pub exported: usize,
    /// Payment statistics, when the export computed them
    pub stats: Option<PaymentStats>,
}

/// Read a sheet and store it through `destination`
pub fn export_sheet(
    workbook: &Workbook,
    sheet_name: &str,
    options: &ExportOptions,
    fields: &PaymentFields,
    destination: &dyn ExportDestination,
    now: DateTime<Utc>,
) -> Result<ExportOutcome> {
    let data = workbook.sheet(sheet_name)?.read(options.column_limit)?;
    let total = data.records.len();
    let columns = data.columns();

    let document = build_document(data.records, columns, options, fields, now);
    let file_name = export_file_name(&options.prefix, now.date_naive());
    let location = destination.write(&file_name, &document)?;
    let exported = document.records().len();
    let stats = match &document {
        ExportDocument::WithMetadata { metadata, .. } => metadata.payment.clone(),
        ExportDocument::Bare(_) => None,
    };

    info!(
        "Exported {} of {} records from \"{}\" to {} ({})",
        exported,
        total,
        sheet_name,
        location,
        destination.name()
    );
    Ok(ExportOutcome {
        location,
        total,
        exported,
        stats,
    })
}

/// The first `n` records
pub fn preview(records: &[Record], n: usize) -> &[Record] {
    &records[..n.min(records.len())]
}

/// Response of the records query endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub timestamp: String,
    pub count: usize,
    pub total_count: usize,
    pub records_key: String,
    pub records: Vec<Record>,
}

impl Serialize for QueryResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("timestamp", &self.timestamp)?;
        map.serialize_entry("count", &self.count)?;
        map.serialize_entry("totalCount", &self.total_count)?;
        map.serialize_entry(&self.records_key, &self.records)?;
        map.end()
    }
}

/// Records matching an optional status literal, with counts
pub fn query_records(
    records: Vec<Record>,
    status: Option<&str>,
    status_field: &str,
    records_key: &str,
    now: DateTime<Utc>,
) -> QueryResponse {
    let total_count = records.len();
    let records = match status {
        Some(status) if !status.is_empty() => filter_by_status(&records, status_field, status),
        _ => records,
    };

    QueryResponse {
        timestamp: iso_timestamp(now),
        count: records.len(),
        total_count,
        records_key: records_key.to_string(),
        records,
    }
}
