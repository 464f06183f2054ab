//! Dealbook Core Library
//!
//! Shared functionality for the dealbook trading-desk tools:
//! - Spreadsheet records and the header-to-record mapper
//! - Year and payment status filters
//! - Group-and-aggregate, weighted averages and monthly rollups
//! - Payment turnaround and payment type normalization
//! - Year-end dashboard sections over an immutable snapshot
//! - Sheet export to JSON files, webhooks and query responses
//! - TOML configuration with configurable column headers

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod export;
pub mod extremum;
pub mod filters;
pub mod mapper;
pub mod payment_type;
pub mod record;
pub mod turnaround;

pub use aggregate::{group_by, group_by_field, weighted_average, Group, GroupShare, Groups};
pub use config::{Config, DealFields, DebtFields, FieldMap, PaymentFields, PurchaseFields};
pub use dashboard::{DashboardOptions, DashboardReport};
pub use dataset::{load_source, Dataset, Snapshot};
pub use error::{Error, Result};
pub use export::{
    build_document, export_file_name, export_sheet, preview, query_records, send_to_webhook,
    ExportDestination, ExportDocument, ExportOptions, LocalDirectory, PaymentStats, QueryResponse,
    Workbook,
};
pub use extremum::max_by_field;
pub use filters::{filter_by_status, filter_by_year, partition_by_status, PaymentStatus};
pub use mapper::records_from_grid;
pub use payment_type::PaymentType;
pub use record::{CellValue, Record};
pub use turnaround::{TurnaroundStat, TurnaroundSummary};
