//! Dashboard documents and the loaded snapshot
//!
//! A document is whatever the export side produced: a bare array of deals,
//! an export envelope (`{ metadata, <key>: [...] }`), a query response
//! (`{ timestamp, count, totalCount, <key>: [...] }`) or a combined object
//! carrying several record lists. Documents are merged in order and then
//! narrowed to the target year, giving the immutable [`Snapshot`] that
//! every dashboard section reads.

use std::path::Path;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{Config, FieldMap};
use crate::error::{Error, Result};
use crate::filters::filter_by_year;
use crate::record::Record;

/// Keys recognised in object documents
const DEALS_KEY: &str = "deals";
const PAYMENTS_KEY: &str = "payments";
const SUPPLIER_PAYMENTS_KEY: &str = "supplier_payments";
const PURCHASES_KEY: &str = "purchases";
const DEBTS_KEY: &str = "debts";
/// Webhook payloads and plain exports carry deals under `data`
const DATA_KEY: &str = "data";

/// Envelope keys that never hold records
const ENVELOPE_KEYS: &[&str] = &["metadata", "timestamp", "count", "totalCount", "dataCount", "error"];

/// Records of one or more documents, before the year filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub deals: Vec<Record>,
    pub purchases: Vec<Record>,
    pub payments: Vec<Record>,
    pub supplier_payments: Vec<Record>,
    pub debts: Vec<Record>,
}

impl Dataset {
    /// Interpret a parsed JSON document
    pub fn from_json(value: Value) -> Result<Self> {
        let mut dataset = Self::default();
        match value {
            Value::Array(items) => dataset.deals = records_from_values(DEALS_KEY, items),
            Value::Object(map) => {
                for (key, value) in map {
                    let target = match key.as_str() {
                        DEALS_KEY | DATA_KEY => &mut dataset.deals,
                        PAYMENTS_KEY => &mut dataset.payments,
                        SUPPLIER_PAYMENTS_KEY => &mut dataset.supplier_payments,
                        PURCHASES_KEY => &mut dataset.purchases,
                        DEBTS_KEY => &mut dataset.debts,
                        k if ENVELOPE_KEYS.contains(&k) => continue,
                        other => {
                            warn!("Ignoring unknown document key \"{}\"", other);
                            continue;
                        }
                    };
                    match value {
                        Value::Array(items) => target.extend(records_from_values(&key, items)),
                        _ => {
                            return Err(Error::InvalidData(format!(
                                "\"{}\" must be an array of records",
                                key
                            )))
                        }
                    }
                }
            }
            _ => {
                return Err(Error::InvalidData(
                    "document must be an array or an object".to_string(),
                ))
            }
        }
        Ok(dataset)
    }

    /// Parse a document from JSON text
    pub fn parse(content: &str) -> Result<Self> {
        Self::from_json(serde_json::from_str(content)?)
    }

    /// Read a document from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Append another document's records after this one's
    pub fn merge(&mut self, other: Dataset) {
        self.deals.extend(other.deals);
        self.purchases.extend(other.purchases);
        self.payments.extend(other.payments);
        self.supplier_payments.extend(other.supplier_payments);
        self.debts.extend(other.debts);
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
            && self.purchases.is_empty()
            && self.payments.is_empty()
            && self.supplier_payments.is_empty()
            && self.debts.is_empty()
    }
}

/// Keep object items, skip anything else with a warning
fn records_from_values(key: &str, items: Vec<Value>) -> Vec<Record> {
    let total = items.len();
    let records: Vec<Record> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match item {
            Value::Object(_) => match serde_json::from_value::<Record>(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping {} item {}: {}", key, i, e);
                    None
                }
            },
            other => {
                warn!("Skipping {} item {}: expected an object, got {}", key, i, other);
                None
            }
        })
        .collect();
    debug!("Read {} of {} {} items", records.len(), total, key);
    records
}

/// Whether a source names a remote document
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Load one document from a URL or a file path
pub async fn load_source(source: &str) -> Result<Dataset> {
    if is_remote(source) {
        debug!("Fetching {}", source);
        let value: Value = reqwest::get(source)
            .await?
            .error_for_status()?
            .json()
            .await?;
        Dataset::from_json(value)
    } else {
        debug!("Reading {}", source);
        Dataset::from_file(Path::new(source))
    }
}

/// Immutable records for one dashboard computation
///
/// Deals and purchases are already narrowed to the target year; payments and
/// debts are kept whole because their sheets span several years.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub deals: Vec<Record>,
    pub purchases: Vec<Record>,
    pub payments: Vec<Record>,
    pub supplier_payments: Vec<Record>,
    pub debts: Vec<Record>,
}

impl Snapshot {
    /// Apply the year filter to a merged dataset
    pub fn new(dataset: Dataset, fields: &FieldMap, year: i32, offset: FixedOffset) -> Self {
        let deals = filter_by_year(&dataset.deals, &fields.deals.date, year, offset);
        let purchases = filter_by_year(&dataset.purchases, &fields.purchases.date, year, offset);
        debug!(
            "Year {}: kept {} of {} deals, {} of {} purchases",
            year,
            deals.len(),
            dataset.deals.len(),
            purchases.len(),
            dataset.purchases.len()
        );

        Self {
            deals,
            purchases,
            payments: dataset.payments,
            supplier_payments: dataset.supplier_payments,
            debts: dataset.debts,
        }
    }

    /// Load and merge every source in order, then filter by year
    ///
    /// The first failing source aborts the load.
    pub async fn load(sources: &[String], config: &Config) -> Result<Self> {
        let mut dataset = Dataset::default();
        for source in sources {
            dataset.merge(load_source(source).await?);
        }

        let snapshot = Self::new(dataset, &config.fields, config.year, config.offset()?);
        info!(
            "Loaded {} deals, {} purchases, {} payments, {} supplier payments, {} debts",
            snapshot.deals.len(),
            snapshot.purchases.len(),
            snapshot.payments.len(),
            snapshot.supplier_payments.len(),
            snapshot.debts.len()
        );
        Ok(snapshot)
    }
}
