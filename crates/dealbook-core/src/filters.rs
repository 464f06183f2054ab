//! Year and payment status filters

use chrono::{Datelike, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::record::{CellValue, Record};

/// Keep records whose date field falls in `year` (local calendar)
///
/// Records with a missing or unparsable date are dropped.
pub fn filter_by_year(
    records: &[Record],
    date_field: &str,
    year: i32,
    offset: FixedOffset,
) -> Vec<Record> {
    records
        .iter()
        .filter(|r| {
            r.local_date(date_field, offset)
                .is_some_and(|d| d.year() == year)
        })
        .cloned()
        .collect()
}

/// Payment status, matched exactly against the sheet's vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "оплачено",
            Self::Unpaid => "не оплачено",
        }
    }

    /// Exact match; anything else (including different case) is unrecognised
    pub fn from_cell(value: Option<&CellValue>) -> Option<Self> {
        match value {
            Some(CellValue::Text(s)) if s == Self::Paid.as_str() => Some(Self::Paid),
            Some(CellValue::Text(s)) if s == Self::Unpaid.as_str() => Some(Self::Unpaid),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payments split by status
#[derive(Debug, Default)]
pub struct StatusPartition<'a> {
    pub paid: Vec<&'a Record>,
    pub unpaid: Vec<&'a Record>,
}

/// Split payments into paid and unpaid; unrecognised statuses go nowhere
pub fn partition_by_status<'a>(records: &'a [Record], status_field: &str) -> StatusPartition<'a> {
    let mut partition = StatusPartition::default();
    for record in records {
        match PaymentStatus::from_cell(record.get(status_field)) {
            Some(PaymentStatus::Paid) => partition.paid.push(record),
            Some(PaymentStatus::Unpaid) => partition.unpaid.push(record),
            None => {}
        }
    }
    partition
}

/// Keep records whose status field equals `status` exactly
pub fn filter_by_status(records: &[Record], status_field: &str, status: &str) -> Vec<Record> {
    records
        .iter()
        .filter(|r| matches!(r.get(status_field), Some(CellValue::Text(s)) if s == status))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(date: Option<&str>) -> Record {
        let mut r = Record::new();
        r.insert("id", 1.0);
        if let Some(d) = date {
            r.insert("date", d);
        }
        r
    }

    fn status(s: &str) -> Record {
        let mut r = Record::new();
        r.insert("status", s);
        r
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_filter_by_year() {
        let records = vec![
            dated(Some("2025-06-01")),
            dated(Some("2024-12-31")),
            dated(None),
            dated(Some("garbage")),
            dated(Some("2025-01-01T00:00:00Z")),
        ];

        let kept = filter_by_year(&records, "date", 2025, utc());
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].text("date").as_deref(), Some("2025-06-01"));
    }

    #[test]
    fn test_filter_by_year_local_offset() {
        let records = vec![dated(Some("2024-12-31T22:00:00.000Z"))];
        let moscow = FixedOffset::east_opt(3 * 3600).unwrap();

        assert_eq!(filter_by_year(&records, "date", 2025, moscow).len(), 1);
        assert!(filter_by_year(&records, "date", 2025, utc()).is_empty());
    }

    #[test]
    fn test_partition_by_status() {
        let records = vec![
            status("оплачено"),
            status("не оплачено"),
            status("Оплачено"),
            status("частично"),
            status("оплачено"),
        ];

        let partition = partition_by_status(&records, "status");
        assert_eq!(partition.paid.len(), 2);
        assert_eq!(partition.unpaid.len(), 1);
    }

    #[test]
    fn test_filter_by_status() {
        let records = vec![status("оплачено"), status("не оплачено")];
        let paid = filter_by_status(&records, "status", "оплачено");
        assert_eq!(paid.len(), 1);
        assert!(filter_by_status(&records, "status", "other").is_empty());
    }
}
