//! Payment turnaround
//!
//! Turnaround is the number of whole days between sending the documents and
//! receiving the funds. Negative gaps and gaps of a year or more are data
//! entry noise and are left out of the averages.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Group, Groups};
use crate::config::PaymentFields;
use crate::payment_type::PaymentType;
use crate::record::Record;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Upper bound (exclusive) for a plausible turnaround
pub const MAX_TURNAROUND_DAYS: i64 = 365;

/// Rounded day count between two instants (half days round up)
pub fn turnaround_days(sent: DateTime<Utc>, received: DateTime<Utc>) -> i64 {
    let days = (received - sent).num_milliseconds() as f64 / MS_PER_DAY;
    (days + 0.5).floor() as i64
}

/// Day count when it is a plausible sample, `None` otherwise
pub fn valid_turnaround(sent: DateTime<Utc>, received: DateTime<Utc>) -> Option<i64> {
    let days = turnaround_days(sent, received);
    (0..MAX_TURNAROUND_DAYS).contains(&days).then_some(days)
}

/// Turnaround sample of one payment record, if it has both dates
pub fn record_turnaround(
    record: &Record,
    fields: &PaymentFields,
    offset: FixedOffset,
) -> Option<i64> {
    let sent = record.instant(&fields.sent_date, offset)?;
    let received = record.instant(&fields.received_date, offset)?;
    valid_turnaround(sent, received)
}

/// Average turnaround of one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnaroundStat {
    pub key: String,
    /// `None` when no payment in the group has a valid sample
    pub average_days: Option<f64>,
    pub samples: u64,
    pub payments: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnaroundSummary {
    pub overall: TurnaroundStat,
    pub by_counterparty: Vec<TurnaroundStat>,
    pub by_payment_type: Vec<TurnaroundStat>,
}

/// Mean turnaround overall, per counterparty and per payment type
pub fn summarize(
    records: &[Record],
    fields: &PaymentFields,
    offset: FixedOffset,
    placeholder: &str,
) -> TurnaroundSummary {
    let mut overall = Groups::new(&["days", "samples"]);
    let mut by_counterparty = Groups::new(&["days", "samples"]);
    let mut by_type = Groups::new(&["days", "samples"]);

    for record in records {
        let values = match record_turnaround(record, fields, offset) {
            Some(days) => [days as f64, 1.0],
            None => [0.0, 0.0],
        };
        let kind = PaymentType::from_cell(record.get(&fields.payment_type));

        overall.add_values("all".to_string(), &values);
        by_counterparty.add_values(record.key_or(&fields.counterparty, placeholder), &values);
        by_type.add_values(kind.as_str().to_string(), &values);
    }

    let overall_stat = overall
        .get("all")
        .map(stat_from_group)
        .unwrap_or_else(|| TurnaroundStat {
            key: "all".to_string(),
            average_days: None,
            samples: 0,
            payments: 0,
        });

    TurnaroundSummary {
        overall: overall_stat,
        by_counterparty: by_counterparty
            .ranked_by(|g| g.count as f64)
            .into_iter()
            .map(stat_from_group)
            .collect(),
        by_payment_type: by_type
            .ranked_by(|g| g.count as f64)
            .into_iter()
            .map(stat_from_group)
            .collect(),
    }
}

fn stat_from_group(group: &Group) -> TurnaroundStat {
    let samples = group.sums[1] as u64;
    TurnaroundStat {
        key: group.key.clone(),
        average_days: (samples > 0).then(|| group.sums[0] / group.sums[1]),
        samples,
        payments: group.count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn payment(buyer: &str, kind: &str, sent: Option<&str>, received: Option<&str>) -> Record {
        let fields = PaymentFields::default();
        let mut r = Record::new();
        r.insert(fields.counterparty.clone(), buyer);
        r.insert(fields.payment_type.clone(), kind);
        if let Some(s) = sent {
            r.insert(fields.sent_date.clone(), s);
        }
        if let Some(s) = received {
            r.insert(fields.received_date.clone(), s);
        }
        r
    }

    #[test]
    fn test_turnaround_days() {
        assert_eq!(turnaround_days(day(2025, 1, 1), day(2025, 1, 11)), 10);
        assert_eq!(valid_turnaround(day(2025, 1, 1), day(2025, 1, 11)), Some(10));
        assert_eq!(valid_turnaround(day(2025, 1, 11), day(2025, 1, 1)), None);
    }

    #[test]
    fn test_turnaround_bounds() {
        assert_eq!(valid_turnaround(day(2025, 1, 1), day(2025, 1, 1)), Some(0));
        assert_eq!(valid_turnaround(day(2024, 1, 1), day(2024, 12, 30)), Some(364));
        assert_eq!(valid_turnaround(day(2024, 1, 1), day(2024, 12, 31)), None);
    }

    #[test]
    fn test_turnaround_rounds_half_up() {
        let sent = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let received = Utc.with_ymd_and_hms(2025, 1, 3, 12, 0, 0).unwrap();
        assert_eq!(turnaround_days(sent, received), 3);

        let received = Utc.with_ymd_and_hms(2025, 1, 3, 11, 59, 0).unwrap();
        assert_eq!(turnaround_days(sent, received), 2);
    }

    #[test]
    fn test_summarize() {
        let records = vec![
            payment("Acme", "Аккредитив", Some("2025-01-01"), Some("2025-01-11")),
            payment("Acme", "аванс", Some("2025-02-01"), Some("2025-02-05")),
            payment("Globex", "Аккредитив", Some("2025-01-11"), Some("2025-01-01")),
            payment("", "", None, None),
        ];

        let summary = summarize(&records, &PaymentFields::default(), utc(), "Неизвестно");

        assert_eq!(summary.overall.samples, 2);
        assert_eq!(summary.overall.payments, 4);
        assert_eq!(summary.overall.average_days, Some(7.0));

        let acme = summary.by_counterparty.iter().find(|s| s.key == "Acme").unwrap();
        assert_eq!(acme.average_days, Some(7.0));

        let globex = summary.by_counterparty.iter().find(|s| s.key == "Globex").unwrap();
        assert_eq!(globex.samples, 0);
        assert_eq!(globex.average_days, None);

        assert!(summary.by_counterparty.iter().any(|s| s.key == "Неизвестно"));

        let lc = summary
            .by_payment_type
            .iter()
            .find(|s| s.key == "аккредитив")
            .unwrap();
        assert_eq!(lc.payments, 2);
        assert_eq!(lc.average_days, Some(10.0));
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], &PaymentFields::default(), utc(), "Неизвестно");
        assert_eq!(summary.overall.average_days, None);
        assert!(summary.by_counterparty.is_empty());
    }
}
