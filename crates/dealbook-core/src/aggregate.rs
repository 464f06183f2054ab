//! Group-and-aggregate
//!
//! Every dashboard section buckets records by a key (buyer, product, basis,
//! region, month...) and sums one or more numeric measures per bucket.
//! [`Groups`] is that accumulator. Groups keep first-seen order so rankings
//! break ties by input order.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::record::{CellValue, Record};

/// Totals for one key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub key: String,
    pub count: u64,
    /// One sum per measure, in the order the measures were declared
    pub sums: Vec<f64>,
}

/// Accumulated totals keyed by group, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct Groups {
    measures: Vec<String>,
    groups: Vec<Group>,
    index: HashMap<String, usize>,
}

impl Groups {
    pub fn new(measures: &[&str]) -> Self {
        Self {
            measures: measures.iter().map(|m| m.to_string()).collect(),
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add one record under `key`, summing each measure field
    pub fn add(&mut self, key: String, record: &Record) {
        let values: Vec<f64> = self.measures.iter().map(|m| record.number(m)).collect();
        self.add_values(key, &values);
    }

    /// Add precomputed measure values under `key`
    pub fn add_values(&mut self, key: String, values: &[f64]) {
        let width = self.measures.len();
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.groups.push(Group {
                    key: key.clone(),
                    count: 0,
                    sums: vec![0.0; width],
                });
                self.index.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        let group = &mut self.groups[idx];
        group.count += 1;
        for (sum, value) in group.sums.iter_mut().zip(values) {
            *sum += value;
        }
    }

    pub fn measures(&self) -> &[String] {
        &self.measures
    }

    pub fn measure_index(&self, measure: &str) -> Option<usize> {
        self.measures.iter().position(|m| m == measure)
    }

    pub fn get(&self, key: &str) -> Option<&Group> {
        self.index.get(key).map(|&idx| &self.groups[idx])
    }

    /// Sum of `measure` for `key`, 0 when either is unknown
    pub fn sum(&self, key: &str, measure: &str) -> f64 {
        match (self.get(key), self.measure_index(measure)) {
            (Some(group), Some(m)) => group.sums[m],
            _ => 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    /// Total of `measure` across all groups
    pub fn total(&self, measure: &str) -> f64 {
        match self.measure_index(measure) {
            Some(m) => self.groups.iter().map(|g| g.sums[m]).sum(),
            None => 0.0,
        }
    }

    /// Groups sorted descending by `measure`; ties keep first-seen order
    pub fn ranked(&self, measure: &str) -> Vec<&Group> {
        match self.measure_index(measure) {
            Some(m) => self.ranked_by(|g| g.sums[m]),
            None => self.groups.iter().collect(),
        }
    }

    /// Groups sorted descending by a derived value; ties keep first-seen order
    pub fn ranked_by<F: Fn(&Group) -> f64>(&self, value: F) -> Vec<&Group> {
        let mut ranked: Vec<&Group> = self.groups.iter().collect();
        ranked.sort_by(|a, b| value(b).total_cmp(&value(a)));
        ranked
    }

    /// The first `n` groups of [`Groups::ranked`]
    pub fn top(&self, measure: &str, n: usize) -> Vec<&Group> {
        let mut ranked = self.ranked(measure);
        ranked.truncate(n);
        ranked
    }

    /// Ranked groups with their share of the total of `measure`
    pub fn shares(&self, measure: &str) -> Vec<GroupShare> {
        let total = self.total(measure);
        let m = self.measure_index(measure);
        self.ranked(measure)
            .into_iter()
            .map(|g| {
                let value = m.map(|m| g.sums[m]).unwrap_or(0.0);
                GroupShare {
                    key: g.key.clone(),
                    count: g.count,
                    value,
                    percent: percent_of(value, total),
                }
            })
            .collect()
    }
}

/// One slice of a ring chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupShare {
    pub key: String,
    pub count: u64,
    pub value: f64,
    /// Share of the total in percent, 0 when the total is 0
    pub percent: f64,
}

/// `part / total * 100`, 0 when the total is 0
pub fn percent_of(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

/// Group records by a computed key
pub fn group_by<'a, I, F>(records: I, key_fn: F, measures: &[&str]) -> Groups
where
    I: IntoIterator<Item = &'a Record>,
    F: Fn(&Record) -> String,
{
    let mut groups = Groups::new(measures);
    for record in records {
        groups.add(key_fn(record), record);
    }
    groups
}

/// Group records by a field, blank values falling into `placeholder`
pub fn group_by_field<'a, I>(records: I, field: &str, placeholder: &str, measures: &[&str]) -> Groups
where
    I: IntoIterator<Item = &'a Record>,
{
    group_by(records, |r| r.key_or(field, placeholder), measures)
}

/// Sum of a numeric field
pub fn sum_field<'a, I>(records: I, field: &str) -> f64
where
    I: IntoIterator<Item = &'a Record>,
{
    records.into_iter().map(|r| r.number(field)).sum()
}

/// Volume-weighted average of a value per group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedAverage {
    pub key: String,
    pub average: f64,
    pub total_weight: f64,
    pub count: u64,
}

/// `Σ(value × weight) / Σ(weight)` per group
///
/// Groups with a non-positive total weight or average are left out.
/// Results are sorted by total weight, largest first.
pub fn weighted_average<'a, I, F>(
    records: I,
    key_fn: F,
    value_field: &str,
    weight_field: &str,
) -> Vec<WeightedAverage>
where
    I: IntoIterator<Item = &'a Record>,
    F: Fn(&Record) -> String,
{
    let mut groups = Groups::new(&["weighted_value", "weight"]);
    for record in records {
        let value = record.number(value_field);
        let weight = record.number(weight_field);
        groups.add_values(key_fn(record), &[value * weight, weight]);
    }

    groups
        .ranked("weight")
        .into_iter()
        .filter(|g| g.sums[1] > 0.0)
        .map(|g| WeightedAverage {
            key: g.key.clone(),
            average: g.sums[0] / g.sums[1],
            total_weight: g.sums[1],
            count: g.count,
        })
        .filter(|w| w.average > 0.0)
        .collect()
}

/// Totals for one calendar period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodGroup {
    pub year: i32,
    pub month: u32,
    pub count: u64,
    pub sums: Vec<f64>,
}

/// Group by calendar month (1-12), months in calendar order
///
/// Records without a parsable date are skipped. Months with no records are
/// absent from the result.
pub fn by_month<'a, I>(
    records: I,
    date_field: &str,
    offset: FixedOffset,
    measures: &[&str],
) -> Vec<PeriodGroup>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut groups = Groups::new(measures);
    let mut years: HashMap<u32, i32> = HashMap::new();
    for record in records {
        let Some(date) = record.local_date(date_field, offset) else {
            continue;
        };
        years.entry(date.month()).or_insert(date.year());
        groups.add(date.month().to_string(), record);
    }

    (1..=12)
        .filter_map(|month| {
            groups.get(&month.to_string()).map(|g| PeriodGroup {
                year: years.get(&month).copied().unwrap_or_default(),
                month,
                count: g.count,
                sums: g.sums.clone(),
            })
        })
        .collect()
}

/// Group by (year, month), oldest first
pub fn by_year_month<'a, I>(
    records: I,
    date_field: &str,
    offset: FixedOffset,
    measures: &[&str],
) -> Vec<PeriodGroup>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut groups = Groups::new(measures);
    let mut periods: Vec<(i32, u32)> = Vec::new();
    for record in records {
        let Some(date) = record.local_date(date_field, offset) else {
            continue;
        };
        let period = (date.year(), date.month());
        let key = format!("{:04}-{:02}", period.0, period.1);
        if groups.get(&key).is_none() {
            periods.push(period);
        }
        groups.add(key, record);
    }

    periods.sort();
    periods
        .into_iter()
        .filter_map(|(year, month)| {
            groups
                .get(&format!("{:04}-{:02}", year, month))
                .map(|g| PeriodGroup {
                    year,
                    month,
                    count: g.count,
                    sums: g.sums.clone(),
                })
        })
        .collect()
}

/// Number of distinct raw values of a field
///
/// An absent field counts as one value of its own, distinct from empty text.
pub fn distinct_count<'a, I>(records: I, field: &str) -> usize
where
    I: IntoIterator<Item = &'a Record>,
{
    let seen: HashSet<Option<(u8, String)>> = records
        .into_iter()
        .map(|r| {
            r.get(field).map(|v| match v {
                CellValue::Text(s) => (0, s.clone()),
                CellValue::Number(n) => (1, n.to_string()),
                CellValue::Bool(b) => (2, b.to_string()),
                CellValue::Empty => (3, String::new()),
            })
        })
        .collect();
    seen.len()
}
