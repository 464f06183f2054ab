//! Spreadsheet records
//!
//! A [`Record`] is one spreadsheet row keyed by its header strings. Headers are
//! kept verbatim (embedded newlines and annotation suffixes included) because
//! every lookup uses the exact header text.
//!
//! No schema is enforced. Consumers read fields through the lenient accessors
//! below, which default missing or unparsable values instead of failing:
//! - [`Record::number`] parses a leading number and falls back to `0.0`
//! - [`Record::key_or`] falls back to a placeholder for blank values
//! - [`Record::instant`] / [`Record::local_date`] return `None` for bad dates

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Leading numeric prefix, as accepted by a lenient float parser
static NUMBER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .expect("valid regex")
});

/// Largest integer that survives an f64 round trip
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    #[default]
    Empty,
}

impl CellValue {
    /// Convert a raw CSV cell into a typed value
    ///
    /// Empty cells stay empty text, whole-cell numbers become numbers and
    /// `TRUE`/`FALSE` become booleans. Everything else is text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Text(raw.to_string());
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Self::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Self::Bool(false);
        }
        // Only plain decimal notation; "inf"/"NaN" stay text
        if trimmed
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return Self::Number(n);
                }
            }
        }
        Self::Text(raw.to_string())
    }

    /// Lenient numeric value: leading number of text, `0.0` otherwise
    pub fn as_number(&self) -> f64 {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => parse_leading_number(s).unwrap_or(0.0),
            Self::Bool(_) | Self::Empty => 0.0,
        };
        if n.is_finite() {
            n
        } else {
            0.0
        }
    }

    /// Whether the value counts as "present" for grouping purposes
    ///
    /// Empty text, zero, `false` and null are all blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Number(n) => *n == 0.0 || n.is_nan(),
            Self::Bool(b) => !*b,
            Self::Empty => true,
        }
    }

    /// Text form, `None` for empty text and null
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) if s.is_empty() => None,
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(format_number(*n)),
            Self::Bool(b) => Some(b.to_string()),
            Self::Empty => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Empty),
            Value::String(s) => Self::Text(s),
            // Nested structures are not spreadsheet cells; keep their JSON text
            other => Self::Text(other.to_string()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Self::Number(_) | Self::Empty => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(CellValue::from)
    }
}

/// One spreadsheet row keyed by header, in header order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. An existing field keeps its position and takes the new value.
    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<CellValue>) {
        let header = header.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(h, _)| *h == header) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((header, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(h, _)| h == field)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(h, _)| h.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(h, v)| (h.as_str(), v))
    }

    /// Numeric field, `0.0` when absent or unparsable
    pub fn number(&self, field: &str) -> f64 {
        self.get(field).map(CellValue::as_number).unwrap_or(0.0)
    }

    /// Display text of a field, `None` when absent or empty
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(CellValue::as_text)
    }

    /// Grouping key for a field, `placeholder` when absent or blank
    pub fn key_or(&self, field: &str, placeholder: &str) -> String {
        match self.get(field) {
            Some(value) if !value.is_blank() => value.to_string(),
            _ => placeholder.to_string(),
        }
    }

    /// Point in time stored in a date field
    ///
    /// `offset` is the spreadsheet's local offset, used for values that carry
    /// no zone of their own.
    pub fn instant(&self, field: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
        match self.get(field)? {
            CellValue::Text(s) => parse_instant(s, offset),
            _ => None,
        }
    }

    /// Calendar date of a date field as seen in the local offset
    pub fn local_date(&self, field: &str, offset: FixedOffset) -> Option<NaiveDate> {
        self.instant(field, offset)
            .map(|dt| dt.with_timezone(&offset).date_naive())
    }
}

impl FromIterator<(String, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (header, value) in iter {
            record.insert(header, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (header, value) in &self.fields {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of header to cell value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Record, A::Error> {
                let mut record = Record::new();
                while let Some((header, value)) = access.next_entry::<String, CellValue>()? {
                    record.insert(header, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Parse the leading number of a string, ignoring leading whitespace
///
/// `"12.5 t"` is 12.5, `"abc"` is `None`.
pub fn parse_leading_number(s: &str) -> Option<f64> {
    let m = NUMBER_PREFIX.find(s.trim_start())?;
    m.as_str().parse::<f64>().ok()
}

/// Parse a date or timestamp cell into a UTC instant
///
/// Accepted forms:
/// - `2025-06-01` (midnight UTC)
/// - RFC 3339 timestamps such as `2025-03-14T21:00:00.000Z`
/// - `2025-06-01T10:30:00` / `2025-06-01 10:30:00` (local offset)
/// - `01.06.2025` and `01.06.2025 10:30:00` (local offset)
pub fn parse_instant(raw: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
    }

    let local_formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%d.%m.%Y %H:%M:%S",
        "%d.%m.%Y %H:%M",
    ];
    for fmt in local_formats {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return to_utc(ndt, offset);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%d.%m.%Y") {
        return date.and_hms_opt(0, 0, 0).and_then(|ndt| to_utc(ndt, offset));
    }

    None
}

fn to_utc(local: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Shortest display form of a number (`1` rather than `1.0`)
fn format_number(n: f64) -> String {
    format!("{}", n)
}
