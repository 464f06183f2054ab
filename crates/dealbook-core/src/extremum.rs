//! Record deal lookup

use crate::record::Record;

/// The record with the largest value of `field`
///
/// Only a strictly larger value replaces the current maximum, so the first
/// record wins ties. Returns `None` for an empty input.
pub fn max_by_field<'a, I>(records: I, field: &str) -> Option<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut best: Option<(&Record, f64)> = None;
    for record in records {
        let value = record.number(field);
        match best {
            Some((_, max)) if value <= max => {}
            _ => best = Some((record, value)),
        }
    }
    best.map(|(record, _)| record)
}
