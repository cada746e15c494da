//! Reshaping of [`QuoteRecord`]s into a wide, time-indexed [`QuoteTable`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{Field, QuoteRecord, QuoteTime, QuoteValues};

/// Column identifier. Ordering is field-major, then instrument id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnKey {
    pub field: Field,
    pub id: String,
}

impl ColumnKey {
    pub fn new(field: Field, id: impl Into<String>) -> Self {
        Self {
            field,
            id: id.into(),
        }
    }
}

/// One row of an instrument cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    pub time: QuoteTime,
    #[serde(flatten)]
    pub values: QuoteValues,
}

/// Every table row for a single instrument, in time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSeries {
    pub id: String,
    pub rows: Vec<SeriesRow>,
}

/// Wide quote table: one row per distinct time, one column per (field, id).
///
/// Cells that were never observed hold `None`, never zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteTable {
    times: Vec<QuoteTime>,
    instruments: BTreeSet<String>,
    columns: BTreeMap<ColumnKey, Vec<Option<f64>>>,
    observed: BTreeSet<(QuoteTime, String)>,
    duplicates_discarded: usize,
}

impl QuoteTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of rows (distinct times).
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn times(&self) -> &[QuoteTime] {
        &self.times
    }

    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.instruments.iter().map(String::as_str)
    }

    pub fn instrument_count(&self) -> usize {
        self.instruments.len()
    }

    pub fn contains_instrument(&self, id: &str) -> bool {
        self.instruments.contains(id)
    }

    pub fn column_keys(&self) -> impl Iterator<Item = &ColumnKey> {
        self.columns.keys()
    }

    pub fn column(&self, field: Field, id: &str) -> Option<&[Option<f64>]> {
        self.columns
            .get(&ColumnKey::new(field, id))
            .map(Vec::as_slice)
    }

    /// Records that lost to an earlier record with the same (time, id).
    pub const fn duplicates_discarded(&self) -> usize {
        self.duplicates_discarded
    }

    pub fn value(&self, time: QuoteTime, field: Field, id: &str) -> Option<f64> {
        let row = self.row_index(time)?;
        self.column(field, id)?.get(row).copied().flatten()
    }

    /// Values for (time, id), or `None` when that pair was never observed.
    pub fn values(&self, time: QuoteTime, id: &str) -> Option<QuoteValues> {
        if !self.observed.contains(&(time, id.to_owned())) {
            return None;
        }
        let mut values = QuoteValues::default();
        for field in Field::ALL {
            values.set(field, self.value(time, field, id));
        }
        Some(values)
    }

    /// Cross-section for one instrument over every table time.
    pub fn series(&self, id: &str) -> Option<InstrumentSeries> {
        if !self.instruments.contains(id) {
            return None;
        }
        let columns = Field::ALL.map(|field| self.column(field, id));
        let rows = self
            .times
            .iter()
            .enumerate()
            .map(|(row, time)| {
                let mut values = QuoteValues::default();
                for (field, column) in Field::ALL.iter().zip(columns) {
                    let cell = column.and_then(|cells| cells.get(row).copied().flatten());
                    values.set(*field, cell);
                }
                SeriesRow {
                    time: *time,
                    values,
                }
            })
            .collect();
        Some(InstrumentSeries {
            id: id.to_owned(),
            rows,
        })
    }

    fn row_index(&self, time: QuoteTime) -> Option<usize> {
        self.times.binary_search(&time).ok()
    }
}

/// Builds a [`QuoteTable`] with stable first-wins deduplication.
#[derive(Debug, Clone, Copy, Default)]
pub struct PivotBuilder;

impl PivotBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Pivot `records` by time. When a (time, id) pair repeats, the first
    /// record in input order is kept and later ones are discarded.
    pub fn build<'r, I>(&self, records: I) -> QuoteTable
    where
        I: IntoIterator<Item = &'r QuoteRecord>,
    {
        let mut first_seen: BTreeMap<(QuoteTime, String), QuoteValues> = BTreeMap::new();
        let mut duplicates_discarded = 0;
        for record in records {
            let key = (record.date, record.id.clone());
            if first_seen.contains_key(&key) {
                duplicates_discarded += 1;
                continue;
            }
            first_seen.insert(key, record.values);
        }

        if first_seen.is_empty() {
            return QuoteTable::empty();
        }

        let times: Vec<QuoteTime> = first_seen
            .keys()
            .map(|(time, _)| *time)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let instruments: BTreeSet<String> =
            first_seen.keys().map(|(_, id)| id.clone()).collect();

        let mut columns = BTreeMap::new();
        for field in Field::ALL {
            for id in &instruments {
                columns.insert(ColumnKey::new(field, id.as_str()), vec![None; times.len()]);
            }
        }

        for ((time, id), values) in &first_seen {
            let Ok(row) = times.binary_search(time) else {
                continue;
            };
            for field in Field::ALL {
                if let Some(cells) = columns.get_mut(&ColumnKey::new(field, id.as_str())) {
                    cells[row] = values.get(field);
                }
            }
        }

        QuoteTable {
            times,
            instruments,
            columns,
            observed: first_seen.into_keys().collect(),
            duplicates_discarded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u8, minute: u8) -> QuoteTime {
        QuoteTime::from_ymd_hm(2024, 8, 27, hour, minute).expect("valid timestamp")
    }

    fn record(time: QuoteTime, id: &str, y: f64) -> QuoteRecord {
        QuoteRecord::new(time, id, QuoteValues::new(Some(y), Some(y), Some(y), Some(y)))
    }

    #[test]
    fn first_occurrence_wins() {
        let records = vec![record(at(9, 0), "A", 1.0), record(at(9, 0), "A", 2.0)];
        let table = PivotBuilder::new().build(&records);
        assert_eq!(table.value(at(9, 0), Field::Y, "A"), Some(1.0));
        assert_eq!(table.duplicates_discarded(), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_pairs_are_none_not_zero() {
        let records = vec![record(at(9, 0), "A", 1.0), record(at(9, 5), "B", 2.0)];
        let table = PivotBuilder::new().build(&records);
        assert_eq!(table.value(at(9, 5), Field::Y, "A"), None);
        assert_eq!(table.values(at(9, 5), "A"), None);
        assert_eq!(table.column(Field::L, "A"), Some(&[Some(1.0), None][..]));
    }

    #[test]
    fn columns_are_field_major() {
        let records = vec![record(at(9, 0), "B", 1.0), record(at(9, 0), "A", 1.0)];
        let table = PivotBuilder::new().build(&records);
        let keys: Vec<String> = table
            .column_keys()
            .map(|key| format!("{}:{}", key.field, key.id))
            .collect();
        assert_eq!(
            keys,
            vec!["y:A", "y:B", "l:A", "l:B", "m:A", "m:B", "s:A", "s:B"]
        );
    }

    #[test]
    fn rows_are_time_sorted() {
        let records = vec![record(at(10, 0), "A", 2.0), record(at(9, 0), "A", 1.0)];
        let table = PivotBuilder::new().build(&records);
        assert_eq!(table.times(), &[at(9, 0), at(10, 0)]);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = PivotBuilder::new().build(&Vec::<QuoteRecord>::new());
        assert!(table.is_empty());
        assert_eq!(table.instrument_count(), 0);
        assert_eq!(table, QuoteTable::empty());
    }

    #[test]
    fn series_spans_every_table_time() {
        let records = vec![record(at(9, 0), "A", 1.0), record(at(9, 5), "B", 2.0)];
        let table = PivotBuilder::new().build(&records);
        let series = table.series("A").expect("present");
        assert_eq!(series.rows.len(), 2);
        assert!(series.rows[1].values.is_empty());
        assert!(table.series("Z").is_none());
    }

    #[test]
    fn observed_all_missing_pair_is_distinct_from_absent() {
        let records = vec![QuoteRecord::new(at(9, 0), "A", QuoteValues::default())];
        let table = PivotBuilder::new().build(&records);
        assert_eq!(table.values(at(9, 0), "A"), Some(QuoteValues::default()));
        assert_eq!(table.values(at(9, 0), "B"), None);
    }
}
