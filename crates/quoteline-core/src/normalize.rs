//! Raw row normalization into [`QuoteRecord`]s.
//!
//! Scraped rows are wide and loosely typed. [`RowSchema`] names the handful of
//! positions that matter; anything narrower than the schema is rejected by a
//! single width check instead of failing on an index.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{
    parse_quote_number, Field, QuoteRecord, QuoteTime, QuoteValues, RawRow, ValidationError,
};

/// Positions of the meaningful cells inside a [`RawRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSchema {
    pub date: usize,
    pub id: usize,
    pub y: usize,
    pub l: usize,
    pub m: usize,
    pub s: usize,
}

impl Default for RowSchema {
    fn default() -> Self {
        Self {
            date: 0,
            id: 1,
            y: 3,
            l: 20,
            m: 21,
            s: 22,
        }
    }
}

impl RowSchema {
    pub const fn position(&self, field: Field) -> usize {
        match field {
            Field::Y => self.y,
            Field::L => self.l,
            Field::M => self.m,
            Field::S => self.s,
        }
    }

    fn named_positions(&self) -> [(&'static str, usize); 6] {
        [
            ("date", self.date),
            ("id", self.id),
            ("y", self.y),
            ("l", self.l),
            ("m", self.m),
            ("s", self.s),
        ]
    }

    /// Smallest row width that holds every mapped position.
    pub fn min_width(&self) -> usize {
        self.named_positions()
            .iter()
            .map(|(_, position)| position + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let named = self.named_positions();
        for (index, (first, position)) in named.iter().enumerate() {
            if let Some((second, _)) = named[index + 1..]
                .iter()
                .find(|(_, other)| other == position)
            {
                return Err(ValidationError::DuplicateSchemaPosition {
                    position: *position,
                    first: *first,
                    second: *second,
                });
            }
        }
        Ok(())
    }
}

/// Why a raw row did not become a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DropReason {
    TooShort { width: usize, required: usize },
    UnparseableDate { value: String },
    EmptyInstrumentId,
}

impl Display for DropReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort { width, required } => {
                write!(f, "row has {width} cells, schema needs {required}")
            }
            Self::UnparseableDate { value } => write!(f, "unparseable date '{value}'"),
            Self::EmptyInstrumentId => f.write_str("empty instrument id"),
        }
    }
}

/// A rejected row and its position inside the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRow {
    pub index: usize,
    #[serde(flatten)]
    pub reason: DropReason,
}

/// Result of normalizing one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeOutcome {
    pub records: Vec<QuoteRecord>,
    pub dropped: Vec<DroppedRow>,
}

impl NormalizeOutcome {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Turns [`RawRow`]s into [`QuoteRecord`]s according to a [`RowSchema`].
#[derive(Debug, Clone, Default)]
pub struct RowNormalizer {
    schema: RowSchema,
}

impl RowNormalizer {
    pub fn new(schema: RowSchema) -> Result<Self, ValidationError> {
        schema.validate()?;
        Ok(Self { schema })
    }

    pub const fn schema(&self) -> &RowSchema {
        &self.schema
    }

    /// Normalize a batch. Bad rows are dropped and reported; output keeps input order.
    pub fn normalize<'r, I>(&self, rows: I) -> NormalizeOutcome
    where
        I: IntoIterator<Item = &'r RawRow>,
    {
        let mut outcome = NormalizeOutcome::default();
        for (index, row) in rows.into_iter().enumerate() {
            match self.normalize_row(row) {
                Ok(record) => outcome.records.push(record),
                Err(reason) => outcome.dropped.push(DroppedRow { index, reason }),
            }
        }
        outcome
    }

    pub fn normalize_row(&self, row: &RawRow) -> Result<QuoteRecord, DropReason> {
        let required = self.schema.min_width();
        if row.len() < required {
            return Err(DropReason::TooShort {
                width: row.len(),
                required,
            });
        }

        // Width was checked above, so every mapped position exists.
        let cell = |position: usize| row.get(position).unwrap_or_default();

        let raw_date = cell(self.schema.date);
        let date = QuoteTime::parse_lenient(raw_date).ok_or_else(|| {
            DropReason::UnparseableDate {
                value: raw_date.to_owned(),
            }
        })?;

        let id = cell(self.schema.id).trim();
        if id.is_empty() {
            return Err(DropReason::EmptyInstrumentId);
        }

        let mut values = QuoteValues::default();
        for field in Field::ALL {
            values.set(field, parse_quote_number(cell(self.schema.position(field))));
        }

        Ok(QuoteRecord::new(date, id, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_row(date: &str, id: &str, y: &str, l: &str, m: &str, s: &str) -> RawRow {
        let mut cells = vec![String::new(); 23];
        cells[0] = date.to_owned();
        cells[1] = id.to_owned();
        cells[3] = y.to_owned();
        cells[20] = l.to_owned();
        cells[21] = m.to_owned();
        cells[22] = s.to_owned();
        RawRow::new(cells)
    }

    #[test]
    fn default_schema_needs_23_cells() {
        assert_eq!(RowSchema::default().min_width(), 23);
        assert!(RowSchema::default().validate().is_ok());
    }

    #[test]
    fn duplicate_positions_rejected() {
        let schema = RowSchema {
            m: 20,
            ..RowSchema::default()
        };
        let err = schema.validate().expect_err("must fail");
        assert_eq!(
            err,
            ValidationError::DuplicateSchemaPosition {
                position: 20,
                first: "l",
                second: "m",
            }
        );
    }

    #[test]
    fn extracts_named_positions() {
        let normalizer = RowNormalizer::default();
        let row = wide_row("2024-08-27 09:00:00", " rb2410 ", "3521", "1.5", "2.5", "3.5");
        let record = normalizer.normalize_row(&row).expect("valid row");
        assert_eq!(record.id, "rb2410");
        assert_eq!(record.values, QuoteValues::new(Some(3521.0), Some(1.5), Some(2.5), Some(3.5)));
    }

    #[test]
    fn bad_numbers_become_missing_not_dropped() {
        let normalizer = RowNormalizer::default();
        let row = wide_row("2024-08-27 09:00:00", "A", "--", "", "x", "1");
        let record = normalizer.normalize_row(&row).expect("valid row");
        assert_eq!(record.values, QuoteValues::new(None, None, None, Some(1.0)));
    }

    #[test]
    fn short_and_undated_rows_are_dropped_in_place() {
        let normalizer = RowNormalizer::default();
        let rows = vec![
            wide_row("2024-08-27 09:00:00", "A", "1", "1", "1", "1"),
            RawRow::from_cells(["2024-08-27 09:00:00", "B"]),
            wide_row("garbage", "C", "1", "1", "1", "1"),
            wide_row("2024-08-27 09:05:00", "", "1", "1", "1", "1"),
            wide_row("2024-08-27 09:05:00", "D", "2", "2", "2", "2"),
        ];
        let outcome = normalizer.normalize(&rows);

        let ids: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "D"]);
        assert_eq!(outcome.dropped_count(), 3);
        assert_eq!(
            outcome.dropped[0],
            DroppedRow {
                index: 1,
                reason: DropReason::TooShort {
                    width: 2,
                    required: 23
                }
            }
        );
        assert!(matches!(outcome.dropped[1].reason, DropReason::UnparseableDate { .. }));
        assert_eq!(outcome.dropped[2].reason, DropReason::EmptyInstrumentId);
    }
}
