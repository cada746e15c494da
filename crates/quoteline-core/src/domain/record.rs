use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::QuoteTime;

/// One scraped table row, cells in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(Vec<String>);

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self(cells)
    }

    pub fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(cells.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.0.get(position).map(String::as_str)
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for RawRow {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

/// Numeric quote fields carried per instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Quoted value.
    Y,
    /// Long level.
    L,
    /// Medium level.
    M,
    /// Short level.
    S,
}

impl Field {
    pub const ALL: [Self; 4] = [Self::Y, Self::L, Self::M, Self::S];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Y => "y",
            Self::L => "l",
            Self::M => "m",
            Self::S => "s",
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four numeric fields of one observation. `None` means "no value".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteValues {
    pub y: Option<f64>,
    pub l: Option<f64>,
    pub m: Option<f64>,
    pub s: Option<f64>,
}

impl QuoteValues {
    pub const fn new(y: Option<f64>, l: Option<f64>, m: Option<f64>, s: Option<f64>) -> Self {
        Self { y, l, m, s }
    }

    pub const fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Y => self.y,
            Field::L => self.l,
            Field::M => self.m,
            Field::S => self.s,
        }
    }

    pub fn set(&mut self, field: Field, value: Option<f64>) {
        match field {
            Field::Y => self.y = value,
            Field::L => self.l = value,
            Field::M => self.m = value,
            Field::S => self.s = value,
        }
    }

    /// True when every field is missing.
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|field| self.get(*field).is_none())
    }
}

/// Normalized observation of one instrument at one time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub date: QuoteTime,
    pub id: String,
    #[serde(flatten)]
    pub values: QuoteValues,
}

impl QuoteRecord {
    pub fn new(date: QuoteTime, id: impl Into<String>, values: QuoteValues) -> Self {
        Self {
            date,
            id: id.into(),
            values,
        }
    }
}

/// Parse a numeric table cell; blanks and placeholders become `None`.
pub fn parse_quote_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if matches!(trimmed, "" | "-" | "--" | "—") {
        return None;
    }
    let cleaned: String = trimmed
        .trim_end_matches('%')
        .chars()
        .filter(|ch| *ch != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_decorated_numbers() {
        assert_eq!(parse_quote_number("3521"), Some(3521.0));
        assert_eq!(parse_quote_number(" -12.5 "), Some(-12.5));
        assert_eq!(parse_quote_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_quote_number("4.2%"), Some(4.2));
    }

    #[test]
    fn placeholders_are_missing() {
        for cell in ["", "  ", "-", "--", "N/A", "nan", "inf", "abc"] {
            assert_eq!(parse_quote_number(cell), None, "cell {cell:?}");
        }
    }

    #[test]
    fn empty_values_detected() {
        assert!(QuoteValues::default().is_empty());
        let mut values = QuoteValues::default();
        values.set(Field::M, Some(1.0));
        assert!(!values.is_empty());
        assert_eq!(values.get(Field::M), Some(1.0));
    }
}
