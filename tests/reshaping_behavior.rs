//! Behavior-driven tests for turning scraped rows into session groups
//!
//! Raw rows go through the normalizer, the pivot, and the session
//! segmenter; these tests check what comes out at each step.

use quoteline_core::{
    extract_table_rows, DropReason, Field, PivotBuilder, QuoteRecord, QuoteTime, QuoteValues,
    RawRow, RowNormalizer, RowSchema, SessionSegmenter, TradingWindow,
};
use time::Duration;

fn at(hour: u8, minute: u8) -> QuoteTime {
    QuoteTime::from_ymd_hm(2024, 8, 27, hour, minute).expect("valid timestamp")
}

/// A 23-cell scraped row with the meaningful cells filled in.
fn scraped(date: &str, id: &str, y: &str, l: &str, m: &str, s: &str) -> RawRow {
    let mut cells: Vec<String> = (0..23).map(|i| format!("col{i}")).collect();
    cells[0] = date.to_owned();
    cells[1] = id.to_owned();
    cells[3] = y.to_owned();
    cells[20] = l.to_owned();
    cells[21] = m.to_owned();
    cells[22] = s.to_owned();
    RawRow::new(cells)
}

// =============================================================================
// Normalization
// =============================================================================

#[test]
fn unparseable_date_drops_only_that_row() {
    // Given: A batch whose middle row has a garbage date
    let rows = vec![
        scraped("2024-08-27 09:00:00", "rb2410", "1", "2", "3", "4"),
        scraped("not a date", "rb2410", "1", "2", "3", "4"),
        scraped("2024-08-27 09:05:00", "rb2410", "5", "6", "7", "8"),
    ];

    // When: The batch is normalized
    let outcome = RowNormalizer::default().normalize(&rows);

    // Then: The siblings survive in order and the bad row is reported by position
    let times: Vec<QuoteTime> = outcome.records.iter().map(|r| r.date).collect();
    assert_eq!(times, vec![at(9, 0), at(9, 5)]);
    assert_eq!(outcome.dropped_count(), 1);
    assert_eq!(outcome.dropped[0].index, 1);
    assert_eq!(
        outcome.dropped[0].reason,
        DropReason::UnparseableDate {
            value: String::from("not a date")
        }
    );
}

#[test]
fn narrow_rows_are_reported_not_fatal() {
    // Given: A header-like row with only a few cells
    let rows = vec![
        RawRow::from_cells(["date", "id", "name"]),
        scraped("2024-08-27 09:00:00", "A", "1", "1", "1", "1"),
    ];

    // When: The batch is normalized
    let outcome = RowNormalizer::default().normalize(&rows);

    // Then: The narrow row is dropped with its width, and the good row survives
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(
        outcome.dropped[0].reason,
        DropReason::TooShort {
            width: 3,
            required: 23
        }
    );
}

#[test]
fn scraped_number_formats_are_tolerated() {
    // Given: Cells with separators, percent signs, and placeholders
    let row = scraped("2024/08/27 09:00", "A", "3,521", "12.5%", "--", " 7 ");

    // When: The row is normalized
    let record = RowNormalizer::default()
        .normalize_row(&row)
        .expect("row is usable");

    // Then: Numbers parse and placeholders become "no value"
    assert_eq!(record.date, at(9, 0));
    assert_eq!(
        record.values,
        QuoteValues::new(Some(3521.0), Some(12.5), None, Some(7.0))
    );
}

#[test]
fn custom_schema_reads_narrow_feeds() {
    // Given: A feed that puts the six fields in the first six cells
    let schema = RowSchema {
        date: 0,
        id: 1,
        y: 2,
        l: 3,
        m: 4,
        s: 5,
    };
    let normalizer = RowNormalizer::new(schema).expect("distinct positions");
    let row = RawRow::from_cells(["2024-08-27 09:00", "A", "1", "2", "3", "4"]);

    // When/Then: The row normalizes without needing 23 cells
    let record = normalizer.normalize_row(&row).expect("row is usable");
    assert_eq!(record.values.get(Field::S), Some(4.0));
}

#[test]
fn html_snapshot_flows_into_records() {
    // Given: A snapshot page with a header row and one data row
    let cells: Vec<String> = (0..23)
        .map(|i| match i {
            0 => String::from("2024-08-27 09:00:00"),
            1 => String::from("rb2410"),
            3 => String::from("3521"),
            20..=22 => String::from("1.0"),
            _ => String::from("&nbsp;"),
        })
        .collect();
    let html = format!(
        "<html><table><tr><th>date</th><th>id</th></tr><tr>{}</tr></table></html>",
        cells
            .iter()
            .map(|c| format!("<td>{c}</td>"))
            .collect::<String>()
    );

    // When: The page is parsed and normalized
    let rows = extract_table_rows(&html).expect("page has a table");
    let outcome = RowNormalizer::default().normalize(&rows);

    // Then: One record comes out
    assert_eq!(rows.len(), 1);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].values.get(Field::Y), Some(3521.0));
}

// =============================================================================
// Pivot
// =============================================================================

#[test]
fn first_duplicate_wins() {
    // Given: Two records for the same (time, id)
    let records = vec![
        QuoteRecord::new(at(9, 0), "A", QuoteValues::new(Some(1.0), None, None, None)),
        QuoteRecord::new(at(9, 0), "A", QuoteValues::new(Some(2.0), None, None, None)),
    ];

    // When: They are pivoted
    let table = PivotBuilder::new().build(&records);

    // Then: The first one is kept
    assert_eq!(table.value(at(9, 0), Field::Y, "A"), Some(1.0));
    assert_eq!(table.duplicates_discarded(), 1);
}

#[test]
fn lookup_returns_first_seen_values_and_no_value_elsewhere() {
    // Given: A record set across two instruments with a duplicate and gaps
    let v = |y: f64| QuoteValues::new(Some(y), Some(y + 0.1), Some(y + 0.2), Some(y + 0.3));
    let records = vec![
        QuoteRecord::new(at(9, 0), "A", v(1.0)),
        QuoteRecord::new(at(9, 5), "B", v(2.0)),
        QuoteRecord::new(at(9, 0), "A", v(9.0)),
        QuoteRecord::new(at(9, 10), "A", v(3.0)),
        QuoteRecord::new(at(9, 10), "B", QuoteValues::new(None, Some(4.0), None, None)),
    ];

    // When: The table is built
    let table = PivotBuilder::new().build(&records);

    // Then: Every present pair returns its first-seen values
    let mut first_seen = std::collections::BTreeMap::new();
    for record in &records {
        first_seen
            .entry((record.date, record.id.clone()))
            .or_insert(record.values);
    }
    for ((time, id), values) in &first_seen {
        assert_eq!(table.values(*time, id), Some(*values), "{time} {id}");
    }

    // And: Every absent pair is "no value", never zero
    for time in table.times() {
        for id in ["A", "B"] {
            if !first_seen.contains_key(&(*time, id.to_owned())) {
                assert_eq!(table.values(*time, id), None);
                for field in Field::ALL {
                    assert_eq!(table.value(*time, field, id), None);
                }
            }
        }
    }

    // And: Columns are grouped by field, then instrument
    let keys: Vec<(Field, String)> = table
        .column_keys()
        .map(|key| (key.field, key.id.clone()))
        .collect();
    assert_eq!(keys.len(), 8);
    assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(keys[0], (Field::Y, String::from("A")));
    assert_eq!(keys[1], (Field::Y, String::from("B")));
}

#[test]
fn empty_input_builds_an_explicitly_empty_table() {
    // Given: No records at all
    let records: Vec<QuoteRecord> = Vec::new();

    // When: They are pivoted
    let table = PivotBuilder::new().build(&records);

    // Then: The table is empty rather than an error
    assert!(table.is_empty());
    assert_eq!(table.instrument_count(), 0);
    assert!(table.series("A").is_none());
}

// =============================================================================
// Sessions
// =============================================================================

#[test]
fn all_missing_rows_are_dropped_before_segmenting() {
    // Given: Two full rows and a later all-missing row for one instrument
    let full = QuoteValues::new(Some(1.0), Some(2.0), Some(3.0), Some(4.0));
    let records = vec![
        QuoteRecord::new(at(9, 0), "A", full),
        QuoteRecord::new(at(9, 5), "A", full),
        QuoteRecord::new(at(10, 30), "A", QuoteValues::default()),
    ];
    let table = PivotBuilder::new().build(&records);
    let series = table.series("A").expect("instrument present");

    // When: The series is segmented
    let groups = SessionSegmenter::with_windows(TradingWindow::defaults()).segments(&series);

    // Then: One group of two rows
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].times().collect::<Vec<_>>(), vec![at(9, 0), at(9, 5)]);
}

#[test]
fn gaps_longer_than_an_hour_split_sessions() {
    // Given: Rows at 09:00, 09:05, 11:00, 13:31
    let full = QuoteValues::new(Some(1.0), Some(2.0), Some(3.0), Some(4.0));
    let records: Vec<QuoteRecord> = [at(9, 0), at(9, 5), at(11, 0), at(13, 31)]
        .into_iter()
        .map(|time| QuoteRecord::new(time, "A", full))
        .collect();
    let series = PivotBuilder::new()
        .build(&records)
        .series("A")
        .expect("instrument present");

    // When: Segmented with the default one-hour gap
    let groups = SessionSegmenter::with_windows(TradingWindow::defaults()).segments(&series);

    // Then: 09:05 -> 11:00 (1h55m) and 11:00 -> 13:31 (2h31m) both split
    let shape: Vec<usize> = groups.iter().map(|g| g.len()).collect();
    assert_eq!(shape, vec![2, 1, 1]);

    // And: Every group keeps neighbours at most one hour apart
    for group in &groups {
        let times: Vec<QuoteTime> = group.times().collect();
        assert!(times.windows(2).all(|w| w[1] - w[0] <= Duration::hours(1)));
    }
}

#[test]
fn exactly_one_hour_does_not_split() {
    // Given: Rows exactly one hour apart inside the morning window
    let full = QuoteValues::new(Some(1.0), None, None, None);
    let records = vec![
        QuoteRecord::new(at(9, 0), "A", full),
        QuoteRecord::new(at(10, 0), "A", full),
        QuoteRecord::new(at(11, 1), "A", full),
    ];
    let series = PivotBuilder::new()
        .build(&records)
        .series("A")
        .expect("instrument present");

    // When: Segmented
    let groups = SessionSegmenter::with_windows(TradingWindow::defaults()).segments(&series);

    // Then: 09:00 and 10:00 stay together; 11:01 (61 minutes later) starts anew
    let shape: Vec<usize> = groups.iter().map(|g| g.len()).collect();
    assert_eq!(shape, vec![2, 1]);
}

#[test]
fn rows_outside_trading_hours_never_reach_a_session() {
    // Given: A lunch-break row between two morning and afternoon rows
    let full = QuoteValues::new(Some(1.0), None, None, None);
    let records = vec![
        QuoteRecord::new(at(11, 30), "A", full),
        QuoteRecord::new(at(12, 15), "A", full),
        QuoteRecord::new(at(13, 30), "A", full),
    ];
    let series = PivotBuilder::new()
        .build(&records)
        .series("A")
        .expect("instrument present");

    // When: Segmented
    let groups = SessionSegmenter::with_windows(TradingWindow::defaults()).segments(&series);

    // Then: The 12:15 row is gone, so the two-hour lunch gap splits the sessions
    let shape: Vec<Vec<QuoteTime>> = groups.iter().map(|g| g.times().collect()).collect();
    assert_eq!(shape, vec![vec![at(11, 30)], vec![at(13, 30)]]);
}
