//! Minimal HTML table extraction for snapshot pages.
//!
//! Only the first `<table>` is read. Each `<tr>` with at least one `<td>`
//! becomes a [`RawRow`] of trimmed cell text; header rows built from `<th>`
//! are skipped.

use crate::RawRow;

/// Rows of the first table in `html`, or `None` when the page has no table.
pub fn extract_table_rows(html: &str) -> Option<Vec<RawRow>> {
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let table_open = find_tag(&lower, 0, "table")?;
    let body_start = tag_end(&lower, table_open)?;
    let body_end = lower[body_start..]
        .find("</table")
        .map_or(lower.len(), |offset| body_start + offset);

    let mut rows = Vec::new();
    let mut cursor = body_start;
    while let Some(row_open) = find_tag(&lower[..body_end], cursor, "tr") {
        let Some(row_start) = tag_end(&lower[..body_end], row_open) else {
            break;
        };
        let row_end = [
            lower[row_start..body_end].find("</tr").map(|o| row_start + o),
            find_tag(&lower[..body_end], row_start, "tr"),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(body_end);

        let cells = extract_cells(html, &lower, row_start, row_end);
        if !cells.is_empty() {
            rows.push(RawRow::new(cells));
        }
        cursor = row_end;
    }

    Some(rows)
}

fn extract_cells(html: &str, lower: &str, start: usize, end: usize) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cursor = start;
    while let Some(cell_open) = find_tag(&lower[..end], cursor, "td") {
        let Some(cell_start) = tag_end(&lower[..end], cell_open) else {
            break;
        };
        let cell_end = [
            lower[cell_start..end].find("</td").map(|o| cell_start + o),
            find_tag(&lower[..end], cell_start, "td"),
            find_tag(&lower[..end], cell_start, "th"),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(end);

        cells.push(cell_text(&html[cell_start..cell_end]));
        cursor = cell_end;
    }
    cells
}

/// Byte offset of the next `<name` tag at or after `from`.
fn find_tag(lower: &str, from: usize, name: &str) -> Option<usize> {
    let needle = format!("<{name}");
    let mut cursor = from;
    while cursor < lower.len() {
        let offset = lower[cursor..].find(&needle)?;
        let at = cursor + offset;
        let next = lower[at + needle.len()..].chars().next();
        if matches!(next, Some(ch) if ch == '>' || ch == '/' || ch.is_ascii_whitespace()) {
            return Some(at);
        }
        cursor = at + needle.len();
    }
    None
}

/// Offset just past the `>` closing the tag that opens at `open`.
fn tag_end(lower: &str, open: usize) -> Option<usize> {
    lower[open..].find('>').map(|offset| open + offset + 1)
}

fn cell_text(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for ch in fragment.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    decode_entities(&text).trim().to_owned()
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').and_then(|semi| {
            decode_entity(&tail[1..semi]).map(|ch| (ch, semi))
        }) {
            Some((ch, semi)) => {
                decoded.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                decoded.push('&');
                rest = &tail[1..];
            }
        }
    }
    decoded.push_str(rest);
    decoded
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let hex = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"));
            let code = if let Some(hex) = hex {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_td_rows_and_skips_headers() {
        let html = r#"
            <html><body>
            <TABLE class="quotes">
              <tr><th>date</th><th>id</th></tr>
              <tr><td> 2024-08-27 09:00:00 </td><td><b>rb2410</b></td></tr>
              <tr class="odd"><td>2024-08-27 09:00:00</td><td>hc2410</td></tr>
            </TABLE>
            </body></html>"#;
        let rows = extract_table_rows(html).expect("table present");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells(), &["2024-08-27 09:00:00", "rb2410"]);
        assert_eq!(rows[1].get(1), Some("hc2410"));
    }

    #[test]
    fn page_without_table_is_none() {
        assert_eq!(extract_table_rows("<html><p>maintenance</p></html>"), None);
    }

    #[test]
    fn tolerates_unclosed_cells_and_rows() {
        let html = "<table><tr><td>a<td>b<tr><td>c</table>";
        let rows = extract_table_rows(html).expect("table present");
        let cells: Vec<&[String]> = rows.iter().map(RawRow::cells).collect();
        assert_eq!(cells, vec![&["a", "b"][..], &["c"][..]]);
    }

    #[test]
    fn decodes_entities_and_trims_nbsp() {
        let html = "<table><tr><td>&nbsp;A&amp;B&#x41;&#65;&bogus;</td></tr></table>";
        let rows = extract_table_rows(html).expect("table present");
        assert_eq!(rows[0].get(0), Some("A&BAA&bogus;"));
    }

    #[test]
    fn ignores_lookalike_tags() {
        let html = "<table><track></track><tr><td>x</td></tr></table>";
        let rows = extract_table_rows(html).expect("table present");
        assert_eq!(rows.len(), 1);
    }
}
