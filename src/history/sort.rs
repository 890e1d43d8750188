use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::types::HistoryRow;

pub const DATE_COLUMN: &str = "dateChanged";

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Current table ordering: a camelCase column key and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            column: DATE_COLUMN.to_string(),
            direction: SortDirection::Asc,
        }
    }
}

/// Comparison key for one cell. Invalid dates order before every valid date.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey<'a> {
    Date(Option<NaiveDate>),
    Text(&'a str),
}

fn sort_key<'a>(row: &'a HistoryRow, column: &str) -> SortKey<'a> {
    let text = row.cell(column).unwrap_or("");
    if column == DATE_COLUMN {
        SortKey::Date(parse_date(text))
    } else {
        SortKey::Text(text)
    }
}

/// Parse `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Return `rows` reordered by `column`. Equal keys keep their input order.
///
/// Unknown columns compare every row as `""`, which leaves the order unchanged.
pub fn sort(rows: &[HistoryRow], column: &str, direction: SortDirection) -> Vec<HistoryRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        let (ka, kb) = (sort_key(a, column), sort_key(b, column));
        match direction {
            SortDirection::Asc => ka.cmp(&kb),
            SortDirection::Desc => kb.cmp(&ka),
        }
    });
    sorted
}

/// Convenience over [`sort`] for a stored [`SortSpec`].
pub fn sort_by_spec(rows: &[HistoryRow], spec: &SortSpec) -> Vec<HistoryRow> {
    sort(rows, &spec.column, spec.direction)
}
