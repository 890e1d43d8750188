use chrono::NaiveDate;

use super::types::HistoryRow;

pub const CSV_HEADER: &str =
    "User,Field Changed,Old Value,New Value,Changed By,Date Changed,Time Changed";

/// A CSV export ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub contents: String,
}

/// Quote a field if it contains a comma, double quote, or newline; inner quotes are doubled.
fn escape_csv_value(s: &str) -> String {
    if !s.contains([',', '"', '\n']) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Serialize rows as CSV with a fixed header. Every line ends with `\n`.
pub fn to_csv(rows: &[HistoryRow]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for row in rows {
        let fields = [
            &row.user_name,
            &row.changed_field,
            &row.old_value,
            &row.new_value,
            &row.changed_by_name,
            &row.date_changed,
            &row.time_changed,
        ];
        let line: Vec<String> = fields.iter().map(|f| escape_csv_value(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("user_history_{}.csv", date.format("%Y-%m-%d"))
}
