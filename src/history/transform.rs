use chrono::NaiveTime;

use super::types::{HistoryRow, RawHistoryRecord, TimeValue};

pub const UNKNOWN_USER: &str = "Unknown User";
pub const UNKNOWN_FIELD: &str = "Unknown Field";

/// Time components that do not form a valid time of day.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid time {hour}:{minute}:{second}.{millisecond}")]
pub struct FormatError {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
}

/// Normalize a raw record into a table row. Never fails and never logs.
pub fn transform(raw: &RawHistoryRecord) -> HistoryRow {
    HistoryRow {
        record_id: raw.record_id.clone(),
        user_id: raw.user_id.clone(),
        user_name: or_fallback(raw.user_name.as_deref(), UNKNOWN_USER),
        changed_field: or_fallback(raw.changed_field.as_deref(), UNKNOWN_FIELD),
        old_value: or_fallback(raw.old_value.as_deref(), ""),
        new_value: or_fallback(raw.new_value.as_deref(), ""),
        changed_by: raw.changed_by.clone(),
        changed_by_name: or_fallback(raw.changed_by_name.as_deref(), UNKNOWN_USER),
        date_changed: raw.date_changed.clone(),
        time_changed: format_time(raw.time_changed.as_ref()),
    }
}

fn or_fallback(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

/// Render a `timeChanged` value as text; conversion failures yield `""`.
pub fn format_time(value: Option<&TimeValue>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match value {
        TimeValue::Text(s) => s.clone(),
        TimeValue::Numeric(n) if *n == 0.0 || n.is_nan() => String::new(),
        TimeValue::Numeric(n) => format_number(*n),
        TimeValue::Structured {
            hour,
            minute,
            second,
            millisecond,
        } => format_structured(*hour, *minute, *second, *millisecond).unwrap_or_default(),
        TimeValue::Other(serde_json::Value::Null | serde_json::Value::Bool(false)) => {
            String::new()
        }
        TimeValue::Other(v) => v.to_string(),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn format_structured(
    hour: u32,
    minute: u32,
    second: u32,
    millisecond: u32,
) -> Result<String, FormatError> {
    let invalid = FormatError {
        hour,
        minute,
        second,
        millisecond,
    };
    // chrono reads 1000..2000 ms as a leap second; reject it
    if millisecond >= 1000 {
        return Err(invalid);
    }
    let time = NaiveTime::from_hms_milli_opt(hour, minute, second, millisecond).ok_or(invalid)?;
    Ok(time.format("%H:%M:%S%.3f").to_string())
}
