use serde::{Deserialize, Serialize};

/// A field-history record as returned by the search service.
///
/// Optional text fields may be absent, `null`, or empty; identifiers default to `""`
/// so one malformed record never fails the whole batch.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawHistoryRecord {
    #[serde(default)]
    pub record_id: String,
    #[serde(default)]
    pub user_id: String,
    pub user_name: Option<String>,
    pub changed_field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    #[serde(default)]
    pub changed_by: String,
    pub changed_by_name: Option<String>,
    #[serde(default)]
    pub date_changed: String,
    pub time_changed: Option<TimeValue>,
}

/// Shapes a `timeChanged` value can arrive in. Variants are tried in declaration order.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TimeValue {
    Text(String),
    Numeric(f64),
    Structured {
        hour: u32,
        minute: u32,
        #[serde(default)]
        second: u32,
        #[serde(default)]
        millisecond: u32,
    },
    Other(serde_json::Value),
}

/// A normalized table row. Every text field is a total string.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub record_id: String,
    pub user_id: String,
    pub user_name: String,
    pub changed_field: String,
    pub old_value: String,
    pub new_value: String,
    pub changed_by: String,
    pub changed_by_name: String,
    pub date_changed: String,
    pub time_changed: String,
}

impl HistoryRow {
    /// Look up a cell by its camelCase column key. Unknown keys return `None`.
    pub fn cell(&self, column: &str) -> Option<&str> {
        let value = match column {
            "recordId" => &self.record_id,
            "userId" => &self.user_id,
            "userName" => &self.user_name,
            "changedField" => &self.changed_field,
            "oldValue" => &self.old_value,
            "newValue" => &self.new_value,
            "changedBy" => &self.changed_by,
            "changedByName" => &self.changed_by_name,
            "dateChanged" => &self.date_changed,
            "timeChanged" => &self.time_changed,
            _ => return None,
        };
        Some(value)
    }
}

/// A dropdown entry from the user directory or field catalog.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PicklistOption {
    pub label: String,
    pub value: String,
}

impl PicklistOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_record_decodes_camel_case_with_missing_optionals() {
        let raw: RawHistoryRecord = serde_json::from_value(serde_json::json!({
            "recordId": "a0X1",
            "userId": "005A",
            "changedBy": "005B",
            "dateChanged": "2024-03-01",
            "userName": null
        }))
        .unwrap();
        assert_eq!(raw.record_id, "a0X1");
        assert_eq!(raw.date_changed, "2024-03-01");
        assert!(raw.user_name.is_none());
        assert!(raw.time_changed.is_none());
    }

    #[test]
    fn time_value_decodes_each_shape() {
        let text: TimeValue = serde_json::from_str(r#""10:15:00.000Z""#).unwrap();
        assert_eq!(text, TimeValue::Text("10:15:00.000Z".into()));

        let numeric: TimeValue = serde_json::from_str("36900000").unwrap();
        assert_eq!(numeric, TimeValue::Numeric(36_900_000.0));

        let structured: TimeValue =
            serde_json::from_str(r#"{"hour": 9, "minute": 5, "second": 7}"#).unwrap();
        assert_eq!(
            structured,
            TimeValue::Structured {
                hour: 9,
                minute: 5,
                second: 7,
                millisecond: 0
            }
        );

        let other: TimeValue = serde_json::from_str("true").unwrap();
        assert_eq!(other, TimeValue::Other(serde_json::Value::Bool(true)));
    }

    #[test]
    fn cell_lookup_by_column_key() {
        let row = HistoryRow {
            user_name: "Ada".into(),
            date_changed: "2024-01-15".into(),
            ..Default::default()
        };
        assert_eq!(row.cell("userName"), Some("Ada"));
        assert_eq!(row.cell("dateChanged"), Some("2024-01-15"));
        assert_eq!(row.cell("oldValue"), Some(""));
        assert_eq!(row.cell("nope"), None);
    }

    #[test]
    fn row_serializes_camel_case() {
        let row = HistoryRow {
            changed_by_name: "Grace".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["changedByName"], "Grace");
        assert_eq!(json["timeChanged"], "");
    }
}
