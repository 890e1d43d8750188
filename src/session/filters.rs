use crate::service::SearchFilters;

pub const DEFAULT_RECORD_LIMIT: u32 = 100;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Start date cannot be after end date")]
    StartAfterEnd,
}

/// Search criteria. Empty strings mean "no constraint".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub target_user_id: String,
    pub changed_by_user_id: String,
    pub field_name: String,
    pub start_date: String,
    pub end_date: String,
    pub record_limit: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            target_user_id: String::new(),
            changed_by_user_id: String::new(),
            field_name: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            record_limit: DEFAULT_RECORD_LIMIT,
        }
    }
}

impl FilterState {
    /// Dates are compared as strings, which orders ISO `YYYY-MM-DD` values chronologically.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.start_date.is_empty()
            && !self.end_date.is_empty()
            && self.start_date > self.end_date
        {
            return Err(ValidationError::StartAfterEnd);
        }
        Ok(())
    }

    pub fn to_request(&self) -> SearchFilters {
        SearchFilters {
            target_user_id: self.target_user_id.clone(),
            changed_by_user_id: self.changed_by_user_id.clone(),
            field_name: self.field_name.clone(),
            start_date_str: self.start_date.clone(),
            end_date_str: self.end_date.clone(),
            limit_records: self.record_limit,
        }
    }
}
