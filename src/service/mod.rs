//! Remote collaborators: the history search service and the dropdown option providers.

pub mod client;

use serde::{Deserialize, Serialize};

use crate::history::{PicklistOption, RawHistoryRecord};

pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Request body sent to the search service.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub target_user_id: String,
    pub changed_by_user_id: String,
    pub field_name: String,
    pub start_date_str: String,
    pub end_date_str: String,
    pub limit_records: u32,
}

/// Structured error body returned by the service on rejection.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("History service returned HTTP {status}")]
    Rejected { status: u16, body: ErrorBody },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Best-effort message for the user: the structured body message, then the error's own
    /// text, then a fixed fallback.
    pub fn user_message(&self) -> String {
        if let ServiceError::Rejected { body, .. } = self
            && let Some(message) = body.message.as_deref().filter(|m| !m.is_empty())
        {
            return message.to_string();
        }
        let own = self.to_string();
        if own.is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            own
        }
    }
}

/// Executes field-history queries.
/// Implemented by `HistoryApiClient` for production; mock implementations used in tests.
pub trait SearchService {
    async fn search(&self, filters: &SearchFilters) -> Result<Vec<RawHistoryRecord>, ServiceError>;
}

/// Lists users that can be picked as target or editor.
pub trait UserDirectory {
    async fn list_active_users(&self) -> Result<Vec<PicklistOption>, ServiceError>;
}

/// Lists fields with history tracking enabled.
pub trait FieldCatalog {
    async fn list_tracked_fields(&self) -> Result<Vec<PicklistOption>, ServiceError>;
}
