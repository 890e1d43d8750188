use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{ErrorBody, FieldCatalog, SearchFilters, SearchService, ServiceError, UserDirectory};
use crate::history::{PicklistOption, RawHistoryRecord};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("HISTORY_API_URL not set. Point it at the field-history service base URL.")]
    UrlNotSet,

    #[error("Invalid HISTORY_API_URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Clone)]
struct ApiToken(String);

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// HTTP/JSON client for the field-history service.
///
/// Configuration via environment variables:
/// - `HISTORY_API_URL`: service base URL (required, http or https)
/// - `HISTORY_API_TOKEN`: bearer token (optional)
#[derive(Clone, Debug)]
pub struct HistoryApiClient {
    http: Client,
    token: Option<ApiToken>,
    base_url: String,
}

impl HistoryApiClient {
    pub fn from_env(http: Client) -> Result<Self, ConfigError> {
        let raw_url = env::var("HISTORY_API_URL").map_err(|_| ConfigError::UrlNotSet)?;
        let token = env::var("HISTORY_API_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(ApiToken);
        if token.is_none() {
            debug!("HISTORY_API_TOKEN not set, sending unauthenticated requests");
        }
        Ok(Self {
            http,
            token,
            base_url: validate_base_url(&raw_url)?,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            token: Some(ApiToken("test-token".to_string())),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let mut req = self
            .http
            .request(method, &url)
            .header("Accept", "application/json")
            .header("User-Agent", crate::USER_AGENT)
            .timeout(REQUEST_TIMEOUT);
        if let Some(token) = &self.token {
            req = req.bearer_auth(&token.0);
        }
        req
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ServiceError> {
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body = serde_json::from_str::<ErrorBody>(&text).unwrap_or_default();
            warn!(status = %status, message = ?body.message, "history service rejected request");
            return Err(ServiceError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// Accept only absolute http(s) URLs; strip the trailing slash so paths can be appended.
fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: trimmed.to_string(),
        reason,
    };
    let parsed = url::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

impl SearchService for HistoryApiClient {
    async fn search(&self, filters: &SearchFilters) -> Result<Vec<RawHistoryRecord>, ServiceError> {
        let req = self.request(reqwest::Method::POST, "/search").json(filters);
        let records: Vec<RawHistoryRecord> = self.send_json(req).await?;
        debug!(count = records.len(), "history search complete");
        Ok(records)
    }
}

impl UserDirectory for HistoryApiClient {
    async fn list_active_users(&self) -> Result<Vec<PicklistOption>, ServiceError> {
        self.send_json(self.request(reqwest::Method::GET, "/users"))
            .await
    }
}

impl FieldCatalog for HistoryApiClient {
    async fn list_tracked_fields(&self) -> Result<Vec<PicklistOption>, ServiceError> {
        self.send_json(self.request(reqwest::Method::GET, "/fields"))
            .await
    }
}
