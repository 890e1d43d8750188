//! Search session: filter state, search dispatch, and the rows shown to the user.

mod filters;
pub mod notify;

pub use filters::{DEFAULT_RECORD_LIMIT, FilterState, ValidationError};
pub use notify::{NotificationSink, Severity, TracingNotifier};

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

use crate::history::{
    CsvExport, HistoryRow, PicklistOption, RawHistoryRecord, SortDirection, SortSpec,
    export_file_name, sort, to_csv, transform,
};
use crate::service::{
    FieldCatalog, SearchFilters, SearchService, ServiceError, UserDirectory,
};

pub const ALL_USERS_LABEL: &str = "-- All Users --";
pub const ALL_FIELDS_LABEL: &str = "-- All Fields --";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Validating,
    Searching,
    Succeeded,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Search failed: {}", .0.user_message())]
    Remote(#[from] ServiceError),

    #[error("response for request {generation} superseded by a newer request")]
    Superseded { generation: u64 },
}

/// An in-flight search: the request to send and the generation it belongs to.
#[derive(Debug)]
pub struct SearchTicket {
    generation: u64,
    filters: SearchFilters,
}

impl SearchTicket {
    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Owns the filters and result rows of one search screen.
///
/// Only the latest request's response is applied: every search and every clear advances
/// the generation, and completions carrying an older generation are dropped.
pub struct SearchSession<N: NotificationSink> {
    notifier: N,
    filters: FilterState,
    rows: Vec<HistoryRow>,
    sort: SortSpec,
    state: SessionState,
    error_message: Option<String>,
    has_searched: bool,
    generation: u64,
    user_options: Vec<PicklistOption>,
    field_options: Vec<PicklistOption>,
}

impl<N: NotificationSink> SearchSession<N> {
    pub fn new(notifier: N) -> Self {
        Self {
            notifier,
            filters: FilterState::default(),
            rows: Vec::new(),
            sort: SortSpec::default(),
            state: SessionState::Idle,
            error_message: None,
            has_searched: false,
            generation: 0,
            user_options: vec![PicklistOption::new(ALL_USERS_LABEL, "")],
            field_options: vec![PicklistOption::new(ALL_FIELDS_LABEL, "")],
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn rows(&self) -> &[HistoryRow] {
        &self.rows
    }

    pub fn sort_spec(&self) -> &SortSpec {
        &self.sort
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn has_searched(&self) -> bool {
        self.has_searched
    }

    pub fn is_searching(&self) -> bool {
        self.state == SessionState::Searching
    }

    pub fn user_options(&self) -> &[PicklistOption] {
        &self.user_options
    }

    pub fn field_options(&self) -> &[PicklistOption] {
        &self.field_options
    }

    pub fn show_results(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn show_no_results(&self) -> bool {
        self.has_searched
            && !self.is_searching()
            && self.rows.is_empty()
            && self.error_message.is_none()
    }

    pub fn is_export_disabled(&self) -> bool {
        self.rows.is_empty()
    }

    fn edit_filters(&mut self, edit: impl FnOnce(&mut FilterState)) {
        edit(&mut self.filters);
        self.state = SessionState::Idle;
    }

    pub fn set_target_user(&mut self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        self.edit_filters(|f| f.target_user_id = user_id);
    }

    pub fn set_changed_by_user(&mut self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        self.edit_filters(|f| f.changed_by_user_id = user_id);
    }

    pub fn set_field(&mut self, field_name: impl Into<String>) {
        let field_name = field_name.into();
        self.edit_filters(|f| f.field_name = field_name);
    }

    pub fn set_start_date(&mut self, date: impl Into<String>) {
        let date = date.into();
        self.edit_filters(|f| f.start_date = date);
    }

    pub fn set_end_date(&mut self, date: impl Into<String>) {
        let date = date.into();
        self.edit_filters(|f| f.end_date = date);
    }

    pub fn set_record_limit(&mut self, limit: u32) {
        self.edit_filters(|f| f.record_limit = limit);
    }

    /// Reset filters and results. Any in-flight response will be discarded.
    pub fn clear_filters(&mut self) {
        self.filters = FilterState::default();
        self.rows.clear();
        self.error_message = None;
        self.has_searched = false;
        self.state = SessionState::Idle;
        self.generation += 1;
    }

    /// Validate the filters and start a new request generation.
    ///
    /// A validation failure is reported to the user before it is returned.
    pub fn begin_search(&mut self) -> Result<SearchTicket, ValidationError> {
        self.error_message = None;
        self.has_searched = true;
        self.state = SessionState::Validating;
        self.generation += 1;

        if let Err(e) = self.filters.validate() {
            self.fail(e.to_string());
            return Err(e);
        }

        self.state = SessionState::Searching;
        let filters = self.filters.to_request();
        debug!(generation = self.generation, ?filters, "dispatching history search");
        Ok(SearchTicket {
            generation: self.generation,
            filters,
        })
    }

    /// Apply the service's answer to `ticket`, unless a newer request or a clear came after it.
    pub fn complete_search(
        &mut self,
        ticket: SearchTicket,
        outcome: Result<Vec<RawHistoryRecord>, ServiceError>,
    ) -> Result<usize, SearchError> {
        if ticket.generation != self.generation {
            warn!(
                stale = ticket.generation,
                current = self.generation,
                "discarding stale search response"
            );
            return Err(SearchError::Superseded {
                generation: ticket.generation,
            });
        }

        match outcome {
            Ok(records) => {
                self.rows = records.iter().map(transform).collect();
                self.state = SessionState::Succeeded;
                let count = self.rows.len();
                debug!(count, "history rows replaced");
                if count == 0 {
                    self.notifier.notify(
                        "No Results",
                        "No history records found matching your criteria.",
                        Severity::Info,
                    );
                } else {
                    self.notifier.notify(
                        "Success",
                        &format!("Found {count} history records."),
                        Severity::Success,
                    );
                }
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "history search failed");
                let err = SearchError::Remote(e);
                self.fail(err.to_string());
                Err(err)
            }
        }
    }

    /// Validate, query `service`, and replace the rows with the transformed results.
    pub async fn search(&mut self, service: &impl SearchService) -> Result<usize, SearchError> {
        let ticket = self.begin_search()?;
        let outcome = service.search(ticket.filters()).await;
        self.complete_search(ticket, outcome)
    }

    /// Record the new ordering and reorder the current rows.
    pub fn apply_sort(&mut self, column: impl Into<String>, direction: SortDirection) {
        self.sort = SortSpec {
            column: column.into(),
            direction,
        };
        self.rows = sort::sort_by_spec(&self.rows, &self.sort);
    }

    /// Build the CSV export and hand it to `deliver`; warn and return `None` when there is
    /// nothing to export.
    ///
    /// The success notification is raised only once `deliver` has returned `Ok`.
    pub fn export_csv_on<E: std::fmt::Display>(
        &mut self,
        date: NaiveDate,
        deliver: impl FnOnce(&CsvExport) -> Result<(), E>,
    ) -> Result<Option<CsvExport>, E> {
        if self.rows.is_empty() {
            self.notifier
                .notify("No Data", "No results to export.", Severity::Warning);
            return Ok(None);
        }
        let export = CsvExport {
            file_name: export_file_name(date),
            contents: to_csv(&self.rows),
        };
        if let Err(e) = deliver(&export) {
            warn!(file = %export.file_name, error = %e, "export delivery failed");
            self.show_error(format!("Export failed: {e}"));
            return Err(e);
        }
        self.notifier.notify(
            "Success",
            "Results exported successfully.",
            Severity::Success,
        );
        Ok(Some(export))
    }

    pub fn export_csv<E: std::fmt::Display>(
        &mut self,
        deliver: impl FnOnce(&CsvExport) -> Result<(), E>,
    ) -> Result<Option<CsvExport>, E> {
        self.export_csv_on(Utc::now().date_naive(), deliver)
    }

    /// Fetch both dropdown lists concurrently. A failure on one side leaves the other intact.
    pub async fn load_options(&mut self, users: &impl UserDirectory, fields: &impl FieldCatalog) {
        let (user_result, field_result) =
            futures::join!(users.list_active_users(), fields.list_tracked_fields());

        match user_result {
            Ok(list) => self.user_options = with_all_option(ALL_USERS_LABEL, list),
            Err(e) => self.show_error(format!("Error loading users: {}", e.user_message())),
        }
        match field_result {
            Ok(list) => self.field_options = with_all_option(ALL_FIELDS_LABEL, list),
            Err(e) => self.show_error(format!("Error loading fields: {}", e.user_message())),
        }
    }

    fn show_error(&mut self, message: String) {
        self.notifier.notify("Error", &message, Severity::Error);
        self.error_message = Some(message);
    }

    fn fail(&mut self, message: String) {
        self.state = SessionState::Failed;
        self.show_error(message);
    }
}

fn with_all_option(label: &str, options: Vec<PicklistOption>) -> Vec<PicklistOption> {
    let mut all = Vec::with_capacity(options.len() + 1);
    all.push(PicklistOption::new(label, ""));
    all.extend(options);
    all
}
