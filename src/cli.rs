use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::history::export::CSV_HEADER;
use crate::history::{HistoryRow, PicklistOption, SortDirection};
use crate::service::client::HistoryApiClient;
use crate::session::{NotificationSink, SearchSession};

/// Search a field-history audit log and export the results as CSV.
///
/// Configuration via environment variables:
/// - `HISTORY_API_URL`: field-history service base URL
/// - `HISTORY_API_TOKEN`: bearer token (optional)
#[derive(Parser, Debug)]
#[command(name = "history-search", version)]
pub struct Args {
    /// User whose records' history is inspected
    #[arg(long)]
    pub target_user: Option<String>,
    /// User who performed the edit
    #[arg(long)]
    pub changed_by: Option<String>,
    /// Tracked field name
    #[arg(long)]
    pub field: Option<String>,
    /// Earliest change date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,
    /// Latest change date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,
    /// Maximum number of records to return
    #[arg(long, default_value_t = crate::session::DEFAULT_RECORD_LIMIT)]
    pub limit: u32,
    /// Column to sort by, e.g. "dateChanged" or "userName"
    #[arg(long)]
    pub sort_by: Option<String>,
    /// Sort direction
    #[arg(long, value_enum, default_value = "asc")]
    pub direction: Direction,
    /// Write the CSV export into this directory
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,
    /// Print the selectable users and exit
    #[arg(long, conflicts_with = "list_fields")]
    pub list_users: bool,
    /// Print the tracked fields and exit
    #[arg(long)]
    pub list_fields: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl From<Direction> for SortDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Asc => SortDirection::Asc,
            Direction::Desc => SortDirection::Desc,
        }
    }
}

pub async fn run<N: NotificationSink>(
    args: Args,
    client: &HistoryApiClient,
    session: &mut SearchSession<N>,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.list_users || args.list_fields {
        session.load_options(client, client).await;
        let options = if args.list_users {
            session.user_options()
        } else {
            session.field_options()
        };
        print!("{}", format_options(options));
        return match session.error_message() {
            Some(message) => Err(message.into()),
            None => Ok(()),
        };
    }

    apply_filters(&args, session);
    session.search(client).await?;

    if let Some(column) = args.sort_by {
        session.apply_sort(column, args.direction.into());
    }
    print!("{}", format_table(session.rows()));

    if let Some(dir) = args.export {
        session.export_csv(|export| {
            let path = dir.join(&export.file_name);
            std::fs::write(&path, &export.contents)?;
            info!(path = %path.display(), "export written");
            Ok::<(), std::io::Error>(())
        })?;
    }
    Ok(())
}

fn apply_filters<N: NotificationSink>(args: &Args, session: &mut SearchSession<N>) {
    if let Some(ref v) = args.target_user {
        session.set_target_user(v.as_str());
    }
    if let Some(ref v) = args.changed_by {
        session.set_changed_by_user(v.as_str());
    }
    if let Some(ref v) = args.field {
        session.set_field(v.as_str());
    }
    if let Some(ref v) = args.start_date {
        session.set_start_date(v.as_str());
    }
    if let Some(ref v) = args.end_date {
        session.set_end_date(v.as_str());
    }
    session.set_record_limit(args.limit);
}

fn format_options(options: &[PicklistOption]) -> String {
    let mut out = String::new();
    for option in options {
        out.push_str(&format!("{}\t{}\n", option.value, option.label));
    }
    out
}

/// Tab-separated view of the rows, one per line, with a header.
fn format_table(rows: &[HistoryRow]) -> String {
    let mut out = CSV_HEADER.replace(',', "\t");
    out.push('\n');
    for row in rows {
        let cells = [
            &row.user_name,
            &row.changed_field,
            &row.old_value,
            &row.new_value,
            &row.changed_by_name,
            &row.date_changed,
            &row.time_changed,
        ];
        let line: Vec<String> = cells.iter().map(|c| single_line(c)).collect();
        out.push_str(&line.join("\t"));
        out.push('\n');
    }
    out
}

fn single_line(s: &str) -> String {
    s.chars()
        .map(|c| if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_filters_and_sort() {
        let args = Args::parse_from([
            "history-search",
            "--target-user",
            "005A",
            "--start-date",
            "2024-01-01",
            "--limit",
            "25",
            "--sort-by",
            "userName",
            "--direction",
            "desc",
        ]);
        assert_eq!(args.target_user.as_deref(), Some("005A"));
        assert_eq!(args.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(args.limit, 25);
        assert_eq!(args.sort_by.as_deref(), Some("userName"));
        assert_eq!(SortDirection::from(args.direction), SortDirection::Desc);
        assert!(!args.list_users);
    }

    #[test]
    fn limit_defaults_to_hundred() {
        let args = Args::parse_from(["history-search"]);
        assert_eq!(args.limit, 100);
        assert_eq!(args.direction, Direction::Asc);
        assert!(args.export.is_none());
    }

    #[test]
    fn list_flags_conflict() {
        let result = Args::try_parse_from(["history-search", "--list-users", "--list-fields"]);
        assert!(result.is_err());
    }

    #[test]
    fn apply_filters_copies_args_into_session() {
        let args = Args::parse_from([
            "history-search",
            "--changed-by",
            "005B",
            "--field",
            "Title",
            "--end-date",
            "2024-02-01",
        ]);
        let mut session = SearchSession::new(crate::session::TracingNotifier);
        apply_filters(&args, &mut session);
        let f = session.filters();
        assert_eq!(f.changed_by_user_id, "005B");
        assert_eq!(f.field_name, "Title");
        assert_eq!(f.end_date, "2024-02-01");
        assert_eq!(f.record_limit, 100);
        assert!(f.target_user_id.is_empty());
    }

    #[test]
    fn table_flattens_multiline_cells() {
        let row = HistoryRow {
            user_name: "Ada".into(),
            new_value: "line1\nline2".into(),
            ..Default::default()
        };
        let table = format_table(&[row]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("User\tField Changed"));
        assert!(lines[1].contains("line1 line2"));
    }

    #[test]
    fn options_list_value_then_label() {
        let options = [
            PicklistOption::new("-- All Users --", ""),
            PicklistOption::new("Ada", "005A"),
        ];
        assert_eq!(format_options(&options), "\t-- All Users --\n005A\tAda\n");
    }

    /// Per-test scratch directory so parallel tests never share a path.
    fn scratch_dir(test: &str) -> PathBuf {
        std::env::temp_dir().join(format!("history-search-{}-{test}", std::process::id()))
    }

    #[derive(Default)]
    struct RecordingSink {
        events: std::sync::Mutex<Vec<(String, crate::session::Severity)>>,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, _title: &str, message: &str, severity: crate::session::Severity) {
            self.events
                .lock()
                .unwrap()
                .push((message.to_string(), severity));
        }
    }

    async fn mount_one_record(server: &wiremock::MockServer) {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, ResponseTemplate};

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"recordId": "1", "userName": "Ada", "dateChanged": "2024-03-01"}
            ])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn run_export_into_missing_dir_reports_error_without_success() {
        let server = wiremock::MockServer::start().await;
        mount_one_record(&server).await;

        let dir = scratch_dir("run_export_into_missing_dir").join("does-not-exist");
        let args = Args::parse_from(["history-search", "--export", dir.to_str().unwrap()]);
        let client = HistoryApiClient::with_base_url(reqwest::Client::new(), &server.uri());
        let sink = RecordingSink::default();
        let mut session = SearchSession::new(&sink);

        let result = run(args, &client, &mut session).await;

        assert!(result.is_err());
        assert!(
            session
                .error_message()
                .is_some_and(|m| m.starts_with("Export failed: ")),
            "got: {:?}",
            session.error_message()
        );
        let events = sink.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                (
                    "Found 1 history records.".to_string(),
                    crate::session::Severity::Success
                ),
                (
                    session.error_message().unwrap().to_string(),
                    crate::session::Severity::Error
                ),
            ]
        );
    }

    #[tokio::test]
    async fn run_searches_sorts_and_exports() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"recordId": "1", "userName": "Bo", "dateChanged": "2024-03-01"},
                {"recordId": "2", "userName": "Al", "dateChanged": "2024-01-15"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let dir = scratch_dir("run_searches_sorts_and_exports");
        std::fs::create_dir_all(&dir).unwrap();
        let args = Args::parse_from([
            "history-search",
            "--sort-by",
            "dateChanged",
            "--export",
            dir.to_str().unwrap(),
        ]);
        let client = HistoryApiClient::with_base_url(reqwest::Client::new(), &server.uri());
        let mut session = SearchSession::new(crate::session::TracingNotifier);

        run(args, &client, &mut session).await.unwrap();

        let ids: Vec<_> = session.rows().iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);
        let written: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|x| x == "csv"))
            .collect();
        assert_eq!(written.len(), 1);
        let contents = std::fs::read_to_string(&written[0]).unwrap();
        assert!(contents.starts_with("User,Field Changed"));
        assert!(contents.contains("Al,Unknown Field,,,Unknown User,2024-01-15,"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn run_reports_validation_failure() {
        let args = Args::parse_from([
            "history-search",
            "--start-date",
            "2024-05-01",
            "--end-date",
            "2024-01-01",
        ]);
        let client = HistoryApiClient::with_base_url(reqwest::Client::new(), "http://127.0.0.1:9");
        let mut session = SearchSession::new(crate::session::TracingNotifier);

        let err = run(args, &client, &mut session).await.unwrap_err();
        assert_eq!(err.to_string(), "Start date cannot be after end date");
    }
}
