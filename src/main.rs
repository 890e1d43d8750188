use std::time::Duration;

use clap::Parser;
use history_search::cli;
use history_search::service::client::HistoryApiClient;
use history_search::session::{SearchSession, TracingNotifier};
use reqwest::Client;
use tracing::info;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("history_search=info".parse()?),
        )
        .init();

    let args = cli::Args::parse();

    let http = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
    let client = HistoryApiClient::from_env(http)
        .inspect_err(|e| tracing::error!("history service not configured: {e}"))?;

    info!("starting history search");
    let mut session = SearchSession::new(TracingNotifier);
    cli::run(args, &client, &mut session).await
}
