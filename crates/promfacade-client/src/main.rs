//! promfacade probe
//!
//! Runs one batch of instant queries against the configured backend and
//! prints the normalized results as JSON.
//!
//! Usage: `promfacade-probe <expr>...`
//! Config path: `$PROMFACADE_CONFIG` (default `promfacade.yaml`).

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use promfacade_client::{config, MetricsClient};

const DEFAULT_CONFIG_PATH: &str = "promfacade.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    let path =
        std::env::var("PROMFACADE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let cfg = match config::load_from_file(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("config load failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.log.level.as_str()));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let exprs: Vec<String> = std::env::args().skip(1).collect();
    if exprs.is_empty() {
        eprintln!("usage: promfacade-probe <expr>...");
        return ExitCode::FAILURE;
    }

    let client = match MetricsClient::from_config(&cfg) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "client init failed");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(backend = client.backend().base_url(), n = exprs.len(), "promfacade-probe querying");
    let mut results = client.query_many(&exprs, chrono::Utc::now()).await;
    results.sort_by(|a, b| a.metric_name().cmp(b.metric_name()));

    match serde_json::to_string_pretty(&results) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            tracing::error!(error = %e, "encode results failed");
            return ExitCode::FAILURE;
        }
    }

    tracing::debug!(metrics = %client.metrics().render(), "query metrics");

    if results.iter().all(|m| m.is_ok()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
