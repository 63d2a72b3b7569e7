pub mod api;
pub mod cli;
pub mod config;
pub mod extraction;
pub mod pipeline;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use pipeline::{ModelHandle, PatientIntake, TriageEngine, TriageResult};

/// Install the global tracing subscriber. Logs go to stderr so that
/// `predict` and `extract` keep stdout for their JSON output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> ExitCode {
    let cli = cli::Cli::parse();
    init_tracing();
    tracing::debug!("{} v{}", config::APP_NAME, config::APP_VERSION);
    cli::run(cli)
}
