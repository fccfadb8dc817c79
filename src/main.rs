//! `releaser` entrypoint: collects release notes and proposes changelog
//! updates.

use std::io::{self, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use releaser::{ReleaseError, ReleaserConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ReleaseError> {
    let config = load_config()?;
    releaser::cli::run(&config).await
}

/// Installs the fmt subscriber on stderr, filtered by `RUST_LOG`.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`ReleaseError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<ReleaserConfig, ReleaseError> {
    ReleaserConfig::load().map_err(|error| ReleaseError::Configuration {
        message: error.to_string(),
    })
}
