use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

use crate::errors::{CoreError, Result};

/// Installs the process-wide stderr subscriber for the CLI and the service.
///
/// `RUST_LOG` takes precedence over `level`; stdout is left to command output.
/// Fails if a global subscriber is already installed.
pub fn init_tracing(level: Option<&str>) -> Result<()> {
    SubscriberBuilder::default()
        .with_env_filter(level_filter(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .try_init()
        .map_err(|err| CoreError::GeneralError(err.to_string()))
}

fn level_filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")))
}
