//! Routing and result-merging core of a database sharding middleware.

pub mod cli;
pub mod config;
pub mod merge;
pub mod router;
pub mod rule;
pub mod statement;

use std::io::IsTerminal;

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global subscriber. Log level comes from `RUST_LOG`,
/// INFO if not set.
///
/// Safe to call more than once, only the first call has effect.
/// Returns false if a subscriber was already installed.
pub fn logger(format: LogFormat) -> bool {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_ansi(std::io::stderr().is_terminal())
                    .with_file(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!("logger already installed: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_logger_installs_once() {
        // Other tests in this binary may have installed it first.
        logger(LogFormat::Text);
        assert!(!logger(LogFormat::Json));
    }
}
