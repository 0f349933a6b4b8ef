//! Logging setup: console output, optional daily-rolling file output.
//!
//! Timestamps use the machine's local timezone so log lines line up with
//! the wall clock the operator and the schedule both live in.

use crate::config::LogConfig;
use crate::error::{Result, SwitcherError};
use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "iqama=info,iqama_scrape=info";

/// File name prefix for daily-rolled log files.
const LOG_FILE_PREFIX: &str = "iqama.log";

/// Timer that formats timestamps in the local timezone via chrono.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Initialize the global subscriber.
///
/// Always installs a console layer filtered by `RUST_LOG` (falling back
/// to [`DEFAULT_LOG_FILTER`]); adds a daily-rolling file layer when the
/// config names a log directory. The returned guard must stay alive for
/// the process lifetime or buffered file output is lost.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match &config.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(true).with_timer(LocalTimer))
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_timer(LocalTimer),
                )
                .try_init()
                .map_err(|e| {
                    SwitcherError::Config(format!("failed to install log subscriber: {e}"))
                })?;

            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(true).with_timer(LocalTimer))
                .try_init()
                .map_err(|e| {
                    SwitcherError::Config(format!("failed to install log subscriber: {e}"))
                })?;

            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_filter_directive_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }
}
