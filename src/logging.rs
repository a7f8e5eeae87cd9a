//! Tracing setup.
//!
//! Diagnostics go to a daily-rolling file under the data directory
//! (`~/.local/share/refine/logs/refine.log.YYYY-MM-DD` on Linux) so they never
//! interleave with the interactive prompt. `RUST_LOG` overrides the
//! configured level.
//!
//! ```bash
//! RUST_LOG=refine_cli=debug refine chat
//! ```

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::constants::{DEFAULT_LOG_LEVEL, LOG_FILENAME};

/// Install the global subscriber.
///
/// The returned guard flushes buffered lines when dropped; hold it for the
/// life of the process.
pub fn init(config: &Config) -> Result<WorkerGuard> {
    let dir = Config::logs_dir()?;
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::daily(&dir, LOG_FILENAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter(config.log_level()))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;

    Ok(guard)
}

fn filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| configured_filter(configured))
}

/// Filter from the `[logging].level` directive, or the default level when it
/// does not parse.
fn configured_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}
