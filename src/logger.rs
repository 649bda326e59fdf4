use std::path::Path;

use snafu::ResultExt;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{registry, EnvFilter};

use crate::config::Config;
use crate::error::{ApplicationError, InitializeLoggerSnafu};

const LOG_FILE_PREFIX: &str = "lectern.log";
const DEFAULT_FILTER: &str = "info";

/// Pretty console output plus a daily JSON log file under `log_dir`.
///
/// Keep the returned guard alive for as long as the file should be written.
pub fn init(config: &Config) -> Result<WorkerGuard, ApplicationError> {
    let (writer, guard) = daily_file(&config.log_dir);

    let file_layer = layer().with_ansi(false).json().with_writer(writer);
    let console_layer = layer().pretty().with_writer(std::io::stdout);

    let subscriber = registry()
        .with(filter(config.log_filter.as_deref()))
        .with(console_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber).context(InitializeLoggerSnafu)?;

    tracing::debug!(log_dir = %config.log_dir.display(), "logger ready");
    Ok(guard)
}

fn daily_file(directory: &Path) -> (NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
    tracing_appender::non_blocking(appender)
}

/// Configured directives win, then `RUST_LOG`. Anything unparsable becomes `info`.
fn filter(directives: Option<&str>) -> EnvFilter {
    let parsed = match directives {
        Some(directives) => EnvFilter::try_new(directives).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    };

    parsed.unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
