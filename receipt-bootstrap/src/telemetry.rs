use std::path::Path;

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "receipt-hook.log";

/// Installs the global subscriber: human-readable stdout, plus a daily JSON
/// file under `log_dir` when one is configured. Keep the returned guard alive
/// until exit or buffered file lines are lost.
pub fn init_tracing(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    let Some(dir) = log_dir else {
        registry
            .try_init()
            .map_err(|err| anyhow!("failed to install tracing subscriber: {}", err))?;
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .map_err(|err| anyhow!("failed to create log dir {}: {}", dir.display(), err))?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    registry
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {}", err))?;
    Ok(Some(guard))
}
