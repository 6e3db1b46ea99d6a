//! Structured telemetry initialisation for the CLI.
//!
//! Events go to stderr unless a log file is configured, in which case they
//! are appended to it through a non-blocking writer.

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};

use nagix_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

static TELEMETRY_INSTALLED: OnceCell<()> = OnceCell::new();

/// Keeps the log file writer alive; dropping it flushes pending events.
#[derive(Debug, Default)]
pub(crate) struct TelemetryHandle {
    _guard: Option<WorkerGuard>,
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub(crate) enum TelemetryError {
    /// The configured log filter expression is invalid.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// The configured log file could not be opened.
    #[error("failed to open log file '{path}': {source}")]
    LogFile {
        /// Configured path.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The tracing subscriber could not be installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global tracing subscriber on first use.
///
/// Later calls leave the installed subscriber in place and return an empty
/// handle.
pub(crate) fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let mut guard = None;
    TELEMETRY_INSTALLED.get_or_try_init(|| {
        guard = install_subscriber(config)?;
        Ok::<(), TelemetryError>(())
    })?;
    Ok(TelemetryHandle { _guard: guard })
}

fn install_subscriber(config: &Config) -> Result<Option<WorkerGuard>, TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let (writer, ansi, guard) = match config.log_file() {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path.as_std_path())
                .map_err(|source| TelemetryError::LogFile {
                    path: path.to_string(),
                    source,
                })?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            (BoxMakeWriter::new(non_blocking), false, Some(guard))
        }
        None => (
            BoxMakeWriter::new(io::stderr),
            io::stderr().is_terminal(),
            None,
        ),
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    Ok(guard)
}
