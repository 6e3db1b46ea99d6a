//! Error types for the CLI runtime.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use nagix_livestatus::{ExecutionError, FailureKind, QueryError};
use thiserror::Error;

use crate::telemetry::TelemetryError;

const EXIT_INVALID: u8 = 1;
const EXIT_UPSTREAM: u8 = 2;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("parameter '{0}' must be written as key=value")]
    MalformedParameter(String),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("failed to serialise output: {0}")]
    Serialise(serde_json::Error),
    #[error("failed to write output: {0}")]
    Emit(io::Error),
}

impl AppError {
    /// Exit status: 2 when Livestatus or the command channel failed, 1 for
    /// everything the caller can fix.
    pub(crate) fn exit_code(&self) -> ExitCode {
        let kind = match self {
            Self::Query(error) => error.kind(),
            Self::Execution(error) => error.kind(),
            _ => FailureKind::Invalid,
        };
        match kind {
            FailureKind::Invalid => ExitCode::from(EXIT_INVALID),
            FailureKind::Upstream => ExitCode::from(EXIT_UPSTREAM),
        }
    }
}
