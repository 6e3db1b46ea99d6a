//! Submission of command lines to the monitoring core.
//!
//! Nagios reads external commands as `[<unix timestamp>] <command line>`.
//! They reach it either through Livestatus, prefixed with `COMMAND`, or by
//! appending to the command FIFO the core reads from.

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use camino::{Utf8Path, Utf8PathBuf};
use nagix_config::{CommandChannel, Config};
use time::OffsetDateTime;
use tracing::info;

use crate::command::CommandText;
use crate::error::DispatchError;
use crate::transport::{SocketTransport, Transport};

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Source of submission timestamps, in seconds since the Unix epoch.
pub type Clock = fn() -> i64;

/// Current wall-clock time as a Unix timestamp.
#[must_use]
pub fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Delivers a command line to the monitoring core.
pub trait CommandDispatcher {
    /// Submits `command`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the channel cannot be opened or
    /// written.
    fn dispatch(&self, command: &CommandText) -> Result<(), DispatchError>;
}

/// Submits commands through the Livestatus socket as `COMMAND` requests.
#[derive(Debug, Clone)]
pub struct LivestatusDispatcher<T> {
    transport: T,
    clock: Clock,
}

impl<T: Transport> LivestatusDispatcher<T> {
    /// Creates a dispatcher writing through `transport`.
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            clock: unix_now,
        }
    }

    /// Replaces the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Transport commands are written through.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> CommandDispatcher for LivestatusDispatcher<T> {
    fn dispatch(&self, command: &CommandText) -> Result<(), DispatchError> {
        let payload = format!("COMMAND {}\n", command.submission((self.clock)()));
        self.transport
            .submit(&payload)
            .map_err(DispatchError::Transport)?;
        info!(
            target: DISPATCH_TARGET,
            channel = "livestatus",
            command = command.name(),
            "command submitted"
        );
        Ok(())
    }
}

/// Appends commands to the Nagios external command file.
///
/// The file is opened without blocking, so a FIFO with no reader fails
/// immediately instead of hanging until Nagios starts.
#[derive(Debug, Clone)]
pub struct CommandPipe {
    path: Utf8PathBuf,
    clock: Clock,
}

impl CommandPipe {
    /// Creates a dispatcher for the command file at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            clock: unix_now,
        }
    }

    /// Replaces the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Command file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn open(&self) -> std::io::Result<std::fs::File> {
        let mut options = OpenOptions::new();
        options.append(true);
        #[cfg(unix)]
        options.custom_flags(libc::O_NONBLOCK);
        options.open(self.path.as_std_path())
    }
}

impl CommandDispatcher for CommandPipe {
    fn dispatch(&self, command: &CommandText) -> Result<(), DispatchError> {
        let mut pipe = self.open().map_err(|source| DispatchError::Open {
            path: self.path.clone(),
            source: Arc::new(source),
        })?;
        let line = format!("{}\n", command.submission((self.clock)()));
        pipe.write_all(line.as_bytes())
            .and_then(|()| pipe.flush())
            .map_err(|source| DispatchError::Write {
                path: self.path.clone(),
                source: Arc::new(source),
            })?;
        info!(
            target: DISPATCH_TARGET,
            channel = "pipe",
            path = %self.path,
            command = command.name(),
            "command submitted"
        );
        Ok(())
    }
}

/// The dispatcher selected by [`Config::command_channel`].
#[derive(Debug, Clone)]
pub enum ConfiguredDispatcher {
    /// `COMMAND` requests over the Livestatus socket.
    Livestatus(LivestatusDispatcher<SocketTransport>),
    /// Appends to the command FIFO.
    Pipe(CommandPipe),
}

impl ConfiguredDispatcher {
    /// Builds the dispatcher for the configured command channel.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        match config.command_channel() {
            CommandChannel::Livestatus => {
                Self::Livestatus(LivestatusDispatcher::new(SocketTransport::from_config(config)))
            }
            CommandChannel::Pipe { path } => Self::Pipe(CommandPipe::new(path.clone())),
        }
    }
}

impl CommandDispatcher for ConfiguredDispatcher {
    fn dispatch(&self, command: &CommandText) -> Result<(), DispatchError> {
        match self {
            Self::Livestatus(dispatcher) => dispatcher.dispatch(command),
            Self::Pipe(dispatcher) => dispatcher.dispatch(command),
        }
    }
}

#[cfg(test)]
mod tests;
