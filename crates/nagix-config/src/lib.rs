//! Shared configuration for the Nagix Livestatus gateway.
//!
//! The configuration is layered by `ortho_config`: built-in defaults, then an
//! optional configuration file, then `NAGIX_*` environment variables, then
//! command-line flags. Once loaded the [`Config`] is immutable and is handed
//! to the gateway at construction.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod channel;
mod defaults;
mod format;
mod logging;
mod socket;

pub use channel::{ChannelParseError, CommandChannel};
pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_TCP_PORT, DEFAULT_TIMEOUT_MS, DEFAULT_UNIX_SOCKET,
    default_command_channel, default_livestatus_socket, default_log_filter,
    default_log_filter_string, default_log_format, default_response_format, default_timeout_ms,
};
pub use format::ResponseFormat;
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError};

/// Resolved gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "NAGIX")]
pub struct Config {
    /// Livestatus query socket.
    #[serde(default = "default_livestatus_socket")]
    pub livestatus_socket: SocketEndpoint,
    /// Channel used to submit external commands.
    #[serde(default = "default_command_channel")]
    pub command_channel: CommandChannel,
    /// Connect, read and write timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Output mode requested from Livestatus.
    #[serde(default = "default_response_format")]
    pub response_format: ResponseFormat,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Log line format.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Optional file receiving log output instead of stderr.
    #[serde(default)]
    pub log_file: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            livestatus_socket: default_livestatus_socket(),
            command_channel: default_command_channel(),
            timeout_ms: default_timeout_ms(),
            response_format: default_response_format(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            log_file: None,
        }
    }
}

impl Config {
    /// Livestatus query socket.
    #[must_use]
    pub const fn livestatus_socket(&self) -> &SocketEndpoint {
        &self.livestatus_socket
    }

    /// Channel used to submit external commands.
    #[must_use]
    pub const fn command_channel(&self) -> &CommandChannel {
        &self.command_channel
    }

    /// Timeout applied to every socket operation. A zero value is clamped to
    /// one millisecond so sockets never block indefinitely.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    /// Output mode requested from Livestatus.
    #[must_use]
    pub const fn response_format(&self) -> ResponseFormat {
        self.response_format
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log line format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Optional log file path.
    #[must_use]
    pub fn log_file(&self) -> Option<&Utf8Path> {
        self.log_file.as_deref()
    }
}
