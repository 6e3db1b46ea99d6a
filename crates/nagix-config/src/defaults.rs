use crate::channel::CommandChannel;
use crate::format::ResponseFormat;
use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Well-known Livestatus TCP port.
pub const DEFAULT_TCP_PORT: u16 = 6557;

/// Livestatus socket path used by stock Nagios packages.
pub const DEFAULT_UNIX_SOCKET: &str = "/var/lib/nagios/rw/live";

/// Default connect, read and write timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default output mode requested from Livestatus.
#[must_use]
pub const fn default_response_format() -> ResponseFormat {
    ResponseFormat::Json
}

/// Default channel for external commands.
#[must_use]
pub const fn default_command_channel() -> CommandChannel {
    CommandChannel::Livestatus
}

/// Default timeout applied to every socket operation.
#[must_use]
pub const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Computes the default Livestatus endpoint.
#[must_use]
pub fn default_livestatus_socket() -> SocketEndpoint {
    default_livestatus_socket_inner()
}

#[cfg(unix)]
fn default_livestatus_socket_inner() -> SocketEndpoint {
    SocketEndpoint::unix(DEFAULT_UNIX_SOCKET)
}

#[cfg(not(unix))]
fn default_livestatus_socket_inner() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}
