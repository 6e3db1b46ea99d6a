//! Failure taxonomy for the Livestatus gateway.
//!
//! Leaf errors describe one component's failure: [`TransportError`],
//! [`ProtocolError`], [`QuerySyntaxError`], [`CommandError`] and
//! [`DispatchError`]. The gateway surfaces them to callers wrapped in
//! [`QueryError`] or [`ExecutionError`], which keep the original message and
//! expose a [`FailureKind`] so an HTTP or RPC layer can tell caller mistakes
//! from upstream failures. I/O errors are wrapped in `Arc` to keep the enums
//! small and cloneable.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Broad classification of a failure, for mapping onto response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The caller supplied an invalid query, command, or parameter.
    Invalid,
    /// The monitoring core or the channel to it failed.
    Upstream,
}

/// Socket-level failures while talking to Livestatus.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The TCP host name could not be resolved.
    #[error("failed to resolve livestatus address {endpoint}: {source}")]
    Resolve {
        /// Endpoint being resolved.
        endpoint: String,
        /// Underlying resolver error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The connection was refused or could not be established.
    #[error("failed to connect to livestatus at {endpoint}: {source}")]
    Connect {
        /// Endpoint being connected to.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: Arc<io::Error>,
    },
    /// An operation did not complete within the configured timeout.
    #[error("livestatus at {endpoint} timed out while {operation}")]
    Timeout {
        /// Endpoint being talked to.
        endpoint: String,
        /// Operation that timed out.
        operation: &'static str,
    },
    /// Writing the request failed.
    #[error("failed to send request to livestatus at {endpoint}: {source}")]
    Send {
        /// Endpoint being written to.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The peer closed the connection before sending the body length the
    /// fixed16 header announced.
    #[error(
        "livestatus at {endpoint} closed the connection after {received} of {expected} response bytes"
    )]
    Disconnected {
        /// Endpoint being read from.
        endpoint: String,
        /// Body length announced in the response header.
        expected: usize,
        /// Body bytes received before the connection closed.
        received: usize,
    },
    /// Reading the response failed, e.g. the peer reset the connection.
    #[error("failed to read response from livestatus at {endpoint}: {source}")]
    Receive {
        /// Endpoint being read from.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: Arc<io::Error>,
    },
    /// Unix sockets are not available on this platform.
    #[error("platform does not support Unix sockets: {0}")]
    UnsupportedUnixTransport(String),
}

/// The response could not be decoded into records.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    /// The fixed16 response header was missing or unreadable.
    #[error("invalid livestatus response header: {message}")]
    InvalidHeader {
        /// Description of the problem.
        message: String,
    },
    /// Livestatus answered with a non-200 status.
    #[error("livestatus rejected the query with status {status}: {message}")]
    Rejected {
        /// Status code from the response header.
        status: u16,
        /// Error text sent by Livestatus.
        message: String,
    },
    /// The response handed to the parser holds fewer body bytes than its
    /// header announced. The socket transport reports a peer that closed
    /// early as [`TransportError::Disconnected`] instead.
    #[error("livestatus response truncated: expected {expected} bytes, received {received}")]
    Truncated {
        /// Length announced in the header.
        expected: usize,
        /// Bytes actually received.
        received: usize,
    },
    /// The body was not in the requested output format.
    #[error("malformed livestatus response: {message}")]
    Malformed {
        /// Description of the problem.
        message: String,
    },
    /// A data row did not have one value per header column.
    #[error("row {row} has {found} values but the header declares {expected} columns")]
    ColumnMismatch {
        /// One-based index of the offending data row.
        row: usize,
        /// Number of header columns.
        expected: usize,
        /// Number of values in the row.
        found: usize,
    },
}

impl ProtocolError {
    /// Creates a malformed response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates an invalid header error.
    #[must_use]
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }
}

/// Query text or structure that cannot be turned into a Livestatus request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuerySyntaxError {
    /// The query ended while more input was required.
    #[error("unexpected end of query, expected {expected}")]
    UnexpectedEnd {
        /// What the parser was looking for.
        expected: String,
    },
    /// A token appeared where it is not allowed.
    #[error("unexpected '{found}' at position {position}, expected {expected}")]
    UnexpectedToken {
        /// Byte offset of the token.
        position: usize,
        /// The token text.
        found: String,
        /// What the parser was looking for.
        expected: String,
    },
    /// A quoted literal was not closed.
    #[error("unterminated string starting at position {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },
    /// The table is not one of the queryable tables.
    #[error("unknown table '{0}'")]
    UnknownTable(String),
    /// A column name contains characters Livestatus does not accept.
    #[error("invalid column name '{0}'")]
    InvalidColumn(String),
    /// A filter value contains a line break or NUL.
    #[error("filter value for column '{column}' contains a line break or NUL")]
    InvalidValue {
        /// Column the value was compared against.
        column: String,
    },
    /// An AND/OR group has no members.
    #[error("filter groups must contain at least one predicate")]
    EmptyGroup,
    /// The LIMIT clause is not a non-negative integer.
    #[error("invalid limit '{0}'")]
    InvalidLimit(String),
}

/// A command request failed validation against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The command is not in the catalog.
    #[error("Unknown Nagios External Command {name}")]
    UnknownCommand {
        /// Name as supplied by the caller.
        name: String,
    },
    /// A required parameter has no value. Only the first missing parameter in
    /// declaration order is reported.
    #[error("Missing parameter {parameter} for Nagios External Command {command}{}", doc_suffix(.doc_url.as_deref()))]
    MissingParameter {
        /// Canonical command name.
        command: String,
        /// Name of the missing parameter.
        parameter: String,
        /// Documentation link for the command, when known.
        doc_url: Option<String>,
    },
    /// A parameter value contains a line break or NUL.
    #[error("parameter {parameter} for Nagios External Command {command} contains a line break or NUL")]
    InvalidParameter {
        /// Canonical command name.
        command: String,
        /// Name of the offending parameter.
        parameter: String,
    },
}

fn doc_suffix(doc_url: Option<&str>) -> String {
    doc_url.map_or_else(String::new, |url| format!("; see {url}"))
}

impl CommandError {
    /// Returns the missing parameter name for [`CommandError::MissingParameter`].
    #[must_use]
    pub fn missing_parameter(&self) -> Option<&str> {
        match self {
            Self::MissingParameter { parameter, .. } => Some(parameter),
            Self::UnknownCommand { .. } | Self::InvalidParameter { .. } => None,
        }
    }
}

/// The command channel could not accept a command.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The command pipe could not be opened, e.g. no reader is attached.
    #[error("failed to open command pipe '{path}': {source}")]
    Open {
        /// Pipe path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
    /// Writing the command failed.
    #[error("failed to write command to '{path}': {source}")]
    Write {
        /// Pipe path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
    /// Submitting over the Livestatus socket failed.
    #[error("failed to submit command over livestatus: {0}")]
    Transport(#[source] TransportError),
}

/// Failure of [`Gateway::query`](crate::Gateway::query).
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// The query text or structure was invalid.
    #[error(transparent)]
    Syntax(#[from] QuerySyntaxError),
    /// The socket exchange failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The response could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl QueryError {
    /// Classifies the failure for the calling layer.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Syntax(_) => FailureKind::Invalid,
            Self::Transport(_) | Self::Protocol(_) => FailureKind::Upstream,
        }
    }
}

/// Failure of [`Gateway::execute`](crate::Gateway::execute).
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    /// The command failed catalog validation.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// The command could not be submitted.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ExecutionError {
    /// Classifies the failure for the calling layer.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Command(_) => FailureKind::Invalid,
            Self::Dispatch(_) => FailureKind::Upstream,
        }
    }
}
