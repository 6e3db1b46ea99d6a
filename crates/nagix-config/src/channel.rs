//! Selection of the channel external commands are submitted through.

use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Where external commands are written.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum CommandChannel {
    /// Send `COMMAND` directives over the Livestatus query socket.
    #[default]
    Livestatus,
    /// Append to the monitoring core's external command FIFO.
    Pipe {
        /// Filesystem path of the command FIFO.
        path: Utf8PathBuf,
    },
}

impl CommandChannel {
    /// Builds a command pipe channel.
    #[must_use]
    pub fn pipe(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Pipe { path: path.into() }
    }
}

impl fmt::Display for CommandChannel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Livestatus => formatter.write_str("livestatus"),
            Self::Pipe { path } => write!(formatter, "pipe://{path}"),
        }
    }
}

impl FromStr for CommandChannel {
    type Err = ChannelParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("livestatus") {
            return Ok(Self::Livestatus);
        }
        let url = Url::parse(trimmed)?;
        if url.scheme() != "pipe" {
            return Err(ChannelParseError::UnsupportedScheme(url.scheme().to_owned()));
        }
        let path = url.path();
        if path.is_empty() || path == "/" {
            return Err(ChannelParseError::MissingPath(input.to_owned()));
        }
        Ok(Self::pipe(path))
    }
}

/// Errors encountered while parsing a [`CommandChannel`] from text.
#[derive(Debug, Error)]
pub enum ChannelParseError {
    /// Scheme was neither `livestatus` nor `pipe`.
    #[error("unsupported command channel '{0}'")]
    UnsupportedScheme(String),
    /// The pipe URL carried no path.
    #[error("missing command pipe path in '{0}'")]
    MissingPath(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
