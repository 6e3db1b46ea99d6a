//! Socket transport to the Livestatus endpoint.
//!
//! Every exchange opens a fresh connection, writes the request, half-closes
//! the write side and reads until the peer closes. The configured timeout
//! bounds connecting, each write, and the whole response read: a peer that
//! keeps trickling bytes cannot hold an exchange open past the deadline.
//! A peer that closes before delivering the body its fixed16 header
//! announced is reported as [`TransportError::Disconnected`]. The [`Transport`] trait is
//! the seam the gateway and the Livestatus command dispatcher are written
//! against, so tests can substitute a scripted implementation.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use nagix_config::{Config, SocketEndpoint};
use tracing::debug;

use crate::error::TransportError;
use crate::query::QueryText;
use crate::response::{HEADER_LEN, announced_body_len};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
const READ_CHUNK: usize = 8 * 1024;

/// Raw bytes returned by Livestatus for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse(Vec<u8>);

impl RawResponse {
    /// Wraps bytes received from the socket.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Response bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when nothing was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for RawResponse {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// A channel able to carry requests to Livestatus.
pub trait Transport {
    /// Sends a query and returns the complete response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the endpoint cannot be reached, an
    /// operation times out, or the connection fails mid-exchange.
    fn exchange(&self, request: &QueryText) -> Result<RawResponse, TransportError>;

    /// Sends a payload that produces no response, such as an external
    /// command.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the payload cannot be delivered.
    fn submit(&self, payload: &str) -> Result<(), TransportError>;
}

/// [`Transport`] over a TCP or Unix stream socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketTransport {
    endpoint: SocketEndpoint,
    timeout: Duration,
}

impl SocketTransport {
    /// Creates a transport for `endpoint`. `timeout` bounds connecting,
    /// every write, and reading a complete response.
    #[must_use]
    pub const fn new(endpoint: SocketEndpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    /// Creates a transport from the configured socket and timeout.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.livestatus_socket().clone(), config.timeout())
    }

    /// Endpoint this transport connects to.
    #[must_use]
    pub const fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Per-operation timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn send(&self, payload: &[u8]) -> Result<Connection, TransportError> {
        let mut connection = connect(&self.endpoint, self.timeout)?;
        connection
            .write_all(payload)
            .and_then(|()| connection.flush())
            .and_then(|()| connection.shutdown_write())
            .map_err(|error| self.send_failure(error))?;
        Ok(connection)
    }

    fn send_failure(&self, error: io::Error) -> TransportError {
        if is_timeout(&error) {
            return self.timed_out("sending");
        }
        TransportError::Send {
            endpoint: self.endpoint.to_string(),
            source: Arc::new(error),
        }
    }

    fn receive_failure(&self, error: io::Error) -> TransportError {
        if is_timeout(&error) {
            return self.timed_out("receiving");
        }
        TransportError::Receive {
            endpoint: self.endpoint.to_string(),
            source: Arc::new(error),
        }
    }

    fn receive(&self, connection: &mut Connection) -> Result<Vec<u8>, TransportError> {
        let deadline = Instant::now() + self.timeout;
        let mut body = Vec::new();
        let mut chunk = [0_u8; READ_CHUNK];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timed_out("receiving"));
            }
            connection
                .set_read_timeout(remaining)
                .map_err(|error| self.receive_failure(error))?;
            match connection.read(&mut chunk) {
                Ok(0) => return Ok(body),
                Ok(count) => body.extend_from_slice(chunk.get(..count).unwrap_or_default()),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(self.receive_failure(error)),
            }
        }
    }

    fn check_complete(&self, response: &[u8]) -> Result<(), TransportError> {
        let Some(expected) = announced_body_len(response) else {
            return Ok(());
        };
        let received = response.len().saturating_sub(HEADER_LEN);
        if received < expected {
            return Err(TransportError::Disconnected {
                endpoint: self.endpoint.to_string(),
                expected,
                received,
            });
        }
        Ok(())
    }

    fn timed_out(&self, operation: &'static str) -> TransportError {
        TransportError::Timeout {
            endpoint: self.endpoint.to_string(),
            operation,
        }
    }
}

impl Transport for SocketTransport {
    fn exchange(&self, request: &QueryText) -> Result<RawResponse, TransportError> {
        debug!(
            target: TRANSPORT_TARGET,
            endpoint = %self.endpoint,
            bytes = request.as_bytes().len(),
            "sending query"
        );
        let mut connection = self.send(request.as_bytes())?;
        let body = self.receive(&mut connection)?;
        self.check_complete(&body)?;
        debug!(
            target: TRANSPORT_TARGET,
            endpoint = %self.endpoint,
            bytes = body.len(),
            "received response"
        );
        Ok(RawResponse(body))
    }

    fn submit(&self, payload: &str) -> Result<(), TransportError> {
        debug!(
            target: TRANSPORT_TARGET,
            endpoint = %self.endpoint,
            bytes = payload.len(),
            "submitting payload"
        );
        self.send(payload.as_bytes()).map(drop)
    }
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Connection {
    fn set_timeouts(&self, timeout: Duration) -> io::Result<()> {
        self.set_read_timeout(timeout)?;
        match self {
            Self::Tcp(stream) => stream.set_write_timeout(Some(timeout)),
            #[cfg(unix)]
            Self::Unix(stream) => stream.set_write_timeout(Some(timeout)),
        }
    }

    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.set_read_timeout(Some(timeout)),
            #[cfg(unix)]
            Self::Unix(stream) => stream.set_read_timeout(Some(timeout)),
        }
    }

    fn shutdown_write(&self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.shutdown(Shutdown::Write),
            #[cfg(unix)]
            Self::Unix(stream) => stream.shutdown(Shutdown::Write),
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

fn connect(endpoint: &SocketEndpoint, timeout: Duration) -> Result<Connection, TransportError> {
    let connection = open(endpoint, timeout)?;
    connection
        .set_timeouts(timeout)
        .map_err(|source| TransportError::Connect {
            endpoint: endpoint.to_string(),
            source: source.into(),
        })?;
    Ok(connection)
}

fn open(endpoint: &SocketEndpoint, timeout: Duration) -> Result<Connection, TransportError> {
    let connect_failure = |error: io::Error| {
        if is_timeout(&error) {
            TransportError::Timeout {
                endpoint: endpoint.to_string(),
                operation: "connecting",
            }
        } else {
            TransportError::Connect {
                endpoint: endpoint.to_string(),
                source: error.into(),
            }
        }
    };
    match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            let address =
                resolve_tcp_address(host, *port).map_err(|error| TransportError::Resolve {
                    endpoint: endpoint.to_string(),
                    source: error.into(),
                })?;
            TcpStream::connect_timeout(&address, timeout)
                .map(Connection::Tcp)
                .map_err(connect_failure)
        }
        SocketEndpoint::Unix { path } => {
            #[cfg(unix)]
            {
                connect_unix(path.as_str(), timeout).map_err(connect_failure)
            }

            #[cfg(not(unix))]
            {
                let _ = (path, connect_failure);
                Err(TransportError::UnsupportedUnixTransport(
                    endpoint.to_string(),
                ))
            }
        }
    }
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

#[cfg(unix)]
fn connect_unix(path: &str, timeout: Duration) -> io::Result<Connection> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, timeout)?;
    let stream = UnixStream::from(std::os::fd::OwnedFd::from(socket));
    Ok(Connection::Unix(stream))
}
