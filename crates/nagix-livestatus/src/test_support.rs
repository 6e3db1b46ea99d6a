//! In-process stand-ins for a Livestatus socket.

use std::io::{self, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::os::unix::net::UnixListener;

use anyhow::{Context, Result, anyhow};
use nagix_config::SocketEndpoint;

/// Frames `body` behind a fixed16 response header.
pub(crate) fn fixed16(status: u16, body: &str) -> Vec<u8> {
    format!("{status:03} {:>11}\n{body}", body.len()).into_bytes()
}

/// How the fake server answers the single connection it accepts.
#[derive(Clone)]
pub(crate) enum Reply {
    /// Write these bytes, then close.
    Bytes(Vec<u8>),
    /// Read the request, then hold the connection open without answering.
    Stall(Duration),
    /// Write the bytes one at a time, pausing between them.
    Trickle {
        /// Reply bytes.
        bytes: Vec<u8>,
        /// Pause before each byte.
        interval: Duration,
    },
}

/// Accepts one connection, records the request and sends a canned reply.
pub(crate) struct FakeLivestatus {
    endpoint: SocketEndpoint,
    requests: Arc<Mutex<Vec<String>>>,
    handle: Option<thread::JoinHandle<Result<()>>>,
    _dir: Option<tempfile::TempDir>,
}

impl FakeLivestatus {
    pub(crate) fn tcp(reply: Reply) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake livestatus")?;
        listener
            .set_nonblocking(true)
            .context("fake livestatus nonblocking")?;
        let port = listener.local_addr().context("local addr")?.port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            let accepted = accept_with_deadline(|| listener.accept().map(|(stream, _)| stream))?;
            match accepted {
                Some(stream) => serve(stream, &reply, &recorded),
                None => Ok(()),
            }
        });
        Ok(Self {
            endpoint: SocketEndpoint::tcp("127.0.0.1", port),
            requests,
            handle: Some(handle),
            _dir: None,
        })
    }

    #[cfg(unix)]
    pub(crate) fn unix(reply: Reply) -> Result<Self> {
        let dir = tempfile::tempdir().context("socket dir")?;
        let path = dir.path().join("live");
        let listener = UnixListener::bind(&path).context("bind fake livestatus socket")?;
        listener
            .set_nonblocking(true)
            .context("fake livestatus nonblocking")?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            let accepted = accept_with_deadline(|| listener.accept().map(|(stream, _)| stream))?;
            match accepted {
                Some(stream) => serve(stream, &reply, &recorded),
                None => Ok(()),
            }
        });
        let utf8_path = path
            .to_str()
            .ok_or_else(|| anyhow!("socket path is not UTF-8"))?;
        Ok(Self {
            endpoint: SocketEndpoint::unix(utf8_path),
            requests,
            handle: Some(handle),
            _dir: Some(dir),
        })
    }

    pub(crate) fn endpoint(&self) -> SocketEndpoint {
        self.endpoint.clone()
    }

    /// Waits for the server thread and returns the recorded requests.
    pub(crate) fn take_requests(&mut self) -> Result<Vec<String>> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("fake livestatus thread panicked"))?
                .context("fake livestatus failed")?;
        }
        let requests = self
            .requests
            .lock()
            .map_err(|error| anyhow!("lock requests: {error}"))?;
        Ok(requests.clone())
    }
}

impl Drop for FakeLivestatus {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn accept_with_deadline<S>(mut accept: impl FnMut() -> io::Result<S>) -> Result<Option<S>> {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        match accept() {
            Ok(stream) => return Ok(Some(stream)),
            Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Ok(None);
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(error) => return Err(error).context("accept connection"),
        }
    }
}

trait Stream: Read + Write {
    fn prepare(&self) -> io::Result<()>;
}

impl Stream for std::net::TcpStream {
    fn prepare(&self) -> io::Result<()> {
        self.set_nonblocking(false)?;
        self.set_read_timeout(Some(Duration::from_secs(2)))
    }
}

#[cfg(unix)]
impl Stream for std::os::unix::net::UnixStream {
    fn prepare(&self) -> io::Result<()> {
        self.set_nonblocking(false)?;
        self.set_read_timeout(Some(Duration::from_secs(2)))
    }
}

fn serve(mut stream: impl Stream, reply: &Reply, requests: &Mutex<Vec<String>>) -> Result<()> {
    stream.prepare().context("configure stream")?;
    let mut request = Vec::new();
    stream
        .read_to_end(&mut request)
        .context("read request")?;
    requests
        .lock()
        .map_err(|error| anyhow!("lock requests: {error}"))?
        .push(String::from_utf8_lossy(&request).into_owned());
    match reply {
        Reply::Bytes(bytes) => {
            stream.write_all(bytes).context("write reply")?;
            stream.flush().context("flush reply")
        }
        Reply::Stall(duration) => {
            thread::sleep(*duration);
            Ok(())
        }
        Reply::Trickle { bytes, interval } => {
            for byte in bytes {
                thread::sleep(*interval);
                if stream.write_all(&[*byte]).and_then(|()| stream.flush()).is_err() {
                    break;
                }
            }
            Ok(())
        }
    }
}
