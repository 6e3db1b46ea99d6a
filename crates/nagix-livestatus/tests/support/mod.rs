//! Fake Livestatus server shared by the integration tests.

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use nagix_config::SocketEndpoint;

/// Frames `body` behind a fixed16 response header.
pub fn fixed16(status: u16, body: &str) -> Vec<u8> {
    format!("{status:03} {:>11}\n{body}", body.len()).into_bytes()
}

/// Accepts at most one connection, records the request and writes `reply`.
pub struct FakeLivestatus {
    port: u16,
    requests: Arc<Mutex<Vec<String>>>,
    handle: Option<thread::JoinHandle<Result<()>>>,
}

impl FakeLivestatus {
    pub fn spawn(reply: Vec<u8>) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake livestatus")?;
        listener
            .set_nonblocking(true)
            .context("fake livestatus nonblocking")?;
        let port = listener.local_addr().context("local addr")?.port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let handle = thread::spawn(move || Self::serve(&listener, &reply, &recorded));
        Ok(Self {
            port,
            requests,
            handle: Some(handle),
        })
    }

    pub fn endpoint(&self) -> SocketEndpoint {
        SocketEndpoint::tcp("127.0.0.1", self.port)
    }

    /// Waits for the server thread and returns the recorded requests.
    pub fn take_requests(&mut self) -> Result<Vec<String>> {
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

    fn serve(listener: &TcpListener, reply: &[u8], requests: &Mutex<Vec<String>>) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(1);
        let stream = loop {
            match listener.accept() {
                Ok((stream, _)) => break stream,
                Err(ref error)
                    if error.kind() == io::ErrorKind::WouldBlock && Instant::now() < deadline =>
                {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(error) => return Err(error).context("accept connection"),
            }
        };
        Self::respond(stream, reply, requests)
    }

    fn respond(mut stream: TcpStream, reply: &[u8], requests: &Mutex<Vec<String>>) -> Result<()> {
        stream.set_nonblocking(false).context("blocking stream")?;
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .context("read timeout")?;
        let mut request = Vec::new();
        stream.read_to_end(&mut request).context("read request")?;
        requests
            .lock()
            .map_err(|error| anyhow!("lock requests: {error}"))?
            .push(String::from_utf8_lossy(&request).into_owned());
        stream.write_all(reply).context("write reply")?;
        stream.flush().context("flush reply")
    }
}

impl Drop for FakeLivestatus {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// An endpoint nothing is listening on.
pub fn closed_endpoint() -> Result<SocketEndpoint> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind probe listener")?;
    let port = listener.local_addr().context("probe address")?.port();
    Ok(SocketEndpoint::tcp("127.0.0.1", port))
}
