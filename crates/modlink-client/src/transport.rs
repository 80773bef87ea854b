// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Blocking unary transport to the host's RPC endpoint.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use ciborium::Value;
use modlink_proto::wire::{self, WireError, DEFAULT_MAX_PAYLOAD};
use modlink_proto::{RequestEnvelope, ResponseEnvelope, Status, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

/// One request in, one response out.
///
/// Implementations block the calling thread until the response arrives or the
/// exchange fails. A non-OK [`Status`] is returned as `Err`.
pub trait Transport: Send + Sync {
    /// Issue `method` with an encoded request message and return the encoded
    /// response message.
    fn unary(&self, method: &str, payload: Value) -> Result<Value, Status>;
}

/// Address that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid endpoint address {0:?}")]
pub struct EndpointError(pub String);

/// Where an RPC peer listens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Unix-domain socket path.
    Unix(PathBuf),
    /// TCP `host:port`.
    Tcp(String),
}

/// Strip one pair of matching surrounding quotes (`"` or `'`).
pub fn strip_quotes(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    /// Accepts `unix:/path`, an absolute path, or `host:port`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let addr = strip_quotes(raw);
        if let Some(path) = addr.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(EndpointError(raw.to_string()));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        if addr.starts_with('/') {
            return Ok(Self::Unix(PathBuf::from(addr)));
        }
        match addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Ok(Self::Tcp(addr.to_string()))
            }
            _ => Err(EndpointError(raw.to_string())),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix:{}", path.display()),
            Self::Tcp(addr) => f.write_str(addr),
        }
    }
}

enum Stream {
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl Stream {
    fn connect(endpoint: &Endpoint) -> io::Result<Self> {
        match endpoint {
            Endpoint::Unix(path) => UnixStream::connect(path).map(Self::Unix),
            Endpoint::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str())?;
                stream.set_nodelay(true)?;
                Ok(Self::Tcp(stream))
            }
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Unix(s) => s.read(buf),
            Self::Tcp(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Unix(s) => s.write(buf),
            Self::Tcp(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Unix(s) => s.flush(),
            Self::Tcp(s) => s.flush(),
        }
    }
}

/// Idle connections kept for reuse.
const MAX_IDLE: usize = 4;

/// Socket transport: blocking calls over a small pool of connections.
///
/// Each call checks out an idle connection (or dials a new one) and holds it
/// only for its own exchange, so a callback running while another thread
/// waits on the host can still make outbound calls. When an exchange fails
/// the stream is dropped and the failed call reports `Unavailable`. Failed
/// calls are never retried.
pub struct SocketTransport {
    endpoint: Endpoint,
    max_payload: usize,
    next_call_id: AtomicU64,
    idle: Mutex<Vec<Stream>>,
}

impl SocketTransport {
    /// Transport for `endpoint`; nothing is dialed yet.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            max_payload: DEFAULT_MAX_PAYLOAD,
            next_call_id: AtomicU64::new(0),
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Override the largest response payload accepted.
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    /// Peer address.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Connections currently parked for reuse.
    pub fn idle_connections(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn checkout(&self) -> Result<Stream, Status> {
        let parked = self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop();
        if let Some(stream) = parked {
            return Ok(stream);
        }
        let stream = Stream::connect(&self.endpoint)
            .map_err(|e| Status::unavailable(format!("connect {}: {e}", self.endpoint)))?;
        debug!(endpoint = %self.endpoint, "connected to host");
        Ok(stream)
    }

    fn checkin(&self, stream: Stream) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < MAX_IDLE {
            idle.push(stream);
        }
    }

    fn exchange(
        &self,
        stream: &mut Stream,
        call_id: u64,
        packet: &[u8],
    ) -> Result<ResponseEnvelope, WireError> {
        stream.write_all(packet)?;
        stream.flush()?;
        let Some(frame) = wire::read_frame(stream, self.max_payload)? else {
            return Err(WireError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "host closed the connection",
            )));
        };
        let (envelope, _) = wire::decode_response(&frame)?;
        if envelope.call_id != call_id {
            return Err(WireError::Decode(format!(
                "response for call {} while waiting for call {call_id}",
                envelope.call_id
            )));
        }
        Ok(envelope)
    }
}

impl fmt::Debug for SocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketTransport")
            .field("endpoint", &self.endpoint)
            .field("max_payload", &self.max_payload)
            .finish_non_exhaustive()
    }
}

impl Transport for SocketTransport {
    fn unary(&self, method: &str, payload: Value) -> Result<Value, Status> {
        let call_id = self.next_call_id.fetch_add(1, Ordering::Relaxed);
        let packet = wire::encode_request(&RequestEnvelope {
            method: method.to_string(),
            call_id,
            payload,
        })
        .map_err(|e| Status::internal(e.to_string()))?;

        let mut stream = self.checkout()?;
        match self.exchange(&mut stream, call_id, &packet) {
            Ok(envelope) => {
                self.checkin(stream);
                if envelope.status.is_ok() {
                    Ok(envelope.payload)
                } else {
                    Err(envelope.status)
                }
            }
            Err(err) => {
                warn!(%method, endpoint = %self.endpoint, ?err, "dropping host connection");
                let code = match err {
                    WireError::Io(_) => StatusCode::Unavailable,
                    _ => StatusCode::Internal,
                };
                Err(Status::new(code, err.to_string()))
            }
        }
    }
}

/// Transport used when no host address is known; every call is `Unavailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disconnected;

impl Transport for Disconnected {
    fn unary(&self, method: &str, _payload: Value) -> Result<Value, Status> {
        Err(Status::unavailable(format!(
            "{method}: no host address configured"
        )))
    }
}
