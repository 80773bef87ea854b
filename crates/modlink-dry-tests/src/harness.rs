// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Socket-level fixtures: a host server speaking the real packet format, and
//! a blocking client for a module's callback listener.

use std::io::Write;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use ciborium::Value;
use modlink_client::{Endpoint, SocketTransport, Transport};
use modlink_proto::callbacks::InboundCall;
use modlink_proto::wire::{self, DEFAULT_MAX_PAYLOAD};
use modlink_proto::{RequestEnvelope, ResponseEnvelope, Status};
use tempfile::TempDir;

/// Serves a host (usually a [`FakeHost`](crate::FakeHost)) on a Unix socket
/// in a temp dir, one thread per connection. The accept thread is detached
/// and outlives the server.
#[derive(Debug)]
pub struct HostServer {
    dir: TempDir,
    path: PathBuf,
}

impl HostServer {
    /// Bind a fresh socket and start serving `host`.
    pub fn spawn<T: Transport + 'static>(host: Arc<T>) -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("host.sock");
        let listener = UnixListener::bind(&path)?;
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let host = host.clone();
                thread::spawn(move || serve_connection(stream, &*host));
            }
        });
        Ok(Self { dir, path })
    }

    /// Socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Endpoint clients dial.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::Unix(self.path.clone())
    }

    /// Directory the socket lives in; removed on drop.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

fn serve_connection<T: Transport>(mut stream: UnixStream, host: &T) {
    let mut reader = match stream.try_clone() {
        Ok(reader) => reader,
        Err(_) => return,
    };
    while let Ok(Some(frame)) = wire::read_frame(&mut reader, DEFAULT_MAX_PAYLOAD) {
        let Ok((request, _)) = wire::decode_request(&frame) else {
            return;
        };
        let response = match host.unary(&request.method, request.payload) {
            Ok(payload) => ResponseEnvelope {
                call_id: request.call_id,
                status: Status::ok(),
                payload,
            },
            Err(status) => ResponseEnvelope {
                call_id: request.call_id,
                status,
                payload: Value::Null,
            },
        };
        let Ok(bytes) = wire::encode_response(&response) else {
            return;
        };
        if stream.write_all(&bytes).is_err() {
            return;
        }
    }
}

/// Blocking client for a module's callback listener, standing in for the
/// host's side of inbound calls.
#[derive(Debug)]
pub struct ModuleClient {
    stream: UnixStream,
    next_call_id: AtomicU64,
}

impl ModuleClient {
    /// Dial the module listening at `path`.
    pub fn connect(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            stream: UnixStream::connect(path)?,
            next_call_id: AtomicU64::new(1),
        })
    }

    /// Send `method` with a raw payload and wait for the answer.
    pub fn call_raw(&mut self, method: &str, payload: Value) -> Result<Value, Status> {
        let call_id = self.next_call_id.fetch_add(1, Ordering::Relaxed);
        let request = RequestEnvelope {
            method: method.to_string(),
            call_id,
            payload,
        };
        let bytes = wire::encode_request(&request).map_err(|e| Status::internal(e.to_string()))?;
        self.stream
            .write_all(&bytes)
            .map_err(|e| Status::unavailable(e.to_string()))?;
        let frame = wire::read_frame(&mut self.stream, DEFAULT_MAX_PAYLOAD)
            .map_err(|e| Status::unavailable(e.to_string()))?
            .ok_or_else(|| Status::unavailable("module closed the connection"))?;
        let (response, _) =
            wire::decode_response(&frame).map_err(|e| Status::internal(e.to_string()))?;
        if response.call_id != call_id {
            return Err(Status::internal(format!(
                "answer for call {} while waiting for {call_id}",
                response.call_id
            )));
        }
        if response.status.is_ok() {
            Ok(response.payload)
        } else {
            Err(response.status)
        }
    }

    /// Invoke a registered callback and decode its answer.
    pub fn invoke<C: InboundCall>(&mut self, call: &C) -> Result<C::Response, Status> {
        let payload = wire::to_value(call).map_err(|e| Status::internal(e.to_string()))?;
        let value = self.call_raw(C::METHOD, payload)?;
        wire::from_value(&value).map_err(|e| Status::internal(e.to_string()))
    }
}

/// Transport whose peer never answers: it dials a socket path nobody listens
/// on and counts the attempts.
#[derive(Debug)]
pub struct UnreachableTransport {
    _dir: TempDir,
    inner: SocketTransport,
    attempts: AtomicUsize,
}

impl UnreachableTransport {
    /// Transport pointed at a fresh, unbound socket path.
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let inner = SocketTransport::new(Endpoint::Unix(dir.path().join("nobody.sock")));
        Ok(Self {
            _dir: dir,
            inner,
            attempts: AtomicUsize::new(0),
        })
    }

    /// Calls attempted so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Transport for UnreachableTransport {
    fn unary(&self, method: &str, payload: Value) -> Result<Value, Status> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.inner.unary(method, payload)
    }
}
