// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Listener the host connects to when it invokes module callbacks.
//!
//! Each connection carries request packets from the host; every request is
//! dispatched through a [`CallbackBridge`] on a blocking worker, so callbacks
//! are free to make outbound calls on the process channel.

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use modlink_proto::wire::{self, CHECKSUM_LEN, HEADER_LEN};
use modlink_proto::{ResponseEnvelope, Status};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, UnixListener};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::bridge::CallbackBridge;
use crate::transport::Endpoint;

/// Serves inbound calls on its own tokio runtime.
#[derive(Debug)]
pub struct BridgeServer {
    runtime: Runtime,
    bridge: Arc<CallbackBridge>,
    endpoint: Endpoint,
}

impl BridgeServer {
    /// Bind `endpoint` and start accepting connections in the background.
    ///
    /// A stale socket file at a unix endpoint is removed first.
    pub fn bind(endpoint: Endpoint, bridge: Arc<CallbackBridge>, max_payload: usize) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("modlink-bridge")
            .build()
            .context("building bridge runtime")?;

        match &endpoint {
            Endpoint::Unix(path) => {
                remove_stale_socket(path)?;
                let listener = runtime
                    .block_on(async { UnixListener::bind(path) })
                    .with_context(|| format!("binding {}", path.display()))?;
                info!(socket = %path.display(), "bridge listening");
                let bridge = bridge.clone();
                runtime.spawn(async move {
                    loop {
                        match listener.accept().await {
                            Ok((stream, _)) => {
                                tokio::spawn(serve(stream, bridge.clone(), max_payload));
                            }
                            Err(err) => warn!(?err, "accept failed"),
                        }
                    }
                });
            }
            Endpoint::Tcp(addr) => {
                let listener = runtime
                    .block_on(TcpListener::bind(addr.as_str()))
                    .with_context(|| format!("binding {addr}"))?;
                info!(%addr, "bridge listening");
                let bridge = bridge.clone();
                runtime.spawn(async move {
                    loop {
                        match listener.accept().await {
                            Ok((stream, peer)) => {
                                debug!(%peer, "host connected");
                                tokio::spawn(serve(stream, bridge.clone(), max_payload));
                            }
                            Err(err) => warn!(?err, "accept failed"),
                        }
                    }
                });
            }
        }

        Ok(Self {
            runtime,
            bridge,
            endpoint,
        })
    }

    /// Bridge the server dispatches into.
    pub fn bridge(&self) -> &Arc<CallbackBridge> {
        &self.bridge
    }

    /// Address the server listens on.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Stop accepting and drop open connections.
    pub fn shutdown(self) {
        self.runtime.shutdown_background();
        if let Endpoint::Unix(path) = &self.endpoint {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(socket = %path.display(), "removed bridge socket"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => warn!(socket = %path.display(), ?err, "failed to remove bridge socket"),
            }
        }
    }
}

fn remove_stale_socket(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(socket = %path.display(), "removed stale socket");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("removing {}", path.display())),
    }
}

async fn serve<S>(stream: S, bridge: Arc<CallbackBridge>, max_payload: usize)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    if let Err(err) = handle_client(stream, bridge, max_payload).await {
        warn!(?err, "bridge connection closed with error");
    }
}

async fn handle_client<S>(stream: S, bridge: Arc<CallbackBridge>, max_payload: usize) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let mut read_buf: Vec<u8> = vec![0u8; 16 * 1024];
    let mut acc: Vec<u8> = Vec::with_capacity(32 * 1024);
    loop {
        let n = reader.read(&mut read_buf).await?;
        if n == 0 {
            break;
        }
        acc.extend_from_slice(&read_buf[..n]);

        while acc.len() >= HEADER_LEN {
            let frame_len = match wire::frame_len(&acc) {
                Ok(len) => len,
                Err(err) => {
                    warn!(?err, "bad packet header; dropping connection");
                    return Ok(());
                }
            };
            if frame_len > max_payload.saturating_add(HEADER_LEN + CHECKSUM_LEN) {
                warn!(frame_len, max_payload, "payload too large; dropping connection");
                return Ok(());
            }
            if acc.len() < frame_len {
                break;
            }
            let packet: Vec<u8> = acc.drain(..frame_len).collect();
            let (request, _) = match wire::decode_request(&packet) {
                Ok(decoded) => decoded,
                Err(err) => {
                    warn!(?err, "failed to decode request");
                    return Ok(());
                }
            };

            let call_id = request.call_id;
            let dispatcher = bridge.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                dispatcher.dispatch(&request.method, &request.payload)
            })
            .await;
            let response = match outcome {
                Ok(Ok(payload)) => ResponseEnvelope {
                    call_id,
                    status: Status::ok(),
                    payload,
                },
                Ok(Err(status)) => error_response(call_id, status),
                Err(join) => error_response(call_id, Status::internal(join.to_string())),
            };
            let bytes = wire::encode_response(&response)?;
            writer.write_all(&bytes).await?;
        }
    }
    Ok(())
}

fn error_response(call_id: u64, status: Status) -> ResponseEnvelope {
    ResponseEnvelope {
        call_id,
        status,
        payload: ciborium::Value::Null,
    }
}
