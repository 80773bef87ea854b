// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared channel to the host and the generic call helper.

use std::env;
use std::fmt;
use std::sync::{Arc, OnceLock};

use modlink_proto::messages::CallbackRef;
use modlink_proto::{wire, Rpc};
use tracing::{debug, warn};

use crate::callback::{global_registry, CallbackId, CallbackRegistry};
use crate::error::RpcResult;
use crate::transport::{Disconnected, Endpoint, SocketTransport, Transport};

/// Environment variable naming the host address used by [`get_channel`] when
/// no channel was installed.
pub const SERVER_SOCKET_ENV: &str = "MODLINK_SERVER_SOCKET";

/// Cheap-to-clone handle on a transport plus the callback registry that
/// callback-taking calls register into.
#[derive(Clone)]
pub struct Channel {
    transport: Arc<dyn Transport>,
    registry: Arc<CallbackRegistry>,
}

impl Channel {
    /// Channel over `transport`, registering callbacks in the process-wide
    /// registry.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    /// Channel over a shared transport.
    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            registry: global_registry(),
        }
    }

    /// Socket channel to `endpoint`; the connection opens on the first call.
    pub fn connect(endpoint: Endpoint) -> Self {
        Self::new(SocketTransport::new(endpoint))
    }

    /// Register callbacks in `registry` instead of the process-wide one.
    pub fn with_registry(mut self, registry: Arc<CallbackRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Registry callback registrations go into.
    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    /// Issue one request and decode its response.
    ///
    /// An `InvalidArgument` status becomes [`RpcError::InvalidArgument`]; any
    /// other non-OK status becomes [`RpcError::Rpc`].
    ///
    /// [`RpcError::InvalidArgument`]: crate::RpcError::InvalidArgument
    /// [`RpcError::Rpc`]: crate::RpcError::Rpc
    pub fn call<R: Rpc>(&self, request: &R) -> RpcResult<R::Response> {
        let payload = wire::to_value(request)?;
        match self.transport.unary(R::METHOD, payload) {
            Ok(value) => Ok(wire::from_value(&value)?),
            Err(status) => {
                debug!(method = R::METHOD, %status, "remote call failed");
                Err(status.into())
            }
        }
    }

    /// Like [`Channel::call`] for a request that hands the host `callbacks`.
    /// If the call fails they are dropped from the registry again.
    pub fn call_with_callbacks<R: Rpc>(
        &self,
        callbacks: &[CallbackRef],
        request: &R,
    ) -> RpcResult<R::Response> {
        self.call(request).inspect_err(|_| {
            for callback in callbacks {
                self.registry.unregister(CallbackId(callback.callback_id));
            }
        })
    }

    /// Like [`Channel::call`], but a failure yields the response's default.
    pub fn call_or_default<R: Rpc>(&self, request: &R) -> R::Response
    where
        R::Response: Default,
    {
        self.call(request).unwrap_or_else(|err| {
            warn!(method = R::METHOD, %err, "remote call failed; using default result");
            R::Response::default()
        })
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel").finish_non_exhaustive()
    }
}

static CHANNEL: OnceLock<Channel> = OnceLock::new();

/// Install the process-wide channel. Fails (returning `channel`) when one is
/// already in place; the first installation wins.
pub fn install_channel(channel: Channel) -> Result<(), Channel> {
    CHANNEL.set(channel)
}

/// The process-wide channel, built on first use.
///
/// Without a prior [`install_channel`], the address comes from
/// [`SERVER_SOCKET_ENV`]; with no usable address every call fails with
/// `Unavailable`. The channel is never torn down.
pub fn get_channel() -> &'static Channel {
    CHANNEL.get_or_init(|| match env::var(SERVER_SOCKET_ENV) {
        Ok(addr) => match addr.parse::<Endpoint>() {
            Ok(endpoint) => {
                debug!(%endpoint, "using host address from environment");
                Channel::connect(endpoint)
            }
            Err(err) => {
                warn!(%err, "ignoring {SERVER_SOCKET_ENV}");
                Channel::new(Disconnected)
            }
        },
        Err(_) => Channel::new(Disconnected),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::RpcError;
    use ciborium::Value;
    use modlink_proto::messages::NameRequest;
    use modlink_proto::{ObjectRef, ObjectType, Reply, Status, StatusCode};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Scripted {
        seen: Mutex<Vec<String>>,
        reply: Option<Status>,
    }

    impl Transport for Scripted {
        fn unary(&self, method: &str, _payload: Value) -> Result<Value, Status> {
            self.seen.lock().unwrap().push(method.to_string());
            match &self.reply {
                Some(status) => Err(status.clone()),
                None => Ok(wire::to_value(&Reply {
                    result: "teapot".to_string(),
                })
                .unwrap()),
            }
        }
    }

    fn name_request() -> NameRequest {
        NameRequest {
            item_ref: ObjectRef::new(ObjectType::Item, 3),
        }
    }

    #[test]
    fn call_uses_bound_method_and_decodes_response() {
        let transport = Arc::new(Scripted::default());
        let channel = Channel::from_arc(transport.clone());
        let reply = channel.call(&name_request()).unwrap();
        assert_eq!(reply.result, "teapot");
        assert_eq!(*transport.seen.lock().unwrap(), vec!["ApiItem/name"]);
    }

    #[test]
    fn call_maps_statuses_to_error_kinds() {
        let channel = Channel::new(Scripted {
            reply: Some(Status::invalid_argument("bad handle")),
            ..Scripted::default()
        });
        assert!(matches!(
            channel.call(&name_request()),
            Err(RpcError::InvalidArgument(msg)) if msg == "bad handle"
        ));

        let channel = Channel::new(Scripted {
            reply: Some(Status::new(StatusCode::Unavailable, "gone")),
            ..Scripted::default()
        });
        let err = channel.call(&name_request()).unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::Unavailable));
    }

    #[test]
    fn call_or_default_swallows_failures() {
        let channel = Channel::new(Disconnected);
        assert_eq!(channel.call_or_default(&name_request()).result, "");
    }
}
