// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Inbound call dispatch: host → module callbacks.
//!
//! Each inbound call names a callback id and echoes the user data it was
//! registered with. The bridge decodes the payload, looks the id up in the
//! registry, checks the registered kind against the call, and invokes the
//! callback synchronously on the calling thread.
//!
//! A call whose id is unknown, or whose id names a callback of another kind,
//! is logged and answered with the call's default response. A panicking
//! callback is answered with an `Internal` status.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use ciborium::Value;
use modlink_proto::callbacks::{
    AssetMissingCall, AssetMissingResponse, ButtonClickedCall, ChangeObserverCall,
    ComboBoxChangedCall, CreateFuncCall, DaemonUpdateCall, DestroyFuncCall, EvaluateFuncCall,
    InboundCall, InitFuncCall, IsReadyCall, LogMessageCall, MouseEventCall, NextChunkCall,
    NextChunkResponse, ShutdownCall, StatusUpdateCall, SuccessResponse, TableContentCall,
    TableContentResponse, TableNumRowsCall, TableNumRowsResponse, TriggerFuncCall,
    UserDataResponse, WindowCloseCall,
};
use modlink_proto::{wire, Bytes, Empty, ObjectRef, Reply, Status, StatusCode};
use tracing::{debug, error, warn};

use crate::callback::{Callback, CallbackId, CallbackRegistry, ChangeEvent, DaemonInfo, UserData};
use crate::channel::Channel;
use crate::proxy::{Proxy, ProxyBase};

/// One-shot shutdown latch the module runtime waits on.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    triggered: Mutex<bool>,
    cond: Condvar,
}

impl ShutdownSignal {
    /// Fresh, untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the latch and wake every waiter.
    pub fn trigger(&self) {
        *self.triggered.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.cond.notify_all();
    }

    /// True once [`ShutdownSignal::trigger`] ran.
    pub fn is_triggered(&self) -> bool {
        *self.triggered.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until triggered.
    pub fn wait(&self) {
        let mut triggered = self.triggered.lock().unwrap_or_else(PoisonError::into_inner);
        while !*triggered {
            triggered = self
                .cond
                .wait(triggered)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until triggered or `timeout` passes; returns whether triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.triggered.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .cond
            .wait_timeout_while(guard, timeout, |triggered| !*triggered)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// Routes inbound calls to registered callbacks.
#[derive(Debug)]
pub struct CallbackBridge {
    registry: Arc<CallbackRegistry>,
    channel: Option<Channel>,
    ready: AtomicBool,
    shutdown: Arc<ShutdownSignal>,
}

impl CallbackBridge {
    /// Bridge dispatching into `registry`. Proxies handed to callbacks use
    /// the process-wide channel.
    pub fn new(registry: Arc<CallbackRegistry>) -> Self {
        Self {
            registry,
            channel: None,
            ready: AtomicBool::new(false),
            shutdown: Arc::new(ShutdownSignal::new()),
        }
    }

    /// Bridge dispatching into `channel`'s registry; proxies handed to
    /// callbacks are bound to `channel`.
    pub fn for_channel(channel: &Channel) -> Self {
        Self {
            channel: Some(channel.clone()),
            ..Self::new(channel.registry().clone())
        }
    }

    /// Answer readiness probes with `ready`.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Current readiness.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Latch tripped by an inbound shutdown call.
    pub fn shutdown_signal(&self) -> Arc<ShutdownSignal> {
        self.shutdown.clone()
    }

    fn proxy<P: Proxy>(&self, object: ObjectRef) -> P {
        P::from_base(ProxyBase::new(object, self.channel.clone()))
    }

    /// Handle one inbound call and return the encoded response.
    pub fn dispatch(&self, method: &str, payload: &Value) -> Result<Value, Status> {
        match method {
            m if m == IsReadyCall::METHOD => encode(&Reply {
                result: self.is_ready(),
            }),
            m if m == ShutdownCall::METHOD => {
                debug!("shutdown requested by host");
                self.shutdown.trigger();
                encode(&Empty {})
            }
            m if m == ButtonClickedCall::METHOD => {
                self.route(payload, |cb, call: ButtonClickedCall, ud| match cb {
                    Callback::ButtonClicked(f) => {
                        f(self.proxy(call.button), ud);
                        Some(SuccessResponse { success: true })
                    }
                    _ => None,
                })
            }
            m if m == ComboBoxChangedCall::METHOD => {
                self.route(payload, |cb, call: ComboBoxChangedCall, ud| match cb {
                    Callback::ComboBoxChanged(f) => {
                        f(self.proxy(call.combo_box), ud);
                        Some(SuccessResponse { success: true })
                    }
                    _ => None,
                })
            }
            m if m == WindowCloseCall::METHOD => {
                self.route(payload, |cb, call: WindowCloseCall, ud| match cb {
                    Callback::WindowClose(f) => {
                        f(self.proxy(call.window), ud);
                        Some(SuccessResponse { success: true })
                    }
                    _ => None,
                })
            }
            m if m == MouseEventCall::METHOD => {
                self.route(payload, |cb, call: MouseEventCall, ud| match cb {
                    Callback::MouseEvent(f) => {
                        f(self.proxy(call.component), call.event, ud);
                        Some(SuccessResponse { success: true })
                    }
                    _ => None,
                })
            }
            m if m == CreateFuncCall::METHOD => {
                self.route(payload, |cb, call: CreateFuncCall, _| match cb {
                    Callback::ModuleCreate(f) => Some(UserDataResponse {
                        user_data: f(self.proxy(call.graph)).0,
                    }),
                    _ => None,
                })
            }
            // Lifecycle calls carry the instance's user data, not the
            // registration's.
            m if m == DestroyFuncCall::METHOD => {
                self.route(payload, |cb, call: DestroyFuncCall, _| match cb {
                    Callback::ModuleDestroy(f) => {
                        f(UserData(call.user_data));
                        Some(Empty {})
                    }
                    _ => None,
                })
            }
            m if m == InitFuncCall::METHOD => {
                self.route(payload, |cb, call: InitFuncCall, _| match cb {
                    Callback::GraphInit(f) => Some(UserDataResponse {
                        user_data: f(self.proxy(call.graph), UserData(call.user_data)).0,
                    }),
                    _ => None,
                })
            }
            m if m == EvaluateFuncCall::METHOD => {
                self.route(payload, |cb, call: EvaluateFuncCall, _| match cb {
                    Callback::GraphEvaluate(f) => Some(SuccessResponse {
                        success: f(self.proxy(call.graph), UserData(call.user_data)),
                    }),
                    _ => None,
                })
            }
            m if m == TriggerFuncCall::METHOD => {
                self.route(payload, |cb, call: TriggerFuncCall, _| match cb {
                    Callback::GraphTrigger(f) => {
                        f(self.proxy(call.graph), call.trigger_id, UserData(call.user_data));
                        Some(Empty {})
                    }
                    _ => None,
                })
            }
            m if m == LogMessageCall::METHOD => {
                self.route(payload, |cb, call: LogMessageCall, ud| match cb {
                    Callback::Log(f) => {
                        f(call.level, &call.message, ud);
                        Some(Empty {})
                    }
                    _ => None,
                })
            }
            m if m == AssetMissingCall::METHOD => {
                self.route(payload, |cb, call: AssetMissingCall, ud| match cb {
                    Callback::AssetMissing(f) => Some(AssetMissingResponse {
                        resolved_path: f(&call.asset_path, ud).unwrap_or_default(),
                    }),
                    _ => None,
                })
            }
            m if m == DaemonUpdateCall::METHOD => {
                self.route(payload, |cb, call: DaemonUpdateCall, ud| match cb {
                    Callback::DaemonUpdate(f) => {
                        let daemons: Vec<DaemonInfo> =
                            call.daemons.into_iter().map(DaemonInfo::from).collect();
                        f(&daemons, ud);
                        Some(Empty {})
                    }
                    _ => None,
                })
            }
            m if m == StatusUpdateCall::METHOD => {
                self.route(payload, |cb, call: StatusUpdateCall, ud| match cb {
                    Callback::StatusUpdate(f) => {
                        f(call.status, ud);
                        Some(Empty {})
                    }
                    _ => None,
                })
            }
            m if m == NextChunkCall::METHOD => {
                self.route(payload, |cb, call: NextChunkCall, ud| match cb {
                    Callback::NextChunk(f) => {
                        let max = call.max_size as usize;
                        Some(match f(max, ud) {
                            Some(mut data) => {
                                data.truncate(max);
                                NextChunkResponse { data, done: false }
                            }
                            None => NextChunkResponse {
                                data: Bytes::new(),
                                done: true,
                            },
                        })
                    }
                    _ => None,
                })
            }
            m if m == TableContentCall::METHOD => {
                self.route(payload, |cb, call: TableContentCall, ud| match cb {
                    Callback::TableContent(f) => Some(TableContentResponse {
                        text: f(call.row, call.column, ud),
                    }),
                    _ => None,
                })
            }
            m if m == TableNumRowsCall::METHOD => {
                self.route(payload, |cb, _: TableNumRowsCall, ud| match cb {
                    Callback::TableNumRows(f) => Some(TableNumRowsResponse { count: f(ud) }),
                    _ => None,
                })
            }
            m if m == ChangeObserverCall::METHOD => {
                self.route(payload, |cb, call: ChangeObserverCall, ud| match cb {
                    Callback::ChangeObserver(f) => {
                        f(
                            ChangeEvent {
                                item: self.proxy(call.event.item),
                                kind: call.event.kind,
                                attribute_id: call.event.attribute_id,
                            },
                            ud,
                        );
                        Some(Empty {})
                    }
                    _ => None,
                })
            }
            other => {
                warn!(method = other, "unknown inbound method");
                Err(Status::new(
                    StatusCode::Unimplemented,
                    format!("unknown method {other}"),
                ))
            }
        }
    }

    fn route<C, F>(&self, payload: &Value, invoke: F) -> Result<Value, Status>
    where
        C: InboundCall,
        F: FnOnce(&Callback, C, UserData) -> Option<C::Response>,
    {
        let call: C = wire::from_value(payload).map_err(|e| Status::invalid_argument(e.to_string()))?;
        let header = call.header();
        let id = CallbackId(header.callback_id);

        let Some(registration) = self.registry.get(id) else {
            warn!(method = C::METHOD, id = id.0, "no callback registered; answering default");
            return encode(&C::Response::default());
        };
        if registration.user_data.0 != header.user_data {
            debug!(
                method = C::METHOD,
                id = id.0,
                registered = registration.user_data.0,
                received = header.user_data,
                "user data differs from registration"
            );
        }

        let kind = registration.callback.kind();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            invoke(&registration.callback, call, registration.user_data)
        }));
        match outcome {
            Ok(Some(response)) => encode(&response),
            Ok(None) => {
                warn!(
                    method = C::METHOD,
                    id = id.0,
                    registered = kind,
                    "callback kind does not match call; answering default"
                );
                encode(&C::Response::default())
            }
            Err(_) => {
                error!(method = C::METHOD, id = id.0, "callback panicked");
                Err(Status::internal(format!("callback {} panicked", id.0)))
            }
        }
    }
}

fn encode<T: serde::Serialize>(response: &T) -> Result<Value, Status> {
    wire::to_value(response).map_err(|e| Status::internal(e.to_string()))
}
