// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Module-side callback registry.
//!
//! The host invokes module callbacks by id. Each id maps to a typed
//! [`Callback`] plus the [`UserData`] token registered with it. Ids are
//! allocated once and never reused for the life of the process; entries are
//! only removed through an explicit [`CallbackRegistry::unregister`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use modlink_proto::callbacks::{ChangeKind, DaemonInfoMsg, MouseEventMsg};
use modlink_proto::messages::{CallbackRef, LogLevel};
use modlink_proto::{AttributeId, Bytes};

use crate::gui::{Button, ComboBox, GuiComponent, Window};
use crate::item::Item;
use crate::module_graph::ModuleNodeGraph;

/// Opaque token handed back to a callback on every invocation.
///
/// Travels over the wire as a `u64`; use a [`UserDataTable`] to associate
/// typed module state with a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserData(pub u64);

impl UserData {
    /// No user data.
    pub const NONE: Self = Self(0);
}

/// Process-unique callback id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(pub i32);

/// Table of typed module state addressed by [`UserData`] tokens.
pub struct UserDataTable {
    next: AtomicU64,
    entries: RwLock<HashMap<u64, Arc<dyn Any + Send + Sync>>>,
}

impl UserDataTable {
    /// Empty table; tokens start at 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store `value` and return its token.
    pub fn insert<T: Any + Send + Sync>(&self, value: T) -> UserData {
        let token = self.next.fetch_add(1, Ordering::Relaxed);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token, Arc::new(value));
        UserData(token)
    }

    /// Value stored under `token`, if present and of type `T`.
    pub fn get<T: Any + Send + Sync>(&self, token: UserData) -> Option<Arc<T>> {
        let entry = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&token.0)
            .cloned()?;
        entry.downcast::<T>().ok()
    }

    /// Drop the value stored under `token`.
    pub fn remove(&self, token: UserData) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&token.0)
            .is_some()
    }
}

impl Default for UserDataTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UserDataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("UserDataTable").field("len", &len).finish()
    }
}

/// Render daemon state handed to a daemon-update callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaemonInfo {
    /// Daemon address.
    pub ip: String,
    /// Display name.
    pub name: String,
    /// Host-defined state code.
    pub state: u32,
    /// GPUs exposed by the daemon.
    pub gpu_count: u32,
}

impl From<DaemonInfoMsg> for DaemonInfo {
    fn from(msg: DaemonInfoMsg) -> Self {
        Self {
            ip: msg.ip,
            name: msg.name,
            state: msg.state,
            gpu_count: msg.gpu_count,
        }
    }
}

/// Mouse event handed to a mouse listener.
pub type MouseEvent = MouseEventMsg;

/// Change of an observed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Changed item.
    pub item: Item,
    /// Kind of change.
    pub kind: ChangeKind,
    /// Attribute concerned, for attribute changes.
    pub attribute_id: AttributeId,
}

/// Button click handler.
pub type ButtonClickedFn = dyn Fn(Button, UserData) + Send + Sync;
/// Combo box selection handler.
pub type ComboBoxChangedFn = dyn Fn(ComboBox, UserData) + Send + Sync;
/// Window close handler.
pub type WindowCloseFn = dyn Fn(Window, UserData) + Send + Sync;
/// Mouse event handler.
pub type MouseEventFn = dyn Fn(GuiComponent, MouseEvent, UserData) + Send + Sync;
/// Module graph instance creation; returns the instance's user data.
pub type ModuleCreateFn = dyn Fn(ModuleNodeGraph) -> UserData + Send + Sync;
/// Module graph instance destruction; receives the instance's user data.
pub type ModuleDestroyFn = dyn Fn(UserData) + Send + Sync;
/// Module graph set-up; returns the (possibly replaced) user data.
pub type GraphInitFn = dyn Fn(ModuleNodeGraph, UserData) -> UserData + Send + Sync;
/// Module graph evaluation; returns whether evaluation succeeded.
pub type GraphEvaluateFn = dyn Fn(ModuleNodeGraph, UserData) -> bool + Send + Sync;
/// Module graph trigger.
pub type GraphTriggerFn = dyn Fn(ModuleNodeGraph, u32, UserData) + Send + Sync;
/// Host log line.
pub type LogFn = dyn Fn(LogLevel, &str, UserData) + Send + Sync;
/// Missing asset resolution; `None` leaves the asset unresolved.
pub type AssetMissingFn = dyn Fn(&str, UserData) -> Option<String> + Send + Sync;
/// Render daemon list update.
pub type DaemonUpdateFn = dyn Fn(&[DaemonInfo], UserData) + Send + Sync;
/// Render status update.
pub type StatusUpdateFn = dyn Fn(u32, UserData) + Send + Sync;
/// Upload stream source; returns at most `max_size` bytes, `None` when done.
pub type NextChunkFn = dyn Fn(usize, UserData) -> Option<Bytes> + Send + Sync;
/// Table cell text for `(row, column)`.
pub type TableContentFn = dyn Fn(u32, u32, UserData) -> String + Send + Sync;
/// Table row count.
pub type TableNumRowsFn = dyn Fn(UserData) -> u32 + Send + Sync;
/// Observed item change.
pub type ChangeObserverFn = dyn Fn(ChangeEvent, UserData) + Send + Sync;

/// A registered module callback, one variant per callback kind.
#[derive(Clone)]
pub enum Callback {
    /// Button clicked.
    ButtonClicked(Arc<ButtonClickedFn>),
    /// Combo box selection changed.
    ComboBoxChanged(Arc<ComboBoxChangedFn>),
    /// Window closing.
    WindowClose(Arc<WindowCloseFn>),
    /// Mouse event.
    MouseEvent(Arc<MouseEventFn>),
    /// Module graph instance created.
    ModuleCreate(Arc<ModuleCreateFn>),
    /// Module graph instance destroyed.
    ModuleDestroy(Arc<ModuleDestroyFn>),
    /// Module graph set-up.
    GraphInit(Arc<GraphInitFn>),
    /// Module graph evaluation.
    GraphEvaluate(Arc<GraphEvaluateFn>),
    /// Module graph trigger.
    GraphTrigger(Arc<GraphTriggerFn>),
    /// Host log line.
    Log(Arc<LogFn>),
    /// Missing asset resolution.
    AssetMissing(Arc<AssetMissingFn>),
    /// Render daemon update.
    DaemonUpdate(Arc<DaemonUpdateFn>),
    /// Render status update.
    StatusUpdate(Arc<StatusUpdateFn>),
    /// Upload stream chunk source.
    NextChunk(Arc<NextChunkFn>),
    /// Table cell text.
    TableContent(Arc<TableContentFn>),
    /// Table row count.
    TableNumRows(Arc<TableNumRowsFn>),
    /// Observed item change.
    ChangeObserver(Arc<ChangeObserverFn>),
}

impl Callback {
    /// Kind name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ButtonClicked(_) => "ButtonClicked",
            Self::ComboBoxChanged(_) => "ComboBoxChanged",
            Self::WindowClose(_) => "WindowClose",
            Self::MouseEvent(_) => "MouseEvent",
            Self::ModuleCreate(_) => "ModuleCreate",
            Self::ModuleDestroy(_) => "ModuleDestroy",
            Self::GraphInit(_) => "GraphInit",
            Self::GraphEvaluate(_) => "GraphEvaluate",
            Self::GraphTrigger(_) => "GraphTrigger",
            Self::Log(_) => "Log",
            Self::AssetMissing(_) => "AssetMissing",
            Self::DaemonUpdate(_) => "DaemonUpdate",
            Self::StatusUpdate(_) => "StatusUpdate",
            Self::NextChunk(_) => "NextChunk",
            Self::TableContent(_) => "TableContent",
            Self::TableNumRows(_) => "TableNumRows",
            Self::ChangeObserver(_) => "ChangeObserver",
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.kind()).finish()
    }
}

/// A callback together with the user data it was registered with.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The callback.
    pub callback: Callback,
    /// Token passed back on each invocation.
    pub user_data: UserData,
}

/// Thread-safe id → registration map.
///
/// Registration (module threads) and lookup (bridge threads) may race; the
/// map sits behind a `RwLock` and ids come from an atomic counter.
pub struct CallbackRegistry {
    next_id: AtomicI32,
    entries: RwLock<HashMap<CallbackId, Registration>>,
}

impl CallbackRegistry {
    /// Empty registry; ids start at 1.
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register `callback` and return its fresh id.
    pub fn register(&self, callback: Callback, user_data: UserData) -> CallbackId {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(id = id.0, kind = callback.kind(), "callback registered");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                Registration {
                    callback,
                    user_data,
                },
            );
        id
    }

    /// Register `callback` and return the wire reference naming it.
    pub fn register_ref(&self, callback: Callback, user_data: UserData) -> CallbackRef {
        let id = self.register(callback, user_data);
        CallbackRef {
            callback_id: id.0,
            user_data: user_data.0,
        }
    }

    /// Remove a registration; returns whether it existed.
    pub fn unregister(&self, id: CallbackId) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Registration under `id`.
    pub fn get(&self, id: CallbackId) -> Option<Registration> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

static REGISTRY: OnceLock<Arc<CallbackRegistry>> = OnceLock::new();

/// The process-wide registry.
pub fn global_registry() -> Arc<CallbackRegistry> {
    REGISTRY
        .get_or_init(|| Arc::new(CallbackRegistry::new()))
        .clone()
}
