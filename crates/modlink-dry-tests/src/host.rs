// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory stand-in for the renderer host.
//!
//! [`FakeHost`] implements [`Transport`] and serves every outbound method the
//! client issues against a small object model: a root graph, items with
//! attributes, nodes with pins, GUI components and captured callback
//! registrations. Validation mirrors the host: null or destroyed handles,
//! unknown names, out-of-range indices and type mismatches are answered
//! with `InvalidArgument`.
//!
//! # Example
//!
//! ```
//! use modlink_dry_tests::FakeHost;
//! use modlink_client::{AttributeApi, Item, Proxy};
//! use modlink_proto::{AttrValue, AttributeId, ObjectType};
//!
//! let host = FakeHost::new();
//! let item = host.add_item(ObjectType::Item, "lamp", host.root());
//! host.define_attribute(item, AttributeId::A_VALUE, "value", AttrValue::Float(1.0));
//!
//! let lamp = Item::attached(item, &host.channel());
//! lamp.set(AttributeId::A_VALUE, 2.5f32, false).unwrap();
//! assert_eq!(lamp.get_float("value").unwrap(), 2.5);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ciborium::Value;
use modlink_client::{CallbackRegistry, Channel, Transport};
use modlink_proto::messages::{
    AttrCountRequest, AttrIdIxRequest, AttrNameRequest, AttrTypeByAttrIdRequest,
    AttrTypeByIxRequest, AttrTypeByNameRequest, ButtonCreateRequest, CallbackRef,
    ClearAllAttrRequest, ClearAnimByAttrIdRequest, ClearAnimByIxRequest, ClearAnimByNameRequest,
    ClearAttrByAttrIdRequest, ClearAttrByIxRequest, ClearAttrByNameRequest, ClearGraphRequest,
    ComboBoxCreateRequest, ComboBoxSelectedRequest, ComboBoxSetSelectedRequest,
    ConnectToIxRequest, ConnectedNodeIxRequest, CopyAttrFromIxRequest, CopyAttrFromNameRequest,
    CopyAttrFromRequest, CopyItemTreeRequest, DestinationsRequest, DestroyRequest,
    EvaluateRequest, ExpandOutOfPinRequest, FindItemsByNameRequest, GetAnimByAttrIdRequest,
    GetAnimByIxRequest, GetAnimByNameRequest, GetAnimResponse, GetAttrResponse,
    GetByAttrIdRequest, GetByIxRequest, GetByNameRequest, GraphCreateRequest, GraphOwnerRequest,
    GuiIsEnabledRequest, GuiSetEnabledRequest, GuiSetMouseListenerRequest, GuiSetTooltipRequest,
    GuiSizeRequest, HasAttrByAttrIdRequest, HasAttrByIxRequest, HasAttrByNameRequest,
    IsAnimatedByAttrIdRequest, IsAnimatedByIxRequest, IsAnimatedByNameRequest, IsGraphRequest,
    IsNodeRequest, LinkerInfo, LogLevel, LogRequest, NameRequest, NodeCreateRequest,
    NodeTypeRequest, ObserveItemRequest, OutTypeRequest, OwnedItemsRequest, PinCountRequest,
    PinNameIxRequest, PinOwnerRequest, RegisterAssetMissingRequest, RegisterDaemonUpdateRequest,
    RegisterLogCallbackRequest, RegisterModuleGraphRequest, RegisterStatusUpdateRequest,
    RootNodeGraphRequest, SetAnimByAttrIdRequest, SetAnimByIxRequest, SetAnimByNameRequest,
    SetByAttrIdRequest, SetByIxRequest, SetByNameRequest, SetEvaluateTimeChangesRequest,
    SetInputLinkersRequest, SetNameRequest, SetOutputLinkersRequest, StartRequest,
    StartUploadRequest, StopRequest, TableCreateRequest, ToGraphRequest, ToNodeRequest,
    UniqueIdRequest, UnfoldGraphRequest, UnregisterLogCallbackRequest, WindowCreateRequest,
};
use modlink_proto::{
    wire, AttrType, AttrValue, AttrValueMsg, AttributeId, Empty, Handle, Int2, ObjectRef,
    ObjectType, Reply, Rpc, Status, StatusCode, TimeSampling,
};

/// Pin names given to nodes created with `configure_pins`.
pub const DEFAULT_PINS: [&str; 2] = ["input", "modifier"];

/// Ids handed to attributes created by set-by-name start here.
pub const DYNAMIC_ATTRIBUTE_BASE: u32 = 10_000;

const ROOT_HANDLE: Handle = 1;

/// Callback registration the fake host received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCallback {
    /// Method that carried the registration.
    pub method: String,
    /// Role of the callback within that request (`callback`, `create`,
    /// `num_rows`, ...).
    pub slot: &'static str,
    /// Object the callback is attached to, when there is one.
    pub target: Option<ObjectRef>,
    /// Id and user data as sent.
    pub callback: CallbackRef,
}

#[derive(Debug, Clone)]
struct FakeAttr {
    id: AttributeId,
    name: String,
    default: AttrValue,
    value: AttrValue,
    anim: Option<(TimeSampling, AttrValue)>,
    dynamic: bool,
}

impl FakeAttr {
    fn attr_type(&self) -> AttrType {
        self.default.attr_type()
    }

    fn reset(&mut self) {
        self.value = self.default.clone();
        self.anim = None;
    }
}

#[derive(Debug, Clone)]
struct FakeObject {
    kind: ObjectType,
    name: String,
    owner: Option<Handle>,
    node_type: u32,
    out_type: u32,
    attrs: Vec<FakeAttr>,
    pins: Vec<(String, Option<Handle>)>,
    enabled: bool,
    tooltip: String,
    combo_items: Vec<String>,
    selected: i32,
    evaluate_time_changes: bool,
}

impl FakeObject {
    fn new(kind: ObjectType, name: impl Into<String>, owner: Option<Handle>) -> Self {
        Self {
            kind,
            name: name.into(),
            owner,
            node_type: 0,
            out_type: 0,
            attrs: Vec::new(),
            pins: Vec::new(),
            enabled: true,
            tooltip: String::new(),
            combo_items: Vec::new(),
            selected: -1,
            evaluate_time_changes: false,
        }
    }

    fn is_graph(&self) -> bool {
        matches!(
            self.kind,
            ObjectType::NodeGraph | ObjectType::RootNodeGraph | ObjectType::ModuleNodeGraph
        )
    }
}

enum Addr {
    Id(AttributeId),
    Name(String),
    Index(u32),
}

#[derive(Debug, Default)]
struct HostState {
    next_handle: Handle,
    next_dynamic_id: u32,
    objects: BTreeMap<Handle, FakeObject>,
    calls: Vec<String>,
    failures: HashMap<String, Status>,
    callbacks: Vec<CapturedCallback>,
    log: Vec<(LogLevel, String)>,
    started: Option<String>,
    evaluations: HashMap<Handle, usize>,
    modules: Vec<String>,
}

fn invalid(message: impl Into<String>) -> Status {
    Status::invalid_argument(message)
}

impl HostState {
    fn alloc(&mut self, object: FakeObject) -> ObjectRef {
        self.next_handle += 1;
        let handle = self.next_handle;
        let kind = object.kind;
        self.objects.insert(handle, object);
        ObjectRef::new(kind, handle)
    }

    fn object(&self, r: ObjectRef) -> Result<&FakeObject, Status> {
        if r.is_null() {
            return Err(invalid("null object"));
        }
        self.objects
            .get(&r.handle)
            .ok_or_else(|| invalid(format!("unknown handle {}", r.handle)))
    }

    fn object_mut(&mut self, r: ObjectRef) -> Result<&mut FakeObject, Status> {
        if r.is_null() {
            return Err(invalid("null object"));
        }
        self.objects
            .get_mut(&r.handle)
            .ok_or_else(|| invalid(format!("unknown handle {}", r.handle)))
    }

    fn object_ref(&self, handle: Handle) -> ObjectRef {
        self.objects
            .get(&handle)
            .map_or_else(|| ObjectRef::null(ObjectType::Item), |o| ObjectRef::new(o.kind, handle))
    }

    fn graph(&self, r: ObjectRef) -> Result<&FakeObject, Status> {
        let object = self.object(r)?;
        if !object.is_graph() {
            return Err(invalid(format!("handle {} is not a graph", r.handle)));
        }
        Ok(object)
    }

    fn owned_by(&self, owner: Handle) -> Vec<Handle> {
        self.objects
            .iter()
            .filter(|(_, o)| o.owner == Some(owner))
            .map(|(h, _)| *h)
            .collect()
    }

    fn remove_tree(&mut self, handle: Handle) {
        for child in self.owned_by(handle) {
            self.remove_tree(child);
        }
        self.objects.remove(&handle);
        for object in self.objects.values_mut() {
            for pin in &mut object.pins {
                if pin.1 == Some(handle) {
                    pin.1 = None;
                }
            }
        }
    }

    fn capture(
        &mut self,
        method: &str,
        slot: &'static str,
        target: Option<ObjectRef>,
        callback: CallbackRef,
    ) {
        self.callbacks.push(CapturedCallback {
            method: method.to_string(),
            slot,
            target,
            callback,
        });
    }

    // --- attributes --------------------------------------------------------

    fn attr_pos(&self, item: ObjectRef, addr: &Addr) -> Result<usize, Status> {
        let object = self.object(item)?;
        let found = match addr {
            Addr::Id(id) => object.attrs.iter().position(|a| a.id == *id),
            Addr::Name(name) => object.attrs.iter().position(|a| a.name == *name),
            Addr::Index(ix) => {
                let ix = *ix as usize;
                (ix < object.attrs.len()).then_some(ix)
            }
        };
        found.ok_or_else(|| match addr {
            Addr::Id(id) => invalid(format!("no attribute {}", id.0)),
            Addr::Name(name) => invalid(format!("no attribute named {name:?}")),
            Addr::Index(ix) => invalid(format!(
                "attribute index {ix} out of range ({})",
                object.attrs.len()
            )),
        })
    }

    fn attr(&self, item: ObjectRef, addr: &Addr) -> Result<&FakeAttr, Status> {
        let pos = self.attr_pos(item, addr)?;
        Ok(&self.object(item)?.attrs[pos])
    }

    fn attr_mut(&mut self, item: ObjectRef, addr: &Addr) -> Result<&mut FakeAttr, Status> {
        let pos = self.attr_pos(item, addr)?;
        Ok(&mut self.object_mut(item)?.attrs[pos])
    }

    fn get_attr(
        &self,
        item: ObjectRef,
        addr: &Addr,
        expected: AttrType,
    ) -> Result<GetAttrResponse, Status> {
        let attr = self.attr(item, addr)?;
        if attr.attr_type() != expected {
            return Err(invalid(format!(
                "attribute {:?} is {:?}, not {expected:?}",
                attr.name,
                attr.attr_type()
            )));
        }
        Ok(GetAttrResponse {
            value: attr.value.clone().into(),
        })
    }

    fn set_attr(&mut self, item: ObjectRef, addr: Addr, value: AttrValueMsg) -> Result<Empty, Status> {
        let value = value
            .into_value()
            .ok_or_else(|| invalid("empty value container"))?;
        match self.attr_pos(item, &addr) {
            Ok(_) => {
                let attr = self.attr_mut(item, &addr)?;
                if attr.attr_type() != value.attr_type() {
                    return Err(invalid(format!(
                        "attribute {:?} is {:?}, not {:?}",
                        attr.name,
                        attr.attr_type(),
                        value.attr_type()
                    )));
                }
                attr.value = value;
            }
            Err(err) => {
                let Addr::Name(name) = addr else {
                    return Err(err);
                };
                self.object(item)?;
                let id = AttributeId(DYNAMIC_ATTRIBUTE_BASE + self.next_dynamic_id);
                self.next_dynamic_id += 1;
                self.object_mut(item)?.attrs.push(FakeAttr {
                    id,
                    name,
                    default: value.clone(),
                    value,
                    anim: None,
                    dynamic: true,
                });
            }
        }
        Ok(Empty {})
    }

    fn get_anim(
        &self,
        item: ObjectRef,
        addr: &Addr,
        expected: AttrType,
    ) -> Result<GetAnimResponse, Status> {
        let attr = self.attr(item, addr)?;
        if attr.attr_type() != expected {
            return Err(invalid(format!(
                "attribute {:?} is {:?}, not {expected:?}",
                attr.name,
                attr.attr_type()
            )));
        }
        Ok(match &attr.anim {
            Some((times, values)) => GetAnimResponse {
                sample_count: u32::try_from(times.sample_count()).ok(),
                times: times.clone(),
                values: values.clone().into(),
            },
            None => GetAnimResponse::default(),
        })
    }

    fn set_anim(
        &mut self,
        item: ObjectRef,
        addr: &Addr,
        times: TimeSampling,
        values: AttrValueMsg,
    ) -> Result<Empty, Status> {
        let attr = self.attr_mut(item, addr)?;
        let values = values.into_value();
        let count = values.as_ref().and_then(AttrValue::array_len).unwrap_or(0);
        if times.values_per_sample(count).is_none() {
            return Err(invalid(format!(
                "{count} values do not fit {} samples",
                times.sample_count()
            )));
        }
        match values {
            None => attr.anim = None,
            Some(_) if times.is_empty() => attr.anim = None,
            Some(values) => {
                if Some(values.attr_type()) != attr.attr_type().array_of() {
                    return Err(invalid(format!(
                        "animation of {:?} cannot hold {:?}",
                        attr.attr_type(),
                        values.attr_type()
                    )));
                }
                attr.anim = Some((times, values));
            }
        }
        Ok(Empty {})
    }

    /// Count an evaluation of `item` when a write asked for one.
    fn evaluated(&mut self, item: ObjectRef, evaluate: bool) -> Empty {
        if evaluate {
            *self.evaluations.entry(item.handle).or_default() += 1;
        }
        Empty {}
    }

    fn clear_attr(&mut self, item: ObjectRef, addr: &Addr) -> Result<Empty, Status> {
        let pos = self.attr_pos(item, addr)?;
        let object = self.object_mut(item)?;
        if object.attrs[pos].dynamic {
            object.attrs.remove(pos);
        } else {
            object.attrs[pos].reset();
        }
        Ok(Empty {})
    }

    fn copy_attr(
        &mut self,
        item: ObjectRef,
        dest_id: AttributeId,
        source: ObjectRef,
        source_addr: &Addr,
    ) -> Result<Empty, Status> {
        let copied = self.attr(source, source_addr)?.clone();
        let dest = self.attr_mut(item, &Addr::Id(dest_id))?;
        if dest.attr_type() != copied.attr_type() {
            return Err(invalid(format!(
                "cannot copy {:?} into {:?}",
                copied.attr_type(),
                dest.attr_type()
            )));
        }
        dest.value = copied.value;
        dest.anim = copied.anim;
        Ok(Empty {})
    }

    // --- graphs and nodes ----------------------------------------------------

    fn create_in(&mut self, owner: ObjectRef, object: FakeObject) -> Result<ObjectRef, Status> {
        self.graph(owner)?;
        Ok(self.alloc(FakeObject {
            owner: Some(owner.handle),
            ..object
        }))
    }

    fn find_by_name(&self, graph: Handle, name: &str, recurse: bool, out: &mut Vec<ObjectRef>) {
        for handle in self.owned_by(graph) {
            let Some(object) = self.objects.get(&handle) else {
                continue;
            };
            if object.name == name {
                out.push(ObjectRef::new(object.kind, handle));
            }
            if recurse && object.is_graph() {
                self.find_by_name(handle, name, recurse, out);
            }
        }
    }

    fn copy_tree(&mut self, source: Handle, owner: Handle) -> Result<ObjectRef, Status> {
        let original = self
            .objects
            .get(&source)
            .cloned()
            .ok_or_else(|| invalid(format!("unknown handle {source}")))?;
        let copy = self.alloc(FakeObject {
            owner: Some(owner),
            ..original
        });
        for child in self.owned_by(source) {
            self.copy_tree(child, copy.handle)?;
        }
        Ok(copy)
    }

    fn pin_mut(&mut self, node: ObjectRef, pin_index: u32) -> Result<&mut (String, Option<Handle>), Status> {
        let object = self.object_mut(node)?;
        let count = object.pins.len();
        object
            .pins
            .get_mut(pin_index as usize)
            .ok_or_else(|| invalid(format!("pin index {pin_index} out of range ({count})")))
    }

    fn set_linkers(&mut self, graph: ObjectRef, linkers: Vec<LinkerInfo>) -> Result<Reply<Vec<ObjectRef>>, Status> {
        self.graph(graph)?;
        let mut created = Vec::with_capacity(linkers.len());
        for linker in linkers {
            let mut node = FakeObject::new(ObjectType::Node, linker.name, None);
            node.out_type = linker.pin_type;
            created.push(self.create_in(graph, node)?);
        }
        Ok(Reply { result: created })
    }
}

/// Transport double serving every outbound method from memory.
#[derive(Debug)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl Default for FakeHost {
    fn default() -> Self {
        let mut state = HostState {
            next_handle: ROOT_HANDLE,
            ..HostState::default()
        };
        state.objects.insert(
            ROOT_HANDLE,
            FakeObject::new(ObjectType::RootNodeGraph, "root", None),
        );
        Self {
            state: Mutex::new(state),
        }
    }
}

impl FakeHost {
    /// Fresh host holding only the root graph.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Channel over this host with its own callback registry.
    pub fn channel(self: &Arc<Self>) -> Channel {
        Channel::from_arc(self.clone()).with_registry(Arc::new(CallbackRegistry::new()))
    }

    /// The root graph.
    pub fn root(&self) -> ObjectRef {
        ObjectRef::new(ObjectType::RootNodeGraph, ROOT_HANDLE)
    }

    /// Add an object of `kind` named `name` to `owner`. Nodes get the
    /// default pins.
    pub fn add_item(&self, kind: ObjectType, name: &str, owner: ObjectRef) -> ObjectRef {
        let mut object = FakeObject::new(kind, name, (!owner.is_null()).then_some(owner.handle));
        if kind == ObjectType::Node {
            object.pins = DEFAULT_PINS.iter().map(|p| ((*p).to_string(), None)).collect();
        }
        self.lock().alloc(object)
    }

    /// Give `item` a host-defined attribute; clearing it restores `default`.
    pub fn define_attribute(&self, item: ObjectRef, id: AttributeId, name: &str, default: AttrValue) {
        let mut state = self.lock();
        if let Some(object) = state.objects.get_mut(&item.handle) {
            object.attrs.push(FakeAttr {
                id,
                name: name.to_string(),
                value: default.clone(),
                default,
                anim: None,
                dynamic: false,
            });
        }
    }

    /// Current value of attribute `id` on `item`.
    pub fn attribute(&self, item: ObjectRef, id: AttributeId) -> Option<AttrValue> {
        self.lock()
            .objects
            .get(&item.handle)?
            .attrs
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.value.clone())
    }

    /// Names of the attributes on `item`, in index order.
    pub fn attribute_names(&self, item: ObjectRef) -> Vec<String> {
        self.lock()
            .objects
            .get(&item.handle)
            .map(|o| o.attrs.iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }

    /// True while `handle` names a live object.
    pub fn is_live(&self, handle: Handle) -> bool {
        self.lock().objects.contains_key(&handle)
    }

    /// Name of a live object.
    pub fn name_of(&self, handle: Handle) -> Option<String> {
        self.lock().objects.get(&handle).map(|o| o.name.clone())
    }

    /// Tooltip of a live GUI component.
    pub fn tooltip_of(&self, handle: Handle) -> Option<String> {
        self.lock().objects.get(&handle).map(|o| o.tooltip.clone())
    }

    /// Methods received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// How often `method` was received.
    pub fn call_count(&self, method: &str) -> usize {
        self.lock().calls.iter().filter(|m| *m == method).count()
    }

    /// Answer every later call of `method` with `status`.
    pub fn fail_method(&self, method: &str, status: Status) {
        self.lock().failures.insert(method.to_string(), status);
    }

    /// Stop failing `method`.
    pub fn clear_failure(&self, method: &str) {
        self.lock().failures.remove(method);
    }

    /// Every callback registration received.
    pub fn callbacks(&self) -> Vec<CapturedCallback> {
        self.lock().callbacks.clone()
    }

    /// Latest registration received through `method` in `slot`.
    pub fn captured(&self, method: &str, slot: &str) -> Option<CallbackRef> {
        self.lock()
            .callbacks
            .iter()
            .rev()
            .find(|c| c.method == method && c.slot == slot)
            .map(|c| c.callback)
    }

    /// Lines written through the log service.
    pub fn log_lines(&self) -> Vec<(LogLevel, String)> {
        self.lock().log.clone()
    }

    /// Callback address passed to `start`, while the session runs.
    pub fn started_source(&self) -> Option<String> {
        self.lock().started.clone()
    }

    /// Names of registered module graph types.
    pub fn modules(&self) -> Vec<String> {
        self.lock().modules.clone()
    }

    /// How often `item` was evaluated.
    pub fn evaluations(&self, item: ObjectRef) -> usize {
        self.lock().evaluations.get(&item.handle).copied().unwrap_or(0)
    }

    /// Whether a module graph re-evaluates on time changes.
    pub fn evaluates_time_changes(&self, graph: ObjectRef) -> bool {
        self.lock()
            .objects
            .get(&graph.handle)
            .is_some_and(|o| o.evaluate_time_changes)
    }
}

fn serve<R, F>(state: &mut HostState, payload: &Value, handler: F) -> Result<Value, Status>
where
    R: Rpc,
    F: FnOnce(&mut HostState, R) -> Result<R::Response, Status>,
{
    let request: R = wire::from_value(payload).map_err(|e| invalid(e.to_string()))?;
    let response = handler(state, request)?;
    wire::to_value(&response).map_err(|e| Status::internal(e.to_string()))
}

macro_rules! routes {
    ($state:expr, $method:expr, $payload:expr; $($req:ty => $handler:expr,)+) => {
        match $method {
            $( m if m == <$req as Rpc>::METHOD => serve::<$req, _>($state, $payload, $handler), )+
            other => Err(Status::new(
                StatusCode::Unimplemented,
                format!("fake host does not serve {other}"),
            )),
        }
    };
}

impl Transport for FakeHost {
    #[allow(clippy::too_many_lines)]
    fn unary(&self, method: &str, payload: Value) -> Result<Value, Status> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.calls.push(method.to_string());
        if let Some(status) = state.failures.get(method) {
            return Err(status.clone());
        }

        routes! { state, method, &payload;
            DestroyRequest => |s, r| {
                s.object(r.item_ref)?;
                s.remove_tree(r.item_ref.handle);
                Ok(Empty {})
            },

            NameRequest => |s, r| Ok(Reply { result: s.object(r.item_ref)?.name.clone() }),
            SetNameRequest => |s, r| {
                s.object_mut(r.item_ref)?.name = r.name;
                Ok(Empty {})
            },
            OutTypeRequest => |s, r| Ok(Reply { result: s.object(r.item_ref)?.out_type }),
            IsGraphRequest => |s, r| Ok(Reply { result: s.object(r.item_ref)?.is_graph() }),
            IsNodeRequest => |s, r| Ok(Reply { result: s.object(r.item_ref)?.kind == ObjectType::Node }),
            ToGraphRequest => |s, r| {
                let object = s.object(r.item_ref)?;
                Ok(Reply {
                    result: if object.is_graph() {
                        ObjectRef::new(object.kind, r.item_ref.handle)
                    } else {
                        ObjectRef::null(ObjectType::NodeGraph)
                    },
                })
            },
            ToNodeRequest => |s, r| {
                let object = s.object(r.item_ref)?;
                Ok(Reply {
                    result: if object.kind == ObjectType::Node {
                        ObjectRef::new(ObjectType::Node, r.item_ref.handle)
                    } else {
                        ObjectRef::null(ObjectType::Node)
                    },
                })
            },
            GraphOwnerRequest => |s, r| {
                let owner = s.object(r.item_ref)?.owner;
                Ok(Reply {
                    result: owner.map_or_else(|| ObjectRef::null(ObjectType::NodeGraph), |h| s.object_ref(h)),
                })
            },
            PinOwnerRequest => |s, r| {
                s.object(r.item_ref)?;
                let handle = r.item_ref.handle;
                let owner = s
                    .objects
                    .iter()
                    .find(|(_, o)| o.pins.iter().any(|p| p.1 == Some(handle)))
                    .map(|(h, _)| *h);
                Ok(Reply {
                    result: owner.map_or_else(|| ObjectRef::null(ObjectType::Node), |h| s.object_ref(h)),
                })
            },
            EvaluateRequest => |s, r| {
                s.object(r.item_ref)?;
                *s.evaluations.entry(r.item_ref.handle).or_default() += 1;
                Ok(Empty {})
            },
            UniqueIdRequest => |s, r| {
                s.object(r.item_ref)?;
                Ok(Reply { result: u32::try_from(r.item_ref.handle).unwrap_or(u32::MAX) })
            },
            AttrCountRequest => |s, r| Ok(Reply {
                result: u32::try_from(s.object(r.item_ref)?.attrs.len()).unwrap_or(u32::MAX),
            }),
            AttrIdIxRequest => |s, r| Ok(Reply { result: s.attr(r.item_ref, &Addr::Index(r.index))?.id }),
            AttrNameRequest => |s, r| Ok(Reply {
                result: s.attr(r.item_ref, &Addr::Id(r.attribute_id))?.name.clone(),
            }),

            GetByAttrIdRequest => |s, r| s.get_attr(r.item_ref, &Addr::Id(r.attribute_id), r.expected_type),
            GetByNameRequest => |s, r| s.get_attr(r.item_ref, &Addr::Name(r.name), r.expected_type),
            GetByIxRequest => |s, r| s.get_attr(r.item_ref, &Addr::Index(r.index), r.expected_type),
            SetByAttrIdRequest => |s, r| {
                s.set_attr(r.item_ref, Addr::Id(r.attribute_id), r.value)?;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            SetByNameRequest => |s, r| {
                s.set_attr(r.item_ref, Addr::Name(r.name), r.value)?;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            SetByIxRequest => |s, r| {
                s.set_attr(r.item_ref, Addr::Index(r.index), r.value)?;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            GetAnimByAttrIdRequest => |s, r| s.get_anim(r.item_ref, &Addr::Id(r.attribute_id), r.expected_type),
            GetAnimByNameRequest => |s, r| s.get_anim(r.item_ref, &Addr::Name(r.name), r.expected_type),
            GetAnimByIxRequest => |s, r| s.get_anim(r.item_ref, &Addr::Index(r.index), r.expected_type),
            SetAnimByAttrIdRequest => |s, r| {
                s.set_anim(r.item_ref, &Addr::Id(r.attribute_id), r.times, r.values)?;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            SetAnimByNameRequest => |s, r| {
                s.set_anim(r.item_ref, &Addr::Name(r.name), r.times, r.values)?;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            SetAnimByIxRequest => |s, r| {
                s.set_anim(r.item_ref, &Addr::Index(r.index), r.times, r.values)?;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            IsAnimatedByAttrIdRequest => |s, r| Ok(Reply { result: s.attr(r.item_ref, &Addr::Id(r.attribute_id))?.anim.is_some() }),
            IsAnimatedByNameRequest => |s, r| Ok(Reply { result: s.attr(r.item_ref, &Addr::Name(r.name))?.anim.is_some() }),
            IsAnimatedByIxRequest => |s, r| Ok(Reply { result: s.attr(r.item_ref, &Addr::Index(r.index))?.anim.is_some() }),
            ClearAnimByAttrIdRequest => |s, r| {
                s.attr_mut(r.item_ref, &Addr::Id(r.attribute_id))?.anim = None;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            ClearAnimByNameRequest => |s, r| {
                s.attr_mut(r.item_ref, &Addr::Name(r.name))?.anim = None;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            ClearAnimByIxRequest => |s, r| {
                s.attr_mut(r.item_ref, &Addr::Index(r.index))?.anim = None;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            ClearAttrByAttrIdRequest => |s, r| {
                s.clear_attr(r.item_ref, &Addr::Id(r.attribute_id))?;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            ClearAttrByNameRequest => |s, r| {
                s.clear_attr(r.item_ref, &Addr::Name(r.name))?;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            ClearAttrByIxRequest => |s, r| {
                s.clear_attr(r.item_ref, &Addr::Index(r.index))?;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            HasAttrByAttrIdRequest => |s, r| Ok(Reply { result: s.attr(r.item_ref, &Addr::Id(r.attribute_id)).is_ok() }),
            HasAttrByNameRequest => |s, r| Ok(Reply { result: s.attr(r.item_ref, &Addr::Name(r.name)).is_ok() }),
            HasAttrByIxRequest => |s, r| {
                s.object(r.item_ref)?;
                Ok(Reply { result: s.attr(r.item_ref, &Addr::Index(r.index)).is_ok() })
            },
            AttrTypeByAttrIdRequest => |s, r| Ok(Reply { result: s.attr(r.item_ref, &Addr::Id(r.attribute_id))?.attr_type() }),
            AttrTypeByNameRequest => |s, r| Ok(Reply { result: s.attr(r.item_ref, &Addr::Name(r.name))?.attr_type() }),
            AttrTypeByIxRequest => |s, r| Ok(Reply { result: s.attr(r.item_ref, &Addr::Index(r.index))?.attr_type() }),
            ClearAllAttrRequest => |s, r| {
                let object = s.object_mut(r.item_ref)?;
                object.attrs.retain(|a| !a.dynamic);
                object.attrs.iter_mut().for_each(FakeAttr::reset);
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            CopyAttrFromRequest => |s, r| {
                s.copy_attr(r.item_ref, r.dest_id, r.source, &Addr::Id(r.source_id))?;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            CopyAttrFromNameRequest => |s, r| {
                s.copy_attr(r.item_ref, r.dest_id, r.source, &Addr::Name(r.source_name))?;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },
            CopyAttrFromIxRequest => |s, r| {
                s.copy_attr(r.item_ref, r.dest_id, r.source, &Addr::Index(r.source_index))?;
                Ok(s.evaluated(r.item_ref, r.evaluate))
            },

            NodeCreateRequest => |s, r| {
                let mut node = FakeObject::new(ObjectType::Node, format!("node{}", r.node_type), None);
                node.node_type = r.node_type;
                if r.configure_pins {
                    node.pins = DEFAULT_PINS.iter().map(|p| ((*p).to_string(), None)).collect();
                }
                Ok(Reply { result: s.create_in(r.owner_graph, node)? })
            },
            NodeTypeRequest => |s, r| Ok(Reply { result: s.object(r.item_ref)?.node_type }),
            PinCountRequest => |s, r| Ok(Reply {
                result: u32::try_from(s.object(r.item_ref)?.pins.len()).unwrap_or(u32::MAX),
            }),
            PinNameIxRequest => |s, r| Ok(Reply { result: s.pin_mut(r.item_ref, r.pin_index)?.0.clone() }),
            ConnectToIxRequest => |s, r| {
                let source = if r.source.is_null() {
                    None
                } else {
                    s.object(r.source)?;
                    Some(r.source.handle)
                };
                s.pin_mut(r.item_ref, r.pin_index)?.1 = source;
                Ok(Empty {})
            },
            ConnectedNodeIxRequest => |s, r| {
                let connected = s.pin_mut(r.item_ref, r.pin_index)?.1;
                Ok(Reply {
                    result: connected.map_or_else(|| ObjectRef::null(ObjectType::Node), |h| s.object_ref(h)),
                })
            },
            ExpandOutOfPinRequest => |s, r| {
                let owner = s.object(r.item_ref)?.owner;
                let connected = s.pin_mut(r.item_ref, r.pin_index)?.1;
                let Some(handle) = connected else {
                    return Ok(Reply { result: ObjectRef::null(ObjectType::Node) });
                };
                if let Some(object) = s.objects.get_mut(&handle) {
                    object.owner = owner;
                }
                Ok(Reply { result: s.object_ref(handle) })
            },
            DestinationsRequest => |s, r| {
                s.object(r.item_ref)?;
                let handle = r.item_ref.handle;
                let result = s
                    .objects
                    .iter()
                    .filter(|(_, o)| o.pins.iter().any(|p| p.1 == Some(handle)))
                    .map(|(h, o)| ObjectRef::new(o.kind, *h))
                    .collect();
                Ok(Reply { result })
            },

            GraphCreateRequest => |s, r| {
                let mut graph = FakeObject::new(ObjectType::NodeGraph, format!("graph{}", r.graph_type), None);
                graph.node_type = r.graph_type;
                Ok(Reply { result: s.create_in(r.owner_graph, graph)? })
            },
            RootNodeGraphRequest => |s, _r| Ok(Reply { result: s.object_ref(ROOT_HANDLE) }),
            OwnedItemsRequest => |s, r| {
                s.graph(r.item_ref)?;
                let result = s.owned_by(r.item_ref.handle).into_iter().map(|h| s.object_ref(h)).collect();
                Ok(Reply { result })
            },
            FindItemsByNameRequest => |s, r| {
                s.graph(r.item_ref)?;
                let mut result = Vec::new();
                s.find_by_name(r.item_ref.handle, &r.name, r.recurse, &mut result);
                Ok(Reply { result })
            },
            ClearGraphRequest => |s, r| {
                s.graph(r.item_ref)?;
                for child in s.owned_by(r.item_ref.handle) {
                    s.remove_tree(child);
                }
                Ok(Empty {})
            },
            UnfoldGraphRequest => |s, r| {
                s.graph(r.item_ref)?;
                let graph = r.item_ref.handle;
                for child in s.owned_by(graph) {
                    if s.objects.get(&child).is_some_and(FakeObject::is_graph) {
                        for grandchild in s.owned_by(child) {
                            if let Some(object) = s.objects.get_mut(&grandchild) {
                                object.owner = Some(graph);
                            }
                        }
                        s.objects.remove(&child);
                    }
                }
                Ok(Empty {})
            },
            CopyItemTreeRequest => |s, r| {
                s.graph(r.item_ref)?;
                s.object(r.root)?;
                Ok(Reply { result: s.copy_tree(r.root.handle, r.item_ref.handle)? })
            },

            SetInputLinkersRequest => |s, r| s.set_linkers(r.item_ref, r.linkers),
            SetOutputLinkersRequest => |s, r| s.set_linkers(r.item_ref, r.linkers),
            SetEvaluateTimeChangesRequest => |s, r| {
                s.object_mut(r.item_ref)?.evaluate_time_changes = r.enable;
                Ok(Empty {})
            },
            RegisterModuleGraphRequest => |s, r| {
                let method = <RegisterModuleGraphRequest as Rpc>::METHOD;
                for (slot, callback) in [
                    ("create", r.create),
                    ("destroy", r.destroy),
                    ("init", r.init),
                    ("evaluate", r.evaluate),
                    ("trigger", r.trigger),
                ] {
                    s.capture(method, slot, None, callback);
                }
                s.modules.push(r.name);
                Ok(Empty {})
            },

            GuiSetEnabledRequest => |s, r| {
                s.object_mut(r.item_ref)?.enabled = r.enabled;
                Ok(Empty {})
            },
            GuiIsEnabledRequest => |s, r| Ok(Reply { result: s.object(r.item_ref)?.enabled }),
            GuiSetTooltipRequest => |s, r| {
                s.object_mut(r.item_ref)?.tooltip = r.tooltip;
                Ok(Empty {})
            },
            GuiSizeRequest => |s, r| {
                s.object(r.item_ref)?;
                Ok(Reply { result: Int2 { x: 120, y: 24 } })
            },
            GuiSetMouseListenerRequest => |s, r| {
                s.object(r.item_ref)?;
                s.capture(<GuiSetMouseListenerRequest as Rpc>::METHOD, "callback", Some(r.item_ref), r.callback);
                Ok(Empty {})
            },
            ButtonCreateRequest => |s, r| {
                let button = s.alloc(FakeObject::new(ObjectType::Button, r.text, None));
                s.capture(<ButtonCreateRequest as Rpc>::METHOD, "callback", Some(button), r.callback);
                Ok(Reply { result: button })
            },
            ComboBoxCreateRequest => |s, r| {
                let mut combo = FakeObject::new(ObjectType::ComboBox, "combo", None);
                combo.selected = if r.items.is_empty() { -1 } else { 0 };
                combo.combo_items = r.items;
                let combo = s.alloc(combo);
                s.capture(<ComboBoxCreateRequest as Rpc>::METHOD, "callback", Some(combo), r.callback);
                Ok(Reply { result: combo })
            },
            ComboBoxSelectedRequest => |s, r| Ok(Reply { result: s.object(r.item_ref)?.selected }),
            ComboBoxSetSelectedRequest => |s, r| {
                let combo = s.object_mut(r.item_ref)?;
                let len = combo.combo_items.len();
                if r.index < -1 || usize::try_from(r.index).is_ok_and(|ix| ix >= len) {
                    return Err(invalid(format!("selection {} out of range ({len})", r.index)));
                }
                combo.selected = r.index;
                Ok(Empty {})
            },
            WindowCreateRequest => |s, r| {
                s.object(r.content)?;
                let window = s.alloc(FakeObject::new(ObjectType::Window, r.title, None));
                s.capture(<WindowCreateRequest as Rpc>::METHOD, "callback", Some(window), r.callback);
                Ok(Reply { result: window })
            },
            TableCreateRequest => |s, r| {
                let table = s.alloc(FakeObject::new(ObjectType::Table, r.columns.join(","), None));
                let method = <TableCreateRequest as Rpc>::METHOD;
                s.capture(method, "num_rows", Some(table), r.num_rows);
                s.capture(method, "content", Some(table), r.content);
                Ok(Reply { result: table })
            },

            StartRequest => |s, r| {
                if r.callback_source.is_empty() {
                    return Err(invalid("callback source must not be empty"));
                }
                s.started = Some(r.callback_source);
                Ok(Empty {})
            },
            StopRequest => |s, _r| {
                s.started = None;
                Ok(Empty {})
            },
            LogRequest => |s, r| {
                s.log.push((r.level, r.message));
                Ok(Empty {})
            },
            RegisterLogCallbackRequest => |s, r| {
                s.capture(<RegisterLogCallbackRequest as Rpc>::METHOD, "callback", None, r.callback);
                Ok(Empty {})
            },
            UnregisterLogCallbackRequest => |s, r| {
                let method = <RegisterLogCallbackRequest as Rpc>::METHOD;
                let before = s.callbacks.len();
                s.callbacks
                    .retain(|c| !(c.method == method && c.callback.callback_id == r.callback_id));
                if s.callbacks.len() == before {
                    return Err(invalid(format!("log callback {} not registered", r.callback_id)));
                }
                Ok(Empty {})
            },
            RegisterAssetMissingRequest => |s, r| {
                s.capture(<RegisterAssetMissingRequest as Rpc>::METHOD, "callback", None, r.callback);
                Ok(Empty {})
            },
            RegisterDaemonUpdateRequest => |s, r| {
                s.capture(<RegisterDaemonUpdateRequest as Rpc>::METHOD, "callback", None, r.callback);
                Ok(Empty {})
            },
            RegisterStatusUpdateRequest => |s, r| {
                s.capture(<RegisterStatusUpdateRequest as Rpc>::METHOD, "callback", None, r.callback);
                Ok(Empty {})
            },
            StartUploadRequest => |s, r| {
                s.capture(<StartUploadRequest as Rpc>::METHOD, "callback", None, r.callback);
                Ok(Empty {})
            },
            ObserveItemRequest => |s, r| {
                s.object(r.item_ref)?;
                s.capture(<ObserveItemRequest as Rpc>::METHOD, "callback", Some(r.item_ref), r.callback);
                Ok(Empty {})
            },
        }
    }
}
