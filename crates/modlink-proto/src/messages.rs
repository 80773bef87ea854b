// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Request and response messages for the host services a module calls.
//!
//! Each request is bound to its method name and response type through
//! [`Rpc`](crate::Rpc). Requests that target an existing object carry it in an
//! `item_ref` field.

use serde::{Deserialize, Serialize};

use crate::attr::{AttrType, AttrValueMsg, AttributeId, Int2, TimeSampling};
use crate::{rpc, wire_enum, Empty, ObjectRef, Reply};

/// Callback registration carried inside requests that hand the host a
/// module-side function: the callback id plus the opaque user-data token the
/// host echoes back on every invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallbackRef {
    /// Process-unique callback id.
    pub callback_id: i32,
    /// Opaque user-data token.
    pub user_data: u64,
}

// --- Object lifetime ---------------------------------------------------------

/// Destroy the referenced remote object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestroyRequest {
    /// Object to destroy.
    pub item_ref: ObjectRef,
}

// --- Item ----------------------------------------------------------------------

/// Declares a request carrying only the target object.
macro_rules! target_requests {
    ($($(#[$meta:meta])* $name:ident;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            pub struct $name {
                /// Target object.
                pub item_ref: ObjectRef,
            }
        )+
    };
}

target_requests! {
    /// Read an item's name.
    NameRequest;
    /// Read an item's output pin type.
    OutTypeRequest;
    /// Ask whether an item is a node graph.
    IsGraphRequest;
    /// Ask whether an item is a node.
    IsNodeRequest;
    /// Downcast an item to a node graph.
    ToGraphRequest;
    /// Downcast an item to a node.
    ToNodeRequest;
    /// Read the graph owning an item.
    GraphOwnerRequest;
    /// Read the node owning an item through a pin.
    PinOwnerRequest;
    /// Force host-side evaluation of an item.
    EvaluateRequest;
    /// Read an item's session-unique id.
    UniqueIdRequest;
    /// Count an item's attributes.
    AttrCountRequest;
    /// Read a node's type id.
    NodeTypeRequest;
    /// Count a node's input pins.
    PinCountRequest;
    /// List the nodes connected to a node's output.
    DestinationsRequest;
    /// List the items owned by a graph.
    OwnedItemsRequest;
    /// Delete every item owned by a graph.
    ClearGraphRequest;
    /// Unfold a graph's nested graphs into it.
    UnfoldGraphRequest;
    /// Read a combo box's selected index.
    ComboBoxSelectedRequest;
    /// Read a GUI component's enabled flag.
    GuiIsEnabledRequest;
    /// Read a GUI component's size.
    GuiSizeRequest;
}

/// Rename an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetNameRequest {
    /// Target item.
    pub item_ref: ObjectRef,
    /// New name.
    pub name: String,
}

/// Id of the attribute at a positional index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrIdIxRequest {
    /// Target item.
    pub item_ref: ObjectRef,
    /// Attribute index.
    pub index: u32,
}

/// Name of an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrNameRequest {
    /// Target item.
    pub item_ref: ObjectRef,
    /// Attribute id.
    pub attribute_id: AttributeId,
}

/// Declares the by-id / by-name / by-index trio of an attribute request.
macro_rules! addressed_requests {
    (
        $(#[$meta:meta])*
        [$by_id:ident, $by_name:ident, $by_ix:ident] {
            $( $(#[$fmeta:meta])* $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        ///
        /// Addressed by attribute id.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $by_id {
            /// Target item.
            pub item_ref: ObjectRef,
            /// Attribute id.
            pub attribute_id: AttributeId,
            $( $(#[$fmeta])* pub $field: $fty, )*
        }

        $(#[$meta])*
        ///
        /// Addressed by attribute name.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $by_name {
            /// Target item.
            pub item_ref: ObjectRef,
            /// Attribute name.
            pub name: String,
            $( $(#[$fmeta])* pub $field: $fty, )*
        }

        $(#[$meta])*
        ///
        /// Addressed by attribute index.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $by_ix {
            /// Target item.
            pub item_ref: ObjectRef,
            /// Attribute index.
            pub index: u32,
            $( $(#[$fmeta])* pub $field: $fty, )*
        }
    };
}

addressed_requests! {
    /// Read an attribute value.
    [GetByAttrIdRequest, GetByNameRequest, GetByIxRequest] {
        /// Arm of the response the host must populate.
        expected_type: AttrType,
    }
}

addressed_requests! {
    /// Write an attribute value.
    [SetByAttrIdRequest, SetByNameRequest, SetByIxRequest] {
        /// New value (one populated arm).
        value: AttrValueMsg,
        /// Re-evaluate dependents immediately.
        evaluate: bool,
    }
}

addressed_requests! {
    /// Read an attribute's animation.
    [GetAnimByAttrIdRequest, GetAnimByNameRequest, GetAnimByIxRequest] {
        /// Scalar element type of the animated values.
        expected_type: AttrType,
    }
}

addressed_requests! {
    /// Replace an attribute's animation.
    [SetAnimByAttrIdRequest, SetAnimByNameRequest, SetAnimByIxRequest] {
        /// Sample times.
        times: TimeSampling,
        /// Values for all samples, in the array arm of the element type.
        values: AttrValueMsg,
        /// Re-evaluate dependents immediately.
        evaluate: bool,
    }
}

addressed_requests! {
    /// Ask whether an attribute is animated.
    [IsAnimatedByAttrIdRequest, IsAnimatedByNameRequest, IsAnimatedByIxRequest] {}
}

addressed_requests! {
    /// Drop an attribute's animation.
    [ClearAnimByAttrIdRequest, ClearAnimByNameRequest, ClearAnimByIxRequest] {
        /// Re-evaluate dependents immediately.
        evaluate: bool,
    }
}

addressed_requests! {
    /// Reset an attribute to its default.
    [ClearAttrByAttrIdRequest, ClearAttrByNameRequest, ClearAttrByIxRequest] {
        /// Re-evaluate dependents immediately.
        evaluate: bool,
    }
}

addressed_requests! {
    /// Ask whether an item has an attribute.
    [HasAttrByAttrIdRequest, HasAttrByNameRequest, HasAttrByIxRequest] {}
}

addressed_requests! {
    /// Read an attribute's declared type.
    [AttrTypeByAttrIdRequest, AttrTypeByNameRequest, AttrTypeByIxRequest] {}
}

/// Reset every attribute of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearAllAttrRequest {
    /// Target item.
    pub item_ref: ObjectRef,
    /// Re-evaluate dependents immediately.
    pub evaluate: bool,
}

/// Copy one attribute of `source` (by id) into `dest_id` on the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyAttrFromRequest {
    /// Receiving item.
    pub item_ref: ObjectRef,
    /// Receiving attribute.
    pub dest_id: AttributeId,
    /// Item to copy from.
    pub source: ObjectRef,
    /// Source attribute id.
    pub source_id: AttributeId,
    /// Re-evaluate dependents immediately.
    pub evaluate: bool,
}

/// Copy one attribute of `source` (by name) into `dest_id` on the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyAttrFromNameRequest {
    /// Receiving item.
    pub item_ref: ObjectRef,
    /// Receiving attribute.
    pub dest_id: AttributeId,
    /// Item to copy from.
    pub source: ObjectRef,
    /// Source attribute name.
    pub source_name: String,
    /// Re-evaluate dependents immediately.
    pub evaluate: bool,
}

/// Copy one attribute of `source` (by index) into `dest_id` on the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyAttrFromIxRequest {
    /// Receiving item.
    pub item_ref: ObjectRef,
    /// Receiving attribute.
    pub dest_id: AttributeId,
    /// Item to copy from.
    pub source: ObjectRef,
    /// Source attribute index.
    pub source_index: u32,
    /// Re-evaluate dependents immediately.
    pub evaluate: bool,
}

/// Attribute value returned by every get variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetAttrResponse {
    /// Value in the arm named by the request's `expected_type`.
    pub value: AttrValueMsg,
}

/// Animation returned by every get-anim variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetAnimResponse {
    /// Sample times.
    pub times: TimeSampling,
    /// Values for all samples, in the array arm of the element type.
    pub values: AttrValueMsg,
    /// Explicit sample count; only read when the caller asks for it.
    #[serde(default)]
    pub sample_count: Option<u32>,
}

// --- Node ----------------------------------------------------------------------

/// Create a node inside a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCreateRequest {
    /// Host node type id.
    pub node_type: u32,
    /// Owning graph.
    pub owner_graph: ObjectRef,
    /// Let the host create default input nodes.
    pub configure_pins: bool,
}

/// Name of a node's input pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinNameIxRequest {
    /// Target node.
    pub item_ref: ObjectRef,
    /// Pin index.
    pub pin_index: u32,
}

/// Connect `source` into a node's input pin (null source disconnects).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectToIxRequest {
    /// Target node.
    pub item_ref: ObjectRef,
    /// Pin index.
    pub pin_index: u32,
    /// Node feeding the pin.
    pub source: ObjectRef,
    /// Re-evaluate dependents immediately.
    pub evaluate: bool,
}

/// Node connected to an input pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedNodeIxRequest {
    /// Target node.
    pub item_ref: ObjectRef,
    /// Pin index.
    pub pin_index: u32,
    /// Step through wrapper nodes.
    pub enter_wrapper_node: bool,
}

/// Move the node connected to an input pin out into its own graph item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandOutOfPinRequest {
    /// Target node.
    pub item_ref: ObjectRef,
    /// Pin index.
    pub pin_index: u32,
}

// --- Node graph ----------------------------------------------------------------

/// Create a graph inside another graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphCreateRequest {
    /// Host graph type id.
    pub graph_type: u32,
    /// Owning graph.
    pub owner_graph: ObjectRef,
}

/// Fetch the project's root node graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootNodeGraphRequest {}

/// Find owned items by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindItemsByNameRequest {
    /// Graph to search.
    pub item_ref: ObjectRef,
    /// Exact item name.
    pub name: String,
    /// Descend into nested graphs.
    pub recurse: bool,
}

/// Deep-copy an item tree into a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyItemTreeRequest {
    /// Receiving graph.
    pub item_ref: ObjectRef,
    /// Root of the tree to copy.
    pub root: ObjectRef,
}

// --- Module node graph ---------------------------------------------------------

/// Description of one linker (graph input or output).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkerInfo {
    /// Pin name.
    pub name: String,
    /// Pin type id.
    pub pin_type: u32,
    /// Label shown in the host UI.
    pub label: String,
}

/// Replace a module graph's input linkers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetInputLinkersRequest {
    /// Target module graph.
    pub item_ref: ObjectRef,
    /// Linkers, in pin order.
    pub linkers: Vec<LinkerInfo>,
}

/// Replace a module graph's output linkers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOutputLinkersRequest {
    /// Target module graph.
    pub item_ref: ObjectRef,
    /// Linkers, in pin order.
    pub linkers: Vec<LinkerInfo>,
}

/// Toggle whether time changes re-evaluate a module graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEvaluateTimeChangesRequest {
    /// Target module graph.
    pub item_ref: ObjectRef,
    /// Evaluate on time change.
    pub enable: bool,
}

/// Register a module node graph type and its lifecycle callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterModuleGraphRequest {
    /// Module id, unique per host.
    pub module_id: u32,
    /// Display name.
    pub name: String,
    /// Description shown in the host UI.
    pub description: String,
    /// Called when the host creates an instance; returns instance user data.
    pub create: CallbackRef,
    /// Called when the host destroys an instance.
    pub destroy: CallbackRef,
    /// Called to set up linkers; returns updated user data.
    pub init: CallbackRef,
    /// Called on evaluation.
    pub evaluate: CallbackRef,
    /// Called on a trigger event.
    pub trigger: CallbackRef,
}

// --- GUI -------------------------------------------------------------------------

/// Enable or disable a GUI component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuiSetEnabledRequest {
    /// Target component.
    pub item_ref: ObjectRef,
    /// Enabled flag.
    pub enabled: bool,
}

/// Set a GUI component's tooltip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuiSetTooltipRequest {
    /// Target component.
    pub item_ref: ObjectRef,
    /// Tooltip text.
    pub tooltip: String,
}

/// Route mouse events of a component to a module callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuiSetMouseListenerRequest {
    /// Target component.
    pub item_ref: ObjectRef,
    /// Mouse callback.
    pub callback: CallbackRef,
}

/// Create a push button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonCreateRequest {
    /// Caption.
    pub text: String,
    /// Click callback.
    pub callback: CallbackRef,
}

/// Create a combo box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboBoxCreateRequest {
    /// Entries, in display order.
    pub items: Vec<String>,
    /// Selection-changed callback.
    pub callback: CallbackRef,
}

/// Change a combo box's selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboBoxSetSelectedRequest {
    /// Target combo box.
    pub item_ref: ObjectRef,
    /// New selected index.
    pub index: i32,
    /// Fire the selection-changed callback.
    pub send_event: bool,
}

/// Create a top-level window around a content component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowCreateRequest {
    /// Window title.
    pub title: String,
    /// Content component.
    pub content: ObjectRef,
    /// Close callback.
    pub callback: CallbackRef,
}

/// Create a table driven by module callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCreateRequest {
    /// Column headers.
    pub columns: Vec<String>,
    /// Row-count callback.
    pub num_rows: CallbackRef,
    /// Cell-content callback.
    pub content: CallbackRef,
}

// --- Control -----------------------------------------------------------------------

/// Announce the module's callback endpoint and start the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRequest {
    /// Address the host dials for callbacks. Must not be empty.
    pub callback_source: String,
}

/// End the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopRequest {}

wire_enum! {
    /// Severity of a log line.
    pub enum LogLevel {
        /// Debug detail.
        Debug = 0,
        /// Informational.
        Info = 1,
        /// Warning.
        Warning = 2,
        /// Error.
        Error = 3,
    }
}

/// Write a line to the host log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRequest {
    /// Severity.
    pub level: LogLevel,
    /// Text.
    pub message: String,
}

/// Declares a request that only hands the host a callback.
macro_rules! callback_registrations {
    ($($(#[$meta:meta])* $name:ident;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            pub struct $name {
                /// Callback to invoke.
                pub callback: CallbackRef,
            }
        )+
    };
}

callback_registrations! {
    /// Forward host log lines to a module callback.
    RegisterLogCallbackRequest;
    /// Resolve missing assets through a module callback.
    RegisterAssetMissingRequest;
    /// Report render daemon changes to a module callback.
    RegisterDaemonUpdateRequest;
    /// Report render status changes to a module callback.
    RegisterStatusUpdateRequest;
    /// Stream data to the host; the host pulls chunks through the callback.
    StartUploadRequest;
}

/// Stop forwarding host log lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnregisterLogCallbackRequest {
    /// Id of the previously registered log callback.
    pub callback_id: i32,
}

/// Observe changes of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserveItemRequest {
    /// Observed item.
    pub item_ref: ObjectRef,
    /// Change callback.
    pub callback: CallbackRef,
}

rpc! {
    DestroyRequest => Empty, "ApiObject/destroy";

    NameRequest => Reply<String>, "ApiItem/name";
    SetNameRequest => Empty, "ApiItem/setName";
    OutTypeRequest => Reply<u32>, "ApiItem/outType";
    IsGraphRequest => Reply<bool>, "ApiItem/isGraph";
    IsNodeRequest => Reply<bool>, "ApiItem/isNode";
    ToGraphRequest => Reply<ObjectRef>, "ApiItem/toGraph";
    ToNodeRequest => Reply<ObjectRef>, "ApiItem/toNode";
    GraphOwnerRequest => Reply<ObjectRef>, "ApiItem/graphOwner";
    PinOwnerRequest => Reply<ObjectRef>, "ApiItem/pinOwner";
    EvaluateRequest => Empty, "ApiItem/evaluate";
    UniqueIdRequest => Reply<u32>, "ApiItem/uniqueId";
    AttrCountRequest => Reply<u32>, "ApiItem/attrCount";
    AttrIdIxRequest => Reply<AttributeId>, "ApiItem/attrIdIx";
    AttrNameRequest => Reply<String>, "ApiItem/attrName";

    GetByAttrIdRequest => GetAttrResponse, "ApiItem/getByAttrID";
    GetByNameRequest => GetAttrResponse, "ApiItem/getByName";
    GetByIxRequest => GetAttrResponse, "ApiItem/getByIx";
    SetByAttrIdRequest => Empty, "ApiItem/setByAttrID";
    SetByNameRequest => Empty, "ApiItem/setByName";
    SetByIxRequest => Empty, "ApiItem/setByIx";
    GetAnimByAttrIdRequest => GetAnimResponse, "ApiItem/getAnimByAttrID";
    GetAnimByNameRequest => GetAnimResponse, "ApiItem/getAnimByName";
    GetAnimByIxRequest => GetAnimResponse, "ApiItem/getAnimByIx";
    SetAnimByAttrIdRequest => Empty, "ApiItem/setAnimByAttrID";
    SetAnimByNameRequest => Empty, "ApiItem/setAnimByName";
    SetAnimByIxRequest => Empty, "ApiItem/setAnimByIx";
    IsAnimatedByAttrIdRequest => Reply<bool>, "ApiItem/isAnimated";
    IsAnimatedByNameRequest => Reply<bool>, "ApiItem/isAnimated1";
    IsAnimatedByIxRequest => Reply<bool>, "ApiItem/isAnimated2";
    ClearAnimByAttrIdRequest => Empty, "ApiItem/clearAnim";
    ClearAnimByNameRequest => Empty, "ApiItem/clearAnim1";
    ClearAnimByIxRequest => Empty, "ApiItem/clearAnim2";
    ClearAttrByAttrIdRequest => Empty, "ApiItem/clearAttr";
    ClearAttrByNameRequest => Empty, "ApiItem/clearAttr1";
    ClearAttrByIxRequest => Empty, "ApiItem/clearAttr2";
    HasAttrByAttrIdRequest => Reply<bool>, "ApiItem/hasAttr";
    HasAttrByNameRequest => Reply<bool>, "ApiItem/hasAttr1";
    HasAttrByIxRequest => Reply<bool>, "ApiItem/hasAttr2";
    AttrTypeByAttrIdRequest => Reply<AttrType>, "ApiItem/attrType";
    AttrTypeByNameRequest => Reply<AttrType>, "ApiItem/attrType1";
    AttrTypeByIxRequest => Reply<AttrType>, "ApiItem/attrType2";
    ClearAllAttrRequest => Empty, "ApiItem/clearAllAttr";
    CopyAttrFromRequest => Empty, "ApiItem/copyAttrFrom";
    CopyAttrFromNameRequest => Empty, "ApiItem/copyAttrFrom1";
    CopyAttrFromIxRequest => Empty, "ApiItem/copyAttrFrom2";

    NodeCreateRequest => Reply<ObjectRef>, "ApiNode/create";
    NodeTypeRequest => Reply<u32>, "ApiNode/type";
    PinCountRequest => Reply<u32>, "ApiNode/pinCount";
    PinNameIxRequest => Reply<String>, "ApiNode/pinNameIx";
    ConnectToIxRequest => Empty, "ApiNode/connectToIx";
    ConnectedNodeIxRequest => Reply<ObjectRef>, "ApiNode/connectedNodeIx";
    ExpandOutOfPinRequest => Reply<ObjectRef>, "ApiNode/expandOutOfPin";
    DestinationsRequest => Reply<Vec<ObjectRef>>, "ApiNode/destinations";

    GraphCreateRequest => Reply<ObjectRef>, "ApiNodeGraph/create";
    RootNodeGraphRequest => Reply<ObjectRef>, "ApiProjectManager/rootNodeGraph";
    OwnedItemsRequest => Reply<Vec<ObjectRef>>, "ApiNodeGraph/getOwnedItems";
    FindItemsByNameRequest => Reply<Vec<ObjectRef>>, "ApiNodeGraph/findItemsByName";
    ClearGraphRequest => Empty, "ApiNodeGraph/clear";
    UnfoldGraphRequest => Empty, "ApiNodeGraph/unfold";
    CopyItemTreeRequest => Reply<ObjectRef>, "ApiNodeGraph/copyItemTree";

    SetInputLinkersRequest => Reply<Vec<ObjectRef>>, "ApiModuleNodeGraph/setInputLinkers";
    SetOutputLinkersRequest => Reply<Vec<ObjectRef>>, "ApiModuleNodeGraph/setOutputLinkers";
    SetEvaluateTimeChangesRequest => Empty, "ApiModuleNodeGraph/setEvaluateTimeChanges";
    RegisterModuleGraphRequest => Empty, "ApiModuleGraphInfo/registerModule";

    GuiSetEnabledRequest => Empty, "ApiGuiComponent/setEnabled";
    GuiIsEnabledRequest => Reply<bool>, "ApiGuiComponent/isEnabled";
    GuiSetTooltipRequest => Empty, "ApiGuiComponent/setTooltip";
    GuiSizeRequest => Reply<Int2>, "ApiGuiComponent/size";
    GuiSetMouseListenerRequest => Empty, "ApiGuiComponent/setMouseListener";
    ButtonCreateRequest => Reply<ObjectRef>, "ApiTextButton/create";
    ComboBoxCreateRequest => Reply<ObjectRef>, "ApiComboBox/create";
    ComboBoxSelectedRequest => Reply<i32>, "ApiComboBox/selectedIndex";
    ComboBoxSetSelectedRequest => Empty, "ApiComboBox/setSelectedIndex";
    WindowCreateRequest => Reply<ObjectRef>, "ApiWindow/create";
    TableCreateRequest => Reply<ObjectRef>, "ApiTable/create";

    StartRequest => Empty, "ApiControl/start";
    StopRequest => Empty, "ApiControl/stop";
    LogRequest => Empty, "ApiLogManager/log";
    RegisterLogCallbackRequest => Empty, "ApiLogManager/registerLogCallback";
    UnregisterLogCallbackRequest => Empty, "ApiLogManager/unregisterLogCallback";
    RegisterAssetMissingRequest => Empty, "ApiProjectManager/registerAssetMissingCallback";
    RegisterDaemonUpdateRequest => Empty, "ApiNetRenderManager/registerDaemonUpdateCallback";
    RegisterStatusUpdateRequest => Empty, "ApiNetRenderManager/registerStatusUpdateCallback";
    StartUploadRequest => Empty, "ApiProjectManager/loadFromStream";
    ObserveItemRequest => Empty, "ApiChangeManager/observe";
}
