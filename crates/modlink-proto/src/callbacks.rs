// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Messages the host sends into a module process to invoke its callbacks.
//!
//! Every invocation names the callback id the module registered and echoes
//! the user-data token it registered with. Responses implement `Default`; a
//! receiver that cannot route an invocation answers with the default.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::attr::{AttributeId, Float2};
use crate::messages::LogLevel;
use crate::{wire_enum, Bytes, Empty, ObjectRef, Reply};

/// Callback id and user data common to every invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CallbackHeader {
    /// Id the module registered the callback under.
    pub callback_id: i32,
    /// User-data token the module registered alongside it.
    pub user_data: u64,
}

/// An invocation the host can send, bound to its method name and response.
pub trait InboundCall: Serialize + DeserializeOwned {
    /// Fully qualified method name (`ModuleCallback/...`).
    const METHOD: &'static str;
    /// Response message; its default is the answer for an unrouted call.
    type Response: Serialize + DeserializeOwned + Default;

    /// Callback id and user data of this invocation.
    fn header(&self) -> CallbackHeader;
}

/// Declares an inbound invocation message with the common header fields.
macro_rules! inbound {
    (
        $(#[$meta:meta])*
        $name:ident => $resp:ty, $method:literal {
            $( $(#[$fmeta:meta])* $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            /// Id the module registered the callback under.
            pub callback_id: i32,
            /// User-data token registered alongside the callback.
            pub user_data: u64,
            $( $(#[$fmeta])* pub $field: $fty, )*
        }

        impl InboundCall for $name {
            const METHOD: &'static str = $method;
            type Response = $resp;

            fn header(&self) -> CallbackHeader {
                CallbackHeader {
                    callback_id: self.callback_id,
                    user_data: self.user_data,
                }
            }
        }
    };
}

/// Whether the module handled an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// True when the event was handled.
    pub success: bool,
}

/// User data a lifecycle callback hands back to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDataResponse {
    /// Token stored by the host for the graph instance.
    pub user_data: u64,
}

wire_enum! {
    /// Kind of a mouse event.
    pub enum MouseEventKind {
        /// Button pressed.
        Down = 1,
        /// Button released.
        Up = 2,
        /// Pointer moved.
        Move = 3,
        /// Pointer dragged with a button held.
        Drag = 4,
        /// Pointer entered the component.
        Enter = 5,
        /// Pointer left the component.
        Exit = 6,
        /// Double click.
        DoubleClick = 7,
        /// Wheel turned.
        Wheel = 8,
    }
}

/// One mouse event over a GUI component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseEventMsg {
    /// Event kind.
    pub kind: MouseEventKind,
    /// Pointer position relative to the component.
    pub position: Float2,
    /// Wheel delta (zero for non-wheel events).
    pub wheel_delta: f32,
    /// Bit mask of held buttons.
    pub buttons: u32,
}

/// State of one render daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonInfoMsg {
    /// Daemon address.
    pub ip: String,
    /// Daemon display name.
    pub name: String,
    /// Host-defined state code.
    pub state: u32,
    /// Number of GPUs the daemon exposes.
    pub gpu_count: u32,
}

/// Resolution of a missing asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMissingResponse {
    /// Replacement path; empty when unresolved.
    pub resolved_path: String,
}

/// Next chunk of an upload stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextChunkResponse {
    /// Chunk bytes (at most the requested size).
    pub data: Bytes,
    /// True when the stream is exhausted.
    pub done: bool,
}

/// An unanswerable chunk request ends the stream.
impl Default for NextChunkResponse {
    fn default() -> Self {
        Self {
            data: Bytes::new(),
            done: true,
        }
    }
}

/// Text of one table cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableContentResponse {
    /// Cell text.
    pub text: String,
}

/// Row count of a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNumRowsResponse {
    /// Number of rows.
    pub count: u32,
}

wire_enum! {
    /// Kind of change reported to an item observer.
    pub enum ChangeKind {
        /// An attribute value changed.
        AttributeChanged = 1,
        /// The item was renamed.
        Renamed = 2,
        /// The item was deleted.
        Deleted = 3,
        /// A pin connection changed.
        ConnectionChanged = 4,
    }
}

/// One change of an observed item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeEventMsg {
    /// Changed item.
    pub item: ObjectRef,
    /// Kind of change.
    pub kind: ChangeKind,
    /// Attribute concerned, for attribute changes.
    pub attribute_id: AttributeId,
}

inbound! {
    /// A button was clicked.
    ButtonClickedCall => SuccessResponse, "ModuleCallback/buttonClicked" {
        /// Clicked button.
        button: ObjectRef,
    }
}

inbound! {
    /// A combo box selection changed.
    ComboBoxChangedCall => SuccessResponse, "ModuleCallback/comboBoxChanged" {
        /// Changed combo box.
        combo_box: ObjectRef,
    }
}

inbound! {
    /// A window is closing.
    WindowCloseCall => SuccessResponse, "ModuleCallback/windowClose" {
        /// Closing window.
        window: ObjectRef,
    }
}

inbound! {
    /// A mouse event over a component with a mouse listener.
    MouseEventCall => SuccessResponse, "ModuleCallback/mouseEvent" {
        /// Component under the pointer.
        component: ObjectRef,
        /// Event detail.
        event: MouseEventMsg,
    }
}

inbound! {
    /// The host created a module graph instance.
    CreateFuncCall => UserDataResponse, "ModuleCallback/createFunc" {
        /// New graph instance.
        graph: ObjectRef,
    }
}

inbound! {
    /// The host is destroying a module graph instance.
    DestroyFuncCall => Empty, "ModuleCallback/destroyFunc" {}
}

inbound! {
    /// The host asks a module graph instance to set itself up.
    InitFuncCall => UserDataResponse, "ModuleCallback/initFunc" {
        /// Graph instance.
        graph: ObjectRef,
    }
}

inbound! {
    /// The host evaluates a module graph instance.
    EvaluateFuncCall => SuccessResponse, "ModuleCallback/evaluateFunc" {
        /// Graph instance.
        graph: ObjectRef,
    }
}

inbound! {
    /// A trigger fired on a module graph instance.
    TriggerFuncCall => Empty, "ModuleCallback/triggerFunc" {
        /// Graph instance.
        graph: ObjectRef,
        /// Trigger id.
        trigger_id: u32,
    }
}

inbound! {
    /// A line was written to the host log.
    LogMessageCall => Empty, "ModuleCallback/logMessage" {
        /// Severity.
        level: LogLevel,
        /// Text.
        message: String,
    }
}

inbound! {
    /// The host could not find an asset.
    AssetMissingCall => AssetMissingResponse, "ModuleCallback/assetMissing" {
        /// Path the host looked for.
        asset_path: String,
    }
}

inbound! {
    /// The set of render daemons changed.
    DaemonUpdateCall => Empty, "ModuleCallback/daemonUpdate" {
        /// Current daemons.
        daemons: Vec<DaemonInfoMsg>,
    }
}

inbound! {
    /// The render status changed.
    StatusUpdateCall => Empty, "ModuleCallback/statusUpdate" {
        /// Host-defined status code.
        status: u32,
    }
}

inbound! {
    /// The host pulls the next chunk of an upload stream.
    NextChunkCall => NextChunkResponse, "ModuleCallback/nextChunk" {
        /// Largest chunk the host accepts.
        max_size: u32,
    }
}

inbound! {
    /// The host asks for one table cell.
    TableContentCall => TableContentResponse, "ModuleCallback/tableContent" {
        /// Row index.
        row: u32,
        /// Column index.
        column: u32,
    }
}

inbound! {
    /// The host asks for a table's row count.
    TableNumRowsCall => TableNumRowsResponse, "ModuleCallback/tableNumRows" {}
}

inbound! {
    /// An observed item changed.
    ChangeObserverCall => Empty, "ModuleCallback/changeObserver" {
        /// Change detail.
        event: ChangeEventMsg,
    }
}

/// Readiness probe; answered by the receiver itself, not a callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsReadyCall {}

impl IsReadyCall {
    /// Method name.
    pub const METHOD: &'static str = "ModuleCallback/isReady";
}

/// Readiness answer.
pub type IsReadyResponse = Reply<bool>;

/// Shutdown request; answered by the receiver itself, not a callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownCall {}

impl ShutdownCall {
    /// Method name.
    pub const METHOD: &'static str = "ModuleCallback/shutdown";
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::{wire, ObjectType};

    #[test]
    fn header_reflects_registration_fields() {
        let call = ButtonClickedCall {
            callback_id: 12,
            user_data: 0xfeed,
            button: ObjectRef::new(ObjectType::Button, 4),
        };
        assert_eq!(
            call.header(),
            CallbackHeader {
                callback_id: 12,
                user_data: 0xfeed
            }
        );
        assert_eq!(ButtonClickedCall::METHOD, "ModuleCallback/buttonClicked");
    }

    #[test]
    fn daemon_update_decodes_into_owned_list() {
        let call = DaemonUpdateCall {
            callback_id: 1,
            user_data: 0,
            daemons: vec![DaemonInfoMsg {
                ip: "10.0.0.2".into(),
                name: "rack-a".into(),
                state: 2,
                gpu_count: 4,
            }],
        };
        let value = wire::to_value(&call).unwrap();
        drop(call);
        let back: DaemonUpdateCall = wire::from_value(&value).unwrap();
        assert_eq!(back.daemons[0].name, "rack-a");
        assert_eq!(back.daemons[0].gpu_count, 4);
    }

    #[test]
    fn default_responses_are_negative() {
        assert!(!SuccessResponse::default().success);
        assert_eq!(UserDataResponse::default().user_data, 0);
        assert!(AssetMissingResponse::default().resolved_path.is_empty());
        let chunk = NextChunkResponse::default();
        assert!(chunk.done);
        assert!(chunk.data.is_empty());
    }
}
