// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Module-side client for the renderer's out-of-process module API.
//!
//! Host objects are reached through typed proxies ([`Item`], [`Node`],
//! [`NodeGraph`], GUI components, ...), each a `(type, handle)` pair plus the
//! [`Channel`] it talks over. Operations are blocking unary calls; failures
//! surface as [`RpcError`]. Callbacks the host invokes in the module are kept
//! in a [`CallbackRegistry`] and served by a [`CallbackBridge`].
//!
//! ```no_run
//! use modlink_client::{get_channel, AttributeApi, NodeGraph, NodeGraphApi};
//! use modlink_proto::AttributeId;
//!
//! # fn main() -> modlink_client::RpcResult<()> {
//! let root = NodeGraph::root_node_graph(get_channel())?;
//! for item in root.owned_items()? {
//!     if item.has_attr(AttributeId::A_FILENAME)? {
//!         println!("{}", item.get_string(AttributeId::A_FILENAME)?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod attr;
pub mod bridge;
pub mod callback;
pub mod channel;
pub mod control;
pub mod error;
pub mod graph;
pub mod gui;
pub mod item;
pub mod module_graph;
pub mod node;
pub mod proxy;
pub mod runtime;
pub mod server;
pub mod transport;

pub use attr::{AttrAddress, Animation, AttributeApi};
pub use bridge::{CallbackBridge, ShutdownSignal};
pub use callback::{
    global_registry, Callback, CallbackId, CallbackRegistry, ChangeEvent, DaemonInfo, MouseEvent,
    UserData, UserDataTable,
};
pub use channel::{get_channel, install_channel, Channel, SERVER_SOCKET_ENV};
pub use control::ControlService;
pub use error::{RpcError, RpcResult};
pub use graph::{NodeGraph, NodeGraphApi};
pub use gui::{Button, ComboBox, GuiComponent, GuiComponentApi, Table, Window};
pub use item::{Item, ItemApi};
pub use module_graph::{ModuleGraphInfo, ModuleNodeGraph, ModuleNodeGraphApi};
pub use node::{Node, NodeApi};
pub use proxy::{Proxy, ProxyBase};
pub use runtime::{init_tracing, ModuleArgs, ModuleRuntime};
pub use server::BridgeServer;
pub use transport::{Disconnected, Endpoint, EndpointError, SocketTransport, Transport};
