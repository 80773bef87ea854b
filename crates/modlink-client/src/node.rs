// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node proxy.

use modlink_proto::messages::{
    ConnectToIxRequest, ConnectedNodeIxRequest, DestinationsRequest, ExpandOutOfPinRequest,
    NodeCreateRequest, NodeTypeRequest, PinCountRequest, PinNameIxRequest,
};
use modlink_proto::ObjectRef;

use crate::error::RpcResult;
use crate::graph::NodeGraphApi;
use crate::item::{Item, ItemApi};
use crate::proxy::{proxy_type, Proxy};

proxy_type! {
    /// Node inside a node graph.
    Node => Node: Item
}

impl ItemApi for Node {}

impl Node {
    /// Create a node of `node_type` inside `owner`, on the owner's channel.
    pub fn create<G: NodeGraphApi>(owner: &G, node_type: u32, configure_pins: bool) -> RpcResult<Self> {
        let reply = owner.call(&NodeCreateRequest {
            node_type,
            owner_graph: owner.object_ref(),
            configure_pins,
        })?;
        Ok(owner.wrap(reply.result))
    }
}

/// Node operations.
pub trait NodeApi: ItemApi {
    /// Host node type id.
    fn node_type(&self) -> RpcResult<u32> {
        Ok(self
            .call(&NodeTypeRequest {
                item_ref: self.object_ref(),
            })?
            .result)
    }

    /// Number of input pins.
    fn pin_count(&self) -> RpcResult<u32> {
        Ok(self
            .call(&PinCountRequest {
                item_ref: self.object_ref(),
            })?
            .result)
    }

    /// Name of input pin `pin_index`.
    fn pin_name_at(&self, pin_index: u32) -> RpcResult<String> {
        Ok(self
            .call(&PinNameIxRequest {
                item_ref: self.object_ref(),
                pin_index,
            })?
            .result)
    }

    /// Connect `source` into input pin `pin_index`; `None` disconnects.
    fn connect_to_ix(&self, pin_index: u32, source: Option<&Node>, evaluate: bool) -> RpcResult<()> {
        let source = source.map_or_else(|| ObjectRef::null(Node::OBJECT_TYPE), Node::object_ref);
        self.call(&ConnectToIxRequest {
            item_ref: self.object_ref(),
            pin_index,
            source,
            evaluate,
        })?;
        Ok(())
    }

    /// Node connected to input pin `pin_index`; null when unconnected.
    fn connected_node_ix(&self, pin_index: u32, enter_wrapper_node: bool) -> RpcResult<Node> {
        let reply = self.call(&ConnectedNodeIxRequest {
            item_ref: self.object_ref(),
            pin_index,
            enter_wrapper_node,
        })?;
        Ok(self.wrap(reply.result))
    }

    /// Move the node feeding pin `pin_index` out into the owning graph.
    /// Null when the pin holds no node or the call fails.
    fn expand_out_of_pin(&self, pin_index: u32) -> Node {
        let reply = self.channel().call_or_default(&ExpandOutOfPinRequest {
            item_ref: self.object_ref(),
            pin_index,
        });
        self.wrap(reply.result)
    }

    /// Nodes fed by this node's output.
    fn destinations(&self) -> RpcResult<Vec<Node>> {
        let reply = self.call(&DestinationsRequest {
            item_ref: self.object_ref(),
        })?;
        Ok(reply.result.into_iter().map(|r| self.wrap(r)).collect())
    }

    /// Number of nodes fed by this node's output.
    fn destination_count(&self) -> RpcResult<usize> {
        Ok(self.destinations()?.len())
    }
}

impl NodeApi for Node {}
