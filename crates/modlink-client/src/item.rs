// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Item proxy: the base of every scene-graph object.

use modlink_proto::messages::{
    AttrCountRequest, AttrIdIxRequest, AttrNameRequest, EvaluateRequest, GraphOwnerRequest,
    IsGraphRequest, IsNodeRequest, NameRequest, OutTypeRequest, PinOwnerRequest, SetNameRequest,
    ToGraphRequest, ToNodeRequest, UniqueIdRequest,
};
use modlink_proto::AttributeId;

use crate::error::RpcResult;
use crate::graph::NodeGraph;
use crate::node::Node;
use crate::proxy::{proxy_type, Proxy};

proxy_type! {
    /// Generic scene item.
    Item => Item
}

/// Operations every item supports.
///
/// `to_graph`, `to_node`, `graph_owner` and `pin_owner` never fail: on any
/// error they return a null proxy, so "no owner" and "call failed" look the
/// same to the caller.
pub trait ItemApi: Proxy {
    /// Item name.
    fn name(&self) -> RpcResult<String> {
        Ok(self
            .call(&NameRequest {
                item_ref: self.object_ref(),
            })?
            .result)
    }

    /// Rename the item.
    fn set_name(&self, name: &str) -> RpcResult<()> {
        self.call(&SetNameRequest {
            item_ref: self.object_ref(),
            name: name.to_string(),
        })?;
        Ok(())
    }

    /// Type id of the item's output pin.
    fn out_type(&self) -> RpcResult<u32> {
        Ok(self
            .call(&OutTypeRequest {
                item_ref: self.object_ref(),
            })?
            .result)
    }

    /// True when the item is a node graph.
    fn is_graph(&self) -> RpcResult<bool> {
        Ok(self
            .call(&IsGraphRequest {
                item_ref: self.object_ref(),
            })?
            .result)
    }

    /// True when the item is a node.
    fn is_node(&self) -> RpcResult<bool> {
        Ok(self
            .call(&IsNodeRequest {
                item_ref: self.object_ref(),
            })?
            .result)
    }

    /// This item as a graph; null when it is not one or the call fails.
    fn to_graph(&self) -> NodeGraph {
        let reply = self.channel().call_or_default(&ToGraphRequest {
            item_ref: self.object_ref(),
        });
        self.wrap(reply.result)
    }

    /// This item as a node; null when it is not one or the call fails.
    fn to_node(&self) -> Node {
        let reply = self.channel().call_or_default(&ToNodeRequest {
            item_ref: self.object_ref(),
        });
        self.wrap(reply.result)
    }

    /// Graph owning this item; null for the root graph or on failure.
    fn graph_owner(&self) -> NodeGraph {
        let reply = self.channel().call_or_default(&GraphOwnerRequest {
            item_ref: self.object_ref(),
        });
        self.wrap(reply.result)
    }

    /// Node owning this item through a pin; null when there is none or on
    /// failure.
    fn pin_owner(&self) -> Node {
        let reply = self.channel().call_or_default(&PinOwnerRequest {
            item_ref: self.object_ref(),
        });
        self.wrap(reply.result)
    }

    /// Force host-side evaluation.
    fn evaluate(&self) -> RpcResult<()> {
        self.call(&EvaluateRequest {
            item_ref: self.object_ref(),
        })?;
        Ok(())
    }

    /// Session-unique id of the item.
    fn unique_id(&self) -> RpcResult<u32> {
        Ok(self
            .call(&UniqueIdRequest {
                item_ref: self.object_ref(),
            })?
            .result)
    }

    /// Number of attributes.
    fn attr_count(&self) -> RpcResult<u32> {
        Ok(self
            .call(&AttrCountRequest {
                item_ref: self.object_ref(),
            })?
            .result)
    }

    /// Id of the attribute at `index`.
    fn attr_id_at(&self, index: u32) -> RpcResult<AttributeId> {
        Ok(self
            .call(&AttrIdIxRequest {
                item_ref: self.object_ref(),
                index,
            })?
            .result)
    }

    /// Name of attribute `id`.
    fn attr_name(&self, id: AttributeId) -> RpcResult<String> {
        Ok(self
            .call(&AttrNameRequest {
                item_ref: self.object_ref(),
                attribute_id: id,
            })?
            .result)
    }
}

impl ItemApi for Item {}
