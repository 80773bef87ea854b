// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node graph proxy.

use modlink_proto::messages::{
    ClearGraphRequest, CopyItemTreeRequest, FindItemsByNameRequest, GraphCreateRequest,
    OwnedItemsRequest, RootNodeGraphRequest, UnfoldGraphRequest,
};

use crate::channel::Channel;
use crate::error::RpcResult;
use crate::item::{Item, ItemApi};
use crate::proxy::{proxy_type, Proxy};

proxy_type! {
    /// Graph owning items.
    NodeGraph => NodeGraph: Item
}

impl ItemApi for NodeGraph {}

impl NodeGraph {
    /// Create a graph of `graph_type` inside `owner`, on the owner's channel.
    pub fn create<G: NodeGraphApi>(owner: &G, graph_type: u32) -> RpcResult<Self> {
        let reply = owner.call(&GraphCreateRequest {
            graph_type,
            owner_graph: owner.object_ref(),
        })?;
        Ok(owner.wrap(reply.result))
    }

    /// The project's root graph.
    pub fn root_node_graph(channel: &Channel) -> RpcResult<Self> {
        let reply = channel.call(&RootNodeGraphRequest {})?;
        Ok(Self::attached(reply.result, channel))
    }
}

/// Graph operations.
pub trait NodeGraphApi: ItemApi {
    /// Items owned directly by this graph.
    fn owned_items(&self) -> RpcResult<Vec<Item>> {
        let reply = self.call(&OwnedItemsRequest {
            item_ref: self.object_ref(),
        })?;
        Ok(reply.result.into_iter().map(|r| self.wrap(r)).collect())
    }

    /// Owned items named exactly `name`, descending into nested graphs when
    /// `recurse` is set.
    fn find_items_by_name(&self, name: &str, recurse: bool) -> RpcResult<Vec<Item>> {
        let reply = self.call(&FindItemsByNameRequest {
            item_ref: self.object_ref(),
            name: name.to_string(),
            recurse,
        })?;
        Ok(reply.result.into_iter().map(|r| self.wrap(r)).collect())
    }

    /// Delete every owned item.
    fn clear(&self) -> RpcResult<()> {
        self.call(&ClearGraphRequest {
            item_ref: self.object_ref(),
        })?;
        Ok(())
    }

    /// Inline nested graphs into this one.
    fn unfold(&self) -> RpcResult<()> {
        self.call(&UnfoldGraphRequest {
            item_ref: self.object_ref(),
        })?;
        Ok(())
    }

    /// Deep-copy the tree rooted at `root` into this graph; returns the copy.
    fn copy_item_tree<I: ItemApi>(&self, root: &I) -> RpcResult<Item> {
        let reply = self.call(&CopyItemTreeRequest {
            item_ref: self.object_ref(),
            root: root.object_ref(),
        })?;
        Ok(self.wrap(reply.result))
    }
}

impl NodeGraphApi for NodeGraph {}
