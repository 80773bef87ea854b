// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node graphs implemented by a module process.
//!
//! A module registers a graph type with [`ModuleGraphInfo::register`]. The
//! host then drives each instance through the registered lifecycle callbacks;
//! inside them the module shapes the instance with [`ModuleNodeGraphApi`].

use std::sync::Arc;

use modlink_proto::messages::{
    LinkerInfo, RegisterModuleGraphRequest, SetEvaluateTimeChangesRequest, SetInputLinkersRequest,
    SetOutputLinkersRequest,
};

use crate::callback::{Callback, UserData};
use crate::channel::Channel;
use crate::error::RpcResult;
use crate::graph::{NodeGraph, NodeGraphApi};
use crate::item::{Item, ItemApi};
use crate::node::Node;
use crate::proxy::{proxy_type, Proxy};

proxy_type! {
    /// Graph whose behaviour lives in a module process.
    ModuleNodeGraph => ModuleNodeGraph: NodeGraph, Item
}

impl ItemApi for ModuleNodeGraph {}
impl NodeGraphApi for ModuleNodeGraph {}

/// Module graph operations.
pub trait ModuleNodeGraphApi: NodeGraphApi {
    /// Replace the graph's input linkers; returns the linker nodes in order.
    fn set_input_linkers(&self, linkers: &[LinkerInfo]) -> RpcResult<Vec<Node>> {
        let reply = self.call(&SetInputLinkersRequest {
            item_ref: self.object_ref(),
            linkers: linkers.to_vec(),
        })?;
        Ok(reply.result.into_iter().map(|r| self.wrap(r)).collect())
    }

    /// Replace the graph's output linkers; returns the linker nodes in order.
    fn set_output_linkers(&self, linkers: &[LinkerInfo]) -> RpcResult<Vec<Node>> {
        let reply = self.call(&SetOutputLinkersRequest {
            item_ref: self.object_ref(),
            linkers: linkers.to_vec(),
        })?;
        Ok(reply.result.into_iter().map(|r| self.wrap(r)).collect())
    }

    /// Re-evaluate the graph whenever the scene time changes.
    fn set_evaluate_time_changes(&self, enable: bool) -> RpcResult<()> {
        self.call(&SetEvaluateTimeChangesRequest {
            item_ref: self.object_ref(),
            enable,
        })?;
        Ok(())
    }
}

impl ModuleNodeGraphApi for ModuleNodeGraph {}

/// Description and lifecycle callbacks of a module graph type.
pub struct ModuleGraphInfo {
    module_id: u32,
    name: String,
    description: String,
    create: Option<Callback>,
    destroy: Option<Callback>,
    init: Option<Callback>,
    evaluate: Option<Callback>,
    trigger: Option<Callback>,
}

impl ModuleGraphInfo {
    /// Graph type `module_id` shown as `name`; all callbacks default to no-ops.
    pub fn new(module_id: u32, name: impl Into<String>) -> Self {
        Self {
            module_id,
            name: name.into(),
            description: String::new(),
            create: None,
            destroy: None,
            init: None,
            evaluate: None,
            trigger: None,
        }
    }

    /// Description shown in the host UI.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Called when the host creates an instance; returns its user data.
    pub fn on_create(
        mut self,
        f: impl Fn(ModuleNodeGraph) -> UserData + Send + Sync + 'static,
    ) -> Self {
        self.create = Some(Callback::ModuleCreate(Arc::new(f)));
        self
    }

    /// Called when the host destroys an instance.
    pub fn on_destroy(mut self, f: impl Fn(UserData) + Send + Sync + 'static) -> Self {
        self.destroy = Some(Callback::ModuleDestroy(Arc::new(f)));
        self
    }

    /// Called to set up linkers; returns the instance's new user data.
    pub fn on_init(
        mut self,
        f: impl Fn(ModuleNodeGraph, UserData) -> UserData + Send + Sync + 'static,
    ) -> Self {
        self.init = Some(Callback::GraphInit(Arc::new(f)));
        self
    }

    /// Called on evaluation; returns whether evaluation succeeded.
    pub fn on_evaluate(
        mut self,
        f: impl Fn(ModuleNodeGraph, UserData) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.evaluate = Some(Callback::GraphEvaluate(Arc::new(f)));
        self
    }

    /// Called when a trigger fires.
    pub fn on_trigger(
        mut self,
        f: impl Fn(ModuleNodeGraph, u32, UserData) + Send + Sync + 'static,
    ) -> Self {
        self.trigger = Some(Callback::GraphTrigger(Arc::new(f)));
        self
    }

    /// Register the graph type with the host.
    ///
    /// Every lifecycle callback gets its own id in the channel's registry,
    /// all carrying `user_data`.
    pub fn register(self, channel: &Channel, user_data: UserData) -> RpcResult<()> {
        let registry = channel.registry();
        let register = |cb: Option<Callback>, fallback: Callback| {
            registry.register_ref(cb.unwrap_or(fallback), user_data)
        };
        let create = register(
            self.create,
            Callback::ModuleCreate(Arc::new(|_: ModuleNodeGraph| UserData::NONE)),
        );
        let destroy = register(
            self.destroy,
            Callback::ModuleDestroy(Arc::new(|_: UserData| {})),
        );
        let init = register(
            self.init,
            Callback::GraphInit(Arc::new(|_: ModuleNodeGraph, ud: UserData| ud)),
        );
        let evaluate = register(
            self.evaluate,
            Callback::GraphEvaluate(Arc::new(|_: ModuleNodeGraph, _: UserData| true)),
        );
        let trigger = register(
            self.trigger,
            Callback::GraphTrigger(Arc::new(|_: ModuleNodeGraph, _: u32, _: UserData| {})),
        );
        channel.call_with_callbacks(
            &[create, destroy, init, evaluate, trigger],
            &RegisterModuleGraphRequest {
                module_id: self.module_id,
                name: self.name,
                description: self.description,
                create,
                destroy,
                init,
                evaluate,
                trigger,
            },
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for ModuleGraphInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleGraphInfo")
            .field("module_id", &self.module_id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
