// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Session control and host-wide callback registrations.

use std::sync::Arc;

use modlink_proto::messages::{
    LogLevel, LogRequest, ObserveItemRequest, RegisterAssetMissingRequest,
    RegisterDaemonUpdateRequest, RegisterLogCallbackRequest, RegisterStatusUpdateRequest,
    StartRequest, StartUploadRequest, StopRequest, UnregisterLogCallbackRequest,
};
use modlink_proto::Bytes;

use crate::callback::{Callback, CallbackId, ChangeEvent, DaemonInfo, UserData};
use crate::channel::Channel;
use crate::error::RpcResult;
use crate::item::ItemApi;

/// Host-wide operations not tied to one object.
#[derive(Debug, Clone)]
pub struct ControlService {
    channel: Channel,
}

impl ControlService {
    /// Service over `channel`.
    pub fn new(channel: &Channel) -> Self {
        Self {
            channel: channel.clone(),
        }
    }

    /// Announce the module's callback address and start the session. The
    /// host rejects an empty address as an invalid argument.
    pub fn start(&self, callback_source: &str) -> RpcResult<()> {
        self.channel.call(&StartRequest {
            callback_source: callback_source.to_string(),
        })?;
        Ok(())
    }

    /// End the session.
    pub fn stop(&self) -> RpcResult<()> {
        self.channel.call(&StopRequest {})?;
        Ok(())
    }

    /// Write a line to the host log.
    pub fn log(&self, level: LogLevel, message: &str) -> RpcResult<()> {
        self.channel.call(&LogRequest {
            level,
            message: message.to_string(),
        })?;
        Ok(())
    }

    /// Forward host log lines to `f`.
    pub fn register_log_callback(
        &self,
        f: impl Fn(LogLevel, &str, UserData) + Send + Sync + 'static,
        user_data: UserData,
    ) -> RpcResult<CallbackId> {
        let callback = self
            .channel
            .registry()
            .register_ref(Callback::Log(Arc::new(f)), user_data);
        self.channel
            .call_with_callbacks(&[callback], &RegisterLogCallbackRequest { callback })?;
        Ok(CallbackId(callback.callback_id))
    }

    /// Stop forwarding host log lines to the callback registered as `id` and
    /// drop its registration.
    pub fn unregister_log_callback(&self, id: CallbackId) -> RpcResult<()> {
        self.channel.call(&UnregisterLogCallbackRequest {
            callback_id: id.0,
        })?;
        self.channel.registry().unregister(id);
        Ok(())
    }

    /// Let `f` resolve assets the host cannot find.
    pub fn register_asset_missing_callback(
        &self,
        f: impl Fn(&str, UserData) -> Option<String> + Send + Sync + 'static,
        user_data: UserData,
    ) -> RpcResult<CallbackId> {
        let callback = self
            .channel
            .registry()
            .register_ref(Callback::AssetMissing(Arc::new(f)), user_data);
        self.channel
            .call_with_callbacks(&[callback], &RegisterAssetMissingRequest { callback })?;
        Ok(CallbackId(callback.callback_id))
    }

    /// Report render daemon changes to `f`.
    pub fn register_daemon_update_callback(
        &self,
        f: impl Fn(&[DaemonInfo], UserData) + Send + Sync + 'static,
        user_data: UserData,
    ) -> RpcResult<CallbackId> {
        let callback = self
            .channel
            .registry()
            .register_ref(Callback::DaemonUpdate(Arc::new(f)), user_data);
        self.channel
            .call_with_callbacks(&[callback], &RegisterDaemonUpdateRequest { callback })?;
        Ok(CallbackId(callback.callback_id))
    }

    /// Report render status changes to `f`.
    pub fn register_status_callback(
        &self,
        f: impl Fn(u32, UserData) + Send + Sync + 'static,
        user_data: UserData,
    ) -> RpcResult<CallbackId> {
        let callback = self
            .channel
            .registry()
            .register_ref(Callback::StatusUpdate(Arc::new(f)), user_data);
        self.channel
            .call_with_callbacks(&[callback], &RegisterStatusUpdateRequest { callback })?;
        Ok(CallbackId(callback.callback_id))
    }

    /// Report changes of `item` to `f`.
    pub fn register_change_observer<I: ItemApi>(
        &self,
        item: &I,
        f: impl Fn(ChangeEvent, UserData) + Send + Sync + 'static,
        user_data: UserData,
    ) -> RpcResult<CallbackId> {
        let callback = self
            .channel
            .registry()
            .register_ref(Callback::ChangeObserver(Arc::new(f)), user_data);
        self.channel.call_with_callbacks(
            &[callback],
            &ObserveItemRequest {
                item_ref: item.object_ref(),
                callback,
            },
        )?;
        Ok(CallbackId(callback.callback_id))
    }

    /// Stream data to the host. The host pulls chunks by calling
    /// `next_chunk(max_size)` until it returns `None`.
    pub fn start_upload(
        &self,
        next_chunk: impl Fn(usize, UserData) -> Option<Bytes> + Send + Sync + 'static,
        user_data: UserData,
    ) -> RpcResult<CallbackId> {
        let callback = self
            .channel
            .registry()
            .register_ref(Callback::NextChunk(Arc::new(next_chunk)), user_data);
        self.channel
            .call_with_callbacks(&[callback], &StartUploadRequest { callback })?;
        Ok(CallbackId(callback.callback_id))
    }
}
