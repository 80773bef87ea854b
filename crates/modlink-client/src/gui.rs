// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! GUI component proxies that hand callbacks to the host.

use std::sync::Arc;

use modlink_proto::messages::{
    ButtonCreateRequest, ComboBoxCreateRequest, ComboBoxSelectedRequest,
    ComboBoxSetSelectedRequest, GuiIsEnabledRequest, GuiSetEnabledRequest,
    GuiSetMouseListenerRequest, GuiSetTooltipRequest, GuiSizeRequest, TableCreateRequest,
    WindowCreateRequest,
};
use modlink_proto::Int2;

use crate::callback::{Callback, MouseEvent, UserData};
use crate::channel::Channel;
use crate::error::RpcResult;
use crate::proxy::{proxy_type, Proxy};

proxy_type! {
    /// Any GUI component.
    GuiComponent => GuiComponent
}

proxy_type! {
    /// Push button.
    Button => Button: GuiComponent
}

proxy_type! {
    /// Combo box.
    ComboBox => ComboBox: GuiComponent
}

proxy_type! {
    /// Top-level window.
    Window => Window: GuiComponent
}

proxy_type! {
    /// Table whose rows come from module callbacks.
    Table => Table: GuiComponent
}

/// Operations every GUI component supports.
pub trait GuiComponentApi: Proxy {
    /// Enable or disable user interaction.
    fn set_enabled(&self, enabled: bool) -> RpcResult<()> {
        self.call(&GuiSetEnabledRequest {
            item_ref: self.object_ref(),
            enabled,
        })?;
        Ok(())
    }

    /// True when the component accepts user interaction.
    fn is_enabled(&self) -> RpcResult<bool> {
        Ok(self
            .call(&GuiIsEnabledRequest {
                item_ref: self.object_ref(),
            })?
            .result)
    }

    /// Set the tooltip text.
    fn set_tooltip(&self, tooltip: &str) -> RpcResult<()> {
        self.call(&GuiSetTooltipRequest {
            item_ref: self.object_ref(),
            tooltip: tooltip.to_string(),
        })?;
        Ok(())
    }

    /// Current width and height in pixels.
    fn size(&self) -> RpcResult<Int2> {
        Ok(self
            .call(&GuiSizeRequest {
                item_ref: self.object_ref(),
            })?
            .result)
    }

    /// Route mouse events over this component to `listener`.
    fn set_mouse_listener(
        &self,
        listener: impl Fn(GuiComponent, MouseEvent, UserData) + Send + Sync + 'static,
        user_data: UserData,
    ) -> RpcResult<()> {
        let callback = self
            .channel()
            .registry()
            .register_ref(Callback::MouseEvent(Arc::new(listener)), user_data);
        self.channel().call_with_callbacks(
            &[callback],
            &GuiSetMouseListenerRequest {
                item_ref: self.object_ref(),
                callback,
            },
        )?;
        Ok(())
    }
}

impl GuiComponentApi for GuiComponent {}
impl GuiComponentApi for Button {}
impl GuiComponentApi for ComboBox {}
impl GuiComponentApi for Window {}
impl GuiComponentApi for Table {}

impl Button {
    /// Create a button labelled `text`; `on_click` runs on every click.
    pub fn create(
        channel: &Channel,
        text: &str,
        on_click: impl Fn(Button, UserData) + Send + Sync + 'static,
        user_data: UserData,
    ) -> RpcResult<Self> {
        let callback = channel
            .registry()
            .register_ref(Callback::ButtonClicked(Arc::new(on_click)), user_data);
        let reply = channel.call_with_callbacks(
            &[callback],
            &ButtonCreateRequest {
                text: text.to_string(),
                callback,
            },
        )?;
        Ok(Self::attached(reply.result, channel))
    }
}

impl ComboBox {
    /// Create a combo box listing `items`; `on_change` runs when the
    /// selection changes.
    pub fn create(
        channel: &Channel,
        items: &[&str],
        on_change: impl Fn(ComboBox, UserData) + Send + Sync + 'static,
        user_data: UserData,
    ) -> RpcResult<Self> {
        let callback = channel
            .registry()
            .register_ref(Callback::ComboBoxChanged(Arc::new(on_change)), user_data);
        let reply = channel.call_with_callbacks(
            &[callback],
            &ComboBoxCreateRequest {
                items: items.iter().map(ToString::to_string).collect(),
                callback,
            },
        )?;
        Ok(Self::attached(reply.result, channel))
    }

    /// Index of the selected entry (-1 when nothing is selected).
    pub fn selected_index(&self) -> RpcResult<i32> {
        Ok(self
            .call(&ComboBoxSelectedRequest {
                item_ref: self.object_ref(),
            })?
            .result)
    }

    /// Select entry `index`; `send_event` also fires the change callback.
    pub fn set_selected_index(&self, index: i32, send_event: bool) -> RpcResult<()> {
        self.call(&ComboBoxSetSelectedRequest {
            item_ref: self.object_ref(),
            index,
            send_event,
        })?;
        Ok(())
    }
}

impl Window {
    /// Create a window titled `title` around `content`; `on_close` runs when
    /// the user closes it.
    pub fn create<C: GuiComponentApi>(
        channel: &Channel,
        title: &str,
        content: &C,
        on_close: impl Fn(Window, UserData) + Send + Sync + 'static,
        user_data: UserData,
    ) -> RpcResult<Self> {
        let callback = channel
            .registry()
            .register_ref(Callback::WindowClose(Arc::new(on_close)), user_data);
        let reply = channel.call_with_callbacks(
            &[callback],
            &WindowCreateRequest {
                title: title.to_string(),
                content: content.object_ref(),
                callback,
            },
        )?;
        Ok(Self::attached(reply.result, channel))
    }
}

impl Table {
    /// Create a table with `columns`; the host pulls its row count and cell
    /// text through `num_rows` and `content`.
    pub fn create(
        channel: &Channel,
        columns: &[&str],
        num_rows: impl Fn(UserData) -> u32 + Send + Sync + 'static,
        content: impl Fn(u32, u32, UserData) -> String + Send + Sync + 'static,
        user_data: UserData,
    ) -> RpcResult<Self> {
        let registry = channel.registry();
        let num_rows = registry.register_ref(Callback::TableNumRows(Arc::new(num_rows)), user_data);
        let content = registry.register_ref(Callback::TableContent(Arc::new(content)), user_data);
        let reply = channel.call_with_callbacks(
            &[num_rows, content],
            &TableCreateRequest {
                columns: columns.iter().map(ToString::to_string).collect(),
                num_rows,
                content,
            },
        )?;
        Ok(Self::attached(reply.result, channel))
    }
}
