// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Proxy base: a non-owning local handle on a remote object.
//!
//! A proxy never destroys its remote object when dropped. Proxies are freely
//! cloned and compared; the remote object goes away only through an explicit
//! [`Proxy::destroy`], after which the proxy still holds its old handle until
//! the caller resets it with [`Proxy::set_null`].

use std::fmt;

use modlink_proto::messages::DestroyRequest;
use modlink_proto::{Handle, ObjectRef, ObjectType, Rpc};

use crate::channel::{get_channel, Channel};
use crate::error::RpcResult;

/// Handle plus the channel calls against it travel over.
#[derive(Clone)]
pub struct ProxyBase {
    object: ObjectRef,
    channel: Option<Channel>,
}

impl ProxyBase {
    /// Null reference routed as `kind`, on the process-wide channel.
    pub fn null(kind: ObjectType) -> Self {
        Self {
            object: ObjectRef::null(kind),
            channel: None,
        }
    }

    /// Reference to `object` over `channel` (`None` = process-wide channel).
    pub fn new(object: ObjectRef, channel: Option<Channel>) -> Self {
        Self { object, channel }
    }

    /// Referenced object.
    pub fn object(&self) -> ObjectRef {
        self.object
    }
}

impl PartialEq for ProxyBase {
    fn eq(&self, other: &Self) -> bool {
        self.object == other.object
    }
}

impl Eq for ProxyBase {}

impl fmt::Debug for ProxyBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyBase")
            .field("object", &self.object)
            .field("dedicated_channel", &self.channel.is_some())
            .finish()
    }
}

/// Behaviour shared by every typed proxy.
pub trait Proxy: Sized {
    /// Routing tag of a freshly created null proxy of this type.
    const OBJECT_TYPE: ObjectType;

    /// Underlying base.
    fn base(&self) -> &ProxyBase;
    /// Underlying base, mutably.
    fn base_mut(&mut self) -> &mut ProxyBase;
    /// Wrap a base without checking its routing tag.
    fn from_base(base: ProxyBase) -> Self;

    /// Null proxy on the process-wide channel.
    fn null() -> Self {
        Self::from_base(ProxyBase::null(Self::OBJECT_TYPE))
    }

    /// Proxy for `object` on `channel`.
    fn attached(object: ObjectRef, channel: &Channel) -> Self {
        Self::from_base(ProxyBase::new(object, Some(channel.clone())))
    }

    /// Point this proxy at `handle` without asking the host whether it exists.
    fn attach_object_handle(&mut self, handle: Handle) {
        self.base_mut().object.handle = handle;
    }

    /// Current handle; [`ObjectRef::NULL_HANDLE`] when null.
    fn object_handle(&self) -> Handle {
        self.base().object.handle
    }

    /// Reference embedded into requests targeting this object.
    fn object_ref(&self) -> ObjectRef {
        self.base().object
    }

    /// True when no object is attached.
    fn is_null(&self) -> bool {
        self.base().object.is_null()
    }

    /// Detach from the remote object (local only).
    fn set_null(&mut self) {
        self.base_mut().object.handle = ObjectRef::NULL_HANDLE;
    }

    /// Channel calls go over.
    fn channel(&self) -> &Channel {
        match &self.base().channel {
            Some(channel) => channel,
            None => get_channel(),
        }
    }

    /// Bind this proxy to `channel`.
    fn with_channel(mut self, channel: &Channel) -> Self {
        self.base_mut().channel = Some(channel.clone());
        self
    }

    /// Issue a request over this proxy's channel.
    fn call<R: Rpc>(&self, request: &R) -> RpcResult<R::Response> {
        self.channel().call(request)
    }

    /// Ask the host to destroy the remote object.
    ///
    /// The handle is left in place; further calls against it are expected to
    /// fail on the host.
    fn destroy(&self) -> RpcResult<()> {
        self.call(&DestroyRequest {
            item_ref: self.object_ref(),
        })?;
        Ok(())
    }

    /// Proxy of type `P` for `object` on this proxy's channel. A null
    /// `object` yields a null `P`.
    fn wrap<P: Proxy>(&self, object: ObjectRef) -> P {
        let object = if object.is_null() {
            ObjectRef::null(P::OBJECT_TYPE)
        } else {
            object
        };
        P::from_base(ProxyBase::new(object, self.base().channel.clone()))
    }
}

/// Declares a typed proxy with `From` conversions to its base proxies.
macro_rules! proxy_type {
    (
        $(#[$meta:meta])*
        $name:ident => $kind:ident $(: $($up:ty),+)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            base: $crate::proxy::ProxyBase,
        }

        impl $crate::proxy::Proxy for $name {
            const OBJECT_TYPE: ::modlink_proto::ObjectType = ::modlink_proto::ObjectType::$kind;

            fn base(&self) -> &$crate::proxy::ProxyBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut $crate::proxy::ProxyBase {
                &mut self.base
            }

            fn from_base(base: $crate::proxy::ProxyBase) -> Self {
                Self { base }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                <Self as $crate::proxy::Proxy>::null()
            }
        }

        $($(
            impl From<$name> for $up {
                fn from(proxy: $name) -> Self {
                    <$up as $crate::proxy::Proxy>::from_base(proxy.base)
                }
            }
        )+)?
    };
}
pub(crate) use proxy_type;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::transport::Disconnected;

    proxy_type! {
        /// Test proxy.
        Thing => Item
    }

    #[test]
    fn attach_and_null_are_local() {
        let mut thing = Thing::null();
        assert!(thing.is_null());
        thing.attach_object_handle(42);
        assert_eq!(thing.object_handle(), 42);
        assert_eq!(thing.object_ref().kind, ObjectType::Item);
        thing.set_null();
        assert!(thing.is_null());
    }

    #[test]
    fn equality_ignores_channel() {
        let channel = Channel::new(Disconnected);
        let a = Thing::attached(ObjectRef::new(ObjectType::Item, 5), &channel);
        let mut b = Thing::null();
        b.attach_object_handle(5);
        assert_eq!(a, b);
    }

    #[test]
    fn destroy_keeps_handle() {
        let channel = Channel::new(Disconnected);
        let thing = Thing::attached(ObjectRef::new(ObjectType::Item, 9), &channel);
        assert!(thing.destroy().is_err());
        assert_eq!(thing.object_handle(), 9);
    }

    #[test]
    fn wrap_null_uses_target_routing_tag() {
        let channel = Channel::new(Disconnected);
        let thing = Thing::attached(ObjectRef::new(ObjectType::Item, 1), &channel);
        let wrapped: Thing = thing.wrap(ObjectRef::null(ObjectType::Node));
        assert!(wrapped.is_null());
        assert_eq!(wrapped.object_ref().kind, ObjectType::Item);
    }
}
