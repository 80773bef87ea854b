// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire schema for modlink: object references, attribute values, the request
//! and response messages of every host service, and the callback messages a
//! host sends back into a module process.
//!
//! Messages travel as CBOR payloads inside checksummed packets (see [`wire`]).
//! Every request that targets an existing remote object embeds an
//! [`ObjectRef`]; every call resolves to either a typed response or a
//! [`Status`] describing why the host rejected it.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use attr::{
    AttrKind, AttrScalar, AttrType, AttrValue, AttrValueMsg, AttributeId, Float2, Float3, Float4,
    Int2, Int3, Int4, Long2, Matrix, TimeSampling,
};
pub use bytes::Bytes;

/// Opaque 64-bit identifier of an object living in the host process.
pub type Handle = i64;

/// Raised when a numeric wire discriminant does not name a known variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown {kind} discriminant {value}")]
pub struct UnknownDiscriminant {
    /// Name of the enumeration being decoded.
    pub kind: &'static str,
    /// Offending raw value.
    pub value: u32,
}

/// Declares a `u32`-backed wire enumeration with `From`/`TryFrom` conversions.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(into = "u32", try_from = "u32")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> u32 {
                value as u32
            }
        }

        impl TryFrom<u32> for $name {
            type Error = $crate::UnknownDiscriminant;

            fn try_from(value: u32) -> Result<Self, $crate::UnknownDiscriminant> {
                match value {
                    $( $value => Ok($name::$variant), )+
                    _ => Err($crate::UnknownDiscriminant { kind: stringify!($name), value }),
                }
            }
        }
    };
}
pub(crate) use wire_enum;

wire_enum! {
    /// Routing tag naming the remote class an [`ObjectRef`] points at.
    pub enum ObjectType {
        /// Generic scene item.
        Item = 1,
        /// Node inside a node graph.
        Node = 2,
        /// Node graph (owns items).
        NodeGraph = 3,
        /// The project's root node graph.
        RootNodeGraph = 4,
        /// Node graph implemented by a module process.
        ModuleNodeGraph = 5,
        /// Node pin.
        Pin = 6,
        /// Generic GUI component.
        GuiComponent = 20,
        /// Push button.
        Button = 21,
        /// Combo box.
        ComboBox = 22,
        /// Top-level window.
        Window = 23,
        /// Table view driven by module callbacks.
        Table = 24,
    }
}

/// Reference to a remote object: routing tag plus handle.
///
/// A handle of [`ObjectRef::NULL_HANDLE`] denotes "no object".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Remote class of the referenced object.
    #[serde(rename = "type")]
    pub kind: ObjectType,
    /// Host-assigned handle.
    pub handle: Handle,
}

impl ObjectRef {
    /// Sentinel handle meaning "no object".
    pub const NULL_HANDLE: Handle = 0;

    /// Reference a live object.
    pub fn new(kind: ObjectType, handle: Handle) -> Self {
        Self { kind, handle }
    }

    /// Null reference carrying only a routing tag.
    pub fn null(kind: ObjectType) -> Self {
        Self {
            kind,
            handle: Self::NULL_HANDLE,
        }
    }

    /// True when this reference names no object.
    pub fn is_null(&self) -> bool {
        self.handle == Self::NULL_HANDLE
    }
}

impl Default for ObjectRef {
    fn default() -> Self {
        Self::null(ObjectType::Item)
    }
}

/// Status codes shared by both call directions (numbering follows gRPC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Success.
    Ok = 0,
    /// Call cancelled by the caller.
    Cancelled = 1,
    /// Unclassified failure.
    Unknown = 2,
    /// The host rejected the call's parameters.
    InvalidArgument = 3,
    /// Deadline expired before completion.
    DeadlineExceeded = 4,
    /// Referenced entity does not exist.
    NotFound = 5,
    /// Entity already exists.
    AlreadyExists = 6,
    /// Caller lacks permission.
    PermissionDenied = 7,
    /// Resource exhausted.
    ResourceExhausted = 8,
    /// System not in a state required for the call.
    FailedPrecondition = 9,
    /// Operation aborted.
    Aborted = 10,
    /// Value out of range.
    OutOfRange = 11,
    /// Method not implemented by the receiver.
    Unimplemented = 12,
    /// Internal invariant broken on the receiver.
    Internal = 13,
    /// Receiver unreachable.
    Unavailable = 14,
    /// Unrecoverable data loss or corruption.
    DataLoss = 15,
    /// Missing authentication.
    Unauthenticated = 16,
}

impl StatusCode {
    /// Decode a raw status code; unknown values collapse to [`StatusCode::Unknown`].
    pub fn from_u32(raw: u32) -> Self {
        match raw {
            0 => Self::Ok,
            1 => Self::Cancelled,
            3 => Self::InvalidArgument,
            4 => Self::DeadlineExceeded,
            5 => Self::NotFound,
            6 => Self::AlreadyExists,
            7 => Self::PermissionDenied,
            8 => Self::ResourceExhausted,
            9 => Self::FailedPrecondition,
            10 => Self::Aborted,
            11 => Self::OutOfRange,
            12 => Self::Unimplemented,
            13 => Self::Internal,
            14 => Self::Unavailable,
            15 => Self::DataLoss,
            16 => Self::Unauthenticated,
            _ => Self::Unknown,
        }
    }
}

/// Outcome of a call as reported on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Raw status code (see [`StatusCode`]).
    pub code: u32,
    /// Human readable detail; empty on success.
    pub message: String,
}

impl Status {
    /// Build a status from a code and message.
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: code as u32,
            message: message.into(),
        }
    }

    /// Successful status.
    pub fn ok() -> Self {
        Self::new(StatusCode::Ok, "")
    }

    /// Parameters rejected by the receiver.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidArgument, message)
    }

    /// Receiver could not be reached.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Unavailable, message)
    }

    /// Receiver failed internally.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }

    /// Typed view of the raw code.
    pub fn code(&self) -> StatusCode {
        StatusCode::from_u32(self.code)
    }

    /// True for [`StatusCode::Ok`].
    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok as u32
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({}): {}", self.code(), self.code, self.message)
    }
}

/// Binds a request message to its method name and response message.
///
/// One implementation exists per remote operation; callers never spell out
/// method strings or response types by hand.
pub trait Rpc: Serialize + DeserializeOwned {
    /// Fully qualified method name (`Service/method`).
    const METHOD: &'static str;
    /// Message returned on success.
    type Response: Serialize + DeserializeOwned;
}

/// Declares `Rpc` bindings: `Request => Response, "Service/method";`.
macro_rules! rpc {
    ($($req:ty => $resp:ty, $method:literal;)+) => {
        $(
            impl $crate::Rpc for $req {
                const METHOD: &'static str = $method;
                type Response = $resp;
            }
        )+
    };
}
pub(crate) use rpc;

pub mod attr;
pub mod callbacks;
pub mod messages;
pub mod wire;

/// Request envelope carried as the payload of a request packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Method name (see [`Rpc::METHOD`]).
    pub method: String,
    /// Per-connection call identifier echoed by the response.
    pub call_id: u64,
    /// Request message.
    pub payload: ciborium::Value,
}

/// Response envelope carried as the payload of a response packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Identifier of the request being answered.
    pub call_id: u64,
    /// Call outcome.
    pub status: Status,
    /// Response message (`Null` when `status` is not OK).
    pub payload: ciborium::Value,
}

/// Empty message for calls that carry or return no data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

/// Single-value response wrapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply<T> {
    /// Returned value.
    pub result: T,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn object_type_rejects_unknown_discriminant() {
        let err = ObjectType::try_from(999).unwrap_err();
        assert_eq!(err.value, 999);
        assert_eq!(err.kind, "ObjectType");
        assert_eq!(ObjectType::try_from(3), Ok(ObjectType::NodeGraph));
    }

    #[test]
    fn null_ref_keeps_routing_tag() {
        let r = ObjectRef::null(ObjectType::Node);
        assert!(r.is_null());
        assert_eq!(r.kind, ObjectType::Node);
        assert!(!ObjectRef::new(ObjectType::Node, 7).is_null());
    }

    #[test]
    fn unknown_status_codes_collapse() {
        assert_eq!(StatusCode::from_u32(3), StatusCode::InvalidArgument);
        assert_eq!(StatusCode::from_u32(77), StatusCode::Unknown);
        let st = Status::invalid_argument("empty name");
        assert_eq!(st.code(), StatusCode::InvalidArgument);
        assert!(!st.is_ok());
        assert!(Status::ok().is_ok());
    }
}
