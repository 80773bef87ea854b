// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Failure kinds raised by proxy calls.

use modlink_proto::wire::WireError;
use modlink_proto::{AttrType, Status, StatusCode};
use thiserror::Error;

/// Failure of a remote call.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The host rejected the call's parameters (or the call was rejected
    /// locally before being sent for the same reason).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Any other non-OK status.
    #[error("remote call failed with {code:?}: {message}")]
    Rpc {
        /// Status code reported by the transport or the host.
        code: StatusCode,
        /// Status detail.
        message: String,
    },
    /// Request could not be encoded or the response could not be decoded.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// The host answered without populating the requested value arm.
    #[error("response carries no {expected:?} value")]
    UnexpectedResponse {
        /// Arm the caller asked for.
        expected: AttrType,
    },
}

impl RpcError {
    /// True for [`RpcError::InvalidArgument`].
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Status code of a generic failure, if this is one.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<Status> for RpcError {
    fn from(status: Status) -> Self {
        match status.code() {
            StatusCode::InvalidArgument => Self::InvalidArgument(status.message),
            code => Self::Rpc {
                code,
                message: status.message,
            },
        }
    }
}

/// Result alias for proxy calls.
pub type RpcResult<T> = Result<T, RpcError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_status_is_distinguished() {
        let err = RpcError::from(Status::invalid_argument("index 9 out of range"));
        assert!(err.is_invalid_argument());
        assert_eq!(err.status_code(), None);
        assert_eq!(err.to_string(), "invalid argument: index 9 out of range");
    }

    #[test]
    fn other_statuses_keep_code_and_message() {
        let err = RpcError::from(Status::new(StatusCode::DeadlineExceeded, "slow host"));
        assert!(!err.is_invalid_argument());
        assert_eq!(err.status_code(), Some(StatusCode::DeadlineExceeded));
        match err {
            RpcError::Rpc { message, .. } => assert_eq!(message, "slow host"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
