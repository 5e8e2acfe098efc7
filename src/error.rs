//! Error types for simrpc.

use thiserror::Error;

/// Main error type for all simrpc operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Connection negotiation failed (bad magic number, unknown codec).
    #[error("negotiation error: {0}")]
    Negotiation(String),

    /// Frame length exceeds the configured maximum.
    #[error("frame size {size} exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// Service method name is not of the form `Service.Method`.
    #[error("rpc server: service/method request ill-formed: {0}")]
    MalformedServiceMethod(String),

    /// No service registered under that name.
    #[error("rpc server: can't find service {0}")]
    ServiceNotFound(String),

    /// Method not found: the service exists but has no such method.
    ///
    /// Reported to the caller as "can't find method".
    #[error("rpc server: can't find method {0}")]
    MethodNotFound(String),

    /// A service with the same name is already registered.
    #[error("rpc: service already defined: {0}")]
    DuplicateService(String),

    /// Error reported by the remote side through the response header.
    #[error("{0}")]
    Remote(String),

    /// Operation attempted on a closed or shut down connection.
    #[error("connection is shut down")]
    ShutDown,

    /// The connection failed while the call was pending.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The caller gave up waiting before the response arrived.
    #[error("rpc client: call cancelled")]
    Cancelled,

    /// Connect plus negotiation did not finish within the connect timeout.
    #[error("rpc client: connect timeout")]
    ConnectTimeout,
}

impl RpcError {
    /// Error handed to every call still pending when the connection ends.
    pub(crate) fn for_pending(&self) -> RpcError {
        match self {
            RpcError::ShutDown => RpcError::ShutDown,
            RpcError::ConnectionLost(cause) => RpcError::ConnectionLost(cause.clone()),
            other => RpcError::ConnectionLost(other.to_string()),
        }
    }
}

/// Result type alias using RpcError.
pub type Result<T> = std::result::Result<T, RpcError>;
