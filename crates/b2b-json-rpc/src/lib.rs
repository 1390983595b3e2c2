//! # JSON-RPC 2.0 for the B2B edge gateway
//!
//! Transport-agnostic message types and an async method registry. Nothing in
//! this crate knows about HTTP, credentials or edges; the gateway crate plugs
//! those in through the handler context type.
//!
//! ## Features
//! - JSON-RPC 2.0 request, response and error shapes with correlation ids
//! - Classification of arbitrary JSON into request / notification / response
//! - `async` feature: handler trait and a dispatcher returning response futures

pub mod error;
pub mod message;
pub mod notification;
pub mod request;
pub mod response;
pub mod types;

#[cfg(feature = "async")]
pub mod r#async;

pub mod prelude;

// Re-export main types
pub use error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject};
pub use message::{JsonRpcMessage, MessageError};
pub use notification::JsonRpcNotification;
pub use request::{JsonRpcRequest, RequestParams};
pub use response::{JsonRpcReply, JsonRpcResponse};
pub use types::{JsonRpcVersion, RequestId};

#[cfg(feature = "async")]
pub use r#async::{JsonRpcDispatcher, JsonRpcHandler, ResponseFuture, ToJsonRpcError};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
