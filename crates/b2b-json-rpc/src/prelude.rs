//! Common re-exports.
//!
//! ```rust
//! use b2b_json_rpc::prelude::*;
//! ```

pub use crate::error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject};
pub use crate::message::{JsonRpcMessage, MessageError};
pub use crate::notification::JsonRpcNotification;
pub use crate::request::{JsonRpcRequest, RequestParams};
pub use crate::response::{JsonRpcReply, JsonRpcResponse};
pub use crate::types::{JsonRpcVersion, RequestId};

#[cfg(feature = "async")]
pub use crate::r#async::{JsonRpcDispatcher, JsonRpcHandler, ResponseFuture, ToJsonRpcError};

pub use crate::error_codes::*;
