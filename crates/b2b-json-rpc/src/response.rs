use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::JsonRpcError;
use crate::types::{JsonRpcVersion, RequestId};

/// A successful JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: RequestId,
    pub result: Value,
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            result,
        }
    }

    /// The full response object as JSON, envelope included
    pub fn to_value(&self) -> Value {
        // Serializing plain data into a Value cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<(RequestId, Value)> for JsonRpcResponse {
    fn from((id, result): (RequestId, Value)) -> Self {
        Self::success(id, result)
    }
}

/// Outgoing reply: either a success or an error, never both
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcReply {
    Response(JsonRpcResponse),
    Error(JsonRpcError),
}

impl JsonRpcReply {
    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcReply::Error(_))
    }

    pub fn id(&self) -> Option<&RequestId> {
        match self {
            JsonRpcReply::Response(resp) => Some(&resp.id),
            JsonRpcReply::Error(err) => err.id.as_ref(),
        }
    }
}

impl From<JsonRpcResponse> for JsonRpcReply {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcError> for JsonRpcReply {
    fn from(error: JsonRpcError) -> Self {
        Self::Error(error)
    }
}
