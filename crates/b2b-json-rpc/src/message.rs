//! Classification of an arbitrary JSON value into one of the JSON-RPC 2.0 message shapes.

use serde_json::Value;
use thiserror::Error;

use crate::{
    error::JsonRpcError, notification::JsonRpcNotification, request::JsonRpcRequest,
    response::JsonRpcResponse,
};

/// Any JSON-RPC 2.0 message
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    Response(JsonRpcResponse),
    Error(JsonRpcError),
}

/// Why a value could not be read as a JSON-RPC message
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("JSON-RPC message must be a JSON object")]
    NotAnObject,

    #[error("Unrecognized JSON-RPC message: {0}")]
    Unrecognized(String),

    #[error("Invalid JSON-RPC {kind}: {source}")]
    Invalid {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl JsonRpcMessage {
    /// Classify a JSON value by its members: `method` makes it a request (or a
    /// notification without `id`), `result` a response, `error` an error response.
    pub fn from_value(value: Value) -> Result<Self, MessageError> {
        let obj = value.as_object().ok_or(MessageError::NotAnObject)?;

        if obj.contains_key("method") {
            if obj.contains_key("id") {
                parse(value, "request").map(JsonRpcMessage::Request)
            } else {
                parse(value, "notification").map(JsonRpcMessage::Notification)
            }
        } else if obj.contains_key("result") {
            parse(value, "response").map(JsonRpcMessage::Response)
        } else if obj.contains_key("error") {
            parse(value, "error response").map(JsonRpcMessage::Error)
        } else {
            Err(MessageError::Unrecognized(value.to_string()))
        }
    }

    pub fn parse_str(json: &str) -> Result<Self, MessageError> {
        let value: Value = serde_json::from_str(json).map_err(|source| MessageError::Invalid {
            kind: "message",
            source,
        })?;
        Self::from_value(value)
    }

    /// Short name of the message shape, for logs and error text
    pub fn kind(&self) -> &'static str {
        match self {
            JsonRpcMessage::Request(_) => "request",
            JsonRpcMessage::Notification(_) => "notification",
            JsonRpcMessage::Response(_) => "response",
            JsonRpcMessage::Error(_) => "error response",
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self, JsonRpcMessage::Request(_))
    }
}

fn parse<T: serde::de::DeserializeOwned>(value: Value, kind: &'static str) -> Result<T, MessageError> {
    serde_json::from_value(value).map_err(|source| MessageError::Invalid { kind, source })
}
