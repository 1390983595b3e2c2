//! Repairs loosely-formed bodies into JSON-RPC 2.0 requests.
//!
//! Callers may omit `jsonrpc` and `id`; both are filled in on the top-level
//! object and, independently, on an object found at `params.payload`.

use b2b_json_rpc::{JSONRPC_VERSION, JsonRpcMessage, JsonRpcRequest, MessageError, RequestId};
use serde_json::{Map, Value};

use crate::GatewayError;

/// Parse, default and classify a request body in one go
pub fn parse_request(body: &[u8]) -> Result<JsonRpcRequest, GatewayError> {
    let value: Value = serde_json::from_slice(body).map_err(|err| GatewayError::malformed(err.to_string()))?;
    into_request(normalize(value)?)
}

/// Add missing `jsonrpc`/`id` members. The body must be an object.
pub fn normalize(value: Value) -> Result<Value, GatewayError> {
    let Value::Object(mut message) = value else {
        return Err(GatewayError::malformed("body is not a JSON object"));
    };
    apply_defaults(&mut message);

    if let Some(Value::Object(params)) = message.get_mut("params")
        && let Some(Value::Object(payload)) = params.get_mut("payload")
    {
        apply_defaults(payload);
    }

    Ok(Value::Object(message))
}

/// Classify a normalized message; only requests are accepted
pub fn into_request(value: Value) -> Result<JsonRpcRequest, GatewayError> {
    match JsonRpcMessage::from_value(value) {
        Ok(JsonRpcMessage::Request(request)) => Ok(request),
        Ok(other) => Err(GatewayError::UnsupportedMessageType(other.kind().to_string())),
        Err(MessageError::Invalid { kind: "request", source }) => {
            Err(GatewayError::malformed(format!("invalid JSON-RPC request: {}", source)))
        }
        Err(MessageError::Invalid { kind, .. }) => Err(GatewayError::UnsupportedMessageType(kind.to_string())),
        Err(MessageError::NotAnObject) => Err(GatewayError::malformed("body is not a JSON object")),
        Err(MessageError::Unrecognized(_)) => {
            Err(GatewayError::UnsupportedMessageType("unrecognized message".to_string()))
        }
    }
}

fn apply_defaults(message: &mut Map<String, Value>) {
    if !message.contains_key("jsonrpc") {
        message.insert("jsonrpc".to_string(), Value::from(JSONRPC_VERSION));
    }
    // `"id": null` cannot correlate anything, treat it as absent
    if message.get("id").is_none_or(Value::is_null) {
        let id = match RequestId::generate() {
            RequestId::String(id) => Value::String(id),
            RequestId::Number(id) => Value::from(id),
        };
        message.insert("id".to_string(), id);
    }
}
