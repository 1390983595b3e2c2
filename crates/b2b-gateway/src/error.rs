//! Failure taxonomy of the gateway.
//!
//! Every failure is recovered at the HTTP boundary. Transport-layer failures
//! (credentials, body, HTTP method) become a plain-text response; failures
//! raised once a JSON-RPC request exists become a JSON-RPC error object that
//! echoes the request id.

use std::time::Duration;

use b2b_json_rpc::{JsonRpcErrorObject, ToJsonRpcError};
use hyper::StatusCode;
use thiserror::Error;

use crate::role::Role;
use crate::transport::TransportError;

/// Application error codes in the JSON-RPC server range
pub mod error_codes {
    pub const AUTHENTICATION_FAILED: i64 = -32001;
    pub const AUTHORIZATION_DENIED: i64 = -32002;
    pub const TRANSPORT_FAILURE: i64 = -32003;
    pub const GATEWAY_TIMEOUT: i64 = -32004;
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Unable to parse request: {0}")]
    MalformedMessage(String),

    #[error("Only JSON-RPC Request is supported here, got {0}")]
    UnsupportedMessageType(String),

    #[error("Method [{0}] is not supported for JSON-RPC endpoint")]
    UnsupportedHttpMethod(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Unhandled JSON-RPC method [{0}]")]
    UnhandledMethod(String),

    #[error("Invalid params for [{method}]: {message}")]
    InvalidParams { method: String, message: String },

    #[error("User [{user}] needs at least role [{required}] on edge [{edge_id}] for [{resource}]")]
    AuthorizationDenied {
        user: String,
        edge_id: String,
        resource: String,
        required: Role,
    },

    #[error("Edge [{edge_id}] did not reply within {timeout:?}")]
    GatewayTimeout { edge_id: String, timeout: Duration },

    #[error("Transport failure: {0}")]
    TransportFailure(#[from] TransportError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn authentication_failed(reason: impl Into<String>) -> Self {
        Self::AuthenticationFailed(reason.into())
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage(reason.into())
    }

    pub fn invalid_params(method: &str, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            method: method.to_string(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status the failure is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::MalformedMessage(_) => StatusCode::BAD_REQUEST,
            GatewayError::UnsupportedMessageType(_) => StatusCode::BAD_REQUEST,
            GatewayError::UnsupportedHttpMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::UnhandledMethod(_) => StatusCode::NOT_FOUND,
            GatewayError::InvalidParams { .. } => StatusCode::BAD_REQUEST,
            GatewayError::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
            GatewayError::GatewayTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::TransportFailure(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True once a JSON-RPC request has been parsed, i.e. the failure is
    /// reported as a JSON-RPC error object rather than bare text.
    pub fn is_protocol_error(&self) -> bool {
        !matches!(
            self,
            GatewayError::AuthenticationFailed(_)
                | GatewayError::MalformedMessage(_)
                | GatewayError::UnsupportedMessageType(_)
                | GatewayError::UnsupportedHttpMethod(_)
                | GatewayError::PayloadTooLarge { .. }
        )
    }
}

impl ToJsonRpcError for GatewayError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        let message = self.to_string();
        match self {
            GatewayError::UnhandledMethod(method) => JsonRpcErrorObject::method_not_found(method),
            GatewayError::InvalidParams { .. } => JsonRpcErrorObject::invalid_params(&message),
            GatewayError::AuthenticationFailed(_) => {
                JsonRpcErrorObject::server_error(error_codes::AUTHENTICATION_FAILED, &message, None)
            }
            GatewayError::AuthorizationDenied { .. } => {
                JsonRpcErrorObject::server_error(error_codes::AUTHORIZATION_DENIED, &message, None)
            }
            GatewayError::TransportFailure(TransportError::Rejected { code, data, .. }) => {
                JsonRpcErrorObject::server_error(
                    error_codes::TRANSPORT_FAILURE,
                    &message,
                    Some(serde_json::json!({ "edgeCode": code, "edgeData": data })),
                )
            }
            GatewayError::TransportFailure(_) => {
                JsonRpcErrorObject::server_error(error_codes::TRANSPORT_FAILURE, &message, None)
            }
            GatewayError::GatewayTimeout { .. } => {
                JsonRpcErrorObject::server_error(error_codes::GATEWAY_TIMEOUT, &message, None)
            }
            GatewayError::MalformedMessage(_)
            | GatewayError::UnsupportedMessageType(_)
            | GatewayError::UnsupportedHttpMethod(_)
            | GatewayError::PayloadTooLarge { .. }
            | GatewayError::Internal(_) => JsonRpcErrorObject::internal_error(Some(message)),
        }
    }

    fn unhandled_method(method: &str) -> Self {
        GatewayError::UnhandledMethod(method.to_string())
    }
}
