//! Forwarding of requests into a controller component on an edge.

use std::sync::Arc;

use b2b_json_rpc::{JsonRpcRequest, JsonRpcResponse, RequestId};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use tracing::debug;

use crate::GatewayError;
use crate::correlator::ResponseCorrelator;
use crate::principal::EdgeUser;
use crate::transport::EdgeTransport;

/// Envelope method understood by edges
pub const COMPONENT_JSON_API_METHOD: &str = "componentJsonApi";

/// Addresses an inner request to one component on the edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentJsonApiRequest {
    pub component_id: String,
    pub payload: JsonRpcRequest,
}

impl ComponentJsonApiRequest {
    pub fn new(component_id: impl Into<String>, payload: JsonRpcRequest) -> Self {
        Self {
            component_id: component_id.into(),
            payload,
        }
    }

    /// The envelope as a JSON-RPC request with its own fresh id
    pub fn into_request(self) -> Result<JsonRpcRequest, GatewayError> {
        let payload = serde_json::to_value(&self.payload)
            .map_err(|err| GatewayError::internal(format!("unable to encode payload: {}", err)))?;
        let mut params = Map::new();
        params.insert("componentId".to_string(), self.component_id.into());
        params.insert("payload".to_string(), payload);
        Ok(JsonRpcRequest::with_object_params(
            RequestId::generate(),
            COMPONENT_JSON_API_METHOD,
            params,
        ))
    }

    pub fn from_request(request: &JsonRpcRequest) -> Result<Self, GatewayError> {
        if request.method != COMPONENT_JSON_API_METHOD {
            return Err(GatewayError::invalid_params(
                &request.method,
                format!("expected {}", COMPONENT_JSON_API_METHOD),
            ));
        }
        request
            .params_as()
            .map_err(|err| GatewayError::invalid_params(&request.method, err.to_string()))
    }
}

/// Sends envelopes through the transport and waits for the correlated reply
#[derive(Clone)]
pub struct EdgeForwarder {
    transport: Arc<dyn EdgeTransport>,
    correlator: ResponseCorrelator,
}

impl EdgeForwarder {
    pub fn new(transport: Arc<dyn EdgeTransport>, correlator: ResponseCorrelator) -> Self {
        Self {
            transport,
            correlator,
        }
    }

    /// Forward `envelope` to `edge_id` and return the edge's response to it
    pub async fn forward(
        &self,
        edge_id: &str,
        user: &EdgeUser,
        envelope: ComponentJsonApiRequest,
    ) -> Result<JsonRpcResponse, GatewayError> {
        debug!(
            "Forwarding {} to component [{}] on edge [{}] via {}",
            envelope.payload.method,
            envelope.component_id,
            edge_id,
            self.transport.backend_name()
        );
        let request = envelope.into_request()?;
        self.correlator
            .exchange(edge_id, self.transport.send(edge_id, user, request))
            .await
    }
}
