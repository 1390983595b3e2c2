use async_trait::async_trait;
use b2b_json_rpc::{JsonRpcHandler, JsonRpcRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::GatewayError;
use crate::forward::{ComponentJsonApiRequest, EdgeForwarder};
use crate::principal::Principal;
use crate::role::Role;

/// One period of the grid connection schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConnSchedule {
    /// Epoch seconds
    pub start_timestamp: i64,
    /// Seconds
    pub duration: i64,
    /// Watts at the grid connection point
    pub active_power_set_point: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetGridConnScheduleRequest {
    #[serde(rename = "id")]
    pub edge_id: String,
    pub schedule: Vec<GridConnSchedule>,
}

/// `setGridConnSchedule`: admin only, forwarded to the schedule controller
/// on the edge.
pub struct SetGridConnScheduleHandler {
    forwarder: EdgeForwarder,
    component_id: String,
}

impl SetGridConnScheduleHandler {
    pub fn new(forwarder: EdgeForwarder, component_id: impl Into<String>) -> Self {
        Self {
            forwarder,
            component_id: component_id.into(),
        }
    }
}

#[async_trait]
impl JsonRpcHandler<Principal> for SetGridConnScheduleHandler {
    type Error = GatewayError;

    async fn handle(&self, request: &JsonRpcRequest, principal: &Principal) -> Result<Value, GatewayError> {
        let params: SetGridConnScheduleRequest = request
            .params_as()
            .map_err(|err| GatewayError::invalid_params(&request.method, err.to_string()))?;

        let user = principal.assert_edge_role_is_at_least(&request.method, &params.edge_id, Role::Admin)?;

        info!(
            "{} sets {} schedule period(s) on edge [{}]",
            user.id,
            params.schedule.len(),
            params.edge_id
        );
        let envelope = ComponentJsonApiRequest::new(self.component_id.clone(), request.clone());
        let response = self.forwarder.forward(&params.edge_id, &user, envelope).await?;
        // The caller receives the edge's whole response object as its result
        Ok(response.to_value())
    }
}
