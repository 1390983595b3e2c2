use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use b2b_json_rpc::{JsonRpcHandler, JsonRpcRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{GET_EDGES_STATUS, to_result};
use crate::GatewayError;
use crate::backend::EdgeMetadata;
use crate::principal::Principal;
use crate::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeInfo {
    pub online: bool,
}

/// `getEdgesStatus`: online flag of every existing edge the caller can see
pub struct GetEdgesStatusHandler {
    metadata: Arc<dyn EdgeMetadata>,
}

impl GetEdgesStatusHandler {
    pub fn new(metadata: Arc<dyn EdgeMetadata>) -> Self {
        Self { metadata }
    }

    pub fn edges_status(&self, principal: &Principal) -> BTreeMap<String, EdgeInfo> {
        principal
            .edge_roles()
            .iter()
            .filter(|(_, role)| role.is_at_least(Role::Guest))
            .filter_map(|(edge_id, _)| self.metadata.get_edge(edge_id))
            .map(|edge| (edge.id, EdgeInfo { online: edge.online }))
            .collect()
    }
}

#[async_trait]
impl JsonRpcHandler<Principal> for GetEdgesStatusHandler {
    type Error = GatewayError;

    async fn handle(&self, _request: &JsonRpcRequest, principal: &Principal) -> Result<Value, GatewayError> {
        let status = self.edges_status(principal);
        debug!("{} sees {} edge(s)", principal.id(), status.len());
        to_result(GET_EDGES_STATUS, &status)
    }
}
