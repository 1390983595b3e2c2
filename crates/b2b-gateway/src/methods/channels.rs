use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use b2b_json_rpc::{JsonRpcHandler, JsonRpcRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{GET_EDGES_CHANNELS_VALUES, to_result};
use crate::GatewayError;
use crate::backend::TimeData;
use crate::channel::ChannelAddress;
use crate::principal::Principal;
use crate::role::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetEdgesChannelsValuesRequest {
    pub ids: BTreeSet<String>,
    pub channels: BTreeSet<ChannelAddress>,
}

/// `getEdgesChannelsValues`: latest value of each requested channel on each
/// requested edge. Edges the caller has no role on are left out; a channel
/// without a value is reported as `null`.
pub struct GetEdgesChannelsValuesHandler {
    timedata: Arc<dyn TimeData>,
}

impl GetEdgesChannelsValuesHandler {
    pub fn new(timedata: Arc<dyn TimeData>) -> Self {
        Self { timedata }
    }

    pub fn channel_values(
        &self,
        principal: &Principal,
        request: &GetEdgesChannelsValuesRequest,
    ) -> BTreeMap<String, BTreeMap<String, Value>> {
        request
            .ids
            .iter()
            .filter(|edge_id| principal.edge_role_is_at_least(edge_id, Role::Guest))
            .map(|edge_id| {
                let values = request
                    .channels
                    .iter()
                    .map(|channel| {
                        let value = self
                            .timedata
                            .get_channel_value(edge_id, channel)
                            .unwrap_or(Value::Null);
                        (channel.to_string(), value)
                    })
                    .collect();
                (edge_id.clone(), values)
            })
            .collect()
    }
}

#[async_trait]
impl JsonRpcHandler<Principal> for GetEdgesChannelsValuesHandler {
    type Error = GatewayError;

    async fn handle(&self, request: &JsonRpcRequest, principal: &Principal) -> Result<Value, GatewayError> {
        let params: GetEdgesChannelsValuesRequest = request
            .params_as()
            .map_err(|err| GatewayError::invalid_params(&request.method, err.to_string()))?;

        let values = self.channel_values(principal, &params);
        debug!(
            "{} queried {} channel(s) on {} of {} edge(s)",
            principal.id(),
            params.channels.len(),
            values.len(),
            params.ids.len()
        );
        to_result(GET_EDGES_CHANNELS_VALUES, &values)
    }
}
