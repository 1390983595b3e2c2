//! JSON-RPC methods served by the gateway
//!
//! Status and telemetry are answered from local collaborators; the schedule
//! command is forwarded into a controller component on the edge.

mod channels;
mod schedule;
mod status;

use std::sync::Arc;

use b2b_json_rpc::JsonRpcDispatcher;
use serde::Serialize;
use serde_json::Value;

pub use channels::{GetEdgesChannelsValuesHandler, GetEdgesChannelsValuesRequest};
pub use schedule::{GridConnSchedule, SetGridConnScheduleHandler, SetGridConnScheduleRequest};
pub use status::{EdgeInfo, GetEdgesStatusHandler};

use crate::GatewayError;
use crate::backend::{EdgeMetadata, TimeData};
use crate::forward::EdgeForwarder;
use crate::principal::Principal;

pub const GET_EDGES_STATUS: &str = "getEdgesStatus";
pub const GET_EDGES_CHANNELS_VALUES: &str = "getEdgesChannelsValues";
pub const SET_GRID_CONN_SCHEDULE: &str = "setGridConnSchedule";

/// The method registry with all three gateway methods installed
pub fn gateway_dispatcher(
    metadata: Arc<dyn EdgeMetadata>,
    timedata: Arc<dyn TimeData>,
    forwarder: EdgeForwarder,
    schedule_component_id: impl Into<String>,
) -> JsonRpcDispatcher<Principal, GatewayError> {
    let mut dispatcher = JsonRpcDispatcher::new();
    dispatcher.register_method(GET_EDGES_STATUS, GetEdgesStatusHandler::new(metadata));
    dispatcher.register_method(
        GET_EDGES_CHANNELS_VALUES,
        GetEdgesChannelsValuesHandler::new(timedata),
    );
    dispatcher.register_method(
        SET_GRID_CONN_SCHEDULE,
        SetGridConnScheduleHandler::new(forwarder, schedule_component_id),
    );
    dispatcher
}

fn to_result<T: Serialize>(method: &str, result: &T) -> Result<Value, GatewayError> {
    serde_json::to_value(result)
        .map_err(|err| GatewayError::internal(format!("unable to encode {} result: {}", method, err)))
}
