//! Serves the gateway on an ephemeral port and talks to it over real HTTP,
//! with a simulated edge answering forwarded calls.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use b2b_gateway::{
    COMPONENT_JSON_API_METHOD, ChannelAddress, ChannelEdgeTransport, ComponentJsonApiRequest, Edge,
    GatewayServer, InMemoryEdgeMetadata, InMemoryIdentityStore, InMemoryTimeData, JsonRpcResponse,
    Principal, Role,
};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct Running {
    base: String,
    transport: Arc<ChannelEdgeTransport>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for Running {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn start() -> Running {
    let identity = InMemoryIdentityStore::new();
    identity.add_user(
        "operator",
        "pw",
        Principal::new(
            "operator",
            "Grid Operator",
            HashMap::from([
                ("edge0".to_string(), Role::Admin),
                ("edge1".to_string(), Role::Guest),
            ]),
        ),
    );

    let timedata = InMemoryTimeData::new();
    timedata.set_value("edge0", ChannelAddress::new("_sum", "GridActivePower"), json!(420));

    let transport = Arc::new(ChannelEdgeTransport::new(16));
    let server = GatewayServer::builder()
        .identity_store(Arc::new(identity))
        .edge_metadata(Arc::new(InMemoryEdgeMetadata::with_edges([
            Edge::new("edge0", true),
            Edge::new("edge1", false),
        ])))
        .time_data(Arc::new(timedata))
        .edge_transport(transport.clone())
        .forward_timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        server
            .serve(listener, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    Running {
        base: format!("http://{addr}"),
        transport,
        shutdown: Some(shutdown),
    }
}

async fn call(running: &Running, body: Value) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/jsonrpc", running.base))
        .basic_auth("operator", Some("pw"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_status_and_channels_over_http() {
    let running = start().await;

    let (status, body) = call(&running, json!({"method": "getEdgesStatus"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["result"],
        json!({"edge0": {"online": true}, "edge1": {"online": false}})
    );

    let (status, body) = call(
        &running,
        json!({
            "id": 1,
            "method": "getEdgesChannelsValues",
            "params": {"ids": ["edge0", "edge1", "edge2"], "channels": ["_sum/GridActivePower"]}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(
        body["result"],
        json!({
            "edge0": {"_sum/GridActivePower": 420},
            "edge1": {"_sum/GridActivePower": null}
        })
    );
}

#[tokio::test]
async fn test_schedule_round_trip_through_simulated_edge() {
    let running = start().await;
    let mut edge = running.transport.connect("edge0");

    tokio::spawn(async move {
        while let Some(call) = edge.next_call().await {
            assert_eq!(call.request.method, COMPONENT_JSON_API_METHOD);
            let envelope = ComponentJsonApiRequest::from_request(&call.request).unwrap();
            let periods = envelope.payload.params_as::<Value>().unwrap()["schedule"]
                .as_array()
                .map(Vec::len)
                .unwrap_or_default();
            edge.reply(JsonRpcResponse::success(
                call.request.id,
                json!({"componentId": envelope.component_id, "periods": periods}),
            ));
        }
    });

    let (status, body) = call(
        &running,
        json!({
            "id": "grid-1",
            "method": "setGridConnSchedule",
            "params": {
                "id": "edge0",
                "schedule": [
                    {"startTimestamp": 1700000000, "duration": 900, "activePowerSetPoint": 0},
                    {"startTimestamp": 1700000900, "duration": 900, "activePowerSetPoint": -3000}
                ]
            }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jsonrpc"], "2.0");
    assert_eq!(body["id"], "grid-1");
    // The edge's own response object, under the id the gateway forwarded with
    let edge_response = &body["result"];
    assert_eq!(edge_response["jsonrpc"], "2.0");
    assert!(edge_response["id"].is_string());
    assert_ne!(edge_response["id"], "grid-1");
    assert_eq!(
        edge_response["result"],
        json!({"componentId": "ctrlBalancingSchedule0", "periods": 2})
    );
    assert_eq!(running.transport.pending_count(), 0);
}

#[tokio::test]
async fn test_disconnected_edge_is_bad_gateway() {
    let running = start().await;

    let (status, body) = call(
        &running,
        json!({"id": 2, "method": "setGridConnSchedule", "params": {"id": "edge0", "schedule": []}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["id"], 2);
    assert_eq!(body["error"]["code"], -32003);
}

#[tokio::test]
async fn test_unknown_method_then_more_requests() {
    let running = start().await;

    let (status, body) = call(&running, json!({"id": "x", "method": "foo.bar"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Unhandled JSON-RPC method [foo.bar]");

    let (status, _) = call(&running, json!({"method": "getEdgesStatus"})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unauthenticated_request_is_rejected() {
    let running = start().await;

    let response = reqwest::Client::new()
        .post(format!("{}/jsonrpc", running.base))
        .json(&json!({"method": "getEdgesStatus"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("www-authenticate"));
}
