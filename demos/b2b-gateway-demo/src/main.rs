//! # B2B Gateway Demo
//!
//! Runs the gateway against in-memory stores and one simulated edge that
//! accepts grid connection schedules.
//!
//! ## Usage
//! ```bash
//! cargo run --package b2b-gateway-demo -- --port 8075
//! ```
//!
//! ## Equivalent Curl Commands
//!
//! **Edge status:**
//! ```bash
//! curl -u operator:operator http://127.0.0.1:8075/jsonrpc \
//!   -d '{"method":"getEdgesStatus","params":{}}'
//! ```
//!
//! **Channel values:**
//! ```bash
//! curl -u operator:operator http://127.0.0.1:8075/jsonrpc \
//!   -d '{"method":"getEdgesChannelsValues","params":{"ids":["edge0","edge1"],"channels":["_sum/EssSoc","_sum/GridActivePower"]}}'
//! ```
//!
//! **Set schedule (admin on edge0 only):**
//! ```bash
//! curl -u operator:operator http://127.0.0.1:8075/jsonrpc \
//!   -d '{"method":"setGridConnSchedule","params":{"id":"edge0","schedule":[{"startTimestamp":1700000000,"duration":900,"activePowerSetPoint":-2500}]}}'
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use b2b_gateway::{
    ChannelAddress, ChannelEdgeTransport, ComponentJsonApiRequest, Edge, EdgeConnection, GatewayServer,
    InMemoryEdgeMetadata, InMemoryIdentityStore, InMemoryTimeData, JsonRpcResponse, Principal, Role,
};
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8075")]
    port: u16,

    /// JSON-RPC path segment
    #[arg(long, default_value = "jsonrpc")]
    path: String,

    /// Seconds to wait for an edge reply
    #[arg(long, default_value = "30")]
    forward_timeout: u64,

    /// Component receiving forwarded schedules
    #[arg(long, default_value = b2b_gateway::DEFAULT_SCHEDULE_COMPONENT_ID)]
    schedule_component: String,

    /// Disable CORS headers
    #[arg(long, default_value = "false")]
    no_cors: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "b2b_gateway_demo=info,b2b_gateway=debug,b2b_json_rpc=debug".into()),
        )
        .init();

    let identity = InMemoryIdentityStore::new();
    identity.add_user(
        "operator",
        "operator",
        Principal::new(
            "operator",
            "Grid Operator",
            HashMap::from([
                ("edge0".to_string(), Role::Admin),
                ("edge1".to_string(), Role::Owner),
            ]),
        ),
    );
    identity.add_user(
        "guest",
        "guest",
        Principal::new("guest", "Guest", HashMap::from([("edge1".to_string(), Role::Guest)])),
    );

    let metadata = InMemoryEdgeMetadata::with_edges([
        Edge::new("edge0", true),
        Edge::new("edge1", false),
        Edge::new("edge2", true),
    ]);

    let timedata = InMemoryTimeData::new();
    timedata.set_value("edge0", ChannelAddress::new("_sum", "EssSoc"), json!(64));
    timedata.set_value("edge0", ChannelAddress::new("_sum", "GridActivePower"), json!(-1830));
    timedata.set_value("edge1", ChannelAddress::new("_sum", "EssSoc"), json!(12));

    let transport = Arc::new(ChannelEdgeTransport::new(32));
    tokio::spawn(simulate_edge(transport.connect("edge0")));

    let bind_address = SocketAddr::from(([127, 0, 0, 1], args.port));
    let server = GatewayServer::builder()
        .bind_address(bind_address)
        .jsonrpc_path(args.path)
        .cors(!args.no_cors)
        .forward_timeout(Duration::from_secs(args.forward_timeout))
        .schedule_component_id(args.schedule_component)
        .identity_store(Arc::new(identity))
        .edge_metadata(Arc::new(metadata))
        .time_data(Arc::new(timedata))
        .edge_transport(transport)
        .build()
        .context("Failed to build gateway")?;

    info!("Users: operator/operator (admin on edge0), guest/guest (guest on edge1)");
    server.run().await.context("Gateway stopped")?;
    Ok(())
}

/// Answers forwarded schedules the way a balancing controller would: accept
/// and echo what was stored.
async fn simulate_edge(mut edge: EdgeConnection) {
    info!("Simulated edge [{}] online", edge.edge_id());
    while let Some(call) = edge.next_call().await {
        let reply = match ComponentJsonApiRequest::from_request(&call.request) {
            Ok(envelope) => {
                let schedule = envelope
                    .payload
                    .get_param("schedule")
                    .cloned()
                    .unwrap_or_default();
                info!(
                    "Edge [{}] component [{}] stores schedule from {}: {}",
                    call.edge_id, envelope.component_id, call.user.name, schedule
                );
                json!({"componentId": envelope.component_id, "schedule": schedule})
            }
            Err(err) => {
                warn!("Edge [{}] ignoring call: {}", call.edge_id, err);
                continue;
            }
        };
        // Let the gateway see a bit of edge latency
        tokio::time::sleep(Duration::from_millis(50)).await;
        edge.reply(JsonRpcResponse::success(call.request.id, reply));
    }
    info!("Simulated edge [{}] offline", edge.edge_id());
}
