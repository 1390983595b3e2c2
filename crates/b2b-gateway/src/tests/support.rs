//! Shared fixtures: seeded in-memory collaborators and spy transports

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use b2b_json_rpc::{JsonRpcError, JsonRpcErrorObject, JsonRpcReply, JsonRpcRequest, JsonRpcResponse};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request, Response};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use crate::backend::{Edge, InMemoryEdgeMetadata, InMemoryIdentityStore, InMemoryTimeData};
use crate::channel::ChannelAddress;
use crate::config::GatewayConfig;
use crate::handler::GatewayHttpHandler;
use crate::principal::{EdgeUser, Principal};
use crate::role::Role;
use crate::server::GatewayServer;
use crate::transport::{EdgeTransport, OutboundCall, PendingReply, TransportError};

/// How the spy answers forwarded calls
#[derive(Debug, Clone)]
pub enum SpyBehaviour {
    Reply(Value),
    Reject(i64, String),
    Silent,
    /// `send` itself never completes, like an edge whose queue is full
    Stall,
}

/// Records every forwarded call and answers immediately (or never)
pub struct SpyTransport {
    calls: AtomicUsize,
    recorded: Mutex<Vec<OutboundCall>>,
    behaviour: SpyBehaviour,
    // Keeps silent calls pending until the spy is dropped
    held: Mutex<Vec<oneshot::Sender<JsonRpcReply>>>,
}

impl SpyTransport {
    pub fn new(behaviour: SpyBehaviour) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
            behaviour,
            held: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<OutboundCall> {
        self.recorded.lock().clone()
    }
}

#[async_trait]
impl EdgeTransport for SpyTransport {
    fn backend_name(&self) -> &'static str {
        "Spy"
    }

    async fn send(
        &self,
        edge_id: &str,
        user: &EdgeUser,
        request: JsonRpcRequest,
    ) -> Result<PendingReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = request.id.clone();
        self.recorded.lock().push(OutboundCall {
            edge_id: edge_id.to_string(),
            user: user.clone(),
            request,
        });

        if matches!(self.behaviour, SpyBehaviour::Stall) {
            return std::future::pending().await;
        }

        let (tx, rx) = oneshot::channel();
        match &self.behaviour {
            SpyBehaviour::Reply(result) => {
                let _ = tx.send(JsonRpcResponse::success(id.clone(), result.clone()).into());
            }
            SpyBehaviour::Reject(code, message) => {
                let error = JsonRpcErrorObject::server_error(*code, message, None);
                let _ = tx.send(JsonRpcError::new(Some(id.clone()), error).into());
            }
            SpyBehaviour::Silent => self.held.lock().push(tx),
            SpyBehaviour::Stall => unreachable!(),
        }
        Ok(PendingReply::new(id, rx))
    }
}

/// Owner of edgeA, guest on edgeB
pub fn alice() -> Principal {
    Principal::new(
        "alice",
        "Alice",
        HashMap::from([
            ("edgeA".to_string(), Role::Owner),
            ("edgeB".to_string(), Role::Guest),
        ]),
    )
}

/// Admin of edgeX, installer on edgeA
pub fn carol() -> Principal {
    Principal::new(
        "carol",
        "Carol",
        HashMap::from([
            ("edgeX".to_string(), Role::Admin),
            ("edgeA".to_string(), Role::Installer),
        ]),
    )
}

pub fn metadata() -> InMemoryEdgeMetadata {
    InMemoryEdgeMetadata::with_edges([
        Edge::new("edgeA", true),
        Edge::new("edgeB", false),
        Edge::new("edgeC", true),
        Edge::new("edgeX", true),
    ])
}

pub fn timedata() -> InMemoryTimeData {
    let timedata = InMemoryTimeData::new();
    timedata.set_value("edgeA", ChannelAddress::new("ess0", "Soc"), json!(71));
    timedata.set_value("edgeA", ChannelAddress::new("meter0", "ActivePower"), json!(-1200));
    timedata.set_value("edgeB", ChannelAddress::new("ess0", "Soc"), json!(33));
    timedata.set_value("edgeC", ChannelAddress::new("ess0", "Soc"), json!(99));
    timedata
}

pub struct Fixture {
    pub transport: Arc<SpyTransport>,
    pub handler: GatewayHttpHandler,
}

pub fn fixture(behaviour: SpyBehaviour) -> Fixture {
    fixture_with_config(GatewayConfig::default(), behaviour)
}

pub fn fixture_with_config(config: GatewayConfig, behaviour: SpyBehaviour) -> Fixture {
    let identity = InMemoryIdentityStore::new();
    identity.add_user("alice", "secret", alice());
    identity.add_user("carol", "hunter2", carol());

    let transport = Arc::new(SpyTransport::new(behaviour));
    let server = GatewayServer::builder()
        .config(config)
        .identity_store(Arc::new(identity))
        .edge_metadata(Arc::new(metadata()))
        .time_data(Arc::new(timedata()))
        .edge_transport(transport.clone())
        .build()
        .unwrap();

    Fixture {
        transport,
        handler: server.handler().clone(),
    }
}

pub fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

pub fn request(method: Method, path: &str, auth: Option<&str>, body: impl Into<Bytes>) -> Request<Full<Bytes>> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(AUTHORIZATION, auth);
    }
    builder.body(Full::new(body.into())).unwrap()
}

pub fn post_json(auth: Option<&str>, body: Value) -> Request<Full<Bytes>> {
    request(Method::POST, "/jsonrpc", auth, body.to_string())
}

pub async fn body_bytes(response: Response<Full<Bytes>>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Full<Bytes>>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Full<Bytes>>) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
}
