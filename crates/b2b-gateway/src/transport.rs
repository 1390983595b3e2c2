//! Transport to edges and correlation of their asynchronous replies.
//!
//! A forwarded call resolves through a one-shot channel: the transport hands
//! back a [`PendingReply`] when the call leaves, and whoever receives the
//! edge's answer completes it exactly once. [`PendingCorrelations`] is the
//! bookkeeping a transport can use for that; [`ChannelEdgeTransport`] is an
//! in-process transport built on it.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use b2b_json_rpc::{JsonRpcReply, JsonRpcRequest, JsonRpcResponse, RequestId};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::principal::EdgeUser;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("Edge [{0}] is not connected")]
    NotConnected(String),

    #[error("Connection to edge [{0}] closed")]
    Disconnected(String),

    #[error("Reply channel closed before the edge answered")]
    ReplyDropped,

    #[error("Edge rejected the request ({code}): {message}")]
    Rejected {
        code: i64,
        message: String,
        data: Option<Value>,
    },
}

/// Delivers requests to edges
#[async_trait]
pub trait EdgeTransport: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Send `request` to `edge_id` on behalf of `user`. Resolution of the
    /// returned handle is driven by the edge's reply.
    async fn send(
        &self,
        edge_id: &str,
        user: &EdgeUser,
        request: JsonRpcRequest,
    ) -> Result<PendingReply, TransportError>;
}

type Waiters = Mutex<HashMap<RequestId, oneshot::Sender<JsonRpcReply>>>;

/// The eventual reply to one forwarded call.
///
/// Dropping it (timeout, caller gone) unregisters the correlation, so a late
/// reply is discarded.
#[derive(Debug)]
pub struct PendingReply {
    id: RequestId,
    receiver: oneshot::Receiver<JsonRpcReply>,
    _registration: Option<Registration>,
}

impl PendingReply {
    /// Wrap a bare receiver, for transports doing their own bookkeeping
    pub fn new(id: RequestId, receiver: oneshot::Receiver<JsonRpcReply>) -> Self {
        Self {
            id,
            receiver,
            _registration: None,
        }
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Wait for the reply. An error reply from the edge is a `Rejected` failure.
    pub async fn recv(self) -> Result<JsonRpcResponse, TransportError> {
        match self.receiver.await {
            Ok(JsonRpcReply::Response(response)) => Ok(response),
            Ok(JsonRpcReply::Error(error)) => Err(TransportError::Rejected {
                code: error.error.code,
                message: error.error.message,
                data: error.error.data,
            }),
            Err(_) => Err(TransportError::ReplyDropped),
        }
    }
}

#[derive(Debug)]
struct Registration {
    id: RequestId,
    waiters: Weak<Waiters>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(waiters) = self.waiters.upgrade()
            && waiters.lock().remove(&self.id).is_some()
        {
            debug!("Dropped pending correlation {}", self.id);
        }
    }
}

/// Outstanding forwarded calls keyed by the envelope's request id
#[derive(Debug, Clone, Default)]
pub struct PendingCorrelations {
    waiters: Arc<Waiters>,
}

impl PendingCorrelations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start waiting for the reply to `id`. Re-registering an id replaces the
    /// earlier waiter, whose `PendingReply` then fails with `ReplyDropped`.
    pub fn register(&self, id: RequestId) -> PendingReply {
        let (sender, receiver) = oneshot::channel();
        if self.waiters.lock().insert(id.clone(), sender).is_some() {
            warn!("Replaced pending correlation for duplicate id {}", id);
        }
        PendingReply {
            id: id.clone(),
            receiver,
            _registration: Some(Registration {
                id,
                waiters: Arc::downgrade(&self.waiters),
            }),
        }
    }

    /// Resolve the waiter matching the reply's id. Returns false when nobody
    /// is waiting any more (unknown id, already completed, caller gone).
    pub fn complete(&self, reply: JsonRpcReply) -> bool {
        let Some(id) = reply.id().cloned() else {
            warn!("Discarding edge reply without id");
            return false;
        };
        let Some(sender) = self.waiters.lock().remove(&id) else {
            debug!("Discarding reply for unknown or completed correlation {}", id);
            return false;
        };
        if sender.send(reply).is_err() {
            debug!("Caller for correlation {} went away, reply discarded", id);
            return false;
        }
        true
    }

    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.lock().is_empty()
    }
}

/// A request on its way to an edge
#[derive(Debug, Clone)]
pub struct OutboundCall {
    pub edge_id: String,
    pub user: EdgeUser,
    pub request: JsonRpcRequest,
}

/// In-process transport: each connected edge gets an `mpsc` queue of
/// [`OutboundCall`]s and answers through its [`EdgeConnection`].
#[derive(Debug)]
pub struct ChannelEdgeTransport {
    connections: RwLock<HashMap<String, mpsc::Sender<OutboundCall>>>,
    correlations: PendingCorrelations,
    queue_depth: usize,
}

impl ChannelEdgeTransport {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            correlations: PendingCorrelations::new(),
            queue_depth: queue_depth.max(1),
        }
    }

    /// Attach an edge, replacing any earlier connection for the same id
    pub fn connect(&self, edge_id: impl Into<String>) -> EdgeConnection {
        let edge_id = edge_id.into();
        let (sender, receiver) = mpsc::channel(self.queue_depth);
        self.connections.write().insert(edge_id.clone(), sender);
        info!("Edge [{}] connected", edge_id);
        EdgeConnection {
            edge_id,
            receiver,
            correlations: self.correlations.clone(),
        }
    }

    pub fn disconnect(&self, edge_id: &str) -> bool {
        let removed = self.connections.write().remove(edge_id).is_some();
        if removed {
            info!("Edge [{}] disconnected", edge_id);
        }
        removed
    }

    pub fn is_connected(&self, edge_id: &str) -> bool {
        self.connections
            .read()
            .get(edge_id)
            .is_some_and(|sender| !sender.is_closed())
    }

    pub fn pending_count(&self) -> usize {
        self.correlations.len()
    }
}

#[async_trait]
impl EdgeTransport for ChannelEdgeTransport {
    fn backend_name(&self) -> &'static str {
        "Channel"
    }

    async fn send(
        &self,
        edge_id: &str,
        user: &EdgeUser,
        request: JsonRpcRequest,
    ) -> Result<PendingReply, TransportError> {
        let sender = self
            .connections
            .read()
            .get(edge_id)
            .cloned()
            .ok_or_else(|| TransportError::NotConnected(edge_id.to_string()))?;

        // Register before sending so a fast reply always finds its waiter
        let pending = self.correlations.register(request.id.clone());
        let call = OutboundCall {
            edge_id: edge_id.to_string(),
            user: user.clone(),
            request,
        };
        sender
            .send(call)
            .await
            .map_err(|_| TransportError::Disconnected(edge_id.to_string()))?;
        debug!("Forwarded {} to edge [{}]", pending.id(), edge_id);
        Ok(pending)
    }
}

/// Edge side of a [`ChannelEdgeTransport`] connection
#[derive(Debug)]
pub struct EdgeConnection {
    edge_id: String,
    receiver: mpsc::Receiver<OutboundCall>,
    correlations: PendingCorrelations,
}

impl EdgeConnection {
    pub fn edge_id(&self) -> &str {
        &self.edge_id
    }

    /// Next forwarded call, or `None` once the transport dropped this edge
    pub async fn next_call(&mut self) -> Option<OutboundCall> {
        self.receiver.recv().await
    }

    /// Deliver the edge's answer. A second reply for the same id is ignored.
    pub fn reply(&self, reply: impl Into<JsonRpcReply>) -> bool {
        self.correlations.complete(reply.into())
    }
}
