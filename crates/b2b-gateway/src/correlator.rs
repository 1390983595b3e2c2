//! Turns a dispatched operation into the single reply owed to the caller.

use std::time::Duration;

use b2b_json_rpc::{JsonRpcResponse, RequestId, ResponseFuture};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::GatewayError;
use crate::transport::{PendingReply, TransportError};

#[derive(Debug, Clone, Copy)]
pub struct ResponseCorrelator {
    timeout: Duration,
}

impl ResponseCorrelator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for an edge's reply to a forwarded call.
    ///
    /// The task suspends without holding a worker. On expiry the pending reply
    /// is dropped, which unregisters it; a reply arriving later is discarded.
    pub async fn await_reply(
        &self,
        edge_id: &str,
        pending: PendingReply,
    ) -> Result<JsonRpcResponse, GatewayError> {
        self.exchange(edge_id, async move { Ok(pending) }).await
    }

    /// Hand a call to the transport and wait for its reply under one deadline.
    ///
    /// A transport that is still accepting the call when the deadline passes
    /// is treated like an edge that never answered.
    pub async fn exchange<F>(&self, edge_id: &str, send: F) -> Result<JsonRpcResponse, GatewayError>
    where
        F: Future<Output = Result<PendingReply, TransportError>>,
    {
        let exchange = async {
            let pending = send.await?;
            let id = pending.id().clone();
            let result = pending.recv().await;
            match &result {
                Ok(_) => debug!("Edge [{}] answered {}", edge_id, id),
                Err(err) => warn!("Forwarded call {} to edge [{}] failed: {}", id, edge_id, err),
            }
            result
        };

        match timeout(self.timeout, exchange).await {
            Ok(result) => result.map_err(GatewayError::from),
            Err(_) => {
                warn!("Edge [{}] did not answer within {:?}", edge_id, self.timeout);
                Err(GatewayError::GatewayTimeout {
                    edge_id: edge_id.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }

    /// Resolve a dispatcher handle and make sure it answers `request_id`
    pub async fn resolve(
        &self,
        request_id: &RequestId,
        handle: ResponseFuture<GatewayError>,
    ) -> Result<JsonRpcResponse, GatewayError> {
        let response = handle.await?;
        if &response.id != request_id {
            return Err(GatewayError::internal(format!(
                "response id {} does not match request id {}",
                response.id, request_id
            )));
        }
        Ok(response)
    }
}
