//! Gateway HTTP server
//!
//! The builder takes every collaborator by `Arc`; nothing is looked up from
//! global state.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::auth::CredentialVerifier;
use crate::backend::{EdgeMetadata, IdentityStore, TimeData};
use crate::config::GatewayConfig;
use crate::correlator::ResponseCorrelator;
use crate::forward::EdgeForwarder;
use crate::handler::GatewayHttpHandler;
use crate::methods::gateway_dispatcher;
use crate::transport::EdgeTransport;
use crate::{Result, ServerError};

/// Builder for the gateway server
#[derive(Default)]
pub struct GatewayServerBuilder {
    config: GatewayConfig,
    identity: Option<Arc<dyn IdentityStore>>,
    metadata: Option<Arc<dyn EdgeMetadata>>,
    timedata: Option<Arc<dyn TimeData>>,
    transport: Option<Arc<dyn EdgeTransport>>,
}

impl GatewayServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the JSON-RPC path segment
    pub fn jsonrpc_path(mut self, path: impl Into<String>) -> Self {
        self.config.jsonrpc_path = path.into();
        self
    }

    /// Enable or disable CORS
    pub fn cors(mut self, enable: bool) -> Self {
        self.config.enable_cors = enable;
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    pub fn forward_timeout(mut self, timeout: Duration) -> Self {
        self.config.forward_timeout = timeout;
        self
    }

    pub fn schedule_component_id(mut self, component_id: impl Into<String>) -> Self {
        self.config.schedule_component_id = component_id.into();
        self
    }

    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.config.realm = realm.into();
        self
    }

    pub fn identity_store(mut self, identity: Arc<dyn IdentityStore>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn edge_metadata(mut self, metadata: Arc<dyn EdgeMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn time_data(mut self, timedata: Arc<dyn TimeData>) -> Self {
        self.timedata = Some(timedata);
        self
    }

    pub fn edge_transport(mut self, transport: Arc<dyn EdgeTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the server. Every collaborator must have been provided.
    pub fn build(self) -> Result<GatewayServer> {
        let identity = self.identity.ok_or(ServerError::MissingCollaborator("identity store"))?;
        let metadata = self.metadata.ok_or(ServerError::MissingCollaborator("edge metadata"))?;
        let timedata = self.timedata.ok_or(ServerError::MissingCollaborator("time data"))?;
        let transport = self.transport.ok_or(ServerError::MissingCollaborator("edge transport"))?;

        let correlator = ResponseCorrelator::new(self.config.forward_timeout);
        let forwarder = EdgeForwarder::new(transport, correlator);
        let dispatcher = gateway_dispatcher(
            metadata,
            timedata,
            forwarder,
            self.config.schedule_component_id.clone(),
        );

        let config = Arc::new(self.config);
        let handler = GatewayHttpHandler::new(
            Arc::clone(&config),
            CredentialVerifier::new(identity),
            Arc::new(dispatcher),
            correlator,
        );

        Ok(GatewayServer { config, handler })
    }
}

/// JSON-RPC over HTTP gateway
#[derive(Clone)]
pub struct GatewayServer {
    config: Arc<GatewayConfig>,
    handler: GatewayHttpHandler,
}

impl GatewayServer {
    pub fn builder() -> GatewayServerBuilder {
        GatewayServerBuilder::new()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The request handler, for embedding into another hyper service
    pub fn handler(&self) -> &GatewayHttpHandler {
        &self.handler
    }

    /// Bind the configured address and serve until the process ends
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address).await?;
        self.serve(listener, std::future::pending()).await
    }

    /// Serve connections from `listener` until `shutdown` resolves.
    /// Connections already accepted finish on their own tasks.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let local_addr = listener.local_addr()?;
        info!("B2B gateway listening on {}", local_addr);
        info!(
            "JSON-RPC endpoint available at: /{}",
            self.config.jsonrpc_path.trim_matches('/')
        );
        info!("Methods: {}", self.handler.dispatcher().registered_methods().join(", "));

        tokio::pin!(shutdown);
        loop {
            let (stream, peer_addr) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = &mut shutdown => {
                    info!("B2B gateway on {} shutting down", local_addr);
                    return Ok(());
                }
            };
            debug!("New connection from {}", peer_addr);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| handle_request(req, handler.clone()));

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    if err.is_incomplete_message() {
                        debug!("Client disconnected: {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    handler: GatewayHttpHandler,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    Ok(handler.handle(req).await)
}
