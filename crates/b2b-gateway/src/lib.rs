//! # B2B Edge Gateway
//!
//! JSON-RPC over HTTP gateway letting authenticated business clients query
//! and command a fleet of remote energy-management devices ("edges").
//!
//! ## Request flow
//! HTTP request → [`CredentialVerifier`] → [`normalize`] →
//! [`JsonRpcDispatcher`] → local handler or [`EdgeForwarder`] →
//! [`ResponseCorrelator`] → HTTP reply.
//!
//! ## Methods
//! - `getEdgesStatus`: online flag of every edge the caller can see
//! - `getEdgesChannelsValues`: latest channel values, `null` when unknown
//! - `setGridConnSchedule`: admin only, forwarded to the edge's schedule controller
//!
//! Identity, edge metadata, telemetry and the transport to edges are
//! collaborators behind traits; in-memory implementations ship with the crate.

pub mod auth;
pub mod backend;
pub mod channel;
pub mod config;
pub mod correlator;
pub mod cors;
pub mod error;
pub mod forward;
pub mod handler;
pub mod methods;
pub mod normalize;
pub mod principal;
pub mod role;
pub mod server;
pub mod transport;

#[cfg(test)]
mod tests;

// Re-export main types
pub use auth::{BasicCredentials, CredentialVerifier};
pub use backend::{
    Edge, EdgeMetadata, IdentityError, IdentityStore, InMemoryEdgeMetadata, InMemoryIdentityStore,
    InMemoryTimeData, TimeData,
};
pub use channel::{ChannelAddress, InvalidChannelAddress};
pub use config::{DEFAULT_SCHEDULE_COMPONENT_ID, GatewayConfig};
pub use correlator::ResponseCorrelator;
pub use cors::CorsLayer;
pub use error::GatewayError;
pub use forward::{COMPONENT_JSON_API_METHOD, ComponentJsonApiRequest, EdgeForwarder};
pub use handler::GatewayHttpHandler;
pub use principal::{EdgeUser, Principal};
pub use role::Role;
pub use server::{GatewayServer, GatewayServerBuilder};
pub use transport::{
    ChannelEdgeTransport, EdgeConnection, EdgeTransport, OutboundCall, PendingCorrelations,
    PendingReply, TransportError,
};

// Re-export foundational types
pub use b2b_json_rpc::{JsonRpcDispatcher, JsonRpcHandler, JsonRpcRequest, JsonRpcResponse, RequestId};

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server setup and runtime errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),
}
