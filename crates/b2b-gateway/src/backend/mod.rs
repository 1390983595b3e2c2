//! Collaborators the gateway reads from but does not own.
//!
//! Identity, edge metadata and telemetry live behind traits so deployments
//! can plug in their own stores:
//! - [`IdentityStore`]: verifies a username/password pair
//! - [`EdgeMetadata`]: which edges exist and whether they are online
//! - [`TimeData`]: latest known value per channel
//!
//! `EdgeMetadata` and `TimeData` are synchronous: local handlers answer
//! within the calling request and never suspend. In-memory backends for
//! development and tests are in [`memory`].

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::channel::ChannelAddress;
use crate::principal::Principal;

pub use memory::{InMemoryEdgeMetadata, InMemoryIdentityStore, InMemoryTimeData};

/// A remote energy-management device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub online: bool,
}

impl Edge {
    pub fn new(id: impl Into<String>, online: bool) -> Self {
        Self {
            id: id.into(),
            online,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("invalid credentials for user [{0}]")]
    InvalidCredentials(String),

    #[error("identity backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Verify a username/password pair and return the caller with its edge roles
    async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, IdentityError>;
}

pub trait EdgeMetadata: Send + Sync {
    fn get_edge(&self, edge_id: &str) -> Option<Edge>;
}

pub trait TimeData: Send + Sync {
    /// Latest known value of a channel, if any was ever reported
    fn get_channel_value(&self, edge_id: &str, channel: &ChannelAddress) -> Option<Value>;
}
