//! In-memory backends
//!
//! Suitable for development, tests and single-process demos. All state sits
//! behind `parking_lot::RwLock`, so reads from concurrent requests do not
//! serialize.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use super::{Edge, EdgeMetadata, IdentityError, IdentityStore, TimeData};
use crate::channel::ChannelAddress;
use crate::principal::Principal;

#[derive(Debug, Clone)]
struct UserRecord {
    password: String,
    principal: Principal,
}

/// Username/password table
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user
    pub fn add_user(&self, username: impl Into<String>, password: impl Into<String>, principal: Principal) {
        let username = username.into();
        debug!("Registering user {} ({} edges)", username, principal.edge_roles().len());
        self.users.write().insert(
            username,
            UserRecord {
                password: password.into(),
                principal,
            },
        );
    }

    pub fn remove_user(&self, username: &str) -> bool {
        self.users.write().remove(username).is_some()
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    fn backend_name(&self) -> &'static str {
        "InMemory"
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, IdentityError> {
        let users = self.users.read();
        match users.get(username) {
            Some(record) if record.password == password => Ok(record.principal.clone()),
            _ => Err(IdentityError::InvalidCredentials(username.to_string())),
        }
    }
}

/// Edge registry with online flags
#[derive(Debug, Default)]
pub struct InMemoryEdgeMetadata {
    edges: RwLock<HashMap<String, Edge>>,
}

impl InMemoryEdgeMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edges(edges: impl IntoIterator<Item = Edge>) -> Self {
        let store = Self::new();
        for edge in edges {
            store.upsert(edge);
        }
        store
    }

    pub fn upsert(&self, edge: Edge) {
        self.edges.write().insert(edge.id.clone(), edge);
    }

    /// Returns false if the edge is unknown
    pub fn set_online(&self, edge_id: &str, online: bool) -> bool {
        match self.edges.write().get_mut(edge_id) {
            Some(edge) => {
                edge.online = online;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, edge_id: &str) -> Option<Edge> {
        self.edges.write().remove(edge_id)
    }
}

impl EdgeMetadata for InMemoryEdgeMetadata {
    fn get_edge(&self, edge_id: &str) -> Option<Edge> {
        self.edges.read().get(edge_id).cloned()
    }
}

/// Latest value per (edge, channel)
#[derive(Debug, Default)]
pub struct InMemoryTimeData {
    values: RwLock<HashMap<(String, ChannelAddress), Value>>,
}

impl InMemoryTimeData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&self, edge_id: impl Into<String>, channel: ChannelAddress, value: Value) {
        self.values.write().insert((edge_id.into(), channel), value);
    }

    pub fn clear_value(&self, edge_id: &str, channel: &ChannelAddress) -> Option<Value> {
        self.values
            .write()
            .remove(&(edge_id.to_string(), channel.clone()))
    }
}

impl TimeData for InMemoryTimeData {
    fn get_channel_value(&self, edge_id: &str, channel: &ChannelAddress) -> Option<Value> {
        self.values
            .read()
            .get(&(edge_id.to_string(), channel.clone()))
            .cloned()
    }
}
