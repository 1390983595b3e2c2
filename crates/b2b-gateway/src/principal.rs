//! Authenticated callers and their per-edge role assignments.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::GatewayError;
use crate::role::Role;

/// An authenticated caller. Built once per HTTP request by the credential
/// verifier and dropped with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: String,
    name: String,
    edge_roles: HashMap<String, Role>,
}

impl Principal {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        edge_roles: HashMap<String, Role>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            edge_roles,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn edge_roles(&self) -> &HashMap<String, Role> {
        &self.edge_roles
    }

    pub fn edge_role(&self, edge_id: &str) -> Option<Role> {
        self.edge_roles.get(edge_id).copied()
    }

    /// No role on the edge counts as below every role.
    pub fn edge_role_is_at_least(&self, edge_id: &str, required: Role) -> bool {
        self.edge_role(edge_id)
            .is_some_and(|role| role.is_at_least(required))
    }

    pub fn as_edge_user(&self, edge_id: &str) -> Option<EdgeUser> {
        self.edge_role(edge_id).map(|role| EdgeUser {
            id: self.id.clone(),
            name: self.name.clone(),
            edge_id: edge_id.to_string(),
            role,
        })
    }

    /// Per-edge view of this principal, provided its role on `edge_id` meets
    /// `required`. `resource` names the guarded operation in the error.
    pub fn assert_edge_role_is_at_least(
        &self,
        resource: &str,
        edge_id: &str,
        required: Role,
    ) -> Result<EdgeUser, GatewayError> {
        self.as_edge_user(edge_id)
            .filter(|user| user.role.is_at_least(required))
            .ok_or_else(|| GatewayError::AuthorizationDenied {
                user: self.id.clone(),
                edge_id: edge_id.to_string(),
                resource: resource.to_string(),
                required,
            })
    }
}

/// A principal as seen by one edge; travels with forwarded calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeUser {
    pub id: String,
    pub name: String,
    pub edge_id: String,
    pub role: Role,
}
