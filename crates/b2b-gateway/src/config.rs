use std::net::SocketAddr;
use std::time::Duration;

/// Controller component that receives forwarded schedules
pub const DEFAULT_SCHEDULE_COMPONENT_ID: &str = "ctrlBalancingSchedule0";

/// Configuration for the gateway HTTP server
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// First path segment of the JSON-RPC endpoint, without slashes
    pub jsonrpc_path: String,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size
    pub max_body_size: usize,
    /// How long a forwarded call may wait for the edge
    pub forward_timeout: Duration,
    /// Component addressed by `setGridConnSchedule`. Fixed per deployment.
    pub schedule_component_id: String,
    /// Realm announced in `WWW-Authenticate`
    pub realm: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8075)),
            jsonrpc_path: "jsonrpc".to_string(),
            enable_cors: true,
            max_body_size: 1024 * 1024, // 1MB
            forward_timeout: Duration::from_secs(30),
            schedule_component_id: DEFAULT_SCHEDULE_COMPONENT_ID.to_string(),
            realm: "b2b".to_string(),
        }
    }
}

impl GatewayConfig {
    /// True if the first segment of `path` is the JSON-RPC segment
    pub fn is_jsonrpc_path(&self, path: &str) -> bool {
        let segment = path.trim_start_matches('/').split('/').next().unwrap_or_default();
        segment == self.jsonrpc_path.trim_matches('/')
    }
}
