use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{error::JsonRpcErrorObject, request::JsonRpcRequest, response::JsonRpcResponse};

/// Trait for handling one JSON-RPC method.
///
/// `C` is the per-call context the transport layer builds (for the gateway:
/// the authenticated caller). Handlers return the bare `result` value; the
/// dispatcher tags it with the request's correlation id.
#[async_trait]
pub trait JsonRpcHandler<C>: Send + Sync
where
    C: Send + Sync,
{
    /// The error type returned by this handler
    type Error: ToJsonRpcError;

    async fn handle(&self, request: &JsonRpcRequest, context: &C) -> Result<Value, Self::Error>;
}

/// Trait for domain errors that can be rendered as JSON-RPC error objects
pub trait ToJsonRpcError: std::error::Error + Send + Sync + 'static {
    /// Convert this error to a JSON-RPC error object
    fn to_error_object(&self) -> JsonRpcErrorObject;

    /// The error the dispatcher raises for a method nobody registered
    fn unhandled_method(method: &str) -> Self
    where
        Self: Sized;
}

/// Handle to a response that resolves once the handler finishes
pub type ResponseFuture<E> = BoxFuture<'static, Result<JsonRpcResponse, E>>;

/// JSON-RPC method registry with a fixed error type
pub struct JsonRpcDispatcher<C, E> {
    handlers: HashMap<String, Arc<dyn JsonRpcHandler<C, Error = E>>>,
}

impl<C, E> JsonRpcDispatcher<C, E>
where
    C: Send + Sync + 'static,
    E: ToJsonRpcError,
{
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a specific method
    pub fn register_method<H>(&mut self, method: impl Into<String>, handler: H)
    where
        H: JsonRpcHandler<C, Error = E> + 'static,
    {
        self.handlers.insert(method.into(), Arc::new(handler));
    }

    /// Look up the handler for `request.method` and start it.
    ///
    /// Returns without awaiting anything: the returned future owns the request
    /// and context and resolves to the response tagged with the request id.
    /// Unknown methods fail immediately with [`ToJsonRpcError::unhandled_method`].
    pub fn dispatch(&self, request: JsonRpcRequest, context: C) -> Result<ResponseFuture<E>, E> {
        let Some(handler) = self.handlers.get(&request.method) else {
            warn!(
                "Unhandled Request: method={} id={}",
                request.method, request.id
            );
            return Err(E::unhandled_method(&request.method));
        };

        debug!("Dispatching {} (id={})", request.method, request.id);
        let handler = Arc::clone(handler);
        Ok(Box::pin(async move {
            let result = handler.handle(&request, &context).await?;
            Ok(JsonRpcResponse::success(request.id, result))
        }))
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Get all registered methods
    pub fn registered_methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.handlers.keys().cloned().collect();
        methods.sort();
        methods
    }
}

impl<C, E> Default for JsonRpcDispatcher<C, E>
where
    C: Send + Sync + 'static,
    E: ToJsonRpcError,
{
    fn default() -> Self {
        Self::new()
    }
}
