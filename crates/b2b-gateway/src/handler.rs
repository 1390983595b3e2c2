//! HTTP request handler for the JSON-RPC endpoint
//!
//! Order of checks per request: CORS preflight, credentials, path, HTTP
//! method, body, normalization, dispatch. Everything up to and including
//! normalization fails with a plain-text body; failures after that carry a
//! JSON-RPC error object echoing the request id.

use std::sync::Arc;

use b2b_json_rpc::{JsonRpcDispatcher, JsonRpcError, RequestId, ToJsonRpcError};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{ALLOW, AUTHORIZATION, CONTENT_TYPE, HeaderValue, WWW_AUTHENTICATE};
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::GatewayError;
use crate::auth::CredentialVerifier;
use crate::config::GatewayConfig;
use crate::correlator::ResponseCorrelator;
use crate::cors::CorsLayer;
use crate::normalize::parse_request;
use crate::principal::Principal;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP handler for gateway requests
#[derive(Clone)]
pub struct GatewayHttpHandler {
    config: Arc<GatewayConfig>,
    verifier: CredentialVerifier,
    dispatcher: Arc<JsonRpcDispatcher<Principal, GatewayError>>,
    correlator: ResponseCorrelator,
}

impl GatewayHttpHandler {
    pub fn new(
        config: Arc<GatewayConfig>,
        verifier: CredentialVerifier,
        dispatcher: Arc<JsonRpcDispatcher<Principal, GatewayError>>,
        correlator: ResponseCorrelator,
    ) -> Self {
        Self {
            config,
            verifier,
            dispatcher,
            correlator,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &JsonRpcDispatcher<Principal, GatewayError> {
        &self.dispatcher
    }

    /// Handle one HTTP request. Never fails: every error becomes a response.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<BoxError>,
    {
        debug!("Handling {} {}", req.method(), req.uri().path());

        let mut response = if req.method() == Method::OPTIONS && self.config.enable_cors {
            Self::preflight()
        } else {
            self.handle_authenticated(req).await
        };

        if self.config.enable_cors {
            CorsLayer::apply_cors_headers(response.headers_mut());
        }
        response
    }

    async fn handle_authenticated<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<BoxError>,
    {
        let authorization = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let principal = match self.verifier.verify(authorization.as_deref()).await {
            Ok(principal) => principal,
            Err(err) => return self.error_response(err, None),
        };

        if !self.config.is_jsonrpc_path(req.uri().path()) {
            debug!("No route for {}", req.uri().path());
            return text_response(StatusCode::NOT_FOUND, "Not Found");
        }

        if req.method() != Method::POST {
            let err = GatewayError::UnsupportedHttpMethod(req.method().to_string());
            return self.error_response(err, None);
        }

        let body = match self.read_body(req.into_body()).await {
            Ok(body) => body,
            Err(err) => return self.error_response(err, None),
        };

        let request = match parse_request(&body) {
            Ok(request) => request,
            Err(err) => return self.error_response(err, None),
        };
        debug!(
            "JSON-RPC request from {}: method={} id={}",
            principal.id(),
            request.method,
            request.id
        );

        let id = request.id.clone();
        let result = match self.dispatcher.dispatch(request, principal) {
            Ok(handle) => self.correlator.resolve(&id, handle).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(response) => json_response(StatusCode::OK, &response),
            Err(err) => self.error_response(err, Some(id)),
        }
    }

    async fn read_body<B>(&self, body: B) -> Result<Bytes, GatewayError>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let limit = self.config.max_body_size;
        match Limited::new(body, limit).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                warn!("Request body exceeds {} bytes", limit);
                Err(GatewayError::PayloadTooLarge { limit })
            }
            Err(err) => Err(GatewayError::malformed(format!(
                "failed to read request body: {}",
                err
            ))),
        }
    }

    fn error_response(&self, err: GatewayError, id: Option<RequestId>) -> Response<Full<Bytes>> {
        let status = err.status_code();
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, err);
        } else {
            debug!("Request rejected with {}: {}", status, err);
        }

        let mut response = if err.is_protocol_error() {
            json_response(status, &JsonRpcError::new(id, err.to_error_object()))
        } else {
            text_response(status, err.to_string())
        };

        match err {
            GatewayError::AuthenticationFailed(_) => {
                let challenge = format!("Basic realm=\"{}\"", self.config.realm);
                let value = HeaderValue::from_str(&challenge)
                    .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
                response.headers_mut().insert(WWW_AUTHENTICATE, value);
            }
            GatewayError::UnsupportedHttpMethod(_) => {
                response
                    .headers_mut()
                    .insert(ALLOW, HeaderValue::from_static("POST, OPTIONS"));
            }
            _ => {}
        }
        response
    }

    fn preflight() -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = StatusCode::NO_CONTENT;
        response
    }
}

fn text_response(status: StatusCode, body: impl Into<String>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.into())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(json) => {
            let mut response = Response::new(Full::new(Bytes::from(json)));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(err) => {
            error!("Failed to serialize response: {}", err);
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}
