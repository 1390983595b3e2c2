//! Credential verification for the `Authorization` header.
//!
//! Only the HTTP Basic scheme is accepted. Decoding problems of any kind are
//! reported as [`GatewayError::AuthenticationFailed`]; the username/password
//! pair itself is checked by the [`IdentityStore`].

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

use crate::GatewayError;
use crate::backend::{IdentityError, IdentityStore};
use crate::principal::Principal;

/// Decoded `username:password` pair
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl BasicCredentials {
    /// Parse `Basic <base64(username:password)>`. The scheme name is case
    /// insensitive; username and password are trimmed and split at the first `:`.
    pub fn from_header(header: Option<&str>) -> Result<Self, GatewayError> {
        let header = header.ok_or_else(|| GatewayError::authentication_failed("missing Authorization header"))?;

        let mut tokens = header.split_whitespace();
        let scheme = tokens.next().unwrap_or_default();
        if !scheme.eq_ignore_ascii_case("Basic") {
            return Err(GatewayError::authentication_failed("unsupported authorization scheme"));
        }

        let encoded = tokens
            .next()
            .ok_or_else(|| GatewayError::authentication_failed("missing Basic credentials"))?;
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|_| GatewayError::authentication_failed("credentials are not valid Base64"))?;
        let credentials = String::from_utf8(decoded)
            .map_err(|_| GatewayError::authentication_failed("credentials are not valid UTF-8"))?;

        let (username, password) = credentials
            .split_once(':')
            .ok_or_else(|| GatewayError::authentication_failed("credentials lack ':' separator"))?;

        Ok(Self {
            username: username.trim().to_string(),
            password: password.trim().to_string(),
        })
    }

    /// Render as an `Authorization` header value
    pub fn to_header(&self) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", self.username, self.password))
        )
    }
}

/// Turns an `Authorization` header into a [`Principal`]
#[derive(Clone)]
pub struct CredentialVerifier {
    identity: Arc<dyn IdentityStore>,
}

impl CredentialVerifier {
    pub fn new(identity: Arc<dyn IdentityStore>) -> Self {
        Self { identity }
    }

    pub async fn verify(&self, header: Option<&str>) -> Result<Principal, GatewayError> {
        let credentials = BasicCredentials::from_header(header).inspect_err(|err| {
            debug!("Rejecting Authorization header: {}", err);
        })?;

        match self
            .identity
            .authenticate(&credentials.username, &credentials.password)
            .await
        {
            Ok(principal) => {
                debug!("Authenticated {} via {}", principal.id(), self.identity.backend_name());
                Ok(principal)
            }
            Err(IdentityError::InvalidCredentials(user)) => {
                warn!("Authentication failed for user [{}]", user);
                Err(GatewayError::authentication_failed(format!(
                    "invalid credentials for user [{}]",
                    user
                )))
            }
            Err(err @ IdentityError::Unavailable(_)) => {
                warn!("Identity backend error: {}", err);
                Err(GatewayError::authentication_failed(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryIdentityStore;
    use crate::role::Role;
    use std::collections::HashMap;

    fn header(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    fn verifier() -> CredentialVerifier {
        let store = InMemoryIdentityStore::new();
        store.add_user(
            "alice",
            "secret",
            Principal::new("alice", "Alice", HashMap::from([("edge0".to_string(), Role::Admin)])),
        );
        CredentialVerifier::new(Arc::new(store))
    }

    #[test]
    fn test_parses_basic_header() {
        let creds = BasicCredentials::from_header(Some(&header("alice:secret"))).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_password_may_contain_colons_and_is_trimmed() {
        let creds = BasicCredentials::from_header(Some(&header(" bob : pa:ss "))).unwrap();
        assert_eq!(creds.username, "bob");
        assert_eq!(creds.password, "pa:ss");
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let raw = format!("bAsIc {}", STANDARD.encode("alice:secret"));
        assert!(BasicCredentials::from_header(Some(&raw)).is_ok());
    }

    #[test]
    fn test_rejects_malformed_headers() {
        let no_colon = header("alicesecret");
        let cases = [
            None,
            Some(""),
            Some("Bearer abc.def"),
            Some("Basic"),
            Some("Basic !!!not-base64!!!"),
            Some(no_colon.as_str()),
        ];
        for case in cases {
            assert!(
                matches!(
                    BasicCredentials::from_header(case),
                    Err(GatewayError::AuthenticationFailed(_))
                ),
                "{case:?} should fail"
            );
        }
    }

    #[test]
    fn test_header_round_trip_and_redacted_debug() {
        let creds = BasicCredentials {
            username: "alice".into(),
            password: "secret".into(),
        };
        assert_eq!(BasicCredentials::from_header(Some(&creds.to_header())).unwrap(), creds);
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[tokio::test]
    async fn test_verify_returns_principal() {
        let principal = verifier().verify(Some(&header("alice:secret"))).await.unwrap();
        assert_eq!(principal.id(), "alice");
        assert_eq!(principal.edge_role("edge0"), Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_password() {
        let err = verifier().verify(Some(&header("alice:nope"))).await.unwrap_err();
        assert!(matches!(err, GatewayError::AuthenticationFailed(_)));
    }
}
