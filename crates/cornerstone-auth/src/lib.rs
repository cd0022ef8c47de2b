//! Authentication for the Cornerstone console API.
//!
//! Provides:
//! - [`AuthenticatedUser`]: the principal behind a validated key
//! - [`TokenValidator`]: trait for async token validation
//! - [`ApiKeyValidator`]: validator over the configured API keys
//! - [`AuthLayer`] / [`AuthService`]: Tower middleware parameterised over `TokenValidator`
//! - [`AuthConfig`]: configuration for the auth layer
//! - [`AuthError`]: auth-specific error types

mod error;
mod middleware;
mod user;
mod validator;

use serde::{Deserialize, Serialize};

pub use error::AuthError;
pub use middleware::{AuthLayer, AuthService};
pub use user::{AuthenticatedUser, Principal, principal_from_parts, user_from_parts};
pub use validator::ApiKeyValidator;

/// A named API key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    /// Who the key belongs to; becomes the request principal.
    pub name: String,
    /// The bearer token.
    pub key: String,
}

/// Configuration for the auth middleware.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Whether authentication is enabled. When false, all requests pass through.
    pub enabled: bool,
    /// Accepted API keys.
    pub api_keys: Vec<ApiKey>,
    /// Paths served without a token (exact match).
    pub public_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_keys: Vec::new(),
            public_paths: vec!["/health".to_string()],
        }
    }
}

impl AuthConfig {
    /// Whether `path` is served without authentication.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
    }
}

/// Trait for validating tokens and extracting the caller's identity.
///
/// The middleware calls `validate()` with the bearer token and stores the
/// returned user in the request extensions.
pub trait TokenValidator: Send + Sync + 'static {
    /// Validate a token and return the authenticated user.
    fn validate(
        &self,
        token: &str,
        config: &AuthConfig,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<AuthenticatedUser, AuthError>> + Send + '_>,
    >;
}
