//! Authenticated principal and extraction helpers.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use http::request::Parts;

/// The caller behind a validated API key.
///
/// Stored in HTTP request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Key owner name.
    pub name: String,
    /// Stable subject identifier, `api-key:<name>`.
    pub subject: String,
}

impl AuthenticatedUser {
    /// The principal for the API key named `name`.
    pub fn for_key(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subject: format!("api-key:{name}"),
        }
    }
}

/// Extract the `AuthenticatedUser` from HTTP request `Parts`, if present.
pub fn user_from_parts(parts: &Parts) -> Option<&AuthenticatedUser> {
    parts.extensions.get::<AuthenticatedUser>()
}

/// The caller's name, or `"anonymous"` when auth is disabled.
pub fn principal_from_parts(parts: &Parts) -> &str {
    user_from_parts(parts)
        .map(|u| u.name.as_str())
        .unwrap_or("anonymous")
}

/// Handler extractor for the caller's name, used in audit log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Principal(principal_from_parts(parts).to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parts_with_user() -> http::request::Parts {
        let (mut parts, _body) = http::Request::new(()).into_parts();
        parts.extensions.insert(AuthenticatedUser::for_key("ops"));
        parts
    }

    fn parts_without_user() -> http::request::Parts {
        let (parts, _body) = http::Request::new(()).into_parts();
        parts
    }

    #[test]
    fn test_user_from_parts_present() {
        let parts = parts_with_user();
        let user = user_from_parts(&parts).unwrap();
        assert_eq!(user.name, "ops");
        assert_eq!(user.subject, "api-key:ops");
    }

    #[test]
    fn test_user_from_parts_absent() {
        assert!(user_from_parts(&parts_without_user()).is_none());
    }

    #[tokio::test]
    async fn test_principal_extractor() {
        let mut parts = parts_with_user();
        let Principal(name) = Principal::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(name, "ops");
    }

    #[test]
    fn test_principal_from_parts() {
        assert_eq!(principal_from_parts(&parts_with_user()), "ops");
        assert_eq!(principal_from_parts(&parts_without_user()), "anonymous");
    }
}
