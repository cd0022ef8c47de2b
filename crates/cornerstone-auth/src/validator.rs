//! Validation against the configured API keys.

use std::future::Future;
use std::pin::Pin;

use crate::{AuthConfig, AuthError, AuthenticatedUser, TokenValidator};

/// Accepts any key listed in [`AuthConfig::api_keys`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiKeyValidator;

impl ApiKeyValidator {
    fn check(token: &str, config: &AuthConfig) -> Result<AuthenticatedUser, AuthError> {
        let keys: Vec<_> = config.api_keys.iter().filter(|k| !k.key.is_empty()).collect();
        if keys.is_empty() {
            return Err(AuthError::NoKeysConfigured);
        }
        // Compare against every key so timing does not reveal which one matched.
        let mut matched = None;
        for key in keys {
            if constant_time_eq(token.as_bytes(), key.key.as_bytes()) && matched.is_none() {
                matched = Some(key);
            }
        }
        matched
            .map(|key| AuthenticatedUser::for_key(&key.name))
            .ok_or(AuthError::InvalidToken)
    }
}

impl TokenValidator for ApiKeyValidator {
    fn validate(
        &self,
        token: &str,
        config: &AuthConfig,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticatedUser, AuthError>> + Send + '_>> {
        let result = Self::check(token, config);
        Box::pin(async move { result })
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
