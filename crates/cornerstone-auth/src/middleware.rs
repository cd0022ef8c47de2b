//! Tower authentication middleware.
//!
//! `AuthLayer` and `AuthService` wrap any inner service with bearer-token
//! validation. Public paths and CORS preflight requests pass through.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use http::{Method, Request, StatusCode};
use tower::{Layer, Service};

use crate::{AuthConfig, AuthError, TokenValidator};

/// Tower `Layer` that wraps services with token authentication.
#[derive(Clone)]
pub struct AuthLayer<V: TokenValidator> {
    validator: Arc<V>,
    config: Arc<AuthConfig>,
}

impl<V: TokenValidator> AuthLayer<V> {
    /// Create a new auth layer with the given validator and config.
    pub fn new(validator: Arc<V>, config: AuthConfig) -> Self {
        if config.enabled && config.api_keys.is_empty() {
            log::warn!("Authentication is enabled but no API keys are configured");
        }
        Self {
            validator,
            config: Arc::new(config),
        }
    }
}

impl<V: TokenValidator, S> Layer<S> for AuthLayer<V> {
    type Service = AuthService<V, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            validator: self.validator.clone(),
            config: self.config.clone(),
        }
    }
}

/// Tower `Service` that validates tokens before forwarding requests.
///
/// On successful validation, inserts `AuthenticatedUser` into request
/// extensions where it's available to downstream handlers.
#[derive(Clone)]
pub struct AuthService<V: TokenValidator, S> {
    inner: S,
    validator: Arc<V>,
    config: Arc<AuthConfig>,
}

impl<V, S> Service<Request<Body>> for AuthService<V, S>
where
    V: TokenValidator,
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let validator = self.validator.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let exempt = !config.enabled
                || req.method() == Method::OPTIONS
                || config.is_public(req.uri().path());
            if exempt {
                let resp = inner
                    .call(req)
                    .await
                    .unwrap_or_else(|infallible| match infallible {});
                return Ok(resp.into_response());
            }

            let token = match extract_bearer_token(&req) {
                Some(t) => t.to_string(),
                None => return Ok(error_response(&AuthError::MissingToken)),
            };

            match validator.validate(&token, &config).await {
                Ok(user) => {
                    log::debug!("Authenticated {} for {}", user.subject, req.uri().path());
                    req.extensions_mut().insert(user);
                    let resp = inner
                        .call(req)
                        .await
                        .unwrap_or_else(|infallible| match infallible {});
                    Ok(resp.into_response())
                }
                Err(auth_err) => {
                    log::warn!("Authentication failed for {}: {auth_err}", req.uri().path());
                    Ok(error_response(&auth_err))
                }
            }
        })
    }
}

/// Extract bearer token from the Authorization header.
fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// 401 with a `WWW-Authenticate` challenge for client errors, 500 otherwise.
fn error_response(err: &AuthError) -> axum::response::Response {
    let (status, category) = if err.is_client_error() {
        (StatusCode::UNAUTHORIZED, "authentication")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "config")
    };
    let body = serde_json::json!({
        "error": {
            "category": category,
            "message": err.to_string(),
        }
    });

    let mut response = (
        status,
        [(http::header::CONTENT_TYPE, "application/json")],
        serde_json::to_string(&body).unwrap_or_default(),
    )
        .into_response();

    if status == StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            http::header::WWW_AUTHENTICATE,
            http::HeaderValue::from_static(r#"Bearer realm="cornerstone""#),
        );
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{ApiKey, ApiKeyValidator, AuthenticatedUser};
    use std::sync::Mutex;
    use tower::ServiceExt;

    fn config_enabled() -> AuthConfig {
        AuthConfig {
            enabled: true,
            api_keys: vec![ApiKey {
                name: "ops".to_string(),
                key: "valid-token".to_string(),
            }],
            ..Default::default()
        }
    }

    /// Mock inner service that captures the AuthenticatedUser.
    #[derive(Clone)]
    struct MockService {
        captured_user: Arc<Mutex<Option<AuthenticatedUser>>>,
    }

    impl MockService {
        fn new() -> Self {
            Self {
                captured_user: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl Service<Request<Body>> for MockService {
        type Response = axum::response::Response;
        type Error = Infallible;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Body>) -> Self::Future {
            let captured = self.captured_user.clone();
            Box::pin(async move {
                let user = req.extensions().get::<AuthenticatedUser>().cloned();
                *captured.lock().unwrap() = user;
                Ok((StatusCode::OK, "ok").into_response())
            })
        }
    }

    fn service(config: AuthConfig) -> (AuthService<ApiKeyValidator, MockService>, MockService) {
        let mock = MockService::new();
        let layer = AuthLayer::new(Arc::new(ApiKeyValidator), config);
        (layer.layer(mock.clone()), mock)
    }

    fn request(path: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(&request("/", Some("Bearer my-token-123"))),
            Some("my-token-123")
        );
        assert_eq!(extract_bearer_token(&request("/", None)), None);
        assert_eq!(
            extract_bearer_token(&request("/", Some("Basic dXNlcjpwYXNz"))),
            None
        );
        assert_eq!(extract_bearer_token(&request("/", Some("Bearer "))), None);
    }

    #[test]
    fn test_error_response_status() {
        let resp = error_response(&AuthError::InvalidToken);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key(http::header::WWW_AUTHENTICATE));

        let resp = error_response(&AuthError::NoKeysConfigured);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_middleware_disabled_passes_through() {
        let (svc, _) = service(AuthConfig::default());
        let resp = svc.oneshot(request("/api/vcts", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_missing_token_returns_401() {
        let (svc, _) = service(config_enabled());
        let resp = svc.oneshot(request("/api/vcts", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_middleware_invalid_token_returns_401() {
        let (svc, _) = service(config_enabled());
        let resp = svc
            .oneshot(request("/api/vcts", Some("Bearer bad-token")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_middleware_public_path_skips_auth() {
        let (svc, _) = service(config_enabled());
        let resp = svc.oneshot(request("/health", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_preflight_skips_auth() {
        let (svc, _) = service(config_enabled());
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/vcts")
            .body(Body::empty())
            .unwrap();
        let resp = svc.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_valid_token_passes_and_injects_user() {
        let (svc, mock) = service(config_enabled());
        let resp = svc
            .oneshot(request("/api/vcts", Some("Bearer valid-token")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let user = mock.captured_user.lock().unwrap();
        let user = user.as_ref().expect("AuthenticatedUser should be present");
        assert_eq!(user.name, "ops");
        assert_eq!(user.subject, "api-key:ops");
    }
}
