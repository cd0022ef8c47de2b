//! Shared fixtures for router tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use cornerstone_api::{AppState, router};
use cornerstone_client::{Vdr, Verifier, VerifierProofRequest, VerifierProofStatus};
use cornerstone_core::model::{GithubSettings, OrbitSettings, ProofRequestStatus, ProofTemplate};
use cornerstone_core::{Error, Result};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Verifier that answers from canned values.
#[derive(Default)]
pub struct MockVerifier {
    pub fail_create: Mutex<bool>,
    pub state: Mutex<Option<ProofRequestStatus>>,
    pub revealed: Mutex<BTreeMap<String, Value>>,
    pub created: Mutex<Vec<String>>,
}

#[async_trait]
impl Verifier for MockVerifier {
    async fn create_proof_request(
        &self,
        _settings: &OrbitSettings,
        template: &ProofTemplate,
    ) -> Result<VerifierProofRequest> {
        if *self.fail_create.lock().unwrap() {
            return Err(Error::upstream("orbit", Some(503), "unavailable"));
        }
        self.created.lock().unwrap().push(template.id.clone());
        Ok(VerifierProofRequest {
            id: "orbit-1".to_string(),
            url: Some("https://orbit.example/p/orbit-1".to_string()),
        })
    }

    async fn proof_status(
        &self,
        _settings: &OrbitSettings,
        request_id: &str,
    ) -> Result<VerifierProofStatus> {
        assert_eq!(request_id, "orbit-1");
        Ok(VerifierProofStatus {
            state: self
                .state
                .lock()
                .unwrap()
                .unwrap_or(ProofRequestStatus::Sent),
            revealed: self.revealed.lock().unwrap().clone(),
        })
    }

    fn name(&self) -> &str {
        "mock-orbit"
    }
}

/// Registry that records publishes and serves fixed documents.
#[derive(Default)]
pub struct MockVdr {
    pub published: Mutex<Vec<(String, Value)>>,
    pub documents: Mutex<BTreeMap<String, Value>>,
}

#[async_trait]
impl Vdr for MockVdr {
    async fn publish(
        &self,
        settings: &GithubSettings,
        path: &str,
        content: &[u8],
        _message: &str,
    ) -> Result<String> {
        let document: Value = serde_json::from_slice(content)?;
        self.published
            .lock()
            .unwrap()
            .push((path.to_string(), document));
        settings.vdr_url(path)
    }

    async fn fetch_json(&self, url: &str) -> Result<Value> {
        self.documents
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::upstream("vdr", Some(404), format!("{url} not found")))
    }

    fn name(&self) -> &str {
        "mock-vdr"
    }
}

/// A router over in-memory state, plus handles on the mocks.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub verifier: Arc<MockVerifier>,
    pub vdr: Arc<MockVdr>,
}

pub fn orbit_settings() -> OrbitSettings {
    OrbitSettings {
        base_url: "https://orbit.example".to_string(),
        lob_id: "lob-1".to_string(),
        api_key: Some("orbit-key".to_string()),
    }
}

pub fn app() -> TestApp {
    app_with(|state| state.with_orbit_defaults(orbit_settings()))
}

pub fn app_with(f: impl FnOnce(AppState) -> AppState) -> TestApp {
    let verifier = Arc::new(MockVerifier::default());
    let vdr = Arc::new(MockVdr::default());
    let state = Arc::new(f(AppState::in_memory(verifier.clone(), vdr.clone())));
    TestApp {
        router: router(state.clone()),
        state,
        verifier,
        vdr,
    }
}

impl TestApp {
    /// Send a request and decode the JSON response (Null when empty).
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    /// Create a record and return its id.
    pub async fn create(&self, uri: &str, body: Value) -> String {
        let (status, value) = self.post(uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "{uri}: {value}");
        value["id"].as_str().unwrap().to_string()
    }
}

pub fn person_vocab() -> Value {
    json!({
        "id": "person",
        "name": "Person",
        "uri": "https://schema.org/Person",
        "properties": [
            {"id": "givenName", "name": "givenName", "range": "string"},
            {"id": "birthDate", "name": "birthDate", "range": "date"}
        ]
    })
}

pub fn employee_type() -> Value {
    json!({
        "id": "employee",
        "name": "Employee",
        "properties": [
            {"name": "first_name", "value_type": "string"},
            {"name": "age", "value_type": "integer"}
        ]
    })
}

pub fn age_template() -> Value {
    json!({
        "id": "age-check",
        "name": "Age check",
        "requested": [{
            "name": "identity",
            "credential_type": "IdentityCredential",
            "attributes": ["given_name"],
            "predicates": [{"attribute": "age", "operator": ">=", "value": 18}]
        }]
    })
}

pub fn pid_metadata() -> Value {
    json!({
        "vct": "https://credentials.example/identity_credential",
        "name": "Identity Credential",
        "display": [{"lang": "en-US", "name": "Identity"}],
        "claims": [
            {"path": ["given_name"], "display": [{"lang": "en-US", "label": "Given name"}]},
            {"path": ["address", "locality"], "display": [{"lang": "en-US", "label": "City"}]}
        ]
    })
}
