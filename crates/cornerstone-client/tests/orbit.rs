//! Orbit client against a local mock verifier.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use cornerstone_client::{OrbitClient, Verifier};
use cornerstone_core::model::{
    OrbitSettings, ProofRequestStatus, ProofTemplate, RequestedCredential,
};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Seen {
    bodies: Arc<Mutex<Vec<Value>>>,
    keys: Arc<Mutex<Vec<String>>>,
}

async fn create(
    State(seen): State<Seen>,
    Path(lob): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let key = headers
        .get("api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    seen.keys.lock().unwrap().push(key);
    seen.bodies.lock().unwrap().push(body);
    (
        StatusCode::CREATED,
        Json(json!({
            "proofRequestId": format!("{lob}-pr-1"),
            "proofRequestUrl": "https://orbit.example/p/abc"
        })),
    )
}

async fn status(Path((_lob, id)): Path<(String, String)>) -> (StatusCode, Json<Value>) {
    match id.as_str() {
        "done" => (
            StatusCode::OK,
            Json(json!({
                "status": "verified",
                "revealedAttributes": {"given_name": "Ada"}
            })),
        ),
        "waiting" => (StatusCode::OK, Json(json!({"status": "pending"}))),
        "weird" => (StatusCode::OK, Json(json!({"status": "teleported"}))),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "no such proof request"})),
        ),
    }
}

async fn orbit() -> (String, Seen) {
    let seen = Seen::default();
    let router = Router::new()
        .route("/api/lob/{lob}/proof-requests", post(create))
        .route("/api/lob/{lob}/proof-requests/{id}", get(status))
        .with_state(seen.clone());
    (common::spawn(router).await, seen)
}

fn settings(base_url: &str) -> OrbitSettings {
    OrbitSettings {
        base_url: base_url.to_string(),
        lob_id: "lob-1".into(),
        api_key: Some("secret-key".into()),
    }
}

fn template() -> ProofTemplate {
    ProofTemplate {
        id: "age-check".into(),
        name: "Age check".into(),
        purpose: None,
        requested: vec![RequestedCredential {
            name: "id".into(),
            credential_id: None,
            credential_type: "IdCard".into(),
            attributes: vec!["given_name".into()],
            predicates: vec![],
            restrictions: vec![],
        }],
        created_at: None,
        updated_at: None,
    }
}

#[tokio::test]
async fn create_proof_request_posts_template() {
    let (base, seen) = orbit().await;
    let client = OrbitClient::new();

    let created = client
        .create_proof_request(&settings(&base), &template())
        .await
        .unwrap();
    assert_eq!(created.id, "lob-1-pr-1");
    assert_eq!(created.url.as_deref(), Some("https://orbit.example/p/abc"));

    assert_eq!(seen.keys.lock().unwrap().as_slice(), ["secret-key"]);
    let body = seen.bodies.lock().unwrap()[0].clone();
    assert_eq!(body["name"], "Age check");
    assert_eq!(body["requestedCredentials"][0]["credentialType"], "IdCard");
}

#[tokio::test]
async fn proof_status_maps_states() {
    let (base, _) = orbit().await;
    let client = OrbitClient::new();

    let done = client.proof_status(&settings(&base), "done").await.unwrap();
    assert_eq!(done.state, ProofRequestStatus::Verified);
    assert_eq!(done.revealed["given_name"], "Ada");

    let waiting = client
        .proof_status(&settings(&base), "waiting")
        .await
        .unwrap();
    assert_eq!(waiting.state, ProofRequestStatus::Sent);
    assert!(waiting.revealed.is_empty());
}

#[tokio::test]
async fn upstream_errors_carry_status() {
    let (base, _) = orbit().await;
    let client = OrbitClient::new();

    let err = client
        .proof_status(&settings(&base), "missing")
        .await
        .unwrap_err();
    assert_eq!(err.category(), "upstream");
    assert!(err.to_string().contains("HTTP 404"));
    assert!(err.to_string().contains("no such proof request"));

    let err = client
        .proof_status(&settings(&base), "weird")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("teleported"));
}

#[tokio::test]
async fn missing_credentials_fail_before_sending() {
    let (base, seen) = orbit().await;
    let mut s = settings(&base);
    s.lob_id = String::new();

    let err = OrbitClient::new()
        .create_proof_request(&s, &template())
        .await
        .unwrap_err();
    assert_eq!(err.category(), "config");
    assert!(seen.bodies.lock().unwrap().is_empty());
}
