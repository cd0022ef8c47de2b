//! Orbit LOB verifier client.
//!
//! Orbit exposes proof requests per line of business:
//!
//! - `POST {base_url}/api/lob/{lob_id}/proof-requests` creates a request
//! - `GET {base_url}/api/lob/{lob_id}/proof-requests/{id}` reports its state
//!
//! Every call carries the tenant's key in the `api-key` header.

use std::collections::BTreeMap;

use async_trait::async_trait;
use cornerstone_core::model::{
    OrbitSettings, ProofRequestStatus, ProofTemplate, RequestedCredential,
};
use cornerstone_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{USER_AGENT, error_for_status, json_body, send_error};

const SERVICE: &str = "orbit";

/// A proof request accepted by the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierProofRequest {
    /// Verifier-side request id.
    pub id: String,
    /// URL (or deep link) the holder opens to respond.
    pub url: Option<String>,
}

/// The verifier's view of a proof request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierProofStatus {
    /// Lifecycle state.
    pub state: ProofRequestStatus,
    /// Revealed attribute values, once verified.
    pub revealed: BTreeMap<String, Value>,
}

/// A proof-request verifier.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Create a proof request from `template`.
    async fn create_proof_request(
        &self,
        settings: &OrbitSettings,
        template: &ProofTemplate,
    ) -> Result<VerifierProofRequest>;

    /// Fetch the current state of the request `request_id`.
    async fn proof_status(
        &self,
        settings: &OrbitSettings,
        request_id: &str,
    ) -> Result<VerifierProofStatus>;

    /// Verifier name for diagnostics.
    fn name(&self) -> &str;
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateProofRequestBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<&'a str>,
    requested_credentials: Vec<RequestedCredentialBody<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestedCredentialBody<'a> {
    name: &'a str,
    credential_type: &'a str,
    attributes: &'a [String],
    predicates: Vec<PredicateBody<'a>>,
    restrictions: Vec<RestrictionBody<'a>>,
}

#[derive(Debug, Serialize)]
struct PredicateBody<'a> {
    attribute: &'a str,
    operator: &'static str,
    value: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RestrictionBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    issuer_did: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema_id: Option<&'a str>,
}

impl<'a> From<&'a RequestedCredential> for RequestedCredentialBody<'a> {
    fn from(requested: &'a RequestedCredential) -> Self {
        Self {
            name: &requested.name,
            credential_type: &requested.credential_type,
            attributes: &requested.attributes,
            predicates: requested
                .predicates
                .iter()
                .map(|p| PredicateBody {
                    attribute: &p.attribute,
                    operator: p.operator.as_str(),
                    value: p.value,
                })
                .collect(),
            restrictions: requested
                .restrictions
                .iter()
                .map(|r| RestrictionBody {
                    issuer_did: r.issuer_did.as_deref(),
                    schema_id: r.schema_id.as_deref(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProofRequestResponse {
    #[serde(alias = "proofRequestId")]
    id: String,
    #[serde(default, alias = "proofRequestUrl", alias = "url")]
    presentation_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProofStatusResponse {
    #[serde(alias = "state")]
    status: String,
    #[serde(default, alias = "revealed")]
    revealed_attributes: BTreeMap<String, Value>,
}

/// Map an Orbit state name onto the console lifecycle.
fn map_state(state: &str) -> Option<ProofRequestStatus> {
    match state.to_ascii_lowercase().as_str() {
        "created" | "pending" | "sent" | "requested" | "request-sent" => {
            Some(ProofRequestStatus::Sent)
        }
        "verified" | "accepted" | "done" => Some(ProofRequestStatus::Verified),
        "rejected" | "declined" | "invalid" => Some(ProofRequestStatus::Rejected),
        "expired" | "abandoned" => Some(ProofRequestStatus::Expired),
        "failed" | "error" => Some(ProofRequestStatus::Failed),
        _ => None,
    }
}

// ============================================================================
// OrbitClient
// ============================================================================

/// HTTP client for the Orbit LOB verifier API.
#[derive(Debug, Clone, Default)]
pub struct OrbitClient {
    http: reqwest::Client,
}

impl OrbitClient {
    /// Create a client with default HTTP settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client on a preconfigured `reqwest::Client`.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Base URL for proof requests, plus the API key.
    fn endpoint<'a>(settings: &'a OrbitSettings) -> Result<(String, &'a str)> {
        let api_key = settings.api_key.as_deref().filter(|k| !k.is_empty());
        match api_key {
            Some(key) if settings.is_configured() => Ok((
                format!(
                    "{}/api/lob/{}/proof-requests",
                    settings.base_url.trim_end_matches('/'),
                    settings.lob_id
                ),
                key,
            )),
            _ => Err(Error::config(
                "Orbit is not configured: base_url, lob_id and api_key are required",
            )),
        }
    }
}

#[async_trait]
impl Verifier for OrbitClient {
    async fn create_proof_request(
        &self,
        settings: &OrbitSettings,
        template: &ProofTemplate,
    ) -> Result<VerifierProofRequest> {
        let (url, api_key) = Self::endpoint(settings)?;
        let body = CreateProofRequestBody {
            name: &template.name,
            purpose: template.purpose.as_deref(),
            requested_credentials: template.requested.iter().map(Into::into).collect(),
        };

        log::debug!("Creating Orbit proof request for template '{}'", template.id);
        let response = self
            .http
            .post(&url)
            .header("api-key", api_key)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(SERVICE, e))?;
        let response = error_for_status(SERVICE, response).await?;
        let created: CreateProofRequestResponse = json_body(SERVICE, response).await?;

        log::info!(
            "Orbit accepted proof request {} for template '{}'",
            created.id,
            template.id
        );
        Ok(VerifierProofRequest {
            id: created.id,
            url: created.presentation_url,
        })
    }

    async fn proof_status(
        &self,
        settings: &OrbitSettings,
        request_id: &str,
    ) -> Result<VerifierProofStatus> {
        let (base, api_key) = Self::endpoint(settings)?;
        let response = self
            .http
            .get(format!("{base}/{request_id}"))
            .header("api-key", api_key)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| send_error(SERVICE, e))?;
        let response = error_for_status(SERVICE, response).await?;
        let status: ProofStatusResponse = json_body(SERVICE, response).await?;

        let state = map_state(&status.status).ok_or_else(|| {
            Error::upstream(
                SERVICE,
                None,
                format!("unknown proof request state '{}'", status.status),
            )
        })?;
        Ok(VerifierProofStatus {
            state,
            revealed: status.revealed_attributes,
        })
    }

    fn name(&self) -> &str {
        SERVICE
    }
}
