//! Proof templates and the proof requests created from them.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cornerstone_core::Error;
use cornerstone_core::model::{AppId, ProofRequest, ProofRequestStatus, ProofTemplate};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::state::{Services, SharedState};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RequestQuery {
    template_id: Option<String>,
}

/// Manual status update, e.g. from a verifier callback relayed by an operator.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    status: ProofRequestStatus,
    #[serde(default)]
    revealed: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    error: Option<String>,
}

// ============================================================================
// Templates
// ============================================================================

pub async fn list_templates(
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<ProofTemplate>>> {
    state.require_app(AppId::ProofTemplates).await?;
    Ok(Json(state.repos.proof_templates.list().await?))
}

pub async fn get_template(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProofTemplate>> {
    state.require_app(AppId::ProofTemplates).await?;
    Ok(Json(state.repos.proof_templates.get(&id).await?))
}

pub async fn create_template(
    State(state): State<SharedState>,
    Json(template): Json<ProofTemplate>,
) -> ApiResult<(StatusCode, Json<ProofTemplate>)> {
    state.require_app(AppId::ProofTemplates).await?;
    let created = state.repos.proof_templates.insert(template).await?;
    tracing::info!(id = %created.id, name = %created.name, "Proof template created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn replace_template(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(template): Json<ProofTemplate>,
) -> ApiResult<Json<ProofTemplate>> {
    state.require_app(AppId::ProofTemplates).await?;
    Ok(Json(state.repos.proof_templates.update(&id, template).await?))
}

pub async fn delete_template(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.require_app(AppId::ProofTemplates).await?;
    state.repos.proof_templates.delete(&id).await?;
    tracing::info!(id, "Proof template deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Requests
// ============================================================================

/// Create a proof request at Orbit from a template.
///
/// Missing credentials are a config error and nothing is stored. An
/// upstream failure is stored as a `failed` request so it shows up in the
/// request list, and the upstream error is returned as 502.
pub async fn create_request(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    state.require_app(AppId::ProofTemplates).await?;
    let template = state.repos.proof_templates.get(&id).await?;
    let settings = state.orbit_settings().await;
    if !settings.is_configured() {
        return Err(Error::config("Orbit base URL, LOB id, and API key must be configured").into());
    }

    let result = state
        .verifier
        .create_proof_request(&settings, &template)
        .await;
    Services::record(&state.services.orbit, &result);

    let mut request = ProofRequest::new(&template.id);
    match result {
        Ok(created) => {
            request.orbit_request_id = Some(created.id);
            request.presentation_url = created.url;
            request.transition(ProofRequestStatus::Sent)?;
            let stored = state.repos.proof_requests.insert(request).await?;
            tracing::info!(
                id = %stored.id,
                template = %template.id,
                orbit_id = ?stored.orbit_request_id,
                "Proof request sent"
            );
            Ok((StatusCode::CREATED, Json(stored)).into_response())
        }
        Err(err @ Error::Upstream { .. }) => {
            request.fail(err.to_string());
            let stored = state.repos.proof_requests.insert(request).await?;
            tracing::warn!(id = %stored.id, template = %template.id, error = %err, "Proof request failed");
            Ok(ApiError(err).into_response())
        }
        Err(other) => Err(other.into()),
    }
}

pub async fn list_requests(
    State(state): State<SharedState>,
    Query(query): Query<RequestQuery>,
) -> ApiResult<Json<Vec<ProofRequest>>> {
    state.require_app(AppId::ProofTemplates).await?;
    let mut requests = state.repos.proof_requests.list().await?;
    if let Some(template_id) = query.template_id.as_deref() {
        requests.retain(|r| r.template_id == template_id);
    }
    Ok(Json(requests))
}

pub async fn get_request(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProofRequest>> {
    state.require_app(AppId::ProofTemplates).await?;
    Ok(Json(state.repos.proof_requests.get(&id).await?))
}

pub async fn delete_request(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.require_app(AppId::ProofTemplates).await?;
    state.repos.proof_requests.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_request(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<ProofRequest>> {
    state.require_app(AppId::ProofTemplates).await?;
    let edit = move |request: &mut ProofRequest| -> cornerstone_core::Result<()> {
        request.transition(update.status)?;
        if let Some(revealed) = update.revealed {
            request.revealed = revealed;
        }
        if update.error.is_some() {
            request.error = update.error;
        }
        Ok(())
    };
    let stored = state.repos.proof_requests.modify(&id, Box::new(edit)).await?;
    tracing::info!(id = %stored.id, status = %stored.status, "Proof request updated");
    Ok(Json(stored))
}

/// Poll Orbit for the request's state and apply it.
pub async fn refresh_request(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProofRequest>> {
    state.require_app(AppId::ProofTemplates).await?;
    let request = state.repos.proof_requests.get(&id).await?;
    if request.status.is_terminal() {
        return Ok(Json(request));
    }
    let orbit_id = request.orbit_request_id.clone().ok_or_else(|| {
        Error::validation_field("orbit_request_id", "request was never sent to Orbit")
    })?;

    let settings = state.orbit_settings().await;
    let result = state.verifier.proof_status(&settings, &orbit_id).await;
    Services::record(&state.services.orbit, &result);
    let status = result?;

    let edit = move |request: &mut ProofRequest| -> cornerstone_core::Result<()> {
        if request.transition(status.state)? {
            tracing::info!(id = %request.id, status = %request.status, "Proof request status changed");
        }
        if !status.revealed.is_empty() {
            request.revealed = status.revealed;
        }
        Ok(())
    };
    Ok(Json(state.repos.proof_requests.modify(&id, Box::new(edit)).await?))
}
