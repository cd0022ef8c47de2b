//! Credentials catalogue.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use cornerstone_core::model::{AppId, Credential};
use cornerstone_core::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiResult;
use crate::state::{AppState, SharedState};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CloneRequest {
    name: Option<String>,
}

/// Import body: an inline `document`, or a `source_url` to fetch it from.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImportRequest {
    document: Option<Value>,
    source_url: Option<String>,
    name: Option<String>,
}

/// Resolve the document of an import request, fetching it when only a URL
/// is given.
pub(crate) async fn import_document(
    state: &AppState,
    document: Option<Value>,
    source_url: Option<&str>,
) -> Result<Value> {
    match (document, source_url) {
        (Some(document), _) => Ok(document),
        (None, Some(url)) if !url.trim().is_empty() => {
            tracing::info!(url, "Fetching document for import");
            state.vdr.fetch_json(url.trim()).await
        }
        _ => Err(Error::validation_field(
            "document",
            "either document or source_url is required",
        )),
    }
}

pub async fn list(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Credential>>> {
    state.require_app(AppId::Credentials).await?;
    let mut credentials = state.repos.credentials.list().await?;
    if let Some(q) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
        credentials.retain(|c| c.matches(q));
    }
    Ok(Json(credentials))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Credential>> {
    state.require_app(AppId::Credentials).await?;
    Ok(Json(state.repos.credentials.get(&id).await?))
}

pub async fn create(
    State(state): State<SharedState>,
    Json(credential): Json<Credential>,
) -> ApiResult<(StatusCode, Json<Credential>)> {
    state.require_app(AppId::Credentials).await?;
    let created = state.repos.credentials.insert(credential).await?;
    tracing::info!(id = %created.id, name = %created.name, "Credential created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn replace(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(credential): Json<Credential>,
) -> ApiResult<Json<Credential>> {
    state.require_app(AppId::Credentials).await?;
    Ok(Json(state.repos.credentials.update(&id, credential).await?))
}

pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.require_app(AppId::Credentials).await?;
    state.repos.credentials.delete(&id).await?;
    tracing::info!(id, "Credential deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clone(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Option<Json<CloneRequest>>,
) -> ApiResult<(StatusCode, Json<Credential>)> {
    state.require_app(AppId::Credentials).await?;
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let source = state.repos.credentials.get(&id).await?;
    let copy = source.clone_as(request.name.as_deref(), Utc::now());
    let created = state.repos.credentials.insert(copy).await?;
    tracing::info!(from = %id, id = %created.id, "Credential cloned");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn import(
    State(state): State<SharedState>,
    Json(request): Json<ImportRequest>,
) -> ApiResult<(StatusCode, Json<Credential>)> {
    state.require_app(AppId::Credentials).await?;
    let source_url = request.source_url.as_deref();
    let document = import_document(&state, request.document, source_url).await?;
    let mut credential = Credential::import(&document, source_url)?;
    if let Some(name) = request.name.filter(|n| !n.trim().is_empty()) {
        credential.name = name;
    }
    let created = state.repos.credentials.insert(credential).await?;
    tracing::info!(id = %created.id, format = ?created.format, "Credential imported");
    Ok((StatusCode::CREATED, Json(created)))
}
