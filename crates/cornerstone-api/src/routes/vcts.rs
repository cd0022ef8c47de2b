//! VCT builder: type metadata definitions and publishing.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use cornerstone_auth::Principal;
use cornerstone_core::model::{AppId, VctDefinition};
use cornerstone_core::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

use super::credentials::import_document;
use crate::error::ApiResult;
use crate::state::{AppState, Services, SharedState};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImportRequest {
    document: Option<Value>,
    source_url: Option<String>,
}

/// A referenced zone template must exist.
async fn check_zone_template(state: &AppState, vct: &VctDefinition) -> Result<()> {
    let Some(template_id) = vct.zone_template_id.as_deref() else {
        return Ok(());
    };
    match state.repos.zone_templates.get(template_id).await {
        Ok(_) => Ok(()),
        Err(Error::NotFound { .. }) => Err(Error::validation_field(
            "zone_template_id",
            format!("unknown zone template '{template_id}'"),
        )),
        Err(other) => Err(other),
    }
}

pub async fn list(State(state): State<SharedState>) -> ApiResult<Json<Vec<VctDefinition>>> {
    state.require_app(AppId::VctBuilder).await?;
    Ok(Json(state.repos.vcts.list().await?))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VctDefinition>> {
    state.require_app(AppId::VctBuilder).await?;
    Ok(Json(state.repos.vcts.get(&id).await?))
}

pub async fn create(
    State(state): State<SharedState>,
    Json(vct): Json<VctDefinition>,
) -> ApiResult<(StatusCode, Json<VctDefinition>)> {
    state.require_app(AppId::VctBuilder).await?;
    let _references = state.references.lock().await;
    check_zone_template(&state, &vct).await?;
    let created = state.repos.vcts.insert(vct).await?;
    tracing::info!(id = %created.id, vct = %created.metadata.vct, "VCT created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn replace(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(vct): Json<VctDefinition>,
) -> ApiResult<Json<VctDefinition>> {
    state.require_app(AppId::VctBuilder).await?;
    let _references = state.references.lock().await;
    check_zone_template(&state, &vct).await?;
    Ok(Json(state.repos.vcts.update(&id, vct).await?))
}

pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.require_app(AppId::VctBuilder).await?;
    state.repos.vcts.delete(&id).await?;
    tracing::info!(id, "VCT deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// The SD-JWT VC type metadata document as it would be published.
pub async fn metadata(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.require_app(AppId::VctBuilder).await?;
    let vct = state.repos.vcts.get(&id).await?;
    Ok(Json(vct.to_type_metadata()?))
}

pub async fn import(
    State(state): State<SharedState>,
    Json(request): Json<ImportRequest>,
) -> ApiResult<(StatusCode, Json<VctDefinition>)> {
    state.require_app(AppId::VctBuilder).await?;
    let document =
        import_document(&state, request.document, request.source_url.as_deref()).await?;
    let vct = VctDefinition::from_type_metadata(&document)?;
    let created = state.repos.vcts.insert(vct).await?;
    tracing::info!(id = %created.id, vct = %created.metadata.vct, "VCT imported");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Commit the type metadata to the tenant's GitHub VDR and record its URL.
pub async fn publish(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Principal(by): Principal,
) -> ApiResult<Json<VctDefinition>> {
    state.require_app(AppId::VctBuilder).await?;
    let vct = state.repos.vcts.get(&id).await?;
    vct.metadata.validate()?;

    let github = state.tenant().await.github;
    let content = serde_json::to_vec_pretty(&vct.to_type_metadata()?)?;
    let path = vct.file_name();
    let message = format!("Publish VCT {}", vct.display_name());

    let result = state.vdr.publish(&github, &path, &content, &message).await;
    Services::record(&state.services.vdr, &result);
    let url = result?;

    tracing::info!(id = %vct.id, url = %url, by, "VCT published");
    let stored = state
        .repos
        .vcts
        .modify(
            &id,
            Box::new(move |vct: &mut VctDefinition| -> Result<()> {
                vct.published_url = Some(url);
                Ok(())
            }),
        )
        .await?;
    Ok(Json(stored))
}
