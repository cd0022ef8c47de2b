//! Zone templates for the card layout editor.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use cornerstone_core::Error;
use cornerstone_core::model::{AppId, ZoneTemplate};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::SharedState;

/// Overlapping zones are allowed but reported.
#[derive(Debug, Serialize)]
pub struct OverlapWarning {
    zones: [String; 2],
    message: String,
}

#[derive(Debug, Serialize)]
pub struct ZoneTemplateResponse {
    #[serde(flatten)]
    template: ZoneTemplate,
    warnings: Vec<OverlapWarning>,
}

impl From<ZoneTemplate> for ZoneTemplateResponse {
    fn from(template: ZoneTemplate) -> Self {
        let warnings = template
            .overlaps()
            .into_iter()
            .map(|(a, b)| OverlapWarning {
                message: format!("zones '{a}' and '{b}' overlap"),
                zones: [a, b],
            })
            .collect();
        Self { template, warnings }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DuplicateRequest {
    name: Option<String>,
}

/// New position and/or size. Omitted values keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PositionRequest {
    x: Option<f64>,
    y: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
}

pub async fn list(State(state): State<SharedState>) -> ApiResult<Json<Vec<ZoneTemplate>>> {
    state.require_app(AppId::VctBuilder).await?;
    Ok(Json(state.repos.zone_templates.list().await?))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ZoneTemplateResponse>> {
    state.require_app(AppId::VctBuilder).await?;
    Ok(Json(state.repos.zone_templates.get(&id).await?.into()))
}

pub async fn create(
    State(state): State<SharedState>,
    Json(template): Json<ZoneTemplate>,
) -> ApiResult<(StatusCode, Json<ZoneTemplateResponse>)> {
    state.require_app(AppId::VctBuilder).await?;
    let created = state.repos.zone_templates.insert(template).await?;
    tracing::info!(id = %created.id, zones = created.zones.len(), "Zone template created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn replace(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(template): Json<ZoneTemplate>,
) -> ApiResult<Json<ZoneTemplateResponse>> {
    state.require_app(AppId::VctBuilder).await?;
    Ok(Json(
        state.repos.zone_templates.update(&id, template).await?.into(),
    ))
}

/// Delete a template no VCT references.
pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.require_app(AppId::VctBuilder).await?;
    let _references = state.references.lock().await;
    let template = state.repos.zone_templates.get(&id).await?;
    let vcts = state.repos.vcts.list().await?;
    if let Some(user) = vcts
        .iter()
        .find(|v| v.zone_template_id.as_deref() == Some(template.id.as_str()))
    {
        return Err(Error::in_use(
            "zone_templates",
            &template.id,
            format!("VCT '{}'", user.display_name()),
        )
        .into());
    }
    state.repos.zone_templates.delete(&id).await?;
    tracing::info!(id, "Zone template deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn duplicate(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Option<Json<DuplicateRequest>>,
) -> ApiResult<(StatusCode, Json<ZoneTemplateResponse>)> {
    state.require_app(AppId::VctBuilder).await?;
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let source = state.repos.zone_templates.get(&id).await?;
    let copy = source.duplicate(request.name.as_deref(), Utc::now());
    let created = state.repos.zone_templates.insert(copy).await?;
    tracing::info!(from = %id, id = %created.id, "Zone template duplicated");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Move and/or resize one zone. The result is clamped onto the card.
pub async fn position(
    State(state): State<SharedState>,
    Path((id, zone_id)): Path<(String, String)>,
    Json(request): Json<PositionRequest>,
) -> ApiResult<Json<ZoneTemplateResponse>> {
    state.require_app(AppId::VctBuilder).await?;
    let edit = move |template: &mut ZoneTemplate| -> cornerstone_core::Result<()> {
        let current = template
            .zones
            .iter()
            .find(|z| z.id == zone_id)
            .map(|z| z.position)
            .ok_or_else(|| Error::not_found("zones", &zone_id))?;

        if request.width.is_some() || request.height.is_some() {
            template.resize_zone(
                &zone_id,
                request.width.unwrap_or(current.width),
                request.height.unwrap_or(current.height),
            )?;
        }
        if request.x.is_some() || request.y.is_some() {
            template.move_zone(
                &zone_id,
                request.x.unwrap_or(current.x),
                request.y.unwrap_or(current.y),
            )?;
        }
        Ok(())
    };
    let updated = state.repos.zone_templates.modify(&id, Box::new(edit)).await?;
    Ok(Json(updated.into()))
}
