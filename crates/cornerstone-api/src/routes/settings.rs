//! Tenant settings and app enablement.

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use cornerstone_auth::Principal;
use cornerstone_core::model::{AppId, TenantConfig, TenantConfigPatch};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct AppEntry {
    id: AppId,
    title: &'static str,
    enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct AppToggle {
    enabled: bool,
}

fn app_entries(config: &TenantConfig) -> Vec<AppEntry> {
    config
        .app_states()
        .into_iter()
        .map(|(id, enabled)| AppEntry {
            id,
            title: id.title(),
            enabled,
        })
        .collect()
}

pub async fn list_apps(State(state): State<SharedState>) -> Json<Vec<AppEntry>> {
    Json(app_entries(&state.tenant().await))
}

pub async fn get_settings(State(state): State<SharedState>) -> Json<TenantConfig> {
    Json(state.tenant().await.redacted())
}

/// Partial update. Secrets sent back as the redaction placeholder are kept.
pub async fn update_settings(
    State(state): State<SharedState>,
    Principal(by): Principal,
    Json(patch): Json<TenantConfigPatch>,
) -> ApiResult<Json<TenantConfig>> {
    let updated = state
        .tenant
        .update(|config| {
            config.apply(patch)?;
            config.updated_at = Some(Utc::now());
            Ok(())
        })
        .await?;
    tracing::info!(tenant = %updated.tenant_id, by, "Tenant settings updated");
    state.refresh_service_states().await;
    Ok(Json(updated.redacted()))
}

pub async fn set_app(
    State(state): State<SharedState>,
    Path(app): Path<String>,
    Principal(by): Principal,
    Json(toggle): Json<AppToggle>,
) -> ApiResult<Json<Vec<AppEntry>>> {
    let app: AppId = app.parse()?;
    let updated = state
        .tenant
        .update(|config| {
            config.set_app_enabled(app, toggle.enabled)?;
            config.updated_at = Some(Utc::now());
            Ok(())
        })
        .await?;
    tracing::info!(app = %app, enabled = toggle.enabled, by, "App toggled");
    Ok(Json(app_entries(&updated)))
}
