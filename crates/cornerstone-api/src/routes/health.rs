use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use cornerstone_core::ServiceState;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
    services: BTreeMap<&'static str, ServiceState>,
}

/// Liveness plus the state of each backing service.
///
/// `status` is `ok` when every service is ready and `degraded` otherwise.
/// The endpoint itself always answers 200.
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let services = BTreeMap::from([
        ("storage", state.services.storage.state()),
        ("orbit", state.services.orbit.state()),
        ("vdr", state.services.vdr.state()),
    ]);
    let status = if services.values().all(ServiceState::is_ready) {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started.elapsed().as_secs(),
        services,
    })
}
