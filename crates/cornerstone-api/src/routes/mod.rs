//! HTTP router setup.

mod catalogue;
mod credentials;
mod health;
mod proofs;
mod settings;
mod vcts;
mod zones;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use cornerstone_auth::{ApiKeyValidator, AuthLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

/// Create the console router.
///
/// Layers, outermost first: CORS, request tracing, API-key authentication.
pub fn create(state: SharedState) -> Router {
    let auth = AuthLayer::new(Arc::new(ApiKeyValidator), state.auth.clone());

    Router::new()
        .route("/health", get(health::health))
        .route("/api/apps", get(settings::list_apps))
        // Credentials catalogue
        .route(
            "/api/credentials",
            get(credentials::list).post(credentials::create),
        )
        .route("/api/credentials/import", post(credentials::import))
        .route(
            "/api/credentials/{id}",
            get(credentials::get)
                .put(credentials::replace)
                .delete(credentials::delete),
        )
        .route("/api/credentials/{id}/clone", post(credentials::clone))
        // Data catalogue
        .route(
            "/api/data-types",
            get(catalogue::list_data_types).post(catalogue::create_data_type),
        )
        .route(
            "/api/data-types/{id}",
            get(catalogue::get_data_type)
                .put(catalogue::replace_data_type)
                .delete(catalogue::delete_data_type),
        )
        .route(
            "/api/data-types/{id}/properties",
            post(catalogue::add_property),
        )
        .route(
            "/api/data-types/{id}/properties/{pid}",
            put(catalogue::update_property).delete(catalogue::remove_property),
        )
        .route(
            "/api/data-types/{id}/provider-mappings",
            post(catalogue::add_provider_mapping),
        )
        .route(
            "/api/data-types/{id}/provider-mappings/{mid}",
            axum::routing::delete(catalogue::remove_provider_mapping),
        )
        .route(
            "/api/data-types/{id}/vocab-mappings",
            post(catalogue::map_property),
        )
        .route(
            "/api/data-types/{id}/vocab-mappings/{pid}/{vocab_type_id}",
            axum::routing::delete(catalogue::unmap_property),
        )
        .route("/api/data-types/{id}/canvas", get(catalogue::canvas))
        .route(
            "/api/vocab-types",
            get(catalogue::list_vocab_types).post(catalogue::create_vocab_type),
        )
        .route(
            "/api/vocab-types/{id}",
            get(catalogue::get_vocab_type)
                .put(catalogue::replace_vocab_type)
                .delete(catalogue::delete_vocab_type),
        )
        // VCT builder
        .route("/api/vcts", get(vcts::list).post(vcts::create))
        .route("/api/vcts/import", post(vcts::import))
        .route(
            "/api/vcts/{id}",
            get(vcts::get).put(vcts::replace).delete(vcts::delete),
        )
        .route("/api/vcts/{id}/metadata", get(vcts::metadata))
        .route("/api/vcts/{id}/publish", post(vcts::publish))
        .route("/api/zone-templates", get(zones::list).post(zones::create))
        .route(
            "/api/zone-templates/{id}",
            get(zones::get).put(zones::replace).delete(zones::delete),
        )
        .route(
            "/api/zone-templates/{id}/duplicate",
            post(zones::duplicate),
        )
        .route(
            "/api/zone-templates/{id}/zones/{zone_id}/position",
            put(zones::position),
        )
        // Proof templates
        .route(
            "/api/proof-templates",
            get(proofs::list_templates).post(proofs::create_template),
        )
        .route(
            "/api/proof-templates/{id}",
            get(proofs::get_template)
                .put(proofs::replace_template)
                .delete(proofs::delete_template),
        )
        .route(
            "/api/proof-templates/{id}/requests",
            post(proofs::create_request),
        )
        .route("/api/proof-requests", get(proofs::list_requests))
        .route(
            "/api/proof-requests/{id}",
            get(proofs::get_request)
                .patch(proofs::update_request)
                .delete(proofs::delete_request),
        )
        .route(
            "/api/proof-requests/{id}/refresh",
            post(proofs::refresh_request),
        )
        // Settings
        .route(
            "/api/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .route("/api/settings/apps/{app}", put(settings::set_app))
        .layer(auth)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
