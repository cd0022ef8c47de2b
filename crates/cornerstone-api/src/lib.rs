//! REST API for the Cornerstone console.
//!
//! - [`ConsoleConfig`]: server configuration
//! - [`AppState`]: repositories, tenant settings, and outbound clients
//! - [`router`]: the axum router for every console app
//! - [`serve`]: bind and serve with graceful shutdown
//!
//! Every error leaves as `{"error": {"category", "message", "field"?}}`,
//! see [`ApiError`].

pub mod config;
pub mod error;
mod routes;
pub mod server;
pub mod state;

pub use config::ConsoleConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create as router;
pub use server::serve;
pub use state::{AppState, Repositories, Services, SharedState};
