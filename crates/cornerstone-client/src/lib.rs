//! Outbound clients for the Cornerstone console.
//!
//! - [`Verifier`] / [`OrbitClient`]: proof requests against the Orbit LOB
//!   verifier API
//! - [`Vdr`] / [`GithubVdr`]: publishing documents to a GitHub repository
//!   that serves as the verifiable data registry, and fetching documents
//!   back by URL
//!
//! Both clients take their settings per call, so a tenant settings change
//! applies without rebuilding the client.

pub mod github;
mod http;
pub mod orbit;

pub use github::{GithubVdr, Vdr};
pub use orbit::{OrbitClient, Verifier, VerifierProofRequest, VerifierProofStatus};
