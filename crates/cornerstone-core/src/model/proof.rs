//! Proof templates and the proof requests created from them.
//!
//! A [`ProofTemplate`] lists the credentials, attributes, and predicates a
//! verifier asks for. Sending a template to the Orbit verifier creates a
//! [`ProofRequest`] whose status follows a small lifecycle:
//!
//! ```text
//! created ──► sent ──► verified | rejected | expired
//!    │          │
//!    └──────────┴────► failed
//! ```
//!
//! Terminal states accept no further transition.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::Record;
use crate::{Error, Result};

/// Comparison used by a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredicateOp {
    /// Greater than or equal.
    #[serde(rename = ">=")]
    Ge,
    /// Greater than.
    #[serde(rename = ">")]
    Gt,
    /// Less than or equal.
    #[serde(rename = "<=")]
    Le,
    /// Less than.
    #[serde(rename = "<")]
    Lt,
}

impl PredicateOp {
    /// The operator symbol.
    pub fn as_str(self) -> &'static str {
        match self {
            PredicateOp::Ge => ">=",
            PredicateOp::Gt => ">",
            PredicateOp::Le => "<=",
            PredicateOp::Lt => "<",
        }
    }

    /// Evaluate `lhs <op> rhs`.
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            PredicateOp::Ge => lhs >= rhs,
            PredicateOp::Gt => lhs > rhs,
            PredicateOp::Le => lhs <= rhs,
            PredicateOp::Lt => lhs < rhs,
        }
    }
}

impl fmt::Display for PredicateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A zero-knowledge predicate over an integer attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Attribute name.
    pub attribute: String,
    /// Comparison.
    pub operator: PredicateOp,
    /// Threshold.
    pub value: i64,
}

/// Who may have issued an acceptable credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    /// Required issuer DID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_did: Option<String>,
    /// Required schema id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
}

/// One credential requested by a proof template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedCredential {
    /// Name used to refer to this credential in the request.
    pub name: String,
    /// Catalogue entry the request was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    /// Credential type (VCT URI or schema name).
    pub credential_type: String,
    /// Attributes to reveal.
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Predicates to prove.
    #[serde(default)]
    pub predicates: Vec<Predicate>,
    /// Acceptable issuers.
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
}

impl RequestedCredential {
    fn validate(&self) -> Result<()> {
        if self.credential_type.trim().is_empty() {
            return Err(Error::validation_field(
                "requested.credential_type",
                format!("credential '{}' needs a type", self.name),
            ));
        }
        if self.attributes.is_empty() && self.predicates.is_empty() {
            return Err(Error::validation_field(
                "requested.attributes",
                format!("credential '{}' requests nothing", self.name),
            ));
        }
        let mut seen = HashSet::new();
        for attribute in &self.attributes {
            if attribute.trim().is_empty() {
                return Err(Error::validation_field(
                    "requested.attributes",
                    "attribute names must not be empty",
                ));
            }
            if !seen.insert(attribute.as_str()) {
                return Err(Error::validation_field(
                    "requested.attributes",
                    format!("duplicate attribute '{attribute}' in '{}'", self.name),
                ));
            }
        }
        if self.predicates.iter().any(|p| p.attribute.trim().is_empty()) {
            return Err(Error::validation_field(
                "requested.predicates",
                "predicate attribute must not be empty",
            ));
        }
        Ok(())
    }
}

/// A reusable proof request definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofTemplate {
    /// Record id.
    #[serde(default)]
    pub id: String,
    /// Template name.
    pub name: String,
    /// Purpose shown to the holder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Requested credentials.
    #[serde(default)]
    pub requested: Vec<RequestedCredential>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for ProofTemplate {
    const KIND: &'static str = "proof_templates";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn stamp(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation_field("name", "must not be empty"));
        }
        if self.requested.is_empty() {
            return Err(Error::validation_field(
                "requested",
                "at least one credential must be requested",
            ));
        }
        let mut names = HashSet::new();
        for requested in &self.requested {
            if !names.insert(requested.name.as_str()) {
                return Err(Error::validation_field(
                    "requested.name",
                    format!("duplicate requested credential '{}'", requested.name),
                ));
            }
            requested.validate()?;
        }
        Ok(())
    }
}

/// Status of a proof request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofRequestStatus {
    /// Recorded locally.
    #[default]
    Created,
    /// Accepted by the verifier, waiting for the holder.
    Sent,
    /// Presentation verified.
    Verified,
    /// Presentation rejected.
    Rejected,
    /// The holder did not respond in time.
    Expired,
    /// The request could not be delivered or processed.
    Failed,
}

impl ProofRequestStatus {
    /// Whether no further transitions are allowed.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Verified | Self::Rejected | Self::Expired | Self::Failed
        )
    }

    /// Whether `self -> next` is a valid lifecycle step.
    pub fn can_transition_to(self, next: Self) -> bool {
        use ProofRequestStatus::*;
        matches!(
            (self, next),
            (Created, Sent)
                | (Created, Failed)
                | (Sent, Verified)
                | (Sent, Rejected)
                | (Sent, Expired)
                | (Sent, Failed)
        )
    }

    /// Lowercase name as used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Sent => "sent",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ProofRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proof request sent (or about to be sent) to the verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofRequest {
    /// Record id.
    #[serde(default)]
    pub id: String,
    /// Template the request was created from.
    pub template_id: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: ProofRequestStatus,
    /// Id assigned by the Orbit verifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbit_request_id: Option<String>,
    /// URL (or deep link) the holder opens to respond.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_url: Option<String>,
    /// Revealed attribute values.
    #[serde(default)]
    pub revealed: BTreeMap<String, Value>,
    /// Last error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProofRequest {
    /// A request in the `created` state.
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            template_id: template_id.into(),
            status: ProofRequestStatus::Created,
            orbit_request_id: None,
            presentation_url: None,
            revealed: BTreeMap::new(),
            error: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Move to `next`.
    ///
    /// Returns `Ok(false)` when already in `next`, `Ok(true)` on a change,
    /// and a validation error for a step the lifecycle does not allow.
    pub fn transition(&mut self, next: ProofRequestStatus) -> Result<bool> {
        if self.status == next {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(Error::validation_field(
                "status",
                format!("cannot move proof request from {} to {next}", self.status),
            ));
        }
        log::debug!("Proof request {}: {} -> {next}", self.id, self.status);
        self.status = next;
        Ok(true)
    }

    /// Record a failure and move to `failed` when the lifecycle allows it.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        if self.status.can_transition_to(ProofRequestStatus::Failed) {
            self.status = ProofRequestStatus::Failed;
        }
    }
}

impl Record for ProofRequest {
    const KIND: &'static str = "proof_requests";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn stamp(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }

    fn validate(&self) -> Result<()> {
        if self.template_id.trim().is_empty() {
            return Err(Error::validation_field("template_id", "must not be empty"));
        }
        Ok(())
    }
}
