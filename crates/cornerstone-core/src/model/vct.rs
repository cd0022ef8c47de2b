//! VCT (Verifiable Credential Type) definitions.
//!
//! A [`VctDefinition`] is what the VCT builder edits: the SD-JWT-VC type
//! metadata document ([`TypeMetadata`]) plus console bookkeeping (a linked
//! zone template, where it was published, timestamps). Only the metadata is
//! rendered when publishing to the VDR.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::Record;
use crate::util::ids::{is_identifier, normalize_id};
use crate::{Error, Result};

// ============================================================================
// Claim paths
// ============================================================================

/// One step of a claim path: an object key, an array index, or `null`
/// (every element of an array).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimPathElement {
    /// Object member name.
    Key(String),
    /// Array index.
    Index(u64),
    /// All array elements.
    Wildcard,
}

impl From<&str> for ClaimPathElement {
    fn from(key: &str) -> Self {
        ClaimPathElement::Key(key.to_string())
    }
}

impl From<u64> for ClaimPathElement {
    fn from(index: u64) -> Self {
        ClaimPathElement::Index(index)
    }
}

/// A claim path as an ordered list of steps.
pub type ClaimPath = Vec<ClaimPathElement>;

/// Render a claim path as `address.street`, `nationalities[0]`, `degrees[*]`.
pub fn format_claim_path(path: &[ClaimPathElement]) -> String {
    let mut out = String::new();
    for element in path {
        match element {
            ClaimPathElement::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            ClaimPathElement::Index(i) => out.push_str(&format!("[{i}]")),
            ClaimPathElement::Wildcard => out.push_str("[*]"),
        }
    }
    out
}

// ============================================================================
// Claim metadata
// ============================================================================

/// Selective disclosure policy for a claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdPolicy {
    /// Must be selectively disclosable.
    Always,
    /// Issuer decides.
    #[default]
    Allowed,
    /// Must never be selectively disclosable.
    Never,
}

impl fmt::Display for SdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SdPolicy::Always => "always",
            SdPolicy::Allowed => "allowed",
            SdPolicy::Never => "never",
        })
    }
}

/// Localized label for a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimDisplay {
    /// Language tag.
    pub lang: String,
    /// Human-readable label.
    pub label: String,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Metadata for one claim of the credential type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimMetadata {
    /// Where the claim lives in the credential.
    pub path: ClaimPath,
    /// Localized labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display: Vec<ClaimDisplay>,
    /// Selective disclosure policy.
    #[serde(default)]
    pub sd: SdPolicy,
    /// Whether the issuer must include the claim.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mandatory: bool,
    /// Placeholder id used by SVG templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg_id: Option<String>,
}

impl ClaimMetadata {
    /// A top-level claim with a single English label.
    pub fn simple(key: &str, label: &str) -> Self {
        Self {
            path: vec![ClaimPathElement::from(key)],
            display: vec![ClaimDisplay {
                lang: "en".to_string(),
                label: label.to_string(),
                description: None,
            }],
            sd: SdPolicy::default(),
            mandatory: false,
            svg_id: None,
        }
    }

    /// The first display label, if any.
    pub fn label(&self) -> Option<&str> {
        self.display.first().map(|d| d.label.as_str())
    }
}

// ============================================================================
// Display / rendering
// ============================================================================

/// Issuer or credential logo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logo {
    /// Image URI.
    pub uri: String,
    /// Alternative text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

/// Simple color-and-logo rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleRendering {
    /// Logo shown on the card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<Logo>,
    /// `#RRGGBB` background.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// `#RRGGBB` text color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

/// Hints describing when an SVG template applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SvgTemplateProperties {
    /// `portrait` or `landscape`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    /// `light` or `dark`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<String>,
    /// `normal` or `high`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrast: Option<String>,
}

/// An SVG card template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvgTemplate {
    /// Template URI.
    pub uri: String,
    /// Applicability hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SvgTemplateProperties>,
}

/// Rendering methods for one display locale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rendering {
    /// Simple rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple: Option<SimpleRendering>,
    /// SVG templates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub svg_templates: Vec<SvgTemplate>,
}

/// Localized display metadata for the credential type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VctDisplay {
    /// Language tag.
    pub lang: String,
    /// Localized credential name.
    pub name: String,
    /// Localized description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rendering methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendering: Option<Rendering>,
}

// ============================================================================
// Type metadata document
// ============================================================================

/// The publishable SD-JWT-VC type metadata document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeMetadata {
    /// Type identifier (usually a URL).
    #[serde(default)]
    pub vct: String,
    /// Developer-facing name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Developer-facing description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parent type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Localized display metadata.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display: Vec<VctDisplay>,
    /// Claim metadata.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<ClaimMetadata>,
    /// JSON schema for the credential payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_uri: Option<String>,
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn check_color(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(color) if !is_hex_color(color) => Err(Error::validation_field(
            field,
            format!("'{color}' is not a #RRGGBB color"),
        )),
        _ => Ok(()),
    }
}

impl TypeMetadata {
    /// Check the document against the builder's rules.
    pub fn validate(&self) -> Result<()> {
        if self.vct.trim().is_empty() {
            return Err(Error::validation_field("vct", "must not be empty"));
        }

        let mut langs = HashSet::new();
        for display in &self.display {
            if display.lang.trim().is_empty() {
                return Err(Error::validation_field("display.lang", "must not be empty"));
            }
            if !langs.insert(display.lang.as_str()) {
                return Err(Error::validation_field(
                    "display.lang",
                    format!("duplicate display language '{}'", display.lang),
                ));
            }
            if display.name.trim().is_empty() {
                return Err(Error::validation_field("display.name", "must not be empty"));
            }
            if let Some(rendering) = &display.rendering {
                if let Some(simple) = &rendering.simple {
                    check_color(
                        "display.rendering.simple.background_color",
                        simple.background_color.as_deref(),
                    )?;
                    check_color(
                        "display.rendering.simple.text_color",
                        simple.text_color.as_deref(),
                    )?;
                }
                if rendering.svg_templates.iter().any(|t| t.uri.trim().is_empty()) {
                    return Err(Error::validation_field(
                        "display.rendering.svg_templates.uri",
                        "must not be empty",
                    ));
                }
            }
        }

        let mut paths = HashSet::new();
        let mut svg_ids = HashSet::new();
        for claim in &self.claims {
            match claim.path.first() {
                None => return Err(Error::validation_field("claims.path", "must not be empty")),
                Some(ClaimPathElement::Key(key)) if !key.is_empty() => {}
                Some(_) => {
                    return Err(Error::validation_field(
                        "claims.path",
                        "must start with an object key",
                    ));
                }
            }
            if !paths.insert(&claim.path) {
                return Err(Error::validation_field(
                    "claims.path",
                    format!("duplicate claim path '{}'", format_claim_path(&claim.path)),
                ));
            }
            let mut claim_langs = HashSet::new();
            for display in &claim.display {
                if !claim_langs.insert(display.lang.as_str()) {
                    return Err(Error::validation_field(
                        "claims.display.lang",
                        format!(
                            "duplicate language '{}' for claim '{}'",
                            display.lang,
                            format_claim_path(&claim.path)
                        ),
                    ));
                }
            }
            if let Some(svg_id) = &claim.svg_id {
                if !is_identifier(svg_id) {
                    return Err(Error::validation_field(
                        "claims.svg_id",
                        format!("'{svg_id}' is not a valid identifier"),
                    ));
                }
                if !svg_ids.insert(svg_id.as_str()) {
                    return Err(Error::validation_field(
                        "claims.svg_id",
                        format!("duplicate svg_id '{svg_id}'"),
                    ));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// VctDefinition
// ============================================================================

/// A VCT being edited in the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VctDefinition {
    /// Record id.
    #[serde(default)]
    pub id: String,
    /// The type metadata document.
    #[serde(flatten)]
    pub metadata: TypeMetadata,
    /// Card layout used by the builder preview.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_template_id: Option<String>,
    /// VDR URL of the last publish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_url: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl VctDefinition {
    /// Wrap a metadata document in a new (unsaved) definition.
    pub fn new(metadata: TypeMetadata) -> Self {
        Self {
            id: String::new(),
            metadata,
            zone_template_id: None,
            published_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Parse a type metadata document.
    ///
    /// A document that does not match the metadata shape is a validation
    /// error on `document`.
    pub fn from_type_metadata(document: &Value) -> Result<Self> {
        if !document.is_object() {
            return Err(Error::validation_field(
                "document",
                "type metadata must be a JSON object",
            ));
        }
        let metadata: TypeMetadata = serde_json::from_value(document.clone())
            .map_err(|e| Error::validation_field("document", e.to_string()))?;
        Ok(Self::new(metadata))
    }

    /// Render the publishable metadata document.
    pub fn to_type_metadata(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.metadata)?)
    }

    /// Name shown in lists: the metadata name, else the last `vct` segment.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.metadata.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        self.metadata
            .vct
            .trim_end_matches('/')
            .rsplit(['/', ':', '#'])
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// File name used when publishing to the VDR.
    pub fn file_name(&self) -> String {
        let stem = normalize_id(&self.display_name());
        if stem.is_empty() {
            format!("{}.json", normalize_id(&self.id))
        } else {
            format!("{stem}.json")
        }
    }

    /// Look up a claim by path.
    pub fn claim(&self, path: &[ClaimPathElement]) -> Option<&ClaimMetadata> {
        self.metadata.claims.iter().find(|c| c.path == path)
    }
}

impl Record for VctDefinition {
    const KIND: &'static str = "vcts";

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
        self.metadata.validate()
    }
}
