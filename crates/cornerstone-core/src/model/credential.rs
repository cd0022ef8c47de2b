//! Credentials catalogue records.
//!
//! Credentials are created by hand, imported from a document (VCT type
//! metadata, JSON schema, or AnonCreds schema), or cloned from another
//! catalogue entry.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::value_type::ValueType;
use crate::model::vct::{ClaimPathElement, VctDefinition};
use crate::record::Record;
use crate::util::ids::new_id;
use crate::{Error, Result};

/// Credential format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialFormat {
    /// SD-JWT verifiable credential.
    #[default]
    SdJwtVc,
    /// Hyperledger AnonCreds.
    Anoncreds,
    /// W3C verifiable credential.
    W3cVc,
}

/// Where a catalogue entry came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialOrigin {
    /// Entered in the console.
    #[default]
    Created,
    /// Imported from a document.
    Imported {
        /// Where the document was fetched from.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_url: Option<String>,
    },
    /// Cloned from another catalogue entry.
    Cloned {
        /// Id of the original credential.
        from: String,
    },
}

/// A single credential attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialAttribute {
    /// Attribute name as it appears in the credential.
    pub name: String,
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Value type.
    #[serde(default)]
    pub value_type: ValueType,
}

impl CredentialAttribute {
    /// A string attribute without a label.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            value_type: ValueType::String,
        }
    }
}

/// A credential catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Record id.
    #[serde(default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Issuing organization.
    #[serde(default)]
    pub issuer_name: String,
    /// Issuer DID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_did: Option<String>,
    /// Credential format.
    #[serde(default)]
    pub format: CredentialFormat,
    /// Schema location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_url: Option<String>,
    /// VCT location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vct_url: Option<String>,
    /// Attributes.
    #[serde(default)]
    pub attributes: Vec<CredentialAttribute>,
    /// Provenance.
    #[serde(default)]
    pub origin: CredentialOrigin,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// A new, empty credential with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: String::new(),
            issuer_name: String::new(),
            issuer_did: None,
            format: CredentialFormat::default(),
            schema_url: None,
            vct_url: None,
            attributes: Vec::new(),
            origin: CredentialOrigin::Created,
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Copy this credential under a new id.
    ///
    /// The copy records its origin and gets fresh timestamps.
    pub fn clone_as(&self, name: Option<&str>, now: DateTime<Utc>) -> Self {
        let mut copy = self.clone();
        copy.id = new_id();
        copy.name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => format!("{} (copy)", self.name),
        };
        copy.origin = CredentialOrigin::Cloned {
            from: self.id.clone(),
        };
        copy.stamp(now, now);
        copy
    }

    /// Case-insensitive match on name, issuer, or tags.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&q)
            || self.issuer_name.to_lowercase().contains(&q)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&q))
    }

    /// Derive a credential from an external document.
    ///
    /// Recognized documents:
    /// - VCT type metadata (has `vct`): attributes from top-level claim keys
    /// - AnonCreds schema (has `attrNames`)
    /// - JSON schema (has `properties`; a W3C `credentialSubject` is unwrapped)
    pub fn import(document: &Value, source_url: Option<&str>) -> Result<Self> {
        let origin = CredentialOrigin::Imported {
            source_url: source_url.map(str::to_string),
        };

        let mut credential = if document.get("vct").and_then(Value::as_str).is_some() {
            Self::from_vct(document, source_url)?
        } else if let Some(names) = document.get("attrNames").and_then(Value::as_array) {
            Self::from_anoncreds_schema(document, names, source_url)?
        } else if document.get("properties").is_some_and(Value::is_object) {
            Self::from_json_schema(document, source_url)?
        } else {
            return Err(Error::validation_field(
                "document",
                "expected VCT type metadata, an AnonCreds schema, or a JSON schema",
            ));
        };
        credential.origin = origin;
        Ok(credential)
    }

    fn from_vct(document: &Value, source_url: Option<&str>) -> Result<Self> {
        let def = VctDefinition::from_type_metadata(document)?;
        let mut credential = Self::new(def.display_name());
        credential.description = def.metadata.description.clone().unwrap_or_default();
        credential.format = CredentialFormat::SdJwtVc;
        credential.schema_url = def.metadata.schema_uri.clone();
        credential.vct_url = match source_url {
            Some(url) => Some(url.to_string()),
            None if def.metadata.vct.starts_with("http") => Some(def.metadata.vct.clone()),
            None => None,
        };

        let mut seen = HashSet::new();
        for claim in &def.metadata.claims {
            let Some(ClaimPathElement::Key(key)) = claim.path.first() else {
                continue;
            };
            if seen.insert(key.clone()) {
                let mut attribute = CredentialAttribute::new(key.clone());
                if claim.path.len() == 1 {
                    attribute.label = claim.label().map(str::to_string);
                } else {
                    attribute.value_type = ValueType::Object;
                }
                credential.attributes.push(attribute);
            }
        }
        Ok(credential)
    }

    fn from_anoncreds_schema(
        document: &Value,
        names: &[Value],
        source_url: Option<&str>,
    ) -> Result<Self> {
        let name = document
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation_field("document.name", "AnonCreds schema needs a name"))?;
        let mut credential = Self::new(name);
        credential.format = CredentialFormat::Anoncreds;
        credential.issuer_did = document
            .get("issuerId")
            .and_then(Value::as_str)
            .map(str::to_string);
        credential.schema_url = source_url.map(str::to_string);
        for value in names {
            let attr = value.as_str().ok_or_else(|| {
                Error::validation_field("document.attrNames", "attribute names must be strings")
            })?;
            credential.attributes.push(CredentialAttribute::new(attr));
        }
        Ok(credential)
    }

    fn from_json_schema(document: &Value, source_url: Option<&str>) -> Result<Self> {
        let name = document
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Imported credential");
        let mut credential = Self::new(name);
        credential.description = document
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        credential.schema_url = source_url
            .map(str::to_string)
            .or_else(|| document.get("$id").and_then(Value::as_str).map(str::to_string));

        let mut properties = document.get("properties").and_then(Value::as_object);
        if let Some(subject) = properties
            .and_then(|p| p.get("credentialSubject"))
            .and_then(|s| s.get("properties"))
            .and_then(Value::as_object)
        {
            credential.format = CredentialFormat::W3cVc;
            properties = Some(subject);
        }

        for (key, schema) in properties.into_iter().flatten() {
            credential.attributes.push(CredentialAttribute {
                name: key.clone(),
                label: schema
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                value_type: ValueType::from_json_schema(schema),
            });
        }
        Ok(credential)
    }
}

impl Record for Credential {
    const KIND: &'static str = "credentials";

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
        let mut names = HashSet::new();
        for attribute in &self.attributes {
            if attribute.name.trim().is_empty() {
                return Err(Error::validation_field(
                    "attributes.name",
                    "must not be empty",
                ));
            }
            if !names.insert(attribute.name.as_str()) {
                return Err(Error::validation_field(
                    "attributes.name",
                    format!("duplicate attribute '{}'", attribute.name),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn badge() -> Credential {
        let mut c = Credential::new("Employee Badge");
        c.id = "cred-1".into();
        c.issuer_name = "Acme Corp".into();
        c.attributes = vec![
            CredentialAttribute::new("given_name"),
            CredentialAttribute::new("employee_id"),
        ];
        c.tags = vec!["hr".into()];
        c
    }

    #[test]
    fn test_validate_ok() {
        assert!(badge().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_name() {
        let mut c = badge();
        c.name = "  ".into();
        assert_eq!(c.validate().unwrap_err().field(), Some("name"));
    }

    #[test]
    fn test_validate_rejects_duplicate_attributes() {
        let mut c = badge();
        c.attributes.push(CredentialAttribute::new("given_name"));
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate attribute 'given_name'"));
    }

    #[test]
    fn test_clone_as_default_name() {
        let original = badge();
        let now = Utc::now();
        let copy = original.clone_as(None, now);
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.name, "Employee Badge (copy)");
        assert_eq!(
            copy.origin,
            CredentialOrigin::Cloned {
                from: "cred-1".into()
            }
        );
        assert_eq!(copy.created_at, Some(now));
        assert_eq!(copy.attributes, original.attributes);
    }

    #[test]
    fn test_clone_as_named() {
        let copy = badge().clone_as(Some(" Contractor Badge "), Utc::now());
        assert_eq!(copy.name, "Contractor Badge");
    }

    #[test]
    fn test_matches() {
        let c = badge();
        assert!(c.matches("badge"));
        assert!(c.matches("ACME"));
        assert!(c.matches("hr"));
        assert!(c.matches(""));
        assert!(!c.matches("passport"));
    }

    #[test]
    fn test_import_vct() {
        let doc = json!({
            "vct": "https://vdr.example.org/vct/member.json",
            "name": "Member Card",
            "claims": [
                {"path": ["given_name"], "display": [{"lang": "en", "label": "Given name"}]},
                {"path": ["address", "street"]},
                {"path": ["address", "city"]}
            ]
        });
        let c = Credential::import(&doc, None).unwrap();
        assert_eq!(c.name, "Member Card");
        assert_eq!(c.format, CredentialFormat::SdJwtVc);
        assert_eq!(
            c.vct_url.as_deref(),
            Some("https://vdr.example.org/vct/member.json")
        );
        assert_eq!(c.attributes.len(), 2);
        assert_eq!(c.attributes[0].label.as_deref(), Some("Given name"));
        assert_eq!(c.attributes[1].name, "address");
        assert_eq!(c.attributes[1].value_type, ValueType::Object);
        assert_eq!(c.origin, CredentialOrigin::Imported { source_url: None });
    }

    #[test]
    fn test_import_anoncreds_schema() {
        let doc = json!({
            "issuerId": "did:indy:sovrin:abc",
            "name": "Business Card",
            "version": "1.0",
            "attrNames": ["business_name", "registration_date"]
        });
        let c = Credential::import(&doc, Some("https://vdr.example.org/schema.json")).unwrap();
        assert_eq!(c.format, CredentialFormat::Anoncreds);
        assert_eq!(c.issuer_did.as_deref(), Some("did:indy:sovrin:abc"));
        assert_eq!(c.attributes.len(), 2);
        assert_eq!(
            c.origin,
            CredentialOrigin::Imported {
                source_url: Some("https://vdr.example.org/schema.json".into())
            }
        );
    }

    #[test]
    fn test_import_w3c_json_schema() {
        let doc = json!({
            "$id": "https://example.org/schemas/degree.json",
            "title": "University Degree",
            "properties": {
                "credentialSubject": {
                    "type": "object",
                    "properties": {
                        "degree": {"type": "string", "title": "Degree"},
                        "graduated": {"type": "string", "format": "date"},
                        "gpa": {"type": "number"}
                    }
                }
            }
        });
        let c = Credential::import(&doc, None).unwrap();
        assert_eq!(c.format, CredentialFormat::W3cVc);
        assert_eq!(c.name, "University Degree");
        assert_eq!(
            c.schema_url.as_deref(),
            Some("https://example.org/schemas/degree.json")
        );
        let graduated = c.attributes.iter().find(|a| a.name == "graduated").unwrap();
        assert_eq!(graduated.value_type, ValueType::Date);
        let degree = c.attributes.iter().find(|a| a.name == "degree").unwrap();
        assert_eq!(degree.label.as_deref(), Some("Degree"));
    }

    #[test]
    fn test_import_rejects_unknown_document() {
        let err = Credential::import(&json!({"hello": "world"}), None).unwrap_err();
        assert_eq!(err.field(), Some("document"));
    }

    #[test]
    fn test_import_malformed_vct_is_validation_error() {
        let doc = json!({"vct": "urn:x", "claims": "not-a-list"});
        let err = Credential::import(&doc, None).unwrap_err();
        assert_eq!(err.category(), "validation");
        assert_eq!(err.field(), Some("document"));
    }

    #[test]
    fn test_origin_serialization() {
        let json = serde_json::to_value(CredentialOrigin::Cloned { from: "a".into() }).unwrap();
        assert_eq!(json, json!({"kind": "cloned", "from": "a"}));
        let json = serde_json::to_value(CredentialOrigin::Created).unwrap();
        assert_eq!(json, json!({"kind": "created"}));
    }

    #[test]
    fn test_minimal_deserialization() {
        let c: Credential = serde_json::from_value(json!({"name": "Only name"})).unwrap();
        assert_eq!(c.id, "");
        assert_eq!(c.format, CredentialFormat::SdJwtVc);
        assert_eq!(c.origin, CredentialOrigin::Created);
    }
}
