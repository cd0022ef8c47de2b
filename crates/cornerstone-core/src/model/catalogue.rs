//! Data catalogue: entity data types, vocabulary types, and the mapping
//! canvas that connects them.
//!
//! A [`DataType`] owns its properties together with two kinds of mappings:
//! provider mappings (where an external provider supplies a value) and
//! vocabulary mappings (canvas edges from a property to a property of a
//! [`VocabType`]). Every mapping references an existing property; removing
//! or renaming a property carries its mappings along.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::value_type::ValueType;
use crate::record::Record;
use crate::util::ids::{new_id, normalize_id};
use crate::{Error, Result};

/// Horizontal distance between the property column and the vocabulary column.
pub const CANVAS_COLUMN_GAP: f64 = 360.0;

/// Vertical distance between canvas rows.
pub const CANVAS_ROW_GAP: f64 = 80.0;

/// A property of an entity data type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property id; derived from the name when empty.
    #[serde(default)]
    pub id: String,
    /// Property name.
    pub name: String,
    /// Human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Value type.
    #[serde(default)]
    pub value_type: ValueType,
    /// Whether a value must be present.
    #[serde(default)]
    pub required: bool,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Property {
    /// A string property whose id is derived from `name`.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        let name = name.into();
        Self {
            id: normalize_id(&name),
            name,
            label: None,
            value_type,
            required: false,
            description: None,
        }
    }

    fn fill_id(&mut self) {
        let trimmed = self.id.trim();
        self.id = if trimmed.is_empty() {
            normalize_id(&self.name)
        } else {
            trimmed.to_string()
        };
    }
}

/// Where an external data provider supplies a property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMapping {
    /// Mapping id; generated when empty.
    #[serde(default)]
    pub id: String,
    /// Provider name.
    pub provider: String,
    /// Mapped property.
    pub property_id: String,
    /// Location of the value in the provider's payload.
    pub source_path: String,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A property of a vocabulary type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabProperty {
    /// Property id, unique within its vocabulary type.
    pub id: String,
    /// Property name.
    pub name: String,
    /// Vocabulary IRI of the property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Expected value type.
    #[serde(default)]
    pub range: ValueType,
}

/// A vocabulary type (for example a schema.org class).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabType {
    /// Record id.
    #[serde(default)]
    pub id: String,
    /// Type name.
    pub name: String,
    /// Vocabulary IRI of the type.
    pub uri: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Properties.
    #[serde(default)]
    pub properties: Vec<VocabProperty>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl VocabType {
    /// Look up a property by id.
    pub fn property(&self, id: &str) -> Option<&VocabProperty> {
        self.properties.iter().find(|p| p.id == id)
    }
}

impl Record for VocabType {
    const KIND: &'static str = "vocab_types";

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

    fn normalize(&mut self) {
        for property in &mut self.properties {
            if property.id.trim().is_empty() {
                property.id = normalize_id(&property.name);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation_field("name", "must not be empty"));
        }
        if self.uri.trim().is_empty() {
            return Err(Error::validation_field("uri", "must not be empty"));
        }
        let mut ids = HashSet::new();
        for property in &self.properties {
            if property.id.is_empty() {
                return Err(Error::validation_field("properties.id", "must not be empty"));
            }
            if !ids.insert(property.id.as_str()) {
                return Err(Error::validation_field(
                    "properties.id",
                    format!("duplicate property '{}'", property.id),
                ));
            }
        }
        Ok(())
    }
}

/// A canvas edge from an entity property to a vocabulary property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabMapping {
    /// Entity property.
    pub property_id: String,
    /// Target vocabulary type.
    pub vocab_type_id: String,
    /// Target property within the vocabulary type.
    pub vocab_property_id: String,
    /// Whether the value types are compatible. Computed on mapping.
    #[serde(default)]
    pub compatible: bool,
}

/// An entity data type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataType {
    /// Record id.
    #[serde(default)]
    pub id: String,
    /// Type name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Grouping used by the catalogue view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Properties.
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Provider mappings.
    #[serde(default)]
    pub provider_mappings: Vec<ProviderMapping>,
    /// Vocabulary mappings (canvas edges).
    #[serde(default)]
    pub vocab_mappings: Vec<VocabMapping>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DataType {
    /// An empty data type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: None,
            category: None,
            properties: Vec::new(),
            provider_mappings: Vec::new(),
            vocab_mappings: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Look up a property by id.
    pub fn property(&self, id: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    /// Whether any vocabulary mapping points at `vocab_type_id`.
    pub fn references_vocab(&self, vocab_type_id: &str) -> bool {
        self.vocab_mappings
            .iter()
            .any(|m| m.vocab_type_id == vocab_type_id)
    }

    /// Add a property. Its id is derived from the name when empty.
    pub fn add_property(&mut self, mut property: Property) -> Result<&Property> {
        property.fill_id();
        if property.id.is_empty() {
            return Err(Error::validation_field("name", "must not be empty"));
        }
        if self.property(&property.id).is_some() {
            return Err(Error::already_exists("properties", property.id));
        }
        self.properties.push(property);
        let last = self.properties.len() - 1;
        Ok(&self.properties[last])
    }

    /// Replace the property `id`. An empty replacement id keeps `id`;
    /// a different one renames the property and its mappings.
    pub fn update_property(&mut self, id: &str, mut property: Property) -> Result<&Property> {
        let index = self
            .properties
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::not_found("properties", id))?;

        property.id = property.id.trim().to_string();
        if property.id.is_empty() {
            property.id = id.to_string();
        }
        if property.id != id {
            if self.property(&property.id).is_some() {
                return Err(Error::already_exists("properties", property.id));
            }
            for mapping in &mut self.provider_mappings {
                if mapping.property_id == id {
                    mapping.property_id.clone_from(&property.id);
                }
            }
            for mapping in &mut self.vocab_mappings {
                if mapping.property_id == id {
                    mapping.property_id.clone_from(&property.id);
                }
            }
        }
        self.properties[index] = property;
        Ok(&self.properties[index])
    }

    /// Remove a property together with every mapping that references it.
    pub fn remove_property(&mut self, id: &str) -> Result<Property> {
        let index = self
            .properties
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::not_found("properties", id))?;
        self.provider_mappings.retain(|m| m.property_id != id);
        self.vocab_mappings.retain(|m| m.property_id != id);
        Ok(self.properties.remove(index))
    }

    /// Add a provider mapping for an existing property.
    pub fn add_provider_mapping(&mut self, mut mapping: ProviderMapping) -> Result<&ProviderMapping> {
        if self.property(&mapping.property_id).is_none() {
            return Err(Error::not_found("properties", mapping.property_id));
        }
        if mapping.provider.trim().is_empty() {
            return Err(Error::validation_field("provider", "must not be empty"));
        }
        mapping.id = mapping.id.trim().to_string();
        if mapping.id.is_empty() {
            mapping.id = new_id();
        } else if self.provider_mappings.iter().any(|m| m.id == mapping.id) {
            return Err(Error::already_exists("provider_mappings", mapping.id));
        }
        self.provider_mappings.push(mapping);
        let last = self.provider_mappings.len() - 1;
        Ok(&self.provider_mappings[last])
    }

    /// Remove a provider mapping by id.
    pub fn remove_provider_mapping(&mut self, id: &str) -> Result<ProviderMapping> {
        let index = self
            .provider_mappings
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| Error::not_found("provider_mappings", id))?;
        Ok(self.provider_mappings.remove(index))
    }

    /// Map a property onto a property of `vocab`.
    ///
    /// Each (property, vocabulary type) pair has at most one edge; mapping
    /// again replaces it. Incompatible value types are allowed and flagged.
    pub fn map_property(&mut self, mut mapping: VocabMapping, vocab: &VocabType) -> Result<VocabMapping> {
        let property = self
            .property(&mapping.property_id)
            .ok_or_else(|| Error::not_found("properties", mapping.property_id.clone()))?;
        if mapping.vocab_type_id != vocab.id {
            return Err(Error::validation_field(
                "vocab_type_id",
                format!(
                    "mapping targets '{}' but vocabulary '{}' was supplied",
                    mapping.vocab_type_id, vocab.id
                ),
            ));
        }
        let target = vocab
            .property(&mapping.vocab_property_id)
            .ok_or_else(|| Error::not_found("vocab_properties", mapping.vocab_property_id.clone()))?;

        mapping.compatible = property.value_type.is_compatible_with(target.range);
        if !mapping.compatible {
            log::debug!(
                "Mapping {}.{} ({}) onto {}.{} ({}) is type-incompatible",
                self.id,
                property.id,
                property.value_type,
                vocab.id,
                target.id,
                target.range
            );
        }

        match self.vocab_mappings.iter_mut().find(|m| {
            m.property_id == mapping.property_id && m.vocab_type_id == mapping.vocab_type_id
        }) {
            Some(existing) => *existing = mapping.clone(),
            None => self.vocab_mappings.push(mapping.clone()),
        }
        Ok(mapping)
    }

    /// Remove the edge between a property and a vocabulary type.
    pub fn unmap_property(&mut self, property_id: &str, vocab_type_id: &str) -> Result<VocabMapping> {
        let index = self
            .vocab_mappings
            .iter()
            .position(|m| m.property_id == property_id && m.vocab_type_id == vocab_type_id)
            .ok_or_else(|| {
                Error::not_found("vocab_mappings", format!("{property_id}/{vocab_type_id}"))
            })?;
        Ok(self.vocab_mappings.remove(index))
    }

    /// Lay out the mapping canvas for this data type.
    ///
    /// The entity and its properties form the left column; every referenced
    /// vocabulary type, followed by its mapped properties, forms the right
    /// column. Compatibility is recomputed against `vocabs` where possible.
    pub fn canvas(&self, vocabs: &[VocabType]) -> MappingCanvas {
        let mut nodes = vec![CanvasNode {
            id: entity_node_id(&self.id),
            kind: CanvasNodeKind::Entity,
            label: self.name.clone(),
            value_type: None,
            x: 0.0,
            y: 0.0,
        }];

        for (row, property) in self.properties.iter().enumerate() {
            nodes.push(CanvasNode {
                id: property_node_id(&property.id),
                kind: CanvasNodeKind::Property,
                label: property.label.clone().unwrap_or_else(|| property.name.clone()),
                value_type: Some(property.value_type),
                x: 0.0,
                y: (row + 1) as f64 * CANVAS_ROW_GAP,
            });
        }

        // Vocabulary types in order of first reference.
        let mut vocab_ids: Vec<&str> = Vec::new();
        for mapping in &self.vocab_mappings {
            if !vocab_ids.contains(&mapping.vocab_type_id.as_str()) {
                vocab_ids.push(&mapping.vocab_type_id);
            }
        }

        let mut row = 0usize;
        for vocab_id in vocab_ids {
            let vocab = vocabs.iter().find(|v| v.id == vocab_id);
            nodes.push(CanvasNode {
                id: vocab_node_id(vocab_id),
                kind: CanvasNodeKind::VocabType,
                label: vocab.map_or_else(|| vocab_id.to_string(), |v| v.name.clone()),
                value_type: None,
                x: CANVAS_COLUMN_GAP,
                y: row as f64 * CANVAS_ROW_GAP,
            });
            row += 1;

            let mut seen = HashSet::new();
            for mapping in self.vocab_mappings.iter().filter(|m| m.vocab_type_id == vocab_id) {
                if !seen.insert(mapping.vocab_property_id.as_str()) {
                    continue;
                }
                let target = vocab.and_then(|v| v.property(&mapping.vocab_property_id));
                nodes.push(CanvasNode {
                    id: vocab_property_node_id(vocab_id, &mapping.vocab_property_id),
                    kind: CanvasNodeKind::VocabProperty,
                    label: target.map_or_else(|| mapping.vocab_property_id.clone(), |p| p.name.clone()),
                    value_type: target.map(|p| p.range),
                    x: CANVAS_COLUMN_GAP,
                    y: row as f64 * CANVAS_ROW_GAP,
                });
                row += 1;
            }
        }

        let edges = self
            .vocab_mappings
            .iter()
            .map(|mapping| {
                let compatible = self
                    .property(&mapping.property_id)
                    .zip(
                        vocabs
                            .iter()
                            .find(|v| v.id == mapping.vocab_type_id)
                            .and_then(|v| v.property(&mapping.vocab_property_id)),
                    )
                    .map_or(mapping.compatible, |(p, t)| {
                        p.value_type.is_compatible_with(t.range)
                    });
                CanvasEdge {
                    id: format!("{}->{}", mapping.property_id, mapping.vocab_type_id),
                    source: property_node_id(&mapping.property_id),
                    target: vocab_property_node_id(&mapping.vocab_type_id, &mapping.vocab_property_id),
                    compatible,
                }
            })
            .collect();

        MappingCanvas { nodes, edges }
    }

    fn fill_nested_ids(&mut self) {
        for property in &mut self.properties {
            property.fill_id();
        }
        for mapping in &mut self.provider_mappings {
            if mapping.id.trim().is_empty() {
                mapping.id = new_id();
            }
        }
    }
}

impl Record for DataType {
    const KIND: &'static str = "data_types";

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

    fn normalize(&mut self) {
        self.fill_nested_ids();
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation_field("name", "must not be empty"));
        }

        let mut ids = HashSet::new();
        for property in &self.properties {
            if property.id.is_empty() {
                return Err(Error::validation_field("properties.id", "must not be empty"));
            }
            if !ids.insert(property.id.as_str()) {
                return Err(Error::validation_field(
                    "properties.id",
                    format!("duplicate property '{}'", property.id),
                ));
            }
        }

        let mut mapping_ids = HashSet::new();
        for mapping in &self.provider_mappings {
            if !ids.contains(mapping.property_id.as_str()) {
                return Err(Error::validation_field(
                    "provider_mappings.property_id",
                    format!("unknown property '{}'", mapping.property_id),
                ));
            }
            if !mapping_ids.insert(mapping.id.as_str()) {
                return Err(Error::validation_field(
                    "provider_mappings.id",
                    format!("duplicate mapping '{}'", mapping.id),
                ));
            }
        }

        let mut edges = HashSet::new();
        for mapping in &self.vocab_mappings {
            if !ids.contains(mapping.property_id.as_str()) {
                return Err(Error::validation_field(
                    "vocab_mappings.property_id",
                    format!("unknown property '{}'", mapping.property_id),
                ));
            }
            if !edges.insert((mapping.property_id.as_str(), mapping.vocab_type_id.as_str())) {
                return Err(Error::validation_field(
                    "vocab_mappings",
                    format!(
                        "property '{}' is mapped to '{}' more than once",
                        mapping.property_id, mapping.vocab_type_id
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Kind of canvas node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CanvasNodeKind {
    /// The data type itself.
    Entity,
    /// A data type property.
    Property,
    /// A referenced vocabulary type.
    VocabType,
    /// A mapped vocabulary property.
    VocabProperty,
}

/// A positioned canvas node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    /// Node id, unique within the canvas.
    pub id: String,
    /// Node kind.
    pub kind: CanvasNodeKind,
    /// Display label.
    pub label: String,
    /// Value type of property nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

/// A canvas edge between a property node and a vocabulary property node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasEdge {
    /// Edge id.
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Whether the value types are compatible.
    pub compatible: bool,
}

/// The mapping canvas for one data type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingCanvas {
    /// Nodes.
    pub nodes: Vec<CanvasNode>,
    /// Edges.
    pub edges: Vec<CanvasEdge>,
}

impl MappingCanvas {
    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

fn entity_node_id(id: &str) -> String {
    format!("entity:{id}")
}

fn property_node_id(id: &str) -> String {
    format!("property:{id}")
}

fn vocab_node_id(id: &str) -> String {
    format!("vocab:{id}")
}

fn vocab_property_node_id(vocab_id: &str, property_id: &str) -> String {
    format!("vocab:{vocab_id}:{property_id}")
}
