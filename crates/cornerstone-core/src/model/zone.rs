//! Zone templates: card layouts used by the VCT builder.
//!
//! Positions are percentages of the card, so a zone at
//! `{x: 0, y: 0, width: 100, height: 100}` covers the whole face.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::vct::ClaimPath;
use crate::record::Record;
use crate::util::ids::new_id;
use crate::{Error, Result};

/// Full card extent, in percent.
pub const CARD_EXTENT: f64 = 100.0;

/// Smallest width or height a zone can be resized to, in percent.
pub const MIN_ZONE_SIZE: f64 = 1.0;

/// Which side of the card a template describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardFace {
    /// Front of the card.
    #[default]
    Front,
    /// Back of the card.
    Back,
}

/// What a zone renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneRole {
    /// Issuer logo.
    Logo,
    /// Card title.
    Title,
    /// Card subtitle.
    Subtitle,
    /// A claim value.
    Attribute,
    /// A picture (portrait, artwork).
    Image,
    /// Static text.
    Text,
    /// QR code.
    Qr,
}

/// A rectangle on the card, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZonePosition {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl ZonePosition {
    /// Whether the rectangle lies entirely on the card and has a positive area.
    pub fn is_inside_card(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= CARD_EXTENT
            && self.y + self.height <= CARD_EXTENT
    }

    /// Whether two rectangles share any area. Touching edges do not count.
    pub fn intersects(&self, other: &ZonePosition) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    /// Clamp size first, then position, so the rectangle fits the card.
    fn clamped(self) -> Self {
        let width = clamp_value(self.width, MIN_ZONE_SIZE, CARD_EXTENT);
        let height = clamp_value(self.height, MIN_ZONE_SIZE, CARD_EXTENT);
        Self {
            x: clamp_value(self.x, 0.0, CARD_EXTENT - width),
            y: clamp_value(self.y, 0.0, CARD_EXTENT - height),
            width,
            height,
        }
    }
}

// NaN collapses to the lower bound.
fn clamp_value(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// A positioned zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone id, unique within the template; generated when empty.
    #[serde(default)]
    pub id: String,
    /// What the zone renders.
    pub role: ZoneRole,
    /// Label shown in the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Claim rendered by attribute zones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_path: Option<ClaimPath>,
    /// Placement.
    pub position: ZonePosition,
}

/// A card layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTemplate {
    /// Record id.
    #[serde(default)]
    pub id: String,
    /// Template name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Card face.
    #[serde(default)]
    pub face: CardFace,
    /// Zones.
    #[serde(default)]
    pub zones: Vec<Zone>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ZoneTemplate {
    /// An empty front-face template.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: None,
            face: CardFace::Front,
            zones: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn zone_mut(&mut self, id: &str) -> Result<&mut Zone> {
        self.zones
            .iter_mut()
            .find(|z| z.id == id)
            .ok_or_else(|| Error::not_found("zones", id))
    }

    /// Move a zone, keeping it on the card.
    pub fn move_zone(&mut self, id: &str, x: f64, y: f64) -> Result<ZonePosition> {
        let zone = self.zone_mut(id)?;
        zone.position = ZonePosition { x, y, ..zone.position }.clamped();
        Ok(zone.position)
    }

    /// Resize a zone, keeping it on the card. The top-left corner moves
    /// only if the new size would not fit otherwise.
    pub fn resize_zone(&mut self, id: &str, width: f64, height: f64) -> Result<ZonePosition> {
        let zone = self.zone_mut(id)?;
        zone.position = ZonePosition {
            width,
            height,
            ..zone.position
        }
        .clamped();
        Ok(zone.position)
    }

    /// Pairs of zone ids whose rectangles overlap, in template order.
    pub fn overlaps(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (i, a) in self.zones.iter().enumerate() {
            for b in &self.zones[i + 1..] {
                if a.position.intersects(&b.position) {
                    pairs.push((a.id.clone(), b.id.clone()));
                }
            }
        }
        pairs
    }

    /// Copy the template under a new id with fresh timestamps.
    pub fn duplicate(&self, name: Option<&str>, now: DateTime<Utc>) -> Self {
        let mut copy = self.clone();
        copy.id = new_id();
        copy.name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => format!("{} (copy)", self.name),
        };
        copy.stamp(now, now);
        copy
    }
}

impl Record for ZoneTemplate {
    const KIND: &'static str = "zone_templates";

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
        for zone in &mut self.zones {
            if zone.id.trim().is_empty() {
                zone.id = new_id();
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation_field("name", "must not be empty"));
        }
        let mut ids = HashSet::new();
        for zone in &self.zones {
            if !ids.insert(zone.id.as_str()) {
                return Err(Error::validation_field(
                    "zones.id",
                    format!("duplicate zone '{}'", zone.id),
                ));
            }
            if !zone.position.is_inside_card() {
                return Err(Error::validation_field(
                    "zones.position",
                    format!("zone '{}' does not fit on the card", zone.id),
                ));
            }
            if zone.role == ZoneRole::Attribute && zone.claim_path.as_ref().is_none_or(Vec::is_empty) {
                return Err(Error::validation_field(
                    "zones.claim_path",
                    format!("attribute zone '{}' needs a claim path", zone.id),
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
    use crate::model::vct::ClaimPathElement;

    fn zone(id: &str, role: ZoneRole, x: f64, y: f64, width: f64, height: f64) -> Zone {
        Zone {
            id: id.into(),
            role,
            label: None,
            claim_path: (role == ZoneRole::Attribute)
                .then(|| vec![ClaimPathElement::from("given_name")]),
            position: ZonePosition { x, y, width, height },
        }
    }

    fn card() -> ZoneTemplate {
        let mut t = ZoneTemplate::new("Standard front");
        t.id = "standard".into();
        t.zones = vec![
            zone("logo", ZoneRole::Logo, 5.0, 5.0, 20.0, 20.0),
            zone("title", ZoneRole::Title, 30.0, 5.0, 65.0, 15.0),
            zone("name", ZoneRole::Attribute, 5.0, 60.0, 50.0, 10.0),
        ];
        t
    }

    #[test]
    fn test_validate_ok() {
        assert!(card().validate().is_ok());
        assert!(card().overlaps().is_empty());
    }

    #[test]
    fn test_validate_rejects_out_of_card() {
        let mut t = card();
        t.zones[1].position.width = 80.0;
        assert_eq!(t.validate().unwrap_err().field(), Some("zones.position"));
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        let mut t = card();
        t.zones[0].position.height = 0.0;
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_zone_ids() {
        let mut t = card();
        t.zones[2].id = "logo".into();
        assert_eq!(t.validate().unwrap_err().field(), Some("zones.id"));
    }

    #[test]
    fn test_attribute_zone_needs_claim() {
        let mut t = card();
        t.zones[2].claim_path = None;
        assert_eq!(t.validate().unwrap_err().field(), Some("zones.claim_path"));
    }

    #[test]
    fn test_move_zone_clamps() {
        let mut t = card();
        let pos = t.move_zone("title", 50.0, -10.0).unwrap();
        assert_eq!(pos.x, 35.0);
        assert_eq!(pos.y, 0.0);
        assert_eq!(pos.width, 65.0);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_resize_zone_clamps() {
        let mut t = card();
        let pos = t.resize_zone("logo", 150.0, 0.0).unwrap();
        assert_eq!(pos.width, CARD_EXTENT);
        assert_eq!(pos.height, MIN_ZONE_SIZE);
        assert_eq!(pos.x, 0.0);
        assert_eq!(pos.y, 5.0);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_move_handles_nan() {
        let mut t = card();
        let pos = t.move_zone("logo", f64::NAN, 10.0).unwrap();
        assert_eq!(pos.x, 0.0);
        assert_eq!(pos.y, 10.0);
    }

    #[test]
    fn test_move_missing_zone() {
        let mut t = card();
        assert_eq!(
            t.move_zone("nope", 0.0, 0.0).unwrap_err().category(),
            "not_found"
        );
    }

    #[test]
    fn test_overlaps() {
        let mut t = card();
        t.move_zone("name", 10.0, 22.0).unwrap();
        assert_eq!(t.overlaps(), vec![("logo".to_string(), "name".to_string())]);
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = ZonePosition { x: 0.0, y: 0.0, width: 50.0, height: 50.0 };
        let b = ZonePosition { x: 50.0, y: 0.0, width: 50.0, height: 50.0 };
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_duplicate() {
        let t = card();
        let now = Utc::now();
        let copy = t.duplicate(None, now);
        assert_ne!(copy.id, t.id);
        assert_eq!(copy.name, "Standard front (copy)");
        assert_eq!(copy.zones, t.zones);
        assert_eq!(copy.created_at, Some(now));
        assert_eq!(t.duplicate(Some("Back"), now).name, "Back");
    }

    #[test]
    fn test_normalize_generates_zone_ids() {
        let mut t = card();
        t.zones[0].id = String::new();
        t.normalize();
        assert!(!t.zones[0].id.is_empty());
    }
}
