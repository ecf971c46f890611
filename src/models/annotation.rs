// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the bounding box annotation, its identifier and the
//! external geometry representations boxes are loaded from.

use crate::util::geometry::{normalize_coordinates, NormRect};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a bounding box, stable for the box's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxId(Uuid);

impl BoxId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BoxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell boxes apart in logs and panels.
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

/// A labelled, axis-aligned box over the current image.
///
/// Geometry is normalized to the image size: `x`/`width` are fractions of
/// the image width, `y`/`height` fractions of the image height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub id: BoxId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label: String,
    /// Reserved by the annotation schema. Not produced or consumed by the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl BoundingBox {
    /// Create a new box with a fresh identifier.
    pub fn new(rect: NormRect, label: impl Into<String>) -> Self {
        Self::with_id(BoxId::new(), rect, label)
    }

    pub fn with_id(id: BoxId, rect: NormRect, label: impl Into<String>) -> Self {
        Self {
            id,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            label: label.into(),
            confidence: None,
        }
    }

    pub fn rect(&self) -> NormRect {
        NormRect::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_rect(&mut self, rect: NormRect) {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
    }
}

/// Box geometry as stored by external annotation sources.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "units", rename_all = "lowercase")]
pub enum BoxGeometry {
    /// Already a fraction of the image size.
    Fractional {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Image pixels.
    Absolute {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

impl BoxGeometry {
    /// Map into normalized coordinates for an image of the given size.
    ///
    /// The result is not yet clamped.
    pub fn to_normalized(&self, image_width: u32, image_height: u32) -> NormRect {
        match *self {
            BoxGeometry::Fractional {
                x,
                y,
                width,
                height,
            } => NormRect::new(x, y, width, height),
            BoxGeometry::Absolute {
                x,
                y,
                width,
                height,
            } => {
                if image_width == 0 || image_height == 0 {
                    return NormRect::default();
                }
                let origin = normalize_coordinates(x, y, image_width, image_height);
                let extent = normalize_coordinates(width, height, image_width, image_height);
                NormRect::new(origin.x, origin.y, extent.x, extent.y)
            }
        }
    }
}

/// A box as persisted alongside an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedBox {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BoxId>,
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub geometry: BoxGeometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl PersistedBox {
    /// Convert to the editor model, repairing geometry that falls outside the image.
    pub fn into_box(self, image_width: u32, image_height: u32) -> BoundingBox {
        let raw = self.geometry.to_normalized(image_width, image_height);
        let rect = raw.clamped();
        if rect != raw {
            log::warn!(
                "Clamped out-of-range box '{}' from {:?} to {:?}",
                self.label,
                raw,
                rect
            );
        }

        let mut bbox = BoundingBox::with_id(self.id.unwrap_or_default(), rect, self.label);
        bbox.confidence = self.confidence;
        bbox
    }
}

impl From<&BoundingBox> for PersistedBox {
    fn from(bbox: &BoundingBox) -> Self {
        Self {
            id: Some(bbox.id),
            label: bbox.label.clone(),
            geometry: BoxGeometry::Fractional {
                x: bbox.x,
                y: bbox.y,
                width: bbox.width,
                height: bbox.height,
            },
            confidence: bbox.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_geometry_is_normalized() {
        let persisted = PersistedBox {
            id: None,
            label: "car".to_string(),
            geometry: BoxGeometry::Absolute {
                x: 100.0,
                y: 50.0,
                width: 200.0,
                height: 100.0,
            },
            confidence: None,
        };

        let bbox = persisted.into_box(400, 200);
        assert!((bbox.x - 0.25).abs() < 1e-9);
        assert!((bbox.y - 0.25).abs() < 1e-9);
        assert!((bbox.width - 0.5).abs() < 1e-9);
        assert!((bbox.height - 0.5).abs() < 1e-9);
        assert_eq!(bbox.label, "car");
    }

    #[test]
    fn test_out_of_range_geometry_is_clamped() {
        let persisted = PersistedBox {
            id: None,
            label: "car".to_string(),
            geometry: BoxGeometry::Fractional {
                x: 0.8,
                y: 0.5,
                width: 0.4,
                height: 0.2,
            },
            confidence: Some(0.7),
        };

        let bbox = persisted.into_box(640, 480);
        assert!(bbox.rect().is_within_unit(1e-9));
        assert!((bbox.width - 0.2).abs() < 1e-9);
        assert_eq!(bbox.confidence, Some(0.7));
    }

    #[test]
    fn test_persisted_box_keeps_identity() {
        let original = BoundingBox::new(NormRect::new(0.1, 0.2, 0.3, 0.4), "person");
        let restored = PersistedBox::from(&original).into_box(100, 100);
        assert_eq!(restored, original);
    }

    #[test]
    fn test_geometry_units_tag_in_json() {
        let json = r#"{"label":"dog","units":"absolute","x":10,"y":20,"width":30,"height":40}"#;
        let persisted: PersistedBox = serde_json::from_str(json).unwrap();
        assert_eq!(
            persisted.geometry,
            BoxGeometry::Absolute {
                x: 10.0,
                y: 20.0,
                width: 30.0,
                height: 40.0
            }
        );
    }

    #[test]
    fn test_box_ids_are_unique() {
        assert_ne!(BoxId::new(), BoxId::new());
    }
}
