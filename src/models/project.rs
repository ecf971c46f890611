// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-image annotation records.
//!
//! An [`ImageAnnotations`] is what the desktop host persists next to each
//! image: the media file, its intrinsic size and its boxes.

use super::annotation::{BoundingBox, PersistedBox};
use serde::{Deserialize, Serialize};

/// Complete annotation data of one image, for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnnotations {
    pub media_file: String,
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default)]
    pub boxes: Vec<PersistedBox>,
}

impl ImageAnnotations {
    /// Create an empty record for the given media file and dimensions.
    pub fn new(media_file: String, image_width: u32, image_height: u32) -> Self {
        Self {
            media_file,
            image_width,
            image_height,
            boxes: Vec::new(),
        }
    }

    /// Capture a snapshot of editor boxes.
    pub fn from_boxes(
        media_file: String,
        image_width: u32,
        image_height: u32,
        boxes: &[BoundingBox],
    ) -> Self {
        Self {
            media_file,
            image_width,
            image_height,
            boxes: boxes.iter().map(PersistedBox::from).collect(),
        }
    }

    /// Convert the stored boxes into the editor model.
    pub fn to_boxes(&self) -> Vec<BoundingBox> {
        self.boxes
            .iter()
            .cloned()
            .map(|b| b.into_box(self.image_width, self.image_height))
            .collect()
    }
}
