// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pointer hit-testing against boxes and their corner handles.

use super::boxes::BoxList;
use crate::models::annotation::{BoundingBox, BoxId};
use crate::util::geometry::{to_canvas, Corner, ImageFrame, Point};

/// What a pointer position struck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// A resize handle at one corner of a box.
    Handle { id: BoxId, corner: Corner },
    /// The interior (or edge) of a box.
    Body { id: BoxId },
    /// Empty canvas.
    None,
}

impl Hit {
    pub fn box_id(&self) -> Option<BoxId> {
        match *self {
            Hit::Handle { id, .. } | Hit::Body { id } => Some(id),
            Hit::None => None,
        }
    }
}

/// Resolve what `pointer` (canvas pixels) hits.
///
/// Handles of every box beat box bodies, so a corner stays grabbable under
/// an overlapping box. Handles of the selected box are tried first, then
/// the remaining boxes topmost first. Bodies are tried topmost first.
pub fn hit_test(
    pointer: Point,
    frame: &ImageFrame,
    boxes: &BoxList,
    selected: Option<BoxId>,
    handle_hit_radius: f64,
) -> Hit {
    let selected_box = selected.and_then(|id| boxes.get(id));
    let topmost_first = boxes.iter().rev().filter(|b| Some(b.id) != selected);

    for bbox in selected_box.into_iter().chain(topmost_first) {
        if let Some(corner) = handle_at(pointer, frame, bbox, handle_hit_radius) {
            return Hit::Handle {
                id: bbox.id,
                corner,
            };
        }
    }

    boxes
        .iter()
        .rev()
        .find(|b| to_canvas(&b.rect(), frame).contains(pointer))
        .map(|b| Hit::Body { id: b.id })
        .unwrap_or(Hit::None)
}

/// Closest corner of `bbox` within `radius` of `pointer`.
fn handle_at(pointer: Point, frame: &ImageFrame, bbox: &BoundingBox, radius: f64) -> Option<Corner> {
    let rect = to_canvas(&bbox.rect(), frame);
    Corner::ALL
        .into_iter()
        .map(|corner| (corner, rect.corner(corner).distance_to(&pointer)))
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(corner, _)| corner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::geometry::{compute_frame, NormRect};

    const RADIUS: f64 = 7.5;

    // 800x600 canvas, 400x200 image: 2x scale, image occupies y in [100, 500].
    fn frame() -> ImageFrame {
        compute_frame(800.0, 600.0, 400.0, 200.0).unwrap()
    }

    fn bbox(x: f64, y: f64, w: f64, h: f64) -> BoundingBox {
        BoundingBox::new(NormRect::new(x, y, w, h), "car")
    }

    #[test]
    fn test_topmost_body_wins_on_overlap() {
        let a = bbox(0.1, 0.1, 0.4, 0.4);
        let b = bbox(0.3, 0.3, 0.4, 0.4);
        let (ida, idb) = (a.id, b.id);
        let boxes = BoxList::new(vec![a, b]);

        // (0.4, 0.4) normalized -> canvas (320, 260), inside both.
        let hit = hit_test(Point::new(320.0, 260.0), &frame(), &boxes, None, RADIUS);
        assert_eq!(hit, Hit::Body { id: idb });

        // (0.2, 0.2) only inside A.
        let hit = hit_test(Point::new(160.0, 180.0), &frame(), &boxes, None, RADIUS);
        assert_eq!(hit, Hit::Body { id: ida });
    }

    #[test]
    fn test_handle_beats_later_body() {
        let a = bbox(0.1, 0.1, 0.4, 0.4);
        let b = bbox(0.3, 0.3, 0.4, 0.4);
        let ida = a.id;
        let boxes = BoxList::new(vec![a, b]);

        // A's bottom-right corner is (0.5, 0.5) -> canvas (400, 300), inside B.
        let hit = hit_test(Point::new(402.0, 301.0), &frame(), &boxes, None, RADIUS);
        assert_eq!(
            hit,
            Hit::Handle {
                id: ida,
                corner: Corner::BottomRight
            }
        );
    }

    #[test]
    fn test_empty_space_is_none() {
        let boxes = BoxList::new(vec![bbox(0.1, 0.1, 0.1, 0.1)]);
        let hit = hit_test(Point::new(700.0, 450.0), &frame(), &boxes, None, RADIUS);
        assert_eq!(hit, Hit::None);

        // Letterbox margin above the image.
        let hit = hit_test(Point::new(100.0, 20.0), &frame(), &boxes, None, RADIUS);
        assert_eq!(hit, Hit::None);
    }

    #[test]
    fn test_handle_outside_radius_falls_back_to_body() {
        let a = bbox(0.1, 0.1, 0.4, 0.4);
        let ida = a.id;
        let boxes = BoxList::new(vec![a]);

        // Top-left corner at (80, 140); 10px inside is beyond 7.5px.
        let hit = hit_test(Point::new(90.0, 150.0), &frame(), &boxes, None, RADIUS);
        assert_eq!(hit, Hit::Body { id: ida });
    }

    #[test]
    fn test_selected_handles_checked_first() {
        // Two boxes sharing a corner at (0.5, 0.5).
        let a = bbox(0.1, 0.1, 0.4, 0.4);
        let b = bbox(0.5, 0.5, 0.2, 0.2);
        let (ida, idb) = (a.id, b.id);
        let boxes = BoxList::new(vec![a, b]);
        let shared = Point::new(400.0, 300.0);

        let unselected = hit_test(shared, &frame(), &boxes, None, RADIUS);
        assert_eq!(unselected.box_id(), Some(idb));

        let selected = hit_test(shared, &frame(), &boxes, Some(ida), RADIUS);
        assert_eq!(
            selected,
            Hit::Handle {
                id: ida,
                corner: Corner::BottomRight
            }
        );
    }
}
