// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Draw/move/resize interaction state machine.
//!
//! Gestures are driven by pointer-down, pointer-move and pointer-up in
//! canvas pixels. All geometry is computed in image-relative pixels and
//! clamped to the drawn image before it is normalized for storage.

use super::boxes::{BoxList, BoxPatch};
use super::hit::{hit_test, Hit};
use crate::models::annotation::{BoundingBox, BoxId};
use crate::util::geometry::{Corner, ImageFrame, NormRect, PixelRect, Point};

/// Current interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Drawing,
    Moving,
    Resizing,
}

/// Inputs a gesture step needs besides the pointer and the boxes.
#[derive(Debug, Clone, Copy)]
pub struct GestureContext<'a> {
    pub frame: &'a ImageFrame,
    pub handle_hit_radius: f64,
    /// Minimum width and height of a drawn box, canvas pixels.
    pub min_box_size: f64,
    pub active_label: &'a str,
}

/// Result of one transition.
#[derive(Debug, Clone)]
pub struct Step {
    /// Boxes after the transition. Same snapshot when nothing changed.
    pub boxes: BoxList,
    /// The transition completed a mutation observers must hear about.
    pub committed: bool,
}

impl Step {
    fn unchanged(boxes: &BoxList) -> Self {
        Self {
            boxes: boxes.clone(),
            committed: false,
        }
    }
}

/// Transient editor state. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct DrawState {
    mode: Mode,
    selected: Option<BoxId>,
    /// Draw origin (Drawing), last pointer sample (Moving) or the fixed
    /// opposite corner (Resizing). Image-relative pixels.
    anchor: Option<Point>,
    active_corner: Option<Corner>,
    /// Latest clamped pointer while drawing. Image-relative pixels.
    current: Option<Point>,
    /// Geometry of the manipulated box at pointer-down.
    original: Option<NormRect>,
}

impl DrawState {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selected(&self) -> Option<BoxId> {
        self.selected
    }

    pub fn active_corner(&self) -> Option<Corner> {
        self.active_corner
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    pub fn set_selected(&mut self, selected: Option<BoxId>) {
        self.selected = selected;
    }

    /// Back to Idle with nothing selected.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Rectangle being drawn, in canvas pixels.
    pub fn preview(&self, frame: &ImageFrame) -> Option<PixelRect> {
        if self.mode != Mode::Drawing {
            return None;
        }
        let (origin, current) = (self.anchor?, self.current?);
        let rect = PixelRect::from_corners(origin, current);
        Some(rect.translate(frame.offset_x, frame.offset_y))
    }

    /// Scale pixel anchors after the frame changed size mid-gesture.
    pub fn rescale(&mut self, ratio: f64) {
        if !ratio.is_finite() || ratio <= 0.0 {
            return;
        }
        let scale = |p: Point| Point::new(p.x * ratio, p.y * ratio);
        self.anchor = self.anchor.map(scale);
        self.current = self.current.map(scale);
    }

    pub fn pointer_down(&mut self, pointer: Point, boxes: &BoxList, ctx: &GestureContext) -> Step {
        let frame = ctx.frame;
        let image_point = frame.canvas_to_image(pointer);

        match hit_test(pointer, frame, boxes, self.selected, ctx.handle_hit_radius) {
            Hit::Handle { id, corner } => {
                let Some(bbox) = boxes.get(id) else {
                    return Step::unchanged(boxes);
                };
                let rect = frame.to_image_pixels(&bbox.rect());
                self.enter(Mode::Resizing, Some(id));
                self.anchor = Some(rect.corner(corner.opposite()));
                self.active_corner = Some(corner);
                self.original = Some(bbox.rect());
                log::debug!("Resizing box {} from {:?}", id, corner);
            }
            Hit::Body { id } => {
                self.enter(Mode::Moving, Some(id));
                self.anchor = Some(image_point);
                self.original = boxes.get(id).map(BoundingBox::rect);
                log::debug!("Moving box {}", id);
            }
            Hit::None => {
                let origin = frame.clamp_to_image(image_point);
                self.enter(Mode::Drawing, None);
                self.anchor = Some(origin);
                self.current = Some(origin);
                log::debug!("Drawing from ({:.1}, {:.1})", origin.x, origin.y);
            }
        }

        Step::unchanged(boxes)
    }

    pub fn pointer_move(&mut self, pointer: Point, boxes: &BoxList, ctx: &GestureContext) -> Step {
        let frame = ctx.frame;
        let image_point = frame.canvas_to_image(pointer);

        match self.mode {
            Mode::Idle => Step::unchanged(boxes),
            Mode::Drawing => {
                if self.anchor.is_some() {
                    self.current = Some(frame.clamp_to_image(image_point));
                }
                Step::unchanged(boxes)
            }
            Mode::Moving => {
                let (Some(id), Some(last)) = (self.selected, self.anchor) else {
                    return Step::unchanged(boxes);
                };
                let Some(bbox) = boxes.get(id) else {
                    return Step::unchanged(boxes);
                };

                // Delta against the previous sample, not the gesture start.
                let (dx, dy) = (image_point.x - last.x, image_point.y - last.y);
                if dx == 0.0 && dy == 0.0 {
                    return Step::unchanged(boxes);
                }
                self.anchor = Some(image_point);

                let rect = frame.to_image_pixels(&bbox.rect());
                let x = (rect.x + dx).clamp(0.0, (frame.draw_width - rect.width).max(0.0));
                let y = (rect.y + dy).clamp(0.0, (frame.draw_height - rect.height).max(0.0));
                let moved = PixelRect::new(x, y, rect.width, rect.height);

                Step {
                    boxes: boxes.update(id, &BoxPatch::rect(frame.image_pixels_to_normalized(&moved))),
                    committed: false,
                }
            }
            Mode::Resizing => {
                let (Some(id), Some(fixed)) = (self.selected, self.anchor) else {
                    return Step::unchanged(boxes);
                };

                let free = frame.clamp_to_image(image_point);
                // Dragging past the fixed corner flips which corner is held.
                self.active_corner = Some(Corner::relative_to(fixed, free));
                let resized = PixelRect::from_corners(fixed, free);

                Step {
                    boxes: boxes.update(id, &BoxPatch::rect(frame.image_pixels_to_normalized(&resized))),
                    committed: false,
                }
            }
        }
    }

    pub fn pointer_up(&mut self, pointer: Point, boxes: &BoxList, ctx: &GestureContext) -> Step {
        let frame = ctx.frame;

        match self.mode {
            Mode::Idle => Step::unchanged(boxes),
            Mode::Drawing => {
                let Some(origin) = self.anchor else {
                    self.leave();
                    return Step::unchanged(boxes);
                };
                let end = frame.clamp_to_image(frame.canvas_to_image(pointer));
                let rect = PixelRect::from_corners(origin, end);
                self.leave();

                if rect.width < ctx.min_box_size || rect.height < ctx.min_box_size {
                    log::debug!(
                        "Discarded {:.1}x{:.1} box below minimum size",
                        rect.width,
                        rect.height
                    );
                    return Step::unchanged(boxes);
                }

                let bbox = BoundingBox::new(frame.image_pixels_to_normalized(&rect), ctx.active_label);
                log::info!("Created box {} '{}'", bbox.id, bbox.label);
                self.selected = Some(bbox.id);
                Step {
                    boxes: boxes.add(bbox),
                    committed: true,
                }
            }
            Mode::Moving | Mode::Resizing => {
                let mut step = self.pointer_move(pointer, boxes, ctx);
                if self.mode == Mode::Resizing {
                    if let (Some(id), Some(original)) = (self.selected, self.original) {
                        let collapsed = step.boxes.get(id).map(|b| frame.to_image_pixels(&b.rect()));
                        if let Some(rect) = collapsed.filter(|r| {
                            r.width < ctx.min_box_size || r.height < ctx.min_box_size
                        }) {
                            log::debug!(
                                "Reverted resize to {:.1}x{:.1} below minimum size",
                                rect.width,
                                rect.height
                            );
                            step.boxes = step.boxes.update(id, &BoxPatch::rect(original));
                        }
                    }
                }
                let changed = match (self.selected.and_then(|id| step.boxes.get(id)), self.original) {
                    (Some(bbox), Some(original)) => differs(&bbox.rect(), &original),
                    _ => false,
                };
                if changed {
                    if let Some(id) = self.selected {
                        log::info!("Finished {:?} box {}", self.mode, id);
                    }
                }
                self.leave();
                Step {
                    boxes: step.boxes,
                    committed: changed,
                }
            }
        }
    }

    /// Abort the gesture in flight, restoring the manipulated box.
    pub fn cancel(&mut self, boxes: &BoxList) -> BoxList {
        let restored = match (self.mode, self.selected, self.original) {
            (Mode::Moving | Mode::Resizing, Some(id), Some(original)) => {
                boxes.update(id, &BoxPatch::rect(original))
            }
            _ => boxes.clone(),
        };
        if self.mode != Mode::Idle {
            log::debug!("Cancelled {:?}", self.mode);
        }
        self.leave();
        restored
    }

    fn enter(&mut self, mode: Mode, selected: Option<BoxId>) {
        self.mode = mode;
        self.selected = selected;
        self.anchor = None;
        self.active_corner = None;
        self.current = None;
        self.original = None;
    }

    fn leave(&mut self) {
        let selected = self.selected;
        self.enter(Mode::Idle, selected);
    }
}

/// Geometry comparison that ignores floating-point noise from re-normalizing.
fn differs(a: &NormRect, b: &NormRect) -> bool {
    const EPSILON: f64 = 1e-9;
    (a.x - b.x).abs() > EPSILON
        || (a.y - b.y).abs() > EPSILON
        || (a.width - b.width).abs() > EPSILON
        || (a.height - b.height).abs() > EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::geometry::compute_frame;

    const EPS: f64 = 1e-6;

    struct Harness {
        frame: ImageFrame,
        state: DrawState,
        boxes: BoxList,
    }

    impl Harness {
        // 800x600 canvas, 400x200 image.
        fn new(boxes: Vec<BoundingBox>) -> Self {
            Self {
                frame: compute_frame(800.0, 600.0, 400.0, 200.0).unwrap(),
                state: DrawState::default(),
                boxes: BoxList::new(boxes),
            }
        }

        fn down(&mut self, x: f64, y: f64) -> bool {
            let ctx = context(&self.frame);
            let step = self.state.pointer_down(Point::new(x, y), &self.boxes, &ctx);
            self.boxes = step.boxes;
            step.committed
        }

        fn drag(&mut self, x: f64, y: f64) {
            let ctx = context(&self.frame);
            let step = self.state.pointer_move(Point::new(x, y), &self.boxes, &ctx);
            self.boxes = step.boxes;
        }

        fn up(&mut self, x: f64, y: f64) -> bool {
            let ctx = context(&self.frame);
            let step = self.state.pointer_up(Point::new(x, y), &self.boxes, &ctx);
            self.boxes = step.boxes;
            step.committed
        }

        fn only(&self) -> NormRect {
            assert_eq!(self.boxes.len(), 1);
            self.boxes.all()[0].rect()
        }
    }

    fn context(frame: &ImageFrame) -> GestureContext<'_> {
        GestureContext {
            frame,
            handle_hit_radius: 7.5,
            min_box_size: 4.0,
            active_label: "car",
        }
    }

    fn assert_rect(rect: NormRect, x: f64, y: f64, w: f64, h: f64) {
        assert!((rect.x - x).abs() < EPS, "x {} != {}", rect.x, x);
        assert!((rect.y - y).abs() < EPS, "y {} != {}", rect.y, y);
        assert!((rect.width - w).abs() < EPS, "w {} != {}", rect.width, w);
        assert!((rect.height - h).abs() < EPS, "h {} != {}", rect.height, h);
    }

    #[test]
    fn test_draw_creates_normalized_box() {
        let mut h = Harness::new(Vec::new());
        h.down(100.0, 150.0);
        assert_eq!(h.state.mode(), Mode::Drawing);
        h.drag(200.0, 200.0);
        assert!(h.up(300.0, 250.0));

        assert_eq!(h.state.mode(), Mode::Idle);
        assert_rect(h.only(), 0.125, 0.125, 0.25, 0.25);
        assert_eq!(h.boxes.all()[0].label, "car");
        assert_eq!(h.state.selected(), Some(h.boxes.all()[0].id));
        assert!(h.state.anchor().is_none());
    }

    #[test]
    fn test_tiny_draw_is_discarded() {
        let mut h = Harness::new(Vec::new());
        h.down(100.0, 150.0);
        assert!(!h.up(102.0, 152.0));
        assert!(h.boxes.is_empty());
        assert_eq!(h.state.mode(), Mode::Idle);
    }

    #[test]
    fn test_draw_clamped_to_image() {
        let mut h = Harness::new(Vec::new());
        // Start in the top letterbox margin, end past the right edge.
        h.down(700.0, 20.0);
        h.up(900.0, 200.0);
        assert_rect(h.only(), 0.875, 0.0, 0.125, 0.25);
    }

    #[test]
    fn test_move_translates_by_sample_deltas() {
        let bbox = BoundingBox::new(NormRect::new(0.25, 0.25, 0.25, 0.25), "car");
        let id = bbox.id;
        let mut h = Harness::new(vec![bbox]);

        // Box spans canvas x 200..400, y 200..300.
        h.down(300.0, 250.0);
        assert_eq!(h.state.mode(), Mode::Moving);
        assert_eq!(h.state.selected(), Some(id));
        h.drag(340.0, 250.0);
        h.drag(380.0, 270.0);
        assert!(h.up(380.0, 270.0));

        // 80px right of 800, 20px down of 400.
        assert_rect(h.only(), 0.35, 0.30, 0.25, 0.25);
    }

    #[test]
    fn test_move_stops_at_image_edge() {
        let bbox = BoundingBox::new(NormRect::new(0.25, 0.25, 0.25, 0.25), "car");
        let mut h = Harness::new(vec![bbox]);

        h.down(300.0, 250.0);
        h.drag(-500.0, -500.0);
        h.up(-500.0, -500.0);
        assert_rect(h.only(), 0.0, 0.0, 0.25, 0.25);
    }

    #[test]
    fn test_click_without_drag_is_not_committed() {
        let bbox = BoundingBox::new(NormRect::new(0.25, 0.25, 0.25, 0.25), "car");
        let mut h = Harness::new(vec![bbox]);
        let before = h.boxes.clone();

        h.down(300.0, 250.0);
        assert!(!h.up(300.0, 250.0));
        assert_eq!(h.boxes, before);
    }

    #[test]
    fn test_resize_flips_past_opposite_corner() {
        let bbox = BoundingBox::new(NormRect::new(0.2, 0.2, 0.2, 0.2), "car");
        let mut h = Harness::new(vec![bbox]);

        // Bottom-right handle at normalized (0.4, 0.4) -> canvas (320, 260).
        h.down(320.0, 260.0);
        assert_eq!(h.state.mode(), Mode::Resizing);
        assert_eq!(h.state.active_corner(), Some(Corner::BottomRight));

        // Drag above-left of the top-left corner (160, 180) to (80, 140).
        h.drag(80.0, 140.0);
        assert_eq!(h.state.active_corner(), Some(Corner::TopLeft));
        assert!(h.up(80.0, 140.0));

        let rect = h.only();
        assert!(rect.width >= 0.0 && rect.height >= 0.0);
        assert_rect(rect, 0.1, 0.1, 0.1, 0.1);
        assert!(h.state.active_corner().is_none());
    }

    #[test]
    fn test_resize_below_minimum_reverts() {
        let bbox = BoundingBox::new(NormRect::new(0.2, 0.2, 0.2, 0.2), "car");
        let mut h = Harness::new(vec![bbox]);

        // Bottom-right handle (320, 260) dragged onto the fixed corner's x.
        h.down(320.0, 260.0);
        h.drag(160.0, 300.0);
        assert!(!h.up(160.0, 300.0));
        assert_eq!(h.state.mode(), Mode::Idle);
        assert_rect(h.only(), 0.2, 0.2, 0.2, 0.2);

        // A collapse in height alone is rejected too.
        h.down(320.0, 260.0);
        assert!(!h.up(360.0, 182.0));
        assert_rect(h.only(), 0.2, 0.2, 0.2, 0.2);
    }

    #[test]
    fn test_resize_clamped_at_boundary() {
        let bbox = BoundingBox::new(NormRect::new(0.5, 0.5, 0.2, 0.2), "car");
        let mut h = Harness::new(vec![bbox]);

        // Bottom-right handle at (560, 380), drag past the canvas corner.
        h.down(560.0, 380.0);
        h.drag(2000.0, 2000.0);
        h.up(2000.0, 2000.0);
        assert_rect(h.only(), 0.5, 0.5, 0.5, 0.5);
    }

    #[test]
    fn test_pointer_up_without_down_is_noop() {
        let mut h = Harness::new(Vec::new());
        assert!(!h.up(300.0, 300.0));
        assert!(h.boxes.is_empty());
        assert_eq!(h.state.mode(), Mode::Idle);
    }

    #[test]
    fn test_empty_click_deselects() {
        let bbox = BoundingBox::new(NormRect::new(0.25, 0.25, 0.25, 0.25), "car");
        let mut h = Harness::new(vec![bbox]);
        h.down(300.0, 250.0);
        h.up(300.0, 250.0);
        assert!(h.state.selected().is_some());

        h.down(700.0, 450.0);
        assert_eq!(h.state.selected(), None);
        h.up(701.0, 451.0);
        assert_eq!(h.boxes.len(), 1);
    }

    #[test]
    fn test_cancel_restores_geometry() {
        let bbox = BoundingBox::new(NormRect::new(0.25, 0.25, 0.25, 0.25), "car");
        let mut h = Harness::new(vec![bbox]);

        h.down(300.0, 250.0);
        h.drag(400.0, 300.0);
        let restored = h.state.cancel(&h.boxes);
        assert_rect(restored.all()[0].rect(), 0.25, 0.25, 0.25, 0.25);
        assert_eq!(h.state.mode(), Mode::Idle);
    }

    #[test]
    fn test_bounds_hold_after_gesture_sequence() {
        let mut h = Harness::new(Vec::new());
        h.down(50.0, 120.0);
        h.up(750.0, 480.0);
        h.down(400.0, 300.0);
        h.drag(900.0, 900.0);
        h.drag(-100.0, 650.0);
        h.up(-100.0, 650.0);

        let corner = to_canvas_corner(&h, Corner::TopRight);
        h.down(corner.x, corner.y);
        h.drag(1200.0, -300.0);
        h.up(1200.0, -300.0);

        for bbox in h.boxes.iter() {
            assert!(bbox.rect().is_within_unit(EPS), "{:?}", bbox);
        }
    }

    fn to_canvas_corner(h: &Harness, corner: Corner) -> Point {
        crate::util::geometry::to_canvas(&h.only(), &h.frame).corner(corner)
    }

    #[test]
    fn test_rescale_preserves_anchor_ratio() {
        let mut h = Harness::new(Vec::new());
        h.down(100.0, 150.0);
        h.state.rescale(0.5);
        assert_eq!(h.state.anchor(), Some(Point::new(50.0, 25.0)));
    }
}
