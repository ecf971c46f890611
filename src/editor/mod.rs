// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interactive bounding-box editor.
//!
//! [`Editor`] owns the boxes of the current image, the image-to-canvas
//! frame and the interaction state. Hosts feed it canvas-local pointer
//! events and get back the [`EditorEvent`]s each call produced; rendering
//! is a separate, read-only step through a [`render::Surface`].

pub mod boxes;
pub mod hit;
pub mod render;
pub mod state;

use crate::config::EditorConfig;
use crate::models::annotation::{BoundingBox, BoxId};
use crate::models::labels::LabelSet;
use crate::util::geometry::{compute_frame, ImageFrame, PixelRect, Point};
use boxes::{BoxList, BoxPatch};
use hit::Hit;
use render::{Scene, Surface};
use state::{DrawState, GestureContext, Mode, Step};

/// Notification emitted after an editor operation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// A draw, move, resize, delete or label change was committed.
    BoxesChanged(BoxList),
    /// The selected box changed.
    SelectionChanged(Option<BoxId>),
}

/// Receiver of editor notifications.
pub trait EditorObserver {
    fn boxes_changed(&mut self, boxes: &BoxList);
    fn selection_changed(&mut self, selected: Option<BoxId>);
}

/// Deliver `events` to `observer` in order.
pub fn dispatch<O: EditorObserver + ?Sized>(events: &[EditorEvent], observer: &mut O) {
    for event in events {
        match event {
            EditorEvent::BoxesChanged(boxes) => observer.boxes_changed(boxes),
            EditorEvent::SelectionChanged(selected) => observer.selection_changed(*selected),
        }
    }
}

/// The bounding-box editor of one image at a time.
#[derive(Debug, Clone)]
pub struct Editor {
    config: EditorConfig,
    labels: LabelSet,
    canvas_width: f64,
    canvas_height: f64,
    image_size: Option<(u32, u32)>,
    frame: Option<ImageFrame>,
    boxes: BoxList,
    state: DrawState,
}

impl Editor {
    pub fn new(config: EditorConfig, labels: LabelSet) -> Self {
        let canvas_height = config.canvas_height;
        Self {
            config,
            labels,
            canvas_width: 0.0,
            canvas_height,
            image_size: None,
            frame: None,
            boxes: BoxList::default(),
            state: DrawState::default(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn boxes(&self) -> &BoxList {
        &self.boxes
    }

    pub fn selected(&self) -> Option<BoxId> {
        self.state.selected()
    }

    pub fn selected_box(&self) -> Option<&BoundingBox> {
        self.selected().and_then(|id| self.boxes.get(id))
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    /// Current mapping, `None` until both an image and a canvas size exist.
    pub fn frame(&self) -> Option<&ImageFrame> {
        self.frame.as_ref()
    }

    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.image_size
    }

    pub fn canvas_size(&self) -> (f64, f64) {
        (self.canvas_width, self.canvas_height)
    }

    /// Rectangle being drawn, canvas pixels.
    pub fn preview(&self) -> Option<PixelRect> {
        self.frame.as_ref().and_then(|frame| self.state.preview(frame))
    }

    /// Set the canvas width; the height stays at the configured constant.
    pub fn set_canvas_width(&mut self, width: f64) {
        self.set_canvas_size(width, self.config.canvas_height);
    }

    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        if width == self.canvas_width && height == self.canvas_height {
            return;
        }
        self.canvas_width = width;
        self.canvas_height = height;
        self.recompute_frame();
    }

    /// Replace the current image and its boxes wholesale.
    pub fn load_image(&mut self, width: u32, height: u32, boxes: Vec<BoundingBox>) -> Vec<EditorEvent> {
        let previous = self.state.selected();
        self.state.reset();
        self.image_size = Some((width, height));
        self.boxes = BoxList::new(boxes);
        self.frame = None;
        self.recompute_frame();
        log::info!(
            "Editing {}x{} image with {} boxes",
            width,
            height,
            self.boxes.len()
        );

        let mut events = Vec::new();
        if previous.is_some() {
            events.push(EditorEvent::SelectionChanged(None));
        }
        events
    }

    /// Drop the current image. Pointer events are ignored until the next load.
    pub fn unload_image(&mut self) -> Vec<EditorEvent> {
        let previous = self.state.selected();
        self.state.reset();
        self.image_size = None;
        self.frame = None;
        self.boxes = BoxList::default();

        let mut events = Vec::new();
        if previous.is_some() {
            events.push(EditorEvent::SelectionChanged(None));
        }
        events
    }

    /// Make `label` active for new boxes. Labels outside the vocabulary are ignored.
    pub fn set_active_label(&mut self, label: &str) -> bool {
        self.labels.set_active(label)
    }

    pub fn set_active_label_index(&mut self, index: usize) -> bool {
        self.labels.set_active_index(index)
    }

    /// What `pointer` would hit, without changing any state.
    pub fn hover(&self, pointer: Point) -> Hit {
        match &self.frame {
            Some(frame) => hit::hit_test(
                pointer,
                frame,
                &self.boxes,
                self.state.selected(),
                self.config.handle_hit_radius(),
            ),
            None => Hit::None,
        }
    }

    pub fn pointer_down(&mut self, pointer: Point) -> Vec<EditorEvent> {
        let mut events = Vec::new();
        if self.frame.is_none() {
            return events;
        }
        if self.state.mode() != Mode::Idle {
            // Missed pointer-up: finish the gesture in flight first.
            events.extend(self.pointer_up(pointer));
        }
        let previous = self.state.selected();
        self.run(previous, &mut events, |state, boxes, ctx| state.pointer_down(pointer, boxes, ctx));
        events
    }

    pub fn pointer_move(&mut self, pointer: Point) -> Vec<EditorEvent> {
        let mut events = Vec::new();
        if self.frame.is_none() || self.state.mode() == Mode::Idle {
            return events;
        }
        let previous = self.state.selected();
        self.run(previous, &mut events, |state, boxes, ctx| state.pointer_move(pointer, boxes, ctx));
        events
    }

    pub fn pointer_up(&mut self, pointer: Point) -> Vec<EditorEvent> {
        let mut events = Vec::new();
        if self.frame.is_none() {
            return events;
        }
        let previous = self.state.selected();
        self.run(previous, &mut events, |state, boxes, ctx| state.pointer_up(pointer, boxes, ctx));
        events
    }

    /// Abort the gesture in flight. Moved or resized boxes snap back.
    pub fn cancel(&mut self) -> Vec<EditorEvent> {
        self.boxes = self.state.cancel(&self.boxes);
        Vec::new()
    }

    /// Select a box (or nothing). Unknown ids are ignored.
    pub fn select(&mut self, id: Option<BoxId>) -> Vec<EditorEvent> {
        if let Some(id) = id {
            if !self.boxes.contains(id) {
                return Vec::new();
            }
        }
        if self.state.mode() != Mode::Idle {
            self.boxes = self.state.cancel(&self.boxes);
        }
        if self.state.selected() == id {
            return Vec::new();
        }
        self.state.set_selected(id);
        vec![EditorEvent::SelectionChanged(id)]
    }

    /// Reassign the label of a box. Unknown ids and labels outside the
    /// vocabulary leave the boxes unchanged.
    pub fn set_label(&mut self, id: BoxId, label: &str) -> Vec<EditorEvent> {
        if !self.labels.contains(label) {
            log::warn!("Rejected label '{}' for box {}", label, id);
            return Vec::new();
        }
        let updated = self.boxes.update(id, &BoxPatch::label(label));
        if updated.ptr_eq(&self.boxes) {
            return Vec::new();
        }
        log::info!("Box {} labelled '{}'", id, label);
        self.boxes = updated;
        vec![EditorEvent::BoxesChanged(self.boxes.clone())]
    }

    /// Delete a box. Unknown ids leave the boxes unchanged.
    pub fn delete(&mut self, id: BoxId) -> Vec<EditorEvent> {
        let updated = self.boxes.remove(id);
        if updated.ptr_eq(&self.boxes) {
            return Vec::new();
        }

        let mut events = Vec::new();
        if self.state.selected() == Some(id) {
            self.state.reset();
            events.push(EditorEvent::SelectionChanged(None));
        }
        self.boxes = updated;
        log::info!("Deleted box {}, {} remaining", id, self.boxes.len());
        events.push(EditorEvent::BoxesChanged(self.boxes.clone()));
        events
    }

    pub fn delete_selected(&mut self) -> Vec<EditorEvent> {
        match self.state.selected() {
            Some(id) => self.delete(id),
            None => Vec::new(),
        }
    }

    /// Paint the editor. Does nothing before an image is loaded.
    pub fn render<S: Surface>(&self, surface: &mut S, image: &S::Image) {
        let Some(frame) = &self.frame else {
            return;
        };
        let scene = Scene {
            frame,
            boxes: &self.boxes,
            selected: self.state.selected(),
            preview: self.state.preview(frame),
            labels: &self.labels,
        };
        render::render(surface, image, &scene, &self.config);
    }

    fn run(
        &mut self,
        previous: Option<BoxId>,
        events: &mut Vec<EditorEvent>,
        transition: impl FnOnce(&mut DrawState, &BoxList, &GestureContext) -> Step,
    ) {
        let Some(frame) = self.frame else {
            return;
        };
        let ctx = GestureContext {
            frame: &frame,
            handle_hit_radius: self.config.handle_hit_radius(),
            min_box_size: self.config.min_box_size,
            active_label: self.labels.active(),
        };

        let step = transition(&mut self.state, &self.boxes, &ctx);
        self.boxes = step.boxes;

        if self.state.selected() != previous {
            events.push(EditorEvent::SelectionChanged(self.state.selected()));
        }
        if step.committed {
            events.push(EditorEvent::BoxesChanged(self.boxes.clone()));
        }
    }

    fn recompute_frame(&mut self) {
        let old_scale = self.frame.map(|f| f.scale);
        self.frame = self.image_size.and_then(|(w, h)| {
            compute_frame(self.canvas_width, self.canvas_height, w as f64, h as f64)
        });

        match (old_scale, self.frame) {
            (Some(old), Some(new)) => self.state.rescale(new.scale / old),
            // Nothing to map an in-flight gesture against.
            (Some(_), None) => self.boxes = self.state.cancel(&self.boxes),
            _ => {}
        }
    }
}
