// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for image display and box annotation.
//!
//! This module provides the main canvas area where users view the current
//! image and draw, move and resize bounding boxes. Pointer input is
//! translated into canvas-local coordinates for the [`Editor`], and the
//! editor paints through an egui [`Surface`].

use annobox::config::Color;
use annobox::editor::hit::Hit;
use annobox::editor::render::Surface;
use annobox::editor::state::Mode;
use annobox::editor::{Editor, EditorEvent};
use annobox::util::geometry::{Corner, PixelRect, Point};

/// Paints editor output with an egui painter, offset to the canvas origin.
pub struct PainterSurface<'a> {
    painter: &'a egui::Painter,
    canvas: egui::Rect,
}

impl<'a> PainterSurface<'a> {
    pub fn new(painter: &'a egui::Painter, canvas: egui::Rect) -> Self {
        Self { painter, canvas }
    }

    fn pos(&self, point: Point) -> egui::Pos2 {
        self.canvas.min + egui::vec2(point.x as f32, point.y as f32)
    }

    fn rect(&self, rect: PixelRect) -> egui::Rect {
        egui::Rect::from_min_size(
            self.pos(Point::new(rect.x, rect.y)),
            egui::vec2(rect.width as f32, rect.height as f32),
        )
    }
}

fn color32(color: Color) -> egui::Color32 {
    let [r, g, b, a] = color.0;
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

impl Surface for PainterSurface<'_> {
    type Image = egui::TextureId;

    fn clear(&mut self, color: Color) {
        self.painter.rect_filled(self.canvas, 0.0, color32(color));
    }

    fn draw_image(&mut self, image: &egui::TextureId, rect: PixelRect) {
        self.painter.image(
            *image,
            self.rect(rect),
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Color) {
        self.painter.rect_filled(self.rect(rect), 0.0, color32(color));
    }

    fn stroke_rect(&mut self, rect: PixelRect, width: f64, color: Color) {
        self.painter.rect_stroke(
            self.rect(rect),
            0.0,
            egui::Stroke::new(width as f32, color32(color)),
        );
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        self.painter.circle_filled(self.pos(center), radius as f32, color32(color));
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, width: f64, color: Color) {
        self.painter.circle_stroke(
            self.pos(center),
            radius as f32,
            egui::Stroke::new(width as f32, color32(color)),
        );
    }

    fn text(&mut self, pos: Point, text: &str, size: f64, color: Color) {
        self.painter.text(
            self.pos(pos),
            egui::Align2::LEFT_TOP,
            text,
            egui::FontId::proportional(size as f32),
            color32(color),
        );
    }
}

/// Display the main canvas area and handle mouse interactions.
pub fn show(
    ui: &mut egui::Ui,
    editor: &mut Editor,
    texture: Option<&egui::TextureHandle>,
) -> Vec<EditorEvent> {
    let mut events = Vec::new();

    let Some(texture) = texture else {
        show_welcome(ui);
        return events;
    };

    let size = egui::vec2(ui.available_width(), editor.config().canvas_height as f32);
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
    editor.set_canvas_width(rect.width() as f64);

    let to_canvas = |pos: egui::Pos2| Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);
    let (pressed, released, latest) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.latest_pos(),
        )
    });

    if let Some(pos) = latest {
        let point = to_canvas(pos);
        if pressed && response.hovered() {
            events.extend(editor.pointer_down(point));
        } else if editor.mode() != Mode::Idle {
            // Drags continue past the canvas edge; the editor clamps.
            events.extend(editor.pointer_move(point));
        }
        if released && editor.mode() != Mode::Idle {
            events.extend(editor.pointer_up(point));
        }
    }

    if let Some(pos) = response.hover_pos() {
        ui.ctx().set_cursor_icon(cursor_for(editor.mode(), editor.hover(to_canvas(pos))));
    }

    let painter = ui.painter_at(rect);
    let mut surface = PainterSurface::new(&painter, rect);
    editor.render(&mut surface, &texture.id());

    if editor.mode() != Mode::Idle {
        ui.ctx().request_repaint();
    }

    events
}

fn cursor_for(mode: Mode, hit: Hit) -> egui::CursorIcon {
    match (mode, hit) {
        (Mode::Moving, _) => egui::CursorIcon::Grabbing,
        (Mode::Drawing, _) => egui::CursorIcon::Crosshair,
        (_, Hit::Handle { corner, .. }) => match corner {
            Corner::TopLeft | Corner::BottomRight => egui::CursorIcon::ResizeNwSe,
            Corner::TopRight | Corner::BottomLeft => egui::CursorIcon::ResizeNeSw,
        },
        (Mode::Resizing, _) => egui::CursorIcon::ResizeNwSe,
        (_, Hit::Body { .. }) => egui::CursorIcon::Grab,
        (_, Hit::None) => egui::CursorIcon::Crosshair,
    }
}

/// Show welcome message when no image is loaded.
fn show_welcome(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("Annobox")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.label(
                egui::RichText::new("Bounding-box annotation for image datasets")
                    .size(14.0)
                    .color(egui::Color32::from_gray(150)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("Open one or more images to begin annotating")
                    .color(egui::Color32::from_gray(180)),
            );
            ui.add_space(10.0);
            ui.label(
                egui::RichText::new("File → Open Images...")
                    .weak()
                    .color(egui::Color32::from_gray(130)),
            );
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_follows_hit() {
        let id = annobox::models::annotation::BoxId::new();
        let handle = Hit::Handle {
            id,
            corner: Corner::TopRight,
        };
        assert_eq!(cursor_for(Mode::Idle, handle), egui::CursorIcon::ResizeNeSw);
        assert_eq!(cursor_for(Mode::Idle, Hit::Body { id }), egui::CursorIcon::Grab);
        assert_eq!(cursor_for(Mode::Idle, Hit::None), egui::CursorIcon::Crosshair);
        assert_eq!(cursor_for(Mode::Moving, Hit::None), egui::CursorIcon::Grabbing);
    }

    #[test]
    fn test_color_conversion_keeps_channels() {
        let c = color32(Color::rgb(10, 20, 30));
        assert_eq!(c, egui::Color32::from_rgb(10, 20, 30));
    }
}
