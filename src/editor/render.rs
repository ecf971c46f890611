// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Box rendering.
//!
//! [`render`] paints a complete editor frame onto any [`Surface`]: the
//! background, the image, every box in insertion order with its label chip,
//! the in-progress draw preview and finally the handles of the selected box.
//! It reads its inputs only, so repeated calls with the same inputs paint
//! the same picture.

use super::boxes::BoxList;
use crate::config::{Color, EditorConfig};
use crate::models::annotation::{BoundingBox, BoxId};
use crate::models::labels::LabelSet;
use crate::util::geometry::{to_canvas, Corner, ImageFrame, PixelRect, Point};
use image::{imageops, Rgba, RgbaImage};

/// A 2D paint target in canvas pixels.
pub trait Surface {
    /// The image representation this surface can draw.
    type Image: ?Sized;

    fn clear(&mut self, color: Color);
    fn draw_image(&mut self, image: &Self::Image, rect: PixelRect);
    fn fill_rect(&mut self, rect: PixelRect, color: Color);
    fn stroke_rect(&mut self, rect: PixelRect, width: f64, color: Color);
    fn fill_circle(&mut self, center: Point, radius: f64, color: Color);
    fn stroke_circle(&mut self, center: Point, radius: f64, width: f64, color: Color);
    /// Draw `text` with its top-left corner at `pos`.
    fn text(&mut self, pos: Point, text: &str, size: f64, color: Color);
}

/// Everything about the editor that ends up on screen.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub frame: &'a ImageFrame,
    pub boxes: &'a BoxList,
    pub selected: Option<BoxId>,
    /// Box being drawn, canvas pixels.
    pub preview: Option<PixelRect>,
    pub labels: &'a LabelSet,
}

/// Paint `scene` onto `surface`.
pub fn render<S: Surface>(surface: &mut S, image: &S::Image, scene: &Scene, config: &EditorConfig) {
    surface.clear(config.background);
    surface.draw_image(image, scene.frame.rect());

    for bbox in scene.boxes {
        let selected = scene.selected == Some(bbox.id);
        draw_box(surface, scene, bbox, selected, config);
    }

    if let Some(preview) = scene.preview {
        surface.stroke_rect(preview, config.stroke_width, config.preview_color);
    }

    if let Some(bbox) = scene.selected.and_then(|id| scene.boxes.get(id)) {
        let rect = to_canvas(&bbox.rect(), scene.frame);
        for corner in Corner::ALL {
            let center = rect.corner(corner);
            surface.fill_circle(center, config.handle_radius, config.handle_fill);
            surface.stroke_circle(center, config.handle_radius, 1.0, config.selected_color);
        }
    }
}

/// Colour of a box, from its label's vocabulary position.
pub fn label_color(label: &str, labels: &LabelSet, config: &EditorConfig) -> Color {
    match labels.index_of(label) {
        Some(index) if !config.palette.is_empty() => config.palette[index % config.palette.len()],
        _ => config.default_color,
    }
}

/// Where the label chip of a box goes, in canvas pixels.
///
/// The chip sits above the box's top-left corner. When that would cross the
/// canvas top edge it moves inside the box instead.
pub fn chip_rect(box_rect: &PixelRect, label: &str, config: &EditorConfig) -> PixelRect {
    let width = config.chip_padding * 2.0 + label.chars().count() as f64 * config.chip_char_width;
    let above = box_rect.y - config.chip_height;
    let y = if above < 0.0 { box_rect.y } else { above };
    PixelRect::new(box_rect.x, y, width, config.chip_height)
}

fn draw_box<S: Surface>(
    surface: &mut S,
    scene: &Scene,
    bbox: &BoundingBox,
    selected: bool,
    config: &EditorConfig,
) {
    let rect = to_canvas(&bbox.rect(), scene.frame);
    let (color, width) = if selected {
        (config.selected_color, config.selected_stroke_width)
    } else {
        (label_color(&bbox.label, scene.labels, config), config.stroke_width)
    };
    surface.stroke_rect(rect, width, color);

    if bbox.label.is_empty() {
        return;
    }
    let chip = chip_rect(&rect, &bbox.label, config);
    surface.fill_rect(chip, color);
    let text_top = chip.y + (config.chip_height - config.font_size) / 2.0;
    surface.text(
        Point::new(chip.x + config.chip_padding, text_top),
        &bbox.label,
        config.font_size,
        config.chip_text_color,
    );
}

/// Software surface backed by an RGBA buffer.
///
/// Used for snapshot export and tests. Text is not rasterized; label chips
/// are painted without glyphs.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Blend `color` into every pixel whose center satisfies `inside`,
    /// scanning the clipped bounds `[x0, x1) x [y0, y1)`.
    fn blend_where(&mut self, bounds: PixelRect, color: Color, inside: impl Fn(f64, f64) -> bool) {
        let (w, h) = self.pixels.dimensions();
        let x0 = bounds.x.floor().max(0.0) as u32;
        let y0 = bounds.y.floor().max(0.0) as u32;
        let x1 = (bounds.right().ceil().max(0.0) as u32).min(w);
        let y1 = (bounds.bottom().ceil().max(0.0) as u32).min(h);

        for y in y0..y1 {
            for x in x0..x1 {
                if inside(x as f64 + 0.5, y as f64 + 0.5) {
                    blend_pixel(self.pixels.get_pixel_mut(x, y), color.0);
                }
            }
        }
    }
}

/// Source-over blend in integer arithmetic, so output is exact.
fn blend_pixel(dst: &mut Rgba<u8>, src: [u8; 4]) {
    let alpha = src[3] as u32;
    match alpha {
        0 => {}
        255 => dst.0 = src,
        _ => {
            let inverse = 255 - alpha;
            for i in 0..3 {
                dst.0[i] = ((src[i] as u32 * alpha + dst.0[i] as u32 * inverse + 127) / 255) as u8;
            }
            dst.0[3] = (alpha + (dst.0[3] as u32 * inverse + 127) / 255) as u8;
        }
    }
}

impl Surface for RasterSurface {
    type Image = RgbaImage;

    fn clear(&mut self, color: Color) {
        let paint = Rgba(color.0);
        for pixel in self.pixels.pixels_mut() {
            *pixel = paint;
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, rect: PixelRect) {
        let width = rect.width.round() as u32;
        let height = rect.height.round() as u32;
        if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
            return;
        }
        let scaled = imageops::resize(image, width, height, imageops::FilterType::Nearest);
        let (left, top) = (rect.x.round() as i64, rect.y.round() as i64);
        let (w, h) = self.pixels.dimensions();

        for (x, y, pixel) in scaled.enumerate_pixels() {
            let (dx, dy) = (left + x as i64, top + y as i64);
            if dx >= 0 && dy >= 0 && dx < w as i64 && dy < h as i64 {
                blend_pixel(self.pixels.get_pixel_mut(dx as u32, dy as u32), pixel.0);
            }
        }
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Color) {
        self.blend_where(rect, color, |x, y| rect.contains(Point::new(x, y)));
    }

    fn stroke_rect(&mut self, rect: PixelRect, width: f64, color: Color) {
        let half = width / 2.0;
        let outer = PixelRect::new(
            rect.x - half,
            rect.y - half,
            rect.width + width,
            rect.height + width,
        );
        let inner = PixelRect::new(
            rect.x + half,
            rect.y + half,
            rect.width - width,
            rect.height - width,
        );
        let has_inner = inner.width > 0.0 && inner.height > 0.0;
        self.blend_where(outer, color, |x, y| {
            let p = Point::new(x, y);
            outer.contains(p) && !(has_inner && inner.contains(p))
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        let bounds = PixelRect::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0);
        self.blend_where(bounds, color, |x, y| Point::new(x, y).distance_to(&center) <= radius);
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, width: f64, color: Color) {
        let outer = radius + width / 2.0;
        let inner = radius - width / 2.0;
        let bounds = PixelRect::new(center.x - outer, center.y - outer, outer * 2.0, outer * 2.0);
        self.blend_where(bounds, color, |x, y| {
            let d = Point::new(x, y).distance_to(&center);
            d <= outer && d >= inner
        });
    }

    fn text(&mut self, _pos: Point, _text: &str, _size: f64, _color: Color) {}
}
