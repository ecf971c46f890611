// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the coordinate transformations between normalized
//! image coordinates, image pixels and canvas pixels. The image is drawn
//! aspect-fit and centered on the canvas; [`compute_frame`] produces the
//! mapping for the current canvas and image sizes.

use serde::{Deserialize, Serialize};

/// A 2D point. Depending on context this is normalized (0.0 to 1.0),
/// image-relative pixels or canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One of the four corners of an axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// The diagonally opposite corner.
    pub fn opposite(self) -> Self {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    /// Which corner `point` occupies relative to a fixed `pivot`.
    ///
    /// Ties resolve towards the right/bottom.
    pub fn relative_to(pivot: Point, point: Point) -> Self {
        match (point.x < pivot.x, point.y < pivot.y) {
            (true, true) => Corner::TopLeft,
            (false, true) => Corner::TopRight,
            (true, false) => Corner::BottomLeft,
            (false, false) => Corner::BottomRight,
        }
    }
}

/// An axis-aligned rectangle in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Repair the rectangle so it lies inside the unit square.
    ///
    /// Negative extents are flipped, non-finite values become zero and both
    /// edges are clamped into `[0, 1]`.
    pub fn clamped(self) -> Self {
        if self.is_within_unit(0.0) {
            return self;
        }

        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
        let (x, y) = (finite(self.x), finite(self.y));
        let (w, h) = (finite(self.width), finite(self.height));

        let x0 = x.min(x + w).clamp(0.0, 1.0);
        let x1 = x.max(x + w).clamp(0.0, 1.0);
        let y0 = y.min(y + h).clamp(0.0, 1.0);
        let y1 = y.max(y + h).clamp(0.0, 1.0);

        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Whether the rectangle satisfies the unit-square bounds within `tolerance`.
    pub fn is_within_unit(&self, tolerance: f64) -> bool {
        self.x >= -tolerance
            && self.y >= -tolerance
            && self.width >= -tolerance
            && self.height >= -tolerance
            && self.x + self.width <= 1.0 + tolerance
            && self.y + self.height <= 1.0 + tolerance
    }
}

/// An axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a valid rectangle from two arbitrary corner points.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn corner(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => Point::new(self.x, self.y),
            Corner::TopRight => Point::new(self.right(), self.y),
            Corner::BottomLeft => Point::new(self.x, self.bottom()),
            Corner::BottomRight => Point::new(self.right(), self.bottom()),
        }
    }

    /// Inclusive point-in-rectangle test.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// The aspect-fit mapping between image pixels and canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageFrame {
    /// Left edge of the drawn image within the canvas.
    pub offset_x: f64,
    /// Top edge of the drawn image within the canvas.
    pub offset_y: f64,
    pub draw_width: f64,
    pub draw_height: f64,
    /// `draw_width / intrinsic_width`.
    pub scale: f64,
}

impl ImageFrame {
    /// The drawn image area in canvas pixels.
    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.offset_x, self.offset_y, self.draw_width, self.draw_height)
    }

    /// Canvas point to image-relative pixels (unclamped).
    pub fn canvas_to_image(&self, point: Point) -> Point {
        Point::new(point.x - self.offset_x, point.y - self.offset_y)
    }

    /// Image-relative pixels to canvas point.
    pub fn image_to_canvas(&self, point: Point) -> Point {
        Point::new(point.x + self.offset_x, point.y + self.offset_y)
    }

    /// Clamp an image-relative point into `[0, draw_width] x [0, draw_height]`.
    pub fn clamp_to_image(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(0.0, self.draw_width),
            point.y.clamp(0.0, self.draw_height),
        )
    }

    /// Normalized rectangle to image-relative pixels.
    pub fn to_image_pixels(&self, rect: &NormRect) -> PixelRect {
        PixelRect::new(
            rect.x * self.draw_width,
            rect.y * self.draw_height,
            rect.width * self.draw_width,
            rect.height * self.draw_height,
        )
    }

    /// Image-relative pixel rectangle to normalized coordinates.
    pub fn image_pixels_to_normalized(&self, rect: &PixelRect) -> NormRect {
        NormRect::new(
            rect.x / self.draw_width,
            rect.y / self.draw_height,
            rect.width / self.draw_width,
            rect.height / self.draw_height,
        )
    }
}

/// Compute the aspect-fit, centered frame for an image on a canvas.
///
/// Returns `None` when any dimension is zero (or not a positive number),
/// since the mapping is undefined until both the canvas and the image have
/// a size.
pub fn compute_frame(
    canvas_width: f64,
    canvas_height: f64,
    image_width: f64,
    image_height: f64,
) -> Option<ImageFrame> {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !(positive(canvas_width)
        && positive(canvas_height)
        && positive(image_width)
        && positive(image_height))
    {
        return None;
    }

    let scale = (canvas_width / image_width).min(canvas_height / image_height);
    let draw_width = image_width * scale;
    let draw_height = image_height * scale;

    Some(ImageFrame {
        offset_x: (canvas_width - draw_width) / 2.0,
        offset_y: (canvas_height - draw_height) / 2.0,
        draw_width,
        draw_height,
        scale,
    })
}

/// Convert a normalized rectangle to canvas pixels.
pub fn to_canvas(rect: &NormRect, frame: &ImageFrame) -> PixelRect {
    let image = frame.to_image_pixels(rect);
    image.translate(frame.offset_x, frame.offset_y)
}

/// Convert a canvas pixel rectangle to normalized coordinates.
pub fn to_normalized(rect: &PixelRect, frame: &ImageFrame) -> NormRect {
    let image = rect.translate(-frame.offset_x, -frame.offset_y);
    frame.image_pixels_to_normalized(&image)
}

/// Convert pixel coordinates to normalized coordinates (0.0 to 1.0).
pub fn normalize_coordinates(pixel_x: f64, pixel_y: f64, width: u32, height: u32) -> Point {
    Point {
        x: pixel_x / width as f64,
        y: pixel_y / height as f64,
    }
}

/// Convert normalized coordinates to pixel coordinates.
pub fn denormalize_coordinates(point: &Point, width: u32, height: u32) -> (f64, f64) {
    (point.x * width as f64, point.y * height as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_normalize_denormalize_roundtrip() {
        let width = 1920;
        let height = 1080;
        let pixel_x = 960.0;
        let pixel_y = 540.0;

        let normalized = normalize_coordinates(pixel_x, pixel_y, width, height);
        let (denorm_x, denorm_y) = denormalize_coordinates(&normalized, width, height);

        assert!((denorm_x - pixel_x).abs() < 0.0001);
        assert!((denorm_y - pixel_y).abs() < 0.0001);
    }

    #[test]
    fn test_frame_letterboxes_wide_image() {
        let frame = compute_frame(800.0, 600.0, 400.0, 200.0).unwrap();
        assert!(approx(frame.scale, 2.0));
        assert!(approx(frame.draw_width, 800.0));
        assert!(approx(frame.draw_height, 400.0));
        assert!(approx(frame.offset_x, 0.0));
        assert!(approx(frame.offset_y, 100.0));
    }

    #[test]
    fn test_frame_pillarboxes_tall_image() {
        let frame = compute_frame(800.0, 600.0, 300.0, 600.0).unwrap();
        assert!(approx(frame.scale, 1.0));
        assert!(approx(frame.draw_width, 300.0));
        assert!(approx(frame.offset_x, 250.0));
        assert!(approx(frame.offset_y, 0.0));
    }

    #[test]
    fn test_frame_undefined_without_image() {
        assert!(compute_frame(800.0, 600.0, 0.0, 200.0).is_none());
        assert!(compute_frame(800.0, 600.0, 400.0, 0.0).is_none());
        assert!(compute_frame(0.0, 600.0, 400.0, 200.0).is_none());
        assert!(compute_frame(f64::NAN, 600.0, 400.0, 200.0).is_none());
    }

    #[test]
    fn test_canvas_normalized_roundtrip() {
        let frame = compute_frame(1024.0, 600.0, 1920.0, 1080.0).unwrap();
        let rects = [
            PixelRect::new(frame.offset_x, frame.offset_y, 10.0, 10.0),
            PixelRect::new(frame.offset_x + 123.4, frame.offset_y + 56.7, 300.3, 200.9),
            frame.rect(),
        ];

        for r in rects {
            let norm = to_normalized(&r, &frame);
            let again = to_normalized(&to_canvas(&norm, &frame), &frame);
            assert!(approx(norm.x, again.x));
            assert!(approx(norm.y, again.y));
            assert!(approx(norm.width, again.width));
            assert!(approx(norm.height, again.height));
        }
    }

    #[test]
    fn test_clamped_repairs_out_of_range() {
        let fixed = NormRect::new(0.9, -0.1, 0.3, 0.5).clamped();
        assert!(approx(fixed.x, 0.9));
        assert!(approx(fixed.y, 0.0));
        assert!(approx(fixed.width, 0.1));
        assert!(approx(fixed.height, 0.4));

        let flipped = NormRect::new(0.5, 0.5, -0.2, -0.3).clamped();
        assert!(approx(flipped.x, 0.3));
        assert!(approx(flipped.y, 0.2));
        assert!(flipped.is_within_unit(EPS));
    }

    #[test]
    fn test_corner_relative_to_pivot() {
        let pivot = Point::new(10.0, 10.0);
        assert_eq!(Corner::relative_to(pivot, Point::new(0.0, 0.0)), Corner::TopLeft);
        assert_eq!(Corner::relative_to(pivot, Point::new(20.0, 0.0)), Corner::TopRight);
        assert_eq!(Corner::relative_to(pivot, Point::new(0.0, 20.0)), Corner::BottomLeft);
        assert_eq!(Corner::relative_to(pivot, Point::new(20.0, 20.0)), Corner::BottomRight);
        assert_eq!(Corner::TopLeft.opposite(), Corner::BottomRight);
    }
}
