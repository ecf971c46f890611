// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait. It owns the image list, loads images and their
//! sidecars in the background, and feeds pointer and keyboard input to the
//! [`Editor`].

use crate::ui::{canvas, properties, toolbar};
use annobox::config::AppConfig;
use annobox::editor::boxes::BoxList;
use annobox::editor::render::RasterSurface;
use annobox::editor::{dispatch, Editor, EditorEvent, EditorObserver};
use annobox::io::{media, save_worker::SaveWorker, serialization};
use annobox::models::annotation::BoxId;
use annobox::models::labels::LabelSet;
use annobox::models::project::ImageAnnotations;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};

/// Result of background image loading operation.
struct LoadedImageData {
    index: usize,
    image: RgbaImage,
    annotations: Option<ImageAnnotations>,
}

/// Main application state.
pub struct AnnoboxApp {
    config: AppConfig,

    editor: Editor,

    /// Images opened this session
    images: Vec<PathBuf>,

    /// Index into `images` of the image being edited
    current: Option<usize>,

    /// Loaded image texture for display
    image_texture: Option<egui::TextureHandle>,

    /// Decoded pixels of the current image, kept for snapshot export
    image: Option<RgbaImage>,

    /// Index of the image being loaded in the background
    pending: Option<usize>,

    /// Receiver for background image loading
    image_loader: Option<Receiver<Result<LoadedImageData, String>>>,

    /// Loading state message
    loading_message: Option<String>,

    /// Boxes changed since the last save
    dirty: bool,

    save_worker: SaveWorker,

    /// Last message for the status bar
    status: Option<String>,
}

impl EditorObserver for AnnoboxApp {
    fn boxes_changed(&mut self, boxes: &BoxList) {
        self.dirty = true;
        log::debug!("{} boxes on current image", boxes.len());
    }

    fn selection_changed(&mut self, selected: Option<BoxId>) {
        match selected {
            Some(id) => log::debug!("Selected box {}", id),
            None => log::debug!("Cleared selection"),
        }
    }
}

impl AnnoboxApp {
    /// Create a new application instance.
    pub fn new(config: AppConfig) -> Self {
        let labels = LabelSet::new(config.labels.clone(), config.default_label.as_deref());
        let editor = Editor::new(config.editor.clone(), labels);
        Self {
            config,
            editor,
            images: Vec::new(),
            current: None,
            image_texture: None,
            image: None,
            pending: None,
            image_loader: None,
            loading_message: None,
            dirty: false,
            save_worker: SaveWorker::new(),
            status: None,
        }
    }

    fn handle_events(&mut self, events: Vec<EditorEvent>) {
        dispatch(&events, self);
    }

    fn current_path(&self) -> Option<&Path> {
        self.current.and_then(|i| self.images.get(i)).map(PathBuf::as_path)
    }

    /// Snapshot of the current image's boxes for serialization.
    fn snapshot(&self) -> Option<ImageAnnotations> {
        let path = self.current_path()?;
        let (width, height) = self.editor.image_size()?;
        let media_file = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Some(ImageAnnotations::from_boxes(
            media_file,
            width,
            height,
            self.editor.boxes().all(),
        ))
    }

    /// Write the sidecar of the current image in the background.
    fn save_current(&mut self) {
        let Some(path) = self.current_path().map(Path::to_path_buf) else {
            return;
        };
        let Some(data) = self.snapshot() else {
            return;
        };
        self.save_worker.submit(&path, data, self.config.sidecar_format);
        self.dirty = false;
    }

    fn save_if_dirty(&mut self) {
        if self.dirty {
            self.save_current();
        }
    }

    /// Add images to the session and open the first of them.
    fn open_images(&mut self, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            return;
        }
        let first = self.images.len();
        log::info!("Opened {} images", paths.len());
        self.images.extend(paths);
        self.switch_to(first);
    }

    /// Save pending changes, then load the image at `index` (asynchronously).
    fn switch_to(&mut self, index: usize) {
        let Some(path) = self.images.get(index).cloned() else {
            return;
        };
        self.save_if_dirty();

        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.pending = Some(index);
        self.loading_message = Some(format!("Loading {}...", path.display()));
        let format = self.config.sidecar_format;

        // Spawn background thread for loading
        std::thread::spawn(move || {
            let result = (|| -> anyhow::Result<LoadedImageData> {
                let loaded = media::load_image(&path)?;
                log::info!("Loaded image: {} ({}x{})", path.display(), loaded.width(), loaded.height());
                let annotations = serialization::load_sidecar(&path, format)?;
                Ok(LoadedImageData {
                    index,
                    image: loaded.image,
                    annotations,
                })
            })();

            let _ = sender.send(result.map_err(|e| format!("{:#}", e)));
        });
    }

    /// Move relative to the image being loaded, or the current one.
    fn step(&mut self, delta: isize) {
        let Some(current) = self.pending.or(self.current) else {
            return;
        };
        let target = current as isize + delta;
        if target >= 0 && (target as usize) < self.images.len() {
            self.switch_to(target as usize);
        }
    }

    fn finish_loading(&mut self, ctx: &egui::Context, loaded: LoadedImageData) {
        let (width, height) = loaded.image.dimensions();
        let size = [width as usize, height as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, loaded.image.as_raw());
        self.image_texture = Some(ctx.load_texture(
            "loaded_image",
            color_image,
            egui::TextureOptions::LINEAR,
        ));
        self.install(loaded);
    }

    /// Swap the editor over to a freshly loaded image.
    fn install(&mut self, loaded: LoadedImageData) {
        // Edits made to the previous image while this one was loading.
        self.save_if_dirty();

        let (width, height) = loaded.image.dimensions();
        let boxes = loaded
            .annotations
            .map(|a| a.to_boxes())
            .unwrap_or_default();
        let events = self.editor.load_image(width, height, boxes);
        self.handle_events(events);

        self.image = Some(loaded.image);
        self.current = Some(loaded.index);
        self.dirty = false;
        self.status = None;
    }

    /// Export annotations of the current image to a file.
    fn export_annotations(&mut self, path: PathBuf) {
        let Some(data) = self.snapshot() else {
            return;
        };
        match serialization::export(&data, &path) {
            Ok(()) => {
                log::info!("Exported annotations to {}", path.display());
                self.status = Some(format!("Exported {}", path.display()));
            }
            Err(e) => {
                log::error!("Failed to export annotations: {:#}", e);
                self.status = Some(format!("Failed to export {}", path.display()));
            }
        }
    }

    /// Render the current image and boxes offscreen and write a PNG.
    fn export_snapshot(&mut self, path: PathBuf) {
        let (Some(image), Some((width, height))) = (&self.image, self.editor.image_size()) else {
            return;
        };

        // Render at intrinsic size so boxes land on the original pixels.
        let mut editor = self.editor.clone();
        editor.cancel();
        editor.set_canvas_size(width as f64, height as f64);
        let mut surface = RasterSurface::new(width, height);
        editor.render(&mut surface, image);

        match media::save_snapshot(surface.image(), &path) {
            Ok(()) => self.status = Some(format!("Saved snapshot {}", path.display())),
            Err(e) => {
                log::error!("{:#}", e);
                self.status = Some(format!("Failed to save snapshot {}", path.display()));
            }
        }
    }

    fn poll_background(&mut self, ctx: &egui::Context) {
        // Check for completed image loading
        if let Some(ref receiver) = self.image_loader {
            if let Ok(result) = receiver.try_recv() {
                self.image_loader = None;
                self.pending = None;
                self.loading_message = None;

                match result {
                    Ok(loaded) => self.finish_loading(ctx, loaded),
                    Err(e) => {
                        log::error!("Failed to load image: {}", e);
                        self.status = Some(format!("Failed to load image: {}", e));
                    }
                }
            }
        }

        for outcome in self.save_worker.poll() {
            match outcome.result {
                Ok(()) => {
                    log::info!("Saved {}", outcome.path.display());
                    self.status = Some(format!("Saved {}", outcome.path.display()));
                }
                Err(e) => {
                    log::error!("{:#}", e);
                    self.status = Some(format!("Failed to save {}", outcome.path.display()));
                    self.dirty = true;
                }
            }
        }

        // Request repaint while work is pending (spinner, save results)
        if self.loading_message.is_some() || self.save_worker.in_flight() > 0 {
            ctx.request_repaint();
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        // Escape always reaches the editor, even with a focused widget
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            let events = if self.editor.mode() != annobox::editor::state::Mode::Idle {
                self.editor.cancel()
            } else {
                self.editor.select(None)
            };
            self.handle_events(events);
        }

        // Only process if no text field is focused
        if ctx.wants_keyboard_input() {
            return;
        }

        let shortcuts = &self.config.shortcuts;
        let next = key_or(&shortcuts.next_image, egui::Key::ArrowRight);
        let prev = key_or(&shortcuts.prev_image, egui::Key::ArrowLeft);
        let delete = key_or(&shortcuts.delete_box, egui::Key::D);
        let save = key_or(&shortcuts.save, egui::Key::S);

        let (save_pressed, delete_pressed, next_pressed, prev_pressed, digit) = ctx.input(|i| {
            let digit = DIGIT_KEYS.iter().position(|k| i.key_pressed(*k));
            (
                i.modifiers.command && i.key_pressed(save),
                !i.modifiers.command
                    && (i.key_pressed(egui::Key::Delete)
                        || i.key_pressed(egui::Key::Backspace)
                        || i.key_pressed(delete)),
                i.key_pressed(next),
                i.key_pressed(prev),
                digit,
            )
        });

        if save_pressed {
            self.save_current();
        }
        if delete_pressed {
            let events = self.editor.delete_selected();
            self.handle_events(events);
        }
        if next_pressed {
            self.step(1);
        }
        if prev_pressed {
            self.step(-1);
        }
        if let Some(index) = digit {
            self.editor.set_active_label_index(index);
        }
    }

    fn show_menu(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let has_image = self.editor.image_size().is_some();

        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Images...").clicked() {
                    // Open native file picker
                    if let Some(paths) = rfd::FileDialog::new()
                        .add_filter("Images", media::IMAGE_EXTENSIONS)
                        .pick_files()
                    {
                        self.open_images(paths);
                    }
                    ui.close_menu();
                }
                if ui.add_enabled(has_image, egui::Button::new("Save (Ctrl+S)")).clicked() {
                    self.save_current();
                    ui.close_menu();
                }
                ui.separator();
                ui.add_enabled_ui(has_image, |ui| {
                    ui.menu_button("Export Annotations", |ui| {
                        if ui.button("Export as JSON...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("JSON", &["json"])
                                .set_file_name("annotations.json")
                                .save_file()
                            {
                                self.export_annotations(path);
                            }
                            ui.close_menu();
                        }
                        if ui.button("Export as YAML...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("YAML", &["yaml", "yml"])
                                .set_file_name("annotations.yaml")
                                .save_file()
                            {
                                self.export_annotations(path);
                            }
                            ui.close_menu();
                        }
                    });
                    if ui.button("Export Snapshot PNG...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("PNG", &["png"])
                            .set_file_name("snapshot.png")
                            .save_file()
                        {
                            self.export_snapshot(path);
                        }
                        ui.close_menu();
                    }
                });
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("Edit", |ui| {
                let has_selection = self.editor.selected().is_some();
                if ui.add_enabled(has_selection, egui::Button::new("Delete Selected")).clicked() {
                    let events = self.editor.delete_selected();
                    self.handle_events(events);
                    ui.close_menu();
                }
                if ui.add_enabled(has_selection, egui::Button::new("Deselect (Esc)")).clicked() {
                    let events = self.editor.select(None);
                    self.handle_events(events);
                    ui.close_menu();
                }
            });

            ui.menu_button("Image", |ui| {
                let current = self.current.unwrap_or(0);
                let can_prev = self.current.is_some() && current > 0;
                let can_next = self.current.is_some() && current + 1 < self.images.len();
                if ui.add_enabled(can_next, egui::Button::new("Next (→)")).clicked() {
                    self.step(1);
                    ui.close_menu();
                }
                if ui.add_enabled(can_prev, egui::Button::new("Previous (←)")).clicked() {
                    self.step(-1);
                    ui.close_menu();
                }
            });
        });
    }
}

const DIGIT_KEYS: [egui::Key; 9] = [
    egui::Key::Num1,
    egui::Key::Num2,
    egui::Key::Num3,
    egui::Key::Num4,
    egui::Key::Num5,
    egui::Key::Num6,
    egui::Key::Num7,
    egui::Key::Num8,
    egui::Key::Num9,
];

/// Resolve a configured key name, falling back when it is unknown.
fn key_or(name: &str, fallback: egui::Key) -> egui::Key {
    egui::Key::from_name(name).unwrap_or_else(|| {
        log::warn!("Unknown key '{}', using {:?}", name, fallback);
        fallback
    })
}

impl eframe::App for AnnoboxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_background(ctx);

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.show_menu(ctx, ui);
        });

        // Toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            let image_name = self
                .current_path()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string());
            let status = toolbar::ToolbarStatus {
                mode: self.editor.mode(),
                dirty: self.dirty,
                position: self.current.map(|i| (i + 1, self.images.len())),
                image_name: image_name.as_deref(),
            };
            if let Some(index) = toolbar::show(ui, self.editor.labels(), &status) {
                self.editor.set_active_label_index(index);
            }
        });

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| match &self.status {
                Some(message) => {
                    ui.label(message);
                }
                None if self.editor.image_size().is_some() => {
                    ui.label(format!("{} boxes", self.editor.boxes().len()));
                }
                None => {
                    ui.label("No image loaded");
                }
            });
        });

        // Properties panel (right side)
        let properties_action = egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| properties::show(ui, &self.editor))
            .inner;

        // Handle properties panel actions
        let events = match properties_action {
            properties::PropertiesAction::Select(id) => self.editor.select(Some(id)),
            properties::PropertiesAction::SetLabel(id, label) => self.editor.set_label(id, &label),
            properties::PropertiesAction::Delete(id) => self.editor.delete(id),
            properties::PropertiesAction::None => Vec::new(),
        };
        self.handle_events(events);

        self.handle_keyboard(ctx);

        // Main canvas (center)
        let events = egui::CentralPanel::default()
            .show(ctx, |ui| {
                // Show loading overlay if loading
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    Vec::new()
                } else {
                    canvas::show(ui, &mut self.editor, self.image_texture.as_ref())
                }
            })
            .inner;
        self.handle_events(events);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save_if_dirty();
        for outcome in self.save_worker.wait() {
            if let Err(e) = outcome.result {
                log::error!("{:#}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annobox::config::SidecarFormat;
    use annobox::models::annotation::BoundingBox;
    use annobox::util::geometry::NormRect;

    #[test]
    fn test_key_names_resolve() {
        assert_eq!(key_or("ArrowRight", egui::Key::A), egui::Key::ArrowRight);
        assert_eq!(key_or("D", egui::Key::A), egui::Key::D);
        assert_eq!(key_or("NoSuchKey", egui::Key::S), egui::Key::S);
    }

    #[test]
    fn test_observer_marks_dirty() {
        let mut app = AnnoboxApp::new(AppConfig::default());
        assert!(!app.dirty);
        app.handle_events(vec![EditorEvent::SelectionChanged(None)]);
        assert!(!app.dirty);
        app.handle_events(vec![EditorEvent::BoxesChanged(BoxList::default())]);
        assert!(app.dirty);
    }

    fn loaded(index: usize) -> LoadedImageData {
        LoadedImageData {
            index,
            image: RgbaImage::new(64, 32),
            annotations: None,
        }
    }

    #[test]
    fn test_edits_during_load_are_saved() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.png");
        let second = dir.path().join("b.png");
        let boxes = vec![
            BoundingBox::new(NormRect::new(0.1, 0.1, 0.2, 0.2), "object"),
            BoundingBox::new(NormRect::new(0.5, 0.5, 0.2, 0.2), "object"),
        ];
        let doomed = boxes[0].id;

        let mut app = AnnoboxApp::new(AppConfig::default());
        app.images = vec![first.clone(), second];
        app.current = Some(0);
        app.editor.load_image(64, 32, boxes);

        // Switch away, then delete on the old image before the load lands.
        app.switch_to(1);
        let events = app.editor.delete(doomed);
        app.handle_events(events);
        assert!(app.dirty);

        app.install(loaded(1));
        assert_eq!(app.current, Some(1));
        assert!(!app.dirty);
        for outcome in app.save_worker.wait() {
            outcome.result.unwrap();
        }

        let saved = serialization::load_sidecar(&first, SidecarFormat::Json)
            .unwrap()
            .unwrap();
        assert_eq!(saved.boxes.len(), 1);
        assert_ne!(saved.boxes[0].id, Some(doomed));
    }

    #[test]
    fn test_repeated_steps_advance_from_pending_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = AnnoboxApp::new(AppConfig::default());
        app.images = (0..4).map(|i| dir.path().join(format!("{}.png", i))).collect();
        app.current = Some(0);

        app.step(1);
        app.step(1);
        assert_eq!(app.pending, Some(2));
        assert_eq!(app.current, Some(0));

        app.step(-1);
        assert_eq!(app.pending, Some(1));
    }

    #[test]
    fn test_save_writes_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("frame.png");
        let mut app = AnnoboxApp::new(AppConfig::default());
        app.images.push(image_path.clone());
        app.current = Some(0);
        app.editor.load_image(64, 32, Vec::new());

        app.save_current();
        for outcome in app.save_worker.wait() {
            outcome.result.unwrap();
        }

        let saved = serialization::load_sidecar(&image_path, SidecarFormat::Json)
            .unwrap()
            .unwrap();
        assert_eq!(saved.media_file, "frame.png");
        assert_eq!((saved.image_width, saved.image_height), (64, 32));
        assert!(saved.boxes.is_empty());
    }
}
