// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with the active label picker and editor status.
//!
//! The active label is what newly drawn boxes receive. Labels are also
//! reachable from the keyboard with the digits 1 to 9.

use annobox::editor::state::Mode;
use annobox::models::labels::LabelSet;

/// Editor state shown on the right of the toolbar.
pub struct ToolbarStatus<'a> {
    pub mode: Mode,
    pub dirty: bool,
    /// Current image position and count, 1-based.
    pub position: Option<(usize, usize)>,
    pub image_name: Option<&'a str>,
}

/// Display the toolbar. Returns the index of a label the user picked.
pub fn show(ui: &mut egui::Ui, labels: &LabelSet, status: &ToolbarStatus) -> Option<usize> {
    let mut picked = None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Label:");
        ui.separator();

        for (index, label) in labels.labels().iter().enumerate() {
            let text = if index < 9 {
                format!("{} {}", index + 1, label)
            } else {
                label.clone()
            };
            if ui.selectable_label(labels.active() == label.as_str(), text).clicked() {
                picked = Some(index);
            }
        }

        ui.separator();

        let hint = match status.mode {
            Mode::Idle => "Drag on the image to draw, drag a box to move it, drag a corner to resize",
            Mode::Drawing => "Release to create the box, Escape to cancel",
            Mode::Moving => "Release to drop the box, Escape to cancel",
            Mode::Resizing => "Release to apply the new size, Escape to cancel",
        };
        ui.label(egui::RichText::new(hint).italics().weak());

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if status.dirty {
                ui.label(egui::RichText::new("● unsaved").color(egui::Color32::from_rgb(230, 180, 60)));
            }
            if let (Some((current, total)), Some(name)) = (status.position, status.image_name) {
                ui.label(format!("{} ({}/{})", name, current, total));
            }
        });
    });

    picked
}
