// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Box properties panel.
//!
//! This module provides the properties panel for viewing the boxes of the
//! current image and editing their labels.

use annobox::editor::Editor;
use annobox::models::annotation::{BoundingBox, BoxId};
use annobox::util::geometry::{denormalize_coordinates, Point};

/// Action requested from the properties panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertiesAction {
    None,
    Select(BoxId),
    SetLabel(BoxId, String),
    Delete(BoxId),
}

/// Display the properties panel.
pub fn show(ui: &mut egui::Ui, editor: &Editor) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Boxes");
    ui.separator();

    let Some((image_width, image_height)) = editor.image_size() else {
        ui.label(egui::RichText::new("No image loaded").weak());
        return action;
    };

    if editor.boxes().is_empty() {
        ui.label(egui::RichText::new("No boxes yet").weak());
    }

    egui::ScrollArea::vertical()
        .max_height(ui.available_height() * 0.5)
        .show(ui, |ui| {
            for (index, bbox) in editor.boxes().iter().enumerate() {
                let selected = editor.selected() == Some(bbox.id);
                let text = format!("{}. {} #{}", index + 1, bbox.label, bbox.id);
                if ui.selectable_label(selected, text).clicked() {
                    action = PropertiesAction::Select(bbox.id);
                }
            }
        });

    if let Some(bbox) = editor.selected_box() {
        ui.separator();
        ui.heading("Selected");
        show_selected(ui, editor, bbox, image_width, image_height, &mut action);
    }

    action
}

fn show_selected(
    ui: &mut egui::Ui,
    editor: &Editor,
    bbox: &BoundingBox,
    image_width: u32,
    image_height: u32,
    action: &mut PropertiesAction,
) {
    let (x, y) = denormalize_coordinates(&Point::new(bbox.x, bbox.y), image_width, image_height);
    let (w, h) = denormalize_coordinates(&Point::new(bbox.width, bbox.height), image_width, image_height);

    egui::Grid::new("selected_box").num_columns(2).show(ui, |ui| {
        ui.label("Id");
        ui.label(bbox.id.to_string());
        ui.end_row();

        ui.label("Label");
        let mut label = bbox.label.clone();
        egui::ComboBox::from_id_source("box_label")
            .selected_text(label.clone())
            .show_ui(ui, |ui| {
                for candidate in editor.labels().labels() {
                    ui.selectable_value(&mut label, candidate.clone(), candidate.as_str());
                }
            });
        if label != bbox.label {
            *action = PropertiesAction::SetLabel(bbox.id, label);
        }
        ui.end_row();

        ui.label("Position");
        ui.label(format!("{:.0}, {:.0} px", x, y));
        ui.end_row();

        ui.label("Size");
        ui.label(format!("{:.0} × {:.0} px", w, h));
        ui.end_row();

        if let Some(confidence) = bbox.confidence {
            ui.label("Confidence");
            ui.label(format!("{:.2}", confidence));
            ui.end_row();
        }
    });

    ui.add_space(8.0);
    if ui.button("🗑 Delete box").clicked() {
        *action = PropertiesAction::Delete(bbox.id);
    }
}
