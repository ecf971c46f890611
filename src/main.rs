// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annobox - bounding-box annotation for image datasets
//!
//! A cross-platform desktop application for drawing, moving, resizing and
//! labelling bounding boxes over a set of images.

mod app;
mod ui;

use anyhow::Result;
use annobox::config::AppConfig;
use app::AnnoboxApp;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = AppConfig::discover();

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Annobox - Bounding Box Annotation"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Annobox",
        options,
        Box::new(|_cc| Ok(Box::new(AnnoboxApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
