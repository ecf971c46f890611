// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data serialization and deserialization.
//!
//! This module handles exporting and importing per-image annotation
//! records in YAML and JSON formats, and the sidecar files the desktop host
//! keeps next to each image.

use crate::config::SidecarFormat;
use crate::models::project::ImageAnnotations;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Suffix appended to an image file name to name its sidecar.
const SIDECAR_STEM: &str = "boxes";

/// Export annotations to YAML format.
pub fn export_yaml(data: &ImageAnnotations, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Export annotations to JSON format.
pub fn export_json(data: &ImageAnnotations, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Import annotations from YAML format.
pub fn import_yaml(path: &Path) -> Result<ImageAnnotations> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let data = serde_yaml::from_str(&yaml)
        .with_context(|| format!("Invalid annotation file {}", path.display()))?;
    Ok(data)
}

/// Import annotations from JSON format.
pub fn import_json(path: &Path) -> Result<ImageAnnotations> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let data = serde_json::from_str(&json)
        .with_context(|| format!("Invalid annotation file {}", path.display()))?;
    Ok(data)
}

/// Export in the format named by the file extension.
pub fn export(data: &ImageAnnotations, path: &Path) -> Result<()> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => export_yaml(data, path),
        Some("json") => export_json(data, path),
        other => bail!("Unsupported file extension: {:?}", other),
    }
}

/// Import in the format named by the file extension.
pub fn import(path: &Path) -> Result<ImageAnnotations> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => import_yaml(path),
        Some("json") => import_json(path),
        other => bail!("Unsupported file extension: {:?}", other),
    }
}

/// Sidecar path for an image, e.g. `cat.png` -> `cat.png.boxes.json`.
pub fn sidecar_path(image_path: &Path, format: SidecarFormat) -> PathBuf {
    let mut name = image_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.{}", SIDECAR_STEM, format.extension()));
    image_path.with_file_name(name)
}

/// Load the sidecar of an image if one exists, trying `preferred` first.
pub fn load_sidecar(image_path: &Path, preferred: SidecarFormat) -> Result<Option<ImageAnnotations>> {
    let fallback = match preferred {
        SidecarFormat::Json => SidecarFormat::Yaml,
        SidecarFormat::Yaml => SidecarFormat::Json,
    };

    for format in [preferred, fallback] {
        let path = sidecar_path(image_path, format);
        if path.exists() {
            let data = import(&path)?;
            log::info!("Loaded {} boxes from {}", data.boxes.len(), path.display());
            return Ok(Some(data));
        }
    }
    Ok(None)
}
