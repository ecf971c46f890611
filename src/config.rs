// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application and editor configuration.
//!
//! Configuration is read from a YAML file. Every field has a default, so a
//! partial file (or no file at all) is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "ANNOBOX_CONFIG";

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "annobox.yaml";

/// An RGBA colour, written as `#RRGGBB` or `#RRGGBBAA` in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value.trim().trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(format!("invalid colour '{}', expected #RRGGBB or #RRGGBBAA", value));
        }

        let mut rgba = [255u8; 4];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let text = std::str::from_utf8(chunk).map_err(|e| e.to_string())?;
            rgba[i] = u8::from_str_radix(text, 16)
                .map_err(|_| format!("invalid colour '{}'", value))?;
        }
        Ok(Self(rgba))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
        }
    }
}

/// Geometry thresholds and visual style of the box editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Fixed canvas height; the width follows the host window.
    pub canvas_height: f64,
    /// Rendered radius of the corner handles.
    pub handle_radius: f64,
    /// Handle hit radius as a multiple of `handle_radius`.
    pub handle_hit_factor: f64,
    /// Drawn boxes narrower or shorter than this (canvas pixels) are discarded.
    pub min_box_size: f64,
    pub stroke_width: f64,
    pub selected_stroke_width: f64,
    pub chip_height: f64,
    /// Approximate advance of one label character, used to size chips.
    pub chip_char_width: f64,
    pub chip_padding: f64,
    pub font_size: f64,
    pub background: Color,
    pub selected_color: Color,
    pub preview_color: Color,
    pub handle_fill: Color,
    pub chip_text_color: Color,
    /// Colour of boxes whose label is not in the vocabulary.
    pub default_color: Color,
    /// Per-label colours, indexed by the label's vocabulary position.
    pub palette: Vec<Color>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_height: 600.0,
            handle_radius: 5.0,
            handle_hit_factor: 1.5,
            min_box_size: 4.0,
            stroke_width: 2.0,
            selected_stroke_width: 3.0,
            chip_height: 16.0,
            chip_char_width: 7.0,
            chip_padding: 4.0,
            font_size: 12.0,
            background: Color::rgb(40, 40, 40),
            selected_color: Color::rgb(0, 200, 255),
            preview_color: Color::rgb(173, 216, 230),
            handle_fill: Color::rgb(255, 255, 255),
            chip_text_color: Color::rgb(255, 255, 255),
            default_color: Color::rgb(255, 0, 0),
            palette: vec![
                Color::rgb(230, 25, 75),
                Color::rgb(60, 180, 75),
                Color::rgb(255, 225, 25),
                Color::rgb(245, 130, 48),
                Color::rgb(145, 30, 180),
                Color::rgb(70, 240, 240),
                Color::rgb(240, 50, 230),
                Color::rgb(210, 245, 60),
            ],
        }
    }
}

impl EditorConfig {
    /// Distance from a corner within which a pointer grabs its handle.
    pub fn handle_hit_radius(&self) -> f64 {
        self.handle_radius * self.handle_hit_factor
    }
}

/// Keyboard shortcuts of the desktop host, as egui key names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shortcuts {
    pub next_image: String,
    pub prev_image: String,
    pub delete_box: String,
    /// Pressed together with the command modifier.
    pub save: String,
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            next_image: "ArrowRight".to_string(),
            prev_image: "ArrowLeft".to_string(),
            delete_box: "D".to_string(),
            save: "S".to_string(),
        }
    }
}

/// Format of the annotation file written next to each image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidecarFormat {
    #[default]
    Json,
    Yaml,
}

impl SidecarFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SidecarFormat::Json => "json",
            SidecarFormat::Yaml => "yaml",
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub editor: EditorConfig,
    /// Ordered label vocabulary.
    pub labels: Vec<String>,
    pub default_label: Option<String>,
    pub shortcuts: Shortcuts,
    pub sidecar_format: SidecarFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            editor: EditorConfig::default(),
            labels: vec!["object".to_string()],
            default_label: None,
            shortcuts: Shortcuts::default(),
            sidecar_format: SidecarFormat::default(),
        }
    }
}

impl AppConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config = serde_yaml::from_str(text).context("Invalid configuration")?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Locate and load the configuration, falling back to defaults.
    ///
    /// The file named by `ANNOBOX_CONFIG` wins over `annobox.yaml` in the
    /// working directory. A broken file is logged and ignored.
    pub fn discover() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()));

        let Some(path) = path else {
            log::info!("No configuration file, using defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("{:#}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = AppConfig::from_yaml(
            "labels: [car, person]\neditor:\n  handle_radius: 8\n  default_color: '#00FF00'\n",
        )
        .unwrap();

        assert_eq!(config.labels, vec!["car", "person"]);
        assert_eq!(config.editor.handle_radius, 8.0);
        assert_eq!(config.editor.default_color, Color::rgb(0, 255, 0));
        assert_eq!(config.editor.min_box_size, EditorConfig::default().min_box_size);
        assert_eq!(config.sidecar_format, SidecarFormat::Json);
        assert_eq!(config.shortcuts, Shortcuts::default());
    }

    #[test]
    fn test_invalid_colour_rejected() {
        let result = AppConfig::from_yaml("editor:\n  background: 'not-a-colour'\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_colour_display_roundtrip() {
        let color = Color::rgba(1, 2, 255, 128);
        assert_eq!(color.to_string(), "#0102FF80");
        assert_eq!(Color::try_from(color.to_string()).unwrap(), color);
        assert_eq!(Color::rgb(255, 0, 0).to_string(), "#FF0000");
    }

    #[test]
    fn test_handle_hit_radius() {
        let config = EditorConfig::default();
        assert_eq!(config.handle_hit_radius(), 7.5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annobox.yaml");
        std::fs::write(&path, "sidecar_format: yaml\ndefault_label: person\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.sidecar_format, SidecarFormat::Yaml);
        assert_eq!(config.default_label.as_deref(), Some("person"));
    }
}
