//! Configuration persistence for pagestitch settings

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Serializable pen color (RGB, 0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for PenColor {
    fn default() -> Self {
        // #ef4444
        Self::from_rgb8(0xef, 0x44, 0x44)
    }
}

impl PenColor {
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Parse `#rrggbb` (leading `#` optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::from_rgb8(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            255,
        ]
    }
}

/// Thresholds for picking the scroll target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// How much taller than the viewport the document must be to scroll it
    pub height_margin: f64,
    /// Inner scrollers smaller than this (px²) are ignored
    pub min_scroller_area: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            height_margin: 50.0,
            min_scroller_area: 50_000.0,
        }
    }
}

/// Timing and limits of the capture loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Wait after each scroll for layout, paint and lazy content
    pub settle_delay_ms: u64,
    /// Wait after hiding the tool's own overlay before capturing
    pub overlay_hide_delay_ms: u64,
    /// Wait after toggling fixed/sticky chrome
    pub chrome_toggle_delay_ms: u64,
    /// Minimum spacing between two calls to the capture primitive
    pub min_capture_interval_ms: u64,
    /// Offset shortfall (px) that counts as "pinned at the bottom"
    pub pinned_tolerance: f64,
    /// Extra working-canvas height (px) for content that grows mid-run
    pub canvas_safety_margin: f64,
    /// Steps allowed beyond `ceil(content / viewport)` before a run is abandoned
    pub extra_steps: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 800,
            overlay_hide_delay_ms: 50,
            chrome_toggle_delay_ms: 50,
            min_capture_interval_ms: 500,
            pinned_tolerance: 10.0,
            canvas_safety_margin: 2000.0,
            extra_steps: 200,
        }
    }
}

/// Selection and pen defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Selections smaller than this (native px) are discarded
    pub min_selection_size: u32,
    /// Handle grab tolerance in display pixels
    pub handle_tolerance: f32,
    pub pen_color: PenColor,
    /// Pen width in display pixels (1-10)
    pub pen_width: f32,
    pub palette: Vec<PenColor>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_selection_size: 8,
            handle_tolerance: 10.0,
            pen_color: PenColor::default(),
            pen_width: 2.0,
            palette: default_palette(),
        }
    }
}

fn default_palette() -> Vec<PenColor> {
    ["#ef4444", "#10b981", "#3b82f6", "#f59e0b", "#000000"]
        .iter()
        .filter_map(|hex| PenColor::from_hex(hex))
        .collect()
}

/// Output encoding options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Page height / page width of exported PDF pages
    pub pdf_page_aspect: f64,
    /// Largest non-HTML document accepted for rendering
    pub max_document_bytes: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pdf_page_aspect: 297.0 / 210.0,
            max_document_bytes: 9 * 1024 * 1024,
        }
    }
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub capture: CaptureConfig,
    pub editor: EditorConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Directory name under the user config dir
    pub const ID: &'static str = "pagestitch";

    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            log::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) {
        let Some(path) = Self::default_path() else {
            log::error!("Could not determine config directory for saving");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            log::error!("Failed to save config: {:?}", err);
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse() {
        let c = PenColor::from_hex("#10b981").unwrap();
        assert_eq!(c.to_rgba_u8(), [0x10, 0xb9, 0x81, 255]);
        assert!(PenColor::from_hex("#12345").is_none());
        assert!(PenColor::from_hex("zzzzzz").is_none());
    }

    #[test]
    fn default_palette_has_five_colors() {
        let config = EditorConfig::default();
        assert_eq!(config.palette.len(), 5);
        assert_eq!(config.palette[0], config.pen_color);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "capture": { "settle_delay_ms": 100 } }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.capture.settle_delay_ms, 100);
        assert_eq!(config.capture.extra_steps, 200);
        assert_eq!(config.resolver, ResolverConfig::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.editor.pen_width = 5.0;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
