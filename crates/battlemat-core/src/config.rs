//! Scene defaults.

use crate::camera::{MIN_ZOOM, ZOOM_STEP};
use crate::geometry::SpellKind;
use crate::tools::settings::{parse_color, to_pixel};
use image::Rgba;
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Tunable defaults for a scene. Every field falls back to its default
/// when missing from a config document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Initial pen width in layer pixels.
    pub pen_size: u32,
    /// Initial eraser width in layer pixels.
    pub eraser_size: u32,
    /// Initial pen color.
    pub pen_color: String,
    /// Initial pixels per five feet, before any measurement.
    pub five_foot_px: u32,
    /// Initial spell size in feet.
    pub spell_feet: u32,
    /// Initial spell footprint.
    pub spell_kind: SpellKind,
    /// Whether spell previews start out mirrored to players.
    pub show_preview_to_players: bool,
    /// Zoom change per scroll notch.
    pub zoom_step: f64,
    /// Zoom floor.
    pub min_zoom: f64,
    /// Alpha applied to measurement and spell previews.
    pub preview_alpha: u8,
    /// Color of the measurement rectangle.
    pub measure_color: String,
    /// Fill for map area not covered by the map image.
    pub map_background: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            pen_size: 4,
            eraser_size: 50,
            pen_color: "#000000".to_string(),
            five_foot_px: 50,
            spell_feet: 20,
            spell_kind: SpellKind::Circle,
            show_preview_to_players: false,
            zoom_step: ZOOM_STEP,
            min_zoom: MIN_ZOOM,
            preview_alpha: 96,
            measure_color: "#3a7fa7".to_string(),
            map_background: "#202020".to_string(),
        }
    }
}

impl SceneConfig {
    /// Serialize the config to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Configured pen color, or black if the string does not parse.
    pub fn pen_color(&self) -> Color {
        color_or(&self.pen_color, "pen_color", Color::from_rgba8(0, 0, 0, 255))
    }

    /// Measurement rectangle pixel, with the preview alpha applied.
    pub fn measure_pixel(&self) -> Rgba<u8> {
        let fallback = Color::from_rgba8(0x3a, 0x7f, 0xa7, 255);
        let color = to_pixel(color_or(&self.measure_color, "measure_color", fallback));
        Rgba([color[0], color[1], color[2], self.preview_alpha])
    }

    /// Opaque map background pixel.
    pub fn background_pixel(&self) -> Rgba<u8> {
        let fallback = Color::from_rgba8(0x20, 0x20, 0x20, 255);
        let color = to_pixel(color_or(&self.map_background, "map_background", fallback));
        Rgba([color[0], color[1], color[2], 255])
    }
}

fn color_or(value: &str, field: &str, fallback: Color) -> Color {
    parse_color(value).unwrap_or_else(|| {
        log::warn!("Invalid {} {:?} in config; using default", field, value);
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.pen_size, 4);
        assert_eq!(config.eraser_size, 50);
        assert_eq!(config.spell_kind, SpellKind::Circle);
        assert!((config.zoom_step - 0.05).abs() < f64::EPSILON);
        assert!((config.min_zoom - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SceneConfig::from_json(r#"{ "pen_size": 7, "spell_kind": "Cone" }"#).unwrap();
        assert_eq!(config.pen_size, 7);
        assert_eq!(config.spell_kind, SpellKind::Cone);
        assert_eq!(config.eraser_size, 50);
        assert_eq!(config.pen_color, "#000000");
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = SceneConfig::default();
        config.show_preview_to_players = true;
        config.measure_color = "#ff0000".to_string();
        let json = config.to_json().unwrap();
        assert_eq!(SceneConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(SceneConfig::from_json("{ pen_size: }").is_err());
        assert!(SceneConfig::from_json(r#"{ "pen_size": "big" }"#).is_err());
    }

    #[test]
    fn test_color_fallbacks() {
        let config = SceneConfig {
            pen_color: "chartreuse-ish".to_string(),
            map_background: "#102030".to_string(),
            preview_alpha: 50,
            ..SceneConfig::default()
        };
        assert_eq!(to_pixel(config.pen_color()), Rgba([0, 0, 0, 255]));
        assert_eq!(config.background_pixel(), Rgba([0x10, 0x20, 0x30, 255]));
        assert_eq!(config.measure_pixel(), Rgba([0x3a, 0x7f, 0xa7, 50]));
    }
}
