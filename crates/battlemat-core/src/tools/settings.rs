//! Tool parameters fed by the palette and size fields.

use crate::config::SceneConfig;
use crate::geometry::{feet_to_pixels, SpellKind};
use image::Rgba;
use peniko::Color;
use peniko::color::Srgb;

/// Character limit of the pen size field.
pub const PEN_SIZE_CHARS: usize = 2;
/// Character limit of the eraser size field.
pub const ERASER_SIZE_CHARS: usize = 2;
/// Character limit of the spell size field (feet).
pub const SPELL_FEET_CHARS: usize = 3;

/// Default pen palette.
pub const PALETTE: [&str; 19] = [
    "#000000", "#141923", "#414168", "#3a7fa7", "#35e3e3", "#8fd970", "#5ebb49", "#458352",
    "#dcd37b", "#fffee5", "#ffd035", "#cc9245", "#a15c3e", "#a42f3b", "#f45b7a", "#c24998",
    "#81588d", "#bcb0c2", "#ffffff",
];

/// Keep only ASCII digits, truncated to `max_chars`.
pub fn filter_digits(input: &str, max_chars: usize) -> String {
    input
        .chars()
        .filter(char::is_ascii_digit)
        .take(max_chars)
        .collect()
}

/// Parse a size field. Returns `None` when nothing usable is left after
/// filtering, in which case the caller keeps its previous value.
pub fn parse_size_input(input: &str, max_chars: usize) -> Option<u32> {
    let digits = filter_digits(input, max_chars);
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u32>().ok().filter(|&value| value > 0)
}

/// Parse a CSS color: hex (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`), any
/// CSS named color, or a functional form such as `rgb(…)`.
pub fn parse_color(input: &str) -> Option<Color> {
    let input = input.trim().to_ascii_lowercase();
    match peniko::color::parse_color(&input) {
        Ok(color) => Some(color.to_alpha_color::<Srgb>()),
        Err(err) => {
            log::trace!("Unparseable color {:?}: {:?}", input, err);
            None
        }
    }
}

/// Convert a color to a raster pixel.
pub fn to_pixel(color: Color) -> Rgba<u8> {
    let rgba = color.to_rgba8();
    Rgba([rgba.r, rgba.g, rgba.b, rgba.a])
}

/// Current pen, eraser and spell parameters.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Pen color for strokes and spell effects.
    pub pen_color: Color,
    /// Pen width in layer pixels.
    pub pen_size: u32,
    /// Eraser width in layer pixels.
    pub eraser_size: u32,
    /// Spell footprint.
    pub spell_kind: SpellKind,
    /// Spell size in feet.
    pub spell_feet: u32,
    /// Measured pixels per five feet.
    pub five_foot_px: u32,
    /// Whether spell previews are mirrored to the players' display.
    pub show_preview_to_players: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::from_config(&SceneConfig::default())
    }
}

impl ToolSettings {
    /// Build settings from configured defaults.
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            pen_color: config.pen_color(),
            pen_size: config.pen_size.max(1),
            eraser_size: config.eraser_size.max(1),
            spell_kind: config.spell_kind,
            spell_feet: config.spell_feet,
            five_foot_px: config.five_foot_px,
            show_preview_to_players: config.show_preview_to_players,
        }
    }

    /// Apply the pen size field. Returns whether the value changed.
    pub fn set_pen_size_text(&mut self, input: &str) -> bool {
        apply_size(&mut self.pen_size, input, PEN_SIZE_CHARS)
    }

    /// Apply the eraser size field. Returns whether the value changed.
    pub fn set_eraser_size_text(&mut self, input: &str) -> bool {
        apply_size(&mut self.eraser_size, input, ERASER_SIZE_CHARS)
    }

    /// Apply the spell size field (feet). Returns whether the value changed.
    pub fn set_spell_feet_text(&mut self, input: &str) -> bool {
        apply_size(&mut self.spell_feet, input, SPELL_FEET_CHARS)
    }

    /// Apply a pen color string. Unparseable input keeps the current color.
    pub fn set_pen_color_text(&mut self, input: &str) -> bool {
        match parse_color(input) {
            Some(color) => {
                self.pen_color = color;
                true
            }
            None => {
                log::warn!("Ignoring unrecognized pen color {:?}", input);
                false
            }
        }
    }

    /// Spell size converted to layer pixels with the current unit.
    pub fn spell_size_px(&self) -> u32 {
        feet_to_pixels(self.spell_feet, self.five_foot_px)
    }

    /// Pen color as a raster pixel.
    pub fn pen_pixel(&self) -> Rgba<u8> {
        to_pixel(self.pen_color)
    }
}

fn apply_size(target: &mut u32, input: &str, max_chars: usize) -> bool {
    match parse_size_input(input, max_chars) {
        Some(value) => {
            let changed = *target != value;
            *target = value;
            changed
        }
        None => false,
    }
}
