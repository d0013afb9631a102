//! Tool system for the map annotator.

pub mod settings;

pub use settings::ToolSettings;

use crate::geometry::SpellKind;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Draw,
    Erase,
    Pan,
    Measure,
    Cast,
}

impl ToolKind {
    /// Every tool, in palette order.
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Draw,
        ToolKind::Erase,
        ToolKind::Pan,
        ToolKind::Measure,
        ToolKind::Cast,
    ];

    /// Get display name for this tool.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Draw => "Draw",
            ToolKind::Erase => "Erase",
            ToolKind::Pan => "Pan",
            ToolKind::Measure => "Measure",
            ToolKind::Cast => "Cast",
        }
    }

    /// Whether the tool paints strokes onto the annotation layer.
    pub fn is_stroke(self) -> bool {
        matches!(self, ToolKind::Draw | ToolKind::Erase)
    }
}

/// Transient pointer state of the current tool.
///
/// Only the variant matching the current tool is ever live; switching
/// tools resets it to `Idle`, which is the zero value of every mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Drawing or erasing; `last` is the previous stroke point (layer space).
    Stroke { last: Point },
    /// Panning; `anchor` is the previous pointer position (screen space).
    Pan { anchor: Point },
    /// Measuring from `start` to the snapped `end` (layer space).
    Measure { start: Point, end: Point },
    /// Casting. `origin` is a pending cone apex; `previewing` is set while
    /// a preview is drawn on the annotation layer.
    Cast { origin: Option<Point>, previewing: bool },
}

impl Gesture {
    /// Check if an uncommitted preview is drawn on the annotation layer.
    pub fn shows_preview(&self) -> bool {
        match self {
            Gesture::Measure { start, end } => start != end,
            Gesture::Cast { previewing, .. } => *previewing,
            _ => false,
        }
    }

    /// Pending cone apex, if any.
    pub fn cone_origin(&self) -> Option<Point> {
        match self {
            Gesture::Cast { origin, .. } => *origin,
            _ => None,
        }
    }
}

/// Manages the current tool, its gesture and its parameters.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Gesture of the current tool.
    pub gesture: Gesture,
    /// Pen, eraser and spell parameters.
    pub settings: ToolSettings,
}

impl ToolManager {
    /// Create a tool manager with the given parameters.
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            current_tool: ToolKind::default(),
            gesture: Gesture::Idle,
            settings,
        }
    }

    /// Set the current tool, returning the gesture it interrupted.
    pub fn set_tool(&mut self, tool: ToolKind) -> Gesture {
        log::debug!("Tool {} -> {}", self.current_tool.name(), tool.name());
        self.current_tool = tool;
        self.cancel()
    }

    /// Set the spell footprint. A pending cone origin does not survive a
    /// change of footprint, so the interrupted gesture is returned.
    pub fn set_spell_kind(&mut self, kind: SpellKind) -> Gesture {
        self.settings.spell_kind = kind;
        if self.current_tool == ToolKind::Cast {
            self.cancel()
        } else {
            Gesture::Idle
        }
    }

    /// Cancel the current gesture, returning it.
    pub fn cancel(&mut self) -> Gesture {
        std::mem::take(&mut self.gesture)
    }

    /// Check if a gesture is in progress.
    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }
}
