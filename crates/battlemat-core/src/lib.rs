//! Battlemat Core Library
//!
//! Display-agnostic core of the battle map annotator: layers, compositing,
//! tools and the interaction state machine.

pub mod camera;
pub mod compositor;
pub mod config;
pub mod geometry;
pub mod input;
pub mod map;
pub mod raster;
pub mod scene;
pub mod tools;

/// Canonical layer width in pixels.
pub const CANVAS_WIDTH: u32 = 1920;
/// Canonical layer height in pixels.
pub const CANVAS_HEIGHT: u32 = 1080;

pub use camera::Viewport;
pub use compositor::{composite, Audience, Compositor, DisplaySink, Frame};
pub use config::SceneConfig;
pub use geometry::{feet_to_pixels, snap_measure_square, SpellKind, SpellShape};
pub use input::{InputState, MouseButton, PointerEvent};
pub use map::{ImageLoadError, MapFormat, MapLayer};
pub use raster::{BlendMode, Surface};
pub use scene::Scene;
pub use tools::{Gesture, ToolKind, ToolManager, ToolSettings};
