//! The scene: layer ownership and the pointer-driven state machine.
//!
//! Every annotation mutation goes through [`Scene`], which follows it with a
//! composite and present cycle. Committed work lives in the preserved copy
//! of the annotation layer; previews are drawn over a fresh copy of it and
//! discarded by copying it back.

use crate::camera::Viewport;
use crate::compositor::{Audience, Compositor, DisplaySink, Frame};
use crate::config::SceneConfig;
use crate::geometry::{measured_unit, snap_measure_square, spell_preview, SpellKind, SpellShape};
use crate::input::{InputState, MouseButton, PointerEvent};
use crate::map::{ImageLoadError, MapLayer};
use crate::raster::{BlendMode, Surface, TRANSPARENT};
use crate::tools::{Gesture, ToolKind, ToolManager, ToolSettings};
use image::Rgba;
use kurbo::{Point, Rect, Vec2};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Callback invoked with the new five-foot unit after a measurement.
pub type MeasurementListener = Box<dyn FnMut(u32)>;

/// A battle map with its annotation layer, tools and display link.
pub struct Scene {
    config: SceneConfig,
    map: MapLayer,
    annotation: Surface,
    /// Last committed annotation; previews are discarded back to it.
    preserved: Surface,
    undo_snapshot: Option<Surface>,
    tools: ToolManager,
    viewport: Viewport,
    input: InputState,
    compositor: Compositor,
    measurement_listener: Option<MeasurementListener>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene with default settings and a blank map.
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// Create a scene from the given defaults.
    pub fn with_config(config: SceneConfig) -> Self {
        let map = MapLayer::blank(config.background_pixel());
        let annotation = Surface::new(map.width(), map.height());
        let compositor = Compositor::new(&map, &annotation);
        let viewport = Viewport::default().with_zoom_limits(config.zoom_step, config.min_zoom);
        Self {
            tools: ToolManager::new(ToolSettings::from_config(&config)),
            preserved: annotation.clone(),
            undo_snapshot: None,
            input: InputState::new(),
            measurement_listener: None,
            config,
            map,
            annotation,
            viewport,
            compositor,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn map(&self) -> &MapLayer {
        &self.map
    }

    pub fn annotation(&self) -> &Surface {
        &self.annotation
    }

    /// The frame currently shown on the local viewport.
    pub fn frame(&self) -> &Frame {
        self.compositor.frame()
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.tools.settings
    }

    pub fn current_tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    pub fn gesture(&self) -> Gesture {
        self.tools.gesture
    }

    /// Check whether an undo snapshot is available.
    pub fn can_undo(&self) -> bool {
        self.undo_snapshot.is_some()
    }

    // --- Display link ---

    /// Link the player-facing display and send it the current frame.
    pub fn attach_display(&mut self, sink: &Rc<RefCell<dyn DisplaySink>>) {
        self.compositor.attach(sink);
    }

    pub fn detach_display(&mut self) {
        self.compositor.detach();
    }

    pub fn has_display(&self) -> bool {
        self.compositor.is_attached()
    }

    /// Register the callback notified after each completed measurement.
    pub fn set_measurement_listener(&mut self, listener: impl FnMut(u32) + 'static) {
        self.measurement_listener = Some(Box::new(listener));
    }

    // --- Map ---

    /// Load a map image from disk. On failure the scene is left untouched.
    pub fn load_map(&mut self, path: impl AsRef<Path>) -> Result<(), ImageLoadError> {
        let path = path.as_ref();
        match MapLayer::load(path, self.config.background_pixel()) {
            Ok(map) => {
                log::info!("Loaded map {:?}", path);
                self.set_map(map);
                Ok(())
            }
            Err(err) => {
                log::warn!("Failed to load map: {}", err);
                Err(err)
            }
        }
    }

    /// Replace the map, clearing all annotation state.
    pub fn set_map(&mut self, map: MapLayer) {
        self.map = map;
        self.tools.cancel();
        self.annotation = Surface::new(self.map.width(), self.map.height());
        self.preserved = self.annotation.clone();
        self.undo_snapshot = None;
        self.present(Audience::Players);
    }

    // --- Tool configuration ---

    /// Switch tools. Any preview on screen is discarded.
    pub fn set_tool(&mut self, tool: ToolKind) {
        let interrupted = self.tools.set_tool(tool);
        self.discard_preview(interrupted);
    }

    /// Set the spell footprint. A pending cone origin is dropped.
    pub fn set_spell_kind(&mut self, kind: SpellKind) {
        let interrupted = self.tools.set_spell_kind(kind);
        self.discard_preview(interrupted);
    }

    /// Apply the pen color field. Invalid colors keep the current one.
    pub fn set_pen_color(&mut self, input: &str) -> bool {
        self.tools.settings.set_pen_color_text(input)
    }

    /// Apply the pen size field.
    pub fn set_pen_size(&mut self, input: &str) -> bool {
        self.tools.settings.set_pen_size_text(input)
    }

    /// Apply the eraser size field.
    pub fn set_eraser_size(&mut self, input: &str) -> bool {
        self.tools.settings.set_eraser_size_text(input)
    }

    /// Apply the spell size field, in feet.
    pub fn set_spell_size(&mut self, input: &str) -> bool {
        self.tools.settings.set_spell_feet_text(input)
    }

    pub fn set_show_preview_to_players(&mut self, show: bool) {
        self.tools.settings.show_preview_to_players = show;
    }

    // --- Undo ---

    /// Restore the annotation layer from the undo snapshot.
    ///
    /// Only one level is kept, so a second undo does nothing and returns
    /// `false`.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_snapshot.take() else {
            log::debug!("Nothing to undo");
            return false;
        };
        self.annotation = snapshot;
        self.preserved.copy_from(&self.annotation);
        if let Gesture::Cast { origin, .. } = self.tools.gesture {
            self.tools.gesture = Gesture::Cast {
                origin,
                previewing: false,
            };
        }
        log::debug!("Undo");
        self.present(Audience::Players);
        true
    }

    // --- Pointer events (screen space) ---

    /// Dispatch a raw pointer event.
    ///
    /// Only the left button drives tools. A move with the left button held
    /// is a drag, otherwise a hover; while casting every move is a hover.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        let was_dragging = self.input.is_dragging();
        self.input.handle_pointer_event(event);
        match *event {
            PointerEvent::Down { position, button } => {
                if button == MouseButton::Left {
                    self.pointer_down(position);
                }
            }
            PointerEvent::Up { position, button } => {
                if button == MouseButton::Left && was_dragging {
                    self.pointer_up(position);
                }
            }
            PointerEvent::Move { position } => {
                if self.input.is_dragging() && self.tools.current_tool != ToolKind::Cast {
                    self.pointer_move(position);
                } else {
                    self.hover(position);
                }
            }
            PointerEvent::Leave => self.hover_leave(),
            PointerEvent::Scroll { position, delta } => self.scroll(delta, position),
        }
    }

    /// Primary button pressed at `screen`.
    pub fn pointer_down(&mut self, screen: Point) {
        let point = self.viewport.screen_to_layer(screen);
        log::trace!("Pointer down at {:?} ({:?})", point, self.tools.current_tool);
        match self.tools.current_tool {
            ToolKind::Draw | ToolKind::Erase => {
                capture(&mut self.undo_snapshot, &self.annotation);
                self.stroke(point, point);
                self.tools.gesture = Gesture::Stroke { last: point };
            }
            ToolKind::Pan => {
                self.tools.gesture = Gesture::Pan { anchor: screen };
            }
            ToolKind::Measure => {
                let start = self.clamp_to_layer(point);
                self.preserved.copy_from(&self.annotation);
                self.tools.gesture = Gesture::Measure { start, end: start };
            }
            ToolKind::Cast => self.cast_press(self.clamp_to_layer(point)),
        }
    }

    /// Pointer dragged to `screen` with the primary button held.
    pub fn pointer_move(&mut self, screen: Point) {
        let point = self.viewport.screen_to_layer(screen);
        match (self.tools.current_tool, self.tools.gesture) {
            (ToolKind::Draw | ToolKind::Erase, Gesture::Stroke { last }) => {
                self.stroke(last, point);
                self.tools.gesture = Gesture::Stroke { last: point };
            }
            (ToolKind::Draw | ToolKind::Erase, _) => {
                self.tools.gesture = Gesture::Stroke { last: point };
            }
            (ToolKind::Pan, Gesture::Pan { anchor }) => {
                self.viewport.pan(anchor - screen);
                self.tools.gesture = Gesture::Pan { anchor: screen };
            }
            (ToolKind::Pan, _) => {
                self.tools.gesture = Gesture::Pan { anchor: screen };
            }
            (ToolKind::Measure, Gesture::Measure { start, .. }) => {
                let end = snap_measure_square(start, self.clamp_to_layer(point));
                self.tools.gesture = Gesture::Measure { start, end };
                self.annotation.copy_from(&self.preserved);
                if start != end {
                    let color = self.config.measure_pixel();
                    self.annotation.fill_rect(Rect::from_points(start, end), color);
                }
                self.present(Audience::GameMaster);
            }
            (ToolKind::Cast, _) => self.hover(screen),
            _ => {}
        }
    }

    /// Primary button released at `screen`.
    pub fn pointer_up(&mut self, _screen: Point) {
        match self.tools.current_tool {
            ToolKind::Draw | ToolKind::Erase | ToolKind::Pan => {
                self.tools.cancel();
            }
            ToolKind::Measure => self.finish_measurement(),
            ToolKind::Cast => {}
        }
    }

    /// Pointer moved to `screen` without a drag.
    pub fn hover(&mut self, screen: Point) {
        if self.tools.current_tool != ToolKind::Cast {
            return;
        }
        let point = self.clamp_to_layer(self.viewport.screen_to_layer(screen));
        let origin = self.tools.gesture.cone_origin();
        let settings = &self.tools.settings;
        let Some(shape) = spell_preview(settings.spell_kind, origin, point, settings.spell_size_px()) else {
            return;
        };
        let color = self.spell_pixel();
        self.annotation.copy_from(&self.preserved);
        match shape {
            SpellShape::Square(rect) => self.annotation.fill_rect(rect, color),
            SpellShape::Circle(circle) => self.annotation.fill_circle(circle, color),
            SpellShape::Cone(corners) => self.annotation.fill_triangle(corners, color),
        }
        self.tools.gesture = Gesture::Cast {
            origin,
            previewing: true,
        };
        let audience = Audience::for_preview(self.tools.settings.show_preview_to_players);
        self.present(audience);
    }

    /// Pointer left the viewport. A spell preview is reverted.
    pub fn hover_leave(&mut self) {
        if let Gesture::Cast {
            origin,
            previewing: true,
        } = self.tools.gesture
        {
            self.annotation.copy_from(&self.preserved);
            self.tools.gesture = Gesture::Cast {
                origin,
                previewing: false,
            };
            self.present(Audience::Players);
        }
    }

    /// Scroll-wheel notch at `screen`. Only the vertical delta counts.
    pub fn scroll(&mut self, delta: Vec2, screen: Point) {
        if delta.y == 0.0 {
            return;
        }
        self.viewport.zoom_notch(delta.y, screen);
        log::trace!("Zoom {:.2}", self.viewport.zoom);
    }

    // --- Internals ---

    fn stroke(&mut self, from: Point, to: Point) {
        let settings = &self.tools.settings;
        let (width, color, mode) = match self.tools.current_tool {
            ToolKind::Erase => (settings.eraser_size, TRANSPARENT, BlendMode::Clear),
            _ => (settings.pen_size, settings.pen_pixel(), BlendMode::Paint),
        };
        self.annotation.draw_line(from, to, width, color, mode);
        self.preserved.copy_from(&self.annotation);
        self.present(Audience::Players);
    }

    fn cast_press(&mut self, point: Point) {
        let (origin, previewing) = match self.tools.gesture {
            Gesture::Cast { origin, previewing } => (origin, previewing),
            _ => (None, false),
        };
        if self.tools.settings.spell_kind.needs_origin() && origin.is_none() {
            log::trace!("Cone origin at {:?}", point);
            self.tools.gesture = Gesture::Cast {
                origin: Some(point),
                previewing: false,
            };
            return;
        }
        if previewing {
            capture(&mut self.undo_snapshot, &self.preserved);
            self.preserved.copy_from(&self.annotation);
            log::debug!("Committed {} spell", self.tools.settings.spell_kind.name());
            self.present(Audience::Players);
        }
        self.tools.gesture = Gesture::Cast {
            origin: None,
            previewing: false,
        };
    }

    fn finish_measurement(&mut self) {
        let Gesture::Measure { start, end } = self.tools.cancel() else {
            return;
        };
        let unit = measured_unit(start, end);
        let shown = start != end;
        self.annotation.copy_from(&self.preserved);
        if unit == 0 {
            if shown {
                self.present(Audience::GameMaster);
            }
            return;
        }

        self.tools.settings.five_foot_px = unit;
        log::debug!(
            "Measured five feet as {} px; spell size now {} px",
            unit,
            self.tools.settings.spell_size_px()
        );
        self.present(Audience::Players);
        if let Some(listener) = self.measurement_listener.as_mut() {
            listener(unit);
        }
    }

    fn discard_preview(&mut self, interrupted: Gesture) {
        if interrupted.shows_preview() {
            self.annotation.copy_from(&self.preserved);
            self.present(Audience::Players);
        }
    }

    fn spell_pixel(&self) -> Rgba<u8> {
        let pen = self.tools.settings.pen_pixel();
        Rgba([pen[0], pen[1], pen[2], self.config.preview_alpha])
    }

    fn clamp_to_layer(&self, point: Point) -> Point {
        let width = f64::from(self.annotation.width());
        let height = f64::from(self.annotation.height());
        Point::new(point.x.clamp(0.0, width), point.y.clamp(0.0, height))
    }

    fn present(&mut self, audience: Audience) {
        self.compositor.present(&self.map, &self.annotation, audience);
    }
}

/// Save `source` into an undo slot, reusing its allocation.
fn capture(slot: &mut Option<Surface>, source: &Surface) {
    match slot {
        Some(saved) => saved.copy_from(source),
        None => *slot = Some(source.clone()),
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("tool", &self.tools.current_tool)
            .field("gesture", &self.tools.gesture)
            .field("can_undo", &self.can_undo())
            .field("viewport", &self.viewport)
            .field("compositor", &self.compositor)
            .field("has_listener", &self.measurement_listener.is_some())
            .finish()
    }
}
