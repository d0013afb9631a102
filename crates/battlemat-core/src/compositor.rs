//! Frame compositing and display sink fan-out.

use crate::map::MapLayer;
use crate::raster::{blend_over, Surface};
use image::{Rgba, RgbaImage};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A composited, fully opaque frame.
pub type Frame = RgbaImage;

/// A passive consumer of composited frames, such as a player-facing
/// window on a second monitor.
///
/// The scene never owns a sink; it only keeps a weak link to it.
pub trait DisplaySink {
    /// Show a new frame.
    fn update_frame(&mut self, frame: &Frame);
}

/// Who a presented frame is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Local viewport only (game-master previews).
    GameMaster,
    /// Local viewport and the attached display sink.
    Players,
}

impl Audience {
    /// Pick the audience for a preview that may or may not be shared.
    pub fn for_preview(share_with_players: bool) -> Self {
        if share_with_players {
            Audience::Players
        } else {
            Audience::GameMaster
        }
    }
}

/// Blend `annotation` over `map` into a new opaque frame.
pub fn composite(map: &MapLayer, annotation: &Surface) -> Frame {
    let mut frame = RgbaImage::new(map.width(), map.height());
    composite_into(&mut frame, map, annotation);
    frame
}

/// Blend `annotation` over `map` into an existing frame buffer.
///
/// All three buffers share the canonical resolution; a frame of another
/// size is reallocated first.
pub fn composite_into(frame: &mut Frame, map: &MapLayer, annotation: &Surface) {
    if frame.dimensions() != (map.width(), map.height()) {
        *frame = RgbaImage::new(map.width(), map.height());
    }
    debug_assert_eq!(
        (annotation.width(), annotation.height()),
        (map.width(), map.height())
    );

    let pixels = frame
        .chunks_exact_mut(4)
        .zip(map.image().chunks_exact(4))
        .zip(annotation.image().chunks_exact(4));
    for ((out, base), over) in pixels {
        let base = Rgba([base[0], base[1], base[2], 255]);
        let over = Rgba([over[0], over[1], over[2], over[3]]);
        let blended = blend_over(base, over);
        out.copy_from_slice(&[blended[0], blended[1], blended[2], 255]);
    }
}

/// Owns the local viewport frame and the weak link to the display sink.
pub struct Compositor {
    frame: Frame,
    sink: Option<Weak<RefCell<dyn DisplaySink>>>,
    generation: u64,
    frames_pushed: u64,
}

impl Compositor {
    /// Create a compositor showing the initial layers.
    pub fn new(map: &MapLayer, annotation: &Surface) -> Self {
        Self {
            frame: composite(map, annotation),
            sink: None,
            generation: 0,
            frames_pushed: 0,
        }
    }

    /// The frame currently shown on the local viewport.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Number of times the local viewport frame has been refreshed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of frames handed to display sinks so far.
    pub fn frames_pushed(&self) -> u64 {
        self.frames_pushed
    }

    /// Link a display sink and send it the current frame.
    ///
    /// Replaces any previously attached sink.
    pub fn attach(&mut self, sink: &Rc<RefCell<dyn DisplaySink>>) {
        if self.is_attached() {
            log::info!("Replacing attached display sink");
        } else {
            log::info!("Display sink attached");
        }
        self.sink = Some(Rc::downgrade(sink));
        self.push();
    }

    /// Drop the link to the display sink.
    pub fn detach(&mut self) {
        if self.sink.take().is_some() {
            log::info!("Display sink detached");
        }
    }

    /// Check whether a live display sink is linked.
    pub fn is_attached(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| sink.strong_count() > 0)
    }

    /// Recomposite and show the result to `audience`.
    pub fn present(&mut self, map: &MapLayer, annotation: &Surface, audience: Audience) {
        composite_into(&mut self.frame, map, annotation);
        self.generation += 1;
        if audience == Audience::Players {
            self.push();
        }
    }

    fn push(&mut self) {
        let Some(weak) = self.sink.as_ref() else {
            return;
        };
        let Some(sink) = weak.upgrade() else {
            log::warn!("Display sink was dropped without detaching; unlinking");
            self.sink = None;
            return;
        };
        match sink.try_borrow_mut() {
            Ok(mut sink) => {
                sink.update_frame(&self.frame);
                self.frames_pushed += 1;
            }
            Err(_) => log::warn!("Display sink is busy; skipping frame"),
        }
    }
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("size", &self.frame.dimensions())
            .field("attached", &self.is_attached())
            .field("generation", &self.generation)
            .field("frames_pushed", &self.frames_pushed)
            .finish()
    }
}
