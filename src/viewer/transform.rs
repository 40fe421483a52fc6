//! Zoom and pan state for the catalog viewer
//!
//! A magnification + translation transform layered on top of the fitted
//! page, independent of pagination. Tap toggles between fit and a fixed
//! magnification; while magnified the page can be dragged. The transform is
//! forcibly reset on every page change and on viewer close.

use std::time::{Duration, Instant};

/// Tunables for the zoom interaction, sourced from settings.
#[derive(Clone, Copy, Debug)]
pub struct ZoomConfig {
    /// Magnification applied by a tap (1.0 = fit-to-surface).
    pub magnification: f32,
    /// Duration of the fit <-> zoomed transition.
    pub animation: Duration,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            magnification: 2.5,
            animation: Duration::from_millis(300),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct DragAnchor {
    x: i32,
    y: i32,
}

#[derive(Clone, Copy, Debug)]
struct Animation {
    from_mag: f32,
    from_pan: (f32, f32),
    started: Instant,
    duration: Duration,
}

/// Current magnification and pan, plus in-progress drag and animation.
///
/// Invariant: whenever the target magnification is 1.0, pan is (0, 0) and no
/// drag is active.
#[derive(Debug)]
pub struct Transform {
    zoomed: bool,
    magnification: f32,
    pan: (i32, i32),
    drag: Option<DragAnchor>,
    anim: Option<Animation>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            zoomed: false,
            magnification: 1.0,
            pan: (0, 0),
            drag: None,
            anim: None,
        }
    }

    #[must_use]
    pub fn is_zoomed(&self) -> bool {
        self.zoomed
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Target magnification (1.0 or the configured zoom factor).
    #[must_use]
    pub fn magnification(&self) -> f32 {
        if self.zoomed { self.magnification } else { 1.0 }
    }

    #[must_use]
    pub fn pan(&self) -> (i32, i32) {
        self.pan
    }

    /// Tap: fit -> zoomed, or zoomed -> fit. Ignored mid-drag; the gesture
    /// classifier never reports a click for an active drag anyway.
    pub fn toggle_zoom(&mut self, cfg: &ZoomConfig) {
        if self.drag.is_some() {
            return;
        }

        let (from_mag, from_pan) = self.displayed(Instant::now());
        if self.zoomed {
            self.zoomed = false;
            self.magnification = 1.0;
            self.pan = (0, 0);
        } else {
            self.zoomed = true;
            self.magnification = cfg.magnification.max(1.0);
        }

        self.anim = (!cfg.animation.is_zero()).then(|| Animation {
            from_mag,
            from_pan,
            started: Instant::now(),
            duration: cfg.animation,
        });
    }

    /// Pointer-down while zoomed: record the drag anchor. No-op when fitted.
    pub fn begin_drag(&mut self, x: u16, y: u16) {
        if !self.zoomed {
            return;
        }
        self.drag = Some(DragAnchor {
            x: i32::from(x) - self.pan.0,
            y: i32::from(y) - self.pan.1,
        });
        // Drag updates apply immediately; kill any transition in flight.
        self.anim = None;
    }

    /// Pointer-move during a drag: pan follows the pointer with no easing.
    pub fn drag_to(&mut self, x: u16, y: u16) {
        let Some(anchor) = self.drag else {
            return;
        };
        self.pan = (i32::from(x) - anchor.x, i32::from(y) - anchor.y);
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Forced reset to fit, discarding any in-progress drag or animation.
    /// Applied on page change and on viewer close.
    pub fn reset(&mut self) {
        self.zoomed = false;
        self.magnification = 1.0;
        self.pan = (0, 0);
        self.drag = None;
        self.anim = None;
    }

    /// Magnification and pan to draw right now, eased mid-transition.
    #[must_use]
    pub fn displayed(&self, now: Instant) -> (f32, (f32, f32)) {
        let target_mag = self.magnification();
        let target_pan = (self.pan.0 as f32, self.pan.1 as f32);

        let Some(anim) = self.anim else {
            return (target_mag, target_pan);
        };

        let t = progress(anim.started, anim.duration, now);
        if t >= 1.0 {
            return (target_mag, target_pan);
        }

        let eased = ease_out_cubic(t);
        let mag = anim.from_mag + (target_mag - anim.from_mag) * eased;
        let pan = (
            anim.from_pan.0 + (target_pan.0 - anim.from_pan.0) * eased,
            anim.from_pan.1 + (target_pan.1 - anim.from_pan.1) * eased,
        );
        (mag, pan)
    }

    /// True while a transition still needs frames. Finished animations are
    /// pruned so the event loop can fall back to its idle tick rate.
    pub fn tick_animation(&mut self, now: Instant) -> bool {
        match self.anim {
            Some(anim) if progress(anim.started, anim.duration, now) < 1.0 => true,
            Some(_) => {
                self.anim = None;
                false
            }
            None => false,
        }
    }
}

fn progress(started: Instant, duration: Duration, now: Instant) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(started);
    (elapsed.as_secs_f32() / duration.as_secs_f32()).min(1.0)
}

fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}
