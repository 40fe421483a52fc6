//! Click versus drag disambiguation for mouse input
//!
//! A press-move-release sequence is a drag once the pointer strays beyond
//! the displacement threshold on either axis; otherwise it is a click. The
//! judgment is sticky: once a gesture becomes a drag it stays a drag even if
//! the pointer returns near the press position before release.

/// Classification of a completed press/release gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickType {
    Click,
    Drag,
}

#[derive(Debug)]
pub struct MouseTracker {
    threshold: u16,
    press: Option<(u16, u16)>,
    dragged: bool,
}

impl MouseTracker {
    #[must_use]
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold,
            press: None,
            dragged: false,
        }
    }

    pub fn press(&mut self, x: u16, y: u16) {
        self.press = Some((x, y));
        self.dragged = false;
    }

    pub fn moved(&mut self, x: u16, y: u16) {
        let Some((px, py)) = self.press else {
            return;
        };
        if px.abs_diff(x) > self.threshold || py.abs_diff(y) > self.threshold {
            self.dragged = true;
        }
    }

    /// Classify the gesture ending at `(x, y)`. Returns `None` if no press
    /// was seen (e.g. the button went down outside the tracked area).
    pub fn release(&mut self, x: u16, y: u16) -> Option<ClickType> {
        self.moved(x, y);
        let pressed = self.press.take().is_some();
        let dragged = std::mem::take(&mut self.dragged);

        pressed.then(|| if dragged { ClickType::Drag } else { ClickType::Click })
    }

    /// Drop any half-finished gesture (viewer closed mid-press).
    pub fn cancel(&mut self) {
        self.press = None;
        self.dragged = false;
    }
}
