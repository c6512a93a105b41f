//! Zoom and pan transform of the image panel.
//!
//! Screen coordinates have their origin at the top-left of the viewport with
//! y pointing down. Content coordinates are the canvas pixels before the
//! transform: `screen = content * scale + translate`.

use glam::DVec2;

use crate::options::ViewportOptions;

/// Scale and translation applied to the image content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub scale: f64,
    pub translate: DVec2,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: DVec2::ZERO,
        }
    }
}

impl ViewportTransform {
    /// Maps a content point to the screen.
    pub fn content_to_screen(&self, content: DVec2) -> DVec2 {
        content * self.scale + self.translate
    }

    /// Maps a screen point back to content.
    pub fn screen_to_content(&self, screen: DVec2) -> DVec2 {
        (screen - self.translate) / self.scale
    }
}

/// Pointer buttons as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

impl PointerButton {
    /// Secondary and middle buttons pan; the primary button draws.
    pub fn pans(self) -> bool {
        matches!(self, PointerButton::Secondary | PointerButton::Middle)
    }
}

/// Pan gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PanState {
    #[default]
    Idle,
    Panning {
        button: PointerButton,
        start_cursor: DVec2,
        start_translate: DVec2,
    },
}

/// Direction of one wheel notch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Viewport of the 2D image panel.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    options: ViewportOptions,
    transform: ViewportTransform,
    pan: PanState,
    revision: u64,
}

impl Viewport {
    /// Creates a viewport at scale 1 with no translation.
    pub fn new(options: ViewportOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// The current transform.
    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn scale(&self) -> f64 {
        self.transform.scale
    }

    pub fn translate(&self) -> DVec2 {
        self.transform.translate
    }

    pub fn pan_state(&self) -> PanState {
        self.pan
    }

    /// Counter bumped by every change of the transform.
    ///
    /// Consumers compare it against the revision they last drew to know when
    /// the overlay must be refreshed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Scales by `delta` about `cursor`, keeping the content point under the
    /// cursor fixed. Returns whether the transform changed.
    ///
    /// Non-finite input is ignored.
    #[allow(clippy::float_cmp)]
    pub fn zoom_toward_cursor(&mut self, cursor: DVec2, delta: f64) -> bool {
        if !delta.is_finite() || !cursor.is_finite() {
            log::warn!("ignoring zoom by {delta} at {cursor}");
            return false;
        }
        let old = self.transform.scale;
        let new = (old * delta).clamp(self.options.min_scale, self.options.max_scale);
        if new == old {
            return false;
        }
        let t = self.transform.translate;
        self.transform.translate = cursor - (cursor - t) * (new / old);
        self.transform.scale = new;
        self.bump();
        true
    }

    /// One wheel notch toward the user.
    pub fn zoom_in(&mut self, cursor: DVec2) -> bool {
        self.zoom_toward_cursor(cursor, self.options.zoom_in_step)
    }

    /// One wheel notch away from the user.
    pub fn zoom_out(&mut self, cursor: DVec2) -> bool {
        self.zoom_toward_cursor(cursor, self.options.zoom_out_step)
    }

    /// Dispatches a wheel notch.
    pub fn zoom(&mut self, cursor: DVec2, direction: ZoomDirection) -> bool {
        match direction {
            ZoomDirection::In => self.zoom_in(cursor),
            ZoomDirection::Out => self.zoom_out(cursor),
        }
    }

    /// Starts panning if `button` is a pan button and no pan is active.
    pub fn pointer_down(&mut self, button: PointerButton, cursor: DVec2) -> bool {
        if !button.pans() || self.pan != PanState::Idle {
            return false;
        }
        self.pan = PanState::Panning {
            button,
            start_cursor: cursor,
            start_translate: self.transform.translate,
        };
        true
    }

    /// Updates the translation while panning. Moves while idle do nothing.
    pub fn pointer_move(&mut self, cursor: DVec2) -> bool {
        let PanState::Panning {
            start_cursor,
            start_translate,
            ..
        } = self.pan
        else {
            return false;
        };
        let translate = start_translate + (cursor - start_cursor);
        if translate == self.transform.translate {
            return false;
        }
        self.transform.translate = translate;
        self.bump();
        true
    }

    /// Ends panning when the button that started it is released.
    pub fn pointer_up(&mut self, button: PointerButton) -> bool {
        match self.pan {
            PanState::Panning { button: active, .. } if active == button => {
                self.pan = PanState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Restores scale 1 and zero translation.
    pub fn reset(&mut self) -> bool {
        self.pan = PanState::Idle;
        if self.transform == ViewportTransform::default() {
            return false;
        }
        self.transform = ViewportTransform::default();
        self.bump();
        true
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        log::trace!(
            "viewport scale {:.3} translate ({:.1}, {:.1})",
            self.transform.scale,
            self.transform.translate.x,
            self.transform.translate.y
        );
    }
}
