//! Image panel events and overlay drawing for the global session.

use glam::DVec2;

use labelscope_core::{PointerButton, ViewportTransform, ZoomDirection};
use labelscope_render::{Frustum, MarkerInstance, OverlaySurface};

use crate::state::{with_session, with_session_mut};

/// Forwards a pointer press on the image panel.
pub fn pointer_down(button: PointerButton, cursor: DVec2) {
    with_session_mut(|s| s.pointer_down(button, cursor));
}

/// Forwards a pointer move on the image panel.
pub fn pointer_move(cursor: DVec2) {
    with_session_mut(|s| s.pointer_move(cursor));
}

/// Forwards a pointer release on the image panel.
pub fn pointer_up(button: PointerButton) {
    with_session_mut(|s| s.pointer_up(button));
}

/// Forwards one wheel notch.
pub fn wheel(cursor: DVec2, direction: ZoomDirection) {
    with_session_mut(|s| s.wheel(cursor, direction));
}

/// Restores scale 1 and zero translation.
pub fn reset_view() {
    with_session_mut(crate::Session::reset_view);
}

/// The current zoom and pan of the image panel.
#[must_use]
pub fn view_transform() -> ViewportTransform {
    with_session(|s| s.viewport().transform())
}

/// Draws the projection overlay on the host's surface.
pub fn paint_overlay(surface: &mut dyn OverlaySurface) {
    with_session(|s| s.paint(surface));
}

/// Packed overlay markers for upload to a display surface.
#[must_use]
pub fn overlay_instances() -> Vec<MarkerInstance> {
    with_session(|s| s.overlay().instances())
}

/// Camera frustum corners for the 3D view, in the render frame.
#[must_use]
pub fn camera_frustum() -> Frustum {
    with_session(crate::Session::frustum)
}
