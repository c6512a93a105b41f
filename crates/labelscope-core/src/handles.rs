//! Edit handles for the selected 3D box.
//!
//! Handles exist only while a box is selected. A drag starts on one axis,
//! accumulates pointer deltas, and produces a [`BoxEdit`] relative to the box
//! state captured at drag start. Translation snapping rounds the resulting
//! center to a grid of the snap size; rotation snapping rounds the yaw to
//! multiples of the snap angle.

use glam::Vec3;

use crate::annotation::{Box3d, Box3dId, BoxSize};
use crate::frame::VehiclePoint;
use crate::store::BoxEdit;

/// What a handle drag changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleMode {
    /// Moves the box center.
    #[default]
    Translate,
    /// Changes the box dimensions along the box's own axes.
    Resize,
    /// Changes the yaw about the vehicle up axis.
    Rotate,
}

/// Axis a handle drag is constrained to, in the vehicle frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleAxis {
    /// Forward.
    X,
    /// Left.
    Y,
    /// Up.
    Z,
    /// Unconstrained.
    All,
}

impl HandleAxis {
    /// Returns the mask applied to drag deltas.
    #[must_use]
    pub fn mask(self) -> Vec3 {
        match self {
            HandleAxis::X => Vec3::X,
            HandleAxis::Y => Vec3::Y,
            HandleAxis::Z => Vec3::Z,
            HandleAxis::All => Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveDrag {
    axis: HandleAxis,
    start_center: VehiclePoint,
    start_size: BoxSize,
    start_yaw: f32,
    accumulated: Vec3,
}

/// Handle state attached to the selected box.
#[derive(Debug, Clone)]
pub struct EditHandles {
    box_id: Box3dId,
    mode: HandleMode,
    snap_translate: f32,
    snap_rotate_degrees: f32,
    active: Option<ActiveDrag>,
}

impl EditHandles {
    /// Creates idle handles for a box.
    pub fn new(box_id: Box3dId) -> Self {
        Self {
            box_id,
            mode: HandleMode::default(),
            snap_translate: 0.0,
            snap_rotate_degrees: 0.0,
            active: None,
        }
    }

    /// Sets the translation snap value.
    #[must_use]
    pub fn with_snap_translate(mut self, snap: f32) -> Self {
        self.snap_translate = snap;
        self
    }

    /// Sets the rotation snap value in degrees.
    #[must_use]
    pub fn with_snap_rotate(mut self, snap_degrees: f32) -> Self {
        self.snap_rotate_degrees = snap_degrees;
        self
    }

    /// The box these handles belong to.
    pub fn box_id(&self) -> Box3dId {
        self.box_id
    }

    pub fn mode(&self) -> HandleMode {
        self.mode
    }

    /// Switches the handle mode. Any drag in progress is abandoned.
    pub fn set_mode(&mut self, mode: HandleMode) {
        self.mode = mode;
        self.active = None;
    }

    /// Returns whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Starts a drag on `axis`, capturing the current box state.
    pub fn begin(&mut self, axis: HandleAxis, current: &Box3d) {
        self.active = Some(ActiveDrag {
            axis,
            start_center: current.center,
            start_size: current.size,
            start_yaw: current.yaw,
            accumulated: Vec3::ZERO,
        });
    }

    /// Adds a drag delta and returns the resulting edit, or `None` when no
    /// drag is in progress.
    ///
    /// For [`HandleMode::Rotate`] only `delta.z` is used, as radians of yaw,
    /// whatever the drag axis: yaw always turns about the up axis.
    pub fn drag(&mut self, delta: Vec3, min_size: f32) -> Option<BoxEdit> {
        let mode = self.mode;
        let snap_translate = self.snap_translate;
        let snap_rotate = self.snap_rotate_degrees;
        let drag = self.active.as_mut()?;
        drag.accumulated += delta;
        let total = drag.accumulated * drag.axis.mask();

        let edit = match mode {
            HandleMode::Translate => {
                let mut center = drag.start_center.0 + total;
                if snap_translate > 0.0 {
                    center = (center / snap_translate).round() * snap_translate;
                }
                BoxEdit {
                    center: Some(VehiclePoint(center)),
                    ..BoxEdit::default()
                }
            }
            HandleMode::Resize => {
                let start = drag.start_size;
                BoxEdit {
                    size: Some(BoxSize {
                        width: (start.width + total.x).max(min_size),
                        depth: (start.depth + total.y).max(min_size),
                        height: (start.height + total.z).max(min_size),
                    }),
                    ..BoxEdit::default()
                }
            }
            HandleMode::Rotate => {
                let mut yaw = drag.start_yaw + drag.accumulated.z;
                if snap_rotate > 0.0 {
                    let snap = snap_rotate.to_radians();
                    yaw = (yaw / snap).round() * snap;
                }
                BoxEdit {
                    yaw: Some(yaw),
                    ..BoxEdit::default()
                }
            }
        };
        Some(edit)
    }

    /// Ends the drag in progress, if any.
    pub fn end(&mut self) -> bool {
        self.active.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_box() -> Box3d {
        Box3d {
            id: Box3dId(0),
            label: "object".to_string(),
            center: VehiclePoint::new(1.0, 2.0, 0.0),
            size: BoxSize::new(2.0, 1.8, 1.0),
            yaw: 0.0,
            created_at: Utc::now(),
            linked_2d: None,
        }
    }

    #[test]
    fn test_drag_without_begin_is_none() {
        let mut handles = EditHandles::new(Box3dId(0));
        assert!(handles.drag(Vec3::X, 0.5).is_none());
    }

    #[test]
    fn test_translate_constrained_to_axis() {
        let b = sample_box();
        let mut handles = EditHandles::new(b.id);
        handles.begin(HandleAxis::X, &b);
        let edit = handles.drag(Vec3::new(1.0, 5.0, 5.0), 0.5).unwrap();
        assert_eq!(edit.center, Some(VehiclePoint::new(2.0, 2.0, 0.0)));
    }

    #[test]
    fn test_translate_snaps_center_to_grid() {
        let b = sample_box();
        let mut handles = EditHandles::new(b.id).with_snap_translate(0.5);
        handles.begin(HandleAxis::All, &b);
        handles.drag(Vec3::new(0.2, 0.0, 0.0), 0.5);
        let edit = handles.drag(Vec3::new(0.2, 0.0, 0.0), 0.5).unwrap();
        assert_eq!(edit.center, Some(VehiclePoint::new(1.5, 2.0, 0.0)));
    }

    #[test]
    fn test_resize_never_below_min_size() {
        let b = sample_box();
        let mut handles = EditHandles::new(b.id);
        handles.set_mode(HandleMode::Resize);
        handles.begin(HandleAxis::All, &b);
        let edit = handles.drag(Vec3::splat(-10.0), 0.5).unwrap();
        let size = edit.size.unwrap();
        assert_eq!(size, BoxSize::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_rotate_snaps_degrees() {
        let b = sample_box();
        let mut handles = EditHandles::new(b.id).with_snap_rotate(15.0);
        handles.set_mode(HandleMode::Rotate);
        handles.begin(HandleAxis::Z, &b);
        let edit = handles.drag(Vec3::new(0.0, 0.0, 0.27), 0.5).unwrap();
        let yaw = edit.yaw.unwrap();
        assert!((yaw - 15.0_f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_translate_snap_rounds_absolute_center() {
        let mut b = sample_box();
        b.center = VehiclePoint::new(1.3, 2.0, 0.0);
        let mut handles = EditHandles::new(b.id).with_snap_translate(0.5);
        handles.begin(HandleAxis::X, &b);
        let edit = handles.drag(Vec3::ZERO, 0.5).unwrap();
        assert_eq!(edit.center, Some(VehiclePoint::new(1.5, 2.0, 0.0)));
    }

    #[test]
    fn test_rotate_ignores_drag_axis() {
        let b = sample_box();
        let mut handles = EditHandles::new(b.id);
        handles.set_mode(HandleMode::Rotate);
        for axis in [HandleAxis::X, HandleAxis::Y, HandleAxis::Z, HandleAxis::All] {
            handles.begin(axis, &b);
            let edit = handles.drag(Vec3::new(0.0, 0.0, 0.5), 0.5).unwrap();
            assert_eq!(edit.yaw, Some(0.5), "axis {axis:?}");
            handles.end();
        }
    }

    #[test]
    fn test_set_mode_abandons_drag() {
        let b = sample_box();
        let mut handles = EditHandles::new(b.id);
        handles.begin(HandleAxis::X, &b);
        assert!(handles.is_dragging());
        handles.set_mode(HandleMode::Rotate);
        assert!(!handles.is_dragging());
        assert!(!handles.end());
    }
}
