//! Annotation store: the single owner of boxes, selection, edit handles, and
//! user-recorded links.
//!
//! Every mutation goes through one method of [`AnnotationStore`]. Operations
//! that name an id which does not exist fail with a descriptive error instead
//! of silently doing nothing, so a stale id can never corrupt selection state.

use std::collections::BTreeMap;

use chrono::Utc;
use glam::Vec3;

use crate::annotation::{
    Box2d, Box2dId, Box3d, Box3dId, BoxSize, NormalizedPoint, NormalizedRect,
};
use crate::error::{LabelscopeError, Result};
use crate::export::AnnotationExport;
use crate::frame::VehiclePoint;
use crate::handles::{EditHandles, HandleAxis, HandleMode};
use crate::options::{Box2dOptions, Box3dOptions};

/// A partial update to a 3D box. `None` fields are left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxEdit {
    pub center: Option<VehiclePoint>,
    pub size: Option<BoxSize>,
    pub yaw: Option<f32>,
}

/// Owns all annotation entities and their selection state.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    box3d_options: Box3dOptions,
    box2d_options: Box2dOptions,
    boxes_3d: BTreeMap<Box3dId, Box3d>,
    boxes_2d: BTreeMap<Box2dId, Box2d>,
    next_3d: u32,
    next_2d: u32,
    selected_3d: Option<Box3dId>,
    selected_2d: Option<Box2dId>,
    handles: Option<EditHandles>,
}

impl AnnotationStore {
    /// Creates an empty store.
    pub fn new(box3d_options: Box3dOptions, box2d_options: Box2dOptions) -> Self {
        Self {
            box3d_options,
            box2d_options,
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // 3D boxes
    // ------------------------------------------------------------------

    /// Creates a 3D box from a drag over the ground plane.
    ///
    /// The center is the midpoint of the drag. Width (vehicle x) and depth
    /// (vehicle y) are the drag extents, raised to the configured minimum so
    /// even a zero-area drag yields a visible box. Height is the configured
    /// default.
    pub fn create_box_3d(
        &mut self,
        start: VehiclePoint,
        end: VehiclePoint,
        label: Option<&str>,
    ) -> Box3d {
        let min_size = self.box3d_options.min_size;
        let delta = (end.0 - start.0).abs();
        let id = Box3dId(self.next_3d);
        self.next_3d += 1;

        let new_box = Box3d {
            id,
            label: label.map_or_else(|| self.box3d_options.default_label.clone(), str::to_string),
            center: VehiclePoint((start.0 + end.0) * 0.5),
            size: BoxSize {
                width: delta.x.max(min_size),
                height: self.box3d_options.default_height,
                depth: delta.y.max(min_size),
            },
            yaw: 0.0,
            created_at: Utc::now(),
            linked_2d: None,
        };
        log::debug!(
            "created {} '{}' at {:?} size {:?}",
            id,
            new_box.label,
            new_box.center.0,
            new_box.size
        );
        self.boxes_3d.insert(id, new_box.clone());
        new_box
    }

    /// Gets a 3D box by id.
    pub fn box_3d(&self, id: Box3dId) -> Option<&Box3d> {
        self.boxes_3d.get(&id)
    }

    /// Iterates 3D boxes in creation order.
    pub fn boxes_3d(&self) -> impl Iterator<Item = &Box3d> {
        self.boxes_3d.values()
    }

    /// Returns the number of 3D boxes.
    pub fn num_boxes_3d(&self) -> usize {
        self.boxes_3d.len()
    }

    /// Replaces the label of a 3D box.
    pub fn set_label_3d(&mut self, id: Box3dId, label: impl Into<String>) -> Result<()> {
        let b = self.box_3d_mut(id)?;
        b.label = label.into();
        Ok(())
    }

    /// Applies a partial update to a 3D box.
    pub fn update_box_3d(&mut self, id: Box3dId, edit: BoxEdit) -> Result<&Box3d> {
        if let Some(size) = edit.size {
            if !size.is_valid() {
                return Err(LabelscopeError::InvalidDimensions(format!("{size:?}")));
            }
        }
        let b = self.box_3d_mut(id)?;
        if let Some(center) = edit.center {
            b.center = center;
        }
        if let Some(size) = edit.size {
            b.size = size;
        }
        if let Some(yaw) = edit.yaw {
            b.yaw = yaw;
        }
        Ok(&*b)
    }

    /// Selects a 3D box, replacing any previous 3D selection.
    pub fn select_box_3d(&mut self, id: Box3dId) -> Result<()> {
        if !self.boxes_3d.contains_key(&id) {
            return Err(LabelscopeError::Box3dNotFound(id));
        }
        if self.selected_3d != Some(id) {
            self.selected_3d = Some(id);
            self.handles = Some(
                EditHandles::new(id)
                    .with_snap_translate(self.box3d_options.snap_translate)
                    .with_snap_rotate(self.box3d_options.snap_rotate),
            );
            log::debug!("selected {id}");
        }
        Ok(())
    }

    /// Clears the 3D selection and releases its edit handles.
    pub fn deselect_box_3d(&mut self) {
        self.selected_3d = None;
        self.handles = None;
    }

    /// The selected 3D box, if any.
    pub fn selected_box_3d(&self) -> Option<Box3dId> {
        self.selected_3d
    }

    /// Returns whether a 3D box is the selected one.
    pub fn is_selected_3d(&self, id: Box3dId) -> bool {
        self.selected_3d == Some(id)
    }

    /// Deletes a 3D box, clearing its selection, handles, and link.
    pub fn delete_box_3d(&mut self, id: Box3dId) -> Result<Box3d> {
        let removed = self
            .boxes_3d
            .remove(&id)
            .ok_or(LabelscopeError::Box3dNotFound(id))?;
        if self.selected_3d == Some(id) {
            self.deselect_box_3d();
        }
        if let Some(linked) = removed.linked_2d {
            if let Some(b) = self.boxes_2d.get_mut(&linked) {
                b.linked_3d = None;
            }
        }
        log::debug!("deleted {id}");
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // 2D boxes
    // ------------------------------------------------------------------

    /// Creates a 2D box from a drag on the image, in normalized coordinates.
    ///
    /// Returns `None` when either side of the dragged rectangle does not
    /// exceed the minimum fraction (accidental clicks) or is not a number.
    pub fn create_box_2d(
        &mut self,
        start: NormalizedPoint,
        end: NormalizedPoint,
        label: Option<&str>,
    ) -> Option<Box2d> {
        let rect = NormalizedRect::from_corners(start.clamped(), end.clamped());
        let min = self.box2d_options.min_fraction;
        if !(rect.width > min && rect.height > min) {
            log::debug!(
                "discarded 2D gesture {:.4}x{:.4} (minimum {min})",
                rect.width,
                rect.height
            );
            return None;
        }

        let id = Box2dId(self.next_2d);
        self.next_2d += 1;
        let new_box = Box2d {
            id,
            label: label.map_or_else(|| self.box2d_options.default_label.clone(), str::to_string),
            rect,
            linked_3d: None,
        };
        log::debug!("created {} '{}' {:?}", id, new_box.label, rect);
        self.boxes_2d.insert(id, new_box.clone());
        Some(new_box)
    }

    /// Gets a 2D box by id.
    pub fn box_2d(&self, id: Box2dId) -> Option<&Box2d> {
        self.boxes_2d.get(&id)
    }

    /// Iterates 2D boxes in creation order.
    pub fn boxes_2d(&self) -> impl Iterator<Item = &Box2d> {
        self.boxes_2d.values()
    }

    /// Returns the number of 2D boxes.
    pub fn num_boxes_2d(&self) -> usize {
        self.boxes_2d.len()
    }

    /// Replaces the label of a 2D box.
    pub fn set_label_2d(&mut self, id: Box2dId, label: impl Into<String>) -> Result<()> {
        let b = self
            .boxes_2d
            .get_mut(&id)
            .ok_or(LabelscopeError::Box2dNotFound(id))?;
        b.label = label.into();
        Ok(())
    }

    /// Selects a 2D box, replacing any previous 2D selection.
    ///
    /// The 3D selection is not affected.
    pub fn select_box_2d(&mut self, id: Box2dId) -> Result<()> {
        if !self.boxes_2d.contains_key(&id) {
            return Err(LabelscopeError::Box2dNotFound(id));
        }
        self.selected_2d = Some(id);
        Ok(())
    }

    /// Clears the 2D selection.
    pub fn deselect_box_2d(&mut self) {
        self.selected_2d = None;
    }

    /// The selected 2D box, if any.
    pub fn selected_box_2d(&self) -> Option<Box2dId> {
        self.selected_2d
    }

    /// Returns whether a 2D box is the selected one.
    pub fn is_selected_2d(&self, id: Box2dId) -> bool {
        self.selected_2d == Some(id)
    }

    /// Deletes a 2D box, clearing its selection and link.
    pub fn delete_box_2d(&mut self, id: Box2dId) -> Result<Box2d> {
        let removed = self
            .boxes_2d
            .remove(&id)
            .ok_or(LabelscopeError::Box2dNotFound(id))?;
        if self.selected_2d == Some(id) {
            self.selected_2d = None;
        }
        if let Some(linked) = removed.linked_3d {
            if let Some(b) = self.boxes_3d.get_mut(&linked) {
                b.linked_2d = None;
            }
        }
        log::debug!("deleted {id}");
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    /// Records that a 3D box and a 2D box annotate the same object.
    ///
    /// Any previous link of either box is replaced.
    pub fn link(&mut self, box3d: Box3dId, box2d: Box2dId) -> Result<()> {
        if !self.boxes_3d.contains_key(&box3d) {
            return Err(LabelscopeError::Box3dNotFound(box3d));
        }
        if !self.boxes_2d.contains_key(&box2d) {
            return Err(LabelscopeError::Box2dNotFound(box2d));
        }
        self.unlink_3d(box3d)?;
        self.unlink_2d(box2d)?;
        if let Some(b) = self.boxes_3d.get_mut(&box3d) {
            b.linked_2d = Some(box2d);
        }
        if let Some(b) = self.boxes_2d.get_mut(&box2d) {
            b.linked_3d = Some(box3d);
        }
        Ok(())
    }

    /// Removes the link of a 3D box, if it has one.
    pub fn unlink_3d(&mut self, id: Box3dId) -> Result<()> {
        let linked = self.box_3d_mut(id)?.linked_2d.take();
        if let Some(other) = linked {
            if let Some(b) = self.boxes_2d.get_mut(&other) {
                b.linked_3d = None;
            }
        }
        Ok(())
    }

    /// Removes the link of a 2D box, if it has one.
    pub fn unlink_2d(&mut self, id: Box2dId) -> Result<()> {
        let linked = self
            .boxes_2d
            .get_mut(&id)
            .ok_or(LabelscopeError::Box2dNotFound(id))?
            .linked_3d
            .take();
        if let Some(other) = linked {
            if let Some(b) = self.boxes_3d.get_mut(&other) {
                b.linked_2d = None;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Edit handles
    // ------------------------------------------------------------------

    /// Handles of the selected 3D box.
    pub fn handles(&self) -> Option<&EditHandles> {
        self.handles.as_ref()
    }

    /// Switches the handle mode of the selected box.
    pub fn set_handle_mode(&mut self, mode: HandleMode) -> Result<()> {
        self.handles
            .as_mut()
            .ok_or(LabelscopeError::NoSelection)?
            .set_mode(mode);
        Ok(())
    }

    /// Starts a handle drag on the selected box.
    pub fn begin_edit(&mut self, axis: HandleAxis) -> Result<()> {
        let id = self.selected_3d.ok_or(LabelscopeError::NoSelection)?;
        let current = self
            .boxes_3d
            .get(&id)
            .ok_or(LabelscopeError::Box3dNotFound(id))?;
        self.handles
            .as_mut()
            .ok_or(LabelscopeError::NoSelection)?
            .begin(axis, current);
        Ok(())
    }

    /// Continues a handle drag and applies the result to the selected box.
    pub fn drag_edit(&mut self, delta: Vec3) -> Result<&Box3d> {
        let min_size = self.box3d_options.min_size;
        let handles = self.handles.as_mut().ok_or(LabelscopeError::NoSelection)?;
        let id = handles.box_id();
        let edit = handles
            .drag(delta, min_size)
            .ok_or(LabelscopeError::NoActiveEdit)?;
        self.update_box_3d(id, edit)
    }

    /// Ends the handle drag in progress. Returns whether one was active.
    pub fn end_edit(&mut self) -> bool {
        self.handles.as_mut().is_some_and(EditHandles::end)
    }

    // ------------------------------------------------------------------
    // Whole-store operations
    // ------------------------------------------------------------------

    /// Removes every box and clears selection. Id counters keep running so
    /// ids are never reused within a session.
    pub fn clear(&mut self) {
        self.boxes_3d.clear();
        self.boxes_2d.clear();
        self.selected_3d = None;
        self.selected_2d = None;
        self.handles = None;
    }

    /// Builds the export document for external persistence.
    pub fn export(&self) -> AnnotationExport {
        AnnotationExport::from_boxes(self.boxes_3d(), self.boxes_2d())
    }

    fn box_3d_mut(&mut self, id: Box3dId) -> Result<&mut Box3d> {
        self.boxes_3d
            .get_mut(&id)
            .ok_or(LabelscopeError::Box3dNotFound(id))
    }
}
