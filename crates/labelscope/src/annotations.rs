//! Handle-based access to the annotations of the global session.
//!
//! Handles are lightweight ids. Every operation looks the box up again, so a
//! handle to a deleted box fails with a "not found" error instead of acting
//! on stale data.
//!
//! # Example
//!
//! ```no_run
//! use labelscope::*;
//!
//! fn main() -> Result<()> {
//!     init(SessionConfig::default())?;
//!
//!     begin_box_3d(RenderPoint::new(-1.0, 0.0, 8.0));
//!     let car = finish_box_3d(RenderPoint::new(1.0, 0.0, 12.0)).expect("drag was active");
//!     car.set_label("car")?;
//!     car.select()?;
//!
//!     set_handle_mode(HandleMode::Rotate)?;
//!     begin_edit(HandleAxis::Z)?;
//!     drag_edit(Vec3::new(0.0, 0.0, 0.3))?;
//!     end_edit();
//!
//!     println!("{}", export_annotations().to_kitti());
//!     Ok(())
//! }
//! ```

use glam::{DVec2, Vec3};

use labelscope_core::{
    box_to_render_pose, AnnotationExport, Box2d, Box2dId, Box3d, Box3dId, BoxEdit, BoxSize,
    HandleAxis, HandleMode, NormalizedRect, RenderPoint, RenderPose, Result, VehiclePoint,
};

use crate::state::{session_mut, with_session, with_session_mut};

/// Starts a 3D box drag at a ground-plane point. Returns `false` if another
/// gesture is active.
pub fn begin_box_3d(ground: RenderPoint) -> bool {
    with_session_mut(|s| s.begin_box_3d(ground))
}

/// Completes a 3D box drag.
pub fn finish_box_3d(ground: RenderPoint) -> Option<Box3dHandle> {
    with_session_mut(|s| s.finish_box_3d(ground)).map(|b| Box3dHandle { id: b.id })
}

/// Starts a 2D box drag at a screen position. Returns `false` if another
/// gesture is active.
pub fn begin_box_2d(screen: DVec2) -> bool {
    with_session_mut(|s| s.begin_box_2d(screen))
}

/// Completes a 2D box drag. Returns `None` for drags too small to keep.
pub fn finish_box_2d(screen: DVec2) -> Option<Box2dHandle> {
    with_session_mut(|s| s.finish_box_2d(screen)).map(|b| Box2dHandle { id: b.id })
}

/// Gets a 3D box by id.
#[must_use]
pub fn get_box_3d(id: Box3dId) -> Option<Box3dHandle> {
    with_session(|s| s.store().box_3d(id).map(|b| Box3dHandle { id: b.id }))
}

/// Gets a 2D box by id.
#[must_use]
pub fn get_box_2d(id: Box2dId) -> Option<Box2dHandle> {
    with_session(|s| s.store().box_2d(id).map(|b| Box2dHandle { id: b.id }))
}

/// Returns handles to all 3D boxes in creation order.
#[must_use]
pub fn get_all_boxes_3d() -> Vec<Box3dHandle> {
    with_session(|s| s.store().boxes_3d().map(|b| Box3dHandle { id: b.id }).collect())
}

/// Returns handles to all 2D boxes in creation order.
#[must_use]
pub fn get_all_boxes_2d() -> Vec<Box2dHandle> {
    with_session(|s| s.store().boxes_2d().map(|b| Box2dHandle { id: b.id }).collect())
}

/// The selected 3D box, if any.
#[must_use]
pub fn selected_box_3d() -> Option<Box3dHandle> {
    with_session(|s| s.store().selected_box_3d()).map(|id| Box3dHandle { id })
}

/// The selected 2D box, if any.
#[must_use]
pub fn selected_box_2d() -> Option<Box2dHandle> {
    with_session(|s| s.store().selected_box_2d()).map(|id| Box2dHandle { id })
}

/// Clears both selections.
pub fn deselect_all() {
    with_session_mut(|s| {
        s.edit_store(|store| {
            store.deselect_box_3d();
            store.deselect_box_2d();
        });
    });
}

/// Removes every annotation.
pub fn remove_all_boxes() {
    with_session_mut(|s| s.edit_store(labelscope_core::AnnotationStore::clear));
}

/// Switches the edit handle mode of the selected 3D box.
pub fn set_handle_mode(mode: HandleMode) -> Result<()> {
    session_mut(|s| s.edit_store(|store| store.set_handle_mode(mode)))
}

/// Starts an edit handle drag on the selected 3D box.
pub fn begin_edit(axis: HandleAxis) -> Result<()> {
    session_mut(|s| s.edit_store(|store| store.begin_edit(axis)))
}

/// Continues the edit handle drag, returning the updated box.
pub fn drag_edit(delta: Vec3) -> Result<Box3d> {
    session_mut(|s| s.edit_store(|store| store.drag_edit(delta).cloned()))
}

/// Ends the edit handle drag. Returns whether one was active.
pub fn end_edit() -> bool {
    with_session_mut(|s| s.edit_store(labelscope_core::AnnotationStore::end_edit))
}

/// Builds the export document of all annotations.
#[must_use]
pub fn export_annotations() -> AnnotationExport {
    with_session(|s| s.store().export())
}

/// Handle for a 3D box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Box3dHandle {
    id: Box3dId,
}

impl Box3dHandle {
    /// Returns the id of this box.
    #[must_use]
    pub fn id(&self) -> Box3dId {
        self.id
    }

    /// Returns a copy of the box, or `None` if it was deleted.
    #[must_use]
    pub fn get(&self) -> Option<Box3d> {
        with_session(|s| s.store().box_3d(self.id).cloned())
    }

    #[must_use]
    pub fn label(&self) -> Option<String> {
        self.get().map(|b| b.label)
    }

    #[must_use]
    pub fn center(&self) -> Option<VehiclePoint> {
        self.get().map(|b| b.center)
    }

    #[must_use]
    pub fn size(&self) -> Option<BoxSize> {
        self.get().map(|b| b.size)
    }

    /// Placement of the box in the render frame, for the 3D view.
    #[must_use]
    pub fn render_pose(&self) -> Option<RenderPose> {
        self.get().map(|b| box_to_render_pose(&b))
    }

    pub fn set_label(&self, label: impl Into<String>) -> Result<&Self> {
        let label = label.into();
        session_mut(|s| s.edit_store(|store| store.set_label_3d(self.id, label)))?;
        Ok(self)
    }

    /// Applies a partial update.
    pub fn update(&self, edit: BoxEdit) -> Result<&Self> {
        session_mut(|s| s.edit_store(|store| store.update_box_3d(self.id, edit).map(|_| ())))?;
        Ok(self)
    }

    /// Makes this the selected 3D box.
    pub fn select(&self) -> Result<&Self> {
        session_mut(|s| s.edit_store(|store| store.select_box_3d(self.id)))?;
        Ok(self)
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        with_session(|s| s.store().is_selected_3d(self.id))
    }

    /// Records that this box and a 2D box annotate the same object.
    pub fn link(&self, other: &Box2dHandle) -> Result<&Self> {
        session_mut(|s| s.edit_store(|store| store.link(self.id, other.id)))?;
        Ok(self)
    }

    pub fn unlink(&self) -> Result<&Self> {
        session_mut(|s| s.edit_store(|store| store.unlink_3d(self.id)))?;
        Ok(self)
    }

    /// The linked 2D box, if any.
    #[must_use]
    pub fn linked(&self) -> Option<Box2dHandle> {
        self.get()?.linked_2d.map(|id| Box2dHandle { id })
    }

    /// Deletes the box.
    pub fn delete(self) -> Result<()> {
        session_mut(|s| s.edit_store(|store| store.delete_box_3d(self.id).map(|_| ())))
    }
}

/// Handle for a 2D box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Box2dHandle {
    id: Box2dId,
}

impl Box2dHandle {
    /// Returns the id of this box.
    #[must_use]
    pub fn id(&self) -> Box2dId {
        self.id
    }

    /// Returns a copy of the box, or `None` if it was deleted.
    #[must_use]
    pub fn get(&self) -> Option<Box2d> {
        with_session(|s| s.store().box_2d(self.id).cloned())
    }

    #[must_use]
    pub fn label(&self) -> Option<String> {
        self.get().map(|b| b.label)
    }

    #[must_use]
    pub fn rect(&self) -> Option<NormalizedRect> {
        self.get().map(|b| b.rect)
    }

    pub fn set_label(&self, label: impl Into<String>) -> Result<&Self> {
        let label = label.into();
        session_mut(|s| s.edit_store(|store| store.set_label_2d(self.id, label)))?;
        Ok(self)
    }

    /// Makes this the selected 2D box.
    pub fn select(&self) -> Result<&Self> {
        session_mut(|s| s.edit_store(|store| store.select_box_2d(self.id)))?;
        Ok(self)
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        with_session(|s| s.store().is_selected_2d(self.id))
    }

    pub fn unlink(&self) -> Result<&Self> {
        session_mut(|s| s.edit_store(|store| store.unlink_2d(self.id)))?;
        Ok(self)
    }

    /// The linked 3D box, if any.
    #[must_use]
    pub fn linked(&self) -> Option<Box3dHandle> {
        self.get()?.linked_3d.map(|id| Box3dHandle { id })
    }

    /// Deletes the box.
    pub fn delete(self) -> Result<()> {
        session_mut(|s| s.edit_store(|store| store.delete_box_2d(self.id).map(|_| ())))
    }
}
