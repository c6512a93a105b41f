//! Scene loading for the global session.

use labelscope_core::{Result, SceneResponse, ScenePreset, SceneSnapshot};

use crate::session::{as_scene_unavailable, SceneService};
use crate::state::{session_mut, with_session, with_session_mut};

/// Fetches a scene and makes it the active one.
///
/// The session lock is not held while the service is awaited. A failure is
/// reported once through [`take_notification`] and the previous scene stays
/// active.
pub async fn load_scene(service: &impl SceneService, preset: ScenePreset) -> Result<()> {
    log::info!("fetching scene '{preset}'");
    match service.fetch(preset).await {
        Ok(response) => apply_scene(response),
        Err(err) => {
            let err = as_scene_unavailable(err);
            session_mut(|s| {
                s.scene_failed(&err);
                Ok(())
            })?;
            Err(err)
        }
    }
}

/// Blocking variant of [`load_scene`] for hosts without an executor.
pub fn load_scene_blocking(service: &impl SceneService, preset: ScenePreset) -> Result<()> {
    pollster::block_on(load_scene(service, preset))
}

/// Validates a scene response and makes it the active scene.
pub fn apply_scene(response: SceneResponse) -> Result<()> {
    session_mut(|s| s.apply_scene(response))
}

/// The active scene, if one is loaded.
#[must_use]
pub fn current_scene() -> Option<std::sync::Arc<SceneSnapshot>> {
    with_session(crate::Session::scene)
}

/// Takes the pending user-facing notification, if any.
pub fn take_notification() -> Option<String> {
    with_session_mut(crate::Session::take_notification)
}

/// Decodes the camera image of the active scene.
pub fn camera_image() -> Result<image::RgbaImage> {
    with_session(crate::Session::decode_camera_image)
}
