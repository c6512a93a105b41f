//! The annotation session: owner of all state, driven by host events.
//!
//! The host forwards pointer, wheel and gesture events; the session updates
//! the store and viewport, and keeps the projection overlay current.

use std::future::Future;
use std::sync::Arc;

use glam::{DVec2, Vec2};

use labelscope_core::{
    AnnotationStore, Box2d, Box3d, LabelscopeError, NormalizedPoint, Options, PointerButton,
    RenderPoint, Result, SceneResponse, ScenePreset, SceneSnapshot, VehiclePoint, Viewport,
    ZoomDirection,
};
use labelscope_render::{
    decode_camera_image, CameraParams, Canvas, Frustum, OverlaySurface, ProjectionOverlay,
};

use crate::config::SessionConfig;
use crate::render_error;

/// Source of scene data, typically an HTTP client.
///
/// Implementations should return [`LabelscopeError::SceneUnavailable`] on
/// failure; other errors are wrapped into it.
pub trait SceneService {
    fn fetch(&self, preset: ScenePreset) -> impl Future<Output = Result<SceneResponse>>;
}

/// The drawing gesture in progress. Only one can be active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    None,
    /// A 3D box drag on the ground plane, started at a vehicle-frame point.
    DrawingBox3d { start: VehiclePoint },
    /// A 2D box drag on the image, started at a normalized point.
    DrawingBox2d { start: NormalizedPoint },
}

/// An annotation session.
pub struct Session {
    options: Options,
    camera: CameraParams,
    canvas: Canvas,
    store: AnnotationStore,
    viewport: Viewport,
    overlay: ProjectionOverlay,
    scene: Option<Arc<SceneSnapshot>>,
    gesture: Gesture,
    notification: Option<String>,
    drawn_revision: u64,
}

impl Session {
    /// Creates a session after validating the configuration.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let SessionConfig {
            options,
            camera,
            canvas,
        } = config;
        Ok(Self {
            store: AnnotationStore::new(options.box3d.clone(), options.box2d.clone()),
            viewport: Viewport::new(options.viewport.clone()),
            overlay: ProjectionOverlay::new(options.overlay.clone()),
            options,
            camera,
            canvas,
            scene: None,
            gesture: Gesture::None,
            notification: None,
            drawn_revision: 0,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn camera(&self) -> &CameraParams {
        &self.camera
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn overlay(&self) -> &ProjectionOverlay {
        &self.overlay
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// The current scene, shared with any reader that cloned it.
    pub fn scene(&self) -> Option<Arc<SceneSnapshot>> {
        self.scene.clone()
    }

    /// Frustum of the configured camera, for the 3D view.
    pub fn frustum(&self) -> Frustum {
        self.camera.frustum()
    }

    /// Mutates the store and refreshes the overlay afterwards.
    pub fn edit_store<R>(&mut self, f: impl FnOnce(&mut AnnotationStore) -> R) -> R {
        let result = f(&mut self.store);
        self.refresh_overlay();
        result
    }

    // ------------------------------------------------------------------
    // Drawing gestures
    // ------------------------------------------------------------------

    /// Starts a 3D box drag at a ground-plane point from the picking
    /// collaborator. Ignored while another gesture is active.
    pub fn begin_box_3d(&mut self, ground: RenderPoint) -> bool {
        if self.gesture != Gesture::None {
            log::warn!("ignoring 3D drag start while {:?} is active", self.gesture);
            return false;
        }
        self.gesture = Gesture::DrawingBox3d {
            start: ground.to_vehicle(),
        };
        true
    }

    /// Completes a 3D box drag. Returns `None` if no 3D drag was active.
    pub fn finish_box_3d(&mut self, ground: RenderPoint) -> Option<Box3d> {
        let Gesture::DrawingBox3d { start } = self.gesture else {
            return None;
        };
        self.gesture = Gesture::None;
        let created = self.store.create_box_3d(start, ground.to_vehicle(), None);
        self.refresh_overlay();
        Some(created)
    }

    /// Starts a 2D box drag at a screen position over the image panel.
    /// Ignored while another gesture is active.
    pub fn begin_box_2d(&mut self, screen: DVec2) -> bool {
        if self.gesture != Gesture::None {
            log::warn!("ignoring 2D drag start while {:?} is active", self.gesture);
            return false;
        }
        self.gesture = Gesture::DrawingBox2d {
            start: self.normalize(screen),
        };
        true
    }

    /// Completes a 2D box drag. Returns `None` if no 2D drag was active or
    /// the dragged rectangle was too small.
    pub fn finish_box_2d(&mut self, screen: DVec2) -> Option<Box2d> {
        let Gesture::DrawingBox2d { start } = self.gesture else {
            return None;
        };
        self.gesture = Gesture::None;
        let end = self.normalize(screen);
        self.store.create_box_2d(start, end, None)
    }

    /// Abandons the gesture in progress.
    pub fn cancel_gesture(&mut self) {
        self.gesture = Gesture::None;
    }

    /// Maps a screen position to normalized image coordinates.
    pub fn normalize(&self, screen: DVec2) -> NormalizedPoint {
        let content = self.viewport.transform().screen_to_content(screen).as_vec2();
        let size = Vec2::new(self.canvas.width, self.canvas.height);
        NormalizedPoint::from(content / size)
    }

    // ------------------------------------------------------------------
    // Viewport events
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, button: PointerButton, cursor: DVec2) {
        self.viewport.pointer_down(button, cursor);
    }

    pub fn pointer_move(&mut self, cursor: DVec2) {
        if self.viewport.pointer_move(cursor) {
            self.sync_view();
        }
    }

    pub fn pointer_up(&mut self, button: PointerButton) {
        self.viewport.pointer_up(button);
    }

    /// One wheel notch at `cursor`.
    pub fn wheel(&mut self, cursor: DVec2, direction: ZoomDirection) {
        if self.viewport.zoom(cursor, direction) {
            self.sync_view();
        }
    }

    /// Restores the unzoomed, unpanned view.
    pub fn reset_view(&mut self) {
        if self.viewport.reset() {
            self.sync_view();
        }
    }

    /// Re-renders the overlay if the viewport changed since the last draw.
    pub fn sync_view(&mut self) -> bool {
        if self.viewport.revision() == self.drawn_revision {
            return false;
        }
        self.refresh_overlay();
        true
    }

    // ------------------------------------------------------------------
    // Scene
    // ------------------------------------------------------------------

    /// Validates a scene response and replaces the current scene with it.
    ///
    /// On failure the previous scene is kept and a notification is recorded.
    pub fn apply_scene(&mut self, response: SceneResponse) -> Result<()> {
        match SceneSnapshot::from_response(response) {
            Ok(snapshot) => {
                log::info!(
                    "loaded scene '{}' with {} points",
                    snapshot.preset(),
                    snapshot.point_cloud().len()
                );
                self.scene = Some(Arc::new(snapshot));
                self.notification = None;
                self.refresh_overlay();
                Ok(())
            }
            Err(err) => {
                self.scene_failed(&err);
                Err(err)
            }
        }
    }

    /// Records a scene failure. The previous scene stays active.
    pub fn scene_failed(&mut self, err: &LabelscopeError) {
        log::error!("scene load failed: {err}");
        self.notification = Some(format!("Failed to load scene: {err}"));
    }

    /// Takes the pending user-facing notification, if any.
    pub fn take_notification(&mut self) -> Option<String> {
        self.notification.take()
    }

    /// Decodes the camera image of the current scene.
    pub fn decode_camera_image(&self) -> Result<image::RgbaImage> {
        let scene = self
            .scene
            .as_ref()
            .ok_or_else(|| LabelscopeError::SceneUnavailable("no scene loaded".to_string()))?;
        decode_camera_image(scene.camera_image()).map_err(render_error)
    }

    // ------------------------------------------------------------------
    // Overlay
    // ------------------------------------------------------------------

    /// Recomputes the overlay from the scene, boxes, and viewport.
    pub fn refresh_overlay(&mut self) {
        self.overlay.set_view(self.viewport.transform());
        self.drawn_revision = self.viewport.revision();
        let Some(scene) = &self.scene else {
            self.overlay.clear();
            return;
        };
        let store = &self.store;
        let boxes = store.boxes_3d().map(|b| (b, store.is_selected_3d(b.id)));
        self.overlay
            .render(&self.camera, scene.point_cloud(), boxes, self.canvas);
    }

    /// Draws the overlay on the host's surface.
    pub fn paint(&self, surface: &mut dyn OverlaySurface) {
        self.overlay.paint(surface);
    }
}

/// Fetches a scene and applies it.
///
/// A failed fetch is reported once through the session notification and
/// leaves the previous scene in place. Nothing is retried.
pub async fn fetch_scene(
    session: &mut Session,
    service: &impl SceneService,
    preset: ScenePreset,
) -> Result<()> {
    log::info!("fetching scene '{preset}'");
    match service.fetch(preset).await {
        Ok(response) => session.apply_scene(response),
        Err(err) => {
            let err = as_scene_unavailable(err);
            session.scene_failed(&err);
            Err(err)
        }
    }
}

pub(crate) fn as_scene_unavailable(err: LabelscopeError) -> LabelscopeError {
    match err {
        LabelscopeError::SceneUnavailable(_) => err,
        other => LabelscopeError::SceneUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelscope_core::{CameraImage, LidarPoint, PointCloud};
    use labelscope_render::{CameraPosition, PixelIntrinsics};

    fn config() -> SessionConfig {
        SessionConfig {
            camera: CameraParams::from_intrinsics(
                CameraPosition::Vehicle(VehiclePoint::default()),
                PixelIntrinsics {
                    fx: 400.0,
                    fy: 400.0,
                    cx: 400.0,
                    cy: 200.0,
                    width: 800,
                    height: 400,
                },
                0.5,
                30.0,
            ),
            ..SessionConfig::default()
        }
    }

    fn response(points: Vec<LidarPoint>) -> SceneResponse {
        SceneResponse {
            point_cloud: PointCloud::new(points),
            camera_image: CameraImage {
                image_data: "data:image/png;base64,".to_string(),
                width: 800,
                height: 400,
            },
            preset: ScenePreset::TrafficScene,
        }
    }

    struct FailingService;

    impl SceneService for FailingService {
        async fn fetch(&self, _preset: ScenePreset) -> Result<SceneResponse> {
            Err(LabelscopeError::IoError(std::io::Error::other("connection refused")))
        }
    }

    struct FixedService(SceneResponse);

    impl SceneService for FixedService {
        async fn fetch(&self, _preset: ScenePreset) -> Result<SceneResponse> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_box_3d_gesture_converts_once() {
        let mut session = Session::new(config()).unwrap();
        // Render (x right, y up, z forward): forward 2..6, left 1..-1.
        assert!(session.begin_box_3d(RenderPoint::new(-1.0, 0.0, 2.0)));
        let b = session.finish_box_3d(RenderPoint::new(1.0, 0.0, 6.0)).unwrap();
        assert_eq!(b.center, VehiclePoint::new(4.0, 0.0, 0.0));
        assert_eq!(b.size.width, 4.0);
        assert_eq!(b.size.depth, 2.0);
        assert_eq!(session.gesture(), Gesture::None);
    }

    #[test]
    fn test_second_gesture_ignored() {
        let mut session = Session::new(config()).unwrap();
        assert!(session.begin_box_2d(DVec2::new(10.0, 10.0)));
        assert!(!session.begin_box_3d(RenderPoint::new(0.0, 0.0, 5.0)));
        assert!(!session.begin_box_2d(DVec2::new(50.0, 50.0)));
        assert!(session.finish_box_3d(RenderPoint::new(0.0, 0.0, 9.0)).is_none());
        let b = session.finish_box_2d(DVec2::new(410.0, 210.0)).unwrap();
        assert!((b.rect.x - 10.0 / 800.0).abs() < 1e-6);
        assert!((b.rect.width - 0.5).abs() < 1e-6);
        assert!((b.rect.height - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_2d_gesture_through_zoomed_view() {
        let mut session = Session::new(config()).unwrap();
        session.wheel(DVec2::ZERO, ZoomDirection::In);
        session.begin_box_2d(DVec2::new(0.0, 0.0));
        let b = session.finish_box_2d(DVec2::new(440.0, 220.0)).unwrap();
        assert!((b.rect.width - 0.5).abs() < 1e-5);
        assert!((b.rect.height - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_scene_applied_and_overlay_rendered() {
        let mut session = Session::new(config()).unwrap();
        session
            .apply_scene(response(vec![
                LidarPoint::new(5.0, 0.0, 0.0, 1.0),
                LidarPoint::new(0.05, 0.0, 0.0, 1.0),
            ]))
            .unwrap();
        assert_eq!(session.overlay().markers().len(), 1);
        assert!(session.take_notification().is_none());
    }

    #[test]
    fn test_invalid_scene_keeps_previous() {
        let mut session = Session::new(config()).unwrap();
        session
            .apply_scene(response(vec![LidarPoint::new(5.0, 0.0, 0.0, 1.0)]))
            .unwrap();
        let bad = response(vec![LidarPoint::new(f32::INFINITY, 0.0, 0.0, 1.0)]);
        assert!(session.apply_scene(bad).is_err());
        assert_eq!(session.scene().unwrap().point_cloud().len(), 1);
        assert!(session.take_notification().is_some());
        assert!(session.take_notification().is_none());
    }

    #[test]
    fn test_failed_fetch_keeps_previous_scene() {
        let mut session = Session::new(config()).unwrap();
        let good = FixedService(response(vec![LidarPoint::new(5.0, 0.0, 0.0, 1.0)]));
        pollster::block_on(fetch_scene(&mut session, &good, ScenePreset::TrafficScene)).unwrap();

        let err = pollster::block_on(fetch_scene(
            &mut session,
            &FailingService,
            ScenePreset::UrbanStreet,
        ))
        .unwrap_err();
        assert!(matches!(err, LabelscopeError::SceneUnavailable(_)));
        assert_eq!(session.scene().unwrap().preset(), ScenePreset::TrafficScene);
        assert!(session.take_notification().unwrap().contains("connection refused"));
    }

    #[test]
    fn test_reset_view_rerenders_with_reset_transform() {
        let mut session = Session::new(config()).unwrap();
        session
            .apply_scene(response(vec![LidarPoint::new(5.0, 0.0, 0.0, 1.0)]))
            .unwrap();
        session.wheel(DVec2::new(100.0, 100.0), ZoomDirection::In);
        session.pointer_down(PointerButton::Secondary, DVec2::ZERO);
        session.pointer_move(DVec2::new(120.0, 80.0));
        session.pointer_up(PointerButton::Secondary);
        assert_ne!(session.overlay().view().scale, 1.0);

        session.reset_view();
        assert_eq!(session.overlay().view().scale, 1.0);
        assert_eq!(session.overlay().view().translate, DVec2::ZERO);
        assert!(!session.sync_view());
    }

    #[test]
    fn test_selected_box_outline_flagged() {
        let mut session = Session::new(config()).unwrap();
        session.apply_scene(response(vec![])).unwrap();
        session.begin_box_3d(RenderPoint::new(-1.0, 0.0, 8.0));
        let b = session.finish_box_3d(RenderPoint::new(1.0, 0.0, 12.0)).unwrap();
        session.edit_store(|store| store.select_box_3d(b.id)).unwrap();
        let outline = session.overlay().outlines()[0];
        assert_eq!(outline.id, b.id);
        assert!(outline.selected);
        assert!(session.frustum().near[0].z > 0.0);
    }
}
