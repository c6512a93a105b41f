//! Basic integration tests for labelscope.
//!
//! Note: Due to labelscope using global state that can only be initialized
//! once per process (`OnceLock`), all tests are combined into a single test
//! function.

use image::{Rgba, RgbaImage};
use labelscope::*;

struct FixedService;

impl SceneService for FixedService {
    async fn fetch(&self, preset: ScenePreset) -> Result<SceneResponse> {
        let pixels = RgbaImage::from_pixel(80, 40, Rgba([45, 45, 50, 255]));
        Ok(SceneResponse {
            point_cloud: PointCloud::new(vec![
                LidarPoint::new(5.0, 0.0, 0.0, 1.0),
                LidarPoint::new(10.0, 1.0, 3.0, 0.7),
                LidarPoint::new(0.05, 0.0, 0.0, 1.0),
            ]),
            camera_image: CameraImage {
                image_data: encode_png_data_url(&pixels).map_err(|e| {
                    LabelscopeError::SceneUnavailable(e.to_string())
                })?,
                width: 80,
                height: 40,
            },
            preset,
        })
    }
}

struct OfflineService;

impl SceneService for OfflineService {
    async fn fetch(&self, _preset: ScenePreset) -> Result<SceneResponse> {
        Err(LabelscopeError::SceneUnavailable("service offline".to_string()))
    }
}

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
        canvas: Canvas::new(800.0, 400.0),
        ..SessionConfig::default()
    }
}

/// Main integration test that runs all basic tests in sequence.
///
/// This is structured as a single test because labelscope uses global state
/// that cannot be re-initialized after shutdown within the same process.
#[test]
fn test_basics() {
    assert!(!is_initialized());
    assert!(try_with_session(|s| s.gesture()).is_none());
    // Scene loading before init fails instead of panicking, on both paths.
    assert!(matches!(
        load_scene_blocking(&OfflineService, ScenePreset::UrbanStreet),
        Err(LabelscopeError::NotInitialized)
    ));
    assert!(matches!(
        load_scene_blocking(&FixedService, ScenePreset::UrbanStreet),
        Err(LabelscopeError::NotInitialized)
    ));

    init(config()).expect("init failed");
    assert!(is_initialized());
    assert!(matches!(
        init(config()),
        Err(LabelscopeError::AlreadyInitialized)
    ));

    // Test 1: Load a scene
    {
        load_scene_blocking(&FixedService, ScenePreset::ParkingLot).expect("scene load failed");
        let scene = current_scene().expect("scene missing");
        assert_eq!(scene.preset(), ScenePreset::ParkingLot);
        assert_eq!(scene.point_cloud().len(), 3);

        let image = camera_image().expect("image decode failed");
        assert_eq!(image.dimensions(), (80, 40));

        // The point inside the near-clip epsilon is excluded.
        let instances = overlay_instances();
        assert_eq!(instances.len(), 2);
        assert!((instances[0].position[0] - 400.0).abs() < 1e-3);
        assert!((instances[0].position[1] - 200.0).abs() < 1e-3);
    }

    // Test 2: Failed fetch keeps the previous scene
    {
        let err = load_scene_blocking(&OfflineService, ScenePreset::UrbanStreet).unwrap_err();
        assert!(matches!(err, LabelscopeError::SceneUnavailable(_)));
        assert_eq!(current_scene().unwrap().preset(), ScenePreset::ParkingLot);
        assert!(take_notification().is_some());
        assert!(take_notification().is_none());
    }

    // Test 3: Draw and edit a 3D box
    let car = {
        assert!(begin_box_3d(RenderPoint::new(-1.0, 0.0, 8.0)));
        let car = finish_box_3d(RenderPoint::new(1.0, 0.0, 12.0)).expect("no box created");
        car.set_label("car").unwrap();
        assert_eq!(car.label().as_deref(), Some("car"));
        assert_eq!(car.center(), Some(VehiclePoint::new(10.0, 0.0, 0.0)));
        assert_eq!(car.size(), Some(BoxSize::new(4.0, 1.8, 2.0)));
        let pose = car.render_pose().unwrap();
        assert_eq!(pose.center, RenderPoint::new(0.0, 0.0, 10.0));
        assert_eq!(pose.extents, Vec3::new(2.0, 1.8, 4.0));

        assert!(matches!(begin_edit(HandleAxis::X), Err(LabelscopeError::NoSelection)));
        car.select().unwrap();
        assert!(car.is_selected());
        begin_edit(HandleAxis::X).unwrap();
        let moved = drag_edit(Vec3::new(1.5, 0.0, 0.0)).unwrap();
        assert_eq!(moved.center, VehiclePoint::new(11.5, 0.0, 0.0));
        assert!(end_edit());

        set_handle_mode(HandleMode::Resize).unwrap();
        begin_edit(HandleAxis::All).unwrap();
        let resized = drag_edit(Vec3::splat(-20.0)).unwrap();
        assert_eq!(resized.size, BoxSize::new(0.5, 0.5, 0.5));
        end_edit();
        car
    };

    // Test 4: Draw a 2D box and link it
    let sign = {
        assert!(begin_box_2d(DVec2::new(100.0, 100.0)));
        // A second gesture is ignored while one is active.
        assert!(!begin_box_3d(RenderPoint::new(0.0, 0.0, 5.0)));
        let sign = finish_box_2d(DVec2::new(300.0, 200.0)).expect("no 2D box created");
        let rect = sign.rect().unwrap();
        assert!((rect.x - 0.125).abs() < 1e-6);
        assert!((rect.height - 0.25).abs() < 1e-6);

        // Too small to keep.
        begin_box_2d(DVec2::new(10.0, 10.0));
        assert!(finish_box_2d(DVec2::new(12.0, 12.0)).is_none());

        car.link(&sign).unwrap();
        assert_eq!(sign.linked(), Some(car));
        sign
    };

    // Test 5: Zoom and reset
    {
        wheel(DVec2::new(400.0, 200.0), ZoomDirection::In);
        assert!((view_transform().scale - 1.1).abs() < 1e-12);
        pointer_down(PointerButton::Middle, DVec2::ZERO);
        pointer_move(DVec2::new(120.0, 80.0));
        pointer_up(PointerButton::Middle);
        reset_view();
        assert_eq!(view_transform(), ViewportTransform::default());
    }

    // Test 6: Export
    {
        let export = export_annotations();
        assert_eq!(export.metadata.total_boxes, 2);
        assert_eq!(export.boxes_3d[0].linked_2d.as_deref(), Some("box2d_0"));
        assert!(export.to_kitti().starts_with("car 0 0 0 0 0 0 0 0.5 0.5 0.5 "));
        let json = export.to_json_pretty().unwrap();
        assert!(json.contains("\"version\": \"1.0\""));
    }

    // Test 7: Delete clears links and selection; stale handles fail fast
    {
        sign.delete().unwrap();
        assert!(car.linked().is_none());
        car.delete().unwrap();
        assert!(selected_box_3d().is_none());
        assert!(matches!(
            car.select(),
            Err(LabelscopeError::Box3dNotFound(_))
        ));
        assert!(get_box_3d(car.id()).is_none());
        assert!(get_all_boxes_3d().is_empty());
    }

    shutdown();
    assert!(!is_initialized());
    assert!(matches!(
        set_handle_mode(HandleMode::Translate),
        Err(LabelscopeError::NotInitialized)
    ));
}
