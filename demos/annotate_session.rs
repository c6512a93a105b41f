//! Drives an annotation session the way a host application would.
//!
//! A synthetic scene service stands in for the HTTP backend and a text
//! surface stands in for the image panel. Run with
//! `RUST_LOG=debug cargo run --example annotate_session` to see the session
//! log.

use image::{Rgba, RgbaImage};
use labelscope::*;

/// Generates a road with two parked cars on a regular grid.
struct SyntheticScenes;

impl SyntheticScenes {
    fn road() -> impl Iterator<Item = LidarPoint> {
        (0..40).flat_map(|i| {
            (0..30).map(move |j| {
                #[allow(clippy::cast_precision_loss)]
                let (x, y) = (i as f32 - 20.0, j as f32 - 15.0);
                LidarPoint::new(x, y, 0.0, 0.3)
            })
        })
    }

    fn car(center: Vec3, yaw: f32) -> impl Iterator<Item = LidarPoint> {
        let (length, width, height) = (4.5, 1.8, 1.4);
        let (sin, cos) = yaw.sin_cos();
        (0..10).flat_map(move |i| {
            (0..6).flat_map(move |j| {
                (0..5).map(move |k| {
                    #[allow(clippy::cast_precision_loss)]
                    let local = Vec3::new(
                        (i as f32 / 9.0 - 0.5) * length,
                        (j as f32 / 5.0 - 0.5) * width,
                        k as f32 / 4.0 * height,
                    );
                    let x = center.x + local.x * cos - local.y * sin;
                    let y = center.y + local.x * sin + local.y * cos;
                    LidarPoint::new(x, y, center.z + local.z, 0.6)
                })
            })
        })
    }
}

impl SceneService for SyntheticScenes {
    async fn fetch(&self, preset: ScenePreset) -> Result<SceneResponse> {
        let points = Self::road()
            .chain(Self::car(Vec3::new(8.0, -5.0, 0.0), 0.0))
            .chain(Self::car(Vec3::new(12.0, 2.0, 0.0), 0.3))
            .collect();
        let pixels = RgbaImage::from_fn(800, 400, |_, y| {
            if y < 200 {
                Rgba([135, 150, 165, 255])
            } else {
                Rgba([45, 45, 50, 255])
            }
        });
        let image_data = encode_png_data_url(&pixels)
            .map_err(|e| LabelscopeError::SceneUnavailable(e.to_string()))?;
        Ok(SceneResponse {
            point_cloud: PointCloud::new(points),
            camera_image: CameraImage {
                image_data,
                width: 800,
                height: 400,
            },
            preset,
        })
    }
}

/// Counts what the overlay would draw.
#[derive(Default)]
struct TextSurface {
    markers: usize,
    outlines: Vec<String>,
}

impl OverlaySurface for TextSurface {
    fn clear(&mut self) {
        self.markers = 0;
        self.outlines.clear();
    }

    fn draw_marker(&mut self, _position: Vec2, _marker: &OverlayMarker) {
        self.markers += 1;
    }

    fn draw_box_outline(&mut self, min: Vec2, max: Vec2, outline: &BoxOutline) {
        self.outlines.push(format!(
            "{}{} ({:.0}, {:.0})-({:.0}, {:.0})",
            outline.id,
            if outline.selected { " [selected]" } else { "" },
            min.x,
            min.y,
            max.x,
            max.y
        ));
    }
}

fn main() -> Result<()> {
    init(SessionConfig::default())?;

    for preset in ScenePreset::ALL {
        println!("{:<14} {} - {}", preset.id(), preset.name(), preset.description());
    }
    load_scene_blocking(&SyntheticScenes, ScenePreset::TrafficScene)?;

    // Box the first parked car: the host's ground picker reports render-frame
    // points (x right, y up, z forward).
    begin_box_3d(RenderPoint::new(3.9, 0.0, 5.75));
    let car = finish_box_3d(RenderPoint::new(6.1, 0.0, 10.25)).expect("3D drag was active");
    car.set_label("car")?.select()?;

    // Nudge it forward with the translate handle.
    begin_edit(HandleAxis::X)?;
    drag_edit(Vec3::new(0.25, 0.0, 0.0))?;
    end_edit();

    // Box the same car on the image and record the correspondence.
    begin_box_2d(DVec2::new(520.0, 200.0));
    if let Some(sign) = finish_box_2d(DVec2::new(640.0, 260.0)) {
        sign.set_label("car")?;
        car.link(&sign)?;
    }

    // Zoom in on the image, then go back.
    wheel(DVec2::new(600.0, 230.0), ZoomDirection::In);
    wheel(DVec2::new(600.0, 230.0), ZoomDirection::In);
    println!("zoomed view: {:?}", view_transform());
    reset_view();

    let mut surface = TextSurface::default();
    paint_overlay(&mut surface);
    println!("overlay: {} markers", surface.markers);
    for outline in &surface.outlines {
        println!("  {outline}");
    }

    let frustum = camera_frustum();
    println!("frustum near plane: {:?}", frustum.near);

    let export = export_annotations();
    println!("{}", export.to_json_pretty()?);
    println!("KITTI:\n{}", export.to_kitti());

    shutdown();
    Ok(())
}
