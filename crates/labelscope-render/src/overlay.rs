//! Projection overlay: lidar points and 3D boxes drawn over the camera image.
//!
//! [`ProjectionOverlay::render`] recomputes the overlay from scratch in canvas
//! pixels. [`ProjectionOverlay::paint`] hands the result, mapped through the
//! current viewport transform, to an [`OverlaySurface`] supplied by the host.

use glam::{Vec2, Vec3};

use labelscope_core::{Box3d, Box3dId, OverlayOptions, PointCloud, ViewportTransform};

use crate::camera::{CameraParams, Canvas, PixelRect, Projection};

/// Height band of a point, by vehicle z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeightTier {
    /// Above the high threshold (signs, traffic lights, tree tops).
    High,
    Mid,
    /// Below the ground threshold (road surface, curbs).
    Ground,
}

impl HeightTier {
    /// Classifies a vehicle-frame height.
    pub fn classify(z: f32, options: &OverlayOptions) -> Self {
        if z > options.high_threshold {
            HeightTier::High
        } else if z < options.ground_threshold {
            HeightTier::Ground
        } else {
            HeightTier::Mid
        }
    }

    /// Marker color of the tier.
    pub fn color(self) -> Vec3 {
        match self {
            HeightTier::High => Vec3::new(1.0, 0.3, 0.3),
            HeightTier::Mid => Vec3::new(1.0, 0.8, 0.2),
            HeightTier::Ground => Vec3::new(0.3, 0.6, 1.0),
        }
    }
}

/// A projected lidar point, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayMarker {
    pub pixel: Vec2,
    pub tier: HeightTier,
    pub color: Vec3,
    pub alpha: f32,
    pub size: f32,
}

/// A projected 3D box, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxOutline {
    pub id: Box3dId,
    pub rect: PixelRect,
    pub selected: bool,
}

/// Marker record for upload to a display surface.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MarkerInstance {
    /// Screen position after the viewport transform.
    pub position: [f32; 2],
    pub size: f32,
    pub alpha: f32,
    pub color: [f32; 4],
}

/// The external display surface the overlay is drawn on.
pub trait OverlaySurface {
    /// Removes everything drawn by the previous paint.
    fn clear(&mut self);

    /// Draws one point marker. `position` is in screen pixels.
    fn draw_marker(&mut self, position: Vec2, marker: &OverlayMarker);

    /// Draws one box outline. `min` and `max` are in screen pixels.
    fn draw_box_outline(&mut self, min: Vec2, max: Vec2, outline: &BoxOutline);
}

/// Computes and holds the overlay of the current scene.
#[derive(Debug, Clone, Default)]
pub struct ProjectionOverlay {
    options: OverlayOptions,
    markers: Vec<OverlayMarker>,
    outlines: Vec<BoxOutline>,
    view: ViewportTransform,
}

impl ProjectionOverlay {
    pub fn new(options: OverlayOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &OverlayOptions {
        &self.options
    }

    /// Recomputes markers and box outlines. Previous results are discarded.
    ///
    /// Only points that project in front of the camera and onto the canvas
    /// produce markers.
    pub fn render<'a>(
        &mut self,
        camera: &CameraParams,
        cloud: &PointCloud,
        boxes: impl IntoIterator<Item = (&'a Box3d, bool)>,
        canvas: Canvas,
    ) {
        self.clear();
        let options = &self.options;
        self.markers.extend(cloud.points.iter().filter_map(|point| {
            let Projection::Visible {
                pixel, distance, ..
            } = camera.project_point(point.position, canvas)
            else {
                return None;
            };
            let tier = HeightTier::classify(point.position.0.z, options);
            let brightness = point.intensity.max(0.0).min(options.intensity_cap);
            Some(OverlayMarker {
                pixel,
                tier,
                color: tier.color(),
                alpha: brightness / (1.0 + options.attenuation * distance),
                size: options.marker_size,
            })
        }));
        self.outlines.extend(boxes.into_iter().filter_map(|(b, selected)| {
            camera.project_box(b, canvas).map(|rect| BoxOutline {
                id: b.id,
                rect,
                selected,
            })
        }));
        log::debug!(
            "overlay: {} of {} points visible, {} box outlines",
            self.markers.len(),
            cloud.len(),
            self.outlines.len()
        );
    }

    /// Discards all markers and outlines.
    pub fn clear(&mut self) {
        self.markers.clear();
        self.outlines.clear();
    }

    pub fn markers(&self) -> &[OverlayMarker] {
        &self.markers
    }

    pub fn outlines(&self) -> &[BoxOutline] {
        &self.outlines
    }

    /// The viewport transform used by [`paint`](Self::paint).
    pub fn view(&self) -> ViewportTransform {
        self.view
    }

    /// Sets the viewport transform used by [`paint`](Self::paint).
    pub fn set_view(&mut self, view: ViewportTransform) {
        self.view = view;
    }

    /// Draws the overlay on a surface, replacing what was drawn before.
    pub fn paint(&self, surface: &mut dyn OverlaySurface) {
        surface.clear();
        for marker in &self.markers {
            surface.draw_marker(self.to_screen(marker.pixel), marker);
        }
        for outline in &self.outlines {
            surface.draw_box_outline(
                self.to_screen(outline.rect.min),
                self.to_screen(outline.rect.max),
                outline,
            );
        }
    }

    /// Packs the markers for upload, positions in screen pixels.
    pub fn instances(&self) -> Vec<MarkerInstance> {
        self.markers
            .iter()
            .map(|m| MarkerInstance {
                position: self.to_screen(m.pixel).to_array(),
                size: m.size,
                alpha: m.alpha,
                color: m.color.extend(1.0).to_array(),
            })
            .collect()
    }

    /// Raw bytes of [`instances`](Self::instances).
    pub fn instance_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.instances()).to_vec()
    }

    fn to_screen(&self, pixel: Vec2) -> Vec2 {
        self.view.content_to_screen(pixel.as_dvec2()).as_vec2()
    }
}
