//! Configuration options for labelscope.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LabelscopeError, Result};

/// Global configuration options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// 3D box creation settings.
    pub box3d: Box3dOptions,

    /// 2D box creation settings.
    pub box2d: Box2dOptions,

    /// Image viewport zoom limits and steps.
    pub viewport: ViewportOptions,

    /// Projection overlay styling.
    pub overlay: OverlayOptions,
}

impl Options {
    /// Parses options from a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Loads options from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(LabelscopeError::InvalidConfig(msg.to_string()));

        if !positive(self.box3d.min_size) {
            return invalid("box3d.min_size must be positive");
        }
        if !positive(self.box3d.default_height) {
            return invalid("box3d.default_height must be positive");
        }
        if !(0.0..1.0).contains(&self.box2d.min_fraction) {
            return invalid("box2d.min_fraction must be in [0, 1)");
        }
        let vp = &self.viewport;
        if !(vp.min_scale > 0.0 && vp.min_scale <= 1.0 && vp.max_scale >= 1.0) {
            return invalid("viewport scale limits must bracket 1.0");
        }
        if !(vp.zoom_in_step > 1.0 && vp.zoom_out_step > 0.0 && vp.zoom_out_step < 1.0) {
            return invalid("viewport zoom steps must be >1 (in) and in (0, 1) (out)");
        }
        let ov = &self.overlay;
        if !positive(ov.attenuation) {
            return invalid("overlay.attenuation must be positive");
        }
        if ov.ground_threshold >= ov.high_threshold {
            return invalid("overlay.ground_threshold must be below overlay.high_threshold");
        }
        Ok(())
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

/// Settings for boxes drawn in the 3D view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Box3dOptions {
    /// Smallest width/depth a box can have, even from a zero-area drag.
    pub min_size: f32,
    /// Height given to new boxes (typical vehicle height).
    pub default_height: f32,
    /// Label given to new boxes.
    pub default_label: String,
    /// Translation snap for edit handles (0.0 = disabled).
    pub snap_translate: f32,
    /// Rotation snap for edit handles in degrees (0.0 = disabled).
    pub snap_rotate: f32,
}

impl Default for Box3dOptions {
    fn default() -> Self {
        Self {
            min_size: 0.5,
            default_height: 1.8,
            default_label: "object".to_string(),
            snap_translate: 0.0,
            snap_rotate: 0.0,
        }
    }
}

/// Settings for boxes drawn on the camera image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Box2dOptions {
    /// Gestures whose width or height does not exceed this fraction of the
    /// viewport extent are discarded as accidental clicks.
    pub min_fraction: f32,
    /// Label given to new boxes.
    pub default_label: String,
}

impl Default for Box2dOptions {
    fn default() -> Self {
        Self {
            min_fraction: 0.02,
            default_label: "object".to_string(),
        }
    }
}

/// Zoom settings for the image viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportOptions {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Multiplicative step for one wheel notch toward the user.
    pub zoom_in_step: f64,
    /// Multiplicative step for one wheel notch away from the user.
    pub zoom_out_step: f64,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 5.0,
            zoom_in_step: 1.1,
            zoom_out_step: 0.9,
        }
    }
}

/// Styling of the projected point overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayOptions {
    /// Marker edge length in canvas pixels.
    pub marker_size: f32,
    /// Intensities above this value do not brighten markers further.
    pub intensity_cap: f32,
    /// Distance attenuation constant `k` in `1 / (1 + k * distance)`.
    pub attenuation: f32,
    /// Points above this height (vehicle z) use the high tier color.
    pub high_threshold: f32,
    /// Points below this height use the ground tier color.
    pub ground_threshold: f32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            marker_size: 2.0,
            intensity_cap: 1.0,
            attenuation: 0.05,
            high_threshold: 2.0,
            ground_threshold: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = Options::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.box3d.default_height, 1.8);
        assert_eq!(options.box2d.min_fraction, 0.02);
        assert_eq!(options.viewport.max_scale, 5.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options = Options::from_json_str(r#"{ "box3d": { "min_size": 0.25 } }"#).unwrap();
        assert_eq!(options.box3d.min_size, 0.25);
        assert_eq!(options.box3d.default_label, "object");
        assert_eq!(options.viewport, ViewportOptions::default());
    }

    #[test]
    fn test_rejects_bad_zoom_steps() {
        let err = Options::from_json_str(r#"{ "viewport": { "zoom_in_step": 0.5 } }"#);
        assert!(matches!(err, Err(LabelscopeError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = Options::from_json_str("{ not json");
        assert!(matches!(err, Err(LabelscopeError::JsonError(_))));
    }
}
