//! Session configuration loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use labelscope_core::{Options, Result};
use labelscope_render::{CameraParams, Canvas};

use crate::render_error;

/// Everything a [`Session`](crate::Session) needs at start.
///
/// ```json
/// {
///   "options": { "box3d": { "min_size": 0.5 } },
///   "camera": {
///     "position": { "vehicle": [2.0, 0.0, 2.0] },
///     "frustum": { "fov_h": 1.5708, "fov_v": 0.9273, "near": 1.0, "far": 50.0 },
///     "intrinsics": { "fx": 1920.0, "fy": 1920.0, "cx": 1920.0, "cy": 960.0,
///                     "width": 3840, "height": 1920 }
///   },
///   "canvas": { "width": 800.0, "height": 400.0 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub options: Options,
    pub camera: CameraParams,
    /// Size of the image panel before any zoom or pan.
    pub canvas: Canvas,
}

impl SessionConfig {
    /// Parses and validates a configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks options, camera, and canvas.
    pub fn validate(&self) -> Result<()> {
        self.options.validate()?;
        self.camera.validate().map_err(render_error)?;
        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            return Err(labelscope_core::LabelscopeError::InvalidConfig(format!(
                "canvas must have a positive size ({}x{})",
                self.canvas.width, self.canvas.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelscope_core::LabelscopeError;

    #[test]
    fn test_default_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = SessionConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_inconsistent_camera_rejected() {
        let json = r#"{
            "camera": {
                "position": { "vehicle": [2.0, 0.0, 2.0] },
                "frustum": { "fov_h": 2.007, "fov_v": 1.0036, "near": 1.0, "far": 50.0 },
                "intrinsics": { "fx": 1920.0, "fy": 1920.0, "cx": 1920.0, "cy": 960.0,
                                "width": 3840, "height": 1920 }
            }
        }"#;
        let err = SessionConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, LabelscopeError::Render(msg) if msg.contains("horizontal")));
    }

    #[test]
    fn test_zero_canvas_rejected() {
        let json = r#"{ "canvas": { "width": 0.0, "height": 400.0 } }"#;
        assert!(matches!(
            SessionConfig::from_json_str(json),
            Err(LabelscopeError::InvalidConfig(_))
        ));
    }
}
