//! Decoding of the camera image embedded in a scene response.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::RgbaImage;

use labelscope_core::CameraImage;

use crate::error::{RenderError, RenderResult};

/// Splits a `data:image/<type>;base64,<payload>` URL into its media type and
/// payload.
pub fn parse_data_url(url: &str) -> RenderResult<(&str, &str)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::InvalidDataUrl("missing 'data:' prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::InvalidDataUrl("missing ',' separator".to_string()))?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| RenderError::InvalidDataUrl("payload is not base64".to_string()))?;
    if !media_type.starts_with("image/") {
        return Err(RenderError::InvalidDataUrl(format!(
            "unsupported media type '{media_type}'"
        )));
    }
    Ok((media_type, payload))
}

/// Decodes the camera image to RGBA pixels and checks the declared size.
pub fn decode_camera_image(image: &CameraImage) -> RenderResult<RgbaImage> {
    let (media_type, payload) = parse_data_url(&image.image_data)?;
    let bytes = BASE64.decode(payload.trim())?;
    let decoded = image::load_from_memory(&bytes)?.to_rgba8();
    if decoded.dimensions() != (image.width, image.height) {
        return Err(RenderError::ImageSizeMismatch {
            width: image.width,
            height: image.height,
            actual_width: decoded.width(),
            actual_height: decoded.height(),
        });
    }
    log::debug!(
        "decoded {media_type} camera image {}x{}",
        decoded.width(),
        decoded.height()
    );
    Ok(decoded)
}

/// Encodes RGBA pixels as a PNG data URL.
pub fn encode_png_data_url(pixels: &RgbaImage) -> RenderResult<String> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    pixels.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(format!(
        "data:image/png;base64,{}",
        BASE64.encode(buffer.into_inner())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn camera_image(width: u32, height: u32) -> CameraImage {
        let pixels = RgbaImage::from_pixel(width, height, Rgba([135, 150, 165, 255]));
        CameraImage {
            image_data: encode_png_data_url(&pixels).unwrap(),
            width,
            height,
        }
    }

    #[test]
    fn test_decode_png() {
        let image = camera_image(8, 4);
        let decoded = decode_camera_image(&image).unwrap();
        assert_eq!(decoded.dimensions(), (8, 4));
        assert_eq!(decoded.get_pixel(3, 2), &Rgba([135, 150, 165, 255]));
    }

    #[test]
    fn test_size_mismatch() {
        let mut image = camera_image(8, 4);
        image.width = 800;
        assert!(matches!(
            decode_camera_image(&image),
            Err(RenderError::ImageSizeMismatch {
                actual_width: 8,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_data_url() {
        assert_eq!(
            parse_data_url("data:image/jpeg;base64,AAAA").unwrap(),
            ("image/jpeg", "AAAA")
        );
        assert!(parse_data_url("image/png;base64,AAAA").is_err());
        assert!(parse_data_url("data:text/plain;base64,AAAA").is_err());
        assert!(parse_data_url("data:image/png,AAAA").is_err());
    }

    #[test]
    fn test_bad_base64() {
        let image = CameraImage {
            image_data: "data:image/png;base64,!!!".to_string(),
            width: 1,
            height: 1,
        };
        assert!(matches!(
            decode_camera_image(&image),
            Err(RenderError::Base64(_))
        ));
    }
}
