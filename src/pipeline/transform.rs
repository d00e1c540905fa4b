//! The resize/crop/blur transform boundary.
//!
//! The actual transform is an external collaborator; the pipeline only
//! depends on the [`MediaTransform`] trait. A pure function of the input
//! bytes is assumed: the same payload always yields the same dimensions and
//! error. [`PassthroughTransform`] is the built-in implementation — it
//! decodes for dimensions and optionally crops, leaving resizing and region
//! blurring to external implementations.

use image::ImageFormat;
use std::io::Cursor;

/// Output of a successful transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedImage {
    /// Encoded payload handed to the writer
    pub payload: Vec<u8>,

    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Width before the transform
    pub original_width: u32,

    /// Height before the transform
    pub original_height: u32,
}

/// Transform boundary: raw fetched bytes in, encoded payload plus dimensions
/// out. Errors are plain descriptions — the processor converts them into
/// `failed_to_resize` rejections.
pub trait MediaTransform: Send + Sync {
    /// Transform `data`, optionally blurring `bboxes` regions and cropping to
    /// `crop` (both in relative `[x0, y0, x1, y1]` coordinates).
    fn transform(
        &self,
        data: &[u8],
        bboxes: Option<&[[f32; 4]]>,
        crop: Option<[f32; 4]>,
    ) -> Result<TransformedImage, String>;
}

/// Built-in transform: decodes to establish dimensions and applies an
/// optional crop (re-encoding to `encode_format`). Without a crop the
/// original bytes pass through untouched. Bounding boxes are accepted but
/// not blurred.
pub struct PassthroughTransform {
    format: ImageFormat,
}

impl PassthroughTransform {
    /// Create a transform re-encoding crops to `encode_format`
    /// (`jpg`, `png`, `webp`, ...). Unknown formats fall back to PNG.
    pub fn new(encode_format: &str) -> Self {
        let format = match encode_format.trim().to_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "webp" => ImageFormat::WebP,
            "bmp" => ImageFormat::Bmp,
            _ => ImageFormat::Png,
        };
        Self { format }
    }
}

impl MediaTransform for PassthroughTransform {
    fn transform(
        &self,
        data: &[u8],
        _bboxes: Option<&[[f32; 4]]>,
        crop: Option<[f32; 4]>,
    ) -> Result<TransformedImage, String> {
        let img = image::load_from_memory(data).map_err(|e| format!("decode error: {e}"))?;
        let original_width = img.width();
        let original_height = img.height();

        let Some([x0, y0, x1, y1]) = crop else {
            return Ok(TransformedImage {
                payload: data.to_vec(),
                width: original_width,
                height: original_height,
                original_width,
                original_height,
            });
        };

        if !(0.0..=1.0).contains(&x0) || !(0.0..=1.0).contains(&y0) || x1 <= x0 || y1 <= y0 {
            return Err(format!("invalid crop [{x0}, {y0}, {x1}, {y1}]"));
        }

        let left = (x0 * original_width as f32) as u32;
        let top = (y0 * original_height as f32) as u32;
        let crop_width = ((x1.min(1.0) - x0) * original_width as f32).round().max(1.0) as u32;
        let crop_height = ((y1.min(1.0) - y0) * original_height as f32).round().max(1.0) as u32;

        let cropped = img.crop_imm(left, top, crop_width, crop_height);
        let mut payload = Vec::new();
        cropped
            .write_to(&mut Cursor::new(&mut payload), self.format)
            .map_err(|e| format!("encode error: {e}"))?;

        Ok(TransformedImage {
            width: cropped.width(),
            height: cropped.height(),
            original_width,
            original_height,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_passthrough_reports_dimensions() {
        let transform = PassthroughTransform::new("png");
        let bytes = png_bytes(64, 32);
        let out = transform.transform(&bytes, None, None).unwrap();
        assert_eq!(out.width, 64);
        assert_eq!(out.height, 32);
        assert_eq!(out.original_width, 64);
        assert_eq!(out.original_height, 32);
        assert_eq!(out.payload, bytes);
    }

    #[test]
    fn test_crop_halves_dimensions() {
        let transform = PassthroughTransform::new("png");
        let bytes = png_bytes(100, 100);
        let out = transform
            .transform(&bytes, None, Some([0.0, 0.0, 0.5, 0.5]))
            .unwrap();
        assert_eq!(out.width, 50);
        assert_eq!(out.height, 50);
        assert_eq!(out.original_width, 100);
        assert_eq!(out.original_height, 100);
        assert_ne!(out.payload, bytes);
    }

    #[test]
    fn test_invalid_bytes_report_error() {
        let transform = PassthroughTransform::new("png");
        let err = transform.transform(b"not an image", None, None).unwrap_err();
        assert!(err.contains("decode error"));
    }

    #[test]
    fn test_invalid_crop_reports_error() {
        let transform = PassthroughTransform::new("png");
        let bytes = png_bytes(10, 10);
        let err = transform
            .transform(&bytes, None, Some([0.9, 0.9, 0.1, 0.1]))
            .unwrap_err();
        assert!(err.contains("invalid crop"));
    }

    #[test]
    fn test_transform_is_idempotent_on_same_input() {
        let transform = PassthroughTransform::new("png");
        let bytes = png_bytes(20, 40);
        let first = transform.transform(&bytes, None, None).unwrap();
        let second = transform.transform(&bytes, None, None).unwrap();
        assert_eq!(first, second);
    }
}
