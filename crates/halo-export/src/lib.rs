//! Image file writer
//!
//! The output format follows the path's extension. PNG, JPEG and BMP are
//! compiled in; JPEG has no alpha channel, so transparent pixels are written
//! with their color channels as-is.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageFormat, RgbaImage};

use halo_core::{
    error::{ExportError, Result},
    traits::Exporter,
    types::{BitmapData, BitmapFormat},
};

/// Formats this writer accepts
const SUPPORTED: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Bmp];

/// Resolve the output format from a path's extension
pub fn format_for_path(path: &Path) -> Result<ImageFormat> {
    let format = ImageFormat::from_path(path).map_err(|_| {
        ExportError::FormatNotSupported(format!(
            "cannot infer an image format from {}",
            path.display()
        ))
    })?;

    if !SUPPORTED.contains(&format) || !format.writing_enabled() {
        return Err(ExportError::FormatNotSupported(format!(
            "{format:?} output is not supported, use .png, .jpg or .bmp"
        ))
        .into());
    }
    Ok(format)
}

/// Widen any bitmap to straight RGBA
fn to_rgba_image(bitmap: &BitmapData) -> Result<RgbaImage> {
    let expected = bitmap.width as usize * bitmap.height as usize * bitmap.format.bytes_per_pixel();
    if bitmap.data.len() != expected {
        return Err(ExportError::EncodingFailed(format!(
            "buffer holds {} bytes, expected {} for {}x{} {:?}",
            bitmap.data.len(),
            expected,
            bitmap.width,
            bitmap.height,
            bitmap.format
        ))
        .into());
    }

    let rgba = match bitmap.format {
        BitmapFormat::Rgba8 => bitmap.data.clone(),
        BitmapFormat::Gray8 => bitmap
            .data
            .iter()
            .flat_map(|&gray| [gray, gray, gray, 255])
            .collect(),
    };

    ImageBuffer::from_raw(bitmap.width, bitmap.height, rgba).ok_or_else(|| {
        ExportError::EncodingFailed("failed to create image buffer".into()).into()
    })
}

/// Writes PNG, JPEG or BMP depending on the file extension
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageExporter;

impl ImageExporter {
    pub fn new() -> Self {
        Self
    }

    /// Encode into an explicit format, regardless of any path
    pub fn encode_as(&self, bitmap: &BitmapData, format: ImageFormat) -> Result<Vec<u8>> {
        let rgba = to_rgba_image(bitmap)?;
        let image = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()),
            _ => DynamicImage::ImageRgba8(rgba),
        };

        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), format)
            .map_err(|e| ExportError::EncodingFailed(format!("{format:?} encoding failed: {e}")))?;

        log::debug!(
            "Encoded {}x{} as {format:?}, {} bytes",
            bitmap.width,
            bitmap.height,
            bytes.len()
        );
        Ok(bytes)
    }
}

impl Exporter for ImageExporter {
    fn name(&self) -> &'static str {
        "image"
    }

    fn encode(&self, bitmap: &BitmapData, path: &Path) -> Result<Vec<u8>> {
        let format = format_for_path(path)?;
        self.encode_as(bitmap, format)
    }
}
