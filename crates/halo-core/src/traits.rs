//! The contracts between the pipeline and its backends
//!
//! - [`FontRef`] - Read access to font data and metrics
//! - [`Shaper`] - Where characters become glyphs
//! - [`Rasterizer`] - Where glyphs become coverage
//! - [`Exporter`] - Where the canvas becomes a file

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::{
    error::{ExportError, Result},
    types::{BitmapData, GlyphBitmap, GlyphId, ShapingResult},
    FeatureSettings,
};

/// Your window into a loaded font
///
/// ```ignore
/// struct MyFont {
///     data: Vec<u8>,
/// }
///
/// impl FontRef for MyFont {
///     fn data(&self) -> &[u8] {
///         &self.data
///     }
///
///     fn units_per_em(&self) -> u16 {
///         1000
///     }
///
///     fn glyph_id(&self, ch: char) -> Option<GlyphId> {
///         Some(42)
///     }
/// }
/// ```
pub trait FontRef: Send + Sync {
    /// Raw font bytes as they live in the file
    fn data(&self) -> &[u8];

    /// Which face of a collection to use (0 for single fonts)
    fn face_index(&self) -> u32 {
        0
    }

    /// The font's internal coordinate system scale
    fn units_per_em(&self) -> u16;

    /// Find the glyph that represents this character
    fn glyph_id(&self, ch: char) -> Option<GlyphId>;

    /// How many glyphs this font contains
    fn glyph_count(&self) -> Option<u32> {
        None
    }

    /// PostScript name of a glyph, when the font carries one
    fn glyph_name(&self, _glyph_id: GlyphId) -> Option<String> {
        None
    }
}

/// Where characters learn their positions
///
/// Feature settings are handed to the engine untouched; unknown tags are
/// left for the engine to ignore.
pub trait Shaper: Send + Sync {
    /// Identify yourself in logs and error messages
    fn name(&self) -> &'static str;

    /// Transform characters into positioned glyphs at `size` pixels per em
    fn shape(
        &self,
        text: &str,
        font: Arc<dyn FontRef>,
        size: f32,
        features: &FeatureSettings,
    ) -> Result<ShapingResult>;
}

/// Where glyphs become coverage masks
pub trait Rasterizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rasterize one glyph at `size` pixels per em
    ///
    /// Blank glyphs come back as [`GlyphBitmap::empty`]; ids the font does
    /// not have are a `RenderError::GlyphMissing`.
    fn rasterize(
        &self,
        font: &Arc<dyn FontRef>,
        glyph_id: GlyphId,
        size: f32,
    ) -> Result<GlyphBitmap>;
}

/// The final step: pixels become files
pub trait Exporter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Encode the bitmap in the format implied by `path`
    fn encode(&self, bitmap: &BitmapData, path: &Path) -> Result<Vec<u8>>;

    /// Encode, then create or overwrite the file at `path`
    ///
    /// Nothing touches the filesystem until encoding has succeeded.
    fn export(&self, bitmap: &BitmapData, path: &Path) -> Result<()> {
        let bytes = self.encode(bitmap, path)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ExportError::WriteFailed(format!("{}: {}", parent.display(), e))
            })?;
        }
        fs::write(path, bytes)
            .map_err(|e| ExportError::WriteFailed(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }
}
