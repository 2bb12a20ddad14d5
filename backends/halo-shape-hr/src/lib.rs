//! Pure Rust text shaping backend using harfrust
//!
//! Harfrust is a pure Rust port of HarfBuzz. Direction, script and language
//! are guessed from the text itself, and feature settings are applied over
//! the whole buffer exactly as given.

use std::sync::Arc;

use harfrust::{Feature, FontRef as HrFontRef, GlyphBuffer, ShaperData, Tag, UnicodeBuffer};

use halo_core::{
    error::{FontLoadError, Result, ShapingError},
    traits::{FontRef, Shaper},
    types::{PositionedGlyph, ShapingResult},
    FeatureSettings,
};

/// Text shaping powered by harfrust
#[derive(Debug, Default, Clone, Copy)]
pub struct HarfrustShaper;

impl HarfrustShaper {
    pub fn new() -> Self {
        Self
    }

    /// Translate feature settings into harfrust features spanning the whole text
    fn to_hr_features(features: &FeatureSettings) -> Vec<Feature> {
        features
            .iter()
            .map(|(tag, value)| Feature {
                tag: Tag::new(&FeatureSettings::tag_bytes(tag)),
                value,
                start: 0,
                end: u32::MAX,
            })
            .collect()
    }

    /// Pull positioned glyphs out of harfrust's buffer, converting font units to pixels
    ///
    /// `y` keeps harfrust's orientation: positive offsets move up.
    fn extract_glyphs(buffer: &GlyphBuffer, ppem: f32, upem: u16) -> (Vec<PositionedGlyph>, f32) {
        let mut glyphs = Vec::new();
        let mut pen_x = 0.0;
        let mut pen_y = 0.0;
        let scale = ppem / f32::from(upem);

        for (info, pos) in buffer.glyph_infos().iter().zip(buffer.glyph_positions()) {
            glyphs.push(PositionedGlyph {
                id: info.glyph_id,
                x: pen_x + pos.x_offset as f32 * scale,
                y: pen_y + pos.y_offset as f32 * scale,
                advance: pos.x_advance as f32 * scale,
                cluster: info.cluster,
            });

            pen_x += pos.x_advance as f32 * scale;
            pen_y += pos.y_advance as f32 * scale;
        }

        (glyphs, pen_x)
    }
}

impl Shaper for HarfrustShaper {
    fn name(&self) -> &'static str {
        "Harfrust"
    }

    fn shape(
        &self,
        text: &str,
        font: Arc<dyn FontRef>,
        size: f32,
        features: &FeatureSettings,
    ) -> Result<ShapingResult> {
        if text.is_empty() {
            return Err(ShapingError::EmptyText.into());
        }

        let upem = font.units_per_em();
        if upem == 0 {
            return Err(FontLoadError::InvalidData.into());
        }

        let hr_font = HrFontRef::from_index(font.data(), font.face_index())
            .map_err(|_| FontLoadError::InvalidData)?;

        // ShaperData caches the font's layout tables for this call
        let shaper_data = ShaperData::new(&hr_font);
        let shaper = shaper_data.shaper(&hr_font).point_size(Some(size)).build();

        let mut buffer = UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.guess_segment_properties();

        let hr_features = Self::to_hr_features(features);
        log::trace!(
            "Shaping {:?} at {size:.2}px with {} feature(s)",
            text,
            hr_features.len()
        );

        let output = shaper.shape(buffer, &hr_features);
        let (glyphs, advance_width) = Self::extract_glyphs(&output, size, upem);
        if glyphs.is_empty() {
            return Err(ShapingError::NoGlyphs(text.to_string()).into());
        }

        Ok(ShapingResult {
            glyphs,
            advance_width,
            size,
        })
    }
}
