//! Everything one avatar render needs to know

use std::path::PathBuf;

use crate::{
    error::{FontLoadError, HaloError, Result},
    features::{FeatureSettings, DEFAULT_FEATURES},
    Color, Shape,
};

/// Largest canvas side we are willing to allocate
pub const MAX_CANVAS_SIZE: u32 = 16_384;

/// A single avatar render, validated before any pixel is touched
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub text: String,
    pub font_path: PathBuf,
    pub shape: Shape,
    /// Side of the square canvas in pixels
    pub size: u32,
    /// Gap between canvas edge and circle edge, in pixels
    pub margin: u32,
    pub features: FeatureSettings,
    pub background: Color,
    pub foreground: Color,
    pub glow: Color,
    pub glow_alpha: u8,
    pub glow_blur: f32,
    pub fit_width_ratio: f32,
    pub fit_height_ratio: f32,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            text: "{0xB}".to_string(),
            font_path: PathBuf::new(),
            shape: Shape::Circle,
            size: 1024,
            margin: 72,
            features: FeatureSettings::parse(DEFAULT_FEATURES).unwrap_or_default(),
            background: Color::rgb(0x2E, 0x34, 0x40),
            foreground: Color::rgb(0x88, 0xC0, 0xD0),
            glow: Color::rgb(0x5E, 0x81, 0xAC),
            glow_alpha: 190,
            glow_blur: 8.0,
            fit_width_ratio: 0.72,
            fit_height_ratio: 0.36,
        }
    }
}

impl RenderRequest {
    /// Check every invariant the pipeline relies on
    ///
    /// Geometry is checked before the font path so that a bad argument is
    /// reported as such even when the font is missing too.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(HaloError::invalid("size must be greater than 0"));
        }
        if self.size > MAX_CANVAS_SIZE {
            return Err(HaloError::invalid(format!(
                "size {} exceeds the maximum of {MAX_CANVAS_SIZE}",
                self.size
            )));
        }
        if u64::from(self.margin) * 2 >= u64::from(self.size) {
            return Err(HaloError::invalid(format!(
                "margin {} must be less than half the size ({})",
                self.margin, self.size
            )));
        }
        check_ratio("fit width ratio", self.fit_width_ratio)?;
        check_ratio("fit height ratio", self.fit_height_ratio)?;
        if !self.glow_blur.is_finite() || self.glow_blur < 0.0 {
            return Err(HaloError::invalid(format!(
                "glow blur must be a finite value >= 0, got {}",
                self.glow_blur
            )));
        }
        if !self.font_path.is_file() {
            return Err(
                FontLoadError::FileNotFound(self.font_path.display().to_string()).into(),
            );
        }
        Ok(())
    }

    /// Glow color with the requested opacity folded into its alpha
    pub fn effective_glow(&self) -> Color {
        let alpha = u32::from(self.glow.a) * u32::from(self.glow_alpha) / 255;
        self.glow.with_alpha(alpha as u8)
    }

    /// Largest ink box the text may occupy, in pixels
    pub fn max_text_box(&self) -> (f32, f32) {
        let size = self.size as f32;
        (size * self.fit_width_ratio, size * self.fit_height_ratio)
    }

    /// Radius of the avatar circle
    pub fn circle_radius(&self) -> f32 {
        (self.size as f32 - 2.0 * self.margin as f32) / 2.0
    }
}

fn check_ratio(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(HaloError::invalid(format!(
            "{name} must be in (0, 1], got {value}"
        )))
    }
}
