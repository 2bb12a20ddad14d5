//! Layout/Fit: how big the text gets and where it lands
//!
//! Text is first measured at [`REFERENCE_PX`]. The ratio between the allowed
//! box and the measured ink box gives the rendering size. Rasterizing at the
//! new size rounds to whole pixels, so the result is checked again and shrunk
//! in small steps until it fits.

use crate::{
    error::{FitError, Result},
    types::{GlyphBitmap, PositionedGlyph},
};

/// Pixel size used for the first measurement
pub const REFERENCE_PX: f32 = 256.0;

/// Upper bound on re-rasterizations while chasing the target box
pub const MAX_FIT_ATTEMPTS: usize = 8;

/// Each refinement shrinks at least this much, so the loop always progresses
const REFINE_STEP: f32 = 0.98;

/// Half-open integer pixel box, y pointing down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl InkBounds {
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }

    pub fn union(&self, other: &InkBounds) -> InkBounds {
        InkBounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn translate(&self, dx: i32, dy: i32) -> InkBounds {
        InkBounds {
            min_x: self.min_x + dx,
            min_y: self.min_y + dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    pub fn fits_within(&self, max_width: f32, max_height: f32) -> bool {
        self.width() as f32 <= max_width && self.height() as f32 <= max_height
    }
}

/// A rasterized glyph pinned to its top-left pixel in text space
///
/// Text space has the pen origin at (0, 0) and y growing downward.
#[derive(Debug, Clone)]
pub struct PlacedGlyph {
    pub bitmap: GlyphBitmap,
    pub x: i32,
    pub y: i32,
}

impl PlacedGlyph {
    /// Snap a shaped glyph and its bitmap onto the pixel grid
    pub fn new(glyph: &PositionedGlyph, bitmap: GlyphBitmap) -> Self {
        let x = glyph.x.round() as i32 + bitmap.left;
        let y = -(glyph.y.round() as i32) - bitmap.top;
        Self { bitmap, x, y }
    }

    /// Tight box around pixels that carry coverage
    pub fn ink_bounds(&self) -> Option<InkBounds> {
        let bitmap = &self.bitmap;
        if bitmap.is_empty() {
            return None;
        }

        let w = bitmap.width as usize;
        let mut bounds: Option<InkBounds> = None;
        for (row, line) in bitmap.coverage.chunks_exact(w).enumerate() {
            let Some(first) = line.iter().position(|&c| c > 0) else {
                continue;
            };
            let last = line.iter().rposition(|&c| c > 0).unwrap_or(first);
            let row_box = InkBounds {
                min_x: self.x + first as i32,
                min_y: self.y + row as i32,
                max_x: self.x + last as i32 + 1,
                max_y: self.y + row as i32 + 1,
            };
            bounds = Some(match bounds {
                Some(b) => b.union(&row_box),
                None => row_box,
            });
        }
        bounds
    }
}

/// Union of the ink of every placed glyph
pub fn ink_bounds(placed: &[PlacedGlyph]) -> Option<InkBounds> {
    placed
        .iter()
        .filter_map(PlacedGlyph::ink_bounds)
        .reduce(|a, b| a.union(&b))
}

/// Scale that brings `bounds` inside the allowed box
pub fn fit_scale(bounds: &InkBounds, max_width: f32, max_height: f32) -> Result<f32> {
    let width = bounds.width() as f32;
    let height = bounds.height() as f32;
    if width <= 0.0 || height <= 0.0 {
        return Err(FitError::NoInk.into());
    }

    let scale = (max_width / width).min(max_height / height);
    if !scale.is_finite() || scale <= 0.0 {
        return Err(FitError::NonPositiveScale(scale).into());
    }
    Ok(scale)
}

/// Next pixel size to try after `bounds` overshot the allowed box
pub fn refine_size(current_px: f32, bounds: &InkBounds, max_width: f32, max_height: f32) -> Result<f32> {
    let scale = fit_scale(bounds, max_width, max_height)?;
    let next = current_px * scale.min(1.0) * REFINE_STEP;
    if !next.is_finite() || next <= 0.0 {
        return Err(FitError::NonPositiveScale(next).into());
    }
    Ok(next)
}

/// Offset that moves `bounds` to the middle of a `size`×`size` canvas
pub fn centering_offset(bounds: &InkBounds, size: u32) -> (i32, i32) {
    let size = size as i32;
    let dx = (size - bounds.width()).div_euclid(2) - bounds.min_x;
    let dy = (size - bounds.height()).div_euclid(2) - bounds.min_y;
    (dx, dy)
}
