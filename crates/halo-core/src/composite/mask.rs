//! Single-channel coverage buffers
//!
//! Glyph coverage, the blurred glow and the circle outline all live in the
//! same shape of buffer: one byte per pixel, 0 = empty, 255 = full.

use crate::fit::{InkBounds, PlacedGlyph};

/// Overlap rule for glyph coverage: the stronger pixel wins, whatever the
/// drawing order
#[inline]
pub fn max_blend(dst: u8, src: u8) -> u8 {
    dst.max(src)
}

/// Canvas-sized coverage buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CoverageMask {
    /// Empty mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Wrap existing bytes, `None` if the length does not match
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Composite every glyph at its offset-corrected position
    pub fn from_glyphs(width: u32, height: u32, glyphs: &[PlacedGlyph], offset: (i32, i32)) -> Self {
        let mut mask = Self::new(width, height);
        for glyph in glyphs {
            mask.draw_glyph(glyph, offset);
        }
        mask
    }

    /// Anti-aliased filled circle
    ///
    /// A pixel is covered by the amount its center sits inside the edge, so
    /// any pixel whose center lies outside `radius` stays at exactly 0.
    pub fn circle(size: u32, radius: f32) -> Self {
        let mut mask = Self::new(size, size);
        let center = size as f32 / 2.0;

        for y in 0..size {
            let dy = y as f32 + 0.5 - center;
            for x in 0..size {
                let dx = x as f32 + 0.5 - center;
                let distance = (dx * dx + dy * dy).sqrt();
                let coverage = (radius - distance).clamp(0.0, 1.0);
                mask.data[(y * size + x) as usize] = (coverage * 255.0).round() as u8;
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    /// Max-blend one glyph bitmap, clipping at the edges
    pub fn draw_glyph(&mut self, glyph: &PlacedGlyph, offset: (i32, i32)) {
        let bitmap = &glyph.bitmap;
        if bitmap.is_empty() {
            return;
        }

        let origin_x = glyph.x + offset.0;
        let origin_y = glyph.y + offset.1;

        for gy in 0..bitmap.height as i32 {
            let py = origin_y + gy;
            if py < 0 || py >= self.height as i32 {
                continue;
            }
            for gx in 0..bitmap.width as i32 {
                let px = origin_x + gx;
                if px < 0 || px >= self.width as i32 {
                    continue;
                }

                let src = bitmap.coverage[(gy * bitmap.width as i32 + gx) as usize];
                let idx = (py as u32 * self.width + px as u32) as usize;
                self.data[idx] = max_blend(self.data[idx], src);
            }
        }
    }

    /// Tight box around non-zero pixels
    pub fn bounds(&self) -> Option<InkBounds> {
        let w = self.width as usize;
        if w == 0 {
            return None;
        }

        let mut bounds: Option<InkBounds> = None;
        for (y, row) in self.data.chunks_exact(w).enumerate() {
            let Some(first) = row.iter().position(|&c| c > 0) else {
                continue;
            };
            let last = row.iter().rposition(|&c| c > 0).unwrap_or(first);
            let row_box = InkBounds {
                min_x: first as i32,
                min_y: y as i32,
                max_x: last as i32 + 1,
                max_y: y as i32 + 1,
            };
            bounds = Some(match bounds {
                Some(b) => b.union(&row_box),
                None => row_box,
            });
        }
        bounds
    }

    /// Sum of all coverage, handy for checking blur energy
    pub fn total(&self) -> u64 {
        self.data.iter().map(|&c| u64::from(c)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GlyphBitmap;

    fn square_glyph(x: i32, y: i32, side: u32, value: u8) -> PlacedGlyph {
        PlacedGlyph {
            bitmap: GlyphBitmap {
                width: side,
                height: side,
                left: 0,
                top: 0,
                coverage: vec![value; (side * side) as usize],
            },
            x,
            y,
        }
    }

    #[test]
    fn overlapping_glyphs_keep_the_maximum() {
        let glyphs = [square_glyph(0, 0, 3, 100), square_glyph(1, 1, 3, 200)];
        let mask = CoverageMask::from_glyphs(5, 5, &glyphs, (0, 0));

        assert_eq!(mask.get(0, 0), 100);
        assert_eq!(mask.get(1, 1), 200);
        assert_eq!(mask.get(2, 2), 200);
        assert_eq!(mask.get(3, 3), 200);
        assert_eq!(mask.get(4, 4), 0);

        // Drawing order does not matter
        let reversed = [square_glyph(1, 1, 3, 200), square_glyph(0, 0, 3, 100)];
        assert_eq!(CoverageMask::from_glyphs(5, 5, &reversed, (0, 0)), mask);
    }

    #[test]
    fn max_blend_never_lowers_coverage() {
        for dst in [0u8, 1, 127, 254, 255] {
            for src in [0u8, 1, 127, 254, 255] {
                let out = max_blend(dst, src);
                assert!(out >= dst && out >= src);
            }
        }
    }

    #[test]
    fn offset_applies_and_edges_clip() {
        let glyphs = [square_glyph(-2, -2, 4, 255)];
        let mask = CoverageMask::from_glyphs(4, 4, &glyphs, (3, 3));
        // Glyph spans 1..5 after the offset; only 1..4 is on the canvas
        assert_eq!(mask.get(0, 0), 0);
        assert_eq!(mask.get(1, 1), 255);
        assert_eq!(mask.get(3, 3), 255);
        assert_eq!(mask.total(), 9 * 255);
    }

    #[test]
    fn bounds_are_tight() {
        let glyphs = [square_glyph(2, 3, 2, 10)];
        let mask = CoverageMask::from_glyphs(8, 8, &glyphs, (0, 0));
        assert_eq!(
            mask.bounds(),
            Some(InkBounds {
                min_x: 2,
                min_y: 3,
                max_x: 4,
                max_y: 5
            })
        );
        assert!(CoverageMask::new(8, 8).bounds().is_none());
    }

    #[test]
    fn circle_is_zero_outside_radius() {
        let size = 64;
        let radius = 20.0;
        let mask = CoverageMask::circle(size, radius);
        let center = size as f32 / 2.0;

        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 + 0.5 - center;
                let dy = y as f32 + 0.5 - center;
                let d = (dx * dx + dy * dy).sqrt();
                if d > radius {
                    assert_eq!(mask.get(x, y), 0, "pixel ({x},{y}) outside radius");
                }
                if d < radius - 1.0 {
                    assert_eq!(mask.get(x, y), 255, "pixel ({x},{y}) inside radius");
                }
            }
        }
    }

    #[test]
    fn from_raw_checks_length() {
        assert!(CoverageMask::from_raw(2, 2, vec![0; 4]).is_some());
        assert!(CoverageMask::from_raw(2, 2, vec![0; 3]).is_none());
    }
}
