//! Premultiplied RGBA canvas

use super::mask::CoverageMask;
use crate::{
    error::{RenderError, Result},
    request::MAX_CANVAS_SIZE,
    types::{BitmapData, BitmapFormat},
    Color,
};

/// The one pixel buffer a render writes into
///
/// Pixels are stored premultiplied, so source-over is a single multiply-add
/// per channel and every channel stays at or below its alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Canvas {
    /// Fully transparent canvas
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 || width > MAX_CANVAS_SIZE || height > MAX_CANVAS_SIZE {
            return Err(RenderError::InvalidDimensions { width, height }.into());
        }
        Ok(Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Replace every pixel with `color`
    pub fn fill(&mut self, color: Color) {
        let px = premultiply(color, 255);
        for pixel in self.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&px);
        }
    }

    /// Replace every pixel with `color` scaled by the mask's coverage
    pub fn fill_masked(&mut self, color: Color, mask: &CoverageMask) {
        debug_assert_eq!((mask.width(), mask.height()), (self.width, self.height));
        for (pixel, &coverage) in self.data.chunks_exact_mut(4).zip(mask.data()) {
            pixel.copy_from_slice(&premultiply(color, coverage));
        }
    }

    /// Source-over `color`, using the mask as per-pixel alpha
    pub fn composite_tinted(&mut self, color: Color, mask: &CoverageMask) {
        debug_assert_eq!((mask.width(), mask.height()), (self.width, self.height));
        for (pixel, &coverage) in self.data.chunks_exact_mut(4).zip(mask.data()) {
            if coverage == 0 {
                continue;
            }
            let src = premultiply(color, coverage);
            let inv_a = 255 - u32::from(src[3]);
            for c in 0..4 {
                let dst = u32::from(pixel[c]);
                pixel[c] = (u32::from(src[c]) + div255(dst * inv_a)).min(255) as u8;
            }
        }
    }

    /// Multiply every channel by the mask, clearing uncovered pixels
    pub fn clip(&mut self, mask: &CoverageMask) {
        debug_assert_eq!((mask.width(), mask.height()), (self.width, self.height));
        for (pixel, &coverage) in self.data.chunks_exact_mut(4).zip(mask.data()) {
            let coverage = u32::from(coverage);
            for channel in pixel.iter_mut() {
                *channel = div255(u32::from(*channel) * coverage) as u8;
            }
        }
    }

    /// Hand the pixels over as straight-alpha RGBA
    pub fn into_bitmap(self) -> BitmapData {
        let mut data = self.data;
        for px in data.chunks_exact_mut(4) {
            let a = px[3];
            if a == 0 {
                px[0] = 0;
                px[1] = 0;
                px[2] = 0;
                continue;
            }
            let a_u = u32::from(a);
            for channel in px.iter_mut().take(3) {
                *channel = ((u32::from(*channel) * 255 + a_u / 2) / a_u).min(255) as u8;
            }
        }

        BitmapData {
            width: self.width,
            height: self.height,
            format: BitmapFormat::Rgba8,
            data,
        }
    }
}

/// `color` at `coverage`, premultiplied
fn premultiply(color: Color, coverage: u8) -> [u8; 4] {
    let a = div255(u32::from(color.a) * u32::from(coverage));
    [
        div255(u32::from(color.r) * a) as u8,
        div255(u32::from(color.g) * a) as u8,
        div255(u32::from(color.b) * a) as u8,
        a as u8,
    ]
}

/// Rounded division by 255
#[inline]
fn div255(v: u32) -> u32 {
    (v + 127) / 255
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_mask(size: u32, value: u8) -> CoverageMask {
        CoverageMask::from_raw(size, size, vec![value; (size * size) as usize]).unwrap()
    }

    #[test]
    fn rejects_degenerate_sizes() {
        assert!(Canvas::new(0, 10).is_err());
        assert!(Canvas::new(MAX_CANVAS_SIZE + 1, 1).is_err());
        assert!(Canvas::new(1, 1).is_ok());
    }

    #[test]
    fn fill_is_opaque_and_exact() {
        let mut canvas = Canvas::new(2, 2).unwrap();
        canvas.fill(Color::rgb(0x2E, 0x34, 0x40));
        assert_eq!(canvas.pixel(1, 1), [0x2E, 0x34, 0x40, 255]);
    }

    #[test]
    fn full_coverage_replaces_destination() {
        let mut canvas = Canvas::new(2, 2).unwrap();
        canvas.fill(Color::black());
        canvas.composite_tinted(Color::white(), &full_mask(2, 255));
        assert_eq!(canvas.pixel(0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn half_coverage_mixes_and_stays_opaque() {
        let mut canvas = Canvas::new(1, 1).unwrap();
        canvas.fill(Color::black());
        canvas.composite_tinted(Color::white(), &full_mask(1, 128));
        let [r, g, b, a] = canvas.pixel(0, 0);
        assert_eq!(a, 255);
        assert_eq!((r, g, b), (128, 128, 128));
    }

    #[test]
    fn zero_coverage_leaves_canvas_alone() {
        let mut canvas = Canvas::new(1, 1).unwrap();
        canvas.fill(Color::rgb(1, 2, 3));
        canvas.composite_tinted(Color::white(), &full_mask(1, 0));
        assert_eq!(canvas.pixel(0, 0), [1, 2, 3, 255]);
    }

    #[test]
    fn premultiplied_channels_never_exceed_alpha() {
        let mut canvas = Canvas::new(1, 1).unwrap();
        canvas.fill_masked(Color::rgba(250, 120, 3, 200), &full_mask(1, 77));
        canvas.composite_tinted(Color::rgba(9, 255, 40, 90), &full_mask(1, 201));
        let [r, g, b, a] = canvas.pixel(0, 0);
        assert!(r <= a && g <= a && b <= a);
    }

    #[test]
    fn clip_clears_uncovered_pixels() {
        let mut canvas = Canvas::new(2, 1).unwrap();
        canvas.fill(Color::white());
        let mask = CoverageMask::from_raw(2, 1, vec![0, 255]).unwrap();
        canvas.clip(&mask);
        assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(canvas.pixel(1, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn straight_alpha_output_round_trips_opaque_colors() {
        let mut canvas = Canvas::new(1, 1).unwrap();
        canvas.fill(Color::rgb(0x88, 0xC0, 0xD0));
        let bitmap = canvas.into_bitmap();
        assert_eq!(bitmap.format, BitmapFormat::Rgba8);
        assert_eq!(bitmap.data, vec![0x88, 0xC0, 0xD0, 255]);
    }

    #[test]
    fn straight_alpha_output_unpremultiplies() {
        let mut canvas = Canvas::new(1, 1).unwrap();
        canvas.fill_masked(Color::rgb(200, 100, 0), &full_mask(1, 128));
        let bitmap = canvas.into_bitmap();
        let [r, g, b, a] = [bitmap.data[0], bitmap.data[1], bitmap.data[2], bitmap.data[3]];
        assert_eq!(a, 128);
        assert!((i32::from(r) - 200).abs() <= 2);
        assert!((i32::from(g) - 100).abs() <= 2);
        assert_eq!(b, 0);
    }
}
