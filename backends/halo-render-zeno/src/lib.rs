//! Zeno rasterizer: glyph outlines in, coverage masks out
//!
//! skrifa draws each outline unhinted at the requested pixel size into a
//! pen that builds two paths at once:
//!
//! 1. **SVG strings** for zeno's rasterizer
//! 2. **kurbo paths** for exact bounding boxes
//!
//! zeno then fills the path into an 8-bit coverage mask, which is flipped
//! from font space (y up) to bitmap rows (y down).

// this_file: backends/halo-render-zeno/src/lib.rs

use std::sync::Arc;

use kurbo::Shape;
use skrifa::{
    instance::{LocationRef, Size},
    outline::{DrawSettings, OutlinePen},
    MetadataProvider,
};
use zeno::Mask;

use halo_core::{
    error::{RenderError, Result},
    traits::{FontRef, Rasterizer},
    types::{GlyphBitmap, GlyphId},
};

/// Pure Rust outline rasterizer
pub struct ZenoRasterizer {
    /// Largest bitmap side we agree to allocate for one glyph
    max_size: u32,
}

impl ZenoRasterizer {
    pub fn new() -> Self {
        Self { max_size: 65_535 }
    }
}

impl Default for ZenoRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for ZenoRasterizer {
    fn name(&self) -> &'static str {
        "Zeno"
    }

    fn rasterize(&self, font: &Arc<dyn FontRef>, glyph_id: GlyphId, size: f32) -> Result<GlyphBitmap> {
        if !size.is_finite() || size <= 0.0 {
            return Err(RenderError::InvalidDimensions {
                width: 0,
                height: 0,
            }
            .into());
        }

        let font_ref = skrifa::FontRef::from_index(font.data(), font.face_index())
            .map_err(|_| RenderError::InvalidFont)?;
        let outlines = font_ref.outline_glyphs();
        let glyph = outlines
            .get(skrifa::GlyphId::new(glyph_id))
            .ok_or(RenderError::GlyphMissing(glyph_id))?;

        let mut builder = ZenoPathBuilder::new();
        let settings = DrawSettings::unhinted(Size::new(size), LocationRef::default());
        glyph
            .draw(settings, &mut builder)
            .map_err(|_| RenderError::OutlineExtractionFailed)?;

        if builder.is_empty() {
            log::trace!("Glyph {glyph_id} has no outline");
            return Ok(GlyphBitmap::empty());
        }
        let (path_data, kurbo_path) = builder.finish();

        let bbox = kurbo_path.bounding_box();
        if !(bbox.x0.is_finite() && bbox.y0.is_finite() && bbox.x1.is_finite() && bbox.y1.is_finite())
            || bbox.area() <= 0.0
        {
            return Ok(GlyphBitmap::empty());
        }

        // Snap outward so the bitmap never cuts into the outline
        let left = bbox.x0.floor() as i32;
        let bottom = bbox.y0.floor() as i32;
        let right = bbox.x1.ceil() as i32;
        let top = bbox.y1.ceil() as i32;
        let width = (right - left).max(1) as u32;
        let height = (top - bottom).max(1) as u32;
        if width > self.max_size || height > self.max_size {
            return Err(RenderError::InvalidDimensions { width, height }.into());
        }

        let mut mask = vec![0u8; width as usize * height as usize];
        Mask::new(path_data.as_str())
            .size(width, height)
            .offset((-left, -bottom))
            .render_into(&mut mask, None);

        // Font coordinates are y-up, bitmap rows are y-down
        let row = width as usize;
        for y in 0..(height as usize / 2) {
            let (upper, lower) = mask.split_at_mut((height as usize - 1 - y) * row);
            upper[y * row..(y + 1) * row].swap_with_slice(&mut lower[..row]);
        }

        log::trace!("Glyph {glyph_id} at {size:.2}px: {width}x{height} at ({left}, {top})");
        Ok(GlyphBitmap {
            width,
            height,
            left,
            top,
            coverage: mask,
        })
    }
}

/// Pen that feeds zeno and kurbo from one outline walk
struct ZenoPathBuilder {
    commands: Vec<String>,
    kurbo_path: kurbo::BezPath,
}

impl ZenoPathBuilder {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
            kurbo_path: kurbo::BezPath::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn finish(self) -> (String, kurbo::BezPath) {
        (self.commands.join(" "), self.kurbo_path)
    }
}

impl OutlinePen for ZenoPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(format!("M {x:.3},{y:.3}"));
        self.kurbo_path.move_to((f64::from(x), f64::from(y)));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(format!("L {x:.3},{y:.3}"));
        self.kurbo_path.line_to((f64::from(x), f64::from(y)));
    }

    fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.commands
            .push(format!("Q {cx:.3},{cy:.3} {x:.3},{y:.3}"));
        self.kurbo_path
            .quad_to((f64::from(cx), f64::from(cy)), (f64::from(x), f64::from(y)));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.commands.push(format!(
            "C {cx0:.3},{cy0:.3} {cx1:.3},{cy1:.3} {x:.3},{y:.3}"
        ));
        self.kurbo_path.curve_to(
            (f64::from(cx0), f64::from(cy0)),
            (f64::from(cx1), f64::from(cy1)),
            (f64::from(x), f64::from(y)),
        );
    }

    fn close(&mut self) {
        self.commands.push("Z".to_string());
        self.kurbo_path.close_path();
    }
}
