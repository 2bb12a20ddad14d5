//! The engine that drives one request from text to image file

// this_file: crates/halo-core/src/pipeline.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    composite::Compositor,
    error::{FitError, HaloError, RenderError, Result},
    fit::{self, InkBounds, PlacedGlyph, MAX_FIT_ATTEMPTS, REFERENCE_PX},
    traits::{Exporter, FontRef, Rasterizer, Shaper},
    types::{BitmapData, GlyphId},
    FeatureSettings, RenderRequest,
};

/// Shape → Fit → Composite → Write
///
/// ```ignore
/// use halo_core::AvatarPipeline;
///
/// let pipeline = AvatarPipeline::builder()
///     .shaper(Arc::new(HarfrustShaper::new()))
///     .rasterizer(Arc::new(ZenoRasterizer::new()))
///     .exporter(Arc::new(ImageExporter::new()))
///     .build()?;
///
/// let report = pipeline.process(&request, font, Path::new("avatar.png"))?;
/// ```
pub struct AvatarPipeline {
    shaper: Arc<dyn Shaper>,
    rasterizer: Arc<dyn Rasterizer>,
    exporter: Arc<dyn Exporter>,
}

/// What happened during a render, for the caller to print
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    /// Where the image was written; empty until [`AvatarPipeline::process`] writes it
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Pixel size the text was finally rendered at
    pub font_px: f32,
    pub features: FeatureSettings,
    pub glyph_ids: Vec<GlyphId>,
    /// Names in shaping order; ids stand in for unnamed glyphs
    pub glyph_names: Vec<String>,
    /// Glyph ids the font could not draw
    pub skipped: Vec<GlyphId>,
    /// Ink box of the final glyph mask, on the canvas
    pub ink_bounds: Option<InkBounds>,
    /// Number of shape/rasterize passes the fit needed
    pub fit_attempts: usize,
}

/// A finished canvas that has not been written anywhere yet
#[derive(Debug, Clone)]
pub struct RenderedAvatar {
    pub bitmap: BitmapData,
    pub report: RenderReport,
}

/// Text shaped and rasterized at one size
struct Layout {
    px: f32,
    glyph_ids: Vec<GlyphId>,
    placed: Vec<PlacedGlyph>,
    skipped: Vec<GlyphId>,
    bounds: Option<InkBounds>,
}

impl AvatarPipeline {
    /// Start building a new pipeline
    pub fn builder() -> AvatarPipelineBuilder {
        AvatarPipelineBuilder::new()
    }

    /// Render and write to `output`
    ///
    /// The file is only touched after every stage has succeeded.
    pub fn process(
        &self,
        request: &RenderRequest,
        font: Arc<dyn FontRef>,
        output: &Path,
    ) -> Result<RenderReport> {
        let RenderedAvatar { bitmap, mut report } = self.render(request, font)?;

        log::debug!("Exporting with backend: {}", self.exporter.name());
        self.exporter.export(&bitmap, output)?;

        report.output = output.to_path_buf();
        Ok(report)
    }

    /// Render to an in-memory bitmap
    pub fn render(&self, request: &RenderRequest, font: Arc<dyn FontRef>) -> Result<RenderedAvatar> {
        request.validate()?;
        let (max_width, max_height) = request.max_text_box();
        log::debug!(
            "Fitting {:?} into {max_width:.1}x{max_height:.1} on a {}px canvas",
            request.text,
            request.size
        );

        let reference = self.layout_at(request, &font, REFERENCE_PX)?;
        let reference_bounds = reference.bounds.ok_or(FitError::NoInk)?;
        let scale = fit::fit_scale(&reference_bounds, max_width, max_height)?;
        log::debug!(
            "Reference ink box {}x{} at {REFERENCE_PX}px, scale {scale:.4}",
            reference_bounds.width(),
            reference_bounds.height()
        );

        let mut layout = self.layout_at(request, &font, REFERENCE_PX * scale)?;
        let mut attempts = 1;
        let bounds = loop {
            let bounds = layout.bounds.ok_or(FitError::NoInk)?;
            if bounds.fits_within(max_width, max_height) {
                break bounds;
            }
            if attempts >= MAX_FIT_ATTEMPTS {
                return Err(FitError::DoesNotFit {
                    width: bounds.width().max(0) as u32,
                    height: bounds.height().max(0) as u32,
                    max_width,
                    max_height,
                }
                .into());
            }
            let next_px = fit::refine_size(layout.px, &bounds, max_width, max_height)?;
            log::debug!(
                "Ink box {}x{} overshoots at {:.2}px, retrying at {next_px:.2}px",
                bounds.width(),
                bounds.height(),
                layout.px
            );
            layout = self.layout_at(request, &font, next_px)?;
            attempts += 1;
        };

        let offset = fit::centering_offset(&bounds, request.size);
        log::debug!(
            "Rendering at {:.2}px after {attempts} attempt(s), offset {offset:?}",
            layout.px
        );

        let composited = Compositor::new(request)?.run(&layout.placed, offset)?;

        let glyph_names = layout
            .glyph_ids
            .iter()
            .map(|&id| font.glyph_name(id).unwrap_or_else(|| id.to_string()))
            .collect();

        let report = RenderReport {
            output: PathBuf::new(),
            width: composited.canvas.width(),
            height: composited.canvas.height(),
            font_px: layout.px,
            features: request.features.clone(),
            glyph_ids: layout.glyph_ids,
            glyph_names,
            skipped: layout.skipped,
            ink_bounds: composited.glyph_mask.bounds(),
            fit_attempts: attempts,
        };

        Ok(RenderedAvatar {
            bitmap: composited.canvas.into_bitmap(),
            report,
        })
    }

    fn layout_at(&self, request: &RenderRequest, font: &Arc<dyn FontRef>, px: f32) -> Result<Layout> {
        if !px.is_finite() || px <= 0.0 {
            return Err(FitError::NonPositiveScale(px).into());
        }

        log::trace!("Shaping with backend: {} at {px:.2}px", self.shaper.name());
        let shaped = self
            .shaper
            .shape(&request.text, Arc::clone(font), px, &request.features)?;

        let mut placed = Vec::with_capacity(shaped.glyphs.len());
        let mut skipped = Vec::new();
        for glyph in &shaped.glyphs {
            match self.rasterizer.rasterize(font, glyph.id, px) {
                Ok(bitmap) => placed.push(PlacedGlyph::new(glyph, bitmap)),
                Err(HaloError::RenderingFailed(RenderError::GlyphMissing(id))) => {
                    log::warn!("Skipping glyph {id}: not present in the font");
                    skipped.push(id);
                },
                Err(e) => return Err(e),
            }
        }

        let bounds = fit::ink_bounds(&placed);
        Ok(Layout {
            px,
            glyph_ids: shaped.glyphs.iter().map(|g| g.id).collect(),
            placed,
            skipped,
            bounds,
        })
    }
}

/// Assemble a pipeline from its three backends
#[derive(Default)]
pub struct AvatarPipelineBuilder {
    shaper: Option<Arc<dyn Shaper>>,
    rasterizer: Option<Arc<dyn Rasterizer>>,
    exporter: Option<Arc<dyn Exporter>>,
}

impl AvatarPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose who turns characters into glyphs
    pub fn shaper(mut self, shaper: Arc<dyn Shaper>) -> Self {
        self.shaper = Some(shaper);
        self
    }

    /// Choose who turns glyphs into coverage
    pub fn rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Choose who writes the final image
    pub fn exporter(mut self, exporter: Arc<dyn Exporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn build(self) -> Result<AvatarPipeline> {
        Ok(AvatarPipeline {
            shaper: self
                .shaper
                .ok_or_else(|| HaloError::Pipeline("No shaper configured".into()))?,
            rasterizer: self
                .rasterizer
                .ok_or_else(|| HaloError::Pipeline("No rasterizer configured".into()))?,
            exporter: self
                .exporter
                .ok_or_else(|| HaloError::Pipeline("No exporter configured".into()))?,
        })
    }
}
