//! The five compositing stages, run once each in a fixed order

use std::fmt;

use super::{blur::gaussian_blur, canvas::Canvas, mask::CoverageMask};
use crate::{
    error::{HaloError, Result},
    fit::PlacedGlyph,
    RenderRequest, Shape,
};

/// Where the compositor currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeStage {
    Background,
    GlyphMask,
    Glow,
    Foreground,
    Clip,
    Done,
}

impl CompositeStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Background => "Background",
            Self::GlyphMask => "GlyphMask",
            Self::Glow => "Glow",
            Self::Foreground => "Foreground",
            Self::Clip => "Clip",
            Self::Done => "Done",
        }
    }

    /// The stage that follows this one
    pub fn next(self) -> Self {
        match self {
            Self::Background => Self::GlyphMask,
            Self::GlyphMask => Self::Glow,
            Self::Glow => Self::Foreground,
            Self::Foreground => Self::Clip,
            Self::Clip | Self::Done => Self::Done,
        }
    }
}

impl fmt::Display for CompositeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a finished composite hands back
#[derive(Debug, Clone)]
pub struct Composited {
    pub canvas: Canvas,
    /// Unblurred glyph coverage at final positions
    pub glyph_mask: CoverageMask,
}

/// Owns the canvas for exactly one render
pub struct Compositor<'a> {
    request: &'a RenderRequest,
    stage: CompositeStage,
    canvas: Canvas,
    circle: Option<CoverageMask>,
    glyph_mask: Option<CoverageMask>,
}

impl<'a> Compositor<'a> {
    pub fn new(request: &'a RenderRequest) -> Result<Self> {
        let canvas = Canvas::new(request.size, request.size)?;
        let circle = match request.shape {
            Shape::Circle => Some(CoverageMask::circle(request.size, request.circle_radius())),
            Shape::Square => None,
        };

        Ok(Self {
            request,
            stage: CompositeStage::Background,
            canvas,
            circle,
            glyph_mask: None,
        })
    }

    pub fn stage(&self) -> CompositeStage {
        self.stage
    }

    /// Drive every stage to completion
    ///
    /// `offset` moves text-space glyph positions onto the canvas.
    pub fn run(mut self, glyphs: &[PlacedGlyph], offset: (i32, i32)) -> Result<Composited> {
        while self.stage != CompositeStage::Done {
            log::debug!("Compositing stage: {}", self.stage);
            self.step(glyphs, offset)?;
            self.stage = self.stage.next();
        }

        let glyph_mask = self
            .glyph_mask
            .ok_or_else(|| HaloError::Pipeline("glyph mask was never built".into()))?;
        Ok(Composited {
            canvas: self.canvas,
            glyph_mask,
        })
    }

    fn step(&mut self, glyphs: &[PlacedGlyph], offset: (i32, i32)) -> Result<()> {
        let request = self.request;
        match self.stage {
            CompositeStage::Background => match &self.circle {
                Some(circle) => self.canvas.fill_masked(request.background, circle),
                None => self.canvas.fill(request.background),
            },
            CompositeStage::GlyphMask => {
                let mask = CoverageMask::from_glyphs(request.size, request.size, glyphs, offset);
                log::trace!("Glyph mask bounds: {:?}", mask.bounds());
                self.glyph_mask = Some(mask);
            },
            CompositeStage::Glow => {
                let glow = request.effective_glow();
                if glow.a == 0 {
                    log::debug!("Glow opacity is 0, skipping");
                    return Ok(());
                }
                let blurred = gaussian_blur(self.glyph_mask()?, request.glow_blur)?;
                self.canvas.composite_tinted(glow, &blurred);
            },
            CompositeStage::Foreground => {
                let mask = self
                    .glyph_mask
                    .as_ref()
                    .ok_or_else(|| HaloError::Pipeline("glyph mask was never built".into()))?;
                self.canvas.composite_tinted(request.foreground, mask);
            },
            CompositeStage::Clip => {
                if let Some(circle) = &self.circle {
                    self.canvas.clip(circle);
                }
            },
            CompositeStage::Done => {},
        }
        Ok(())
    }

    fn glyph_mask(&self) -> Result<&CoverageMask> {
        self.glyph_mask
            .as_ref()
            .ok_or_else(|| HaloError::Pipeline("glyph mask was never built".into()))
    }
}
