use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use halo_core::error::{FitError, RenderError};
use halo_core::traits::{Exporter, FontRef, Rasterizer, Shaper};
use halo_core::types::{BitmapData, GlyphBitmap, GlyphId, PositionedGlyph, ShapingResult};
use halo_core::{AvatarPipeline, Color, FeatureSettings, HaloError, RenderRequest, Shape};

const MISSING_GLYPH: GlyphId = 999;

struct TestFont;

impl FontRef for TestFont {
    fn data(&self) -> &[u8] {
        b"font"
    }

    fn units_per_em(&self) -> u16 {
        1000
    }

    fn glyph_id(&self, ch: char) -> Option<u32> {
        Some(ch as u32)
    }

    fn glyph_name(&self, glyph_id: GlyphId) -> Option<String> {
        (glyph_id < 128).then(|| format!("g{glyph_id}"))
    }
}

/// One glyph per character, advancing 0.6em; `?` maps to a glyph the font lacks
struct MonoShaper;

impl Shaper for MonoShaper {
    fn name(&self) -> &'static str {
        "mono"
    }

    fn shape(
        &self,
        text: &str,
        _font: Arc<dyn FontRef>,
        size: f32,
        _features: &FeatureSettings,
    ) -> halo_core::Result<ShapingResult> {
        let advance = size * 0.6;
        let glyphs: Vec<PositionedGlyph> = text
            .chars()
            .enumerate()
            .map(|(i, ch)| PositionedGlyph {
                id: if ch == '?' { MISSING_GLYPH } else { ch as u32 },
                x: i as f32 * advance,
                y: 0.0,
                advance,
                cluster: i as u32,
            })
            .collect();

        Ok(ShapingResult {
            advance_width: glyphs.len() as f32 * advance,
            glyphs,
            size,
        })
    }
}

/// Solid 0.5em x 0.7em blocks sitting on the baseline
struct BlockRasterizer {
    calls: Arc<AtomicUsize>,
    fixed_side: Option<u32>,
}

impl BlockRasterizer {
    fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fixed_side: None,
        }
    }

    /// Ignores the requested size, so the text can never be made to fit
    fn stubborn(side: u32) -> Self {
        Self {
            fixed_side: Some(side),
            ..Self::new()
        }
    }
}

impl Rasterizer for BlockRasterizer {
    fn name(&self) -> &'static str {
        "block"
    }

    fn rasterize(
        &self,
        _font: &Arc<dyn FontRef>,
        glyph_id: GlyphId,
        size: f32,
    ) -> halo_core::Result<GlyphBitmap> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if glyph_id == MISSING_GLYPH {
            return Err(RenderError::GlyphMissing(glyph_id).into());
        }
        if glyph_id == ' ' as u32 {
            return Ok(GlyphBitmap::empty());
        }

        let (width, height) = match self.fixed_side {
            Some(side) => (side, side),
            None => ((size * 0.5).round() as u32, (size * 0.7).round() as u32),
        };
        Ok(GlyphBitmap {
            width,
            height,
            left: 0,
            top: height as i32,
            coverage: vec![255; (width * height) as usize],
        })
    }
}

/// Writes the raw pixel bytes, no container
struct RawExporter;

impl Exporter for RawExporter {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn encode(&self, bitmap: &BitmapData, _path: &Path) -> halo_core::Result<Vec<u8>> {
        Ok(bitmap.data.clone())
    }
}

fn pipeline_with(rasterizer: BlockRasterizer) -> AvatarPipeline {
    AvatarPipeline::builder()
        .shaper(Arc::new(MonoShaper))
        .rasterizer(Arc::new(rasterizer))
        .exporter(Arc::new(RawExporter))
        .build()
        .unwrap()
}

fn request(text: &str, shape: Shape) -> RenderRequest {
    RenderRequest {
        text: text.to_string(),
        // Any existing file satisfies the path check; the font itself is faked
        font_path: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml"),
        shape,
        size: 256,
        margin: 16,
        background: Color::black(),
        foreground: Color::white(),
        glow_alpha: 0,
        ..Default::default()
    }
}

fn font() -> Arc<dyn FontRef> {
    Arc::new(TestFont)
}

fn alpha_at(bitmap: &BitmapData, x: u32, y: u32) -> u8 {
    bitmap.data[((y * bitmap.width + x) * 4 + 3) as usize]
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("halo-core-test-{}", std::process::id()))
        .join(name)
}

#[test]
fn text_fits_inside_ratio_box_and_is_centered() {
    let request = request("AB", Shape::Square);
    let rendered = pipeline_with(BlockRasterizer::new())
        .render(&request, font())
        .unwrap();

    let report = &rendered.report;
    let bounds = report.ink_bounds.unwrap();
    let (max_w, max_h) = request.max_text_box();
    assert!(bounds.width() as f32 <= max_w, "{bounds:?}");
    assert!(bounds.height() as f32 <= max_h, "{bounds:?}");

    let left = bounds.min_x;
    let right = request.size as i32 - bounds.max_x;
    let top = bounds.min_y;
    let bottom = request.size as i32 - bounds.max_y;
    assert!((left - right).abs() <= 1, "left {left} right {right}");
    assert!((top - bottom).abs() <= 1, "top {top} bottom {bottom}");

    assert!(report.font_px > 0.0 && report.font_px < 256.0);
    assert_eq!(report.glyph_names, vec!["g65", "g66"]);
    assert!(report.skipped.is_empty());
}

#[test]
fn output_is_exactly_size_by_size() {
    let rendered = pipeline_with(BlockRasterizer::new())
        .render(&request("A", Shape::Circle), font())
        .unwrap();
    assert_eq!((rendered.bitmap.width, rendered.bitmap.height), (256, 256));
    assert_eq!(rendered.bitmap.data.len(), 256 * 256 * 4);
}

#[test]
fn square_corners_are_opaque_background() {
    let rendered = pipeline_with(BlockRasterizer::new())
        .render(&request("A", Shape::Square), font())
        .unwrap();
    let bitmap = &rendered.bitmap;
    for (x, y) in [(0, 0), (255, 0), (0, 255), (255, 255)] {
        let idx = ((y * 256 + x) * 4) as usize;
        assert_eq!(&bitmap.data[idx..idx + 4], &[0, 0, 0, 255]);
    }
}

#[test]
fn circle_corners_are_transparent() {
    let rendered = pipeline_with(BlockRasterizer::new())
        .render(&request("A", Shape::Circle), font())
        .unwrap();
    let bitmap = &rendered.bitmap;
    assert_eq!(alpha_at(bitmap, 0, 0), 0);
    assert_eq!(alpha_at(bitmap, 255, 255), 0);
    assert_eq!(alpha_at(bitmap, 128, 128), 255);
}

#[test]
fn missing_glyphs_are_skipped_not_fatal() {
    let rendered = pipeline_with(BlockRasterizer::new())
        .render(&request("A?B", Shape::Square), font())
        .unwrap();
    let report = rendered.report;
    assert_eq!(report.skipped, vec![MISSING_GLYPH]);
    assert_eq!(report.glyph_names, vec!["g65", "999", "g66"]);
    assert!(report.ink_bounds.is_some());
}

#[test]
fn blank_text_has_no_ink() {
    let err = pipeline_with(BlockRasterizer::new())
        .render(&request("  ", Shape::Square), font())
        .unwrap_err();
    assert!(matches!(err, HaloError::FitFailed(FitError::NoInk)));
}

#[test]
fn fit_gives_up_after_bounded_attempts() {
    let rasterizer = BlockRasterizer::stubborn(300);
    let calls = Arc::clone(&rasterizer.calls);
    let err = pipeline_with(rasterizer)
        .render(&request("A", Shape::Square), font())
        .unwrap_err();

    assert!(matches!(err, HaloError::FitFailed(FitError::DoesNotFit { .. })));
    // One reference pass plus the capped number of fitting passes
    assert_eq!(calls.load(Ordering::SeqCst), 1 + halo_core::fit::MAX_FIT_ATTEMPTS);
}

#[test]
fn identical_requests_render_identically() {
    let pipeline = pipeline_with(BlockRasterizer::new());
    let request = RenderRequest {
        glow_alpha: 190,
        ..request("AB", Shape::Circle)
    };
    let first = pipeline.render(&request, font()).unwrap();
    let second = pipeline.render(&request, font()).unwrap();
    assert_eq!(first.bitmap.data, second.bitmap.data);
    assert_eq!(first.report, second.report);
}

#[test]
fn process_writes_the_file_and_reports_it() {
    let path = scratch_path("nested/avatar.raw");
    let _ = std::fs::remove_file(&path);

    let report = pipeline_with(BlockRasterizer::new())
        .process(&request("A", Shape::Square), font(), &path)
        .unwrap();

    assert_eq!(report.output, path);
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 256 * 256 * 4);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn invalid_request_writes_nothing() {
    let path = scratch_path("never.raw");
    let _ = std::fs::remove_file(&path);

    let request = RenderRequest {
        margin: 128,
        ..request("A", Shape::Circle)
    };
    let err = pipeline_with(BlockRasterizer::new())
        .process(&request, font(), &path)
        .unwrap_err();

    assert!(matches!(err, HaloError::InvalidArgument(_)));
    assert!(!path.exists());
}
