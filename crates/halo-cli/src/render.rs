//! The render command: flags in, avatar file and report out

use std::sync::Arc;

use serde::Serialize;

use halo_core::{AvatarPipeline, HaloError, RenderReport, Result};
use halo_export::ImageExporter;
use halo_fontdb::Font;
use halo_render_zeno::ZenoRasterizer;
use halo_shape_hr::HarfrustShaper;

use crate::cli::Cli;

pub fn run(cli: &Cli) -> Result<()> {
    let request = cli.to_request()?;
    // Reject bad geometry before paying for the font read
    request.validate()?;

    let font = Font::from_file(&request.font_path)?;
    log::debug!(
        "Loaded {} (face {})",
        request.font_path.display(),
        font.face_index()
    );

    let pipeline = AvatarPipeline::builder()
        .shaper(Arc::new(HarfrustShaper::new()))
        .rasterizer(Arc::new(ZenoRasterizer::new()))
        .exporter(Arc::new(ImageExporter::new()))
        .build()?;

    let report = pipeline.process(&request, Arc::new(font), &cli.output)?;

    if cli.quiet {
        return Ok(());
    }
    if cli.json {
        let json = serde_json::to_string_pretty(&JsonReport::from(&report))
            .map_err(|e| HaloError::Pipeline(format!("report serialization failed: {e}")))?;
        println!("{json}");
    } else {
        print!("{}", format_report(&report));
    }
    Ok(())
}

/// Plain text report, one `key: value` per line
pub fn format_report(report: &RenderReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("wrote: {}\n", report.output.display()));
    out.push_str(&format!("font_px: {:.2}\n", report.font_px));
    out.push_str(&format!("features: {}\n", report.features));
    out.push_str(&format!("glyphs: [{}]\n", report.glyph_names.join(", ")));
    if !report.skipped.is_empty() {
        let skipped: Vec<String> = report.skipped.iter().map(u32::to_string).collect();
        out.push_str(&format!("skipped: [{}]\n", skipped.join(", ")));
    }
    out
}

#[derive(Debug, Serialize)]
struct JsonFeature<'a> {
    tag: &'a str,
    value: u32,
}

/// `--json` output
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    wrote: String,
    width: u32,
    height: u32,
    font_px: f32,
    features: Vec<JsonFeature<'a>>,
    glyphs: &'a [String],
    glyph_ids: &'a [u32],
    skipped: &'a [u32],
    /// `[min_x, min_y, max_x, max_y]` on the canvas
    ink_bounds: Option<[i32; 4]>,
    fit_attempts: usize,
}

impl<'a> From<&'a RenderReport> for JsonReport<'a> {
    fn from(report: &'a RenderReport) -> Self {
        Self {
            wrote: report.output.display().to_string(),
            width: report.width,
            height: report.height,
            font_px: report.font_px,
            features: report
                .features
                .iter()
                .map(|(tag, value)| JsonFeature { tag, value })
                .collect(),
            glyphs: &report.glyph_names,
            glyph_ids: &report.glyph_ids,
            skipped: &report.skipped,
            ink_bounds: report
                .ink_bounds
                .map(|b| [b.min_x, b.min_y, b.max_x, b.max_y]),
            fit_attempts: report.fit_attempts,
        }
    }
}
