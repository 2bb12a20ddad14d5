//! Error types for Halo

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HaloError>;

/// Main error type for Halo
///
/// Every variant names the pipeline stage that failed, so the message printed
/// by the CLI is enough to tell where a render stopped.
#[derive(Debug, Error)]
pub enum HaloError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Font loading failed: {0}")]
    FontLoad(#[from] FontLoadError),

    #[error("Shaping failed: {0}")]
    ShapingFailed(#[from] ShapingError),

    #[error("Fit failed: {0}")]
    FitFailed(#[from] FitError),

    #[error("Rendering failed: {0}")]
    RenderingFailed(#[from] RenderError),

    #[error("Export failed: {0}")]
    ExportFailed(#[from] ExportError),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HaloError {
    /// Shorthand for argument validation failures
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Font loading errors
#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("Font file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid font data")]
    InvalidData,
}

/// Shaping errors
#[derive(Debug, Error)]
pub enum ShapingError {
    #[error("Text is empty")]
    EmptyText,

    #[error("No glyphs produced for {0:?}")]
    NoGlyphs(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Layout/fit errors
#[derive(Debug, Error)]
pub enum FitError {
    #[error("Computed scale is not positive: {0}")]
    NonPositiveScale(f32),

    #[error("Shaped text has no visible ink")]
    NoInk,

    #[error("Text of {width}x{height}px does not fit {max_width:.1}x{max_height:.1}px")]
    DoesNotFit {
        width: u32,
        height: u32,
        max_width: f32,
        max_height: f32,
    },
}

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Glyph {0} not found in font")]
    GlyphMissing(u32),

    #[error("Invalid font data")]
    InvalidFont,

    #[error("Outline extraction failed")]
    OutlineExtractionFailed,

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Format not supported: {0}")]
    FormatNotSupported(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_stage() {
        let err: HaloError = ShapingError::EmptyText.into();
        assert!(err.to_string().starts_with("Shaping failed"));

        let err: HaloError = FitError::NoInk.into();
        assert!(err.to_string().starts_with("Fit failed"));

        let err: HaloError = ExportError::FormatNotSupported("xyz".into()).into();
        assert_eq!(err.to_string(), "Export failed: Format not supported: xyz");

        let err = HaloError::invalid("margin too large");
        assert_eq!(err.to_string(), "Invalid argument: margin too large");
    }

    #[test]
    fn does_not_fit_reports_both_boxes() {
        let err = FitError::DoesNotFit {
            width: 120,
            height: 40,
            max_width: 100.0,
            max_height: 50.5,
        };
        assert_eq!(
            err.to_string(),
            "Text of 120x40px does not fit 100.0x50.5px"
        );
    }
}
