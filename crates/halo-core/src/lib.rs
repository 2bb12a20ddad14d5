//! Halo Core: text in, glowing avatar out
//!
//! One render runs a single linear pipeline, start to finish:
//!
//! 1. **Shaping** - Characters become positioned glyphs, with explicit
//!    OpenType feature control
//! 2. **Rasterizing** - Each glyph becomes a coverage bitmap
//! 3. **Layout/Fit** - The text is sized to the canvas and centered
//! 4. **Compositing** - Background, blurred glow, foreground and circle clip
//! 5. **Writing** - The finished canvas is encoded to an image file
//!
//! ## Wiring a pipeline
//!
//! ```rust,no_run
//! use halo_core::{AvatarPipeline, RenderRequest};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # use halo_core::traits::*;
//! # use halo_core::types::*;
//! # use halo_core::FeatureSettings;
//! # struct MyShaper;
//! # impl Shaper for MyShaper {
//! #     fn name(&self) -> &'static str { "test" }
//! #     fn shape(&self, _: &str, _: Arc<dyn FontRef>, _: f32, _: &FeatureSettings)
//! #         -> halo_core::Result<ShapingResult> { unimplemented!() }
//! # }
//! # struct MyRasterizer;
//! # impl Rasterizer for MyRasterizer {
//! #     fn name(&self) -> &'static str { "test" }
//! #     fn rasterize(&self, _: &Arc<dyn FontRef>, _: GlyphId, _: f32)
//! #         -> halo_core::Result<GlyphBitmap> { unimplemented!() }
//! # }
//! # struct MyExporter;
//! # impl Exporter for MyExporter {
//! #     fn name(&self) -> &'static str { "test" }
//! #     fn encode(&self, _: &BitmapData, _: &Path) -> halo_core::Result<Vec<u8>> { unimplemented!() }
//! # }
//! # fn load_font() -> Arc<dyn FontRef> { unimplemented!() }
//!
//! let pipeline = AvatarPipeline::builder()
//!     .shaper(Arc::new(MyShaper))
//!     .rasterizer(Arc::new(MyRasterizer))
//!     .exporter(Arc::new(MyExporter))
//!     .build()?;
//!
//! let request = RenderRequest::default();
//! let report = pipeline.process(&request, load_font(), Path::new("avatar.png"))?;
//! println!("rendered at {}px", report.font_px);
//! # Ok::<(), halo_core::HaloError>(())
//! ```
//!
//! Backends plug in through [`Shaper`], [`Rasterizer`] and [`Exporter`];
//! fonts through [`traits::FontRef`].

use std::fmt;
use std::str::FromStr;

pub mod composite;
pub mod error;
pub mod features;
pub mod fit;
pub mod pipeline;
pub mod request;
pub mod traits;

pub use error::{HaloError, Result};
pub use features::FeatureSettings;
pub use pipeline::{AvatarPipeline, AvatarPipelineBuilder, RenderReport};
pub use request::RenderRequest;
pub use traits::{Exporter, Rasterizer, Shaper};

/// The data structures passed between stages
pub mod types {
    /// Unique identifier for a glyph within a font
    pub type GlyphId = u32;

    /// A glyph placed on the pen line
    ///
    /// `x` and `y` are in pixels, y pointing up from the baseline.
    #[derive(Debug, Clone, PartialEq)]
    pub struct PositionedGlyph {
        pub id: GlyphId,
        pub x: f32,
        pub y: f32,
        pub advance: f32,
        pub cluster: u32,
    }

    /// Glyphs in shaping order, plus the pen travel they cover
    #[derive(Debug, Clone)]
    pub struct ShapingResult {
        pub glyphs: Vec<PositionedGlyph>,
        pub advance_width: f32,
        /// Pixel size the glyph positions were computed for
        pub size: f32,
    }

    /// Coverage raster for one glyph
    ///
    /// `left` is the offset from the pen position to the left edge, `top` the
    /// distance from the baseline up to the top row.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct GlyphBitmap {
        pub width: u32,
        pub height: u32,
        pub left: i32,
        pub top: i32,
        pub coverage: Vec<u8>,
    }

    impl GlyphBitmap {
        /// A bitmap with no ink, used for spaces and other blank glyphs
        pub fn empty() -> Self {
            Self::default()
        }

        pub fn is_empty(&self) -> bool {
            self.width == 0 || self.height == 0
        }

        /// Does any pixel carry coverage?
        pub fn has_ink(&self) -> bool {
            !self.is_empty() && self.coverage.iter().any(|&c| c > 0)
        }
    }

    /// Raw pixel data handed to exporters
    #[derive(Debug, Clone)]
    pub struct BitmapData {
        pub width: u32,
        pub height: u32,
        pub format: BitmapFormat,
        pub data: Vec<u8>,
    }

    /// How pixels are arranged in the bitmap
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum BitmapFormat {
        /// Straight (non-premultiplied) RGBA
        Rgba8,
        Gray8,
    }

    impl BitmapFormat {
        pub fn bytes_per_pixel(self) -> usize {
            match self {
                Self::Rgba8 => 4,
                Self::Gray8 => 1,
            }
        }
    }
}

/// Avatar outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Circle,
    Square,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Square => "square",
        }
    }
}

impl FromStr for Shape {
    type Err = HaloError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "circle" => Ok(Self::Circle),
            "square" => Ok(Self::Square),
            other => Err(HaloError::invalid(format!(
                "unsupported shape {other:?}, expected circle or square"
            ))),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simple RGBA color, straight alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Same color with a different alpha
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::rgba(self.r, self.g, self.b, a)
    }

    /// Parse `RRGGBB` or `RRGGBBAA`, with or without a leading `#`
    pub fn from_hex(value: &str) -> Result<Self> {
        let hex = value.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);

        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return Err(HaloError::invalid(format!(
                "expected a RRGGBB or RRGGBBAA hex color, got {value:?}"
            )));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| HaloError::invalid(format!("invalid hex color {value:?}")))
        };

        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Hex form, alpha included only when not opaque
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = HaloError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
