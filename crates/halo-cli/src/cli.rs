//! CLI argument definitions using Clap v4

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use halo_core::{
    features::DEFAULT_FEATURES, Color, FeatureSettings, RenderRequest, Result, Shape,
};

/// Halo - Render a short text into a glowing avatar image
#[derive(Parser, Debug)]
#[command(name = "halo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Text to render; `\u{XXXX}` and `\uXXXX` escapes are decoded
    #[arg(long, default_value = "{0xB}", allow_hyphen_values = true)]
    pub text: String,

    /// Avatar outline
    #[arg(long, value_enum, default_value_t = AvatarShape::Circle)]
    pub shape: AvatarShape,

    /// Side of the square output image in pixels
    #[arg(long, default_value_t = 1024)]
    pub size: u32,

    /// Gap between the image edge and the circle, in pixels
    #[arg(long, default_value_t = 72)]
    pub margin: u32,

    /// Font file path (.ttf, .otf, .ttc)
    #[arg(long)]
    pub font: PathBuf,

    /// OpenType feature settings (comma or space separated: tag=N, +tag, -tag)
    #[arg(long, default_value = DEFAULT_FEATURES, allow_hyphen_values = true)]
    pub features: String,

    /// Background color (RRGGBB or RRGGBBAA)
    #[arg(long, default_value = "#2E3440")]
    pub bg: String,

    /// Text color (RRGGBB or RRGGBBAA)
    #[arg(long, default_value = "#88C0D0")]
    pub fg: String,

    /// Glow color (RRGGBB or RRGGBBAA)
    #[arg(long, default_value = "#5E81AC")]
    pub glow: String,

    /// Glow opacity, 0 disables the glow
    #[arg(long, default_value_t = 190)]
    pub glow_alpha: u8,

    /// Glow blur radius in pixels
    #[arg(long, default_value_t = 8.0)]
    pub glow_blur: f32,

    /// Largest text width as a fraction of the image size
    #[arg(long, default_value_t = 0.72)]
    pub fit_width_ratio: f32,

    /// Largest text height as a fraction of the image size
    #[arg(long, default_value_t = 0.36)]
    pub fit_height_ratio: f32,

    /// Output file; the extension picks the format (png, jpg, bmp)
    #[arg(short = 'o', long, default_value = "avatar.png")]
    pub output: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Silent mode (no report)
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Supported avatar outlines
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum AvatarShape {
    /// Round avatar, transparent outside the circle
    Circle,
    /// Full-bleed square
    Square,
}

impl From<AvatarShape> for Shape {
    fn from(shape: AvatarShape) -> Self {
        match shape {
            AvatarShape::Circle => Shape::Circle,
            AvatarShape::Square => Shape::Square,
        }
    }
}

impl Cli {
    /// Turn parsed flags into a render request
    ///
    /// Only parsing happens here; range checks belong to
    /// [`RenderRequest::validate`].
    pub fn to_request(&self) -> Result<RenderRequest> {
        Ok(RenderRequest {
            text: decode_unicode_escapes(&self.text),
            font_path: self.font.clone(),
            shape: self.shape.into(),
            size: self.size,
            margin: self.margin,
            features: FeatureSettings::parse(&self.features)?,
            background: Color::from_hex(&self.bg)?,
            foreground: Color::from_hex(&self.fg)?,
            glow: Color::from_hex(&self.glow)?,
            glow_alpha: self.glow_alpha,
            glow_blur: self.glow_blur,
            fit_width_ratio: self.fit_width_ratio,
            fit_height_ratio: self.fit_height_ratio,
        })
    }
}

/// Decode `\u{X...}` and `\uXXXX` escapes, leaving anything malformed as typed
pub fn decode_unicode_escapes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("\\u") {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 2..];

        let decoded = if let Some(braced) = after.strip_prefix('{') {
            braced.find('}').and_then(|end| {
                let ch = u32::from_str_radix(&braced[..end], 16)
                    .ok()
                    .and_then(char::from_u32)?;
                Some((ch, 1 + end + 1))
            })
        } else {
            after
                .get(..4)
                .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .and_then(char::from_u32)
                .map(|ch| (ch, 4))
        };

        match decoded {
            Some((ch, consumed)) => {
                result.push(ch);
                rest = &after[consumed..];
            },
            None => {
                result.push_str("\\u");
                rest = after;
            },
        }
    }

    result.push_str(rest);
    result
}
