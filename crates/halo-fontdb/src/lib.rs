//! Font loading for Halo
//!
//! The whole file is read into memory once and the handle is dropped right
//! away. Tables are parsed on demand from the owned bytes, which keeps TTC
//! collections working: every lookup goes through the selected face.

use std::fs;
use std::io;
use std::path::Path;

use read_fonts::{types::GlyphId16, FontRef as ReadFontRef, TableProvider};

use halo_core::{
    error::{FontLoadError, Result},
    traits::FontRef as HaloFontRef,
    types::GlyphId,
};

/// A font brought into memory, ready to shape and draw
pub struct Font {
    data: Vec<u8>,
    face_index: u32,
    units_per_em: u16,
}

impl Font {
    /// Open the first face of a font file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_index(path, 0)
    }

    /// Open a specific face of a font file (for TTC collections)
    pub fn from_file_index(path: impl AsRef<Path>, face_index: u32) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FontLoadError::FileNotFound(path.display().to_string()),
            _ => FontLoadError::FileNotFound(format!("{}: {}", path.display(), e)),
        })?;
        log::debug!("Read {} bytes from {}", data.len(), path.display());

        Self::from_data_index(data, face_index)
    }

    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        Self::from_data_index(data, 0)
    }

    /// Validate `data` as a font and keep it
    pub fn from_data_index(data: Vec<u8>, face_index: u32) -> Result<Self> {
        let font_ref =
            ReadFontRef::from_index(&data, face_index).map_err(|_| FontLoadError::InvalidData)?;

        let units_per_em = font_ref
            .head()
            .map(|head| head.units_per_em())
            .map_err(|_| FontLoadError::InvalidData)?;
        if units_per_em == 0 {
            return Err(FontLoadError::InvalidData.into());
        }

        Ok(Font {
            data,
            face_index,
            units_per_em,
        })
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    fn font_ref(&self) -> Option<ReadFontRef<'_>> {
        ReadFontRef::from_index(&self.data, self.face_index).ok()
    }

    /// Which glyph draws this character
    pub fn glyph_id(&self, ch: char) -> Option<GlyphId> {
        self.font_ref()
            .and_then(|font| font.cmap().ok()?.map_codepoint(ch).map(|gid| gid.to_u32()))
    }

    /// Number of glyphs the font declares in `maxp`
    pub fn glyph_count(&self) -> Option<u32> {
        self.font_ref()
            .and_then(|font| font.maxp().ok().map(|maxp| u32::from(maxp.num_glyphs())))
    }

    /// Glyph name from the `post` table
    ///
    /// Version 3 `post` tables carry no names, so this is `None` for many
    /// CFF fonts.
    pub fn glyph_name(&self, glyph_id: GlyphId) -> Option<String> {
        let gid = GlyphId16::new(u16::try_from(glyph_id).ok()?);
        let font = self.font_ref()?;
        let post = font.post().ok()?;
        post.glyph_name(gid).map(str::to_string)
    }
}

impl HaloFontRef for Font {
    fn data(&self) -> &[u8] {
        &self.data
    }

    fn face_index(&self) -> u32 {
        self.face_index
    }

    fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    fn glyph_id(&self, ch: char) -> Option<GlyphId> {
        self.glyph_id(ch)
    }

    fn glyph_count(&self) -> Option<u32> {
        self.glyph_count()
    }

    fn glyph_name(&self, glyph_id: GlyphId) -> Option<String> {
        self.glyph_name(glyph_id)
    }
}
