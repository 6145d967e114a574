//! Resolved page objects: fonts, images, glyph runs, viewports.

use bytes::Bytes;

use crate::utils::Matrix;

/// A font resolved from the document-wide object store.
///
/// The renderer never decodes font files; it only forwards enough
/// metadata to place glyphs and optionally embed the raw file through a
/// CSS `@font-face` rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontObject {
    /// Unique name the upstream font loader assigned, used as the SVG
    /// `font-family`.
    pub loaded_name: String,
    /// Font units to text space scale, if the font overrides the 0.001
    /// default.
    pub font_matrix: Option<Matrix>,
    /// Vertical writing mode.
    pub vertical: bool,
    pub bold: bool,
    pub black: bool,
    pub italic: bool,
    /// Fallback vertical metrics `[w1, vx, vy]` for glyphs without their
    /// own.
    pub default_vmetrics: Option<[f64; 3]>,
    /// The font program could not be loaded; glyphs are still placed.
    pub missing_file: bool,
    /// Raw font file bytes, when embedding is possible.
    pub data: Option<Bytes>,
    pub mimetype: Option<String>,
}

/// Pixel layout of decoded image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Gray1bpp = 1,
    Rgb24bpp = 2,
    Rgba32bpp = 3,
}

impl ImageKind {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Gray1bpp),
            2 => Some(Self::Rgb24bpp),
            3 => Some(Self::Rgba32bpp),
            _ => None,
        }
    }
}

/// Decoded raster image data.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub kind: ImageKind,
    /// Packed pixel rows; 1-bpp rows are padded to byte boundaries.
    pub data: Bytes,
    /// Backed by a platform bitmap instead of pixel data. Rejected by
    /// the encoder.
    pub bitmap: bool,
}

/// One element of a `showText` argument sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum TextItem {
    /// A `null` entry: advance by word spacing only.
    WordBreak,
    /// Positioning adjustment in thousandths of text space.
    Adjust(f64),
    Glyph(Glyph),
}

/// A positioned glyph from the upstream font machinery.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Character(s) to place in the output `<tspan>`.
    pub font_char: String,
    pub is_space: bool,
    /// Whether the glyph maps to a drawable entry of the font; glyphs
    /// outside the font are dropped from the output.
    pub is_in_font: bool,
    /// Advance width in font units.
    pub width: f64,
    /// Vertical metrics `[w1, vx, vy]`, present for vertical fonts.
    pub vmetric: Option<[f64; 3]>,
}

/// Per-page render target: size and the base device transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub transform: Matrix,
}

impl Viewport {
    pub fn new(width: f64, height: f64, transform: Matrix) -> Self {
        Self {
            width,
            height,
            transform,
        }
    }
}
