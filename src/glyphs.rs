//! Glyph coverage for tile symbols.
//!
//! The compositor never rasterizes text itself; it asks a [`GlyphRenderer`]
//! for an 8-bit coverage mask positioned relative to the cell center and
//! tints it with the tile's foreground color.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use fontdue::{Font, FontSettings};
use serde::{Deserialize, Serialize};

use crate::tile::{FontStyle, FontWeight};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphStyle<'a> {
    pub weight: FontWeight,
    pub style: FontStyle,
    pub family: Option<&'a str>,
}

/// Coverage bitmap; `left`/`top` place its top-left corner relative to the
/// cell center, in pixels, y down.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphMask {
    pub width: u32,
    pub height: u32,
    pub left: f32,
    pub top: f32,
    pub coverage: Vec<u8>,
}

pub trait GlyphRenderer {
    /// Rasterizes the first codepoint of `glyph` at `px` pixels, or `None`
    /// when there is nothing visible to draw.
    fn rasterize(&mut self, glyph: &str, px: f32, style: &GlyphStyle<'_>) -> Option<Rc<GlyphMask>>;
}

/// Draws every visible glyph as a solid centered block. Used when no font is
/// configured so scenes still produce legible output.
#[derive(Debug, Default)]
pub struct BlockGlyphs {
    cache: HashMap<u32, Rc<GlyphMask>>,
}

impl BlockGlyphs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GlyphRenderer for BlockGlyphs {
    fn rasterize(&mut self, glyph: &str, px: f32, _style: &GlyphStyle<'_>) -> Option<Rc<GlyphMask>> {
        let ch = glyph.chars().next()?;
        if ch.is_whitespace() || !px.is_finite() || px <= 0.0 {
            return None;
        }
        let side = (px * 0.6).round().max(1.0) as u32;
        let mask = self.cache.entry(side).or_insert_with(|| {
            Rc::new(GlyphMask {
                width: side,
                height: side,
                left: -(side as f32) / 2.0,
                top: -(side as f32) / 2.0,
                coverage: vec![255; (side * side) as usize],
            })
        });
        Some(Rc::clone(mask))
    }
}

/// What a face offers to style requests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceInfo {
    pub family: Option<String>,
    pub weight: FontWeight,
    pub style: FontStyle,
}

struct FontFace {
    info: FaceInfo,
    font: Font,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    face: usize,
    ch: char,
    px_bits: u32,
}

/// `fontdue`-backed renderer holding one or more font faces.
///
/// The first face is the fallback. A style request picks the face matching
/// family, weight and style; failing that the best partial match.
pub struct FontGlyphs {
    faces: Vec<FontFace>,
    cache: HashMap<CacheKey, Option<Rc<GlyphMask>>>,
}

impl FontGlyphs {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let font = parse_font(bytes, "default font")?;
        Ok(Self {
            faces: vec![FontFace {
                info: FaceInfo::default(),
                font,
            }],
            cache: HashMap::new(),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font file {}", path.display()))?;
        Self::from_bytes(bytes).with_context(|| format!("failed to load font {}", path.display()))
    }

    /// Registers another face for `family`/`weight`/`style` requests.
    pub fn add_face(&mut self, info: FaceInfo, bytes: Vec<u8>) -> Result<()> {
        let font = parse_font(bytes, info.family.as_deref().unwrap_or("unnamed face"))?;
        self.faces.push(FontFace { info, font });
        self.cache.clear();
        Ok(())
    }

    pub fn add_face_from_path(&mut self, info: FaceInfo, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font file {}", path.display()))?;
        self.add_face(info, bytes)
            .with_context(|| format!("failed to load font {}", path.display()))
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn faces(&self) -> impl Iterator<Item = &FaceInfo> + '_ {
        self.faces.iter().map(|face| &face.info)
    }
}

/// Index of the face best matching `style`. Family outranks weight, weight
/// outranks slant; earlier faces win ties. Empty input selects 0.
pub fn select_face<'a>(
    faces: impl IntoIterator<Item = &'a FaceInfo>,
    style: &GlyphStyle<'_>,
) -> usize {
    faces
        .into_iter()
        .enumerate()
        .max_by_key(|(index, face)| {
            let family = match (style.family, face.family.as_deref()) {
                (Some(wanted), Some(have)) if wanted.eq_ignore_ascii_case(have) => 4,
                (None, None) => 4,
                _ => 0,
            };
            let weight = u8::from(face.weight == style.weight) * 2;
            let slant = u8::from(face.style == style.style);
            (family + weight + slant, std::cmp::Reverse(*index))
        })
        .map_or(0, |(index, _)| index)
}

impl GlyphRenderer for FontGlyphs {
    fn rasterize(&mut self, glyph: &str, px: f32, style: &GlyphStyle<'_>) -> Option<Rc<GlyphMask>> {
        let ch = glyph.chars().next()?;
        if !px.is_finite() || px <= 0.0 {
            return None;
        }
        let key = CacheKey {
            face: select_face(self.faces(), style),
            ch,
            px_bits: px.to_bits(),
        };
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let font = &self.faces[key.face].font;
        let (metrics, coverage) = font.rasterize(ch, px);
        let mask = if metrics.width == 0 || metrics.height == 0 {
            None
        } else {
            let (ascent, descent) = font
                .horizontal_line_metrics(px)
                .map_or((px * 0.8, -px * 0.2), |line| (line.ascent, line.descent));
            let baseline = (ascent + descent) / 2.0;
            Some(Rc::new(GlyphMask {
                width: metrics.width as u32,
                height: metrics.height as u32,
                left: metrics.xmin as f32 - metrics.advance_width / 2.0,
                top: baseline - metrics.ymin as f32 - metrics.height as f32,
                coverage,
            }))
        };
        self.cache.insert(key, mask.clone());
        mask
    }
}

fn parse_font(bytes: Vec<u8>, label: &str) -> Result<Font> {
    Font::from_bytes(bytes, FontSettings::default())
        .map_err(|error| anyhow!("failed to parse {label}: {error}"))
}
