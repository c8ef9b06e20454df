//! Per-cell painting: background fill, walls, and the transformed glyph.

use tiny_skia::{BlendMode, Paint, Pixmap, PixmapPaint, Rect, Transform};

use crate::color::Color;
use crate::glyphs::{GlyphMask, GlyphRenderer, GlyphStyle};
use crate::tile::{FillDirection, Tile, Walls};

/// Glyph size relative to the cell height.
pub const GLYPH_SCALE: f32 = 0.85;
/// Wall strip thickness relative to the shorter cell side.
pub const WALL_THICKNESS: f32 = 0.15;

/// Device-pixel size of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

impl CellSize {
    fn w(self) -> f32 {
        self.width as f32
    }

    fn h(self) -> f32 {
        self.height as f32
    }
}

pub struct TilePainter<'a> {
    pub cell: CellSize,
    pub glyphs: &'a mut dyn GlyphRenderer,
    pub default_family: Option<&'a str>,
}

impl TilePainter<'_> {
    /// Paints `tile` with its cell's top-left at `(left, top)` in `target`.
    ///
    /// Clipped tiles are drawn into `scratch` first and then composited with
    /// the tile's blend mode, so nothing leaks into neighbouring cells.
    pub fn paint(&mut self, target: &mut Pixmap, scratch: &mut Pixmap, tile: &Tile, left: f32, top: f32) {
        let blend = tile.blend_mode.to_skia();
        if tile.no_clip {
            self.paint_layers(target, tile, left, top, blend);
            return;
        }

        scratch.fill(tiny_skia::Color::TRANSPARENT);
        self.paint_layers(scratch, tile, 0.0, 0.0, BlendMode::SourceOver);
        let paint = PixmapPaint {
            blend_mode: blend,
            ..PixmapPaint::default()
        };
        target.draw_pixmap(
            0,
            0,
            scratch.as_ref(),
            &paint,
            Transform::from_translate(left, top),
            None,
        );
    }

    fn paint_layers(&mut self, target: &mut Pixmap, tile: &Tile, left: f32, top: f32, blend: BlendMode) {
        self.paint_background(target, tile, left, top, blend);
        if let Some(walls) = tile.walls.as_ref().filter(|walls| walls.any()) {
            self.paint_walls(target, walls, left, top, blend);
        }
        self.paint_glyph(target, tile, left, top, blend);
    }

    fn paint_background(&self, target: &mut Pixmap, tile: &Tile, left: f32, top: f32, blend: BlendMode) {
        if tile.bg.is_transparent() || tile.bg_percent <= 0.0 {
            return;
        }
        let fraction = tile.bg_percent.clamp(0.0, 1.0) as f32;
        let (w, h) = (self.cell.w(), self.cell.h());
        let (x, y, width, height) = match tile.fill_direction {
            FillDirection::Top => (0.0, 0.0, w, h * fraction),
            FillDirection::Bottom => (0.0, h * (1.0 - fraction), w, h * fraction),
            FillDirection::Left => (0.0, 0.0, w * fraction, h),
            FillDirection::Right => (w * (1.0 - fraction), 0.0, w * fraction, h),
        };
        fill(target, left + x, top + y, width, height, tile.bg, blend);
    }

    fn paint_walls(&self, target: &mut Pixmap, walls: &Walls, left: f32, top: f32, blend: BlendMode) {
        let thickness = (self.cell.w().min(self.cell.h()) * WALL_THICKNESS).round().max(1.0);
        let half = thickness / 2.0;
        let (w, h) = (self.cell.w(), self.cell.h());

        if walls.north {
            fill(target, left, top, w, thickness, walls.north_color, blend);
            if let Some(overlay) = walls.north_overlay {
                fill(target, left, top + half, w, thickness - half, overlay, blend);
            }
        }
        if walls.west {
            fill(target, left, top, thickness, h, walls.west_color, blend);
            if let Some(overlay) = walls.west_overlay {
                fill(target, left + half, top, thickness - half, h, overlay, blend);
            }
        }
    }

    fn paint_glyph(&mut self, target: &mut Pixmap, tile: &Tile, left: f32, top: f32, blend: BlendMode) {
        if tile.glyph.is_empty() || tile.fg.is_transparent() {
            return;
        }
        let style = GlyphStyle {
            weight: tile.font.weight.unwrap_or_default(),
            style: tile.font.style.unwrap_or_default(),
            family: tile.font.family.as_deref().or(self.default_family),
        };
        let Some(mask) = self
            .glyphs
            .rasterize(&tile.glyph, self.cell.h() * GLYPH_SCALE, &style)
        else {
            return;
        };
        let Some(tinted) = tint(&mask, tile.fg) else {
            return;
        };

        let (w, h) = (self.cell.w(), self.cell.h());
        let transform = Transform::from_translate(left + w / 2.0, top + h / 2.0)
            .pre_concat(Transform::from_rotate(tile.rotation.to_degrees() as f32))
            .pre_scale(tile.scale_x as f32, tile.scale_y as f32)
            .pre_translate(
                tile.offset_symbol_x as f32 * w + mask.left,
                tile.offset_symbol_y as f32 * h + mask.top,
            );
        let paint = PixmapPaint {
            blend_mode: blend,
            ..PixmapPaint::default()
        };
        target.draw_pixmap(0, 0, tinted.as_ref(), &paint, transform, None);
    }
}

/// Fills a rectangle, silently skipping empty or invalid ones.
pub fn fill(target: &mut Pixmap, x: f32, y: f32, width: f32, height: f32, color: Color, blend: BlendMode) {
    let Some(rect) = Rect::from_xywh(x, y, width, height) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.blend_mode = blend;
    paint.anti_alias = false;
    target.fill_rect(rect, &paint, Transform::identity(), None);
}

/// Premultiplied pixmap of `mask` coverage in `color`.
fn tint(mask: &GlyphMask, color: Color) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(mask.width, mask.height)?;
    let alpha = u32::from(color.alpha());
    for (pixel, coverage) in pixmap
        .data_mut()
        .chunks_exact_mut(4)
        .zip(mask.coverage.iter().copied())
    {
        let a = u32::from(coverage) * alpha / 255;
        pixel[0] = (u32::from(color.r) * a / 255) as u8;
        pixel[1] = (u32::from(color.g) * a / 255) as u8;
        pixel[2] = (u32::from(color.b) * a / 255) as u8;
        pixel[3] = a as u8;
    }
    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use tiny_skia::Pixmap;

    use super::{CellSize, TilePainter};
    use crate::color::Color;
    use crate::glyphs::BlockGlyphs;
    use crate::tile::{BlendMode, FillDirection, Tile, TileConfig, TileId, Walls};

    fn rgba(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let pixel = pixmap.pixel(x, y).expect("pixel in range").demultiply();
        [pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()]
    }

    fn tile(glyph: &str, config: TileConfig) -> Tile {
        Tile::new(
            TileId::next(),
            0.0,
            0.0,
            glyph,
            Color::rgb(0, 255, 0),
            Color::rgb(255, 0, 0),
            0,
            &config,
        )
    }

    fn paint(tile: &Tile, target: &mut Pixmap) {
        let cell = CellSize {
            width: 10,
            height: 10,
        };
        let mut glyphs = BlockGlyphs::new();
        let mut scratch = Pixmap::new(10, 10).expect("scratch");
        let mut painter = TilePainter {
            cell,
            glyphs: &mut glyphs,
            default_family: None,
        };
        painter.paint(target, &mut scratch, tile, 10.0, 0.0);
    }

    #[test]
    fn partial_background_fills_from_the_bottom() {
        let mut target = Pixmap::new(30, 10).expect("target");
        let tile = tile(
            " ",
            TileConfig {
                bg_percent: Some(0.5),
                fill_direction: Some(FillDirection::Bottom),
                ..TileConfig::default()
            },
        );
        paint(&tile, &mut target);
        assert_eq!(rgba(&target, 12, 2)[3], 0);
        assert_eq!(rgba(&target, 12, 8), [255, 0, 0, 255]);
        assert_eq!(rgba(&target, 22, 8)[3], 0);
    }

    #[test]
    fn glyph_is_centered_and_tinted() {
        let mut target = Pixmap::new(30, 10).expect("target");
        paint(&tile("@", TileConfig::default()), &mut target);
        assert_eq!(rgba(&target, 15, 5), [0, 255, 0, 255]);
        assert_eq!(rgba(&target, 10, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn clipped_offset_glyph_stays_inside_its_cell() {
        let mut target = Pixmap::new(30, 10).expect("target");
        let tile = tile(
            "@",
            TileConfig {
                offset_symbol_x: Some(0.5),
                ..TileConfig::default()
            },
        );
        paint(&tile, &mut target);
        assert_eq!(rgba(&target, 21, 5)[3], 0);

        let mut unclipped = Pixmap::new(30, 10).expect("target");
        let tile = Tile {
            no_clip: true,
            ..tile
        };
        paint(&tile, &mut unclipped);
        assert_eq!(rgba(&unclipped, 21, 5), [0, 255, 0, 255]);
    }

    #[test]
    fn north_wall_paints_a_strip_with_overlay() {
        let mut target = Pixmap::new(30, 10).expect("target");
        let tile = tile(
            "",
            TileConfig {
                walls: Some(Walls {
                    north: true,
                    north_color: Color::rgb(0, 0, 255),
                    north_overlay: Some(Color::WHITE),
                    ..Walls::default()
                }),
                ..TileConfig::default()
            },
        );
        paint(&tile, &mut target);
        assert_eq!(rgba(&target, 15, 0), [0, 0, 255, 255]);
        assert_eq!(rgba(&target, 15, 1), [255, 255, 255, 255]);
        assert_eq!(rgba(&target, 15, 5)[3], 0);
    }

    #[test]
    fn blend_mode_applies_when_compositing_the_cell() {
        let mut target = Pixmap::new(30, 10).expect("target");
        target.fill(tiny_skia::Color::from_rgba8(255, 255, 255, 255));
        let tile = tile(
            " ",
            TileConfig {
                blend_mode: Some(BlendMode::Multiply),
                ..TileConfig::default()
            },
        );
        paint(&tile, &mut target);
        assert_eq!(rgba(&target, 15, 5), [255, 0, 0, 255]);
        assert_eq!(rgba(&target, 5, 5), [255, 255, 255, 255]);
    }
}
