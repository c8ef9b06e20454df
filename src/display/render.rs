use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::json;
use tiny_skia::{BlendMode, Pixmap, PixmapPaint, Transform};

use super::Display;
use crate::animation::ValueField;
use crate::color::Color;
use crate::error_codes::{CodedError, SURFACE_ALLOCATION_FAILED};
use crate::paint::{fill, CellSize, TilePainter};
use crate::tile::{Tile, TileId};
use crate::viewport::RenderBounds;

const DIRTY_TINT: Color = Color::rgba(255, 0, 64, 96);

/// A transparent surface of `columns x rows` cells.
pub(super) fn allocate(columns: u32, rows: u32, cell: CellSize, label: &str) -> Result<Pixmap> {
    let width = columns.checked_mul(cell.width);
    let height = rows.checked_mul(cell.height);
    width
        .zip(height)
        .and_then(|(width, height)| Pixmap::new(width, height))
        .ok_or_else(|| {
            CodedError::resource(
                SURFACE_ALLOCATION_FAILED,
                format!(
                    "failed to allocate {label} for {columns}x{rows} cells of {}x{} px",
                    cell.width, cell.height
                ),
            )
            .with_details(json!({
                "surface": label,
                "columns": columns,
                "rows": rows,
                "cell_width": cell.width,
                "cell_height": cell.height,
            }))
            .into()
        })
}

impl Display {
    /// Whether `tile` would be drawn under the current visibility mask.
    ///
    /// The mask is read at the tile's cell and, while an x/y animation is in
    /// flight, at the cell it is heading for; the larger value wins. Fully
    /// visible cells always render, hidden ones never do, and partly explored
    /// ones only for tiles flagged `always_render_if_explored`. Cells outside
    /// the world have no data and never render.
    pub fn should_render_tile(&self, tile: &Tile) -> bool {
        let (x, y) = tile.cell();
        let mut value = self.visibility_at(x, y);

        if let Some((tx, ty)) = self.projected_cell(tile) {
            value = match (value, self.visibility_at(tx, ty)) {
                (Some(current), Some(target)) => Some(current.max(target)),
                (current, target) => current.or(target),
            };
        }

        match value {
            None => false,
            Some(value) if value >= 1.0 => true,
            Some(value) if value <= 0.0 => false,
            Some(_) => tile.always_render_if_explored,
        }
    }

    /// Like [`Display::should_render_tile`], by id.
    pub fn is_tile_rendered(&self, id: TileId) -> bool {
        self.tiles
            .get(&id)
            .is_some_and(|tile| self.should_render_tile(tile))
    }

    fn visibility_at(&self, x: i64, y: i64) -> Option<f64> {
        if !self.in_world(x, y) {
            return None;
        }
        match &self.visibility {
            Some(mask) => mask.get(x, y),
            None => Some(1.0),
        }
    }

    /// Current cell shifted by the displacement of any running x/y animation.
    fn projected_cell(&self, tile: &Tile) -> Option<(i64, i64)> {
        let instance = self.values.get(tile.id).filter(|instance| instance.is_running())?;
        let displacement = |field: ValueField| {
            if instance.is_field_finished(field) {
                return 0.0;
            }
            instance
                .timeline(field)
                .map_or(0.0, |timeline| timeline.bounds.displacement())
        };
        let (dx, dy) = (displacement(ValueField::X), displacement(ValueField::Y));
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        Some(((tile.x + dx).round() as i64, (tile.y + dy).round() as i64))
    }

    /// Repaints the render window: moves it if the viewport drifted near its
    /// edge, then draws every visible tile cell by cell in z order and lays
    /// the visibility overlay on top.
    pub fn update_render_canvas(&mut self) -> Result<()> {
        let view = self.viewport.viewport();
        let (world_width, world_height) = (self.config.world_width, self.config.world_height);
        if self.bounds.needs_recenter(
            &view,
            world_width,
            world_height,
            self.viewport.is_transitioning(),
        ) {
            self.recenter(RenderBounds::around(&view, world_width, world_height))?;
        }
        if self.mask_stale {
            self.rebuild_mask_overlay();
        }

        let bounds = self.bounds;
        let mut visible = self
            .tiles
            .values()
            .filter(|tile| {
                let (x, y) = tile.cell();
                bounds.contains_cell(x, y) && self.should_render_tile(tile)
            })
            .map(|tile| (tile.z_index, tile.id))
            .collect::<Vec<_>>();
        visible.sort_by_key(|(z, _)| *z);

        let mut cells: BTreeMap<(i64, i64), Vec<TileId>> = BTreeMap::new();
        for (_, id) in visible {
            if let Some(tile) = self.tiles.get(&id) {
                let (x, y) = tile.cell();
                cells.entry((y, x)).or_default().push(id);
            }
        }

        self.canvas.fill(tiny_skia::Color::TRANSPARENT);
        let cell = self.cell;
        let mut painter = TilePainter {
            cell,
            glyphs: self.glyphs.as_mut(),
            default_family: self.config.font_family.as_deref(),
        };
        for ((y, x), ids) in &cells {
            let left = ((x - bounds.x) * i64::from(cell.width)) as f32;
            let top = ((y - bounds.y) * i64::from(cell.height)) as f32;
            for id in ids {
                if let Some(tile) = self.tiles.get(id) {
                    painter.paint(&mut self.canvas, &mut self.scratch, tile, left, top);
                }
            }
        }

        if self.visibility.is_some() {
            self.canvas.draw_pixmap(
                0,
                0,
                self.mask_overlay.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
        Ok(())
    }

    fn recenter(&mut self, bounds: RenderBounds) -> Result<()> {
        if bounds.width != self.bounds.width || bounds.height != self.bounds.height {
            self.canvas = allocate(bounds.width, bounds.height, self.cell, "render canvas")?;
            self.mask_overlay = allocate(bounds.width, bounds.height, self.cell, "visibility overlay")?;
        }
        self.logger.debug(&format!(
            "render window moved to ({}, {}) {}x{}",
            bounds.x, bounds.y, bounds.width, bounds.height
        ));
        self.bounds = bounds;
        self.mask_stale = true;
        Ok(())
    }

    /// Darkness per window cell: alpha `1 - visibility`, opaque black where
    /// the mask has no data.
    fn rebuild_mask_overlay(&mut self) {
        self.mask_overlay.fill(tiny_skia::Color::TRANSPARENT);
        self.mask_stale = false;
        let Some(mask) = &self.visibility else {
            return;
        };

        let bounds = self.bounds;
        let cell = self.cell;
        for row in 0..i64::from(bounds.height) {
            for column in 0..i64::from(bounds.width) {
                let darkness = mask
                    .get(bounds.x + column, bounds.y + row)
                    .map_or(1.0, |value| 1.0 - value);
                if darkness <= 0.0 {
                    continue;
                }
                fill(
                    &mut self.mask_overlay,
                    (column * i64::from(cell.width)) as f32,
                    (row * i64::from(cell.height)) as f32,
                    cell.width as f32,
                    cell.height as f32,
                    Color::BLACK.with_alpha((darkness * 255.0).round() as u8),
                    BlendMode::Source,
                );
            }
        }
    }

    /// Copies the viewport part of the render window into the output surface.
    pub(super) fn blit(&mut self) {
        let view = self.viewport.viewport();
        let offset_x = (view.x - self.bounds.x as f64) * f64::from(self.cell.width);
        let offset_y = (view.y - self.bounds.y as f64) * f64::from(self.cell.height);

        self.output.fill(tiny_skia::Color::BLACK);
        self.output.draw_pixmap(
            0,
            0,
            self.canvas.as_ref(),
            &PixmapPaint::default(),
            Transform::from_translate(-offset_x as f32, -offset_y as f32),
            None,
        );
    }

    pub(super) fn draw_dirty_overlay(&mut self) {
        let view = self.viewport.viewport();
        let cell = self.cell;
        let cells = self
            .dirty
            .dirty_cells()
            .filter(|(x, y)| view.contains_cell(i64::from(*x), i64::from(*y)))
            .collect::<Vec<_>>();
        for (x, y) in cells {
            fill(
                &mut self.output,
                ((f64::from(x) - view.x) * f64::from(cell.width)) as f32,
                ((f64::from(y) - view.y) * f64::from(cell.height)) as f32,
                cell.width as f32,
                cell.height as f32,
                DIRTY_TINT,
                BlendMode::SourceOver,
            );
        }
    }
}
