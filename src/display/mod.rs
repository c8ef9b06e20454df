//! The tile store and compositor.
//!
//! A [`Display`] owns every tile, the three animation engines, the viewport
//! and the backing surfaces. Each frame advances the viewport transition and
//! the engines, repaints the render window when something changed, and blits
//! the visible part into the output surface.

mod clock;
mod input;
mod metrics;
mod render;
mod strings;

use std::collections::{BTreeMap, HashMap};
use std::mem;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, Result};
use tiny_skia::Pixmap;

use crate::animation::{
    ColorAnimation, ColorAnimationEngine, SymbolAnimation, SymbolAnimationEngine, ValueAnimation,
    ValueAnimationEngine,
};
use crate::color::Color;
use crate::config::DisplayConfig;
use crate::dirty_mask::DirtyMask;
use crate::glyphs::{BlockGlyphs, GlyphRenderer};
use crate::logging::Logger;
use crate::paint::CellSize;
use crate::text_segments::ColorAliases;
use crate::tile::{Tile, TileConfig, TileId, TileUpdate};
use crate::viewport::{RenderBounds, Viewport, ViewportController, ViewportOptions};
use crate::visibility::VisibilityMask;

pub use clock::{FrameClock, IntervalClock, SteppedClock};
pub use input::{CellCallback, CellEvent, PointerButton, PointerEvent};
pub use metrics::{AnimationCounts, PerformanceMetrics};
pub use strings::{Reveal, StringOptions, WrapOptions, WrappedString};

use input::PointerHandlers;
use metrics::FrameStats;

pub type FrameCallback = Box<dyn FnMut(&mut Display, f64)>;
/// Called with the tile, its previous position and its new one.
pub type MoveCallback = Box<dyn FnMut(TileId, (f64, f64), (f64, f64))>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameCallbackId(u64);

/// z-index of the layer written by [`Display::set_background`].
pub const BACKGROUND_Z: i32 = -1;

#[derive(Default)]
struct FrameCallbacks {
    entries: Vec<(FrameCallbackId, FrameCallback)>,
    next_id: u64,
    /// Ids taken out of `entries` for the dispatch in progress.
    dispatching: Vec<FrameCallbackId>,
    removed_while_dispatching: Vec<FrameCallbackId>,
}

pub struct Display {
    config: DisplayConfig,
    logger: Rc<dyn Logger>,
    tiles: BTreeMap<TileId, Tile>,
    background: Vec<TileId>,
    move_callbacks: HashMap<TileId, MoveCallback>,
    color_aliases: ColorAliases,
    symbols: SymbolAnimationEngine,
    colors: ColorAnimationEngine,
    values: ValueAnimationEngine,
    viewport: ViewportController,
    bounds: RenderBounds,
    visibility: Option<VisibilityMask>,
    dirty: DirtyMask,
    show_dirty_mask: bool,
    changed: bool,
    mask_stale: bool,
    cell: CellSize,
    glyphs: Box<dyn GlyphRenderer>,
    canvas: Pixmap,
    mask_overlay: Pixmap,
    scratch: Pixmap,
    output: Pixmap,
    frame_callbacks: FrameCallbacks,
    input: PointerHandlers,
    running: bool,
    last_timestamp: f64,
    stats: FrameStats,
}

impl Display {
    /// Validates `config` and allocates every surface. Glyphs are drawn as
    /// blocks until a real renderer is supplied with [`Display::with_glyphs`].
    pub fn new(config: DisplayConfig, logger: Rc<dyn Logger>) -> Result<Self> {
        Self::with_glyphs(config, logger, Box::new(BlockGlyphs::new()))
    }

    pub fn with_glyphs(
        config: DisplayConfig,
        logger: Rc<dyn Logger>,
        glyphs: Box<dyn GlyphRenderer>,
    ) -> Result<Self> {
        config.validate().context("invalid display configuration")?;

        let (cell_width, cell_height) = config.cell_pixels();
        let cell = CellSize {
            width: cell_width,
            height: cell_height,
        };
        let viewport = ViewportController::new(
            config.viewport_width,
            config.viewport_height,
            config.world_width,
            config.world_height,
        );
        let view = viewport.viewport();
        let bounds = RenderBounds::around(&view, config.world_width, config.world_height);

        let canvas = render::allocate(bounds.width, bounds.height, cell, "render canvas")?;
        let mask_overlay = render::allocate(bounds.width, bounds.height, cell, "visibility overlay")?;
        let scratch = render::allocate(1, 1, cell, "cell scratch surface")?;
        let output = render::allocate(view.width, view.height, cell, "output surface")?;

        logger.debug(&format!(
            "display '{}' ready: world {}x{}, viewport {}x{}, cell {}x{} px",
            config.surface_id,
            config.world_width,
            config.world_height,
            view.width,
            view.height,
            cell.width,
            cell.height
        ));

        Ok(Self {
            dirty: DirtyMask::new(config.world_width, config.world_height, Rc::clone(&logger)),
            symbols: SymbolAnimationEngine::new(Rc::clone(&logger)),
            colors: ColorAnimationEngine::new(Rc::clone(&logger)),
            values: ValueAnimationEngine::new(Rc::clone(&logger)),
            config,
            logger,
            tiles: BTreeMap::new(),
            background: Vec::new(),
            move_callbacks: HashMap::new(),
            color_aliases: ColorAliases::new(),
            viewport,
            bounds,
            visibility: None,
            show_dirty_mask: false,
            changed: true,
            mask_stale: true,
            cell,
            glyphs,
            canvas,
            mask_overlay,
            scratch,
            output,
            frame_callbacks: FrameCallbacks::default(),
            input: PointerHandlers::default(),
            running: false,
            last_timestamp: 0.0,
            stats: FrameStats::default(),
        })
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Timestamp (ms) of the last frame.
    pub fn clock(&self) -> f64 {
        self.last_timestamp
    }

    /// The viewport-sized image produced by the last frame.
    pub fn output(&self) -> &Pixmap {
        &self.output
    }

    pub fn render_bounds(&self) -> RenderBounds {
        self.bounds
    }

    pub fn set_color_aliases(&mut self, aliases: ColorAliases) {
        self.color_aliases = aliases;
    }

    pub fn set_glyph_renderer(&mut self, glyphs: Box<dyn GlyphRenderer>) {
        self.glyphs = glyphs;
        self.changed = true;
    }

    fn in_world(&self, x: i64, y: i64) -> bool {
        x >= 0
            && y >= 0
            && x < i64::from(self.config.world_width)
            && y < i64::from(self.config.world_height)
    }

    fn mark_dirty(&mut self, x: f64, y: f64) {
        self.dirty.mark_dirty(x, y);
        self.changed = true;
    }

    // Tiles

    /// Adds a tile. Positions are not validated; a tile outside the world is
    /// stored but never rendered.
    #[allow(clippy::too_many_arguments)]
    pub fn create_tile(
        &mut self,
        x: f64,
        y: f64,
        glyph: impl Into<String>,
        fg: Color,
        bg: Color,
        z_index: i32,
        config: &TileConfig,
    ) -> TileId {
        let id = TileId::next();
        let tile = Tile::new(id, x, y, glyph, fg, bg, z_index, config);
        self.tiles.insert(id, tile);
        self.mark_dirty(x, y);
        id
    }

    pub fn get_tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Tiles whose rounded position is `(x, y)`, ascending z; equal z keeps
    /// creation order.
    pub fn get_tiles_at(&self, x: i64, y: i64) -> Vec<&Tile> {
        let mut tiles = self
            .tiles
            .values()
            .filter(|tile| tile.cell() == (x, y))
            .collect::<Vec<_>>();
        tiles.sort_by_key(|tile| tile.z_index);
        tiles
    }

    /// Moves a tile to an absolute position inside the world. Returns whether
    /// it moved.
    pub fn move_tile(&mut self, id: TileId, x: f64, y: f64) -> bool {
        let Some(tile) = self.tiles.get(&id) else {
            self.logger.warn(&format!("move_tile: unknown tile {id}"));
            return false;
        };
        let from = (tile.x, tile.y);
        if from == (x, y) {
            return false;
        }
        if !x.is_finite() || !y.is_finite() || !self.in_world(x.round() as i64, y.round() as i64) {
            self.logger
                .warn(&format!("move_tile: ({x}, {y}) is outside the world for {id}"));
            return false;
        }

        self.mark_dirty(from.0, from.1);
        self.mark_dirty(x, y);
        if let Some(tile) = self.tiles.get_mut(&id) {
            tile.x = x;
            tile.y = y;
        }
        if let Some(callback) = self.move_callbacks.get_mut(&id) {
            callback(id, from, (x, y));
        }
        true
    }

    /// Shifts every listed tile by `(dx, dy)`. Returns how many moved.
    pub fn move_tiles(&mut self, ids: &[TileId], dx: f64, dy: f64) -> usize {
        let targets = ids
            .iter()
            .filter_map(|id| self.tiles.get(id).map(|tile| (*id, tile.x + dx, tile.y + dy)))
            .collect::<Vec<_>>();
        if targets.len() < ids.len() {
            self.logger.warn(&format!(
                "move_tiles: {} of {} tiles are unknown",
                ids.len() - targets.len(),
                ids.len()
            ));
        }
        targets
            .into_iter()
            .filter(|(id, x, y)| self.move_tile(*id, *x, *y))
            .count()
    }

    /// Registers a callback fired after each successful `move_tile`.
    pub fn set_move_callback(
        &mut self,
        id: TileId,
        callback: impl FnMut(TileId, (f64, f64), (f64, f64)) + 'static,
    ) {
        if !self.tiles.contains_key(&id) {
            self.logger
                .warn(&format!("set_move_callback: unknown tile {id}"));
            return;
        }
        self.move_callbacks.insert(id, Box::new(callback));
    }

    pub fn remove_tile(&mut self, id: TileId) -> bool {
        let Some(tile) = self.tiles.remove(&id) else {
            self.logger.warn(&format!("remove_tile: unknown tile {id}"));
            return false;
        };
        self.mark_dirty(tile.x, tile.y);
        self.clear_animations(id);
        self.move_callbacks.remove(&id);
        self.background.retain(|entry| *entry != id);
        true
    }

    pub fn remove_tiles(&mut self, ids: &[TileId]) -> usize {
        ids.iter().filter(|id| self.remove_tile(**id)).count()
    }

    pub fn update_tile(&mut self, id: TileId, update: &TileUpdate) -> bool {
        let Some(tile) = self.tiles.get_mut(&id) else {
            self.logger.warn(&format!("update_tile: unknown tile {id}"));
            return false;
        };
        let before = (tile.x, tile.y);
        tile.apply_update(update);
        let after = (tile.x, tile.y);
        self.mark_dirty(before.0, before.1);
        if after != before {
            self.mark_dirty(after.0, after.1);
        }
        true
    }

    /// Removes every tile in a cell except the background layer.
    pub fn empty_cell(&mut self, x: i64, y: i64) -> usize {
        let ids = self
            .get_tiles_at(x, y)
            .iter()
            .map(|tile| tile.id)
            .filter(|id| !self.background.contains(id))
            .collect::<Vec<_>>();
        self.remove_tiles(&ids)
    }

    /// Drops every tile, animation and move callback.
    pub fn clear(&mut self) {
        let cells = self
            .tiles
            .values()
            .map(|tile| (tile.x, tile.y))
            .collect::<Vec<_>>();
        for (x, y) in cells {
            self.dirty.mark_cell(x.round() as i64, y.round() as i64);
        }
        self.tiles.clear();
        self.background.clear();
        self.move_callbacks.clear();
        self.symbols.clear_all();
        self.colors.clear_all();
        self.values.clear_all();
        self.changed = true;
    }

    /// Replaces the background layer with one tile per world cell.
    pub fn set_background(&mut self, glyph: &str, fg: Color, bg: Color) {
        let previous = mem::take(&mut self.background);
        self.remove_tiles(&previous);

        let config = TileConfig::default();
        for y in 0..self.config.world_height {
            for x in 0..self.config.world_width {
                let id = self.create_tile(
                    f64::from(x),
                    f64::from(y),
                    glyph,
                    fg,
                    bg,
                    BACKGROUND_Z,
                    &config,
                );
                self.background.push(id);
            }
        }
    }

    // Animation

    pub fn add_symbol_animation(&mut self, id: TileId, animation: SymbolAnimation) {
        if self.require_tile(id, "add_symbol_animation") {
            self.symbols.add(id, animation);
            self.changed = true;
        }
    }

    pub fn add_color_animation(&mut self, id: TileId, animation: ColorAnimation) {
        if self.require_tile(id, "add_color_animation") {
            self.colors.add(id, animation);
            self.changed = true;
        }
    }

    pub fn add_value_animation(&mut self, id: TileId, animation: ValueAnimation) {
        if self.require_tile(id, "add_value_animation") {
            self.values.add(id, animation);
            self.changed = true;
        }
    }

    pub fn clear_animations(&mut self, id: TileId) {
        self.symbols.clear(id);
        self.colors.clear(id);
        self.values.clear(id);
    }

    /// Halts a tile's animations where they are.
    pub fn stop_tile_animations(&mut self, id: TileId) {
        self.symbols.stop(id);
        self.colors.stop(id);
        self.values.stop(id);
    }

    pub fn is_animating(&self, id: TileId) -> bool {
        self.symbols.is_animating(id) || self.colors.is_animating(id) || self.values.is_animating(id)
    }

    pub fn symbol_animations(&self) -> &SymbolAnimationEngine {
        &self.symbols
    }

    pub fn color_animations(&self) -> &ColorAnimationEngine {
        &self.colors
    }

    pub fn value_animations(&self) -> &ValueAnimationEngine {
        &self.values
    }

    fn require_tile(&self, id: TileId, operation: &str) -> bool {
        let known = self.tiles.contains_key(&id);
        if !known {
            self.logger.warn(&format!("{operation}: unknown tile {id}"));
        }
        known
    }

    // Viewport

    pub fn set_viewport(&mut self, x: f64, y: f64, options: &ViewportOptions) {
        if self.viewport.set(x, y, options) {
            self.changed = true;
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.viewport()
    }

    pub fn viewport_width(&self) -> u32 {
        self.viewport.viewport().width
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport.viewport().height
    }

    pub fn world_width(&self) -> u32 {
        self.config.world_width
    }

    pub fn world_height(&self) -> u32 {
        self.config.world_height
    }

    // Visibility

    pub fn set_visibility_mask(&mut self, mask: VisibilityMask) {
        if mask.width() != self.config.world_width || mask.height() != self.config.world_height {
            self.logger.warn(&format!(
                "visibility mask is {}x{} but the world is {}x{}; missing cells are hidden",
                mask.width(),
                mask.height(),
                self.config.world_width,
                self.config.world_height
            ));
        }
        self.visibility = Some(mask);
        self.mask_stale = true;
        self.changed = true;
    }

    /// Sets one cell, creating an all-hidden mask first if none is set.
    pub fn set_visibility(&mut self, x: i64, y: i64, value: f64) {
        let (width, height) = (self.config.world_width, self.config.world_height);
        let mask = self
            .visibility
            .get_or_insert_with(|| VisibilityMask::new(width, height));
        if !mask.set(x, y, value) {
            self.logger
                .warn(&format!("set_visibility: ({x}, {y}) is outside the mask"));
            return;
        }
        self.mask_stale = true;
        self.changed = true;
    }

    /// Removes the mask; every in-world tile renders again.
    pub fn clear_visibility_mask(&mut self) {
        self.visibility = None;
        self.mask_stale = true;
        self.changed = true;
    }

    pub fn visibility_mask(&self) -> Option<&VisibilityMask> {
        self.visibility.as_ref()
    }

    // Diagnostics

    pub fn performance_metrics(&self) -> PerformanceMetrics {
        self.stats.metrics()
    }

    pub fn dirty_mask(&self) -> &DirtyMask {
        &self.dirty
    }

    /// Flips the dirty-cell overlay; returns the new state.
    pub fn toggle_dirty_mask(&mut self) -> bool {
        self.show_dirty_mask = !self.show_dirty_mask;
        self.show_dirty_mask
    }

    pub fn debug_string(&self) -> String {
        let view = self.viewport.viewport();
        let metrics = self.stats.metrics();
        let animations = self.animation_counts();
        format!(
            "display '{}'\n\
             world: {}x{}\n\
             viewport: ({:.2}, {:.2}) {}x{}{}\n\
             render window: ({}, {}) {}x{}\n\
             tiles: {} ({} background)\n\
             animations running: symbol {}/{}, color {}/{}, value {}/{}\n\
             dirty cells: {}\n\
             visibility mask: {}\n\
             fps: {:.1}, render {:.2} ms, animation {:.2} ms",
            self.config.surface_id,
            self.config.world_width,
            self.config.world_height,
            view.x,
            view.y,
            view.width,
            view.height,
            if self.viewport.is_transitioning() {
                " (transitioning)"
            } else {
                ""
            },
            self.bounds.x,
            self.bounds.y,
            self.bounds.width,
            self.bounds.height,
            self.tiles.len(),
            self.background.len(),
            animations.symbol.running,
            animations.symbol.total,
            animations.color.running,
            animations.color.total,
            animations.value.running,
            animations.value.total,
            self.dirty.dirty_count(),
            if self.visibility.is_some() { "set" } else { "none" },
            metrics.fps,
            metrics.render_ms,
            metrics.animation_ms,
        )
    }

    fn animation_counts(&self) -> AnimationCounts {
        AnimationCounts {
            symbol: self.symbols.metrics(),
            color: self.colors.metrics(),
            value: self.values.metrics(),
        }
    }

    // Frame loop

    pub fn start(&mut self) {
        if !self.running {
            self.logger.debug("frame loop started");
        }
        self.running = true;
    }

    /// Stops scheduling; a frame in progress still completes.
    pub fn stop(&mut self) {
        if self.running {
            self.logger.debug("frame loop stopped");
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Runs frames from `clock` until [`Display::stop`] is called or the
    /// clock runs out.
    pub fn run(&mut self, clock: &mut dyn FrameClock) {
        self.start();
        while self.running {
            let Some(now) = clock.next_frame() else {
                break;
            };
            self.frame(now);
        }
        self.running = false;
    }

    /// One scheduled frame at `now` (ms). Does nothing while stopped. Errors
    /// are logged and the loop keeps going.
    pub fn frame(&mut self, now: f64) {
        if !self.running {
            return;
        }
        if let Err(error) = self.render_frame(now) {
            self.logger.error(&format!("frame at {now:.1} ms failed: {error:#}"));
        }
        self.run_frame_callbacks(now);
        self.stats.record_frame(now);
        let counts = self.animation_counts();
        self.stats.set_counts(self.tiles.len(), counts);
    }

    fn render_frame(&mut self, now: f64) -> Result<()> {
        self.last_timestamp = now;
        if self.viewport.advance(now) {
            self.changed = true;
        }

        let animating =
            self.symbols.has_running() || self.colors.has_running() || self.values.has_running();
        if animating || self.changed {
            let started = Instant::now();
            self.advance_animations(now);
            self.stats
                .record_animation(started.elapsed().as_secs_f64() * 1000.0);
        }

        if self.changed {
            let started = Instant::now();
            self.update_render_canvas()?;
            self.stats
                .record_render(started.elapsed().as_secs_f64() * 1000.0);
            self.changed = false;
        }

        self.blit();
        if self.show_dirty_mask {
            self.draw_dirty_overlay();
        }
        self.dirty.clear();
        Ok(())
    }

    /// Advances all three engines and writes their values into the tiles.
    fn advance_animations(&mut self, now: f64) {
        let tiles = &mut self.tiles;
        let dirty = &mut self.dirty;
        let mut touched = 0;

        touched += self.symbols.update(now, &mut |id, _field, symbol| {
            if let Some(tile) = tiles.get_mut(&id) {
                tile.glyph = symbol;
                let (x, y) = tile.cell();
                dirty.mark_cell(x, y);
            }
        });
        touched += self.colors.update(now, &mut |id, field, color| {
            if let Some(tile) = tiles.get_mut(&id) {
                tile.set_color(field, color);
                let (x, y) = tile.cell();
                dirty.mark_cell(x, y);
            }
        });
        touched += self.values.update(now, &mut |id, field, value| {
            if let Some(tile) = tiles.get_mut(&id) {
                let before = tile.cell();
                tile.set_value(field, value);
                let after = tile.cell();
                dirty.mark_cell(before.0, before.1);
                if after != before {
                    dirty.mark_cell(after.0, after.1);
                }
            }
        });

        if touched > 0 {
            self.changed = true;
        }
    }

    pub fn add_frame_callback(&mut self, callback: impl FnMut(&mut Display, f64) + 'static) -> FrameCallbackId {
        let callbacks = &mut self.frame_callbacks;
        let id = FrameCallbackId(callbacks.next_id);
        callbacks.next_id += 1;
        callbacks.entries.push((id, Box::new(callback)));
        id
    }

    pub fn remove_frame_callback(&mut self, id: FrameCallbackId) -> bool {
        let callbacks = &mut self.frame_callbacks;
        let before = callbacks.entries.len();
        callbacks.entries.retain(|(entry, _)| *entry != id);
        if callbacks.entries.len() != before {
            return true;
        }
        if callbacks.dispatching.contains(&id)
            && !callbacks.removed_while_dispatching.contains(&id)
        {
            callbacks.removed_while_dispatching.push(id);
            return true;
        }
        false
    }

    fn run_frame_callbacks(&mut self, now: f64) {
        let mut active = mem::take(&mut self.frame_callbacks.entries);
        self.frame_callbacks.dispatching = active.iter().map(|(id, _)| *id).collect();
        for (id, callback) in &mut active {
            if self.frame_callbacks.removed_while_dispatching.contains(id) {
                continue;
            }
            callback(self, now);
        }
        self.frame_callbacks.dispatching.clear();

        let removed = mem::take(&mut self.frame_callbacks.removed_while_dispatching);
        let added = mem::replace(&mut self.frame_callbacks.entries, active);
        self.frame_callbacks
            .entries
            .retain(|(id, _)| !removed.contains(id));
        self.frame_callbacks.entries.extend(added);
    }
}
