//! Pointer hit-testing and cell subscriptions.

use super::Display;
use crate::tile::TileId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEvent {
    pub x: i64,
    pub y: i64,
    /// Tiles in the cell, ascending z.
    pub tiles: Vec<TileId>,
}

pub type CellCallback = Box<dyn FnMut(&CellEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// A host pointer event in device pixels relative to the output surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move { x: f64, y: f64 },
    Down { x: f64, y: f64, button: PointerButton },
    Leave,
}

#[derive(Default)]
pub(super) struct PointerHandlers {
    click: Vec<CellCallback>,
    right_click: Vec<CellCallback>,
    hover: Vec<CellCallback>,
    hovered: Option<(i64, i64)>,
}

impl Display {
    pub fn on_cell_click(&mut self, callback: impl FnMut(&CellEvent) + 'static) {
        self.input.click.push(Box::new(callback));
    }

    pub fn on_cell_right_click(&mut self, callback: impl FnMut(&CellEvent) + 'static) {
        self.input.right_click.push(Box::new(callback));
    }

    /// Fires when the pointer enters a different cell.
    pub fn on_cell_hover(&mut self, callback: impl FnMut(&CellEvent) + 'static) {
        self.input.hover.push(Box::new(callback));
    }

    pub fn remove_all_event_listeners(&mut self) {
        self.input = PointerHandlers::default();
    }

    /// Maps device pixels on the output surface to a world cell, using the
    /// same rounded cell size the surfaces are painted with.
    pub fn cell_at(&self, device_x: f64, device_y: f64) -> Option<(i64, i64)> {
        let viewport = self.viewport.viewport();
        let column = device_x / f64::from(self.cell.width) + viewport.x;
        let row = device_y / f64::from(self.cell.height) + viewport.y;
        if !column.is_finite() || !row.is_finite() {
            return None;
        }
        let (x, y) = (column.floor() as i64, row.floor() as i64);
        self.in_world(x, y).then_some((x, y))
    }

    pub fn dispatch_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Leave => self.input.hovered = None,
            PointerEvent::Move { x, y } => {
                let cell = self.cell_at(x, y);
                if cell == self.input.hovered {
                    return;
                }
                self.input.hovered = cell;
                if let Some((x, y)) = cell {
                    let event = self.cell_event(x, y);
                    for callback in &mut self.input.hover {
                        callback(&event);
                    }
                }
            }
            PointerEvent::Down { x, y, button } => {
                let Some((x, y)) = self.cell_at(x, y) else {
                    return;
                };
                let event = self.cell_event(x, y);
                let handlers = match button {
                    PointerButton::Primary => &mut self.input.click,
                    PointerButton::Secondary => &mut self.input.right_click,
                };
                for callback in handlers {
                    callback(&event);
                }
            }
        }
    }

    fn cell_event(&self, x: i64, y: i64) -> CellEvent {
        CellEvent {
            x,
            y,
            tiles: self.get_tiles_at(x, y).iter().map(|tile| tile.id).collect(),
        }
    }
}
