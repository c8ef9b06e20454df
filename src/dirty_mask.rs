use std::rc::Rc;

use crate::logging::Logger;

/// World-sized grid of "changed since last clear" flags.
pub struct DirtyMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
    dirty_count: usize,
    logger: Rc<dyn Logger>,
}

impl DirtyMask {
    pub fn new(width: u32, height: u32, logger: Rc<dyn Logger>) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
            dirty_count: 0,
            logger,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Marks the cell under `(x, y)`.
    ///
    /// Fractional coordinates are reported and then mark every cell the
    /// position overlaps, `floor..=ceil` on each axis.
    pub fn mark_dirty(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            self.logger
                .warn(&format!("dirty mark ignored for non-finite position ({x}, {y})"));
            return;
        }

        if x.fract() != 0.0 || y.fract() != 0.0 {
            self.logger.warn(&format!(
                "dirty mark at non-integer position ({x}, {y}); marking covering cells"
            ));
        }

        let (x0, x1) = (x.floor() as i64, x.ceil() as i64);
        let (y0, y1) = (y.floor() as i64, y.ceil() as i64);
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                self.mark_cell(cx, cy);
            }
        }
    }

    pub fn mark_cell(&mut self, x: i64, y: i64) {
        let Some(index) = self.index(x, y) else {
            return;
        };
        if !self.cells[index] {
            self.cells[index] = true;
            self.dirty_count += 1;
        }
    }

    pub fn is_dirty(&self, x: i64, y: i64) -> bool {
        self.index(x, y).map(|index| self.cells[index]).unwrap_or(false)
    }

    pub fn has_dirty_tiles(&self) -> bool {
        self.dirty_count > 0
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty_count
    }

    pub fn clear(&mut self) {
        if self.dirty_count == 0 {
            return;
        }
        self.cells.fill(false);
        self.dirty_count = 0;
    }

    /// Dirty cells in row-major order.
    pub fn dirty_cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, dirty)| **dirty)
            .map(move |(index, _)| (index as u32 % width, index as u32 / width))
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use log::Level;

    use super::DirtyMask;
    use crate::logging::MemoryLogger;

    #[test]
    fn mark_query_and_clear() {
        let logger = Rc::new(MemoryLogger::new());
        let mut mask = DirtyMask::new(4, 3, logger.clone());
        assert!(!mask.has_dirty_tiles());

        mask.mark_dirty(2.0, 1.0);
        mask.mark_dirty(2.0, 1.0);
        assert!(mask.is_dirty(2, 1));
        assert!(!mask.is_dirty(1, 2));
        assert_eq!(mask.dirty_count(), 1);
        assert_eq!(mask.dirty_cells().collect::<Vec<_>>(), vec![(2, 1)]);

        mask.clear();
        assert!(!mask.has_dirty_tiles());
        assert!(!mask.is_dirty(2, 1));
        assert_eq!(logger.count(Level::Warn), 0);
    }

    #[test]
    fn fractional_mark_covers_bounding_cells_and_warns() {
        let logger = Rc::new(MemoryLogger::new());
        let mut mask = DirtyMask::new(4, 4, logger.clone());

        mask.mark_dirty(1.5, 2.0);
        assert!(mask.is_dirty(1, 2));
        assert!(mask.is_dirty(2, 2));
        assert!(!mask.is_dirty(1, 3));
        assert_eq!(mask.dirty_count(), 2);
        assert_eq!(logger.count(Level::Warn), 1);
    }

    #[test]
    fn out_of_world_marks_are_ignored() {
        let logger = Rc::new(MemoryLogger::new());
        let mut mask = DirtyMask::new(2, 2, logger);
        mask.mark_dirty(5.0, 5.0);
        mask.mark_dirty(-1.0, 0.0);
        assert!(!mask.has_dirty_tiles());
    }
}
