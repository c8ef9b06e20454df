/// World-sized grid of visibility values: 0 hidden, 1 visible, anything in
/// between explored but dim.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityMask {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl VisibilityMask {
    /// A fully hidden mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, 0.0)
    }

    pub fn filled(width: u32, height: u32, value: f64) -> Self {
        Self {
            width,
            height,
            values: vec![sanitize(value); width as usize * height as usize],
        }
    }

    /// Builds a mask from rows; short rows and missing rows read as hidden,
    /// extra entries are ignored.
    pub fn from_rows(width: u32, height: u32, rows: &[Vec<f64>]) -> Self {
        let mut mask = Self::new(width, height);
        for (y, row) in rows.iter().enumerate().take(height as usize) {
            for (x, value) in row.iter().enumerate().take(width as usize) {
                mask.values[y * width as usize + x] = sanitize(*value);
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `None` outside the grid.
    pub fn get(&self, x: i64, y: i64) -> Option<f64> {
        self.index(x, y).map(|index| self.values[index])
    }

    /// Returns false when the cell is outside the grid.
    pub fn set(&mut self, x: i64, y: i64, value: f64) -> bool {
        match self.index(x, y) {
            Some(index) => {
                self.values[index] = sanitize(value);
                true
            }
            None => false,
        }
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
