use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::animation::{ColorField, ValueField};
use crate::color::Color;

static NEXT_TILE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique tile handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TileId(u64);

impl TileId {
    pub fn next() -> Self {
        Self(NEXT_TILE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps a raw value. Ids made this way are not guaranteed unique.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile#{}", self.0)
    }
}

/// Compositing operator applied when a tile is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    pub fn to_skia(self) -> tiny_skia::BlendMode {
        match self {
            Self::Normal => tiny_skia::BlendMode::SourceOver,
            Self::Multiply => tiny_skia::BlendMode::Multiply,
            Self::Screen => tiny_skia::BlendMode::Screen,
            Self::Overlay => tiny_skia::BlendMode::Overlay,
            Self::Darken => tiny_skia::BlendMode::Darken,
            Self::Lighten => tiny_skia::BlendMode::Lighten,
            Self::ColorDodge => tiny_skia::BlendMode::ColorDodge,
            Self::ColorBurn => tiny_skia::BlendMode::ColorBurn,
            Self::HardLight => tiny_skia::BlendMode::HardLight,
            Self::SoftLight => tiny_skia::BlendMode::SoftLight,
            Self::Difference => tiny_skia::BlendMode::Difference,
            Self::Exclusion => tiny_skia::BlendMode::Exclusion,
        }
    }
}

/// Edge a partial background grows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillDirection {
    Top,
    Right,
    #[default]
    Bottom,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FontOverrides {
    #[serde(default)]
    pub weight: Option<FontWeight>,
    #[serde(default)]
    pub style: Option<FontStyle>,
    #[serde(default)]
    pub family: Option<String>,
}

fn default_wall_color() -> Color {
    Color::rgb(0x80, 0x80, 0x80)
}

/// Wall strips drawn along the top (north) and left (west) cell edges.
/// The overlay colors tint the inner half of each strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Walls {
    #[serde(default)]
    pub north: bool,
    #[serde(default)]
    pub west: bool,
    #[serde(default = "default_wall_color")]
    pub north_color: Color,
    #[serde(default = "default_wall_color")]
    pub west_color: Color,
    #[serde(default)]
    pub north_overlay: Option<Color>,
    #[serde(default)]
    pub west_overlay: Option<Color>,
}

impl Default for Walls {
    fn default() -> Self {
        Self {
            north: false,
            west: false,
            north_color: default_wall_color(),
            west_color: default_wall_color(),
            north_overlay: None,
            west_overlay: None,
        }
    }
}

impl Walls {
    pub fn any(&self) -> bool {
        self.north || self.west
    }
}

/// Optional styling for a tile. Every `None` keeps the current value (or the
/// default, at creation).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    pub bg_percent: Option<f64>,
    pub fill_direction: Option<FillDirection>,
    pub offset_symbol_x: Option<f64>,
    pub offset_symbol_y: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub rotation: Option<f64>,
    pub blend_mode: Option<BlendMode>,
    pub walls: Option<Walls>,
    pub font: Option<FontOverrides>,
    pub no_clip: Option<bool>,
    pub always_render_if_explored: Option<bool>,
}

/// Partial update: base fields plus any styling.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TileUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub glyph: Option<String>,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub z_index: Option<i32>,
    #[serde(flatten)]
    pub style: TileConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    pub id: TileId,
    pub x: f64,
    pub y: f64,
    pub glyph: String,
    pub fg: Color,
    pub bg: Color,
    pub z_index: i32,
    pub bg_percent: f64,
    pub fill_direction: FillDirection,
    pub offset_symbol_x: f64,
    pub offset_symbol_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub blend_mode: BlendMode,
    pub walls: Option<Walls>,
    pub font: FontOverrides,
    pub no_clip: bool,
    pub always_render_if_explored: bool,
}

impl Tile {
    /// Builds a tile with every default resolved in one place.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TileId,
        x: f64,
        y: f64,
        glyph: impl Into<String>,
        fg: Color,
        bg: Color,
        z_index: i32,
        config: &TileConfig,
    ) -> Self {
        let glyph = glyph.into();
        let bg = if glyph.is_empty() {
            Color::TRANSPARENT
        } else {
            bg
        };

        let mut tile = Self {
            id,
            x,
            y,
            glyph,
            fg,
            bg,
            z_index,
            bg_percent: 1.0,
            fill_direction: FillDirection::default(),
            offset_symbol_x: 0.0,
            offset_symbol_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            blend_mode: BlendMode::default(),
            walls: None,
            font: FontOverrides::default(),
            no_clip: false,
            always_render_if_explored: false,
        };
        tile.apply_config(config);
        tile
    }

    pub fn apply_config(&mut self, config: &TileConfig) {
        if let Some(bg_percent) = config.bg_percent {
            self.bg_percent = bg_percent.clamp(0.0, 1.0);
        }
        if let Some(direction) = config.fill_direction {
            self.fill_direction = direction;
        }
        if let Some(value) = config.offset_symbol_x {
            self.offset_symbol_x = value;
        }
        if let Some(value) = config.offset_symbol_y {
            self.offset_symbol_y = value;
        }
        if let Some(value) = config.scale_x {
            self.scale_x = value;
        }
        if let Some(value) = config.scale_y {
            self.scale_y = value;
        }
        if let Some(value) = config.rotation {
            self.rotation = value;
        }
        if let Some(mode) = config.blend_mode {
            self.blend_mode = mode;
        }
        if let Some(walls) = config.walls {
            self.walls = Some(walls);
        }
        if let Some(font) = &config.font {
            self.font = font.clone();
        }
        if let Some(no_clip) = config.no_clip {
            self.no_clip = no_clip;
        }
        if let Some(always) = config.always_render_if_explored {
            self.always_render_if_explored = always;
        }
    }

    pub fn apply_update(&mut self, update: &TileUpdate) {
        if let Some(x) = update.x {
            self.x = x;
        }
        if let Some(y) = update.y {
            self.y = y;
        }
        if let Some(glyph) = &update.glyph {
            self.glyph = glyph.clone();
        }
        if let Some(fg) = update.fg {
            self.fg = fg;
        }
        if let Some(bg) = update.bg {
            self.bg = bg;
        }
        if let Some(z_index) = update.z_index {
            self.z_index = z_index;
        }
        self.apply_config(&update.style);
    }

    /// The integer cell this tile is drawn in.
    pub fn cell(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }

    pub fn set_value(&mut self, field: ValueField, value: f64) {
        match field {
            ValueField::X => self.x = value,
            ValueField::Y => self.y = value,
            ValueField::ScaleX => self.scale_x = value,
            ValueField::ScaleY => self.scale_y = value,
            ValueField::Rotation => self.rotation = value,
            ValueField::BgPercent => self.bg_percent = value.clamp(0.0, 1.0),
            ValueField::OffsetSymbolX => self.offset_symbol_x = value,
            ValueField::OffsetSymbolY => self.offset_symbol_y = value,
        }
    }

    pub fn set_color(&mut self, field: ColorField, color: Color) {
        match field {
            ColorField::Fg => self.fg = color,
            ColorField::Bg => self.bg = color,
        }
    }
}
