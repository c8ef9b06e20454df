//! YAML scene files: a display configuration plus the tiles, text,
//! animations, viewport and visibility to populate it with.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::animation::{
    ColorBounds, ColorField, PropertyBag, SymbolBounds, SymbolField, Timeline, ValueBounds,
    ValueField,
};
use crate::color::Color;
use crate::config::DisplayConfig;
use crate::display::{Display, Reveal, StringOptions, WrapOptions};
use crate::error_codes::{CodedError, SCENE_INVALID};
use crate::glyphs::{BlockGlyphs, FaceInfo, FontGlyphs, GlyphRenderer};
use crate::logging::Logger;
use crate::text_segments::ColorAliases;
use crate::tile::{TileConfig, TileId};
use crate::viewport::ViewportOptions;
use crate::visibility::VisibilityMask;

fn white() -> Color {
    Color::WHITE
}

fn black() -> Color {
    Color::BLACK
}

fn transparent() -> Color {
    Color::TRANSPARENT
}

fn text_z() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    pub display: DisplayConfig,
    /// Font file, relative to the scene file.
    #[serde(default)]
    pub font: Option<PathBuf>,
    /// Extra faces picked by tile font overrides; needs a base font.
    #[serde(default)]
    pub faces: Vec<SceneFace>,
    #[serde(default)]
    pub aliases: ColorAliases,
    #[serde(default)]
    pub background: Option<SceneBackground>,
    #[serde(default)]
    pub tiles: Vec<SceneTile>,
    #[serde(default)]
    pub strings: Vec<SceneString>,
    #[serde(default)]
    pub animations: Vec<SceneAnimation>,
    #[serde(default)]
    pub viewport: Option<SceneViewport>,
    #[serde(default)]
    pub visibility: Option<SceneVisibility>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneBackground {
    pub glyph: String,
    #[serde(default = "white")]
    pub fg: Color,
    #[serde(default = "black")]
    pub bg: Color,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneTile {
    /// Lets animations refer to this tile.
    #[serde(default)]
    pub name: Option<String>,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub glyph: String,
    #[serde(default = "white")]
    pub fg: Color,
    #[serde(default = "transparent")]
    pub bg: Color,
    #[serde(default)]
    pub z: i32,
    #[serde(flatten)]
    pub style: TileConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneString {
    pub x: i64,
    pub y: i64,
    pub text: String,
    #[serde(default = "text_z")]
    pub z: i32,
    #[serde(default = "transparent")]
    pub bg: Color,
    /// Word-wrap to this many columns.
    #[serde(default)]
    pub wrap: Option<u32>,
    #[serde(default)]
    pub padding: u32,
    #[serde(default)]
    pub box_bg: Option<Color>,
    #[serde(default)]
    pub reveal: Option<SceneReveal>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneReveal {
    #[serde(default = "black")]
    pub from: Color,
    #[serde(default)]
    pub delay: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneAnimation {
    Symbol {
        tile: String,
        #[serde(default)]
        start_time: Option<f64>,
        #[serde(default)]
        delay: f64,
        fields: BTreeMap<SymbolField, Timeline<SymbolBounds>>,
    },
    Color {
        tile: String,
        #[serde(default)]
        start_time: Option<f64>,
        #[serde(default)]
        delay: f64,
        fields: BTreeMap<ColorField, Timeline<ColorBounds>>,
    },
    Value {
        tile: String,
        #[serde(default)]
        start_time: Option<f64>,
        #[serde(default)]
        delay: f64,
        fields: BTreeMap<ValueField, Timeline<ValueBounds>>,
    },
}

impl SceneAnimation {
    pub fn tile(&self) -> &str {
        match self {
            Self::Symbol { tile, .. } | Self::Color { tile, .. } | Self::Value { tile, .. } => tile,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneFace {
    pub path: PathBuf,
    #[serde(flatten)]
    pub info: FaceInfo,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SceneViewport {
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub options: ViewportOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneVisibility {
    /// Value for cells not listed below.
    #[serde(default)]
    pub fill: f64,
    #[serde(default)]
    pub rows: Vec<Vec<f64>>,
    #[serde(default)]
    pub cells: Vec<SceneCell>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneCell {
    pub x: i64,
    pub y: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSummary {
    pub surface_id: String,
    pub world: [u32; 2],
    pub viewport: [u32; 2],
    pub tiles: usize,
    pub strings: usize,
    pub animations: usize,
    pub background: bool,
    pub visibility: bool,
    pub font: Option<PathBuf>,
    pub faces: usize,
}

pub fn load_scene(path: &Path) -> Result<Scene> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read scene {}", path.display()))?;
    let scene: Scene = serde_yaml::from_str(&contents).map_err(|error| {
        let location = error
            .location()
            .map(|location| format!("line {}, column {}", location.line(), location.column()))
            .unwrap_or_else(|| "unknown location".to_owned());
        anyhow!(
            "failed to parse yaml in {} at {}: {}",
            path.display(),
            location,
            error
        )
    })?;

    scene
        .validate()
        .with_context(|| format!("invalid scene {}", path.display()))?;
    Ok(scene)
}

fn scene_error(message: String) -> anyhow::Error {
    CodedError::config(SCENE_INVALID, message).into()
}

impl Scene {
    pub fn validate(&self) -> Result<()> {
        self.display.validate()?;

        let mut names = HashSet::new();
        for tile in &self.tiles {
            if let Some(name) = &tile.name {
                if !names.insert(name.as_str()) {
                    return Err(scene_error(format!("duplicate tile name '{name}'")));
                }
            }
        }

        for (index, animation) in self.animations.iter().enumerate() {
            if !names.contains(animation.tile()) {
                return Err(CodedError::config(
                    SCENE_INVALID,
                    format!(
                        "animation {index} targets unknown tile '{}'",
                        animation.tile()
                    ),
                )
                .with_details(json!({ "animation": index, "tile": animation.tile() }))
                .into());
            }
        }

        for (index, string) in self.strings.iter().enumerate() {
            if string.wrap == Some(0) {
                return Err(scene_error(format!("string {index} wraps to zero columns")));
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            surface_id: self.display.surface_id.clone(),
            world: [self.display.world_width, self.display.world_height],
            viewport: [self.display.viewport_width, self.display.viewport_height],
            tiles: self.tiles.len(),
            strings: self.strings.len(),
            animations: self.animations.len(),
            background: self.background.is_some(),
            visibility: self.visibility.is_some(),
            font: self.font.clone(),
            faces: self.faces.len(),
        }
    }

    /// Creates a display for this scene and populates it. `font` overrides
    /// the scene's own font; relative scene fonts resolve against `base_dir`.
    pub fn build_display(
        &self,
        base_dir: &Path,
        font: Option<&Path>,
        logger: Rc<dyn Logger>,
    ) -> Result<(Display, HashMap<String, TileId>)> {
        let font_path = font
            .map(Path::to_path_buf)
            .or_else(|| self.font.as_ref().map(|font| base_dir.join(font)));
        let glyphs: Box<dyn GlyphRenderer> = match font_path {
            Some(path) => {
                let mut fonts = FontGlyphs::from_path(&path)?;
                for face in &self.faces {
                    fonts.add_face_from_path(face.info.clone(), &base_dir.join(&face.path))?;
                }
                Box::new(fonts)
            }
            None if !self.faces.is_empty() => {
                return Err(scene_error(format!(
                    "{} extra font faces need a base font",
                    self.faces.len()
                )));
            }
            None => Box::new(BlockGlyphs::new()),
        };

        let mut display = Display::with_glyphs(self.display.clone(), logger, glyphs)?;
        let names = self.apply(&mut display);
        Ok((display, names))
    }

    /// Populates `display` and returns the ids of named tiles.
    pub fn apply(&self, display: &mut Display) -> HashMap<String, TileId> {
        display.set_color_aliases(self.aliases.clone());

        if let Some(background) = &self.background {
            display.set_background(&background.glyph, background.fg, background.bg);
        }

        let mut names = HashMap::new();
        for tile in &self.tiles {
            let id = display.create_tile(
                tile.x,
                tile.y,
                tile.glyph.clone(),
                tile.fg,
                tile.bg,
                tile.z,
                &tile.style,
            );
            if let Some(name) = &tile.name {
                names.insert(name.clone(), id);
            }
        }

        for string in &self.strings {
            let options = StringOptions {
                z_index: string.z,
                bg: string.bg,
                reveal: string.reveal.map(|reveal| Reveal {
                    from: reveal.from,
                    delay: reveal.delay,
                    duration: reveal.duration,
                }),
                style: TileConfig::default(),
            };
            match string.wrap {
                Some(width) => {
                    display.create_wrapped_string(
                        string.x,
                        string.y,
                        width,
                        &string.text,
                        &WrapOptions {
                            text: options,
                            padding: string.padding,
                            box_bg: string.box_bg,
                        },
                    );
                }
                None => {
                    display.create_string(string.x, string.y, &string.text, &options);
                }
            }
        }

        for animation in &self.animations {
            let Some(id) = names.get(animation.tile()).copied() else {
                continue;
            };
            match animation {
                SceneAnimation::Symbol {
                    start_time,
                    delay,
                    fields,
                    ..
                } => display.add_symbol_animation(id, bag(*start_time, *delay, fields)),
                SceneAnimation::Color {
                    start_time,
                    delay,
                    fields,
                    ..
                } => display.add_color_animation(id, bag(*start_time, *delay, fields)),
                SceneAnimation::Value {
                    start_time,
                    delay,
                    fields,
                    ..
                } => display.add_value_animation(id, bag(*start_time, *delay, fields)),
            }
        }

        if let Some(visibility) = &self.visibility {
            let (width, height) = (display.world_width(), display.world_height());
            let mut mask = VisibilityMask::filled(width, height, visibility.fill);
            for (y, row) in visibility.rows.iter().enumerate() {
                for (x, value) in row.iter().enumerate() {
                    mask.set(x as i64, y as i64, *value);
                }
            }
            for cell in &visibility.cells {
                mask.set(cell.x, cell.y, cell.value);
            }
            display.set_visibility_mask(mask);
        }

        if let Some(viewport) = &self.viewport {
            display.set_viewport(viewport.x, viewport.y, &viewport.options);
        }

        names
    }
}

fn bag<F: Ord + Copy, B: Clone>(
    start_time: Option<f64>,
    delay: f64,
    fields: &BTreeMap<F, Timeline<B>>,
) -> PropertyBag<F, B> {
    PropertyBag {
        start_time,
        delay,
        fields: fields.clone(),
    }
}
