use serde::{Deserialize, Serialize};

use super::{AnimationEngine, AnimationKind, PropertyBag};
use crate::color::{interpolate_color, Color};
use crate::logging::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorField {
    Fg,
    Bg,
}

/// Hex endpoints, resolved on every step so a malformed value degrades to
/// white instead of rejecting the whole animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBounds {
    pub start: String,
    pub end: String,
}

impl ColorBounds {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn between(start: Color, end: Color) -> Self {
        Self::new(start.to_hex(), end.to_hex())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColorKind;

impl AnimationKind for ColorKind {
    const NAME: &'static str = "color";

    type Field = ColorField;
    type Bounds = ColorBounds;
    type Value = Color;

    fn interpolate(bounds: &ColorBounds, progress: f64, logger: &dyn Logger) -> Option<Color> {
        let start = Color::parse_or_white(&bounds.start, logger);
        let end = Color::parse_or_white(&bounds.end, logger);
        Some(interpolate_color(start, end, progress))
    }
}

pub type ColorAnimation = PropertyBag<ColorField, ColorBounds>;
pub type ColorAnimationEngine = AnimationEngine<ColorKind>;
