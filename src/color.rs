use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::logging::Logger;

/// An sRGB color parsed from `#RRGGBB` or `#RRGGBBAA`.
///
/// Alpha is kept optional so interpolation can tell "opaque because it said
/// FF" apart from "no alpha given at all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: Option<u8>,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: None }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r,
            g,
            b,
            a: Some(a),
        }
    }

    pub fn parse_hex(value: &str) -> Result<Self> {
        let Some(digits) = value.trim().strip_prefix('#') else {
            bail!("color '{value}' must start with '#'");
        };
        if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            bail!("color '{value}' contains non-hex digits");
        }

        let channel = |index: usize| -> Result<u8> {
            Ok(u8::from_str_radix(&digits[index..index + 2], 16)?)
        };
        match digits.len() {
            6 => Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            other => bail!("color '{value}' has {other} hex digits, expected 6 or 8"),
        }
    }

    /// Parses `value`, falling back to white and logging when it is malformed.
    pub fn parse_or_white(value: &str, logger: &dyn Logger) -> Self {
        match Self::parse_hex(value) {
            Ok(color) => color,
            Err(error) => {
                logger.warn(&format!("{error}; using white"));
                Self::WHITE
            }
        }
    }

    pub fn alpha(self) -> u8 {
        self.a.unwrap_or(255)
    }

    pub fn is_transparent(self) -> bool {
        self.alpha() == 0
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        Self {
            a: Some(alpha),
            ..self
        }
    }

    pub fn to_hex(self) -> String {
        match self.a {
            Some(a) => format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, a),
            None => format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b),
        }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.alpha())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse_hex(value)
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Blends `from` toward `to` by `progress` (clamped to `[0, 1]`).
///
/// Alpha is only interpolated when both endpoints carry it; otherwise the
/// endpoint that has one wins, and neither means no alpha.
pub fn interpolate_color(from: Color, to: Color, progress: f64) -> Color {
    let t = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let a = match (from.a, to.a) {
        (Some(a), Some(b)) => Some(lerp_channel(a, b, t)),
        (Some(a), None) | (None, Some(a)) => Some(a),
        (None, None) => None,
    };

    Color {
        r: lerp_channel(from.r, to.r, t),
        g: lerp_channel(from.g, to.g, t),
        b: lerp_channel(from.b, to.b, t),
        a,
    }
}

fn lerp_channel(from: u8, to: u8, t: f64) -> u8 {
    let from = f64::from(from);
    let to = f64::from(to);
    (from + (to - from) * t).round().clamp(0.0, 255.0) as u8
}
