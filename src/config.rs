use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error_codes::{CodedError, DISPLAY_CONFIG_INVALID};

fn default_device_pixel_ratio() -> f64 {
    1.0
}

fn surface_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("surface id pattern is valid"))
}

/// Everything a [`crate::Display`] needs at construction.
///
/// Sizes are in cells except `cell_width`/`cell_height`, which are CSS
/// pixels; backing surfaces are scaled by `device_pixel_ratio`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    pub surface_id: String,
    pub cell_width: u32,
    pub cell_height: u32,
    pub world_width: u32,
    pub world_height: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f64,
}

impl DisplayConfig {
    pub fn new(
        surface_id: impl Into<String>,
        world: (u32, u32),
        viewport: (u32, u32),
        cell: (u32, u32),
    ) -> Self {
        Self {
            surface_id: surface_id.into(),
            cell_width: cell.0,
            cell_height: cell.1,
            world_width: world.0,
            world_height: world.1,
            viewport_width: viewport.0,
            viewport_height: viewport.1,
            font_family: None,
            device_pixel_ratio: default_device_pixel_ratio(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !surface_id_pattern().is_match(&self.surface_id) {
            return Err(invalid(
                "surface_id",
                format!(
                    "surface id '{}' must start with a letter and contain only letters, digits, '-' or '_'",
                    self.surface_id
                ),
            ));
        }

        for (field, value) in [
            ("cell_width", self.cell_width),
            ("cell_height", self.cell_height),
            ("world_width", self.world_width),
            ("world_height", self.world_height),
            ("viewport_width", self.viewport_width),
            ("viewport_height", self.viewport_height),
        ] {
            if value == 0 {
                return Err(invalid(field, format!("{field} must be greater than zero")));
            }
        }

        if !self.device_pixel_ratio.is_finite() || self.device_pixel_ratio <= 0.0 {
            return Err(invalid(
                "device_pixel_ratio",
                format!(
                    "device_pixel_ratio must be a positive number, got {}",
                    self.device_pixel_ratio
                ),
            ));
        }

        Ok(())
    }

    /// Device pixels per cell, at least one on each axis.
    pub fn cell_pixels(&self) -> (u32, u32) {
        let scale = |css: u32| (f64::from(css) * self.device_pixel_ratio).round().max(1.0) as u32;
        (scale(self.cell_width), scale(self.cell_height))
    }
}

fn invalid(field: &str, message: String) -> anyhow::Error {
    CodedError::config(DISPLAY_CONFIG_INVALID, message)
        .with_details(json!({ "field": field }))
        .into()
}
