//! Retained-mode tile-grid compositor with keyframe animation.
//!
//! A [`Display`] keeps a world of styled [`Tile`]s, animates their fields
//! through three [`animation`] engines and renders a padded window of the
//! world into `tiny-skia` pixmaps every frame.

pub mod animation;
pub mod color;
pub mod config;
pub mod dirty_mask;
pub mod display;
pub mod error_codes;
pub mod glyphs;
pub mod logging;
pub mod paint;
pub mod scene;
pub mod text_segments;
pub mod tile;
pub mod viewport;
pub mod visibility;

pub use color::{interpolate_color, Color};
pub use config::DisplayConfig;
pub use display::Display;
pub use tile::{Tile, TileConfig, TileId, TileUpdate};
