use serde::{Deserialize, Serialize};

use super::{AnimationEngine, AnimationKind, PropertyBag};
use crate::logging::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolField {
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolBounds {
    pub symbols: Vec<String>,
}

impl SymbolBounds {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }
}

/// Steps through a list of glyphs.
#[derive(Debug, Clone, Copy)]
pub struct SymbolKind;

impl AnimationKind for SymbolKind {
    const NAME: &'static str = "symbol";

    type Field = SymbolField;
    type Bounds = SymbolBounds;
    type Value = String;

    fn interpolate(bounds: &SymbolBounds, progress: f64, logger: &dyn Logger) -> Option<String> {
        let last = bounds.symbols.len().checked_sub(1).or_else(|| {
            logger.warn("symbol animation has an empty symbol list");
            None
        })?;
        let t = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let index = ((t * last as f64).floor() as usize).min(last);
        Some(bounds.symbols[index].clone())
    }
}

pub type SymbolAnimation = PropertyBag<SymbolField, SymbolBounds>;
pub type SymbolAnimationEngine = AnimationEngine<SymbolKind>;
