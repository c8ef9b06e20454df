use serde::{Deserialize, Serialize};

use super::{AnimationEngine, AnimationKind, PropertyBag};
use crate::logging::Logger;

/// Numeric tile fields a value animation can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueField {
    X,
    Y,
    ScaleX,
    ScaleY,
    Rotation,
    BgPercent,
    OffsetSymbolX,
    OffsetSymbolY,
}

impl ValueField {
    pub fn is_position(self) -> bool {
        matches!(self, Self::X | Self::Y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueBounds {
    /// Absolute endpoints.
    Span { start: f64, end: f64 },
    /// `offset + range * progress`.
    Shift { offset: f64, range: f64 },
}

impl ValueBounds {
    pub fn span(start: f64, end: f64) -> Self {
        Self::Span { start, end }
    }

    pub fn shift(offset: f64, range: f64) -> Self {
        Self::Shift { offset, range }
    }

    /// How far the value travels over a full pass.
    pub fn displacement(&self) -> f64 {
        match *self {
            Self::Span { start, end } => end - start,
            Self::Shift { range, .. } => range,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ValueKind;

impl AnimationKind for ValueKind {
    const NAME: &'static str = "value";

    type Field = ValueField;
    type Bounds = ValueBounds;
    type Value = f64;

    fn interpolate(bounds: &ValueBounds, progress: f64, logger: &dyn Logger) -> Option<f64> {
        let (base, delta) = match *bounds {
            ValueBounds::Span { start, end } => (start, end - start),
            ValueBounds::Shift { offset, range } => (offset, range),
        };
        let value = base + delta * progress;
        if value.is_finite() {
            Some(value)
        } else {
            logger.warn(&format!("value animation bounds {bounds:?} do not resolve to a number"));
            None
        }
    }
}

pub type ValueAnimation = PropertyBag<ValueField, ValueBounds>;
pub type ValueAnimationEngine = AnimationEngine<ValueKind>;

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use log::Level;

    use super::{ValueAnimation, ValueAnimationEngine, ValueBounds, ValueField, ValueKind};
    use crate::animation::{AnimationKind, Timeline};
    use crate::logging::MemoryLogger;
    use crate::tile::TileId;

    #[test]
    fn span_and_shift_interpolate() {
        let logger = MemoryLogger::new();
        assert_eq!(
            ValueKind::interpolate(&ValueBounds::span(2.0, 6.0), 0.25, &logger),
            Some(3.0)
        );
        assert_eq!(
            ValueKind::interpolate(&ValueBounds::shift(10.0, -4.0), 0.5, &logger),
            Some(8.0)
        );
    }

    #[test]
    fn non_finite_bounds_are_skipped_and_logged() {
        let logger = Rc::new(MemoryLogger::new());
        let mut engine = ValueAnimationEngine::new(logger.clone());
        let id = TileId::from_raw(20);
        engine.add(
            id,
            ValueAnimation::new()
                .starting_at(0.0)
                .with(ValueField::X, Timeline::new(1.0, ValueBounds::span(f64::NAN, 1.0)))
                .with(ValueField::Y, Timeline::new(1.0, ValueBounds::span(0.0, 2.0))),
        );

        let mut seen = Vec::new();
        let pushed = engine.update(500.0, &mut |_, field, value| seen.push((field, value)));
        assert_eq!(pushed, 1);
        assert_eq!(seen, vec![(ValueField::Y, 1.0)]);
        assert!(logger.contains(Level::Warn, "do not resolve"));
    }

    #[test]
    fn clamps_at_one_after_duration() {
        let mut engine = ValueAnimationEngine::new(Rc::new(MemoryLogger::new()));
        let id = TileId::from_raw(21);
        let start = 1_234.0;
        engine.add(
            id,
            ValueAnimation::new()
                .starting_at(start)
                .with(ValueField::ScaleY, Timeline::new(2.5, ValueBounds::span(0.0, 1.0))),
        );

        let mut last = None;
        engine.update(start + 2_500.0, &mut |_, _, value| last = Some(value));
        assert_eq!(last, Some(1.0));
        engine.update(start + 9_000.0, &mut |_, _, value| last = Some(value));
        assert!(last.unwrap() <= 1.0);
    }

    #[test]
    fn reversing_loop_repeats_every_two_periods() {
        let mut engine = ValueAnimationEngine::new(Rc::new(MemoryLogger::new()));
        let id = TileId::from_raw(22);
        engine.add(
            id,
            ValueAnimation::new().starting_at(0.0).with(
                ValueField::Rotation,
                Timeline::new(1.0, ValueBounds::span(0.0, 1.0))
                    .looping()
                    .reversed(),
            ),
        );

        let mut sample = |now: f64| {
            let mut value = None;
            engine.update(now, &mut |_, _, v| value = Some(v));
            value.expect("looping animation always produces a value")
        };
        let first = sample(250.0);
        let mirrored = sample(1_750.0);
        let repeated = sample(2_250.0);
        assert_eq!(first, 0.25);
        assert_eq!(mirrored, 0.25);
        assert_eq!(first, repeated);
    }

    #[test]
    fn bounds_parse_from_either_shape() {
        let span: ValueBounds = serde_yaml::from_str("{ start: 1, end: 3 }").unwrap();
        let shift: ValueBounds = serde_yaml::from_str("{ offset: 1, range: 3 }").unwrap();
        assert_eq!(span.displacement(), 2.0);
        assert_eq!(shift.displacement(), 3.0);
    }
}
