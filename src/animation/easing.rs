use serde::{Deserialize, Serialize};

/// Maps linear progress in `[0, 1]` to eased progress.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    /// Caller-supplied curve. Not representable in scene files.
    #[serde(skip)]
    Custom(fn(f64) -> f64),
}

/// Custom curves never compare equal, not even to themselves.
impl PartialEq for Easing {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Custom(_), _) | (_, Self::Custom(_)) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::Custom(curve) => curve(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Easing;

    #[test]
    fn builtin_curves_hit_both_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::EaseInCubic,
            Easing::EaseOutCubic,
            Easing::EaseInOutCubic,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-9, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-9, "{easing:?} at 1");
        }
    }

    #[test]
    fn ease_in_out_is_symmetric_at_midpoint() {
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-9);
        assert!((Easing::EaseInOutCubic.apply(0.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn custom_curve_is_used() {
        fn step(t: f64) -> f64 {
            if t < 0.5 {
                0.0
            } else {
                1.0
            }
        }
        assert_eq!(Easing::Custom(step).apply(0.4), 0.0);
        assert_eq!(Easing::Custom(step).apply(0.6), 1.0);
    }

    #[test]
    fn custom_curves_are_never_equal() {
        fn curve(t: f64) -> f64 {
            t
        }
        assert_ne!(Easing::Custom(curve), Easing::Custom(curve));
        assert_ne!(Easing::Custom(curve), Easing::Linear);
        assert_eq!(Easing::EaseOut, Easing::EaseOut);
        assert_ne!(Easing::EaseOut, Easing::EaseIn);
    }

    #[test]
    fn names_parse_from_yaml() {
        let easing: Easing = serde_yaml::from_str("ease_in_out").expect("easing should parse");
        assert_eq!(easing, Easing::EaseInOut);
    }
}
