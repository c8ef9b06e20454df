use serde::{Deserialize, Serialize};

use crate::animation::Easing;

/// How much larger than the viewport the backing window is.
pub const RENDER_WINDOW_SCALE: f64 = 1.4;
/// Fraction of the viewport size that counts as "near the window edge".
pub const RECENTER_MARGIN: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Whether the integer cell is at least partly on screen.
    pub fn contains_cell(&self, x: i64, y: i64) -> bool {
        let (x, y) = (x as f64, y as f64);
        x + 1.0 > self.x
            && x < self.x + f64::from(self.width)
            && y + 1.0 > self.y
            && y < self.y + f64::from(self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportOptions {
    pub smooth: bool,
    /// Seconds.
    pub duration: f64,
    pub easing: Easing,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            smooth: false,
            duration: 0.3,
            easing: Easing::EaseInOut,
        }
    }
}

impl ViewportOptions {
    pub fn smooth(duration: f64) -> Self {
        Self {
            smooth: true,
            duration,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    from: (f64, f64),
    to: (f64, f64),
    /// Set by the first frame that sees the transition.
    started_at: Option<f64>,
    duration: f64,
    easing: Easing,
}

/// The padded world rectangle backed by the render canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderBounds {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl RenderBounds {
    /// A window about [`RENDER_WINDOW_SCALE`] times the viewport, centered on
    /// it and clamped to the world.
    pub fn around(viewport: &Viewport, world_width: u32, world_height: u32) -> Self {
        let (x, width) = centered_span(viewport.x, viewport.width, world_width);
        let (y, height) = centered_span(viewport.y, viewport.height, world_height);
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains_cell(&self, x: i64, y: i64) -> bool {
        x >= self.x
            && y >= self.y
            && x < self.x + i64::from(self.width)
            && y < self.y + i64::from(self.height)
    }

    pub fn contains_viewport(&self, viewport: &Viewport) -> bool {
        viewport.x >= self.x as f64
            && viewport.y >= self.y as f64
            && viewport.x + f64::from(viewport.width) <= (self.x + i64::from(self.width)) as f64
            && viewport.y + f64::from(viewport.height) <= (self.y + i64::from(self.height)) as f64
    }

    /// Whether the window should move for `viewport`. Outside a transition
    /// that is whenever the viewport is inside the edge margin on a side the
    /// window can still move toward; during one only when the viewport has
    /// left the window entirely.
    pub fn needs_recenter(
        &self,
        viewport: &Viewport,
        world_width: u32,
        world_height: u32,
        transitioning: bool,
    ) -> bool {
        if !self.contains_viewport(viewport) {
            return true;
        }
        if transitioning {
            return false;
        }

        let margin_x = f64::from(viewport.width) * RECENTER_MARGIN;
        let margin_y = f64::from(viewport.height) * RECENTER_MARGIN;
        let left = self.x as f64;
        let top = self.y as f64;
        let right = (self.x + i64::from(self.width)) as f64;
        let bottom = (self.y + i64::from(self.height)) as f64;

        (viewport.x - left < margin_x && self.x > 0)
            || (right - (viewport.x + f64::from(viewport.width)) < margin_x
                && right < f64::from(world_width))
            || (viewport.y - top < margin_y && self.y > 0)
            || (bottom - (viewport.y + f64::from(viewport.height)) < margin_y
                && bottom < f64::from(world_height))
    }
}

fn centered_span(origin: f64, size: u32, world: u32) -> (i64, u32) {
    let span = ((f64::from(size) * RENDER_WINDOW_SCALE).ceil() as u32).clamp(size.min(world), world);
    let center = origin + f64::from(size) / 2.0;
    let start = (center - f64::from(span) / 2.0).round() as i64;
    (start.clamp(0, i64::from(world - span)), span)
}

/// Owns the viewport, its optional in-flight transition and the world size
/// it is clamped to.
#[derive(Debug, Clone)]
pub struct ViewportController {
    viewport: Viewport,
    world_width: u32,
    world_height: u32,
    transition: Option<Transition>,
}

impl ViewportController {
    pub fn new(width: u32, height: u32, world_width: u32, world_height: u32) -> Self {
        Self {
            viewport: Viewport {
                x: 0.0,
                y: 0.0,
                width: width.min(world_width),
                height: height.min(world_height),
            },
            world_width,
            world_height,
            transition: None,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Clamps `(x, y)` so the viewport stays inside the world.
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        let max_x = f64::from(self.world_width - self.viewport.width);
        let max_y = f64::from(self.world_height - self.viewport.height);
        let x = if x.is_finite() { x } else { self.viewport.x };
        let y = if y.is_finite() { y } else { self.viewport.y };
        (x.round().clamp(0.0, max_x), y.round().clamp(0.0, max_y))
    }

    /// Moves the viewport, replacing any transition in flight. Returns
    /// whether anything changed.
    pub fn set(&mut self, x: f64, y: f64, options: &ViewportOptions) -> bool {
        let target = self.clamp(x, y);
        let current = (self.viewport.x, self.viewport.y);

        if options.smooth && options.duration > 0.0 && target != current {
            self.transition = Some(Transition {
                from: current,
                to: target,
                started_at: None,
                duration: options.duration,
                easing: options.easing,
            });
            return true;
        }

        self.transition = None;
        if target == current {
            return false;
        }
        self.viewport.x = target.0;
        self.viewport.y = target.1;
        true
    }

    /// Steps the transition to `now` (ms). Returns whether the viewport moved.
    pub fn advance(&mut self, now: f64) -> bool {
        let Some(transition) = self.transition.as_mut() else {
            return false;
        };
        let started_at = *transition.started_at.get_or_insert(now);
        let progress = ((now - started_at) / 1000.0 / transition.duration).clamp(0.0, 1.0);
        let eased = transition.easing.apply(progress);
        let (from, to) = (transition.from, transition.to);

        let previous = (self.viewport.x, self.viewport.y);
        if progress >= 1.0 {
            self.viewport.x = to.0;
            self.viewport.y = to.1;
            self.transition = None;
        } else {
            self.viewport.x = from.0 + (to.0 - from.0) * eased;
            self.viewport.y = from.1 + (to.1 - from.1) * eased;
        }
        previous != (self.viewport.x, self.viewport.y)
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderBounds, Viewport, ViewportController, ViewportOptions};
    use crate::animation::Easing;

    fn viewport(x: f64, y: f64, width: u32, height: u32) -> Viewport {
        Viewport {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn window_is_padded_and_clamped_to_the_world() {
        let bounds = RenderBounds::around(&viewport(0.0, 0.0, 10, 10), 100, 100);
        assert_eq!(bounds, RenderBounds { x: 0, y: 0, width: 14, height: 14 });

        let bounds = RenderBounds::around(&viewport(40.0, 40.0, 10, 10), 100, 100);
        assert_eq!((bounds.x, bounds.y), (38, 38));

        let bounds = RenderBounds::around(&viewport(0.0, 0.0, 5, 5), 6, 6);
        assert_eq!((bounds.width, bounds.height), (6, 6));
    }

    #[test]
    fn recenters_only_near_a_movable_edge() {
        let bounds = RenderBounds::around(&viewport(0.0, 0.0, 10, 10), 100, 100);
        assert!(!bounds.needs_recenter(&viewport(0.0, 0.0, 10, 10), 100, 100, false));
        assert!(!bounds.needs_recenter(&viewport(1.0, 1.0, 10, 10), 100, 100, false));
        assert!(bounds.needs_recenter(&viewport(3.0, 0.0, 10, 10), 100, 100, false));
    }

    #[test]
    fn transitions_recenter_only_when_viewport_escapes() {
        let bounds = RenderBounds::around(&viewport(0.0, 0.0, 10, 10), 100, 100);
        assert!(!bounds.needs_recenter(&viewport(3.0, 0.0, 10, 10), 100, 100, true));
        assert!(bounds.needs_recenter(&viewport(4.5, 0.0, 10, 10), 100, 100, true));
    }

    #[test]
    fn set_clamps_to_world() {
        let mut controller = ViewportController::new(5, 5, 10, 10);
        assert!(controller.set(20.0, -3.0, &ViewportOptions::default()));
        let view = controller.viewport();
        assert_eq!((view.x, view.y), (5.0, 0.0));
        assert!(!controller.set(5.0, 0.0, &ViewportOptions::default()));
    }

    #[test]
    fn smooth_transition_reaches_target_and_can_be_replaced() {
        let mut controller = ViewportController::new(5, 5, 20, 20);
        let options = ViewportOptions {
            smooth: true,
            duration: 1.0,
            easing: Easing::Linear,
        };
        controller.set(10.0, 0.0, &options);
        assert!(!controller.advance(100.0));
        assert!(controller.advance(600.0));
        assert_eq!(controller.viewport().x, 5.0);

        controller.set(0.0, 4.0, &options);
        controller.advance(1_000.0);
        controller.advance(3_000.0);
        let view = controller.viewport();
        assert_eq!((view.x, view.y), (0.0, 4.0));
        assert!(!controller.is_transitioning());
    }
}
