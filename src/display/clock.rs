use std::thread;
use std::time::{Duration, Instant};

/// Source of frame timestamps for [`super::Display::run`].
pub trait FrameClock {
    /// Waits for the next frame and returns its timestamp in milliseconds,
    /// or `None` when no more frames should run.
    fn next_frame(&mut self) -> Option<f64>;
}

/// Real-time pacing at a fixed interval, measured from creation.
#[derive(Debug)]
pub struct IntervalClock {
    interval: Duration,
    origin: Instant,
    next_deadline: Instant,
    remaining: Option<u64>,
}

impl IntervalClock {
    pub fn new(fps: u32) -> Self {
        let interval = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
        let origin = Instant::now();
        Self {
            interval,
            origin,
            next_deadline: origin,
            remaining: None,
        }
    }

    /// Stops after `frames` frames.
    pub fn limited(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }
}

impl FrameClock for IntervalClock {
    fn next_frame(&mut self) -> Option<f64> {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.checked_sub(1)?;
        }
        let now = Instant::now();
        if now < self.next_deadline {
            thread::sleep(self.next_deadline - now);
        }
        self.next_deadline += self.interval;
        Some(self.origin.elapsed().as_secs_f64() * 1000.0)
    }
}

/// Deterministic timestamps `start, start + step, ...` without sleeping.
#[derive(Debug, Clone)]
pub struct SteppedClock {
    next: f64,
    step_ms: f64,
    remaining: u64,
}

impl SteppedClock {
    pub fn new(fps: u32, frames: u64) -> Self {
        Self::starting_at(0.0, fps, frames)
    }

    pub fn starting_at(start_ms: f64, fps: u32, frames: u64) -> Self {
        Self {
            next: start_ms,
            step_ms: 1000.0 / f64::from(fps.max(1)),
            remaining: frames,
        }
    }
}

impl FrameClock for SteppedClock {
    fn next_frame(&mut self) -> Option<f64> {
        self.remaining = self.remaining.checked_sub(1)?;
        let now = self.next;
        self.next += self.step_ms;
        Some(now)
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameClock, IntervalClock, SteppedClock};

    #[test]
    fn stepped_clock_counts_down() {
        let mut clock = SteppedClock::new(4, 3);
        assert_eq!(clock.next_frame(), Some(0.0));
        assert_eq!(clock.next_frame(), Some(250.0));
        assert_eq!(clock.next_frame(), Some(500.0));
        assert_eq!(clock.next_frame(), None);
    }

    #[test]
    fn interval_clock_is_monotonic_and_limited() {
        let mut clock = IntervalClock::new(1000).limited(2);
        let first = clock.next_frame().expect("first frame");
        let second = clock.next_frame().expect("second frame");
        assert!(second >= first);
        assert!(clock.next_frame().is_none());
    }
}
