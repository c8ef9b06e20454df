use serde::Serialize;

use crate::animation::AnimationMetrics;

/// Weight given to the newest sample in the smoothed durations.
const SMOOTHING: f64 = 0.1;
const FPS_BUCKET_MS: f64 = 1000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnimationCounts {
    pub symbol: AnimationMetrics,
    pub color: AnimationMetrics,
    pub value: AnimationMetrics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    /// Frames counted in the last complete one-second bucket.
    pub fps: f64,
    /// Smoothed repaint time in milliseconds.
    pub render_ms: f64,
    /// Smoothed animation-advance time in milliseconds.
    pub animation_ms: f64,
    pub frames: u64,
    pub tiles: usize,
    pub animations: AnimationCounts,
}

#[derive(Debug, Default)]
pub(super) struct FrameStats {
    metrics: PerformanceMetrics,
    bucket_start: Option<f64>,
    bucket_frames: u32,
    render_samples: u64,
    animation_samples: u64,
}

impl FrameStats {
    pub(super) fn metrics(&self) -> PerformanceMetrics {
        self.metrics
    }

    pub(super) fn record_frame(&mut self, now: f64) {
        self.metrics.frames += 1;
        // The frame that opens a bucket is the interval boundary, not a frame
        // inside it.
        let Some(start) = self.bucket_start else {
            self.bucket_start = Some(now);
            return;
        };
        self.bucket_frames += 1;
        let elapsed = now - start;
        if elapsed >= FPS_BUCKET_MS {
            self.metrics.fps = f64::from(self.bucket_frames) * FPS_BUCKET_MS / elapsed;
            self.bucket_start = Some(now);
            self.bucket_frames = 0;
        }
    }

    pub(super) fn record_render(&mut self, ms: f64) {
        self.render_samples += 1;
        self.metrics.render_ms = smooth(self.metrics.render_ms, ms, self.render_samples);
    }

    pub(super) fn record_animation(&mut self, ms: f64) {
        self.animation_samples += 1;
        self.metrics.animation_ms = smooth(self.metrics.animation_ms, ms, self.animation_samples);
    }

    pub(super) fn set_counts(&mut self, tiles: usize, animations: AnimationCounts) {
        self.metrics.tiles = tiles;
        self.metrics.animations = animations;
    }
}

fn smooth(previous: f64, sample: f64, samples: u64) -> f64 {
    if samples <= 1 {
        sample
    } else {
        previous + (sample - previous) * SMOOTHING
    }
}
