//! Time-driven property animation.
//!
//! One [`AnimationEngine`] exists per value shape (symbol sequences, colors,
//! scalar values). Each engine keeps at most one [`AnimationInstance`] per
//! tile id; an instance animates several fields independently, each on its
//! own [`Timeline`]. Timelines can loop, ping-pong, and chain into a `next`
//! timeline; `chain_loop` restarts a finished chain from the copy captured
//! when the instance was added.

mod color;
mod easing;
mod symbol;
mod value;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::logging::Logger;
use crate::tile::TileId;

pub use color::{ColorAnimation, ColorAnimationEngine, ColorBounds, ColorField, ColorKind};
pub use easing::Easing;
pub use symbol::{
    SymbolAnimation, SymbolAnimationEngine, SymbolBounds, SymbolField, SymbolKind,
};
pub use value::{ValueAnimation, ValueAnimationEngine, ValueBounds, ValueField, ValueKind};

/// Describes one family of animatable fields and how to interpolate them.
pub trait AnimationKind {
    const NAME: &'static str;

    type Field: Copy + Ord + fmt::Debug;
    type Bounds: Clone + fmt::Debug;
    type Value;

    /// Resolves the value at eased `progress`, or `None` when the bounds
    /// cannot produce one.
    fn interpolate(bounds: &Self::Bounds, progress: f64, logger: &dyn Logger)
        -> Option<Self::Value>;
}

/// One animated field: how long, how it repeats, and between which values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline<B> {
    /// Seconds for one pass. Zero or negative means the pass is already over.
    pub duration: f64,
    #[serde(default)]
    pub reverse: bool,
    #[serde(default, rename = "loop")]
    pub looped: bool,
    #[serde(default)]
    pub chain_loop: bool,
    #[serde(default)]
    pub progress_offset: f64,
    #[serde(default)]
    pub easing: Easing,
    #[serde(flatten)]
    pub bounds: B,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<Timeline<B>>>,
}

impl<B> Timeline<B> {
    pub fn new(duration: f64, bounds: B) -> Self {
        Self {
            duration,
            reverse: false,
            looped: false,
            chain_loop: false,
            progress_offset: 0.0,
            easing: Easing::Linear,
            bounds,
            next: None,
        }
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn looping(mut self) -> Self {
        self.looped = true;
        self
    }

    pub fn chain_looping(mut self) -> Self {
        self.chain_loop = true;
        self
    }

    pub fn with_offset(mut self, progress_offset: f64) -> Self {
        self.progress_offset = progress_offset;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Appends `next` to the end of this chain.
    pub fn then(mut self, next: Timeline<B>) -> Self {
        let tail = match self.next.take() {
            Some(existing) => (*existing).then(next),
            None => next,
        };
        self.next = Some(Box::new(tail));
        self
    }

    pub fn is_chained(&self) -> bool {
        self.next.is_some() || self.chain_loop
    }

    pub fn chain_len(&self) -> usize {
        1 + self.next.as_ref().map_or(0, |next| next.chain_len())
    }
}

/// The fields an animation call wants to drive. Without an explicit start
/// timestamp (ms) the animation starts at the first update after `add`,
/// pushed back by `delay` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyBag<F: Ord, B> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub delay: f64,
    pub fields: BTreeMap<F, Timeline<B>>,
}

impl<F: Ord, B> Default for PropertyBag<F, B> {
    fn default() -> Self {
        Self {
            start_time: None,
            delay: 0.0,
            fields: BTreeMap::new(),
        }
    }
}

impl<F: Ord, B> PropertyBag<F, B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: F, timeline: Timeline<B>) -> Self {
        self.fields.insert(field, timeline);
        self
    }

    pub fn starting_at(mut self, start_time: f64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn delayed(mut self, seconds: f64) -> Self {
        self.delay = seconds;
        self
    }
}

pub type Bag<K> = PropertyBag<<K as AnimationKind>::Field, <K as AnimationKind>::Bounds>;

#[derive(Debug, Clone)]
struct Track<B> {
    timeline: Timeline<B>,
    segment_start: Option<f64>,
    finished: bool,
}

/// Live state for one id inside one engine.
#[derive(Debug, Clone)]
pub struct AnimationInstance<F, B> {
    start_time: Option<f64>,
    delay_ms: f64,
    running: bool,
    tracks: BTreeMap<F, Track<B>>,
    template: BTreeMap<F, Timeline<B>>,
}

impl<F: Copy + Ord, B> AnimationInstance<F, B> {
    /// `None` until the first update resolves a deferred start.
    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn fields(&self) -> impl Iterator<Item = F> + '_ {
        self.tracks.keys().copied()
    }

    /// The link of the chain currently playing for `field`.
    pub fn timeline(&self, field: F) -> Option<&Timeline<B>> {
        self.tracks.get(&field).map(|track| &track.timeline)
    }

    /// The chain as it was handed to `add`.
    pub fn template(&self, field: F) -> Option<&Timeline<B>> {
        self.template.get(&field)
    }

    pub fn is_field_finished(&self, field: F) -> bool {
        self.tracks.get(&field).map_or(true, |track| track.finished)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AnimationMetrics {
    pub running: usize,
    pub total: usize,
}

pub struct AnimationEngine<K: AnimationKind> {
    instances: BTreeMap<TileId, AnimationInstance<K::Field, K::Bounds>>,
    logger: Rc<dyn Logger>,
}

impl<K: AnimationKind> AnimationEngine<K> {
    pub fn new(logger: Rc<dyn Logger>) -> Self {
        Self {
            instances: BTreeMap::new(),
            logger,
        }
    }

    /// Starts animating `id`, replacing whatever instance it had.
    pub fn add(&mut self, id: TileId, bag: Bag<K>) {
        let delay_ms = if bag.delay.is_finite() { bag.delay.max(0.0) * 1000.0 } else { 0.0 };
        let start_time = bag.start_time.map(|start| start + delay_ms);
        if bag.fields.is_empty() {
            self.logger
                .debug(&format!("{} animation for {id} has no fields", K::NAME));
        }

        let tracks = bag
            .fields
            .iter()
            .map(|(field, timeline)| {
                (
                    *field,
                    Track {
                        timeline: timeline.clone(),
                        segment_start: start_time,
                        finished: false,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();

        self.instances.insert(
            id,
            AnimationInstance {
                start_time,
                delay_ms,
                running: !tracks.is_empty(),
                tracks,
                template: bag.fields,
            },
        );
    }

    /// Advances every running instance to `now` and pushes each resolved
    /// value into `sink`. Returns how many values were pushed.
    pub fn update(
        &mut self,
        now: f64,
        sink: &mut dyn FnMut(TileId, K::Field, K::Value),
    ) -> usize {
        let logger = self.logger.as_ref();
        let mut pushed = 0;

        for (id, instance) in &mut self.instances {
            if !instance.running {
                continue;
            }
            let start = *instance.start_time.get_or_insert(now + instance.delay_ms);
            if now < start {
                continue;
            }

            for (field, track) in &mut instance.tracks {
                if track.finished {
                    continue;
                }
                let Some(template) = instance.template.get(field) else {
                    continue;
                };

                let segment_start = *track.segment_start.get_or_insert(start);
                let step = step_track(track, segment_start, template, now);
                match K::interpolate(&step.bounds, step.eased, logger) {
                    Some(value) => {
                        sink(*id, *field, value);
                        pushed += 1;
                    }
                    None => logger.debug(&format!(
                        "{} animation for {id} skipped field {field:?}",
                        K::NAME
                    )),
                }
            }

            if instance.tracks.values().all(|track| track.finished) {
                instance.running = false;
            }
        }

        pushed
    }

    pub fn get(&self, id: TileId) -> Option<&AnimationInstance<K::Field, K::Bounds>> {
        self.instances.get(&id)
    }

    pub fn is_animating(&self, id: TileId) -> bool {
        self.instances
            .get(&id)
            .is_some_and(|instance| instance.running)
    }

    /// Halts `id` in place; its instance stays registered.
    pub fn stop(&mut self, id: TileId) {
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.running = false;
        }
    }

    pub fn clear(&mut self, id: TileId) {
        self.instances.remove(&id);
    }

    pub fn clear_all(&mut self) {
        self.instances.clear();
    }

    pub fn metrics(&self) -> AnimationMetrics {
        AnimationMetrics {
            running: self
                .instances
                .values()
                .filter(|instance| instance.running)
                .count(),
            total: self.instances.len(),
        }
    }

    pub fn has_running(&self) -> bool {
        self.instances.values().any(|instance| instance.running)
    }
}

struct Step<B> {
    bounds: B,
    eased: f64,
}

/// Resolves one track at `now`, advancing its chain when a link completes.
/// The returned bounds belong to the link that produced the value.
fn step_track<B: Clone>(
    track: &mut Track<B>,
    segment_start: f64,
    template: &Timeline<B>,
    now: f64,
) -> Step<B> {
    let timeline = &track.timeline;
    let has_duration = timeline.duration.is_finite() && timeline.duration > 0.0;
    let raw = if has_duration {
        (now - segment_start) / 1000.0 / timeline.duration + timeline.progress_offset
    } else {
        1.0
    };
    let raw = if raw.is_finite() { raw } else { 1.0 };

    let wraps = has_duration && timeline.looped && !timeline.is_chained();
    let (resolved, completed) = if wraps {
        (wrap_progress(raw, timeline.reverse), false)
    } else {
        let clamped = raw.clamp(0.0, 1.0);
        let resolved = if timeline.reverse {
            1.0 - (2.0 * clamped - 1.0).abs()
        } else {
            clamped
        };
        (resolved, clamped >= 1.0)
    };

    let step = Step {
        bounds: timeline.bounds.clone(),
        eased: timeline.easing.apply(resolved),
    };

    if completed {
        let carry_chain_loop = track.timeline.chain_loop;
        if let Some(next) = track.timeline.next.take() {
            track.timeline = *next;
            track.timeline.chain_loop |= carry_chain_loop;
            track.segment_start = Some(now);
        } else if carry_chain_loop {
            track.timeline = template.clone();
            track.timeline.chain_loop = true;
            track.segment_start = Some(now);
        } else {
            track.finished = true;
        }
    }

    step
}

fn wrap_progress(progress: f64, reverse: bool) -> f64 {
    if reverse {
        let phase = progress.rem_euclid(2.0);
        if phase > 1.0 {
            2.0 - phase
        } else {
            phase
        }
    } else {
        progress.rem_euclid(1.0)
    }
}
