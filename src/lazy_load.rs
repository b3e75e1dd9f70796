//! Deferred source assignment for grid tiles.
//!
//! Two strategies: intersection observation (each pending tile is watched
//! until a large enough slice of it is visible) and a sweep that runs a fixed
//! delay after scroll, resize and orientation signals, for hosts without intersection
//! support. Either way a tile gets its source at most once.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::config::{LazyLoadMode, LazyLoadOptions};
use crate::gallery::{Gallery, ImageId};
use crate::geometry::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Intersection,
    Fallback,
}

impl Strategy {
    pub fn resolve(mode: LazyLoadMode, supports_intersection: bool) -> Self {
        match mode {
            LazyLoadMode::Intersection => Self::Intersection,
            LazyLoadMode::Fallback => Self::Fallback,
            LazyLoadMode::Auto if supports_intersection => Self::Intersection,
            LazyLoadMode::Auto => Self::Fallback,
        }
    }
}

/// Fixed-delay timer for the fallback sweep.
///
/// The first signal arms it for `delay`. Signals while armed are absorbed and
/// never push the deadline back.
#[derive(Debug, Clone)]
pub struct SweepTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl SweepTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arms the timer unless it already is. Returns true when newly armed.
    pub fn signal(&mut self, now: Instant) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.delay);
        true
    }

    /// True once per armed period, when the deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[derive(Debug)]
pub struct LazyLoader {
    strategy: Strategy,
    threshold: f32,
    root_margin: f32,
    active: bool,
    observed: BTreeSet<ImageId>,
    pending: Vec<ImageId>,
    listening: bool,
    timer: SweepTimer,
}

impl LazyLoader {
    pub fn new(strategy: Strategy, opts: &LazyLoadOptions) -> Self {
        Self {
            strategy,
            threshold: opts.threshold,
            root_margin: opts.root_margin,
            active: false,
            observed: BTreeSet::new(),
            pending: Vec::new(),
            listening: false,
            timer: SweepTimer::new(opts.debounce),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Subscribes to viewport signals.
    pub fn start(&mut self) {
        self.active = true;
        self.listening = self.strategy == Strategy::Fallback;
    }

    /// Drops every subscription and watched tile.
    pub fn stop(&mut self, gallery: &mut Gallery) {
        self.active = false;
        self.listening = false;
        self.timer.cancel();
        for id in std::mem::take(&mut self.observed) {
            gallery.set_observed(id, false);
        }
        self.pending.clear();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether scroll/resize/orientation listeners are still registered (fallback only).
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn observed(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.observed.iter().copied()
    }

    /// Picks up tiles appended since the last call. Run once at start and after every batch.
    pub fn refresh(&mut self, gallery: &mut Gallery, viewport: &Viewport, now: Instant) -> Vec<ImageId> {
        if !self.active {
            return Vec::new();
        }
        match self.strategy {
            Strategy::Intersection => {
                for id in gallery.pending_ids() {
                    if self.observed.insert(id) {
                        gallery.set_observed(id, true);
                        trace!(image = id, "observing");
                    }
                }
                // A freshly observed tile reports its current intersection right away.
                self.check_intersections(gallery, viewport)
            }
            Strategy::Fallback => {
                self.pending = gallery.pending_ids();
                if !self.pending.is_empty() {
                    self.timer.signal(now);
                }
                Vec::new()
            }
        }
    }

    /// Scroll, resize or orientation change.
    pub fn on_viewport_change(
        &mut self,
        gallery: &mut Gallery,
        viewport: &Viewport,
        now: Instant,
    ) -> Vec<ImageId> {
        if !self.active {
            return Vec::new();
        }
        match self.strategy {
            Strategy::Intersection => self.check_intersections(gallery, viewport),
            Strategy::Fallback => {
                if self.listening {
                    self.timer.signal(now);
                }
                Vec::new()
            }
        }
    }

    /// Runs the fallback sweep once its timer expired.
    pub fn poll(&mut self, gallery: &mut Gallery, viewport: &Viewport, now: Instant) -> Vec<ImageId> {
        if !self.active || !self.timer.fire(now) {
            return Vec::new();
        }
        self.sweep(gallery, viewport)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    fn check_intersections(&mut self, gallery: &mut Gallery, viewport: &Viewport) -> Vec<ImageId> {
        let mut loaded = Vec::new();
        for id in self.observed.iter().copied().collect::<Vec<_>>() {
            let hidden = gallery.image(id).is_none_or(|img| img.hidden);
            if hidden {
                continue;
            }
            let client = viewport.client_rect(gallery.rect(id));
            let ratio = viewport.visible_ratio(client, self.root_margin);
            if ratio > 0.0 && ratio >= self.threshold {
                if gallery.assign_source(id) {
                    loaded.push(id);
                }
                self.observed.remove(&id);
                gallery.set_observed(id, false);
            }
        }
        if !loaded.is_empty() {
            debug!(count = loaded.len(), "intersection assigned sources");
        }
        loaded
    }

    fn sweep(&mut self, gallery: &mut Gallery, viewport: &Viewport) -> Vec<ImageId> {
        let mut loaded = Vec::new();
        self.pending.retain(|&id| {
            let Some(img) = gallery.image(id) else {
                return false;
            };
            if !img.pending {
                return false;
            }
            let client = viewport.client_rect(gallery.rect(id));
            if !img.hidden && viewport.overlaps_vertically(client) {
                gallery.assign_source(id);
                loaded.push(id);
                false
            } else {
                true
            }
        });
        if self.pending.is_empty() && self.listening {
            // One-shot: later batches rely on refresh(), not on these listeners.
            self.listening = false;
            debug!("all pending images loaded; removing viewport listeners");
        }
        if !loaded.is_empty() {
            debug!(count = loaded.len(), "fallback sweep assigned sources");
        }
        loaded
    }
}
