//! Countdown timers grouped by tag
//!
//! Timers live in per-tag buckets. Only buckets whose tag is active are
//! advanced, so a whole group can be paused at once. Fired one-shot timers
//! and removed timers go back to a free list and are reused by the next
//! `later`/`interval` call.
//!
//! Callbacks receive a context `C`. Standalone managers usually use `()` or a
//! small state struct; the [`Game`](crate::Game) owns a `TimerManager<Game>`
//! whose callbacks get the game itself.

use ember_core::Result;
use std::collections::{HashMap, HashSet};

/// Identifies a timer within its manager
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct TimerId(u64);

pub type TimerCallback<C> = Box<dyn FnMut(&mut C) -> Result<()>>;

struct Timer<C> {
    duration: f64,
    remaining: f64,
    repeat: bool,
    removed: bool,
    paused: bool,
    tag: String,
    callback: Option<TimerCallback<C>>,
}

impl<C> Timer<C> {
    fn reinit(
        &mut self,
        tag: String,
        duration: f64,
        repeat: bool,
        callback: Option<TimerCallback<C>>,
    ) {
        self.duration = duration;
        self.remaining = duration;
        self.repeat = repeat;
        self.removed = false;
        self.paused = false;
        self.tag = tag;
        self.callback = callback;
    }
}

/// Pooled timers bucketed by tag
pub struct TimerManager<C> {
    timers: HashMap<TimerId, Timer<C>>,
    /// Tag -> timers in creation order
    buckets: HashMap<String, Vec<TimerId>>,
    /// Tags advanced each tick, in activation order
    active_tags: Vec<String>,
    paused_tags: HashSet<String>,
    pool: Vec<Timer<C>>,
    next_id: u64,
    default_tag: String,
}

impl<C> Default for TimerManager<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TimerManager<C> {
    pub fn new() -> Self {
        Self::with_default_tag("0")
    }

    pub fn with_default_tag(tag: impl Into<String>) -> Self {
        Self {
            timers: HashMap::new(),
            buckets: HashMap::new(),
            active_tags: Vec::new(),
            paused_tags: HashSet::new(),
            pool: Vec::new(),
            next_id: 1,
            default_tag: tag.into(),
        }
    }

    pub fn default_tag(&self) -> &str {
        &self.default_tag
    }

    /// Fire once after `duration` milliseconds
    pub fn later(
        &mut self,
        duration: f64,
        callback: impl FnMut(&mut C) -> Result<()> + 'static,
    ) -> TimerId {
        let tag = self.default_tag.clone();
        self.create(tag, duration, false, Some(Box::new(callback)))
    }

    /// Fire every `duration` milliseconds until removed
    pub fn interval(
        &mut self,
        duration: f64,
        callback: impl FnMut(&mut C) -> Result<()> + 'static,
    ) -> TimerId {
        let tag = self.default_tag.clone();
        self.create(tag, duration, true, Some(Box::new(callback)))
    }

    pub fn later_tagged(
        &mut self,
        tag: impl Into<String>,
        duration: f64,
        callback: impl FnMut(&mut C) -> Result<()> + 'static,
    ) -> TimerId {
        self.create(tag.into(), duration, false, Some(Box::new(callback)))
    }

    pub fn interval_tagged(
        &mut self,
        tag: impl Into<String>,
        duration: f64,
        callback: impl FnMut(&mut C) -> Result<()> + 'static,
    ) -> TimerId {
        self.create(tag.into(), duration, true, Some(Box::new(callback)))
    }

    /// Create a timer, reusing a pooled one when available.
    ///
    /// Negative or non-finite durations are coerced to zero, which fires on
    /// the next tick.
    pub fn create(
        &mut self,
        tag: String,
        duration: f64,
        repeat: bool,
        callback: Option<TimerCallback<C>>,
    ) -> TimerId {
        let duration = if duration.is_finite() && duration >= 0.0 {
            duration
        } else {
            log::warn!("timer duration {duration} is invalid, using 0");
            0.0
        };

        let id = TimerId(self.next_id);
        self.next_id += 1;

        let timer = match self.pool.pop() {
            Some(mut timer) => {
                timer.reinit(tag.clone(), duration, repeat, callback);
                timer
            }
            None => Timer {
                duration,
                remaining: duration,
                repeat,
                removed: false,
                paused: false,
                tag: tag.clone(),
                callback,
            },
        };
        self.timers.insert(id, timer);

        if !self.buckets.contains_key(&tag) && !self.paused_tags.contains(&tag) {
            self.active_tags.push(tag.clone());
        }
        self.buckets.entry(tag).or_default().push(id);
        id
    }

    /// Remove a timer and return it to the pool. Returns false if unknown.
    pub fn remove(&mut self, id: TimerId) -> bool {
        let Some(mut timer) = self.timers.remove(&id) else {
            return false;
        };
        timer.removed = true;

        if let Some(bucket) = self.buckets.get_mut(&timer.tag) {
            bucket.retain(|t| *t != id);
            if bucket.is_empty() {
                self.buckets.remove(&timer.tag);
                self.active_tags.retain(|t| *t != timer.tag);
            }
        }

        timer.callback = None;
        self.pool.push(timer);
        true
    }

    /// Remove every timer carrying `tag`, returning how many were removed
    pub fn remove_tag(&mut self, tag: &str) -> usize {
        let ids = self.buckets.get(tag).cloned().unwrap_or_default();
        ids.into_iter().filter(|id| self.remove(*id)).count()
    }

    pub fn pause(&mut self, id: TimerId) -> bool {
        self.set_paused(id, true)
    }

    pub fn resume(&mut self, id: TimerId) -> bool {
        self.set_paused(id, false)
    }

    fn set_paused(&mut self, id: TimerId, paused: bool) -> bool {
        match self.timers.get_mut(&id) {
            Some(timer) => {
                timer.paused = paused;
                true
            }
            None => false,
        }
    }

    pub fn is_paused(&self, id: TimerId) -> bool {
        self.timers.get(&id).map(|t| t.paused).unwrap_or(false)
    }

    /// Stop advancing every timer in a tag group. Timers created later with
    /// this tag start paused too, until `resume_tag`.
    pub fn pause_tag(&mut self, tag: &str) {
        self.paused_tags.insert(tag.to_string());
        self.active_tags.retain(|t| t != tag);
    }

    pub fn resume_tag(&mut self, tag: &str) {
        if !self.paused_tags.remove(tag) {
            return;
        }
        if self.buckets.contains_key(tag) && !self.active_tags.iter().any(|t| t == tag) {
            self.active_tags.push(tag.to_string());
        }
    }

    pub fn is_tag_active(&self, tag: &str) -> bool {
        self.active_tags.iter().any(|t| t == tag)
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Milliseconds left before the timer fires
    pub fn remaining(&self, id: TimerId) -> Option<f64> {
        self.timers.get(&id).map(|t| t.remaining)
    }

    pub fn tag_of(&self, id: TimerId) -> Option<&str> {
        self.timers.get(&id).map(|t| t.tag.as_str())
    }

    /// Number of live timers
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Number of idle timers waiting for reuse
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Count down every timer in an active bucket and return the ones that
    /// reached zero, in bucket order. Nothing is fired yet.
    pub fn advance(&mut self, dt_ms: f64) -> Vec<TimerId> {
        let mut due = Vec::new();
        for tag in &self.active_tags {
            let Some(bucket) = self.buckets.get(tag) else {
                continue;
            };
            for id in bucket {
                let Some(timer) = self.timers.get_mut(id) else {
                    continue;
                };
                if timer.removed || timer.paused {
                    continue;
                }
                timer.remaining -= dt_ms;
                if timer.remaining <= 0.0 {
                    due.push(*id);
                }
            }
        }
        due
    }

    /// Take a due timer's callback out for invocation.
    ///
    /// Returns `None` if the timer was removed since `advance`, otherwise the
    /// callback (which may itself be absent).
    pub fn begin_fire(&mut self, id: TimerId) -> Option<Option<TimerCallback<C>>> {
        let timer = self.timers.get_mut(&id)?;
        if timer.removed {
            return None;
        }
        Some(timer.callback.take())
    }

    /// Put the callback back and either rearm the timer or retire it
    pub fn finish_fire(&mut self, id: TimerId, callback: Option<TimerCallback<C>>) {
        let Some(timer) = self.timers.get_mut(&id) else {
            // Removed from inside its own callback
            return;
        };
        timer.callback = callback;
        if timer.repeat {
            timer.remaining = timer.duration;
        } else {
            self.remove(id);
        }
    }

    /// Advance and fire in one call, for managers that don't live inside
    /// their own callback context
    pub fn tick(&mut self, ctx: &mut C, dt_ms: f64) {
        for id in self.advance(dt_ms) {
            if let Some(callback) = self.begin_fire(id) {
                let callback = invoke(id, callback, ctx);
                self.finish_fire(id, callback);
            }
        }
    }
}

/// Run a taken callback, logging a failure instead of propagating it
pub fn invoke<C>(
    id: TimerId,
    callback: Option<TimerCallback<C>>,
    ctx: &mut C,
) -> Option<TimerCallback<C>> {
    callback.map(|mut f| {
        if let Err(e) = f(ctx) {
            log::error!("timer {:?} callback failed: {}", id, e);
        }
        f
    })
}
