//! Step and delay schedules for the two bounce phases
//!
//! A phase of extent `h` plays the steps `1, 2, .., h, h-1, .., 0`. Step `k`
//! is applied `delays[k]` milliseconds after the phase starts. The gap between
//! two steps grows as the marker approaches the top of its travel
//! (`round(speed / (h - p))`) and shrinks again on the way back, so the motion
//! slows into the apex and speeds out of it.
//!
//! Schedules only depend on `(phase, extent[, speed])` and are memoized in a
//! process-wide, write-once cache shared by every marker.

use crate::core::config::AnimationConfig;
use crate::prelude::{Arc, HashMap};
use crate::traits::{CacheStats, Cacheable};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// One of the two animation segments composing a bounce cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Icon jumps up and falls back, shadow slides along its angle
    Move,
    /// Icon squashes against the ground and expands again
    Resize,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Move => write!(f, "move"),
            Phase::Resize => write!(f, "resize"),
        }
    }
}

/// Rise-then-fall step sequence of length `2 * extent`
pub fn compute_steps(extent: u32) -> Vec<u32> {
    (1..=extent).chain((0..extent).rev()).collect()
}

/// Gap in milliseconds before each step, length `2 * extent`
pub fn compute_deltas(extent: u32, speed: u64) -> Vec<u64> {
    let delta = |position: u32| -> u64 {
        if position == 0 {
            0
        } else if position >= extent {
            speed
        } else {
            (speed as f64 / (extent - position) as f64).round() as u64
        }
    };

    (0..extent).chain((1..=extent).rev()).map(delta).collect()
}

/// Absolute delay of each step from the start of the phase
pub fn compute_delays(extent: u32, speed: u64) -> Vec<u64> {
    compute_deltas(extent, speed)
        .into_iter()
        .scan(0u64, |total, delta| {
            *total = total.saturating_add(delta);
            Some(*total)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepsKey {
    pub phase: Phase,
    pub extent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelaysKey {
    pub phase: Phase,
    pub extent: u32,
    pub speed: u64,
}

/// Write-once memo table with hit/miss accounting
#[derive(Debug)]
pub struct MemoTable<K, V> {
    entries: RwLock<HashMap<K, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> Default for MemoTable<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl<K, V> MemoTable<K, V>
where
    K: Clone + Eq + std::hash::Hash,
    V: Clone,
{
    /// Returns the cached value for `key`, computing and storing it on a miss
    pub fn get_or_compute(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get_cached(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return value;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.cache(key, compute())
    }
}

impl<K, V> Cacheable for MemoTable<K, V>
where
    K: Clone + Eq + std::hash::Hash,
    V: Clone,
{
    type Key = K;
    type Value = V;

    fn get_cached(&self, key: &K) -> Option<V> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn cache(&self, key: K, value: V) -> V {
        match self.entries.write() {
            Ok(mut entries) => entries.entry(key).or_insert(value).clone(),
            // A poisoned table still hands out correct, just uncached, values
            Err(_) => value,
        }
    }

    fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.read().map(|e| e.len()).unwrap_or(0),
        }
    }
}

static GLOBAL_CACHE: Lazy<Arc<TimelineCache>> = Lazy::new(|| Arc::new(TimelineCache::new()));

/// Memoizes step and delay schedules
#[derive(Debug, Default)]
pub struct TimelineCache {
    steps: MemoTable<StepsKey, Arc<[u32]>>,
    delays: MemoTable<DelaysKey, Arc<[u64]>>,
}

impl TimelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache
    pub fn global() -> Arc<TimelineCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    pub fn steps(&self, extent: u32, phase: Phase) -> Arc<[u32]> {
        self.steps
            .get_or_compute(StepsKey { phase, extent }, || {
                log::debug!("computing {} steps for extent {}", phase, extent);
                compute_steps(extent).into()
            })
    }

    pub fn delays(&self, extent: u32, speed: u64, phase: Phase) -> Arc<[u64]> {
        self.delays.get_or_compute(
            DelaysKey {
                phase,
                extent,
                speed,
            },
            || {
                log::debug!(
                    "computing {} delays for extent {} at speed {}ms",
                    phase,
                    extent,
                    speed
                );
                compute_delays(extent, speed).into()
            },
        )
    }

    /// Both phase schedules for a marker configured with `config`
    pub fn timeline(&self, config: &AnimationConfig) -> Timeline {
        Timeline {
            move_steps: self.steps(config.bounce_height, Phase::Move),
            move_delays: self.delays(config.bounce_height, config.bounce_speed, Phase::Move),
            resize_steps: self.steps(config.contract_height, Phase::Resize),
            resize_delays: self.delays(
                config.contract_height,
                config.contract_speed,
                Phase::Resize,
            ),
        }
    }

    pub fn steps_stats(&self) -> CacheStats {
        self.steps.cache_stats()
    }

    pub fn delays_stats(&self) -> CacheStats {
        self.delays.cache_stats()
    }
}

/// Paired step and delay schedules for both phases
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub move_steps: Arc<[u32]>,
    pub move_delays: Arc<[u64]>,
    pub resize_steps: Arc<[u32]>,
    pub resize_delays: Arc<[u64]>,
}

impl Timeline {
    pub fn steps(&self, phase: Phase) -> &[u32] {
        match phase {
            Phase::Move => &self.move_steps,
            Phase::Resize => &self.resize_steps,
        }
    }

    pub fn delays(&self, phase: Phase) -> &[u64] {
        match phase {
            Phase::Move => &self.move_delays,
            Phase::Resize => &self.resize_delays,
        }
    }

    /// Time from phase start until its last step is applied
    pub fn duration(&self, phase: Phase) -> u64 {
        self.delays(phase).last().copied().unwrap_or(0)
    }
}
