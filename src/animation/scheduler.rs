//! Per-marker bounce state machine
//!
//! ```text
//! Idle -> Bouncing(Move) <-> Bouncing(Resize) -> Idle
//! ```
//!
//! The scheduler only decides; the engine owns the timer queue and turns
//! each [`Transition`] into queued callbacks. A stop is cooperative: it flips
//! `bouncing` and is only looked at when a phase ends, so the phase that is
//! already queued always plays out before the marker comes to rest.

use crate::animation::timeline::Phase;
use std::num::NonZeroU32;

/// How many move phases a bounce should play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cycles {
    #[default]
    Unbounded,
    Times(NonZeroU32),
}

impl Cycles {
    /// `None` and `Some(0)` both mean "bounce until stopped"
    pub fn from_count(count: Option<u32>) -> Self {
        count
            .and_then(NonZeroU32::new)
            .map(Cycles::Times)
            .unwrap_or(Cycles::Unbounded)
    }
}

/// Observable state of one marker's animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BounceState {
    Idle,
    /// Bouncing and currently playing `Phase`
    Bouncing(Phase),
    /// Bouncing, waiting out the pause before the next move
    Paused,
    /// Stopped, but `Phase` is still finishing on screen
    Settling(Phase),
}

/// What to do once a phase has played its last step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Begin(Phase),
    /// Start the next move after this many milliseconds
    Pause(u64),
    Settle,
}

#[derive(Debug, Clone, Default)]
pub struct BounceScheduler {
    bouncing: bool,
    /// `None` while bouncing without a cycle limit
    remaining: Option<u32>,
    final_pass: bool,
    active: Option<Phase>,
    paused: bool,
    generation: u64,
}

impl BounceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bouncing(&self) -> bool {
        self.bouncing
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn remaining_cycles(&self) -> Option<u32> {
        self.remaining
    }

    pub fn state(&self) -> BounceState {
        match (self.bouncing, self.active) {
            (true, Some(phase)) => BounceState::Bouncing(phase),
            (true, None) if self.paused => BounceState::Paused,
            (false, Some(phase)) => BounceState::Settling(phase),
            _ => BounceState::Idle,
        }
    }

    /// Arms a new run tagged with `generation`. Returns `false` without
    /// touching anything if the marker is already bouncing.
    pub fn start(&mut self, cycles: Cycles, generation: u64) -> bool {
        if self.bouncing {
            return false;
        }
        self.bouncing = true;
        self.remaining = match cycles {
            Cycles::Unbounded => None,
            Cycles::Times(n) => Some(n.get()),
        };
        self.final_pass = false;
        self.active = None;
        self.paused = false;
        self.generation = generation;
        true
    }

    /// Returns whether the marker was bouncing
    pub fn stop(&mut self) -> bool {
        let was_bouncing = self.bouncing;
        self.bouncing = false;
        self.final_pass = false;
        self.paused = false;
        was_bouncing
    }

    /// Marks `phase` as playing. Finite runs use up one cycle per move.
    pub fn begin_phase(&mut self, phase: Phase) {
        self.active = Some(phase);
        self.paused = false;
        if phase == Phase::Move {
            if let Some(remaining) = self.remaining.as_mut() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    self.final_pass = true;
                }
            }
        }
    }

    /// Decides what follows `phase`.
    ///
    /// `resize` says whether this marker can play a resize phase at all
    /// (elastic and transform-capable); `pause_ms` is the gap before the next
    /// move when it cannot.
    pub fn finish_phase(&mut self, phase: Phase, resize: bool, pause_ms: u64) -> Transition {
        self.active = None;

        match phase {
            Phase::Move => {
                let last_cycle = self.final_pass;
                if last_cycle {
                    self.final_pass = false;
                    self.bouncing = false;
                }

                if !self.bouncing && !last_cycle {
                    Transition::Settle
                } else if resize {
                    self.active = Some(Phase::Resize);
                    Transition::Begin(Phase::Resize)
                } else if self.bouncing {
                    self.paused = true;
                    Transition::Pause(pause_ms)
                } else {
                    Transition::Settle
                }
            }
            Phase::Resize => {
                if self.bouncing {
                    self.active = Some(Phase::Move);
                    Transition::Begin(Phase::Move)
                } else {
                    Transition::Settle
                }
            }
        }
    }

    /// The pause before a move is over; `true` if the move should start
    pub fn resume(&mut self) -> bool {
        let resume = self.bouncing && self.paused;
        self.paused = false;
        resume
    }
}
