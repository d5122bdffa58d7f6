//! XP accrual: ledger, counter animation and derived daily values
//!
//! target = committed target + earned XP. The displayed counter walks from
//! its current value to the target in fixed frames; the last frame snaps to
//! the target exactly. A new award cancels the running animation and starts
//! over from whatever is on screen.

use crate::types::ScoreEvent;
use crate::XP_PER_LEVEL;

/// One interpolation from `start` to `target`
#[derive(Debug, Clone, PartialEq)]
pub struct XpAnimation {
    start: i64,
    target: i64,
    steps: u32,
    step: u32,
}

impl XpAnimation {
    /// None when there is nothing to animate
    pub fn new(start: i64, target: i64, steps: u32) -> Option<Self> {
        if start == target {
            return None;
        }
        Some(Self {
            start,
            target,
            steps: steps.max(1),
            step: 0,
        })
    }

    /// Advance one frame and return the value to display
    pub fn next_frame(&mut self) -> Option<i64> {
        if self.is_finished() {
            return None;
        }
        self.step += 1;
        if self.step >= self.steps {
            return Some(self.target);
        }

        let increment = (self.target - self.start) as f64 / self.steps as f64;
        let value = (self.start as f64 + increment * self.step as f64).round() as i64;

        // Never pass the target before the final frame
        let value = if self.target >= self.start {
            value.min(self.target)
        } else {
            value.max(self.target)
        };
        Some(value)
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.steps
    }

    /// Frames still to play
    pub fn remaining(&self) -> u32 {
        self.steps.saturating_sub(self.step)
    }

    pub fn target(&self) -> i64 {
        self.target
    }
}

/// Displayed vs target XP for one player
#[derive(Debug, Clone)]
pub struct XpLedger {
    displayed: i64,
    target: i64,
    steps: u32,
    /// Bumped on every award; frames for older generations are ignored
    generation: u64,
    animation: Option<XpAnimation>,
}

impl XpLedger {
    /// Empty ledger animating over `steps` frames
    pub fn new(steps: u32) -> Self {
        Self::with_total(0, steps)
    }

    /// Ledger already showing `total`
    pub fn with_total(total: i64, steps: u32) -> Self {
        Self {
            displayed: total,
            target: total,
            steps: steps.max(1),
            generation: 0,
            animation: None,
        }
    }

    pub fn displayed(&self) -> i64 {
        self.displayed
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Frames left in the running animation
    pub fn remaining_frames(&self) -> u32 {
        self.animation.as_ref().map(|a| a.remaining()).unwrap_or(0)
    }

    /// Credit a score event. Returns the animation generation to drive,
    /// or None when the counter already shows the new target.
    pub fn award(&mut self, event: &ScoreEvent) -> Option<u64> {
        self.add(event.earned_xp)
    }

    /// Credit a raw XP amount
    pub fn add(&mut self, xp: i64) -> Option<u64> {
        self.target += xp;
        self.generation += 1;
        self.animation = XpAnimation::new(self.displayed, self.target, self.steps);
        self.animation.as_ref().map(|_| self.generation)
    }

    /// Play one frame of animation `generation`. Returns the new displayed value.
    pub fn step(&mut self, generation: u64) -> Option<i64> {
        if generation != self.generation {
            return None;
        }
        let animation = self.animation.as_mut()?;
        let value = animation.next_frame()?;
        self.displayed = value;
        if animation.is_finished() {
            self.animation = None;
        }
        Some(value)
    }

    /// Jump to the target, dropping any animation
    pub fn settle(&mut self) {
        self.generation += 1;
        self.animation = None;
        self.displayed = self.target;
    }

    /// Zero both counters (new game)
    pub fn reset(&mut self) {
        self.generation += 1;
        self.animation = None;
        self.displayed = 0;
        self.target = 0;
    }
}

/// XP toward today's goal
pub fn daily_xp(total_xp: i64, daily_goal: i64) -> i64 {
    if daily_goal <= 0 {
        return 0;
    }
    total_xp.rem_euclid(daily_goal)
}

/// Progress ring fill, 0.0..=1.0
pub fn daily_progress(total_xp: i64, daily_goal: i64) -> f64 {
    if daily_goal <= 0 {
        return 0.0;
    }
    (daily_xp(total_xp, daily_goal) as f64 / daily_goal as f64).min(1.0)
}

/// Level 1 at 0 XP, +1 every 100 XP
pub fn level_for(total_xp: i64) -> i64 {
    total_xp.max(0) / XP_PER_LEVEL + 1
}

// =============================================================================
// TESTS
// =============================================================================
