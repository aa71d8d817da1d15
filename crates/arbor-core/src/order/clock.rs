//! Sources of fresh order keys for empty sibling groups.
//!
//! A key handed out for an empty group must stay comparable with keys
//! assigned later elsewhere, so it is derived from wall-clock milliseconds
//! and never goes backwards.

#![allow(clippy::cast_precision_loss)]

use chrono::Utc;

/// Produces monotonically increasing order keys.
pub trait KeyClock {
    fn next_key(&mut self) -> f64;
}

/// Wall-clock keys: `max(now_ms, last + 1)`.
#[derive(Debug, Clone, Default)]
pub struct SystemKeyClock {
    last: f64,
}

impl SystemKeyClock {
    #[must_use]
    pub const fn new() -> Self {
        Self { last: 0.0 }
    }

    /// Resume from a key already handed out, e.g. the largest key in a
    /// snapshot, so a skewed clock cannot hand out a smaller one.
    #[must_use]
    pub const fn resume_after(last: f64) -> Self {
        Self { last }
    }
}

impl KeyClock for SystemKeyClock {
    fn next_key(&mut self) -> f64 {
        let now = Utc::now().timestamp_millis() as f64;
        let next = now.max(self.last + 1.0);
        self.last = next;
        next
    }
}

/// Deterministic counter clock.
#[derive(Debug, Clone)]
pub struct FixedKeyClock {
    next: f64,
    step: f64,
}

impl FixedKeyClock {
    #[must_use]
    pub const fn new(start: f64, step: f64) -> Self {
        Self { next: start, step }
    }
}

impl KeyClock for FixedKeyClock {
    fn next_key(&mut self) -> f64 {
        let key = self.next;
        self.next += self.step;
        key
    }
}
