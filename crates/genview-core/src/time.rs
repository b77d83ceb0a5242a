//! Frame clock and timer primitives
//!
//! All genview state lives on a single frame thread. Timers are deadlines on the
//! frame clock that owners check during their per-frame `update`, so a pending
//! timer is cancelled simply by dropping it.

use std::time::Duration;

/// Frame time tracking
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    /// Time since the clock started
    now: Duration,
    /// Delta for the last frame
    delta: Duration,
    /// Frame counter
    frame_count: u64,
}

impl FrameClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by the raw delta from the previous frame
    pub fn update(&mut self, raw_delta: Duration) {
        self.delta = raw_delta;
        self.now += raw_delta;
        self.frame_count += 1;
    }

    /// Current time on this clock
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Delta applied by the last `update`
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Number of frames seen so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// A one-shot timer armed for a point on the frame clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    at: Duration,
}

impl Deadline {
    /// Arm a deadline `delay` after `now`
    pub fn after(now: Duration, delay: Duration) -> Self {
        Self { at: now + delay }
    }

    /// The clock time at which this deadline fires
    pub fn at(&self) -> Duration {
        self.at
    }

    /// Whether the deadline has been reached at `now`
    pub fn is_due(&self, now: Duration) -> bool {
        now >= self.at
    }
}

/// Holds back a rapidly changing value until it has been left alone for `delay`.
///
/// Every `push` re-arms the timer; only the most recent value is ever emitted.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(T, Deadline)>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a new value, replacing any pending one and restarting the timer
    pub fn push(&mut self, value: T, now: Duration) {
        self.pending = Some((value, Deadline::after(now, self.delay)));
    }

    /// Take the pending value if its quiet period has elapsed
    pub fn poll(&mut self, now: Duration) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if deadline.is_due(now) => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Whether a value is waiting to be emitted
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value without emitting it
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Convert a millisecond count from configuration into a `Duration`
pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
