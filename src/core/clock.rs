//! Time sources for the trial loop.
//!
//! Sessions read time through [`Clock`] so that the same loop runs against the
//! wall clock in the lab and against a [`ManualClock`] in tests.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A monotonic time source that can also block.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    /// Block for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual time that only moves when slept on or advanced.
///
/// Clones share the same time, so a headless screen and the session can both hold one.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// A timer counting down from a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    deadline: Duration,
}

impl Countdown {
    pub fn start(clock: &dyn Clock, duration: Duration) -> Self {
        Self {
            deadline: clock.now() + duration,
        }
    }

    pub fn remaining(&self, clock: &dyn Clock) -> Duration {
        self.deadline.saturating_sub(clock.now())
    }

    pub fn expired(&self, clock: &dyn Clock) -> bool {
        self.remaining(clock).is_zero()
    }
}

/// Measures time since the last reset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stopwatch {
    started: Duration,
}

impl Stopwatch {
    pub fn reset(&mut self, clock: &dyn Clock) {
        self.started = clock.now();
    }

    pub fn elapsed(&self, clock: &dyn Clock) -> Duration {
        clock.now().saturating_sub(self.started)
    }
}
