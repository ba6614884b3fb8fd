//! Session clocks: the fast-forwardable stopwatch and the per-second sub-timers.
//!
//! The stopwatch is offset arithmetic over wall-clock instants:
//!
//! ```text
//! elapsed(now) = offset + (now - anchor)
//! ```
//!
//! A fast-forward folds the current reading into the offset and moves the
//! anchor to `now`, so repeated forwards compose instead of double-counting.
//!
//! The CPR, ROSC and rhythm-check timers are plain counters advanced by
//! [`TimeModel::tick`]. They freeze the moment they are stopped and are not
//! touched by a fast-forward.

use jiff::{SignedDuration, Timestamp};

/// A one-tick-per-second counter that can be started, stopped, and reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubTimer {
    seconds: u32,
    running: bool,
}

impl SubTimer {
    /// Resets to zero and starts counting.
    pub fn start(&mut self) {
        self.seconds = 0;
        self.running = true;
    }

    /// Freezes the current reading.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stops and clears the reading.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advances by one second if running.
    pub fn tick(&mut self) {
        if self.running {
            self.seconds = self.seconds.saturating_add(1);
        }
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Elapsed session time plus the sub-timers the protocol consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeModel {
    offset: SignedDuration,
    anchor: Option<Timestamp>,

    /// Time into the current CPR cycle.
    pub cpr: SubTimer,

    /// Time since return of spontaneous circulation.
    pub rosc: SubTimer,

    /// Time since the last shockable or non-shockable rhythm check.
    pub since_rhythm_check: SubTimer,
}

impl TimeModel {
    /// Starts the stopwatch from zero at `now` and clears every sub-timer.
    pub fn start(&mut self, now: Timestamp) {
        *self = Self {
            anchor: Some(now),
            ..Self::default()
        };
    }

    /// Elapsed virtual time at `now`. Zero before [`start`](Self::start).
    ///
    /// A wall clock that steps backwards past the anchor reads as the
    /// accumulated offset rather than going negative.
    pub fn elapsed(&self, now: Timestamp) -> SignedDuration {
        let Some(anchor) = self.anchor else {
            return SignedDuration::ZERO;
        };
        let real = now.duration_since(anchor).max(SignedDuration::ZERO);
        self.offset + real
    }

    /// Elapsed virtual time in whole seconds.
    pub fn elapsed_secs(&self, now: Timestamp) -> i64 {
        self.elapsed(now).as_secs()
    }

    /// Jumps the stopwatch forward without touching the wall clock.
    ///
    /// Sub-timers are not advanced; callers that need them in step must add
    /// the seconds themselves.
    pub fn fast_forward(&mut self, seconds: i64, now: Timestamp) {
        let current = self.elapsed(now);
        self.offset = current + SignedDuration::from_secs(seconds.max(0));
        self.anchor = Some(now);
    }

    /// Advances every running sub-timer by one second.
    pub fn tick(&mut self) {
        self.cpr.tick();
        self.rosc.tick();
        self.since_rhythm_check.tick();
    }

    pub fn is_started(&self) -> bool {
        self.anchor.is_some()
    }
}
