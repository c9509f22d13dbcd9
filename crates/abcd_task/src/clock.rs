//! Session time and deferred callbacks.
//!
//! The task never blocks or sleeps. Time only moves when the driver calls
//! [`SessionClock::advance`], and anything that should happen "later" is a
//! [`Scheduler`] entry that becomes due once the clock passes it.

use std::time::Duration;

/// Monotonic session-relative clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionClock {
    elapsed: Duration,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.elapsed
    }

    /// Move time forward by `dt` and return the new time.
    pub fn advance(&mut self, dt: Duration) -> Duration {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.elapsed
    }
}

#[derive(Debug, Clone)]
struct Timer<T> {
    seq: u64,
    due: Duration,
    payload: T,
}

/// Deferred payloads ordered by due time, then by scheduling order.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    next_seq: u64,
    pending: Vec<Timer<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Duration, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Timer { seq, due, payload });
    }

    /// Drop everything pending; returns how many entries were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Remove and return the earliest entry due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<T> {
        let position = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;
        Some(self.pending.remove(position).payload)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
