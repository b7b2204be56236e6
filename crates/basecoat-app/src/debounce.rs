// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(625);
/// Longest accepted window; larger values are clamped.
pub const MAX_DEBOUNCE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// Coalesces a burst of values into the last one, released once the input
/// has been quiet for `window`. Time is passed in so callers own the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl<T> Debouncer<T> {
    pub const fn new(window: Duration) -> Self {
        let window = if window.as_secs() >= MAX_DEBOUNCE.as_secs() {
            MAX_DEBOUNCE
        } else {
            window
        };
        Self {
            window,
            pending: None,
        }
    }

    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Replaces any pending value and restarts the window. Returns true when
    /// an earlier value was superseded.
    pub fn schedule(&mut self, value: T, now: Instant) -> bool {
        let superseded = self.pending.is_some();
        self.pending = Some(Pending {
            value,
            deadline: now + self.window,
        });
        superseded
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Releases the pending value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.deadline);
        if due { self.cancel() } else { None }
    }

    /// Releases the pending value immediately, ignoring the window.
    pub fn flush(&mut self) -> Option<T> {
        self.cancel()
    }
}
