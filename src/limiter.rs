//! Rate Limiter Module
//!
//! Sliding-log limiter bounding outbound requests per rolling window. It
//! only admits or rejects; callers are never queued or delayed.

use std::collections::VecDeque;
use std::time::Duration;

use crate::clock::SharedClock;

// == Rate Limiter ==
/// Admits at most `limit` requests in any window of length `window`.
#[derive(Debug)]
pub struct RateLimiter {
    /// Admission timestamps (Unix ms), oldest first
    admitted: VecDeque<u64>,
    limit: u32,
    window_ms: u64,
    clock: SharedClock,
}

impl RateLimiter {
    /// Creates a limiter with an empty window.
    pub fn new(limit: u32, window: Duration, clock: SharedClock) -> Self {
        Self {
            admitted: VecDeque::with_capacity(limit as usize),
            limit,
            window_ms: window.as_millis() as u64,
            clock,
        }
    }

    // == Try Acquire ==
    /// Admits one request if the window has room, recording its timestamp.
    ///
    /// Returns false without recording anything when the window is full.
    pub fn try_acquire(&mut self) -> bool {
        let now = self.clock.now_ms();
        self.prune(now);

        if self.admitted.len() < self.limit as usize {
            self.admitted.push_back(now);
            true
        } else {
            false
        }
    }

    // == Usage ==
    /// Returns `(admitted in the current window, limit)`.
    pub fn usage(&mut self) -> (u32, u32) {
        let now = self.clock.now_ms();
        self.prune(now);
        (self.admitted.len() as u32, self.limit)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Drops timestamps that have left the window ending at `now`.
    fn prune(&mut self, now: u64) {
        while let Some(&oldest) = self.admitted.front() {
            if now.saturating_sub(oldest) >= self.window_ms {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }
}
