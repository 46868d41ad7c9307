// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared token-bucket rate limiter for fetch workers.
//!
//! Passed to every worker as an explicit `Arc` handle; this is the only
//! mutable state shared across concurrent fetches.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

/// A token bucket granting `capacity` requests per `interval`.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    interval: Duration,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(capacity: u32, interval: Duration) -> Self {
        assert!(capacity > 0, "token bucket capacity must be positive");
        Self {
            capacity,
            interval,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take a token if one is available right now.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        self.refill(&mut state);
        if state.tokens > 0 {
            state.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Wait until a token is available, then take it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().unwrap();
                self.refill(&mut state);
                if state.tokens > 0 {
                    state.tokens -= 1;
                    return;
                }
                // Next refill point relative to the last one.
                self.interval
                    .saturating_sub(state.last_refill.elapsed())
            };
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

    fn refill(&self, state: &mut BucketState) {
        if self.interval.is_zero() {
            state.tokens = self.capacity;
            return;
        }
        let elapsed = state.last_refill.elapsed();
        if elapsed >= self.interval {
            let intervals = (elapsed.as_nanos() / self.interval.as_nanos()) as u32;
            state.tokens = self.capacity;
            state.last_refill += self.interval * intervals;
        }
    }
}
