// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Token-bucket admission for the evaluate endpoint.

use std::time::Instant;

use parking_lot::Mutex;

/// A token bucket refilled at `rps` tokens per second with burst capacity
/// `rps`.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    rps: f64,
    state: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refreshed: Instant,
}

impl RateLimiter {
    pub(crate) fn new(rps: u32) -> Self {
        Self {
            rps: f64::from(rps),
            state: Mutex::new(Bucket {
                tokens: f64::from(rps),
                refreshed: Instant::now(),
            }),
        }
    }

    /// Takes one token if available.
    pub(crate) fn try_acquire(&self) -> bool {
        let mut bucket = self.state.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.refreshed).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rps).min(self.rps);
        bucket.refreshed = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
