//! Sliding-window rate limiter for LLM calls (§4.2, §5).
//!
//! The window is the single piece of shared mutable state in the LLM
//! adapter; it is guarded by a mutex and waited on with an iterative loop,
//! never recursion (§9).

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// A requests-per-minute sliding-window limiter.
pub struct RateLimiter {
    max_per_minute: u32,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing up to `max_per_minute` calls in any
    /// trailing 60-second window.
    #[must_use]
    pub fn new(max_per_minute: u32) -> Self {
        Self {
            max_per_minute,
            window: Mutex::new(VecDeque::new()),
        }
    }

    /// Blocks until a slot is available, then records this call's timestamp.
    ///
    /// Implemented as an iterative loop over the window rather than a
    /// recursive retry: each pass evicts expired timestamps, and if the
    /// window is still full, sleeps until the oldest entry expires before
    /// re-checking.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                evict_expired(&mut window, now);

                if window.len() < self.max_per_minute as usize {
                    window.push_back(now);
                    return;
                }

                // Safe: length check above guarantees at least one entry.
                let oldest = window[0];
                oldest + Duration::from_secs(60) - now
            };
            sleep(wait).await;
        }
    }
}

fn evict_expired(window: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&front) = window.front() {
        if now.duration_since(front) >= Duration::from_secs(60) {
            window.pop_front();
        } else {
            break;
        }
    }
}
