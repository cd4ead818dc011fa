// SPDX-License-Identifier: Apache-2.0

//! A seam for time so `cleanup_expired` boundaries are testable without
//! sleeping real seconds.

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Supplies the current time as seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_seconds(&self) -> u64;
}

/// The real wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock a test can set to an exact value.
#[derive(Debug)]
pub struct FakeClock {
    now: Mutex<u64>,
}

impl FakeClock {
    pub fn new(now_seconds: u64) -> Self {
        Self {
            now: Mutex::new(now_seconds),
        }
    }

    pub fn set(&self, now_seconds: u64) {
        *self.now.lock() = now_seconds;
    }

    pub fn advance(&self, seconds: u64) {
        *self.now.lock() += seconds;
    }
}

impl Clock for FakeClock {
    fn now_seconds(&self) -> u64 {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_advances() {
        let clock = FakeClock::new(100);
        assert_eq!(clock.now_seconds(), 100);
        clock.advance(50);
        assert_eq!(clock.now_seconds(), 150);
        clock.set(0);
        assert_eq!(clock.now_seconds(), 0);
    }
}
