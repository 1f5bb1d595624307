//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`stream`]: In-process [`Transport`](crate::port::Transport) driven by a
//!   handle, and a factory that records every transport it builds.
//! - [`clock`]: [`ManualClock`](clock::ManualClock) for freshness tests.
//! - [`domain`]: JSON payload builders for the four snapshot keys.
//! - [`config`]: Canonical test configurations.

pub mod clock;
pub mod config;
pub mod domain;
pub mod stream;

use std::time::Duration;

/// Let spawned tasks run until they are all waiting again.
///
/// Safe with paused time: it never sleeps, so it never advances the clock.
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
///
/// Sleeps between checks, so only use it with real time.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
