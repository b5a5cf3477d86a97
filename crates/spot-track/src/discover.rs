//! Bounded device discovery: poll a probe on a fixed period until it yields
//! a device or the timeout lapses.
//!
//! The clock is injectable so the retry loop is testable without real
//! delays, and the probe is a closure so platform-specific enumeration
//! (e.g. scanning `/dev` for capture nodes) stays with the caller.

use std::time::{Duration, Instant};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscoverError {
    /// Fatal: there is no retry path left; callers exit non-zero.
    #[error("no capture device found within {timeout:?}")]
    NoDeviceFound { timeout: Duration },
}

/// Retry policy for device discovery.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DiscoveryPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(60),
        }
    }
}

impl DiscoveryPolicy {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Time source seam; production code uses [`SystemClock`].
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Poll `probe` every `policy.poll_interval` until it yields a device or
/// `policy.timeout` has elapsed. The probe runs at least once even with a
/// zero timeout.
pub fn discover<T>(
    mut probe: impl FnMut() -> Option<T>,
    policy: DiscoveryPolicy,
    clock: &impl Clock,
) -> Result<T, DiscoverError> {
    let start = clock.now();
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        if let Some(device) = probe() {
            info!(
                "attempt {attempts}: found capture device after {:.1}s",
                clock.now().duration_since(start).as_secs_f64()
            );
            return Ok(device);
        }
        if clock.now().duration_since(start) >= policy.timeout {
            warn!(
                "no capture device found after {attempts} attempt(s) and {:?}",
                policy.timeout
            );
            return Err(DiscoverError::NoDeviceFound {
                timeout: policy.timeout,
            });
        }
        info!(
            "attempt {attempts}: no capture device, retrying in {:?}",
            policy.poll_interval
        );
        clock.sleep(policy.poll_interval);
    }
}
