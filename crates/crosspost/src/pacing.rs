//! Human-like pacing policy and the sleep seam used by the executor.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

/// An inclusive range of delays sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    /// Shortest delay.
    pub min: Duration,
    /// Longest delay.
    pub max: Duration,
}

impl DelayRange {
    /// Create a range from millisecond bounds. Bounds are swapped if reversed.
    #[must_use]
    pub fn from_millis(min: u64, max: u64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    /// A range that never waits.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Draw a delay from the range.
    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Scheduling policy for simulated human timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Pause between two UI actions.
    pub action: DelayRange,
    /// Longer wait after submits and uploads, while the page settles.
    pub settle: DelayRange,
    /// Delay between two typed characters.
    pub typing: DelayRange,
    /// Interval between two visibility probes of the same candidate.
    pub poll_interval: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            action: DelayRange::from_millis(1_000, 3_000),
            settle: DelayRange::from_millis(3_000, 5_000),
            typing: DelayRange::from_millis(30, 100),
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl Pacing {
    /// Zero-delay policy, one probe per candidate.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            action: DelayRange::zero(),
            settle: DelayRange::zero(),
            typing: DelayRange::zero(),
            poll_interval: Duration::ZERO,
        }
    }

    /// Number of probes that fit in `timeout` (at least one).
    #[must_use]
    pub fn probe_attempts(&self, timeout: Duration) -> u32 {
        if self.poll_interval.is_zero() {
            return 1;
        }
        let attempts = timeout.as_millis() / self.poll_interval.as_millis();
        u32::try_from(attempts).unwrap_or(u32::MAX).max(1)
    }
}

/// Blocking-wait abstraction so pacing can be observed without real time.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
