//! Bounded retry policy with linear backoff and jitter.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry configuration for requests against the search engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay; the wait before attempt `n` is `base * n + jitter(0..base)`.
    #[serde(with = "humantime_serde", default = "default_base_delay")]
    pub base_delay: Duration,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_millis(500)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Returns the wait before `attempt` (1-based), drawing jitter from `rng`.
    ///
    /// The first attempt is never delayed.
    pub fn delay_before<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let base_ms = self.base_delay.as_millis() as u64;
        let jitter_ms = if base_ms == 0 {
            0
        } else {
            rng.random_range(0..base_ms)
        };
        Duration::from_millis(base_ms.saturating_mul(u64::from(attempt)) + jitter_ms)
    }

    /// Upper bound of the delay before `attempt`, exclusive of the jitter's
    /// open end.
    pub fn max_delay_before(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        self.base_delay * (attempt + 1)
    }
}

/// Serde adapter for durations written as `500ms`, `1s` or `2m 30s`.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
