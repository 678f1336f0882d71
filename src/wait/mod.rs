//! Timing defaults and duration helpers.

use std::time::Duration;

/// Default ceiling for an expectation to be met.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default poll interval for re-checking the output buffer.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default time a process gets to exit after being asked to terminate.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Extension trait for Duration to create durations more ergonomically.
pub trait DurationExt {
    /// Create a duration from this value in seconds.
    fn seconds(self) -> Duration;
    /// Create a duration from this value in milliseconds.
    fn millis(self) -> Duration;
}

impl DurationExt for u64 {
    fn seconds(self) -> Duration {
        Duration::from_secs(self)
    }

    fn millis(self) -> Duration {
        Duration::from_millis(self)
    }
}

impl DurationExt for i32 {
    fn seconds(self) -> Duration {
        Duration::from_secs(self.max(0) as u64)
    }

    fn millis(self) -> Duration {
        Duration::from_millis(self.max(0) as u64)
    }
}

/// Convert a duration to whole milliseconds for config files and logs.
pub fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
