use chrono::Utc;

/// Clock trait for abstracting wall-clock reads
/// Readings are stamped through it so tests can pin the time
pub trait Clock: Send + Sync {
    /// Current time as epoch milliseconds
    fn now_epoch_millis(&self) -> i64;
}

/// Production implementation of Clock using system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_epoch_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Test implementation of Clock pinned to one instant
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock {
    epoch_millis: i64,
}

impl FixedClock {
    pub fn from_epoch_millis(epoch_millis: i64) -> Self {
        Self { epoch_millis }
    }
}

impl Clock for FixedClock {
    fn now_epoch_millis(&self) -> i64 {
        self.epoch_millis
    }
}
