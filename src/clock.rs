use chrono::{DateTime, FixedOffset, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Injectable clock so the alert registry's rolling 24-hour count and
/// created/updated timestamps are testable without sleeping real time.
pub trait EngineClock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall-clock implementation, fixed to the configured timezone offset.
pub struct SystemClock {
    pub offset: FixedOffset,
}

impl EngineClock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// A clock that returns a fixed, manually-advanceable instant. Used by
/// tests that exercise the alert registry's rolling-window behavior.
pub struct FixedClock {
    offset: FixedOffset,
    epoch_millis: AtomicI64,
}

impl FixedClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            offset: *start.offset(),
            epoch_millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub fn advance(&self, delta: chrono::Duration) {
        self.epoch_millis
            .fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
    }
}

impl EngineClock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let millis = self.epoch_millis.load(Ordering::SeqCst);
        DateTime::from_timestamp_millis(millis)
            .expect("valid timestamp")
            .with_timezone(&self.offset)
    }
}
