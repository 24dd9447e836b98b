use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of time for health bookkeeping
pub trait Clock: Send + Sync {
    /// Wall-clock milliseconds since the Unix epoch, used for staleness checks
    fn wall_millis(&self) -> i64;

    /// Monotonic nanoseconds, used to time probes
    fn monotonic_nanos(&self) -> u64;
}

/// Clock backed by the operating system
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn wall_millis(&self) -> i64 {
        tsdb_common::current_time_millis()
    }

    fn monotonic_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Clock that only moves when told to. Both readings advance together.
#[derive(Debug, Default)]
pub struct ManualClock {
    wall_millis: AtomicI64,
    monotonic_nanos: AtomicU64,
}

impl ManualClock {
    pub fn new(wall_millis: i64) -> Self {
        Self {
            wall_millis: AtomicI64::new(wall_millis),
            monotonic_nanos: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.wall_millis
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
        self.monotonic_nanos
            .fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn set_wall_millis(&self, wall_millis: i64) {
        self.wall_millis.store(wall_millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn wall_millis(&self) -> i64 {
        self.wall_millis.load(Ordering::SeqCst)
    }

    fn monotonic_nanos(&self) -> u64 {
        self.monotonic_nanos.load(Ordering::SeqCst)
    }
}
