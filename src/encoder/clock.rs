//! Presentation timestamp generation
//!
//! Each encoder derives sample timestamps from a monotonic clock read, then
//! repairs the sequence so emitted timestamps are strictly increasing even
//! when the raw reads regress or repeat (container formats require monotonic
//! per-track timestamps).

use std::time::Instant;

/// Source of raw microsecond readings
///
/// Seam for tests; production code uses [`SystemSampleClock`].
pub trait SampleClock: Send + Sync {
    /// Current reading in microseconds. No monotonicity guarantee.
    fn now_us(&self) -> i64;
}

/// Monotonic process clock
pub struct SystemSampleClock {
    origin: Instant,
}

impl SystemSampleClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemSampleClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleClock for SystemSampleClock {
    fn now_us(&self) -> i64 {
        self.origin.elapsed().as_micros() as i64
    }
}

/// Repairs a raw timestamp sequence into a strictly increasing one
///
/// Keeps a running offset: whenever a raw reading (plus the accumulated
/// offset) would not advance past the last emitted value, the deficit is
/// folded into the offset so this and all later readings land strictly after
/// it.
#[derive(Debug, Default)]
pub struct PtsTracker {
    last_us: Option<i64>,
    offset_us: i64,
}

impl PtsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last emitted timestamp, if any
    pub fn last_us(&self) -> Option<i64> {
        self.last_us
    }

    /// Map a raw clock reading to the next emitted timestamp
    pub fn next_us(&mut self, raw_us: i64) -> i64 {
        let mut pts = raw_us + self.offset_us;
        if let Some(last) = self.last_us {
            if pts <= last {
                pts = last + 1;
                self.offset_us = pts - raw_us;
            }
        }
        self.last_us = Some(pts);
        pts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increasing_raw_passes_through() {
        let mut tracker = PtsTracker::new();
        assert_eq!(tracker.next_us(100), 100);
        assert_eq!(tracker.next_us(200), 200);
        assert_eq!(tracker.next_us(300), 300);
    }

    #[test]
    fn test_repeated_and_regressing_raw_repaired() {
        let mut tracker = PtsTracker::new();
        let raw = [100, 100, 50, 200];
        let mut emitted = Vec::new();
        for r in raw {
            emitted.push(tracker.next_us(r));
        }
        for pair in emitted.windows(2) {
            assert!(pair[1] > pair[0], "not strictly increasing: {:?}", emitted);
        }
        assert_eq!(emitted[0], 100);
    }

    #[test]
    fn test_offset_persists_after_regression() {
        let mut tracker = PtsTracker::new();
        tracker.next_us(1_000);
        let repaired = tracker.next_us(500);
        assert!(repaired > 1_000);
        // Later readings keep the fold so spacing is preserved
        let next = tracker.next_us(600);
        assert_eq!(next, repaired + 100);
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemSampleClock::new();
        let a = clock.now_us();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = clock.now_us();
        assert!(b > a);
    }
}
