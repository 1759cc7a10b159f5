// Time sources and id generation

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of "now" for the store
pub trait Clock {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;

    /// Current calendar day, used for new tasks and overdue checks
    fn today(&self) -> NaiveDate;
}

/// Wall clock; days follow the local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        now_ms()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn at(now_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    fn today(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp_millis(self.now_ms())
            .unwrap_or_default()
            .date_naive()
    }
}

/// Hands out task ids: creation time in milliseconds, bumped past the last
/// issued id when two adds land in the same millisecond.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    /// Start above every id already in use
    pub fn seeded<I: IntoIterator<Item = i64>>(ids: I) -> Self {
        Self {
            last: ids.into_iter().max().unwrap_or(0),
        }
    }

    /// Next id, or `None` once the id space above the last one is used up
    pub fn next(&mut self, now_ms: i64) -> Option<i64> {
        let id = now_ms.max(self.last.checked_add(1)?);
        self.last = id;
        Some(id)
    }
}

/// Current timestamp in milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        // After 2020
        assert!(ts > 1_600_000_000_000);
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::at(1_000);
        let handle = clock.clone();
        handle.advance(500);
        assert_eq!(clock.now_ms(), 1_500);
        handle.set(86_400_000);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(1970, 1, 2).unwrap());
    }

    #[test]
    fn test_id_generator_same_millisecond() {
        let mut ids = IdGenerator::default();
        let a = ids.next(1_000).unwrap();
        let b = ids.next(1_000).unwrap();
        let c = ids.next(999).unwrap();
        let d = ids.next(5_000).unwrap();
        assert_eq!((a, b, c, d), (1_000, 1_001, 1_002, 5_000));
    }

    #[test]
    fn test_id_generator_seeded_above_existing() {
        let mut ids = IdGenerator::seeded([10, 4_000, 12]);
        assert_eq!(ids.next(100), Some(4_001));
        assert_eq!(ids.next(9_000), Some(9_000));
    }

    #[test]
    fn test_id_generator_exhausted_at_max() {
        let mut ids = IdGenerator::seeded([i64::MAX]);
        assert_eq!(ids.next(1_000), None);
        assert_eq!(ids.next(i64::MAX), None);
    }
}
