//! Timestamp utilities.

use std::sync::{LazyLock, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

static LAST: LazyLock<Mutex<DateTime<Utc>>> = LazyLock::new(|| Mutex::new(DateTime::UNIX_EPOCH));

/// Current time, strictly increasing across calls within this process.
///
/// If the wall clock stalls or steps backwards the previous value is advanced
/// by one microsecond instead. Microseconds are the finest unit every
/// supported database keeps.
#[must_use]
pub fn monotonic_now() -> DateTime<Utc> {
    let mut last = LAST.lock().unwrap_or_else(PoisonError::into_inner);
    let now = truncate_to_micros(Utc::now());
    let next = if now > *last {
        now
    } else {
        *last + Duration::microseconds(1)
    };
    *last = next;
    next
}

fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(ts.timestamp_micros()).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_now_strictly_increases() {
        let stamps: Vec<_> = (0..10_000).map(|_| monotonic_now()).collect();

        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_monotonic_now_has_microsecond_precision() {
        let ts = monotonic_now();

        assert_eq!(ts.timestamp_subsec_nanos() % 1_000, 0);
    }
}
