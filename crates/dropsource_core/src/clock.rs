//! Process-monotonic wall-clock timestamps.
//!
//! # Responsibility
//! - Provide the epoch-millisecond stamps written to `created_at`/`updated_at`.
//!
//! # Invariants
//! - Consecutive calls within one process return strictly increasing values,
//!   so sorting on `updated_at` yields a total recency order.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static LAST_MS: AtomicI64 = AtomicI64::new(0);

/// Returns the current time as epoch milliseconds, nudged forward by one
/// whenever the wall clock has not advanced since the previous call.
pub fn now_ms() -> i64 {
    let wall = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0);

    let mut prev = LAST_MS.load(Ordering::Relaxed);
    loop {
        let next = wall.max(prev + 1);
        match LAST_MS.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(observed) => prev = observed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::now_ms;

    #[test]
    fn consecutive_stamps_are_strictly_increasing() {
        let first = now_ms();
        let second = now_ms();
        let third = now_ms();
        assert!(first < second);
        assert!(second < third);
    }

    #[test]
    fn stamps_track_the_wall_clock() {
        let stamp = now_ms();
        // Sanity bound: after 2020-01-01 and below the year 3000.
        assert!(stamp > 1_577_836_800_000);
        assert!(stamp < 32_503_680_000_000);
    }
}
