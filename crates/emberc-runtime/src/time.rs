//! Time and sleep operations backing the source language's `Time`
//! namespace (`spec.md` §1 lists time among R3's value types; §5 notes
//! `sleep` as the runtime's one blocking-but-non-suspending primitive).

use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_millis() as i64
}

/// Seconds since the Unix epoch.
#[must_use]
pub fn now_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as i64
}

/// Blocks the calling thread for at least `ms` milliseconds. Per
/// `spec.md` §5, this blocks the single thread of execution; there is no
/// cooperative suspension to yield.
pub fn sleep_millis(ms: u64) {
    thread::sleep(Duration::from_millis(ms));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_millis_is_monotone_increasing_across_a_sleep() {
        let before = now_millis();
        sleep_millis(5);
        let after = now_millis();
        assert!(after >= before);
    }

    #[test]
    fn now_seconds_matches_now_millis_within_one_second() {
        let secs = now_seconds();
        let millis = now_millis();
        assert!((millis / 1000 - secs).abs() <= 1);
    }
}
