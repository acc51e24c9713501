//! Pseudo-random number generation backing the source language's
//! `Random` namespace.
//!
//! `spec.md` §9 flags the C runtime's `srand`-once global flag as state
//! a rewrite should replace with "explicit context; lazily initialize
//! with a once-guard." [`RandomState`] is the explicit context (an
//! xorshift64* generator seeded once); [`default_state`] is the
//! once-guarded lazy singleton backing the convenience functions that
//! mirror the emitted C's unqualified `random(...)` calls, which carry no
//! explicit generator argument.

use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// An explicit, seedable pseudo-random generator (xorshift64*).
///
/// Not cryptographically secure — matching the C runtime's `rand(3)`-
/// based original, whose only contract is statistical variety for
/// gameplay/test-data style use, not security.
pub struct RandomState {
    state: u64,
}

impl RandomState {
    /// Seeds a new generator explicitly.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        RandomState {
            state: seed.max(1),
        }
    }

    /// Seeds from the system clock, for callers that don't care about
    /// reproducibility.
    #[must_use]
    pub fn from_time() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E3779B97F4A7C15);
        Self::new(seed)
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// A uniform `i64` in `[low, high)`. Traps are the caller's
    /// responsibility if `high <= low` (mirrors the runtime's eager-trap
    /// error-handling design in `spec.md` §7); this function clamps to a
    /// single-point range instead of panicking, matching "everything is
    /// eager and fail-fast" only at the emitted-call boundary, not inside
    /// library internals.
    pub fn int_range(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        let span = (high - low) as u64;
        low + (self.next_u64() % span) as i64
    }

    /// A uniform `f64` in `[0.0, 1.0)`.
    pub fn next_double(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// A uniform `bool`.
    pub fn next_bool(&mut self) -> bool {
        self.next_u64() & 1 == 1
    }
}

/// The once-guarded, lazily seeded singleton backing the unqualified
/// `random(...)` call family.
fn default_state() -> &'static Mutex<RandomState> {
    static STATE: OnceLock<Mutex<RandomState>> = OnceLock::new();
    STATE.get_or_init(|| Mutex::new(RandomState::from_time()))
}

/// `Random.intRange(low, high)` using the process-wide default generator.
pub fn int_range(low: i64, high: i64) -> i64 {
    default_state()
        .lock()
        .expect("random generator mutex poisoned")
        .int_range(low, high)
}

/// `Random.double()` using the process-wide default generator.
pub fn next_double() -> f64 {
    default_state()
        .lock()
        .expect("random generator mutex poisoned")
        .next_double()
}

/// `Random.bool()` using the process-wide default generator.
pub fn next_bool() -> bool {
    default_state()
        .lock()
        .expect("random generator mutex poisoned")
        .next_bool()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_range_stays_within_bounds() {
        let mut rng = RandomState::new(42);
        for _ in 0..1000 {
            let n = rng.int_range(10, 20);
            assert!((10..20).contains(&n));
        }
    }

    #[test]
    fn degenerate_range_returns_low() {
        let mut rng = RandomState::new(1);
        assert_eq!(rng.int_range(5, 5), 5);
        assert_eq!(rng.int_range(5, 3), 5);
    }

    #[test]
    fn next_double_stays_within_unit_interval() {
        let mut rng = RandomState::new(7);
        for _ in 0..1000 {
            let d = rng.next_double();
            assert!((0.0..1.0).contains(&d));
        }
    }

    #[test]
    fn same_seed_reproduces_sequence() {
        let mut a = RandomState::new(123);
        let mut b = RandomState::new(123);
        for _ in 0..10 {
            assert_eq!(a.int_range(0, 1_000_000), b.int_range(0, 1_000_000));
        }
    }
}
