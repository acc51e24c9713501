//! Process environment access backing `spec.md` §6's `Environment`
//! namespace.
//!
//! `get`/`set`/`has`/`remove`/`list`/`names` proxy directly to the
//! process environment; the typed variants (`get_int`, `get_long`,
//! `get_double`, `get_bool`) parse the stored string and trap — in the
//! Rust model, return [`Error::EnvironmentVariable`] — on a missing key
//! or a value that doesn't parse as the requested type, per the trap
//! message format fixed by `spec.md` §6.

use crate::error::{Error, Result};

/// Returns the value of `key`, or `default` if unset.
#[must_use]
pub fn get(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Sets `key` to `value` in the current process's environment.
///
/// # Safety
///
/// Mutating the process environment is not thread-safe on platforms
/// where other threads may concurrently read it (see
/// [`std::env::set_var`]'s documentation). `spec.md` §5 guarantees
/// emitted programs are single-threaded, so this is sound for the
/// runtime's own use.
pub unsafe fn set(key: &str, value: &str) {
    unsafe {
        std::env::set_var(key, value);
    }
}

/// `true` iff `key` is set, regardless of value.
#[must_use]
pub fn has(key: &str) -> bool {
    std::env::var(key).is_ok()
}

/// Removes `key` from the environment.
///
/// # Safety
///
/// See [`set`].
pub unsafe fn remove(key: &str) {
    unsafe {
        std::env::remove_var(key);
    }
}

/// All `KEY=VALUE` pairs currently set.
#[must_use]
pub fn list() -> Vec<(String, String)> {
    std::env::vars().collect()
}

/// All variable names currently set.
#[must_use]
pub fn names() -> Vec<String> {
    std::env::vars().map(|(k, _)| k).collect()
}

fn typed<T, F: FnOnce(&str) -> Option<T>>(key: &str, expected_type: &'static str, parse: F) -> Result<T> {
    let raw = std::env::var(key).map_err(|_| Error::EnvironmentVariable {
        key: key.to_string(),
        expected_type,
    })?;
    parse(&raw).ok_or_else(|| Error::EnvironmentVariable {
        key: key.to_string(),
        expected_type,
    })
}

/// Parses `key` as an `i32`, trapping on missing/malformed values.
pub fn get_int(key: &str) -> Result<i32> {
    typed(key, "int", |s| s.parse().ok())
}

/// Parses `key` as an `i64`, trapping on missing/malformed values.
pub fn get_long(key: &str) -> Result<i64> {
    typed(key, "long", |s| s.parse().ok())
}

/// Parses `key` as an `f64`, trapping on missing/malformed values.
pub fn get_double(key: &str) -> Result<f64> {
    typed(key, "double", |s| s.parse().ok())
}

/// Parses `key` as a `bool` (`"true"`/`"false"`, case-insensitive),
/// trapping on missing/malformed values.
pub fn get_bool(key: &str) -> Result<bool> {
    typed(key, "bool", |s| match s.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variable tests mutate genuinely global process state;
    // serialize them so concurrent test threads don't race each other.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn get_returns_default_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        assert_eq!(get("EMBERC_TEST_UNSET_VAR", "fallback"), "fallback");
    }

    #[test]
    fn set_has_get_remove_round_trip() {
        let _guard = ENV_LOCK.lock().unwrap();
        let key = "EMBERC_TEST_ROUND_TRIP";
        assert!(!has(key));
        // SAFETY: single-threaded w.r.t. this guarded test.
        unsafe {
            set(key, "value");
        }
        assert!(has(key));
        assert_eq!(get(key, "default"), "value");
        // SAFETY: see above.
        unsafe {
            remove(key);
        }
        assert!(!has(key));
    }

    #[test]
    fn typed_getters_parse_or_trap() {
        let _guard = ENV_LOCK.lock().unwrap();
        let key = "EMBERC_TEST_TYPED";
        // SAFETY: single-threaded w.r.t. this guarded test.
        unsafe {
            set(key, "42");
        }
        assert_eq!(get_int(key).unwrap(), 42);
        assert_eq!(get_long(key).unwrap(), 42);

        // SAFETY: see above.
        unsafe {
            set(key, "not a number");
        }
        assert!(get_int(key).is_err());

        // SAFETY: see above.
        unsafe {
            set(key, "true");
        }
        assert!(get_bool(key).unwrap());
        // SAFETY: see above.
        unsafe {
            remove(key);
        }
    }

    #[test]
    fn missing_key_traps_with_environment_variable_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        let err = get_int("EMBERC_TEST_DEFINITELY_MISSING").unwrap_err();
        assert!(matches!(err, Error::EnvironmentVariable { .. }));
    }
}
