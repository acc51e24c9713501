//! Error types for the emberc runtime.
//!
//! The emitted-C runtime traps fatally on the categories in this module
//! (arithmetic, bounds, resource, contract, environment-parse — see
//! [`trap`](crate::trap)); this `Error` type is the in-process Rust
//! equivalent used by this crate's own fallible constructors before a
//! trap would otherwise be raised.

use std::fmt;

/// Errors surfaced by `emberc-runtime` operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Arena allocation failed due to insufficient memory.
    OutOfMemory,

    /// `count * size` overflowed in a `calloc`-style allocation.
    SizeOverflow {
        /// Requested element count.
        count: usize,
        /// Requested element size.
        size: usize,
    },

    /// Index was outside `[0, length)` (or outside a valid slice range).
    IndexOutOfBounds {
        /// The offending index.
        index: i64,
        /// The collection's length at the time of the access.
        length: usize,
    },

    /// A slice operation was given a non-positive step.
    InvalidStep {
        /// The offending step value.
        step: i64,
    },

    /// Arithmetic overflowed in checked mode.
    ArithmeticOverflow {
        /// The operator that overflowed, e.g. `"+"`, `"*"`.
        op: &'static str,
    },

    /// Division or modulo by zero.
    DivisionByZero {
        /// The operator, `"/"` or `"%"`.
        op: &'static str,
    },

    /// A required pointer/argument was NULL where the contract forbids it.
    NullArgument {
        /// Name of the violated contract, e.g. `"string_append"`.
        context: &'static str,
    },

    /// I/O failure opening, reading, writing, or closing a resource.
    Io {
        /// The offending path, if any.
        path: Option<String>,
        /// The underlying OS error text.
        message: String,
    },

    /// An environment variable was missing or failed to parse as the
    /// requested type.
    EnvironmentVariable {
        /// The variable name.
        key: String,
        /// The type that was requested (`"int"`, `"long"`, ...).
        expected_type: &'static str,
    },

    /// A network operation failed (connect, bind, send, receive).
    Network {
        /// Description of the failed operation.
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfMemory => write!(f, "rt_arena: out of memory"),
            Error::SizeOverflow { count, size } => {
                write!(f, "rt_arena_calloc: {count} * {size} overflows size_t")
            }
            Error::IndexOutOfBounds { index, length } => {
                write!(f, "rt_array: index {index} out of bounds for length {length}")
            }
            Error::InvalidStep { step } => {
                write!(f, "rt_array_slice: step {step} must be positive")
            }
            Error::ArithmeticOverflow { op } => write!(f, "rt_{op}: integer overflow"),
            Error::DivisionByZero { op } => write!(f, "rt_{op}: division by zero"),
            Error::NullArgument { context } => {
                write!(f, "{context}: NULL argument violates contract")
            }
            Error::Io { path, message } => match path {
                Some(path) => write!(f, "rt_file: '{path}': {message}"),
                None => write!(f, "rt_file: {message}"),
            },
            Error::EnvironmentVariable { key, expected_type } => write!(
                f,
                "RuntimeError: Environment variable '{key}' not set or invalid {expected_type}"
            ),
            Error::Network { message } => write!(f, "rt_net: {message}"),
        }
    }
}

impl std::error::Error for Error {}

/// Convenience alias for this crate's fallible operations.
pub type Result<T> = std::result::Result<T, Error>;
