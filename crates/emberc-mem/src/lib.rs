//! Region (arena) memory model shared by the `emberc` code generator and
//! runtime.
//!
//! This crate provides:
//!
//! - [`arena`]: the block-chained bump allocator (R1 in `spec.md`) that both
//!   `emberc-runtime` (modeling the emitted-C/runtime-library boundary) and
//!   `emberc-codegen` (modeling the compile-time arena-variable bookkeeping)
//!   build on.
//! - [`interner`] / [`symbol`]: string interning for the compiler frontend
//!   (`emberc-syntax`, `emberc-typecheck`), gated behind the
//!   `string-interner` feature so that crates which only need the arena
//!   (like `emberc-runtime`) don't pull in interning machinery they never
//!   use.
//!
//! # Features
//!
//! - `symbols` — enables the [`Symbol`] type.
//! - `string-interner` — enables [`StringInterner`] (implies `symbols`).

pub mod arena;

#[cfg(feature = "string-interner")]
pub mod interner;

#[cfg(feature = "symbols")]
pub mod symbol;

pub use arena::{Arena, ArenaError, ArenaStats, FileHandle, TrackedFile};

#[cfg(feature = "string-interner")]
pub use interner::StringInterner;

#[cfg(feature = "symbols")]
pub use symbol::Symbol;
