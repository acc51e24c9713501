//! Symbol table construction and declared-type checking for `emberc`.
//!
//! Ember requires an explicit type annotation at every declaration site, so
//! this crate is a single recursive-descent checker, not a unification
//! engine: no type variables, no generics, no structs/enums/protocols (all
//! deliberately out of scope per `spec.md` §1 and `SPEC_FULL.md` §4.10).
//!
//! Besides producing diagnostics, this is where two facts the code
//! generator needs are computed once and handed down rather than
//! recomputed in `emberc-codegen`:
//!
//! - each function's effective [`FunctionModifier`](emberc_syntax::ast::decl::FunctionModifier)
//!   after the `DEFAULT` → `SHARED` heap-return promotion rule;
//! - the set of `return` statements eligible for the C5 tail-call
//!   trampoline (a `return f(args)` where `f` is the enclosing function).

#![warn(missing_docs)]

pub mod check;
pub mod context;
pub mod error;

pub use check::{check_program, CheckedProgram};
pub use context::{Binding, FnSig, Scopes, SymbolKind};
pub use error::TypeError;
