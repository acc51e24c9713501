//! Errors produced while lowering a checked Ember program to C.
//!
//! Everything the checker could reject is rejected by the time code reaches
//! this crate; the cases here are the ones only codegen can see (mostly
//! constant-folding and method-dispatch failures that are `checked.rs`'s
//! job to have already made impossible, and a narrow set of survivors it
//! can't, because it resolves against types, not runtime receivers).

use emberc_syntax::span::Span;
use std::fmt;

/// A single code-generation failure, with the source location it occurred
/// at.
#[derive(Debug, Clone, PartialEq)]
pub enum CodegenError {
    /// A method name with no known lowering for its receiver type.
    UnknownMethod {
        receiver_type: String,
        method: String,
        span: Span,
    },
    /// A namespace call (`Time.now()`, `Random.intRange(...)`) with no
    /// known lowering.
    UnknownNamespaceCall { namespace: String, function: String, span: Span },
    /// A function referenced by a call has no recorded signature. The
    /// checker should have already rejected this; reaching codegen means a
    /// checker/codegen signature-table mismatch.
    MissingSignature { name: String, span: Span },
    /// A `break`/`continue` reached codegen outside of any loop frame. The
    /// checker rejects this at the source level; reaching here indicates an
    /// internal lowering bug.
    LoopControlOutsideLoop { span: Span },
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMethod {
                receiver_type,
                method,
                ..
            } => write!(f, "no lowering for method '{method}' on {receiver_type}"),
            Self::UnknownNamespaceCall {
                namespace,
                function,
                ..
            } => write!(f, "no lowering for '{namespace}.{function}'"),
            Self::MissingSignature { name, .. } => {
                write!(f, "internal error: no signature recorded for '{name}'")
            }
            Self::LoopControlOutsideLoop { .. } => {
                write!(f, "internal error: loop control reached codegen outside a loop frame")
            }
        }
    }
}

impl std::error::Error for CodegenError {}

impl CodegenError {
    /// The source span this error is anchored to.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::UnknownMethod { span, .. }
            | Self::UnknownNamespaceCall { span, .. }
            | Self::MissingSignature { span, .. }
            | Self::LoopControlOutsideLoop { span } => *span,
        }
    }
}

/// Result alias for the code generator.
pub type Result<T> = std::result::Result<T, CodegenError>;
