//! Type errors produced while checking an Ember program.

use emberc_syntax::span::Span;
use std::fmt;

/// A single type-checking failure, with the source location it occurred at.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeError {
    /// Use of a name that was never declared in any enclosing scope.
    UndefinedName { name: String, span: Span },
    /// Call to a function name that has no declaration.
    UndefinedFunction { name: String, span: Span },
    /// Redeclaration of a function name already declared at module scope.
    DuplicateFunction { name: String, span: Span },
    /// Call-site argument count does not match the declared parameter count.
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    /// An expression's type does not match what was required by its context
    /// (e.g. an initializer against an explicit `var` annotation, an
    /// argument against a parameter type, a condition against `bool`).
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },
    /// `break`/`continue` outside of any enclosing loop.
    LoopControlOutsideLoop { span: Span },
    /// `return <expr>` in a function declared to return nothing, or a bare
    /// `return` in one that must return a value.
    ReturnTypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },
    /// Assignment to a name the checker could not resolve as an lvalue.
    InvalidAssignmentTarget { span: Span },
    /// A binary/unary operator applied to operand type(s) it isn't defined
    /// for (e.g. `&&` on integers).
    InvalidOperatorOperands {
        op: String,
        operand: String,
        span: Span,
    },
    /// Indexing or iterating a non-array, non-range expression.
    NotIndexable { found: String, span: Span },
    /// Calling something that isn't a function or closure value.
    NotCallable { found: String, span: Span },
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedName { name, .. } => write!(f, "undefined name '{name}'"),
            Self::UndefinedFunction { name, .. } => write!(f, "undefined function '{name}'"),
            Self::DuplicateFunction { name, .. } => {
                write!(f, "function '{name}' is declared more than once")
            }
            Self::ArityMismatch {
                name,
                expected,
                found,
                ..
            } => write!(
                f,
                "'{name}' expects {expected} argument(s), found {found}"
            ),
            Self::TypeMismatch {
                expected, found, ..
            } => write!(f, "expected type {expected}, found {found}"),
            Self::LoopControlOutsideLoop { .. } => {
                write!(f, "'break'/'continue' outside of a loop")
            }
            Self::ReturnTypeMismatch {
                expected, found, ..
            } => write!(f, "function returns {expected}, found return of {found}"),
            Self::InvalidAssignmentTarget { .. } => write!(f, "invalid assignment target"),
            Self::InvalidOperatorOperands { op, operand, .. } => {
                write!(f, "operator '{op}' is not defined for {operand}")
            }
            Self::NotIndexable { found, .. } => write!(f, "cannot index into {found}"),
            Self::NotCallable { found, .. } => write!(f, "cannot call {found}"),
        }
    }
}

impl std::error::Error for TypeError {}

impl TypeError {
    /// The source span this error is anchored to.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::UndefinedName { span, .. }
            | Self::UndefinedFunction { span, .. }
            | Self::DuplicateFunction { span, .. }
            | Self::ArityMismatch { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::LoopControlOutsideLoop { span }
            | Self::ReturnTypeMismatch { span, .. }
            | Self::InvalidAssignmentTarget { span }
            | Self::InvalidOperatorOperands { span, .. }
            | Self::NotIndexable { span, .. }
            | Self::NotCallable { span, .. } => *span,
        }
    }
}

/// Result alias for the checker.
pub type Result<T> = std::result::Result<T, TypeError>;
