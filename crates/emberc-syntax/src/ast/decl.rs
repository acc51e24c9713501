//! Declaration nodes in the Ember AST.
//!
//! Ember has a single kind of top-level item: the function declaration.
//! There are no structs, classes, enums, protocols, or generics — the
//! language is exactly expressive enough to need the arena model `spec.md`
//! describes, and nothing more.

use crate::ast::expr::Expr;
use crate::span::{Span, Spanned};
use emberc_mem::Symbol;

/// A top-level declaration: always a function.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    /// Function declaration: `[shared|private] fn name(params): RetType { body }`
    Fn {
        /// Caller-arena / own-arena discipline requested at the source level
        modifier: FunctionModifier,
        /// Function name
        name: Symbol,
        /// Parameters
        params: Vec<Param>,
        /// Return type (absent means `void`)
        return_type: Option<crate::ast::ty::Type>,
        /// Function body (always a `Expr::Block`)
        body: Expr,
        /// Source location
        span: Span,
    },
}

impl Spanned for Decl {
    fn span(&self) -> Span {
        match self {
            Self::Fn { span, .. } => *span,
        }
    }
}

/// A function parameter: `name: Type`.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name
    pub name: Symbol,
    /// Parameter type
    pub type_annotation: crate::ast::ty::Type,
    /// Source location
    pub span: Span,
}

/// Function modifier per `spec.md` §3: `DEFAULT | PRIVATE | SHARED`.
///
/// `SHARED` borrows the caller's arena via a hidden first parameter;
/// `PRIVATE` and `DEFAULT` create their own. A `DEFAULT` function whose
/// declared return type is a heap type is implicitly promoted to `SHARED`
/// by the checker (`spec.md` §3, §4.7) — that promotion is a fact about the
/// function, not something the parser decides, so this enum only records
/// what the source text actually wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FunctionModifier {
    /// No modifier written at the declaration site.
    #[default]
    Default,
    /// `private fn ...`
    Private,
    /// `shared fn ...`
    Shared,
}

impl std::fmt::Display for FunctionModifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Private => write!(f, "private"),
            Self::Shared => write!(f, "shared"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    #[test]
    fn fn_decl_span() {
        let span = Span::new(0, 20, 1, 1, 1, 21);
        let body = Expr::Block {
            stmts: vec![],
            tail: None,
            modifier: Default::default(),
            span,
        };
        let decl = Decl::Fn {
            modifier: FunctionModifier::Default,
            name: Symbol::new(0),
            params: vec![],
            return_type: None,
            body,
            span,
        };
        assert_eq!(decl.span(), span);
    }

    #[test]
    fn modifier_default_is_default() {
        assert_eq!(FunctionModifier::default(), FunctionModifier::Default);
    }
}
