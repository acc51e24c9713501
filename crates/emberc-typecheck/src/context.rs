//! The checker's scope stack and global function-signature table.
//!
//! A `Vec` of per-block maps, innermost scope last, with the inference
//! machinery stripped out: Ember requires an explicit type annotation at
//! every binding site, so there is nothing to unify.

use emberc_syntax::ast::decl::FunctionModifier;
use emberc_syntax::ast::Type;
use emberc_mem::Symbol;
use std::collections::HashMap;

/// Where a name resolved from, per `spec.md` §3's `Symbol.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// A top-level function name.
    Global,
    /// A function parameter.
    Param,
    /// A `var` binding inside a function body (including loop binders and
    /// lambda parameters).
    Local,
}

/// A resolved variable binding: its type and where it came from.
#[derive(Debug, Clone)]
pub struct Binding {
    /// The variable's type.
    pub ty: Type,
    /// What kind of name this is.
    pub kind: SymbolKind,
}

/// A declared function's signature, as recorded from its `Decl::Fn` node.
#[derive(Debug, Clone)]
pub struct FnSig {
    /// Parameter types, in declaration order.
    pub params: Vec<Type>,
    /// Declared return type (`None` means the function returns no value).
    pub return_type: Option<Type>,
    /// The modifier written at the declaration site.
    pub declared_modifier: FunctionModifier,
    /// The modifier after the `spec.md` §3 promotion rule is applied.
    pub effective_modifier: FunctionModifier,
}

/// Scope stack used while checking one function body.
pub struct Scopes {
    stack: Vec<HashMap<Symbol, Binding>>,
}

impl Scopes {
    /// Creates a scope stack with one (the outermost, parameter) scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: vec![HashMap::new()],
        }
    }

    /// Pushes a fresh, empty scope (block entry).
    pub fn push(&mut self) {
        self.stack.push(HashMap::new());
    }

    /// Pops the innermost scope (block exit).
    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// Binds `name` in the innermost scope, shadowing any outer binding.
    pub fn bind(&mut self, name: Symbol, ty: Type, kind: SymbolKind) {
        self.stack
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name, Binding { ty, kind });
    }

    /// Resolves `name`, searching from the innermost scope outward.
    #[must_use]
    pub fn lookup(&self, name: Symbol) -> Option<&Binding> {
        self.stack.iter().rev().find_map(|scope| scope.get(&name))
    }

    /// Current scope-stack depth (number of live `push`es, including the
    /// outermost parameter scope). `emberc-codegen` uses this to tell
    /// whether a binding was declared inside or outside the loop body
    /// currently being lowered.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberc_syntax::span::Span;

    fn long() -> Type {
        Type::Primitive {
            kind: emberc_syntax::ast::ty::Primitive::Long,
            span: Span::point(0, 1, 1),
        }
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let mut scopes = Scopes::new();
        scopes.bind(Symbol::new(100), long(), SymbolKind::Param);
        scopes.push();
        scopes.bind(Symbol::new(100), Type::Any { span: Span::point(0, 1, 1) }, SymbolKind::Local);
        assert!(matches!(
            scopes.lookup(Symbol::new(100)).unwrap().ty,
            Type::Any { .. }
        ));
        scopes.pop();
        assert!(matches!(
            scopes.lookup(Symbol::new(100)).unwrap().ty,
            Type::Primitive { .. }
        ));
    }

    #[test]
    fn unbound_name_is_none() {
        let scopes = Scopes::new();
        assert!(scopes.lookup(Symbol::new(999)).is_none());
    }
}
