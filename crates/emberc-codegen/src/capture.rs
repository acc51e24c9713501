//! Capture analysis (C2): the pre-pass `spec.md` §4.4 describes.
//!
//! Walks a function body with lambda-depth tracking and collects every
//! LOCAL name of primitive type that is *referenced from inside a nested
//! lambda*. Parameters and locals of the enclosing function are both
//! candidates — a captured parameter needs the same AS_REF lift as a
//! captured `var`. The result feeds [`crate::context::Lowering::captured`],
//! which [`crate::stmt`] consults when lowering a `VarDecl` (and
//! [`crate::function`] consults for parameters) to decide whether to upgrade
//! a DEFAULT binding to AS_REF storage.
//!
//! This only needs to know *which primitive locals are captured*, not by
//! which lambda — `spec.md` §4.4 lifts the declaration site once, and every
//! lambda that closes over it reads through the same pointer.

use emberc_syntax::ast::expr::Expr;
use emberc_syntax::ast::stmt::Stmt;
use emberc_syntax::ast::Type;
use emberc_typecheck::context::{Scopes, SymbolKind};
use emberc_mem::Symbol;
use std::collections::HashSet;

struct Analysis {
    scopes: Scopes,
    lambda_depth: u32,
    captured: HashSet<Symbol>,
}

/// Returns the set of primitive-typed local/param names captured by any
/// lambda nested inside `body`, given the function's own parameter bindings.
#[must_use]
pub fn find_captures(params: &[(Symbol, Type)], body: &Expr) -> HashSet<Symbol> {
    let mut analysis = Analysis {
        scopes: Scopes::new(),
        lambda_depth: 0,
        captured: HashSet::new(),
    };
    for (name, ty) in params {
        analysis.scopes.bind(*name, ty.clone(), SymbolKind::Param);
    }
    analysis.walk_expr(body);
    analysis.captured
}

impl Analysis {
    fn note_use(&mut self, name: Symbol) {
        if self.lambda_depth == 0 {
            return;
        }
        if let Some(binding) = self.scopes.lookup(name) {
            if crate::context::is_primitive(&binding.ty) {
                self.captured.insert(name);
            }
        }
    }

    fn walk_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::IntegerLiteral { .. }
            | Expr::FloatLiteral { .. }
            | Expr::StringLiteral { .. }
            | Expr::BoolLiteral { .. }
            | Expr::Nil { .. } => {}

            Expr::Identifier { name, .. } => self.note_use(*name),

            Expr::Unary { operand, .. } => self.walk_expr(operand),

            Expr::Binary { left, right, .. } => {
                self.walk_expr(left);
                self.walk_expr(right);
            }

            Expr::Assign { target, value, .. } => {
                self.walk_expr(target);
                self.walk_expr(value);
            }

            Expr::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.walk_expr(condition);
                self.walk_expr(then_branch);
                if let Some(e) = else_branch {
                    self.walk_expr(e);
                }
            }

            Expr::Block { stmts, tail, .. } => {
                self.scopes.push();
                for s in stmts {
                    self.walk_stmt(s);
                }
                if let Some(t) = tail {
                    self.walk_expr(t);
                }
                self.scopes.pop();
            }

            Expr::ForLoop {
                binder, iter, body, span,
            } => {
                self.walk_expr(iter);
                self.scopes.push();
                // A range binder is always `long` (`spec.md` §4.10's ForLoop
                // inference); an array-valued iterator's element type isn't
                // recoverable from this structural walk alone, so it's left
                // `any` — conservative (it just means that binder is never
                // flagged captured), never unsound (`any` isn't primitive).
                let elem_ty = if matches!(iter.as_ref(), Expr::Range { .. }) {
                    Type::Primitive { kind: emberc_syntax::ast::ty::Primitive::Long, span: *span }
                } else {
                    Type::Any { span: *span }
                };
                self.scopes.bind(*binder, elem_ty, SymbolKind::Local);
                self.walk_expr(body);
                self.scopes.pop();
            }

            Expr::WhileLoop { condition, body, .. } => {
                self.walk_expr(condition);
                self.walk_expr(body);
            }

            Expr::Range { start, end, .. } => {
                self.walk_expr(start);
                self.walk_expr(end);
            }

            Expr::Call { callee, args, .. } => {
                self.walk_expr(callee);
                for a in args {
                    self.walk_expr(a);
                }
            }

            Expr::MethodCall { receiver, args, .. } => {
                self.walk_expr(receiver);
                for a in args {
                    self.walk_expr(a);
                }
            }

            Expr::Array { elements, .. } => {
                for e in elements {
                    self.walk_expr(e);
                }
            }

            Expr::Field { object, .. } => self.walk_expr(object),

            Expr::Index { collection, index, .. } => {
                self.walk_expr(collection);
                self.walk_expr(index);
            }

            Expr::Paren { expr, .. } => self.walk_expr(expr),

            Expr::Lambda { params, body, .. } => {
                self.lambda_depth += 1;
                self.scopes.push();
                for p in params {
                    self.scopes
                        .bind(p.name, p.type_annotation.clone(), SymbolKind::Local);
                }
                self.walk_expr(body);
                self.scopes.pop();
                self.lambda_depth -= 1;
            }
        }
    }

    fn walk_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl { name, init, type_annotation, .. } => {
                self.walk_expr(init);
                let ty = type_annotation.clone().unwrap_or_else(|| placeholder_any(init));
                self.scopes.bind(*name, ty, SymbolKind::Local);
            }
            Stmt::Return { value, .. } => {
                if let Some(v) = value {
                    self.walk_expr(v);
                }
            }
            Stmt::Break { .. } | Stmt::Continue { .. } => {}
            Stmt::Expr { expr, .. } => self.walk_expr(expr),
        }
    }
}

fn placeholder_any(init: &Expr) -> Type {
    use emberc_syntax::span::Spanned;
    Type::Any { span: init.span() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberc_syntax::ast::expr::LambdaParam;
    use emberc_syntax::ast::ty::Primitive;
    use emberc_syntax::span::Span;

    fn sp() -> Span {
        Span::point(0, 1, 1)
    }

    fn int_ty() -> Type {
        Type::Primitive { kind: Primitive::Int, span: sp() }
    }

    #[test]
    fn primitive_local_mutated_in_lambda_is_captured() {
        let sum = Symbol::new(1);
        let x = Symbol::new(2);

        // { var sum: int = 0; var add = |x: int| { sum = sum + x }; }
        let body = Expr::Block {
            stmts: vec![
                Stmt::VarDecl {
                    name: sum,
                    type_annotation: Some(int_ty()),
                    init: Expr::IntegerLiteral { value: 0, span: sp() },
                    span: sp(),
                },
                Stmt::VarDecl {
                    name: Symbol::new(3),
                    type_annotation: None,
                    init: Expr::Lambda {
                        params: vec![LambdaParam {
                            name: x,
                            type_annotation: int_ty(),
                            span: sp(),
                        }],
                        body: Box::new(Expr::Assign {
                            target: Box::new(Expr::Identifier { name: sum, span: sp() }),
                            value: Box::new(Expr::Binary {
                                left: Box::new(Expr::Identifier { name: sum, span: sp() }),
                                op: emberc_syntax::ast::expr::BinaryOp::Add,
                                right: Box::new(Expr::Identifier { name: x, span: sp() }),
                                span: sp(),
                            }),
                            span: sp(),
                        }),
                        span: sp(),
                    },
                    span: sp(),
                },
            ],
            tail: None,
            modifier: Default::default(),
            span: sp(),
        };

        let captures = find_captures(&[], &body);
        assert!(captures.contains(&sum));
        assert!(!captures.contains(&x), "lambda's own parameter is not a capture");
    }

    #[test]
    fn reference_outside_any_lambda_is_not_captured() {
        let n = Symbol::new(10);
        let body = Expr::Block {
            stmts: vec![Stmt::VarDecl {
                name: n,
                type_annotation: Some(int_ty()),
                init: Expr::IntegerLiteral { value: 1, span: sp() },
                span: sp(),
            }],
            tail: Some(Box::new(Expr::Identifier { name: n, span: sp() })),
            modifier: Default::default(),
            span: sp(),
        };
        assert!(find_captures(&[], &body).is_empty());
    }
}
