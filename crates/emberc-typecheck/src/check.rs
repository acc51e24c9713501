//! Declared-type checking for Ember (`spec.md` §4.10 / `SPEC_FULL.md` §4.10).
//!
//! No inference, no generics: every binding site carries (or borrows from
//! its initializer) an explicit [`Type`], and checking is a single
//! recursive walk that resolves names, checks call arity/type
//! compatibility, and — as a side effect — computes the two facts the code
//! generator needs from the front end: each function's effective
//! [`FunctionModifier`] (after the `DEFAULT`→`SHARED` heap-return
//! promotion) and the set of `return` statements that are eligible for the
//! tail-call trampoline.

use crate::context::{Binding, FnSig, Scopes, SymbolKind};
use crate::error::{Result, TypeError};
use emberc_mem::{StringInterner, Symbol};
use emberc_syntax::ast::decl::FunctionModifier;
use emberc_syntax::ast::expr::{BinaryOp, Expr, UnaryOp};
use emberc_syntax::ast::stmt::Stmt;
use emberc_syntax::ast::ty::Primitive;
use emberc_syntax::ast::{Decl, Type};
use emberc_syntax::span::{Span, Spanned};
use std::collections::{HashMap, HashSet};

/// The checker's output: everything the code generator needs that isn't
/// already on the AST.
pub struct CheckedProgram {
    /// Every top-level function's signature and resolved modifier.
    pub signatures: HashMap<Symbol, FnSig>,
    /// Spans of `Stmt::Return` nodes whose value is a direct, arity-matching
    /// self-call — eligible for the C5 tail-call trampoline.
    pub tail_calls: HashSet<Span>,
}

/// A "no value" sentinel: Ember's `Type` has no `Unit`/`void` variant, so
/// statement-position expressions (loops, bare calls) synthesize this one.
/// It is never compared against in a way that would reject legitimate
/// programs — only synthesized and then recursed past.
fn void_ty(span: Span) -> Type {
    Type::Any { span }
}

/// Reserved standard-library namespace identifiers: `Time.now()`,
/// `Random.intRange(...)`, and so on (`spec.md` §4.5's "namespace-qualified
/// call" case). These never resolve to a local/param/global binding, so
/// without this list they would be rejected as undefined names before the
/// `ns.f(args)` pattern ever reaches `emberc-codegen`.
const NAMESPACES: &[&str] = &[
    "Time", "Random", "Uuid", "Environment", "Tcp", "Udp", "TextFile", "BinaryFile",
];

fn is_numeric_primitive(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Primitive {
            kind: Primitive::Int
                | Primitive::Long
                | Primitive::Double
                | Primitive::Byte
                | Primitive::Char,
            ..
        }
    )
}

struct Checker<'a> {
    interner: &'a StringInterner,
    signatures: &'a HashMap<Symbol, FnSig>,
    scopes: Scopes,
    current_fn: Symbol,
    current_return: Option<Type>,
    loop_depth: u32,
    tail_calls: HashSet<Span>,
    errors: Vec<TypeError>,
}

/// Checks an entire program (a list of top-level function declarations).
///
/// Returns the computed signature table and tail-call set on success, or
/// every error collected across every function on failure (the checker
/// does not stop at the first error within a function body — it does stop
/// building a program for emission, per `spec.md` §7's "first failure
/// halts" compile-time discipline, which the caller enforces by refusing
/// to hand a `CheckedProgram` to codegen when this returns `Err`).
pub fn check_program(decls: &[Decl], interner: &StringInterner) -> std::result::Result<CheckedProgram, Vec<TypeError>> {
    let mut errors = Vec::new();
    let mut signatures = HashMap::new();

    for decl in decls {
        let Decl::Fn {
            modifier,
            name,
            params,
            return_type,
            span,
            ..
        } = decl;
        if signatures.contains_key(name) {
            errors.push(TypeError::DuplicateFunction {
                name: interner.resolve(*name).unwrap_or("?").to_string(),
                span: *span,
            });
            continue;
        }
        let is_main = interner.resolve(*name) == Some("main");
        let effective_modifier = match modifier {
            FunctionModifier::Shared => FunctionModifier::Shared,
            FunctionModifier::Private => FunctionModifier::Private,
            FunctionModifier::Default => {
                if !is_main && return_type.as_ref().is_some_and(Type::is_heap_type) {
                    FunctionModifier::Shared
                } else {
                    FunctionModifier::Default
                }
            }
        };
        signatures.insert(
            *name,
            FnSig {
                params: params.iter().map(|p| p.type_annotation.clone()).collect(),
                return_type: return_type.clone(),
                declared_modifier: *modifier,
                effective_modifier,
            },
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut tail_calls = HashSet::new();
    for decl in decls {
        let Decl::Fn {
            name, params, body, ..
        } = decl;
        let mut checker = Checker {
            interner,
            signatures: &signatures,
            scopes: Scopes::new(),
            current_fn: *name,
            current_return: signatures.get(name).and_then(|s| s.return_type.clone()),
            loop_depth: 0,
            tail_calls: HashSet::new(),
            errors: Vec::new(),
        };
        for p in params {
            checker
                .scopes
                .bind(p.name, p.type_annotation.clone(), SymbolKind::Param);
        }
        let _ = checker.infer_expr(body);
        errors.extend(checker.errors);
        tail_calls.extend(checker.tail_calls);
    }

    if errors.is_empty() {
        Ok(CheckedProgram {
            signatures,
            tail_calls,
        })
    } else {
        Err(errors)
    }
}

impl Checker<'_> {
    fn err(&mut self, e: TypeError) {
        self.errors.push(e);
    }

    fn name_text(&self, sym: Symbol) -> String {
        self.interner.resolve(sym).unwrap_or("?").to_string()
    }

    fn infer_expr(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::IntegerLiteral { span, .. } => Type::Primitive {
                kind: Primitive::Long,
                span: *span,
            },
            Expr::FloatLiteral { span, .. } => Type::Primitive {
                kind: Primitive::Double,
                span: *span,
            },
            Expr::StringLiteral { span, .. } => Type::String { span: *span },
            Expr::BoolLiteral { span, .. } => Type::Primitive {
                kind: Primitive::Bool,
                span: *span,
            },
            Expr::Nil { span } => Type::Any { span: *span },

            Expr::Identifier { name, span } => {
                if let Some(Binding { ty, .. }) = self.scopes.lookup(*name) {
                    ty.clone()
                } else if let Some(sig) = self.signatures.get(name) {
                    Type::Function {
                        params: sig.params.clone(),
                        return_type: Box::new(
                            sig.return_type.clone().unwrap_or_else(|| void_ty(*span)),
                        ),
                        span: *span,
                    }
                } else {
                    self.err(TypeError::UndefinedName {
                        name: self.name_text(*name),
                        span: *span,
                    });
                    Type::Any { span: *span }
                }
            }

            Expr::Unary { op, operand, span } => {
                let t = self.infer_expr(operand);
                match op {
                    UnaryOp::Negate => {
                        if !matches!(t, Type::Primitive { kind: Primitive::Bool, .. }) {
                            self.err(TypeError::InvalidOperatorOperands {
                                op: op.to_string(),
                                operand: t.to_string(),
                                span: *span,
                            });
                        }
                        t
                    }
                    UnaryOp::Minus => {
                        if !is_numeric_primitive(&t) {
                            self.err(TypeError::InvalidOperatorOperands {
                                op: op.to_string(),
                                operand: t.to_string(),
                                span: *span,
                            });
                        }
                        t
                    }
                }
            }

            Expr::Binary {
                left,
                op,
                right,
                span,
            } => {
                let lt = self.infer_expr(left);
                let rt = self.infer_expr(right);
                self.check_binary(*op, &lt, &rt, *span)
            }

            Expr::Assign { target, value, span } => {
                let vt = self.infer_expr(value);
                match target.as_ref() {
                    Expr::Identifier { name, .. } => {
                        if let Some(b) = self.scopes.lookup(*name) {
                            if !b.ty.shape_eq(&vt) && !matches!(b.ty, Type::Any { .. }) && !matches!(vt, Type::Any { .. }) {
                                self.err(TypeError::TypeMismatch {
                                    expected: b.ty.to_string(),
                                    found: vt.to_string(),
                                    span: *span,
                                });
                            }
                        } else {
                            self.err(TypeError::UndefinedName {
                                name: self.name_text(*name),
                                span: *span,
                            });
                        }
                    }
                    Expr::Index { collection, index, .. } => {
                        self.infer_expr(collection);
                        self.infer_expr(index);
                    }
                    _ => self.err(TypeError::InvalidAssignmentTarget { span: *span }),
                }
                vt
            }

            Expr::If {
                condition,
                then_branch,
                else_branch,
                span,
            } => {
                let ct = self.infer_expr(condition);
                if !matches!(ct, Type::Primitive { kind: Primitive::Bool, .. }) {
                    self.err(TypeError::TypeMismatch {
                        expected: "bool".into(),
                        found: ct.to_string(),
                        span: condition.span(),
                    });
                }
                let tt = self.infer_expr(then_branch);
                if let Some(e) = else_branch {
                    let et = self.infer_expr(e);
                    if !tt.shape_eq(&et)
                        && !matches!(tt, Type::Any { .. })
                        && !matches!(et, Type::Any { .. })
                    {
                        self.err(TypeError::TypeMismatch {
                            expected: tt.to_string(),
                            found: et.to_string(),
                            span: *span,
                        });
                    }
                }
                tt
            }

            Expr::Block {
                stmts, tail, span, ..
            } => {
                self.scopes.push();
                for s in stmts {
                    self.check_stmt(s);
                }
                let ty = tail
                    .as_ref()
                    .map(|t| self.infer_expr(t))
                    .unwrap_or_else(|| void_ty(*span));
                self.scopes.pop();
                ty
            }

            Expr::ForLoop {
                binder,
                iter,
                body,
                span,
            } => {
                let elem_ty = match iter.as_ref() {
                    Expr::Range { start, end, .. } => {
                        self.infer_expr(start);
                        self.infer_expr(end);
                        Type::Primitive {
                            kind: Primitive::Long,
                            span: *span,
                        }
                    }
                    other => match self.infer_expr(other) {
                        Type::Array { element, .. } => *element,
                        found => {
                            self.err(TypeError::NotIndexable {
                                found: found.to_string(),
                                span: iter.span(),
                            });
                            Type::Any { span: *span }
                        }
                    },
                };
                self.scopes.push();
                self.scopes.bind(*binder, elem_ty, SymbolKind::Local);
                self.loop_depth += 1;
                self.infer_expr(body);
                self.loop_depth -= 1;
                self.scopes.pop();
                void_ty(*span)
            }

            Expr::WhileLoop { condition, body, span } => {
                let ct = self.infer_expr(condition);
                if !matches!(ct, Type::Primitive { kind: Primitive::Bool, .. }) {
                    self.err(TypeError::TypeMismatch {
                        expected: "bool".into(),
                        found: ct.to_string(),
                        span: condition.span(),
                    });
                }
                self.loop_depth += 1;
                self.infer_expr(body);
                self.loop_depth -= 1;
                void_ty(*span)
            }

            Expr::Range { start, end, span } => {
                self.infer_expr(start);
                self.infer_expr(end);
                Type::Primitive {
                    kind: Primitive::Long,
                    span: *span,
                }
            }

            Expr::Call { callee, args, span } => self.check_call(callee, args, *span),

            Expr::MethodCall {
                receiver,
                args,
                span,
                ..
            } => {
                if let Expr::Identifier { name, .. } = receiver.as_ref() {
                    let is_namespace = self.scopes.lookup(*name).is_none()
                        && !self.signatures.contains_key(name)
                        && self
                            .interner
                            .resolve(*name)
                            .is_some_and(|text| NAMESPACES.contains(&text));
                    if is_namespace {
                        for a in args {
                            self.infer_expr(a);
                        }
                        return Type::Any { span: *span };
                    }
                }
                let recv_ty = self.infer_expr(receiver);
                for a in args {
                    self.infer_expr(a);
                }
                self.method_result_type(&recv_ty, *span)
            }

            Expr::Array { elements, span } => {
                let element = if let Some(first) = elements.first() {
                    self.infer_expr(first)
                } else {
                    Type::Any { span: *span }
                };
                for e in elements.iter().skip(1) {
                    self.infer_expr(e);
                }
                Type::Array {
                    element: Box::new(element),
                    span: *span,
                }
            }

            Expr::Field { span, .. } => {
                self.err(TypeError::NotIndexable {
                    found: "field access (Ember has no structs)".into(),
                    span: *span,
                });
                Type::Any { span: *span }
            }

            Expr::Index { collection, index, span } => {
                let ct = self.infer_expr(collection);
                let it = self.infer_expr(index);
                if !is_numeric_primitive(&it) {
                    self.err(TypeError::TypeMismatch {
                        expected: "integer index".into(),
                        found: it.to_string(),
                        span: *span,
                    });
                }
                match ct {
                    Type::Array { element, .. } => *element,
                    found => {
                        self.err(TypeError::NotIndexable {
                            found: found.to_string(),
                            span: *span,
                        });
                        Type::Any { span: *span }
                    }
                }
            }

            Expr::Paren { expr, .. } => self.infer_expr(expr),

            Expr::Lambda { params, body, span } => {
                self.scopes.push();
                for p in params {
                    self.scopes
                        .bind(p.name, p.type_annotation.clone(), SymbolKind::Local);
                }
                let ret = self.infer_expr(body);
                self.scopes.pop();
                Type::Function {
                    params: params.iter().map(|p| p.type_annotation.clone()).collect(),
                    return_type: Box::new(ret),
                    span: *span,
                }
            }
        }
    }

    fn check_binary(&mut self, op: BinaryOp, lt: &Type, rt: &Type, span: Span) -> Type {
        let operand_desc = || format!("{lt} and {rt}");
        match op {
            BinaryOp::Add if matches!(lt, Type::String { .. }) || matches!(rt, Type::String { .. }) => {
                Type::String { span }
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                if is_numeric_primitive(lt) && lt.shape_eq(rt) {
                    lt.clone()
                } else if is_numeric_primitive(lt) && is_numeric_primitive(rt) {
                    lt.clone()
                } else {
                    self.err(TypeError::InvalidOperatorOperands {
                        op: op.to_string(),
                        operand: operand_desc(),
                        span,
                    });
                    Type::Any { span }
                }
            }
            BinaryOp::Eq | BinaryOp::Neq => Type::Primitive {
                kind: Primitive::Bool,
                span,
            },
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Lte | BinaryOp::Gte => {
                if !(is_numeric_primitive(lt) || matches!(lt, Type::String { .. })) {
                    self.err(TypeError::InvalidOperatorOperands {
                        op: op.to_string(),
                        operand: operand_desc(),
                        span,
                    });
                }
                Type::Primitive {
                    kind: Primitive::Bool,
                    span,
                }
            }
            BinaryOp::And | BinaryOp::Or => {
                let bool_ty = |t: &Type| matches!(t, Type::Primitive { kind: Primitive::Bool, .. });
                if !bool_ty(lt) || !bool_ty(rt) {
                    self.err(TypeError::InvalidOperatorOperands {
                        op: op.to_string(),
                        operand: operand_desc(),
                        span,
                    });
                }
                Type::Primitive {
                    kind: Primitive::Bool,
                    span,
                }
            }
        }
    }

    fn check_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> Type {
        let arg_types: Vec<Type> = args.iter().map(|a| self.infer_expr(a)).collect();

        if let Expr::Identifier { name, .. } = callee {
            if let Some(sig) = self.signatures.get(name).cloned() {
                if sig.params.len() != args.len() {
                    self.err(TypeError::ArityMismatch {
                        name: self.name_text(*name),
                        expected: sig.params.len(),
                        found: args.len(),
                        span,
                    });
                }
                return sig.return_type.unwrap_or_else(|| void_ty(span));
            }
            if self.scopes.lookup(*name).is_none() {
                self.err(TypeError::UndefinedFunction {
                    name: self.name_text(*name),
                    span,
                });
                return Type::Any { span };
            }
        }

        match self.infer_expr(callee) {
            Type::Function {
                params,
                return_type,
                ..
            } => {
                if params.len() != arg_types.len() {
                    self.err(TypeError::ArityMismatch {
                        name: "<closure>".into(),
                        expected: params.len(),
                        found: arg_types.len(),
                        span,
                    });
                }
                *return_type
            }
            found => {
                self.err(TypeError::NotCallable {
                    found: found.to_string(),
                    span,
                });
                Type::Any { span }
            }
        }
    }

    /// `true` when `value` is a direct, arity-matching call to the
    /// enclosing function, in tail position (a `return`'s own value) —
    /// the only shape `emberc-codegen`'s `while(1)` trampoline handles.
    fn is_self_tail_call(&self, value: &Option<Expr>) -> bool {
        let Some(Expr::Call { callee, args, .. }) = value else {
            return false;
        };
        let Expr::Identifier { name, .. } = callee.as_ref() else {
            return false;
        };
        *name == self.current_fn
            && self
                .signatures
                .get(name)
                .is_some_and(|sig| sig.params.len() == args.len())
    }

    fn method_result_type(&self, recv_ty: &Type, span: Span) -> Type {
        match recv_ty {
            Type::Array { element, .. } => Type::Array {
                element: element.clone(),
                span,
            },
            Type::String { .. } => Type::String { span },
            _ => Type::Any { span },
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl {
                name,
                type_annotation,
                init,
                span,
            } => {
                let init_ty = self.infer_expr(init);
                let ty = if let Some(annot) = type_annotation {
                    if !annot.shape_eq(&init_ty) && !matches!(init_ty, Type::Any { .. }) {
                        self.err(TypeError::TypeMismatch {
                            expected: annot.to_string(),
                            found: init_ty.to_string(),
                            span: *span,
                        });
                    }
                    annot.clone()
                } else {
                    init_ty
                };
                self.scopes.bind(*name, ty, SymbolKind::Local);
            }
            Stmt::Return { value, span } => {
                let found = value.as_ref().map(|v| self.infer_expr(v));
                if self.is_self_tail_call(value) {
                    self.tail_calls.insert(*span);
                }
                match (&self.current_return, &found) {
                    (Some(expected), Some(found_ty)) => {
                        if !expected.shape_eq(found_ty) && !matches!(found_ty, Type::Any { .. }) {
                            self.err(TypeError::ReturnTypeMismatch {
                                expected: expected.to_string(),
                                found: found_ty.to_string(),
                                span: *span,
                            });
                        }
                    }
                    (None, Some(found_ty)) => {
                        self.err(TypeError::ReturnTypeMismatch {
                            expected: "void".into(),
                            found: found_ty.to_string(),
                            span: *span,
                        });
                    }
                    (Some(expected), None) => {
                        self.err(TypeError::ReturnTypeMismatch {
                            expected: expected.to_string(),
                            found: "void".into(),
                            span: *span,
                        });
                    }
                    (None, None) => {}
                }
            }
            Stmt::Break { span } | Stmt::Continue { span } => {
                if self.loop_depth == 0 {
                    self.err(TypeError::LoopControlOutsideLoop { span: *span });
                }
            }
            Stmt::Expr { expr, .. } => {
                self.infer_expr(expr);
            }
        }
    }
}
