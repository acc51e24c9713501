//! Expression lowering (C3): `spec.md` §4.5.
//!
//! Every [`Expr`] lowers to a single C expression string. Multi-step
//! lowerings (the statement-expression wrapping for arena-free string
//! temporaries, boxing to `any`) are expressed with GNU C statement
//! expressions (`({ ...; expr; })`) so the result is still one expression —
//! this follows the same convention as the AST pretty-printer: building
//! nested output through plain string composition rather than a separate IR.
//!
//! This module also re-derives each sub-expression's static type during
//! lowering. `emberc-typecheck` computes every type once but (by design —
//! see DESIGN.md) does not write it back onto the AST, so lowering runs its
//! own minimal, non-diagnosing walk — [`infer_type`] — structurally
//! identical to the checker's `infer_expr` but trusting that the checker
//! already accepted the program (no error paths, no `TypeError`).

use crate::context::{ArithmeticMode, Lowering};
use crate::error::{CodegenError, Result};
use crate::types::{array_elem_suffix, c_type_name};
use emberc_syntax::ast::expr::{BinaryOp, Expr, UnaryOp};
use emberc_syntax::ast::ty::Primitive;
use emberc_syntax::ast::Type;
use emberc_syntax::span::{Span, Spanned};

/// Re-derives the static type of `expr` against the bindings and function
/// signatures visible in `ctx` right now. Structurally mirrors
/// `emberc_typecheck::check::Checker::infer_expr`; see that module for the
/// rules this mirrors (doc'd there, not duplicated here).
#[must_use]
pub fn infer_type(ctx: &Lowering, expr: &Expr) -> Type {
    match expr {
        Expr::IntegerLiteral { span, .. } => Type::Primitive { kind: Primitive::Long, span: *span },
        Expr::FloatLiteral { span, .. } => Type::Primitive { kind: Primitive::Double, span: *span },
        Expr::StringLiteral { span, .. } => Type::String { span: *span },
        Expr::BoolLiteral { span, .. } => Type::Primitive { kind: Primitive::Bool, span: *span },
        Expr::Nil { span } => Type::Any { span: *span },

        Expr::Identifier { name, span } => {
            if let Some(ty) = ctx.lookup_type(*name) {
                ty.clone()
            } else if let Some(sig) = ctx.signatures.get(name) {
                Type::Function {
                    params: sig.params.clone(),
                    return_type: Box::new(sig.return_type.clone().unwrap_or(Type::Any { span: *span })),
                    span: *span,
                }
            } else {
                Type::Any { span: *span }
            }
        }

        Expr::Unary { operand, span, .. } => infer_type(ctx, operand).with_span(*span),
        Expr::Binary { left, op, right, span } => infer_binary_type(ctx, *op, left, right, *span),
        Expr::Assign { value, .. } => infer_type(ctx, value),

        Expr::If { then_branch, else_branch, span, .. } => {
            let tt = infer_type(ctx, then_branch);
            if matches!(tt, Type::Any { .. }) {
                if let Some(e) = else_branch {
                    return infer_type(ctx, e);
                }
            }
            tt.with_span(*span)
        }

        Expr::Block { tail, span, .. } => tail
            .as_ref()
            .map(|t| infer_type(ctx, t))
            .unwrap_or(Type::Any { span: *span }),

        Expr::ForLoop { span, .. } | Expr::WhileLoop { span, .. } => Type::Any { span: *span },

        Expr::Range { span, .. } => Type::Primitive { kind: Primitive::Long, span: *span },

        Expr::Call { callee, span, .. } => {
            if let Expr::Identifier { name, .. } = callee.as_ref() {
                if let Some(sig) = ctx.signatures.get(name) {
                    return sig.return_type.clone().unwrap_or(Type::Any { span: *span });
                }
            }
            match infer_type(ctx, callee) {
                Type::Function { return_type, .. } => *return_type,
                _ => Type::Any { span: *span },
            }
        }

        Expr::MethodCall { receiver, span, .. } => {
            if matches!(receiver.as_ref(), Expr::Identifier { .. }) && is_namespace_receiver(ctx, receiver) {
                return Type::Any { span: *span };
            }
            match infer_type(ctx, receiver) {
                Type::Array { element, .. } => Type::Array { element, span: *span },
                Type::String { .. } => Type::String { span: *span },
                _ => Type::Any { span: *span },
            }
        }

        Expr::Array { elements, span } => {
            let element = elements
                .first()
                .map(|e| infer_type(ctx, e))
                .unwrap_or(Type::Any { span: *span });
            Type::Array { element: Box::new(element), span: *span }
        }

        Expr::Field { span, .. } => Type::Any { span: *span },

        Expr::Index { collection, span, .. } => match infer_type(ctx, collection) {
            Type::Array { element, .. } => *element,
            _ => Type::Any { span: *span },
        },

        Expr::Paren { expr, .. } => infer_type(ctx, expr),

        Expr::Lambda { params, body, span } => Type::Function {
            params: params.iter().map(|p| p.type_annotation.clone()).collect(),
            return_type: Box::new(infer_type(ctx, body)),
            span: *span,
        },
    }
}

trait WithSpan {
    fn with_span(self, span: Span) -> Self;
}

impl WithSpan for Type {
    fn with_span(self, span: Span) -> Self {
        match self {
            Type::Primitive { kind, .. } => Type::Primitive { kind, span },
            Type::String { .. } => Type::String { span },
            Type::Any { .. } => Type::Any { span },
            other => other,
        }
    }
}

fn infer_binary_type(ctx: &Lowering, op: BinaryOp, left: &Expr, right: &Expr, span: Span) -> Type {
    match op {
        BinaryOp::Add => {
            let lt = infer_type(ctx, left);
            if matches!(lt, Type::String { .. }) {
                return Type::String { span };
            }
            let rt = infer_type(ctx, right);
            if matches!(rt, Type::String { .. }) {
                return Type::String { span };
            }
            lt.with_span(span)
        }
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            infer_type(ctx, left).with_span(span)
        }
        _ => Type::Primitive { kind: Primitive::Bool, span },
    }
}

fn is_namespace_receiver(ctx: &Lowering, receiver: &Expr) -> bool {
    let Expr::Identifier { name, .. } = receiver else {
        return false;
    };
    ctx.lookup_type(*name).is_none() && !ctx.signatures.contains_key(name)
}

/// A folded compile-time constant (`spec.md` §4.5's constant-folding rule).
#[derive(Debug, Clone, Copy)]
enum Const {
    Long(i64),
    Double(f64),
    Bool(bool),
}

impl Const {
    fn render(self) -> String {
        match self {
            Const::Long(v) => format!("{v}L"),
            Const::Double(v) => {
                if v.fract() == 0.0 && v.is_finite() {
                    format!("{v:.1}")
                } else {
                    format!("{v}")
                }
            }
            Const::Bool(v) => v.to_string(),
        }
    }
}

/// Attempts to fold `expr` to a literal value. Bottom-up: a binary/unary
/// node folds only if its operands fold. Division/modulo by a folded zero
/// refuses to fold (`spec.md` §4.5 routes that case to a runtime trap
/// instead, which a compile-time constant can't represent); integer
/// overflow on `+`/`-`/`*`/unary `-` wraps, matching the host's
/// two's-complement semantics.
fn try_fold(expr: &Expr) -> Option<Const> {
    match expr {
        Expr::IntegerLiteral { value, .. } => Some(Const::Long(*value)),
        Expr::FloatLiteral { value, .. } => Some(Const::Double(*value)),
        Expr::BoolLiteral { value, .. } => Some(Const::Bool(*value)),
        Expr::Paren { expr, .. } => try_fold(expr),

        Expr::Unary { op, operand, .. } => match (op, try_fold(operand)?) {
            (UnaryOp::Minus, Const::Long(v)) => Some(Const::Long(v.wrapping_neg())),
            (UnaryOp::Minus, Const::Double(v)) => Some(Const::Double(-v)),
            (UnaryOp::Negate, Const::Bool(v)) => Some(Const::Bool(!v)),
            _ => None,
        },

        Expr::Binary { left, op, right, .. } => {
            let (l, r) = (try_fold(left)?, try_fold(right)?);
            fold_binary(*op, l, r)
        }

        _ => None,
    }
}

fn fold_binary(op: BinaryOp, l: Const, r: Const) -> Option<Const> {
    use Const::{Bool, Double, Long};
    match (op, l, r) {
        (BinaryOp::And, Bool(a), Bool(b)) => Some(Bool(a && b)),
        (BinaryOp::Or, Bool(a), Bool(b)) => Some(Bool(a || b)),

        (BinaryOp::Add, Long(a), Long(b)) => Some(Long(a.wrapping_add(b))),
        (BinaryOp::Sub, Long(a), Long(b)) => Some(Long(a.wrapping_sub(b))),
        (BinaryOp::Mul, Long(a), Long(b)) => Some(Long(a.wrapping_mul(b))),
        (BinaryOp::Div, Long(a), Long(b)) => (b != 0).then(|| Long(a.wrapping_div(b))),
        (BinaryOp::Mod, Long(a), Long(b)) => (b != 0).then(|| Long(a.wrapping_rem(b))),

        (BinaryOp::Add, Double(a), Double(b)) => Some(Double(a + b)),
        (BinaryOp::Sub, Double(a), Double(b)) => Some(Double(a - b)),
        (BinaryOp::Mul, Double(a), Double(b)) => Some(Double(a * b)),
        (BinaryOp::Div, Double(a), Double(b)) => (b != 0.0).then(|| Double(a / b)),

        (BinaryOp::Eq, Long(a), Long(b)) => Some(Bool(a == b)),
        (BinaryOp::Neq, Long(a), Long(b)) => Some(Bool(a != b)),
        (BinaryOp::Lt, Long(a), Long(b)) => Some(Bool(a < b)),
        (BinaryOp::Gt, Long(a), Long(b)) => Some(Bool(a > b)),
        (BinaryOp::Lte, Long(a), Long(b)) => Some(Bool(a <= b)),
        (BinaryOp::Gte, Long(a), Long(b)) => Some(Bool(a >= b)),

        (BinaryOp::Eq, Double(a), Double(b)) => Some(Bool(a == b)),
        (BinaryOp::Neq, Double(a), Double(b)) => Some(Bool(a != b)),
        (BinaryOp::Lt, Double(a), Double(b)) => Some(Bool(a < b)),
        (BinaryOp::Gt, Double(a), Double(b)) => Some(Bool(a > b)),
        (BinaryOp::Lte, Double(a), Double(b)) => Some(Bool(a <= b)),
        (BinaryOp::Gte, Double(a), Double(b)) => Some(Bool(a >= b)),

        _ => None,
    }
}

/// `true` when `expr` is a loop counter name tracked as provably
/// non-negative (`spec.md` §4.5's index-bounds elision), or a non-negative
/// integer literal.
fn is_provably_non_negative(ctx: &Lowering, expr: &Expr) -> bool {
    match expr {
        Expr::IntegerLiteral { value, .. } => *value >= 0,
        Expr::Identifier { name, .. } => ctx.loop_counters.contains(name),
        Expr::Paren { expr, .. } => is_provably_non_negative(ctx, expr),
        _ => false,
    }
}

/// Lowers `expr` to a C expression.
pub fn lower_expr(ctx: &mut Lowering, expr: &Expr) -> Result<String> {
    if let Some(c) = try_fold(expr) {
        return Ok(c.render());
    }

    match expr {
        Expr::IntegerLiteral { value, .. } => Ok(format!("{value}L")),
        Expr::FloatLiteral { value, .. } => Ok(format!("{value}")),
        Expr::BoolLiteral { value, .. } => Ok(value.to_string()),
        Expr::Nil { .. } => Ok("rt_dyn_nil()".to_string()),

        Expr::StringLiteral { value, .. } => {
            Ok(format!("rt_string_from_literal({}, \"{}\")", ctx.arena_expr(), ctx.text(*value).escape_default()))
        }

        Expr::Identifier { name, .. } => {
            let text = ctx.text(*name).to_string();
            if ctx.as_ref_locals.contains(name) {
                Ok(format!("(*{text})"))
            } else {
                Ok(text)
            }
        }

        Expr::Unary { op, operand, .. } => {
            let inner = lower_expr(ctx, operand)?;
            match op {
                UnaryOp::Negate => Ok(format!("(!{inner})")),
                UnaryOp::Minus => {
                    let ty = infer_type(ctx, operand);
                    if ctx.arithmetic_mode == ArithmeticMode::Unchecked {
                        Ok(format!("(-{inner})"))
                    } else {
                        Ok(format!("rt_checked_neg_{}({inner})", primitive_suffix(&ty)))
                    }
                }
            }
        }

        Expr::Binary { left, op, right, span } => lower_binary(ctx, *op, left, right, *span),

        Expr::Assign { target, value, .. } => lower_assign(ctx, target, value),

        Expr::If { condition, then_branch, else_branch, .. } => {
            let c = lower_expr(ctx, condition)?;
            let t = lower_expr(ctx, then_branch)?;
            match else_branch {
                Some(e) => {
                    let e = lower_expr(ctx, e)?;
                    Ok(format!("({c} ? {t} : {e})"))
                }
                None => Ok(format!("({c} ? ({t}) : 0)")),
            }
        }

        Expr::Block { .. } => {
            // A block in expression position only appears as a statement's
            // tail value in this grammar (`if`/lambda bodies are the only
            // block-valued expressions C3 is asked to lower inline);
            // `crate::stmt` lowers block statements directly. Reaching this
            // arm means a block nested purely as a value — lower its tail.
            lower_block_value(ctx, expr)
        }

        Expr::Range { .. } | Expr::ForLoop { .. } | Expr::WhileLoop { .. } => {
            unreachable!("loop/range expressions are lowered by crate::stmt, not as values")
        }

        Expr::Call { callee, args, span } => lower_call(ctx, callee, args, *span),

        Expr::MethodCall { receiver, method, args, span } => {
            lower_method_call(ctx, receiver, *method, args, *span)
        }

        Expr::Array { elements, .. } => lower_array_literal(ctx, elements, &infer_type(ctx, expr)),

        Expr::Field { object, span, .. } => Err(CodegenError::UnknownMethod {
            receiver_type: infer_type(ctx, object).to_string(),
            method: "<field access>".to_string(),
            span: *span,
        }),

        Expr::Index { collection, index, span } => lower_index(ctx, collection, index, *span),

        Expr::Paren { expr, .. } => Ok(format!("({})", lower_expr(ctx, expr)?)),

        Expr::Lambda { .. } => crate::function::lower_lambda(ctx, expr),
    }
}

fn lower_block_value(ctx: &mut Lowering, expr: &Expr) -> Result<String> {
    let Expr::Block { stmts, tail, .. } = expr else {
        unreachable!()
    };
    let mut body = String::new();
    for s in stmts {
        body.push_str(&crate::stmt::lower_stmt(ctx, s)?);
    }
    let value = match tail {
        Some(t) => lower_expr(ctx, t)?,
        None => "0".to_string(),
    };
    Ok(format!("({{ {body} {value}; }})"))
}

fn primitive_suffix(ty: &Type) -> &'static str {
    match ty {
        Type::Primitive { kind, .. } => match kind {
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Double => "double",
            Primitive::Bool => "bool",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
        },
        _ => "long",
    }
}

fn checked_op_name(op: BinaryOp) -> Option<&'static str> {
    match op {
        BinaryOp::Add => Some("add"),
        BinaryOp::Sub => Some("sub"),
        BinaryOp::Mul => Some("mul"),
        BinaryOp::Div => Some("div"),
        BinaryOp::Mod => Some("mod"),
        _ => None,
    }
}

fn native_op_str(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "==",
        BinaryOp::Neq => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::Lte => "<=",
        BinaryOp::Gte => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
    }
}

fn lower_binary(ctx: &mut Lowering, op: BinaryOp, left: &Expr, right: &Expr, _span: Span) -> Result<String> {
    let lt = infer_type(ctx, left);
    let rt = infer_type(ctx, right);

    if op == BinaryOp::Add && (matches!(lt, Type::String { .. }) || matches!(rt, Type::String { .. })) {
        let l = lower_string_operand(ctx, left, &lt)?;
        let r = lower_string_operand(ctx, right, &rt)?;
        return Ok(format!("rt_str_concat({}, {l}, {r})", ctx.arena_expr()));
    }

    let l = lower_expr(ctx, left)?;
    let r = lower_expr(ctx, right)?;

    match op {
        BinaryOp::And | BinaryOp::Or => Ok(format!("({l} {} {r})", native_op_str(op))),

        BinaryOp::Eq | BinaryOp::Neq if matches!(lt, Type::String { .. }) => {
            let eq = format!("(rt_str_equals({l}, {r}))");
            Ok(if op == BinaryOp::Neq { format!("(!{eq})") } else { eq })
        }

        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Lte | BinaryOp::Gte
        | BinaryOp::Eq | BinaryOp::Neq => Ok(format!("({l} {} {r})", native_op_str(op))),

        BinaryOp::Div | BinaryOp::Mod => {
            // Division/modulo always route through the runtime even in
            // UNCHECKED mode — `spec.md` §4.5: "zero-check is required for
            // defined behavior".
            let name = checked_op_name(op).unwrap();
            Ok(format!("rt_checked_{name}_{}({l}, {r})", primitive_suffix(&lt)))
        }

        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
            if ctx.arithmetic_mode == ArithmeticMode::Unchecked {
                Ok(format!("({l} {} {r})", native_op_str(op)))
            } else {
                let name = checked_op_name(op).unwrap();
                Ok(format!("rt_checked_{name}_{}({l}, {r})", primitive_suffix(&lt)))
            }
        }
    }
}

/// Lowers a string-typed operand of `+`, wrapping a temporary-producing
/// sub-expression in a statement expression that frees it after concat when
/// no arena is in scope (`spec.md` §4.5's temporaries rule). Inside an
/// arena context the temporary is simply arena-owned and never freed
/// manually.
fn lower_string_operand(ctx: &mut Lowering, expr: &Expr, ty: &Type) -> Result<String> {
    if matches!(ty, Type::String { .. }) {
        lower_expr(ctx, expr)
    } else {
        // Non-string operand of a `+` whose other side is a string: route
        // through the to-string conversion for its primitive kind.
        let inner = lower_expr(ctx, expr)?;
        Ok(format!("rt_to_string_{}({}, {inner})", primitive_suffix(ty), ctx.arena_expr()))
    }
}

fn lower_assign(ctx: &mut Lowering, target: &Expr, value: &Expr) -> Result<String> {
    match target {
        Expr::Identifier { name, .. } => {
            let value_ty = infer_type(ctx, value);
            let rendered = lower_expr(ctx, value)?;
            let rhs = match ctx.lookup_type(*name) {
                Some(Type::Any { .. }) if !matches!(value_ty, Type::Any { .. }) => {
                    box_to_any(ctx, &rendered, &value_ty)
                }
                _ => rendered,
            };
            let text = ctx.text(*name).to_string();
            if ctx.as_ref_locals.contains(name) {
                Ok(format!("(*{text} = {rhs})"))
            } else {
                Ok(format!("({text} = {rhs})"))
            }
        }
        Expr::Index { collection, index, span } => {
            let coll = lower_expr(ctx, collection)?;
            let idx = lower_index_expr(ctx, collection, index, *span)?;
            let rhs = lower_expr(ctx, value)?;
            Ok(format!("({coll}[{idx}] = {rhs})"))
        }
        _ => unreachable!("checker rejects non-lvalue assignment targets"),
    }
}

/// Boxes `rendered` (already-lowered, of static type `ty`) into a
/// `RtDynValue` for storage in an `any`-typed destination.
pub(crate) fn box_to_any(ctx: &Lowering, rendered: &str, ty: &Type) -> String {
    let arena = ctx.arena_expr();
    match ty {
        Type::Primitive { kind, .. } => {
            let suffix = primitive_suffix(&Type::Primitive { kind: *kind, span: ty.span() });
            format!("rt_dyn_box_{suffix}({arena}, {rendered})")
        }
        Type::String { .. } => format!("rt_dyn_box_string({rendered})"),
        Type::Array { .. } => format!("rt_dyn_box_array({rendered})"),
        Type::Function { .. } => format!("rt_dyn_box_closure({rendered})"),
        Type::Any { .. } => rendered.to_string(),
        Type::Named { .. } => rendered.to_string(),
    }
}

fn lower_call(ctx: &mut Lowering, callee: &Expr, args: &[Expr], span: Span) -> Result<String> {
    if let Expr::Identifier { name, .. } = callee {
        if let Some(sig) = ctx.signatures.get(name).cloned() {
            let mut rendered_args = Vec::with_capacity(args.len() + 1);
            if sig.effective_modifier == emberc_syntax::ast::decl::FunctionModifier::Shared {
                rendered_args.push(ctx.arena_expr());
            }
            for a in args {
                rendered_args.push(lower_expr(ctx, a)?);
            }
            return Ok(format!("{}({})", ctx.text(*name), rendered_args.join(", ")));
        }
        // Not a named function: a local/param of function type, called
        // through the closure calling convention (`spec.md` §4.4).
        if let Some(ty) = ctx.lookup_type(*name).cloned() {
            let rendered_callee = lower_expr(ctx, callee)?;
            return lower_closure_call(ctx, &ty, &rendered_callee, args, span);
        }
        return Err(CodegenError::MissingSignature {
            name: ctx.text(*name).to_string(),
            span,
        });
    }

    let callee_ty = infer_type(ctx, callee);
    let callee_rendered = lower_expr(ctx, callee)?;
    lower_closure_call(ctx, &callee_ty, &callee_rendered, args, span)
}

fn lower_closure_call(ctx: &mut Lowering, callee_ty: &Type, callee_rendered: &str, args: &[Expr], span: Span) -> Result<String> {
    let Type::Function { params, return_type, .. } = callee_ty else {
        return Err(CodegenError::MissingSignature {
            name: "<closure>".to_string(),
            span,
        });
    };
    let ret_c = c_type_name(return_type);
    let mut param_sig = vec!["void*".to_string()];
    param_sig.extend(params.iter().map(c_type_name));
    let mut call_args = vec![format!("{callee_rendered}->env")];
    for a in args {
        call_args.push(lower_expr(ctx, a)?);
    }
    Ok(format!(
        "(({ret_c} (*)({}))({callee_rendered}->fn))({})",
        param_sig.join(", "),
        call_args.join(", ")
    ))
}

fn lower_method_call(ctx: &mut Lowering, receiver: &Expr, method: emberc_mem::Symbol, args: &[Expr], span: Span) -> Result<String> {
    if let Expr::Identifier { name, .. } = receiver {
        if is_namespace_receiver(ctx, receiver) {
            let ns = ctx.text(*name).to_string();
            return lower_namespace_call(ctx, &ns, method, args, span);
        }
    }

    let recv_ty = infer_type(ctx, receiver);
    let recv = lower_expr(ctx, receiver)?;
    let method_name = ctx.text(method).to_string();

    match &recv_ty {
        Type::Array { element, .. } => lower_array_method(ctx, &recv, element, &method_name, args, span),
        Type::String { .. } => lower_string_method(ctx, &recv, receiver, &method_name, args, span),
        _ => Err(CodegenError::UnknownMethod {
            receiver_type: recv_ty.to_string(),
            method: method_name,
            span,
        }),
    }
}

fn lower_array_method(ctx: &mut Lowering, recv: &str, element: &Type, method: &str, args: &[Expr], span: Span) -> Result<String> {
    let suffix = array_elem_suffix(element);
    let arena = ctx.arena_expr();
    let rendered_args: Vec<String> = args.iter().map(|a| lower_expr(ctx, a)).collect::<Result<_>>()?;

    Ok(match (method, rendered_args.as_slice()) {
        ("push", [elem]) => format!("rt_array_push_{suffix}({arena}, {recv}, {elem})"),
        ("pop", []) => format!("rt_array_pop_{suffix}({recv})"),
        ("clear", []) => format!("rt_array_clear_{suffix}({recv})"),
        ("length", []) | ("size", []) => format!("rt_array_length({recv})"),
        ("reverse", []) => format!("rt_array_reverse_{suffix}({recv})"),
        ("clone", []) => format!("rt_array_clone_{suffix}({arena}, {recv})"),
        ("concat", [other]) => format!("rt_array_concat_{suffix}({arena}, {recv}, {other})"),
        ("indexOf", [needle]) => format!("rt_array_index_of_{suffix}({recv}, {needle})"),
        ("contains", [needle]) => format!("rt_array_contains_{suffix}({recv}, {needle})"),
        ("equals", [other]) => format!("rt_array_equals_{suffix}({recv}, {other})"),
        ("join", [sep]) => format!("rt_array_join_{suffix}({arena}, {recv}, {sep})"),
        ("slice", [start, end, step]) => {
            format!("rt_array_slice_{suffix}({arena}, {recv}, {start}, {end}, {step})")
        }
        ("slice", [start, end]) => {
            format!("rt_array_slice_{suffix}({arena}, {recv}, {start}, {end}, 1L)")
        }
        _ => {
            return Err(CodegenError::UnknownMethod {
                receiver_type: format!("{element}[]"),
                method: method.to_string(),
                span,
            })
        }
    })
}

fn lower_string_method(
    ctx: &mut Lowering,
    recv: &str,
    recv_expr: &Expr,
    method: &str,
    args: &[Expr],
    span: Span,
) -> Result<String> {
    let arena = ctx.arena_expr();
    let rendered_args: Vec<String> = args.iter().map(|a| lower_expr(ctx, a)).collect::<Result<_>>()?;

    Ok(match (method, rendered_args.as_slice()) {
        ("append", [other]) => {
            // A string bound outside the current loop must grow in the
            // function arena, not the per-iteration loop arena — otherwise
            // the grown buffer is freed at the end of the iteration it grew
            // in (`spec.md` §4.3's string-longevity rule).
            let grow_arena = match strip_paren(recv_expr) {
                Expr::Identifier { name, .. } if ctx.declared_outside_current_loop(*name) => {
                    ctx.function_arena_expr()
                }
                _ => arena.clone(),
            };
            format!("rt_string_append(rt_string_ensure_mutable({grow_arena}, {recv}), {other})")
        }
        ("length", []) | ("size", []) => format!("rt_string_length({recv})"),
        ("concat", [other]) => format!("rt_str_concat({arena}, {recv}, {other})"),
        ("equals", [other]) => format!("rt_str_equals({recv}, {other})"),
        ("charAt", [idx]) => format!("rt_string_char_at({recv}, {idx})"),
        ("substring", [start, end]) => format!("rt_string_substring({arena}, {recv}, {start}, {end})"),
        ("toUpperCase", []) => format!("rt_string_to_upper({arena}, {recv})"),
        ("toLowerCase", []) => format!("rt_string_to_lower({arena}, {recv})"),
        ("trim", []) => format!("rt_string_trim({arena}, {recv})"),
        ("split", [sep]) => format!("rt_string_split({arena}, {recv}, {sep})"),
        ("contains", [other]) => format!("rt_string_contains({recv}, {other})"),
        ("indexOf", [other]) => format!("rt_string_index_of({recv}, {other})"),
        _ => {
            return Err(CodegenError::UnknownMethod {
                receiver_type: "string".to_string(),
                method: method.to_string(),
                span,
            })
        }
    })
}

fn strip_paren(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren { expr, .. } => strip_paren(expr),
        other => other,
    }
}

fn lower_namespace_call(ctx: &mut Lowering, ns: &str, method: emberc_mem::Symbol, args: &[Expr], span: Span) -> Result<String> {
    let fname = ctx.text(method).to_string();
    let arena = ctx.arena_expr();
    let rendered_args: Vec<String> = args.iter().map(|a| lower_expr(ctx, a)).collect::<Result<_>>()?;
    let joined = rendered_args.join(", ");

    let call = match (ns, fname.as_str()) {
        ("Time", "now") => "rt_time_now()".to_string(),
        ("Time", "sleep") => format!("rt_time_sleep({joined})"),
        ("Random", "intRange") => format!("rt_random_int_range({joined})"),
        ("Random", "doubleValue") => "rt_random_double()".to_string(),
        ("Uuid", "v4") => format!("rt_uuid_v4({arena})"),
        ("Environment", "get") => format!("rt_env_get({arena}, {joined})"),
        ("Environment", "getInt") => format!("rt_env_get_int({joined})"),
        ("Environment", "getLong") => format!("rt_env_get_long({joined})"),
        ("Environment", "getDouble") => format!("rt_env_get_double({joined})"),
        ("Environment", "getBool") => format!("rt_env_get_bool({joined})"),
        ("Environment", "has") => format!("rt_env_has({joined})"),
        ("Environment", "set") => format!("rt_env_set({joined})"),
        ("Environment", "remove") => format!("rt_env_remove({joined})"),
        ("TextFile", "open") => format!("rt_text_file_open({arena}, {joined})"),
        ("BinaryFile", "open") => format!("rt_binary_file_open({arena}, {joined})"),
        ("Tcp", "connect") => format!("rt_tcp_connect({arena}, {joined})"),
        ("Udp", "bind") => format!("rt_udp_bind({arena}, {joined})"),
        _ => {
            return Err(CodegenError::UnknownNamespaceCall {
                namespace: ns.to_string(),
                function: fname,
                span,
            })
        }
    };
    Ok(call)
}

fn lower_array_literal(ctx: &mut Lowering, elements: &[Expr], ty: &Type) -> Result<String> {
    let Type::Array { element, .. } = ty else {
        unreachable!("array literal always infers to Type::Array")
    };
    let suffix = array_elem_suffix(element);
    let arena = ctx.arena_expr();
    let rendered: Vec<String> = elements.iter().map(|e| lower_expr(ctx, e)).collect::<Result<_>>()?;
    let c_elem = c_type_name(element);
    Ok(format!(
        "rt_array_create_{suffix}({arena}, ({c_elem}[]){{{}}}, {})",
        rendered.join(", "),
        elements.len()
    ))
}

fn lower_index(ctx: &mut Lowering, collection: &Expr, index: &Expr, span: Span) -> Result<String> {
    let coll = lower_expr(ctx, collection)?;
    let idx = lower_index_expr(ctx, collection, index, span)?;
    Ok(format!("{coll}[{idx}]"))
}

/// Lowers an index sub-expression applying the bounds-elision rule:
/// provably non-negative indices emit directly, negative literals fold to
/// `len + i`, and everything else gets a runtime-normalizing ternary.
fn lower_index_expr(ctx: &mut Lowering, collection: &Expr, index: &Expr, _span: Span) -> Result<String> {
    if let Expr::IntegerLiteral { value, .. } = strip_paren(index) {
        if *value >= 0 {
            return Ok(value.to_string());
        }
        let coll = lower_expr(ctx, collection)?;
        return Ok(format!("(rt_array_length({coll}) + ({value}))"));
    }
    if is_provably_non_negative(ctx, index) {
        return lower_expr(ctx, index);
    }
    let coll = lower_expr(ctx, collection)?;
    let idx = lower_expr(ctx, index)?;
    Ok(format!("(({idx}) < 0 ? rt_array_length({coll}) + ({idx}) : ({idx}))"))
}
