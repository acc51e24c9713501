//! AST pretty-printer for the Ember language.
//!
//! Renders a `Vec<Decl>` back to readable source text. Used by the CLI's
//! `--debug` flag to dump the parsed AST before type checking, and by the
//! `-v`/`--emit-c` combination to show what was compiled when codegen fails.
//! Not intended to round-trip byte-for-byte with the original source (it
//! re-indents and normalizes spacing), only to produce something a reader
//! can check against the input.

use crate::ast::decl::FunctionModifier;
use crate::ast::expr::BlockModifier;
use crate::ast::{Decl, Expr, Stmt, Type};
use emberc_mem::StringInterner;
use std::fmt::Write as _;

/// Pretty-prints every declaration in `decls`, resolving identifiers
/// through `interner`.
#[must_use]
pub fn print_program(decls: &[Decl], interner: &StringInterner) -> String {
    let mut out = String::new();
    for decl in decls {
        print_decl(&mut out, decl, interner, 0);
        out.push('\n');
    }
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn name(interner: &StringInterner, sym: emberc_mem::Symbol) -> String {
    interner.resolve(sym).unwrap_or("<?>").to_string()
}

fn print_decl(out: &mut String, decl: &Decl, interner: &StringInterner, level: usize) {
    let Decl::Fn {
        modifier,
        name: fn_name,
        params,
        return_type,
        body,
        ..
    } = decl;

    indent(out, level);
    match modifier {
        FunctionModifier::Shared => out.push_str("shared "),
        FunctionModifier::Private => out.push_str("private "),
        FunctionModifier::Default => {}
    }
    let _ = write!(out, "fn {}(", name(interner, *fn_name));
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}: {}", name(interner, p.name), print_type(&p.type_annotation, interner));
    }
    out.push(')');
    if let Some(rt) = return_type {
        let _ = write!(out, ": {}", print_type(rt, interner));
    }
    out.push(' ');
    print_expr(out, body, interner, level);
}

fn print_type(ty: &Type, interner: &StringInterner) -> String {
    match ty {
        Type::Named { name: n, .. } => name(interner, *n),
        other => other.to_string(),
    }
}

fn print_block(out: &mut String, stmts: &[Stmt], tail: &Option<Box<Expr>>, interner: &StringInterner, level: usize) {
    out.push_str("{\n");
    for stmt in stmts {
        print_stmt(out, stmt, interner, level + 1);
        out.push('\n');
    }
    if let Some(t) = tail {
        indent(out, level + 1);
        print_expr(out, t, interner, level + 1);
        out.push('\n');
    }
    indent(out, level);
    out.push('}');
}

fn print_stmt(out: &mut String, stmt: &Stmt, interner: &StringInterner, level: usize) {
    indent(out, level);
    match stmt {
        Stmt::VarDecl {
            name: n,
            type_annotation,
            init,
            ..
        } => {
            let _ = write!(out, "var {}", name(interner, *n));
            if let Some(ty) = type_annotation {
                let _ = write!(out, ": {}", print_type(ty, interner));
            }
            out.push_str(" = ");
            print_expr(out, init, interner, level);
        }
        Stmt::Return { value, .. } => {
            out.push_str("return");
            if let Some(v) = value {
                out.push(' ');
                print_expr(out, v, interner, level);
            }
        }
        Stmt::Break { .. } => out.push_str("break"),
        Stmt::Continue { .. } => out.push_str("continue"),
        Stmt::Expr { expr, .. } => print_expr(out, expr, interner, level),
    }
}

fn print_expr(out: &mut String, expr: &Expr, interner: &StringInterner, level: usize) {
    match expr {
        Expr::IntegerLiteral { value, .. } => {
            let _ = write!(out, "{value}");
        }
        Expr::FloatLiteral { value, .. } => {
            let _ = write!(out, "{value}");
        }
        Expr::StringLiteral { value, .. } => {
            let _ = write!(out, "{:?}", name(interner, *value));
        }
        Expr::BoolLiteral { value, .. } => {
            let _ = write!(out, "{value}");
        }
        Expr::Nil { .. } => out.push_str("nil"),
        Expr::Identifier { name: n, .. } => out.push_str(&name(interner, *n)),
        Expr::Unary { op, operand, .. } => {
            let _ = write!(out, "{op}");
            print_expr(out, operand, interner, level);
        }
        Expr::Binary { left, op, right, .. } => {
            print_expr(out, left, interner, level);
            let _ = write!(out, " {op} ");
            print_expr(out, right, interner, level);
        }
        Expr::Assign { target, value, .. } => {
            print_expr(out, target, interner, level);
            out.push_str(" = ");
            print_expr(out, value, interner, level);
        }
        Expr::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            out.push_str("if ");
            print_expr(out, condition, interner, level);
            out.push(' ');
            print_expr(out, then_branch, interner, level);
            if let Some(e) = else_branch {
                out.push_str(" else ");
                print_expr(out, e, interner, level);
            }
        }
        Expr::Block {
            stmts,
            tail,
            modifier,
            ..
        } => {
            match modifier {
                BlockModifier::Private => out.push_str("private "),
                BlockModifier::Shared => out.push_str("shared "),
                BlockModifier::Plain => {}
            }
            print_block(out, stmts, tail, interner, level);
        }
        Expr::ForLoop {
            binder, iter, body, ..
        } => {
            let _ = write!(out, "for {} in ", name(interner, *binder));
            print_expr(out, iter, interner, level);
            out.push(' ');
            print_expr(out, body, interner, level);
        }
        Expr::WhileLoop { condition, body, .. } => {
            out.push_str("while ");
            print_expr(out, condition, interner, level);
            out.push(' ');
            print_expr(out, body, interner, level);
        }
        Expr::Range { start, end, .. } => {
            print_expr(out, start, interner, level);
            out.push_str("..");
            print_expr(out, end, interner, level);
        }
        Expr::Call { callee, args, .. } => {
            print_expr(out, callee, interner, level);
            print_args(out, args, interner, level);
        }
        Expr::MethodCall {
            receiver,
            method,
            args,
            ..
        } => {
            print_expr(out, receiver, interner, level);
            let _ = write!(out, ".{}", name(interner, *method));
            print_args(out, args, interner, level);
        }
        Expr::Array { elements, .. } => {
            out.push('[');
            for (i, e) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                print_expr(out, e, interner, level);
            }
            out.push(']');
        }
        Expr::Field { object, field, .. } => {
            print_expr(out, object, interner, level);
            let _ = write!(out, ".{}", name(interner, *field));
        }
        Expr::Index { collection, index, .. } => {
            print_expr(out, collection, interner, level);
            out.push('[');
            print_expr(out, index, interner, level);
            out.push(']');
        }
        Expr::Paren { expr: inner, .. } => {
            out.push('(');
            print_expr(out, inner, interner, level);
            out.push(')');
        }
        Expr::Lambda { params, body, .. } => {
            out.push('|');
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}: {}", name(interner, p.name), print_type(&p.type_annotation, interner));
            }
            out.push_str("| ");
            print_expr(out, body, interner, level);
        }
    }
}

fn print_args(out: &mut String, args: &[Expr], interner: &StringInterner, level: usize) {
    out.push('(');
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        print_expr(out, a, interner, level);
    }
    out.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    #[test]
    fn prints_simple_function() {
        let (decls, interner) = parse_source("fn add(a: int, b: int): int { return a + b }").unwrap();
        let out = print_program(&decls, &interner);
        assert!(out.contains("fn add(a: int, b: int): int"));
        assert!(out.contains("return a + b"));
    }

    #[test]
    fn prints_block_modifiers() {
        let (decls, interner) = parse_source("fn f() { private { var x = 1 } }").unwrap();
        let out = print_program(&decls, &interner);
        assert!(out.contains("private {"));
    }
}
