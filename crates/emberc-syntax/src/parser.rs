//! Recursive-descent parser for Ember.
//!
//! Converts a [`Token`] stream into a `Vec<Decl>` (one entry per top-level
//! function). Expressions use precedence climbing keyed off
//! [`TokenKind::precedence`]; `if`/`while`/`for` and blocks are parsed as
//! expressions (Ember is expression-oriented), matching the grammar in
//! `SPEC_FULL.md` §4.9: function declarations with optional `shared`/
//! `private` modifiers, `var` declarations, assignment, control flow,
//! binary/unary expressions, calls, method calls, array literals and
//! indexing, and lambda literals. There are no statement-terminating
//! semicolons: a block's last bare expression is its tail value, and every
//! earlier one is an expression statement.

use crate::ast::decl::{Decl, FunctionModifier, Param};
use crate::ast::expr::{BinaryOp, BlockModifier, Expr, LambdaParam, UnaryOp};
use crate::ast::stmt::Stmt;
use crate::ast::ty::{Primitive, Type};
use crate::error::{ParserError, ParserResult};
use crate::lexer::Lexer;
use crate::span::{Span, Spanned};
use crate::token::{Token, TokenKind};
use emberc_mem::{StringInterner, Symbol};

/// Lexes and parses `src` in one step, returning the program and the
/// interner used to intern its identifiers (callers typically hand the
/// interner on to the checker for resolving names in diagnostics).
pub fn parse_source(src: &str) -> Result<(Vec<Decl>, StringInterner), ParserError> {
    let mut lexer = Lexer::new(src);
    let tokens = lexer.lex().map_err(|e| ParserError::UnexpectedToken {
        expected: vec!["valid token".to_string()],
        found: e.to_string(),
        span: Span::point(0, 1, 1),
    })?;
    let interner = lexer.into_interner();
    let mut parser = Parser::new(tokens, interner);
    let decls = parser.parse_program()?;
    Ok((decls, parser.into_interner()))
}

/// The parser's cursor over a fully-lexed token stream.
///
/// Holds the same [`StringInterner`] the lexer used, so type-position
/// identifiers can be resolved back to text (`"int"`, `"string"`, ...) to
/// tell primitive/built-in type names apart from user-facing `Named` types.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    interner: StringInterner,
}

impl Parser {
    /// Creates a parser over an already-lexed token stream.
    #[must_use]
    pub fn new(tokens: Vec<Token>, interner: StringInterner) -> Self {
        Self {
            tokens,
            pos: 0,
            interner,
        }
    }

    /// Hands back the interner, e.g. to share it with the checker.
    #[must_use]
    pub fn into_interner(self) -> StringInterner {
        self.interner
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn match_tok(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> ParserResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParserError::UnexpectedToken {
                expected: vec![kind.to_string()],
                found: self.peek_kind().to_string(),
                span: self.peek().span,
            })
        }
    }

    fn expect_ident(&mut self) -> ParserResult<(Symbol, Span)> {
        match self.peek_kind().clone() {
            TokenKind::Ident(sym) => {
                let span = self.peek().span;
                self.advance();
                Ok((sym, span))
            }
            _ => Err(ParserError::ExpectedIdentifier {
                span: self.peek().span,
            }),
        }
    }

    /// Parses every top-level declaration until end of file.
    pub fn parse_program(&mut self) -> ParserResult<Vec<Decl>> {
        let mut decls = Vec::new();
        while !self.check(&TokenKind::EOF) {
            decls.push(self.parse_decl()?);
        }
        Ok(decls)
    }

    fn parse_decl(&mut self) -> ParserResult<Decl> {
        let start_span = self.peek().span;
        let modifier = if self.match_tok(&TokenKind::Shared) {
            FunctionModifier::Shared
        } else if self.match_tok(&TokenKind::Private) {
            FunctionModifier::Private
        } else {
            FunctionModifier::Default
        };

        self.expect(&TokenKind::Fn)?;
        let (name, _) = self.expect_ident()?;

        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let (pname, pspan) = self.expect_ident()?;
                self.expect(&TokenKind::Colon)?;
                let ty = self.parse_type()?;
                params.push(Param {
                    name: pname,
                    type_annotation: ty,
                    span: pspan,
                });
                if !self.match_tok(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;

        let return_type = if self.match_tok(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_block_expr(BlockModifier::Plain)?;
        let span = Span::merge(start_span, body.span());

        Ok(Decl::Fn {
            modifier,
            name,
            params,
            return_type,
            body,
            span,
        })
    }

    fn parse_type(&mut self) -> ParserResult<Type> {
        let (name, span) = self.expect_ident()?;
        let mut ty = self.resolve_type_name(name, span);

        while self.check(&TokenKind::LBracket) {
            let lb = self.peek().span;
            self.advance();
            let rb = self.expect(&TokenKind::RBracket)?.span;
            ty = Type::Array {
                element: Box::new(ty),
                span: Span::merge(lb, rb),
            };
        }
        Ok(ty)
    }

    fn resolve_type_name(&self, name: Symbol, span: Span) -> Type {
        let text = self.interner.resolve(name).unwrap_or("");
        if text == "string" {
            return Type::String { span };
        }
        if text == "any" {
            return Type::Any { span };
        }
        if let Some(p) = Primitive::from_name(text) {
            return Type::Primitive { kind: p, span };
        }
        Type::Named { name, span }
    }

    fn parse_block_expr(&mut self, modifier: BlockModifier) -> ParserResult<Expr> {
        let open = self.expect(&TokenKind::LBrace)?.span;
        let mut stmts = Vec::new();
        let mut tail = None;

        while !self.check(&TokenKind::RBrace) {
            if self.is_stmt_leader() {
                stmts.push(self.parse_stmt()?);
                continue;
            }

            let expr = self.parse_expr()?;
            if self.check(&TokenKind::RBrace) {
                tail = Some(Box::new(expr));
                break;
            }
            let span = expr.span();
            stmts.push(Stmt::Expr { expr, span });
        }

        let close = self.expect(&TokenKind::RBrace)?.span;
        Ok(Expr::Block {
            stmts,
            tail,
            modifier,
            span: Span::merge(open, close),
        })
    }

    fn is_stmt_leader(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Var | TokenKind::Return | TokenKind::Break | TokenKind::Continue
        )
    }

    fn parse_stmt(&mut self) -> ParserResult<Stmt> {
        match self.peek_kind().clone() {
            TokenKind::Var => {
                let start = self.advance().span;
                let (name, _) = self.expect_ident()?;
                let type_annotation = if self.match_tok(&TokenKind::Colon) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                self.expect(&TokenKind::Eq)?;
                let init = self.parse_expr()?;
                let span = Span::merge(start, init.span());
                Ok(Stmt::VarDecl {
                    name,
                    type_annotation,
                    init,
                    span,
                })
            }
            TokenKind::Return => {
                let start = self.advance().span;
                let value = if self.can_start_expr() {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                let span = value
                    .as_ref()
                    .map_or(start, |v| Span::merge(start, v.span()));
                Ok(Stmt::Return { value, span })
            }
            TokenKind::Break => {
                let span = self.advance().span;
                Ok(Stmt::Break { span })
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                Ok(Stmt::Continue { span })
            }
            _ => {
                let expr = self.parse_expr()?;
                let span = expr.span();
                Ok(Stmt::Expr { expr, span })
            }
        }
    }

    fn can_start_expr(&self) -> bool {
        !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::EOF)
    }

    // ---- expressions (precedence climbing) ----

    fn parse_expr(&mut self) -> ParserResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ParserResult<Expr> {
        let target = self.parse_or()?;
        if self.match_tok(&TokenKind::Eq) {
            let value = self.parse_assignment()?;
            let span = Span::merge(target.span(), value.span());
            return Ok(Expr::Assign {
                target: Box::new(target),
                value: Box::new(value),
                span,
            });
        }
        Ok(target)
    }

    fn parse_or(&mut self) -> ParserResult<Expr> {
        let mut left = self.parse_and()?;
        while self.match_tok(&TokenKind::PipePipe) {
            let right = self.parse_and()?;
            let span = Span::merge(left.span(), right.span());
            left = Expr::Binary {
                left: Box::new(left),
                op: BinaryOp::Or,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParserResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.match_tok(&TokenKind::AmpAmp) {
            let right = self.parse_equality()?;
            let span = Span::merge(left.span(), right.span());
            left = Expr::Binary {
                left: Box::new(left),
                op: BinaryOp::And,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParserResult<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Neq,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            let span = Span::merge(left.span(), right.span());
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> ParserResult<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::LtEq => BinaryOp::Lte,
                TokenKind::GtEq => BinaryOp::Gte,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            let span = Span::merge(left.span(), right.span());
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> ParserResult<Expr> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            let span = Span::merge(left.span(), right.span());
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> ParserResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            let span = Span::merge(left.span(), right.span());
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParserResult<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Bang => Some(UnaryOp::Negate),
            TokenKind::Minus => Some(UnaryOp::Minus),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span;
            let operand = self.parse_unary()?;
            let span = Span::merge(start, operand.span());
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParserResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_args()?;
                    let close = self.expect(&TokenKind::RParen)?.span;
                    let span = Span::merge(expr.span(), close);
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    let close = self.expect(&TokenKind::RBracket)?.span;
                    let span = Span::merge(expr.span(), close);
                    expr = Expr::Index {
                        collection: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let (name, name_span) = self.expect_ident()?;
                    if self.check(&TokenKind::LParen) {
                        self.advance();
                        let args = self.parse_args()?;
                        let close = self.expect(&TokenKind::RParen)?.span;
                        let span = Span::merge(expr.span(), close);
                        expr = Expr::MethodCall {
                            receiver: Box::new(expr),
                            method: name,
                            args,
                            span,
                        };
                    } else {
                        let span = Span::merge(expr.span(), name_span);
                        expr = Expr::Field {
                            object: Box::new(expr),
                            field: name,
                            span,
                        };
                    }
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> ParserResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.match_tok(&TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(args)
    }

    /// Parses an iterable used after `for x in ...`: either a range
    /// (`0..10`) or an arbitrary array-valued expression.
    fn parse_iterable(&mut self) -> ParserResult<Expr> {
        let start = self.parse_expr()?;
        if self.match_tok(&TokenKind::DotDot) {
            let end = self.parse_expr()?;
            let span = Span::merge(start.span(), end.span());
            return Ok(Expr::Range {
                start: Box::new(start),
                end: Box::new(end),
                span,
            });
        }
        Ok(start)
    }

    fn parse_primary(&mut self) -> ParserResult<Expr> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::IntegerLiteral(sym) => {
                self.advance();
                let text = self.interner.resolve(sym).unwrap_or("0");
                let value = text.parse().map_err(|_| ParserError::InvalidTypeAnnotation {
                    message: format!("invalid integer literal '{text}'"),
                    span: tok.span,
                })?;
                Ok(Expr::IntegerLiteral { value, span: tok.span })
            }
            TokenKind::FloatLiteral(sym) => {
                self.advance();
                let text = self.interner.resolve(sym).unwrap_or("0");
                let value = text.parse().map_err(|_| ParserError::InvalidTypeAnnotation {
                    message: format!("invalid float literal '{text}'"),
                    span: tok.span,
                })?;
                Ok(Expr::FloatLiteral { value, span: tok.span })
            }
            TokenKind::StringLiteral(sym) => {
                self.advance();
                Ok(Expr::StringLiteral {
                    value: sym,
                    span: tok.span,
                })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::BoolLiteral {
                    value: true,
                    span: tok.span,
                })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::BoolLiteral {
                    value: false,
                    span: tok.span,
                })
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Nil { span: tok.span })
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Identifier {
                    name,
                    span: tok.span,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                let close = self.expect(&TokenKind::RParen)?.span;
                Ok(Expr::Paren {
                    expr: Box::new(inner),
                    span: Span::merge(tok.span, close),
                })
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expr()?);
                        if !self.match_tok(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let close = self.expect(&TokenKind::RBracket)?.span;
                Ok(Expr::Array {
                    elements,
                    span: Span::merge(tok.span, close),
                })
            }
            TokenKind::Pipe => {
                self.advance();
                let mut params = Vec::new();
                if !self.check(&TokenKind::Pipe) {
                    loop {
                        let (pname, pspan) = self.expect_ident()?;
                        self.expect(&TokenKind::Colon)?;
                        let ty = self.parse_type()?;
                        params.push(LambdaParam {
                            name: pname,
                            type_annotation: ty,
                            span: pspan,
                        });
                        if !self.match_tok(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&TokenKind::Pipe)?;
                let body = self.parse_block_expr(BlockModifier::Plain)?;
                Ok(Expr::Lambda {
                    span: Span::merge(tok.span, body.span()),
                    params,
                    body: Box::new(body),
                })
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::LBrace => self.parse_block_expr(BlockModifier::Plain),
            TokenKind::Private => {
                self.advance();
                self.parse_block_expr(BlockModifier::Private)
            }
            TokenKind::Shared => {
                self.advance();
                self.parse_block_expr(BlockModifier::Shared)
            }
            _ => Err(ParserError::ExpectedExpression { span: tok.span }),
        }
    }

    fn parse_if(&mut self) -> ParserResult<Expr> {
        let start = self.expect(&TokenKind::If)?.span;
        let condition = self.parse_expr()?;
        let then_branch = self.parse_block_expr(BlockModifier::Plain)?;
        let else_branch = if self.match_tok(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(Box::new(self.parse_if()?))
            } else {
                Some(Box::new(self.parse_block_expr(BlockModifier::Plain)?))
            }
        } else {
            None
        };
        let end = else_branch
            .as_ref()
            .map_or(then_branch.span(), |e| e.span());
        Ok(Expr::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch,
            span: Span::merge(start, end),
        })
    }

    fn parse_while(&mut self) -> ParserResult<Expr> {
        let start = self.expect(&TokenKind::While)?.span;
        let condition = self.parse_expr()?;
        let body = self.parse_block_expr(BlockModifier::Plain)?;
        let span = Span::merge(start, body.span());
        Ok(Expr::WhileLoop {
            condition: Box::new(condition),
            body: Box::new(body),
            span,
        })
    }

    fn parse_for(&mut self) -> ParserResult<Expr> {
        let start = self.expect(&TokenKind::For)?.span;
        let (binder, _) = self.expect_ident()?;
        self.expect(&TokenKind::In)?;
        let iter = self.parse_iterable()?;
        let body = self.parse_block_expr(BlockModifier::Plain)?;
        let span = Span::merge(start, body.span());
        Ok(Expr::ForLoop {
            binder,
            iter: Box::new(iter),
            body: Box::new(body),
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Vec<Decl> {
        parse_source(src).unwrap().0
    }

    #[test]
    fn parses_empty_function() {
        let decls = parse("fn main() { }");
        assert_eq!(decls.len(), 1);
        let Decl::Fn {
            modifier,
            params,
            return_type,
            ..
        } = &decls[0];
        assert_eq!(*modifier, FunctionModifier::Default);
        assert!(params.is_empty());
        assert!(return_type.is_none());
    }

    #[test]
    fn parses_shared_function_with_params_and_return_type() {
        let decls = parse("shared fn add(a: int, b: int): int { return a + b }");
        let Decl::Fn {
            modifier,
            params,
            return_type,
            ..
        } = &decls[0];
        assert_eq!(*modifier, FunctionModifier::Shared);
        assert_eq!(params.len(), 2);
        assert!(matches!(
            return_type,
            Some(Type::Primitive {
                kind: Primitive::Int,
                ..
            })
        ));
    }

    #[test]
    fn parses_var_decl_with_inferred_type() {
        let decls = parse("fn f() { var x = 1 }");
        let Decl::Fn { body, .. } = &decls[0];
        let Expr::Block { stmts, .. } = body else {
            panic!("expected block body");
        };
        assert!(matches!(
            stmts[0],
            Stmt::VarDecl {
                type_annotation: None,
                ..
            }
        ));
    }

    #[test]
    fn parses_array_type_annotation() {
        let decls = parse("fn f(xs: int[]) { }");
        let Decl::Fn { params, .. } = &decls[0];
        assert!(matches!(params[0].type_annotation, Type::Array { .. }));
    }

    #[test]
    fn respects_arithmetic_precedence() {
        let decls = parse("fn f() { var x = 1 + 2 * 3 }");
        let Decl::Fn { body, .. } = &decls[0];
        let Expr::Block { stmts, .. } = body else {
            panic!("expected block");
        };
        let Stmt::VarDecl { init, .. } = &stmts[0] else {
            panic!("expected var decl");
        };
        let Expr::Binary { op, right, .. } = init else {
            panic!("expected binary expr");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(**right, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn parses_private_and_shared_blocks() {
        let decls = parse("fn f() { private { var x = 1 } shared { var y = 2 } }");
        let Decl::Fn { body, .. } = &decls[0];
        let Expr::Block { stmts, .. } = body else {
            panic!("expected block");
        };
        let Stmt::Expr { expr, .. } = &stmts[0] else {
            panic!("expected expr stmt");
        };
        assert!(matches!(
            expr,
            Expr::Block {
                modifier: BlockModifier::Private,
                ..
            }
        ));
        let Stmt::Expr { expr, .. } = &stmts[1] else {
            panic!("expected expr stmt");
        };
        assert!(matches!(
            expr,
            Expr::Block {
                modifier: BlockModifier::Shared,
                ..
            }
        ));
    }

    #[test]
    fn parses_for_loop_over_range() {
        let decls = parse("fn f() { for i in 0..10 { } }");
        let Decl::Fn { body, .. } = &decls[0];
        let Expr::Block { stmts, .. } = body else {
            panic!("expected block");
        };
        let Stmt::Expr { expr, .. } = &stmts[0] else {
            panic!("expected expr stmt");
        };
        let Expr::ForLoop { iter, .. } = expr else {
            panic!("expected for loop");
        };
        assert!(matches!(**iter, Expr::Range { .. }));
    }

    #[test]
    fn parses_method_call_and_index() {
        let decls = parse("fn f(xs: int[]) { var y = xs.push(1)[0] }");
        let Decl::Fn { body, .. } = &decls[0];
        let Expr::Block { stmts, .. } = body else {
            panic!("expected block");
        };
        let Stmt::VarDecl { init, .. } = &stmts[0] else {
            panic!("expected var decl");
        };
        assert!(matches!(init, Expr::Index { .. }));
    }

    #[test]
    fn parses_lambda_literal() {
        let decls = parse("fn f() { var g = |x: int| { x } }");
        let Decl::Fn { body, .. } = &decls[0];
        let Expr::Block { stmts, .. } = body else {
            panic!("expected block");
        };
        let Stmt::VarDecl { init, .. } = &stmts[0] else {
            panic!("expected var decl");
        };
        assert!(matches!(init, Expr::Lambda { .. }));
    }

    #[test]
    fn assignment_is_right_associative_and_lowest_precedence() {
        let decls = parse("fn f() { var x = 1 x = 2 + 3 }");
        let Decl::Fn { body, .. } = &decls[0];
        let Expr::Block { stmts, .. } = body else {
            panic!("expected block");
        };
        let Stmt::Expr { expr, .. } = &stmts[1] else {
            panic!("expected expr stmt");
        };
        let Expr::Assign { value, .. } = expr else {
            panic!("expected assignment");
        };
        assert!(matches!(**value, Expr::Binary { op: BinaryOp::Add, .. }));
    }
}
