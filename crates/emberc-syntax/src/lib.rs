//! Ember language frontend: lexer, parser, AST, and diagnostics.
//!
//! This crate turns Ember source text into a checked-ready AST. It does not
//! itself check types (see `emberc-typecheck`) or emit C (see
//! `emberc-codegen`) — its job ends at a `Vec<Decl>` plus the
//! [`StringInterner`](emberc_mem::StringInterner) used to build it.
//!
//! # Modules
//!
//! - [`span`] - Source location tracking
//! - [`token`] - Token types and definitions
//! - [`error`] - Lexer and parser error types
//! - [`diagnostic`] - Rendering errors against source text
//! - [`keywords`] - The reserved-word table
//! - [`lexer`] - Tokenization
//! - [`ast`] - Expression, statement, declaration, and type nodes
//! - [`parser`] - Recursive-descent parsing into [`ast::Decl`]
//! - [`pretty`] - AST pretty-printing, used by the `--debug` CLI flag
//!
//! # Examples
//!
//! ```
//! use emberc_syntax::parser::parse_source;
//!
//! let (decls, _interner) = parse_source("fn main() { }").unwrap();
//! assert_eq!(decls.len(), 1);
//! ```

#![warn(missing_docs)]

pub mod ast;
pub mod diagnostic;
pub mod error;
pub mod keywords;
pub mod lexer;
pub mod parser;
pub mod pretty;
pub mod span;
pub mod token;

pub use ast::{Decl, Expr, Stmt, Type};
pub use error::{LexerError, LexerResult, ParserError, ParserResult, SyntaxError, SyntaxResult};
pub use lexer::Lexer;
pub use parser::{parse_source, Parser};
pub use span::{LineCol, Span, Spanned};
pub use token::{Token, TokenKind};
