//! Command-line language: lexer, parser, and AST.
//!
//! A raw input line becomes a token stream (state-function lexer), then an
//! AST of statements, pipelines, commands, and redirect targets (recursive
//! descent with one-token lookahead). Evaluation lives elsewhere; nothing in
//! this crate touches the environment or filesystem.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Command, Expr, Pipeline, RedirectMode, Redirects, Root, Source, Stmt, Target};
pub use error::ParseError;
pub use lexer::Lexer;
pub use parser::parse;
pub use token::{Token, TokenKind};
