//! Parse failure taxonomy.
//!
//! The first failure halts parsing; the interpreter never sees a partially
//! parsed tree. Positions are byte offsets into the input line.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The lexer rejected the input (unclosed quote, malformed variable,
    /// redirect without a preceding space, …).
    #[error("{message}")]
    Lex { message: String, pos: usize },

    #[error("expected {expected}, got {found} at byte {pos}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        pos: usize,
    },

    #[error("expected a command name, got {found} at byte {pos}")]
    CommandNameExpected { found: String, pos: usize },

    #[error("empty variable expression at byte {pos}")]
    EmptyVariable { pos: usize },

    #[error("expected space before redirect at byte {pos}")]
    ExpectedSpaceBeforeRedirect { pos: usize },

    #[error("expected filename after redirect, got {found} at byte {pos}")]
    ExpectedFilenameAfterRedirect { found: String, pos: usize },

    #[error("cannot redirect stdin for commands that are part of a pipeline (at byte {pos})")]
    PipelineStdinRedirect { pos: usize },

    #[error("unexpected content after '&' at byte {pos}")]
    TrailingAfterBackground { pos: usize },
}
