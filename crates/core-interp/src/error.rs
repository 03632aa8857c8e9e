//! Evaluation failure taxonomy.
//!
//! `Exit` is the only error that leaves the REPL; everything else prints and
//! the loop continues. Pipeline failures are collected into `Joined` so one
//! command's error never masks another's.

use std::io;

use thiserror::Error;

use core_lang::ParseError;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("{name}: command not found")]
    CommandNotFound { name: String },

    #[error("{name}: cannot open {filename}: {source}")]
    RedirectOpenFailed {
        name: String,
        filename: String,
        source: io::Error,
    },

    #[error("{name}: {source}")]
    SpawnFailed { name: String, source: io::Error },

    #[error("{name}: {source}")]
    CommandRunFailed {
        name: String,
        source: anyhow::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("history: {0}")]
    HistoryIo(io::Error),

    /// Sentinel from the `exit` builtin; terminates the shell cleanly.
    #[error("exit")]
    Exit,

    /// All failures of one pipeline, in command order.
    #[error("{}", join_messages(.0))]
    Joined(Vec<ShellError>),
}

impl ShellError {
    /// Whether this error (or any joined member) carries the exit sentinel.
    pub fn is_exit(&self) -> bool {
        match self {
            ShellError::Exit => true,
            ShellError::Joined(errors) => errors.iter().any(ShellError::is_exit),
            _ => false,
        }
    }
}

fn join_messages(errors: &[ShellError]) -> String {
    let mut out = String::new();
    for (i, err) in errors.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        out.push_str(&err.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_errors_all_appear_in_message() {
        let joined = ShellError::Joined(vec![
            ShellError::CommandNotFound {
                name: "a".to_string(),
            },
            ShellError::CommandNotFound {
                name: "b".to_string(),
            },
        ]);
        let message = joined.to_string();
        assert!(message.contains("a: command not found"));
        assert!(message.contains("b: command not found"));
    }

    #[test]
    fn exit_is_found_inside_joined() {
        let joined = ShellError::Joined(vec![
            ShellError::CommandNotFound {
                name: "x".to_string(),
            },
            ShellError::Exit,
        ]);
        assert!(joined.is_exit());
        assert!(!ShellError::CommandNotFound {
            name: "x".to_string()
        }
        .is_exit());
    }
}
