//! Command descriptor: what the registry hands to the interpreter.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use core_platform::InputStream;

/// Streams wired to a command for one invocation.
pub struct CommandIo {
    pub stdin: InputStream,
    pub stdout: Box<dyn Write + Send>,
    pub stderr: Box<dyn Write + Send>,
}

/// Failure of a command body.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Sentinel raised by the `exit` builtin; the only error that leaves
    /// the REPL.
    #[error("exit")]
    Exit,
    /// The external could not be spawned or its streams could not be
    /// bridged.
    #[error("spawn failed: {0}")]
    Spawn(#[source] io::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Builtin,
    External(PathBuf),
}

type RunFn = Box<dyn FnOnce(CommandIo, &[String]) -> Result<(), CommandError> + Send>;

/// A runnable command. Built fresh per invocation; running consumes it.
pub struct Command {
    pub name: String,
    pub kind: CommandKind,
    run: RunFn,
}

impl Command {
    pub fn new(
        name: impl Into<String>,
        kind: CommandKind,
        run: impl FnOnce(CommandIo, &[String]) -> Result<(), CommandError> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            run: Box::new(run),
        }
    }

    /// Run with the fully expanded argv (`argv[0]` = command name).
    pub fn run(self, io: CommandIo, argv: &[String]) -> Result<(), CommandError> {
        (self.run)(io, argv)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Produces a fresh [`Command`] per lookup.
pub type CommandFactory = Arc<dyn Fn() -> Command + Send + Sync>;
