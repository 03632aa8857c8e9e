//! The interpreter: walks a parsed [`Root`], expands arguments, wires
//! streams, and runs commands with the correct concurrency.
//!
//! Concurrency model: statements run sequentially on the caller's thread.
//! A pipeline spawns one scoped thread per command (all started before any
//! is awaited) and joins them all, collecting every failure. A background
//! statement detaches onto its own thread and the sequence continues.

pub mod error;
pub mod multi_writer;
pub mod pipe;

pub use error::ShellError;
pub use multi_writer::MultiWriter;
pub use pipe::{IgnoreClosedRead, IgnoreClosedWrite, PipeReader, PipeWriter, pipe};

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use core_lang::ast::{self, Expr, Pipeline, Root, Source, Stmt};
use core_lang::{RedirectMode, Target};
use core_platform::{EnvLookup, FileSystem, InputStream, OpenFlags};
use core_registry::{CommandError, CommandIo, CommandLookup};

/// Produces the shell's stdin for a command that has no pipe and no file
/// source.
pub type StdinFactory = Arc<dyn Fn() -> InputStream + Send + Sync>;
/// Produces a writer onto the shell's stdout/stderr.
pub type StdoutFactory = Arc<dyn Fn() -> Box<dyn Write + Send> + Send + Sync>;

#[derive(Clone)]
pub struct Interpreter {
    lookup: Arc<dyn CommandLookup>,
    env: Arc<dyn EnvLookup>,
    fs: Arc<dyn FileSystem>,
    stdin: StdinFactory,
    stdout: StdoutFactory,
    stderr: StdoutFactory,
}

impl Interpreter {
    pub fn new(
        lookup: Arc<dyn CommandLookup>,
        env: Arc<dyn EnvLookup>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            lookup,
            env,
            fs,
            stdin: Arc::new(|| InputStream::Inherit),
            stdout: Arc::new(|| Box::new(io::stdout())),
            stderr: Arc::new(|| Box::new(io::stderr())),
        }
    }

    /// Replace the shell-level stream factories (the driver points stdout
    /// and stderr at the terminal writer).
    pub fn with_io(mut self, stdin: StdinFactory, stdout: StdoutFactory, stderr: StdoutFactory) -> Self {
        self.stdin = stdin;
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    /// Parse and evaluate one input line.
    pub fn evaluate(&self, input: &str) -> Result<(), ShellError> {
        let root = core_lang::parse(input)?;
        self.eval_root(&root)
    }

    /// Statements run in order; the first failure stops the sequence.
    pub fn eval_root(&self, root: &Root) -> Result<(), ShellError> {
        for stmt in &root.statements {
            self.eval_stmt(stmt)?;
        }
        Ok(())
    }

    fn eval_stmt(&self, stmt: &Stmt) -> Result<(), ShellError> {
        match stmt {
            Stmt::Command(command) => self.eval_command(command, None, None),
            Stmt::Pipeline(pipeline) => self.eval_pipeline(pipeline),
            Stmt::Background(inner) => self.eval_background(inner),
        }
    }

    /// Launch the statement detached; its failure is logged, never surfaced,
    /// and nothing awaits it.
    fn eval_background(&self, inner: &Stmt) -> Result<(), ShellError> {
        let interpreter = self.clone();
        let stmt = inner.clone();
        thread::Builder::new()
            .name("shell-background".to_string())
            .spawn(move || {
                if let Err(err) = interpreter.eval_stmt(&stmt) {
                    warn!(target: "interp.background", error = %err, "background statement failed");
                }
            })
            .map_err(ShellError::Io)?;
        Ok(())
    }

    /// N commands, N−1 pipes. Command 0 reads the shell's stdin, the last
    /// writes the shell's stdout; neighbors meet over a pipe. Every command
    /// gets its own scoped thread; fan-in joins them all and every failure
    /// is kept.
    fn eval_pipeline(&self, pipeline: &Pipeline) -> Result<(), ShellError> {
        let n = pipeline.commands.len();
        if n == 0 {
            return Ok(());
        }
        if n == 1 {
            return self.eval_command(&pipeline.commands[0], None, None);
        }

        let mut readers: Vec<Option<PipeReader>> = Vec::with_capacity(n);
        let mut writers: Vec<Option<PipeWriter>> = Vec::with_capacity(n);
        readers.push(None);
        for _ in 0..n - 1 {
            let (reader, writer) = pipe();
            readers.push(Some(reader));
            writers.push(Some(writer));
        }
        writers.push(None);

        debug!(target: "interp.pipeline", commands = n, "starting pipeline");
        let mut errors: Vec<ShellError> = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(n);
            for (i, command) in pipeline.commands.iter().enumerate() {
                let stdin = readers[i]
                    .take()
                    .map(|r| InputStream::Piped(Box::new(IgnoreClosedRead(r))));
                let stdout = writers[i]
                    .take()
                    .map(|w| Box::new(IgnoreClosedWrite(w)) as Box<dyn Write + Send>);
                handles.push(scope.spawn(move || self.eval_command(command, stdin, stdout)));
            }
            handles
                .into_iter()
                .filter_map(|handle| match handle.join() {
                    Ok(Ok(())) => None,
                    Ok(Err(err)) => Some(err),
                    Err(_) => Some(ShellError::Io(io::Error::other("pipeline task panicked"))),
                })
                .collect()
        });

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ShellError::Joined(errors)),
        }
    }

    /// Expand, wire streams, and run one command. `piped_stdin` and
    /// `piped_stdout` are the pipeline's endpoints when the command sits in
    /// one.
    fn eval_command(
        &self,
        command_stmt: &ast::Command,
        piped_stdin: Option<InputStream>,
        piped_stdout: Option<Box<dyn Write + Send>>,
    ) -> Result<(), ShellError> {
        let name = self.eval_expr(&command_stmt.name);
        let Some(command) = self.lookup.lookup(&name) else {
            return Err(ShellError::CommandNotFound { name });
        };

        let mut argv = Vec::with_capacity(command_stmt.args.len() + 1);
        argv.push(name.clone());
        for arg in &command_stmt.args {
            argv.push(self.eval_expr(arg));
        }

        let stdin = match (piped_stdin, &command_stmt.redirects.stdin) {
            (Some(piped), _) => piped,
            (None, Some(Source::File(expr))) => {
                let filename = self.eval_expr(expr);
                let handle = self.fs.open(Path::new(&filename)).map_err(|source| {
                    ShellError::RedirectOpenFailed {
                        name: name.clone(),
                        filename,
                        source,
                    }
                })?;
                InputStream::Piped(handle)
            }
            (None, None) => (self.stdin)(),
        };

        // A piped command writes the pipe (plus any file targets); otherwise
        // file targets replace the shell's stdout entirely.
        let mut stdouts: Vec<Box<dyn Write + Send>> = Vec::new();
        match piped_stdout {
            Some(writer) => stdouts.push(writer),
            None => {
                if command_stmt.redirects.stdout.is_empty() {
                    stdouts.push((self.stdout)());
                }
            }
        }
        for target in &command_stmt.redirects.stdout {
            stdouts.push(self.open_target(&name, target)?);
        }

        let mut stderrs: Vec<Box<dyn Write + Send>> = Vec::new();
        if command_stmt.redirects.stderr.is_empty() {
            stderrs.push((self.stderr)());
        }
        for target in &command_stmt.redirects.stderr {
            stderrs.push(self.open_target(&name, target)?);
        }

        let io = CommandIo {
            stdin,
            stdout: combine(stdouts),
            stderr: combine(stderrs),
        };

        debug!(target: "interp.command", command = %name, args = argv.len() - 1, "run");
        match command.run(io, &argv) {
            Ok(()) => Ok(()),
            Err(CommandError::Exit) => Err(ShellError::Exit),
            Err(CommandError::Spawn(source)) => Err(ShellError::SpawnFailed { name, source }),
            Err(CommandError::Io(source)) => Err(ShellError::CommandRunFailed {
                name,
                source: source.into(),
            }),
            Err(CommandError::Other(source)) => Err(ShellError::CommandRunFailed { name, source }),
        }
    }

    fn open_target(
        &self,
        name: &str,
        target: &Target,
    ) -> Result<Box<dyn Write + Send>, ShellError> {
        let filename = self.eval_expr(&target.filename);
        let flags = match target.mode {
            RedirectMode::Truncate => OpenFlags::WRONLY | OpenFlags::TRUNC | OpenFlags::CREATE,
            RedirectMode::Append => OpenFlags::WRONLY | OpenFlags::APPEND | OpenFlags::CREATE,
        };
        let handle = self
            .fs
            .open_file(Path::new(&filename), flags)
            .map_err(|source| ShellError::RedirectOpenFailed {
                name: name.to_string(),
                filename,
                source,
            })?;
        Ok(Box::new(handle))
    }

    /// Expand one expression to its argument string.
    ///
    /// Single quotes are literal; escapes were already folded by the parser
    /// (`\n` stays the letter `n`); variables resolve through the env
    /// capability, unset names expanding to the empty string; double-quoted
    /// children concatenate in order.
    fn eval_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Raw(literal) | Expr::SingleQuoted(literal) => literal.clone(),
            Expr::Variable(name) => self.env.get(name),
            Expr::DoubleQuoted(parts) => {
                parts.iter().map(|part| self.eval_expr(part)).collect()
            }
        }
    }
}

fn combine(mut sinks: Vec<Box<dyn Write + Send>>) -> Box<dyn Write + Send> {
    if sinks.len() == 1 {
        sinks.pop().expect("one sink")
    } else {
        Box::new(MultiWriter::new(sinks))
    }
}
