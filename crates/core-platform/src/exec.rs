//! External process spawning capability.
//!
//! The shell's command streams are arbitrary `Read`/`Write` objects (the
//! terminal writer, channel pipes, redirect files), so the OS implementation
//! bridges them to the child's file descriptors with copier threads. A
//! nonzero exit status is a normal result; only spawn and stream-bridging
//! failures surface as errors.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use tracing::{debug, trace};

/// What an external command's standard input is connected to.
///
/// `Inherit` hands the child the shell's own stdin descriptor. This matters:
/// copying the interactive terminal through a thread would steal keystrokes
/// typed after the child exits, because the copier only notices the closed
/// child pipe on its next write.
pub enum InputStream {
    Inherit,
    Piped(Box<dyn Read + Send>),
}

impl InputStream {
    /// Materialize a reader for in-process (builtin) consumers.
    pub fn into_reader(self) -> Box<dyn Read + Send> {
        match self {
            InputStream::Inherit => Box::new(io::stdin()),
            InputStream::Piped(reader) => reader,
        }
    }
}

impl std::fmt::Debug for InputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputStream::Inherit => f.write_str("InputStream::Inherit"),
            InputStream::Piped(_) => f.write_str("InputStream::Piped(..)"),
        }
    }
}

pub trait ExecSpawn: Send + Sync {
    /// Spawn `path` with `argv` (`argv[0]` conventionally equals `name`),
    /// wiring the given streams to the child.
    fn exec(
        &self,
        name: &str,
        path: &Path,
        argv: &[String],
        stdin: InputStream,
        stdout: Box<dyn Write + Send>,
        stderr: Box<dyn Write + Send>,
    ) -> io::Result<()>;
}

/// `std::process`-backed spawner.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsExec;

impl ExecSpawn for OsExec {
    fn exec(
        &self,
        name: &str,
        path: &Path,
        argv: &[String],
        stdin: InputStream,
        mut stdout: Box<dyn Write + Send>,
        mut stderr: Box<dyn Write + Send>,
    ) -> io::Result<()> {
        let mut command = Command::new(path);
        command.args(argv.get(1..).unwrap_or_default());
        #[cfg(unix)]
        if let Some(first) = argv.first() {
            use std::os::unix::process::CommandExt;
            command.arg0(first);
        }

        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        match stdin {
            InputStream::Inherit => {
                command.stdin(Stdio::inherit());
            }
            InputStream::Piped(_) => {
                command.stdin(Stdio::piped());
            }
        }

        debug!(target: "platform.exec", command = name, path = %path.display(), "spawn");
        let mut child = command.spawn()?;

        if let InputStream::Piped(mut reader) = stdin {
            let mut child_stdin = child
                .stdin
                .take()
                .ok_or_else(|| io::Error::other("child stdin not captured"))?;
            // Detached on purpose: a child may exit without draining stdin
            // and the copier only unblocks on its next failed write.
            thread::Builder::new()
                .name(format!("{name}-stdin"))
                .spawn(move || {
                    let _ = io::copy(&mut reader, &mut child_stdin);
                })?;
        }

        let mut child_stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout not captured"))?;
        let out_copier = thread::Builder::new()
            .name(format!("{name}-stdout"))
            .spawn(move || {
                io::copy(&mut child_stdout, &mut stdout)?;
                stdout.flush()
            })?;

        let mut child_stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("child stderr not captured"))?;
        let err_copier = thread::Builder::new()
            .name(format!("{name}-stderr"))
            .spawn(move || {
                io::copy(&mut child_stderr, &mut stderr)?;
                stderr.flush()
            })?;

        let status = child.wait()?;
        trace!(target: "platform.exec", command = name, code = status.code(), "exited");

        for copier in [out_copier, err_copier] {
            copier
                .join()
                .map_err(|_| io::Error::other("stream copier panicked"))??;
        }

        // A nonzero exit code is the command's business, not a spawn failure.
        Ok(())
    }
}
