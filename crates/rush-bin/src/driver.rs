//! The REPL driver: one pass per user line.
//!
//! Paint the prompt, open a fresh history cursor, then dispatch reader
//! items (history navigation, tab completion, clear-screen, Ctrl-C)
//! until a line is submitted. Submitted lines are recorded in history
//! first, then evaluated; only the `exit` sentinel (or end of input) leaves
//! the loop.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use tracing::{debug, info, warn};

use core_config::Config;
use core_history::{HistoryCursor, HistoryStore};
use core_interp::{Interpreter, ShellError};
use core_registry::Registry;
use core_term::{Color, Item, TermReader, TermWriter};

use crate::completion::{Completer, Completion};

const BELL: u8 = 0x07;

/// Outcome of editing one line.
enum LinePass {
    Submitted(String),
    Exit,
    Terminated,
}

pub struct Repl {
    reader: TermReader,
    writer: TermWriter,
    registry: Arc<Registry>,
    history: Arc<Mutex<HistoryStore>>,
    interpreter: Interpreter,
    config: Config,
    completer: Completer,
}

impl Repl {
    pub fn new(
        reader: TermReader,
        writer: TermWriter,
        registry: Arc<Registry>,
        history: Arc<Mutex<HistoryStore>>,
        interpreter: Interpreter,
        config: Config,
    ) -> Self {
        Self {
            reader,
            writer,
            registry,
            history,
            interpreter,
            config,
            completer: Completer::new(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.reader.set_prompt(&self.config.prompt);
        if self.config.hints {
            let registry = self.registry.clone();
            self.reader.set_hint_hook(Box::new(move |line| {
                registry
                    .match_first(line)
                    .and_then(|m| m.strip_prefix(line).map(str::to_string))
                    .filter(|suffix| !suffix.is_empty())
            }));
        }
        info!(target: "shell.repl", "entering REPL");

        loop {
            self.paint_prompt()?;
            self.completer.reset();
            let mut cursor = HistoryCursor::new(&self.history.lock().expect("history poisoned"));

            match self.edit_line(&mut cursor)? {
                LinePass::Submitted(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.history
                        .lock()
                        .expect("history poisoned")
                        .add(line.clone());
                    if self.evaluate(&line) {
                        return Ok(());
                    }
                }
                LinePass::Exit | LinePass::Terminated => return Ok(()),
            }
        }
    }

    fn paint_prompt(&self) -> Result<()> {
        self.writer.stage_str(&self.config.prompt);
        self.writer.commit_all()?;
        Ok(())
    }

    /// Dispatch items until the line is submitted or input ends.
    fn edit_line(&mut self, cursor: &mut HistoryCursor) -> Result<LinePass> {
        loop {
            match self.reader.next_item() {
                Item::Up => {
                    let entry = cursor.back(&self.history.lock().expect("history poisoned"));
                    if let Some(entry) = entry {
                        self.reader.replace_with(&entry)?;
                    }
                }
                Item::Down => {
                    let entry = cursor.forward(&self.history.lock().expect("history poisoned"));
                    if let Some(entry) = entry {
                        self.reader.replace_with(&entry)?;
                    }
                }
                Item::Tab => {
                    if self.config.completion {
                        self.complete()?;
                    }
                }
                Item::CtrlL => {
                    // Wipe the screen, then repaint prompt + line in place.
                    self.writer.stage(b"\x1b[2J");
                    self.reader.redraw()?;
                }
                Item::CtrlC => {
                    if self.config.ctrl_c_exits {
                        debug!(target: "shell.repl", "Ctrl-C exit");
                        return Ok(LinePass::Exit);
                    }
                    self.writer.stage_str("^C\n");
                    self.writer.commit_all()?;
                    self.reader.clear_line();
                    return Ok(LinePass::Submitted(String::new()));
                }
                // The reader already applied the edit and repainted the
                // hint through the hook.
                Item::Backspace => {}
                Item::LineSubmitted(line) => return Ok(LinePass::Submitted(line)),
                Item::Error(message) => {
                    warn!(target: "shell.repl", error = %message, "input error");
                    self.report(&format!("rush: error reading input: {message}"));
                    return Ok(LinePass::Terminated);
                }
                Item::Eof => return Ok(LinePass::Terminated),
            }
        }
    }

    /// Evaluate a submitted line. Returns `true` when the shell should
    /// exit.
    fn evaluate(&mut self, line: &str) -> bool {
        match self.interpreter.evaluate(line) {
            Ok(()) => false,
            Err(err) if err.is_exit() => {
                debug!(target: "shell.repl", "exit requested");
                true
            }
            Err(err @ ShellError::Parse(_)) => {
                self.report(&format!("rush: {err}"));
                false
            }
            Err(err) => {
                self.report(&err.to_string());
                false
            }
        }
    }

    fn complete(&mut self) -> Result<()> {
        let line = self.reader.line();
        match self.completer.complete(&self.registry, &line) {
            Completion::Replace(text) => self.reader.replace_with(&text)?,
            Completion::Bell => {
                self.writer.stage_byte(BELL);
                self.writer.commit_all()?;
            }
            Completion::ShowCandidates(candidates) => {
                self.writer.stage_push_foreground(Color::Cyan);
                self.writer
                    .stage_str(&format!("\n{}\n", candidates.join("  ")));
                self.writer.stage_pop_foreground();
                self.writer.commit_all()?;
                self.reader.redraw()?;
            }
            Completion::None => {}
        }
        Ok(())
    }

    /// User-facing diagnostics go to the terminal like everything else.
    fn report(&self, message: &str) {
        self.writer.stage_str(message);
        self.writer.stage_str("\n");
        if let Err(err) = self.writer.commit_all() {
            warn!(target: "shell.repl", error = %err, "failed to report error");
        }
    }
}
