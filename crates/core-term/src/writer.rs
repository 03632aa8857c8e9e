//! Staged terminal output.
//!
//! All output is staged into a byte buffer and written on `commit`, keeping
//! ANSI escape sequences intact across flushes: a partial sink write drops
//! the written prefix and leaves the remainder staged for the next commit.
//!
//! Design invariants:
//! * Newline normalization (`\n` → `\r\n`) happens at staging time, never at
//!   commit, and a lone `\n` following a staged `\r` is left alone.
//! * The handle is clonable; the driver, reader, and interpreter command
//!   streams share one staged buffer behind a lock. Callers serialize; the
//!   REPL is quiescent while a pipeline writes.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::color::{Color, ColorStack};

struct SinkState {
    sink: Box<dyn Write + Send>,
    staged: Vec<u8>,
    colors: ColorStack,
}

/// Clonable handle to the staged terminal sink.
#[derive(Clone)]
pub struct TermWriter {
    state: Arc<Mutex<SinkState>>,
}

impl TermWriter {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState {
                sink,
                staged: Vec::new(),
                colors: ColorStack::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().expect("terminal sink poisoned")
    }

    /// Stage raw bytes, normalizing every bare `\n` to `\r\n` so raw-mode
    /// terminals return the cursor to column 0.
    pub fn stage(&self, bytes: &[u8]) {
        let mut state = self.lock();
        for &b in bytes {
            if b == b'\n' && state.staged.last() != Some(&b'\r') {
                state.staged.push(b'\r');
            }
            state.staged.push(b);
        }
    }

    pub fn stage_str(&self, s: &str) {
        self.stage(s.as_bytes());
    }

    pub fn stage_char(&self, c: char) {
        let mut encoded = [0u8; 4];
        self.stage(c.encode_utf8(&mut encoded).as_bytes());
    }

    pub fn stage_byte(&self, b: u8) {
        self.stage(&[b]);
    }

    /// Stage a horizontal cursor move: positive right, negative left, zero a
    /// no-op.
    pub fn stage_move(&self, delta: isize) {
        if delta == 0 {
            return;
        }
        let direction = if delta > 0 { 'C' } else { 'D' };
        self.stage_str(&format!("\x1b[{}{}", delta.unsigned_abs(), direction));
    }

    pub fn stage_push_foreground(&self, color: Color) {
        let mut state = self.lock();
        let sgr = state.colors.push(color);
        state.staged.extend_from_slice(sgr);
    }

    pub fn stage_pop_foreground(&self) {
        let mut state = self.lock();
        let sgr = state.colors.pop();
        state.staged.extend_from_slice(sgr);
    }

    /// Write the staged buffer to the sink. A short write drops the written
    /// prefix and keeps the remainder staged; the byte count written is
    /// returned either way.
    pub fn commit(&self) -> io::Result<usize> {
        let mut state = self.lock();
        if state.staged.is_empty() {
            return Ok(0);
        }
        let staged = std::mem::take(&mut state.staged);
        match state.sink.write(&staged) {
            Ok(written) => {
                if written < staged.len() {
                    state.staged.extend_from_slice(&staged[written..]);
                }
                state.sink.flush()?;
                Ok(written)
            }
            Err(err) => {
                state.staged = staged;
                Err(err)
            }
        }
    }

    /// Commit until the staged buffer drains.
    pub fn commit_all(&self) -> io::Result<usize> {
        let mut total = 0;
        loop {
            let written = self.commit()?;
            total += written;
            let drained = self.lock().staged.is_empty();
            if drained {
                return Ok(total);
            }
            if written == 0 {
                return Err(io::ErrorKind::WriteZero.into());
            }
        }
    }

    pub fn staged_len(&self) -> usize {
        self.lock().staged.len()
    }
}

/// Commands write straight through the staged buffer, picking up newline
/// normalization on the way.
impl Write for TermWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stage(buf);
        self.commit_all()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit_all()?;
        Ok(())
    }
}
