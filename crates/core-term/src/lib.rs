//! Terminal layer: staged ANSI-aware output, the raw-byte line editor, and
//! raw-mode lifecycle.
//!
//! The writer and reader speak ANSI directly; crossterm is used only to
//! toggle raw mode. Everything here is single-threaded by protocol (the
//! REPL driver is the sole caller), but the writer handle is clonable so
//! command output produced on interpreter threads lands in the same staged
//! sink.

use anyhow::Result;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

pub mod color;
pub mod reader;
pub mod writer;

pub use color::{Color, ColorStack};
pub use reader::{HintHook, Item, TermReader};
pub use writer::TermWriter;

/// RAII guard: enables terminal raw mode on construction and restores it on
/// drop so an early return or panic never leaves the terminal unusable.
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    pub fn enter() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self { active: true })
    }

    pub fn leave(&mut self) -> Result<()> {
        if self.active {
            disable_raw_mode()?;
            self.active = false;
        }
        Ok(())
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

/// Last-resort terminal restore for panic hooks, where no guard is
/// reachable.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
}
