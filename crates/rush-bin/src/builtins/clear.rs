use std::io::Write;
use std::sync::Arc;

use core_registry::{Command, CommandFactory, CommandKind};

/// Wipe the screen and home the cursor.
pub fn factory() -> CommandFactory {
    Arc::new(|| {
        Command::new("clear", CommandKind::Builtin, |mut io, _argv| {
            io.stdout.write_all(b"\x1b[2J\x1b[H")?;
            Ok(())
        })
    })
}
