use std::io::Write;
use std::sync::Arc;

use core_registry::{Command, CommandFactory, CommandKind};

/// Print the arguments joined by single spaces.
pub fn factory() -> CommandFactory {
    Arc::new(|| {
        Command::new("echo", CommandKind::Builtin, |mut io, argv| {
            writeln!(io.stdout, "{}", argv[1..].join(" "))?;
            Ok(())
        })
    })
}
