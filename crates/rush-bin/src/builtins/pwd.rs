use std::io::Write;
use std::sync::Arc;

use core_registry::{Command, CommandFactory, CommandKind};

/// Print the process working directory.
pub fn factory() -> CommandFactory {
    Arc::new(|| {
        Command::new("pwd", CommandKind::Builtin, |mut io, _argv| {
            let cwd = std::env::current_dir()?;
            writeln!(io.stdout, "{}", cwd.display())?;
            Ok(())
        })
    })
}
