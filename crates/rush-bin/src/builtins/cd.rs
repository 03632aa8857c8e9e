use std::io::{self, Write};
use std::sync::Arc;

use core_registry::{Command, CommandError, CommandFactory, CommandKind};

/// Change the process working directory. A missing target is reported on
/// stderr and is not a command failure; other I/O problems are.
pub fn factory() -> CommandFactory {
    Arc::new(|| {
        Command::new("cd", CommandKind::Builtin, |mut io, argv| {
            let Some(target) = argv.get(1) else {
                return Ok(());
            };
            match std::env::set_current_dir(target) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    writeln!(io.stderr, "cd: {target}: No such file or directory")?;
                    Ok(())
                }
                Err(err) => Err(CommandError::Io(err)),
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::test_io;

    #[test]
    fn missing_target_reports_on_stderr() {
        let (io, out, err) = test_io();
        (factory())()
            .run(
                io,
                &["cd".to_string(), "/definitely/not/a/dir".to_string()],
            )
            .unwrap();
        assert_eq!(out.string(), "");
        assert_eq!(
            err.string(),
            "cd: /definitely/not/a/dir: No such file or directory\n"
        );
    }

    #[test]
    fn no_argument_is_a_no_op() {
        let before = std::env::current_dir().unwrap();
        let (io, _out, _err) = test_io();
        (factory())().run(io, &["cd".to_string()]).unwrap();
        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
